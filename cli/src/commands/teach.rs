//! # Teach Command
//!
//! Stores a teaching. Session-scoped by default; `--global` makes it
//! visible to every session.
//!
//! ## Usage
//!
//! ```bash
//! lore teach "Paris is the capital of France" --global --tag geo
//! lore teach "my favorite editor is helix"
//! ```

use anyhow::Result;
use colored::Colorize;
use lore_engine::{Engine, Scope, TeachRequest};

use crate::commands::exit_code_for;
use crate::exit_codes::*;
use crate::session;

pub struct TeachArgs {
    pub text: String,
    pub tags: Vec<String>,
    pub global: bool,
    pub session: Option<String>,
    pub json: bool,
}

/// Execute the teach command.
pub async fn execute(engine: &Engine, args: TeachArgs) -> Result<i32> {
    let (scope, session_id) = if args.global {
        (Scope::Global, None)
    } else {
        let sid = match args.session {
            Some(sid) => sid,
            None => session::load_or_mint()?,
        };
        (Scope::Session, Some(sid))
    };

    let result = engine.teach(TeachRequest {
        text: args.text,
        tags: args.tags,
        scope: Some(scope),
        session_id,
    });

    // Give the best-effort vector upsert its chance to land before the
    // process exits; the reindex command repairs anything that didn't.
    engine.shutdown().await;

    match result {
        Ok(receipt) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&receipt)?);
            } else {
                println!("{} taught {}", "✓".bright_green().bold(), receipt.id.cyan());
                println!("  {} {}", "scope:".dimmed(), receipt.scope.as_str());
                if !receipt.tags.is_empty() {
                    println!("  {} {}", "tags:".dimmed(), receipt.tags.join(", "));
                }
            }
            Ok(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("{} {e}", "✗".red().bold());
            Ok(exit_code_for(&e))
        }
    }
}
