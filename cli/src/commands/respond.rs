//! # Respond Command
//!
//! Asks a question. Carries the persistent session id unless told not to,
//! so session-scoped teachings from earlier invocations stay visible.
//!
//! ## Usage
//!
//! ```bash
//! lore respond "what is the capital of France?"
//! lore respond "what did I teach you?" --top-k 8
//! lore respond "shared knowledge only" --no-session
//! ```

use anyhow::Result;
use colored::Colorize;
use lore_engine::{Engine, RespondRequest};

use crate::commands::exit_code_for;
use crate::exit_codes::*;
use crate::session;

pub struct RespondArgs {
    pub input: String,
    pub top_k: Option<usize>,
    pub session: Option<String>,
    pub no_session: bool,
    pub json: bool,
}

/// Execute the respond command.
pub async fn execute(engine: &Engine, args: RespondArgs) -> Result<i32> {
    let session_id = if args.no_session {
        None
    } else {
        match args.session {
            Some(sid) => Some(sid),
            None => Some(session::load_or_mint()?),
        }
    };

    let result = engine
        .respond(RespondRequest {
            input: args.input,
            session_id,
            top_k: args.top_k,
        })
        .await;

    // A confident generated answer may have been scheduled for write-back.
    engine.shutdown().await;

    match result {
        Ok(answer) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&answer)?);
            } else {
                println!("{}", answer.reply);
                if !answer.sources.is_empty() {
                    println!();
                    println!("{}", "Sources:".dimmed());
                    for source in &answer.sources {
                        println!(
                            "  {} {} {}",
                            format!("{:.2}", source.score).dimmed(),
                            source.text,
                            if source.tags.is_empty() {
                                String::new()
                            } else {
                                format!("[{}]", source.tags.join(", ")).dimmed().to_string()
                            }
                        );
                    }
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
