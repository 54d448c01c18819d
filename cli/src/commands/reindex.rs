//! # Reindex Command
//!
//! Rebuilds the vector index from the knowledge store: every teaching is
//! re-embedded and upserted, repairing any divergence left by crashed or
//! failed best-effort writes.
//!
//! ## Usage
//!
//! ```bash
//! lore reindex
//! lore reindex --force --json
//! ```

use anyhow::Result;
use colored::Colorize;
use lore_engine::Engine;

use crate::commands::exit_code_for;
use crate::exit_codes::*;

pub struct ReindexArgs {
    pub force: bool,
    pub json: bool,
}

/// Execute the reindex command.
pub async fn execute(engine: &Engine, args: ReindexArgs) -> Result<i32> {
    match engine.reindex(args.force).await {
        Ok(report) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "{} reindexed: {} upserted, {} failed",
                    "✓".bright_green().bold(),
                    report.upserted.to_string().green(),
                    if report.failed == 0 {
                        report.failed.to_string().dimmed().to_string()
                    } else {
                        report.failed.to_string().red().to_string()
                    }
                );
            }
            Ok(if report.failed == 0 {
                EXIT_SUCCESS
            } else {
                EXIT_ERROR
            })
        }
        Err(e) => {
            eprintln!("{} {e}", "✗".red().bold());
            Ok(exit_code_for(&e))
        }
    }
}
