//! # Health Command
//!
//! Reports up/down status of the knowledge store and the vector index
//! independently, plus whether a generative collaborator is configured.
//! Never fails, even with both stores down.
//!
//! ## Usage
//!
//! ```bash
//! lore health
//! lore health --json
//! ```

use anyhow::Result;
use colored::Colorize;
use lore_engine::{ComponentStatus, Engine};

use crate::exit_codes::*;

pub struct HealthArgs {
    pub json: bool,
}

fn render(label: &str, status: ComponentStatus) {
    match status {
        ComponentStatus::Up => {
            println!("{} {}: {}", "✓".bright_green().bold(), label, "up".green())
        }
        ComponentStatus::Down => println!("{} {}: {}", "✗".red().bold(), label, "down".red()),
        ComponentStatus::Absent => {
            println!("{} {}: {}", "−".dimmed(), label, "not configured".dimmed())
        }
    }
}

/// Execute the health command.
pub async fn execute(engine: &Engine, args: HealthArgs) -> Result<i32> {
    let report = engine.health().await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", "Lore Engine Health".bold());
        println!("{}", "─".repeat(40).dimmed());
        render("knowledge store", report.store);
        render("vector index", report.index);
        if report.generative {
            println!(
                "{} generative collaborator: {}",
                "✓".bright_green().bold(),
                "configured".green()
            );
        } else {
            println!(
                "{} generative collaborator: {}",
                "−".dimmed(),
                "not configured".dimmed()
            );
        }
    }

    Ok(EXIT_SUCCESS)
}
