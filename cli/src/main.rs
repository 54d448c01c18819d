//! # Lore CLI
//!
//! Lore — teach it facts, ask it questions.
//!
//! Teachings go into a durable local store (and, best-effort, a vector
//! index); questions are answered from stored knowledge when a candidate
//! is confident enough, escalating to a generative model otherwise.
//!
//! ## Usage
//!
//! ```bash
//! # Store a fact
//! lore teach "Paris is the capital of France" --global
//!
//! # Ask
//! lore respond "what is the capital of France?"
//! ```

use clap::{Parser, Subcommand};

use lore::commands;
use lore::commands::health::HealthArgs;
use lore::commands::reindex::ReindexArgs;
use lore::commands::respond::RespondArgs;
use lore::commands::teach::TeachArgs;
use lore::exit_codes::{EXIT_ERROR, EXIT_STORE_ERROR};
use lore_engine::{Engine, EngineConfig};

/// Initialize logger based on verbose flag
fn init_logger(verbose: bool) {
    let mut log_builder = env_logger::Builder::from_default_env();
    if verbose {
        log_builder.filter_level(log::LevelFilter::Debug);
    } else {
        log_builder.filter_level(log::LevelFilter::Warn);
    }
    log_builder.init();
}

/// Main CLI structure
#[derive(Parser)]
#[command(name = "lore")]
#[command(about = "Lore — teach it facts, ask it questions", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
enum Commands {
    /// Store a teaching in the knowledge base
    Teach {
        /// The fact to remember
        #[arg(value_name = "TEXT")]
        text: String,
        /// Attach a tag (repeatable)
        #[arg(long, short = 't', value_name = "TAG")]
        tag: Vec<String>,
        /// Store globally, visible to every session
        #[arg(long)]
        global: bool,
        /// Override the persistent session id
        #[arg(long, value_name = "SESSION_ID")]
        session: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Ask a question against the knowledge base
    Respond {
        /// The question to answer
        #[arg(value_name = "INPUT")]
        input: String,
        /// Candidates to retrieve (1-16)
        #[arg(long, value_name = "COUNT")]
        top_k: Option<usize>,
        /// Override the persistent session id
        #[arg(long, value_name = "SESSION_ID")]
        session: Option<String>,
        /// Query global knowledge only, without a session
        #[arg(long)]
        no_session: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Report store, index, and generative collaborator status
    Health {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Rebuild the vector index from the knowledge store
    Reindex {
        /// Reindex even when the index looks consistent
        #[arg(long)]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let engine = match Engine::new(EngineConfig::from_env()) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("failed to start engine: {e}");
            std::process::exit(EXIT_STORE_ERROR);
        }
    };

    let result = match cli.command {
        Commands::Teach {
            text,
            tag,
            global,
            session,
            json,
        } => {
            commands::teach::execute(
                &engine,
                TeachArgs {
                    text,
                    tags: tag,
                    global,
                    session,
                    json,
                },
            )
            .await
        }
        Commands::Respond {
            input,
            top_k,
            session,
            no_session,
            json,
        } => {
            commands::respond::execute(
                &engine,
                RespondArgs {
                    input,
                    top_k,
                    session,
                    no_session,
                    json,
                },
            )
            .await
        }
        Commands::Health { json } => commands::health::execute(&engine, HealthArgs { json }).await,
        Commands::Reindex { force, json } => {
            commands::reindex::execute(&engine, ReindexArgs { force, json }).await
        }
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(EXIT_ERROR);
        }
    }
}
