//! Scoutline CLI: the main entry point.
//!
//! Commands:
//! - `init`  Write a default config file
//! - `chat`  Interactive research session
//! - `ask`   Answer a single question and exit

use clap::{Parser, Subcommand};

mod commands;
mod terminal_ui;

#[derive(Parser)]
#[command(
    name = "scoutline",
    about = "Scoutline: a tool-calling research assistant",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create ~/.scoutline/config.toml with defaults
    Init,

    /// Start an interactive research session
    Chat,

    /// Ask one question and print the answer
    Ask {
        /// The question to ask
        #[arg(short, long)]
        message: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so answers on stdout stay clean.
    let filter = if cli.verbose { "debug" } else { "warn" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Init => commands::init::run().await?,
        Commands::Chat => commands::chat::run().await?,
        Commands::Ask { message } => commands::ask::run(message).await?,
    }

    Ok(())
}
