//! Pagewise CLI entry point.
//!
//! Commands:
//! - `onboard`: Initialize config and seed the demo catalog
//! - `chat`: Interactive chat or single-message mode
//! - `doctor`: Diagnose configuration and provider health

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "pagewise",
    about = "Pagewise, a conversational book-recommendation assistant",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration and seed the demo catalog
    Onboard,

    /// Chat with the assistant
    Chat {
        /// The username to chat as
        #[arg(short, long)]
        user: String,

        /// Conversation id; a fresh one is generated when omitted
        #[arg(short, long)]
        conversation: Option<String>,

        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Diagnose configuration and provider health
    Doctor,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Chat {
            user,
            conversation,
            message,
        } => commands::chat::run(user, conversation, message).await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
