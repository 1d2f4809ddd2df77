#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

mod command;

use clap::{Parser, Subcommand};
use command::{
    ChatInput, ChatStrategy, CommandStrategy, IngestInput, IngestStrategy, InitStrategy,
    ServeStrategy, TelegramInput, TelegramStrategy, VersionStrategy,
};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "glowbot")]
#[command(about = "Salon consultation assistant", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Talk to the agent from the console
    Chat {
        /// Session id to continue (defaults to a local one)
        #[arg(short, long)]
        session: Option<String>,

        /// Single message to send instead of the interactive loop
        #[arg(short = 'm', long)]
        message: Option<String>,
    },
    /// Run the Telegram bot
    Telegram {
        /// Bot token (overrides config)
        #[arg(long)]
        token: Option<String>,

        /// Allowed chat IDs (overrides config)
        #[arg(long)]
        allow_from: Option<Vec<String>>,
    },
    /// Run the webhook server for the chat platform
    Serve,
    /// Rebuild the knowledge base from the files directory
    Ingest {
        /// Directory with knowledge files (overrides config)
        #[arg(long)]
        path: Option<String>,
    },
    /// Initialize configuration
    Init,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Chat { session, message } => {
            ChatStrategy.execute(ChatInput { session, message }).await?;
        }
        Commands::Telegram { token, allow_from } => {
            TelegramStrategy
                .execute(TelegramInput { token, allow_from })
                .await?;
        }
        Commands::Serve => {
            ServeStrategy.execute(()).await?;
        }
        Commands::Ingest { path } => {
            IngestStrategy.execute(IngestInput { path }).await?;
        }
        Commands::Init => {
            InitStrategy.execute(()).await?;
        }
        Commands::Version => {
            VersionStrategy.execute(()).await?;
        }
    }

    Ok(())
}
