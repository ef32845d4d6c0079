//! Umbra CLI: the main entry point.
//!
//! Commands:
//! - `chat`   — Interactive chat or single-message mode
//! - `serve`  — Start the HTTP chat gateway
//! - `tools`  — List the registered tools
//! - `init`   — Create the config directory and starter files

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "umbra",
    about = "Umbra: a personal assistant that turns requests into tool calls",
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
    /// Chat with Umbra
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List the tools Umbra can use
    Tools,

    /// Initialize configuration and profile files
    Init,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Chat { message } => commands::chat::run(message).await?,
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Tools => commands::tools::run().await?,
        Commands::Init => commands::init::run().await?,
    }

    Ok(())
}
