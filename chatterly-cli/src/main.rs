//! Main entry point for the Chatterly command-line client.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use shared::config::ClientConfig;
use std::path::PathBuf;
use url::Url;

mod commands;
mod logging;

use commands::{
    chat::ChatArgs,
    messages::MessagesCommand,
    rooms::RoomsCommand,
    session::SessionCommand,
    users::UsersCommand,
};

/// Chatterly CLI
#[derive(Parser)]
#[command(name = "chatterly")]
#[command(about = "Command-line client for Chatterly", long_about = None)]
struct Cli {
    /// Path to the configuration file (optional)
    #[arg(
        long,
        short,
        global = true,
        help = "Path to the configuration file (e.g., chatterly.yaml or chatterly.json). If not provided, defaults will be used."
    )]
    config: Option<PathBuf>,

    /// Override the REST API base URL
    #[arg(
        long,
        global = true,
        help = "Base URL of the Chatterly REST API (e.g., http://localhost:3000). Overrides the configuration file."
    )]
    api_url: Option<Url>,

    #[command(subcommand)]
    command: Commands,
}

/// Subcommands for the Chatterly CLI
#[derive(Subcommand)]
enum Commands {
    /// Sign in, sign up, sign out, or show the stored session
    #[command(subcommand)]
    Session(SessionCommand),

    /// Browse and inspect rooms
    #[command(subcommand)]
    Rooms(RoomsCommand),

    /// Look up other users
    #[command(subcommand)]
    Users(UsersCommand),

    /// Search messages and list pinned messages
    #[command(subcommand)]
    Messages(MessagesCommand),

    /// Open a room and chat live
    Chat(ChatArgs),

    /// Generate shell completion scripts for the CLI
    Completion {
        /// The shell type for which to generate the completion script (e.g., bash, zsh, fish, powershell)
        #[arg(
            long,
            short,
            value_enum,
            help = "The shell type for which to generate the completion script (e.g., bash, zsh, fish, powershell)"
        )]
        shell: clap_complete::Shell,
    },

    /// Generate a configuration file
    Config {
        /// Format of the configuration file to generate (yaml or json). Defaults to yaml.
        #[arg(
            long,
            short,
            help = "Format of the configuration file to generate (yaml or json). Defaults to yaml."
        )]
        format: Option<String>,

        /// Where to write the file
        #[arg(
            long,
            short,
            help = "Output path for the generated file. Defaults to chatterly.yaml or chatterly.json in the current directory."
        )]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    let command = match cli.command {
        Commands::Completion { shell } => {
            commands::completion::generate_completion(shell);
            return Ok(());
        }
        Commands::Config { format, output } => {
            let format = format.unwrap_or_else(|| "yaml".to_string());
            return commands::config::generate_config(&format, output.as_deref());
        }
        command => command,
    };

    let config = ClientConfig::load_config(cli.config.as_deref(), cli.api_url)
        .context("failed to load configuration")?;
    let level = logging::initialize_tracing(&config);
    tracing::debug!(%level, api_url = %config.api_url, "configuration loaded");

    match command {
        Commands::Session(command) => commands::session::run(command, config).await,
        Commands::Rooms(command) => commands::rooms::run(command, config).await,
        Commands::Users(command) => commands::users::run(command, config).await,
        Commands::Messages(command) => commands::messages::run(command, config).await,
        Commands::Chat(args) => commands::chat::run(args, config).await,
        Commands::Completion { .. } | Commands::Config { .. } => Ok(()),
    }
}
