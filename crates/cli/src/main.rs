//! Parley CLI — the main entry point.
//!
//! Commands:
//! - `serve`   — Start the chat page and HTTP API (default)
//! - `chat`    — Terminal chat, single-message or interactive
//! - `doctor`  — Check configuration and credentials

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "parley",
    about = "Parley — a minimal chatbot for OpenAI-compatible model APIs",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// Start the chat page and HTTP API
    Serve {
        /// Override the bind address
        #[arg(long)]
        host: Option<String>,

        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Chat from the terminal
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Reply language (defaults to prompt.default_language)
        #[arg(short, long)]
        language: Option<String>,

        /// Continue an existing thread
        #[arg(short, long)]
        thread: Option<String>,
    },

    /// Check configuration and credentials
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command.unwrap_or(Commands::Serve {
        host: None,
        port: None,
    }) {
        Commands::Serve { host, port } => commands::serve::run(host, port).await?,
        Commands::Chat {
            message,
            language,
            thread,
        } => commands::chat::run(message, language, thread).await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["parley"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn serve_overrides() {
        let cli = Cli::try_parse_from(["parley", "serve", "--host", "0.0.0.0", "-p", "9000"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Serve {
                host: Some("0.0.0.0".into()),
                port: Some(9000),
            })
        );
    }

    #[test]
    fn chat_flags_and_global_verbose() {
        let cli = Cli::try_parse_from([
            "parley", "chat", "-m", "What is AI?", "-l", "French", "-t", "abc", "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(
            cli.command,
            Some(Commands::Chat {
                message: Some("What is AI?".into()),
                language: Some("French".into()),
                thread: Some("abc".into()),
            })
        );
    }

    #[test]
    fn rejects_bad_port() {
        assert!(Cli::try_parse_from(["parley", "serve", "--port", "99999"]).is_err());
    }
}
