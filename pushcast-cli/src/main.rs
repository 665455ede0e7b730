mod cli;

use anyhow::Result;
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use cli::{handlers, send};
use pushcast_core::models::LogLevel;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pushcast")]
#[command(version)]
#[command(about = "Multicast push notifications to device tokens through Firebase Cloud Messaging")]
#[command(after_help = "Examples:
  pushcast --tokens tokens.txt --payload payload.json
  pushcast --tokens-str tokenA,tokenB --payload-str '{\"notification\":{\"title\":\"Hi\"}}'
  pushcast --tokens tokens.txt --payload payload.json --dry-run
  pushcast serve --port 3000")]
struct Cli {
    #[command(flatten)]
    send: send::SendArgs,

    /// Path to configuration file (default: <config dir>/pushcast/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level: error, warn, info, debug or trace (RUST_LOG takes precedence)
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the local web UI for composing, sending and saving messages
    Serve {
        /// Server bind address
        #[arg(long)]
        host: Option<String>,

        /// Server port number
        #[arg(long)]
        port: Option<u16>,

        /// Directory holding saved templates
        #[arg(long, value_name = "DIR")]
        data_dir: Option<PathBuf>,
    },

    /// Repair trailing commas in a JSON document and pretty-print it
    Format {
        /// Read the JSON from a file
        #[arg(long, value_name = "FILE")]
        file: Option<PathBuf>,

        /// JSON text given inline
        #[arg(long = "str", value_name = "JSON")]
        text: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Usage errors exit 1 like every other failure; help and version exit 0
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
            _ => {
                let _ = err.print();
                std::process::exit(1);
            }
        },
    };

    let config = handlers::load_config(cli.config.as_deref())?;
    let level = cli.log_level.unwrap_or(config.log_level);
    pushcast_core::services::logging::init_logging(level)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    match cli.command {
        Some(Commands::Serve {
            host,
            port,
            data_dir,
        }) => {
            handlers::handle_serve(config, host, port, data_dir).await?;
        }
        Some(Commands::Format { file, text }) => {
            handlers::handle_format(file, text)?;
        }
        None => {
            send::handle_send(&cli.send, || handlers::build_sender(&config)).await?;
        }
    }

    Ok(())
}
