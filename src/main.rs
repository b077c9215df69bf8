//! CloudNest administrative CLI.
//!
//! Wires configuration, logging, the metadata store and the physical store
//! together, then runs one command as an explicit `--as` user.

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use cloudnest_core::config::{LogFormat, LoggingConfig};

mod app;
mod commands;
mod output;

use commands::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match commands::load_config(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config.logging);

    if let Err(e) = cli.execute(&config).await {
        // Rejected input exits with 2, system failures with 1.
        let code = if e.kind.is_client_error() {
            tracing::debug!(error = ?e, "Command rejected");
            2
        } else {
            tracing::error!(error = ?e, "Command failed");
            1
        };
        eprintln!("Error: {}", e);
        std::process::exit(code);
    }
}

/// Initialize tracing. Logs go to stderr so command output stays parseable.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    match logging.format {
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Pretty => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
