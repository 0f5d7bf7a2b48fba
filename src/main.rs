//! Spectra: share links, pastes and files with a Spectra server.
//!
//! Entry point that loads configuration, initialises logging, wires the
//! client stack and runs the requested command.

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use spectra_cli::Cli;
use spectra_cli::output;
use spectra_client::SpectraClient;
use spectra_core::config::ClientConfig;
use spectra_core::error::AppError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_configuration(&cli) {
        Ok(c) => c,
        Err(e) => {
            output::print_error(&format!("Failed to load configuration: {e}"));
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(&cli, &config).await {
        tracing::debug!(kind = %e.kind, status = ?e.status, "Command failed: {}", e.message);
        output::print_error(&e.user_message());
        std::process::exit(1);
    }
}

/// Load configuration from files and environment
fn load_configuration(cli: &Cli) -> Result<ClientConfig, AppError> {
    let env = std::env::var("SPECTRA_ENV").unwrap_or_else(|_| cli.env.clone());
    ClientConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &ClientConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

/// Build the client and run the command
async fn run(cli: &Cli, config: &ClientConfig) -> Result<(), AppError> {
    tracing::debug!(
        base_url = %config.server.base_url,
        version = env!("CARGO_PKG_VERSION"),
        "Starting Spectra client"
    );
    let client = SpectraClient::from_config(config)?;
    cli.execute(&client).await
}
