//! neightn backend relay binary.
//!
//! Startup order: `.env` → configuration → logging → metrics → listener.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use neightn_backend::config::{load_config, ObservabilityConfig};
use neightn_backend::lifecycle;
use neightn_backend::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "neightn-backend")]
#[command(about = "Credential-hiding relay between the neightn app and its data platform", long_about = None)]
struct Cli {
    /// TOML configuration file; optional, environment variables suffice.
    #[arg(short, long, default_value = "neightn.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // A missing .env is normal outside development.
    dotenvy::dotenv().ok();

    let config = match load_config(Some(&cli.config)) {
        Ok(config) => config,
        Err(e) => {
            init_logging(&ObservabilityConfig::default());
            tracing::error!(path = ?cli.config, error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "neightn-backend starting");

    if let Err(e) = lifecycle::run(config).await {
        tracing::error!(error = %e, "Server failed");
        return ExitCode::FAILURE;
    }

    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}
