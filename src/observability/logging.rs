//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once at startup
//! - Honour `RUST_LOG`, falling back to the configured level
//! - Pretty output for development, JSON lines for production
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - A bare level ("debug") scopes to this crate and tower_http;
//!   anything else is taken as a full filter directive

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Filter directive derived from the configured log level.
pub fn default_directive(log_level: &str) -> String {
    let level = log_level.trim().to_ascii_lowercase();
    if LEVELS.contains(&level.as_str()) {
        format!("neightn_backend={level},tower_http={level}")
    } else {
        log_level.trim().to_string()
    }
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init_logging(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(&config.log_level)));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
