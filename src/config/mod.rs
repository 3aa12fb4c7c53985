//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! .env (dotenvy, read by main)
//!     → config file (TOML, optional)
//!     → loader.rs (parse, deserialize, environment overrides)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_config_with, ConfigError};
pub use schema::{
    BaasConfig, ListenerConfig, ObservabilityConfig, RateLimitConfig, SecurityConfig,
    ServiceConfig, SubscriptionConfig, TimeoutConfig, TlsConfig, WorkflowConfig,
};
