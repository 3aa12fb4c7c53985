//! neightn backend relay.
//!
//! Keeps the data platform's credentials off the mobile app: requests are
//! validated, rate limited, and forwarded to a fixed set of REST/RPC
//! endpoints with the key injected server-side.

// Core subsystems
pub mod api;
pub mod config;
pub mod http;
pub mod relay;
pub mod workflow;

// Cross-cutting concerns
pub mod clock;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::schema::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
