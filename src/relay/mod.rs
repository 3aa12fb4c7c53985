//! Upstream relay subsystem.
//!
//! # Data Flow
//! ```text
//! Route handler
//!     → RelayRequest (target + method + filters + body)
//!     → client.rs (inject credentials, send, decode)
//!     → serde_json::Value or RelayError
//!     → handler maps RelayError to its route error code
//! ```
//!
//! # Design Decisions
//! - One parameterized call path for every table/RPC operation
//! - The API key is attached here and nowhere else
//! - No retries: upstream failures surface to the caller unchanged

pub mod client;
pub mod types;

pub use client::{read_json, BaasClient, RelayRequest};
pub use types::{Filter, FilterOp, RelayError, RelayResult, Target};
