//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → rate_limit.rs (check per-client window)
//!     → headers.rs (CORS, hardening response headers)
//!     → validation.rs (device id format, inside handlers)
//!     → Pass to route handler
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any security check failure
//! - No trust in client input
//! - Credentials never leave the relay module

pub mod headers;
pub mod rate_limit;
pub mod validation;

pub use rate_limit::{FixedWindowLimiter, RateLimitDecision, RateLimiter};
pub use validation::{is_valid_device_id, DeviceId};
