//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, tracing span, JSON body)
//!     → api (route handlers)
//!     → response.rs (success body or error envelope)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{JsonBody, X_REQUEST_ID};
pub use response::{ApiError, ErrorBody, UpstreamOp};
pub use server::{AppState, HttpServer};
