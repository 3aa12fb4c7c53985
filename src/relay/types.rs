//! Relay targets, REST filters, and error definitions.

use std::fmt;
use thiserror::Error;

/// Errors that can occur while calling an upstream API.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Upstream answered with a non-success status.
    #[error("upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    /// Connection, TLS, or timeout failure.
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Upstream body was not JSON.
    #[error("invalid upstream response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Request body could not be serialized.
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// Base URL plus target did not form a valid URL.
    #[error("invalid upstream URL: {0}")]
    InvalidUrl(String),

    /// API key cannot be carried in an HTTP header.
    #[error("API key is not a valid header value")]
    InvalidCredential,
}

impl RelayError {
    /// HTTP status reported by the upstream, if it answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            RelayError::Upstream { status, .. } => Some(*status),
            RelayError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Result type for relay operations.
pub type RelayResult<T> = Result<T, RelayError>;

/// What a relay call addresses on the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A server-side function, `/rest/v1/rpc/<name>`.
    Rpc(String),
    /// A table, `/rest/v1/<name>`.
    Table(String),
}

impl Target {
    pub fn rpc(name: impl Into<String>) -> Self {
        Target::Rpc(name.into())
    }

    pub fn table(name: impl Into<String>) -> Self {
        Target::Table(name.into())
    }

    /// Path relative to the platform base URL.
    pub fn path(&self) -> String {
        match self {
            Target::Rpc(name) => format!("/rest/v1/rpc/{}", name),
            Target::Table(name) => format!("/rest/v1/{}", name),
        }
    }

    /// Short label for logs and metrics.
    pub fn label(&self) -> &str {
        match self {
            Target::Rpc(name) | Target::Table(name) => name,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// REST filter operators (`column=op.value`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Gt,
}

impl FilterOp {
    fn as_str(self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Gt => "gt",
        }
    }
}

/// A single row filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: String,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl fmt::Display) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::Eq,
            value: value.to_string(),
        }
    }

    pub fn gt(column: impl Into<String>, value: impl fmt::Display) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::Gt,
            value: value.to_string(),
        }
    }

    /// Query pair, unencoded.
    pub fn to_query_pair(&self) -> (String, String) {
        (self.column.clone(), format!("{}.{}", self.op.as_str(), self.value))
    }
}
