//! Response envelope and error mapping.
//!
//! # Responsibilities
//! - Map every failure to `{error, code, details?}` with a fixed status
//! - Attach upstream status/body as `details` for relay failures
//! - Keep panics and other internal faults opaque to the caller
//!
//! # Design Decisions
//! - Error codes are stable strings the mobile app switches on
//! - Each route names its own upstream failure code

use std::any::Any;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::relay::RelayError;

/// Which route-level operation an upstream failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamOp {
    VariablesFetch,
    VariableSave,
    VariableDelete,
    SubscriptionCheck,
    SubscriptionCreate,
}

impl UpstreamOp {
    pub fn code(self) -> &'static str {
        match self {
            UpstreamOp::VariablesFetch => "VARIABLES_FETCH_ERROR",
            UpstreamOp::VariableSave => "VARIABLE_SAVE_ERROR",
            UpstreamOp::VariableDelete => "VARIABLE_DELETE_ERROR",
            UpstreamOp::SubscriptionCheck => "SUBSCRIPTION_CHECK_ERROR",
            UpstreamOp::SubscriptionCreate => "SUBSCRIPTION_CREATE_ERROR",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            UpstreamOp::VariablesFetch => "Failed to fetch variables",
            UpstreamOp::VariableSave => "Failed to save variable",
            UpstreamOp::VariableDelete => "Failed to delete variable",
            UpstreamOp::SubscriptionCheck => "Failed to check subscription",
            UpstreamOp::SubscriptionCreate => "Failed to create subscription",
        }
    }
}

/// Errors returned by route handlers and middleware.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid device ID format")]
    InvalidDeviceId,

    #[error("Invalid path parameter")]
    InvalidPathParam(String),

    #[error("Key and value are required")]
    MissingRequiredFields,

    #[error("Request body is not valid JSON")]
    InvalidJson(String),

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Too many requests")]
    RateLimited { retry_after_secs: u64 },

    #[error("Endpoint not found")]
    NotFound,

    #[error("{}", .op.message())]
    Upstream {
        op: UpstreamOp,
        #[source]
        source: RelayError,
    },

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    /// Adapter for `map_err` on relay results.
    pub fn upstream(op: UpstreamOp) -> impl FnOnce(RelayError) -> ApiError {
        move |source| ApiError::Upstream { op, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidDeviceId
            | ApiError::InvalidPathParam(_)
            | ApiError::MissingRequiredFields
            | ApiError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Upstream { .. } | ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidDeviceId => "INVALID_DEVICE_ID",
            ApiError::InvalidPathParam(_) => "INVALID_PATH_PARAM",
            ApiError::MissingRequiredFields => "MISSING_REQUIRED_FIELDS",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            ApiError::RateLimited { .. } => "RATE_LIMIT_EXCEEDED",
            ApiError::NotFound => "NOT_FOUND",
            ApiError::Upstream { op, .. } => op.code(),
            ApiError::Internal => "INTERNAL_ERROR",
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            ApiError::InvalidPathParam(key) => Some(format!("`{key}` is not valid UTF-8")),
            ApiError::InvalidJson(reason) => Some(reason.clone()),
            ApiError::Upstream { source, .. } => Some(source.to_string()),
            _ => None,
        }
    }
}

/// Wire shape of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
            code: self.code(),
            details: self.details(),
        };
        let mut response = (self.status(), Json(body)).into_response();

        if let ApiError::RateLimited { retry_after_secs } = self {
            if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

/// Fallback for unmatched routes and unsupported methods.
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Convert a caught handler panic into an opaque 500.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %detail, "Unexpected error while handling request");
    ApiError::Internal.into_response()
}
