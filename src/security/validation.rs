//! Device identifier validation.
//!
//! A device id is the client-generated UUID that scopes every stored row.
//! Only the canonical 8-4-4-4-12 textual form is accepted (any case); the
//! string is forwarded upstream exactly as received.

use std::collections::HashMap;
use std::fmt;

use axum::extract::path::ErrorKind;
use axum::extract::rejection::PathRejection;
use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use serde::Serialize;

use crate::http::response::ApiError;

/// Name of the path segment holding the device id in every route.
pub const DEVICE_ID_PARAM: &str = "user_id";

const GROUPS: [usize; 5] = [8, 4, 4, 4, 12];
const CANONICAL_LEN: usize = 36;

/// Whether `id` is a canonical textual UUID.
pub fn is_valid_device_id(id: &str) -> bool {
    if id.len() != CANONICAL_LEN {
        return false;
    }

    let mut parts = id.split('-');
    for expected in GROUPS {
        match parts.next() {
            Some(part) if part.len() == expected && part.bytes().all(|b| b.is_ascii_hexdigit()) => {}
            _ => return false,
        }
    }
    parts.next().is_none()
}

/// A validated device identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    /// Validate `raw`, rejecting with `INVALID_DEVICE_ID`.
    pub fn parse(raw: &str) -> Result<Self, ApiError> {
        if is_valid_device_id(raw) {
            Ok(Self(raw.to_string()))
        } else {
            tracing::debug!(device_id = %raw, "Rejected malformed device id");
            Err(ApiError::InvalidDeviceId)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extracts and validates the `{user_id}` path segment.
///
/// Undecodable bytes in another segment fail every path extraction, so they
/// are reported as `INVALID_PATH_PARAM` rather than blamed on the device id.
impl<S> FromRequestParts<S> for DeviceId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(path_rejection)?;
        let raw = params.get(DEVICE_ID_PARAM).ok_or(ApiError::InvalidDeviceId)?;
        DeviceId::parse(raw)
    }
}

fn path_rejection(rejection: PathRejection) -> ApiError {
    match rejection {
        PathRejection::FailedToDeserializePathParams(err) => match err.into_kind() {
            ErrorKind::InvalidUtf8InPathParam { key } if key != DEVICE_ID_PARAM => {
                ApiError::InvalidPathParam(key)
            }
            _ => ApiError::InvalidDeviceId,
        },
        _ => ApiError::InvalidDeviceId,
    }
}

impl AsRef<str> for DeviceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
