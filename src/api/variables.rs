//! Per-device variable handlers.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde_json::Value;

use crate::api::types::{
    CreateVariableRequest, MutationResponse, VariableRecord, VariablesQuery, VariablesResponse,
};
use crate::clock::to_iso8601;
use crate::http::request::JsonBody;
use crate::http::response::{ApiError, UpstreamOp};
use crate::http::server::AppState;
use crate::relay::{Filter, RelayRequest, RelayResult, Target};
use crate::security::DeviceId;

/// `GET /api/variables/{user_id}[?key=]`
pub async fn list(
    State(state): State<AppState>,
    device: DeviceId,
    Query(query): Query<VariablesQuery>,
) -> Result<Json<VariablesResponse>, ApiError> {
    let key = query.key.filter(|k| !k.is_empty());
    tracing::info!(device_id = %device, key = key.as_deref().unwrap_or("all"), "Fetching variables");

    let mut request = RelayRequest::get(Target::rpc(&state.config.baas.variables_rpc))
        .param("p_user_id", device.as_str());
    if let Some(key) = key {
        request = request.param("p_key", key);
    }

    let data = state
        .baas
        .call(request)
        .await
        .map_err(ApiError::upstream(UpstreamOp::VariablesFetch))?;

    tracing::debug!(
        count = data.as_array().map(Vec::len),
        "Variables fetched"
    );

    Ok(Json(VariablesResponse {
        success: true,
        data,
        user_id: device,
    }))
}

/// `POST /api/variables/{user_id}`
pub async fn create(
    State(state): State<AppState>,
    device: DeviceId,
    JsonBody(body): JsonBody<CreateVariableRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    let (key, value) = body.required_fields().ok_or(ApiError::MissingRequiredFields)?;
    tracing::info!(device_id = %device, key = %key, "Saving variable");

    let data = insert_variable(&state, &device, &key, value, body.description.as_deref())
        .await
        .map_err(ApiError::upstream(UpstreamOp::VariableSave))?;

    Ok(Json(MutationResponse {
        success: true,
        data: Some(data),
        message: "Variable saved",
    }))
}

/// `DELETE /api/variables/{user_id}/{key}`
pub async fn remove(
    State(state): State<AppState>,
    device: DeviceId,
    Path((_, key)): Path<(String, String)>,
) -> Result<Json<MutationResponse>, ApiError> {
    tracing::info!(device_id = %device, key = %key, "Deleting variable");

    let request = RelayRequest::delete(Target::table(&state.config.baas.variables_table))
        .filter(Filter::eq("user_id", &device))
        .filter(Filter::eq("key", &key));

    state
        .baas
        .call(request)
        .await
        .map_err(ApiError::upstream(UpstreamOp::VariableDelete))?;

    Ok(Json(MutationResponse {
        success: true,
        data: None,
        message: "Variable deleted",
    }))
}

/// Insert one variable row and return the platform's representation of it.
pub(crate) async fn insert_variable(
    state: &AppState,
    device: &DeviceId,
    key: &str,
    value: &Value,
    description: Option<&str>,
) -> RelayResult<Value> {
    let record = VariableRecord {
        user_id: device.as_str(),
        key,
        value,
        description: description.unwrap_or_default(),
        variable_type: "string",
        updated_at: to_iso8601(&state.clock.utc_now()),
    };

    let request = RelayRequest::post(Target::table(&state.config.baas.variables_table))
        .json(&record)?
        .return_representation();
    state.baas.call(request).await
}
