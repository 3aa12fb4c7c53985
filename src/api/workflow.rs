//! Workflow template handler.

use axum::Json;

use crate::api::types::WorkflowTemplateResponse;
use crate::http::response::ApiError;
use crate::security::DeviceId;
use crate::workflow::workflow_template;

/// `GET /api/workflow-template/{user_id}`
pub async fn template(device: DeviceId) -> Result<Json<WorkflowTemplateResponse>, ApiError> {
    let template = workflow_template(device.as_str()).map_err(|e| {
        tracing::error!(error = %e, "Bundled workflow template is not valid JSON");
        ApiError::Internal
    })?;

    Ok(Json(WorkflowTemplateResponse {
        success: true,
        template,
        user_id: device,
    }))
}
