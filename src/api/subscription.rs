//! Subscription handlers, including the onboarding flow.

use axum::extract::State;
use axum::Json;
use serde_json::Value;

use crate::api::types::{
    first_row, CreateSubscriptionRequest, SubscriptionCreatedResponse, SubscriptionRecord,
    SubscriptionStatusResponse, SubscriptionWithWorkflowRequest, SubscriptionWithWorkflowResponse,
    WelcomeVariableOutcome, WorkflowOutcome,
};
use crate::api::variables::insert_variable;
use crate::clock::to_iso8601;
use crate::http::request::JsonBody;
use crate::http::response::{ApiError, UpstreamOp};
use crate::http::server::AppState;
use crate::relay::{Filter, RelayRequest, RelayResult, Target};
use crate::security::DeviceId;
use crate::workflow::{default_welcome_variables, workflow_template, WorkflowTarget};

/// `GET /api/subscription/{user_id}`
///
/// The platform does the expiry comparison: only rows with `expires_at`
/// after the current instant come back.
pub async fn status(
    State(state): State<AppState>,
    device: DeviceId,
) -> Result<Json<SubscriptionStatusResponse>, ApiError> {
    let now = to_iso8601(&state.clock.utc_now());
    tracing::info!(device_id = %device, "Checking subscription");

    let request = RelayRequest::get(Target::table(&state.config.baas.subscriptions_table))
        .filter(Filter::eq("user_id", &device))
        .filter(Filter::gt("expires_at", &now));

    let data = state
        .baas
        .call(request)
        .await
        .map_err(ApiError::upstream(UpstreamOp::SubscriptionCheck))?;

    let active = match data {
        Value::Array(rows) => rows.into_iter().next(),
        _ => None,
    };
    tracing::debug!(active = active.is_some(), "Subscription checked");

    Ok(Json(SubscriptionStatusResponse {
        success: true,
        has_active_subscription: active.is_some(),
        subscription: active.unwrap_or(Value::Null),
        user_id: device,
    }))
}

/// `POST /api/subscription/{user_id}`
pub async fn create(
    State(state): State<AppState>,
    device: DeviceId,
    JsonBody(body): JsonBody<CreateSubscriptionRequest>,
) -> Result<Json<SubscriptionCreatedResponse>, ApiError> {
    let plan = body.plan.as_deref().unwrap_or(&state.config.subscription.default_plan);
    tracing::info!(device_id = %device, plan = %plan, "Creating subscription");

    let subscription = insert_subscription(&state, &device, plan)
        .await
        .map_err(ApiError::upstream(UpstreamOp::SubscriptionCreate))?;

    Ok(Json(SubscriptionCreatedResponse {
        success: true,
        subscription,
        message: "Subscription activated",
    }))
}

/// `POST /api/subscription/{user_id}/with-workflow`
///
/// Only the subscription insert is fatal. Welcome variables and the workflow
/// are attempted afterwards and reported individually; nothing is rolled back.
pub async fn create_with_workflow(
    State(state): State<AppState>,
    device: DeviceId,
    JsonBody(body): JsonBody<SubscriptionWithWorkflowRequest>,
) -> Result<Json<SubscriptionWithWorkflowResponse>, ApiError> {
    let plan = body.plan.as_deref().unwrap_or(&state.config.subscription.default_plan);
    tracing::info!(
        device_id = %device,
        plan = %plan,
        workflow = body.workflow.is_some(),
        "Creating subscription with workflow"
    );

    let started_at = state.clock.utc_now();
    let subscription = insert_subscription(&state, &device, plan)
        .await
        .map_err(ApiError::upstream(UpstreamOp::SubscriptionCreate))?;

    let welcome = match body.welcome_variables {
        Some(vars) if !vars.is_empty() => vars,
        _ => default_welcome_variables(plan, &to_iso8601(&started_at)),
    };

    let mut welcome_variables = Vec::with_capacity(welcome.len());
    for var in &welcome {
        let outcome =
            match insert_variable(&state, &device, &var.key, &var.value, var.description.as_deref()).await {
                Ok(_) => WelcomeVariableOutcome {
                    key: var.key.clone(),
                    success: true,
                    error: None,
                },
                Err(e) => {
                    tracing::warn!(device_id = %device, key = %var.key, error = %e, "Welcome variable not saved");
                    WelcomeVariableOutcome {
                        key: var.key.clone(),
                        success: false,
                        error: Some(e.to_string()),
                    }
                }
            };
        welcome_variables.push(outcome);
    }

    let workflow = match &body.workflow {
        Some(target) => create_workflow(&state, &device, target).await,
        None => WorkflowOutcome::default(),
    };

    Ok(Json(SubscriptionWithWorkflowResponse {
        success: true,
        subscription,
        welcome_variables,
        workflow,
        message: "Subscription activated",
    }))
}

async fn insert_subscription(state: &AppState, device: &DeviceId, plan: &str) -> RelayResult<Value> {
    let record = SubscriptionRecord::starting(
        device.as_str(),
        plan,
        state.clock.utc_now(),
        state.config.subscription.trial_days,
    );

    let request = RelayRequest::post(Target::table(&state.config.baas.subscriptions_table))
        .json(&record)?
        .return_representation();
    state.baas.call(request).await.map(first_row)
}

async fn create_workflow(state: &AppState, device: &DeviceId, target: &WorkflowTarget) -> WorkflowOutcome {
    let mut document = match workflow_template(device.as_str()) {
        Ok(document) => document,
        Err(e) => {
            tracing::error!(error = %e, "Bundled workflow template is not valid JSON");
            return WorkflowOutcome {
                attempted: false,
                success: false,
                data: None,
                error: Some(e.to_string()),
            };
        }
    };
    if let (Some(name), Some(fields)) = (&target.name, document.as_object_mut()) {
        fields.insert("name".to_string(), Value::String(name.clone()));
    }

    match state.workflows.create(target, &document).await {
        Ok(data) => WorkflowOutcome {
            attempted: true,
            success: true,
            data: Some(data),
            error: None,
        },
        Err(e) => WorkflowOutcome {
            attempted: true,
            success: false,
            data: None,
            error: Some(e.to_string()),
        },
    }
}
