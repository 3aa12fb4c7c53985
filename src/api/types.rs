//! Request bodies, upstream rows, and response envelopes.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::clock::to_iso8601;
use crate::security::DeviceId;
use crate::workflow::{WelcomeVariable, WorkflowTarget};

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct VariablesQuery {
    pub key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateVariableRequest {
    pub key: Option<Value>,
    pub value: Option<Value>,
    pub description: Option<String>,
}

impl CreateVariableRequest {
    /// `key` and `value` must be present and truthy. A non-string key is
    /// stored in its JSON text form.
    pub fn required_fields(&self) -> Option<(String, &Value)> {
        let key = self.key.as_ref().filter(|k| !is_falsy(k))?;
        let value = self.value.as_ref().filter(|v| !is_falsy(v))?;
        let key = match key {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        Some((key, value))
    }
}

/// `null`, `false`, `0` and `""` count as missing.
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateSubscriptionRequest {
    pub plan: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionWithWorkflowRequest {
    pub plan: Option<String>,
    pub welcome_variables: Option<Vec<WelcomeVariable>>,
    pub workflow: Option<WorkflowTarget>,
}

// ---------------------------------------------------------------------------
// Upstream rows
// ---------------------------------------------------------------------------

/// Row inserted into the variables table.
#[derive(Debug, Clone, Serialize)]
pub struct VariableRecord<'a> {
    pub user_id: &'a str,
    pub key: &'a str,
    pub value: &'a Value,
    pub description: &'a str,
    pub variable_type: &'static str,
    pub updated_at: String,
}

/// Row inserted into the subscriptions table.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionRecord<'a> {
    pub user_id: &'a str,
    pub status: &'a str,
    pub expires_at: String,
    pub started_at: String,
    pub created_at: String,
}

impl<'a> SubscriptionRecord<'a> {
    /// A subscription starting `now` and lasting `days`.
    pub fn starting(user_id: &'a str, plan: &'a str, now: DateTime<Utc>, days: u32) -> Self {
        let started = to_iso8601(&now);
        Self {
            user_id,
            status: plan,
            expires_at: to_iso8601(&(now + Duration::days(i64::from(days)))),
            started_at: started.clone(),
            created_at: started,
        }
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub server: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariablesResponse {
    pub success: bool,
    pub data: Value,
    pub user_id: DeviceId,
}

#[derive(Debug, Serialize)]
pub struct MutationResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatusResponse {
    pub success: bool,
    pub has_active_subscription: bool,
    pub subscription: Value,
    pub user_id: DeviceId,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionCreatedResponse {
    pub success: bool,
    pub subscription: Value,
    pub message: &'static str,
}

/// Outcome of one welcome-variable insert.
#[derive(Debug, Serialize)]
pub struct WelcomeVariableOutcome {
    pub key: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of the optional workflow creation.
#[derive(Debug, Default, Serialize)]
pub struct WorkflowOutcome {
    pub attempted: bool,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionWithWorkflowResponse {
    pub success: bool,
    pub subscription: Value,
    pub welcome_variables: Vec<WelcomeVariableOutcome>,
    pub workflow: WorkflowOutcome,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowTemplateResponse {
    pub success: bool,
    pub template: Value,
    pub user_id: DeviceId,
}

/// First row of an upstream array, or the value itself when it is not one.
pub fn first_row(data: Value) -> Value {
    match data {
        Value::Array(mut rows) if !rows.is_empty() => rows.swap_remove(0),
        other => other,
    }
}
