//! Client for the external workflow-automation API.
//!
//! Base URL and API key come from the caller, per request. Calls are
//! best-effort: the outcome is reported, never retried.

use std::time::Duration;

use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::config::WorkflowConfig;
use crate::observability::metrics;
use crate::relay::{read_json, RelayError, RelayResult};

/// Where to create the workflow, supplied by the client.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowTarget {
    pub base_url: String,
    pub api_key: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl std::fmt::Debug for WorkflowTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowTarget")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("name", &self.name)
            .finish()
    }
}

#[derive(Clone)]
pub struct WorkflowClient {
    http: Client,
    api_path: String,
    api_key_header: HeaderName,
}

impl WorkflowClient {
    pub fn new(config: &WorkflowConfig) -> RelayResult<Self> {
        let api_key_header = HeaderName::from_bytes(config.api_key_header.as_bytes())
            .map_err(|_| RelayError::InvalidCredential)?;
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            api_path: config.api_path.clone(),
            api_key_header,
        })
    }

    /// Endpoint for `base_url`; only http(s) URLs are accepted.
    pub fn endpoint(&self, base_url: &str) -> RelayResult<Url> {
        let raw = format!("{}{}", base_url.trim_end_matches('/'), self.api_path);
        let url = Url::parse(&raw).map_err(|e| RelayError::InvalidUrl(format!("{}: {}", raw, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(RelayError::InvalidUrl(raw));
        }
        Ok(url)
    }

    /// Create `document` on the target instance.
    pub async fn create(&self, target: &WorkflowTarget, document: &Value) -> RelayResult<Value> {
        let url = self.endpoint(&target.base_url)?;
        let mut key = HeaderValue::from_str(&target.api_key).map_err(|_| RelayError::InvalidCredential)?;
        key.set_sensitive(true);

        tracing::debug!(url = %url, "Creating workflow");
        let result = match self
            .http
            .post(url)
            .header(self.api_key_header.clone(), key)
            .json(document)
            .send()
            .await
        {
            Ok(response) => read_json(response).await,
            Err(e) => Err(RelayError::from(e)),
        };

        match &result {
            Ok(_) => metrics::record_workflow_creation("ok"),
            Err(e) => {
                tracing::warn!(base_url = %target.base_url, error = %e, "Workflow creation failed");
                metrics::record_workflow_creation("error");
            }
        }
        result
    }
}
