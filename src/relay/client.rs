//! BaaS relay client.
//!
//! # Responsibilities
//! - Build one outbound request per relay call against the platform base URL
//! - Attach the API key as `apikey` and as the bearer token
//! - Refuse caller attempts to set either authentication header
//! - Decode the JSON body, or fail with the upstream status and text

use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, Response};
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::config::BaasConfig;
use crate::observability::metrics;
use crate::relay::types::{Filter, RelayError, RelayResult, Target};

const APIKEY: HeaderName = HeaderName::from_static("apikey");
const PREFER: HeaderName = HeaderName::from_static("prefer");

/// One outbound call, described independently of credentials.
#[derive(Debug, Clone)]
pub struct RelayRequest {
    pub target: Target,
    pub method: Method,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub headers: HeaderMap,
}

impl RelayRequest {
    pub fn new(method: Method, target: Target) -> Self {
        Self {
            target,
            method,
            query: Vec::new(),
            body: None,
            headers: HeaderMap::new(),
        }
    }

    pub fn get(target: Target) -> Self {
        Self::new(Method::GET, target)
    }

    pub fn post(target: Target) -> Self {
        Self::new(Method::POST, target)
    }

    pub fn delete(target: Target) -> Self {
        Self::new(Method::DELETE, target)
    }

    /// Add a plain query parameter (e.g. an RPC argument).
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Add a row filter.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.query.push(filter.to_query_pair());
        self
    }

    /// Attach a JSON body.
    pub fn json<T: Serialize>(mut self, body: &T) -> RelayResult<Self> {
        self.body = Some(serde_json::to_value(body).map_err(RelayError::Encode)?);
        Ok(self)
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Ask the platform to echo inserted rows back.
    pub fn return_representation(self) -> Self {
        self.header(PREFER, HeaderValue::from_static("return=representation"))
    }
}

/// Client for the BaaS REST/RPC interface.
#[derive(Clone)]
pub struct BaasClient {
    http: Client,
    base_url: String,
    apikey: HeaderValue,
    bearer: HeaderValue,
}

impl BaasClient {
    /// Create a new client from validated configuration.
    pub fn new(config: &BaasConfig, timeout: Duration) -> RelayResult<Self> {
        Url::parse(&config.url).map_err(|e| RelayError::InvalidUrl(format!("{}: {}", config.url, e)))?;

        let mut apikey =
            HeaderValue::from_str(&config.api_key).map_err(|_| RelayError::InvalidCredential)?;
        apikey.set_sensitive(true);
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|_| RelayError::InvalidCredential)?;
        bearer.set_sensitive(true);

        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            apikey,
            bearer,
        })
    }

    /// Full URL for a request, with its query string encoded.
    pub fn url_for(&self, request: &RelayRequest) -> RelayResult<Url> {
        let raw = format!("{}{}", self.base_url, request.target.path());
        let mut url = Url::parse(&raw).map_err(|e| RelayError::InvalidUrl(format!("{}: {}", raw, e)))?;
        if !request.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in &request.query {
                pairs.append_pair(name, value);
            }
        }
        Ok(url)
    }

    /// Headers sent with a request: caller headers minus any credential
    /// overrides, then the platform credentials.
    fn headers_for(&self, request: &RelayRequest) -> HeaderMap {
        let mut headers = HeaderMap::with_capacity(request.headers.len() + 3);
        for (name, value) in &request.headers {
            if *name == APIKEY || *name == AUTHORIZATION {
                tracing::warn!(header = %name, target = %request.target, "Dropping caller-supplied credential header");
                continue;
            }
            headers.append(name.clone(), value.clone());
        }
        headers.insert(APIKEY, self.apikey.clone());
        headers.insert(AUTHORIZATION, self.bearer.clone());
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    /// Perform one relay call and return the decoded JSON body.
    pub async fn call(&self, request: RelayRequest) -> RelayResult<Value> {
        let start = Instant::now();
        let label = request.target.label().to_string();
        let url = self.url_for(&request)?;

        tracing::debug!(method = %request.method, target = %request.target, "Calling upstream");

        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .headers(self.headers_for(&request));
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let result = match builder.send().await {
            Ok(response) => read_json(response).await,
            Err(e) => Err(RelayError::from(e)),
        };

        match &result {
            Ok(_) => metrics::record_relay_call(&label, "ok", start),
            Err(e) => {
                tracing::error!(method = %request.method, target = %request.target, error = %e, "Upstream call failed");
                metrics::record_relay_call(&label, "error", start);
            }
        }
        result
    }
}

/// Decode an upstream response.
///
/// Non-success statuses become [`RelayError::Upstream`] with the body text;
/// an empty success body (e.g. `204 No Content`) decodes to `null`.
pub async fn read_json(response: Response) -> RelayResult<Value> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        return Err(RelayError::Upstream {
            status: status.as_u16(),
            body: text,
        });
    }

    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&text)?)
}
