//! Shared utilities for integration tests.
//!
//! `MockBaas` is a tiny in-memory stand-in for the data platform: tables are
//! vectors of JSON rows, `eq`/`gt` filters are evaluated on read and delete,
//! and every call is recorded so tests can assert on what went upstream.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, Method, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use neightn_backend::clock::Clock;
use neightn_backend::config::ServiceConfig;
use neightn_backend::http::HttpServer;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower::ServiceExt;

pub const API_KEY: &str = "test-anon-key";
pub const DEVICE: &str = "123e4567-e89b-12d3-a456-426614174000";

/// One request received by the mock.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: Value,
}

impl RecordedCall {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[derive(Default)]
struct MockState {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    calls: Mutex<Vec<RecordedCall>>,
    failures: Mutex<HashMap<String, (u16, String)>>,
}

/// Handle to a running mock platform.
#[derive(Clone)]
pub struct MockBaas {
    pub addr: SocketAddr,
    state: Arc<MockState>,
}

impl MockBaas {
    /// Serve the mock on an ephemeral local port.
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let app = Router::new().fallback(handle).with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.calls.lock().unwrap().len()
    }

    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.state
            .tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    pub fn insert(&self, table: &str, row: Value) {
        self.state
            .tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .push(row);
    }

    /// Make every call whose last path segment is `name` fail.
    pub fn fail(&self, name: &str, status: u16, body: &str) {
        self.state
            .failures
            .lock()
            .unwrap()
            .insert(name.to_string(), (status, body.to_string()));
    }
}

async fn handle(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let query: Vec<(String, String)> = url::form_urlencoded::parse(uri.query().unwrap_or("").as_bytes())
        .into_owned()
        .collect();
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    state.calls.lock().unwrap().push(RecordedCall {
        method: method.clone(),
        path: path.clone(),
        query: query.clone(),
        headers,
        body: body.clone(),
    });

    let name = path.rsplit('/').next().unwrap_or_default().to_string();
    if let Some((status, text)) = state.failures.lock().unwrap().get(&name).cloned() {
        let status = StatusCode::from_u16(status).unwrap();
        return (status, text).into_response();
    }

    if path == "/api/v1/workflows" {
        let mut created = body;
        created["id"] = json!("wf-1");
        return Json(created).into_response();
    }

    if let Some(function) = path.strip_prefix("/rest/v1/rpc/") {
        return rpc(&state, function, &query).into_response();
    }

    let Some(table) = path.strip_prefix("/rest/v1/") else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let mut tables = state.tables.lock().unwrap();
    let rows = tables.entry(table.to_string()).or_default();
    match method {
        Method::GET => {
            let matched: Vec<Value> = rows.iter().filter(|r| matches(r, &query)).cloned().collect();
            Json(Value::Array(matched)).into_response()
        }
        Method::POST => {
            let inserted = match body {
                Value::Array(items) => items,
                other => vec![other],
            };
            rows.extend(inserted.iter().cloned());
            (StatusCode::CREATED, Json(Value::Array(inserted))).into_response()
        }
        Method::DELETE => {
            rows.retain(|r| !matches(r, &query));
            StatusCode::NO_CONTENT.into_response()
        }
        _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
    }
}

fn rpc(state: &MockState, function: &str, query: &[(String, String)]) -> Json<Value> {
    assert_eq!(function, "get_user_variables");
    let param = |name: &str| query.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone());
    let user = param("p_user_id");
    let key = param("p_key");

    let tables = state.tables.lock().unwrap();
    let rows = tables
        .get("global_variables")
        .map(|rows| {
            rows.iter()
                .filter(|r| r["user_id"].as_str() == user.as_deref())
                .filter(|r| key.is_none() || r["key"].as_str() == key.as_deref())
                .cloned()
                .collect::<Vec<Value>>()
        })
        .unwrap_or_default();
    Json(Value::Array(rows))
}

/// Evaluate `column=op.value` filters against a row.
fn matches(row: &Value, filters: &[(String, String)]) -> bool {
    filters.iter().all(|(column, filter)| {
        let field = row[column.as_str()].as_str().unwrap_or_default();
        match filter.split_once('.') {
            Some(("eq", value)) => field == value,
            Some(("gt", value)) => field > value,
            _ => true,
        }
    })
}

/// Service configuration pointing at `mock`.
pub fn config_for(mock: &MockBaas) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.baas.url = mock.url();
    config.baas.api_key = API_KEY.to_string();
    config
}

/// Build the fully layered service router.
pub fn app(config: ServiceConfig, clock: Arc<dyn Clock>) -> Router {
    HttpServer::with_clock(config, clock).unwrap().router()
}

/// Send one request through `app` and decode the JSON response.
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, body)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}
