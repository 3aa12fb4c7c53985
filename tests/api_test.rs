//! Route behavior against the mock platform.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use neightn_backend::clock::SystemClock;
use serde_json::json;

mod common;
use common::{app, config_for, delete, get, post_json, send, MockBaas, API_KEY, DEVICE};

async fn setup() -> (MockBaas, axum::Router) {
    let mock = MockBaas::start().await;
    let app = app(config_for(&mock), Arc::new(SystemClock));
    (mock, app)
}

#[tokio::test]
async fn test_health_never_calls_upstream() {
    let (mock, app) = setup().await;

    let (status, headers, body) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");
    assert_eq!(body["server"], "neightn-backend");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
    assert!(headers.contains_key("x-request-id"));
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_invalid_device_id_rejected_on_every_route() {
    let (mock, app) = setup().await;
    let bad = "not-a-uuid";

    let requests = vec![
        get(&format!("/api/variables/{bad}")),
        post_json(&format!("/api/variables/{bad}"), json!({"key": "k", "value": "v"})),
        delete(&format!("/api/variables/{bad}/k")),
        get(&format!("/api/subscription/{bad}")),
        post_json(&format!("/api/subscription/{bad}"), json!({})),
        post_json(&format!("/api/subscription/{bad}/with-workflow"), json!({})),
        get(&format!("/api/workflow-template/{bad}")),
        // one character short
        get("/api/variables/123e4567-e89b-12d3-a456-42661417400"),
    ];

    for request in requests {
        let uri = request.uri().clone();
        let (status, _, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["code"], "INVALID_DEVICE_ID", "{uri}");
        assert!(body["error"].is_string());
    }
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_list_variables_calls_rpc() {
    let (mock, app) = setup().await;
    mock.insert("global_variables", json!({"user_id": DEVICE, "key": "theme", "value": "dark"}));
    mock.insert("global_variables", json!({"user_id": DEVICE, "key": "lang", "value": "de"}));
    mock.insert("global_variables", json!({"user_id": "someone-else", "key": "theme", "value": "light"}));

    let (status, _, body) = send(&app, get(&format!("/api/variables/{DEVICE}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["userId"], DEVICE);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, _, body) = send(&app, get(&format!("/api/variables/{DEVICE}?key=theme"))).await;
    assert_eq!(body["data"], json!([{"user_id": DEVICE, "key": "theme", "value": "dark"}]));

    let calls = mock.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].path, "/rest/v1/rpc/get_user_variables");
    assert_eq!(calls[0].param("p_user_id"), Some(DEVICE));
    assert_eq!(calls[0].param("p_key"), None);
    assert_eq!(calls[1].param("p_key"), Some("theme"));
}

#[tokio::test]
async fn test_empty_key_query_lists_everything() {
    let (mock, app) = setup().await;

    send(&app, get(&format!("/api/variables/{DEVICE}?key="))).await;

    assert_eq!(mock.calls()[0].param("p_key"), None);
}

#[tokio::test]
async fn test_create_variable_inserts_row() {
    let (mock, app) = setup().await;

    let (status, _, body) = send(
        &app,
        post_json(
            &format!("/api/variables/{DEVICE}"),
            json!({"key": "greeting", "value": "hello"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"][0]["key"], "greeting");
    assert!(body["message"].is_string());

    let call = &mock.calls()[0];
    assert_eq!(call.method, Method::POST);
    assert_eq!(call.path, "/rest/v1/global_variables");
    assert_eq!(call.header("prefer"), Some("return=representation"));

    let rows = mock.rows("global_variables");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["user_id"], DEVICE);
    assert_eq!(rows[0]["value"], "hello");
    assert_eq!(rows[0]["description"], "");
    assert_eq!(rows[0]["variable_type"], "string");
    assert!(rows[0]["updated_at"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn test_missing_fields_make_no_upstream_call() {
    let (mock, app) = setup().await;
    let uri = format!("/api/variables/{DEVICE}");

    for body in [
        json!({"key": "k"}),
        json!({"value": "v"}),
        json!({"key": "k", "value": null}),
        json!({"key": "k", "value": ""}),
        json!({"key": "k", "value": 0}),
        json!({"key": "k", "value": false}),
        json!({"key": 0, "value": "v"}),
        json!({"key": false, "value": "v"}),
        json!({"key": "", "value": "v"}),
        json!({}),
    ] {
        let (status, _, response) = send(&app, post_json(&uri, body.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(response["code"], "MISSING_REQUIRED_FIELDS", "{body}");
    }

    let empty = Request::builder()
        .method(Method::POST)
        .uri(&uri)
        .body(Body::empty())
        .unwrap();
    let (status, _, response) = send(&app, empty).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["code"], "MISSING_REQUIRED_FIELDS");

    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_numeric_key_is_stored_as_text() {
    let (mock, app) = setup().await;

    let (status, _, body) = send(
        &app,
        post_json(&format!("/api/variables/{DEVICE}"), json!({"key": 5, "value": true})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["key"], "5");

    let rows = mock.rows("global_variables");
    assert_eq!(rows[0]["key"], "5");
    assert_eq!(rows[0]["value"], true);
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let (mock, app) = setup().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("/api/variables/{DEVICE}"))
        .header("content-type", "application/json")
        .body(Body::from("{\"key\": "))
        .unwrap();
    let (status, _, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_JSON");
    assert!(body["details"].is_string());
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_delete_variable_encodes_key() {
    let (mock, app) = setup().await;
    mock.insert("global_variables", json!({"user_id": DEVICE, "key": "a b&c", "value": "1"}));
    mock.insert("global_variables", json!({"user_id": DEVICE, "key": "keep", "value": "2"}));

    let (status, _, body) = send(&app, delete(&format!("/api/variables/{DEVICE}/a%20b%26c"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body.get("data").is_none());

    let call = &mock.calls()[0];
    assert_eq!(call.method, Method::DELETE);
    assert_eq!(call.param("user_id"), Some(format!("eq.{DEVICE}").as_str()));
    assert_eq!(call.param("key"), Some("eq.a b&c"));

    let rows = mock.rows("global_variables");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["key"], "keep");
}

#[tokio::test]
async fn test_undecodable_key_segment_is_not_a_device_error() {
    let (mock, app) = setup().await;

    let (status, _, body) = send(&app, delete(&format!("/api/variables/{DEVICE}/%FF"))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_PATH_PARAM");
    assert_eq!(body["details"], "`key` is not valid UTF-8");
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_upstream_failure_surfaces_route_code() {
    let (mock, app) = setup().await;
    mock.fail("get_user_variables", 500, "function exploded");
    mock.fail("global_variables", 409, "duplicate key value");

    let (status, _, body) = send(&app, get(&format!("/api/variables/{DEVICE}"))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "VARIABLES_FETCH_ERROR");
    let details = body["details"].as_str().unwrap();
    assert!(details.contains("500"), "{details}");
    assert!(details.contains("function exploded"), "{details}");

    let (status, _, body) = send(
        &app,
        post_json(&format!("/api/variables/{DEVICE}"), json!({"key": "k", "value": "v"})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "VARIABLE_SAVE_ERROR");
    assert!(body["details"].as_str().unwrap().contains("409"));

    let (status, _, body) = send(&app, delete(&format!("/api/variables/{DEVICE}/k"))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "VARIABLE_DELETE_ERROR");
}

#[tokio::test]
async fn test_unreachable_upstream_is_route_error() {
    // Grab a free port, then release it so nothing is listening.
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let mut config = neightn_backend::ServiceConfig::default();
    config.baas.url = format!("http://{addr}");
    config.baas.api_key = API_KEY.to_string();
    let app = app(config, Arc::new(SystemClock));

    let (status, _, body) = send(&app, get(&format!("/api/subscription/{DEVICE}"))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "SUBSCRIPTION_CHECK_ERROR");
    assert!(body["details"].is_string());
}

#[tokio::test]
async fn test_credentials_injected_and_not_overridable() {
    let (mock, app) = setup().await;

    let request = Request::builder()
        .uri(format!("/api/variables/{DEVICE}"))
        .header("apikey", "client-key")
        .header("authorization", "Bearer client-token")
        .body(Body::empty())
        .unwrap();
    send(&app, request).await;

    let call = &mock.calls()[0];
    assert_eq!(call.header("apikey"), Some(API_KEY));
    assert_eq!(call.header("authorization"), Some(format!("Bearer {API_KEY}").as_str()));
    assert_eq!(call.headers.get_all("apikey").iter().count(), 1);
}

#[tokio::test]
async fn test_unknown_route_and_method_are_not_found() {
    let (mock, app) = setup().await;

    let (status, _, body) = send(&app, get("/api/nothing-here")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let put = Request::builder()
        .method(Method::PUT)
        .uri(format!("/api/variables/{DEVICE}"))
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(&app, put).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_workflow_template_is_personalized() {
    let (mock, app) = setup().await;

    let (status, _, body) = send(&app, get(&format!("/api/workflow-template/{DEVICE}"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["userId"], DEVICE);
    let text = body["template"].to_string();
    assert!(!text.contains("{{DEVICE_ID}}"));
    assert!(text.contains(DEVICE));
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let (mock, app) = setup().await;
    let big = "x".repeat(200 * 1024);

    let (status, _, body) = send(
        &app,
        post_json(&format!("/api/variables/{DEVICE}"), json!({"key": "k", "value": big})),
    )
    .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_cors_allows_configured_origin() {
    let (_mock, app) = setup().await;

    let request = Request::builder()
        .uri("/health")
        .header("origin", "https://neightn.app")
        .body(Body::empty())
        .unwrap();
    let (_, headers, _) = send(&app, request).await;
    assert_eq!(headers["access-control-allow-origin"], "https://neightn.app");
    assert_eq!(headers["access-control-allow-credentials"], "true");

    let request = Request::builder()
        .uri("/health")
        .header("origin", "https://evil.example")
        .body(Body::empty())
        .unwrap();
    let (_, headers, _) = send(&app, request).await;
    assert!(!headers.contains_key("access-control-allow-origin"));
}
