//! Public API.
//!
//! # Routes
//! ```text
//! GET    /health
//! GET    /api/variables/{user_id}[?key=]     → RPC get_user_variables
//! POST   /api/variables/{user_id}            → insert into variables table
//! DELETE /api/variables/{user_id}/{key}      → delete from variables table
//! GET    /api/subscription/{user_id}         → select active subscriptions
//! POST   /api/subscription/{user_id}         → insert subscription
//! POST   /api/subscription/{user_id}/with-workflow
//! GET    /api/workflow-template/{user_id}
//! ```
//!
//! Every `{user_id}` is validated by the [`DeviceId`](crate::security::DeviceId)
//! extractor before a handler body runs.

pub mod health;
pub mod subscription;
pub mod types;
pub mod variables;
pub mod workflow;

use axum::routing::{delete, get, post};
use axum::Router;

use crate::http::server::AppState;

/// The route table.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/api/variables/{user_id}",
            get(variables::list).post(variables::create),
        )
        .route("/api/variables/{user_id}/{key}", delete(variables::remove))
        .route(
            "/api/subscription/{user_id}",
            get(subscription::status).post(subscription::create),
        )
        .route(
            "/api/subscription/{user_id}/with-workflow",
            post(subscription::create_with_workflow),
        )
        .route("/api/workflow-template/{user_id}", get(workflow::template))
}
