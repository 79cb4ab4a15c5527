//! HTTP route modules.
//!
//! - `webhooks`: Saleor webhook deliveries
//! - `config`: channel configuration API
//! - `health`: liveness check

pub mod config;
pub mod webhooks;

use axum::routing::get;
use axum::{Json, Router};

/// Build the health router.
pub fn health() -> Router {
    Router::new().route(
        "/health",
        get(|| async { Json(serde_json::json!({ "status": "ok" })) }),
    )
}
