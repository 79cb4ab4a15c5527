//! # NP Atobarai App Library
//!
//! Saleor payment app for NP Atobarai (deferred payment). Exposes the Axum
//! router and modules so integration tests can create an in-process server
//! backed by in-memory stores.

pub mod app_config;
pub mod atobarai;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod refund;
pub mod routes;
pub mod state;
pub mod transactions;

use axum::{Extension, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the Axum router with all route modules and middleware.
///
/// The caller provides the stores and API client factory through `state`.
/// This function does NOT start a server.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(routes::webhooks::router())
        .merge(routes::config::router())
        .merge(routes::health())
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
