//! HTTP API module
//!
//! This module contains all HTTP endpoint handlers and response structures.

pub mod handlers;
pub mod responses;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/user/email", post(email_handler))
        .route("/user/name", post(name_handler))
        .route("/timer", get(timer_handler))
        .route("/timer/start", post(timer_start_handler))
        .route("/pricing", get(pricing_handler))
        .route("/checkout", get(checkout_status_handler).post(checkout_handler))
        .route("/debug/reset", post(reset_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
