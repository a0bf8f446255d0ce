//! HTTP API module
//!
//! This module contains all HTTP endpoint handlers and response structures.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::services::SettingsStore;
use crate::state::AppState;
use handlers::*;

/// Shared handler context: timer state plus the settings store
#[derive(Debug, Clone)]
pub struct ApiContext {
    pub state: Arc<AppState>,
    pub settings: SettingsStore,
}

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>, settings: SettingsStore) -> Router {
    let context = ApiContext { state, settings };

    Router::new()
        .route("/timer/start", post(start_handler))
        .route("/timer/pause", post(pause_handler))
        .route("/timer/resume", post(resume_handler))
        .route("/timer/stop", post(stop_handler))
        .route("/timer/duration", put(duration_handler))
        .route("/timer", get(timer_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(context)
}
