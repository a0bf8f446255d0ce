//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use tracing::{error, info, warn};

use crate::state::{AppState, ControlError, TimerSnapshot};
use super::ApiContext;
use super::responses::{ApiResponse, DurationRequest, HealthResponse, StatusResponse};

/// Map a control operation result into the shared response shape.
///
/// Precondition violations travel as `status: "error"` payloads with the
/// unchanged timer attached; only lock failures become 500s.
fn control_response(
    state: &AppState,
    result: Result<TimerSnapshot, ControlError>,
    ok_message: &str,
) -> Result<Json<ApiResponse>, StatusCode> {
    match result {
        Ok(timer) => Ok(Json(ApiResponse::ok(ok_message.to_string(), timer))),
        Err(ControlError::Rejected(e)) => {
            warn!("Rejected timer operation: {}", e);
            match state.snapshot() {
                Ok(timer) => Ok(Json(ApiResponse::error(e.to_string(), timer))),
                Err(lock_err) => {
                    error!("Failed to read timer state: {}", lock_err);
                    Err(StatusCode::INTERNAL_SERVER_ERROR)
                }
            }
        }
        Err(ControlError::Internal(e)) => {
            error!("Timer operation failed: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /timer/start - Begin a countdown from idle
pub async fn start_handler(State(ctx): State<ApiContext>) -> Result<Json<ApiResponse>, StatusCode> {
    let result = ctx.state.start_timer();
    control_response(&ctx.state, result, "Countdown started")
}

/// Handle POST /timer/pause - Pause the running countdown
pub async fn pause_handler(State(ctx): State<ApiContext>) -> Result<Json<ApiResponse>, StatusCode> {
    let result = ctx.state.pause_timer();
    control_response(&ctx.state, result, "Countdown paused")
}

/// Handle POST /timer/resume - Resume a paused countdown
pub async fn resume_handler(State(ctx): State<ApiContext>) -> Result<Json<ApiResponse>, StatusCode> {
    let result = ctx.state.resume_timer();
    control_response(&ctx.state, result, "Countdown resumed")
}

/// Handle POST /timer/stop - Abandon the countdown and return to idle
pub async fn stop_handler(State(ctx): State<ApiContext>) -> Result<Json<ApiResponse>, StatusCode> {
    let result = ctx.state.stop_timer();
    control_response(&ctx.state, result, "Countdown stopped")
}

/// Handle PUT /timer/duration - Change the configured duration while idle.
///
/// The local value is updated optimistically; persistence runs in the
/// background and reports failure through the status error list.
pub async fn duration_handler(
    State(ctx): State<ApiContext>,
    Json(request): Json<DurationRequest>,
) -> Result<Json<ApiResponse>, StatusCode> {
    ctx.state.clear_errors_for("settings");

    match ctx.state.set_duration(request.minutes) {
        Ok((applied, timer)) => {
            let store = ctx.settings.clone();
            let state = Arc::clone(&ctx.state);
            tokio::spawn(async move {
                if let Err(e) = store.save_duration(applied).await {
                    warn!("Failed to persist timer duration: {}", e);
                    state.add_error(format!("Failed to persist settings: {}", e));
                }
            });

            info!("Duration endpoint called - timer set to {} minutes", applied);
            Ok(Json(ApiResponse::ok(
                format!("Timer duration set to {} minutes", applied),
                timer,
            )))
        }
        Err(e) => control_response(&ctx.state, Err(e), ""),
    }
}

/// Handle GET /timer - Return the current timer snapshot
pub async fn timer_handler(State(ctx): State<ApiContext>) -> Result<Json<TimerSnapshot>, StatusCode> {
    match ctx.state.snapshot() {
        Ok(timer) => Ok(Json(timer)),
        Err(e) => {
            error!("Failed to get timer state: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle GET /status - Return current timer and server status
pub async fn status_handler(State(ctx): State<ApiContext>) -> Result<Json<StatusResponse>, StatusCode> {
    let timer = match ctx.state.snapshot() {
        Ok(t) => t,
        Err(e) => {
            error!("Failed to get timer state: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let (last_action, last_action_time) = ctx.state.get_last_action();

    Ok(Json(StatusResponse {
        timer,
        errors: ctx.state.get_errors(),
        uptime: ctx.state.get_uptime(),
        port: ctx.state.port,
        host: ctx.state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
