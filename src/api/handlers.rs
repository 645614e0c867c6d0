//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use tracing::{error, info};

use crate::state::{AppState, DisplayState};
use super::responses::{ApiResponse, HealthResponse, StatusResponse, WorkoutTypeRequest};

fn respond(
    action: &str,
    message: &str,
    result: Result<DisplayState, String>,
) -> Result<Json<ApiResponse>, StatusCode> {
    match result {
        Ok(view) => {
            info!("{} endpoint called - {}", action, view.elapsed);
            Ok(Json(ApiResponse::new(message.to_string(), view)))
        }
        Err(e) => {
            error!("Failed to handle {}: {}", action, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /start - Start or resume the stopwatch
pub async fn start_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, StatusCode> {
    respond("Start", "Stopwatch started", state.start())
}

/// Handle POST /pause - Pause the stopwatch
pub async fn pause_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, StatusCode> {
    respond("Pause", "Stopwatch paused", state.pause())
}

/// Handle POST /stop - Stop the stopwatch and record the workout
pub async fn stop_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, StatusCode> {
    respond("Stop", "Stopwatch stopped", state.stop())
}

/// Handle PUT /workout-type - Set the workout-type input field
pub async fn workout_type_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<WorkoutTypeRequest>,
) -> Result<Json<ApiResponse>, StatusCode> {
    respond(
        "Workout-type",
        "Workout type updated",
        state.set_workout_input(&request.workout_type),
    )
}

/// Handle GET /display - Read the display surface
pub async fn display_handler(State(state): State<Arc<AppState>>) -> Result<Json<DisplayState>, StatusCode> {
    state.display().map(Json).map_err(|e| {
        error!("Failed to read display: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

/// Handle POST /lifecycle/recreate - Rebuild the screen across a configuration change
pub async fn recreate_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, StatusCode> {
    respond("Recreate", "Timer screen recreated", state.recreate())
}

/// Handle POST /lifecycle/background - Stop refreshing and persist labels
pub async fn background_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, StatusCode> {
    let result = state.leave_foreground().and_then(|()| state.display());
    respond("Background", "Timer screen moved to background", result)
}

/// Handle POST /lifecycle/foreground - Resume refreshing
pub async fn foreground_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, StatusCode> {
    respond("Foreground", "Timer screen moved to foreground", state.enter_foreground())
}

/// Handle GET /status - Return display and host status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, StatusCode> {
    let view = match state.display() {
        Ok(v) => v,
        Err(e) => {
            error!("Failed to get display state: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        display: view,
        ticking: state.is_ticking(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
