//! Test support handlers, mounted only when enabled in configuration

use axum::extract::State;
use axum::http::StatusCode;

use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/testing/reset
/// Remove every gateway and device
pub async fn reset(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.gateways().reset().await?;
    Ok(StatusCode::NO_CONTENT)
}
