//! Gateway handlers

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use iotgw_core::{Gateway, GatewayUpdate, GatewayView, NewGateway};

use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/gateways
/// List every gateway with its devices resolved
pub async fn list_gateways(
    State(state): State<AppState>,
) -> Result<Json<Vec<GatewayView>>, ApiError> {
    Ok(Json(state.gateways().list().await?))
}

/// POST /api/gateways
/// Create a gateway; it starts with no devices
pub async fn create_gateway(
    State(state): State<AppState>,
    payload: Result<Json<NewGateway>, JsonRejection>,
) -> Result<Json<Gateway>, ApiError> {
    let Json(request) = payload?;
    Ok(Json(state.gateways().create(request).await?))
}

/// GET /api/gateways/{id}
pub async fn get_gateway(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<GatewayView>, ApiError> {
    Ok(Json(state.gateways().get(&id).await?))
}

/// PUT /api/gateways/{id}
/// Partial update of serial, name or address
pub async fn update_gateway(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<GatewayUpdate>, JsonRejection>,
) -> Result<Json<GatewayView>, ApiError> {
    let Json(update) = payload?;
    Ok(Json(state.gateways().update(&id, update).await?))
}

/// DELETE /api/gateways/{id}
/// Delete a gateway and every device it owns
pub async fn delete_gateway(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.gateways().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
