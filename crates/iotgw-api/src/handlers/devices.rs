//! Device handlers

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use iotgw_core::{Device, DeviceUpdate, DeviceView, NewDevice};

use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/devices
/// List every device with its gateway resolved
pub async fn list_devices(
    State(state): State<AppState>,
) -> Result<Json<Vec<DeviceView>>, ApiError> {
    Ok(Json(state.devices().list().await?))
}

/// POST /api/devices
/// Create a device under the gateway named in the body
pub async fn create_device(
    State(state): State<AppState>,
    payload: Result<Json<NewDevice>, JsonRejection>,
) -> Result<Json<Device>, ApiError> {
    let Json(request) = payload?;
    Ok(Json(state.devices().create(request).await?))
}

/// GET /api/devices/{id}
pub async fn get_device(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeviceView>, ApiError> {
    Ok(Json(state.devices().get(&id).await?))
}

/// PUT /api/devices/{id}
pub async fn update_device(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<DeviceUpdate>, JsonRejection>,
) -> Result<Json<DeviceView>, ApiError> {
    let Json(update) = payload?;
    Ok(Json(state.devices().update(&id, update).await?))
}

/// DELETE /api/devices/{id}
/// Succeeds whether or not the device exists
pub async fn delete_device(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.devices().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
