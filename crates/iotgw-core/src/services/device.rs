//! Device Service - device lifecycle and the per-gateway capacity rule

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};
use validator::Validate;

use crate::error::{ServiceError, ServiceResult};
use crate::id::RecordId;
use crate::locks::GatewayLocks;
use crate::models::{
    Device, DeviceUpdate, DeviceView, Gateway, NewDevice, Uid, MAX_DEVICES_PER_GATEWAY,
};
use crate::resolver::RelationshipResolver;
use crate::services::parse_id;
use crate::store::RecordStore;

const ENTITY: &str = "Device";

/// Creates, reads, updates and deletes devices.
///
/// Creation and deletion also maintain the owning gateway's `deviceIds`
/// while holding that gateway's lock.
#[derive(Clone)]
pub struct DeviceService {
    store: Arc<dyn RecordStore>,
    locks: Arc<GatewayLocks>,
    resolver: RelationshipResolver,
}

impl DeviceService {
    pub fn new(store: Arc<dyn RecordStore>, locks: Arc<GatewayLocks>) -> Self {
        Self {
            resolver: RelationshipResolver::new(store.clone()),
            store,
            locks,
        }
    }

    /// All devices with their owning gateway resolved
    #[instrument(skip(self))]
    pub async fn list(&self) -> ServiceResult<Vec<DeviceView>> {
        let devices = self.store.list_devices().await?;
        debug!(count = devices.len(), "Listing devices");
        Ok(self.resolver.device_views(devices).await?)
    }

    /// One device with its owning gateway resolved
    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> ServiceResult<DeviceView> {
        let id = parse_id(id)?;
        let device = self.find(&id).await?;
        Ok(self.resolver.device_view(device).await?)
    }

    /// Create a device and attach it to its gateway
    #[instrument(skip(self, request), fields(gateway_id = ?request.gateway_id))]
    pub async fn create(&self, request: NewDevice) -> ServiceResult<Device> {
        let raw_gateway_id = match request.gateway_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => return Err(ServiceError::MissingGateway),
        };
        let gateway_id =
            RecordId::parse(&raw_gateway_id).map_err(|_| ServiceError::GatewayNotFound {
                gateway_id: raw_gateway_id.clone(),
            })?;

        // Cheap existence check first so unknown ids never enter the lock table
        self.find_gateway(&gateway_id, &raw_gateway_id).await?;

        let guard = self.locks.lock(&gateway_id).await;
        let Some(mut gateway) = self.store.find_gateway(&gateway_id).await? else {
            // Deleted while we waited for the lock
            drop(guard);
            self.locks.forget(&gateway_id);
            return Err(ServiceError::GatewayNotFound {
                gateway_id: raw_gateway_id,
            });
        };

        if gateway.is_full() {
            info!(
                gateway_id = %gateway_id,
                devices = gateway.device_ids.len(),
                "Gateway at capacity, rejecting device"
            );
            return Err(ServiceError::CapacityExceeded {
                gateway_id,
                limit: MAX_DEVICES_PER_GATEWAY,
            });
        }

        request
            .validate()
            .map_err(|e| ServiceError::invalid(ENTITY, e))?;
        let uid = request
            .uid
            .as_ref()
            .ok_or_else(|| required("uid"))?
            .value()?;
        let vendor = request.vendor.clone().ok_or_else(|| required("vendor"))?;

        let now = Utc::now();
        let device = Device {
            id: RecordId::new(),
            uid,
            vendor,
            created_at: now,
            updated_at: now,
            status: request.status,
            gateway_id,
        };
        let device = self.store.insert_device(device).await?;

        gateway.device_ids.push(device.id);
        if let Err(err) = self.store.update_gateway(gateway).await {
            warn!(
                device_id = %device.id,
                gateway_id = %gateway_id,
                error = %err,
                "Failed to attach device to gateway, rolling back insert"
            );
            if let Err(rollback) = self.store.delete_device(&device.id).await {
                error!(
                    device_id = %device.id,
                    error = %rollback,
                    "Rollback failed, device left orphaned"
                );
            }
            return Err(err.into());
        }

        info!(device_id = %device.id, uid = device.uid, gateway_id = %gateway_id, "Device created");
        Ok(device)
    }

    /// Apply a partial update and refresh `updatedAt`
    #[instrument(skip(self, update))]
    pub async fn update(&self, id: &str, update: DeviceUpdate) -> ServiceResult<DeviceView> {
        let id = parse_id(id)?;
        update
            .validate()
            .map_err(|e| ServiceError::invalid(ENTITY, e))?;
        let uid = update.uid.as_ref().map(Uid::value).transpose()?;

        let mut device = self.find(&id).await?;
        if let Some(uid) = uid {
            device.uid = uid;
        }
        if let Some(vendor) = update.vendor {
            device.vendor = vendor;
        }
        if let Some(status) = update.status {
            device.status = Some(status);
        }
        device.updated_at = Utc::now();

        let device = self.store.update_device(device).await?;
        info!(device_id = %device.id, "Device updated");
        Ok(self.resolver.device_view(device).await?)
    }

    /// Delete a device and detach it from its gateway.
    ///
    /// Deleting an unknown id succeeds.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        let id = parse_id(id)?;
        let Some(device) = self.store.find_device(&id).await? else {
            debug!(device_id = %id, "Device already absent");
            return Ok(());
        };

        let guard = self.locks.lock(&device.gateway_id).await;
        self.store.delete_device(&id).await?;

        match self.store.find_gateway(&device.gateway_id).await? {
            Some(mut gateway) => {
                if gateway.owns(&id) {
                    gateway.device_ids.retain(|d| *d != id);
                    self.store.update_gateway(gateway).await?;
                }
            }
            None => {
                drop(guard);
                self.locks.forget(&device.gateway_id);
            }
        }

        info!(device_id = %id, gateway_id = %device.gateway_id, "Device deleted");
        Ok(())
    }

    async fn find(&self, id: &RecordId) -> ServiceResult<Device> {
        self.store
            .find_device(id)
            .await?
            .ok_or(ServiceError::NotFound {
                entity: ENTITY,
                id: *id,
            })
    }

    async fn find_gateway(&self, id: &RecordId, raw: &str) -> ServiceResult<Gateway> {
        self.store
            .find_gateway(id)
            .await?
            .ok_or_else(|| ServiceError::GatewayNotFound {
                gateway_id: raw.to_string(),
            })
    }
}

fn required(field: &str) -> ServiceError {
    ServiceError::Validation(format!(
        "{} validation failed: {}: {} required",
        ENTITY, field, field
    ))
}
