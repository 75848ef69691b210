//! Gateway Service - gateway lifecycle and cascading deletes

use std::sync::Arc;

use tracing::{debug, info, instrument};
use validator::Validate;

use crate::error::{ServiceError, ServiceResult};
use crate::id::RecordId;
use crate::locks::GatewayLocks;
use crate::models::{is_ipv4, Gateway, GatewayUpdate, GatewayView, NewGateway};
use crate::resolver::RelationshipResolver;
use crate::services::parse_id;
use crate::store::RecordStore;

const ENTITY: &str = "Gateway";

/// Creates, reads, updates and deletes gateways
#[derive(Clone)]
pub struct GatewayService {
    store: Arc<dyn RecordStore>,
    locks: Arc<GatewayLocks>,
    resolver: RelationshipResolver,
}

impl GatewayService {
    pub fn new(store: Arc<dyn RecordStore>, locks: Arc<GatewayLocks>) -> Self {
        Self {
            resolver: RelationshipResolver::new(store.clone()),
            store,
            locks,
        }
    }

    /// All gateways with their devices resolved
    #[instrument(skip(self))]
    pub async fn list(&self) -> ServiceResult<Vec<GatewayView>> {
        let gateways = self.store.list_gateways().await?;
        debug!(count = gateways.len(), "Listing gateways");
        Ok(self.resolver.gateway_views(gateways).await?)
    }

    /// One gateway with its devices resolved
    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> ServiceResult<GatewayView> {
        let id = parse_id(id)?;
        let gateway = self.find(&id).await?;
        Ok(self.resolver.gateway_view(gateway).await?)
    }

    /// Create a gateway with no devices.
    ///
    /// The address is checked before any other field.
    #[instrument(skip(self, request), fields(serial = ?request.serial))]
    pub async fn create(&self, request: NewGateway) -> ServiceResult<Gateway> {
        match request.ipv4_address.as_deref() {
            Some(address) if is_ipv4(address) => {}
            _ => return Err(ServiceError::InvalidAddress),
        }
        request
            .validate()
            .map_err(|e| ServiceError::invalid(ENTITY, e))?;

        let (Some(serial), Some(name), Some(ipv4_address)) =
            (request.serial, request.name, request.ipv4_address)
        else {
            return Err(ServiceError::Validation(format!(
                "{} validation failed: serial, name and ipv4Address are required",
                ENTITY
            )));
        };

        let gateway = Gateway {
            id: RecordId::new(),
            serial,
            name,
            ipv4_address,
            device_ids: Vec::new(),
        };
        let gateway = self.store.insert_gateway(gateway).await?;
        info!(gateway_id = %gateway.id, serial = %gateway.serial, "Gateway created");
        Ok(gateway)
    }

    /// Apply a partial update. Device ownership is left untouched.
    #[instrument(skip(self, update))]
    pub async fn update(&self, id: &str, update: GatewayUpdate) -> ServiceResult<GatewayView> {
        let id = parse_id(id)?;
        if let Some(address) = update.ipv4_address.as_deref() {
            if !is_ipv4(address) {
                return Err(ServiceError::InvalidAddress);
            }
        }
        update
            .validate()
            .map_err(|e| ServiceError::invalid(ENTITY, e))?;
        self.find(&id).await?;

        let gateway = {
            let _guard = self.locks.lock(&id).await;
            let mut gateway = self.find(&id).await?;
            if let Some(serial) = update.serial {
                gateway.serial = serial;
            }
            if let Some(name) = update.name {
                gateway.name = name;
            }
            if let Some(address) = update.ipv4_address {
                gateway.ipv4_address = address;
            }
            self.store.update_gateway(gateway).await?
        };

        info!(gateway_id = %gateway.id, "Gateway updated");
        Ok(self.resolver.gateway_view(gateway).await?)
    }

    /// Delete a gateway together with every device it owns
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        let id = parse_id(id)?;
        self.find(&id).await?;

        let guard = self.locks.lock(&id).await;
        let gateway = self.find(&id).await?;
        let removed = self.store.delete_devices(&gateway.device_ids).await?;
        self.store.delete_gateway(&id).await?;
        drop(guard);
        self.locks.forget(&id);

        info!(gateway_id = %id, devices = removed, "Gateway deleted");
        Ok(())
    }

    /// Remove every gateway and device
    #[instrument(skip(self))]
    pub async fn reset(&self) -> ServiceResult<()> {
        self.store.clear().await?;
        self.locks.clear();
        info!("Store cleared");
        Ok(())
    }

    async fn find(&self, id: &RecordId) -> ServiceResult<Gateway> {
        self.store
            .find_gateway(id)
            .await?
            .ok_or(ServiceError::NotFound {
                entity: ENTITY,
                id: *id,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewDevice;
    use crate::services::Services;
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;

    fn setup() -> (Arc<MemoryStore>, Services) {
        let store = Arc::new(MemoryStore::new());
        let services = Services::new(store.clone());
        (store, services)
    }

    async fn north_star(services: &Services) -> Gateway {
        services
            .gateways
            .create(NewGateway::new("HHHPPP0001", "North Star", "192.168.22.1"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_starts_with_no_devices() {
        let (store, services) = setup();
        let gateway = north_star(&services).await;
        assert!(gateway.device_ids.is_empty());
        assert_eq!(store.gateway_count(), 1);
    }

    #[tokio::test]
    async fn create_rejects_bad_address_first() {
        let (store, services) = setup();
        let request = NewGateway {
            serial: None,
            name: Some("x".into()),
            ipv4_address: Some("invalid_ip".into()),
        };
        let err = services.gateways.create(request).await.unwrap_err();
        assert_eq!(err.to_string(), "IP missing or invalid");
        assert_eq!(store.gateway_count(), 0);
    }

    #[tokio::test]
    async fn create_rejects_missing_address() {
        let (_, services) = setup();
        let request = NewGateway {
            serial: Some("HHHPPP0009".into()),
            name: Some("Nowhere".into()),
            ipv4_address: None,
        };
        let err = services.gateways.create(request).await.unwrap_err();
        assert_eq!(err.kind(), "invalid_address");
    }

    #[tokio::test]
    async fn create_reports_missing_fields() {
        let (_, services) = setup();
        let request = NewGateway {
            ipv4_address: Some("192.168.33.99".into()),
            ..Default::default()
        };
        let err = services.gateways.create(request).await.unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("Gateway validation failed"));
        assert!(message.contains("Name required"));
        assert!(message.contains("Serial required"));
    }

    #[tokio::test]
    async fn duplicate_serial_is_rejected() {
        let (store, services) = setup();
        north_star(&services).await;
        let err = services
            .gateways
            .create(NewGateway::new("HHHPPP0001", "Another", "192.168.22.9"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation_error");
        assert_eq!(store.gateway_count(), 1);
    }

    #[tokio::test]
    async fn get_resolves_devices_in_order() {
        let (_, services) = setup();
        let gateway = north_star(&services).await;
        let mut created = Vec::new();
        for uid in [3u64, 1, 2] {
            let device = services
                .devices
                .create(NewDevice::new(uid, "Huawei1", &gateway.id))
                .await
                .unwrap();
            created.push(device);
        }

        let view = services.gateways.get(&gateway.id.to_string()).await.unwrap();
        assert_eq!(view.devices, created);
    }

    #[tokio::test]
    async fn get_distinguishes_malformed_and_unknown_ids() {
        let (_, services) = setup();
        let malformed = services
            .gateways
            .get("1a3d5da0000000a82aaaa4")
            .await
            .unwrap_err();
        assert_eq!(malformed.kind(), "invalid_identifier");

        let unknown = services
            .gateways
            .get("5a422a851b54a676234d17f7")
            .await
            .unwrap_err();
        assert_eq!(unknown.kind(), "not_found");
    }

    #[tokio::test]
    async fn update_is_partial() {
        let (_, services) = setup();
        let gateway = north_star(&services).await;
        let view = services
            .gateways
            .update(
                &gateway.id.to_string(),
                GatewayUpdate {
                    name: Some("Updated Name".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(view.name, "Updated Name");
        assert_eq!(view.serial, "HHHPPP0001");
        assert_eq!(view.ipv4_address, "192.168.22.1");
    }

    #[tokio::test]
    async fn update_keeps_device_ownership() {
        let (store, services) = setup();
        let gateway = north_star(&services).await;
        let device = services
            .devices
            .create(NewDevice::new(1u64, "TPLink", &gateway.id))
            .await
            .unwrap();

        services
            .gateways
            .update(
                &gateway.id.to_string(),
                GatewayUpdate {
                    serial: Some("HHHPPP0100".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let stored = store.find_gateway(&gateway.id).await.unwrap().unwrap();
        assert_eq!(stored.device_ids, vec![device.id]);
    }

    #[tokio::test]
    async fn update_rejects_bad_address() {
        let (_, services) = setup();
        let gateway = north_star(&services).await;
        let err = services
            .gateways
            .update(
                &gateway.id.to_string(),
                GatewayUpdate {
                    ipv4_address: Some("300.1.1.1".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_address");
    }

    #[tokio::test]
    async fn update_unknown_gateway_is_not_found() {
        let (_, services) = setup();
        let err = services
            .gateways
            .update(&RecordId::new().to_string(), GatewayUpdate::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[tokio::test]
    async fn delete_cascades_to_owned_devices() {
        let (store, services) = setup();
        let doomed = north_star(&services).await;
        let kept = services
            .gateways
            .create(NewGateway::new("HHHPPP0003", "West Star", "192.168.22.3"))
            .await
            .unwrap();
        for uid in 0..3u64 {
            services
                .devices
                .create(NewDevice::new(uid, "Huawei1", &doomed.id))
                .await
                .unwrap();
        }
        let survivor = services
            .devices
            .create(NewDevice::new(99u64, "Huawei2", &kept.id))
            .await
            .unwrap();

        services
            .gateways
            .delete(&doomed.id.to_string())
            .await
            .unwrap();

        assert!(store.find_gateway(&doomed.id).await.unwrap().is_none());
        let remaining = store.list_devices().await.unwrap();
        assert_eq!(remaining, vec![survivor]);
    }

    #[tokio::test]
    async fn delete_unknown_gateway_is_not_found() {
        let (_, services) = setup();
        let err = services
            .gateways
            .delete(&RecordId::new().to_string())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[tokio::test]
    async fn device_create_after_gateway_delete_fails() {
        let (store, services) = setup();
        let gateway = north_star(&services).await;
        services
            .gateways
            .delete(&gateway.id.to_string())
            .await
            .unwrap();

        let err = services
            .devices
            .create(NewDevice::new(1u64, "TPLink", &gateway.id))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "gateway_not_found");
        assert_eq!(store.device_count(), 0);
    }

    #[tokio::test]
    async fn reset_clears_everything() {
        let (store, services) = setup();
        let gateway = north_star(&services).await;
        services
            .devices
            .create(NewDevice::new(1u64, "TPLink", &gateway.id))
            .await
            .unwrap();

        services.gateways.reset().await.unwrap();
        assert_eq!(store.gateway_count(), 0);
        assert_eq!(store.device_count(), 0);
    }

    #[tokio::test]
    async fn reset_clears_lock_table() {
        let (_, services) = setup();
        for (uid, serial, name, address) in [
            (1u64, "HHHPPP0001", "North Star", "192.168.22.1"),
            (2u64, "HHHPPP0002", "South Star", "192.168.22.2"),
        ] {
            let gateway = services
                .gateways
                .create(NewGateway::new(serial, name, address))
                .await
                .unwrap();
            services
                .devices
                .create(NewDevice::new(uid, "TPLink", &gateway.id))
                .await
                .unwrap();
        }
        assert_eq!(services.gateways.locks.len(), 2);

        services.gateways.reset().await.unwrap();
        assert!(services.gateways.locks.is_empty());
    }
}
