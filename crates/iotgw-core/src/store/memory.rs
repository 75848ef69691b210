//! In-memory record store

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::id::RecordId;
use crate::models::{Device, Gateway};
use crate::store::RecordStore;

const GATEWAYS: &str = "Gateway";
const DEVICES: &str = "Device";

#[derive(Debug, Default)]
struct Collections {
    gateways: BTreeMap<RecordId, Gateway>,
    devices: BTreeMap<RecordId, Device>,
}

impl Collections {
    fn check_gateway(&self, gateway: &Gateway) -> StoreResult<()> {
        let taken = self
            .gateways
            .values()
            .any(|g| g.id != gateway.id && g.serial == gateway.serial);
        if taken {
            return Err(StoreError::Duplicate {
                collection: GATEWAYS,
                field: "serial",
                value: gateway.serial.clone(),
            });
        }
        Ok(())
    }

    fn check_device(&self, device: &Device) -> StoreResult<()> {
        let taken = self
            .devices
            .values()
            .any(|d| d.id != device.id && d.uid == device.uid);
        if taken {
            return Err(StoreError::Duplicate {
                collection: DEVICES,
                field: "uid",
                value: device.uid.to_string(),
            });
        }
        Ok(())
    }
}

/// Thread-safe in-memory store
///
/// Both collections sit behind one lock, so every call observes a
/// consistent snapshot. Used by the daemon and as the test store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored gateways
    pub fn gateway_count(&self) -> usize {
        self.collections.read().gateways.len()
    }

    /// Number of stored devices
    pub fn device_count(&self) -> usize {
        self.collections.read().devices.len()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list_gateways(&self) -> StoreResult<Vec<Gateway>> {
        Ok(self.collections.read().gateways.values().cloned().collect())
    }

    async fn find_gateway(&self, id: &RecordId) -> StoreResult<Option<Gateway>> {
        Ok(self.collections.read().gateways.get(id).cloned())
    }

    async fn insert_gateway(&self, gateway: Gateway) -> StoreResult<Gateway> {
        let mut collections = self.collections.write();
        if collections.gateways.contains_key(&gateway.id) {
            return Err(StoreError::Duplicate {
                collection: GATEWAYS,
                field: "id",
                value: gateway.id.to_string(),
            });
        }
        collections.check_gateway(&gateway)?;
        collections.gateways.insert(gateway.id, gateway.clone());
        Ok(gateway)
    }

    async fn update_gateway(&self, gateway: Gateway) -> StoreResult<Gateway> {
        let mut collections = self.collections.write();
        if !collections.gateways.contains_key(&gateway.id) {
            return Err(StoreError::Missing {
                collection: GATEWAYS,
                id: gateway.id,
            });
        }
        collections.check_gateway(&gateway)?;
        collections.gateways.insert(gateway.id, gateway.clone());
        Ok(gateway)
    }

    async fn delete_gateway(&self, id: &RecordId) -> StoreResult<bool> {
        Ok(self.collections.write().gateways.remove(id).is_some())
    }

    async fn list_devices(&self) -> StoreResult<Vec<Device>> {
        Ok(self.collections.read().devices.values().cloned().collect())
    }

    async fn find_device(&self, id: &RecordId) -> StoreResult<Option<Device>> {
        Ok(self.collections.read().devices.get(id).cloned())
    }

    async fn find_devices(&self, ids: &[RecordId]) -> StoreResult<Vec<Device>> {
        let collections = self.collections.read();
        Ok(ids
            .iter()
            .filter_map(|id| collections.devices.get(id).cloned())
            .collect())
    }

    async fn insert_device(&self, device: Device) -> StoreResult<Device> {
        let mut collections = self.collections.write();
        if collections.devices.contains_key(&device.id) {
            return Err(StoreError::Duplicate {
                collection: DEVICES,
                field: "id",
                value: device.id.to_string(),
            });
        }
        collections.check_device(&device)?;
        collections.devices.insert(device.id, device.clone());
        Ok(device)
    }

    async fn update_device(&self, device: Device) -> StoreResult<Device> {
        let mut collections = self.collections.write();
        if !collections.devices.contains_key(&device.id) {
            return Err(StoreError::Missing {
                collection: DEVICES,
                id: device.id,
            });
        }
        collections.check_device(&device)?;
        collections.devices.insert(device.id, device.clone());
        Ok(device)
    }

    async fn delete_device(&self, id: &RecordId) -> StoreResult<bool> {
        Ok(self.collections.write().devices.remove(id).is_some())
    }

    async fn delete_devices(&self, ids: &[RecordId]) -> StoreResult<usize> {
        let mut collections = self.collections.write();
        Ok(ids
            .iter()
            .filter(|id| collections.devices.remove(*id).is_some())
            .count())
    }

    async fn clear(&self) -> StoreResult<()> {
        let mut collections = self.collections.write();
        collections.gateways.clear();
        collections.devices.clear();
        Ok(())
    }
}
