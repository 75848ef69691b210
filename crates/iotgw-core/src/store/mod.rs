//! RecordStore trait - the storage abstraction shared by both services

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::id::RecordId;
use crate::models::{Device, Gateway};

/// Keyed storage for gateways and devices.
///
/// Implementations enforce uniqueness of `Gateway::serial` and `Device::uid`
/// (reported as [`StoreError::Duplicate`](crate::StoreError::Duplicate)).
/// They do not know about the gateway/device relationship; keeping both
/// sides consistent is the services' job.
#[async_trait]
pub trait RecordStore: Send + Sync {
    // =========================================================================
    // Gateways
    // =========================================================================

    /// All gateways, ordered by id
    async fn list_gateways(&self) -> StoreResult<Vec<Gateway>>;

    async fn find_gateway(&self, id: &RecordId) -> StoreResult<Option<Gateway>>;

    async fn insert_gateway(&self, gateway: Gateway) -> StoreResult<Gateway>;

    /// Replace a stored gateway. Fails with `Missing` if it does not exist.
    async fn update_gateway(&self, gateway: Gateway) -> StoreResult<Gateway>;

    /// Returns whether a record was removed
    async fn delete_gateway(&self, id: &RecordId) -> StoreResult<bool>;

    // =========================================================================
    // Devices
    // =========================================================================

    /// All devices, ordered by id
    async fn list_devices(&self) -> StoreResult<Vec<Device>>;

    async fn find_device(&self, id: &RecordId) -> StoreResult<Option<Device>>;

    /// Devices for the given ids, in the order requested. Unknown ids are skipped.
    async fn find_devices(&self, ids: &[RecordId]) -> StoreResult<Vec<Device>>;

    async fn insert_device(&self, device: Device) -> StoreResult<Device>;

    /// Replace a stored device. Fails with `Missing` if it does not exist.
    async fn update_device(&self, device: Device) -> StoreResult<Device>;

    /// Returns whether a record was removed
    async fn delete_device(&self, id: &RecordId) -> StoreResult<bool>;

    /// Returns the number of records removed
    async fn delete_devices(&self, ids: &[RecordId]) -> StoreResult<usize>;

    // =========================================================================
    // Administration
    // =========================================================================

    /// Remove every gateway and device
    async fn clear(&self) -> StoreResult<()>;
}
