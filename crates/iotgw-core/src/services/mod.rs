//! Gateway and device services

mod device;
mod gateway;

pub use device::DeviceService;
pub use gateway::GatewayService;

use std::sync::Arc;

use crate::error::ServiceError;
use crate::id::RecordId;
use crate::locks::GatewayLocks;
use crate::store::RecordStore;

/// Both services wired to one store and one lock table
#[derive(Clone)]
pub struct Services {
    pub gateways: GatewayService,
    pub devices: DeviceService,
}

impl Services {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        let locks = Arc::new(GatewayLocks::new());
        Self {
            gateways: GatewayService::new(store.clone(), locks.clone()),
            devices: DeviceService::new(store, locks),
        }
    }
}

/// Parse an id received from a client
pub(crate) fn parse_id(id: &str) -> Result<RecordId, ServiceError> {
    RecordId::parse(id).map_err(ServiceError::from)
}
