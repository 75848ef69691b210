//! Per-gateway mutation locks
//!
//! Device creation reads a gateway's device count, inserts a device and then
//! writes the gateway back. Without serialization two concurrent creates can
//! both see 9 devices and leave the gateway owning 11. Every operation that
//! rewrites a gateway's `deviceIds` holds that gateway's lock for its whole
//! read-modify-write sequence.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::id::RecordId;

/// Table of async mutexes keyed by gateway id
#[derive(Debug, Default)]
pub struct GatewayLocks {
    locks: Mutex<HashMap<RecordId, Arc<AsyncMutex<()>>>>,
}

impl GatewayLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to a gateway
    pub async fn lock(&self, gateway_id: &RecordId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock();
            locks.entry(*gateway_id).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Drop the lock entry of a deleted gateway
    pub fn forget(&self, gateway_id: &RecordId) {
        self.locks.lock().remove(gateway_id);
    }

    /// Drop every entry, used when the store is wiped
    pub fn clear(&self) {
        self.locks.lock().clear();
    }

    /// Number of tracked gateways
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
