//! iotgw-core - Records, storage abstraction and services for the gateway registry
//!
//! Gateways own a bounded list of devices. This crate holds the record
//! types, the [`RecordStore`] trait every storage backend implements, and
//! the two services that keep the gateway/device relationship consistent:
//!
//! - [`DeviceService`] enforces the per-gateway capacity on creation and
//!   keeps the owning gateway's `deviceIds` in sync.
//! - [`GatewayService`] handles gateway lifecycle and cascading deletes.
//!
//! Both services share one store and one [`GatewayLocks`] table, so
//! mutations touching the same gateway are serialized.

pub mod error;
pub mod fixtures;
pub mod id;
pub mod locks;
pub mod models;
pub mod resolver;
pub mod services;
pub mod store;

pub use error::{ParseIdError, ServiceError, ServiceResult, StoreError, StoreResult};
pub use fixtures::{seed_store, DeviceFixture, Fixtures, SeedSummary};
pub use id::RecordId;
pub use locks::GatewayLocks;
pub use models::*;
pub use resolver::RelationshipResolver;
pub use services::{DeviceService, GatewayService, Services};
pub use store::{MemoryStore, RecordStore};
