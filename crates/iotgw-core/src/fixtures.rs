//! Startup fixtures
//!
//! A fixture file is a JSON document `{ "gateways": [...], "devices": [...] }`
//! whose records carry their own ids and already reference each other.
//! Seeding applies the same field rules as the services, rejects duplicate
//! ids, serials and uids, and checks that both sides of every relationship
//! agree and that no gateway is over capacity before anything is written.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use crate::error::{ServiceError, ServiceResult, StoreError};
use crate::id::RecordId;
use crate::models::{is_ipv4, Device, Gateway, NewDevice, NewGateway, MAX_DEVICES_PER_GATEWAY};
use crate::store::RecordStore;

/// Device entry of a fixture file. Timestamps default to load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceFixture {
    pub id: RecordId,
    pub uid: u64,
    pub vendor: String,
    #[serde(default, alias = "created")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<bool>,
    #[serde(alias = "gateway_id", alias = "gateway")]
    pub gateway_id: RecordId,
}

impl DeviceFixture {
    fn into_device(self, now: DateTime<Utc>) -> Device {
        let created_at = self.created_at.unwrap_or(now);
        Device {
            id: self.id,
            uid: self.uid,
            vendor: self.vendor,
            created_at,
            updated_at: created_at,
            status: self.status,
            gateway_id: self.gateway_id,
        }
    }
}

impl From<Device> for DeviceFixture {
    fn from(device: Device) -> Self {
        Self {
            id: device.id,
            uid: device.uid,
            vendor: device.vendor,
            created_at: Some(device.created_at),
            status: device.status,
            gateway_id: device.gateway_id,
        }
    }
}

/// Records to load into an empty store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fixtures {
    #[serde(default)]
    pub gateways: Vec<Gateway>,
    #[serde(default)]
    pub devices: Vec<DeviceFixture>,
}

impl Fixtures {
    /// Parse a fixture document
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Check field rules, uniqueness, relationship consistency and capacity
    pub fn check(&self) -> ServiceResult<()> {
        let mut gateway_ids = HashSet::new();
        let mut serials = HashSet::new();
        for gateway in &self.gateways {
            if !is_ipv4(&gateway.ipv4_address) {
                return Err(ServiceError::InvalidAddress);
            }
            NewGateway::new(&gateway.serial, &gateway.name, &gateway.ipv4_address)
                .validate()
                .map_err(|e| ServiceError::invalid("Gateway", e))?;
            if !gateway_ids.insert(gateway.id) {
                return Err(duplicate("Gateway", "id", gateway.id));
            }
            if !serials.insert(gateway.serial.as_str()) {
                return Err(duplicate("Gateway", "serial", &gateway.serial));
            }
        }

        let mut device_ids = HashSet::new();
        let mut uids = HashSet::new();
        for device in &self.devices {
            NewDevice::new(device.uid, &device.vendor, &device.gateway_id)
                .validate()
                .map_err(|e| ServiceError::invalid("Device", e))?;
            if !device_ids.insert(device.id) {
                return Err(duplicate("Device", "id", device.id));
            }
            if !uids.insert(device.uid) {
                return Err(duplicate("Device", "uid", device.uid));
            }
        }

        let gateways: HashMap<RecordId, &Gateway> =
            self.gateways.iter().map(|g| (g.id, g)).collect();
        let devices: HashMap<RecordId, &DeviceFixture> =
            self.devices.iter().map(|d| (d.id, d)).collect();

        for gateway in &self.gateways {
            if gateway.device_ids.len() > MAX_DEVICES_PER_GATEWAY {
                return Err(ServiceError::CapacityExceeded {
                    gateway_id: gateway.id,
                    limit: MAX_DEVICES_PER_GATEWAY,
                });
            }
            let mut listed = HashSet::new();
            for device_id in &gateway.device_ids {
                if !listed.insert(device_id) {
                    return Err(fixture_error(format!(
                        "gateway {} lists device {} more than once",
                        gateway.id, device_id
                    )));
                }
                match devices.get(device_id) {
                    Some(device) if device.gateway_id == gateway.id => {}
                    Some(_) => {
                        return Err(fixture_error(format!(
                            "gateway {} lists device {} owned by another gateway",
                            gateway.id, device_id
                        )))
                    }
                    None => {
                        return Err(fixture_error(format!(
                            "gateway {} lists unknown device {}",
                            gateway.id, device_id
                        )))
                    }
                }
            }
        }

        for device in &self.devices {
            let gateway =
                gateways
                    .get(&device.gateway_id)
                    .ok_or_else(|| ServiceError::GatewayNotFound {
                        gateway_id: device.gateway_id.to_string(),
                    })?;
            if !gateway.owns(&device.id) {
                return Err(fixture_error(format!(
                    "device {} is not listed by gateway {}",
                    device.id, gateway.id
                )));
            }
        }
        Ok(())
    }
}

/// What a seeding run inserted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub gateways: usize,
    pub devices: usize,
}

/// Check the fixtures, then insert gateways followed by devices.
///
/// If the store rejects a record (for example a collision with data it
/// already holds), everything inserted by this run is removed again.
pub async fn seed_store(store: &dyn RecordStore, fixtures: Fixtures) -> ServiceResult<SeedSummary> {
    fixtures.check()?;

    let mut inserted_gateways = Vec::with_capacity(fixtures.gateways.len());
    let mut inserted_devices = Vec::with_capacity(fixtures.devices.len());

    let result = async {
        for gateway in fixtures.gateways {
            let id = gateway.id;
            store.insert_gateway(gateway).await?;
            inserted_gateways.push(id);
        }
        let now = Utc::now();
        for device in fixtures.devices {
            let id = device.id;
            store.insert_device(device.into_device(now)).await?;
            inserted_devices.push(id);
        }
        Ok::<_, StoreError>(())
    }
    .await;

    if let Err(err) = result {
        warn!(
            error = %err,
            gateways = inserted_gateways.len(),
            devices = inserted_devices.len(),
            "Seeding failed, removing inserted records"
        );
        store.delete_devices(&inserted_devices).await?;
        for id in &inserted_gateways {
            store.delete_gateway(id).await?;
        }
        return Err(err.into());
    }

    let summary = SeedSummary {
        gateways: inserted_gateways.len(),
        devices: inserted_devices.len(),
    };
    info!(
        gateways = summary.gateways,
        devices = summary.devices,
        "Store seeded from fixtures"
    );
    Ok(summary)
}

fn fixture_error(detail: String) -> ServiceError {
    ServiceError::Validation(format!("Fixture validation failed: {}", detail))
}

fn duplicate(entity: &str, field: &str, value: impl std::fmt::Display) -> ServiceError {
    fixture_error(format!("{} {} `{}` appears more than once", entity, field, value))
}
