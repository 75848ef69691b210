//! Read-time join between gateways and devices

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use crate::error::StoreResult;
use crate::models::{Device, DeviceView, Gateway, GatewayView};
use crate::store::RecordStore;

/// Replaces stored references with the referenced records.
///
/// Never writes. A reference to a record that no longer exists is dropped
/// (device lists) or resolved to `None` (device → gateway).
#[derive(Clone)]
pub struct RelationshipResolver {
    store: Arc<dyn RecordStore>,
}

impl RelationshipResolver {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Resolve a single gateway's device list
    pub async fn gateway_view(&self, gateway: Gateway) -> StoreResult<GatewayView> {
        let devices = self.store.find_devices(&gateway.device_ids).await?;
        if devices.len() != gateway.device_ids.len() {
            warn!(
                gateway_id = %gateway.id,
                listed = gateway.device_ids.len(),
                found = devices.len(),
                "Gateway lists devices that no longer exist"
            );
        }
        Ok(join_gateway(gateway, devices))
    }

    /// Resolve many gateways with one pass over the device collection
    pub async fn gateway_views(&self, gateways: Vec<Gateway>) -> StoreResult<Vec<GatewayView>> {
        let wanted: Vec<_> = gateways
            .iter()
            .flat_map(|g| g.device_ids.iter().copied())
            .collect();
        let mut by_id: HashMap<_, _> = self
            .store
            .find_devices(&wanted)
            .await?
            .into_iter()
            .map(|d| (d.id, d))
            .collect();

        Ok(gateways
            .into_iter()
            .map(|gateway| {
                let devices = gateway
                    .device_ids
                    .iter()
                    .filter_map(|id| by_id.remove(id))
                    .collect();
                join_gateway(gateway, devices)
            })
            .collect())
    }

    /// Resolve a single device's owning gateway
    pub async fn device_view(&self, device: Device) -> StoreResult<DeviceView> {
        let gateway = self.store.find_gateway(&device.gateway_id).await?;
        if gateway.is_none() {
            warn!(
                device_id = %device.id,
                gateway_id = %device.gateway_id,
                "Device references a gateway that no longer exists"
            );
        }
        Ok(DeviceView::new(device, gateway))
    }

    /// Resolve many devices with one pass over the gateway collection
    pub async fn device_views(&self, devices: Vec<Device>) -> StoreResult<Vec<DeviceView>> {
        let gateways: HashMap<_, _> = self
            .store
            .list_gateways()
            .await?
            .into_iter()
            .map(|g| (g.id, g))
            .collect();

        Ok(devices
            .into_iter()
            .map(|device| {
                let gateway = gateways.get(&device.gateway_id).cloned();
                DeviceView::new(device, gateway)
            })
            .collect())
    }
}

fn join_gateway(gateway: Gateway, devices: Vec<Device>) -> GatewayView {
    GatewayView {
        id: gateway.id,
        serial: gateway.serial,
        name: gateway.name,
        ipv4_address: gateway.ipv4_address,
        devices,
    }
}
