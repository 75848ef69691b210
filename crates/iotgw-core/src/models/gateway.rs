//! Gateway records

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::id::RecordId;
use crate::models::Device;

/// Maximum number of devices a single gateway may own
pub const MAX_DEVICES_PER_GATEWAY: usize = 10;

/// A network entry point owning a bounded set of devices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gateway {
    pub id: RecordId,
    /// Globally unique serial number
    pub serial: String,
    pub name: String,
    /// Dotted-quad IPv4 address
    pub ipv4_address: String,
    /// Owned devices, in the order they were added
    #[serde(default)]
    pub device_ids: Vec<RecordId>,
}

impl Gateway {
    /// Whether the gateway has reached its device capacity
    pub fn is_full(&self) -> bool {
        self.device_ids.len() >= MAX_DEVICES_PER_GATEWAY
    }

    /// Whether the given device is listed under this gateway
    pub fn owns(&self, device_id: &RecordId) -> bool {
        self.device_ids.contains(device_id)
    }
}

/// Request to create a gateway
///
/// Fields are optional so missing values surface as validation errors
/// rather than body rejections.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewGateway {
    #[validate(
        required(message = "Serial required"),
        length(min = 3, message = "Serial must have at least 3 characters")
    )]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,

    #[validate(
        required(message = "Name required"),
        length(min = 3, message = "Name must have at least 3 characters")
    )]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, alias = "ip_v4", skip_serializing_if = "Option::is_none")]
    pub ipv4_address: Option<String>,
}

impl NewGateway {
    pub fn new(
        serial: impl Into<String>,
        name: impl Into<String>,
        ipv4_address: impl Into<String>,
    ) -> Self {
        Self {
            serial: Some(serial.into()),
            name: Some(name.into()),
            ipv4_address: Some(ipv4_address.into()),
        }
    }
}

/// Partial update of a gateway's mutable fields
///
/// `deviceIds` only changes through device creation and deletion.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GatewayUpdate {
    #[validate(length(min = 3, message = "Serial must have at least 3 characters"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,

    #[validate(length(min = 3, message = "Name must have at least 3 characters"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, alias = "ip_v4", skip_serializing_if = "Option::is_none")]
    pub ipv4_address: Option<String>,
}

/// Gateway with its devices resolved inline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayView {
    pub id: RecordId,
    pub serial: String,
    pub name: String,
    pub ipv4_address: String,
    pub devices: Vec<Device>,
}

/// Strict dotted-quad IPv4 check (no leading zeros, exactly four octets)
pub fn is_ipv4(address: &str) -> bool {
    address.parse::<Ipv4Addr>().is_ok()
}
