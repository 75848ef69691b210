//! Device records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::ServiceError;
use crate::id::RecordId;
use crate::models::Gateway;

/// A peripheral attached to exactly one gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: RecordId,
    /// Globally unique, human-facing identifier
    pub uid: u64,
    pub vendor: String,
    /// Set once when the device is created
    pub created_at: DateTime<Utc>,
    /// Refreshed on every update
    pub updated_at: DateTime<Utc>,
    /// Operational state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<bool>,
    /// Owning gateway
    pub gateway_id: RecordId,
}

/// Device uid as sent by clients: a JSON number or a string of digits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Uid {
    Number(u64),
    Text(String),
}

impl Uid {
    /// Numeric value of the uid
    pub fn value(&self) -> Result<u64, ServiceError> {
        match self {
            Uid::Number(n) => Ok(*n),
            Uid::Text(s) => s.parse::<u64>().map_err(|_| {
                ServiceError::Validation(format!(
                    "Device validation failed: uid: `{}` is not a number",
                    s
                ))
            }),
        }
    }
}

impl From<u64> for Uid {
    fn from(n: u64) -> Self {
        Uid::Number(n)
    }
}

impl From<&str> for Uid {
    fn from(s: &str) -> Self {
        Uid::Text(s.to_string())
    }
}

/// Request to create a device
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewDevice {
    #[validate(required(message = "uid required"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<Uid>,

    #[validate(
        required(message = "Vendor required"),
        length(min = 3, message = "Vendor must have at least 3 characters")
    )]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<bool>,

    /// Owning gateway id
    #[serde(
        default,
        alias = "gateway_id",
        alias = "gateway",
        skip_serializing_if = "Option::is_none"
    )]
    pub gateway_id: Option<String>,
}

impl NewDevice {
    pub fn new(uid: impl Into<Uid>, vendor: impl Into<String>, gateway_id: &RecordId) -> Self {
        Self {
            uid: Some(uid.into()),
            vendor: Some(vendor.into()),
            status: Some(true),
            gateway_id: Some(gateway_id.to_string()),
        }
    }
}

/// Partial update of a device's mutable fields
///
/// The owning gateway cannot be changed through an update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeviceUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<Uid>,

    #[validate(length(min = 3, message = "Vendor must have at least 3 characters"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<bool>,
}

/// Device with its owning gateway resolved inline
///
/// `gateway` is `None` when the reference dangles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceView {
    pub id: RecordId,
    pub uid: u64,
    pub vendor: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<bool>,
    pub gateway: Option<Gateway>,
}

impl DeviceView {
    pub fn new(device: Device, gateway: Option<Gateway>) -> Self {
        Self {
            id: device.id,
            uid: device.uid,
            vendor: device.vendor,
            created_at: device.created_at,
            updated_at: device.updated_at,
            status: device.status,
            gateway,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uid_accepts_number_and_digit_string() {
        let n: Uid = serde_json::from_str("90908012").unwrap();
        let s: Uid = serde_json::from_str("\"90908012\"").unwrap();
        assert_eq!(n.value().unwrap(), 90908012);
        assert_eq!(s.value().unwrap(), 90908012);
    }

    #[test]
    fn uid_rejects_letters() {
        let uid = Uid::from("SSSSSSS");
        let err = uid.value().unwrap_err();
        assert_eq!(err.kind(), "validation_error");
    }

    #[test]
    fn new_device_accepts_legacy_gateway_fields() {
        let a: NewDevice =
            serde_json::from_str(r#"{"uid":1,"vendor":"abc","gateway_id":"x"}"#).unwrap();
        let b: NewDevice =
            serde_json::from_str(r#"{"uid":1,"vendor":"abc","gateway":"y"}"#).unwrap();
        let c: NewDevice =
            serde_json::from_str(r#"{"uid":1,"vendor":"abc","gatewayId":"z"}"#).unwrap();
        assert_eq!(a.gateway_id.as_deref(), Some("x"));
        assert_eq!(b.gateway_id.as_deref(), Some("y"));
        assert_eq!(c.gateway_id.as_deref(), Some("z"));
    }

    #[test]
    fn new_device_validation() {
        let missing = NewDevice::default();
        let errors = missing.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("uid"));
        assert!(errors.field_errors().contains_key("vendor"));

        let gateway = RecordId::new();
        assert!(NewDevice::new(1u64, "TP", &gateway).validate().is_err());
        assert!(NewDevice::new(1u64, "TPLink", &gateway).validate().is_ok());
    }

    #[test]
    fn view_drops_gateway_reference_for_record() {
        let now = Utc::now();
        let device = Device {
            id: RecordId::new(),
            uid: 42,
            vendor: "Huawei1".into(),
            created_at: now,
            updated_at: now,
            status: None,
            gateway_id: RecordId::new(),
        };
        let value = serde_json::to_value(DeviceView::new(device, None)).unwrap();
        assert!(value.get("gatewayId").is_none());
        assert!(value["gateway"].is_null());
        assert!(value.get("status").is_none());
    }
}
