//! IoT Gateway Registry Client
//!
//! Provides a typed HTTP client for the gateway registry REST API.
//!
//! # Example
//!
//! ```rust,no_run
//! use iotgw_client::IotClient;
//! use iotgw_client::{NewDevice, NewGateway};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), iotgw_client::ClientError> {
//!     let client = IotClient::new("http://localhost:3001")?;
//!
//!     let gateway = client
//!         .create_gateway(&NewGateway::new("HHHPPP0001", "North Star", "192.168.22.1"))
//!         .await?;
//!     client
//!         .create_device(&NewDevice::new(90909000u64, "TP_Link1", &gateway.id))
//!         .await?;
//!
//!     let view = client.get_gateway(&gateway.id.to_string()).await?;
//!     assert_eq!(view.devices.len(), 1);
//!     Ok(())
//! }
//! ```
//!
//! # Testing
//!
//! The `testing` module serves a seeded registry on an ephemeral port:
//!
//! ```rust,ignore
//! use iotgw_client::testing::{star_fixtures, TestServer};
//!
//! let server = TestServer::start_seeded(star_fixtures()).await?;
//! let gateways = server.client.list_gateways().await?;
//! ```

mod client;
mod error;
pub mod testing;

pub use client::IotClient;
pub use error::{ClientError, Result};

// Re-export the wire types for convenience
pub use iotgw_core::{
    Device, DeviceUpdate, DeviceView, Gateway, GatewayUpdate, GatewayView, NewDevice, NewGateway,
};
