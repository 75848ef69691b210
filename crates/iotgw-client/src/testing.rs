//! In-process registry server for integration tests
//!
//! [`TestServer`] seeds a fresh [`MemoryStore`], mounts the full router with
//! the testing routes enabled on an ephemeral port, and hands back a client
//! connected to it. [`star_fixtures`] is the shared North/South/West Star
//! data set most tests start from.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use iotgw_api::{create_router, AppState};
use iotgw_core::{seed_store, DeviceFixture, Fixtures, Gateway, MemoryStore, RecordId};
use tokio::net::TcpListener;
use tracing::debug;

use crate::{IotClient, Result};

/// Gateway with no devices
pub const NORTH_STAR: &str = "5a422a851b54a676234d17f7";
/// Gateway at full capacity
pub const SOUTH_STAR: &str = "5a422aa71b54a676234d17f8";
/// Gateway with three devices
pub const WEST_STAR: &str = "5a422b3a1b54a676234d17f9";

/// Malformed id: 22 hex characters
pub const MALFORMED_ID: &str = "1a3d5da0000000a82aaaa4";

/// Registry server over its own store, shut down when dropped
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: IotClient,
    store: Arc<MemoryStore>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    /// Serve an empty store
    pub async fn start() -> Result<Self> {
        Self::start_seeded(Fixtures::default()).await
    }

    /// Seed a fresh store with `fixtures` and serve it
    ///
    /// # Example
    ///
    /// ```ignore
    /// use iotgw_client::testing::{star_fixtures, TestServer, SOUTH_STAR};
    ///
    /// let server = TestServer::start_seeded(star_fixtures()).await?;
    /// let south = server.client.get_gateway(SOUTH_STAR).await?;
    /// assert_eq!(south.devices.len(), 10);
    /// ```
    pub async fn start_seeded(fixtures: Fixtures) -> Result<Self> {
        Self::start_seeded_with_timeout(fixtures, Duration::from_secs(5), Duration::from_secs(2))
            .await
    }

    /// Seed and serve with custom client timeouts
    pub async fn start_seeded_with_timeout(
        fixtures: Fixtures,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let store = Arc::new(MemoryStore::new());
        let seeded = seed_store(store.as_ref(), fixtures).await?;

        let state = AppState::new(store.clone()).with_testing_routes(true);
        let router = create_router(state);

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });
        debug!(
            %addr,
            gateways = seeded.gateways,
            devices = seeded.devices,
            "Test registry listening"
        );

        let client = IotClient::with_config(&format!("http://{}", addr), timeout, connect_timeout)?;

        Ok(Self {
            addr,
            client,
            store,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Store behind the server, for asserting on persisted state
    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop accepting requests and wait for the server task
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// North Star with no devices, South Star full, West Star with 3 devices
pub fn star_fixtures() -> Fixtures {
    let south = star_devices(SOUTH_STAR, 0x73e0, (0..10).map(|n| 90909000 + n * 10), "TP_Link");
    let west = star_devices(WEST_STAR, 0x73f1, 90908000..90908003, "Huawei");
    Fixtures {
        gateways: vec![
            star_gateway(NORTH_STAR, "HHHPPP0001", "North Star", "192.168.22.1", &[]),
            star_gateway(SOUTH_STAR, "HHHPPP0002", "South Star", "192.168.22.2", &south),
            star_gateway(WEST_STAR, "HHHPPP0003", "West Star", "192.168.22.3", &west),
        ],
        devices: south.into_iter().chain(west).collect(),
    }
}

fn fixture_id(hex: &str) -> RecordId {
    RecordId::parse(hex).unwrap_or_else(|_| panic!("fixture id {}", hex))
}

fn star_devices(
    gateway: &str,
    first_id: u64,
    uids: impl Iterator<Item = u64>,
    vendor: &str,
) -> Vec<DeviceFixture> {
    uids.enumerate()
        .map(|(n, uid)| DeviceFixture {
            id: fixture_id(&format!("6233963428342a590cb9{:04x}", first_id + n as u64)),
            uid,
            vendor: format!("{}{}", vendor, n + 1),
            created_at: None,
            status: Some(n % 2 == 0),
            gateway_id: fixture_id(gateway),
        })
        .collect()
}

fn star_gateway(
    hex: &str,
    serial: &str,
    name: &str,
    ip: &str,
    devices: &[DeviceFixture],
) -> Gateway {
    Gateway {
        id: fixture_id(hex),
        serial: serial.into(),
        name: name.into(),
        ipv4_address: ip.into(),
        device_ids: devices.iter().map(|d| d.id).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ClientError;

    #[tokio::test]
    async fn empty_server_serves_health() {
        let server = TestServer::start().await.unwrap();

        assert_ne!(server.addr.port(), 0);
        assert_eq!(server.client.health().await.unwrap(), "OK");
        assert!(server.base_url().starts_with("http://127.0.0.1:"));
        assert!(server.client.list_gateways().await.unwrap().is_empty());
        server.shutdown().await;
    }

    #[tokio::test]
    async fn seeded_server_exposes_star_fixtures() {
        let server = TestServer::start_seeded(star_fixtures()).await.unwrap();

        assert_eq!(server.store().gateway_count(), 3);
        assert_eq!(server.store().device_count(), 13);
        let south = server.client.get_gateway(SOUTH_STAR).await.unwrap();
        assert_eq!(south.devices.len(), 10);
    }

    #[tokio::test]
    async fn testing_routes_are_mounted() {
        let server = TestServer::start_seeded(star_fixtures()).await.unwrap();
        server.client.reset().await.unwrap();
        assert_eq!(server.store().gateway_count(), 0);
    }

    #[tokio::test]
    async fn inconsistent_fixtures_fail_to_start() {
        let mut fixtures = star_fixtures();
        fixtures.devices[1].uid = fixtures.devices[0].uid;

        let err = TestServer::start_seeded(fixtures).await.err().unwrap();
        assert!(matches!(err, ClientError::Seed(_)));
    }
}
