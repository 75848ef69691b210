//! Registry HTTP client implementation

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use iotgw_core::{Device, DeviceUpdate, DeviceView, Gateway, GatewayUpdate, GatewayView};

use crate::error::{ClientError, Result};

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default connection timeout
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Error body returned by the server
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    kind: String,
    error: String,
}

/// Gateway registry REST API client
#[derive(Debug, Clone)]
pub struct IotClient {
    client: Client,
    base_url: Url,
}

impl IotClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the server (e.g., "http://localhost:3001")
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_config(base_url, DEFAULT_TIMEOUT, DEFAULT_CONNECT_TIMEOUT)
    }

    /// Create a new client with custom timeouts
    pub fn with_config(
        base_url: &str,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()?;

        let base_url = Url::parse(base_url)?;

        Ok(Self { client, base_url })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Get a reference to the underlying HTTP client
    pub fn http_client(&self) -> &Client {
        &self.client
    }

    // =========================================================================
    // Health Check
    // =========================================================================

    /// Check server health
    #[instrument(skip(self))]
    pub async fn health(&self) -> Result<String> {
        let url = self.base_url.join("/health")?;
        let response = self.client.get(url).send().await?;

        if response.status().is_success() {
            Ok(response.text().await?)
        } else {
            Err(self.extract_error(response).await)
        }
    }

    // =========================================================================
    // Gateway Operations
    // =========================================================================

    /// List all gateways with their devices
    #[instrument(skip(self))]
    pub async fn list_gateways(&self) -> Result<Vec<GatewayView>> {
        let url = self.base_url.join("/api/gateways")?;
        debug!("Listing gateways from {}", url);

        let response = self.client.get(url).send().await?;
        self.handle_response(response).await
    }

    /// Get one gateway with its devices
    #[instrument(skip(self))]
    pub async fn get_gateway(&self, id: &str) -> Result<GatewayView> {
        let url = self.base_url.join(&format!("/api/gateways/{}", id))?;
        let response = self.client.get(url).send().await?;
        self.handle_response(response).await
    }

    /// Create a gateway
    ///
    /// `body` is normally a [`NewGateway`](iotgw_core::NewGateway); any
    /// serializable value is sent as-is.
    #[instrument(skip(self, body))]
    pub async fn create_gateway<B: Serialize + ?Sized>(&self, body: &B) -> Result<Gateway> {
        let url = self.base_url.join("/api/gateways")?;
        let response = self.client.post(url).json(body).send().await?;
        self.handle_response(response).await
    }

    /// Update a gateway
    #[instrument(skip(self, update))]
    pub async fn update_gateway(&self, id: &str, update: &GatewayUpdate) -> Result<GatewayView> {
        let url = self.base_url.join(&format!("/api/gateways/{}", id))?;
        let response = self.client.put(url).json(update).send().await?;
        self.handle_response(response).await
    }

    /// Delete a gateway and its devices
    #[instrument(skip(self))]
    pub async fn delete_gateway(&self, id: &str) -> Result<()> {
        let url = self.base_url.join(&format!("/api/gateways/{}", id))?;
        let response = self.client.delete(url).send().await?;
        self.handle_empty(response).await
    }

    // =========================================================================
    // Device Operations
    // =========================================================================

    /// List all devices with their gateways
    #[instrument(skip(self))]
    pub async fn list_devices(&self) -> Result<Vec<DeviceView>> {
        let url = self.base_url.join("/api/devices")?;
        debug!("Listing devices from {}", url);

        let response = self.client.get(url).send().await?;
        self.handle_response(response).await
    }

    /// Get one device with its gateway
    #[instrument(skip(self))]
    pub async fn get_device(&self, id: &str) -> Result<DeviceView> {
        let url = self.base_url.join(&format!("/api/devices/{}", id))?;
        let response = self.client.get(url).send().await?;
        self.handle_response(response).await
    }

    /// Create a device
    ///
    /// `body` is normally a [`NewDevice`](iotgw_core::NewDevice).
    #[instrument(skip(self, body))]
    pub async fn create_device<B: Serialize + ?Sized>(&self, body: &B) -> Result<Device> {
        let url = self.base_url.join("/api/devices")?;
        let response = self.client.post(url).json(body).send().await?;
        self.handle_response(response).await
    }

    /// Update a device
    #[instrument(skip(self, update))]
    pub async fn update_device(&self, id: &str, update: &DeviceUpdate) -> Result<DeviceView> {
        let url = self.base_url.join(&format!("/api/devices/{}", id))?;
        let response = self.client.put(url).json(update).send().await?;
        self.handle_response(response).await
    }

    /// Delete a device
    #[instrument(skip(self))]
    pub async fn delete_device(&self, id: &str) -> Result<()> {
        let url = self.base_url.join(&format!("/api/devices/{}", id))?;
        let response = self.client.delete(url).send().await?;
        self.handle_empty(response).await
    }

    // =========================================================================
    // Testing Operations
    // =========================================================================

    /// Clear the store (server must have testing routes enabled)
    #[instrument(skip(self))]
    pub async fn reset(&self) -> Result<()> {
        let url = self.base_url.join("/api/testing/reset")?;
        let response = self.client.post(url).send().await?;
        self.handle_empty(response).await
    }

    // =========================================================================
    // Helper Methods
    // =========================================================================

    /// Handle response and parse JSON
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| ClientError::ParseError(e.to_string()))
        } else {
            Err(self.extract_error_from_status(response, status).await)
        }
    }

    /// Handle a response without a body
    async fn handle_empty(&self, response: reqwest::Response) -> Result<()> {
        if response.status().is_success() {
            Ok(())
        } else {
            Err(self.extract_error(response).await)
        }
    }

    /// Extract error from failed response
    async fn extract_error(&self, response: reqwest::Response) -> ClientError {
        let status = response.status();
        self.extract_error_from_status(response, status).await
    }

    async fn extract_error_from_status(
        &self,
        response: reqwest::Response,
        status: StatusCode,
    ) -> ClientError {
        match response.json::<ErrorResponse>().await {
            Ok(err) => ClientError::server_error(status.as_u16(), err.kind, err.error),
            Err(_) => ClientError::server_error(status.as_u16(), "unknown", format!("HTTP {}", status)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = IotClient::new("http://localhost:3001");
        assert!(client.is_ok());
    }

    #[test]
    fn test_invalid_url() {
        let client = IotClient::new("not a url");
        assert!(matches!(client, Err(ClientError::InvalidUrl(_))));
    }

    #[test]
    fn test_error_body_shape() {
        let body: ErrorResponse = serde_json::from_str(
            r#"{"kind":"missing_gateway","error":"Gateway not selected"}"#,
        )
        .unwrap();
        assert_eq!(body.kind, "missing_gateway");
        assert_eq!(body.error, "Gateway not selected");
    }
}
