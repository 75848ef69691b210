//! Application state for the REST API

use std::sync::Arc;

use iotgw_core::{DeviceService, GatewayService, RecordStore, Services};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    services: Services,
    /// Whether `/api/testing/*` routes are mounted
    testing_routes: bool,
}

impl AppState {
    /// Create a new AppState over the given store
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            services: Services::new(store),
            testing_routes: false,
        }
    }

    /// Enable or disable the testing routes
    pub fn with_testing_routes(mut self, enabled: bool) -> Self {
        self.testing_routes = enabled;
        self
    }

    pub fn gateways(&self) -> &GatewayService {
        &self.services.gateways
    }

    pub fn devices(&self) -> &DeviceService {
        &self.services.devices
    }

    pub fn testing_routes(&self) -> bool {
        self.testing_routes
    }
}
