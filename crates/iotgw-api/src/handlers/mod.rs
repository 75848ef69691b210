//! HTTP request handlers
//!
//! Each handler delegates to one service operation.

pub mod devices;
pub mod gateways;
pub mod testing;
