//! Record types for gateways and devices

mod device;
mod gateway;

pub use device::*;
pub use gateway::*;
