use async_trait::async_trait;

use crate::config::{DeviceConfig, InterfaceAddress, WorkloadSpec};
use crate::error::Result;

/// Link-level control plane of the host network stack
#[async_trait]
pub trait NetworkManager: Send + Sync {
    /// Look up an interface by name, `None` if it does not exist
    async fn find_interface(&self, name: &str) -> Result<Option<u32>>;

    /// Create a WireGuard-type link and return its index
    async fn create_wireguard_link(&self, name: &str) -> Result<u32>;

    /// Delete a link
    async fn delete_link(&self, iface_index: u32) -> Result<()>;

    /// Add an IP address to the interface
    async fn add_address(&self, iface_index: u32, addr: InterfaceAddress) -> Result<()>;

    /// Bring interface up
    async fn set_link_up(&self, iface_index: u32) -> Result<()>;
}

/// WireGuard configuration interface of the tunnel engine
#[async_trait]
pub trait DeviceController: Send + Sync {
    /// Apply a full device configuration in one atomic call
    async fn apply(&self, interface: &str, config: &DeviceConfig) -> Result<()>;
}

/// Handle to a started workload, needed to stop it again
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadHandle {
    pub name: String,
    /// Runtime-assigned identifier when the runtime reports one
    pub id: Option<String>,
}

/// Supervisor capable of running sidecar containers
#[async_trait]
pub trait WorkloadRuntime: Send + Sync {
    async fn start(&self, spec: &WorkloadSpec) -> Result<WorkloadHandle>;

    async fn stop(&self, handle: &WorkloadHandle) -> Result<()>;
}
