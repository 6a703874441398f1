pub mod docker;
pub mod traits;

#[cfg(target_os = "linux")]
pub mod linux;

pub use docker::DockerRuntime;
pub use traits::{DeviceController, NetworkManager, WorkloadHandle, WorkloadRuntime};

#[cfg(target_os = "linux")]
pub use linux::{KernelDeviceController, LinuxNetworkManager};
