pub mod netlink;
pub mod wireguard;

pub use netlink::LinuxNetworkManager;
pub use wireguard::KernelDeviceController;
