pub mod parser;
pub mod types;

pub use parser::{load_settings, parse_invocation};
pub use types::{
    ClientArgs, DeviceConfig, InterfaceAddress, Invocation, PeerConfig, PortMapping, Role,
    TunnelSettings, WorkloadSpec,
};
