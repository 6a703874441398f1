use ip_network::IpNetwork;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use x25519_dalek::{PublicKey, StaticSecret};

use crate::error::ConfigError;

/// Which end of the tunnel this process is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Generates both key pairs and waits to be dialed
    Server,
    /// Uses operator-supplied keys and dials the server
    Client,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Server => f.write_str("server"),
            Role::Client => f.write_str("client"),
        }
    }
}

/// Address assigned to the tunnel interface, host bits included (e.g. 10.0.0.1/24)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceAddress {
    pub ip: IpAddr,
    pub prefix: u8,
}

impl InterfaceAddress {
    pub fn new(ip: IpAddr, prefix: u8) -> Result<Self, ConfigError> {
        let max = if ip.is_ipv4() { 32 } else { 128 };
        if prefix > max {
            return Err(ConfigError::InvalidAddress(format!("{}/{}", ip, prefix)));
        }
        Ok(Self { ip, prefix })
    }

    /// Single-host route (/32 or /128) covering only this address
    pub fn host_route(&self) -> IpNetwork {
        IpNetwork::from(self.ip)
    }

    /// Network this address lives in
    pub fn network(&self) -> Result<IpNetwork, ConfigError> {
        IpNetwork::new_truncate(self.ip, self.prefix)
            .map_err(|_| ConfigError::InvalidAddress(self.to_string()))
    }
}

impl FromStr for InterfaceAddress {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || ConfigError::InvalidAddress(s.to_string());

        match s.split_once('/') {
            Some((ip, prefix)) => {
                let ip: IpAddr = ip.parse().map_err(|_| invalid())?;
                let prefix: u8 = prefix.parse().map_err(|_| invalid())?;
                Self::new(ip, prefix)
            }
            None => {
                // No CIDR suffix means a single host
                let ip: IpAddr = s.parse().map_err(|_| invalid())?;
                let prefix = if ip.is_ipv4() { 32 } else { 128 };
                Self::new(ip, prefix)
            }
        }
    }
}

impl fmt::Display for InterfaceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.ip, self.prefix)
    }
}

/// Host port published by a container, in `docker run -p` form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortMapping {
    pub host_ip: IpAddr,
    pub host_port: u16,
    pub container_port: u16,
}

impl fmt::Display for PortMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.host_ip {
            IpAddr::V4(ip) => write!(f, "{}:{}:{}", ip, self.host_port, self.container_port),
            IpAddr::V6(ip) => write!(f, "[{}]:{}:{}", ip, self.host_port, self.container_port),
        }
    }
}

/// A sidecar container started next to the tunnel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadSpec {
    pub name: String,
    pub image: String,
    pub publish: Option<PortMapping>,
    /// Keep stdin open and allocate a TTY so an idle shell image stays up
    pub interactive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSettings {
    pub name: String,
    pub image: String,
    pub publish_port: u16,
    pub container_port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSettings {
    pub name: String,
    pub image: String,
}

/// Process-wide tunnel settings, fixed for one run.
///
/// Both ends must run with identical settings to interoperate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelSettings {
    pub interface_name: String,
    pub listen_port: u16,
    pub server_address: InterfaceAddress,
    pub client_address: InterfaceAddress,
    pub service: ServiceSettings,
    pub probe: ProbeSettings,
    /// Container runtime CLI (docker or a compatible one)
    pub runtime_binary: String,
}

pub const DEFAULT_INTERFACE_NAME: &str = "wg-tunnel";
pub const DEFAULT_LISTEN_PORT: u16 = 51820;

impl Default for TunnelSettings {
    fn default() -> Self {
        Self {
            interface_name: DEFAULT_INTERFACE_NAME.to_string(),
            listen_port: DEFAULT_LISTEN_PORT,
            server_address: InterfaceAddress {
                ip: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)),
                prefix: 24,
            },
            client_address: InterfaceAddress {
                ip: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)),
                prefix: 24,
            },
            service: ServiceSettings {
                name: "nginx".to_string(),
                image: "nginx".to_string(),
                publish_port: 8080,
                container_port: 80,
            },
            probe: ProbeSettings {
                name: "curlContainer".to_string(),
                image: "tutum/curl".to_string(),
            },
            runtime_binary: "docker".to_string(),
        }
    }
}

impl TunnelSettings {
    /// Address assigned to the local interface for `role`
    pub fn address_for(&self, role: Role) -> InterfaceAddress {
        match role {
            Role::Server => self.server_address,
            Role::Client => self.client_address,
        }
    }

    /// The only allowed-IP of the remote peer as seen from `role`
    pub fn peer_route_for(&self, role: Role) -> IpNetwork {
        match role {
            Role::Server => self.client_address.host_route(),
            Role::Client => self.server_address.host_route(),
        }
    }

    /// Tunnel-side address where the service workload is reachable
    pub fn service_endpoint(&self) -> SocketAddr {
        SocketAddr::new(self.server_address.ip, self.service.publish_port)
    }

    pub fn workload_for(&self, role: Role) -> WorkloadSpec {
        match role {
            Role::Server => WorkloadSpec {
                name: self.service.name.clone(),
                image: self.service.image.clone(),
                publish: Some(PortMapping {
                    host_ip: self.server_address.ip,
                    host_port: self.service.publish_port,
                    container_port: self.service.container_port,
                }),
                interactive: false,
            },
            Role::Client => WorkloadSpec {
                name: self.probe.name.clone(),
                image: self.probe.image.clone(),
                publish: None,
                interactive: true,
            },
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interface_name.is_empty() || self.interface_name.len() > 15 {
            return Err(ConfigError::InvalidValue {
                key: "InterfaceName",
                reason: format!("'{}' must be 1 to 15 bytes", self.interface_name),
            });
        }

        if self.listen_port == 0 {
            return Err(ConfigError::InvalidPort("ListenPort must not be 0".to_string()));
        }
        if self.service.publish_port == 0 || self.service.container_port == 0 {
            return Err(ConfigError::InvalidPort(
                "service ports must not be 0".to_string(),
            ));
        }

        if self.server_address.ip == self.client_address.ip {
            return Err(ConfigError::InvalidAddress(format!(
                "server and client share {}",
                self.server_address.ip
            )));
        }

        let server_net = self.server_address.network()?;
        let client_net = self.client_address.network()?;
        if server_net != client_net {
            return Err(ConfigError::InvalidAddress(format!(
                "{} and {} are not in the same subnet",
                self.server_address, self.client_address
            )));
        }

        for (key, value) in [
            ("Service.Name", &self.service.name),
            ("Service.Image", &self.service.image),
            ("Probe.Name", &self.probe.name),
            ("Probe.Image", &self.probe.image),
            ("Runtime.Binary", &self.runtime_binary),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key,
                    reason: "must not be empty".to_string(),
                });
            }
        }

        Ok(())
    }
}

/// Remote party of the tunnel
#[derive(Debug, Clone, PartialEq)]
pub struct PeerConfig {
    pub public_key: PublicKey,
    /// Routing scope and source ACL for this peer
    pub allowed_ips: Vec<IpNetwork>,
    /// Set only when the local side dials the peer
    pub endpoint: Option<SocketAddr>,
    /// Drop any allowed-IPs already installed for this peer
    pub replace_allowed_ips: bool,
}

impl PeerConfig {
    pub fn new(public_key: PublicKey) -> Self {
        Self {
            public_key,
            allowed_ips: Vec::new(),
            endpoint: None,
            replace_allowed_ips: true,
        }
    }

    pub fn with_allowed_ip(mut self, network: IpNetwork) -> Self {
        self.allowed_ips.push(network);
        self
    }

    pub fn with_endpoint(mut self, endpoint: SocketAddr) -> Self {
        self.endpoint = Some(endpoint);
        self
    }
}

/// Full state applied to the tunnel interface in one call
#[derive(Clone)]
pub struct DeviceConfig {
    pub private_key: StaticSecret,
    /// Only the server listens on a fixed port
    pub listen_port: Option<u16>,
    pub peers: Vec<PeerConfig>,
    /// Remove every peer not in `peers`
    pub replace_peers: bool,
}

impl fmt::Debug for DeviceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceConfig")
            .field("private_key", &"<redacted>")
            .field("listen_port", &self.listen_port)
            .field("peers", &self.peers)
            .field("replace_peers", &self.replace_peers)
            .finish()
    }
}

/// Client-role arguments, already validated
#[derive(Clone)]
pub struct ClientArgs {
    pub server_public_key: PublicKey,
    pub client_private_key: StaticSecret,
    /// Server's reachable address, host name or IP, without port
    pub server_address: String,
}

impl fmt::Debug for ClientArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientArgs")
            .field("server_public_key", &self.server_public_key)
            .field("server_address", &self.server_address)
            .finish_non_exhaustive()
    }
}

/// What the process was asked to do, decided once at startup
#[derive(Debug, Clone)]
pub enum Invocation {
    Server,
    Client(ClientArgs),
}

impl Invocation {
    pub fn role(&self) -> Role {
        match self {
            Invocation::Server => Role::Server,
            Invocation::Client(_) => Role::Client,
        }
    }
}
