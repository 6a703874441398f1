use std::fmt;
use std::net::{IpAddr, SocketAddr};
use x25519_dalek::{PublicKey, StaticSecret};

use crate::config::parser::{derive_public_key, encode_key, generate_private_key};
use crate::config::{DeviceConfig, PeerConfig, Role, TunnelSettings};
use crate::error::{ResolveError, Result};
use crate::platform::DeviceController;

/// What the server operator hands to the client operator out-of-band
pub struct ServerCredentials {
    pub server_public_key: PublicKey,
    /// Generated for the client; never kept by the server after printing
    pub peer_private_key: StaticSecret,
}

impl ServerCredentials {
    /// The first two client-role arguments, in order
    pub fn client_arguments(&self) -> [String; 2] {
        [
            encode_key(self.server_public_key.as_bytes()),
            encode_key(&self.peer_private_key.to_bytes()),
        ]
    }
}

impl fmt::Debug for ServerCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerCredentials")
            .field("server_public_key", &self.server_public_key)
            .field("peer_private_key", &"<redacted>")
            .finish()
    }
}

/// Server view: the client may only source its own tunnel address and is
/// never dialed, so it has no endpoint.
pub fn server_device_config(
    settings: &TunnelSettings,
    server_private_key: StaticSecret,
    peer_public_key: PublicKey,
) -> DeviceConfig {
    let peer = PeerConfig::new(peer_public_key).with_allowed_ip(settings.peer_route_for(Role::Server));

    DeviceConfig {
        private_key: server_private_key,
        listen_port: Some(settings.listen_port),
        peers: vec![peer],
        replace_peers: true,
    }
}

/// Client view: the server is reachable at `endpoint` and owns its tunnel address
pub fn client_device_config(
    settings: &TunnelSettings,
    client_private_key: StaticSecret,
    server_public_key: PublicKey,
    endpoint: SocketAddr,
) -> DeviceConfig {
    let peer = PeerConfig::new(server_public_key)
        .with_allowed_ip(settings.peer_route_for(Role::Client))
        .with_endpoint(endpoint);

    DeviceConfig {
        private_key: client_private_key,
        listen_port: None,
        peers: vec![peer],
        replace_peers: true,
    }
}

/// Resolve `host` (IP literal or DNS name) to a UDP endpoint on `port`
pub async fn resolve_endpoint(host: &str, port: u16) -> Result<SocketAddr> {
    let host = host.trim();
    let literal = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);

    if let Ok(ip) = literal.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, port));
    }

    let mut addrs = tokio::net::lookup_host((literal, port))
        .await
        .map_err(|e| ResolveError::Lookup {
            target: format!("{}:{}", host, port),
            reason: e.to_string(),
        })?;

    addrs
        .next()
        .ok_or_else(|| ResolveError::NoAddresses(format!("{}:{}", host, port)).into())
}

/// Applies the WireGuard peer protocol to the tunnel interface
pub struct PeerConfigurator<'a, D: DeviceController> {
    devices: &'a D,
    settings: &'a TunnelSettings,
}

impl<'a, D: DeviceController> PeerConfigurator<'a, D> {
    pub fn new(devices: &'a D, settings: &'a TunnelSettings) -> Self {
        Self { devices, settings }
    }

    /// Generate both key pairs, install the client as the only peer and
    /// return what the client operator needs.
    pub async fn configure_server(&self, interface: &str) -> Result<ServerCredentials> {
        let peer_private_key = generate_private_key();
        let peer_public_key = derive_public_key(&peer_private_key);

        let server_private_key = generate_private_key();
        let server_public_key = derive_public_key(&server_private_key);

        let config = server_device_config(self.settings, server_private_key, peer_public_key);
        self.devices.apply(interface, &config).await?;

        tracing::info!(
            interface,
            public_key = %encode_key(server_public_key.as_bytes()),
            "applied server endpoint configuration"
        );

        Ok(ServerCredentials {
            server_public_key,
            peer_private_key,
        })
    }

    /// Point the tunnel at the server. Keys arrive already decoded, so only
    /// resolution and the apply itself can fail here.
    pub async fn configure_client(
        &self,
        interface: &str,
        server_public_key: PublicKey,
        client_private_key: StaticSecret,
        server_address: &str,
    ) -> Result<SocketAddr> {
        let endpoint = resolve_endpoint(server_address, self.settings.listen_port).await?;

        let config = client_device_config(
            self.settings,
            client_private_key,
            server_public_key,
            endpoint,
        );
        self.devices.apply(interface, &config).await?;

        tracing::info!(interface, %endpoint, "applied client endpoint configuration");

        Ok(endpoint)
    }
}
