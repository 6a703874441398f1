use async_trait::async_trait;
use wireguard_control::{Backend, DeviceUpdate, InterfaceName, Key, PeerConfigBuilder};

use crate::config::{DeviceConfig, PeerConfig};
use crate::error::{ProtocolError, Result};
use crate::platform::traits::DeviceController;

/// Configures kernel WireGuard devices over generic netlink
#[derive(Debug, Default)]
pub struct KernelDeviceController;

impl KernelDeviceController {
    pub fn new() -> Self {
        Self
    }
}

fn peer_builder(peer: &PeerConfig) -> PeerConfigBuilder {
    let mut builder = PeerConfigBuilder::new(&Key(*peer.public_key.as_bytes()));

    if peer.replace_allowed_ips {
        builder = builder.replace_allowed_ips();
    }
    for network in &peer.allowed_ips {
        builder = builder.add_allowed_ip(network.network_address(), network.netmask());
    }
    if let Some(endpoint) = peer.endpoint {
        builder = builder.set_endpoint(endpoint);
    }

    builder
}

fn device_update(config: &DeviceConfig) -> DeviceUpdate {
    let mut update = DeviceUpdate::new().set_private_key(Key(config.private_key.to_bytes()));

    if let Some(port) = config.listen_port {
        update = update.set_listen_port(port);
    }
    if config.replace_peers {
        update = update.replace_peers();
    }
    for peer in &config.peers {
        update = update.add_peer(peer_builder(peer));
    }

    update
}

#[async_trait]
impl DeviceController for KernelDeviceController {
    async fn apply(&self, interface: &str, config: &DeviceConfig) -> Result<()> {
        let iface: InterfaceName = interface
            .parse()
            .map_err(|e| ProtocolError::InterfaceName(format!("{}: {}", interface, e)))?;

        let update = device_update(config);

        // wireguard-control talks to the kernel synchronously
        tokio::task::spawn_blocking(move || update.apply(&iface, Backend::Kernel))
            .await
            .map_err(|e| ProtocolError::Apply {
                interface: interface.to_string(),
                reason: e.to_string(),
            })?
            .map_err(|e| ProtocolError::Apply {
                interface: interface.to_string(),
                reason: e.to_string(),
            })?;

        tracing::debug!(interface, peers = config.peers.len(), "applied device configuration");

        Ok(())
    }
}
