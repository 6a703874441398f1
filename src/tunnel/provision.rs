use crate::config::InterfaceAddress;
use crate::error::Result;
use crate::platform::NetworkManager;

/// A tunnel interface that exists, carries its address and is up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelInterface {
    pub name: String,
    pub index: u32,
    pub address: InterfaceAddress,
}

/// Creates the tunnel interface, replacing any stale one with the same name
pub struct Provisioner<'a, N: NetworkManager> {
    network: &'a N,
}

impl<'a, N: NetworkManager> Provisioner<'a, N> {
    pub fn new(network: &'a N) -> Self {
        Self { network }
    }

    /// Bring up a fresh WireGuard interface named `name` with `address`.
    ///
    /// All-or-nothing: any failure is returned to the caller, which treats it
    /// as fatal. A link left behind by a crashed run is deleted first.
    pub async fn provision(&self, name: &str, address: InterfaceAddress) -> Result<TunnelInterface> {
        if let Some(stale) = self.network.find_interface(name).await? {
            println!("Interface exists: {}, deleting to recreate", name);
            self.network.delete_link(stale).await?;
        }

        let index = self.network.create_wireguard_link(name).await?;
        tracing::info!("Interface {} added (index={})", name, index);

        self.network.add_address(index, address).await?;
        tracing::info!("Added address {} to {}", address, name);

        self.network.set_link_up(index).await?;

        Ok(TunnelInterface {
            name: name.to_string(),
            index,
            address,
        })
    }

    /// Remove the interface at teardown
    pub async fn release(&self, interface: &TunnelInterface) -> Result<()> {
        self.network.delete_link(interface.index).await?;
        tracing::info!("Interface {} removed", interface.name);
        Ok(())
    }
}
