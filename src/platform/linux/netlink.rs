use async_trait::async_trait;
use futures::TryStreamExt;
use rtnetlink::Handle;
use std::ffi::CString;

use crate::config::InterfaceAddress;
use crate::error::{InterfaceError, Result};
use crate::platform::traits::NetworkManager;

/// Linux implementation of NetworkManager using netlink
pub struct LinuxNetworkManager {
    handle: Handle,
}

impl LinuxNetworkManager {
    /// Create a new LinuxNetworkManager
    pub async fn new() -> Result<Self> {
        let (connection, handle, _) = rtnetlink::new_connection()
            .map_err(|e| InterfaceError::Netlink(e.to_string()))?;

        // Spawn the connection handler
        tokio::spawn(connection);

        Ok(Self { handle })
    }

    async fn get_interface_index(&self, name: &str) -> Result<u32> {
        let mut links = self.handle.link().get().match_name(name.to_string()).execute();

        if let Some(link) = links
            .try_next()
            .await
            .map_err(|e| InterfaceError::Netlink(e.to_string()))?
        {
            return Ok(link.header.index);
        }

        Err(InterfaceError::Netlink(format!("Interface {} not found", name)).into())
    }
}

#[async_trait]
impl NetworkManager for LinuxNetworkManager {
    async fn find_interface(&self, name: &str) -> Result<Option<u32>> {
        let name_cstr =
            CString::new(name).map_err(|e| InterfaceError::Netlink(e.to_string()))?;

        // Zero means no such interface
        let index = unsafe { libc::if_nametoindex(name_cstr.as_ptr()) };

        Ok((index != 0).then_some(index))
    }

    async fn create_wireguard_link(&self, name: &str) -> Result<u32> {
        self.handle
            .link()
            .add()
            .wireguard(name.to_string())
            .execute()
            .await
            .map_err(|e| InterfaceError::Create {
                name: name.to_string(),
                reason: e.to_string(),
            })?;

        self.get_interface_index(name).await
    }

    async fn delete_link(&self, iface_index: u32) -> Result<()> {
        self.handle
            .link()
            .del(iface_index)
            .execute()
            .await
            .map_err(|e| InterfaceError::Delete {
                name: format!("index {}", iface_index),
                reason: e.to_string(),
            })?;

        Ok(())
    }

    async fn add_address(&self, iface_index: u32, addr: InterfaceAddress) -> Result<()> {
        self.handle
            .address()
            .add(iface_index, addr.ip, addr.prefix)
            .execute()
            .await
            .map_err(|e| InterfaceError::AddAddress(format!("{}: {}", addr, e)))?;

        Ok(())
    }

    async fn set_link_up(&self, iface_index: u32) -> Result<()> {
        self.handle
            .link()
            .set(iface_index)
            .up()
            .execute()
            .await
            .map_err(|e| InterfaceError::SetLinkUp(e.to_string()))?;

        Ok(())
    }
}
