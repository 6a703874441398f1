//! Recording doubles for the platform traits

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::config::{DeviceConfig, InterfaceAddress, WorkloadSpec};
use crate::error::{InterfaceError, ProtocolError, Result, WorkloadError};
use crate::platform::{DeviceController, NetworkManager, WorkloadHandle, WorkloadRuntime};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    FindInterface(String),
    CreateLink(String),
    DeleteLink(u32),
    AddAddress(u32, InterfaceAddress),
    SetLinkUp(u32),
    ApplyDevice(String),
    StartWorkload(String),
    StopWorkload(String),
}

/// Shared, ordered log of every call made to the doubles
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    pub fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.0.lock().unwrap().iter().filter(|c| pred(c)).count()
    }
}

/// Which `FakeNetwork` operation should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetFail {
    Create,
    AddAddress,
    SetLinkUp,
    Delete,
}

pub struct FakeNetwork {
    log: CallLog,
    links: Mutex<HashMap<String, u32>>,
    next_index: Mutex<u32>,
    fail: Option<NetFail>,
}

impl FakeNetwork {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            links: Mutex::new(HashMap::new()),
            next_index: Mutex::new(10),
            fail: None,
        }
    }

    pub fn failing(log: CallLog, fail: NetFail) -> Self {
        Self {
            fail: Some(fail),
            ..Self::new(log)
        }
    }

    /// Pretend a link survived from an earlier run
    pub fn with_existing(self, name: &str, index: u32) -> Self {
        self.links.lock().unwrap().insert(name.to_string(), index);
        self
    }

    pub fn has_link(&self, name: &str) -> bool {
        self.links.lock().unwrap().contains_key(name)
    }

    fn check(&self, op: NetFail) -> Result<()> {
        if self.fail == Some(op) {
            return Err(InterfaceError::Netlink(format!("injected {:?} failure", op)).into());
        }
        Ok(())
    }
}

#[async_trait]
impl NetworkManager for FakeNetwork {
    async fn find_interface(&self, name: &str) -> Result<Option<u32>> {
        self.log.push(Call::FindInterface(name.to_string()));
        Ok(self.links.lock().unwrap().get(name).copied())
    }

    async fn create_wireguard_link(&self, name: &str) -> Result<u32> {
        self.log.push(Call::CreateLink(name.to_string()));
        self.check(NetFail::Create)?;

        let mut links = self.links.lock().unwrap();
        if links.contains_key(name) {
            return Err(InterfaceError::Create {
                name: name.to_string(),
                reason: "File exists".to_string(),
            }
            .into());
        }

        let mut next = self.next_index.lock().unwrap();
        *next += 1;
        links.insert(name.to_string(), *next);
        Ok(*next)
    }

    async fn delete_link(&self, iface_index: u32) -> Result<()> {
        self.log.push(Call::DeleteLink(iface_index));
        self.check(NetFail::Delete)?;
        self.links.lock().unwrap().retain(|_, idx| *idx != iface_index);
        Ok(())
    }

    async fn add_address(&self, iface_index: u32, addr: InterfaceAddress) -> Result<()> {
        self.log.push(Call::AddAddress(iface_index, addr));
        self.check(NetFail::AddAddress)
    }

    async fn set_link_up(&self, iface_index: u32) -> Result<()> {
        self.log.push(Call::SetLinkUp(iface_index));
        self.check(NetFail::SetLinkUp)
    }
}

pub struct FakeDevices {
    log: CallLog,
    applied: Mutex<Vec<(String, DeviceConfig)>>,
    fail: bool,
}

impl FakeDevices {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            applied: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing(log: CallLog) -> Self {
        Self {
            fail: true,
            ..Self::new(log)
        }
    }

    pub fn applied(&self) -> Vec<(String, DeviceConfig)> {
        self.applied.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeviceController for FakeDevices {
    async fn apply(&self, interface: &str, config: &DeviceConfig) -> Result<()> {
        self.log.push(Call::ApplyDevice(interface.to_string()));
        if self.fail {
            return Err(ProtocolError::Apply {
                interface: interface.to_string(),
                reason: "injected failure".to_string(),
            }
            .into());
        }
        self.applied
            .lock()
            .unwrap()
            .push((interface.to_string(), config.clone()));
        Ok(())
    }
}

pub struct FakeRuntime {
    log: CallLog,
    fail_start: bool,
    fail_stop: bool,
}

impl FakeRuntime {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            fail_start: false,
            fail_stop: false,
        }
    }

    pub fn failing_start(log: CallLog) -> Self {
        Self {
            fail_start: true,
            ..Self::new(log)
        }
    }

    pub fn failing_stop(log: CallLog) -> Self {
        Self {
            fail_stop: true,
            ..Self::new(log)
        }
    }
}

#[async_trait]
impl WorkloadRuntime for FakeRuntime {
    async fn start(&self, spec: &WorkloadSpec) -> Result<WorkloadHandle> {
        self.log.push(Call::StartWorkload(spec.name.clone()));
        if self.fail_start {
            return Err(WorkloadError::Start {
                name: spec.name.clone(),
                output: "Conflict. The container name is already in use".to_string(),
            }
            .into());
        }
        Ok(WorkloadHandle {
            name: spec.name.clone(),
            id: Some(format!("{}-id", spec.name)),
        })
    }

    async fn stop(&self, handle: &WorkloadHandle) -> Result<()> {
        self.log.push(Call::StopWorkload(handle.name.clone()));
        if self.fail_stop {
            return Err(WorkloadError::Stop {
                name: handle.name.clone(),
                output: "No such container".to_string(),
            }
            .into());
        }
        Ok(())
    }
}
