use std::io;
use std::net::SocketAddr;
use tokio::sync::oneshot;

use crate::config::{Invocation, Role, TunnelSettings};
use crate::error::{Result, WgError};
use crate::platform::{DeviceController, NetworkManager, WorkloadRuntime};
use crate::runtime::workload::{RunningWorkload, WorkloadSupervisor};
use crate::tunnel::{PeerConfigurator, Provisioner, ServerCredentials, TunnelInterface};

/// Bootstrap progress. Transitions only ever move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LifecycleState {
    Idle,
    InterfaceReady,
    PeerConfigured,
    WorkloadRunning,
    TearingDown,
    Terminated,
}

/// Role-specific result of a successful bootstrap
#[derive(Debug)]
pub enum Handoff {
    /// Material the client operator must be given
    Server(ServerCredentials),
    /// Where the client will send its first handshake
    Client { endpoint: SocketAddr },
}

/// Outcome of teardown. Failures here are reported, never fatal.
#[derive(Debug, Default)]
pub struct TeardownReport {
    pub workload_error: Option<WgError>,
    pub interface_error: Option<WgError>,
}

impl TeardownReport {
    pub fn is_clean(&self) -> bool {
        self.workload_error.is_none() && self.interface_error.is_none()
    }
}

/// Drives interface, peer and workload setup in role order
pub struct Lifecycle<'a, N, D, W>
where
    N: NetworkManager,
    D: DeviceController,
    W: WorkloadRuntime,
{
    settings: &'a TunnelSettings,
    network: &'a N,
    devices: &'a D,
    runtime: &'a W,
    state: LifecycleState,
}

impl<'a, N, D, W> Lifecycle<'a, N, D, W>
where
    N: NetworkManager,
    D: DeviceController,
    W: WorkloadRuntime,
{
    pub fn new(settings: &'a TunnelSettings, network: &'a N, devices: &'a D, runtime: &'a W) -> Self {
        Self {
            settings,
            network,
            devices,
            runtime,
            state: LifecycleState::Idle,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    fn advance(&mut self, next: LifecycleState) {
        debug_assert!(next > self.state, "{:?} -> {:?}", self.state, next);
        tracing::info!(from = ?self.state, to = ?next, "lifecycle transition");
        self.state = next;
    }

    /// Run Idle -> WorkloadRunning.
    ///
    /// Any error aborts the bootstrap as-is: nothing is rolled back and a
    /// provisioned interface stays until the next run replaces it.
    pub async fn bootstrap(
        mut self,
        invocation: Invocation,
    ) -> Result<(RunningTunnel<'a, N, D, W>, Handoff)> {
        let role = invocation.role();
        let settings = self.settings;

        let interface = Provisioner::new(self.network)
            .provision(&settings.interface_name, settings.address_for(role))
            .await?;
        self.advance(LifecycleState::InterfaceReady);

        let configurator = PeerConfigurator::new(self.devices, settings);
        let handoff = match invocation {
            Invocation::Server => {
                Handoff::Server(configurator.configure_server(&interface.name).await?)
            }
            Invocation::Client(client) => {
                let endpoint = configurator
                    .configure_client(
                        &interface.name,
                        client.server_public_key,
                        client.client_private_key,
                        &client.server_address,
                    )
                    .await?;
                Handoff::Client { endpoint }
            }
        };
        self.advance(LifecycleState::PeerConfigured);

        let workload = WorkloadSupervisor::new(self.runtime)
            .start(&settings.workload_for(role))
            .await?;
        self.advance(LifecycleState::WorkloadRunning);

        Ok((
            RunningTunnel {
                lifecycle: self,
                role,
                interface,
                workload,
            },
            handoff,
        ))
    }
}

/// A fully bootstrapped tunnel waiting to be torn down
pub struct RunningTunnel<'a, N, D, W>
where
    N: NetworkManager,
    D: DeviceController,
    W: WorkloadRuntime,
{
    lifecycle: Lifecycle<'a, N, D, W>,
    role: Role,
    interface: TunnelInterface,
    workload: RunningWorkload,
}

impl<'a, N, D, W> RunningTunnel<'a, N, D, W>
where
    N: NetworkManager,
    D: DeviceController,
    W: WorkloadRuntime,
{
    pub fn role(&self) -> Role {
        self.role
    }

    pub fn interface(&self) -> &TunnelInterface {
        &self.interface
    }

    pub fn workload(&self) -> &RunningWorkload {
        &self.workload
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// Suspend until `interrupt` fires, then tear down.
    ///
    /// Teardown runs whatever the listener reports. A listener that failed is
    /// returned next to the report so the caller can exit non-zero.
    pub async fn run_until(self, interrupt: Interrupt) -> (TeardownReport, Result<()>) {
        let outcome = interrupt.wait().await.map_err(WgError::from);
        if let Err(e) = &outcome {
            tracing::error!("Interrupt listener failed: {}", e);
        }

        (self.teardown().await, outcome)
    }

    /// Stop the workload once, then remove the interface
    pub async fn teardown(mut self) -> TeardownReport {
        self.lifecycle.advance(LifecycleState::TearingDown);
        let mut report = TeardownReport::default();

        if let Err(e) = WorkloadSupervisor::new(self.lifecycle.runtime)
            .stop(self.workload)
            .await
        {
            tracing::warn!("Failed to stop workload: {}", e);
            report.workload_error = Some(e);
        }

        if let Err(e) = Provisioner::new(self.lifecycle.network)
            .release(&self.interface)
            .await
        {
            tracing::warn!("Failed to remove interface {}: {}", self.interface.name, e);
            report.interface_error = Some(e);
        }

        self.lifecycle.advance(LifecycleState::Terminated);
        report
    }
}

/// Single-value "proceed to teardown" signal
pub struct Interrupt {
    outcome: oneshot::Receiver<io::Result<()>>,
}

/// Firing half of an [`Interrupt`]. Consumed by `fire`, so it fires once.
pub struct InterruptTrigger {
    outcome: oneshot::Sender<io::Result<()>>,
}

impl Interrupt {
    pub fn channel() -> (InterruptTrigger, Interrupt) {
        let (tx, rx) = oneshot::channel();
        (InterruptTrigger { outcome: tx }, Interrupt { outcome: rx })
    }

    /// Resolve on the first trigger.
    ///
    /// `Ok` means an operator interrupt. A trigger dropped without firing is
    /// reported as a listener failure.
    pub async fn wait(self) -> io::Result<()> {
        match self.outcome.await {
            Ok(outcome) => outcome,
            Err(_) => Err(io::Error::other("interrupt listener exited without a signal")),
        }
    }
}

impl InterruptTrigger {
    pub fn fire(self, outcome: io::Result<()>) {
        // Nobody waiting any more
        let _ = self.outcome.send(outcome);
    }
}

/// Install the SIGINT handler and spawn the single listener task.
///
/// The handler is registered before this returns, so an interrupt delivered
/// right after is caught. A registration failure fires the returned
/// interrupt with the error.
pub fn spawn_interrupt_listener() -> Interrupt {
    let (trigger, interrupt) = Interrupt::channel();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::interrupt()) {
            Ok(mut sigint) => {
                tokio::spawn(async move {
                    let outcome = match sigint.recv().await {
                        Some(()) => {
                            tracing::info!("Received SIGINT, shutting down...");
                            Ok(())
                        }
                        None => Err(io::Error::other("SIGINT stream closed")),
                    };
                    trigger.fire(outcome);
                });
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGINT: {}", e);
                trigger.fire(Err(e));
            }
        }
    }

    #[cfg(not(unix))]
    tokio::spawn(async move {
        let outcome = tokio::signal::ctrl_c().await;
        if outcome.is_ok() {
            tracing::info!("Received SIGINT, shutting down...");
        }
        trigger.fire(outcome);
    });

    interrupt
}
