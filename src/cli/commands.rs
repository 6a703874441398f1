use std::path::PathBuf;

use crate::config::{load_settings, parse_invocation, Role, TunnelSettings};
use crate::error::Result;
use crate::platform::{DeviceController, NetworkManager, WorkloadRuntime};
use crate::runtime::{Handoff, Interrupt, Lifecycle, TeardownReport};

/// Execute the tunnel bootstrap and block until interrupted
pub async fn cmd_run(config_path: Option<PathBuf>, args: Vec<String>) -> Result<()> {
    println!("<Wireguard Tunnel>");

    let settings = match config_path {
        Some(path) => load_settings(&path)?,
        None => TunnelSettings::default(),
    };

    run_platform(&settings, &args).await
}

/// Bootstrap the role selected by `args` over the given backends, then block
/// until the interrupt returned by `listen` fires and tear down.
///
/// Arguments are validated before any backend is called. A failed interrupt
/// listener is returned after teardown.
pub async fn run_tunnel<N, D, W, L>(
    settings: &TunnelSettings,
    args: &[String],
    network: &N,
    devices: &D,
    runtime: &W,
    listen: L,
) -> Result<()>
where
    N: NetworkManager,
    D: DeviceController,
    W: WorkloadRuntime,
    L: FnOnce() -> Interrupt,
{
    let invocation = parse_invocation(args)?;

    match invocation.role() {
        Role::Server => println!("Deploying server side of the tunnel"),
        Role::Client => println!("Deploying client side of the tunnel"),
    }

    let (running, handoff) = Lifecycle::new(settings, network, devices, runtime)
        .bootstrap(invocation)
        .await?;

    println!(
        "Interface {} is up with address {}",
        running.interface().name,
        running.interface().address
    );
    print_handoff(handoff);
    print_workload_hint(settings, running.role());

    // Handler goes in before the operator is told to use it
    let interrupt = listen();
    println!("Issue ^-C to tear down the setup");

    let (report, interrupted) = running.run_until(interrupt).await;
    print_teardown(settings, &report);

    interrupted
}

#[cfg(target_os = "linux")]
async fn run_platform(settings: &TunnelSettings, args: &[String]) -> Result<()> {
    use crate::platform::{DockerRuntime, KernelDeviceController, LinuxNetworkManager};
    use crate::runtime::spawn_interrupt_listener;

    let network = LinuxNetworkManager::new().await?;
    let devices = KernelDeviceController::new();
    let runtime = DockerRuntime::new(settings.runtime_binary.clone());

    run_tunnel(
        settings,
        args,
        &network,
        &devices,
        &runtime,
        spawn_interrupt_listener,
    )
    .await
}

#[cfg(not(target_os = "linux"))]
async fn run_platform(_settings: &TunnelSettings, args: &[String]) -> Result<()> {
    parse_invocation(args)?;

    Err(crate::error::InterfaceError::Netlink(
        "WireGuard interfaces are only supported on Linux".to_string(),
    )
    .into())
}

fn print_handoff(handoff: Handoff) {
    match handoff {
        Handoff::Server(creds) => {
            let [server_public_key, peer_private_key] = creds.client_arguments();
            println!("Successfully applied server endpoint configuration");
            println!("On client, run specifying ip of server where deployment was made:");
            println!(
                "\t$ {} {} {} <public ip of server>",
                env!("CARGO_PKG_NAME"),
                server_public_key,
                peer_private_key
            );
        }
        Handoff::Client { endpoint } => {
            println!("Successfully applied client endpoint configuration (server at {})", endpoint);
        }
    }
}

fn print_workload_hint(settings: &TunnelSettings, role: Role) {
    let service = settings.service_endpoint();
    match role {
        Role::Server => {
            println!(
                "{} started on {}, to test run on the client:",
                settings.service.name, service
            );
            println!("\t$ curl {}", service);
        }
        Role::Client => {
            println!(
                "{} started successfully, to test, run on other terminal:",
                settings.probe.name
            );
            println!(
                "\t$ {} exec -it {} curl {}",
                settings.runtime_binary, settings.probe.name, service
            );
        }
    }
}

fn print_teardown(settings: &TunnelSettings, report: &TeardownReport) {
    if let Some(e) = &report.workload_error {
        eprintln!("Warning: {}", e);
    }
    if let Some(e) = &report.interface_error {
        eprintln!("Warning: {}", e);
    }

    if report.is_clean() {
        println!(
            "Workload stopped and {} removed, exiting gracefully",
            settings.interface_name
        );
    } else {
        println!("Teardown finished with warnings, exiting");
    }
}
