pub mod lifecycle;
pub mod workload;

pub use lifecycle::{
    spawn_interrupt_listener, Handoff, Interrupt, InterruptTrigger, Lifecycle, LifecycleState,
    RunningTunnel, TeardownReport,
};
pub use workload::{RunningWorkload, WorkloadSupervisor};
