use crate::config::WorkloadSpec;
use crate::error::Result;
use crate::platform::{WorkloadHandle, WorkloadRuntime};

/// A started sidecar. Stopping consumes it, so it can only be stopped once.
#[derive(Debug)]
pub struct RunningWorkload {
    handle: WorkloadHandle,
}

impl RunningWorkload {
    pub fn name(&self) -> &str {
        &self.handle.name
    }

    pub fn handle(&self) -> &WorkloadHandle {
        &self.handle
    }
}

pub struct WorkloadSupervisor<'a, W: WorkloadRuntime> {
    runtime: &'a W,
}

impl<'a, W: WorkloadRuntime> WorkloadSupervisor<'a, W> {
    pub fn new(runtime: &'a W) -> Self {
        Self { runtime }
    }

    pub async fn start(&self, spec: &WorkloadSpec) -> Result<RunningWorkload> {
        tracing::info!(name = %spec.name, image = %spec.image, "starting workload");

        let handle = self.runtime.start(spec).await?;
        if let Some(id) = &handle.id {
            tracing::debug!(name = %handle.name, id = %id, "workload started");
        }

        Ok(RunningWorkload { handle })
    }

    pub async fn stop(&self, workload: RunningWorkload) -> Result<()> {
        tracing::info!(name = %workload.name(), "stopping workload");
        self.runtime.stop(&workload.handle).await
    }
}
