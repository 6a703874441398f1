use async_trait::async_trait;
use std::process::{Output, Stdio};
use tokio::process::Command;

use crate::config::WorkloadSpec;
use crate::error::{Result, WorkloadError};
use crate::platform::traits::{WorkloadHandle, WorkloadRuntime};

/// Runs workloads through the docker CLI (or a drop-in such as podman)
#[derive(Debug, Clone)]
pub struct DockerRuntime {
    binary: String,
}

impl DockerRuntime {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    async fn exec(&self, args: &[String]) -> Result<Output> {
        tracing::debug!("{} {}", self.binary, args.join(" "));

        Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| {
                WorkloadError::Spawn {
                    binary: self.binary.clone(),
                    source,
                }
                .into()
            })
    }
}

/// Arguments for a detached, self-removing container
pub fn run_args(spec: &WorkloadSpec) -> Vec<String> {
    let mut args = vec!["run".to_string(), "--rm".to_string(), "-d".to_string()];

    if spec.interactive {
        args.push("-it".to_string());
    }
    if let Some(publish) = &spec.publish {
        args.push("-p".to_string());
        args.push(publish.to_string());
    }

    args.push("--name".to_string());
    args.push(spec.name.clone());
    args.push(spec.image.clone());
    args
}

pub fn stop_args(handle: &WorkloadHandle) -> Vec<String> {
    vec![
        "container".to_string(),
        "stop".to_string(),
        handle.name.clone(),
    ]
}

fn combined_output(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str(stderr);
    }
    if text.is_empty() {
        text = output.status.to_string();
    }
    text
}

#[async_trait]
impl WorkloadRuntime for DockerRuntime {
    async fn start(&self, spec: &WorkloadSpec) -> Result<WorkloadHandle> {
        let output = self.exec(&run_args(spec)).await?;

        if !output.status.success() {
            return Err(WorkloadError::Start {
                name: spec.name.clone(),
                output: combined_output(&output),
            }
            .into());
        }

        // `docker run -d` prints the container id
        let id = String::from_utf8_lossy(&output.stdout).trim().to_string();

        Ok(WorkloadHandle {
            name: spec.name.clone(),
            id: (!id.is_empty()).then_some(id),
        })
    }

    async fn stop(&self, handle: &WorkloadHandle) -> Result<()> {
        let output = self.exec(&stop_args(handle)).await?;

        if !output.status.success() {
            return Err(WorkloadError::Stop {
                name: handle.name.clone(),
                output: combined_output(&output),
            }
            .into());
        }

        Ok(())
    }
}
