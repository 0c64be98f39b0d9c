//! Running DynamoDB Local in a Docker/Podman container.

use tokio::process::Command;

use crate::error::{LocalError, Result};

pub const IMAGE: &str = "amazon/dynamodb-local:latest";

/// Port DynamoDB Local listens on inside the image.
pub const CONTAINER_PORT: u16 = 8000;

/// Container runtime (Docker or Podman).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContainerRuntime {
    #[default]
    Docker,
    Podman,
}

/// A DynamoDB Local container bound to a host port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub name: String,
    pub image: &'static str,
    pub host_port: u16,
    pub command: &'static str,
}

impl ContainerSpec {
    pub fn dynamodb_local(host_port: u16) -> Self {
        Self {
            name: format!("dynamodel-local-{host_port}"),
            image: IMAGE,
            host_port,
            command: "-jar DynamoDBLocal.jar -sharedDb -inMemory",
        }
    }
}

/// Builds arguments for `docker run` / `podman run`.
pub fn container_run_args(spec: &ContainerSpec) -> Vec<String> {
    let mut args = vec![
        "run".to_string(),
        "--name".to_string(),
        spec.name.clone(),
        "--rm".to_string(),
        "-d".to_string(),
        "-p".to_string(),
        format!("{}:{}", spec.host_port, CONTAINER_PORT),
        spec.image.to_string(),
    ];
    args.extend(spec.command.split_whitespace().map(String::from));
    args
}

/// Returns the command name for the container runtime.
pub fn runtime_command(runtime: ContainerRuntime) -> &'static str {
    match runtime {
        ContainerRuntime::Docker => "docker",
        ContainerRuntime::Podman => "podman",
    }
}

/// Detects which container runtime is available.
///
/// If `prefer_podman` is true, checks Podman first, then Docker.
pub async fn detect_runtime(prefer_podman: bool) -> Result<ContainerRuntime> {
    let check_order = if prefer_podman {
        [ContainerRuntime::Podman, ContainerRuntime::Docker]
    } else {
        [ContainerRuntime::Docker, ContainerRuntime::Podman]
    };

    for runtime in check_order {
        let output = Command::new(runtime_command(runtime))
            .arg("--version")
            .output()
            .await;

        if output.is_ok_and(|output| output.status.success()) {
            return Ok(runtime);
        }
    }

    Err(LocalError::ContainerRuntimeNotFound(
        "Neither docker nor podman found in PATH".to_string(),
    ))
}

/// Starts a container, replacing any leftover one with the same name.
pub async fn start_container(runtime: ContainerRuntime, spec: &ContainerSpec) -> Result<()> {
    stop_container(runtime, &spec.name).await;

    tracing::info!(name = %spec.name, port = spec.host_port, "Starting DynamoDB Local container");

    let output = Command::new(runtime_command(runtime))
        .args(container_run_args(spec))
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(LocalError::ContainerStartFailed(format!(
            "Failed to start container '{}': {}",
            spec.name,
            stderr.trim()
        )));
    }

    Ok(())
}

/// Stops and removes a container. Errors are ignored since the container
/// might not exist.
pub async fn stop_container(runtime: ContainerRuntime, name: &str) {
    let _ = Command::new(runtime_command(runtime))
        .args(["rm", "-f", name])
        .output()
        .await;
}

/// Blocking variant of [`stop_container`] for use outside a runtime.
pub fn stop_container_blocking(runtime: ContainerRuntime, name: &str) {
    let _ = std::process::Command::new(runtime_command(runtime))
        .args(["rm", "-f", name])
        .output();
}
