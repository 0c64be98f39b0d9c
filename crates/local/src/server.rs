//! DynamoDB Local lifecycle.

use std::time::Duration;

use tokio::process::Child;

use crate::config::{LaunchMode, LocalDynamoConfig};
use crate::container::{self, ContainerRuntime, ContainerSpec};
use crate::error::{LocalError, Result};
use crate::{health, jar, port};

/// Region and credentials DynamoDB Local accepts for anything.
pub const LOCAL_REGION: &str = "us-west-2";
pub const LOCAL_CREDENTIAL: &str = "anything";

#[derive(Debug)]
enum Instance {
    /// Started elsewhere; never stopped by us.
    External,
    Process(Child),
    Container {
        runtime: ContainerRuntime,
        name: String,
    },
}

/// A running DynamoDB Local.
///
/// Call [`shutdown`](Self::shutdown) when done. Dropping the guard also stops
/// the instance, without waiting for it.
#[derive(Debug)]
pub struct LocalDynamo {
    endpoint: String,
    instance: Instance,
}

/// `http://localhost:{port}`.
pub fn endpoint_for(port: u16) -> String {
    format!("http://localhost:{port}")
}

/// Environment variables pointing AWS clients and test binaries at an
/// endpoint.
pub fn environment_variables(endpoint: &str) -> Vec<(&'static str, String)> {
    vec![
        ("AWS_ENDPOINT_URL", endpoint.to_string()),
        ("AWS_REGION", LOCAL_REGION.to_string()),
        ("AWS_ACCESS_KEY_ID", LOCAL_CREDENTIAL.to_string()),
        ("AWS_SECRET_ACCESS_KEY", LOCAL_CREDENTIAL.to_string()),
        (crate::config::ENDPOINT_VAR, endpoint.to_string()),
    ]
}

/// Whether auto mode should run the jar rather than a container.
fn prefers_jar(config: &LocalDynamoConfig, jar_present: bool) -> bool {
    match config.mode {
        LaunchMode::Jar => true,
        LaunchMode::Container => false,
        LaunchMode::Auto => jar_present || config.download,
    }
}

impl LocalDynamo {
    /// Brings up DynamoDB Local, or attaches to `config.endpoint` when set,
    /// and waits until it answers.
    pub async fn start(config: LocalDynamoConfig) -> Result<Self> {
        if let Some(endpoint) = config.endpoint.clone() {
            tracing::info!(%endpoint, "Using running DynamoDB Local");
            health::wait_for_health(&endpoint, config.readiness_timeout).await?;
            return Ok(Self {
                endpoint,
                instance: Instance::External,
            });
        }

        let port = port::random_port()?;
        let instance = if prefers_jar(&config, config.jar_path().exists()) {
            Instance::Process(jar::spawn(&config.dir, port, config.download).await?)
        } else {
            let runtime = container::detect_runtime(config.prefer_podman).await?;
            let spec = ContainerSpec::dynamodb_local(port);
            container::start_container(runtime, &spec).await?;
            Instance::Container {
                runtime,
                name: spec.name,
            }
        };

        let mut local = Self {
            endpoint: endpoint_for(port),
            instance,
        };

        if let Err(e) = local.wait_until_ready(config.readiness_timeout).await {
            let _ = local.shutdown().await;
            return Err(e);
        }

        tracing::info!(endpoint = %local.endpoint, "DynamoDB Local started");
        Ok(local)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Whether this guard stops the instance on shutdown.
    pub fn is_owned(&self) -> bool {
        !matches!(self.instance, Instance::External)
    }

    /// See [`environment_variables`].
    pub fn environment(&self) -> Vec<(&'static str, String)> {
        environment_variables(&self.endpoint)
    }

    async fn wait_until_ready(&mut self, timeout: Duration) -> Result<()> {
        let Self { endpoint, instance } = self;
        health::poll_until_ready(endpoint, timeout, || match &mut *instance {
            Instance::Process(child) => match child.try_wait()? {
                Some(status) => Err(LocalError::ProcessExited(status.to_string())),
                None => Ok(()),
            },
            _ => Ok(()),
        })
        .await
    }

    /// Stops the instance and waits for it to go away.
    pub async fn shutdown(mut self) -> Result<()> {
        match std::mem::replace(&mut self.instance, Instance::External) {
            Instance::External => {}
            Instance::Process(mut child) => {
                if child.try_wait()?.is_none() {
                    child.kill().await?;
                }
                tracing::info!(endpoint = %self.endpoint, "DynamoDB Local stopped");
            }
            Instance::Container { runtime, name } => {
                container::stop_container(runtime, &name).await;
                tracing::info!(endpoint = %self.endpoint, %name, "DynamoDB Local container stopped");
            }
        }
        Ok(())
    }
}

impl Drop for LocalDynamo {
    fn drop(&mut self) {
        match std::mem::replace(&mut self.instance, Instance::External) {
            Instance::External => {}
            Instance::Process(mut child) => {
                let _ = child.start_kill();
            }
            Instance::Container { runtime, name } => {
                container::stop_container_blocking(runtime, &name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_for() {
        assert_eq!(endpoint_for(31337), "http://localhost:31337");
    }

    #[test]
    fn test_environment_variables() {
        let vars = environment_variables("http://localhost:31337");

        assert!(vars.contains(&("AWS_ENDPOINT_URL", "http://localhost:31337".to_string())));
        assert!(vars.contains(&("AWS_REGION", "us-west-2".to_string())));
        assert!(vars.contains(&("AWS_ACCESS_KEY_ID", "anything".to_string())));
        assert!(vars.contains(&("AWS_SECRET_ACCESS_KEY", "anything".to_string())));
        assert!(vars.contains(&("DYNAMO_LOCAL_ENDPOINT", "http://localhost:31337".to_string())));
    }

    #[test]
    fn test_prefers_jar() {
        let auto = LocalDynamoConfig::default();
        assert!(prefers_jar(&auto, true));
        assert!(!prefers_jar(&auto, false));

        let downloading = LocalDynamoConfig {
            download: true,
            ..LocalDynamoConfig::default()
        };
        assert!(prefers_jar(&downloading, false));

        let container = LocalDynamoConfig::default().with_mode(LaunchMode::Container);
        assert!(!prefers_jar(&container, true));

        let jar = LocalDynamoConfig::default().with_mode(LaunchMode::Jar);
        assert!(prefers_jar(&jar, false));
    }

    #[tokio::test]
    async fn test_external_endpoint_must_answer() {
        let config = LocalDynamoConfig {
            readiness_timeout: Duration::from_millis(200),
            ..LocalDynamoConfig::default()
        }
        .with_endpoint("http://127.0.0.1:1");

        let result = LocalDynamo::start(config).await;
        assert!(matches!(result, Err(LocalError::NotReady { .. })));
    }
}
