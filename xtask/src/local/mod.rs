//! DynamoDB Local for development.
//!
//! # Usage
//!
//! ```bash
//! # Run from the jar in build/dynamo-local, downloading it if needed
//! cargo xtask local --download
//!
//! # Run the amazon/dynamodb-local image instead
//! cargo xtask local --mode container
//! ```

use std::path::PathBuf;
use std::time::Duration;

use dynamodel_local::{LaunchMode, LocalDynamo, LocalDynamoConfig, LocalError};

use crate::prelude::*;

/// How to launch DynamoDB Local.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Mode {
    /// Jar if present or downloadable, container otherwise
    #[default]
    Auto,
    Jar,
    Container,
}

impl From<Mode> for LaunchMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Auto => LaunchMode::Auto,
            Mode::Jar => LaunchMode::Jar,
            Mode::Container => LaunchMode::Container,
        }
    }
}

/// Flags shared by every command that needs DynamoDB Local.
///
/// Unset flags fall back to the `DYNAMO_LOCAL*` environment variables.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct LocalArgs {
    /// Use an instance that is already running at this URL.
    #[arg(long)]
    pub endpoint: Option<String>,

    /// How to launch DynamoDB Local.
    #[arg(long, value_enum)]
    pub mode: Option<Mode>,

    /// Directory holding DynamoDBLocal.jar.
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Download the jar when it is missing.
    #[arg(long)]
    pub download: bool,

    /// Check for podman before docker.
    #[arg(long)]
    pub podman: bool,

    /// Seconds to wait for DynamoDB Local to answer.
    #[arg(long)]
    pub health_timeout: Option<u64>,
}

impl LocalArgs {
    /// Layers the flags over a config read from the environment.
    pub fn apply(&self, mut config: LocalDynamoConfig) -> LocalDynamoConfig {
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = Some(endpoint.clone());
        }
        if let Some(mode) = self.mode {
            config.mode = mode.into();
        }
        if let Some(dir) = &self.dir {
            config.dir = dir.clone();
        }
        if let Some(secs) = self.health_timeout {
            config.readiness_timeout = Duration::from_secs(secs);
        }
        config.download |= self.download;
        config.prefer_podman |= self.podman;
        config
    }

    pub fn config(&self) -> LocalDynamoConfig {
        self.apply(LocalDynamoConfig::from_env())
    }
}

/// Run DynamoDB Local until interrupted.
#[derive(Debug, clap::Parser)]
pub struct LocalCommand {
    #[command(flatten)]
    pub local: LocalArgs,
}

/// Starts DynamoDB Local and prints how to reach it.
pub async fn start(args: &LocalArgs, global: &crate::Global) -> Result<LocalDynamo, LocalError> {
    let config = args.config();

    if !global.is_silent() {
        let target = match &config.endpoint {
            Some(endpoint) => format!("existing instance at {}", endpoint),
            None => format!("{:?} launch from {}", config.mode, config.dir.display()),
        };
        aprintln!("{} {}", p_b("🔧"), format!("Starting DynamoDB Local ({})...", target));
    }

    let local = LocalDynamo::start(config).await?;

    if !global.is_silent() {
        aprintln!("{} DynamoDB Local is ready at {}", p_g("✅"), p_y(local.endpoint()));
    }

    Ok(local)
}

pub async fn run(command: LocalCommand, global: crate::Global) -> Result<(), LocalError> {
    let local = start(&command.local, &global).await?;

    if !global.is_silent() {
        aprintln!();
        for (name, value) in local.environment() {
            aprintln!("export {}={}", name, value);
        }
        aprintln!();
        aprintln!("{} {}", p_b("⏳"), "Press Ctrl-C to stop");
    }

    tokio::signal::ctrl_c().await?;

    if !global.is_silent() {
        aprintln!();
        aprintln!("{} {}", p_b("🛑"), "Stopping DynamoDB Local...");
    }
    local.shutdown().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_keeps_environment_defaults() {
        let base = LocalDynamoConfig::default();
        assert_eq!(LocalArgs::default().apply(base.clone()), base);
    }

    #[test]
    fn test_apply_overrides() {
        let args = LocalArgs {
            endpoint: Some("http://localhost:8000".to_string()),
            mode: Some(Mode::Container),
            dir: Some(PathBuf::from("/tmp/dynamo")),
            download: true,
            podman: true,
            health_timeout: Some(3),
        };

        let config = args.apply(LocalDynamoConfig::default());

        assert_eq!(config.endpoint.as_deref(), Some("http://localhost:8000"));
        assert_eq!(config.mode, LaunchMode::Container);
        assert_eq!(config.dir, PathBuf::from("/tmp/dynamo"));
        assert!(config.download);
        assert!(config.prefer_podman);
        assert_eq!(config.readiness_timeout, Duration::from_secs(3));
    }
}
