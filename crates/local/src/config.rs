//! Fixture configuration from the environment.

use std::path::PathBuf;
use std::time::Duration;

/// Directory holding `DynamoDBLocal.jar`.
pub const DIR_VAR: &str = "DYNAMO_LOCAL";
/// Endpoint of an instance that is already running.
pub const ENDPOINT_VAR: &str = "DYNAMO_LOCAL_ENDPOINT";
/// Allow downloading the jar when it is missing.
pub const DOWNLOAD_VAR: &str = "DYNAMO_LOCAL_DOWNLOAD";
/// Seconds to wait for the instance to answer.
pub const TIMEOUT_VAR: &str = "DYNAMO_LOCAL_TIMEOUT";
/// Force a launch mode: `jar` or `container`.
pub const MODE_VAR: &str = "DYNAMO_LOCAL_MODE";

pub const DEFAULT_DIR: &str = "build/dynamo-local";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// How to bring DynamoDB Local up when no endpoint is given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LaunchMode {
    /// Jar if present or downloadable, container otherwise.
    #[default]
    Auto,
    Jar,
    Container,
}

impl LaunchMode {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Some(LaunchMode::Auto),
            "jar" | "java" => Some(LaunchMode::Jar),
            "container" | "docker" | "podman" => Some(LaunchMode::Container),
            _ => None,
        }
    }
}

/// Settings for [`LocalDynamo::start`](crate::LocalDynamo::start).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalDynamoConfig {
    pub dir: PathBuf,
    pub endpoint: Option<String>,
    pub download: bool,
    pub mode: LaunchMode,
    pub prefer_podman: bool,
    pub readiness_timeout: Duration,
}

impl Default for LocalDynamoConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_DIR),
            endpoint: None,
            download: false,
            mode: LaunchMode::Auto,
            prefer_podman: false,
            readiness_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl LocalDynamoConfig {
    /// Reads the `DYNAMO_LOCAL*` variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from any variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        Self {
            dir: non_empty(DIR_VAR).map(PathBuf::from).unwrap_or(defaults.dir),
            endpoint: non_empty(ENDPOINT_VAR),
            download: non_empty(DOWNLOAD_VAR).is_some_and(|value| is_truthy(&value)),
            mode: non_empty(MODE_VAR)
                .and_then(|value| LaunchMode::parse(&value))
                .unwrap_or(defaults.mode),
            prefer_podman: false,
            readiness_timeout: non_empty(TIMEOUT_VAR)
                .and_then(|value| value.trim().parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.readiness_timeout),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_mode(mut self, mode: LaunchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn jar_path(&self) -> PathBuf {
        self.dir.join(crate::jar::JAR_NAME)
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
