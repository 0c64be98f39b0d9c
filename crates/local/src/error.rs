//! Error types for the local fixture.

use thiserror::Error;

/// Result type alias for the local fixture.
pub type Result<T> = std::result::Result<T, LocalError>;

/// Errors raised while provisioning DynamoDB Local.
#[derive(Error, Debug)]
pub enum LocalError {
    #[error("No free port found in {start}..={end} after {attempts} attempts")]
    NoFreePort { start: u16, end: u16, attempts: u32 },

    #[error("DynamoDBLocal.jar not found in {0} and downloading is disabled")]
    JarMissing(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to extract DynamoDB Local archive: {0}")]
    Extract(String),

    #[error("Container runtime not found: {0}")]
    ContainerRuntimeNotFound(String),

    #[error("Failed to start container: {0}")]
    ContainerStartFailed(String),

    #[error("DynamoDB Local exited before it was ready: {0}")]
    ProcessExited(String),

    #[error("DynamoDB Local at {endpoint} not ready after {timeout_secs}s")]
    NotReady { endpoint: String, timeout_secs: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
