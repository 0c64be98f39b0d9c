//! Readiness checks.

use std::time::{Duration, Instant};

use crate::error::{LocalError, Result};

/// DynamoDB Local answers a bare GET with 400 once it is serving.
pub const READY_STATUS: u16 = 400;

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Whether the endpoint answers like DynamoDB Local.
pub async fn is_ready(client: &reqwest::Client, endpoint: &str) -> bool {
    match client.get(endpoint).send().await {
        Ok(response) => response.status().as_u16() == READY_STATUS,
        Err(_) => false,
    }
}

/// Polls the endpoint until it is ready or `timeout` passes.
pub async fn wait_for_health(endpoint: &str, timeout: Duration) -> Result<()> {
    poll_until_ready(endpoint, timeout, || Ok(())).await
}

/// Polls the endpoint until it is ready or `timeout` passes. `check` runs
/// before every attempt and its error ends the wait.
pub async fn poll_until_ready<F>(endpoint: &str, timeout: Duration, mut check: F) -> Result<()>
where
    F: FnMut() -> Result<()>,
{
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()?;
    let start = Instant::now();

    while start.elapsed() < timeout {
        check()?;
        if is_ready(&client, endpoint).await {
            tracing::debug!(%endpoint, elapsed_ms = start.elapsed().as_millis() as u64, "DynamoDB Local ready");
            return Ok(());
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }

    Err(LocalError::NotReady {
        endpoint: endpoint.to_string(),
        timeout_secs: timeout.as_secs(),
    })
}
