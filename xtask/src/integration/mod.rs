//! Integration test infrastructure.
//!
//! Starts one DynamoDB Local for the whole run, points the live tests in
//! `crates/dynamodel/tests/` at it, and stops it afterwards.
//!
//! # Usage
//!
//! ```bash
//! # Run the live tests (jar if available, container otherwise)
//! cargo xtask integration
//!
//! # Download the jar first if it's missing
//! cargo xtask integration --download
//!
//! # Reuse an instance that is already running
//! cargo xtask integration --endpoint http://localhost:8000
//!
//! # Pass arguments through to the test binary
//! cargo xtask integration -- test_put_unique
//! ```

pub mod error;

pub use error::{IntegrationError, Result};

use crate::local::LocalArgs;
use crate::prelude::*;

/// Package holding the live tests.
const PACKAGE: &str = "dynamodel";

/// Feature enabling the live tests.
const FEATURE: &str = "integration";

/// Integration test command.
#[derive(Debug, clap::Parser)]
#[command(long_about = "Run the live test suite against DynamoDB Local.

This command starts DynamoDB Local (from the jar in $DYNAMO_LOCAL or the
amazon/dynamodb-local container), runs `cargo test -p dynamodel --features
integration` against it and stops it afterwards.

Environment variables:
  DYNAMO_LOCAL            - Directory holding DynamoDBLocal.jar (default: build/dynamo-local)
  DYNAMO_LOCAL_ENDPOINT   - Reuse a running instance instead of starting one
  DYNAMO_LOCAL_DOWNLOAD   - Set to 1 to download the jar when missing
  DYNAMO_LOCAL_MODE       - auto, jar or container
  DYNAMO_LOCAL_TIMEOUT    - Seconds to wait for the instance to answer")]
pub struct IntegrationCommand {
    #[command(flatten)]
    pub local: LocalArgs,

    /// Arguments passed to the test binary.
    #[arg(last = true)]
    pub test_args: Vec<String>,
}

/// Builds the `cargo test` arguments.
pub fn cargo_test_args(test_args: &[String]) -> Vec<String> {
    let mut args = vec![
        "test".to_string(),
        "-p".to_string(),
        PACKAGE.to_string(),
        "--features".to_string(),
        FEATURE.to_string(),
    ];

    if !test_args.is_empty() {
        args.push("--".to_string());
        args.extend(test_args.iter().cloned());
    }

    args
}

/// Main entry point for integration command.
pub async fn run(command: IntegrationCommand, global: crate::Global) -> Result<()> {
    if !global.is_silent() {
        aprintln!("{}", p_b("Integration Tests"));
        aprintln!();
    }

    let local = crate::local::start(&command.local, &global).await?;

    let passed = run_tests(&command.test_args, &local.environment(), &global).await;

    if local.is_owned() && !global.is_silent() {
        aprintln!("{} {}", p_b("🛑"), "Stopping DynamoDB Local...");
    }
    local.shutdown().await?;

    aprintln!();
    if passed? {
        aprintln!("{} {}", p_g("✅"), p_g("All integration tests passed!"));
        Ok(())
    } else {
        aprintln!("{} {}", p_r("❌"), p_r("Some integration tests failed"));
        Err(IntegrationError::TestFailed(
            "cargo test exited with a failure".to_string(),
        ))
    }
}

/// Runs `cargo test` with the DynamoDB Local environment.
async fn run_tests(
    test_args: &[String],
    env_vars: &[(&'static str, String)],
    global: &crate::Global,
) -> Result<bool> {
    let args = cargo_test_args(test_args);

    if !global.is_silent() {
        aprintln!("{} cargo {}", p_b("  →"), p_y(&args.join(" ")));
    }

    let status = tokio::process::Command::new("cargo")
        .args(&args)
        .envs(env_vars.iter().map(|(key, value)| (*key, value.as_str())))
        .status()
        .await?;

    Ok(status.success())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cargo_test_args() {
        assert_eq!(
            cargo_test_args(&[]),
            vec!["test", "-p", "dynamodel", "--features", "integration"]
        );
    }

    #[test]
    fn test_cargo_test_args_pass_through() {
        let args = cargo_test_args(&["test_put_unique".to_string(), "--nocapture".to_string()]);
        assert_eq!(
            args,
            vec![
                "test",
                "-p",
                "dynamodel",
                "--features",
                "integration",
                "--",
                "test_put_unique",
                "--nocapture",
            ]
        );
    }
}
