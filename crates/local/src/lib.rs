//! DynamoDB Local for tests.
//!
//! [`LocalDynamo`] provisions a throwaway DynamoDB Local instance and tears it
//! down again. It follows the Functional Core - Imperative Shell pattern:
//!
//! - **Pure functions** pick ports and build command arguments
//!   ([`port`], [`jar::java_args`], [`container::container_run_args`]).
//! - **I/O functions** download the jar, spawn the process or container, and
//!   wait for it to answer.
//!
//! # Example
//!
//! ```rust,ignore
//! use dynamodel_local::{LocalDynamo, LocalDynamoConfig};
//!
//! let local = LocalDynamo::start(LocalDynamoConfig::from_env()).await?;
//! println!("DynamoDB Local at {}", local.endpoint());
//! local.shutdown().await?;
//! ```

pub mod config;
pub mod container;
pub mod error;
pub mod health;
pub mod jar;
pub mod port;
mod server;
mod telemetry;

pub use config::{LaunchMode, LocalDynamoConfig};
pub use error::{LocalError, Result};
pub use server::{endpoint_for, environment_variables, LocalDynamo};
pub use telemetry::init_tracing;
