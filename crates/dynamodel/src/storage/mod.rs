//! Storage backend implementations.
//!
//! This module provides concrete implementations of the [`TableStore`] trait
//! defined in `dynamodel_core::storage`. Backends are selected at compile
//! time via feature flags.
//!
//! # Feature Flags
//!
//! - `dynamodb` (default): DynamoDB backend using `aws-sdk-dynamodb`
//! - `inmemory` (default): HashMap backend for tests and development
//!
//! # Examples
//!
//! Build without the AWS SDK:
//! ```bash
//! cargo build -p dynamodel --no-default-features --features inmemory
//! ```
//!
//! [`TableStore`]: dynamodel_core::storage::TableStore

#[cfg(not(any(feature = "inmemory", feature = "dynamodb")))]
compile_error!(
    "No storage backend selected. Enable 'inmemory' or 'dynamodb' feature. \
    Example: cargo build -p dynamodel --features dynamodb"
);

#[cfg(feature = "dynamodb")]
pub mod dynamodb;

#[cfg(feature = "inmemory")]
pub mod inmemory;

#[cfg(feature = "dynamodb")]
pub use dynamodb::DynamoDbStore;

#[cfg(feature = "inmemory")]
pub use inmemory::InMemoryStore;
