//! DynamoDB storage backend implementation.
//!
//! This module provides a DynamoDB-based implementation of [`TableStore`]
//! using `aws-sdk-dynamodb`. It works the same against AWS and against
//! DynamoDB Local.
//!
//! [`TableStore`]: dynamodel_core::storage::TableStore

mod conversions;
mod error;
mod store;

pub use store::DynamoDbStore;
