//! Schema-validated models on top of DynamoDB.
//!
//! Models declare a table and a schema (see [`Model`]). A [`ModelStore`]
//! validates documents against the schema and forwards table and item
//! operations to a [`TableStore`] backend:
//!
//! - [`storage::dynamodb::DynamoDbStore`] talks to DynamoDB (or DynamoDB Local)
//!   through `aws-sdk-dynamodb`.
//! - [`storage::inmemory::InMemoryStore`] keeps tables in memory, for tests.

#[cfg(feature = "dynamodb")]
pub mod config;
mod model_store;
pub mod storage;

pub use dynamodel_core::{
    query::{Condition, Operator, Query},
    schema::{FieldKind, Schema},
    storage::{PutMode, StoreError, TableStore},
    Document, Item, Model, ModelDescriptor, ModelError, Result, TableDescriptor, Throughput,
};
pub use model_store::ModelStore;

#[cfg(feature = "dynamodb")]
pub use config::ClientConfig;
