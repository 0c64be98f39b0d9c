use thiserror::Error;

use crate::schema::ValidationErrors;
use crate::storage::StoreError;

/// Errors surfaced by model operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("Hash key already exists in {table}: {key}")]
    HashKeyExists { table: String, key: String },
    #[error("Field '{field}' is not defined in the schema for table {table}")]
    InvalidSchemaField { table: String, field: String },
    #[error("Missing key attribute '{field}' for table {table}")]
    MissingKey { table: String, field: String },
    #[error("Invalid key '{field}' for table {table}: {reason}")]
    InvalidKey {
        table: String,
        field: String,
        reason: String,
    },
    #[error("Invalid condition on '{field}': {reason}")]
    InvalidCondition { field: String, reason: String },
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
