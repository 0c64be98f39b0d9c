use thiserror::Error;

/// Errors reported by a [`super::TableStore`] backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Table not found: {0}")]
    TableNotFound(String),
    #[error("Conditional check failed on table {0}")]
    ConditionFailed(String),
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Request failed: {0}")]
    RequestFailed(String),
    #[error("Timeout waiting for table {0} to settle")]
    TableActivationTimeout(String),
    #[error("{0} items were left unprocessed by the batch write")]
    UnprocessedItems(usize),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
