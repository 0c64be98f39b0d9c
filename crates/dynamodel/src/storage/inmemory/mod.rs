//! In-memory storage backend for testing.
//!
//! This module provides an in-memory implementation of [`TableStore`] that
//! keeps every table in a HashMap wrapped in `Arc<RwLock<_>>`. It honours the
//! same contract as DynamoDB for the operations dynamodel uses, including
//! conditional writes and query evaluation, which makes it useful for tests
//! and development where no DynamoDB instance is running.
//!
//! # Example
//!
//! ```rust,ignore
//! use dynamodel::storage::inmemory::InMemoryStore;
//!
//! let store = InMemoryStore::new();
//! // Use store for testing...
//! ```
//!
//! [`TableStore`]: dynamodel_core::storage::TableStore

mod store;

pub use store::InMemoryStore;
