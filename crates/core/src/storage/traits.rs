use async_trait::async_trait;

use crate::attribute::Item;
use crate::query::QueryPlan;

use super::{PutMode, Result, TableDefinition};

/// Table and item operations against a key-value store.
///
/// Tables are addressed by name, rows by their primary key item.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Creates a table and returns once it is usable.
    async fn create_table(&self, definition: &TableDefinition) -> Result<()>;

    /// Deletes a table and returns once it is gone.
    async fn delete_table(&self, table_name: &str) -> Result<()>;

    async fn table_exists(&self, table_name: &str) -> Result<bool>;

    /// Writes a row. With [`PutMode::Unique`] a row that already holds the
    /// hash key fails with [`super::StoreError::ConditionFailed`].
    async fn put_item(&self, table_name: &str, item: Item, mode: PutMode) -> Result<()>;

    /// Writes many rows, overwriting existing ones.
    async fn batch_put(&self, table_name: &str, items: Vec<Item>) -> Result<()>;

    /// Gets a row by primary key, `None` when absent.
    async fn get_item(&self, table_name: &str, key: Item) -> Result<Option<Item>>;

    /// Runs a planned query and returns the matching rows.
    async fn query(&self, table_name: &str, plan: &QueryPlan) -> Result<Vec<Item>>;
}
