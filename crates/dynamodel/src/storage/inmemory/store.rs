//! In-memory store implementation.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use dynamodel_core::query::QueryPlan;
use dynamodel_core::storage::{PutMode, Result, StoreError, TableDefinition, TableStore};
use dynamodel_core::{Attribute, Item};

/// One component of a primary key. Numbers hold their canonical form so
/// that `1`, `1.0` and `10e-1` address the same row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum KeyPart {
    S(String),
    N(String),
    B(Vec<u8>),
}

impl KeyPart {
    fn from_attribute(value: &Attribute) -> Option<Self> {
        match value {
            Attribute::S(text) => Some(KeyPart::S(text.clone())),
            Attribute::N(text) => Some(KeyPart::N(
                canonical_number(text).unwrap_or_else(|| text.clone()),
            )),
            Attribute::B(bytes) => Some(KeyPart::B(bytes.clone())),
            _ => None,
        }
    }
}

/// Renders a decimal number as `[-]digits e exp` with no leading or
/// trailing zeros in `digits`. Zero is always `0`.
fn canonical_number(text: &str) -> Option<String> {
    let text = text.trim();
    let (negative, unsigned) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (mantissa, exponent) = match unsigned.split_once(['e', 'E']) {
        Some((mantissa, exponent)) => (mantissa, exponent.parse::<i64>().ok()?),
        None => (unsigned, 0),
    };
    let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }

    let digits = format!("{whole}{fraction}");
    let digits = digits.trim_start_matches('0');
    let significant = digits.trim_end_matches('0');
    if significant.is_empty() {
        return Some("0".to_string());
    }

    let exponent = exponent
        .saturating_sub(fraction.len() as i64)
        .saturating_add((digits.len() - significant.len()) as i64);
    let sign = if negative { "-" } else { "" };
    Some(format!("{sign}{significant}e{exponent}"))
}

#[derive(Debug)]
struct Table {
    definition: TableDefinition,
    rows: HashMap<Vec<KeyPart>, Item>,
}

impl Table {
    /// The primary key of an item, checked against the key schema.
    fn row_key(&self, item: &Item) -> Result<Vec<KeyPart>> {
        self.definition
            .key_attributes()
            .into_iter()
            .map(|(name, tag)| {
                let value = item.get(name).ok_or_else(|| {
                    StoreError::InvalidData(format!("Missing key attribute '{name}'"))
                })?;
                KeyPart::from_attribute(value)
                    .filter(|_| value.type_tag() == Some(tag))
                    .ok_or_else(|| {
                        StoreError::InvalidData(format!(
                            "Key attribute '{name}' must be of type {tag}"
                        ))
                    })
            })
            .collect()
    }

    fn range_ordering(&self, a: &Item, b: &Item) -> Ordering {
        let Some(range_key) = &self.definition.table.range_key else {
            return Ordering::Equal;
        };
        match (a.get(range_key), b.get(range_key)) {
            (Some(a), Some(b)) => a.compare(b).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        }
    }
}

/// In-memory storage backend for testing.
///
/// Data is not persisted and will be lost when the store is dropped.
/// Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<HashMap<String, Table>>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows in a table.
    pub async fn len(&self, table_name: &str) -> Result<usize> {
        let tables = self.tables.read().await;
        tables
            .get(table_name)
            .map(|table| table.rows.len())
            .ok_or_else(|| StoreError::TableNotFound(table_name.to_string()))
    }
}

#[async_trait]
impl TableStore for InMemoryStore {
    async fn create_table(&self, definition: &TableDefinition) -> Result<()> {
        let mut tables = self.tables.write().await;
        let name = &definition.table.name;
        if tables.contains_key(name) {
            return Err(StoreError::RequestFailed(format!(
                "Table {} already exists",
                name
            )));
        }
        tables.insert(
            name.clone(),
            Table {
                definition: definition.clone(),
                rows: HashMap::new(),
            },
        );
        Ok(())
    }

    async fn delete_table(&self, table_name: &str) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.remove(table_name).is_none() {
            return Err(StoreError::TableNotFound(table_name.to_string()));
        }
        Ok(())
    }

    async fn table_exists(&self, table_name: &str) -> Result<bool> {
        let tables = self.tables.read().await;
        Ok(tables.contains_key(table_name))
    }

    async fn put_item(&self, table_name: &str, item: Item, mode: PutMode) -> Result<()> {
        let mut tables = self.tables.write().await;
        let table = tables
            .get_mut(table_name)
            .ok_or_else(|| StoreError::TableNotFound(table_name.to_string()))?;

        let key = table.row_key(&item)?;
        if let PutMode::Unique { hash_key } = &mode {
            let taken = table
                .rows
                .get(&key)
                .is_some_and(|existing| existing.contains_key(hash_key));
            if taken {
                return Err(StoreError::ConditionFailed(table_name.to_string()));
            }
        }

        table.rows.insert(key, item);
        Ok(())
    }

    async fn batch_put(&self, table_name: &str, items: Vec<Item>) -> Result<()> {
        let mut tables = self.tables.write().await;
        let table = tables
            .get_mut(table_name)
            .ok_or_else(|| StoreError::TableNotFound(table_name.to_string()))?;

        let keyed = items
            .into_iter()
            .map(|item| Ok((table.row_key(&item)?, item)))
            .collect::<Result<Vec<_>>>()?;
        table.rows.extend(keyed);
        Ok(())
    }

    async fn get_item(&self, table_name: &str, key: Item) -> Result<Option<Item>> {
        let tables = self.tables.read().await;
        let table = tables
            .get(table_name)
            .ok_or_else(|| StoreError::TableNotFound(table_name.to_string()))?;

        let key = table.row_key(&key)?;
        Ok(table.rows.get(&key).cloned())
    }

    async fn query(&self, table_name: &str, plan: &QueryPlan) -> Result<Vec<Item>> {
        let tables = self.tables.read().await;
        let table = tables
            .get(table_name)
            .ok_or_else(|| StoreError::TableNotFound(table_name.to_string()))?;

        let mut items: Vec<Item> = table
            .rows
            .values()
            .filter(|item| plan.matches(item))
            .cloned()
            .collect();

        items.sort_by(|a, b| table.range_ordering(a, b));
        if !plan.scan_forward {
            items.reverse();
        }
        if let Some(limit) = plan.limit {
            items.truncate(limit.max(0) as usize);
        }

        Ok(items)
    }
}
