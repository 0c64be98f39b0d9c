//! Model operations on top of a table store.

use std::marker::PhantomData;

use dynamodel_core::attribute::describe_key;
use dynamodel_core::query::Query;
use dynamodel_core::storage::{PutMode, StoreError, TableStore};
use dynamodel_core::{Document, Item, Model, ModelDescriptor, ModelError, Result};

/// Typed access to the table of one model.
///
/// Every document is validated against the model's schema before a request
/// is sent, so schema errors never cost a round trip.
///
/// # Example
///
/// ```rust,ignore
/// use dynamodel::storage::inmemory::InMemoryStore;
/// use dynamodel::ModelStore;
/// use serde_json::json;
///
/// let snacks = ModelStore::<Snack, _>::new(InMemoryStore::new())?;
/// snacks.create().await?;
/// snacks.put(json!({"name": "pretzel"}).as_object().unwrap().clone()).await?;
/// ```
pub struct ModelStore<M: Model, S: TableStore> {
    store: S,
    descriptor: ModelDescriptor,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model, S: TableStore> ModelStore<M, S> {
    /// Binds a model to a store, checking its table and schema declarations.
    pub fn new(store: S) -> Result<Self> {
        Ok(Self {
            store,
            descriptor: ModelDescriptor::of::<M>()?,
            _model: PhantomData,
        })
    }

    /// Points the store at a differently named table with the same layout.
    pub fn with_table_name(mut self, name: impl Into<String>) -> Self {
        self.descriptor = self.descriptor.with_table_name(name);
        self
    }

    pub fn descriptor(&self) -> &ModelDescriptor {
        &self.descriptor
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn table_name(&self) -> &str {
        &self.descriptor.table().name
    }

    /// Creates the table and waits until it is usable.
    pub async fn create(&self) -> Result<bool> {
        self.store
            .create_table(&self.descriptor.table_definition())
            .await?;
        tracing::info!(table = %self.table_name(), "Table created");
        Ok(true)
    }

    /// Deletes the table and waits until it is gone.
    pub async fn delete(&self) -> Result<bool> {
        self.store.delete_table(self.table_name()).await?;
        tracing::info!(table = %self.table_name(), "Table deleted");
        Ok(true)
    }

    pub async fn exists(&self) -> Result<bool> {
        Ok(self.store.table_exists(self.table_name()).await?)
    }

    /// Writes a row, replacing any row with the same primary key.
    pub async fn put(&self, document: Document) -> Result<()> {
        let item = self.descriptor.load(&document)?;
        self.store
            .put_item(self.table_name(), item, PutMode::Overwrite)
            .await?;
        Ok(())
    }

    /// Writes a row only if its primary key is not taken.
    ///
    /// Returns [`ModelError::HashKeyExists`] when a row with the same key is
    /// already stored.
    pub async fn put_unique(&self, document: Document) -> Result<()> {
        let item = self.descriptor.load(&document)?;
        let key = self.describe(&item);
        let mode = PutMode::Unique {
            hash_key: self.descriptor.table().hash_key.clone(),
        };

        match self.store.put_item(self.table_name(), item, mode).await {
            Ok(()) => Ok(()),
            Err(StoreError::ConditionFailed(_)) => {
                tracing::debug!(table = %self.table_name(), %key, "Unique put rejected");
                Err(ModelError::HashKeyExists {
                    table: self.table_name().to_string(),
                    key,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Writes many rows. Nothing is sent unless every document validates.
    pub async fn put_batch(&self, documents: Vec<Document>) -> Result<()> {
        let items = documents
            .iter()
            .map(|document| self.descriptor.load(document))
            .collect::<Result<Vec<_>>>()?;

        if items.is_empty() {
            return Ok(());
        }

        self.store.batch_put(self.table_name(), items).await?;
        Ok(())
    }

    /// Serializes a model value and writes it, overwriting.
    pub async fn save(&self, model: &M) -> Result<()> {
        let document = self.descriptor.to_document(model)?;
        self.put(document).await
    }

    /// Fetches the row whose key fields are given in `key`.
    pub async fn get(&self, key: Document) -> Result<Option<M>> {
        let key = self.descriptor.key_from(&key)?;
        match self.store.get_item(self.table_name(), key).await? {
            Some(item) => Ok(Some(self.descriptor.from_item(&item)?)),
            None => Ok(None),
        }
    }

    /// Runs a key-condition query, with optional filters on other fields.
    pub async fn query(&self, query: &Query) -> Result<Vec<M>> {
        let plan = self.descriptor.plan_query(query)?;
        tracing::debug!(
            table = %self.table_name(),
            key_condition = %plan.key_condition_expression,
            filter = ?plan.filter_expression,
            "Query"
        );

        self.store
            .query(self.table_name(), &plan)
            .await?
            .iter()
            .map(|item| self.descriptor.from_item(item))
            .collect()
    }

    fn describe(&self, item: &Item) -> String {
        describe_key(item, &self.descriptor.table().key_names())
    }
}

#[cfg(all(test, feature = "inmemory"))]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use dynamodel_core::query::QueryPlan;
    use dynamodel_core::schema::{FieldKind, Schema};
    use dynamodel_core::storage::{self, TableDefinition};
    use dynamodel_core::TableDescriptor;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    use super::*;
    use crate::storage::inmemory::InMemoryStore;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct PeanutButter {
        foo: String,
        bar: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        baz: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        count: Option<i64>,
    }

    impl PeanutButter {
        fn business_logic(&self) -> String {
            format!("{}-{}", self.foo, self.bar)
        }
    }

    impl Model for PeanutButter {
        fn table() -> TableDescriptor {
            TableDescriptor::new("peanut-butter", "foo").with_range_key("bar")
        }

        fn schema() -> Schema {
            Schema::builder()
                .required("foo", FieldKind::String)
                .required("bar", FieldKind::String)
                .optional("baz", FieldKind::String)
                .optional("count", FieldKind::Integer)
                .build()
        }
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct Broken {
        foo: String,
    }

    impl Model for Broken {
        fn table() -> TableDescriptor {
            TableDescriptor::new("broken", "missing")
        }

        fn schema() -> Schema {
            Schema::builder().required("foo", FieldKind::String).build()
        }
    }

    /// Wraps a store and counts calls that would reach the network.
    #[derive(Clone, Default)]
    struct CountingStore {
        inner: InMemoryStore,
        calls: Arc<AtomicUsize>,
    }

    impl CountingStore {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn hit(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl TableStore for CountingStore {
        async fn create_table(&self, definition: &TableDefinition) -> storage::Result<()> {
            self.hit();
            self.inner.create_table(definition).await
        }

        async fn delete_table(&self, table_name: &str) -> storage::Result<()> {
            self.hit();
            self.inner.delete_table(table_name).await
        }

        async fn table_exists(&self, table_name: &str) -> storage::Result<bool> {
            self.hit();
            self.inner.table_exists(table_name).await
        }

        async fn put_item(&self, table_name: &str, item: Item, mode: PutMode) -> storage::Result<()> {
            self.hit();
            self.inner.put_item(table_name, item, mode).await
        }

        async fn batch_put(&self, table_name: &str, items: Vec<Item>) -> storage::Result<()> {
            self.hit();
            self.inner.batch_put(table_name, items).await
        }

        async fn get_item(&self, table_name: &str, key: Item) -> storage::Result<Option<Item>> {
            self.hit();
            self.inner.get_item(table_name, key).await
        }

        async fn query(&self, table_name: &str, plan: &QueryPlan) -> storage::Result<Vec<Item>> {
            self.hit();
            self.inner.query(table_name, plan).await
        }
    }

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    async fn created() -> ModelStore<PeanutButter, InMemoryStore> {
        let store = ModelStore::new(InMemoryStore::new()).unwrap();
        assert!(store.create().await.unwrap());
        store
    }

    #[tokio::test]
    async fn test_create_and_delete() {
        let store = ModelStore::<PeanutButter, _>::new(InMemoryStore::new()).unwrap();
        assert!(!store.exists().await.unwrap());

        assert!(store.create().await.unwrap());
        assert!(store.exists().await.unwrap());

        assert!(store.delete().await.unwrap());
        assert!(!store.exists().await.unwrap());
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let store = created().await;
        store
            .put(doc(json!({"foo": "first", "bar": "one", "baz": "lol", "count": 123})))
            .await
            .unwrap();

        let first = store
            .get(doc(json!({"foo": "first", "bar": "one"})))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(first.foo, "first");
        assert_eq!(first.bar, "one");
        assert_eq!(first.baz.as_deref(), Some("lol"));
        assert_eq!(first.count, Some(123));
        assert_eq!(first.business_logic(), "first-one");
    }

    #[tokio::test]
    async fn test_put_batch() {
        let store = created().await;
        store
            .put_batch(vec![
                doc(json!({"foo": "first", "bar": "one", "baz": "lol", "count": 123})),
                doc(json!({"foo": "second", "bar": "two", "baz": "wtf", "count": 321})),
            ])
            .await
            .unwrap();

        let first = store
            .get(doc(json!({"foo": "first", "bar": "one"})))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.baz.as_deref(), Some("lol"));
        assert_eq!(first.count, Some(123));

        let second = store
            .get(doc(json!({"foo": "second", "bar": "two"})))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(second.baz.as_deref(), Some("wtf"));
        assert_eq!(second.count, Some(321));
    }

    #[tokio::test]
    async fn test_put_batch_validates_everything_first() {
        let store = ModelStore::<PeanutButter, _>::new(CountingStore::default()).unwrap();
        store.create().await.unwrap();
        let before = store.store().calls();

        let result = store
            .put_batch(vec![
                doc(json!({"foo": "first", "bar": "one"})),
                doc(json!({"foo": "second", "bar": "two", "count": "many"})),
            ])
            .await;

        assert!(matches!(result, Err(ModelError::Validation(_))));
        assert_eq!(store.store().calls(), before);
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let store = created().await;
        let found = store
            .get(doc(json!({"foo": "fifth", "bar": "derp"})))
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_put_unique() {
        let store = created().await;
        let row = json!({"foo": "third", "bar": "three", "baz": "omg", "count": 111});

        store.put(doc(row.clone())).await.unwrap();

        let result = store.put_unique(doc(row.clone())).await;
        assert_eq!(
            result,
            Err(ModelError::HashKeyExists {
                table: "peanut-butter".to_string(),
                key: "foo=third, bar=three".to_string(),
            })
        );

        // ordinary put still overwrites
        store
            .put(doc(json!({"foo": "third", "bar": "three", "baz": "new"})))
            .await
            .unwrap();
        let third = store
            .get(doc(json!({"foo": "third", "bar": "three"})))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(third.baz.as_deref(), Some("new"));
        assert_eq!(third.count, None);
    }

    #[tokio::test]
    async fn test_put_unique_on_fresh_key() {
        let store = created().await;
        store
            .put_unique(doc(json!({"foo": "fourth", "bar": "four"})))
            .await
            .unwrap();
        assert!(store
            .get(doc(json!({"foo": "fourth", "bar": "four"})))
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_save_round_trips() {
        let store = created().await;
        let model = PeanutButter {
            foo: "sixth".to_string(),
            bar: "six".to_string(),
            baz: None,
            count: Some(6),
        };

        store.save(&model).await.unwrap();

        let found = store
            .get(doc(json!({"foo": "sixth", "bar": "six"})))
            .await
            .unwrap();
        assert_eq!(found, Some(model));
    }

    #[tokio::test]
    async fn test_query_invalid_field_before_network() {
        let store = ModelStore::<PeanutButter, _>::new(CountingStore::default()).unwrap();

        let result = store
            .query(&Query::new().eq("foo", "first").eq("bbq", "sauce"))
            .await;

        assert_eq!(
            result,
            Err(ModelError::InvalidSchemaField {
                table: "peanut-butter".to_string(),
                field: "bbq".to_string(),
            })
        );
        assert_eq!(store.store().calls(), 0);
    }

    #[tokio::test]
    async fn test_get_invalid_field_before_network() {
        let store = ModelStore::<PeanutButter, _>::new(CountingStore::default()).unwrap();

        let result = store
            .get(doc(json!({"foo": "first", "bar": "one", "bbq": "sauce"})))
            .await;

        assert_eq!(
            result,
            Err(ModelError::InvalidSchemaField {
                table: "peanut-butter".to_string(),
                field: "bbq".to_string(),
            })
        );
        assert_eq!(store.store().calls(), 0);
    }

    #[tokio::test]
    async fn test_query_with_filter() {
        let store = created().await;
        store
            .put_batch(vec![
                doc(json!({"foo": "first", "bar": "one", "count": 1})),
                doc(json!({"foo": "first", "bar": "two", "count": 20})),
                doc(json!({"foo": "first", "bar": "three", "count": 30})),
                doc(json!({"foo": "second", "bar": "one", "count": 40})),
            ])
            .await
            .unwrap();

        let rows = store
            .query(&Query::new().eq("foo", "first").gt("count", 10))
            .await
            .unwrap();
        let bars: Vec<_> = rows.iter().map(|row| row.bar.as_str()).collect();
        assert_eq!(bars, vec!["three", "two"]);

        let rows = store
            .query(&Query::new().eq("foo", "first").begins_with("bar", "t"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_query_requires_hash_key() {
        let store = created().await;
        let result = store.query(&Query::new().eq("bar", "one")).await;
        assert!(matches!(result, Err(ModelError::MissingKey { .. })));
    }

    #[tokio::test]
    async fn test_put_rejects_unknown_field() {
        let store = created().await;
        let result = store
            .put(doc(json!({"foo": "first", "bar": "one", "bbq": "sauce"})))
            .await;
        assert!(matches!(result, Err(ModelError::Validation(_))));
    }

    #[tokio::test]
    async fn test_with_table_name() {
        let store = ModelStore::<PeanutButter, _>::new(InMemoryStore::new())
            .unwrap()
            .with_table_name("peanut-butter-renamed");
        store.create().await.unwrap();

        assert!(store
            .store()
            .table_exists("peanut-butter-renamed")
            .await
            .unwrap());
        assert!(!store.store().table_exists("peanut-butter").await.unwrap());
    }

    #[tokio::test]
    async fn test_operations_on_missing_table() {
        let store = ModelStore::<PeanutButter, _>::new(InMemoryStore::new()).unwrap();
        let result = store.put(doc(json!({"foo": "a", "bar": "b"}))).await;
        assert_eq!(
            result,
            Err(ModelError::Store(StoreError::TableNotFound(
                "peanut-butter".to_string()
            )))
        );
    }

    #[test]
    fn test_invalid_descriptor_is_rejected() {
        assert!(ModelStore::<Broken, _>::new(InMemoryStore::new()).is_err());
    }
}
