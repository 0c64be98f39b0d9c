//! Models and their descriptors.
//!
//! A model is any serde type that can name its table and schema:
//!
//! ```rust
//! use dynamodel_core::{FieldKind, Model, Schema, TableDescriptor};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Snack {
//!     name: String,
//!     calories: Option<i64>,
//! }
//!
//! impl Model for Snack {
//!     fn table() -> TableDescriptor {
//!         TableDescriptor::new("snacks", "name")
//!     }
//!
//!     fn schema() -> Schema {
//!         Schema::builder()
//!             .required("name", FieldKind::String)
//!             .optional("calories", FieldKind::Integer)
//!             .build()
//!     }
//! }
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::attribute::{Document, Item};
use crate::error::{ModelError, Result};
use crate::query::{self, Query, QueryPlan};
use crate::schema::{load_value, Schema, ValidationErrors};
use crate::storage::TableDefinition;
use crate::table::TableDescriptor;

/// A schema-validated record type mapped to a row in the store.
pub trait Model: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The table backing this model.
    fn table() -> TableDescriptor;

    /// Field declarations used to validate documents.
    fn schema() -> Schema;
}

/// A table descriptor paired with the schema of its rows.
///
/// Construction checks that the key attributes are declared, required and of
/// a kind the store can key on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDescriptor {
    table: TableDescriptor,
    schema: Schema,
}

impl ModelDescriptor {
    pub fn new(table: TableDescriptor, schema: Schema) -> Result<Self> {
        if table.range_key.as_deref() == Some(table.hash_key.as_str()) {
            return Err(invalid_key(
                &table,
                &table.hash_key,
                "hash and range key must differ",
            ));
        }

        for name in table.key_names() {
            let Some(field) = schema.field(name) else {
                return Err(invalid_key(&table, name, "not declared in the schema"));
            };
            if !field.required {
                return Err(invalid_key(&table, name, "key fields must be required"));
            }
            if !field.kind.is_key_kind() {
                let reason = format!("a {} field cannot be a key", field.kind.name());
                return Err(invalid_key(&table, name, &reason));
            }
        }

        Ok(Self { table, schema })
    }

    /// Descriptor for a [`Model`] type.
    pub fn of<M: Model>() -> Result<Self> {
        Self::new(M::table(), M::schema())
    }

    pub fn table(&self) -> &TableDescriptor {
        &self.table
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Points the descriptor at a differently named table.
    pub fn with_table_name(mut self, name: impl Into<String>) -> Self {
        self.table = self.table.with_name(name);
        self
    }

    /// Table creation parameters, with key types taken from the schema.
    pub fn table_definition(&self) -> TableDefinition {
        let tag_of = |name: &str| {
            self.schema
                .field(name)
                .map(|field| field.kind.type_tag())
                .unwrap_or(crate::schema::TypeTag::S)
        };

        TableDefinition {
            table: self.table.clone(),
            hash_key_type: tag_of(&self.table.hash_key),
            range_key_type: self.table.range_key.as_deref().map(tag_of),
        }
    }

    /// Validates a document into a full item.
    pub fn load(&self, document: &Document) -> Result<Item> {
        Ok(self.schema.load(document)?)
    }

    /// Builds a primary key from a document naming the key fields.
    ///
    /// Names outside the schema are rejected before anything else, so a bad
    /// lookup never reaches the store.
    pub fn key_from(&self, document: &Document) -> Result<Item> {
        for name in document.keys() {
            if !self.schema.contains(name) {
                return Err(ModelError::InvalidSchemaField {
                    table: self.table.name.clone(),
                    field: name.clone(),
                });
            }
        }

        for name in document.keys() {
            if !self.table.is_key(name) {
                return Err(invalid_key(
                    &self.table,
                    name,
                    "not part of the primary key",
                ));
            }
        }

        let mut key = Item::new();
        let mut errors = ValidationErrors::new();

        for name in self.table.key_names() {
            let value = match document.get(name) {
                None | Some(serde_json::Value::Null) => {
                    return Err(ModelError::MissingKey {
                        table: self.table.name.clone(),
                        field: name.to_string(),
                    })
                }
                Some(value) => value,
            };
            let Some(field) = self.schema.field(name) else {
                continue;
            };
            match load_value(&field.kind, value) {
                Ok(attribute) => {
                    key.insert(name.to_string(), attribute);
                }
                Err(message) => errors.add(name, message),
            }
        }

        Ok(errors.into_result(key)?)
    }

    /// Extracts the primary key attributes from a full item.
    pub fn key_of(&self, item: &Item) -> Item {
        self.table
            .key_names()
            .into_iter()
            .filter_map(|name| item.get(name).map(|value| (name.to_string(), value.clone())))
            .collect()
    }

    /// Validates a query and turns it into key condition and filter
    /// expressions.
    pub fn plan_query(&self, query: &Query) -> Result<QueryPlan> {
        query::plan(self, query)
    }

    /// Serializes a model value into a document.
    pub fn to_document<M: Model>(&self, model: &M) -> Result<Document> {
        match serde_json::to_value(model) {
            Ok(serde_json::Value::Object(document)) => Ok(document),
            Ok(other) => Err(ModelError::Serialization(format!(
                "{} must serialize to an object, got {other}",
                std::any::type_name::<M>()
            ))),
            Err(e) => Err(ModelError::Serialization(e.to_string())),
        }
    }

    /// Turns a stored item into a model value.
    pub fn from_item<M: Model>(&self, item: &Item) -> Result<M> {
        let document = self.schema.dump(item)?;
        serde_json::from_value(serde_json::Value::Object(document))
            .map_err(|e| ModelError::Serialization(e.to_string()))
    }
}

fn invalid_key(table: &TableDescriptor, field: &str, reason: &str) -> ModelError {
    ModelError::InvalidKey {
        table: table.name.clone(),
        field: field.to_string(),
        reason: reason.to_string(),
    }
}
