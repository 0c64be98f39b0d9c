//! Model schemas.
//!
//! A [`Schema`] is an ordered list of typed fields. It validates caller
//! documents into store items ([`Schema::load`]) and turns stored items back
//! into documents ([`Schema::dump`]).
//!
//! ```rust
//! use dynamodel_core::schema::{FieldKind, Schema};
//!
//! let schema = Schema::builder()
//!     .required("foo", FieldKind::String)
//!     .required("bar", FieldKind::String)
//!     .optional("count", FieldKind::Integer)
//!     .build();
//!
//! assert!(schema.contains("count"));
//! assert!(!schema.contains("bbq"));
//! ```

mod error;
mod field;
mod validation;

pub use error::ValidationErrors;
pub use field::{Field, FieldKind, TypeTag};
pub use validation::{attribute_to_json, json_to_attribute, load_value};

use crate::attribute::{Document, Item};

/// An ordered set of typed fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Validates a document and marshals it into a store item.
    ///
    /// Every problem is collected before returning: missing required fields,
    /// unknown fields and values that don't match their field kind. Optional
    /// fields set to `null` are left out of the item.
    pub fn load(&self, document: &Document) -> Result<Item, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut item = Item::with_capacity(document.len());

        for name in document.keys() {
            if !self.contains(name) {
                errors.add(name.as_str(), "Unknown field.");
            }
        }

        for field in &self.fields {
            match document.get(&field.name) {
                None | Some(serde_json::Value::Null) => {
                    if field.required {
                        errors.add(field.name.as_str(), "Missing data for required field.");
                    }
                }
                Some(value) => match load_value(&field.kind, value) {
                    Ok(attribute) => {
                        item.insert(field.name.clone(), attribute);
                    }
                    Err(message) => errors.add(field.name.as_str(), message),
                },
            }
        }

        errors.into_result(item)
    }

    /// Turns a stored item back into a document.
    ///
    /// Attributes the schema doesn't declare are ignored. Absent fields are
    /// absent from the document.
    pub fn dump(&self, item: &Item) -> Result<Document, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut document = Document::new();

        for field in &self.fields {
            if let Some(attribute) = item.get(&field.name) {
                match validation::dump_value(&field.kind, attribute) {
                    Ok(value) => {
                        document.insert(field.name.clone(), value);
                    }
                    Err(message) => errors.add(field.name.as_str(), message),
                }
            }
        }

        errors.into_result(document)
    }
}

/// Builder for [`Schema`].
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    fields: Vec<Field>,
}

impl SchemaBuilder {
    pub fn required(self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.field(name, kind, true)
    }

    pub fn optional(self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.field(name, kind, false)
    }

    /// Adds a field. A later field with the same name replaces the earlier one.
    pub fn field(mut self, name: impl Into<String>, kind: FieldKind, required: bool) -> Self {
        let name = name.into();
        self.fields.retain(|f| f.name != name);
        self.fields.push(Field {
            name,
            kind,
            required,
        });
        self
    }

    pub fn build(self) -> Schema {
        Schema {
            fields: self.fields,
        }
    }
}
