//! Functional core for dynamodel.
//!
//! Everything in this crate is pure: attribute values, schemas and their
//! validation, table and model descriptors, and query planning. The only
//! seam towards I/O is the [`storage::TableStore`] trait, implemented by the
//! backends in the `dynamodel` crate.

pub mod attribute;
pub mod error;
pub mod model;
pub mod query;
pub mod schema;
pub mod storage;
pub mod table;

pub use attribute::{Attribute, Document, Item};
pub use error::{ModelError, Result};
pub use model::{Model, ModelDescriptor};
pub use query::{Condition, Operator, Query, QueryPlan};
pub use schema::{Field, FieldKind, Schema, TypeTag, ValidationErrors};
pub use table::{TableDescriptor, Throughput};
