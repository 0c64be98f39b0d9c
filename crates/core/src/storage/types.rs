use crate::schema::TypeTag;
use crate::table::TableDescriptor;

/// Everything a backend needs to create a table: the descriptor plus the
/// storage type of each key attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefinition {
    pub table: TableDescriptor,
    pub hash_key_type: TypeTag,
    pub range_key_type: Option<TypeTag>,
}

impl TableDefinition {
    /// Key attributes with their type tags, hash key first.
    pub fn key_attributes(&self) -> Vec<(&str, TypeTag)> {
        let mut keys = vec![(self.table.hash_key.as_str(), self.hash_key_type)];
        if let (Some(name), Some(tag)) = (&self.table.range_key, self.range_key_type) {
            keys.push((name.as_str(), tag));
        }
        keys
    }
}

/// How a put treats an existing row with the same key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PutMode {
    /// Replace whatever is there.
    Overwrite,
    /// Only write when no row holds `hash_key` for this primary key.
    Unique { hash_key: String },
}

impl PutMode {
    /// Condition expression for the write, if any.
    pub fn condition_expression(&self) -> Option<String> {
        match self {
            PutMode::Overwrite => None,
            PutMode::Unique { .. } => Some("attribute_not_exists(#hash_key)".to_string()),
        }
    }
}
