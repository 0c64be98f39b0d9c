//! Attribute values as the store sees them.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use crate::schema::TypeTag;

/// A row in the store: attribute name to value.
pub type Item = HashMap<String, Attribute>;

/// Caller-facing attribute bag, validated by a [`crate::Schema`] before it
/// becomes an [`Item`].
pub type Document = serde_json::Map<String, serde_json::Value>;

/// A single attribute value.
///
/// Numbers are kept as their decimal text, the way the store transmits them,
/// so no precision is lost between validation and the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    S(String),
    N(String),
    B(Vec<u8>),
    Bool(bool),
    Null,
    L(Vec<Attribute>),
    M(Item),
}

impl Attribute {
    /// Scalar type tag, `None` for non-key-able values.
    pub fn type_tag(&self) -> Option<TypeTag> {
        match self {
            Attribute::S(_) => Some(TypeTag::S),
            Attribute::N(_) => Some(TypeTag::N),
            Attribute::B(_) => Some(TypeTag::B),
            _ => None,
        }
    }

    pub fn as_s(&self) -> Option<&str> {
        match self {
            Attribute::S(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_n(&self) -> Option<&str> {
        match self {
            Attribute::N(n) => Some(n),
            _ => None,
        }
    }

    /// Orders two scalars of the same type the way key conditions do:
    /// strings and binaries bytewise, numbers numerically.
    ///
    /// Returns `None` when the values are not comparable.
    pub fn compare(&self, other: &Attribute) -> Option<Ordering> {
        match (self, other) {
            (Attribute::S(a), Attribute::S(b)) => Some(a.as_bytes().cmp(b.as_bytes())),
            (Attribute::B(a), Attribute::B(b)) => Some(a.cmp(b)),
            (Attribute::N(a), Attribute::N(b)) => {
                let a: f64 = a.parse().ok()?;
                let b: f64 = b.parse().ok()?;
                a.partial_cmp(&b)
            }
            _ => None,
        }
    }

    /// Prefix match used by `begins_with`.
    pub fn begins_with(&self, prefix: &Attribute) -> bool {
        match (self, prefix) {
            (Attribute::S(value), Attribute::S(prefix)) => value.starts_with(prefix.as_str()),
            (Attribute::B(value), Attribute::B(prefix)) => value.starts_with(prefix),
            _ => false,
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::S(s) => write!(f, "{s}"),
            Attribute::N(n) => write!(f, "{n}"),
            Attribute::B(b) => write!(f, "<{} bytes>", b.len()),
            Attribute::Bool(b) => write!(f, "{b}"),
            Attribute::Null => write!(f, "null"),
            Attribute::L(values) => write!(f, "[{} values]", values.len()),
            Attribute::M(map) => write!(f, "{{{} attributes}}", map.len()),
        }
    }
}

/// Renders the key attributes of an item as `name=value` pairs, in the
/// order given.
pub fn describe_key(item: &Item, key_names: &[&str]) -> String {
    key_names
        .iter()
        .filter_map(|name| item.get(*name).map(|value| format!("{name}={value}")))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_numbers_numerically() {
        let nine = Attribute::N("9".to_string());
        let ten = Attribute::N("10".to_string());
        assert_eq!(nine.compare(&ten), Some(Ordering::Less));
    }

    #[test]
    fn test_compare_strings_bytewise() {
        let a = Attribute::S("apple".to_string());
        let b = Attribute::S("banana".to_string());
        assert_eq!(b.compare(&a), Some(Ordering::Greater));
    }

    #[test]
    fn test_compare_mismatched_types() {
        let s = Attribute::S("1".to_string());
        let n = Attribute::N("1".to_string());
        assert_eq!(s.compare(&n), None);
    }

    #[test]
    fn test_begins_with() {
        let value = Attribute::S("three".to_string());
        assert!(value.begins_with(&Attribute::S("th".to_string())));
        assert!(!value.begins_with(&Attribute::S("two".to_string())));
        assert!(!value.begins_with(&Attribute::N("3".to_string())));
    }

    #[test]
    fn test_type_tag() {
        assert_eq!(Attribute::S(String::new()).type_tag(), Some(TypeTag::S));
        assert_eq!(Attribute::N("1".to_string()).type_tag(), Some(TypeTag::N));
        assert_eq!(Attribute::B(vec![1]).type_tag(), Some(TypeTag::B));
        assert_eq!(Attribute::Bool(true).type_tag(), None);
        assert_eq!(Attribute::Null.type_tag(), None);
    }

    #[test]
    fn test_describe_key() {
        let mut item = Item::new();
        item.insert("foo".to_string(), Attribute::S("first".to_string()));
        item.insert("bar".to_string(), Attribute::S("one".to_string()));
        item.insert("baz".to_string(), Attribute::S("lol".to_string()));

        assert_eq!(describe_key(&item, &["foo", "bar"]), "foo=first, bar=one");
        assert_eq!(describe_key(&item, &["foo"]), "foo=first");
    }
}
