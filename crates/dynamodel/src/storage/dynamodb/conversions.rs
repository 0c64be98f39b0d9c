//! DynamoDB attribute conversion functions.
//!
//! Pure functions for converting between DynamoDB `AttributeValue` maps and
//! dynamodel items. These are testable in isolation without DynamoDB access.

use std::collections::HashMap;

use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::{AttributeValue, ScalarAttributeType};
use dynamodel_core::schema::TypeTag;
use dynamodel_core::storage::StoreError;
use dynamodel_core::{Attribute, Item};

/// Convert an attribute to a DynamoDB attribute value.
pub fn to_attribute_value(attribute: &Attribute) -> AttributeValue {
    match attribute {
        Attribute::S(s) => AttributeValue::S(s.clone()),
        Attribute::N(n) => AttributeValue::N(n.clone()),
        Attribute::B(bytes) => AttributeValue::B(Blob::new(bytes.clone())),
        Attribute::Bool(b) => AttributeValue::Bool(*b),
        Attribute::Null => AttributeValue::Null(true),
        Attribute::L(values) => AttributeValue::L(values.iter().map(to_attribute_value).collect()),
        Attribute::M(map) => AttributeValue::M(to_item(map)),
    }
}

/// Convert a DynamoDB attribute value to an attribute.
///
/// Set types come back as lists.
pub fn from_attribute_value(value: &AttributeValue) -> Result<Attribute, StoreError> {
    Ok(match value {
        AttributeValue::S(s) => Attribute::S(s.clone()),
        AttributeValue::N(n) => Attribute::N(n.clone()),
        AttributeValue::B(blob) => Attribute::B(blob.as_ref().to_vec()),
        AttributeValue::Bool(b) => Attribute::Bool(*b),
        AttributeValue::Null(_) => Attribute::Null,
        AttributeValue::L(values) => Attribute::L(
            values
                .iter()
                .map(from_attribute_value)
                .collect::<Result<_, _>>()?,
        ),
        AttributeValue::M(map) => Attribute::M(from_item(map)?),
        AttributeValue::Ss(values) => {
            Attribute::L(values.iter().cloned().map(Attribute::S).collect())
        }
        AttributeValue::Ns(values) => {
            Attribute::L(values.iter().cloned().map(Attribute::N).collect())
        }
        AttributeValue::Bs(values) => Attribute::L(
            values
                .iter()
                .map(|blob| Attribute::B(blob.as_ref().to_vec()))
                .collect(),
        ),
        other => {
            return Err(StoreError::InvalidData(format!(
                "Unsupported attribute value: {:?}",
                other
            )))
        }
    })
}

/// Convert an item to a DynamoDB item.
pub fn to_item(item: &Item) -> HashMap<String, AttributeValue> {
    item.iter()
        .map(|(name, attribute)| (name.clone(), to_attribute_value(attribute)))
        .collect()
}

/// Convert a DynamoDB item to an item.
pub fn from_item(item: &HashMap<String, AttributeValue>) -> Result<Item, StoreError> {
    item.iter()
        .map(|(name, value)| Ok((name.clone(), from_attribute_value(value)?)))
        .collect()
}

/// Key attribute type for table creation.
pub fn to_scalar_type(tag: TypeTag) -> ScalarAttributeType {
    match tag {
        TypeTag::S => ScalarAttributeType::S,
        TypeTag::N => ScalarAttributeType::N,
        TypeTag::B => ScalarAttributeType::B,
    }
}
