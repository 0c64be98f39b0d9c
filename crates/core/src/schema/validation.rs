//! Per-kind value conversion between JSON documents and store attributes.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, NaiveDate};
use serde_json::{Number, Value};

use super::field::FieldKind;
use crate::attribute::{Attribute, Item};

/// Validates one JSON value against a field kind and converts it.
///
/// `null` is never accepted here; callers decide what an absent value means.
pub fn load_value(kind: &FieldKind, value: &Value) -> Result<Attribute, String> {
    match kind {
        FieldKind::String => expect_str(value, "Not a valid string.").map(Attribute::S),
        FieldKind::Email => {
            let s = expect_str(value, "Not a valid email address.")?;
            if is_email(&s) {
                Ok(Attribute::S(s))
            } else {
                Err("Not a valid email address.".to_string())
            }
        }
        FieldKind::Integer => match value {
            Value::Number(n) if n.is_i64() || n.is_u64() => Ok(Attribute::N(n.to_string())),
            _ => Err("Not a valid integer.".to_string()),
        },
        FieldKind::Float | FieldKind::Number => match value {
            Value::Number(n) => Ok(Attribute::N(n.to_string())),
            _ => Err("Not a valid number.".to_string()),
        },
        FieldKind::Decimal => match value {
            Value::Number(n) => Ok(Attribute::N(n.to_string())),
            Value::String(s) if is_decimal(s) => Ok(Attribute::N(s.trim().to_string())),
            _ => Err("Not a valid decimal.".to_string()),
        },
        FieldKind::Boolean => match value {
            Value::Bool(b) => Ok(Attribute::Bool(*b)),
            _ => Err("Not a valid boolean.".to_string()),
        },
        FieldKind::DateTime => {
            let s = expect_str(value, "Not a valid datetime.")?;
            DateTime::parse_from_rfc3339(&s)
                .map(|_| Attribute::S(s))
                .map_err(|_| "Not a valid datetime.".to_string())
        }
        FieldKind::Date => {
            let s = expect_str(value, "Not a valid date.")?;
            NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                .map(|_| Attribute::S(s))
                .map_err(|_| "Not a valid date.".to_string())
        }
        FieldKind::Uuid => {
            let s = expect_str(value, "Not a valid UUID.")?;
            uuid::Uuid::parse_str(&s)
                .map(|id| Attribute::S(id.to_string()))
                .map_err(|_| "Not a valid UUID.".to_string())
        }
        FieldKind::Raw => {
            let s = expect_str(value, "Not valid base64 data.")?;
            BASE64
                .decode(s.as_bytes())
                .map(Attribute::B)
                .map_err(|_| "Not valid base64 data.".to_string())
        }
        FieldKind::List(inner) => match value {
            Value::Array(values) => values
                .iter()
                .enumerate()
                .map(|(index, value)| {
                    if value.is_null() {
                        return Err(format!("[{index}]: Field may not be null."));
                    }
                    load_value(inner, value).map_err(|message| format!("[{index}]: {message}"))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Attribute::L),
            _ => Err("Not a valid list.".to_string()),
        },
        FieldKind::Dict => match value {
            Value::Object(_) => Ok(json_to_attribute(value)),
            _ => Err("Not a valid mapping type.".to_string()),
        },
    }
}

/// Converts a stored attribute back into JSON for a field kind.
pub(super) fn dump_value(kind: &FieldKind, attribute: &Attribute) -> Result<Value, String> {
    if matches!(attribute, Attribute::Null) {
        return Ok(Value::Null);
    }

    match (kind, attribute) {
        (
            FieldKind::String
            | FieldKind::Email
            | FieldKind::DateTime
            | FieldKind::Date
            | FieldKind::Uuid,
            Attribute::S(s),
        ) => Ok(Value::String(s.clone())),
        (FieldKind::Integer, Attribute::N(n)) => n
            .parse::<i64>()
            .map(Value::from)
            .or_else(|_| n.parse::<u64>().map(Value::from))
            .map_err(|_| format!("Stored value '{n}' is not an integer.")),
        (FieldKind::Float | FieldKind::Number, Attribute::N(n)) => number_from_text(n)
            .map(Value::Number)
            .ok_or_else(|| format!("Stored value '{n}' is not a number.")),
        (FieldKind::Decimal, Attribute::N(n)) => Ok(Value::String(n.clone())),
        (FieldKind::Boolean, Attribute::Bool(b)) => Ok(Value::Bool(*b)),
        (FieldKind::Raw, Attribute::B(bytes)) => Ok(Value::String(BASE64.encode(bytes))),
        (FieldKind::List(inner), Attribute::L(values)) => values
            .iter()
            .map(|value| dump_value(inner, value))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        (FieldKind::Dict, Attribute::M(_)) => Ok(attribute_to_json(attribute)),
        (kind, attribute) => Err(format!(
            "Stored value {attribute} does not match field kind {}.",
            kind.name()
        )),
    }
}

/// Schema-less conversion of arbitrary JSON, used for dict fields.
pub fn json_to_attribute(value: &Value) -> Attribute {
    match value {
        Value::Null => Attribute::Null,
        Value::Bool(b) => Attribute::Bool(*b),
        Value::Number(n) => Attribute::N(n.to_string()),
        Value::String(s) => Attribute::S(s.clone()),
        Value::Array(values) => Attribute::L(values.iter().map(json_to_attribute).collect()),
        Value::Object(map) => Attribute::M(
            map.iter()
                .map(|(k, v)| (k.clone(), json_to_attribute(v)))
                .collect::<Item>(),
        ),
    }
}

/// Schema-less inverse of [`json_to_attribute`]. Binary data becomes base64.
pub fn attribute_to_json(attribute: &Attribute) -> Value {
    match attribute {
        Attribute::Null => Value::Null,
        Attribute::Bool(b) => Value::Bool(*b),
        Attribute::N(n) => number_from_text(n)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(n.clone())),
        Attribute::S(s) => Value::String(s.clone()),
        Attribute::B(bytes) => Value::String(BASE64.encode(bytes)),
        Attribute::L(values) => Value::Array(values.iter().map(attribute_to_json).collect()),
        Attribute::M(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), attribute_to_json(v)))
                .collect(),
        ),
    }
}

fn expect_str(value: &Value, message: &str) -> Result<String, String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| message.to_string())
}

fn number_from_text(text: &str) -> Option<Number> {
    if let Ok(i) = text.parse::<i64>() {
        return Some(Number::from(i));
    }
    if let Ok(u) = text.parse::<u64>() {
        return Some(Number::from(u));
    }
    text.parse::<f64>().ok().and_then(Number::from_f64)
}

fn is_decimal(text: &str) -> bool {
    let text = text.trim();
    !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
        && text.parse::<f64>().is_ok_and(f64::is_finite)
}

fn is_email(text: &str) -> bool {
    let mut parts = text.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && !domain.is_empty()
                && !text.chars().any(char::is_whitespace)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_integer_rejects_fractions() {
        assert_eq!(
            load_value(&FieldKind::Integer, &json!(12)),
            Ok(Attribute::N("12".to_string()))
        );
        assert!(load_value(&FieldKind::Integer, &json!(1.5)).is_err());
        assert!(load_value(&FieldKind::Integer, &json!("12")).is_err());
    }

    #[test]
    fn test_decimal_accepts_numeric_text() {
        assert_eq!(
            load_value(&FieldKind::Decimal, &json!("10.25")),
            Ok(Attribute::N("10.25".to_string()))
        );
        assert!(load_value(&FieldKind::Decimal, &json!("ten")).is_err());
        assert!(load_value(&FieldKind::Decimal, &json!("inf")).is_err());
    }

    #[test]
    fn test_datetime_and_date() {
        assert!(load_value(&FieldKind::DateTime, &json!("2024-01-15T10:30:00Z")).is_ok());
        assert!(load_value(&FieldKind::DateTime, &json!("2024-01-15")).is_err());
        assert!(load_value(&FieldKind::Date, &json!("2024-01-15")).is_ok());
        assert!(load_value(&FieldKind::Date, &json!("15/01/2024")).is_err());
    }

    #[test]
    fn test_uuid_is_normalized() {
        assert_eq!(
            load_value(
                &FieldKind::Uuid,
                &json!("550E8400-E29B-41D4-A716-446655440001")
            ),
            Ok(Attribute::S(
                "550e8400-e29b-41d4-a716-446655440001".to_string()
            ))
        );
    }

    #[test]
    fn test_email() {
        assert!(load_value(&FieldKind::Email, &json!("john@example.com")).is_ok());
        assert!(load_value(&FieldKind::Email, &json!("john.example.com")).is_err());
        assert!(load_value(&FieldKind::Email, &json!("a@b@c")).is_err());
        assert!(load_value(&FieldKind::Email, &json!("john @example.com")).is_err());
    }

    #[test]
    fn test_raw_is_base64() {
        assert_eq!(
            load_value(&FieldKind::Raw, &json!("aGVsbG8=")),
            Ok(Attribute::B(b"hello".to_vec()))
        );
        assert!(load_value(&FieldKind::Raw, &json!("not base64!")).is_err());
        assert_eq!(
            dump_value(&FieldKind::Raw, &Attribute::B(b"hello".to_vec())),
            Ok(json!("aGVsbG8="))
        );
    }

    #[test]
    fn test_list_reports_element_index() {
        let kind = FieldKind::List(Box::new(FieldKind::Integer));
        assert_eq!(
            load_value(&kind, &json!([1, "two", 3])),
            Err("[1]: Not a valid integer.".to_string())
        );
        assert_eq!(
            load_value(&kind, &json!([1, null])),
            Err("[1]: Field may not be null.".to_string())
        );
    }

    #[test]
    fn test_dict_keeps_nested_values() {
        let value = json!({"a": 1, "b": [true, "x"], "c": {"d": null}});
        let attribute = load_value(&FieldKind::Dict, &value).unwrap();
        assert_eq!(attribute_to_json(&attribute), value);
    }

    #[test]
    fn test_dump_numbers() {
        assert_eq!(
            dump_value(&FieldKind::Number, &Attribute::N("3".to_string())),
            Ok(json!(3))
        );
        assert_eq!(
            dump_value(&FieldKind::Float, &Attribute::N("2.5".to_string())),
            Ok(json!(2.5))
        );
        assert_eq!(
            dump_value(&FieldKind::Decimal, &Attribute::N("2.50".to_string())),
            Ok(json!("2.50"))
        );
        assert!(dump_value(&FieldKind::Integer, &Attribute::N("2.5".to_string())).is_err());
    }

    #[test]
    fn test_dump_rejects_mismatched_attribute() {
        let result = dump_value(&FieldKind::Integer, &Attribute::S("12".to_string()));
        assert_eq!(
            result,
            Err("Stored value 12 does not match field kind integer.".to_string())
        );
    }
}
