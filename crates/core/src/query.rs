//! Query construction and planning.
//!
//! A [`Query`] is a list of conditions on schema fields. Planning checks it
//! against a [`ModelDescriptor`] and splits it into a key condition (hash and
//! range key) and a filter (every other field), rendered as DynamoDB
//! expressions with placeholder names and values. All checks happen here, so
//! an invalid query never reaches the store.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

use crate::attribute::{Attribute, Item};
use crate::error::{ModelError, Result};
use crate::model::ModelDescriptor;
use crate::schema::{load_value, ValidationErrors};

/// Comparison used by a [`Condition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
    Between,
    BeginsWith,
}

impl Operator {
    /// Parses the suffix of a `field__op` name.
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "eq" => Some(Operator::Eq),
            "lt" => Some(Operator::Lt),
            "lte" | "le" => Some(Operator::Le),
            "gt" => Some(Operator::Gt),
            "gte" | "ge" => Some(Operator::Ge),
            "between" => Some(Operator::Between),
            "begins_with" => Some(Operator::BeginsWith),
            _ => None,
        }
    }

    /// Number of operand values the operator takes.
    pub fn arity(&self) -> usize {
        match self {
            Operator::Between => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operator::Eq => "eq",
            Operator::Lt => "lt",
            Operator::Le => "lte",
            Operator::Gt => "gt",
            Operator::Ge => "gte",
            Operator::Between => "between",
            Operator::BeginsWith => "begins_with",
        };
        f.write_str(name)
    }
}

/// A single field comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub operator: Operator,
    pub values: Vec<Value>,
}

impl Condition {
    pub fn new(field: impl Into<String>, operator: Operator, values: Vec<Value>) -> Self {
        Self {
            field: field.into(),
            operator,
            values,
        }
    }

    /// Parses `field` or `field__op` naming. A bare field means equality.
    /// A suffix that is not an operator stays part of the field name.
    /// `between` takes a two element array as its value.
    pub fn parse(name: &str, value: Value) -> Result<Self> {
        let (field, operator) = name
            .rsplit_once("__")
            .and_then(|(field, suffix)| Some((field, Operator::from_suffix(suffix)?)))
            .unwrap_or((name, Operator::Eq));

        let values = match (operator, value) {
            (Operator::Between, Value::Array(values)) => values,
            (Operator::Between, _) => {
                return Err(ModelError::InvalidCondition {
                    field: field.to_string(),
                    reason: "between takes a [low, high] pair".to_string(),
                })
            }
            (_, value) => vec![value],
        };

        Ok(Self::new(field, operator, values))
    }
}

/// A query over one model's table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub conditions: Vec<Condition>,
    pub limit: Option<i32>,
    pub descending: bool,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.condition(Condition::new(field, Operator::Eq, vec![value.into()]))
    }

    pub fn lt(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.condition(Condition::new(field, Operator::Lt, vec![value.into()]))
    }

    pub fn le(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.condition(Condition::new(field, Operator::Le, vec![value.into()]))
    }

    pub fn gt(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.condition(Condition::new(field, Operator::Gt, vec![value.into()]))
    }

    pub fn ge(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.condition(Condition::new(field, Operator::Ge, vec![value.into()]))
    }

    pub fn between(
        self,
        field: impl Into<String>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        self.condition(Condition::new(
            field,
            Operator::Between,
            vec![low.into(), high.into()],
        ))
    }

    pub fn begins_with(self, field: impl Into<String>, prefix: impl Into<Value>) -> Self {
        self.condition(Condition::new(
            field,
            Operator::BeginsWith,
            vec![prefix.into()],
        ))
    }

    /// Stops after this many matching rows.
    pub fn limit(mut self, limit: i32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns rows in descending range key order.
    pub fn descending(mut self) -> Self {
        self.descending = true;
        self
    }
}

/// A validated condition with its operands converted to attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedCondition {
    pub field: String,
    pub operator: Operator,
    pub values: Vec<Attribute>,
}

impl PlannedCondition {
    /// Evaluates the condition against a row. A missing attribute never
    /// matches.
    pub fn matches(&self, item: &Item) -> bool {
        let Some(actual) = item.get(&self.field) else {
            return false;
        };
        let cmp = |index: usize| actual.compare(&self.values[index]);

        match self.operator {
            Operator::Eq => actual == &self.values[0] || cmp(0) == Some(Ordering::Equal),
            Operator::Lt => cmp(0) == Some(Ordering::Less),
            Operator::Le => matches!(cmp(0), Some(Ordering::Less | Ordering::Equal)),
            Operator::Gt => cmp(0) == Some(Ordering::Greater),
            Operator::Ge => matches!(cmp(0), Some(Ordering::Greater | Ordering::Equal)),
            Operator::Between => {
                matches!(cmp(0), Some(Ordering::Greater | Ordering::Equal))
                    && matches!(cmp(1), Some(Ordering::Less | Ordering::Equal))
            }
            Operator::BeginsWith => actual.begins_with(&self.values[0]),
        }
    }

    fn render(&self, name: &str, values: &[String]) -> String {
        match self.operator {
            Operator::Eq => format!("{name} = {}", values[0]),
            Operator::Lt => format!("{name} < {}", values[0]),
            Operator::Le => format!("{name} <= {}", values[0]),
            Operator::Gt => format!("{name} > {}", values[0]),
            Operator::Ge => format!("{name} >= {}", values[0]),
            Operator::Between => format!("{name} BETWEEN {} AND {}", values[0], values[1]),
            Operator::BeginsWith => format!("begins_with({name}, {})", values[0]),
        }
    }
}

/// A query ready to send: expressions plus the conditions they encode.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub key_conditions: Vec<PlannedCondition>,
    pub filters: Vec<PlannedCondition>,
    pub key_condition_expression: String,
    pub filter_expression: Option<String>,
    pub attribute_names: HashMap<String, String>,
    pub attribute_values: HashMap<String, Attribute>,
    pub limit: Option<i32>,
    pub scan_forward: bool,
}

impl QueryPlan {
    /// Whether a row satisfies both the key condition and the filter.
    pub fn matches(&self, item: &Item) -> bool {
        self.key_conditions
            .iter()
            .chain(self.filters.iter())
            .all(|condition| condition.matches(item))
    }
}

pub(crate) fn plan(descriptor: &ModelDescriptor, query: &Query) -> Result<QueryPlan> {
    let table = descriptor.table();
    let schema = descriptor.schema();

    for condition in &query.conditions {
        if !schema.contains(&condition.field) {
            return Err(ModelError::InvalidSchemaField {
                table: table.name.clone(),
                field: condition.field.clone(),
            });
        }
    }

    if let Some(limit) = query.limit.filter(|limit| *limit < 1) {
        return Err(ModelError::InvalidCondition {
            field: "limit".to_string(),
            reason: format!("limit must be at least 1, got {limit}"),
        });
    }

    let mut errors = ValidationErrors::new();
    let mut planned = Vec::with_capacity(query.conditions.len());

    for condition in &query.conditions {
        let arity = condition.operator.arity();
        if condition.values.len() != arity {
            return Err(ModelError::InvalidCondition {
                field: condition.field.clone(),
                reason: format!(
                    "{} takes {arity} value(s), got {}",
                    condition.operator,
                    condition.values.len()
                ),
            });
        }

        let Some(field) = schema.field(&condition.field) else {
            continue;
        };
        let mut values = Vec::with_capacity(arity);
        for value in &condition.values {
            match load_value(&field.kind, value) {
                Ok(attribute) => values.push(attribute),
                Err(message) => errors.add(condition.field.as_str(), message),
            }
        }

        if condition.operator == Operator::BeginsWith
            && !matches!(values.first(), Some(Attribute::S(_) | Attribute::B(_)))
            && values.len() == arity
        {
            return Err(ModelError::InvalidCondition {
                field: condition.field.clone(),
                reason: format!("begins_with does not apply to {} fields", field.kind.name()),
            });
        }

        planned.push(PlannedCondition {
            field: condition.field.clone(),
            operator: condition.operator,
            values,
        });
    }

    if !errors.is_empty() {
        return Err(errors.into());
    }

    let (key_conditions, filters): (Vec<_>, Vec<_>) = planned
        .into_iter()
        .partition(|condition| table.is_key(&condition.field));

    let hash_conditions: Vec<_> = key_conditions
        .iter()
        .filter(|c| c.field == table.hash_key)
        .collect();
    match hash_conditions.as_slice() {
        [] => {
            return Err(ModelError::MissingKey {
                table: table.name.clone(),
                field: table.hash_key.clone(),
            })
        }
        [condition] if condition.operator != Operator::Eq => {
            return Err(ModelError::InvalidCondition {
                field: table.hash_key.clone(),
                reason: "the hash key only supports equality".to_string(),
            })
        }
        [_] => {}
        _ => {
            return Err(ModelError::InvalidCondition {
                field: table.hash_key.clone(),
                reason: "the hash key can only be compared once".to_string(),
            })
        }
    }

    if key_conditions.len() > 2 {
        if let Some(range_key) = &table.range_key {
            return Err(ModelError::InvalidCondition {
                field: range_key.clone(),
                reason: "the range key can only be compared once".to_string(),
            });
        }
    }

    let mut attribute_names = HashMap::new();
    let mut attribute_values = HashMap::new();
    let mut render = |conditions: &[PlannedCondition], offset: usize| {
        conditions
            .iter()
            .enumerate()
            .map(|(i, condition)| {
                let index = offset + i;
                let name = format!("#n{index}");
                attribute_names.insert(name.clone(), condition.field.clone());

                let placeholders: Vec<String> = condition
                    .values
                    .iter()
                    .enumerate()
                    .map(|(j, value)| {
                        let placeholder = format!(":v{index}_{j}");
                        attribute_values.insert(placeholder.clone(), value.clone());
                        placeholder
                    })
                    .collect();

                condition.render(&name, &placeholders)
            })
            .collect::<Vec<_>>()
            .join(" AND ")
    };

    let key_condition_expression = render(key_conditions.as_slice(), 0);
    let filter_expression =
        Some(render(filters.as_slice(), key_conditions.len())).filter(|f| !f.is_empty());

    Ok(QueryPlan {
        key_conditions,
        filters,
        key_condition_expression,
        filter_expression,
        attribute_names,
        attribute_values,
        limit: query.limit,
        scan_forward: !query.descending,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::schema::{FieldKind, Schema};
    use crate::table::TableDescriptor;

    fn descriptor() -> ModelDescriptor {
        ModelDescriptor::new(
            TableDescriptor::new("peanut-butter", "foo").with_range_key("bar"),
            Schema::builder()
                .required("foo", FieldKind::String)
                .required("bar", FieldKind::String)
                .optional("baz", FieldKind::String)
                .optional("count", FieldKind::Integer)
                .build(),
        )
        .unwrap()
    }

    fn item(foo: &str, bar: &str, count: i64) -> Item {
        let mut item = Item::new();
        item.insert("foo".to_string(), Attribute::S(foo.to_string()));
        item.insert("bar".to_string(), Attribute::S(bar.to_string()));
        item.insert("count".to_string(), Attribute::N(count.to_string()));
        item
    }

    #[test]
    fn test_parse_condition_names() {
        let condition = Condition::parse("bar__begins_with", json!("o")).unwrap();
        assert_eq!(condition.field, "bar");
        assert_eq!(condition.operator, Operator::BeginsWith);

        let condition = Condition::parse("foo", json!("first")).unwrap();
        assert_eq!(condition.operator, Operator::Eq);

        let condition = Condition::parse("count__between", json!([1, 10])).unwrap();
        assert_eq!(condition.values, vec![json!(1), json!(10)]);
    }

    #[test]
    fn test_parse_keeps_unknown_suffix_in_field() {
        let condition = Condition::parse("count__near", json!(1)).unwrap();
        assert_eq!(condition.field, "count__near");
        assert_eq!(condition.operator, Operator::Eq);

        let query = Query::new().eq("foo", "first").condition(condition);
        assert_eq!(
            descriptor().plan_query(&query),
            Err(ModelError::InvalidSchemaField {
                table: "peanut-butter".to_string(),
                field: "count__near".to_string(),
            })
        );
    }

    #[test]
    fn test_field_with_double_underscore_takes_equality() {
        let descriptor = ModelDescriptor::new(
            TableDescriptor::new("snake", "user__id"),
            Schema::builder()
                .required("user__id", FieldKind::String)
                .build(),
        )
        .unwrap();

        let condition = Condition::parse("user__id", json!("abc")).unwrap();
        assert_eq!(condition.field, "user__id");
        assert_eq!(condition.operator, Operator::Eq);

        let between = Condition::parse("user__id__between", json!(["a", "b"])).unwrap();
        assert_eq!(between.field, "user__id");
        assert_eq!(between.operator, Operator::Between);

        let plan = descriptor
            .plan_query(&Query::new().condition(condition))
            .unwrap();
        assert_eq!(plan.key_conditions.len(), 1);
        assert_eq!(plan.key_conditions[0].field, "user__id");
    }

    #[test]
    fn test_limit_below_one_is_rejected() {
        for limit in [0, -5] {
            let query = Query::new().eq("foo", "first").limit(limit);
            assert!(matches!(
                descriptor().plan_query(&query),
                Err(ModelError::InvalidCondition { ref field, .. }) if field == "limit"
            ));
        }

        let query = Query::new().eq("foo", "first").limit(1);
        assert_eq!(descriptor().plan_query(&query).unwrap().limit, Some(1));
    }

    #[test]
    fn test_parse_between_requires_pair() {
        let result = Condition::parse("count__between", json!(1));
        assert!(matches!(result, Err(ModelError::InvalidCondition { .. })));
    }

    #[test]
    fn test_unknown_field_is_rejected_first() {
        let query = Query::new().eq("bbq", "wtf");
        assert_eq!(
            descriptor().plan_query(&query),
            Err(ModelError::InvalidSchemaField {
                table: "peanut-butter".to_string(),
                field: "bbq".to_string(),
            })
        );
    }

    #[test]
    fn test_hash_key_is_required() {
        let query = Query::new().eq("bar", "one");
        assert!(matches!(
            descriptor().plan_query(&query),
            Err(ModelError::MissingKey { ref field, .. }) if field == "foo"
        ));
    }

    #[test]
    fn test_hash_key_only_supports_equality() {
        let query = Query::new().begins_with("foo", "fi");
        assert!(matches!(
            descriptor().plan_query(&query),
            Err(ModelError::InvalidCondition { .. })
        ));
    }

    #[test]
    fn test_begins_with_on_number_is_rejected() {
        let query = Query::new().eq("foo", "first").begins_with("count", 1);
        assert!(matches!(
            descriptor().plan_query(&query),
            Err(ModelError::InvalidCondition { ref field, .. }) if field == "count"
        ));
    }

    #[test]
    fn test_operand_kind_is_validated() {
        let query = Query::new().eq("foo", "first").gt("count", "many");
        assert!(matches!(
            descriptor().plan_query(&query),
            Err(ModelError::Validation(_))
        ));
    }

    #[test]
    fn test_plan_expressions() {
        let query = Query::new()
            .eq("foo", "first")
            .begins_with("bar", "o")
            .gt("count", 100)
            .limit(10);

        let plan = descriptor().plan_query(&query).unwrap();

        assert_eq!(
            plan.key_condition_expression,
            "#n0 = :v0_0 AND begins_with(#n1, :v1_0)"
        );
        assert_eq!(plan.filter_expression.as_deref(), Some("#n2 > :v2_0"));
        assert_eq!(plan.attribute_names.get("#n2"), Some(&"count".to_string()));
        assert_eq!(
            plan.attribute_values.get(":v2_0"),
            Some(&Attribute::N("100".to_string()))
        );
        assert_eq!(plan.limit, Some(10));
        assert!(plan.scan_forward);
    }

    #[test]
    fn test_plan_without_filter() {
        let plan = descriptor()
            .plan_query(&Query::new().eq("foo", "first").descending())
            .unwrap();

        assert_eq!(plan.key_condition_expression, "#n0 = :v0_0");
        assert_eq!(plan.filter_expression, None);
        assert!(!plan.scan_forward);
    }

    #[test]
    fn test_between_renders_both_operands() {
        let plan = descriptor()
            .plan_query(&Query::new().eq("foo", "first").between("bar", "a", "m"))
            .unwrap();

        assert_eq!(
            plan.key_condition_expression,
            "#n0 = :v0_0 AND #n1 BETWEEN :v1_0 AND :v1_1"
        );
    }

    #[test]
    fn test_plan_matches_items() {
        let plan = descriptor()
            .plan_query(&Query::new().eq("foo", "first").ge("count", 300))
            .unwrap();

        assert!(plan.matches(&item("first", "two", 321)));
        assert!(!plan.matches(&item("first", "one", 123)));
        assert!(!plan.matches(&item("second", "one", 456)));
    }

    #[test]
    fn test_missing_attribute_never_matches() {
        let plan = descriptor()
            .plan_query(&Query::new().eq("foo", "first").eq("baz", "lol"))
            .unwrap();

        assert!(!plan.matches(&item("first", "one", 1)));
    }
}
