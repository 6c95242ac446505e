use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

use crate::{
    dialect::DialectBehavior,
    rewriter::{RewriteError, Sort, SortKey},
    token::{QueryToken, QueryTokenStream, TokenStreamBuilder},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScrollDirection {
    Forward,
    Backward,
}

/// A seek value carried by the reference row. Hashable so bindings can be
/// deduplicated by (property, value) within one predicate build.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(OrderedFloat<f64>),
    Text(String),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
}

impl ParamValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ParamValue::Null)
    }

    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => ParamValue::Null,
            Value::Bool(flag) => ParamValue::Bool(*flag),
            Value::Number(number) => number
                .as_i64()
                .map(ParamValue::Int)
                .or_else(|| number.as_f64().map(|float| ParamValue::Float(OrderedFloat(float))))
                .unwrap_or(ParamValue::Null),
            Value::String(text) => ParamValue::Text(text.clone()),
            other => ParamValue::Text(other.to_string()),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Null => write!(f, "NULL"),
            ParamValue::Bool(flag) => write!(f, "{}", flag),
            ParamValue::Int(value) => write!(f, "{}", value),
            ParamValue::Float(value) => write!(f, "{}", value),
            ParamValue::Text(text) => write!(f, "'{}'", text),
            ParamValue::Uuid(id) => write!(f, "'{}'", id),
            ParamValue::Timestamp(at) => write!(f, "'{}'", at.to_rfc3339()),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(flag: bool) -> Self {
        ParamValue::Bool(flag)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(value as i64)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(OrderedFloat(value))
    }
}

impl From<&str> for ParamValue {
    fn from(text: &str) -> Self {
        ParamValue::Text(text.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(text: String) -> Self {
        ParamValue::Text(text)
    }
}

impl From<Uuid> for ParamValue {
    fn from(id: Uuid) -> Self {
        ParamValue::Uuid(id)
    }
}

impl From<DateTime<Utc>> for ParamValue {
    fn from(at: DateTime<Utc>) -> Self {
        ParamValue::Timestamp(at)
    }
}

/// Which leg of the seek predicate a synthesized parameter serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BindingRole {
    Equality,
    Comparison,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterBinding {
    pub name: String,
    pub value: ParamValue,
    pub role: BindingRole,
}

/// Seek values of the reference row, keyed by sort property. Empty means
/// first page: no predicate is produced.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct KeysetPosition {
    values: IndexMap<String, ParamValue>,
}

impl KeysetPosition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, property: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(property, value);
        self
    }

    pub fn insert(&mut self, property: impl Into<String>, value: impl Into<ParamValue>) {
        self.values.insert(property.into(), value.into());
    }

    pub fn get(&self, property: &str) -> Option<&ParamValue> {
        self.values.get(property)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Reads a JSON object into a position; anything else yields the empty
    /// (first page) position.
    pub fn from_json(value: &Value) -> Self {
        let mut position = Self::new();
        if let Value::Object(entries) = value {
            for (property, entry) in entries {
                position.insert(property.clone(), ParamValue::from_json(entry));
            }
        }
        position
    }
}

/// Accumulates synthesized bindings for one predicate build, deduplicating
/// by (property, value) so a value reused across branches binds once.
#[derive(Default)]
pub(crate) struct BindingTable {
    names: IndexMap<(String, ParamValue), String>,
    used: IndexSet<String>,
    bindings: Vec<ParameterBinding>,
}

impl BindingTable {
    /// Marker text for one comparison leg, creating the binding on first use.
    fn marker(
        &mut self,
        dialect: &dyn DialectBehavior,
        property: &str,
        value: &ParamValue,
        role: BindingRole,
    ) -> String {
        let key = (property.to_string(), value.clone());
        if let Some(name) = self.names.get(&key) {
            return dialect.bind_marker(name);
        }

        let name = self.unique_name(property);
        self.names.insert(key, name.clone());
        self.bindings.push(ParameterBinding { name: name.clone(), value: value.clone(), role });
        dialect.bind_marker(&name)
    }

    /// Deterministic, sanitized, prefixed so synthesized names cannot collide
    /// with user-declared parameters.
    fn unique_name(&mut self, property: &str) -> String {
        let mut base = String::from("keyset_");
        for ch in property.chars() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                base.push(ch);
            } else if ch == '.' {
                base.push('_');
            }
        }
        base.truncate(48);

        let mut name = base.clone();
        let mut suffix = 2;
        while self.used.contains(&name) {
            name = format!("{}_{}", base, suffix);
            suffix += 1;
        }
        self.used.insert(name.clone());
        name
    }

    pub(crate) fn into_bindings(self) -> Vec<ParameterBinding> {
        self.bindings
    }
}

/// The tuple-comparison expansion. Callers must have checked that every sort
/// key has a position value; keys without one are left out here.
pub(crate) fn expand_predicate(
    dialect: &dyn DialectBehavior,
    sort: &Sort,
    position: &KeysetPosition,
    direction: ScrollDirection,
    path_of: &dyn Fn(&SortKey) -> String,
    table: &mut BindingTable,
) -> QueryTokenStream {
    let keys: Vec<(&SortKey, String, &ParamValue)> = sort
        .keys
        .iter()
        .filter_map(|key| {
            position.get(&key.property).map(|value| (key, path_of(key), value))
        })
        .collect();

    if keys.is_empty() {
        return QueryTokenStream::empty();
    }

    let forward = matches!(direction, ScrollDirection::Forward);
    let mut branches: Vec<QueryTokenStream> = Vec::with_capacity(keys.len());

    for pivot in 0..keys.len() {
        let mut conjunction = TokenStreamBuilder::new();
        for (key, path, value) in keys.iter().take(pivot) {
            conjunction.append(QueryToken::expression(path.clone()));
            conjunction.append(QueryToken::expression("="));
            conjunction.append(QueryToken::expression(table.marker(
                dialect,
                &key.property,
                value,
                BindingRole::Equality,
            )));
            conjunction.append(QueryToken::expression("AND"));
        }

        let (key, path, value) = &keys[pivot];
        let operator = if key.ascending == forward { ">" } else { "<" };
        conjunction.append(QueryToken::expression(path.clone()));
        conjunction.append(QueryToken::expression(operator));
        conjunction.append(QueryToken::expression(table.marker(
            dialect,
            &key.property,
            value,
            BindingRole::Comparison,
        )));

        branches.push(conjunction.build());
    }

    if branches.len() == 1 {
        return branches.remove(0);
    }

    let mut builder = TokenStreamBuilder::new();
    for (index, branch) in branches.into_iter().enumerate() {
        if index > 0 {
            builder.append(QueryToken::expression("OR"));
        }
        builder.group(branch);
    }
    builder.build()
}

/// Result of one predicate build: the WHERE-compatible boolean expression
/// and the synthesized bindings the caller must pass on at execution time.
#[derive(Debug, Clone, PartialEq)]
pub struct KeysetClause {
    pub predicate: QueryTokenStream,
    pub bindings: Vec<ParameterBinding>,
}

/// Builds seek-pagination predicates from a sort specification and the
/// reference row the last page stopped at.
pub struct KeysetPredicate;

impl KeysetPredicate {
    pub fn build(
        dialect: &dyn DialectBehavior,
        sort: &Sort,
        position: &KeysetPosition,
        direction: ScrollDirection,
    ) -> Result<KeysetClause, RewriteError> {
        sort.validate()?;
        if !sort.is_sorted() {
            return RewriteError::EmptyKeysetSort.err();
        }
        if position.is_empty() {
            return Ok(KeysetClause { predicate: QueryTokenStream::empty(), bindings: vec![] });
        }
        for key in &sort.keys {
            if position.get(&key.property).is_none() {
                return RewriteError::MissingKeysetValue(key.property.clone()).err();
            }
        }

        let mut table = BindingTable::default();
        let predicate = expand_predicate(
            dialect,
            sort,
            position,
            direction,
            &|key| key.property.clone(),
            &mut table,
        );
        Ok(KeysetClause { predicate, bindings: table.into_bindings() })
    }

    /// Properties the outer query must project for the scroll to continue:
    /// the sort keys plus the entity identifier.
    pub fn required_selection(sort: &Sort, identifier: &str) -> Vec<String> {
        let mut out: Vec<String> = sort.keys.iter().map(|key| key.property.clone()).collect();
        if !out.iter().any(|property| property == identifier) {
            out.push(identifier.to_string());
        }
        out
    }
}
