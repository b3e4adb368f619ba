//! Read-only accessors over materialized records.
//!
//! Every typed getter masks lookup misses and coercion failures behind a zero
//! value (`""`, `0`, `0.0`, `false`). Callers can use the result directly in a
//! conditional; use [`Record::get`] when a miss has to be told apart from a
//! stored zero.

use std::sync::Arc;

use serde::{Serialize, Serializer, ser::SerializeMap};

use crate::{
    data::{Value, canonical_field_name, parse_bool_literal, parse_float_literal,
        parse_int_literal},
    schema::{GroupDescriptor, Schema},
};

/// Values of one nested group, in the order of its descriptor's fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    descriptor: Arc<GroupDescriptor>,
    values: Vec<Value>,
}

impl Group {
    pub(crate) fn empty(descriptor: Arc<GroupDescriptor>) -> Self {
        let values = vec![Value::Null; descriptor.fields.len()];
        Self { descriptor, values }
    }

    pub(crate) fn set(&mut self, child: usize, value: Value) {
        self.values[child] = value;
    }

    pub fn descriptor(&self) -> &GroupDescriptor {
        &self.descriptor
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        if name.is_empty() {
            return None;
        }
        let idx = self.descriptor.field_index(&canonical_field_name(name))?;
        self.values.get(idx)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.descriptor
            .fields
            .iter()
            .map(|f| f.name.as_str())
            .zip(self.values.iter())
    }
}

impl Serialize for Group {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in self.fields() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// One materialized row. Carries its schema, so it needs no outside registry
/// to be read.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    schema: Arc<Schema>,
    values: Vec<Value>,
}

impl Record {
    pub(crate) fn new(schema: Arc<Schema>, values: Vec<Value>) -> Self {
        Self { schema, values }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.schema
            .fields()
            .iter()
            .map(|f| f.name())
            .zip(self.values.iter())
    }

    /// Resolves `name` or `parent.child`. Path segments are matched on their
    /// canonical form, so `get("Category.Name")` and `get("category.name")`
    /// hit the same slot. Returns `None` when any segment does not resolve.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        if head.is_empty() {
            return None;
        }
        let idx = self.schema.field_index(&canonical_field_name(head))?;
        let value = self.values.get(idx)?;
        match rest {
            None => Some(value),
            Some(child) => value.as_group()?.get(child),
        }
    }

    pub fn get_string(&self, path: &str) -> String {
        self.get(path).map(coerce_string).unwrap_or_default()
    }

    pub fn get_int(&self, path: &str) -> i64 {
        self.get(path).map(coerce_int).unwrap_or_default()
    }

    pub fn get_float(&self, path: &str) -> f64 {
        self.get(path).map(coerce_float).unwrap_or_default()
    }

    pub fn get_bool(&self, path: &str) -> bool {
        self.get(path).map(coerce_bool).unwrap_or_default()
    }
}

impl Serialize for Record {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in self.fields() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

pub fn coerce_string(value: &Value) -> String {
    match value {
        Value::Text(s) => s.clone(),
        other => other.as_display(),
    }
}

/// Floats truncate toward zero; text must be an integer literal.
pub fn coerce_int(value: &Value) -> i64 {
    match value {
        Value::Integer(i) => *i,
        Value::Float(f) => *f as i64,
        Value::Text(s) => parse_int_literal(s).unwrap_or_default(),
        _ => 0,
    }
}

pub fn coerce_float(value: &Value) -> f64 {
    match value {
        Value::Float(f) => *f,
        Value::Integer(i) => *i as f64,
        Value::Text(s) => parse_float_literal(s).unwrap_or_default(),
        _ => 0.0,
    }
}

/// Integers are truthy when nonzero; text must be a boolean literal.
pub fn coerce_bool(value: &Value) -> bool {
    match value {
        Value::Boolean(b) => *b,
        Value::Integer(i) => *i != 0,
        Value::Text(s) => parse_bool_literal(s).unwrap_or_default(),
        _ => false,
    }
}
