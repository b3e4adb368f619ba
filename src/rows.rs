//! Row materialization.
//!
//! Provides [`materialize_row()`] which converts one row of raw source values
//! into a [`Record`] laid out by an already synthesized [`Schema`]. Blob cells
//! are parsed into the slot's inferred type; a blob that does not parse is
//! stored as its text, and the accessors take care of the mismatch on read.
//! Custom values are resolved here as well; a failed conversion fails the row.

use std::sync::Arc;

use crate::{
    data::{RawValue, Value, decode_blob, parse_bool_literal, parse_float_literal,
        parse_int_literal},
    error::{SchemaError, SourceError},
    record::{Group, Record},
    schema::{FieldType, Schema, SchemaField},
};

/// Fails with a boxed [`SchemaError::RowWidth`] when the row does not line up
/// with the schema, or with the conversion error of a custom value.
pub fn materialize_row(schema: &Arc<Schema>, raw: Vec<RawValue>) -> Result<Record, SourceError> {
    if raw.len() != schema.column_count() {
        return Err(SchemaError::RowWidth {
            expected: schema.column_count(),
            actual: raw.len(),
        }
        .into());
    }

    let mut values = schema
        .fields()
        .iter()
        .map(|field| match field {
            SchemaField::Scalar(_) => Value::Null,
            SchemaField::Group(descriptor) => Value::Group(Group::empty(Arc::clone(descriptor))),
        })
        .collect::<Vec<_>>();

    for (slot, cell) in schema.slots().iter().zip(raw) {
        let value = store_value(cell, schema.slot_type(*slot))?;
        match (slot.child, &mut values[slot.field]) {
            (Some(child), Value::Group(group)) => group.set(child, value),
            (_, target) => *target = value,
        }
    }

    Ok(Record::new(Arc::clone(schema), values))
}

/// Converts one cell for a slot declared as `ty`. Only blobs are parsed;
/// native values are stored as they arrived.
pub fn store_value(cell: RawValue, ty: FieldType) -> Result<Value, SourceError> {
    let value = match cell.resolve()? {
        RawValue::Null => Value::Null,
        RawValue::Bytes(bytes) => parse_blob(decode_blob(&bytes), ty),
        RawValue::Text(s) => Value::Text(s),
        RawValue::Integer(i) => Value::Integer(i),
        RawValue::Float(f) => Value::Float(f),
        RawValue::Boolean(b) => Value::Boolean(b),
        native => Value::Text(native.native_display().unwrap_or_default()),
    };
    Ok(value)
}

fn parse_blob(text: String, ty: FieldType) -> Value {
    let parsed = match ty {
        FieldType::Integer => parse_int_literal(&text).map(Value::Integer),
        FieldType::Float => parse_float_literal(&text).map(Value::Float),
        FieldType::Boolean => parse_bool_literal(&text).map(Value::Boolean),
        FieldType::Text => None,
    };
    parsed.unwrap_or(Value::Text(text))
}
