//! Field type inference and record layout synthesis.
//!
//! This module owns [`FieldType`] (the four inferable types), the
//! [`FieldDescriptor`] / [`GroupDescriptor`] pair that describes one slot, and
//! the [`Schema`] that ties a result set's columns to record slots.
//!
//! ## Responsibilities
//!
//! - Type inference from a single sample row ([`infer_field_type`],
//!   [`InferredTypes::from_first_row`])
//! - Layout synthesis: flat fields plus one nested group per parent prefix
//!   ([`Schema::synthesize`])
//! - Canonical key lookup shared with the accessor layer
//!
//! Inference looks at the first row only. A column whose first value is
//! ambiguous (for example a zero-padded code such as `"00"` that happens to
//! parse as an integer) keeps that type for the whole result set; later rows
//! that fail to parse are stored as text instead.

use std::{collections::HashMap, fmt, sync::Arc};

use serde::Serialize;

use crate::{
    columns::{ColumnLayout, ColumnSlot, TopLevel},
    data::{RawValue, canonical_field_name, decode_blob, parse_bool_literal, parse_float_literal,
        parse_int_literal},
    error::SchemaError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Integer,
    Float,
    Boolean,
    #[default]
    Text,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Boolean => "boolean",
            FieldType::Text => "text",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies a single sample value. Blobs are probed as integer, then float,
/// then boolean; native values keep their own type; everything else is text.
pub fn infer_field_type(value: &RawValue) -> FieldType {
    match value {
        RawValue::Null => FieldType::Text,
        RawValue::Bytes(bytes) => infer_text_type(&decode_blob(bytes)),
        RawValue::Integer(_) => FieldType::Integer,
        RawValue::Float(_) => FieldType::Float,
        RawValue::Boolean(_) => FieldType::Boolean,
        RawValue::Text(_)
        | RawValue::Date(_)
        | RawValue::DateTime(_)
        | RawValue::Uuid(_)
        | RawValue::Custom(_) => FieldType::Text,
    }
}

pub fn infer_text_type(value: &str) -> FieldType {
    if parse_int_literal(value).is_some() {
        FieldType::Integer
    } else if parse_float_literal(value).is_some() {
        FieldType::Float
    } else if parse_bool_literal(value).is_some() {
        FieldType::Boolean
    } else {
        FieldType::Text
    }
}

/// Per-slot types decided for one result set, shaped like its
/// [`ColumnLayout`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferredTypes {
    pub flat: Vec<FieldType>,
    pub groups: Vec<Vec<FieldType>>,
}

impl InferredTypes {
    /// Every slot typed as text; used when no data row is available.
    pub fn defaults(layout: &ColumnLayout) -> Self {
        Self {
            flat: vec![FieldType::Text; layout.flat.len()],
            groups: layout
                .groups
                .iter()
                .map(|g| vec![FieldType::Text; g.children.len()])
                .collect(),
        }
    }

    /// When several labels share a slot the last one decides its type.
    pub fn from_first_row(layout: &ColumnLayout, row: &[RawValue]) -> Self {
        let mut types = Self::defaults(layout);
        for (slot, value) in layout.slots.iter().zip(row) {
            let ty = infer_field_type(value);
            match *slot {
                ColumnSlot::Flat(idx) => types.flat[idx] = ty,
                ColumnSlot::Nested { group, child } => types.groups[group][child] = ty,
            }
        }
        types
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(skip)]
    pub key: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl FieldDescriptor {
    pub fn new(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_string(),
            key: canonical_field_name(name),
            field_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupDescriptor {
    pub name: String,
    #[serde(skip)]
    pub key: String,
    pub fields: Vec<FieldDescriptor>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl GroupDescriptor {
    fn build(name: &str, fields: Vec<FieldDescriptor>) -> Result<Self, SchemaError> {
        let mut index = HashMap::with_capacity(fields.len());
        for (idx, field) in fields.iter().enumerate() {
            if let Some(existing) = index.insert(field.key.clone(), idx) {
                return Err(SchemaError::DuplicateField {
                    key: format!("{}.{}", canonical_field_name(name), field.key),
                    first: format!("{name}.{}", fields[existing].name),
                    second: format!("{name}.{}", field.name),
                });
            }
        }
        Ok(Self {
            name: name.to_string(),
            key: canonical_field_name(name),
            fields,
            index,
        })
    }

    /// Lookup by canonical key.
    pub fn field_index(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.field_index(&canonical_field_name(name))
            .map(|idx| &self.fields[idx])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SchemaField {
    Scalar(FieldDescriptor),
    Group(Arc<GroupDescriptor>),
}

impl SchemaField {
    pub fn name(&self) -> &str {
        match self {
            SchemaField::Scalar(field) => &field.name,
            SchemaField::Group(group) => &group.name,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            SchemaField::Scalar(field) => &field.key,
            SchemaField::Group(group) => &group.key,
        }
    }
}

/// Routing from a column position to its record slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SlotRef {
    pub field: usize,
    pub child: Option<usize>,
}

/// Record layout for one result set. Built once, then shared read-only by
/// every record materialized from that result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Schema {
    fields: Vec<SchemaField>,
    #[serde(skip)]
    index: HashMap<String, usize>,
    #[serde(skip)]
    slots: Vec<SlotRef>,
}

impl Schema {
    pub fn synthesize(layout: &ColumnLayout, types: &InferredTypes) -> Result<Self, SchemaError> {
        let mut fields = Vec::with_capacity(layout.order.len());
        let mut index: HashMap<String, usize> = HashMap::with_capacity(layout.order.len());
        let mut flat_position = vec![0usize; layout.flat.len()];
        let mut group_position = vec![0usize; layout.groups.len()];

        for entry in &layout.order {
            let field = match *entry {
                TopLevel::Flat(idx) => {
                    flat_position[idx] = fields.len();
                    SchemaField::Scalar(FieldDescriptor::new(&layout.flat[idx], types.flat[idx]))
                }
                TopLevel::Group(idx) => {
                    group_position[idx] = fields.len();
                    let group = &layout.groups[idx];
                    let children = group
                        .children
                        .iter()
                        .zip(&types.groups[idx])
                        .map(|(child, ty)| FieldDescriptor::new(child, *ty))
                        .collect();
                    SchemaField::Group(Arc::new(GroupDescriptor::build(&group.parent, children)?))
                }
            };
            if let Some(&existing) = index.get(field.key()) {
                return Err(collision(&fields[existing], &field));
            }
            index.insert(field.key().to_string(), fields.len());
            fields.push(field);
        }

        let slots = layout
            .slots
            .iter()
            .map(|slot| match *slot {
                ColumnSlot::Flat(idx) => SlotRef {
                    field: flat_position[idx],
                    child: None,
                },
                ColumnSlot::Nested { group, child } => SlotRef {
                    field: group_position[group],
                    child: Some(child),
                },
            })
            .collect();

        Ok(Self {
            fields,
            index,
            slots,
        })
    }

    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn column_count(&self) -> usize {
        self.slots.len()
    }

    /// Lookup by canonical key.
    pub fn field_index(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.field_index(&canonical_field_name(name))
            .map(|idx| &self.fields[idx])
    }

    /// Declared type for a `name` or `parent.child` path.
    pub fn field_type(&self, path: &str) -> Option<FieldType> {
        match path.split_once('.') {
            Some((parent, child)) => match self.field(parent)? {
                SchemaField::Group(group) => group.field(child).map(|f| f.field_type),
                SchemaField::Scalar(_) => None,
            },
            None => match self.field(path)? {
                SchemaField::Scalar(field) => Some(field.field_type),
                SchemaField::Group(_) => None,
            },
        }
    }

    pub(crate) fn slots(&self) -> &[SlotRef] {
        &self.slots
    }

    /// Declared type of the slot a column is routed to.
    pub(crate) fn slot_type(&self, slot: SlotRef) -> FieldType {
        match (&self.fields[slot.field], slot.child) {
            (SchemaField::Scalar(field), _) => field.field_type,
            (SchemaField::Group(group), Some(child)) => group.fields[child].field_type,
            (SchemaField::Group(_), None) => FieldType::Text,
        }
    }
}

fn collision(existing: &SchemaField, incoming: &SchemaField) -> SchemaError {
    match (existing, incoming) {
        (SchemaField::Scalar(column), SchemaField::Group(group))
        | (SchemaField::Group(group), SchemaField::Scalar(column)) => SchemaError::GroupConflict {
            key: column.key.clone(),
            column: column.name.clone(),
            group: group.name.clone(),
        },
        _ => SchemaError::DuplicateField {
            key: incoming.key().to_string(),
            first: existing.name().to_string(),
            second: incoming.name().to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn layout(items: &[&str]) -> ColumnLayout {
        let labels = items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        ColumnLayout::classify(&labels)
    }

    #[test]
    fn infer_field_type_probes_blobs_in_priority_order() {
        assert_eq!(infer_field_type(&RawValue::bytes("123")), FieldType::Integer);
        assert_eq!(infer_field_type(&RawValue::bytes("123.45")), FieldType::Float);
        assert_eq!(infer_field_type(&RawValue::bytes("TRUE")), FieldType::Boolean);
        assert_eq!(infer_field_type(&RawValue::bytes("1")), FieldType::Integer);
        assert_eq!(infer_field_type(&RawValue::bytes("00")), FieldType::Integer);
        assert_eq!(infer_field_type(&RawValue::bytes("n/a")), FieldType::Text);
        assert_eq!(infer_field_type(&RawValue::bytes("")), FieldType::Text);
    }

    #[test]
    fn infer_field_type_keeps_native_types() {
        assert_eq!(infer_field_type(&RawValue::Integer(5)), FieldType::Integer);
        assert_eq!(infer_field_type(&RawValue::Float(0.5)), FieldType::Float);
        assert_eq!(infer_field_type(&RawValue::Boolean(false)), FieldType::Boolean);
        assert_eq!(infer_field_type(&RawValue::text("123")), FieldType::Text);
        assert_eq!(infer_field_type(&RawValue::Null), FieldType::Text);
        let date = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        assert_eq!(infer_field_type(&RawValue::Date(date)), FieldType::Text);
    }

    #[test]
    fn from_first_row_types_flat_and_nested_slots() {
        let layout = layout(&["id", "category.name", "category.id", "price"]);
        let row = vec![
            RawValue::Integer(1),
            RawValue::text("Electronics"),
            RawValue::bytes("7"),
            RawValue::bytes("9.5"),
        ];
        let types = InferredTypes::from_first_row(&layout, &row);
        assert_eq!(types.flat, vec![FieldType::Integer, FieldType::Float]);
        assert_eq!(types.groups[0], vec![FieldType::Text, FieldType::Integer]);
    }

    #[test]
    fn synthesize_preserves_first_appearance_order() {
        let layout = layout(&["id", "category.name", "title", "category.id"]);
        let schema = Schema::synthesize(&layout, &InferredTypes::defaults(&layout)).unwrap();
        let names = schema.fields().iter().map(|f| f.name()).collect::<Vec<_>>();
        assert_eq!(names, vec!["id", "category", "title"]);
        assert_eq!(schema.field_index("Category"), Some(1));
        assert_eq!(schema.column_count(), 4);
        match schema.field("category").unwrap() {
            SchemaField::Group(group) => {
                assert_eq!(group.key, "Category");
                assert_eq!(group.fields[1].key, "Id");
            }
            other => panic!("Expected group, got {other:?}"),
        }
    }

    #[test]
    fn synthesize_defaults_to_text_without_rows() {
        let layout = layout(&["id", "name"]);
        let schema = Schema::synthesize(&layout, &InferredTypes::defaults(&layout)).unwrap();
        assert_eq!(schema.field_type("id"), Some(FieldType::Text));
        assert_eq!(schema.field_type("name"), Some(FieldType::Text));
    }

    #[test]
    fn synthesize_is_structurally_deterministic() {
        let layout = layout(&["id", "a.x", "a.y"]);
        let row = vec![RawValue::Integer(1), RawValue::bytes("true"), RawValue::Null];
        let types = InferredTypes::from_first_row(&layout, &row);
        let first = Schema::synthesize(&layout, &types).unwrap();
        let second = Schema::synthesize(&layout, &types).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn synthesize_rejects_case_colliding_columns() {
        let layout = layout(&["name", "Name"]);
        let err = Schema::synthesize(&layout, &InferredTypes::defaults(&layout)).unwrap_err();
        assert_eq!(
            err,
            SchemaError::DuplicateField {
                key: "Name".to_string(),
                first: "name".to_string(),
                second: "Name".to_string(),
            }
        );
    }

    #[test]
    fn synthesize_rejects_flat_column_shadowing_group() {
        let layout = layout(&["category", "category.name"]);
        let err = Schema::synthesize(&layout, &InferredTypes::defaults(&layout)).unwrap_err();
        assert!(matches!(err, SchemaError::GroupConflict { ref key, .. } if key == "Category"));
    }

    #[test]
    fn synthesize_rejects_colliding_children() {
        let layout = layout(&["a.id", "a.Id"]);
        let err = Schema::synthesize(&layout, &InferredTypes::defaults(&layout)).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateField { ref key, .. } if key == "A.Id"));
    }

    #[test]
    fn field_type_resolves_nested_paths() {
        let layout = layout(&["id", "a.b.c"]);
        let row = vec![RawValue::bytes("1"), RawValue::bytes("2.5")];
        let schema =
            Schema::synthesize(&layout, &InferredTypes::from_first_row(&layout, &row)).unwrap();
        assert_eq!(schema.field_type("Id"), Some(FieldType::Integer));
        assert_eq!(schema.field_type("id"), Some(FieldType::Integer));
        assert_eq!(schema.field_type("ID"), None);
        assert_eq!(schema.field_type("a.b.c"), Some(FieldType::Float));
        assert_eq!(schema.field_type("a"), None);
        assert_eq!(schema.field_type("missing"), None);
    }

    #[test]
    fn field_type_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(FieldType::Boolean).unwrap(),
            serde_json::json!("boolean")
        );
        assert_eq!(serde_yaml::to_string(&FieldType::Float).unwrap().trim(), "float");
    }

    #[test]
    fn schema_serializes_as_field_list() {
        let layout = layout(&["id", "category.name"]);
        let row = vec![RawValue::Integer(1), RawValue::text("x")];
        let schema =
            Schema::synthesize(&layout, &InferredTypes::from_first_row(&layout, &row)).unwrap();
        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"name": "id", "type": "integer"},
                {"name": "category", "fields": [{"name": "name", "type": "text"}]}
            ])
        );
    }
}
