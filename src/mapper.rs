//! Query entry point: columns and rows in, self-describing records out.
//!
//! The first row fixes the field types for the whole result set, and every
//! row (the first included) is materialized against that one schema. A fetch
//! failure anywhere discards the records collected so far.

use std::sync::Arc;

use log::{debug, warn};

use crate::{
    columns::ColumnLayout,
    data::RawValue,
    error::{MapError, SourceError},
    record::Record,
    rows::materialize_row,
    schema::{InferredTypes, Schema, SchemaField},
    source::{DataSource, Rows},
};

pub fn query_to_records<S>(
    source: &mut S,
    query: &str,
    params: &[RawValue],
) -> Result<Vec<Record>, MapError>
where
    S: DataSource + ?Sized,
{
    let (schema, records) = query_with_schema(source, query, params)?;
    debug!(
        "Mapped {} record(s) across {} field(s)",
        records.len(),
        schema.len()
    );
    Ok(records)
}

/// Like [`query_to_records`], also returning the schema. For an empty result
/// set the schema types every field as text.
pub fn query_with_schema<S>(
    source: &mut S,
    query: &str,
    params: &[RawValue],
) -> Result<(Arc<Schema>, Vec<Record>), MapError>
where
    S: DataSource + ?Sized,
{
    let mut rows = source.query(query, params).map_err(|source| MapError::Query {
        query: query.to_string(),
        source,
    })?;
    let columns = rows
        .columns()
        .map_err(|source| MapError::Columns { source })?;
    let layout = ColumnLayout::classify(&columns);
    if layout.duplicate_count() > 0 {
        warn!(
            "{} duplicate column label(s) in result set; the last occurrence wins",
            layout.duplicate_count()
        );
    }

    let mut row_number = 1usize;
    let first = fetch_row(rows.as_mut(), row_number)?;
    let types = match &first {
        Some(values) => InferredTypes::from_first_row(&layout, values),
        None => InferredTypes::defaults(&layout),
    };
    let schema = Arc::new(Schema::synthesize(&layout, &types)?);
    log_schema(&schema);

    let mut records = Vec::new();
    let mut next = first;
    while let Some(values) = next {
        let record = materialize_row(&schema, values).map_err(|source| MapError::Row {
            row: row_number,
            source,
        })?;
        records.push(record);
        row_number += 1;
        next = fetch_row(rows.as_mut(), row_number)?;
    }

    if let Some(source) = rows.take_err() {
        return Err(MapError::Iteration { source });
    }
    Ok((schema, records))
}

fn fetch_row<R>(rows: &mut R, row_number: usize) -> Result<Option<Vec<RawValue>>, MapError>
where
    R: Rows + ?Sized,
{
    let row_error = |source: SourceError| MapError::Row {
        row: row_number,
        source,
    };
    let Some(values) = rows.next_row().map_err(row_error)? else {
        return Ok(None);
    };
    let resolved = values
        .into_iter()
        .map(RawValue::resolve)
        .collect::<Result<Vec<_>, _>>()
        .map_err(row_error)?;
    Ok(Some(resolved))
}

fn log_schema(schema: &Schema) {
    if !log::log_enabled!(log::Level::Debug) {
        return;
    }
    for field in schema.fields() {
        match field {
            SchemaField::Scalar(f) => debug!("Field '{}' inferred as {}", f.name, f.field_type),
            SchemaField::Group(g) => {
                for child in &g.fields {
                    debug!(
                        "Field '{}.{}' inferred as {}",
                        g.name, child.name, child.field_type
                    );
                }
            }
        }
    }
}
