use std::borrow::Cow;
use std::fmt::Write as _;

use crate::{
    record::Record,
    schema::{FieldType, Schema, SchemaField},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

impl Align {
    pub fn for_type(ty: Option<FieldType>) -> Self {
        match ty {
            Some(FieldType::Integer | FieldType::Float) => Align::Right,
            _ => Align::Left,
        }
    }
}

pub fn render_table(headers: &[String], rows: &[Vec<String>], align: &[Align]) -> String {
    let mut widths = headers.iter().map(|h| cell_width(h)).collect::<Vec<_>>();
    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(widths.len()) {
            widths[idx] = widths[idx].max(cell_width(cell));
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths, &[]));
    let rule = widths
        .iter()
        .map(|w| "-".repeat((*w).max(3)))
        .collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&rule, &widths, &[]));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths, align));
    }
    output
}

/// Every column path of a schema, nested children spelled `parent.child`.
pub fn schema_paths(schema: &Schema) -> Vec<String> {
    schema
        .fields()
        .iter()
        .flat_map(|field| match field {
            SchemaField::Scalar(f) => vec![f.name.clone()],
            SchemaField::Group(g) => g
                .fields
                .iter()
                .map(|child| format!("{}.{}", g.name, child.name))
                .collect(),
        })
        .collect()
}

pub fn render_schema(schema: &Schema) -> String {
    let headers = vec!["#".to_string(), "field".to_string(), "type".to_string()];
    let rows = schema_paths(schema)
        .into_iter()
        .enumerate()
        .map(|(idx, path)| {
            let ty = schema
                .field_type(&path)
                .map(|t| t.to_string())
                .unwrap_or_default();
            vec![(idx + 1).to_string(), path, ty]
        })
        .collect::<Vec<_>>();
    render_table(&headers, &rows, &[Align::Right])
}

/// One line per record; cells are read through [`Record::get_string`].
pub fn render_records(paths: &[String], records: &[Record]) -> String {
    let align = paths
        .iter()
        .map(|path| Align::for_type(records.first().and_then(|r| r.schema().field_type(path))))
        .collect::<Vec<_>>();
    let rows = records
        .iter()
        .map(|record| paths.iter().map(|p| record.get_string(p)).collect())
        .collect::<Vec<_>>();
    render_table(paths, &rows, &align)
}

fn format_row(values: &[String], widths: &[usize], align: &[Align]) -> String {
    let cells = values
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(idx, (value, width))| {
            let cell = sanitize_cell(value);
            let padding = " ".repeat(width.saturating_sub(cell_width(&cell)));
            match align.get(idx).copied().unwrap_or(Align::Left) {
                Align::Left => format!("{cell}{padding}"),
                Align::Right => format!("{padding}{cell}"),
            }
        })
        .collect::<Vec<_>>();
    cells.join("  ").trim_end().to_string()
}

fn cell_width(value: &str) -> usize {
    value.chars().count().max(1)
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
