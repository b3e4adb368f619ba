//! Error types surfaced by the mapping entry point.
//!
//! Only two kinds of failure ever reach a caller: the data source failed, or
//! the column labels could not be turned into a record layout. Per-field
//! coercion problems are absorbed by the accessors in [`crate::record`].

use thiserror::Error;

/// Boxed error produced by a [`crate::source::DataSource`] implementation.
pub type SourceError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum MapError {
    /// The source refused or failed to execute the query
    #[error("Executing query `{query}`: {source}")]
    Query { query: String, source: SourceError },

    /// Column labels could not be read from the result set
    #[error("Reading column names: {source}")]
    Columns { source: SourceError },

    /// A single row fetch failed; `row` is 1-based
    #[error("Reading row {row}: {source}")]
    Row { row: usize, source: SourceError },

    /// The source reported a deferred error after the last row
    #[error("Iterating result set: {source}")]
    Iteration { source: SourceError },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Two distinct labels normalize to the same field key
    #[error("Columns '{first}' and '{second}' both map to field '{key}'")]
    DuplicateField {
        key: String,
        first: String,
        second: String,
    },

    /// A flat column and a nested group share the same field key
    #[error("Column '{column}' collides with nested group '{group}' on field '{key}'")]
    GroupConflict {
        key: String,
        column: String,
        group: String,
    },

    /// A row does not line up with the column layout it is materialized against
    #[error("Row has {actual} value(s) but the result set declares {expected} column(s)")]
    RowWidth { expected: usize, actual: usize },
}

impl MapError {
    /// Whether the failure originated in the external data source rather than
    /// in record synthesis.
    pub fn is_source_failure(&self) -> bool {
        !matches!(self, MapError::Schema(_))
    }
}
