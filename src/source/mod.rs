//! Tabular data sources consumed by [`crate::mapper::query_to_records`].
//!
//! A [`DataSource`] executes a query and hands back [`Rows`]: the column
//! labels once, then one row of [`RawValue`]s at a time. Two sources ship with
//! the crate: [`MemorySource`], a scripted source matched by query pattern,
//! and [`CsvSource`], which treats a CSV file path as the query.

pub mod csv;
pub mod memory;

pub use self::csv::CsvSource;
pub use self::memory::{MemoryRows, MemorySource};

use crate::{data::RawValue, error::SourceError};

pub trait DataSource {
    fn query(
        &mut self,
        query: &str,
        params: &[RawValue],
    ) -> Result<Box<dyn Rows + '_>, SourceError>;
}

/// Sequential cursor over one result set.
pub trait Rows {
    fn columns(&mut self) -> Result<Vec<String>, SourceError>;

    /// `Ok(None)` once the result set is exhausted.
    fn next_row(&mut self) -> Result<Option<Vec<RawValue>>, SourceError>;

    /// Deferred error raised while iterating, checked after the last row.
    fn take_err(&mut self) -> Option<SourceError> {
        None
    }
}

impl<T: DataSource + ?Sized> DataSource for &mut T {
    fn query(
        &mut self,
        query: &str,
        params: &[RawValue],
    ) -> Result<Box<dyn Rows + '_>, SourceError> {
        (**self).query(query, params)
    }
}
