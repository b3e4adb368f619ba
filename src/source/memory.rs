//! Scripted in-memory data source.
//!
//! Queries are answered by an ordered queue of expectations. Each expectation
//! carries a regular expression that the incoming query text must match, and
//! either a prepared result set or an execution error. Handy for tests and for
//! feeding already-fetched rows through the mapper.

use std::{collections::VecDeque, vec};

use itertools::Itertools;
use log::debug;
use regex::Regex;

use super::{DataSource, Rows};
use crate::{data::RawValue, error::SourceError};

/// Prepared result set returned by a [`MemorySource`] expectation.
#[derive(Debug, Clone, Default)]
pub struct MemoryRows {
    columns: Vec<String>,
    rows: Vec<Vec<RawValue>>,
    columns_error: Option<String>,
    row_error: Option<(usize, String)>,
    close_error: Option<String>,
}

impl MemoryRows {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn row<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<RawValue>,
    {
        self.rows.push(values.into_iter().map(Into::into).collect());
        self
    }

    /// Makes the column lookup fail.
    pub fn columns_error(mut self, message: impl Into<String>) -> Self {
        self.columns_error = Some(message.into());
        self
    }

    /// Makes fetching the row at 0-based `index` fail.
    pub fn row_error(mut self, index: usize, message: impl Into<String>) -> Self {
        self.row_error = Some((index, message.into()));
        self
    }

    /// Error reported after the last row has been consumed.
    pub fn close_error(mut self, message: impl Into<String>) -> Self {
        self.close_error = Some(message.into());
        self
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

#[derive(Debug)]
enum Outcome {
    Rows(MemoryRows),
    Error(String),
}

#[derive(Debug)]
struct Expectation {
    pattern: Regex,
    outcome: Outcome,
}

#[derive(Debug, Clone)]
pub struct ExecutedQuery {
    pub query: String,
    pub params: Vec<RawValue>,
}

#[derive(Debug, Default)]
pub struct MemorySource {
    expectations: VecDeque<Expectation>,
    executed: Vec<ExecutedQuery>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expect_rows(&mut self, pattern: &str, rows: MemoryRows) -> Result<(), regex::Error> {
        self.push(pattern, Outcome::Rows(rows))
    }

    pub fn expect_error(
        &mut self,
        pattern: &str,
        message: impl Into<String>,
    ) -> Result<(), regex::Error> {
        self.push(pattern, Outcome::Error(message.into()))
    }

    fn push(&mut self, pattern: &str, outcome: Outcome) -> Result<(), regex::Error> {
        let pattern = Regex::new(pattern)?;
        self.expectations.push_back(Expectation { pattern, outcome });
        Ok(())
    }

    /// Queries that reached the source, including the ones that failed.
    pub fn executed(&self) -> &[ExecutedQuery] {
        &self.executed
    }

    pub fn expectations_were_met(&self) -> Result<(), String> {
        if self.expectations.is_empty() {
            return Ok(());
        }
        Err(format!(
            "{} expectation(s) not consumed: {}",
            self.expectations.len(),
            self.expectations
                .iter()
                .map(|e| format!("`{}`", e.pattern.as_str()))
                .join(", ")
        ))
    }
}

impl DataSource for MemorySource {
    fn query(
        &mut self,
        query: &str,
        params: &[RawValue],
    ) -> Result<Box<dyn Rows + '_>, SourceError> {
        self.executed.push(ExecutedQuery {
            query: query.to_string(),
            params: params.to_vec(),
        });
        let Some(next) = self.expectations.front() else {
            return Err(format!("query `{query}` was not expected").into());
        };
        if !next.pattern.is_match(query) {
            return Err(format!(
                "query `{query}` does not match expected pattern `{}`",
                next.pattern.as_str()
            )
            .into());
        }
        let Some(expectation) = self.expectations.pop_front() else {
            return Err(format!("query `{query}` was not expected").into());
        };
        debug!("Memory source matched `{}`", expectation.pattern.as_str());
        match expectation.outcome {
            Outcome::Error(message) => Err(message.into()),
            Outcome::Rows(rows) => Ok(Box::new(MemoryCursor::new(rows))),
        }
    }
}

struct MemoryCursor {
    columns: Vec<String>,
    rows: vec::IntoIter<Vec<RawValue>>,
    position: usize,
    columns_error: Option<String>,
    row_error: Option<(usize, String)>,
    close_error: Option<String>,
}

impl MemoryCursor {
    fn new(source: MemoryRows) -> Self {
        Self {
            columns: source.columns,
            rows: source.rows.into_iter(),
            position: 0,
            columns_error: source.columns_error,
            row_error: source.row_error,
            close_error: source.close_error,
        }
    }
}

impl Rows for MemoryCursor {
    fn columns(&mut self) -> Result<Vec<String>, SourceError> {
        match self.columns_error.take() {
            Some(message) => Err(message.into()),
            None => Ok(self.columns.clone()),
        }
    }

    fn next_row(&mut self) -> Result<Option<Vec<RawValue>>, SourceError> {
        let fails_here = self
            .row_error
            .as_ref()
            .is_some_and(|(index, _)| *index == self.position);
        if fails_here && let Some((_, message)) = self.row_error.take() {
            return Err(message.into());
        }
        let row = self.rows.next();
        if row.is_some() {
            self.position += 1;
        }
        Ok(row)
    }

    fn take_err(&mut self) -> Option<SourceError> {
        self.close_error.take().map(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_consumes_expectations_in_order() {
        let mut source = MemorySource::new();
        source
            .expect_rows("SELECT id", MemoryRows::new(["id"]).row([1]))
            .unwrap();
        source.expect_error("SELECT", "table does not exist").unwrap();

        let mut rows = source.query("SELECT id FROM t", &[]).unwrap();
        assert_eq!(rows.columns().unwrap(), vec!["id"]);
        assert!(rows.next_row().unwrap().is_some());
        assert!(rows.next_row().unwrap().is_none());
        drop(rows);

        let err = source.query("SELECT * FROM missing", &[]).err().unwrap();
        assert_eq!(err.to_string(), "table does not exist");
        assert!(source.expectations_were_met().is_ok());
        assert_eq!(source.executed().len(), 2);
    }

    #[test]
    fn query_rejects_unmatched_and_unexpected_queries() {
        let mut source = MemorySource::new();
        source
            .expect_rows("^SELECT name", MemoryRows::new(["name"]))
            .unwrap();
        assert!(source.query("DELETE FROM t", &[]).is_err());
        assert!(source.expectations_were_met().is_err());
        assert!(source.query("SELECT name FROM t", &[]).is_ok());
        assert!(source.query("SELECT name FROM t", &[]).is_err());
    }

    #[test]
    fn query_records_parameters() {
        let mut source = MemorySource::new();
        source.expect_rows("WHERE", MemoryRows::new(["id"])).unwrap();
        let _ = source
            .query("SELECT id FROM t WHERE id = $1", &[RawValue::Integer(9)])
            .unwrap();
        assert!(matches!(source.executed()[0].params[0], RawValue::Integer(9)));
    }

    #[test]
    fn cursor_fails_at_configured_row() {
        let mut source = MemorySource::new();
        source
            .expect_rows(
                "",
                MemoryRows::new(["id"]).row([1]).row([2]).row_error(1, "connection reset"),
            )
            .unwrap();
        let mut rows = source.query("SELECT id", &[]).unwrap();
        assert!(rows.next_row().unwrap().is_some());
        let err = rows.next_row().unwrap_err();
        assert_eq!(err.to_string(), "connection reset");
    }

    #[test]
    fn cursor_reports_close_error_once() {
        let mut source = MemorySource::new();
        source
            .expect_rows("", MemoryRows::new(["id"]).close_error("broken pipe"))
            .unwrap();
        let mut rows = source.query("SELECT id", &[]).unwrap();
        assert!(rows.next_row().unwrap().is_none());
        assert!(rows.take_err().is_some());
        assert!(rows.take_err().is_none());
    }
}
