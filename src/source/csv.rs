//! CSV files as a data source.
//!
//! The query text is the path of the file to read (`-` reads standard input).
//! The header row supplies the column labels, so dotted headers such as
//! `address.city` produce nested groups. Every field arrives as an untyped
//! blob and goes through inference like a text-protocol SQL driver's output.

use std::{io::Read, path::Path};

use anyhow::Context;
use encoding_rs::{Encoding, UTF_8};
use log::debug;

use super::{DataSource, Rows};
use crate::{data::RawValue, error::SourceError, io_utils};

#[derive(Debug, Clone)]
pub struct CsvSource {
    delimiter: Option<u8>,
    encoding: &'static Encoding,
}

impl Default for CsvSource {
    fn default() -> Self {
        Self {
            delimiter: None,
            encoding: UTF_8,
        }
    }
}

impl CsvSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the delimiter otherwise picked from the file extension.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }
}

impl DataSource for CsvSource {
    fn query(
        &mut self,
        query: &str,
        params: &[RawValue],
    ) -> Result<Box<dyn Rows + '_>, SourceError> {
        if !params.is_empty() {
            return Err(format!(
                "CSV source does not accept parameters ({} given)",
                params.len()
            )
            .into());
        }
        let path = Path::new(query.trim());
        let delimiter = io_utils::resolve_input_delimiter(path, self.delimiter);
        debug!(
            "Opening {:?} with delimiter '{}' and encoding {}",
            path,
            crate::printable_delimiter(delimiter),
            self.encoding.name()
        );
        let reader = io_utils::open_csv_reader_from_path(path, delimiter)?;
        Ok(Box::new(CsvCursor {
            reader,
            encoding: self.encoding,
            record: csv::ByteRecord::new(),
            line: 1,
        }))
    }
}

struct CsvCursor {
    reader: csv::Reader<Box<dyn Read>>,
    encoding: &'static Encoding,
    record: csv::ByteRecord,
    line: usize,
}

impl Rows for CsvCursor {
    fn columns(&mut self) -> Result<Vec<String>, SourceError> {
        let headers =
            io_utils::reader_headers(&mut self.reader, self.encoding).context("Reading header row")?;
        Ok(headers)
    }

    fn next_row(&mut self) -> Result<Option<Vec<RawValue>>, SourceError> {
        let has_row = self
            .reader
            .read_byte_record(&mut self.record)
            .with_context(|| format!("Reading line {}", self.line + 1))?;
        if !has_row {
            return Ok(None);
        }
        self.line += 1;
        let decoded = io_utils::decode_record(&self.record, self.encoding)
            .with_context(|| format!("Decoding line {}", self.line))?;
        let values = decoded
            .into_iter()
            .map(|field| {
                if field.is_empty() {
                    RawValue::Null
                } else {
                    RawValue::Bytes(field.into_bytes())
                }
            })
            .collect();
        Ok(Some(values))
    }
}
