//! Maps rows from a tabular source into self-describing records.
//!
//! Column labels of the form `parent.child` become one level of nested
//! fields. Field types are inferred once from the first row; every record is
//! then read through type-coercing accessors that fall back to zero values
//! instead of failing:
//!
//! ```no_run
//! use dynrow::{query_to_records, source::CsvSource};
//!
//! let mut source = CsvSource::new();
//! let records = query_to_records(&mut source, "pitches.csv", &[])?;
//! for record in &records {
//!     if record.get_bool("active") && record.get_int("facility.year") > 2020 {
//!         println!("{} in {}", record.get_string("title"), record.get_string("address.city"));
//!     }
//! }
//! # Ok::<(), dynrow::MapError>(())
//! ```

pub mod cli;
pub mod columns;
pub mod data;
pub mod error;
pub mod io_utils;
pub mod mapper;
pub mod record;
pub mod rows;
pub mod schema;
pub mod source;
pub mod table;

pub use data::{RawValue, StorableValue, Value};
pub use error::{MapError, SchemaError, SourceError};
pub use mapper::{query_to_records, query_with_schema};
pub use record::Record;
pub use schema::{FieldType, Schema};

use std::{
    env,
    io::{self, Write},
    sync::OnceLock,
};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::{
    cli::{Cli, Commands, RecordFormat, SchemaFormat},
    source::CsvSource,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("dynrow", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Schema(args) => handle_schema(&args),
        Commands::Records(args) => handle_records(&args),
    }
}

fn open_source(args: &cli::SourceArgs) -> Result<CsvSource> {
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    info!(
        "Reading '{}' with delimiter '{}'",
        args.input.display(),
        printable_delimiter(delimiter)
    );
    Ok(CsvSource::new()
        .with_delimiter(delimiter)
        .with_encoding(encoding))
}

fn input_query(args: &cli::SourceArgs) -> Result<String> {
    args.input
        .to_str()
        .map(str::to_string)
        .with_context(|| format!("Input path {:?} is not valid UTF-8", args.input))
}

fn handle_schema(args: &cli::SchemaArgs) -> Result<()> {
    let mut source = open_source(&args.source)?;
    let query = input_query(&args.source)?;
    let (schema, records) = query_with_schema(&mut source, &query, &[])
        .with_context(|| format!("Inferring schema from {:?}", args.source.input))?;
    if records.is_empty() {
        info!("No data rows; every field defaults to text");
    }
    let rendered = match args.format {
        SchemaFormat::Table => table::render_schema(&schema),
        SchemaFormat::Json => {
            let mut json = serde_json::to_string_pretty(schema.as_ref())
                .context("Serializing schema as JSON")?;
            json.push('\n');
            json
        }
        SchemaFormat::Yaml => {
            serde_yaml::to_string(schema.as_ref()).context("Serializing schema as YAML")?
        }
    };
    io::stdout()
        .write_all(rendered.as_bytes())
        .context("Writing schema")?;
    info!("Inferred {} field(s) from {:?}", schema.len(), args.source.input);
    Ok(())
}

fn handle_records(args: &cli::RecordsArgs) -> Result<()> {
    let mut source = open_source(&args.source)?;
    let query = input_query(&args.source)?;
    let (schema, mut records) = query_with_schema(&mut source, &query, &[])
        .with_context(|| format!("Mapping records from {:?}", args.source.input))?;
    if let Some(limit) = args.limit {
        records.truncate(limit);
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.format {
        RecordFormat::Json => {
            for record in &records {
                let line = if args.fields.is_empty() {
                    serde_json::to_string(record)
                } else {
                    let mut selected = serde_json::Map::new();
                    for path in &args.fields {
                        let value = serde_json::to_value(record.get(path).unwrap_or(&Value::Null))
                            .context("Serializing field value")?;
                        selected.insert(path.clone(), value);
                    }
                    serde_json::to_string(&selected)
                }
                .context("Serializing record as JSON")?;
                writeln!(out, "{line}").context("Writing record")?;
            }
        }
        RecordFormat::Table => {
            let paths = if args.fields.is_empty() {
                table::schema_paths(&schema)
            } else {
                args.fields.clone()
            };
            out.write_all(table::render_records(&paths, &records).as_bytes())
                .context("Writing records")?;
        }
    }
    out.flush().context("Flushing output")?;
    info!(
        "Printed {} record(s) from {:?}",
        records.len(),
        args.source.input
    );
    Ok(())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
