//! CSV ingestion and output.
//!
//! Every table enters and leaves the crate through this module:
//!
//! - **Encodings**: input bytes are decoded with `encoding_rs` (the open-data
//!   sources are mostly `windows-1252`); output is re-encoded the same way.
//! - **Delimiters**: `.tsv` paths default to tab, everything else to comma.
//! - **Missing values**: NA tokens become missing cells, then one type is
//!   inferred per column before parsing.
//! - **stdin/stdout**: a `-` path reads from or writes to the standard streams.

use std::{
    fs::File,
    io::{self, BufReader, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8};
use log::debug;

use crate::{
    data::Cell,
    dataset::Table,
    schema::{ColumnType, infer_column_types, parse_cell},
};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    match label {
        Some(value) => Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'")),
        None => Ok(UTF_8),
    }
}

pub fn resolve_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

/// How to decode one input file.
#[derive(Debug, Clone, Copy)]
pub struct ReadOptions {
    pub delimiter: Option<u8>,
    pub encoding: &'static Encoding,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            encoding: UTF_8,
        }
    }
}

impl ReadOptions {
    pub fn new(delimiter: Option<u8>, encoding_label: Option<&str>) -> Result<Self> {
        Ok(Self {
            delimiter,
            encoding: resolve_encoding(encoding_label)?,
        })
    }
}

fn open_input(path: &Path) -> Result<Box<dyn Read>> {
    if is_dash(path) {
        return Ok(Box::new(io::stdin().lock()));
    }
    let file = File::open(path).with_context(|| format!("Opening input file {path:?}"))?;
    Ok(Box::new(BufReader::new(file)))
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

/// Loads a whole CSV file, inferring one [`ColumnType`] per column.
pub fn read_table(path: &Path, options: &ReadOptions) -> Result<Table> {
    let delimiter = resolve_delimiter(path, options.delimiter);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(false)
        .from_reader(open_input(path)?);
    let headers = {
        let raw = reader
            .byte_headers()
            .with_context(|| format!("Reading headers of {path:?}"))?;
        decode_record(raw, options.encoding)?
    };
    let mut records = Vec::new();
    for (line, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Reading row {} of {path:?}", line + 1))?;
        let decoded = decode_record(&record, options.encoding)
            .with_context(|| format!("Decoding row {} of {path:?}", line + 1))?;
        records.push(decoded);
    }
    let types = infer_column_types(headers.len(), &records);
    debug!(
        "Read {} row(s) from {:?} with column types {:?}",
        records.len(),
        path,
        types
    );
    Ok(build_table(headers, &types, records))
}

fn build_table(headers: Vec<String>, types: &[ColumnType], records: Vec<Vec<String>>) -> Table {
    let mut table = Table::new(headers);
    for record in records {
        let row: Vec<Cell> = record
            .iter()
            .zip(types)
            .map(|(raw, ty)| parse_cell(raw, *ty))
            .collect();
        table.push_row(row);
    }
    table
}

/// Writes `table` with every field quoted; missing cells become empty fields.
pub fn write_table(
    path: &Path,
    table: &Table,
    delimiter: Option<u8>,
    encoding: &'static Encoding,
) -> Result<()> {
    let delimiter = resolve_delimiter(path, delimiter);
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Always)
        .double_quote(true)
        .from_writer(Vec::new());
    writer.write_record(table.headers())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(|cell| match cell {
            Some(value) => value.as_display(),
            None => String::new(),
        }))?;
    }
    let utf8 = writer
        .into_inner()
        .map_err(|err| anyhow!("Flushing CSV buffer: {}", err.error()))?;
    let bytes = encode_output(utf8, encoding)?;
    let mut sink: Box<dyn Write> = if is_dash(path) {
        Box::new(io::stdout().lock())
    } else {
        Box::new(File::create(path).with_context(|| format!("Creating output file {path:?}"))?)
    };
    sink.write_all(&bytes)
        .with_context(|| format!("Writing {path:?}"))?;
    sink.flush()?;
    Ok(())
}

fn encode_output(utf8: Vec<u8>, encoding: &'static Encoding) -> Result<Vec<u8>> {
    if encoding == UTF_8 {
        return Ok(utf8);
    }
    let text = String::from_utf8(utf8)?;
    let (encoded, _, had_errors) = encoding.encode(&text);
    if had_errors {
        return Err(anyhow!("Failed to encode text using {}", encoding.name()));
    }
    Ok(encoded.into_owned())
}
