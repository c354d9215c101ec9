//! Persisted tab-separated format.
//!
//! Fragments persist as TSV: a header row with the exact post-pivot column
//! names (composite `" ~ "` names included), string-typed key columns, and
//! the empty field for missing cells. Writing then reading back reproduces an
//! equivalent frame modulo Int/Number normalization; this layout is part of
//! the on-disk contract.

use crate::app::models::frame::{Column, Frame};
use crate::app::models::value::Value;
use crate::error::Result;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Declared key layout of a persisted fragment.
///
/// TSV carries no dtype metadata, so the reader is told which columns key the
/// table and which of those must stay string-typed (geographic codes keep
/// their leading zeros; period fields read back numeric).
#[derive(Debug, Clone)]
pub struct KeySpec {
    pub key_columns: Vec<String>,
    pub text_columns: Vec<String>,
}

impl KeySpec {
    pub fn new(key_columns: &[&str], text_columns: &[&str]) -> Self {
        Self {
            key_columns: key_columns.iter().map(|s| s.to_string()).collect(),
            text_columns: text_columns.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Write a frame as tab-separated values
pub fn write_frame<W: Write>(frame: &Frame, writer: W) -> Result<()> {
    let mut out = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(writer);
    out.write_record(frame.column_names())?;
    for row in 0..frame.n_rows() {
        let record: Vec<String> = frame
            .columns()
            .iter()
            .map(|column| column.values[row].render())
            .collect();
        out.write_record(&record)?;
    }
    out.flush()?;
    Ok(())
}

/// Read a frame back from tab-separated values.
///
/// Declared text columns stay strings; other cells coerce to Int, then
/// Number, then fall back to text. Empty fields read as missing.
pub fn read_frame<R: Read>(reader: R, keys: &KeySpec) -> Result<Frame> {
    let mut input = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = input
        .headers()?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut columns: Vec<Column> = headers
        .iter()
        .map(|name| Column::new(name.clone(), Vec::new()))
        .collect();

    for record in input.records() {
        let record = record?;
        for (idx, column) in columns.iter_mut().enumerate() {
            let cell = record.get(idx).unwrap_or("");
            let text = keys.text_columns.iter().any(|t| t == &column.name);
            column.values.push(parse_cell(cell, text));
        }
    }

    let key_columns: Vec<String> = keys
        .key_columns
        .iter()
        .filter(|k| headers.iter().any(|h| &h == k))
        .cloned()
        .collect();

    Frame::from_columns(key_columns, columns)
}

/// Write a frame to a path, creating parent directories as needed
pub fn write_frame_to_path(frame: &Frame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    write_frame(frame, File::create(path)?)
}

/// Read a frame from a path
pub fn read_frame_from_path(path: &Path, keys: &KeySpec) -> Result<Frame> {
    read_frame(File::open(path)?, keys)
}

fn parse_cell(cell: &str, text: bool) -> Value {
    if cell.is_empty() {
        return Value::Missing;
    }
    if text {
        return Value::Text(cell.to_string());
    }
    if let Ok(i) = cell.parse::<i64>() {
        return Value::Int(i);
    }
    if let Ok(n) = cell.parse::<f64>() {
        if n.is_finite() {
            return Value::Number(n);
        }
    }
    Value::Text(cell.to_string())
}
