// src/input.rs

//! Input loading: one raw phone string per entry.
//!
//! Entries come either from a line-delimited text file or from a chosen
//! column of a CSV file. Files are read with lossy UTF-8 so a stray byte
//! in an export never aborts a run.

use std::ffi::OsStr;
use std::fs;
use std::path::Path;

use crate::error::{AppError, Result};
use crate::models::InputKind;

/// Decide how to read the input file.
///
/// An explicit override wins; otherwise a `.csv` extension (any case)
/// selects CSV mode and everything else is treated as plain text.
pub fn detect_input_kind(path: &Path, force: Option<InputKind>) -> InputKind {
    if let Some(kind) = force {
        return kind;
    }
    match path.extension().and_then(OsStr::to_str) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => InputKind::Csv,
        _ => InputKind::Txt,
    }
}

/// Read all raw phone entries from the input file, in file order.
///
/// Trims each value and drops empties. In CSV mode a missing phone column
/// is a fatal configuration error, reported with the headers that do exist.
pub fn read_entries(path: &Path, kind: InputKind, phone_column: &str) -> Result<Vec<String>> {
    let bytes = fs::read(path)?;
    let content = String::from_utf8_lossy(&bytes);
    match kind {
        InputKind::Txt => Ok(read_txt(&content)),
        InputKind::Csv => read_csv(&content, phone_column),
    }
}

fn read_txt(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn read_csv(content: &str, phone_column: &str) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    let Some(column_idx) = headers.iter().position(|h| h == phone_column) else {
        return Err(AppError::config(format!(
            "column '{}' not found in CSV header; available: {}",
            phone_column,
            headers.iter().collect::<Vec<_>>().join(", ")
        )));
    };

    let mut entries = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(value) = record.get(column_idx) {
            let value = value.trim();
            if !value.is_empty() {
                entries.push(value.to_string());
            }
        }
    }
    Ok(entries)
}
