// src/output.rs

//! CSV output sinks: the results table and the per-request audit log.
//!
//! Both files get their header row up front. The results schema depends on
//! the extraction mode and is decided once at construction, never per row.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::Writer;

use crate::error::Result;
use crate::models::{ExtractMode, ExtractedRecord, LogRow, NormalizedPhone};

/// Fixed column set of the audit log.
const LOG_COLUMNS: [&str; 10] = [
    "telefono_raw",
    "telefono_digits",
    "telefono_11",
    "lada",
    "telefono_8",
    "request_url",
    "http_status",
    "ok",
    "extraidos",
    "error",
];

/// Results sink: one row per extracted record.
pub struct ResultsWriter<W: Write> {
    writer: Writer<W>,
    mode: ExtractMode,
}

impl ResultsWriter<File> {
    /// Create (truncate) the results file at `path`.
    pub fn create(path: &Path, mode: ExtractMode) -> Result<Self> {
        Self::from_writer(File::create(path)?, mode)
    }
}

impl<W: Write> ResultsWriter<W> {
    /// Wrap a sink and write the mode-dependent header immediately.
    pub fn from_writer(inner: W, mode: ExtractMode) -> Result<Self> {
        let mut writer = Writer::from_writer(inner);
        writer.write_record(mode.result_columns())?;
        Ok(Self { writer, mode })
    }

    /// Append one extracted record joined with its originating phone.
    pub fn append(
        &mut self,
        raw: &str,
        phone: &NormalizedPhone,
        record: &ExtractedRecord,
    ) -> Result<()> {
        let mut row = vec![
            raw.to_string(),
            phone.telefono_11.clone(),
            phone.lada.clone(),
            phone.telefono_8.clone(),
        ];
        if self.mode.wants_ids() {
            row.push(record.id_cliente.clone().unwrap_or_default());
        }
        if self.mode.wants_names() {
            row.push(record.nombre_completo.clone().unwrap_or_default());
        }
        self.writer.write_record(&row)?;
        Ok(())
    }

    /// Flush buffered rows to the underlying sink.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Audit log sink: exactly one row per input entry.
///
/// Flushed after every row so a partial log survives an interrupted run.
pub struct RequestLog<W: Write> {
    writer: Writer<W>,
}

impl RequestLog<File> {
    /// Create (truncate) the audit log file at `path`.
    pub fn create(path: &Path) -> Result<Self> {
        Self::from_writer(File::create(path)?)
    }
}

impl<W: Write> RequestLog<W> {
    /// Wrap a sink and write the fixed header immediately.
    pub fn from_writer(inner: W) -> Result<Self> {
        let mut writer = Writer::from_writer(inner);
        writer.write_record(LOG_COLUMNS)?;
        writer.flush()?;
        Ok(Self { writer })
    }

    /// Append one audit row.
    pub fn append(&mut self, row: &LogRow) -> Result<()> {
        let status = row.http_status.map(|s| s.to_string()).unwrap_or_default();
        self.writer.write_record([
            row.telefono_raw.as_str(),
            row.telefono_digits.as_str(),
            row.telefono_11.as_str(),
            row.lada.as_str(),
            row.telefono_8.as_str(),
            row.request_url.as_str(),
            status.as_str(),
            if row.ok { "1" } else { "0" },
            row.extraidos.as_str(),
            row.error.as_str(),
        ])?;
        self.writer.flush()?;
        Ok(())
    }
}
