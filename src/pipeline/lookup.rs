// src/pipeline/lookup.rs

//! Sequential lookup pipeline.
//!
//! One entry is fully resolved (normalize → request → extract → write)
//! before the next begins. Every entry produces exactly one audit row no
//! matter where it stops. The pacing delay runs only after an actual
//! request attempt; phones rejected at normalization move on immediately.

use std::io::Write;
use std::time::Duration;

use serde_json::Value;

use crate::error::Result;
use crate::models::{
    Config, ExtractMode, ExtractedRecord, LogRow, NormalizedPhone, PhoneRejection, extract_digits,
};
use crate::output::{RequestLog, ResultsWriter};
use crate::services::{SomsClient, extract};
use crate::utils::truncate_chars;

/// How many chars of an error body make it into the audit log.
const ERROR_BODY_CHARS: usize = 200;

/// How many `id::name` pairs the audit summary keeps in `ambos` mode.
const SUMMARY_PAIR_CAP: usize = 10;

/// Counters accumulated over one run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    pub entries: usize,
    pub invalid: usize,
    pub requests: usize,
    pub transport_errors: usize,
    pub http_errors: usize,
    pub invalid_json: usize,
    pub ok_no_records: usize,
    pub ok_with_records: usize,
    pub rows_written: usize,
}

impl RunStats {
    /// Entries that completed with `ok=1`.
    pub fn ok_count(&self) -> usize {
        self.ok_no_records + self.ok_with_records
    }

    /// Entries that failed at some stage.
    pub fn failure_count(&self) -> usize {
        self.invalid + self.transport_errors + self.http_errors + self.invalid_json
    }
}

/// Run the lookup over `entries`, strictly in input order.
///
/// Per-entry failures are recorded in the audit log and never abort the
/// run; only sink I/O errors propagate.
pub async fn run_lookup<W1: Write, W2: Write>(
    config: &Config,
    soms: &SomsClient,
    entries: &[String],
    results: &mut ResultsWriter<W1>,
    audit: &mut RequestLog<W2>,
) -> Result<RunStats> {
    let mode = config.extract;
    let delay = Duration::from_secs(config.runner.sleep_secs);
    let total = entries.len();
    let mut stats = RunStats {
        entries: total,
        ..RunStats::default()
    };

    for (idx, raw) in entries.iter().enumerate() {
        let position = idx + 1;
        let digits = extract_digits(raw);
        let mut row = LogRow::new(raw, &digits);

        let Some(phone) = NormalizedPhone::parse(&digits) else {
            row.error = PhoneRejection::classify(digits.len()).to_string();
            audit.append(&row)?;
            stats.invalid += 1;
            // No request was made, so no pacing delay either.
            continue;
        };
        row.set_phone(&phone);

        let url = soms.build_url(&phone);
        row.request_url = url.to_string();
        log::info!("[{position}/{total}] {} -> GET {url}", phone.telefono_11);

        stats.requests += 1;
        match soms.lookup(url).await {
            Err(e) => {
                row.http_status = e.status().map(|s| s.as_u16());
                row.error = format!("{}: {e}", e.class());
                stats.transport_errors += 1;
            }
            Ok(response) if !response.status.is_success() => {
                row.http_status = Some(response.status.as_u16());
                row.error = truncate_chars(&response.body, ERROR_BODY_CHARS).to_string();
                stats.http_errors += 1;
            }
            Ok(response) => {
                row.http_status = Some(response.status.as_u16());
                match serde_json::from_str::<Value>(&response.body) {
                    Err(_) => {
                        row.error = "Respuesta no es JSON".to_string();
                        stats.invalid_json += 1;
                    }
                    Ok(payload) => {
                        let ids = if mode.wants_ids() {
                            extract::extract_id_clientes(&payload)
                        } else {
                            Vec::new()
                        };
                        let names = if mode.wants_names() {
                            extract::extract_names(&payload)
                        } else {
                            Vec::new()
                        };
                        let records = pair_extracted(mode, ids, names);

                        row.ok = true;
                        row.extraidos = summarize(mode, &records);
                        if records.is_empty() {
                            stats.ok_no_records += 1;
                        } else {
                            for record in &records {
                                results.append(raw, &phone, record)?;
                            }
                            stats.rows_written += records.len();
                            stats.ok_with_records += 1;
                        }
                    }
                }
            }
        }

        audit.append(&row)?;
        tokio::time::sleep(delay).await;

        if position % 25 == 0 {
            log::info!("Processed {position} of {total} phones...");
        }
    }

    results.flush()?;
    Ok(stats)
}

/// Join extracted ids and names into output records for the given mode.
///
/// In `ambos` mode equal non-zero counts pair by index. Mismatched but
/// non-empty lists fall back to the full cross-product, over-generating
/// rather than guessing which id goes with which name. One-sided lists
/// leave the other column empty.
pub(crate) fn pair_extracted(
    mode: ExtractMode,
    ids: Vec<String>,
    names: Vec<String>,
) -> Vec<ExtractedRecord> {
    match mode {
        ExtractMode::IdCliente => ids
            .into_iter()
            .map(|id| ExtractedRecord {
                id_cliente: Some(id),
                nombre_completo: None,
            })
            .collect(),
        ExtractMode::Nombre => names
            .into_iter()
            .map(|name| ExtractedRecord {
                id_cliente: None,
                nombre_completo: Some(name),
            })
            .collect(),
        ExtractMode::Ambos => {
            if ids.len() == names.len() && !ids.is_empty() {
                ids.into_iter()
                    .zip(names)
                    .map(|(id, name)| ExtractedRecord {
                        id_cliente: Some(id),
                        nombre_completo: Some(name),
                    })
                    .collect()
            } else if !ids.is_empty() && !names.is_empty() {
                ids.iter()
                    .flat_map(|id| {
                        names.iter().map(move |name| ExtractedRecord {
                            id_cliente: Some(id.clone()),
                            nombre_completo: Some(name.clone()),
                        })
                    })
                    .collect()
            } else if !ids.is_empty() {
                ids.into_iter()
                    .map(|id| ExtractedRecord {
                        id_cliente: Some(id),
                        nombre_completo: None,
                    })
                    .collect()
            } else {
                names
                    .into_iter()
                    .map(|name| ExtractedRecord {
                        id_cliente: None,
                        nombre_completo: Some(name),
                    })
                    .collect()
            }
        }
    }
}

/// Compact human-readable summary of extracted values for the audit log.
fn summarize(mode: ExtractMode, records: &[ExtractedRecord]) -> String {
    match mode {
        ExtractMode::IdCliente => records
            .iter()
            .filter_map(|r| r.id_cliente.as_deref())
            .collect::<Vec<_>>()
            .join("|"),
        ExtractMode::Nombre => records
            .iter()
            .filter_map(|r| r.nombre_completo.as_deref())
            .collect::<Vec<_>>()
            .join("|"),
        ExtractMode::Ambos => records
            .iter()
            .take(SUMMARY_PAIR_CAP)
            .map(|r| {
                format!(
                    "{}::{}",
                    r.id_cliente.as_deref().unwrap_or_default(),
                    r.nombre_completo.as_deref().unwrap_or_default()
                )
            })
            .collect::<Vec<_>>()
            .join("|"),
    }
}
