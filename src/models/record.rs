//! Per-entry result and audit records.

use crate::models::NormalizedPhone;

/// One client record extracted from a SOMS response.
///
/// Fields are populated according to the extraction mode; a row written in
/// `ambos` mode can carry either side empty when the response only yielded
/// ids or only names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedRecord {
    /// Customer id (`DatosSOMS.IdCliente`)
    pub id_cliente: Option<String>,

    /// Composed full name (`Nombre1 Nombre2 Ap-Pat Ap-Mat`)
    pub nombre_completo: Option<String>,
}

/// One audit log row. Exactly one exists per input entry, whatever the
/// outcome.
#[derive(Debug, Clone, Default)]
pub struct LogRow {
    /// Raw input string as read from the file
    pub telefono_raw: String,

    /// Digits extracted from the raw input
    pub telefono_digits: String,

    /// Normalized 11-digit phone (empty when normalization failed)
    pub telefono_11: String,

    /// Area code (empty when normalization failed)
    pub lada: String,

    /// Subscriber number (empty when normalization failed)
    pub telefono_8: String,

    /// Full request URL (empty when no request was attempted)
    pub request_url: String,

    /// HTTP status, when a response arrived
    pub http_status: Option<u16>,

    /// Whether the entry completed without error
    pub ok: bool,

    /// Compact pipe-joined summary of the extracted values
    pub extraidos: String,

    /// Error detail when a stage failed
    pub error: String,
}

impl LogRow {
    /// Start a row for a raw entry and its extracted digits.
    pub fn new(telefono_raw: &str, telefono_digits: &str) -> Self {
        Self {
            telefono_raw: telefono_raw.to_string(),
            telefono_digits: telefono_digits.to_string(),
            ..Self::default()
        }
    }

    /// Record the normalized phone parts.
    pub fn set_phone(&mut self, phone: &NormalizedPhone) {
        self.telefono_11 = phone.telefono_11.clone();
        self.lada = phone.lada.clone();
        self.telefono_8 = phone.telefono_8.clone();
    }
}
