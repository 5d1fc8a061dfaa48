//! Phone number normalization.
//!
//! SOMS keys lookups on an 11-digit phone number split into a 3-digit lada
//! (area code) and an 8-digit subscriber number. Input files carry phones as
//! free text (`"55 1234-5678"`, `"(81) 8123 4567"`, ...); this module
//! reduces them to digits and applies the normalization rule:
//!
//! - 11 digits: taken as-is
//! - 10 digits: a single leading `'0'` is prepended
//! - any other length: rejected

use thiserror::Error;

/// Strip every non-digit character, preserving digit order.
pub fn extract_digits(text: &str) -> String {
    text.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Normalize a digit string to exactly 11 digits.
pub fn normalize_to_eleven(digits: &str) -> Option<String> {
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match digits.len() {
        11 => Some(digits.to_string()),
        10 => Some(format!("0{digits}")),
        _ => None,
    }
}

/// A phone number normalized to the 11-digit form SOMS expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPhone {
    /// Full 11-digit number
    pub telefono_11: String,

    /// Area code, first 3 digits
    pub lada: String,

    /// Subscriber number, last 8 digits
    pub telefono_8: String,
}

impl NormalizedPhone {
    /// Parse a digit string into its normalized parts.
    ///
    /// Returns `None` unless the input is a 10- or 11-digit string.
    pub fn parse(digits: &str) -> Option<Self> {
        let telefono_11 = normalize_to_eleven(digits)?;
        let lada = telefono_11[..3].to_string();
        let telefono_8 = telefono_11[3..].to_string();
        Some(Self {
            telefono_11,
            lada,
            telefono_8,
        })
    }
}

/// Why a phone entry was rejected before any request was made.
///
/// Classification looks only at the digit count of the raw entry, never at
/// the normalization routine itself. The rendered messages are the audit-log
/// contract and must stay stable.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhoneRejection {
    /// Fewer than 10 digits
    #[error("SKIPPED: telefono invalido (<10 digitos)")]
    TooShort,

    /// 10 or 11 digits that still failed to normalize. Unreachable under the
    /// current rules (every 10- or 11-digit string normalizes); the bucket is
    /// kept for stricter future rules.
    #[error("SKIPPED: telefono invalido (no se pudo normalizar)")]
    Unnormalizable,

    /// More than 11 digits
    #[error("SKIPPED: telefono invalido (>11 digitos)")]
    TooLong,
}

impl PhoneRejection {
    /// Classify a rejection from the raw digit count.
    pub fn classify(digit_count: usize) -> Self {
        if digit_count < 10 {
            Self::TooShort
        } else if digit_count <= 11 {
            Self::Unnormalizable
        } else {
            Self::TooLong
        }
    }
}
