// src/services/extract.rs

//! Field extraction from SOMS response payloads.
//!
//! The service wraps its matches in `BusquedaClienteResponse.Clientes`, a
//! list of objects each carrying a `DatosSOMS` mapping. None of that shape
//! is guaranteed: every lookup here is checked, and anything missing or
//! mistyped degrades to an empty result instead of an error.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::utils::normalize_spaces;

/// Collect the `DatosSOMS` objects from a response payload.
///
/// Skips list elements that are not objects and elements whose `DatosSOMS`
/// is not an object.
fn extract_clientes(payload: &Value) -> Vec<&Map<String, Value>> {
    let Some(clientes) = payload
        .get("BusquedaClienteResponse")
        .and_then(|r| r.get("Clientes"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    clientes
        .iter()
        .filter_map(|c| c.get("DatosSOMS"))
        .filter_map(Value::as_object)
        .collect()
}

/// Compose a full name from the `Nombre1 Nombre2 Ap-Pat Ap-Mat` fields.
///
/// Each field is whitespace-collapsed independently; empty fields are left
/// out of the join.
fn build_full_name(datos: &Map<String, Value>) -> String {
    ["Nombre1", "Nombre2", "Ap-Pat", "Ap-Mat"]
        .iter()
        .filter_map(|key| datos.get(*key).and_then(Value::as_str))
        .map(normalize_spaces)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extract `IdCliente` values in first-seen order, de-duplicated exactly.
pub fn extract_id_clientes(payload: &Value) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut ids = Vec::new();
    for datos in extract_clientes(payload) {
        let Some(id) = datos.get("IdCliente").and_then(Value::as_str) else {
            continue;
        };
        let id = normalize_spaces(id);
        if !id.is_empty() && seen.insert(id.clone()) {
            ids.push(id);
        }
    }
    ids
}

/// Extract composed full names in first-seen order, de-duplicated
/// case-insensitively (original casing of the first occurrence wins).
pub fn extract_names(payload: &Value) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for datos in extract_clientes(payload) {
        let name = build_full_name(datos);
        if !name.is_empty() && seen.insert(name.to_lowercase()) {
            names.push(name);
        }
    }
    names
}
