//! Service layer for the lookup application.
//!
//! This module contains the business logic for:
//! - Talking to the SOMS endpoint (`SomsClient`)
//! - Pulling ids and names out of response payloads (`extract`)

pub mod extract;
mod soms;

pub use soms::{LookupError, SomsClient, SomsResponse};
