// src/models/mod.rs

//! Domain models for the lookup application.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod phone;
mod record;

// Re-export all public types
pub use config::{
    Config, EndpointConfig, ExtractMode, HttpConfig, InputConfig, InputKind, OutputConfig,
    RunnerConfig,
};
pub use phone::{NormalizedPhone, PhoneRejection, extract_digits, normalize_to_eleven};
pub use record::{ExtractedRecord, LogRow};
