//! Pipeline entry point for lookup runs.
//!
//! - `run_lookup`: resolve every input phone against SOMS, in order

pub mod lookup;

pub use lookup::{RunStats, run_lookup};
