// src/lib.rs

//! SOMS batch phone lookup library

pub mod error;
pub mod input;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod services;
pub mod utils;
