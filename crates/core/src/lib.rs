//! Core types for vitalog
//!
//! This crate contains the measurement domain types, the annotation parser,
//! the report aggregator, and the process configuration shared across all
//! other crates.

mod annotation;
mod config;
mod constants;
mod measurement;
mod report;

pub use annotation::*;
pub use config::*;
pub use constants::*;
pub use measurement::*;
pub use report::*;
