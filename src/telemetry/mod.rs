//! # Telemetry Module
//!
//! Handles burst logging to JSONL files with rotation.
//!
//! This module handles:
//! - Recording what each burst carried and how long it took
//! - Formatting as JSONL (JSON Lines)
//! - Writing to rotating log files
//! - Managing file rotation (max N records per file)
//! - Retaining only last M files

pub mod logger;
pub mod types;

pub use logger::BurstLogger;
pub use types::BurstRecord;
