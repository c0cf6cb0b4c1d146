//! Health Digest - Daily health summaries from phone exports and fitness APIs
//!
//! Health Digest turns sleep, heart-rate, activity and stress records into a
//! small JSON document for a static dashboard, through a deterministic pipeline:
//! source adaptation → per-category reduction → summary assembly → output.
//!
//! ## Sources
//!
//! - **CSV exports**: Samsung Health style files, one per category
//! - **Fitness API**: session and bucketed aggregate responses behind [`adapters::FitnessSource`]
//!
//! Every run writes a diagnostics document next to the summary, recording
//! which categories produced data and the errors met on the way.

pub mod activity;
pub mod adapters;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod heart_rate;
pub mod parse;
pub mod pipeline;
pub mod sleep;
pub mod stress;
pub mod summary;
pub mod trends;
pub mod types;

pub use config::{Config, RunClock};
pub use error::DigestError;
pub use pipeline::{run_api, run_csv, DigestProcessor, RunOutcome};

// Adapter exports
pub use adapters::{CsvPaths, FitnessSource, HealthSource, RecordedResponses};

pub use types::{Category, Diagnostics, HealthSummary, RunMode};

/// Crate version, reported by the CLI
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
