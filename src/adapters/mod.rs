//! Health data sources
//!
//! This module provides adapters that read raw records from a source (CSV
//! exports or fitness API responses) and reduce them into per-category metrics.
//! Each category is read independently so that one failing category never
//! affects the others.

mod csv_export;
mod fitness_api;
mod recorded;

pub use csv_export::{CsvExportSource, CsvPaths, CsvRow, CsvTable};
pub use fitness_api::{
    AggregateBy, AggregateRequest, ApiSource, BucketByTime, FitnessApiAdapter, FitnessSource,
    SessionQuery, TimeRange, SLEEP_ACTIVITY_TYPE,
};
pub use recorded::RecordedResponses;

use crate::error::DigestError;
use crate::sleep::SleepOutput;
use crate::types::{ActivityMetrics, Category, HeartRateMetrics, RunMode, StressMetrics};

/// Trait for sources the pipeline can draw a digest from
pub trait HealthSource {
    /// Which kind of source this is
    fn mode(&self) -> RunMode;

    /// Categories this source will attempt, in processing order
    fn categories(&self) -> Vec<Category>;

    /// Latest sleep record plus weekly sleep averages
    fn sleep(&self, window: usize) -> Result<SleepOutput, DigestError>;

    /// Latest day's heart rate plus weekly resting average
    fn heart_rate(&self, window: usize) -> Result<HeartRateMetrics, DigestError>;

    /// Latest day's activity totals plus weekly step average
    fn activity(&self, window: usize) -> Result<ActivityMetrics, DigestError>;

    /// Latest day's stress average
    fn stress(&self) -> Result<StressMetrics, DigestError>;
}
