//! Run configuration

use std::path::PathBuf;

use chrono::{DateTime, Local, NaiveDate, Utc};

use crate::error::DigestError;
use crate::trends::DEFAULT_TREND_WINDOW;

pub const DEFAULT_OUTPUT_PATH: &str = "health-data.json";
pub const DEFAULT_DIAGNOSTICS_PATH: &str = "health-data-diagnostics.json";
pub const DEFAULT_LOOKBACK_DAYS: u32 = 7;
/// Longest history that may be requested from the fitness API
pub const MAX_LOOKBACK_DAYS: u32 = 3650;

/// Output locations and reduction windows
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub output_path: PathBuf,
    pub diagnostics_path: PathBuf,
    /// Number of most recent records a weekly trend covers
    pub trend_window: usize,
    /// Days of history requested from the fitness API
    pub lookback_days: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            diagnostics_path: PathBuf::from(DEFAULT_DIAGNOSTICS_PATH),
            trend_window: DEFAULT_TREND_WINDOW,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, DigestError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Read configuration through the provided lookup, so tests don't need to
    /// touch the process environment.
    pub fn from_env_with<F>(mut get: F) -> Result<Self, DigestError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(path) = get("HEALTH_DIGEST_OUTPUT") {
            config.output_path = PathBuf::from(path);
        }
        if let Some(path) = get("HEALTH_DIGEST_DIAGNOSTICS") {
            config.diagnostics_path = PathBuf::from(path);
        }
        if let Some(window) = get("HEALTH_DIGEST_TREND_WINDOW") {
            config.trend_window = parse_positive("HEALTH_DIGEST_TREND_WINDOW", &window)?;
        }
        if let Some(days) = get("HEALTH_DIGEST_LOOKBACK_DAYS") {
            config.lookback_days = parse_positive("HEALTH_DIGEST_LOOKBACK_DAYS", &days)?;
            if config.lookback_days > MAX_LOOKBACK_DAYS {
                return Err(DigestError::Config(format!(
                    "HEALTH_DIGEST_LOOKBACK_DAYS must be at most {MAX_LOOKBACK_DAYS}, got {days:?}"
                )));
            }
        }
        Ok(config)
    }
}

fn parse_positive<T>(key: &str, value: &str) -> Result<T, DigestError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match value.trim().parse::<T>() {
        Ok(n) if n > T::default() => Ok(n),
        _ => Err(DigestError::Config(format!(
            "{key} must be a positive integer, got {value:?}"
        ))),
    }
}

/// Time of the run, fixed once so every timestamp in the outputs agrees
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunClock {
    pub now: DateTime<Utc>,
    /// Local calendar date written to `dailyStats.date`
    pub today: NaiveDate,
}

impl RunClock {
    pub fn system() -> Self {
        Self {
            now: Utc::now(),
            today: Local::now().date_naive(),
        }
    }

    pub fn fixed(now: DateTime<Utc>, today: NaiveDate) -> Self {
        Self { now, today }
    }
}
