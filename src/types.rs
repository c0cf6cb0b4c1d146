//! Core types for the Health Digest pipeline
//!
//! This module defines the data that flows through each stage: raw records
//! handed over by the sources, per-category derived metrics, and the two output
//! documents (summary and diagnostics).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Metric category, also used as the diagnostics key
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    Sleep,
    HeartRate,
    Activity,
    Stress,
}

impl Category {
    /// JSON key used in `dailyStats` and diagnostics
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Sleep => "sleep",
            Category::HeartRate => "heartRate",
            Category::Activity => "activity",
            Category::Stress => "stress",
        }
    }

    /// Human-readable label used in log lines and error messages
    pub fn label(&self) -> &'static str {
        match self {
            Category::Sleep => "sleep",
            Category::HeartRate => "heart rate",
            Category::Activity => "activity",
            Category::Stress => "stress",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where the raw records came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Manually exported CSV files
    Csv,
    /// Cloud fitness API responses
    Api,
}

impl RunMode {
    /// Value written to `dataSource` in the summary document
    pub fn data_source(&self) -> &'static str {
        match self {
            RunMode::Csv => "Samsung Health CSV",
            RunMode::Api => "Health Connect API",
        }
    }
}

// ---------------------------------------------------------------------------
// Raw records
// ---------------------------------------------------------------------------

/// One sleep session as handed over by a source
#[derive(Debug, Clone, PartialEq)]
pub struct RawSleepSession {
    pub start_time_millis: i64,
    pub end_time_millis: i64,
    /// Explicit deep sleep (hours), when the source reports stages
    pub deep_sleep_hours: Option<f64>,
    /// Explicit REM sleep (hours), when the source reports stages
    pub rem_sleep_hours: Option<f64>,
}

/// One aggregate value inside an activity bucket
#[derive(Debug, Clone, PartialEq)]
pub struct ActivitySample {
    /// Data source identifier, e.g. `derived:com.google.step_count.delta:...`
    pub source_id: String,
    pub int_val: Option<i64>,
    pub fp_val: Option<f64>,
}

/// All samples of one time bucket (one day)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityBucket {
    pub samples: Vec<ActivitySample>,
}

/// Activity metric, classified from a data source identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    Steps,
    Calories,
    ActiveMinutes,
}

impl ActivityKind {
    /// Classify by substring of the source identifier
    pub fn classify(source_id: &str) -> Option<Self> {
        if source_id.contains("step_count") {
            Some(ActivityKind::Steps)
        } else if source_id.contains("calories") {
            Some(ActivityKind::Calories)
        } else if source_id.contains("active_minutes") {
            Some(ActivityKind::ActiveMinutes)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Derived metrics
// ---------------------------------------------------------------------------

/// Energy classification derived from the energy score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnergyLevel {
    Low,
    Moderate,
    Good,
    #[serde(rename = "High Energy")]
    HighEnergy,
}

impl EnergyLevel {
    /// Inclusive thresholds at 80, 70 and 60
    pub fn from_score(score: u8) -> Self {
        if score >= 80 {
            EnergyLevel::HighEnergy
        } else if score >= 70 {
            EnergyLevel::Good
        } else if score >= 60 {
            EnergyLevel::Moderate
        } else {
            EnergyLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EnergyLevel::Low => "Low",
            EnergyLevel::Moderate => "Moderate",
            EnergyLevel::Good => "Good",
            EnergyLevel::HighEnergy => "High Energy",
        }
    }
}

/// Metrics derived from a single sleep session
#[derive(Debug, Clone, PartialEq)]
pub struct SleepMetrics {
    pub duration_hours: f64,
    /// 0-100
    pub sleep_score: u8,
    pub deep_sleep_hours: f64,
    pub rem_sleep_hours: f64,
    /// Never negative
    pub light_sleep_hours: f64,
    /// 0-100
    pub energy_score: u8,
    pub energy_level: EnergyLevel,
}

/// Reduced heart-rate figures for one day
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeartRateDay {
    /// Minimum of the day's samples (proxy for resting HR)
    pub resting: f64,
    pub average: f64,
    pub max: f64,
    pub min: f64,
}

/// Heart-rate category result
#[derive(Debug, Clone, PartialEq)]
pub struct HeartRateMetrics {
    pub resting_bpm: u32,
    pub average_bpm: u32,
    pub max_bpm: u32,
    pub min_bpm: u32,
    /// Rounded mean of each day's resting value
    pub weekly_resting_bpm: u32,
    pub days_analyzed: usize,
}

/// Totals for one activity bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivityDay {
    pub steps: u64,
    pub calories: u64,
    pub active_minutes: u64,
}

/// Activity category result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityMetrics {
    pub steps: u64,
    pub calories: u64,
    pub active_minutes: u64,
    /// Rounded mean of steps across days with steps. `None` when the source
    /// had no step counts to average.
    pub weekly_steps: Option<u64>,
}

/// Stress classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StressLevel {
    Low,
    Medium,
    High,
}

impl StressLevel {
    /// Below 40 is low, below 70 is medium
    pub fn from_average(average: u32) -> Self {
        if average < 40 {
            StressLevel::Low
        } else if average < 70 {
            StressLevel::Medium
        } else {
            StressLevel::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StressLevel::Low => "Low",
            StressLevel::Medium => "Medium",
            StressLevel::High => "High",
        }
    }
}

/// Stress category result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StressMetrics {
    pub average: u32,
    pub level: StressLevel,
}

// ---------------------------------------------------------------------------
// Output document
// ---------------------------------------------------------------------------

/// Daily sleep block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepBlock {
    pub duration: f64,
    pub score: u8,
    pub deep_sleep: f64,
    pub rem_sleep: f64,
    pub light_sleep: f64,
    pub bed_time: String,
    pub wake_time: String,
}

/// Daily energy block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyBlock {
    pub score: u8,
    pub level: EnergyLevel,
}

/// Daily heart-rate block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartRateBlock {
    pub resting: u32,
    pub average: u32,
    pub max: u32,
    pub min: u32,
}

/// Daily activity block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityBlock {
    pub steps: u64,
    pub calories: u64,
    pub active_minutes: u64,
}

/// Daily stress block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressBlock {
    pub average: u32,
    pub level: StressLevel,
}

/// `dailyStats`: one key per category that produced data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep: Option<SleepBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy: Option<EnergyBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<HeartRateBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity: Option<ActivityBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stress: Option<StressBlock>,
}

/// `weeklyTrends`: a field is present only if its source data existed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyTrends {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_sleep_score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_energy_score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_sleep_duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep_sessions_analyzed: Option<usize>,
    #[serde(rename = "averageRestingHR", skip_serializing_if = "Option::is_none")]
    pub average_resting_hr: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_steps: Option<u64>,
}

/// Root artifact written to `health-data.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSummary {
    pub last_updated: String,
    pub data_source: String,
    pub daily_stats: DailyStats,
    pub weekly_trends: WeeklyTrends,
}

/// Side-channel artifact written to `health-data-diagnostics.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    pub run_id: String,
    pub fetch_time: String,
    /// Per-category outcome, API mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_fetched: Option<BTreeMap<Category, bool>>,
    /// Per-category outcome, CSV mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_processed: Option<BTreeMap<Category, bool>>,
    pub errors: Vec<String>,
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_energy_level_thresholds() {
        assert_eq!(EnergyLevel::from_score(100), EnergyLevel::HighEnergy);
        assert_eq!(EnergyLevel::from_score(80), EnergyLevel::HighEnergy);
        assert_eq!(EnergyLevel::from_score(79), EnergyLevel::Good);
        assert_eq!(EnergyLevel::from_score(70), EnergyLevel::Good);
        assert_eq!(EnergyLevel::from_score(69), EnergyLevel::Moderate);
        assert_eq!(EnergyLevel::from_score(60), EnergyLevel::Moderate);
        assert_eq!(EnergyLevel::from_score(59), EnergyLevel::Low);
        assert_eq!(EnergyLevel::from_score(0), EnergyLevel::Low);
    }

    #[test]
    fn test_energy_level_serializes_display_name() {
        let json = serde_json::to_string(&EnergyLevel::HighEnergy).unwrap();
        assert_eq!(json, "\"High Energy\"");
        let json = serde_json::to_string(&EnergyLevel::Moderate).unwrap();
        assert_eq!(json, "\"Moderate\"");
    }

    #[test]
    fn test_stress_level_thresholds() {
        assert_eq!(StressLevel::from_average(39), StressLevel::Low);
        assert_eq!(StressLevel::from_average(40), StressLevel::Medium);
        assert_eq!(StressLevel::from_average(69), StressLevel::Medium);
        assert_eq!(StressLevel::from_average(70), StressLevel::High);
    }

    #[test]
    fn test_activity_kind_classification() {
        assert_eq!(
            ActivityKind::classify("derived:com.google.step_count.delta:com.google.android.gms"),
            Some(ActivityKind::Steps)
        );
        assert_eq!(
            ActivityKind::classify("derived:com.google.calories.expended:merged"),
            Some(ActivityKind::Calories)
        );
        assert_eq!(
            ActivityKind::classify("derived:com.google.active_minutes:merged"),
            Some(ActivityKind::ActiveMinutes)
        );
        assert_eq!(ActivityKind::classify("derived:com.google.distance.delta"), None);
    }

    #[test]
    fn test_absent_categories_have_no_keys() {
        let stats = DailyStats {
            date: "2024-01-15".to_string(),
            activity: Some(ActivityBlock {
                steps: 7000,
                calories: 2100,
                active_minutes: 45,
            }),
            ..Default::default()
        };
        let value = serde_json::to_value(&stats).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 2);
        assert!(value.get("heartRate").is_none());
        assert_eq!(value["activity"]["activeMinutes"], 45);

        let trends = serde_json::to_value(WeeklyTrends {
            average_resting_hr: Some(58),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(trends, serde_json::json!({ "averageRestingHR": 58 }));
    }
}
