//! Summary assembly
//!
//! Merges whichever categories succeeded into the `health-data.json` document.
//! Missing categories are left out entirely; nothing is filled in with
//! placeholder values.

use std::fs;
use std::path::Path;

use chrono::SecondsFormat;

use crate::config::RunClock;
use crate::error::DigestError;
use crate::sleep::SleepOutput;
use crate::types::{
    ActivityMetrics, DailyStats, HealthSummary, HeartRateMetrics, RunMode, StressMetrics,
    WeeklyTrends,
};

/// Builds a [`HealthSummary`] from per-category results
#[derive(Debug, Clone)]
pub struct SummaryAssembler {
    mode: RunMode,
    clock: RunClock,
    daily: DailyStats,
    weekly: WeeklyTrends,
}

impl SummaryAssembler {
    pub fn new(mode: RunMode, clock: RunClock) -> Self {
        Self {
            mode,
            clock,
            daily: DailyStats {
                date: clock.today.format("%Y-%m-%d").to_string(),
                ..Default::default()
            },
            weekly: WeeklyTrends::default(),
        }
    }

    pub fn add_sleep(&mut self, sleep: SleepOutput) -> &mut Self {
        self.daily.sleep = Some(sleep.daily);
        self.daily.energy = sleep.energy;
        self.weekly.average_sleep_score = sleep.weekly.average_sleep_score;
        self.weekly.average_energy_score = sleep.weekly.average_energy_score;
        self.weekly.average_sleep_duration = sleep.weekly.average_sleep_duration;
        self.weekly.sleep_sessions_analyzed = Some(sleep.weekly.sessions_analyzed);
        self
    }

    pub fn add_heart_rate(&mut self, heart_rate: HeartRateMetrics) -> &mut Self {
        self.daily.heart_rate = Some(heart_rate.daily_block());
        self.weekly.average_resting_hr = Some(heart_rate.weekly_resting_bpm);
        self
    }

    pub fn add_activity(&mut self, activity: ActivityMetrics) -> &mut Self {
        self.daily.activity = Some(activity.daily_block());
        self.weekly.average_steps = activity.weekly_steps;
        self
    }

    pub fn add_stress(&mut self, stress: StressMetrics) -> &mut Self {
        self.daily.stress = Some(stress.daily_block());
        self
    }

    /// Whether any of sleep, energy, heart rate or activity is present.
    /// Stress alone does not make a summary worth publishing.
    pub fn has_data(&self) -> bool {
        self.daily.sleep.is_some()
            || self.daily.energy.is_some()
            || self.daily.heart_rate.is_some()
            || self.daily.activity.is_some()
    }

    /// Final document, or [`DigestError::NoData`] when nothing was gathered
    pub fn assemble(&self) -> Result<HealthSummary, DigestError> {
        if !self.has_data() {
            return Err(DigestError::NoData);
        }
        Ok(HealthSummary {
            last_updated: self.clock.now.to_rfc3339_opts(SecondsFormat::Secs, true),
            data_source: self.mode.data_source().to_string(),
            daily_stats: self.daily.clone(),
            weekly_trends: self.weekly.clone(),
        })
    }
}

/// Write the summary document, replacing any previous file
pub fn write_summary(path: &Path, summary: &HealthSummary) -> Result<(), DigestError> {
    let json = serde_json::to_string_pretty(summary)?;
    fs::write(path, json)?;
    Ok(())
}
