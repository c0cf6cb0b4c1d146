//! Sleep metric derivation
//!
//! Turns raw sleep sessions into duration, stage breakdown, sleep score and
//! energy score, and reduces the most recent sessions into weekly averages.

use chrono::{DateTime, Utc};

use crate::trends::{most_recent, round_to, rounded_mean, rounded_mean_1dp};
use crate::types::{EnergyBlock, EnergyLevel, RawSleepSession, SleepBlock, SleepMetrics};

/// Share of the night assumed to be deep sleep when stages are not reported
pub const DEFAULT_DEEP_RATIO: f64 = 0.20;
/// Share of the night assumed to be REM sleep when stages are not reported
pub const DEFAULT_REM_RATIO: f64 = 0.15;

/// Duration at which the duration component of the score is saturated
const TARGET_SLEEP_HOURS: f64 = 8.0;
const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Sleep calculator for deriving per-session metrics
pub struct SleepCalculator;

impl SleepCalculator {
    /// Derive metrics for one session. Returns `None` when the session has no
    /// positive duration or its timestamps are too far apart to subtract.
    pub fn compute(session: &RawSleepSession) -> Option<SleepMetrics> {
        let span = session
            .end_time_millis
            .checked_sub(session.start_time_millis)?;
        let duration = span as f64 / MILLIS_PER_HOUR;
        if duration <= 0.0 {
            return None;
        }

        let deep = session
            .deep_sleep_hours
            .unwrap_or(duration * DEFAULT_DEEP_RATIO);
        let rem = session.rem_sleep_hours.unwrap_or(duration * DEFAULT_REM_RATIO);
        let light = (duration - deep - rem).max(0.0);

        let sleep_score = compute_sleep_score(duration, deep, rem);
        let energy_score = compute_energy_score(sleep_score, duration);

        Some(SleepMetrics {
            duration_hours: duration,
            sleep_score,
            deep_sleep_hours: deep,
            rem_sleep_hours: rem,
            light_sleep_hours: light,
            energy_score,
            energy_level: EnergyLevel::from_score(energy_score),
        })
    }
}

/// Duration contributes up to 40 points, deep and REM share up to 30 each.
///
/// The deep and REM terms are not capped individually; only the total is
/// clamped to 100.
fn compute_sleep_score(duration: f64, deep: f64, rem: f64) -> u8 {
    let duration_points = (duration / TARGET_SLEEP_HOURS * 40.0).min(40.0);
    let deep_points = deep / duration * 30.0;
    let rem_points = rem / duration * 30.0;
    clamp_score((duration_points + deep_points + rem_points).floor())
}

/// 85% sleep quality plus a duration bonus of up to 15 points at 8 hours
fn compute_energy_score(sleep_score: u8, duration: f64) -> u8 {
    let raw = f64::from(sleep_score) * 0.85 + duration / TARGET_SLEEP_HOURS * 15.0;
    clamp_score(raw.floor())
}

fn clamp_score(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.clamp(0.0, 100.0) as u8
}

/// Weekly averages across the most recent sessions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SleepWeekly {
    pub average_sleep_score: Option<u32>,
    pub average_energy_score: Option<u32>,
    pub average_sleep_duration: Option<f64>,
    pub sessions_analyzed: usize,
}

/// Reduce per-session metrics (chronological) to weekly averages over the
/// last `window` sessions.
pub fn weekly_from_metrics(metrics: &[SleepMetrics], window: usize) -> SleepWeekly {
    let recent = most_recent(metrics, window);
    SleepWeekly {
        average_sleep_score: rounded_mean(recent.iter().map(|m| f64::from(m.sleep_score))),
        average_energy_score: rounded_mean(recent.iter().map(|m| f64::from(m.energy_score))),
        average_sleep_duration: rounded_mean_1dp(recent.iter().map(|m| m.duration_hours)),
        sessions_analyzed: recent.len(),
    }
}

/// Sleep category result, ready to be merged into the summary
#[derive(Debug, Clone, PartialEq)]
pub struct SleepOutput {
    pub daily: SleepBlock,
    pub energy: Option<EnergyBlock>,
    pub weekly: SleepWeekly,
}

/// Process a chronological list of sessions from the fitness API.
///
/// Sessions with no positive duration are skipped. Returns `None` when no
/// session is usable.
pub fn summarize_sessions(sessions: &[RawSleepSession], window: usize) -> Option<SleepOutput> {
    let usable: Vec<(&RawSleepSession, SleepMetrics)> = sessions
        .iter()
        .filter_map(|s| SleepCalculator::compute(s).map(|m| (s, m)))
        .collect();

    let skipped = sessions.len() - usable.len();
    if skipped > 0 {
        tracing::debug!(skipped, "ignored sleep sessions without a positive duration");
    }

    let (latest, latest_metrics) = usable.last()?;
    let metrics: Vec<SleepMetrics> = usable.iter().map(|(_, m)| m.clone()).collect();

    let daily = SleepBlock {
        duration: round_to(latest_metrics.duration_hours, 1),
        score: latest_metrics.sleep_score,
        deep_sleep: round_to(latest_metrics.deep_sleep_hours, 1),
        rem_sleep: round_to(latest_metrics.rem_sleep_hours, 1),
        light_sleep: round_to(latest_metrics.light_sleep_hours, 1),
        bed_time: format_clock(latest.start_time_millis),
        wake_time: format_clock(latest.end_time_millis),
    };

    let energy = EnergyBlock {
        score: latest_metrics.energy_score,
        level: latest_metrics.energy_level,
    };

    Some(SleepOutput {
        daily,
        energy: Some(energy),
        weekly: weekly_from_metrics(&metrics, window),
    })
}

fn format_clock(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|dt| dt.format("%H:%M").to_string())
        .unwrap_or_default()
}
