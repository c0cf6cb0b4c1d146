//! Heart-rate aggregation
//!
//! Reduces per-day bpm samples to resting/average/max/min and a weekly resting
//! average. "Resting" here is the lowest sample of the day.

use crate::trends::{mean, most_recent, rounded_mean};
use crate::types::{HeartRateBlock, HeartRateDay, HeartRateMetrics};

/// Samples at or below this value are discarded as implausible
pub const MIN_PLAUSIBLE_BPM: f64 = 30.0;
/// Samples at or above this value are discarded as implausible
pub const MAX_PLAUSIBLE_BPM: f64 = 220.0;

/// How raw samples are screened before reduction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFilter {
    /// Keep only values strictly between 30 and 220 bpm
    PlausibleRange,
    /// Keep every value
    None,
}

impl SampleFilter {
    fn accepts(&self, bpm: f64) -> bool {
        match self {
            SampleFilter::PlausibleRange => bpm > MIN_PLAUSIBLE_BPM && bpm < MAX_PLAUSIBLE_BPM,
            SampleFilter::None => bpm.is_finite(),
        }
    }
}

/// Heart-rate aggregator
pub struct HeartRateAggregator {
    filter: SampleFilter,
    window: usize,
}

impl HeartRateAggregator {
    pub fn new(filter: SampleFilter, window: usize) -> Self {
        Self { filter, window }
    }

    /// Reduce one day's samples. Returns `None` if no sample survives the filter.
    pub fn reduce_day(&self, samples: &[f64]) -> Option<HeartRateDay> {
        let valid: Vec<f64> = samples
            .iter()
            .copied()
            .filter(|bpm| self.filter.accepts(*bpm))
            .collect();

        let average = mean(valid.iter().copied())?;
        let min = valid.iter().copied().fold(f64::INFINITY, f64::min);
        let max = valid.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Some(HeartRateDay {
            resting: min,
            average,
            max,
            min,
        })
    }

    /// Aggregate chronologically ordered day buckets.
    ///
    /// Days without a valid sample are dropped. Returns `None` when every day
    /// drops, which callers must treat as "no data" rather than zero.
    pub fn aggregate(&self, buckets: &[Vec<f64>]) -> Option<HeartRateMetrics> {
        let days: Vec<HeartRateDay> = buckets.iter().filter_map(|b| self.reduce_day(b)).collect();
        let recent = most_recent(&days, self.window);
        let latest = recent.last()?;

        let weekly_resting = rounded_mean(recent.iter().map(|d| d.resting))?;

        Some(HeartRateMetrics {
            resting_bpm: to_bpm(latest.resting),
            average_bpm: to_bpm(latest.average),
            max_bpm: to_bpm(latest.max),
            min_bpm: to_bpm(latest.min),
            weekly_resting_bpm: weekly_resting,
            days_analyzed: recent.len(),
        })
    }
}

impl HeartRateMetrics {
    /// Daily block for the summary document
    pub fn daily_block(&self) -> HeartRateBlock {
        HeartRateBlock {
            resting: self.resting_bpm,
            average: self.average_bpm,
            max: self.max_bpm,
            min: self.min_bpm,
        }
    }
}

fn to_bpm(value: f64) -> u32 {
    value.round().max(0.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api() -> HeartRateAggregator {
        HeartRateAggregator::new(SampleFilter::PlausibleRange, 7)
    }

    #[test]
    fn test_boundary_values() {
        let day = api().reduce_day(&[30.0, 31.0, 219.0, 220.0]).unwrap();
        assert_eq!(day.min, 31.0);
        assert_eq!(day.max, 219.0);
        assert_eq!(day.resting, 31.0);
        assert_eq!(day.average, 125.0);
    }

    #[test]
    fn test_day_without_valid_samples_is_dropped() {
        assert!(api().reduce_day(&[12.0, 250.0]).is_none());
        assert!(api().reduce_day(&[]).is_none());

        let metrics = api()
            .aggregate(&[vec![60.0, 70.0], vec![10.0], vec![]])
            .unwrap();
        assert_eq!(metrics.days_analyzed, 1);
        assert_eq!(metrics.resting_bpm, 60);
    }

    #[test]
    fn test_all_days_invalid_means_no_data() {
        assert!(api().aggregate(&[vec![300.0], vec![5.0, 30.0]]).is_none());
        assert!(api().aggregate(&[]).is_none());
    }

    #[test]
    fn test_latest_day_is_daily_summary() {
        let metrics = api()
            .aggregate(&[vec![55.0, 90.0], vec![62.0, 70.0, 141.0]])
            .unwrap();
        assert_eq!(metrics.resting_bpm, 62);
        assert_eq!(metrics.min_bpm, 62);
        assert_eq!(metrics.max_bpm, 141);
        assert_eq!(metrics.average_bpm, 91);
    }

    #[test]
    fn test_weekly_resting_is_mean_of_daily_minimums() {
        // Daily minimums 50, 60, 61 -> 57; the mean of all raw samples would be far higher
        let metrics = api()
            .aggregate(&[
                vec![50.0, 150.0],
                vec![60.0, 160.0],
                vec![61.0, 170.0],
            ])
            .unwrap();
        assert_eq!(metrics.weekly_resting_bpm, 57);
        assert_eq!(metrics.days_analyzed, 3);
    }

    #[test]
    fn test_fractional_samples_round_after_aggregation() {
        // 72.9 is kept as-is through the reduction, not cut to 72
        let metrics = api().aggregate(&[vec![72.9, 72.9]]).unwrap();
        assert_eq!(metrics.average_bpm, 73);
        assert_eq!(metrics.resting_bpm, 73);
        assert_eq!(metrics.weekly_resting_bpm, 73);
    }

    #[test]
    fn test_unfiltered_keeps_out_of_range_values() {
        let csv = HeartRateAggregator::new(SampleFilter::None, 7);
        let metrics = csv.aggregate(&[vec![25.0, 230.0]]).unwrap();
        assert_eq!(metrics.min_bpm, 25);
        assert_eq!(metrics.max_bpm, 230);
    }
}
