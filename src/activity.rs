//! Activity aggregation
//!
//! Sums per-bucket step, calorie and active-minute samples into daily totals
//! and a weekly step average.

use crate::trends::{most_recent, rounded_mean_u64};
use crate::types::{ActivityBlock, ActivityBucket, ActivityDay, ActivityKind, ActivityMetrics};

/// Activity aggregator
pub struct ActivityAggregator {
    window: usize,
}

impl ActivityAggregator {
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    /// Sum one bucket's samples by kind. Calories are truncated per sample.
    pub fn reduce_bucket(bucket: &ActivityBucket) -> ActivityDay {
        let mut day = ActivityDay::default();
        for sample in &bucket.samples {
            match ActivityKind::classify(&sample.source_id) {
                Some(ActivityKind::Steps) => day.steps += non_negative(sample.int_val),
                Some(ActivityKind::Calories) => {
                    day.calories += sample.fp_val.map(|v| v.trunc().max(0.0) as u64).unwrap_or(0)
                }
                Some(ActivityKind::ActiveMinutes) => {
                    day.active_minutes += non_negative(sample.int_val)
                }
                None => {}
            }
        }
        day
    }

    /// Aggregate chronologically ordered buckets.
    ///
    /// A day counts only when it has steps or calories; a day with nothing but
    /// active minutes is dropped. Returns `None` when no day counts.
    pub fn aggregate(&self, buckets: &[ActivityBucket]) -> Option<ActivityMetrics> {
        let days: Vec<ActivityDay> = buckets
            .iter()
            .map(Self::reduce_bucket)
            .filter(|d| d.steps > 0 || d.calories > 0)
            .collect();
        let recent = most_recent(&days, self.window);
        let latest = recent.last()?;

        // Bucketed data always reports a weekly figure, 0 when no day had steps
        let weekly_steps = rounded_mean_u64(
            recent
                .iter()
                .filter(|d| d.steps > 0)
                .map(|d| d.steps as f64),
        )
        .unwrap_or(0);

        Some(ActivityMetrics {
            steps: latest.steps,
            calories: latest.calories,
            active_minutes: latest.active_minutes,
            weekly_steps: Some(weekly_steps),
        })
    }
}

impl ActivityMetrics {
    /// Daily block for the summary document
    pub fn daily_block(&self) -> ActivityBlock {
        ActivityBlock {
            steps: self.steps,
            calories: self.calories,
            active_minutes: self.active_minutes,
        }
    }
}

fn non_negative(value: Option<i64>) -> u64 {
    value.map(|v| v.max(0) as u64).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ActivitySample;

    const STEPS: &str = "derived:com.google.step_count.delta:com.google.android.gms:merge_step_deltas";
    const CALORIES: &str = "derived:com.google.calories.expended:com.google.android.gms:merged";
    const ACTIVE: &str = "derived:com.google.active_minutes:com.google.android.gms:merged";

    fn int_sample(source: &str, v: i64) -> ActivitySample {
        ActivitySample {
            source_id: source.to_string(),
            int_val: Some(v),
            fp_val: None,
        }
    }

    fn fp_sample(source: &str, v: f64) -> ActivitySample {
        ActivitySample {
            source_id: source.to_string(),
            int_val: None,
            fp_val: Some(v),
        }
    }

    fn bucket(samples: Vec<ActivitySample>) -> ActivityBucket {
        ActivityBucket { samples }
    }

    #[test]
    fn test_reduce_bucket_sums_by_kind() {
        let day = ActivityAggregator::reduce_bucket(&bucket(vec![
            int_sample(STEPS, 4000),
            int_sample(STEPS, 2500),
            fp_sample(CALORIES, 1200.9),
            fp_sample(CALORIES, 800.6),
            int_sample(ACTIVE, 25),
            int_sample("derived:com.google.distance.delta", 9999),
        ]));
        assert_eq!(day.steps, 6500);
        // Truncated per sample: 1200 + 800
        assert_eq!(day.calories, 2000);
        assert_eq!(day.active_minutes, 25);
    }

    #[test]
    fn test_active_minutes_only_day_is_dropped() {
        let agg = ActivityAggregator::new(7);
        let metrics = agg
            .aggregate(&[
                bucket(vec![int_sample(STEPS, 8000)]),
                bucket(vec![int_sample(ACTIVE, 40)]),
            ])
            .unwrap();
        assert_eq!(metrics.steps, 8000);
        assert_eq!(metrics.active_minutes, 0);

        assert!(agg.aggregate(&[bucket(vec![int_sample(ACTIVE, 40)])]).is_none());
    }

    #[test]
    fn test_weekly_steps_ignores_calorie_only_days() {
        let agg = ActivityAggregator::new(7);
        let metrics = agg
            .aggregate(&[
                bucket(vec![int_sample(STEPS, 5000)]),
                bucket(vec![fp_sample(CALORIES, 1800.0)]),
                bucket(vec![int_sample(STEPS, 7000), int_sample(ACTIVE, 30)]),
            ])
            .unwrap();
        assert_eq!(metrics.steps, 7000);
        assert_eq!(metrics.active_minutes, 30);
        assert_eq!(metrics.weekly_steps, Some(6000));
    }

    #[test]
    fn test_weekly_steps_beyond_u32() {
        let metrics = ActivityAggregator::new(7)
            .aggregate(&[
                bucket(vec![int_sample(STEPS, 6_000_000_000)]),
                bucket(vec![int_sample(STEPS, 6_000_000_002)]),
            ])
            .unwrap();
        assert_eq!(metrics.steps, 6_000_000_002);
        assert_eq!(metrics.weekly_steps, Some(6_000_000_001));
    }

    #[test]
    fn test_weekly_steps_zero_without_step_days() {
        let metrics = ActivityAggregator::new(7)
            .aggregate(&[bucket(vec![fp_sample(CALORIES, 1800.0)])])
            .unwrap();
        assert_eq!(metrics.steps, 0);
        assert_eq!(metrics.calories, 1800);
        assert_eq!(metrics.weekly_steps, Some(0));
    }
}
