//! Stress level reduction

use crate::trends::rounded_mean;
use crate::types::{StressBlock, StressLevel, StressMetrics};

/// Average the most recent day's stress readings and classify the result.
///
/// `days` is chronological; days without readings are skipped.
pub fn summarize_stress(days: &[Vec<f64>]) -> Option<StressMetrics> {
    let latest = days.iter().rev().find(|d| !d.is_empty())?;
    let average = rounded_mean(latest.iter().copied())?;
    Some(StressMetrics {
        average,
        level: StressLevel::from_average(average),
    })
}

impl StressMetrics {
    pub fn daily_block(&self) -> StressBlock {
        StressBlock {
            average: self.average,
            level: self.level,
        }
    }
}
