//! Weekly trend reduction
//!
//! Arithmetic means over the most recent daily records, rounded the way the
//! summary document presents them. Rounding is half away from zero.

/// Default number of most recent records a weekly trend covers
pub const DEFAULT_TREND_WINDOW: usize = 7;

/// The last `window` records of a chronologically ordered slice
pub fn most_recent<T>(records: &[T], window: usize) -> &[T] {
    let start = records.len().saturating_sub(window);
    &records[start..]
}

/// Unweighted arithmetic mean, `None` for an empty input
pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let mut sum = 0.0;
    let mut count = 0usize;
    for value in values {
        sum += value;
        count += 1;
    }
    if count == 0 {
        return None;
    }
    Some(sum / count as f64)
}

/// Round to a number of decimal places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Mean rounded to the nearest integer
pub fn rounded_mean<I>(values: I) -> Option<u32>
where
    I: IntoIterator<Item = f64>,
{
    mean(values).map(|m| m.round().max(0.0) as u32)
}

/// Mean rounded to the nearest integer, for counts that can exceed `u32`
pub fn rounded_mean_u64<I>(values: I) -> Option<u64>
where
    I: IntoIterator<Item = f64>,
{
    mean(values).map(|m| m.round().max(0.0) as u64)
}

/// Mean rounded to one decimal place
pub fn rounded_mean_1dp<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    mean(values).map(|m| round_to(m, 1))
}
