//! Duration and time-of-day parsing
//!
//! Exported health data writes durations as `7h 30m`, `45m`, `7:30` or a bare
//! number of minutes, and clock times in either 24-hour or 12-hour notation.
//! The strict parsers return `Result`/`Option`; the `_or_default` variants
//! apply the fallbacks used when building the summary.

use chrono::NaiveTime;

use crate::error::DigestError;
use crate::trends::round_to;

/// Hours assumed when a duration string cannot be parsed
pub const FALLBACK_DURATION_HOURS: f64 = 7.5;

/// Accepted clock time formats, tried in order
const TIME_FORMATS: [&str; 4] = ["%H:%M:%S", "%H:%M", "%I:%M %p", "%I:%M:%S %p"];

/// Parse a duration string into hours, rounded to one decimal.
pub fn parse_duration_hours(input: &str) -> Result<f64, DigestError> {
    let invalid = || DigestError::InvalidDuration(input.to_string());
    let text = input.trim();

    let (hours, minutes) = if let Some((h, rest)) = text.split_once('h') {
        let hours = parse_int(h).ok_or_else(invalid)?;
        let minutes = if rest.contains('m') {
            parse_int(&rest.replace('m', "")).ok_or_else(invalid)?
        } else {
            0
        };
        (hours, minutes)
    } else if text.contains('m') {
        (0, parse_int(&text.replace('m', "")).ok_or_else(invalid)?)
    } else if let Some((h, m)) = text.split_once(':') {
        let hours = parse_int(h).ok_or_else(invalid)?;
        let minutes = parse_int(m).ok_or_else(invalid)?;
        (hours, minutes)
    } else {
        // Bare numbers are minutes
        let minutes: f64 = text.parse().map_err(|_| invalid())?;
        if !minutes.is_finite() {
            return Err(invalid());
        }
        (0, minutes.trunc() as i64)
    };

    Ok(round_to(hours as f64 + minutes as f64 / 60.0, 1))
}

/// Parse a duration, substituting [`FALLBACK_DURATION_HOURS`] on failure.
pub fn duration_hours_or_default(input: &str) -> f64 {
    parse_duration_hours(input).unwrap_or_else(|err| {
        tracing::debug!("{err}, using {FALLBACK_DURATION_HOURS}h");
        FALLBACK_DURATION_HOURS
    })
}

/// Parse a clock time and reformat it as 24-hour `HH:MM`.
pub fn parse_clock_time(input: &str) -> Option<String> {
    let text = input.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(text, fmt).ok())
        .map(|time| time.format("%H:%M").to_string())
}

/// Parse a clock time, returning the input unchanged if no format matches.
pub fn clock_time_or_original(input: &str) -> String {
    parse_clock_time(input).unwrap_or_else(|| input.to_string())
}

fn parse_int(text: &str) -> Option<i64> {
    text.trim().parse().ok()
}
