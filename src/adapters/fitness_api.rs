//! Fitness REST API adapter
//!
//! Builds the session and aggregate queries, and decodes the session list and
//! bucketed aggregate responses into raw records. Transport and credentials
//! belong to the [`FitnessSource`] implementation.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::HealthSource;
use crate::activity::ActivityAggregator;
use crate::error::DigestError;
use crate::heart_rate::{HeartRateAggregator, SampleFilter};
use crate::sleep::{summarize_sessions, SleepOutput};
use crate::types::{
    ActivityBucket, ActivityMetrics, ActivitySample, Category, HeartRateMetrics, RawSleepSession,
    RunMode, StressMetrics,
};

/// Activity type the sessions endpoint uses for sleep
pub const SLEEP_ACTIVITY_TYPE: u32 = 72;

/// One-day bucket width for aggregate queries
pub const DAY_MILLIS: i64 = 86_400_000;

pub const HEART_RATE_DATA_TYPE: &str = "com.google.heart_rate.bpm";
pub const STEP_COUNT_DATA_TYPE: &str = "com.google.step_count.delta";
pub const CALORIES_DATA_TYPE: &str = "com.google.calories.expended";
pub const ACTIVE_MINUTES_DATA_TYPE: &str = "com.google.active_minutes";

/// Query window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// The `days` days leading up to `end`. Fails when the start would fall
    /// outside the representable time range.
    pub fn last_days(end: DateTime<Utc>, days: u32) -> Result<Self, DigestError> {
        let start = Duration::try_days(i64::from(days))
            .and_then(|span| end.checked_sub_signed(span))
            .ok_or_else(|| {
                DigestError::Config(format!("lookback of {days} days is out of range"))
            })?;
        Ok(Self { start, end })
    }
}

/// Query parameters for the sessions endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionQuery {
    pub start_time: String,
    pub end_time: String,
    pub activity_type: u32,
}

impl SessionQuery {
    /// Sleep sessions within a window
    pub fn sleep(range: TimeRange) -> Self {
        Self {
            start_time: range.start.to_rfc3339_opts(SecondsFormat::Millis, true),
            end_time: range.end.to_rfc3339_opts(SecondsFormat::Millis, true),
            activity_type: SLEEP_ACTIVITY_TYPE,
        }
    }
}

/// Body of an aggregate dataset request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateRequest {
    pub aggregate_by: Vec<AggregateBy>,
    pub bucket_by_time: BucketByTime,
    pub start_time_millis: i64,
    pub end_time_millis: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateBy {
    pub data_type_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketByTime {
    pub duration_millis: i64,
}

impl AggregateRequest {
    /// Daily buckets of the given data types over a window
    pub fn daily(data_types: &[&str], range: TimeRange) -> Self {
        Self {
            aggregate_by: data_types
                .iter()
                .map(|name| AggregateBy {
                    data_type_name: name.to_string(),
                })
                .collect(),
            bucket_by_time: BucketByTime {
                duration_millis: DAY_MILLIS,
            },
            start_time_millis: range.start.timestamp_millis(),
            end_time_millis: range.end.timestamp_millis(),
        }
    }

    pub fn heart_rate(range: TimeRange) -> Self {
        Self::daily(&[HEART_RATE_DATA_TYPE], range)
    }

    pub fn activity(range: TimeRange) -> Self {
        Self::daily(
            &[
                STEP_COUNT_DATA_TYPE,
                CALORIES_DATA_TYPE,
                ACTIVE_MINUTES_DATA_TYPE,
            ],
            range,
        )
    }

    /// Whether this request asks for heart-rate data
    pub fn is_heart_rate(&self) -> bool {
        self.aggregate_by
            .iter()
            .any(|a| a.data_type_name == HEART_RATE_DATA_TYPE)
    }
}

/// The remote fitness service, as seen by the digest
///
/// Implementations own authentication and transport and hand back the raw
/// response bodies.
pub trait FitnessSource {
    /// Establish an authenticated session. Failure is fatal for the run.
    fn connect(&mut self) -> Result<(), DigestError>;

    /// Raw body of a sessions list response
    fn sleep_sessions(&self, query: &SessionQuery) -> Result<String, DigestError>;

    /// Raw body of an aggregate dataset response
    fn aggregate(&self, request: &AggregateRequest) -> Result<String, DigestError>;
}

/// Decoder for fitness API response bodies
pub struct FitnessApiAdapter;

impl FitnessApiAdapter {
    /// Decode a sessions response into chronologically ordered sessions
    pub fn parse_sessions(raw_json: &str) -> Result<Vec<RawSleepSession>, DigestError> {
        let response: SessionsResponse = decode("sessions", raw_json)?;
        let mut sessions: Vec<RawSleepSession> = response
            .session
            .unwrap_or_default()
            .into_iter()
            .map(|s| RawSleepSession {
                start_time_millis: s.start_time_millis,
                end_time_millis: s.end_time_millis,
                deep_sleep_hours: s.deep_sleep,
                rem_sleep_hours: s.rem_sleep,
            })
            .collect();
        sessions.sort_by_key(|s| s.start_time_millis);
        Ok(sessions)
    }

    /// Decode a heart-rate aggregate response into per-bucket bpm lists
    pub fn parse_heart_rate(raw_json: &str) -> Result<Vec<Vec<f64>>, DigestError> {
        let response: AggregateResponse = decode("heart rate aggregate", raw_json)?;
        Ok(response
            .bucket
            .iter()
            .map(|bucket| {
                bucket
                    .dataset
                    .iter()
                    .flat_map(|ds| ds.point.iter())
                    .flat_map(|p| p.value.iter())
                    .filter_map(|v| v.fp_val)
                    .collect()
            })
            .collect())
    }

    /// Decode an activity aggregate response into per-bucket samples
    pub fn parse_activity(raw_json: &str) -> Result<Vec<ActivityBucket>, DigestError> {
        let response: AggregateResponse = decode("activity aggregate", raw_json)?;
        Ok(response
            .bucket
            .iter()
            .map(|bucket| ActivityBucket {
                samples: bucket
                    .dataset
                    .iter()
                    .flat_map(|ds| {
                        ds.point.iter().flat_map(|p| p.value.iter()).map(|v| ActivitySample {
                            source_id: ds.data_source_id.clone(),
                            int_val: v.int_val,
                            fp_val: v.fp_val,
                        })
                    })
                    .collect(),
            })
            .collect())
    }
}

/// Digest source backed by a [`FitnessSource`]
pub struct ApiSource<S> {
    source: S,
    range: TimeRange,
}

impl<S: FitnessSource> ApiSource<S> {
    /// Query the `lookback_days` days leading up to `now`
    pub fn new(source: S, now: DateTime<Utc>, lookback_days: u32) -> Result<Self, DigestError> {
        Ok(Self {
            source,
            range: TimeRange::last_days(now, lookback_days)?,
        })
    }

    /// Connect the underlying service
    pub fn connect(&mut self) -> Result<(), DigestError> {
        self.source.connect()
    }
}

impl<S: FitnessSource> HealthSource for ApiSource<S> {
    fn mode(&self) -> RunMode {
        RunMode::Api
    }

    fn categories(&self) -> Vec<Category> {
        vec![Category::Sleep, Category::HeartRate, Category::Activity]
    }

    fn sleep(&self, window: usize) -> Result<SleepOutput, DigestError> {
        let body = self.source.sleep_sessions(&SessionQuery::sleep(self.range))?;
        let sessions = FitnessApiAdapter::parse_sessions(&body)?;
        tracing::debug!(sessions = sessions.len(), "decoded sleep sessions");
        summarize_sessions(&sessions, window).ok_or(DigestError::NoUsableRecords(Category::Sleep))
    }

    fn heart_rate(&self, window: usize) -> Result<HeartRateMetrics, DigestError> {
        let body = self.source.aggregate(&AggregateRequest::heart_rate(self.range))?;
        let buckets = FitnessApiAdapter::parse_heart_rate(&body)?;
        HeartRateAggregator::new(SampleFilter::PlausibleRange, window)
            .aggregate(&buckets)
            .ok_or(DigestError::NoUsableRecords(Category::HeartRate))
    }

    fn activity(&self, window: usize) -> Result<ActivityMetrics, DigestError> {
        let body = self.source.aggregate(&AggregateRequest::activity(self.range))?;
        let buckets = FitnessApiAdapter::parse_activity(&body)?;
        ActivityAggregator::new(window)
            .aggregate(&buckets)
            .ok_or(DigestError::NoUsableRecords(Category::Activity))
    }

    fn stress(&self) -> Result<StressMetrics, DigestError> {
        // The aggregate API has no stress data type
        Err(DigestError::NoUsableRecords(Category::Stress))
    }
}

// Fitness API response structures

#[derive(Debug, Deserialize)]
struct SessionsResponse {
    session: Option<Vec<ApiSession>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiSession {
    #[serde(deserialize_with = "millis_from_string_or_number")]
    start_time_millis: i64,
    #[serde(deserialize_with = "millis_from_string_or_number")]
    end_time_millis: i64,
    deep_sleep: Option<f64>,
    rem_sleep: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct AggregateResponse {
    #[serde(default)]
    bucket: Vec<ApiBucket>,
}

#[derive(Debug, Deserialize)]
struct ApiBucket {
    #[serde(default)]
    dataset: Vec<ApiDataset>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiDataset {
    #[serde(default)]
    data_source_id: String,
    #[serde(default)]
    point: Vec<ApiPoint>,
}

#[derive(Debug, Deserialize)]
struct ApiPoint {
    #[serde(default)]
    value: Vec<ApiValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiValue {
    int_val: Option<i64>,
    fp_val: Option<f64>,
}

fn decode<T: serde::de::DeserializeOwned>(what: &str, raw_json: &str) -> Result<T, DigestError> {
    serde_json::from_str(raw_json).map_err(|e| DigestError::Response(format!("{what}: {e}")))
}

/// The API encodes int64 fields as JSON strings; accept plain numbers too.
fn millis_from_string_or_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Millis {
        Number(i64),
        Text(String),
    }

    match Millis::deserialize(deserializer)? {
        Millis::Number(n) => Ok(n),
        Millis::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn sample_sessions_json() -> &'static str {
        r#"{
            "session": [
                {
                    "id": "sleep-2",
                    "name": "Sleep",
                    "startTimeMillis": "1705357800000",
                    "endTimeMillis": "1705386600000",
                    "activityType": 72
                },
                {
                    "id": "sleep-1",
                    "startTimeMillis": 1705273200000,
                    "endTimeMillis": 1705298400000,
                    "activityType": 72,
                    "deepSleep": 1.5,
                    "remSleep": 1.75
                }
            ]
        }"#
    }

    fn sample_heart_rate_json() -> &'static str {
        r#"{
            "bucket": [
                {
                    "startTimeMillis": "1705276800000",
                    "endTimeMillis": "1705363200000",
                    "dataset": [{
                        "dataSourceId": "derived:com.google.heart_rate.summary:com.google.android.gms:aggregated",
                        "point": [{ "value": [{ "fpVal": 72.4 }, { "fpVal": 141.0 }, { "fpVal": 54.2 }] }]
                    }]
                },
                {
                    "startTimeMillis": "1705363200000",
                    "endTimeMillis": "1705449600000",
                    "dataset": [{ "dataSourceId": "derived:com.google.heart_rate.summary", "point": [] }]
                }
            ]
        }"#
    }

    fn sample_activity_json() -> &'static str {
        r#"{
            "bucket": [{
                "dataset": [
                    {
                        "dataSourceId": "derived:com.google.step_count.delta:com.google.android.gms:aggregated",
                        "point": [{ "value": [{ "intVal": 6400 }] }, { "value": [{ "intVal": 1800 }] }]
                    },
                    {
                        "dataSourceId": "derived:com.google.calories.expended:com.google.android.gms:aggregated",
                        "point": [{ "value": [{ "fpVal": 2140.7 }] }]
                    },
                    {
                        "dataSourceId": "derived:com.google.active_minutes:com.google.android.gms:aggregated",
                        "point": [{ "value": [{ "intVal": 42 }] }]
                    }
                ]
            }]
        }"#
    }

    #[test]
    fn test_parse_sessions_sorted_with_optional_stages() {
        let sessions = FitnessApiAdapter::parse_sessions(sample_sessions_json()).unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].start_time_millis, 1_705_273_200_000);
        assert_eq!(sessions[0].deep_sleep_hours, Some(1.5));
        assert_eq!(sessions[1].end_time_millis, 1_705_386_600_000);
        assert_eq!(sessions[1].rem_sleep_hours, None);
    }

    #[test]
    fn test_parse_empty_sessions() {
        assert!(FitnessApiAdapter::parse_sessions("{}").unwrap().is_empty());
        assert!(FitnessApiAdapter::parse_sessions(r#"{"session": []}"#)
            .unwrap()
            .is_empty());
        assert!(matches!(
            FitnessApiAdapter::parse_sessions("not json"),
            Err(DigestError::Response(_))
        ));
    }

    #[test]
    fn test_parse_heart_rate_buckets() {
        let buckets = FitnessApiAdapter::parse_heart_rate(sample_heart_rate_json()).unwrap();
        assert_eq!(buckets, vec![vec![72.4, 141.0, 54.2], vec![]]);
    }

    #[test]
    fn test_parse_activity_buckets() {
        let buckets = FitnessApiAdapter::parse_activity(sample_activity_json()).unwrap();
        assert_eq!(buckets.len(), 1);
        let day = ActivityAggregator::reduce_bucket(&buckets[0]);
        assert_eq!(day.steps, 8200);
        assert_eq!(day.calories, 2140);
        assert_eq!(day.active_minutes, 42);
    }

    #[test]
    fn test_aggregate_request_shape() {
        let end = Utc.with_ymd_and_hms(2024, 1, 16, 0, 0, 0).unwrap();
        let request = AggregateRequest::activity(TimeRange::last_days(end, 7).unwrap());
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "aggregateBy": [
                    { "dataTypeName": "com.google.step_count.delta" },
                    { "dataTypeName": "com.google.calories.expended" },
                    { "dataTypeName": "com.google.active_minutes" }
                ],
                "bucketByTime": { "durationMillis": 86400000 },
                "startTimeMillis": 1704758400000i64,
                "endTimeMillis": 1705363200000i64
            })
        );
        assert!(!request.is_heart_rate());
        assert!(AggregateRequest::heart_rate(TimeRange::last_days(end, 1).unwrap()).is_heart_rate());
    }

    #[test]
    fn test_lookback_out_of_range_is_config_error() {
        let end = Utc.with_ymd_and_hms(2024, 1, 16, 8, 0, 0).unwrap();
        assert!(matches!(
            TimeRange::last_days(end, 100_000_000),
            Err(DigestError::Config(_))
        ));
        assert!(matches!(
            TimeRange::last_days(end, u32::MAX),
            Err(DigestError::Config(_))
        ));

        let range = TimeRange::last_days(end, 3650).unwrap();
        assert_eq!(range.start, end - Duration::days(3650));
    }

    #[test]
    fn test_session_query() {
        let end = Utc.with_ymd_and_hms(2024, 1, 16, 8, 0, 0).unwrap();
        let query = SessionQuery::sleep(TimeRange::last_days(end, 7).unwrap());
        assert_eq!(query.start_time, "2024-01-09T08:00:00.000Z");
        assert_eq!(query.end_time, "2024-01-16T08:00:00.000Z");
        assert_eq!(query.activity_type, 72);
    }
}
