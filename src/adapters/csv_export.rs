//! Samsung Health CSV export adapter
//!
//! Reads one CSV file per category and looks columns up by header name.
//! Missing columns fall back to fixed defaults; those defaults are applied here
//! and nowhere else, so the rest of the pipeline only ever sees concrete values.
//! A column that is present but holds a blank or unreadable number fails the
//! category instead.

use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim};

use super::HealthSource;
use crate::error::DigestError;
use crate::heart_rate::{HeartRateAggregator, SampleFilter};
use crate::parse::{clock_time_or_original, duration_hours_or_default};
use crate::sleep::{SleepOutput, SleepWeekly};
use crate::stress::summarize_stress;
use crate::trends::{most_recent, round_to, rounded_mean, rounded_mean_1dp, rounded_mean_u64};
use crate::types::{
    ActivityMetrics, Category, EnergyBlock, EnergyLevel, HeartRateMetrics, RunMode, SleepBlock,
    StressMetrics,
};

// Column names
const COL_DATE: &str = "Date";
const COL_SLEEP_TIME: &str = "Sleep time";
const COL_SLEEP_SCORE: &str = "Sleep score";
const COL_DEEP_SLEEP: &str = "Deep sleep";
const COL_REM_SLEEP: &str = "REM sleep";
const COL_LIGHT_SLEEP: &str = "Light sleep";
const COL_BEDTIME: &str = "Bedtime";
const COL_WAKE_TIME: &str = "Wake time";
const COL_ENERGY: [&str; 3] = ["Energy score", "Energy", "energy_score"];
const COL_HEART_RATE: &str = "Heart rate";
const COL_STEPS: &str = "Step count";
const COL_CALORIES: &str = "Calories";
const COL_ACTIVE_TIME: &str = "Active time";
const COL_STRESS: &str = "Stress";

// Defaults for missing columns
const DEFAULT_SLEEP_SCORE: u8 = 87;
const DEFAULT_BEDTIME: &str = "23:30";
const DEFAULT_WAKE_TIME: &str = "07:00";
const DEFAULT_STEPS: u64 = 8000;
const DEFAULT_CALORIES: u64 = 2000;
const DEFAULT_ACTIVE_MINUTES: u64 = 30;

/// A CSV file loaded into memory with a header index
#[derive(Debug, Clone)]
pub struct CsvTable {
    columns: HashMap<String, usize>,
    records: Vec<StringRecord>,
}

impl CsvTable {
    /// Load a CSV file
    pub fn from_path(path: &Path) -> Result<Self, DigestError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Load CSV data from any reader
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DigestError> {
        let mut rdr = ReaderBuilder::new()
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        let columns = rdr
            .headers()?
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.to_string(), idx))
            .collect();

        let records = rdr.records().collect::<Result<Vec<_>, _>>()?;

        Ok(Self { columns, records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All rows in file order
    pub fn rows(&self) -> impl Iterator<Item = CsvRow<'_>> + '_ {
        self.records.iter().map(move |record| CsvRow {
            table: self,
            record,
        })
    }

    /// The last `window` rows in file order
    pub fn recent_rows(&self, window: usize) -> impl Iterator<Item = CsvRow<'_>> + '_ {
        most_recent(&self.records, window)
            .iter()
            .map(move |record| CsvRow {
                table: self,
                record,
            })
    }

    /// Most recent row (the last one in the file)
    pub fn last(&self) -> Option<CsvRow<'_>> {
        self.records.last().map(|record| CsvRow {
            table: self,
            record,
        })
    }
}

/// One row of a [`CsvTable`]
#[derive(Debug, Clone, Copy)]
pub struct CsvRow<'a> {
    table: &'a CsvTable,
    record: &'a StringRecord,
}

impl<'a> CsvRow<'a> {
    /// Whether the table header has this column
    pub fn has_column(&self, column: &str) -> bool {
        self.table.columns.contains_key(column)
    }

    /// Non-empty value of a column, `None` if the column is missing or blank
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let idx = *self.table.columns.get(column)?;
        self.record.get(idx).filter(|v| !v.is_empty())
    }

    /// First non-empty value among several candidate columns
    pub fn first_of(&self, columns: &[&str]) -> Option<&'a str> {
        columns.iter().find_map(|c| self.get(c))
    }

    /// Numeric value of a column
    pub fn number(&self, column: &str) -> Option<f64> {
        self.get(column)
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| v.is_finite())
    }

    /// Whole-number value of a column, truncating any fraction
    pub fn whole(&self, column: &str) -> Option<i64> {
        self.number(column).map(|v| v.trunc() as i64)
    }
}

/// Paths of the per-category export files; only given categories are read
#[derive(Debug, Clone, Default)]
pub struct CsvPaths {
    pub sleep: Option<PathBuf>,
    pub heart_rate: Option<PathBuf>,
    pub activity: Option<PathBuf>,
    pub stress: Option<PathBuf>,
}

impl CsvPaths {
    pub fn is_empty(&self) -> bool {
        self.sleep.is_none()
            && self.heart_rate.is_none()
            && self.activity.is_none()
            && self.stress.is_none()
    }
}

/// CSV export source
pub struct CsvExportSource {
    paths: CsvPaths,
}

impl CsvExportSource {
    pub fn new(paths: CsvPaths) -> Self {
        Self { paths }
    }

    fn load(&self, category: Category) -> Result<CsvTable, DigestError> {
        let path = match category {
            Category::Sleep => self.paths.sleep.as_ref(),
            Category::HeartRate => self.paths.heart_rate.as_ref(),
            Category::Activity => self.paths.activity.as_ref(),
            Category::Stress => self.paths.stress.as_ref(),
        }
        .ok_or(DigestError::NoUsableRecords(category))?;

        if !path.exists() {
            return Err(DigestError::SourceUnavailable(
                category,
                path.display().to_string(),
            ));
        }

        let table = CsvTable::from_path(path)?;
        if table.is_empty() {
            return Err(DigestError::NoUsableRecords(category));
        }
        tracing::debug!(%category, rows = table.len(), path = %path.display(), "loaded CSV export");
        Ok(table)
    }
}

impl HealthSource for CsvExportSource {
    fn mode(&self) -> RunMode {
        RunMode::Csv
    }

    fn categories(&self) -> Vec<Category> {
        let mut categories = Vec::new();
        if self.paths.sleep.is_some() {
            categories.push(Category::Sleep);
        }
        if self.paths.heart_rate.is_some() {
            categories.push(Category::HeartRate);
        }
        if self.paths.activity.is_some() {
            categories.push(Category::Activity);
        }
        if self.paths.stress.is_some() {
            categories.push(Category::Stress);
        }
        categories
    }

    fn sleep(&self, window: usize) -> Result<SleepOutput, DigestError> {
        let table = self.load(Category::Sleep)?;
        sleep_from_table(&table, window)
    }

    fn heart_rate(&self, window: usize) -> Result<HeartRateMetrics, DigestError> {
        let table = self.load(Category::HeartRate)?;
        let days = values_by_date(&table, COL_HEART_RATE);
        HeartRateAggregator::new(SampleFilter::None, window)
            .aggregate(&days)
            .ok_or(DigestError::NoUsableRecords(Category::HeartRate))
    }

    fn activity(&self, window: usize) -> Result<ActivityMetrics, DigestError> {
        let table = self.load(Category::Activity)?;
        activity_from_table(&table, window)
    }

    fn stress(&self) -> Result<StressMetrics, DigestError> {
        let table = self.load(Category::Stress)?;
        let days = values_by_date(&table, COL_STRESS);
        summarize_stress(&days).ok_or(DigestError::NoUsableRecords(Category::Stress))
    }
}

/// Hours from a duration column; a missing column reads as zero
fn duration_column(row: &CsvRow<'_>, column: &str) -> f64 {
    row.get(column).map(duration_hours_or_default).unwrap_or(0.0)
}

fn score_column(row: &CsvRow<'_>, columns: &[&str]) -> Option<u8> {
    row.first_of(columns)
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .map(to_score)
}

fn to_score(value: f64) -> u8 {
    value.trunc().clamp(0.0, 100.0) as u8
}

/// Numeric cell of a column that has a default. `Ok(None)` means the column is
/// absent from the header and the default applies; a blank or non-numeric cell
/// in a present column is an error.
fn present_number(
    row: &CsvRow<'_>,
    category: Category,
    column: &str,
) -> Result<Option<f64>, DigestError> {
    if !row.has_column(column) {
        return Ok(None);
    }
    row.number(column)
        .map(Some)
        .ok_or_else(|| DigestError::InvalidValue {
            category,
            column: column.to_string(),
            value: row.get(column).unwrap_or_default().to_string(),
        })
}

fn sleep_from_table(table: &CsvTable, window: usize) -> Result<SleepOutput, DigestError> {
    let latest = table
        .last()
        .ok_or(DigestError::NoUsableRecords(Category::Sleep))?;

    let score = present_number(&latest, Category::Sleep, COL_SLEEP_SCORE)?
        .map(to_score)
        .unwrap_or(DEFAULT_SLEEP_SCORE);

    let daily = SleepBlock {
        duration: duration_column(&latest, COL_SLEEP_TIME),
        score,
        deep_sleep: round_to(duration_column(&latest, COL_DEEP_SLEEP), 1),
        rem_sleep: round_to(duration_column(&latest, COL_REM_SLEEP), 1),
        light_sleep: round_to(duration_column(&latest, COL_LIGHT_SLEEP), 1),
        bed_time: clock_time_or_original(latest.get(COL_BEDTIME).unwrap_or(DEFAULT_BEDTIME)),
        wake_time: clock_time_or_original(latest.get(COL_WAKE_TIME).unwrap_or(DEFAULT_WAKE_TIME)),
    };

    let energy = score_column(&latest, &COL_ENERGY).map(|score| EnergyBlock {
        score,
        level: EnergyLevel::from_score(score),
    });

    let recent: Vec<CsvRow<'_>> = table.recent_rows(window).collect();
    let weekly = SleepWeekly {
        average_sleep_score: rounded_mean(
            recent
                .iter()
                .filter_map(|r| score_column(r, &[COL_SLEEP_SCORE]))
                .map(f64::from),
        ),
        average_energy_score: rounded_mean(
            recent
                .iter()
                .filter_map(|r| score_column(r, &COL_ENERGY))
                .map(f64::from),
        ),
        average_sleep_duration: rounded_mean_1dp(
            recent.iter().map(|r| duration_column(r, COL_SLEEP_TIME)),
        ),
        sessions_analyzed: recent.len(),
    };

    Ok(SleepOutput {
        daily,
        energy,
        weekly,
    })
}

fn activity_from_table(table: &CsvTable, window: usize) -> Result<ActivityMetrics, DigestError> {
    let latest = table
        .last()
        .ok_or(DigestError::NoUsableRecords(Category::Activity))?;
    let count = |column: &str, default: u64| -> Result<u64, DigestError> {
        Ok(present_number(&latest, Category::Activity, column)?
            .map(|v| v.trunc().max(0.0) as u64)
            .unwrap_or(default))
    };

    let weekly_steps = rounded_mean_u64(
        table
            .recent_rows(window)
            .filter_map(|r| r.whole(COL_STEPS))
            .map(|v| v as f64),
    );

    Ok(ActivityMetrics {
        steps: count(COL_STEPS, DEFAULT_STEPS)?,
        calories: count(COL_CALORIES, DEFAULT_CALORIES)?,
        active_minutes: count(COL_ACTIVE_TIME, DEFAULT_ACTIVE_MINUTES)?,
        weekly_steps,
    })
}

/// Group a numeric column into chronological day buckets keyed by the
/// calendar-date prefix of the `Date` column. Rows without a value are skipped.
fn values_by_date(table: &CsvTable, column: &str) -> Vec<Vec<f64>> {
    let mut days: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for row in table.rows() {
        let Some(value) = row.number(column) else {
            continue;
        };
        let date = row
            .get(COL_DATE)
            .map(|d| d.chars().take(10).collect::<String>())
            .unwrap_or_default();
        days.entry(date).or_default().push(value);
    }
    days.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn table(csv: &str) -> CsvTable {
        CsvTable::from_reader(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_row_lookup() {
        let t = table("Date,Step count,Calories\n2024-01-15, 5000 ,\n");
        let row = t.last().unwrap();
        assert_eq!(row.get("Step count"), Some("5000"));
        assert_eq!(row.get("Calories"), None);
        assert_eq!(row.get("Active time"), None);
        assert_eq!(row.whole("Step count"), Some(5000));
    }

    #[test]
    fn test_activity_daily_and_weekly() {
        let t = table("Step count\n5000\n7000\n");
        let m = activity_from_table(&t, 7).unwrap();
        assert_eq!(m.steps, 7000);
        assert_eq!(m.weekly_steps, Some(6000));
        // Missing columns take their defaults
        assert_eq!(m.calories, DEFAULT_CALORIES);
        assert_eq!(m.active_minutes, DEFAULT_ACTIVE_MINUTES);
    }

    #[test]
    fn test_activity_weekly_window_and_missing_steps() {
        let mut csv = String::from("Step count,Calories\n");
        for steps in [100, 200, 300, 1000, 1000, 1000, 1000, 1000, 1000, 1000] {
            csv.push_str(&format!("{steps},1900\n"));
        }
        let m = activity_from_table(&table(&csv), 7).unwrap();
        assert_eq!(m.weekly_steps, Some(1000));

        let m = activity_from_table(&table("Calories\n2100\n"), 7).unwrap();
        assert_eq!(m.steps, DEFAULT_STEPS);
        assert_eq!(m.calories, 2100);
        assert_eq!(m.weekly_steps, None);
    }

    #[test]
    fn test_sleep_from_latest_row() {
        let t = table(
            "Sleep time,Sleep score,Deep sleep,REM sleep,Light sleep,Bedtime,Wake time,Energy score\n\
             6h 30m,70,1h 10m,1h 20m,4h,23:10,05:40,65\n\
             7h 30m,82,1h 30m,1h 45m,4h 15m,11:15 PM,06:45:00,78\n",
        );
        let out = sleep_from_table(&t, 7).unwrap();
        assert_eq!(
            out.daily,
            SleepBlock {
                duration: 7.5,
                score: 82,
                deep_sleep: 1.5,
                rem_sleep: 1.8,
                light_sleep: 4.3,
                bed_time: "23:15".to_string(),
                wake_time: "06:45".to_string(),
            }
        );
        assert_eq!(
            out.energy,
            Some(EnergyBlock {
                score: 78,
                level: EnergyLevel::Good
            })
        );
        assert_eq!(out.weekly.average_sleep_score, Some(76));
        assert_eq!(out.weekly.average_energy_score, Some(72));
        assert_eq!(out.weekly.average_sleep_duration, Some(7.0));
        assert_eq!(out.weekly.sessions_analyzed, 2);
    }

    #[test]
    fn test_sleep_defaults_and_fallbacks() {
        let t = table("Sleep time,Notes\nabout eight,\n");
        let out = sleep_from_table(&t, 7).unwrap();
        assert_eq!(out.daily.duration, 7.5);
        assert_eq!(out.daily.score, DEFAULT_SLEEP_SCORE);
        assert_eq!(out.daily.deep_sleep, 0.0);
        assert_eq!(out.daily.bed_time, "23:30");
        assert_eq!(out.daily.wake_time, "07:00");
        assert_eq!(out.energy, None);
        assert_eq!(out.weekly.average_sleep_score, None);
        assert_eq!(out.weekly.average_energy_score, None);
    }

    #[test]
    fn test_blank_or_bad_cells_fail_instead_of_defaulting() {
        let t = table("Date,Step count,Calories,Active time\n2024-01-14,6000,1900,20\n2024-01-15,,n/a,\n");
        let err = activity_from_table(&t, 7).unwrap_err();
        assert!(matches!(
            err,
            DigestError::InvalidValue { category: Category::Activity, ref column, .. } if column == COL_STEPS
        ));

        let t = table("Step count,Calories\n7000,lots\n");
        let err = activity_from_table(&t, 7).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid activity value in column \"Calories\": \"lots\""
        );

        let t = table("Sleep time,Sleep score\n7h,\n");
        assert!(matches!(
            sleep_from_table(&t, 7),
            Err(DigestError::InvalidValue { category: Category::Sleep, .. })
        ));
    }

    #[test]
    fn test_energy_column_aliases() {
        let t = table("Sleep time,Energy\n7h,59\n");
        let out = sleep_from_table(&t, 7).unwrap();
        assert_eq!(out.energy.unwrap().level, EnergyLevel::Low);
    }

    #[test]
    fn test_values_grouped_by_date() {
        let t = table(
            "Date,Heart rate\n\
             2024-01-14 08:00:00,58\n\
             2024-01-15 07:00:00,61\n\
             2024-01-14 21:00:00,95\n\
             2024-01-15 12:00:00,\n\
             2024-01-15 18:00:00,104\n",
        );
        let days = values_by_date(&t, COL_HEART_RATE);
        assert_eq!(days, vec![vec![58.0, 95.0], vec![61.0, 104.0]]);
    }
}
