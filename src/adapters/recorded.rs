//! File-backed fitness source
//!
//! Serves previously saved API response bodies from a directory, one file per
//! endpoint. Useful for offline runs and for replaying a captured sync.

use std::fs;
use std::path::{Path, PathBuf};

use super::fitness_api::{AggregateRequest, FitnessSource, SessionQuery};
use crate::error::DigestError;
use crate::types::Category;

pub const SESSIONS_FILE: &str = "sessions.json";
pub const HEART_RATE_FILE: &str = "heart_rate.json";
pub const ACTIVITY_FILE: &str = "activity.json";

/// Saved responses in a directory
#[derive(Debug, Clone)]
pub struct RecordedResponses {
    dir: PathBuf,
}

impl RecordedResponses {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn read(&self, category: Category, file: &str) -> Result<String, DigestError> {
        let path = self.dir.join(file);
        if !path.exists() {
            return Err(DigestError::SourceUnavailable(
                category,
                path.display().to_string(),
            ));
        }
        Ok(fs::read_to_string(&path)?)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl FitnessSource for RecordedResponses {
    fn connect(&mut self) -> Result<(), DigestError> {
        if self.dir.is_dir() {
            tracing::debug!(dir = %self.dir.display(), "using recorded responses");
            Ok(())
        } else {
            Err(DigestError::Connect(format!(
                "response directory not found: {}",
                self.dir.display()
            )))
        }
    }

    fn sleep_sessions(&self, query: &SessionQuery) -> Result<String, DigestError> {
        tracing::debug!(start = %query.start_time, end = %query.end_time, "sessions query");
        self.read(Category::Sleep, SESSIONS_FILE)
    }

    fn aggregate(&self, request: &AggregateRequest) -> Result<String, DigestError> {
        tracing::debug!(
            start = request.start_time_millis,
            end = request.end_time_millis,
            "aggregate query"
        );
        if request.is_heart_rate() {
            self.read(Category::HeartRate, HEART_RATE_FILE)
        } else {
            self.read(Category::Activity, ACTIVITY_FILE)
        }
    }
}
