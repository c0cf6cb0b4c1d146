//! Run diagnostics
//!
//! Records which categories produced data, the errors met along the way and
//! the overall outcome. Written next to the summary on every run, including
//! runs that produce no summary at all.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use crate::error::DigestError;
use crate::types::{Category, Diagnostics, RunMode};

/// Accumulates diagnostics over one run
#[derive(Debug, Clone)]
pub struct DiagnosticsRecorder {
    mode: RunMode,
    run_id: String,
    fetch_time: DateTime<Utc>,
    categories: BTreeMap<Category, bool>,
    errors: Vec<String>,
}

impl DiagnosticsRecorder {
    pub fn new(mode: RunMode, fetch_time: DateTime<Utc>) -> Self {
        Self {
            mode,
            run_id: Uuid::new_v4().to_string(),
            fetch_time,
            categories: BTreeMap::new(),
            errors: Vec::new(),
        }
    }

    /// Mark a category as having produced data
    pub fn record_success(&mut self, category: Category) {
        self.categories.insert(category, true);
    }

    /// Mark a category as failed and keep its error message
    pub fn record_failure(&mut self, category: Category, error: &DigestError) {
        self.categories.insert(category, false);
        self.errors.push(error.to_string());
    }

    /// Keep an error that is not tied to a category
    pub fn record_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Whether any category produced data
    pub fn any_success(&self) -> bool {
        self.categories.values().any(|ok| *ok)
    }

    /// Final document
    pub fn finish(&self, success: bool) -> Diagnostics {
        let categories = Some(self.categories.clone());
        let (data_fetched, data_processed) = match self.mode {
            RunMode::Api => (categories, None),
            RunMode::Csv => (None, categories),
        };
        Diagnostics {
            run_id: self.run_id.clone(),
            fetch_time: self.fetch_time.to_rfc3339_opts(SecondsFormat::Secs, true),
            data_fetched,
            data_processed,
            errors: self.errors.clone(),
            success,
        }
    }
}

/// Write the diagnostics document, replacing any previous file
pub fn write_diagnostics(path: &Path, diagnostics: &Diagnostics) -> Result<(), DigestError> {
    let json = serde_json::to_string_pretty(diagnostics)?;
    fs::write(path, json)?;
    Ok(())
}
