//! Pipeline orchestration
//!
//! This module provides the public entry points for a digest run. It drives a
//! [`HealthSource`] category by category, assembles the summary and writes the
//! two output files.
//!
//! Each category is attempted on its own: a failure is logged, recorded in the
//! diagnostics and the category is left out of the summary. The run succeeds if
//! at least one category produced data and the summary was written.

use crate::adapters::{ApiSource, CsvExportSource, CsvPaths, FitnessSource, HealthSource};
use crate::config::{Config, RunClock};
use crate::diagnostics::{write_diagnostics, DiagnosticsRecorder};
use crate::error::DigestError;
use crate::summary::{write_summary, SummaryAssembler};
use crate::types::{Category, Diagnostics, HealthSummary, RunMode};

/// What a run produced
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// The summary, if one was written
    pub summary: Option<HealthSummary>,
    pub diagnostics: Diagnostics,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        self.diagnostics.success
    }
}

/// Digest the given CSV exports and write both output files.
///
/// # Example
/// ```ignore
/// let outcome = run_csv(
///     CsvPaths { sleep: Some("sleep.csv".into()), ..Default::default() },
///     &Config::default(),
///     RunClock::system(),
/// );
/// ```
pub fn run_csv(paths: CsvPaths, config: &Config, clock: RunClock) -> RunOutcome {
    let source = CsvExportSource::new(paths);
    DigestProcessor::new(config.clone(), clock).run(&source)
}

/// Connect to a fitness service, digest its data and write both output files.
///
/// An unusable lookback window or a connection failure aborts the run: the
/// diagnostics file is still written and the error is returned.
pub fn run_api<S: FitnessSource>(
    fitness: S,
    config: &Config,
    clock: RunClock,
) -> Result<RunOutcome, DigestError> {
    let processor = DigestProcessor::new(config.clone(), clock);
    let mut source = ApiSource::new(fitness, clock.now, config.lookback_days)
        .map_err(|err| processor.abort(RunMode::Api, err))?;
    source
        .connect()
        .map_err(|err| processor.abort(RunMode::Api, err))?;

    Ok(processor.run(&source))
}

/// Runs sources through category processing and output writing
pub struct DigestProcessor {
    config: Config,
    clock: RunClock,
}

impl DigestProcessor {
    pub fn new(config: Config, clock: RunClock) -> Self {
        Self { config, clock }
    }

    /// Attempt every category the source offers, isolating failures
    pub fn collect(&self, source: &dyn HealthSource) -> (SummaryAssembler, DiagnosticsRecorder) {
        let mode = source.mode();
        let window = self.config.trend_window;
        let mut assembler = SummaryAssembler::new(mode, self.clock);
        let mut recorder = DiagnosticsRecorder::new(mode, self.clock.now);

        for category in source.categories() {
            let result = match category {
                Category::Sleep => source.sleep(window).map(|sleep| {
                    let sessions = sleep.weekly.sessions_analyzed;
                    assembler.add_sleep(sleep);
                    sessions
                }),
                Category::HeartRate => source.heart_rate(window).map(|hr| {
                    let days = hr.days_analyzed;
                    assembler.add_heart_rate(hr);
                    days
                }),
                Category::Activity => source.activity(window).map(|activity| {
                    assembler.add_activity(activity);
                    1
                }),
                Category::Stress => source.stress().map(|stress| {
                    assembler.add_stress(stress);
                    1
                }),
            };

            match result {
                Ok(records) => {
                    tracing::info!(%category, records, "processed {category} data");
                    recorder.record_success(category);
                }
                Err(err) => {
                    tracing::warn!(%category, "{err}");
                    recorder.record_failure(category, &err);
                }
            }
        }

        (assembler, recorder)
    }

    /// Collect, then write the summary (when there is data) and diagnostics
    pub fn run(&self, source: &dyn HealthSource) -> RunOutcome {
        let (assembler, mut recorder) = self.collect(source);

        let summary = match assembler.assemble() {
            Ok(summary) => match write_summary(&self.config.output_path, &summary) {
                Ok(()) => {
                    tracing::info!(path = %self.config.output_path.display(), "health data saved");
                    Some(summary)
                }
                Err(err) => {
                    let message = format!("Error saving JSON: {err}");
                    tracing::error!("{message}");
                    recorder.record_error(message);
                    None
                }
            },
            Err(err) => {
                let message = format!("{err}. File will not be updated.");
                tracing::error!("{message}");
                recorder.record_error(message);
                None
            }
        };

        let diagnostics = recorder.finish(summary.is_some());
        self.save_diagnostics(&diagnostics);

        RunOutcome {
            summary,
            diagnostics,
        }
    }

    /// Record a fatal error, write failed diagnostics and hand the error back
    fn abort(&self, mode: RunMode, err: DigestError) -> DigestError {
        tracing::error!("{err}");
        let mut recorder = DiagnosticsRecorder::new(mode, self.clock.now);
        recorder.record_error(err.to_string());
        self.save_diagnostics(&recorder.finish(false));
        err
    }

    fn save_diagnostics(&self, diagnostics: &Diagnostics) {
        let path = &self.config.diagnostics_path;
        match write_diagnostics(path, diagnostics) {
            Ok(()) => tracing::info!(path = %path.display(), "diagnostics saved"),
            Err(err) => tracing::warn!("could not save diagnostics: {err}"),
        }
    }
}
