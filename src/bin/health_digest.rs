//! Health Digest CLI
//!
//! Commands:
//! - import: Digest Samsung Health CSV exports
//! - fetch: Digest fitness API responses saved in a directory

use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use health_digest::config::MAX_LOOKBACK_DAYS;
use health_digest::{
    run_api, run_csv, Config, CsvPaths, DigestError, RecordedResponses, RunClock, RunOutcome,
    VERSION,
};

/// Health Digest - Daily health summaries for a static dashboard
#[derive(Parser)]
#[command(name = "health-digest")]
#[command(version = VERSION)]
#[command(about = "Turn health exports into health-data.json", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Digest CSV exports (at least one data file is required)
    Import {
        /// Sleep CSV file
        #[arg(long)]
        sleep: Option<PathBuf>,

        /// Heart rate CSV file
        #[arg(long)]
        heart: Option<PathBuf>,

        /// Steps / activity CSV file
        #[arg(long)]
        steps: Option<PathBuf>,

        /// Stress CSV file
        #[arg(long)]
        stress: Option<PathBuf>,

        /// Summary output path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Diagnostics output path
        #[arg(long)]
        diagnostics: Option<PathBuf>,
    },

    /// Digest fitness API responses saved in a directory
    Fetch {
        /// Directory holding sessions.json, heart_rate.json and activity.json
        #[arg(long)]
        responses: PathBuf,

        /// Summary output path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Diagnostics output path
        #[arg(long)]
        diagnostics: Option<PathBuf>,

        /// Days of history to request
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=MAX_LOOKBACK_DAYS as i64))]
        days: Option<u32>,
    },
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let log_env = std::env::var("HEALTH_DIGEST_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(&log_env)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(env_filter)
        .init();
}

fn run(cli: Cli) -> Result<(), DigestCliError> {
    let mut config = Config::from_env()?;

    match cli.command {
        Commands::Import {
            sleep,
            heart,
            steps,
            stress,
            output,
            diagnostics,
        } => {
            apply_paths(&mut config, output, diagnostics);
            cmd_import(
                CsvPaths {
                    sleep,
                    heart_rate: heart,
                    activity: steps,
                    stress,
                },
                &config,
            )
        }

        Commands::Fetch {
            responses,
            output,
            diagnostics,
            days,
        } => {
            apply_paths(&mut config, output, diagnostics);
            if let Some(days) = days {
                config.lookback_days = days;
            }
            cmd_fetch(responses, &config)
        }
    }
}

fn apply_paths(config: &mut Config, output: Option<PathBuf>, diagnostics: Option<PathBuf>) {
    if let Some(path) = output {
        config.output_path = path;
    }
    if let Some(path) = diagnostics {
        config.diagnostics_path = path;
    }
}

fn cmd_import(paths: CsvPaths, config: &Config) -> Result<(), DigestCliError> {
    if paths.is_empty() {
        // Nothing to do is not a failure
        if let Some(import) = Cli::command().find_subcommand_mut("import") {
            let _ = import.print_help();
        }
        println!();
        println!("Error: at least one data file is required");
        return Ok(());
    }

    println!("Processing Samsung Health CSV data...");
    let outcome = run_csv(paths, config, RunClock::system());
    report(&outcome, config)
}

fn cmd_fetch(responses: PathBuf, config: &Config) -> Result<(), DigestCliError> {
    println!("Fetching health data from {}...", responses.display());
    let outcome = run_api(RecordedResponses::new(responses), config, RunClock::system())?;
    report(&outcome, config)
}

fn report(outcome: &RunOutcome, config: &Config) -> Result<(), DigestCliError> {
    let Some(summary) = &outcome.summary else {
        return Err(DigestCliError::NoData(outcome.diagnostics.errors.clone()));
    };

    println!("Health data saved to {}", config.output_path.display());
    let daily = &summary.daily_stats;
    if let Some(sleep) = &daily.sleep {
        println!("  Sleep: {}h (score {})", sleep.duration, sleep.score);
    }
    if let Some(energy) = &daily.energy {
        println!("  Energy: {} ({})", energy.score, energy.level.as_str());
    }
    if let Some(hr) = &daily.heart_rate {
        println!("  Heart rate: {} bpm resting", hr.resting);
    }
    if let Some(activity) = &daily.activity {
        println!("  Activity: {} steps", activity.steps);
    }
    if let Some(stress) = &daily.stress {
        println!("  Stress: {} ({})", stress.average, stress.level.as_str());
    }
    for error in &outcome.diagnostics.errors {
        println!("  Warning: {error}");
    }
    Ok(())
}

// Error types

#[derive(Debug)]
enum DigestCliError {
    Config(DigestError),
    Connect(DigestError),
    NoData(Vec<String>),
}

impl From<DigestError> for DigestCliError {
    fn from(e: DigestError) -> Self {
        match e {
            DigestError::Connect(_) => DigestCliError::Connect(e),
            _ => DigestCliError::Config(e),
        }
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<DigestCliError> for CliError {
    fn from(e: DigestCliError) -> Self {
        match e {
            DigestCliError::Config(e) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check the HEALTH_DIGEST_* environment variables".to_string()),
            },
            DigestCliError::Connect(e) => CliError {
                code: "CONNECT_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check the responses directory".to_string()),
            },
            DigestCliError::NoData(errors) => CliError {
                code: "NO_DATA".to_string(),
                message: DigestError::NoData.to_string(),
                hint: Some(if errors.is_empty() {
                    "Check the input files".to_string()
                } else {
                    errors.join("; ")
                }),
            },
        }
    }
}
