//! Command-line interface of the probe test runner.
//!
//! ```text
//! probe [FILES]... [--config PATH] [-g REGEX] [-t REGEX] [-f REGEX]
//!       [--output-binary] [--norun] [--performance] [--max-samples N]
//!       [--max-test-run-time MS] [--round-decimal-places N] [-v]
//! ```
//!
//! ## Design
//!
//! Compiling test sources is outside this crate: the binary embedding the CLI supplies a [`ModuleLoader`] and hands
//! it to [`run`]. Command functions return `CliResult<T>` instead of calling `process::exit`; only [`run_with`] exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use probe_core::ModuleLoader;

use crate::config::Configuration;
use crate::host::NameFilter;
use crate::reporter::{ConsoleReporter, TestReporter};
use crate::run::{self, EntryDiscovery, GlobDiscovery, RunOptions, StaticDiscovery};

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }

    /// Create a configuration error (exit code 2).
    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode(2))
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Run test suites compiled into sandboxed guest modules
#[derive(Parser, Debug, Default)]
#[command(name = "probe")]
#[command(version = VERSION)]
#[command(about = "Run test suites compiled into sandboxed guest modules", long_about = None)]
pub struct Cli {
    /// Entry files to run (default: the configuration's include globs)
    #[arg(value_name = "FILES")]
    pub files: Vec<PathBuf>,

    /// Configuration file (default: probe.config.json)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Only run tests whose name matches
    #[arg(short = 't', long = "test", value_name = "REGEX")]
    pub test: Option<String>,

    /// Only run groups whose name matches
    #[arg(short = 'g', long = "group", value_name = "REGEX")]
    pub group: Option<String>,

    /// Only run entry files whose path matches
    #[arg(short = 'f', long = "file", value_name = "REGEX")]
    pub file: Option<String>,

    /// Write loader artifacts next to each entry file
    #[arg(long)]
    pub output_binary: bool,

    /// Load and instantiate modules without running them
    #[arg(long)]
    pub norun: bool,

    /// Enable performance sampling
    #[arg(long)]
    pub performance: bool,

    /// Upper bound on samples per test
    #[arg(long, value_name = "N")]
    pub max_samples: Option<u32>,

    /// Upper bound on total sampling time per test, in milliseconds
    #[arg(long, value_name = "MS")]
    pub max_test_run_time: Option<f64>,

    /// Decimal places of reported statistics
    #[arg(long, value_name = "N")]
    pub round_decimal_places: Option<u32>,

    /// Show timings for every test
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Fold command-line overrides into the loaded configuration.
    pub fn apply_to(&self, config: &mut Configuration) {
        config.output_binary |= self.output_binary;
        let performance = &mut config.performance;
        performance.enabled |= self.performance;
        if let Some(max) = self.max_samples {
            performance.max_samples = max;
        }
        if let Some(millis) = self.max_test_run_time {
            performance.max_test_run_time = millis;
        }
        if let Some(places) = self.round_decimal_places {
            performance.round_decimal_places = places;
        }
    }
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Initialize structured logging with an env-based filter, defaulting to info.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}

/// Parse the process arguments and run with `loader`.
pub fn run(loader: &mut dyn ModuleLoader) {
    run_with(Cli::parse(), loader);
}

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called.
pub fn run_with(cli: Cli, loader: &mut dyn ModuleLoader) {
    let mut reporter = ConsoleReporter::stderr(cli.verbose);
    match execute(cli, loader, &mut reporter) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute a run and return the exit code it implies.
pub fn execute(cli: Cli, loader: &mut dyn ModuleLoader, reporter: &mut dyn TestReporter) -> CliResult<ExitCode> {
    let mut config =
        Configuration::load_or_default(cli.config.as_deref()).map_err(|e| CliError::usage(format!("Error: {e}")))?;
    cli.apply_to(&mut config);

    let group_filter = filter(cli.group.as_deref())?;
    let test_filter = filter(cli.test.as_deref())?;
    let file_filter = filter(cli.file.as_deref())?;

    let entries = if cli.files.is_empty() {
        GlobDiscovery::new(&config.include, &config.disclude)
            .map_err(|e| CliError::usage(format!("Error: {e}")))?
            .with_file_filter(file_filter)
            .discover()
    } else {
        StaticDiscovery::new(cli.files).with_file_filter(file_filter).discover()
    }
    .map_err(|e| CliError::usage(format!("Error: {e}")))?;
    tracing::debug!(count = entries.len(), "entry files discovered");

    let options = RunOptions::from_config(&config)
        .with_group_filter(group_filter)
        .with_test_filter(test_filter)
        .with_run_tests(!cli.norun);

    let aggregate = run::run_entries(&entries, loader, reporter, &options);
    if aggregate.passed() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn filter(pattern: Option<&str>) -> CliResult<NameFilter> {
    let pattern = pattern.unwrap_or_default();
    NameFilter::new(pattern).map_err(|e| CliError::usage(format!("Error: invalid filter `{pattern}`: {e}")))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_files() {
        let cli = Cli::try_parse_from(["probe", "a.spec", "b.spec"]).unwrap();
        assert_eq!(cli.files, vec![PathBuf::from("a.spec"), PathBuf::from("b.spec")]);
        assert!(!cli.norun);
    }

    #[test]
    fn test_cli_parse_filters() {
        let cli = Cli::try_parse_from(["probe", "-g", "math", "-t", "^adds", "-f", "unit"]).unwrap();
        assert_eq!(cli.group.as_deref(), Some("math"));
        assert_eq!(cli.test.as_deref(), Some("^adds"));
        assert_eq!(cli.file.as_deref(), Some("unit"));
    }

    #[test]
    fn test_cli_parse_performance_flags() {
        let cli = Cli::try_parse_from([
            "probe",
            "--performance",
            "--max-samples",
            "50",
            "--max-test-run-time",
            "12.5",
            "--round-decimal-places",
            "2",
        ])
        .unwrap();
        assert!(cli.performance);
        assert_eq!(cli.max_samples, Some(50));
        assert_eq!(cli.max_test_run_time, Some(12.5));
        assert_eq!(cli.round_decimal_places, Some(2));
    }

    #[test]
    fn test_cli_overrides_configuration() {
        let cli = Cli::try_parse_from(["probe", "--output-binary", "--performance", "--max-samples", "7"]).unwrap();
        let mut config = Configuration::default();
        cli.apply_to(&mut config);
        assert!(config.output_binary);
        assert!(config.performance.enabled);
        assert_eq!(config.performance.max_samples, 7);
        assert_eq!(config.performance.round_decimal_places, 3);
    }

    #[test]
    fn test_invalid_filter_is_a_usage_error() {
        let err = filter(Some("(")).unwrap_err();
        assert_eq!(err.exit_code, ExitCode(2));
        assert!(err.message.contains("invalid filter `(`"));
    }

    #[test]
    fn test_cli_parse_flags() {
        let cli = Cli::try_parse_from(["probe", "--norun", "-v", "--config", "custom.json"]).unwrap();
        assert!(cli.norun);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("custom.json")));
    }
}
