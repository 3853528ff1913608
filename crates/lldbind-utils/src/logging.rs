//! # Logging Utilities
//!
//! Logging infrastructure for lldbind using `tracing`.
//!
//! - Pretty output for interactive use, JSON for machine consumption
//! - Filtering through `RUST_LOG` (e.g. `RUST_LOG=lldbind_core=debug`)
//! - Optional daily-rolling log file next to console output
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lldbind_utils::init_logging;
//!
//! // Keep the guard alive for as long as file logging should flush.
//! let _guard = init_logging().expect("Failed to initialize logging");
//! tracing::info!("Session started");
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: level filter (`debug`, `lldbind_core=trace`, ...)
//! - `LLDBIND_LOG_FORMAT`: `pretty` (default) or `json`
//! - `LLDBIND_LOG_FILE`: optional log file path; a date suffix is added per day

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::{env, io};

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

pub const LOG_FORMAT_ENV: &str = "LLDBIND_LOG_FORMAT";
pub const LOG_FILE_ENV: &str = "LLDBIND_LOG_FILE";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat
{
    /// Human-readable, coloured on the console
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "pretty" | "dev" | "text" => Ok(LogFormat::Pretty),
            "json" | "prod" => Ok(LogFormat::Json),
            _ => Err(LoggingError::InvalidFormat(format!("{s}. Use 'pretty' or 'json'"))),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel
{
    Error,
    Warn,
    /// The default
    Info,
    Debug,
    /// Includes every handle release
    Trace,
}

impl From<LogLevel> for Level
{
    fn from(level: LogLevel) -> Self
    {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl FromStr for LogLevel
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "error" | "err" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "dbg" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(LoggingError::InvalidLevel(format!(
                "{s}. Use 'error', 'warn', 'info', 'debug', or 'trace'"
            ))),
        }
    }
}

/// Initialize logging from the environment
///
/// Returns the file writer's guard when `LLDBIND_LOG_FILE` is set; buffered
/// file output is flushed when it is dropped.
///
/// ## Errors
///
/// Returns an error if `LLDBIND_LOG_FORMAT` is not a known format or a global
/// subscriber is already installed.
pub fn init_logging() -> Result<Option<WorkerGuard>, LoggingError>
{
    init_logging_with_format(log_format_from_env()?)
}

/// Initialize logging with an explicit format, filtered by `RUST_LOG`
///
/// ## Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging_with_format(format: LogFormat) -> Result<Option<WorkerGuard>, LoggingError>
{
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()));
    install(format, filter, log_file_from_env().as_deref())
}

/// The format named by `LLDBIND_LOG_FORMAT`, or the default when unset.
///
/// ## Errors
///
/// Returns `InvalidFormat` for an unknown format name.
pub fn log_format_from_env() -> Result<LogFormat, LoggingError>
{
    match env::var(LOG_FORMAT_ENV) {
        Ok(value) => value.parse(),
        Err(_) => Ok(LogFormat::default()),
    }
}

/// Initialize logging with an explicit level and format
///
/// The level applies to every target; `RUST_LOG` is ignored.
///
/// ## Example
///
/// ```rust,no_run
/// use lldbind_utils::{init_logging_with_level, LogFormat, LogLevel};
///
/// let _guard = init_logging_with_level(LogLevel::Debug, LogFormat::Pretty)
///     .expect("Failed to initialize logging");
/// ```
///
/// ## Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging_with_level(level: LogLevel, format: LogFormat) -> Result<Option<WorkerGuard>, LoggingError>
{
    let filter = EnvFilter::new(Level::from(level).to_string());
    install(format, filter, log_file_from_env().as_deref())
}

fn log_file_from_env() -> Option<PathBuf>
{
    env::var_os(LOG_FILE_ENV).map(PathBuf::from)
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

fn install(format: LogFormat, filter: EnvFilter, log_file: Option<&Path>) -> Result<Option<WorkerGuard>, LoggingError>
{
    let mut layers: Vec<BoxedLayer> = vec![event_layer(format, io::stderr, true).with_filter(filter.clone()).boxed()];

    let guard = match log_file {
        Some(path) => {
            let directory = path.parent().filter(|dir| !dir.as_os_str().is_empty()).unwrap_or(Path::new("."));
            std::fs::create_dir_all(directory)?;
            let appender = tracing_appender::rolling::daily(directory, path.file_name().unwrap_or_default());
            let (writer, guard) = tracing_appender::non_blocking(appender);
            layers.push(event_layer(format, writer, false).with_filter(filter).boxed());
            Some(guard)
        }
        None => None,
    };

    Registry::default()
        .with(layers)
        .try_init()
        .map_err(|err| LoggingError::InitializationFailed(err.to_string()))?;
    Ok(guard)
}

/// One formatting layer. Console output is coloured; file output records
/// thread ids instead.
fn event_layer<W>(format: LogFormat, writer: W, console: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(!console)
        .with_timer(ChronoUtc::rfc_3339());
    match format {
        LogFormat::Pretty => layer.with_ansi(console).boxed(),
        LogFormat::Json => layer.json().with_current_span(true).with_span_list(true).boxed(),
    }
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError
{
    #[error("Invalid log format: {0}")]
    InvalidFormat(String),

    #[error("Invalid log level: {0}")]
    InvalidLevel(String),

    /// A global subscriber was already set.
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),

    #[error("File logging error: {0}")]
    FileError(#[from] io::Error),
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_log_format_from_str()
    {
        assert_eq!(LogFormat::from_str("pretty").unwrap(), LogFormat::Pretty);
        assert_eq!(LogFormat::from_str("JSON").unwrap(), LogFormat::Json);
        assert_eq!(LogFormat::from_str("text").unwrap(), LogFormat::Pretty);
        assert!(matches!(LogFormat::from_str("xml"), Err(LoggingError::InvalidFormat(_))));
    }

    #[test]
    fn test_log_level_from_str()
    {
        assert_eq!(LogLevel::from_str("warning").unwrap(), LogLevel::Warn);
        assert_eq!(LogLevel::from_str("dbg").unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::from_str("trace").unwrap(), LogLevel::Trace);
        assert!(matches!(LogLevel::from_str("loud"), Err(LoggingError::InvalidLevel(_))));
    }

    #[test]
    fn test_log_level_ordering_and_conversion()
    {
        assert!(LogLevel::Trace > LogLevel::Info);
        assert_eq!(Level::from(LogLevel::Error), Level::ERROR);
        assert_eq!(Level::from(LogLevel::Trace), Level::TRACE);
    }

    #[test]
    fn test_second_init_fails()
    {
        let first = init_logging_with_level(LogLevel::Warn, LogFormat::Pretty);
        let second = init_logging_with_level(LogLevel::Warn, LogFormat::Json);
        // Another test binary may have installed a subscriber first
        assert!(first.is_err() || matches!(second, Err(LoggingError::InitializationFailed(_))));
    }

    #[test]
    fn test_init_with_format_reports_double_install()
    {
        let first = init_logging_with_format(LogFormat::Json);
        let second = init_logging_with_format(LogFormat::Pretty);
        assert!(first.is_err() || matches!(second, Err(LoggingError::InitializationFailed(_))));
    }
}
