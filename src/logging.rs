/// Structured logging for the coastal monitoring client
///
/// The library itself only emits `tracing` events (session lifecycle,
/// request dispatch, failed statuses). This module installs a subscriber for
/// binaries and classifies request failures so that expected gaps in sensor
/// coverage don't drown out real service problems.
///
/// Neither the API key nor the referer is ever logged.

use std::fmt;
use std::path::Path;

use tracing::{debug, error, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt as tracing_fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::model::ClientError;

/// Targets whose events pass the default filter.
const CRATE_TARGETS: &[&str] = &["coastal_monitoring_client", "cmclient"];

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Maps CLI flags onto a level: `quiet` → error, otherwise by `-v`
    /// count, 0 → warn, 1 → info, 2+ → debug.
    pub fn from_verbosity(verbosity: u8, quiet: bool) -> Self {
        if quiet {
            return LogLevel::Error;
        }
        match verbosity {
            0 => LogLevel::Warning,
            1 => LogLevel::Info,
            _ => LogLevel::Debug,
        }
    }

    fn directive(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - sensor offline or no reading near the requested time
    Expected,
    /// Unexpected failure - bad credentials, service degradation, or API change
    Unexpected,
    /// Unknown - cannot determine if this is expected or not
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Subscriber setup
// ---------------------------------------------------------------------------

/// Initialize the global subscriber.
///
/// Console output goes to stderr so table/CSV output on stdout stays clean.
/// When `log_file` is given, events are also appended there without ANSI
/// colour codes. `RUST_LOG` overrides `min_level` if set.
///
/// Calling this more than once is harmless: only the first call installs a
/// subscriber.
pub fn init_logger(
    min_level: LogLevel,
    log_file: Option<&Path>,
    console_timestamps: bool,
) -> Result<(), ClientError> {
    let default_filter = CRATE_TARGETS
        .iter()
        .map(|target| format!("{}={}", target, min_level.directive()))
        .collect::<Vec<_>>()
        .join(",");
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let console = if console_timestamps {
        tracing_fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_fmt::layer()
            .with_target(false)
            .without_time()
            .with_writer(std::io::stderr)
            .boxed()
    };

    let file_layer = match log_file {
        Some(path) => Some(
            tracing_fmt::layer()
                .with_ansi(false)
                .with_writer(file_appender(path)?)
                .boxed(),
        ),
        None => None,
    };

    // Err here only means a subscriber is already installed.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init();

    Ok(())
}

/// Appending writer for `path`. No rotation: the file name is used as given.
fn file_appender(path: &Path) -> Result<RollingFileAppender, ClientError> {
    let file_name = path.file_name().ok_or_else(|| {
        ClientError::config(format!("log file path '{}' has no file name", path.display()))
    })?;
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name.to_string_lossy().into_owned())
        .build(directory)
        .map_err(|e| ClientError::config(format!("cannot open log file {}: {}", path.display(), e)))
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify a failed request by error kind and HTTP status.
pub fn classify_failure(err: &ClientError) -> FailureType {
    match err {
        // No reading for this sensor/time: routine for seasonal or offline buoys
        ClientError::RequestFailed { status_code: 404 } => FailureType::Expected,
        // Credentials or referer rejected, or the service itself is failing
        ClientError::RequestFailed { status_code: 401 | 403 } => FailureType::Unexpected,
        ClientError::RequestFailed { status_code } if *status_code >= 500 => {
            FailureType::Unexpected
        }
        // Parse failures suggest the response schema changed
        err if err.is_parse_error() => FailureType::Unexpected,
        ClientError::NotConnected | ClientError::Config { .. } => FailureType::Unexpected,
        _ => FailureType::Unknown,
    }
}

/// Log a failed request with automatic classification.
pub fn log_request_failure(sensor: &str, operation: &str, err: &ClientError) {
    let failure_type = classify_failure(err);

    match failure_type {
        FailureType::Expected => {
            debug!(sensor, "{} failed [{}]: {}", operation, failure_type, err)
        }
        FailureType::Unexpected => {
            error!(sensor, "{} failed [{}]: {}", operation, failure_type, err)
        }
        FailureType::Unknown => {
            warn!(sensor, "{} failed [{}]: {}", operation, failure_type, err)
        }
    }
}
