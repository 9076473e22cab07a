//! Error types used by the provwatch runtime.
//!
//! This module defines two enums:
//!
//! - [`MonitorError`]: fatal errors that abort a run (startup, readiness, node commands).
//! - [`ScanError`]: errors raised while scanning a diagnostic stream line by line.
//!
//! Per-item failures (a bad identifier, a bad base64 key, an unparsable log line)
//! are not represented here: they are absorbed where they happen.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging.

use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// # Errors produced while scanning a line-oriented stream.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ScanError {
    /// A single line exceeded the configured buffer capacity.
    #[error("line exceeds scan capacity of {capacity} bytes")]
    LineTooLong {
        /// The configured per-line capacity in bytes.
        capacity: usize,
    },

    /// Reading from the underlying stream failed.
    #[error("stream read failed: {0}")]
    Io(#[from] io::Error),
}

impl ScanError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ScanError::LineTooLong { .. } => "scan_line_too_long",
            ScanError::Io(_) => "scan_io",
        }
    }
}

/// # Errors that abort a monitoring run.
///
/// Every variant is fatal: the controller moves straight to shutdown and the
/// binary exits non-zero.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum MonitorError {
    /// The node process could not be launched.
    #[error("failed to start `{program}`: {source}")]
    Start {
        /// Program that was being launched.
        program: String,
        /// Underlying spawn error.
        #[source]
        source: io::Error,
    },

    /// The control stream closed before the readiness marker was seen.
    #[error("node never became ready: stream closed before `{marker}` appeared")]
    Readiness {
        /// The marker that was awaited.
        marker: String,
    },

    /// The readiness marker did not appear within the configured deadline.
    #[error("node not ready after {timeout:?}")]
    ReadinessTimeout {
        /// The configured readiness deadline.
        timeout: Duration,
    },

    /// Scanning the control stream failed while awaiting readiness.
    #[error("readiness scan failed: {0}")]
    Scan(#[from] ScanError),

    /// A node CLI invocation exited unsuccessfully.
    #[error("`{command}` failed: {stderr}")]
    NodeCommand {
        /// The command line that was run.
        command: String,
        /// Captured stderr of the failed command.
        stderr: String,
    },

    /// Content ingestion returned no identifiers.
    #[error("ingest of {dir:?} produced no identifiers")]
    Ingest {
        /// Directory that was ingested.
        dir: PathBuf,
    },

    /// The repository configuration could not be read, parsed or written.
    #[error("repository config {path:?}: {reason}")]
    Config {
        /// Path of the config file.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// Registering OS signal handlers failed.
    #[error("signal registration failed: {0}")]
    Signal(#[source] io::Error),

    /// Other filesystem failure during bootstrap.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl MonitorError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use provwatch::MonitorError;
    ///
    /// let err = MonitorError::Readiness { marker: "Daemon is ready".into() };
    /// assert_eq!(err.as_label(), "monitor_readiness");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            MonitorError::Start { .. } => "monitor_start",
            MonitorError::Readiness { .. } => "monitor_readiness",
            MonitorError::ReadinessTimeout { .. } => "monitor_readiness_timeout",
            MonitorError::Scan(_) => "monitor_scan",
            MonitorError::NodeCommand { .. } => "monitor_node_command",
            MonitorError::Ingest { .. } => "monitor_ingest",
            MonitorError::Config { .. } => "monitor_config",
            MonitorError::Signal(_) => "monitor_signal",
            MonitorError::Io(_) => "monitor_io",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            MonitorError::Start { program, source } => format!("start {program}: {source}"),
            MonitorError::Readiness { marker } => format!("eof before marker {marker:?}"),
            MonitorError::ReadinessTimeout { timeout } => format!("not ready after {timeout:?}"),
            MonitorError::Scan(e) => format!("scan: {e}"),
            MonitorError::NodeCommand { command, stderr } => {
                format!("command {command:?}: {}", stderr.trim())
            }
            MonitorError::Ingest { dir } => format!("empty ingest of {}", dir.display()),
            MonitorError::Config { path, reason } => format!("{}: {reason}", path.display()),
            MonitorError::Signal(e) => format!("signal: {e}"),
            MonitorError::Io(e) => format!("io: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_stable() {
        let err = MonitorError::ReadinessTimeout {
            timeout: Duration::from_secs(3),
        };
        assert_eq!(err.as_label(), "monitor_readiness_timeout");
        assert_eq!(
            ScanError::LineTooLong { capacity: 8 }.as_label(),
            "scan_line_too_long"
        );
    }

    #[test]
    fn scan_error_converts_into_monitor_error() {
        let err: MonitorError = ScanError::LineTooLong { capacity: 1024 }.into();
        assert!(matches!(err, MonitorError::Scan(_)));
        assert!(err.to_string().contains("1024"));
    }

    #[test]
    fn node_command_message_trims_stderr() {
        let err = MonitorError::NodeCommand {
            command: "ipfs init".into(),
            stderr: "repo exists\n".into(),
        };
        assert_eq!(err.as_message(), "command \"ipfs init\": repo exists");
    }
}
