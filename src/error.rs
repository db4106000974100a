//! Error types for notion-backup
//!
//! Almost everything in this crate is fatal by design: the only two
//! recoverable paths are the narrow status-query retry (see
//! [`crate::retry`]) and the poller's anomaly budget (see
//! [`crate::poller`]). Every other error propagates up and terminates
//! the run.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for notion-backup operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for notion-backup
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "NOTION_TOKEN")
        key: Option<String>,
    },

    /// Network error (task submission, status query, or archive download)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// I/O error (archive file writes, directory management)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Polling terminated without a usable result
    #[error("poll error: {0}")]
    Poll(#[from] PollError),

    /// Archive extraction failed (top-level or nested)
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),
}

/// Terminal polling failures
///
/// Transient anomalies (task not found, status missing, remote-reported
/// failure) are never surfaced individually; they only appear here once
/// the failure budget is exhausted.
#[derive(Debug, Error)]
pub enum PollError {
    /// The anomaly budget was spent without the task reaching success
    #[error(
        "export task {task_id} did not succeed after {anomalies} tolerated anomalies{}",
        .last_error.as_deref().map(|e| format!(" (last remote error: {e})")).unwrap_or_default()
    )]
    BudgetExhausted {
        /// The remote task identifier
        task_id: String,
        /// How many anomalies were tolerated before giving up
        anomalies: u32,
        /// The most recent error detail reported by the remote system, if any
        last_error: Option<String>,
    },

    /// The task reported success but its status payload carried no export URL
    #[error("export task {task_id} succeeded without an export URL")]
    MissingExportUrl {
        /// The remote task identifier
        task_id: String,
    },
}

/// Archive extraction errors
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Archive could not be read or an entry could not be written
    #[error("extraction failed for {}: {reason}", archive.display())]
    Failed {
        /// The archive file that failed to extract
        archive: PathBuf,
        /// The reason extraction failed
        reason: String,
    },
}
