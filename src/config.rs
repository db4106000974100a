//! Configuration types for notion-backup
//!
//! All settings are carried explicitly in [`Config`] and threaded into
//! client and exporter construction; nothing is read from ambient
//! process state after [`Config::from_env`] returns.

use crate::error::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable holding the `token_v2` session credential
pub const ENV_TOKEN: &str = "NOTION_TOKEN";
/// Environment variable holding the `file_token` file-access credential
pub const ENV_FILE_TOKEN: &str = "NOTION_FILE_TOKEN";
/// Environment variable holding the target workspace (space) identifier
pub const ENV_SPACE_ID: &str = "NOTION_SPACE_ID";
/// Environment variable selecting which export formats to produce
pub const ENV_EXPORT_TYPE: &str = "EXPORT_TYPE";

/// Default base URL of the Notion API
pub const DEFAULT_API_BASE_URL: &str = "https://www.notion.so/api/v3";

/// Default pattern recognizing nested archive fragments
///
/// Large space exports are delivered chunked: the top-level archive
/// contains secondary `... Part-<N>.zip` archives. This is the remote
/// export service's naming contract, matched case-insensitively against
/// the end of each file name.
pub const DEFAULT_NESTED_FRAGMENT_PATTERN: &str = r"(?i)Part-\d+\.zip$";

/// Export output format
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    /// Markdown + CSV export
    Markdown,
    /// HTML export
    Html,
}

impl ExportFormat {
    /// The format name as the remote API and the local paths use it
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Markdown => "markdown",
            ExportFormat::Html => "html",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Retry behavior for the status-query call
///
/// This policy only covers the narrow `getTasks` retry; it is distinct
/// from the poller's anomaly budget (see [`PollConfig`]).
#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Total number of attempts, the initial call included (default: 3)
    pub max_attempts: u32,
    /// Delay before the first retry (default: 2s)
    pub initial_delay: Duration,
    /// Upper bound on any single delay (default: 2s)
    pub max_delay: Duration,
    /// Multiplier applied to the delay after each attempt (default: 1.0, fixed delay)
    pub backoff_multiplier: f64,
    /// Add random jitter to delays (default: false)
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(2),
            backoff_multiplier: 1.0,
            jitter: false,
        }
    }
}

/// Polling behavior for export tasks
///
/// The loop is bounded by an anomaly counter, not by elapsed time: a
/// slow export that keeps reporting progress polls forever, while
/// anomalies (missing task, missing status, remote-reported failure)
/// spend the budget.
#[derive(Clone, Debug)]
pub struct PollConfig {
    /// Wait between status queries (default: 10s)
    pub poll_interval: Duration,
    /// Tolerated anomalies before giving up (default: 5)
    pub failure_budget: u32,
    /// Retry policy for each individual status query
    pub status_retry: RetryConfig,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            failure_budget: 5,
            status_retry: RetryConfig::default(),
        }
    }
}

/// Main configuration for the export run
#[derive(Clone, Debug)]
pub struct Config {
    /// Session credential (`token_v2` cookie value)
    pub token: String,
    /// File-access credential (`file_token` cookie value)
    pub file_token: String,
    /// Target workspace identifier
    pub space_id: String,
    /// Which format to export; `None` exports both markdown and html
    pub export_format: Option<ExportFormat>,
    /// Base URL of the Notion API
    pub api_base_url: String,
    /// Directory receiving `<format>.zip` and `<format>/` (default: cwd)
    pub output_dir: PathBuf,
    /// Polling behavior
    pub poll: PollConfig,
    /// Regex recognizing nested archive fragments inside an extracted tree
    pub nested_fragment_pattern: String,
}

impl Config {
    /// Load configuration from the environment
    ///
    /// Reads `NOTION_TOKEN`, `NOTION_FILE_TOKEN` and `NOTION_SPACE_ID`
    /// (all required) and the optional `EXPORT_TYPE` selector. Runs
    /// before any network activity so a missing credential aborts
    /// immediately.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the first missing required
    /// variable.
    pub fn from_env() -> Result<Self> {
        let token = require_env(ENV_TOKEN)?;
        let file_token = require_env(ENV_FILE_TOKEN)?;
        let space_id = require_env(ENV_SPACE_ID)?;

        let mut config = Self::with_credentials(token, file_token, space_id);
        config.export_format =
            parse_export_format(std::env::var(ENV_EXPORT_TYPE).ok().as_deref());
        Ok(config)
    }

    /// Build a configuration with explicit credentials and defaults for
    /// everything else
    #[must_use]
    pub fn with_credentials(
        token: impl Into<String>,
        file_token: impl Into<String>,
        space_id: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            file_token: file_token.into(),
            space_id: space_id.into(),
            export_format: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            output_dir: PathBuf::from("."),
            poll: PollConfig::default(),
            nested_fragment_pattern: DEFAULT_NESTED_FRAGMENT_PATTERN.to_string(),
        }
    }
}

/// Read a required environment variable, treating empty values as unset
fn require_env(key: &str) -> Result<String> {
    match std::env::var(key) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(Error::Config {
            message: format!(
                "{key} must be defined in the environment \
                 (see the README for how to obtain it)"
            ),
            key: Some(key.to_string()),
        }),
    }
}

/// Parse the `EXPORT_TYPE` selector
///
/// `markdown` and `html` (case-insensitive) select a single format.
/// Empty or unset selects both. Any other value also falls through to
/// both, with a warning; the remote service only knows these two
/// formats.
fn parse_export_format(value: Option<&str>) -> Option<ExportFormat> {
    match value.map(|v| v.trim().to_lowercase()).as_deref() {
        Some("markdown") => Some(ExportFormat::Markdown),
        Some("html") => Some(ExportFormat::Html),
        Some("") | None => None,
        Some(other) => {
            tracing::warn!(
                export_type = other,
                "unrecognized EXPORT_TYPE value, exporting both markdown and html"
            );
            None
        }
    }
}
