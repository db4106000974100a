//! # notion-backup
//!
//! Export client for the Notion workspace API: enqueue a space-wide
//! export task, poll its status with a bounded failure budget, stream
//! the finished archive to disk, and unpack it (including the chunked
//! `Part-<N>.zip` fragments of large exports) into a per-format
//! directory tree.
//!
//! ## Quick Start
//!
//! ```no_run
//! use notion_backup::{Config, Exporter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads NOTION_TOKEN, NOTION_FILE_TOKEN, NOTION_SPACE_ID and
//!     // the optional EXPORT_TYPE selector from the environment.
//!     let config = Config::from_env()?;
//!     Exporter::new(config)?.run().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Notion API client and wire types
pub mod api;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Export orchestration and format dispatch
pub mod exporter;
/// Archive extraction and nested fragment resolution
pub mod extraction;
/// Export task polling
pub mod poller;
/// Retry logic for transient transport failures
pub mod retry;

// Re-export commonly used types
pub use api::{ExportRequest, NotionClient, Task, TaskState, TaskStatus};
pub use config::{Config, ExportFormat, PollConfig, RetryConfig};
pub use error::{Error, ExtractionError, PollError, Result};
pub use exporter::Exporter;
pub use poller::TaskPoller;
