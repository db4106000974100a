//! Export task polling with a bounded failure budget
//!
//! Submits an export task and polls `getTasks` until the task succeeds
//! or the anomaly budget is spent. The loop has no wall-clock bound:
//! a slow export that keeps reporting progress is waited out
//! indefinitely, and only anomalies (missing task, missing status,
//! remote-reported failure) move the loop toward giving up.

use crate::api::{ExportRequest, NotionClient, TaskState};
use crate::config::PollConfig;
use crate::error::{PollError, Result};
use crate::retry::with_retry;
use tracing::{info, warn};

/// Polls a single export task to completion
pub struct TaskPoller<'a> {
    client: &'a NotionClient,
    config: &'a PollConfig,
}

impl<'a> TaskPoller<'a> {
    /// Create a poller over a shared client
    #[must_use]
    pub fn new(client: &'a NotionClient, config: &'a PollConfig) -> Self {
        Self { client, config }
    }

    /// Submit an export request and await its terminal outcome
    ///
    /// Returns the download URL of the finished archive. The submission
    /// call is never retried; each status query gets the narrow inner
    /// retry from `config.status_retry` before its transport error
    /// becomes fatal.
    ///
    /// # Errors
    ///
    /// - [`crate::error::Error::Network`] on a failed submission or an
    ///   exhausted status-query retry.
    /// - [`PollError::BudgetExhausted`] once the anomaly budget is
    ///   spent without success.
    /// - [`PollError::MissingExportUrl`] when a success payload carries
    ///   no result location.
    pub async fn submit_and_await(&self, request: &ExportRequest) -> Result<String> {
        let task_id = self.client.enqueue_export(request).await?;
        info!(task_id = %task_id, format = %request.format, "enqueued export task");

        let task_ids = vec![task_id.clone()];
        let mut anomalies: u32 = 0;
        let mut last_error: Option<String> = None;

        loop {
            if anomalies >= self.config.failure_budget {
                return Err(PollError::BudgetExhausted {
                    task_id,
                    anomalies,
                    last_error,
                }
                .into());
            }

            tokio::time::sleep(self.config.poll_interval).await;

            let tasks = with_retry(&self.config.status_retry, || {
                self.client.get_tasks(&task_ids)
            })
            .await?;

            let Some(task) = tasks.into_iter().find(|t| t.id == task_id) else {
                anomalies += 1;
                warn!(task_id = %task_id, anomalies, "no matching task in response, waiting");
                continue;
            };

            let Some(status) = task.status else {
                anomalies += 1;
                warn!(task_id = %task_id, anomalies, state = ?task.state, "task has no status yet, waiting");
                continue;
            };

            match task.state {
                Some(TaskState::Success) => {
                    info!(task_id = %task_id, pages_exported = status.pages_exported, "export task succeeded");
                    return status
                        .export_url
                        .ok_or_else(|| PollError::MissingExportUrl { task_id }.into());
                }
                Some(TaskState::Failure) => {
                    anomalies += 1;
                    warn!(
                        task_id = %task_id,
                        anomalies,
                        error = task.error.as_deref().unwrap_or("unknown"),
                        "remote system reported a task failure, waiting for its retry"
                    );
                    last_error = task.error;
                }
                Some(TaskState::InProgress) => {
                    info!(
                        task_id = %task_id,
                        pages_exported = status.pages_exported,
                        "export in progress"
                    );
                }
                // Pending and unknown states poll on without spending budget
                Some(TaskState::Pending) | Some(TaskState::Unknown) | None => {}
            }
        }
    }
}
