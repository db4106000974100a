//! Notion API client and wire types
//!
//! The transport layer of the export pipeline: one authenticated
//! `reqwest` client shared by every pipeline, exposing the three calls
//! the protocol needs (`enqueueTask`, `getTasks`, and the archive
//! download). Field names on the wire types follow the remote API
//! exactly (`taskIds`, `pagesExported`, `exportURL`).

use crate::config::{Config, ExportFormat};
use crate::error::{Error, Result};
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Event name of the space-wide export task
const EXPORT_EVENT_NAME: &str = "exportSpace";
/// Fixed locale sent with every export request
const EXPORT_LOCALE: &str = "en";
/// Fixed time zone sent with every export request
const EXPORT_TIME_ZONE: &str = "America/New_York";

/// A single export request: one format against one workspace
///
/// Created once per orchestrator invocation and consumed by the poller;
/// locale and time zone are fixed constants of the protocol.
#[derive(Clone, Debug)]
pub struct ExportRequest {
    /// Desired output format
    pub format: ExportFormat,
    /// Target workspace identifier
    pub space_id: String,
}

#[derive(Serialize)]
struct EnqueueTaskBody<'a> {
    task: TaskDescriptor<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TaskDescriptor<'a> {
    event_name: &'a str,
    request: ExportSpaceRequest<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportSpaceRequest<'a> {
    space_id: &'a str,
    export_options: ExportOptions<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportOptions<'a> {
    export_type: &'a str,
    time_zone: &'a str,
    locale: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnqueueTaskResponse {
    task_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GetTasksBody<'a> {
    task_ids: &'a [String],
}

#[derive(Deserialize)]
struct GetTasksResponse {
    #[serde(default)]
    results: Vec<Task>,
}

/// Task state as reported by the remote system
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Enqueued, not started yet
    Pending,
    /// Export is running
    InProgress,
    /// Export finished; the status payload carries the result URL
    Success,
    /// The remote system reported a failure for this attempt
    Failure,
    /// Forward compatibility: any state this client does not know
    #[serde(other)]
    Unknown,
}

/// Status payload attached to a task once the remote system populates it
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatus {
    /// Progress indicator while the export is running (informational only)
    #[serde(default)]
    pub pages_exported: Option<u64>,
    /// Download location of the finished archive; set only on success
    #[serde(default, rename = "exportURL")]
    pub export_url: Option<String>,
}

/// An export task as observed through `getTasks`
///
/// The remote system owns all mutation; the client only ever reads
/// these. Every field beyond the id may lag behind submission.
#[derive(Clone, Debug, Deserialize)]
pub struct Task {
    /// Remote-assigned identifier, stable for the task's lifetime
    pub id: String,
    /// Reported state, if populated yet
    #[serde(default)]
    pub state: Option<TaskState>,
    /// Status payload, if populated yet
    #[serde(default)]
    pub status: Option<TaskStatus>,
    /// Error detail, set when the state is `failure`
    #[serde(default)]
    pub error: Option<String>,
}

/// Authenticated client for the Notion API
///
/// Cheap to clone (the inner `reqwest::Client` is an `Arc`); safe for
/// concurrent use by both format pipelines. Credentials are fixed at
/// construction, no per-call mutable state.
#[derive(Clone, Debug)]
pub struct NotionClient {
    http: reqwest::Client,
    base_url: String,
}

impl NotionClient {
    /// Build a client from the run configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the credentials cannot form a valid
    /// `Cookie` header, or [`Error::Network`] if the underlying client
    /// cannot be constructed.
    pub fn new(config: &Config) -> Result<Self> {
        let cookie = format!(
            "token_v2={}; file_token={}",
            config.token, config.file_token
        );
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&cookie).map_err(|e| Error::Config {
                message: format!("credentials are not valid Cookie header values: {e}"),
                key: Some(crate::config::ENV_TOKEN.to_string()),
            })?,
        );

        let http = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Enqueue a space-wide export task
    ///
    /// Returns the remote-assigned task identifier. A transport error
    /// here is fatal to the whole run: it signals malformed
    /// configuration or an unreachable service, and is never retried.
    pub async fn enqueue_export(&self, request: &ExportRequest) -> Result<String> {
        let body = EnqueueTaskBody {
            task: TaskDescriptor {
                event_name: EXPORT_EVENT_NAME,
                request: ExportSpaceRequest {
                    space_id: &request.space_id,
                    export_options: ExportOptions {
                        export_type: request.format.as_str(),
                        time_zone: EXPORT_TIME_ZONE,
                        locale: EXPORT_LOCALE,
                    },
                },
            },
        };

        let response: EnqueueTaskResponse = self
            .http
            .post(format!("{}/enqueueTask", self.base_url))
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        debug!(task_id = %response.task_id, format = %request.format, "export task enqueued");
        Ok(response.task_id)
    }

    /// Query the status of one or more tasks
    pub async fn get_tasks(&self, task_ids: &[String]) -> Result<Vec<Task>> {
        let response: GetTasksResponse = self
            .http
            .post(format!("{}/getTasks", self.base_url))
            .json(&GetTasksBody { task_ids })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response.results)
    }

    /// Start a streaming download of a finished export archive
    ///
    /// The returned response has already been checked for an error
    /// status; the caller consumes its byte stream.
    pub async fn download(&self, url: &str) -> Result<reqwest::Response> {
        let response = self.http.get(url).send().await?.error_for_status()?;
        Ok(response)
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base_url: String) -> Config {
        let mut config = Config::with_credentials("tok", "ftok", "space-1");
        config.api_base_url = base_url;
        config
    }

    #[tokio::test]
    async fn enqueue_export_sends_the_full_task_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/enqueueTask"))
            .and(header("Cookie", "token_v2=tok; file_token=ftok"))
            .and(body_partial_json(serde_json::json!({
                "task": {
                    "eventName": "exportSpace",
                    "request": {
                        "spaceId": "space-1",
                        "exportOptions": {
                            "exportType": "markdown",
                            "timeZone": "America/New_York",
                            "locale": "en",
                        },
                    },
                },
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"taskId": "t-1"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = NotionClient::new(&test_config(server.uri())).unwrap();
        let task_id = client
            .enqueue_export(&ExportRequest {
                format: ExportFormat::Markdown,
                space_id: "space-1".into(),
            })
            .await
            .unwrap();

        assert_eq!(task_id, "t-1");
    }

    #[tokio::test]
    async fn enqueue_export_propagates_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/enqueueTask"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = NotionClient::new(&test_config(server.uri())).unwrap();
        let err = client
            .enqueue_export(&ExportRequest {
                format: ExportFormat::Html,
                space_id: "space-1".into(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, crate::error::Error::Network(_)));
    }

    #[tokio::test]
    async fn get_tasks_deserializes_the_remote_field_names() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/getTasks"))
            .and(body_partial_json(serde_json::json!({"taskIds": ["t-1"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [{
                    "id": "t-1",
                    "state": "success",
                    "status": {
                        "pagesExported": 128,
                        "exportURL": "https://files.example.com/export.zip",
                    },
                }],
            })))
            .mount(&server)
            .await;

        let client = NotionClient::new(&test_config(server.uri())).unwrap();
        let tasks = client.get_tasks(&["t-1".to_string()]).await.unwrap();

        assert_eq!(tasks.len(), 1);
        let task = &tasks[0];
        assert_eq!(task.id, "t-1");
        assert_eq!(task.state, Some(TaskState::Success));
        let status = task.status.as_ref().unwrap();
        assert_eq!(status.pages_exported, Some(128));
        assert_eq!(
            status.export_url.as_deref(),
            Some("https://files.example.com/export.zip")
        );
        assert_eq!(task.error, None);
    }

    #[tokio::test]
    async fn get_tasks_tolerates_sparse_task_payloads() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/getTasks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [
                    {"id": "t-1"},
                    {"id": "t-2", "state": "failure", "error": "Export failed"},
                    {"id": "t-3", "state": "some_future_state", "status": {}},
                ],
            })))
            .mount(&server)
            .await;

        let client = NotionClient::new(&test_config(server.uri())).unwrap();
        let tasks = client.get_tasks(&["t-1".to_string()]).await.unwrap();

        assert_eq!(tasks[0].state, None);
        assert!(tasks[0].status.is_none());
        assert_eq!(tasks[1].state, Some(TaskState::Failure));
        assert_eq!(tasks[1].error.as_deref(), Some("Export failed"));
        assert_eq!(tasks[2].state, Some(TaskState::Unknown));
    }

    #[tokio::test]
    async fn download_streams_the_archive_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/export.zip"))
            .and(header("Cookie", "token_v2=tok; file_token=ftok"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"archive bytes".to_vec()))
            .mount(&server)
            .await;

        let client = NotionClient::new(&test_config(server.uri())).unwrap();
        let response = client
            .download(&format!("{}/export.zip", server.uri()))
            .await
            .unwrap();
        let bytes = response.bytes().await.unwrap();

        assert_eq!(bytes.as_ref(), b"archive bytes");
    }

    #[tokio::test]
    async fn download_rejects_error_statuses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/export.zip"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = NotionClient::new(&test_config(server.uri())).unwrap();
        let err = client
            .download(&format!("{}/export.zip", server.uri()))
            .await
            .unwrap_err();

        assert!(matches!(err, crate::error::Error::Network(_)));
    }
}
