//! Export orchestration and format dispatch
//!
//! One pipeline per format: poll the export task to completion, stream
//! the archive to `<output_dir>/<format>.zip`, destructively recreate
//! `<output_dir>/<format>/`, extract, and resolve nested fragments.
//! When no single format is selected, both pipelines run concurrently
//! over the shared client; the first fatal error stops the join and
//! drops the sibling pipeline.

use crate::api::{ExportRequest, NotionClient};
use crate::config::{Config, ExportFormat};
use crate::error::Result;
use crate::extraction::{self, compile_fragment_pattern};
use crate::poller::TaskPoller;
use futures::StreamExt;
use regex::Regex;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::info;

/// Drives the export pipeline for one or both formats
pub struct Exporter {
    client: NotionClient,
    config: Config,
    fragment_pattern: Regex,
}

impl Exporter {
    /// Build an exporter and its shared authenticated client
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::Config`] for an invalid
    /// nested-fragment pattern or unusable credentials.
    pub fn new(config: Config) -> Result<Self> {
        let client = NotionClient::new(&config)?;
        let fragment_pattern = compile_fragment_pattern(&config.nested_fragment_pattern)?;
        Ok(Self {
            client,
            config,
            fragment_pattern,
        })
    }

    /// Run the export for the configured format selection
    ///
    /// A single selected format runs alone; no selection runs markdown
    /// and html concurrently. Any pipeline error is fatal to the whole
    /// run, including the sibling pipeline's remaining work.
    pub async fn run(&self) -> Result<()> {
        match self.config.export_format {
            Some(format) => {
                info!(%format, "exporting one format");
                self.export(format).await
            }
            None => {
                info!("no export format specified, exporting markdown and html");
                tokio::try_join!(
                    self.export(ExportFormat::Markdown),
                    self.export(ExportFormat::Html)
                )?;
                Ok(())
            }
        }
    }

    /// Run the full pipeline for a single format
    ///
    /// Steps are strictly sequential: submit and poll, download,
    /// recreate the target directory, extract, resolve nested
    /// fragments. Paths are deterministic per format and overwritten on
    /// each run.
    pub async fn export(&self, format: ExportFormat) -> Result<()> {
        let archive_path = self.config.output_dir.join(format!("{format}.zip"));
        let target_dir = self.config.output_dir.join(format.as_str());

        let request = ExportRequest {
            format,
            space_id: self.config.space_id.clone(),
        };
        let poller = TaskPoller::new(&self.client, &self.config.poll);
        let export_url = poller.submit_and_await(&request).await?;

        tokio::fs::create_dir_all(&self.config.output_dir).await?;
        self.download_archive(&export_url, &archive_path).await?;
        info!(%format, archive = ?archive_path, "archive downloaded");

        // Destructive recreate: absence of the old tree is not an error
        match tokio::fs::remove_dir_all(&target_dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        tokio::fs::create_dir_all(&target_dir).await?;

        extraction::extract_archive(&archive_path, &target_dir)?;
        extraction::resolve_nested_archives(&target_dir, &self.fragment_pattern)?;

        info!(%format, target = ?target_dir, "export complete");
        Ok(())
    }

    /// Stream a finished export archive to disk
    ///
    /// The whole stream is written and the file synced before this
    /// returns; any stream error propagates as fatal.
    async fn download_archive(&self, url: &str, dest: &Path) -> Result<()> {
        let response = self.client.download(url).await?;
        let mut stream = response.bytes_stream();

        let mut file = tokio::fs::File::create(dest).await?;
        while let Some(chunk) = stream.next().await {
            file.write_all(&chunk?).await?;
        }
        file.flush().await?;
        file.sync_all().await?;
        Ok(())
    }
}
