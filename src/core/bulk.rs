use crate::config::toml_config::AppConfig;
use crate::core::csv_io::{read_rows, write_records};
use crate::core::retry::RetryClient;
use crate::domain::model::{BulkLogRecord, CallOutcome, CallStatus, FileSummary, Row};
use crate::domain::payload::KeepProfileEvent;
use crate::domain::ports::{FileProcessor, Transport};
use crate::utils::error::Result;
use std::path::{Path, PathBuf};

pub const SIMULATED: &str = "Simulated";
pub const SUCCESS: &str = "Success";

/// Marks winner profiles "to keep" through the bulk events API, one request
/// per batch of rows.
pub struct BulkSender<T: Transport> {
    client: RetryClient<T>,
    config: AppConfig,
}

impl<T: Transport> BulkSender<T> {
    pub fn new(client: RetryClient<T>, config: AppConfig) -> Self {
        Self { client, config }
    }

    pub fn client(&self) -> &RetryClient<T> {
        &self.client
    }

    fn identity_of<'a>(&self, row: &'a Row) -> (&'a str, &'a str) {
        let columns = &self.config.columns;
        (
            row.value(&columns.mpid).unwrap_or_default(),
            row.value(&columns.email).unwrap_or_default(),
        )
    }

    /// Sends one batch and returns one log line per row, all sharing the
    /// batch's outcome.
    pub async fn send_batch(&self, batch: &[Row]) -> Vec<BulkLogRecord> {
        let log_rows = |status: CallStatus, response: &str| -> Vec<BulkLogRecord> {
            batch
                .iter()
                .map(|row| {
                    let (mpid, email) = self.identity_of(row);
                    BulkLogRecord {
                        mpid: mpid.to_string(),
                        email: email.to_string(),
                        status,
                        response: response.to_string(),
                    }
                })
                .collect()
        };

        if self.config.run.dry_run {
            tracing::info!("[DRY RUN] Would send batch of {} events.", batch.len());
            return log_rows(CallStatus::DryRun, SIMULATED);
        }

        let events: Vec<KeepProfileEvent> = batch
            .iter()
            .map(|row| {
                let (mpid, email) = self.identity_of(row);
                KeepProfileEvent::new(mpid, email, &self.config.api.environment)
            })
            .collect();
        let mut body = serde_json::json!(events);

        let outcome = self
            .client
            .post(&self.config.api.bulk_events_url, &mut body)
            .await;

        match outcome {
            CallOutcome {
                response: Some(reply),
                ..
            } => {
                tracing::info!("Batch sent: {} users, Status: {}", batch.len(), reply.status);
                let response = if reply.is_success() {
                    SUCCESS
                } else {
                    reply.body.as_str()
                };
                log_rows(CallStatus::Http(reply.status), response)
            }
            CallOutcome {
                response: None,
                attempts,
                error,
            } => {
                let error = error.unwrap_or_default();
                tracing::error!(
                    "Batch failed permanently after {} attempts: {}",
                    attempts,
                    error
                );
                log_rows(CallStatus::Failed, &error)
            }
        }
    }
}

#[async_trait::async_trait]
impl<T: Transport> FileProcessor for BulkSender<T> {
    fn name(&self) -> &str {
        "bulk"
    }

    fn summary_path(&self, source: &Path) -> PathBuf {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.config
            .output
            .summary_dir
            .join(format!("{}_bulk_summary.csv", stem))
    }

    async fn process_file(&self, source: &Path) -> Result<FileSummary> {
        let rows = read_rows(source)?;
        tracing::info!("Records found: {}", rows.len());

        let mut summary = FileSummary::new(source.to_path_buf(), self.summary_path(source));
        let mut log = Vec::with_capacity(rows.len());

        for batch in rows.chunks(self.config.bulk.batch_size.max(1)) {
            let lines = self.send_batch(batch).await;
            for line in &lines {
                summary.record(line.outcome());
            }
            log.extend(lines);
            tokio::time::sleep(self.config.batch_delay()).await;
        }

        write_records(&summary.summary_path, &BulkLogRecord::HEADER, &log)?;
        Ok(summary)
    }
}
