use crate::config::toml_config::AppConfig;
use crate::core::csv_io::{read_rows, write_records};
use crate::core::retry::RetryClient;
use crate::domain::model::{CallStatus, FileSummary, ResultRecord, Row};
use crate::domain::payload::{DemoteEventsPayload, ModifyPayload};
use crate::domain::ports::{FileProcessor, Transport};
use crate::utils::error::Result;
use std::path::{Path, PathBuf};

pub const MISSING_MPID: &str = "SKIPPED: Missing MPID";

/// Clears email/phone identities on child profiles, then marks each one
/// "not to keep" through the events API.
pub struct IdentityProcessor<T: Transport> {
    client: RetryClient<T>,
    config: AppConfig,
}

impl<T: Transport> IdentityProcessor<T> {
    pub fn new(client: RetryClient<T>, config: AppConfig) -> Self {
        Self { client, config }
    }

    pub fn client(&self) -> &RetryClient<T> {
        &self.client
    }

    /// Handles one row: modify, then events if modify succeeded.
    pub async fn process_row(&self, row: &Row) -> ResultRecord {
        let columns = &self.config.columns;
        let email = row.value(&columns.email);
        let phone = row.value(&columns.phone);

        let Some(mpid) = row.value(&columns.mpid) else {
            tracing::warn!("Row {}: {}", row.line, MISSING_MPID);
            return ResultRecord {
                mpid: String::new(),
                email: email.unwrap_or_default().to_string(),
                phone: phone.unwrap_or_default().to_string(),
                modify_status: CallStatus::Skipped,
                events_status: CallStatus::Skipped,
                retries: 0,
                message: MISSING_MPID.to_string(),
            };
        };

        tracing::info!(
            "Row {} -> MPID={}, email={:?}, phone={:?}",
            row.line,
            mpid,
            email,
            phone
        );

        let environment = &self.config.api.environment;
        let modify_payload = ModifyPayload::clear_identities(environment, email, phone);
        let events_payload = DemoteEventsPayload::new(mpid, environment);

        let record = if self.config.run.dry_run {
            tracing::info!("[DRY-RUN] Modify -> {}", serde_json::json!(modify_payload));
            tracing::info!("[DRY-RUN] Events -> MPID={}", mpid);
            ResultRecord {
                mpid: mpid.to_string(),
                email: email.unwrap_or_default().to_string(),
                phone: phone.unwrap_or_default().to_string(),
                modify_status: CallStatus::DryRun,
                events_status: CallStatus::DryRun,
                retries: 0,
                message: String::new(),
            }
        } else {
            self.deliver(mpid, email, phone, modify_payload, events_payload)
                .await
        };

        tokio::time::sleep(self.config.rate_limit()).await;
        record
    }

    async fn deliver(
        &self,
        mpid: &str,
        email: Option<&str>,
        phone: Option<&str>,
        modify_payload: ModifyPayload,
        events_payload: DemoteEventsPayload,
    ) -> ResultRecord {
        let mut modify_body = serde_json::json!(modify_payload);
        tracing::debug!("Modify -> {}", modify_body);
        let modify = self
            .client
            .post(&self.config.modify_url(mpid), &mut modify_body)
            .await;

        let (events_status, events_attempts, events_error) = if modify.is_success() {
            let mut events_body = serde_json::json!(events_payload);
            tracing::debug!("Events -> {}", events_body);
            let events = self
                .client
                .post(&self.config.api.events_url, &mut events_body)
                .await;
            (events.status(), events.attempts, events.error)
        } else {
            (CallStatus::SkippedModifyFailed, 0, None)
        };

        tracing::info!(
            "MPID={} modify={} events={}",
            mpid,
            modify.status(),
            events_status
        );

        ResultRecord {
            mpid: mpid.to_string(),
            email: email.unwrap_or_default().to_string(),
            phone: phone.unwrap_or_default().to_string(),
            modify_status: modify.status(),
            events_status,
            retries: modify.attempts + events_attempts,
            message: modify.error.or(events_error).unwrap_or_default(),
        }
    }
}

#[async_trait::async_trait]
impl<T: Transport> FileProcessor for IdentityProcessor<T> {
    fn name(&self) -> &str {
        "identity"
    }

    fn summary_path(&self, source: &Path) -> PathBuf {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.config
            .output
            .summary_dir
            .join(format!("{}_summary.csv", stem))
    }

    async fn process_file(&self, source: &Path) -> Result<FileSummary> {
        tracing::info!(
            "START file: {}, dry_run={}",
            source.display(),
            self.config.run.dry_run
        );

        let rows = read_rows(source)?;
        let mut summary = FileSummary::new(source.to_path_buf(), self.summary_path(source));
        let mut results = Vec::with_capacity(rows.len());

        for row in &rows {
            let record = self.process_row(row).await;
            summary.record(record.outcome());
            results.push(record);
        }

        write_records(&summary.summary_path, &ResultRecord::HEADER, &results)?;

        tracing::info!("END file: {}", source.display());
        Ok(summary)
    }
}
