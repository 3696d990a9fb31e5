use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// One data row of an input CSV, keyed by header name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    /// 1-based data line number (the header is not counted).
    pub line: usize,
    pub data: HashMap<String, String>,
}

impl Row {
    pub fn new(line: usize, data: HashMap<String, String>) -> Self {
        Self { line, data }
    }

    pub fn from_record(line: usize, headers: &csv::StringRecord, record: &csv::StringRecord) -> Self {
        let data = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.to_string(), v.to_string()))
            .collect();
        Self { line, data }
    }

    /// Trimmed value of `column`, or `None` when missing or blank.
    pub fn value(&self, column: &str) -> Option<&str> {
        self.data
            .get(column)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

/// Response captured from the vendor API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_retryable(&self) -> bool {
        self.status >= 500 || self.status == 429
    }
}

/// Result of a retryable call: last response (if any), number of sends, and
/// the last error message (if any).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallOutcome {
    pub response: Option<HttpReply>,
    pub attempts: u32,
    pub error: Option<String>,
}

impl CallOutcome {
    pub fn status(&self) -> CallStatus {
        match &self.response {
            Some(reply) => CallStatus::Http(reply.status),
            None => CallStatus::Failed,
        }
    }

    pub fn is_success(&self) -> bool {
        self.response.as_ref().is_some_and(HttpReply::is_success)
    }
}

/// Status written into the summary columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStatus {
    Http(u16),
    Failed,
    Skipped,
    SkippedModifyFailed,
    DryRun,
}

impl CallStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, CallStatus::Http(code) if (200..300).contains(code))
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallStatus::Http(code) => write!(f, "{}", code),
            CallStatus::Failed => f.write_str("failed"),
            CallStatus::Skipped => f.write_str("skipped"),
            CallStatus::SkippedModifyFailed => f.write_str("skipped_modify_failed"),
            CallStatus::DryRun => f.write_str("dry-run"),
        }
    }
}

impl Serialize for CallStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Per-row audit line of the identity processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultRecord {
    pub mpid: String,
    pub email: String,
    pub phone: String,
    pub modify_status: CallStatus,
    pub events_status: CallStatus,
    pub retries: u32,
    pub message: String,
}

impl ResultRecord {
    pub const HEADER: [&'static str; 7] = [
        "mpid",
        "email",
        "phone",
        "modify_status",
        "events_status",
        "retries",
        "message",
    ];

    pub fn outcome(&self) -> RowOutcome {
        match (self.modify_status, self.events_status) {
            (CallStatus::Skipped, _) => RowOutcome::Skipped,
            (CallStatus::DryRun, _) => RowOutcome::Simulated,
            (m, e) if m.is_success() && e.is_success() => RowOutcome::Delivered,
            _ => RowOutcome::Failed,
        }
    }
}

/// Per-row audit line of the bulk sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkLogRecord {
    pub mpid: String,
    pub email: String,
    pub status: CallStatus,
    pub response: String,
}

impl BulkLogRecord {
    pub const HEADER: [&'static str; 4] = ["mpid", "email", "status", "response"];

    pub fn outcome(&self) -> RowOutcome {
        match self.status {
            CallStatus::DryRun => RowOutcome::Simulated,
            CallStatus::Skipped => RowOutcome::Skipped,
            s if s.is_success() => RowOutcome::Delivered,
            _ => RowOutcome::Failed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    Delivered,
    Failed,
    Skipped,
    Simulated,
}

/// Tally for one processed input file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSummary {
    pub source: PathBuf,
    pub summary_path: PathBuf,
    pub rows: usize,
    pub delivered: usize,
    pub failed: usize,
    pub skipped: usize,
    pub simulated: usize,
}

impl FileSummary {
    pub fn new(source: PathBuf, summary_path: PathBuf) -> Self {
        Self {
            source,
            summary_path,
            ..Default::default()
        }
    }

    pub fn record(&mut self, outcome: RowOutcome) {
        self.rows += 1;
        match outcome {
            RowOutcome::Delivered => self.delivered += 1,
            RowOutcome::Failed => self.failed += 1,
            RowOutcome::Skipped => self.skipped += 1,
            RowOutcome::Simulated => self.simulated += 1,
        }
    }
}

/// What a whole run produced.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub files: Vec<FileSummary>,
    pub failed_files: Vec<(PathBuf, String)>,
    pub combined_summary: Option<PathBuf>,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub finished_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl RunReport {
    pub fn total_rows(&self) -> usize {
        self.files.iter().map(|f| f.rows).sum()
    }

    pub fn total_delivered(&self) -> usize {
        self.files.iter().map(|f| f.delivered).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.files.iter().map(|f| f.failed).sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.files.iter().map(|f| f.skipped).sum()
    }

    pub fn total_simulated(&self) -> usize {
        self.files.iter().map(|f| f.simulated).sum()
    }
}

/// Result of splitting one input file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkReport {
    pub files: Vec<PathBuf>,
    pub rows: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_value_treats_blank_as_missing() {
        let mut data = HashMap::new();
        data.insert("External_ID".to_string(), "   ".to_string());
        data.insert("Email_Address".to_string(), " a@b.com ".to_string());
        let row = Row::new(1, data);

        assert_eq!(row.value("External_ID"), None);
        assert_eq!(row.value("Email_Address"), Some("a@b.com"));
        assert_eq!(row.value("Phone_Number"), None);
    }

    #[test]
    fn test_call_status_rendering() {
        assert_eq!(CallStatus::Http(202).to_string(), "202");
        assert_eq!(CallStatus::SkippedModifyFailed.to_string(), "skipped_modify_failed");
        assert_eq!(CallStatus::DryRun.to_string(), "dry-run");
        assert!(CallStatus::Http(204).is_success());
        assert!(!CallStatus::Http(400).is_success());
        assert!(!CallStatus::Failed.is_success());
    }

    #[test]
    fn test_reply_classification() {
        assert!(HttpReply::new(429, "").is_retryable());
        assert!(HttpReply::new(503, "").is_retryable());
        assert!(!HttpReply::new(404, "").is_retryable());
        assert!(HttpReply::new(202, "").is_success());
    }

    #[test]
    fn test_result_record_outcome() {
        let mut record = ResultRecord {
            mpid: "1".to_string(),
            email: String::new(),
            phone: String::new(),
            modify_status: CallStatus::Http(200),
            events_status: CallStatus::Http(202),
            retries: 2,
            message: String::new(),
        };
        assert_eq!(record.outcome(), RowOutcome::Delivered);

        record.events_status = CallStatus::Failed;
        assert_eq!(record.outcome(), RowOutcome::Failed);

        record.modify_status = CallStatus::Skipped;
        assert_eq!(record.outcome(), RowOutcome::Skipped);
    }
}
