use crate::domain::model::{FileSummary, HttpReply};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Sends one JSON body to the vendor API. Credentials and timeouts belong to
/// the implementation.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Any HTTP status is `Ok`; only transport failures are `Err`.
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<HttpReply>;
}

/// Drives every row of one input file and writes its summary CSV.
#[async_trait]
pub trait FileProcessor: Send + Sync {
    fn name(&self) -> &str;

    fn summary_path(&self, source: &Path) -> std::path::PathBuf;

    async fn process_file(&self, source: &Path) -> Result<FileSummary>;
}
