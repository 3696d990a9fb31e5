#![allow(dead_code)]

use profile_dedupe::{AppConfig, ReqwestTransport, RetryClient};
use std::path::Path;
use std::time::Duration;

/// Config pointed at a mock server, with pacing and backoff disabled.
pub fn test_config(base_url: &str, work_dir: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.api.identity_base_url = format!("{}/v1", base_url);
    config.api.events_url = format!("{}/v2/events", base_url);
    config.api.bulk_events_url = format!("{}/v2/bulkevents", base_url);
    config.api.api_key = Some("key".to_string());
    config.api.api_secret = Some("secret".to_string());
    config.api.timeout_seconds = 5;
    config.retry.initial_backoff_ms = 0;
    config.run.rate_limit_ms = 0;
    config.bulk.batch_delay_ms = 0;
    config.output.summary_dir = work_dir.join("summaries");
    config
}

pub fn live_client(config: &AppConfig) -> RetryClient<ReqwestTransport> {
    let transport = ReqwestTransport::new(config.credentials(), Duration::from_secs(5)).unwrap();
    RetryClient::new(transport, config.retry_policy())
}

/// `"key:secret"` base64-encoded, as sent by basic auth.
pub const BASIC_AUTH: &str = "Basic a2V5OnNlY3JldA==";

pub fn write_csv(path: &Path, lines: &[&str]) {
    let mut content = lines.join("\n");
    content.push('\n');
    std::fs::write(path, content).unwrap();
}

pub fn read_csv(path: &Path) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .unwrap();
    reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect()
}
