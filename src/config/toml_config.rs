use crate::core::retry::RetryPolicy;
use crate::utils::error::{DedupeError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

pub const ENV_API_KEY: &str = "MPARTICLE_API_KEY";
pub const ENV_API_SECRET: &str = "MPARTICLE_API_SECRET";
pub const ENV_ENVIRONMENT: &str = "MPARTICLE_ENVIRONMENT";
pub const ENV_DRY_RUN: &str = "DRY_RUN";

pub const ENVIRONMENTS: [&str; 2] = ["production", "development"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub retry: RetryConfig,
    pub run: RunConfig,
    pub columns: ColumnConfig,
    pub chunk: ChunkConfig,
    pub identity: IdentityConfig,
    pub bulk: BulkConfig,
    pub output: OutputConfig,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub identity_base_url: String,
    pub events_url: String,
    pub bulk_events_url: String,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub environment: String,
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            identity_base_url: "https://identity.mparticle.com/v1".to_string(),
            events_url: "https://s2s.mparticle.com/v2/events".to_string(),
            bulk_events_url: "https://s2s.mparticle.com/v2/bulkevents".to_string(),
            api_key: None,
            api_secret: None,
            environment: "production".to_string(),
            timeout_seconds: 20,
        }
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "***");
        f.debug_struct("ApiConfig")
            .field("identity_base_url", &self.identity_base_url)
            .field("events_url", &self.events_url)
            .field("bulk_events_url", &self.bulk_events_url)
            .field("api_key", &redact(&self.api_key))
            .field("api_secret", &redact(&self.api_secret))
            .field("environment", &self.environment)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

/// Basic-auth key/secret pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub key: String,
    pub secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("key", &self.key)
            .field("secret", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub dry_run: bool,
    pub rate_limit_ms: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            rate_limit_ms: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    pub mpid: String,
    pub email: String,
    pub phone: String,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            mpid: "External_ID".to_string(),
            email: "Email_Address".to_string(),
            phone: "Phone_Number".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkConfig {
    pub size: usize,
    pub output_prefix: String,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            size: 50_000,
            output_prefix: "output/childprofiles/chunk/chunk".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub input_dir: PathBuf,
    pub file_pattern: String,
    pub result_summary: PathBuf,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("output/childprofiles/chunk"),
            file_pattern: r"^chunk_part\d+\.csv$".to_string(),
            result_summary: PathBuf::from("results_summary.csv"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BulkConfig {
    pub input_dir: PathBuf,
    pub file_pattern: String,
    pub batch_size: usize,
    pub batch_delay_ms: u64,
    pub result_summary: PathBuf,
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("output"),
            file_pattern: r"\.csv$".to_string(),
            batch_size: 100,
            batch_delay_ms: 500,
            result_summary: PathBuf::from("logs_bulkevents_winnerprofile.csv"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub summary_dir: PathBuf,
    pub log_dir: PathBuf,
    pub log_file: String,
    pub json_logs: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            summary_dir: PathBuf::from("summaries"),
            log_dir: PathBuf::from("logs"),
            log_file: "mparticle_process.log".to_string(),
            json_logs: false,
        }
    }
}

impl AppConfig {
    /// Defaults, then the optional TOML file, then environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);
        Ok(toml::from_str(&processed_content)?)
    }

    /// Replaces `${VAR}` with the variable's value; unknown variables are left as-is.
    fn substitute_env_vars(content: &str) -> String {
        static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
        let re = PLACEHOLDER.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("static regex"));

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ENV_API_KEY).filter(|v| !v.trim().is_empty()) {
            self.api.api_key = Some(key);
        }
        if let Some(secret) = lookup(ENV_API_SECRET).filter(|v| !v.trim().is_empty()) {
            self.api.api_secret = Some(secret);
        }
        if let Some(environment) = lookup(ENV_ENVIRONMENT).filter(|v| !v.trim().is_empty()) {
            self.api.environment = environment.trim().to_string();
        }
        if let Some(dry_run) = lookup(ENV_DRY_RUN).as_deref().and_then(parse_bool) {
            self.run.dry_run = dry_run;
        }
    }

    /// Credentials for basic auth, when both parts are set and resolved.
    pub fn credentials(&self) -> Option<Credentials> {
        let usable = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty() && !s.starts_with("${"))
                .map(str::to_string)
        };
        Some(Credentials {
            key: usable(&self.api.api_key)?,
            secret: usable(&self.api.api_secret)?,
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry.max_retries,
            Duration::from_millis(self.retry.initial_backoff_ms),
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_seconds)
    }

    pub fn rate_limit(&self) -> Duration {
        Duration::from_millis(self.run.rate_limit_ms)
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.bulk.batch_delay_ms)
    }

    pub fn log_path(&self) -> PathBuf {
        self.output.log_dir.join(&self.output.log_file)
    }

    pub fn modify_url(&self, mpid: &str) -> String {
        format!("{}/{}/modify", self.api.identity_base_url.trim_end_matches('/'), mpid)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("api.identity_base_url", &self.api.identity_base_url)?;
        validation::validate_url("api.events_url", &self.api.events_url)?;
        validation::validate_url("api.bulk_events_url", &self.api.bulk_events_url)?;
        validation::validate_one_of("api.environment", &self.api.environment, &ENVIRONMENTS)?;
        validation::validate_range("api.timeout_seconds", self.api.timeout_seconds, 1, 600)?;

        validation::validate_positive_number("retry.max_retries", self.retry.max_retries as usize, 1)?;
        validation::validate_positive_number("chunk.size", self.chunk.size, 1)?;
        validation::validate_positive_number("bulk.batch_size", self.bulk.batch_size, 1)?;

        validation::validate_path("chunk.output_prefix", &self.chunk.output_prefix)?;
        validation::validate_path("output.summary_dir", &self.output.summary_dir.to_string_lossy())?;
        validation::validate_path("output.log_dir", &self.output.log_dir.to_string_lossy())?;
        validation::validate_non_empty_string("output.log_file", &self.output.log_file)?;

        validation::validate_non_empty_string("columns.mpid", &self.columns.mpid)?;
        validation::validate_non_empty_string("columns.email", &self.columns.email)?;
        validation::validate_non_empty_string("columns.phone", &self.columns.phone)?;

        validation::validate_regex("identity.file_pattern", &self.identity.file_pattern)?;
        validation::validate_regex("bulk.file_pattern", &self.bulk.file_pattern)?;

        if !self.run.dry_run && self.credentials().is_none() {
            let missing = if self.credentials_part_missing(&self.api.api_key) {
                "api.api_key"
            } else {
                "api.api_secret"
            };
            return Err(DedupeError::MissingConfigError {
                field: missing.to_string(),
            });
        }

        Ok(())
    }
}

impl AppConfig {
    fn credentials_part_missing(&self, value: &Option<String>) -> bool {
        value
            .as_deref()
            .map(str::trim)
            .map_or(true, |s| s.is_empty() || s.starts_with("${"))
    }
}
