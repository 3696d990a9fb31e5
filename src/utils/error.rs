use thiserror::Error;

#[derive(Error, Debug)]
pub enum DedupeError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Transport-level failure. Displayed verbatim because the text ends up
    /// in the summary `message` column.
    #[error("{message}")]
    NetworkError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Io,
    Configuration,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl DedupeError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            DedupeError::ApiError(_) | DedupeError::NetworkError { .. } => ErrorCategory::Network,
            DedupeError::CsvError(_) | DedupeError::SerializationError(_) => ErrorCategory::Data,
            DedupeError::IoError(_) => ErrorCategory::Io,
            DedupeError::TomlError(_)
            | DedupeError::ConfigError { .. }
            | DedupeError::ConfigValidationError { .. }
            | DedupeError::InvalidConfigValueError { .. }
            | DedupeError::MissingConfigError { .. } => ErrorCategory::Configuration,
            DedupeError::ProcessingError { .. } => ErrorCategory::Processing,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data | ErrorCategory::Processing => ErrorSeverity::High,
            ErrorCategory::Io | ErrorCategory::Configuration => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            DedupeError::ApiError(_) | DedupeError::NetworkError { .. } => {
                "Check network connectivity and the vendor API status, then rerun"
            }
            DedupeError::CsvError(_) => {
                "Check that the input file is valid CSV with a header row"
            }
            DedupeError::IoError(_) => {
                "Check that the paths exist and the process can read and write them"
            }
            DedupeError::SerializationError(_) => "Inspect the offending payload in the log",
            DedupeError::TomlError(_) => "Fix the TOML syntax in the configuration file",
            DedupeError::MissingConfigError { .. } => {
                "Set MPARTICLE_API_KEY / MPARTICLE_API_SECRET or enable dry run"
            }
            DedupeError::ConfigError { .. }
            | DedupeError::ConfigValidationError { .. }
            | DedupeError::InvalidConfigValueError { .. } => {
                "Review the configuration file and command-line flags"
            }
            DedupeError::ProcessingError { .. } => "Review the log for the failing file",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not reach the API: {}", self),
            ErrorCategory::Data => format!("Input data problem: {}", self),
            ErrorCategory::Io => format!("File system problem: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Processing => format!("Processing failed: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, DedupeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_error_displays_verbatim() {
        let err = DedupeError::NetworkError {
            message: "connection refused".to_string(),
        };
        assert_eq!(err.to_string(), "connection refused");
        assert_eq!(err.category(), ErrorCategory::Network);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
    }

    #[test]
    fn test_config_errors_are_critical() {
        let err = DedupeError::MissingConfigError {
            field: "api.api_key".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert!(err.user_friendly_message().starts_with("Configuration problem"));
    }
}
