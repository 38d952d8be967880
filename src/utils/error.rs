use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Record conversion error: {0}")]
    RecordConversionError(#[from] serde_dynamo::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}': {value} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Unknown migration job '{name}'. Available jobs: {available}")]
    UnknownJobError { name: String, available: String },

    #[error("Record is missing required field '{field}'")]
    MissingFieldError { field: String },

    #[error("Field '{field}' has unexpected type, expected {expected}")]
    FieldTypeError {
        field: String,
        expected: &'static str,
    },

    #[error("DynamoDB {operation} failed: {message}")]
    DynamoDbError { operation: String, message: String },

    #[error("{count} items for table '{table}' remained unprocessed after {attempts} attempts")]
    UnprocessedItemsError {
        table: String,
        count: usize,
        attempts: usize,
    },
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Data,
    Service,
    System,
}

/// 錯誤嚴重程度，決定程序退出碼
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::UnknownJobError { .. } => ErrorCategory::Configuration,
            EtlError::SerializationError(_)
            | EtlError::RecordConversionError(_)
            | EtlError::MissingFieldError { .. }
            | EtlError::FieldTypeError { .. } => ErrorCategory::Data,
            EtlError::DynamoDbError { .. } | EtlError::UnprocessedItemsError { .. } => {
                ErrorCategory::Service
            }
            EtlError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Service => ErrorSeverity::Medium,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            EtlError::IoError(_) => {
                "Check file permissions and that the config file path exists".to_string()
            }
            EtlError::SerializationError(_) => {
                "Check that record contents are valid JSON-compatible values".to_string()
            }
            EtlError::RecordConversionError(_) => {
                "Check that the source table items only use supported attribute types".to_string()
            }
            EtlError::ConfigError { .. } => {
                "Check the TOML config file syntax and referenced environment variables".to_string()
            }
            EtlError::InvalidConfigValueError { field, .. } => {
                format!("Correct the '{}' value in the config file", field)
            }
            EtlError::MissingConfigError { field } => {
                format!("Add the missing '{}' field to the config file", field)
            }
            EtlError::UnknownJobError { available, .. } => {
                format!("Pass one of the configured jobs via --job-name: {}", available)
            }
            EtlError::MissingFieldError { field } => format!(
                "Inspect the source table for items without the '{}' attribute",
                field
            ),
            EtlError::FieldTypeError { field, .. } => format!(
                "Inspect the source table for items with a non-string '{}' attribute",
                field
            ),
            EtlError::DynamoDbError { .. } => {
                "Check AWS credentials, region and table names, then re-run the job".to_string()
            }
            EtlError::UnprocessedItemsError { .. } => {
                "Raise the destination table write capacity or lower throughput_write_percent, then re-run the job"
                    .to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Data => format!("Data problem: {}", self),
            ErrorCategory::Service => format!("DynamoDB problem: {}", self),
            ErrorCategory::System => format!("System problem: {}", self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_high_severity() {
        let err = EtlError::MissingConfigError {
            field: "catalog.database".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::High);
    }

    #[test]
    fn test_dynamodb_errors_are_service_category() {
        let err = EtlError::DynamoDbError {
            operation: "Scan".to_string(),
            message: "timed out".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Service);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
    }

    #[test]
    fn test_io_errors_are_critical() {
        let err = EtlError::IoError(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_unknown_job_error_lists_available_jobs() {
        let err = EtlError::UnknownJobError {
            name: "nope".to_string(),
            available: "image-info-migration, user-reaction-migration".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("nope"));
        assert!(message.contains("image-info-migration"));
        assert!(err.recovery_suggestion().contains("--job-name"));
    }

    #[test]
    fn test_user_friendly_message_prefixes_category() {
        let err = EtlError::MissingFieldError {
            field: "id".to_string(),
        };
        assert!(err.user_friendly_message().starts_with("Data problem:"));
    }
}
