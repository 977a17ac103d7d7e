use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Column '{column}' not found in {file}")]
    MissingColumnError { file: String, column: String },

    #[error("Authentication failed: {message}")]
    AuthError { message: String },

    #[error("Merchant '{name}' not found")]
    MerchantNotFound { name: String },

    #[error("{endpoint} returned HTTP {status}")]
    RemoteError { endpoint: String, status: u16 },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Input,
    Configuration,
    Remote,
    Processing,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ApiError(_) => ErrorCategory::Network,
            EtlError::CsvError(_) | EtlError::MissingColumnError { .. } => ErrorCategory::Input,
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorCategory::Configuration,
            EtlError::AuthError { .. }
            | EtlError::MerchantNotFound { .. }
            | EtlError::RemoteError { .. } => ErrorCategory::Remote,
            EtlError::SerializationError(_) | EtlError::ProcessingError { .. } => {
                ErrorCategory::Processing
            }
            EtlError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // a network hiccup is worth re-running as is
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::System => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::ApiError(_) => "Check that the merchant API is reachable and re-run",
            EtlError::CsvError(_) => "Make sure the file is a pipe-delimited CSV with a header row",
            EtlError::MissingColumnError { .. } => {
                "Compare the export's header with the expected column set"
            }
            EtlError::IoError(_) => "Check file paths and permissions",
            EtlError::SerializationError(_) => "Inspect the API response body for malformed JSON",
            EtlError::ConfigError { .. } | EtlError::ConfigValidationError { .. } => {
                "Fix the TOML configuration file"
            }
            EtlError::InvalidConfigValueError { .. } => {
                "Correct the highlighted value in the configuration or CLI flags"
            }
            EtlError::MissingConfigError { .. } => {
                "Add the missing key to the credentials file (CLIENT_ID, CLIENT_SECRET, GRANT_TYPE)"
            }
            EtlError::AuthError { .. } => "Verify the OAuth client credentials",
            EtlError::MerchantNotFound { .. } => {
                "Check the merchant name against GET /api/merchants"
            }
            EtlError::RemoteError { .. } => "Check the API logs for the failing endpoint",
            EtlError::ProcessingError { .. } => "Inspect the input data for unexpected values",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not talk to the merchant API: {}", self),
            ErrorCategory::Input => format!("Input file problem: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Remote => format!("The merchant API rejected the run: {}", self),
            ErrorCategory::Processing => format!("Processing failed: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories_and_severity() {
        let err = EtlError::MerchantNotFound {
            name: "Richard's".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Remote);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.user_friendly_message().contains("Richard's"));

        let err = EtlError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing",
        ));
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_missing_column_message() {
        let err = EtlError::MissingColumnError {
            file: "PRICES-STOCK.csv".to_string(),
            column: "STOCK".to_string(),
        };
        assert_eq!(err.to_string(), "Column 'STOCK' not found in PRICES-STOCK.csv");
        assert_eq!(err.category(), ErrorCategory::Input);
    }
}
