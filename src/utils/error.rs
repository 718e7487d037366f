use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Source not found: {path:?}")]
    SourceNotFound { path: PathBuf },

    #[error("Malformed record at line {line}: {reason}")]
    MalformedRecord { line: u64, reason: String },

    #[error("Sink unreachable ({target}): {reason}")]
    SinkUnreachable { target: String, reason: String },

    #[error("Duplicate key {key} in table {table}")]
    DuplicateKey { table: String, key: i64 },

    #[error("Verification failed with {mismatches} mismatch(es): {detail}")]
    VerificationMismatch { mismatches: usize, detail: String },

    #[error("Pipeline cannot start from state {state}")]
    InvalidState { state: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Source,
    Data,
    Sink,
    Verification,
    Configuration,
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
            EtlError::SourceNotFound { .. } => ErrorCategory::Source,
            EtlError::MalformedRecord { .. } | EtlError::CsvError(_) => ErrorCategory::Data,
            EtlError::SinkUnreachable { .. }
            | EtlError::DuplicateKey { .. }
            | EtlError::DatabaseError(_) => ErrorCategory::Sink,
            EtlError::VerificationMismatch { .. } => ErrorCategory::Verification,
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorCategory::Configuration,
            EtlError::InvalidState { .. }
            | EtlError::IoError(_)
            | EtlError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EtlError::VerificationMismatch { .. } => ErrorSeverity::Medium,
            EtlError::SinkUnreachable { .. } | EtlError::IoError(_) => ErrorSeverity::Critical,
            EtlError::InvalidState { .. } => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::SourceNotFound { .. } => "Check that source_path points to an existing file",
            EtlError::MalformedRecord { .. } | EtlError::CsvError(_) => {
                "Fix the reported line so it matches the header and column widths"
            }
            EtlError::SinkUnreachable { .. } => {
                "Make sure the output directory or database data_dir exists and is writable"
            }
            EtlError::DuplicateKey { .. } => {
                "Remove rows whose key already exists in the table, or load into a fresh table"
            }
            EtlError::VerificationMismatch { .. } => {
                "Inspect the sink; another writer may have modified it during the run"
            }
            EtlError::InvalidState { .. } => "Reset the pipeline before running it again",
            EtlError::DatabaseError(_) => "Check the database file and schema definition",
            EtlError::IoError(_) | EtlError::SerializationError(_) => {
                "Check file permissions and available disk space"
            }
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => {
                "Review the configuration file against the documented options"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Source => format!("Could not read the source: {}", self),
            ErrorCategory::Data => format!("The source contains invalid data: {}", self),
            ErrorCategory::Sink => format!("Writing to the sink failed: {}", self),
            ErrorCategory::Verification => format!("The written data did not verify: {}", self),
            ErrorCategory::Configuration => format!("The configuration is invalid: {}", self),
            ErrorCategory::System => format!("Unexpected failure: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
