//! Error types module
//!
//! This module provides the fault taxonomy shared by every Muralis crate.
//! Validation problems are not errors (see `models::ValidationResult`); the
//! variants here are the faults that abort a pipeline run.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like bad input
    Debug,
    /// Warning level - for recoverable issues
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata describing how an error should be presented to a caller.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "STORAGE_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether retrying the whole upload from scratch may succeed
    fn is_recoverable(&self) -> bool;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden from end users
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Decode or encode failure on a file that passed validation.
    #[error("Image processing error: {0}")]
    Transform(String),

    /// The remote store rejected or could not confirm a write.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A mandatory digest could not be computed.
    #[error("Checksum error: {0}")]
    Checksum(String),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("JSON error: {}", err))
    }
}

/// Static metadata for each variant: (error_code, recoverable, sensitive, log_level).
fn app_error_static_metadata(err: &AppError) -> (&'static str, bool, bool, LogLevel) {
    match err {
        AppError::Transform(_) => ("IMAGE_PROCESSING_ERROR", false, false, LogLevel::Warn),
        AppError::Storage(_) => ("STORAGE_ERROR", true, true, LogLevel::Error),
        AppError::Checksum(_) => ("CHECKSUM_ERROR", true, true, LogLevel::Error),
        AppError::Archive(_) => ("ARCHIVE_ERROR", false, true, LogLevel::Error),
        AppError::Io(_) => ("IO_ERROR", true, true, LogLevel::Error),
        AppError::Config(_) => ("CONFIGURATION_ERROR", false, true, LogLevel::Error),
        AppError::InvalidInput(_) => ("INVALID_INPUT", false, false, LogLevel::Debug),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => {
            ("INTERNAL_ERROR", true, true, LogLevel::Error)
        }
    }
}

impl ErrorMetadata for AppError {
    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).0
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).1
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Transform(_) => {
                "The image could not be processed. Try a different file.".to_string()
            }
            AppError::InvalidInput(msg) => msg.clone(),
            _ => "The upload could not be completed. Please try again.".to_string(),
        }
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_is_recoverable_and_hidden() {
        let err = AppError::Storage("put failed".to_string());
        assert_eq!(err.error_code(), "STORAGE_ERROR");
        assert!(err.is_recoverable());
        assert!(err.is_sensitive());
        assert!(!err.client_message().contains("put failed"));
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[test]
    fn test_transform_error_is_not_recoverable() {
        let err = AppError::Transform("corrupt jpeg".to_string());
        assert_eq!(err.error_code(), "IMAGE_PROCESSING_ERROR");
        assert!(!err.is_recoverable());
        assert_eq!(err.log_level(), LogLevel::Warn);
    }

    #[test]
    fn test_from_anyhow_keeps_message() {
        let err: AppError = anyhow::anyhow!("boom").into();
        assert_eq!(err.error_code(), "INTERNAL_ERROR");
        match err {
            AppError::InternalWithSource { message, .. } => assert_eq!(message, "boom"),
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_io_error_converts() {
        let err: AppError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, AppError::Io(_)));
    }
}
