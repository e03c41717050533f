//! Error types module
//!
//! All request-level failures of the ingestion pipeline are unified under
//! `AppError`. Validation-stage variants (`BadRequest`, `NotFound`,
//! `Forbidden`) are raised before anything touches local disk; the
//! mid-pipeline variants (`ExternalToolFailure`, `UploadFailure`) are raised
//! after staging and are always preceded by cleanup of staged files.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for caller mistakes worth noticing
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented.
///
/// The HTTP layer lives outside this workspace; it maps errors through this
/// trait instead of matching on variants itself.
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "EXTERNAL_TOOL_FAILURE")
    fn error_code(&self) -> &'static str;

    /// Whether retrying the whole request may succeed
    fn is_recoverable(&self) -> bool;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("{tool} failed: {message}")]
    ExternalToolFailure { tool: String, message: String },

    #[error("Upload failed: {0}")]
    UploadFailure(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn external_tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::ExternalToolFailure {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// True for errors raised before any local file was staged.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            AppError::BadRequest(_) | AppError::NotFound(_) | AppError::Forbidden(_)
        )
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, log_level).
fn app_error_static_metadata(err: &AppError) -> (u16, &'static str, bool, LogLevel) {
    match err {
        AppError::BadRequest(_) => (400, "BAD_REQUEST", false, LogLevel::Debug),
        AppError::NotFound(_) => (404, "NOT_FOUND", false, LogLevel::Debug),
        AppError::Forbidden(_) => (403, "FORBIDDEN", false, LogLevel::Warn),
        AppError::ExternalToolFailure { .. } => {
            (502, "EXTERNAL_TOOL_FAILURE", false, LogLevel::Error)
        }
        AppError::UploadFailure(_) => (502, "UPLOAD_FAILURE", true, LogLevel::Error),
        AppError::Configuration(_) => (500, "CONFIGURATION_ERROR", false, LogLevel::Error),
        AppError::Internal(_) => (500, "INTERNAL_ERROR", true, LogLevel::Error),
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn client_message(&self) -> String {
        match self {
            AppError::BadRequest(msg) | AppError::NotFound(msg) | AppError::Forbidden(msg) => {
                msg.clone()
            }
            // Tool stderr and storage errors stay in the logs.
            AppError::ExternalToolFailure { .. } => "Failed to process video".to_string(),
            AppError::UploadFailure(_) => "Failed to store video".to_string(),
            AppError::Configuration(_) | AppError::Internal(_) => {
                "Internal server error".to_string()
            }
        }
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).3
    }
}
