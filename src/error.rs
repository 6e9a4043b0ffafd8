//! Error types for pipeline runs
//!
//! Errors are classified by recoverability:
//! - Retryable: network issues, timeouts, non-200 responses, remote rejections
//! - NonRetryable: configuration errors, missing or unreadable input files

use std::path::PathBuf;
use thiserror::Error;

/// Error types for pipeline runs
#[derive(Debug, Error)]
pub enum PipelineError {
    // Retryable errors
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Remote returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Remote rejected the request: {0}")]
    Rejected(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    // Non-retryable errors
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Input not found: {0}")]
    InputNotFound(PathBuf),

    #[error("Failed to read CSV: {0}")]
    CsvError(String),

    #[error("IO error: {0}")]
    IoError(String),
}

impl PipelineError {
    /// Returns true if another attempt might succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PipelineError::NetworkError(_)
                | PipelineError::Timeout(_)
                | PipelineError::HttpStatus { .. }
                | PipelineError::Rejected(_)
                | PipelineError::MalformedResponse(_)
        )
    }

    /// Get a user-friendly recovery suggestion
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            PipelineError::NetworkError(_) => "Check your internet connection and try again.",
            PipelineError::Timeout(_) => {
                "The remote took too long. Raise google_sheets.post_timeout_secs or retry later."
            }
            PipelineError::HttpStatus { .. } => {
                "Check that the webhook URL is deployed and accessible."
            }
            PipelineError::Rejected(_) => "Check the Apps Script logs for the rejected batch.",
            PipelineError::MalformedResponse(_) => {
                "The webhook must return JSON: a row array or {\"data\": [...]}."
            }
            PipelineError::ConfigurationError(_) => "Check your settings in config/settings.yaml",
            PipelineError::InputNotFound(_) => "Run the enrichment stage first to produce the CSV.",
            PipelineError::CsvError(_) => "Check the CSV has a header row and consistent columns.",
            PipelineError::IoError(_) => "Check file permissions and disk space.",
        }
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::IoError(err.to_string())
    }
}

impl From<csv::Error> for PipelineError {
    fn from(err: csv::Error) -> Self {
        PipelineError::CsvError(err.to_string())
    }
}
