//! Error types for the converter module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during conversion.
#[derive(Debug, Error)]
pub enum ConverterError {
    /// FFmpeg binary not found.
    #[error("FFmpeg not found at path: {path}")]
    FfmpegNotFound { path: PathBuf },

    /// Input file not found.
    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// Conversion process failed.
    #[error("Conversion failed: {reason}")]
    ConversionFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// Conversion timed out.
    #[error("Conversion timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// I/O error during conversion.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConverterError {
    /// Creates a new conversion failed error with stderr output.
    pub fn conversion_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::ConversionFailed {
            reason: reason.into(),
            stderr,
        }
    }

    /// Message including the encoder's stderr, when there is any.
    pub fn detailed_message(&self) -> String {
        match self {
            Self::ConversionFailed {
                reason,
                stderr: Some(stderr),
            } if !stderr.trim().is_empty() => {
                format!("Conversion failed: {} ({})", reason, stderr.trim())
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detailed_message_includes_stderr() {
        let err = ConverterError::conversion_failed(
            "FFmpeg exited with code: Some(1)",
            Some("Invalid data found when processing input\n".to_string()),
        );
        assert_eq!(
            err.detailed_message(),
            "Conversion failed: FFmpeg exited with code: Some(1) (Invalid data found when processing input)"
        );
    }

    #[test]
    fn test_detailed_message_without_stderr() {
        let err = ConverterError::Timeout { timeout_secs: 5 };
        assert_eq!(err.detailed_message(), "Conversion timed out after 5 seconds");
    }
}
