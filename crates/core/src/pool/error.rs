//! Per-job error types.

use std::path::PathBuf;
use thiserror::Error;

use super::types::FailureKind;
use crate::converter::ConverterError;

/// Why a single job failed. Never escapes the pool; it is folded into
/// the job's [`ConversionResult`](super::ConversionResult).
#[derive(Debug, Error)]
pub enum JobError {
    /// Destination directory could not be created.
    #[error("Failed to create directory {path}: {source}")]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The converter reported an error.
    #[error("{}", .0.detailed_message())]
    Transcode(#[from] ConverterError),

    /// The conversion task panicked.
    #[error("Conversion task panicked: {0}")]
    Panicked(String),

    /// The batch was cancelled before this job started.
    #[error("Batch cancelled before the job started")]
    Cancelled,
}

impl JobError {
    /// Classifies the error for logs and the batch summary.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::DirectoryCreation { .. } => FailureKind::DirectoryCreation,
            Self::Transcode(ConverterError::Timeout { .. }) => FailureKind::Timeout,
            Self::Transcode(ConverterError::Io(_)) => FailureKind::Io,
            Self::Transcode(_) => FailureKind::Transcode,
            Self::Panicked(_) => FailureKind::WorkerPanic,
            Self::Cancelled => FailureKind::Cancelled,
        }
    }
}
