//! Types for the pool module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::planner::ConversionJob;

/// Broad classes of job failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Destination directory could not be created.
    DirectoryCreation,
    /// Codec or encoder error (corrupt source, unsupported content, crash).
    Transcode,
    /// Filesystem error while reading or writing.
    Io,
    /// The encoder ran past its time limit.
    Timeout,
    /// The batch was cancelled before the job started.
    Cancelled,
    /// The conversion task panicked.
    WorkerPanic,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::DirectoryCreation => "directory_creation",
            Self::Transcode => "transcode",
            Self::Io => "io",
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
            Self::WorkerPanic => "worker_panic",
        };
        f.write_str(name)
    }
}

/// Details of a successful conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSuccess {
    /// Written file.
    pub output_path: PathBuf,
    /// Output file size in bytes.
    pub output_size_bytes: u64,
    /// Time spent in the converter.
    pub transcode_ms: u64,
}

/// A failed conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFailure {
    pub kind: FailureKind,
    /// Human-readable reason.
    pub reason: String,
}

/// Terminal state of a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Succeeded(JobSuccess),
    Failed(JobFailure),
}

/// Outcome of one job, produced exactly once per job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    pub job: ConversionJob,
    pub outcome: JobOutcome,
    /// Wall time from dequeue to completion, including directory creation.
    pub elapsed_ms: u64,
}

impl ConversionResult {
    /// Whether the job succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, JobOutcome::Succeeded(_))
    }

    /// The failure, if the job failed.
    pub fn failure(&self) -> Option<&JobFailure> {
        match &self.outcome {
            JobOutcome::Failed(failure) => Some(failure),
            JobOutcome::Succeeded(_) => None,
        }
    }
}

/// Lifecycle events emitted by the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolEvent {
    /// A worker took the job off the queue.
    JobStarted { index: usize, source_path: PathBuf },
    /// The job finished successfully.
    JobSucceeded {
        index: usize,
        dest_path: PathBuf,
        output_size_bytes: u64,
    },
    /// The job failed.
    JobFailed {
        index: usize,
        kind: FailureKind,
        reason: String,
    },
}

/// Snapshot of pool activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStatus {
    /// Configured worker count.
    pub max_concurrent: usize,
    /// Jobs currently converting.
    pub active_jobs: usize,
    /// Jobs waiting in the queue.
    pub queued_jobs: usize,
    /// Jobs succeeded since the pool was created.
    pub total_succeeded: u64,
    /// Jobs failed since the pool was created.
    pub total_failed: u64,
}
