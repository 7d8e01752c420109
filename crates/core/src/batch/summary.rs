//! End-of-run summary and the serializable batch report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::converter::AudioFormat;
use crate::pool::{ConversionResult, FailureKind, JobOutcome};

/// Counts derived from the results of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub discovered: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failures_by_kind: BTreeMap<FailureKind, usize>,
    /// Total size of all written files.
    pub output_bytes: u64,
    /// Wall-clock duration of the run.
    pub duration_ms: u64,
}

impl BatchSummary {
    pub fn from_results(results: &[ConversionResult], duration_ms: u64) -> Self {
        let mut summary = Self {
            discovered: results.len(),
            duration_ms,
            ..Default::default()
        };

        for result in results {
            match &result.outcome {
                JobOutcome::Succeeded(success) => {
                    summary.succeeded += 1;
                    summary.output_bytes += success.output_size_bytes;
                }
                JobOutcome::Failed(failure) => {
                    summary.failed += 1;
                    *summary.failures_by_kind.entry(failure.kind).or_insert(0) += 1;
                }
            }
        }

        summary
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} discovered, {} converted, {} failed",
            self.discovered, self.succeeded, self.failed
        )?;
        if !self.failures_by_kind.is_empty() {
            let kinds: Vec<String> = self
                .failures_by_kind
                .iter()
                .map(|(kind, count)| format!("{}: {}", kind, count))
                .collect();
            write!(f, " ({})", kinds.join(", "))?;
        }
        write!(f, " in {:.1}s", self.duration_ms as f64 / 1000.0)
    }
}

/// Serializable record of one run, written with `--report`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub input_root: PathBuf,
    pub output_root: PathBuf,
    pub target_format: AudioFormat,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub summary: BatchSummary,
    pub entries: Vec<ReportEntry>,
}

/// Status of a single file in a [`BatchReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Succeeded,
    Failed,
}

/// One source file in a [`BatchReport`].
///
/// Paths are stored lossily as strings so that reports stay valid JSON
/// for file names that are not UTF-8.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    /// Source path relative to the input root.
    pub source: String,
    pub destination: String,
    pub status: EntryStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_size_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_kind: Option<FailureKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub elapsed_ms: u64,
}

impl From<&ConversionResult> for ReportEntry {
    fn from(result: &ConversionResult) -> Self {
        let mut entry = Self {
            source: result.job.relative_path.to_string_lossy().into_owned(),
            destination: result.job.dest_path().to_string_lossy().into_owned(),
            status: EntryStatus::Succeeded,
            output_size_bytes: None,
            failure_kind: None,
            reason: None,
            elapsed_ms: result.elapsed_ms,
        };

        match &result.outcome {
            JobOutcome::Succeeded(success) => {
                entry.output_size_bytes = Some(success.output_size_bytes);
            }
            JobOutcome::Failed(failure) => {
                entry.status = EntryStatus::Failed;
                entry.failure_kind = Some(failure.kind);
                entry.reason = Some(failure.reason.clone());
            }
        }

        entry
    }
}
