//! Batch runner: plan, convert, summarize.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::Config;
use crate::converter::Converter;
use crate::planner::{plan, PlanOptions};
use crate::pool::{CancelHandle, ConversionResult, PoolConfig, PoolEvent, PoolStatus, WorkerPool};

use super::error::BatchError;
use super::summary::{BatchReport, BatchSummary, ReportEntry};

/// Everything one run produced.
#[derive(Debug, Clone)]
pub struct BatchRun {
    pub input_root: PathBuf,
    pub output_root: PathBuf,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub summary: BatchSummary,
    /// One result per discovered file, in plan order.
    pub results: Vec<ConversionResult>,
}

/// Runs one batch: discovers sources, converts them on the worker pool
/// and summarizes the outcome.
pub struct BatchRunner<C: Converter> {
    plan_options: PlanOptions,
    pool: WorkerPool<C>,
}

impl<C: Converter + 'static> BatchRunner<C> {
    /// Builds a runner from loaded configuration.
    pub fn new(config: &Config, converter: C) -> Self {
        Self::from_parts(
            config.batch.plan_options(),
            config.batch.pool_config(),
            converter,
        )
    }

    pub fn from_parts(plan_options: PlanOptions, pool_config: PoolConfig, converter: C) -> Self {
        Self {
            plan_options,
            pool: WorkerPool::new(pool_config, converter),
        }
    }

    /// Forwards pool events to `tx`.
    pub fn with_events(mut self, tx: mpsc::UnboundedSender<PoolEvent>) -> Self {
        self.pool = self.pool.with_events(tx);
        self
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.pool.cancel_handle()
    }

    pub fn pool_status(&self) -> PoolStatus {
        self.pool.status()
    }

    /// Converts every source file under `input_root` into `output_root`.
    ///
    /// Only a missing input root is an error. An input root without any
    /// source files logs a warning and returns an empty run, without
    /// creating the output root.
    pub async fn run(&self, input_root: &Path, output_root: &Path) -> Result<BatchRun, BatchError> {
        let started_at = Utc::now();
        let start = Instant::now();

        let jobs = plan(input_root, output_root, &self.plan_options)?;

        if jobs.is_empty() {
            warn!(
                "No {} files found in {}",
                self.plan_options.source_extensions.join("/"),
                input_root.display()
            );
        } else {
            info!(
                "Found {} files to convert in {}",
                jobs.len(),
                input_root.display()
            );
        }

        let results = self.pool.run(jobs).await;
        let summary = BatchSummary::from_results(&results, start.elapsed().as_millis() as u64);

        if summary.has_failures() {
            warn!("Batch finished with failures: {}", summary);
        } else {
            info!("Batch finished: {}", summary);
        }

        Ok(BatchRun {
            input_root: input_root.to_path_buf(),
            output_root: output_root.to_path_buf(),
            started_at,
            finished_at: Utc::now(),
            summary,
            results,
        })
    }

    /// Builds the serializable report for a finished run.
    pub fn report(&self, run: &BatchRun) -> BatchReport {
        BatchReport {
            input_root: run.input_root.clone(),
            output_root: run.output_root.clone(),
            target_format: self.plan_options.target_format,
            started_at: run.started_at,
            finished_at: run.finished_at,
            summary: run.summary.clone(),
            entries: run.results.iter().map(ReportEntry::from).collect(),
        }
    }
}
