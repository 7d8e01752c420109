//! Worker pool module: runs conversion jobs with bounded concurrency.
//!
//! A fixed number of workers pull jobs from a shared queue until it is
//! empty. Each job produces exactly one [`ConversionResult`], whether it
//! succeeded, failed, or was skipped because the run was cancelled. A
//! failing or panicking job never stops the other workers.
//!
//! # Example
//!
//! ```ignore
//! use flake_core::pool::{PoolConfig, WorkerPool};
//! use flake_core::converter::FfmpegConverter;
//!
//! let pool = WorkerPool::new(
//!     PoolConfig::default().with_concurrency(4),
//!     FfmpegConverter::with_defaults(),
//! );
//! let results = pool.run(jobs).await;
//! let failed = results.iter().filter(|r| !r.is_success()).count();
//! ```

mod config;
mod error;
mod types;
mod worker;

pub use config::PoolConfig;
pub use error::JobError;
pub use types::{
    ConversionResult, FailureKind, JobFailure, JobOutcome, JobSuccess, PoolEvent, PoolStatus,
};
pub use worker::{CancelHandle, WorkerPool};
