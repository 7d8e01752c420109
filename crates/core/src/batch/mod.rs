//! Batch module: one end-to-end conversion run.
//!
//! [`BatchRunner`] plans the jobs for an input tree, hands them to the
//! worker pool and folds the results into a [`BatchSummary`]. The run can
//! be turned into a [`BatchReport`] for machine consumption.

mod error;
mod runner;
mod summary;

pub use error::BatchError;
pub use runner::{BatchRun, BatchRunner};
pub use summary::{BatchReport, BatchSummary, EntryStatus, ReportEntry};
