//! Error types for the planner module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort planning.
#[derive(Debug, Error)]
pub enum PlanError {
    /// Input root is missing or is not a directory.
    #[error("Input directory does not exist: {path}")]
    InputNotFound { path: PathBuf },

    /// Output root could not be made absolute.
    #[error("Invalid output directory: {path}")]
    InvalidOutputRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
