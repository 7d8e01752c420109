use thiserror::Error;

use crate::planner::PlanError;

/// Errors that abort a whole batch. Per-file failures never end up here.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Plan(#[from] PlanError),
}
