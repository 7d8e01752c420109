//! Planner module: turns an input tree into conversion jobs.
//!
//! Every file under the input root whose extension is a configured source
//! extension becomes one [`ConversionJob`]. Its destination mirrors the
//! file's position relative to the input root, under the output root,
//! with the extension swapped for the target format's.

mod error;
mod types;
mod walker;

pub use error::PlanError;
pub use types::{ConversionJob, PlanOptions};
pub use walker::plan;
