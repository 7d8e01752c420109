//! Types for the planner module.

use std::ffi::OsString;
use std::path::PathBuf;

use crate::converter::AudioFormat;

/// Which files are picked up and what they become.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanOptions {
    /// Source extensions without the leading dot, matched case-sensitively.
    pub source_extensions: Vec<String>,
    /// Target format; decides the destination extension.
    pub target_format: AudioFormat,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            source_extensions: vec!["flac".to_string()],
            target_format: AudioFormat::Mp3,
        }
    }
}

/// One source-file-to-destination-file conversion unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    /// Position in plan order.
    pub index: usize,
    /// Absolute source file path.
    pub source_path: PathBuf,
    /// Source path relative to the input root.
    pub relative_path: PathBuf,
    /// Absolute destination directory.
    pub dest_dir: PathBuf,
    /// Destination file name (source stem plus target extension).
    pub dest_filename: OsString,
}

impl ConversionJob {
    /// Full destination path.
    pub fn dest_path(&self) -> PathBuf {
        self.dest_dir.join(&self.dest_filename)
    }

    /// Source path relative to the input root, for log lines.
    pub fn display_name(&self) -> std::path::Display<'_> {
        self.relative_path.display()
    }
}
