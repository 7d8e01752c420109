//! Testing utilities and mock implementations.
//!
//! This module provides a mock [`Converter`](crate::converter::Converter)
//! so the planner, pool and batch runner can be exercised without ffmpeg.
//!
//! # Example
//!
//! ```rust,ignore
//! use flake_core::testing::{fixtures, MockConverter};
//!
//! let input = tempfile::TempDir::new()?;
//! fixtures::write_sources(input.path(), &["a.flac", "sub/b.flac"])?;
//!
//! let converter = MockConverter::new();
//! converter.fail_on("sub/b.flac", "Invalid data found").await;
//! ```

mod mock_converter;

pub use mock_converter::{MockConverter, RecordedConversion};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::{Path, PathBuf};

    /// Contents of every fixture source file.
    pub const FAKE_FLAC: &[u8] = b"fLaC\0\0\0\x22fixture";

    /// Creates `relative` under `root` (and its parent directories) with
    /// fake source content, returning the full path.
    pub fn write_source(root: &Path, relative: &str) -> std::io::Result<PathBuf> {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, FAKE_FLAC)?;
        Ok(path)
    }

    /// Creates every path in `relatives` under `root`.
    pub fn write_sources(root: &Path, relatives: &[&str]) -> std::io::Result<Vec<PathBuf>> {
        relatives
            .iter()
            .map(|relative| write_source(root, relative))
            .collect()
    }

    /// All files under `root`, relative to it, sorted.
    pub fn list_files(root: &Path) -> Vec<String> {
        let mut files: Vec<String> = walkdir::WalkDir::new(root)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| {
                e.path()
                    .strip_prefix(root)
                    .ok()
                    .map(|p| p.to_string_lossy().into_owned())
            })
            .collect();
        files.sort();
        files
    }
}
