//! Directory traversal and destination path computation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use super::error::PlanError;
use super::types::{ConversionJob, PlanOptions};

/// Discovers source files under `input_root` and maps each one to a
/// destination under `output_root`.
///
/// Jobs come back in lexicographic order of their path relative to the
/// input root. An empty vector is not an error.
pub fn plan(
    input_root: &Path,
    output_root: &Path,
    options: &PlanOptions,
) -> Result<Vec<ConversionJob>, PlanError> {
    let input_root = resolve_input_root(input_root)?;
    let output_root =
        std::path::absolute(output_root).map_err(|e| PlanError::InvalidOutputRoot {
            path: output_root.to_path_buf(),
            source: e,
        })?;

    debug!(
        "Planning {:?} -> {:?} (extensions: {:?})",
        input_root, output_root, options.source_extensions
    );

    let mut jobs = Vec::new();
    let walker = WalkDir::new(&input_root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable path: {}", e);
                continue;
            }
        };

        if !is_regular_file(&entry) || !has_source_extension(entry.path(), options) {
            continue;
        }

        let relative_path = match entry.path().strip_prefix(&input_root) {
            Ok(relative) => relative.to_path_buf(),
            Err(_) => continue,
        };

        let dest_dir = match relative_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => output_root.join(parent),
            _ => output_root.clone(),
        };

        let mut dest_filename = relative_path
            .file_stem()
            .map(|stem| stem.to_os_string())
            .unwrap_or_default();
        dest_filename.push(".");
        dest_filename.push(options.target_format.extension());

        jobs.push(ConversionJob {
            index: jobs.len(),
            source_path: entry.path().to_path_buf(),
            relative_path,
            dest_dir,
            dest_filename,
        });
    }

    warn_on_collisions(&jobs);

    Ok(jobs)
}

fn resolve_input_root(input_root: &Path) -> Result<PathBuf, PlanError> {
    let not_found = || PlanError::InputNotFound {
        path: input_root.to_path_buf(),
    };

    match std::fs::metadata(input_root) {
        Ok(meta) if meta.is_dir() => input_root.canonicalize().map_err(|_| not_found()),
        _ => Err(not_found()),
    }
}

/// Regular files, and symlinks that resolve to one.
fn is_regular_file(entry: &DirEntry) -> bool {
    if entry.file_type().is_file() {
        return true;
    }
    entry.path_is_symlink()
        && std::fs::metadata(entry.path())
            .map(|m| m.is_file())
            .unwrap_or(false)
}

fn has_source_extension(path: &Path, options: &PlanOptions) -> bool {
    match path.extension() {
        Some(ext) => options
            .source_extensions
            .iter()
            .any(|wanted| ext == wanted.as_str()),
        None => false,
    }
}

/// Two sources with the same stem in one directory (e.g. `a.flac` and
/// `a.wav`) write the same destination.
fn warn_on_collisions(jobs: &[ConversionJob]) {
    let mut seen: HashMap<PathBuf, &Path> = HashMap::new();
    for job in jobs {
        if let Some(previous) = seen.insert(job.dest_path(), &job.relative_path) {
            warn!(
                "{} and {} both convert to {:?}; the last one to finish wins",
                previous.display(),
                job.display_name(),
                job.dest_path()
            );
        }
    }
}
