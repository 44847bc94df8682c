//! Best-effort removal of extracted package files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::archive::ExtractedPaths;

/// A path that could not be removed.
#[derive(Debug)]
pub struct CleanupFailure {
    pub path: PathBuf,
    pub error: io::Error,
}

/// Outcome of removing an extracted tree.
#[derive(Debug, Default)]
pub struct CleanupReport {
    pub files_removed: usize,
    pub dirs_removed: usize,
    pub failures: Vec<CleanupFailure>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Remove what an extraction wrote, leaving everything else in place.
pub fn remove_extracted(paths: &ExtractedPaths) -> CleanupReport {
    remove_extracted_with(paths, &mut |path| fs::remove_file(path))
}

/// Remove the recorded files, then the recorded directories bottom-up.
///
/// A file that cannot be removed (locked, permission denied) is recorded and
/// skipped; the rest is still cleaned. Files that are already gone are
/// ignored. Directories that still hold a failed file, or content the
/// extraction did not write, are left in place without a report.
pub(crate) fn remove_extracted_with(
    paths: &ExtractedPaths,
    remove_file: &mut dyn FnMut(&Path) -> io::Result<()>,
) -> CleanupReport {
    let mut report = CleanupReport::default();

    for file in &paths.files {
        match remove_file(file) {
            Ok(()) => report.files_removed += 1,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {}
            Err(error) => {
                warn!("Could not remove {}: {}", file.display(), error);
                report.failures.push(CleanupFailure {
                    path: file.clone(),
                    error,
                });
            }
        }
    }

    // recorded parents first, so walk backwards
    for dir in paths.dirs.iter().rev() {
        let holds_failure = report.failures.iter().any(|f| f.path.starts_with(dir));
        if holds_failure {
            continue;
        }
        match fs::remove_dir(dir) {
            Ok(()) => report.dirs_removed += 1,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {}
            Err(_) if has_entries(dir) => {
                debug!("Keeping {}: holds files not written by extraction", dir.display());
            }
            Err(error) => {
                warn!("Could not remove directory {}: {}", dir.display(), error);
                report.failures.push(CleanupFailure {
                    path: dir.clone(),
                    error,
                });
            }
        }
    }

    report
}

fn has_entries(dir: &Path) -> bool {
    fs::read_dir(dir).is_ok_and(|mut entries| entries.next().is_some())
}
