//! Package root discovery.
//!
//! Real-world archives often wrap their content in an extra folder
//! (`MyMod/assembly.xml`), so the root is wherever the manifest lives.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// File name of the OIV manifest.
pub const MANIFEST_FILE_NAME: &str = "assembly.xml";

/// Find the directory that directly contains `assembly.xml`.
///
/// The search is recursive and sorted by file name. The shallowest manifest
/// wins; when several manifests exist a warning is logged.
pub fn locate_package_root(extraction_root: &Path) -> Result<PathBuf> {
    let matches = find_manifests(extraction_root);

    let Some((_, first)) = matches.iter().min_by_key(|(depth, _)| *depth) else {
        return Err(Error::ManifestNotFound(extraction_root.to_path_buf()));
    };

    if matches.len() > 1 {
        warn!(
            "Found {} {} files under {}, using {}",
            matches.len(),
            MANIFEST_FILE_NAME,
            extraction_root.display(),
            first.display()
        );
    }

    let root = first
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| extraction_root.to_path_buf());

    debug!("Package root: {}", root.display());
    Ok(root)
}

/// All manifests under `extraction_root` with their depth, in traversal order.
fn find_manifests(extraction_root: &Path) -> Vec<(usize, PathBuf)> {
    WalkDir::new(extraction_root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && e.file_name() == MANIFEST_FILE_NAME)
        .map(|e| (e.depth(), e.into_path()))
        .collect()
}
