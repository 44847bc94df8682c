//! Package session configuration
//!
//! Defines how a session picks its extraction directory and what happens
//! to extracted files on teardown.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::paths::default_extraction_root;

/// Configuration for an OIV package session
#[derive(Debug, Clone)]
pub struct PackageConfig {
    /// Path to the .oiv archive
    pub archive_path: PathBuf,

    /// Exact extraction directory (overrides `extraction_base_dir`)
    pub extraction_dir: Option<PathBuf>,

    /// Parent for default extraction directories (defaults to the per-user data dir)
    pub extraction_base_dir: Option<PathBuf>,

    /// Leave extracted files on disk when the session is dropped without `close()`
    pub keep_extracted: bool,
}

impl PackageConfig {
    pub fn new(archive_path: impl Into<PathBuf>) -> Self {
        PackageConfig {
            archive_path: archive_path.into(),
            extraction_dir: None,
            extraction_base_dir: None,
            keep_extracted: false,
        }
    }

    /// Directory the archive will be extracted to
    pub fn extraction_root(&self) -> Result<PathBuf> {
        match &self.extraction_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_extraction_root(&self.archive_path, self.extraction_base_dir.as_deref()),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !self.archive_path.is_file() {
            return Err(Error::NotFound(self.archive_path.clone()));
        }
        Ok(())
    }

    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_root_precedence() {
        let mut config = PackageConfig::new("/downloads/Pkg.oiv");
        config.extraction_base_dir = Some(PathBuf::from("/base"));
        assert_eq!(config.extraction_root().unwrap(), PathBuf::from("/base/Pkg"));

        config.extraction_dir = Some(PathBuf::from("/exact"));
        assert_eq!(config.extraction_root().unwrap(), PathBuf::from("/exact"));
    }

    #[test]
    fn test_validate_missing_archive() {
        let config = PackageConfig::new("/definitely/not/here.oiv");
        assert!(matches!(config.validate(), Err(Error::NotFound(_))));
    }
}
