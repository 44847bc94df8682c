//! OIV package sessions.
//!
//! A session owns one extracted copy of an archive:
//! - `open()` extracts the zip and locates `assembly.xml`
//! - property queries parse the manifest once and reuse it
//! - `close()` (or dropping the session) removes the files `open()` wrote,
//!   and nothing else
//!
//! # Example
//!
//! ```ignore
//! use oivkit::package::OivPackage;
//! use oivkit::manifest::PropertyKind;
//!
//! let mut package = OivPackage::new("MyMod.oiv")?;
//! package.open()?;
//! println!("{}", package.get_property(PropertyKind::PackageName)?);
//! let report = package.close()?;
//! ```

pub mod cleanup;
pub mod locate;
mod summary;

pub use cleanup::{remove_extracted, CleanupFailure, CleanupReport};
pub use locate::{locate_package_root, MANIFEST_FILE_NAME};
pub use summary::PackageSummary;

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use once_cell::unsync::OnceCell;
use tracing::{info, warn};

use crate::archive::{extract_into, ExtractProgress, ExtractStats, ExtractedPaths};
use crate::config::PackageConfig;
use crate::error::{Error, Result};
use crate::manifest::{Color, Manifest, PropertyKind, Version};

/// File name of the package icon next to the manifest.
pub const ICON_FILE_NAME: &str = "icon.png";

/// Receives one human-readable line per lifecycle step.
pub type LogSink = Box<dyn Fn(&str) + Send>;

/// Lifecycle state of a package session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unopened,
    Opened,
    /// `open()` extracted something but did not produce a usable package.
    Failed,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Unopened => "unopened",
            SessionState::Opened => "opened",
            SessionState::Failed => "failed",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// An OIV archive and its extracted contents.
pub struct OivPackage {
    config: PackageConfig,
    state: SessionState,
    extraction_root: Option<PathBuf>,
    package_root: Option<PathBuf>,
    extracted: ExtractedPaths,
    manifest: OnceCell<Manifest>,
    log_sink: Option<LogSink>,
}

impl OivPackage {
    /// Session for the archive at `archive_path`, extracted to the default location.
    pub fn new(archive_path: impl Into<PathBuf>) -> Result<Self> {
        Self::with_config(PackageConfig::new(archive_path))
    }

    pub fn with_config(config: PackageConfig) -> Result<Self> {
        config.validate()?;
        Ok(OivPackage {
            config,
            state: SessionState::Unopened,
            extraction_root: None,
            package_root: None,
            extracted: ExtractedPaths::default(),
            manifest: OnceCell::new(),
            log_sink: None,
        })
    }

    /// Register a sink for lifecycle messages.
    pub fn set_log_sink(&mut self, sink: LogSink) {
        self.log_sink = Some(sink);
    }

    pub fn archive_path(&self) -> &Path {
        &self.config.archive_path
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Directory the archive was extracted to, once `open()` has run.
    pub fn extraction_root(&self) -> Option<&Path> {
        self.extraction_root.as_deref()
    }

    /// Directory containing `assembly.xml`; set only while opened.
    pub fn package_root(&self) -> Option<&Path> {
        self.package_root.as_deref()
    }

    /// Extract the archive to the configured location.
    pub fn open(&mut self) -> Result<ExtractStats> {
        self.open_with_progress(None, &mut |_| {})
    }

    /// Extract the archive to `dest` instead of the configured location.
    pub fn open_in(&mut self, dest: &Path) -> Result<ExtractStats> {
        self.open_with_progress(Some(dest), &mut |_| {})
    }

    /// Extract and locate the package root, reporting each extracted file.
    ///
    /// Only legal once. A failure after something was written leaves the
    /// session `Failed` and the written files stay until `close()`. A failure
    /// before anything was written leaves the session `Unopened`.
    pub fn open_with_progress(
        &mut self,
        dest: Option<&Path>,
        on_progress: &mut dyn FnMut(ExtractProgress<'_>),
    ) -> Result<ExtractStats> {
        self.log(&format!("Opening {}", self.config.archive_path.display()));

        match self.state {
            SessionState::Unopened => {}
            SessionState::Opened => {
                self.log("OIV package has already been extracted.");
                return Err(Error::AlreadyOpened);
            }
            actual => {
                return Err(Error::InvalidState {
                    expected: SessionState::Unopened,
                    actual,
                })
            }
        }

        let extraction_root = match dest {
            Some(dest) => dest.to_path_buf(),
            None => self.config.extraction_root()?,
        };

        let mut written = ExtractedPaths::default();
        let opened = extract_into(&self.config.archive_path, &extraction_root, &mut written, on_progress)
            .and_then(|stats| Ok((stats, locate_package_root(&extraction_root)?)));

        if opened.is_ok() || !written.is_empty() {
            self.extraction_root = Some(extraction_root);
            self.extracted = written;
        }

        match opened {
            Ok((stats, package_root)) => {
                self.log(&format!("Root folder: {}", package_root.display()));
                self.package_root = Some(package_root);
                self.state = SessionState::Opened;
                Ok(stats)
            }
            Err(e) if self.extracted.is_empty() => {
                self.log(&format!("Opening failed, nothing was extracted: {e}"));
                Err(e)
            }
            Err(e) => {
                self.log(&format!("Opening failed: {e}"));
                self.state = SessionState::Failed;
                Err(e)
            }
        }
    }

    /// Whether `open()` found a manifest.
    pub fn is_valid(&self) -> bool {
        self.state == SessionState::Opened && self.package_root.is_some()
    }

    /// Path of the package icon. The file is not checked for existence.
    pub fn icon_path(&self) -> Result<PathBuf> {
        Ok(self.opened_root()?.join(ICON_FILE_NAME))
    }

    /// Path of `assembly.xml`.
    pub fn manifest_path(&self) -> Result<PathBuf> {
        Ok(self.opened_root()?.join(MANIFEST_FILE_NAME))
    }

    /// The parsed manifest, loaded on first use.
    pub fn manifest(&self) -> Result<&Manifest> {
        let path = self.manifest_path()?;
        self.manifest.get_or_try_init(|| Manifest::load(&path))
    }

    /// Property with classic defaults: `""` when missing, author mandatory.
    pub fn get_property(&self, kind: PropertyKind) -> Result<String> {
        self.manifest()?.get_property(kind)
    }

    /// Property as an `Option`; the caller picks the default.
    pub fn property(&self, kind: PropertyKind) -> Result<Option<String>> {
        self.manifest()?.property(kind)
    }

    pub fn version(&self) -> Result<Option<Version>> {
        self.manifest()?.version()
    }

    /// Whether header text should be drawn black rather than white.
    pub fn black_header_foreground(&self) -> Result<bool> {
        Ok(self.manifest()?.black_header_foreground())
    }

    pub fn header_background_color(&self) -> Result<Option<Color>> {
        self.manifest()?.header_background_color()
    }

    pub fn icon_background_color(&self) -> Result<Option<Color>> {
        self.manifest()?.icon_background_color()
    }

    /// All display values at once.
    pub fn summary(&self) -> Result<PackageSummary> {
        PackageSummary::from_package(self)
    }

    /// Remove the extracted files and end the session.
    ///
    /// Only what `open()` wrote is removed. Files that cannot be deleted are
    /// listed in the report; the rest are still removed. Directories created
    /// by extraction go away once empty. Legal from `Opened` and `Failed`.
    pub fn close(&mut self) -> Result<CleanupReport> {
        self.close_with(&mut |path| fs::remove_file(path))
    }

    pub(crate) fn close_with(
        &mut self,
        remove_file: &mut dyn FnMut(&Path) -> io::Result<()>,
    ) -> Result<CleanupReport> {
        match self.state {
            SessionState::Opened | SessionState::Failed => {}
            actual => {
                return Err(Error::InvalidState {
                    expected: SessionState::Opened,
                    actual,
                })
            }
        }

        self.log(&format!("Closing {}", self.config.archive_path.display()));
        let report = self.cleanup(remove_file);
        self.state = SessionState::Closed;
        Ok(report)
    }

    fn cleanup(&mut self, remove_file: &mut dyn FnMut(&Path) -> io::Result<()>) -> CleanupReport {
        self.package_root = None;
        self.manifest.take();

        let extracted = std::mem::take(&mut self.extracted);
        let report = cleanup::remove_extracted_with(&extracted, remove_file);
        if !report.is_clean() {
            if let Some(root) = &self.extraction_root {
                self.log(&format!(
                    "{} paths under {} could not be removed",
                    report.failures.len(),
                    root.display()
                ));
            }
        }
        report
    }

    fn opened_root(&self) -> Result<&Path> {
        match (&self.state, &self.package_root) {
            (SessionState::Opened, Some(root)) => Ok(root.as_path()),
            (actual, _) => Err(Error::InvalidState {
                expected: SessionState::Opened,
                actual: *actual,
            }),
        }
    }

    fn log(&self, message: &str) {
        info!("{}", message);
        if let Some(sink) = &self.log_sink {
            sink(message);
        }
    }
}

impl fmt::Debug for OivPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OivPackage")
            .field("archive_path", &self.config.archive_path)
            .field("state", &self.state)
            .field("extraction_root", &self.extraction_root)
            .field("package_root", &self.package_root)
            .finish()
    }
}

impl Drop for OivPackage {
    fn drop(&mut self) {
        let needs_cleanup = matches!(self.state, SessionState::Opened | SessionState::Failed);
        if needs_cleanup && !self.config.keep_extracted {
            let report = self.cleanup(&mut |path| fs::remove_file(path));
            if !report.is_clean() {
                warn!("Teardown left {} paths behind", report.failures.len());
            }
        }
    }
}
