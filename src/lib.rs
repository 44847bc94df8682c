//! oivkit - OIV package reader
//!
//! Extracts `.oiv` packages (zip archives carrying an `assembly.xml`
//! manifest, an icon and payload files) and exposes their metadata.

pub mod archive;
pub mod config;
pub mod error;
pub mod manifest;
pub mod package;
pub mod paths;
pub mod settings;

pub use config::PackageConfig;
pub use error::{Error, Result};
pub use manifest::{Color, Manifest, PropertyKind, Version};
pub use package::{CleanupReport, OivPackage, PackageSummary, SessionState};
