//! Display values of an opened package.

use std::path::PathBuf;

use serde::Serialize;

use super::OivPackage;
use crate::error::Result;
use crate::manifest::{Color, PropertyKind};

/// Everything a presentation layer shows for a package.
#[derive(Debug, Clone, Serialize)]
pub struct PackageSummary {
    pub name: String,
    pub author: String,
    pub version: String,
    pub description: String,
    pub header_background: String,
    pub icon_background: String,
    pub header_background_color: Option<Color>,
    pub icon_background_color: Option<Color>,
    pub black_header_foreground: bool,
    pub icon_path: PathBuf,
    pub package_root: PathBuf,
}

impl PackageSummary {
    /// Collect the summary of an opened package.
    pub fn from_package(package: &OivPackage) -> Result<Self> {
        let manifest = package.manifest()?;
        let icon_path = package.icon_path()?;
        let package_root = icon_path
            .parent()
            .map(PathBuf::from)
            .unwrap_or_default();

        Ok(PackageSummary {
            name: manifest.get_property(PropertyKind::PackageName)?,
            author: manifest.get_property(PropertyKind::AuthorName)?,
            version: manifest.get_property(PropertyKind::Version)?,
            description: manifest.get_property(PropertyKind::Description)?,
            header_background: manifest.get_property(PropertyKind::HeaderBackground)?,
            icon_background: manifest.get_property(PropertyKind::IconBackground)?,
            header_background_color: manifest.header_background_color()?,
            icon_background_color: manifest.icon_background_color()?,
            black_header_foreground: manifest.black_header_foreground(),
            icon_path,
            package_root,
        })
    }
}
