//! `assembly.xml` manifest support.
//!
//! This module handles:
//! - Decoding the manifest bytes (UTF-8/UTF-16, with or without BOM)
//! - Parsing into a generic element tree
//! - Resolving package properties with name-based lookup rules
//!
//! # Example
//!
//! ```ignore
//! use oivkit::manifest::{Manifest, PropertyKind};
//!
//! let manifest = Manifest::load(&package_root.join("assembly.xml"))?;
//! println!("{}", manifest.get_property(PropertyKind::Version)?);
//! ```

pub mod color;
pub mod document;
mod encoding;

pub use color::{normalize_color, Color, ColorParseError};
pub use document::{parse_document, Element};
pub use encoding::{decode_manifest_bytes, read_manifest_text};

use std::fmt;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};

/// Properties readable from a manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PropertyKind {
    PackageName,
    AuthorName,
    Version,
    Description,
    HeaderBackground,
    IconBackground,
}

impl PropertyKind {
    pub const ALL: [PropertyKind; 6] = [
        PropertyKind::PackageName,
        PropertyKind::AuthorName,
        PropertyKind::Version,
        PropertyKind::Description,
        PropertyKind::HeaderBackground,
        PropertyKind::IconBackground,
    ];

    /// Element the property is read from.
    pub fn element_name(&self) -> &'static str {
        match self {
            PropertyKind::PackageName => "name",
            PropertyKind::AuthorName => "displayName",
            PropertyKind::Version => "version",
            PropertyKind::Description => "description",
            PropertyKind::HeaderBackground => "headerBackground",
            PropertyKind::IconBackground => "iconBackground",
        }
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.element_name())
    }
}

/// Package version as `major.minor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// A parsed `assembly.xml`.
#[derive(Debug, Clone)]
pub struct Manifest {
    root: Element,
}

impl Manifest {
    /// Parse manifest XML.
    pub fn parse(xml: &str) -> Result<Self> {
        Ok(Manifest {
            root: parse_document(xml)?,
        })
    }

    /// Read, decode and parse a manifest file.
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Parsing manifest {}", path.display());
        let xml = read_manifest_text(path)?;
        Self::parse(&xml).map_err(|e| match e {
            Error::MalformedManifest(reason) => {
                Error::MalformedManifest(format!("{}: {}", path.display(), reason))
            }
            other => other,
        })
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Top-level `name`.
    pub fn package_name(&self) -> Option<&str> {
        self.root.find_shallowest("name").map(Element::text)
    }

    /// First `displayName` anywhere in the document.
    pub fn author_name(&self) -> Option<&str> {
        self.root.find("displayName").map(Element::text)
    }

    /// Top-level `description`.
    pub fn description(&self) -> Option<&str> {
        self.root.find_shallowest("description").map(Element::text)
    }

    /// Version from the first `major` and `minor` elements.
    ///
    /// `Ok(None)` when neither exists; one without the other, or a
    /// non-numeric part, is a `Property` error.
    pub fn version(&self) -> Result<Option<Version>> {
        let major = self.root.find("major").map(Element::text);
        let minor = self.root.find("minor").map(Element::text);

        let (major, minor) = match (major, minor) {
            (None, None) => return Ok(None),
            (Some(major), Some(minor)) => (major, minor),
            (major, minor) => {
                return Err(Error::Property {
                    property: PropertyKind::Version,
                    value: format!("{}.{}", major.unwrap_or(""), minor.unwrap_or("")),
                    reason: "major and minor must both be present".to_string(),
                })
            }
        };

        let part = |value: &str| {
            value.parse::<u32>().map_err(|e| Error::Property {
                property: PropertyKind::Version,
                value: format!("{major}.{minor}"),
                reason: e.to_string(),
            })
        };

        Ok(Some(Version {
            major: part(major)?,
            minor: part(minor)?,
        }))
    }

    /// Header background as a normalized `#` string.
    pub fn header_background(&self) -> Result<Option<String>> {
        self.color_text(PropertyKind::HeaderBackground)
    }

    /// Icon background as a normalized `#` string.
    pub fn icon_background(&self) -> Result<Option<String>> {
        self.color_text(PropertyKind::IconBackground)
    }

    pub fn header_background_color(&self) -> Result<Option<Color>> {
        self.color(PropertyKind::HeaderBackground)
    }

    pub fn icon_background_color(&self) -> Result<Option<Color>> {
        self.color(PropertyKind::IconBackground)
    }

    /// `useBlackTextColor` on `headerBackground`, case-insensitive `"true"`.
    pub fn black_header_foreground(&self) -> bool {
        self.root
            .find("headerBackground")
            .and_then(|e| e.attribute("useBlackTextColor"))
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    }

    /// Property as an optional string; `None` when the element is absent.
    pub fn property(&self, kind: PropertyKind) -> Result<Option<String>> {
        Ok(match kind {
            PropertyKind::PackageName => self.package_name().map(str::to_string),
            PropertyKind::AuthorName => self.author_name().map(str::to_string),
            PropertyKind::Description => self.description().map(str::to_string),
            PropertyKind::Version => self.version()?.map(|v| v.to_string()),
            PropertyKind::HeaderBackground => self.header_background()?,
            PropertyKind::IconBackground => self.icon_background()?,
        })
    }

    /// Property as a string with the classic defaults: missing values are
    /// `""`, except the author name, which is mandatory.
    pub fn get_property(&self, kind: PropertyKind) -> Result<String> {
        match (kind, self.property(kind)?) {
            (_, Some(value)) => Ok(value),
            (PropertyKind::AuthorName, None) => Err(Error::InvalidManifest(
                "author displayName is missing".to_string(),
            )),
            (_, None) => Ok(String::new()),
        }
    }

    fn color_text(&self, kind: PropertyKind) -> Result<Option<String>> {
        let Some(element) = self.root.find(kind.element_name()) else {
            return Ok(None);
        };
        let normalized = normalize_color(element.text());
        normalized.parse::<Color>().map_err(|e| Error::Property {
            property: kind,
            value: element.text().to_string(),
            reason: e.to_string(),
        })?;
        Ok(Some(normalized))
    }

    fn color(&self, kind: PropertyKind) -> Result<Option<Color>> {
        // color_text has already validated the value
        Ok(self
            .color_text(kind)?
            .and_then(|text| text.parse::<Color>().ok()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<package version="2.2" id="{00000000-0000-0000-0000-000000000000}" target="Five">
  <metadata>
    <name>Foo</name>
    <version>
      <major>1</major>
      <minor>2</minor>
      <tag>Beta</tag>
    </version>
    <author>
      <displayName>Alice</displayName>
      <actionLink>https://example.com</actionLink>
    </author>
    <description><![CDATA[Bar]]></description>
  </metadata>
  <colors>
    <headerBackground useBlackTextColor="TRUE">$FF00FF</headerBackground>
    <iconBackground>#80112233</iconBackground>
  </colors>
  <content>
    <add source="x.rpf">update\x64\dlcpacks\x\dlc.rpf</add>
  </content>
</package>"#;

    #[test]
    fn test_sample_properties() {
        let m = Manifest::parse(SAMPLE).unwrap();
        assert_eq!(m.get_property(PropertyKind::PackageName).unwrap(), "Foo");
        assert_eq!(m.get_property(PropertyKind::AuthorName).unwrap(), "Alice");
        assert_eq!(m.get_property(PropertyKind::Version).unwrap(), "1.2");
        assert_eq!(m.get_property(PropertyKind::Description).unwrap(), "Bar");
        assert_eq!(m.get_property(PropertyKind::HeaderBackground).unwrap(), "#FF00FF");
        assert_eq!(m.get_property(PropertyKind::IconBackground).unwrap(), "#80112233");
        assert!(m.black_header_foreground());
        assert_eq!(m.version().unwrap(), Some(Version { major: 1, minor: 2 }));
        assert_eq!(m.icon_background_color().unwrap().unwrap().argb(), (0x80, 0x11, 0x22, 0x33));
        assert_eq!(m.header_background_color().unwrap(), Some(Color::rgb(0xFF, 0, 0xFF)));
    }

    #[test]
    fn test_flat_manifest() {
        let m = Manifest::parse(
            "<package><name>Foo</name><description>Bar</description>\
             <a><b><displayName>Alice</displayName></b></a>\
             <v><major>1</major></v><w><minor>2</minor></w></package>",
        )
        .unwrap();
        assert_eq!(m.package_name(), Some("Foo"));
        assert_eq!(m.description(), Some("Bar"));
        assert_eq!(m.author_name(), Some("Alice"));
        assert_eq!(m.get_property(PropertyKind::Version).unwrap(), "1.2");
    }

    #[test]
    fn test_missing_optional_properties_are_empty() {
        let m = Manifest::parse("<package><author><displayName>Alice</displayName></author></package>").unwrap();
        for kind in PropertyKind::ALL {
            if kind == PropertyKind::AuthorName {
                continue;
            }
            assert_eq!(m.get_property(kind).unwrap(), "", "{kind}");
            assert_eq!(m.property(kind).unwrap(), None, "{kind}");
        }
        assert!(!m.black_header_foreground());
    }

    #[test]
    fn test_missing_author_is_invalid() {
        let m = Manifest::parse("<package><name>Foo</name></package>").unwrap();
        assert!(matches!(
            m.get_property(PropertyKind::AuthorName),
            Err(Error::InvalidManifest(_))
        ));
        assert_eq!(m.property(PropertyKind::AuthorName).unwrap(), None);
    }

    #[test]
    fn test_black_header_foreground_variants() {
        let check = |xml: &str| Manifest::parse(xml).unwrap().black_header_foreground();
        assert!(check(r#"<p><headerBackground useBlackTextColor="true">$FFFFFF</headerBackground></p>"#));
        assert!(check(r#"<p><headerBackground useBlackTextColor="True"/></p>"#));
        assert!(!check(r#"<p><headerBackground useBlackTextColor="False">$FFFFFF</headerBackground></p>"#));
        assert!(!check(r#"<p><headerBackground>$FFFFFF</headerBackground></p>"#));
        assert!(!check("<p/>"));
    }

    #[test]
    fn test_malformed_version() {
        let only_major = Manifest::parse("<p><major>1</major></p>").unwrap();
        assert!(matches!(
            only_major.get_property(PropertyKind::Version),
            Err(Error::Property { property: PropertyKind::Version, .. })
        ));

        let not_numeric = Manifest::parse("<p><major>one</major><minor>2</minor></p>").unwrap();
        assert!(not_numeric.version().is_err());
    }

    #[test]
    fn test_malformed_color() {
        let m = Manifest::parse("<p><iconBackground>$XYZ</iconBackground></p>").unwrap();
        assert!(matches!(
            m.get_property(PropertyKind::IconBackground),
            Err(Error::Property { property: PropertyKind::IconBackground, .. })
        ));
    }

    #[test]
    fn test_load_reports_path_on_syntax_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assembly.xml");
        std::fs::write(&path, "<package><name>Foo</package>").unwrap();

        match Manifest::load(&path) {
            Err(Error::MalformedManifest(reason)) => assert!(reason.contains("assembly.xml")),
            other => panic!("expected MalformedManifest, got {other:?}"),
        }
    }
}
