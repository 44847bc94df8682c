//! Generic element tree for `assembly.xml`.
//!
//! OIV manifests are loosely structured and differ between packaging tools,
//! so no schema is enforced. Elements are stored by local name (prefixes
//! dropped) and looked up anywhere in the tree.

use std::collections::VecDeque;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Error, Result};

/// Deepest element nesting accepted in a manifest.
pub const MAX_DEPTH: usize = 256;

/// One element of the manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Local name without namespace prefix.
    pub name: String,
    /// Attributes by local name, in document order.
    pub attributes: Vec<(String, String)>,
    /// Own text and CDATA, entities resolved.
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    /// Trimmed text content.
    pub fn text(&self) -> &str {
        self.text.trim()
    }

    /// Attribute value by local name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// First element named `name` in document order, starting with `self`.
    pub fn find(&self, name: &str) -> Option<&Element> {
        let mut pending = vec![self];
        while let Some(element) = pending.pop() {
            if element.name == name {
                return Some(element);
            }
            pending.extend(element.children.iter().rev());
        }
        None
    }

    /// Element named `name` closest to `self`; siblings in document order.
    pub fn find_shallowest(&self, name: &str) -> Option<&Element> {
        let mut queue = VecDeque::from([self]);
        while let Some(element) = queue.pop_front() {
            if element.name == name {
                return Some(element);
            }
            queue.extend(element.children.iter());
        }
        None
    }
}

/// Parse manifest XML into its root element.
pub fn parse_document(xml: &str) -> Result<Element> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            Error::MalformedManifest(format!("{} at byte {}", e, reader.error_position()))
        })?;

        match event {
            Event::Start(ref e) => {
                check_depth(stack.len() + 1)?;
                stack.push(start_element(e)?);
            }
            Event::Empty(ref e) => {
                check_depth(stack.len() + 1)?;
                let element = start_element(e)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| Error::MalformedManifest("unexpected closing tag".to_string()))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(ref t) => {
                if let Some(current) = stack.last_mut() {
                    let raw = std::str::from_utf8(t.as_ref()).map_err(utf8_error)?;
                    let text = quick_xml::escape::unescape(raw)
                        .map_err(|e| Error::MalformedManifest(e.to_string()))?;
                    current.text.push_str(&text);
                }
            }
            Event::CData(ref c) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(std::str::from_utf8(c.as_ref()).map_err(utf8_error)?);
                }
            }
            Event::GeneralRef(ref r) => {
                if let Some(current) = stack.last_mut() {
                    let name = std::str::from_utf8(r.as_ref()).map_err(utf8_error)?;
                    current.text.push_str(&resolve_reference(name)?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(Error::MalformedManifest(format!(
            "unclosed element <{}>",
            stack[stack.len() - 1].name
        )));
    }

    root.ok_or_else(|| Error::MalformedManifest("document has no root element".to_string()))
}

/// Build an element from its start tag, attributes included.
fn start_element(e: &BytesStart<'_>) -> Result<Element> {
    let name = std::str::from_utf8(e.local_name().as_ref())
        .map_err(utf8_error)?
        .to_string();

    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|e| Error::MalformedManifest(e.to_string()))?;
        let key = std::str::from_utf8(attr.key.local_name().as_ref())
            .map_err(utf8_error)?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| Error::MalformedManifest(e.to_string()))?
            .into_owned();
        attributes.push((key, value));
    }

    Ok(Element {
        name,
        attributes,
        ..Default::default()
    })
}

fn check_depth(depth: usize) -> Result<()> {
    if depth > MAX_DEPTH {
        return Err(Error::MalformedManifest(format!(
            "elements nested deeper than {MAX_DEPTH} levels"
        )));
    }
    Ok(())
}

/// Hand a finished element to its parent, or make it the root.
fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(Error::MalformedManifest(format!(
                "second root element <{}>",
                element.name
            )))
        }
    }
    Ok(())
}

/// Resolve `&name;` / `&#NN;` / `&#xHH;` to its text.
fn resolve_reference(name: &str) -> Result<String> {
    let unknown = || Error::MalformedManifest(format!("unknown entity &{name};"));

    if let Some(number) = name.strip_prefix('#') {
        let code = match number.strip_prefix('x').or_else(|| number.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => number.parse(),
        }
        .map_err(|_| unknown())?;
        return char::from_u32(code).map(String::from).ok_or_else(unknown);
    }

    quick_xml::escape::resolve_predefined_entity(name)
        .map(str::to_string)
        .ok_or_else(unknown)
}

fn utf8_error(e: std::str::Utf8Error) -> Error {
    Error::MalformedManifest(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tree() {
        let root = parse_document(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <package version="2.2" target="Five">
                <metadata>
                    <name>Foo</name>
                    <version><major>1</major><minor>2</minor></version>
                </metadata>
                <colors><headerBackground useBlackTextColor="True">$FF112233</headerBackground></colors>
            </package>"#,
        )
        .unwrap();

        assert_eq!(root.name, "package");
        assert_eq!(root.attribute("target"), Some("Five"));
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.find("minor").unwrap().text(), "2");
        let header = root.find("headerBackground").unwrap();
        assert_eq!(header.attribute("useBlackTextColor"), Some("True"));
        assert_eq!(header.text(), "$FF112233");
    }

    #[test]
    fn test_namespace_prefixes_are_dropped() {
        let root = parse_document(
            r#"<oiv:package xmlns:oiv="urn:oiv"><oiv:name oiv:lang="en">Foo</oiv:name></oiv:package>"#,
        )
        .unwrap();
        let name = root.find("name").unwrap();
        assert_eq!(name.text(), "Foo");
        assert_eq!(name.attribute("lang"), Some("en"));
    }

    #[test]
    fn test_text_entities_and_cdata() {
        let root = parse_document(
            "<package><description><![CDATA[Line <b>one</b>]]> &amp; two &#x41;&#66;</description></package>",
        )
        .unwrap();
        assert_eq!(root.find("description").unwrap().text(), "Line <b>one</b> & two AB");
    }

    #[test]
    fn test_find_vs_find_shallowest() {
        let root = parse_document(
            "<package><content><item><name>deep</name></item></content><name>top</name></package>",
        )
        .unwrap();
        assert_eq!(root.find("name").unwrap().text(), "deep");
        assert_eq!(root.find_shallowest("name").unwrap().text(), "top");
        assert!(root.find("missing").is_none());
    }

    #[test]
    fn test_find_is_document_order() {
        let root = parse_document(
            "<package><a><name>first</name></a><b><name>second</name></b><name>third</name></package>",
        )
        .unwrap();
        assert_eq!(root.find("name").unwrap().text(), "first");
        assert_eq!(root.find("package").unwrap().name, "package");
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |depth: usize| format!("{}{}", "<a>".repeat(depth), "</a>".repeat(depth));

        let root = parse_document(&nested(MAX_DEPTH)).unwrap();
        assert!(root.find("zzz").is_none());

        let err = parse_document(&nested(MAX_DEPTH + 1)).unwrap_err();
        assert!(matches!(err, Error::MalformedManifest(_)));

        // far past the limit fails the same way instead of exhausting the stack
        let err = parse_document(&nested(200_000)).unwrap_err();
        assert!(matches!(err, Error::MalformedManifest(_)));

        let leaf = format!("{}<b/>{}", "<a>".repeat(MAX_DEPTH), "</a>".repeat(MAX_DEPTH));
        assert!(matches!(parse_document(&leaf), Err(Error::MalformedManifest(_))));
    }

    #[test]
    fn test_malformed_documents() {
        for xml in ["", "<package>", "<a></b>", "<a/><b/>", "<a>&bogus;</a>"] {
            let err = parse_document(xml).unwrap_err();
            assert!(matches!(err, Error::MalformedManifest(_)), "{xml:?} should fail");
        }
    }
}
