use std::fs;
use std::path::Path;

use encoding_rs::{Encoding, UTF_8};
use roxmltree::{Document, Node, ParsingOptions};

use crate::error::{Result, ToolError};
use crate::model::Element;

/// Reads and parses the XML document at `path`, returning its root element.
pub fn read_document(path: &Path) -> Result<Element> {
    let bytes = fs::read(path)?;
    let source = decode_source(&bytes)?;
    parse_document(&source)
}

/// Decodes raw XML bytes to UTF-8.
///
/// A byte order mark takes precedence, then the `encoding` pseudo-attribute of
/// the XML declaration; without either the input must be UTF-8. Labels are
/// resolved with the WHATWG rules, so `ISO-8859-1` decodes as windows-1252.
pub fn decode_source(bytes: &[u8]) -> Result<String> {
    let (encoding, body) = match Encoding::for_bom(bytes) {
        Some((encoding, bom_len)) => (encoding, &bytes[bom_len..]),
        None => {
            let encoding = match declared_encoding(bytes) {
                Some(label) => Encoding::for_label(label.as_bytes())
                    .ok_or_else(|| {
                        ToolError::InvalidEncoding(format!("unknown encoding label {label:?}"))
                    })?
                    // UTF-16 labels fall back to UTF-8 when no BOM is present
                    .output_encoding(),
                None => UTF_8,
            };
            (encoding, bytes)
        }
    };

    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .map(|text| text.into_owned())
        .ok_or_else(|| {
            ToolError::InvalidEncoding(format!("input is not valid {}", encoding.name()))
        })
}

/// Extracts the label from `<?xml ... encoding="label" ...?>`, if present.
fn declared_encoding(bytes: &[u8]) -> Option<String> {
    let rest = bytes.strip_prefix(b"<?xml")?;
    let end = rest.windows(2).position(|pair| pair == b"?>")?;
    let declaration = std::str::from_utf8(&rest[..end]).ok()?;

    let after_name = &declaration[declaration.find("encoding")? + "encoding".len()..];
    let value = after_name.trim_start().strip_prefix('=')?.trim_start();
    let quote = value.chars().next().filter(|ch| *ch == '"' || *ch == '\'')?;
    let value = &value[1..];
    let label = &value[..value.find(quote)?];
    Some(label.to_string())
}

/// Parses XML source text into an owned [`Element`] tree.
///
/// Tags keep their local name only. Comments and processing instructions are
/// dropped; text chunks they interrupt are joined.
pub fn parse_document(source: &str) -> Result<Element> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);

    let mut options = ParsingOptions::default();
    options.allow_dtd = true;
    let document = Document::parse_with_options(source, options)?;

    Ok(to_element(document.root_element()))
}

fn to_element(node: Node<'_, '_>) -> Element {
    let mut element = Element::new(node.tag_name().name());
    for attribute in node.attributes() {
        element = element.with_attribute(attribute.name(), attribute.value());
    }

    let mut text: Option<String> = None;
    let mut seen_child = false;
    for child in node.children() {
        if child.is_element() {
            seen_child = true;
            element.push_child(to_element(child));
        } else if child.is_text() && !seen_child {
            if let Some(chunk) = child.text() {
                text.get_or_insert_with(String::new).push_str(chunk);
            }
        }
    }

    match text {
        Some(text) => element.with_text(text),
        None => element,
    }
}
