//! XML text to element tree, using roxmltree
//!
//! roxmltree rejects DTDs, so the DOCTYPE declaration is blanked out first.
//! Blanking (rather than removing) keeps byte offsets, and therefore line
//! numbers, identical to the original text.

use super::element::Element;
use crate::errors::ParseError;
use roxmltree::{Document, Node};

impl Element {
    /// Parse XML text into an element tree rooted at the document element
    pub fn parse_xml(xml: &str) -> Result<Element, ParseError> {
        let text = blank_doctype(xml);

        let doc = Document::parse(&text)
            .map_err(|e| ParseError::InvalidXml(format!("XML parse error: {}", e)))?;

        Ok(convert_node(&doc, doc.root_element()))
    }
}

fn convert_node(doc: &Document, node: Node) -> Element {
    let line = doc.text_pos_at(node.range().start).row as usize;

    let attributes = node
        .attributes()
        .map(|a| (a.name().to_string(), a.value().to_string()))
        .collect();

    let text = node
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    let children = node
        .children()
        .filter(|n| n.is_element())
        .map(|n| convert_node(doc, n))
        .collect();

    Element {
        name: node.tag_name().name().to_string(),
        attributes,
        text,
        children,
        line,
    }
}

/// Replace the DOCTYPE declaration with spaces, keeping newlines
fn blank_doctype(xml: &str) -> String {
    let Some(start) = xml.find("<!DOCTYPE") else {
        return xml.to_string();
    };

    let rest = &xml[start..];
    // An internal subset ends with "]>", a plain declaration with the first '>'
    let len = match (rest.find('['), rest.find('>')) {
        (Some(open), Some(close)) if open < close => rest.find("]>").map(|i| i + 2),
        (_, Some(close)) => Some(close + 1),
        _ => None,
    };

    let Some(len) = len else {
        return xml.to_string();
    };

    let mut out = String::with_capacity(xml.len());
    out.push_str(&xml[..start]);
    out.extend(
        xml[start..start + len]
            .chars()
            .map(|c| if c == '\n' { '\n' } else { ' ' }),
    );
    out.push_str(&xml[start + len..]);
    out
}
