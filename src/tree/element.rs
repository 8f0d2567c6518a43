//! Generic, read-only element tree
//!
//! This is the shape the ingestion engine consumes: node name, attribute map,
//! trimmed text, ordered children and the 1-based source line. Conversions of
//! text to numbers happen here, on request, so every failure carries the line
//! of the offending element.

use crate::errors::ParseError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// One node of the generic element tree
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Element {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    pub text: Option<String>,
    pub children: Vec<Element>,
    pub line: usize,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    // Builder-style helpers, handy for constructing trees without XML text

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = line;
        self
    }

    /// Get an attribute value
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Get first child element with given tag name
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All children with given tag name, in document order
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    pub fn has_child(&self, name: &str) -> bool {
        self.child(name).is_some()
    }

    /// Text content of this element, if any
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Text content of first child with given tag
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).and_then(Element::text)
    }

    /// Parse this element's text, `Ok(None)` when it has none
    pub fn parse_text<T: FromStr>(&self) -> Result<Option<T>, ParseError> {
        match self.text() {
            None => Ok(None),
            Some(raw) => raw.parse::<T>().map(Some).map_err(|_| ParseError::InvalidValue {
                line: self.line,
                element: self.name.clone(),
                value: raw.to_string(),
                reason: format!("expected {}", short_type_name::<T>()),
            }),
        }
    }

    /// Parse the text of the first child with given tag
    pub fn child_parse<T: FromStr>(&self, name: &str) -> Result<Option<T>, ParseError> {
        match self.child(name) {
            Some(child) => child.parse_text(),
            None => Ok(None),
        }
    }

    /// Parse the text of a mandatory child
    pub fn required_child_parse<T: FromStr>(&self, name: &str) -> Result<T, ParseError> {
        self.child_parse(name)?
            .ok_or_else(|| ParseError::MissingRequiredElement {
                line: self.line,
                element: name.to_string(),
            })
    }

    /// Parse an attribute value
    pub fn attr_parse<T: FromStr>(&self, key: &str) -> Result<Option<T>, ParseError> {
        match self.attr(key) {
            None => Ok(None),
            Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| ParseError::InvalidValue {
                line: self.line,
                element: format!("{}@{}", self.name, key),
                value: raw.to_string(),
                reason: format!("expected {}", short_type_name::<T>()),
            }),
        }
    }

    /// Number of elements in this subtree, this one included
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(Element::subtree_len).sum::<usize>()
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}
