//! Generic element tree
//!
//! The ingestion engine never walks XML text directly: it consumes this
//! tree, which the upstream parser ([`Element::parse_xml`], backed by
//! roxmltree) builds once per document.

pub mod element;
mod xml;

pub use element::Element;
