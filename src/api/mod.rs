//! WASM API
//!
//! - `helpers`: console logging, serialization and error conversion
//! - `ingest`: MusicXML ingestion entry points

pub mod helpers;
pub mod ingest;

pub use ingest::{ingest_musicxml_json, ingest_musicxml_value, ingest_musicxml_with_settings, ingest_to_json};
