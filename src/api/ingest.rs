//! Ingestion entry points for JavaScript
//!
//! The JSON-returning functions hand back the whole [`IngestResult`] (score
//! and diagnostics) as a string; `ingestMusicXmlValue` returns it as a plain
//! JavaScript object instead.

use super::helpers::{deserialize, js_error, serialize};
use crate::ingest::{ingest_musicxml, IngestResult, IngestSettings};
use crate::{wasm_info, wasm_warn};
use wasm_bindgen::prelude::*;

/// Ingest and serialize to JSON; the error is a display string
pub fn ingest_to_json(xml: &str, settings: Option<IngestSettings>) -> Result<String, String> {
    let result = ingest_musicxml(xml, settings).map_err(|e| format!("MusicXML ingestion error: {}", e))?;
    serde_json::to_string(&result).map_err(|e| format!("Score serialization error: {}", e))
}

fn report(result: &IngestResult) {
    wasm_info!(
        "  {} part(s), {} diagnostic(s)",
        result.score.part_count(),
        result.diagnostics.len()
    );
    for diagnostic in result.diagnostics.warnings() {
        wasm_warn!("  {}", diagnostic);
    }
}

/// Ingest a MusicXML document with default settings
///
/// # Returns
/// JSON string `{ "score": ..., "diagnostics": ... }`
#[wasm_bindgen(js_name = ingestMusicXml)]
pub fn ingest_musicxml_json(xml: &str) -> Result<String, JsValue> {
    wasm_info!("ingestMusicXml called ({} bytes)", xml.len());
    ingest_to_json(xml, None).map_err(js_error)
}

/// Ingest a MusicXML document with settings given as a JSON string
#[wasm_bindgen(js_name = ingestMusicXmlWithSettings)]
pub fn ingest_musicxml_with_settings(xml: &str, settings_json: &str) -> Result<String, JsValue> {
    wasm_info!("ingestMusicXmlWithSettings called ({} bytes)", xml.len());
    let settings = IngestSettings::from_json_str(settings_json)
        .map_err(|e| js_error(format!("Invalid ingestion settings: {}", e)))?;
    ingest_to_json(xml, Some(settings)).map_err(js_error)
}

/// Ingest a MusicXML document, settings and result as JavaScript objects
#[wasm_bindgen(js_name = ingestMusicXmlValue)]
pub fn ingest_musicxml_value(xml: &str, settings: JsValue) -> Result<JsValue, JsValue> {
    let settings: Option<IngestSettings> = if settings.is_undefined() || settings.is_null() {
        None
    } else {
        Some(deserialize(settings, "Invalid ingestion settings")?)
    };

    let result = ingest_musicxml(xml, settings).map_err(|e| js_error(format!("MusicXML ingestion error: {}", e)))?;
    report(&result);
    serialize(&result, "Score serialization error")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_to_json() {
        let xml = r#"<score-partwise>
  <movement-title>Air</movement-title>
  <part-list><score-part id="P1"><part-name>Flute</part-name></score-part></part-list>
  <part id="P1"><measure number="1">
    <note><pitch><step>A</step><octave>4</octave></pitch><duration>4</duration><type>whole</type></note>
  </measure></part>
</score-partwise>"#;
        let json = ingest_to_json(xml, None).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["score"]["identification"]["movement_title"], "Air");
        assert!(value["diagnostics"].is_object());
    }

    #[test]
    fn test_ingest_to_json_reports_fatal_errors() {
        let err = ingest_to_json("<score-timewise/>", None).unwrap_err();
        assert!(err.starts_with("MusicXML ingestion error"));
    }
}
