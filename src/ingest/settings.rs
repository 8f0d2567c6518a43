//! Ingestion settings
//!
//! Loaded from a YAML or JSON file (or built in code). Every field has a
//! default, so a settings file only needs to mention what it changes.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse settings as YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to parse settings as JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    /// Keep dynamics/wedges/words/pedals queued past rests, attaching them to
    /// the next sounding note instead of the rest
    pub delay_rests_attachments: bool,
    /// Highest accepted `<voice>` number
    pub max_voice_number: u32,
    /// Do not build lyric chunks at all
    pub ignore_lyrics: bool,
    /// Keep only these stanza numbers; `None` keeps every stanza
    pub stanza_filter: Option<Vec<String>>,

    pub trace_notes: bool,
    pub trace_tuplets: bool,
    pub trace_repeats: bool,
    pub trace_lyrics: bool,
    pub trace_part_groups: bool,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            delay_rests_attachments: false,
            max_voice_number: 4,
            ignore_lyrics: false,
            stanza_filter: None,
            trace_notes: false,
            trace_tuplets: false,
            trace_repeats: false,
            trace_lyrics: false,
            trace_part_groups: false,
        }
    }
}

impl IngestSettings {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, SettingsError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from a file; `.json` files are read as JSON, anything else as YAML
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_yaml_str(&content),
        }
    }

    pub fn keeps_stanza(&self, stanza: &str) -> bool {
        match &self.stanza_filter {
            Some(kept) => kept.iter().any(|s| s == stanza),
            None => true,
        }
    }

    /// Turn every trace switch on
    pub fn trace_all(mut self) -> Self {
        self.trace_notes = true;
        self.trace_tuplets = true;
        self.trace_repeats = true;
        self.trace_lyrics = true;
        self.trace_part_groups = true;
        self
    }
}
