//! MusicXML to Score IR ingestion
//!
//! One ingestion walks a `score-partwise` element tree once, depth-first in
//! document order, and produces a [`Score`] together with the diagnostics
//! gathered along the way. Fatal problems abort with an [`IngestError`];
//! everything else is reported and traversal continues.
//!
//! ```ignore
//! let result = ingest_musicxml(&xml, None)?;
//! for diagnostic in result.diagnostics.warnings() {
//!     eprintln!("{}", diagnostic);
//! }
//! ```

mod attachments;
mod attributes;
mod barlines;
mod builder;
mod chords;
mod directions;
mod dispatch;
mod identification;
mod lyrics;
mod notes;
mod part_list;
mod resources;
mod settings;
mod tuplets;
mod voices;

pub use resources::IngestResources;
pub use settings::{IngestSettings, SettingsError};

use crate::diagnostics::Diagnostics;
use crate::errors::{IngestError, ParseError, Result};
use crate::score::Score;
use crate::tree::Element;
use builder::ScoreBuilder;
use serde::{Deserialize, Serialize};

/// Output of a successful ingestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestResult {
    pub score: Score,
    pub diagnostics: Diagnostics,
}

/// Parse MusicXML text and ingest it with default resources
pub fn ingest_musicxml(xml: &str, settings: Option<IngestSettings>) -> Result<IngestResult> {
    let root = Element::parse_xml(xml).map_err(|e| {
        log::error!("MusicXML parsing failed: {}", e);
        IngestError::from(e)
    })?;
    ingest_tree(&root, settings.unwrap_or_default(), &IngestResources::new())
}

/// Ingest an already parsed element tree
pub fn ingest_tree(root: &Element, settings: IngestSettings, resources: &IngestResources) -> Result<IngestResult> {
    match root.name.as_str() {
        "score-partwise" => {}
        "score-timewise" => {
            return Err(ParseError::UnsupportedFormat(
                "score-timewise documents must be converted to score-partwise first".to_string(),
            )
            .into())
        }
        other => {
            return Err(ParseError::UnsupportedFormat(format!("root element <{}> is not score-partwise", other)).into())
        }
    }

    log::debug!("ingesting <{}> ({} elements)", root.name, root.subtree_len());

    let mut builder = ScoreBuilder::new(settings, resources);
    let result = dispatch::visit(&mut builder, root).and_then(|()| builder.finish());
    if let Err(e) = &result {
        log::error!("ingestion aborted: {}", e);
    }
    result
}
