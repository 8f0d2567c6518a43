//! xml2msr: MusicXML ingestion engine
//!
//! Reads a `score-partwise` MusicXML document and builds the Score IR: part
//! groups, parts, staves and voices holding notes, chords, tuplets, repeats
//! and lyric chunks, with every duration in whole notes. The IR is what the
//! LilyPond translator consumes.

pub mod api;
pub mod diagnostics;
pub mod errors;
pub mod ingest;
pub mod score;
pub mod tree;

// Re-export commonly used types
pub use diagnostics::{Diagnostic, DiagnosticSeverity, Diagnostics};
pub use errors::{IngestError, ParseError};
pub use ingest::{ingest_musicxml, ingest_tree, IngestResources, IngestResult, IngestSettings};
pub use score::Score;

use wasm_bindgen::prelude::*;

// This is like the `main` function, but for WASM modules.
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    // A logger may already be installed by the host page
    #[cfg(feature = "console_log")]
    let _ = console_log::init_with_level(log::Level::Debug);

    log::info!("xml2msr WASM module initialized");
}
