//! Score IR: the structure-resolved representation built by ingestion
//!
//! Everything here is plain data. The ingestion engine in [`crate::ingest`]
//! is the only producer; downstream stages only read it.

pub mod barline;
pub mod note;
pub mod structure;
pub mod types;

pub use barline::{
    Barline, BarlineCategory, BarlineLocation, BarlineStyle, EndingType, Repeat, RepeatDirection,
    RepeatEnding, RepeatEndingKind, RepeatWinged, Voicechunk,
};
pub use note::{
    Articulation, Attachments, Chord, Dynamics, LyricChunk, LyricChunkKind, Note, NoteContent,
    NoteKind, Ornament, PedalKind, Slur, SlurKind, TieKind, Tuplet, TupletMember, Wedge, WedgeKind,
    Words,
};
pub use structure::{
    Creator, Direction, GroupSymbol, Identification, Part, PartGroup, PartGroupElement, Score,
    Staff, Voice, VoiceElement,
};
pub use types::{
    Alteration, Clef, ClefKind, DiatonicStep, DisplayDuration, Key, KeyMode, NoteType, Pitch,
    Placement, Rational, Tempo, Time, TimeSymbol,
};
