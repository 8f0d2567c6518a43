//! Score structure: part groups, parts, staves, voices
//!
//! ```text
//! Score
//!   └─ PartGroup*            (ordered forest)
//!        ├─ PartGroup*
//!        └─ Part*
//!             └─ Staff*      (by staff number)
//!                  └─ Voice* (by voice number)
//!                       └─ VoiceElement*
//! ```

use super::barline::{Barline, Repeat, Voicechunk};
use super::note::{Chord, Note, Tuplet, TupletMember};
use super::types::{Clef, Key, Rational, Tempo, Time};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ============================================================================
// VOICE CONTENT
// ============================================================================

/// Directions that stand in the voice rather than decorate a note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Tempo(Tempo),
    Rehearsal(String),
    Segno,
    Coda,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VoiceElement {
    Note(Note),
    Chord(Chord),
    Tuplet(Tuplet),
    Barline(Barline),
    Repeat(Repeat),
    Clef(Clef),
    Key(Key),
    Time(Time),
    Direction(Direction),
    /// End of a measure; `None` after the last measure of the part
    BarCheck { next_measure_number: Option<String> },
}

impl VoiceElement {
    /// Measure the element was read in, for elements that record one
    pub fn measure_number(&self) -> Option<&str> {
        match self {
            VoiceElement::Note(note) => Some(&note.measure_number),
            VoiceElement::Chord(chord) => Some(&chord.measure_number),
            VoiceElement::Tuplet(tuplet) => Some(&tuplet.measure_number),
            VoiceElement::Barline(barline) => Some(&barline.measure_number),
            VoiceElement::Repeat(repeat) => repeat
                .common_part
                .elements
                .iter()
                .find_map(VoiceElement::measure_number),
            _ => None,
        }
    }

    /// Time consumed by this element
    pub fn sounding_whole_notes(&self) -> Rational {
        match self {
            VoiceElement::Note(note) => note.sounding_whole_notes,
            VoiceElement::Chord(chord) => chord.sounding_whole_notes,
            VoiceElement::Tuplet(tuplet) => tuplet.sounding_whole_notes(),
            _ => Rational::from_integer(0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voice {
    pub number: u32,
    pub staff_number: u32,
    /// Closed content, in order
    pub elements: Vec<VoiceElement>,
    /// Elements since the last repeat-structure boundary
    pub current_chunk: Voicechunk,
    /// Repeat whose endings are still being collected
    pub pending_repeat: Option<Repeat>,
    pub position_in_measure: Rational,
    pub divisions_per_whole: u32,
    pub stanzas: BTreeSet<String>,
    #[serde(skip)]
    pub(crate) slur_depth: u32,
    #[serde(skip)]
    pub(crate) first_chunk_kind_in_current_slur: Option<super::note::LyricChunkKind>,
}

impl Voice {
    pub fn new(number: u32, staff_number: u32, divisions_per_whole: u32) -> Self {
        Self {
            number,
            staff_number,
            elements: Vec::new(),
            current_chunk: Voicechunk::new(),
            pending_repeat: None,
            position_in_measure: Rational::from_integer(0),
            divisions_per_whole,
            stanzas: BTreeSet::new(),
            slur_depth: 0,
            first_chunk_kind_in_current_slur: None,
        }
    }

    /// Append to the open chunk
    pub fn append(&mut self, element: VoiceElement) {
        self.current_chunk.elements.push(element);
    }

    /// Move the open chunk's elements into the closed content
    pub fn flush_current_chunk(&mut self) {
        let chunk = std::mem::take(&mut self.current_chunk);
        self.elements.extend(chunk.elements);
    }

    /// Every note in the voice, descending into chords, tuplets and repeats
    pub fn iter_notes(&self) -> impl Iterator<Item = &Note> {
        let mut notes = Vec::new();
        for element in self.elements.iter().chain(self.current_chunk.elements.iter()) {
            collect_notes(element, &mut notes);
        }
        notes.into_iter()
    }

    pub fn note_count(&self) -> usize {
        self.iter_notes().count()
    }

    pub fn repeats(&self) -> impl Iterator<Item = &Repeat> {
        self.elements.iter().filter_map(|e| match e {
            VoiceElement::Repeat(repeat) => Some(repeat),
            _ => None,
        })
    }
}

fn collect_notes<'a>(element: &'a VoiceElement, out: &mut Vec<&'a Note>) {
    match element {
        VoiceElement::Note(note) => out.push(note),
        VoiceElement::Chord(chord) => out.extend(chord.notes.iter()),
        VoiceElement::Tuplet(tuplet) => collect_tuplet_notes(tuplet, out),
        VoiceElement::Repeat(repeat) => {
            for e in &repeat.common_part.elements {
                collect_notes(e, out);
            }
            for ending in &repeat.endings {
                for e in &ending.chunk.elements {
                    collect_notes(e, out);
                }
            }
        }
        _ => {}
    }
}

fn collect_tuplet_notes<'a>(tuplet: &'a Tuplet, out: &mut Vec<&'a Note>) {
    for member in &tuplet.elements {
        match member {
            TupletMember::Note(note) => out.push(note),
            TupletMember::Chord(chord) => out.extend(chord.notes.iter()),
            TupletMember::Tuplet(inner) => collect_tuplet_notes(inner, out),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Staff {
    pub number: u32,
    pub voices: BTreeMap<u32, Voice>,
}

impl Staff {
    pub fn new(number: u32) -> Self {
        Self {
            number,
            voices: BTreeMap::new(),
        }
    }
}

// ============================================================================
// PARTS AND GROUPS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub id: String,
    pub name: Option<String>,
    pub abbreviation: Option<String>,
    pub instrument_name: Option<String>,
    pub staves: BTreeMap<u32, Staff>,
    /// Declared divisions per quarter note times four
    pub divisions_per_whole: u32,
    /// Current clef per staff number
    pub clefs: BTreeMap<u32, Clef>,
    pub key: Option<Key>,
    pub time: Option<Time>,
    pub measure_number: String,
    pub line: usize,
}

impl Part {
    pub fn new(id: impl Into<String>, line: usize) -> Self {
        Self {
            id: id.into(),
            name: None,
            abbreviation: None,
            instrument_name: None,
            staves: BTreeMap::new(),
            divisions_per_whole: 4,
            clefs: BTreeMap::new(),
            key: None,
            time: None,
            measure_number: String::new(),
            line,
        }
    }

    pub fn voices(&self) -> impl Iterator<Item = &Voice> {
        self.staves.values().flat_map(|s| s.voices.values())
    }

    pub fn voices_mut(&mut self) -> impl Iterator<Item = &mut Voice> {
        self.staves.values_mut().flat_map(|s| s.voices.values_mut())
    }

    pub fn voice(&self, staff_number: u32, voice_number: u32) -> Option<&Voice> {
        self.staves.get(&staff_number)?.voices.get(&voice_number)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupSymbol {
    None,
    Brace,
    Bracket,
    Line,
    Square,
}

impl GroupSymbol {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(GroupSymbol::None),
            "brace" => Some(GroupSymbol::Brace),
            "bracket" => Some(GroupSymbol::Bracket),
            "line" => Some(GroupSymbol::Line),
            "square" => Some(GroupSymbol::Square),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PartGroupElement {
    Group(PartGroup),
    Part(Part),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartGroup {
    /// The `number` attribute of `<part-group>`
    pub id: String,
    pub name: Option<String>,
    pub abbreviation: Option<String>,
    pub symbol: GroupSymbol,
    /// `default-x` of the group symbol: left-to-right bracket order
    pub ordering_key: Option<f32>,
    /// Barlines drawn across the staves of the group
    pub barline: bool,
    /// Synthesized top-level group for parts declared outside any group
    pub implicit: bool,
    pub elements: Vec<PartGroupElement>,
    pub line: usize,
}

impl PartGroup {
    pub fn parts(&self) -> Vec<&Part> {
        let mut out = Vec::new();
        for element in &self.elements {
            match element {
                PartGroupElement::Part(part) => out.push(part),
                PartGroupElement::Group(group) => out.extend(group.parts()),
            }
        }
        out
    }
}

// ============================================================================
// SCORE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    /// `type` attribute: composer, lyricist, arranger, poet...
    pub kind: Option<String>,
    pub name: String,
}

/// Document identification metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identification {
    pub work_number: Option<String>,
    pub work_title: Option<String>,
    pub opus: Option<String>,
    pub movement_number: Option<String>,
    pub movement_title: Option<String>,
    pub creators: Vec<Creator>,
    pub rights: Vec<String>,
    pub software: Vec<String>,
    pub encoding_date: Option<String>,
    pub source: Option<String>,
}

impl Identification {
    pub fn creators_of<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.creators
            .iter()
            .filter(move |c| c.kind.as_deref() == Some(kind))
            .map(|c| c.name.as_str())
    }

    /// Movement title, falling back to the work title
    pub fn title(&self) -> Option<&str> {
        self.movement_title
            .as_deref()
            .or(self.work_title.as_deref())
    }
}

/// The Score IR: output of ingestion
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub identification: Identification,
    pub part_groups: Vec<PartGroup>,
}

impl Score {
    pub fn parts(&self) -> Vec<&Part> {
        self.part_groups.iter().flat_map(|g| g.parts()).collect()
    }

    pub fn part_count(&self) -> usize {
        self.parts().len()
    }

    pub fn find_part(&self, id: &str) -> Option<&Part> {
        self.parts().into_iter().find(|p| p.id == id)
    }
}
