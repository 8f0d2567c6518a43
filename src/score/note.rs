//! Notes, chords, tuplets and what gets attached to them

use super::types::{DisplayDuration, Pitch, Placement, Rational};
use serde::{Deserialize, Serialize};

// ============================================================================
// NOTE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteKind {
    Standalone,
    ChordMember,
    TupletMember,
    Grace,
    Rest,
}

/// What sounds: a pitch, an unpitched (percussion) position, or silence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteContent {
    Pitched(Pitch),
    Unpitched { display_step: Option<String>, display_octave: Option<i8> },
    Rest {
        /// `<rest measure="yes">`
        full_measure: bool,
        /// Synthesized by `<forward>`, never printed
        invisible: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TieKind {
    Start,
    Continue,
    Stop,
    /// Both a tie stop and a tie start on the same note
    StopStart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlurKind {
    Start,
    Continue,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slur {
    pub kind: SlurKind,
    pub number: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Articulation {
    Accent,
    StrongAccent,
    Staccato,
    Tenuto,
    DetachedLegato,
    Staccatissimo,
    Spiccato,
    Scoop,
    Plop,
    Doit,
    Falloff,
    BreathMark,
    Caesura,
    Stress,
    Unstress,
    Fermata,
    Arpeggiate,
}

impl Articulation {
    /// Elements found under `<articulations>`
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "accent" => Some(Articulation::Accent),
            "strong-accent" => Some(Articulation::StrongAccent),
            "staccato" => Some(Articulation::Staccato),
            "tenuto" => Some(Articulation::Tenuto),
            "detached-legato" => Some(Articulation::DetachedLegato),
            "staccatissimo" => Some(Articulation::Staccatissimo),
            "spiccato" => Some(Articulation::Spiccato),
            "scoop" => Some(Articulation::Scoop),
            "plop" => Some(Articulation::Plop),
            "doit" => Some(Articulation::Doit),
            "falloff" => Some(Articulation::Falloff),
            "breath-mark" => Some(Articulation::BreathMark),
            "caesura" => Some(Articulation::Caesura),
            "stress" => Some(Articulation::Stress),
            "unstress" => Some(Articulation::Unstress),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ornament {
    TrillMark,
    Turn,
    InvertedTurn,
    DelayedTurn,
    Mordent,
    InvertedMordent,
    Schleifer,
    Tremolo(u8),
}

impl Ornament {
    /// Elements found under `<ornaments>`, tremolo excepted
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "trill-mark" => Some(Ornament::TrillMark),
            "turn" => Some(Ornament::Turn),
            "inverted-turn" => Some(Ornament::InvertedTurn),
            "delayed-turn" => Some(Ornament::DelayedTurn),
            "mordent" => Some(Ornament::Mordent),
            "inverted-mordent" => Some(Ornament::InvertedMordent),
            "schleifer" => Some(Ornament::Schleifer),
            _ => None,
        }
    }
}

// ============================================================================
// ATTACHMENTS (arrive in <direction> before the note they decorate)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dynamics {
    PPPPP,
    PPPP,
    PPP,
    PP,
    P,
    MP,
    MF,
    F,
    FF,
    FFF,
    FFFF,
    FFFFF,
    FP,
    SF,
    SFP,
    SFPP,
    SFZ,
    SFFZ,
    FZ,
    RF,
    RFZ,
    PF,
    N,
    Other(String),
}

impl Dynamics {
    pub fn parse(name: &str) -> Option<Self> {
        let d = match name {
            "ppppp" => Dynamics::PPPPP,
            "pppp" => Dynamics::PPPP,
            "ppp" => Dynamics::PPP,
            "pp" => Dynamics::PP,
            "p" => Dynamics::P,
            "mp" => Dynamics::MP,
            "mf" => Dynamics::MF,
            "f" => Dynamics::F,
            "ff" => Dynamics::FF,
            "fff" => Dynamics::FFF,
            "ffff" => Dynamics::FFFF,
            "fffff" => Dynamics::FFFFF,
            "fp" => Dynamics::FP,
            "sf" => Dynamics::SF,
            "sfp" => Dynamics::SFP,
            "sfpp" => Dynamics::SFPP,
            "sfz" => Dynamics::SFZ,
            "sffz" => Dynamics::SFFZ,
            "fz" => Dynamics::FZ,
            "rf" => Dynamics::RF,
            "rfz" => Dynamics::RFZ,
            "pf" => Dynamics::PF,
            "n" => Dynamics::N,
            _ => return None,
        };
        Some(d)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WedgeKind {
    Crescendo,
    Diminuendo,
    Stop,
    Continue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wedge {
    pub kind: WedgeKind,
    pub number: u32,
    pub niente: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Words {
    pub text: String,
    pub placement: Option<Placement>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PedalKind {
    Start,
    Stop,
    Change,
    Continue,
    Sostenuto,
    Resume,
    Discontinue,
}

impl PedalKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "start" => Some(PedalKind::Start),
            "stop" => Some(PedalKind::Stop),
            "change" => Some(PedalKind::Change),
            "continue" => Some(PedalKind::Continue),
            "sostenuto" => Some(PedalKind::Sostenuto),
            "resume" => Some(PedalKind::Resume),
            "discontinue" => Some(PedalKind::Discontinue),
            _ => None,
        }
    }
}

/// Decorations gathered from directions, flushed onto the next note or chord
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachments {
    pub dynamics: Vec<Dynamics>,
    pub wedges: Vec<Wedge>,
    pub words: Vec<Words>,
    pub pedals: Vec<PedalKind>,
}

impl Attachments {
    pub fn is_empty(&self) -> bool {
        self.dynamics.is_empty()
            && self.wedges.is_empty()
            && self.words.is_empty()
            && self.pedals.is_empty()
    }

    /// Move everything from `other` into `self`
    pub fn append(&mut self, other: &mut Attachments) {
        self.dynamics.append(&mut other.dynamics);
        self.wedges.append(&mut other.wedges);
        self.words.append(&mut other.words);
        self.pedals.append(&mut other.pedals);
    }
}

// ============================================================================
// LYRICS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LyricChunkKind {
    Single,
    Begin,
    Middle,
    End,
    Skip,
    Tied,
    Slur,
    SlurBeyondEnd,
    None,
}

impl LyricChunkKind {
    /// `<syllabic>` text
    pub fn from_syllabic(s: &str) -> Option<Self> {
        match s {
            "single" => Some(LyricChunkKind::Single),
            "begin" => Some(LyricChunkKind::Begin),
            "middle" => Some(LyricChunkKind::Middle),
            "end" => Some(LyricChunkKind::End),
            _ => None,
        }
    }

    pub fn carries_text(self) -> bool {
        matches!(
            self,
            LyricChunkKind::Single | LyricChunkKind::Begin | LyricChunkKind::Middle | LyricChunkKind::End
        )
    }
}

/// One syllable (or melisma placeholder) of one stanza, owned by its note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyricChunk {
    pub stanza: String,
    pub kind: LyricChunkKind,
    pub text: Option<String>,
    pub whole_notes: Rational,
    pub extend: bool,
    pub elision: bool,
    pub line: usize,
}

// ============================================================================
// NOTE, CHORD, TUPLET
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub content: NoteContent,
    pub kind: NoteKind,
    /// From `<duration>`, zero for grace notes
    pub sounding_whole_notes: Rational,
    /// From `<type>` and `<dot>`
    pub display: Option<DisplayDuration>,
    /// `(actual, normal)` from `<time-modification>`
    pub time_modification: Option<(u32, u32)>,
    pub tie: Option<TieKind>,
    pub staff_number: u32,
    pub voice_number: u32,
    pub measure_number: String,
    pub position_in_measure: Rational,
    pub grace_slash: bool,
    pub cue: bool,
    pub slurs: Vec<Slur>,
    pub articulations: Vec<Articulation>,
    pub ornaments: Vec<Ornament>,
    pub attachments: Attachments,
    pub lyrics: Vec<LyricChunk>,
    pub line: usize,
}

impl Note {
    pub fn is_rest(&self) -> bool {
        matches!(self.content, NoteContent::Rest { .. })
    }

    pub fn is_invisible_rest(&self) -> bool {
        matches!(self.content, NoteContent::Rest { invisible: true, .. })
    }

    pub fn pitch(&self) -> Option<&Pitch> {
        match &self.content {
            NoteContent::Pitched(pitch) => Some(pitch),
            _ => None,
        }
    }

    /// Invisible rest filling the gap created by a `<forward>`
    pub fn skip(whole_notes: Rational, staff_number: u32, voice_number: u32, measure_number: &str, line: usize) -> Self {
        Self {
            content: NoteContent::Rest {
                full_measure: false,
                invisible: true,
            },
            kind: NoteKind::Rest,
            sounding_whole_notes: whole_notes,
            display: None,
            time_modification: None,
            tie: None,
            staff_number,
            voice_number,
            measure_number: measure_number.to_string(),
            position_in_measure: Rational::from_integer(0),
            grace_slash: false,
            cue: false,
            slurs: Vec::new(),
            articulations: Vec::new(),
            ornaments: Vec::new(),
            attachments: Attachments::default(),
            lyrics: Vec::new(),
            line,
        }
    }
}

/// Two or more notes sharing one duration and measure position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chord {
    pub notes: Vec<Note>,
    pub sounding_whole_notes: Rational,
    pub display: Option<DisplayDuration>,
    pub tie: Option<TieKind>,
    pub measure_number: String,
    pub position_in_measure: Rational,
    pub articulations: Vec<Articulation>,
    pub attachments: Attachments,
}

impl Chord {
    /// Retroactive chord: `first` was appended as a standalone note before
    /// `second` told us it belonged to a chord
    pub fn from_pair(mut first: Note, second: Note) -> Self {
        first.kind = NoteKind::ChordMember;
        let mut chord = Chord {
            sounding_whole_notes: first.sounding_whole_notes,
            display: first.display,
            tie: first.tie,
            measure_number: first.measure_number.clone(),
            position_in_measure: first.position_in_measure,
            articulations: first.articulations.clone(),
            attachments: first.attachments.clone(),
            notes: vec![first],
        };
        chord.absorb(second);
        chord
    }

    /// Append a member, moving its decorations onto the chord
    pub fn absorb(&mut self, mut note: Note) {
        note.kind = NoteKind::ChordMember;
        note.position_in_measure = self.position_in_measure;
        note.measure_number.clone_from(&self.measure_number);
        for articulation in note.articulations.drain(..) {
            if !self.articulations.contains(&articulation) {
                self.articulations.push(articulation);
            }
        }
        self.attachments.append(&mut note.attachments);
        self.notes.push(note);
    }
}

/// Element of a tuplet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TupletMember {
    Note(Note),
    Chord(Chord),
    Tuplet(Tuplet),
}

impl TupletMember {
    pub fn sounding_whole_notes(&self) -> Rational {
        match self {
            TupletMember::Note(note) => note.sounding_whole_notes,
            TupletMember::Chord(chord) => chord.sounding_whole_notes,
            TupletMember::Tuplet(tuplet) => tuplet.sounding_whole_notes(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tuplet {
    pub number: u32,
    pub actual_notes: u32,
    pub normal_notes: u32,
    pub divisions_per_whole: u32,
    pub staff_number: u32,
    pub voice_number: u32,
    pub measure_number: String,
    pub position_in_measure: Rational,
    pub elements: Vec<TupletMember>,
    pub line: usize,
}

impl Tuplet {
    pub fn sounding_whole_notes(&self) -> Rational {
        self.elements
            .iter()
            .map(TupletMember::sounding_whole_notes)
            .fold(Rational::from_integer(0), |acc, d| acc + d)
    }

    /// Number of tuplets in this subtree, this one included
    pub fn tuplet_count(&self) -> usize {
        1 + self
            .elements
            .iter()
            .map(|e| match e {
                TupletMember::Tuplet(inner) => inner.tuplet_count(),
                _ => 0,
            })
            .sum::<usize>()
    }
}
