//! Basic musical value types of the Score IR
//!
//! Pitches, display durations, clefs, keys, time signatures and tempo marks.
//! Parsing from MusicXML strings lives here too: each `parse` returns `None`
//! for an unknown value so the caller can report it and pick a default.

use num_rational::Rational64;
use serde::{Deserialize, Serialize};

/// Durations and positions, in whole notes
pub type Rational = Rational64;

// ============================================================================
// PITCH
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DiatonicStep {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl DiatonicStep {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "C" => Some(DiatonicStep::C),
            "D" => Some(DiatonicStep::D),
            "E" => Some(DiatonicStep::E),
            "F" => Some(DiatonicStep::F),
            "G" => Some(DiatonicStep::G),
            "A" => Some(DiatonicStep::A),
            "B" => Some(DiatonicStep::B),
            _ => None,
        }
    }

    /// 0 for C up to 6 for B
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Alteration, quarter-tone resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alteration {
    DoubleFlat,
    ThreeQuartersFlat,
    Flat,
    QuarterFlat,
    Natural,
    QuarterSharp,
    Sharp,
    ThreeQuartersSharp,
    DoubleSharp,
}

impl Alteration {
    /// From a MusicXML `<alter>` value in semitones (-2.0 to 2.0, in 0.5 steps)
    pub fn from_semitones(semitones: f32) -> Option<Self> {
        let quarters = semitones * 2.0;
        if (quarters - quarters.round()).abs() > 0.01 {
            return None;
        }
        match quarters.round() as i32 {
            -4 => Some(Alteration::DoubleFlat),
            -3 => Some(Alteration::ThreeQuartersFlat),
            -2 => Some(Alteration::Flat),
            -1 => Some(Alteration::QuarterFlat),
            0 => Some(Alteration::Natural),
            1 => Some(Alteration::QuarterSharp),
            2 => Some(Alteration::Sharp),
            3 => Some(Alteration::ThreeQuartersSharp),
            4 => Some(Alteration::DoubleSharp),
            _ => None,
        }
    }

    pub fn quarter_tones(self) -> i16 {
        match self {
            Alteration::DoubleFlat => -4,
            Alteration::ThreeQuartersFlat => -3,
            Alteration::Flat => -2,
            Alteration::QuarterFlat => -1,
            Alteration::Natural => 0,
            Alteration::QuarterSharp => 1,
            Alteration::Sharp => 2,
            Alteration::ThreeQuartersSharp => 3,
            Alteration::DoubleSharp => 4,
        }
    }
}

/// A sounding pitch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pitch {
    pub step: DiatonicStep,
    pub alteration: Alteration,
    /// Octave number, 4 = middle C octave
    pub octave: i8,
    /// Quarter tones above C of the same octave (may be negative for C flat)
    pub quarter_tones: i16,
}

impl Pitch {
    /// Semitone number, MIDI convention (C4 = 60); `None` for quarter-tone pitches
    pub fn midi_semitone(&self) -> Option<i16> {
        if self.quarter_tones % 2 != 0 {
            return None;
        }
        Some((self.octave as i16 + 1) * 12 + self.quarter_tones / 2)
    }
}

// ============================================================================
// DISPLAY DURATION
// ============================================================================

/// Graphic note type (`<type>`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteType {
    Maxima,
    Long,
    Breve,
    Whole,
    Half,
    Quarter,
    Eighth,
    N16th,
    N32nd,
    N64th,
    N128th,
    N256th,
    N512th,
    N1024th,
}

impl NoteType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "maxima" => Some(NoteType::Maxima),
            "long" => Some(NoteType::Long),
            "breve" => Some(NoteType::Breve),
            "whole" => Some(NoteType::Whole),
            "half" => Some(NoteType::Half),
            "quarter" => Some(NoteType::Quarter),
            "eighth" => Some(NoteType::Eighth),
            "16th" => Some(NoteType::N16th),
            "32nd" => Some(NoteType::N32nd),
            "64th" => Some(NoteType::N64th),
            "128th" => Some(NoteType::N128th),
            "256th" => Some(NoteType::N256th),
            "512th" => Some(NoteType::N512th),
            "1024th" => Some(NoteType::N1024th),
            _ => None,
        }
    }

    pub fn whole_notes(self) -> Rational {
        match self {
            NoteType::Maxima => Rational::from_integer(8),
            NoteType::Long => Rational::from_integer(4),
            NoteType::Breve => Rational::from_integer(2),
            NoteType::Whole => Rational::from_integer(1),
            NoteType::Half => Rational::new(1, 2),
            NoteType::Quarter => Rational::new(1, 4),
            NoteType::Eighth => Rational::new(1, 8),
            NoteType::N16th => Rational::new(1, 16),
            NoteType::N32nd => Rational::new(1, 32),
            NoteType::N64th => Rational::new(1, 64),
            NoteType::N128th => Rational::new(1, 128),
            NoteType::N256th => Rational::new(1, 256),
            NoteType::N512th => Rational::new(1, 512),
            NoteType::N1024th => Rational::new(1, 1024),
        }
    }
}

/// Display duration: note type plus augmentation dots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayDuration {
    pub note_type: NoteType,
    pub dots: u8,
}

impl DisplayDuration {
    /// Dotted value: base * (2 - 1/2^dots)
    pub fn whole_notes(&self) -> Rational {
        let base = self.note_type.whole_notes();
        let dots = u32::from(self.dots.min(8));
        base * Rational::new((1i64 << (dots + 1)) - 1, 1i64 << dots)
    }
}

// ============================================================================
// CLEF, KEY, TIME
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClefKind {
    Treble,
    FrenchViolin,
    Soprano,
    MezzoSoprano,
    Alto,
    Tenor,
    Baritone,
    VarBaritone,
    Bass,
    SubBass,
    Percussion,
    Tab,
    None,
}

impl ClefKind {
    /// Clef from MusicXML sign and optional staff line; `None` for an unknown sign
    pub fn from_sign(sign: &str, line: Option<u8>) -> Option<Self> {
        let kind = match (sign, line) {
            ("G", None) | ("G", Some(2)) => ClefKind::Treble,
            ("G", Some(1)) => ClefKind::FrenchViolin,
            ("G", Some(_)) => ClefKind::Treble,
            ("C", Some(1)) => ClefKind::Soprano,
            ("C", Some(2)) => ClefKind::MezzoSoprano,
            ("C", None) | ("C", Some(3)) => ClefKind::Alto,
            ("C", Some(4)) => ClefKind::Tenor,
            ("C", Some(_)) => ClefKind::Baritone,
            ("F", Some(3)) => ClefKind::VarBaritone,
            ("F", None) | ("F", Some(4)) => ClefKind::Bass,
            ("F", Some(_)) => ClefKind::SubBass,
            ("percussion", _) => ClefKind::Percussion,
            ("TAB", _) => ClefKind::Tab,
            ("none", _) => ClefKind::None,
            _ => return None,
        };
        Some(kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clef {
    pub kind: ClefKind,
    /// `<clef-octave-change>`, e.g. -1 for a tenor G clef
    pub octave_change: i8,
    pub staff_number: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyMode {
    Major,
    Minor,
    Ionian,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    Aeolian,
    Locrian,
    None,
}

impl KeyMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "major" => Some(KeyMode::Major),
            "minor" => Some(KeyMode::Minor),
            "ionian" => Some(KeyMode::Ionian),
            "dorian" => Some(KeyMode::Dorian),
            "phrygian" => Some(KeyMode::Phrygian),
            "lydian" => Some(KeyMode::Lydian),
            "mixolydian" => Some(KeyMode::Mixolydian),
            "aeolian" => Some(KeyMode::Aeolian),
            "locrian" => Some(KeyMode::Locrian),
            "none" => Some(KeyMode::None),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key {
    /// Position on circle of fifths (flats negative)
    pub fifths: i8,
    pub mode: KeyMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeSymbol {
    Normal,
    Common,
    Cut,
    SingleNumber,
    Note,
    DottedNote,
}

impl TimeSymbol {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "normal" => Some(TimeSymbol::Normal),
            "common" => Some(TimeSymbol::Common),
            "cut" => Some(TimeSymbol::Cut),
            "single-number" => Some(TimeSymbol::SingleNumber),
            "note" => Some(TimeSymbol::Note),
            "dotted-note" => Some(TimeSymbol::DottedNote),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Time {
    /// `<beats>` text, which may be compound ("3+2")
    pub beats: String,
    pub beat_type: u32,
    pub symbol: TimeSymbol,
    pub senza_misura: bool,
}

impl Time {
    /// Measure length in whole notes; `None` for senza misura or unparseable beats
    pub fn whole_notes(&self) -> Option<Rational> {
        if self.senza_misura || self.beat_type == 0 {
            return None;
        }
        let mut total = 0i64;
        for part in self.beats.split('+') {
            total = total.checked_add(part.trim().parse::<i64>().ok()?)?;
        }
        Some(Rational::new(total, i64::from(self.beat_type)))
    }
}

// ============================================================================
// DIRECTIONS THAT ARE VOICE ELEMENTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tempo {
    pub beat_unit: Option<DisplayDuration>,
    /// `<per-minute>` text, e.g. "120" or "c. 60"
    pub per_minute: Option<String>,
    pub words: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Placement {
    Above,
    Below,
}

impl Placement {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "above" => Some(Placement::Above),
            "below" => Some(Placement::Below),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alteration_from_semitones() {
        assert_eq!(Alteration::from_semitones(0.0), Some(Alteration::Natural));
        assert_eq!(Alteration::from_semitones(-0.5), Some(Alteration::QuarterFlat));
        assert_eq!(Alteration::from_semitones(1.5), Some(Alteration::ThreeQuartersSharp));
        assert_eq!(Alteration::from_semitones(-2.0), Some(Alteration::DoubleFlat));
        assert_eq!(Alteration::from_semitones(0.3), None);
        assert_eq!(Alteration::from_semitones(3.0), None);
    }

    #[test]
    fn test_dotted_durations() {
        let dotted_quarter = DisplayDuration {
            note_type: NoteType::Quarter,
            dots: 1,
        };
        assert_eq!(dotted_quarter.whole_notes(), Rational::new(3, 8));

        let double_dotted_half = DisplayDuration {
            note_type: NoteType::Half,
            dots: 2,
        };
        assert_eq!(double_dotted_half.whole_notes(), Rational::new(7, 8));
    }

    #[test]
    fn test_clef_from_sign() {
        assert_eq!(ClefKind::from_sign("G", Some(2)), Some(ClefKind::Treble));
        assert_eq!(ClefKind::from_sign("F", None), Some(ClefKind::Bass));
        assert_eq!(ClefKind::from_sign("C", Some(4)), Some(ClefKind::Tenor));
        assert_eq!(ClefKind::from_sign("percussion", None), Some(ClefKind::Percussion));
        assert_eq!(ClefKind::from_sign("X", Some(2)), None);
    }

    #[test]
    fn test_time_whole_notes() {
        let time = Time {
            beats: "3+2".to_string(),
            beat_type: 8,
            symbol: TimeSymbol::Normal,
            senza_misura: false,
        };
        assert_eq!(time.whole_notes(), Some(Rational::new(5, 8)));

        let free = Time {
            senza_misura: true,
            ..time
        };
        assert_eq!(free.whole_notes(), None);
    }
}
