//! Barlines, repeats and repeat endings
//!
//! A barline's category is derived from its (location, repeat direction,
//! ending type) tuple by [`BarlineCategory::classify`]; it is never read
//! from the input.

use super::structure::VoiceElement;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BarlineLocation {
    Left,
    Middle,
    Right,
}

impl BarlineLocation {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "left" => Some(BarlineLocation::Left),
            "middle" => Some(BarlineLocation::Middle),
            "right" => Some(BarlineLocation::Right),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BarlineStyle {
    Regular,
    Dotted,
    Dashed,
    Heavy,
    LightLight,
    LightHeavy,
    HeavyLight,
    HeavyHeavy,
    Tick,
    Short,
    None,
}

impl BarlineStyle {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "regular" => Some(BarlineStyle::Regular),
            "dotted" => Some(BarlineStyle::Dotted),
            "dashed" => Some(BarlineStyle::Dashed),
            "heavy" => Some(BarlineStyle::Heavy),
            "light-light" => Some(BarlineStyle::LightLight),
            "light-heavy" => Some(BarlineStyle::LightHeavy),
            "heavy-light" => Some(BarlineStyle::HeavyLight),
            "heavy-heavy" => Some(BarlineStyle::HeavyHeavy),
            "tick" => Some(BarlineStyle::Tick),
            "short" => Some(BarlineStyle::Short),
            "none" => Some(BarlineStyle::None),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndingType {
    Start,
    Stop,
    Discontinue,
}

impl EndingType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "start" => Some(EndingType::Start),
            "stop" => Some(EndingType::Stop),
            "discontinue" => Some(EndingType::Discontinue),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepeatDirection {
    Forward,
    Backward,
}

impl RepeatDirection {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "forward" => Some(RepeatDirection::Forward),
            "backward" => Some(RepeatDirection::Backward),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepeatWinged {
    None,
    Straight,
    Curved,
    DoubleStraight,
    DoubleCurved,
}

impl RepeatWinged {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(RepeatWinged::None),
            "straight" => Some(RepeatWinged::Straight),
            "curved" => Some(RepeatWinged::Curved),
            "double-straight" => Some(RepeatWinged::DoubleStraight),
            "double-curved" => Some(RepeatWinged::DoubleCurved),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BarlineCategory {
    Standalone,
    RepeatStart,
    RepeatEnd,
    EndingStart,
    HookedEndingEnd,
    HooklessEndingEnd,
}

impl BarlineCategory {
    /// Decide the category of a barline.
    ///
    /// Returns `None` when the combination carries repeat or ending
    /// information matching no known role and no explicit bar style
    /// either; the caller treats that as fatal.
    pub fn classify(
        location: BarlineLocation,
        repeat: Option<RepeatDirection>,
        ending: Option<EndingType>,
        has_style: bool,
    ) -> Option<Self> {
        use BarlineLocation::*;
        use EndingType::*;
        use RepeatDirection::*;

        match (location, repeat, ending) {
            (Left, Some(Forward), _) => Some(BarlineCategory::RepeatStart),
            (Right, _, Some(Stop)) => Some(BarlineCategory::HookedEndingEnd),
            (Right, Some(Backward), _) if ending != Some(Discontinue) => Some(BarlineCategory::RepeatEnd),
            (Left, _, Some(Start)) => Some(BarlineCategory::EndingStart),
            (Right, _, Some(Discontinue)) => Some(BarlineCategory::HooklessEndingEnd),
            (_, None, None) => Some(BarlineCategory::Standalone),
            _ if has_style => Some(BarlineCategory::Standalone),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Barline {
    pub location: BarlineLocation,
    pub style: Option<BarlineStyle>,
    pub ending: Option<EndingType>,
    /// Parsed from the ending `number` attribute, e.g. "1, 2"
    pub ending_numbers: Vec<u32>,
    pub ending_text: Option<String>,
    pub repeat: Option<RepeatDirection>,
    pub repeat_times: Option<u32>,
    pub winged: Option<RepeatWinged>,
    pub segno: bool,
    pub coda: bool,
    pub fermata: bool,
    pub category: BarlineCategory,
    /// Synthesized repeat start, not present in the input
    pub implicit: bool,
    pub measure_number: String,
    pub line: usize,
}

impl Barline {
    /// The repeat start inserted when a repeat end had no explicit start
    pub fn implicit_repeat_start(measure_number: &str) -> Self {
        Self {
            location: BarlineLocation::Left,
            style: Some(BarlineStyle::HeavyLight),
            ending: None,
            ending_numbers: Vec::new(),
            ending_text: None,
            repeat: Some(RepeatDirection::Forward),
            repeat_times: None,
            winged: None,
            segno: false,
            coda: false,
            fermata: false,
            category: BarlineCategory::RepeatStart,
            implicit: true,
            measure_number: measure_number.to_string(),
            line: 0,
        }
    }
}

/// Contiguous run of a voice's elements between repeat-structure boundaries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Voicechunk {
    pub elements: Vec<VoiceElement>,
}

impl Voicechunk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_with(element: VoiceElement) -> Self {
        Self {
            elements: vec![element],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn first_barline(&self) -> Option<&Barline> {
        match self.elements.first() {
            Some(VoiceElement::Barline(barline)) => Some(barline),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepeatEndingKind {
    Hooked,
    Hookless,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepeatEnding {
    pub numbers: Vec<u32>,
    pub kind: RepeatEndingKind,
    pub chunk: Voicechunk,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Repeat {
    /// The repeated body, preceding the endings
    pub common_part: Voicechunk,
    pub endings: Vec<RepeatEnding>,
    /// An explicit forward repeat opened this repeat
    pub explicit_start: bool,
    pub times: Option<u32>,
}
