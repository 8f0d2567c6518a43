//! Read-only lookup tables handed to the ingestion engine

use crate::score::{Alteration, DiatonicStep, Pitch};

/// Immutable resources shared by any number of ingestions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestResources {
    /// Quarter tones above C for each diatonic step, C through B
    step_quarter_tones: [i16; 7],
}

impl Default for IngestResources {
    fn default() -> Self {
        Self {
            step_quarter_tones: [0, 4, 8, 10, 14, 18, 22],
        }
    }
}

impl IngestResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step_quarter_tones(&self, step: DiatonicStep) -> i16 {
        self.step_quarter_tones[step.index()]
    }

    pub fn pitch(&self, step: DiatonicStep, alteration: Alteration, octave: i8) -> Pitch {
        Pitch {
            step,
            alteration,
            octave,
            quarter_tones: self.step_quarter_tones(step) + alteration.quarter_tones(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quarter_tone_pitch() {
        let resources = IngestResources::new();
        let b_flat = resources.pitch(DiatonicStep::B, Alteration::Flat, 3);
        assert_eq!(b_flat.quarter_tones, 20);
        assert_eq!(b_flat.midi_semitone(), Some(58));

        let c_flat = resources.pitch(DiatonicStep::C, Alteration::Flat, 4);
        assert_eq!(c_flat.quarter_tones, -2);
        assert_eq!(c_flat.midi_semitone(), Some(59));
    }
}
