//! Retroactive chord assembly
//!
//! MusicXML flags chord membership on the second and later notes of a chord,
//! so the first note has already been appended as a standalone note when we
//! learn about the chord. The last element of the sink (the open tuplet of the
//! same voice, or the voice's current chunk) is replaced by a `Chord` built
//! from it and the new note; later members of the same run extend that chord.

use super::builder::{ScoreBuilder, VoiceKey};
use super::notes::NoteEvent;
use crate::errors::{IngestError, Result};
use crate::score::{Chord, Note, TupletMember, VoiceElement};

/// Why a chord member could not be folded into its sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FoldError {
    NoPrecedingNote,
    RestMember,
}

impl FoldError {
    fn message(self) -> &'static str {
        match self {
            FoldError::NoPrecedingNote => "chord member with no preceding note in its voice",
            FoldError::RestMember => "a rest cannot be a chord member",
        }
    }
}

fn fold_into_voice(elements: &mut Vec<VoiceElement>, note: Note, chord_open: bool) -> std::result::Result<(), FoldError> {
    match elements.pop() {
        Some(VoiceElement::Note(first)) if first.is_rest() => {
            elements.push(VoiceElement::Note(first));
            Err(FoldError::RestMember)
        }
        Some(VoiceElement::Note(first)) => {
            elements.push(VoiceElement::Chord(Chord::from_pair(first, note)));
            Ok(())
        }
        Some(VoiceElement::Chord(mut chord)) if chord_open => {
            chord.absorb(note);
            elements.push(VoiceElement::Chord(chord));
            Ok(())
        }
        Some(VoiceElement::Tuplet(mut tuplet)) => {
            let folded = fold_into_tuplet(&mut tuplet.elements, note, chord_open);
            elements.push(VoiceElement::Tuplet(tuplet));
            folded
        }
        popped => {
            elements.extend(popped);
            Err(FoldError::NoPrecedingNote)
        }
    }
}

fn fold_into_tuplet(elements: &mut Vec<TupletMember>, note: Note, chord_open: bool) -> std::result::Result<(), FoldError> {
    match elements.pop() {
        Some(TupletMember::Note(first)) if first.is_rest() => {
            elements.push(TupletMember::Note(first));
            Err(FoldError::RestMember)
        }
        Some(TupletMember::Note(first)) => {
            elements.push(TupletMember::Chord(Chord::from_pair(first, note)));
            Ok(())
        }
        Some(TupletMember::Chord(mut chord)) if chord_open => {
            chord.absorb(note);
            elements.push(TupletMember::Chord(chord));
            Ok(())
        }
        Some(TupletMember::Tuplet(mut inner)) => {
            let folded = fold_into_tuplet(&mut inner.elements, note, chord_open);
            elements.push(TupletMember::Tuplet(inner));
            folded
        }
        popped => {
            elements.extend(popped);
            Err(FoldError::NoPrecedingNote)
        }
    }
}

impl<'a> ScoreBuilder<'a> {
    /// A note carrying `<chord/>`
    pub(super) fn add_chord_member(&mut self, event: NoteEvent) -> Result<()> {
        let NoteEvent {
            mut note,
            tuplet_stops,
            ..
        } = event;
        let line = note.line;
        let key: VoiceKey = (note.staff_number, note.voice_number);

        if note.is_rest() {
            return Err(IngestError::internal(line, "a rest cannot be a chord member"));
        }

        self.flush_pending_onto(&mut note);
        self.track_chord_member_slurs(key, &note, line)?;

        if self.settings.trace_notes {
            log::debug!("line {}: chord member in voice {}/{}", line, key.0, key.1);
        }

        let chord_open = self.open_chord == Some(key);
        let folded = if self.top_tuplet_key() == Some(key) {
            match self.tuplet_stack.last_mut() {
                Some(top) => fold_into_tuplet(&mut top.elements, note, chord_open),
                None => Err(FoldError::NoPrecedingNote),
            }
        } else {
            let voice = self.voice_mut(key, line)?;
            fold_into_voice(&mut voice.current_chunk.elements, note, chord_open)
        };

        if let Err(reason) = folded {
            return Err(IngestError::internal(line, reason.message()));
        }

        self.open_chord = Some(key);
        self.unchecked_voices.insert(key);

        // Stop markers carried by a chord member apply once it is folded in
        for _ in 0..tuplet_stops {
            self.pop_tuplet(line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::{Rational, Tuplet};

    fn note(line: usize) -> Note {
        let mut n = Note::skip(Rational::new(1, 4), 1, 1, "1", line);
        n.content = crate::score::NoteContent::Unpitched {
            display_step: None,
            display_octave: None,
        };
        n
    }

    #[test]
    fn test_fold_replaces_last_note() {
        let mut elements = vec![VoiceElement::Note(note(1))];
        fold_into_voice(&mut elements, note(2), false).unwrap();
        fold_into_voice(&mut elements, note(3), true).unwrap();

        assert_eq!(elements.len(), 1);
        match &elements[0] {
            VoiceElement::Chord(chord) => assert_eq!(chord.notes.len(), 3),
            other => panic!("expected a chord, got {:?}", other),
        }
    }

    #[test]
    fn test_fold_descends_into_trailing_tuplet() {
        let tuplet = Tuplet {
            number: 1,
            actual_notes: 3,
            normal_notes: 2,
            divisions_per_whole: 4,
            staff_number: 1,
            voice_number: 1,
            measure_number: "1".to_string(),
            position_in_measure: Rational::from_integer(0),
            elements: vec![TupletMember::Note(note(1))],
            line: 1,
        };
        let mut elements = vec![VoiceElement::Tuplet(tuplet)];
        fold_into_voice(&mut elements, note(2), false).unwrap();

        match &elements[0] {
            VoiceElement::Tuplet(t) => assert!(matches!(t.elements[0], TupletMember::Chord(_))),
            other => panic!("expected a tuplet, got {:?}", other),
        }
    }

    #[test]
    fn test_fold_without_note_fails() {
        let mut elements = vec![VoiceElement::BarCheck {
            next_measure_number: None,
        }];
        assert!(fold_into_voice(&mut elements, note(2), false).is_err());
        assert_eq!(elements.len(), 1);

        // A closed chord is not extended
        let mut elements = vec![VoiceElement::Note(note(1))];
        fold_into_voice(&mut elements, note(2), false).unwrap();
        assert!(fold_into_voice(&mut elements, note(3), false).is_err());
    }

    #[test]
    fn test_fold_onto_rest_fails() {
        let rest = Note::skip(Rational::new(1, 4), 1, 1, "1", 1);
        let mut elements = vec![VoiceElement::Note(rest.clone())];
        assert_eq!(
            fold_into_voice(&mut elements, note(2), false),
            Err(FoldError::RestMember)
        );
        assert!(matches!(&elements[..], [VoiceElement::Note(n)] if n.is_rest()));

        let mut members = vec![TupletMember::Note(rest)];
        assert_eq!(
            fold_into_tuplet(&mut members, note(2), false),
            Err(FoldError::RestMember)
        );
        assert_eq!(members.len(), 1);
    }
}
