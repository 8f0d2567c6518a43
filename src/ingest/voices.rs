//! Structural resolution and the time cursor
//!
//! Staves and voices are created the first time the traversal names them.
//! Each voice owns a position-in-measure cursor, in whole notes. Next to it
//! the builder keeps the document-order position of the measure (what
//! `<backup>` and `<forward>` move in MusicXML terms): a voice that enters
//! the measure behind that position is padded with an invisible rest first.

use super::builder::{ScoreBuilder, VoiceKey};
use crate::errors::{IngestError, Result};
use crate::score::{Note, Part, Rational, Staff, Voice, VoiceElement};
use crate::tree::Element;
use num_traits::{CheckedAdd, CheckedSub};

fn moved_forward(position: Rational, duration: Rational, line: usize) -> Result<Rational> {
    position.checked_add(&duration).ok_or_else(|| {
        IngestError::assertion(line, format!("position {} + {} overflows", position, duration))
    })
}

fn moved_back(position: Rational, duration: Rational, line: usize) -> Result<Rational> {
    position.checked_sub(&duration).ok_or_else(|| {
        IngestError::assertion(line, format!("position {} - {} overflows", position, duration))
    })
}

/// Find or create the voice, seeding a new one with the part's current
/// clef, key and time
fn resolve_in_part(part: &mut Part, (staff_number, voice_number): VoiceKey) -> &mut Voice {
    let divisions = part.divisions_per_whole;
    let clef = part.clefs.get(&staff_number).copied();
    let key = part.key;
    let time = part.time.clone();
    let part_id = &part.id;

    let staff = part
        .staves
        .entry(staff_number)
        .or_insert_with(|| Staff::new(staff_number));

    staff.voices.entry(voice_number).or_insert_with(|| {
        log::debug!("part '{}': new voice {} in staff {}", part_id, voice_number, staff_number);
        let mut voice = Voice::new(voice_number, staff_number, divisions);
        if let Some(clef) = clef {
            voice.append(VoiceElement::Clef(clef));
        }
        if let Some(key) = key {
            voice.append(VoiceElement::Key(key));
        }
        if let Some(time) = time {
            voice.append(VoiceElement::Time(time));
        }
        voice
    })
}

impl<'a> ScoreBuilder<'a> {
    pub(super) fn voice_mut(&mut self, key: VoiceKey, line: usize) -> Result<&mut Voice> {
        let part = self.part_mut(line)?;
        Ok(resolve_in_part(part, key))
    }

    pub(super) fn current_key(&self) -> VoiceKey {
        (self.current_staff, self.current_voice)
    }

    /// Staff and voice numbers of a note, forward or direction, validated
    pub(super) fn read_voice_key(&self, element: &Element, default: VoiceKey) -> Result<VoiceKey> {
        let staff = match element.child_parse::<i64>("staff")? {
            None => default.0,
            Some(n) if n <= 0 => {
                return Err(IngestError::assertion(
                    element.line,
                    format!("staff number {} is not positive", n),
                ))
            }
            Some(n) => u32::try_from(n).map_err(|_| {
                IngestError::assertion(element.line, format!("staff number {} is out of range", n))
            })?,
        };

        let max = i64::from(self.settings.max_voice_number);
        let voice = match element.child_parse::<i64>("voice")? {
            None if staff == default.0 => default.1,
            None => self.first_voice_of_staff(staff).unwrap_or(1),
            Some(n) if n < 1 || n > max => {
                return Err(IngestError::assertion(
                    element.line,
                    format!("voice number {} is outside 1..={}", n, max),
                ))
            }
            Some(n) => u32::try_from(n).map_err(|_| {
                IngestError::assertion(element.line, format!("voice number {} is out of range", n))
            })?,
        };

        Ok((staff, voice))
    }

    fn first_voice_of_staff(&self, staff: u32) -> Option<u32> {
        let part = self.parts.get(self.current_part?)?;
        part.staves.get(&staff)?.voices.keys().next().copied()
    }

    /// Whole notes for a `<duration>` value in the current part's divisions
    pub(super) fn whole_notes(&self, divisions: i64, line: usize) -> Result<Rational> {
        let index = self
            .current_part
            .ok_or_else(|| IngestError::internal(line, "duration outside of any <part>"))?;
        let per_whole = self.parts[index].divisions_per_whole;
        Ok(Rational::new(divisions, i64::from(per_whole)))
    }

    /// Move a voice's cursor forward after it consumed `duration`
    pub(super) fn advance(&mut self, key: VoiceKey, duration: Rational, line: usize) -> Result<()> {
        let voice = self.voice_mut(key, line)?;
        let position = moved_forward(voice.position_in_measure, duration, line)?;
        voice.position_in_measure = position;

        self.measure_position = position;
        let extent = self
            .measure_extents
            .entry(key)
            .or_insert_with(|| Rational::from_integer(0));
        if position > *extent {
            *extent = position;
        }
        self.unchecked_voices.insert(key);
        Ok(())
    }

    /// Pad a voice that is behind the measure position with an invisible rest
    pub(super) fn catch_up(&mut self, key: VoiceKey, line: usize) -> Result<()> {
        let target = self.measure_position;
        let measure_number = self.measure_number.clone();
        let voice = self.voice_mut(key, line)?;
        let gap = moved_back(target, voice.position_in_measure, line)?;
        if gap <= Rational::from_integer(0) {
            return Ok(());
        }

        let mut skip = Note::skip(gap, key.0, key.1, &measure_number, line);
        skip.position_in_measure = voice.position_in_measure;
        voice.append(VoiceElement::Note(skip));
        log::debug!(
            "line {}: voice {}/{} padded by {} whole notes",
            line,
            key.0,
            key.1,
            gap
        );
        self.advance(key, gap, line)
    }

    /// `<backup>`: move the current voice's cursor back
    pub(super) fn handle_backup(&mut self, element: &Element) -> Result<()> {
        self.drain_tuplets(element.line)?;
        self.open_chord = None;

        let divisions: i64 = element.required_child_parse("duration")?;
        let duration = self.whole_notes(divisions, element.line)?;
        let zero = Rational::from_integer(0);

        self.measure_position = moved_back(self.measure_position, duration, element.line)?;

        let key = self.current_key();
        let index = self.current_part;
        let voice = index
            .and_then(|i| self.parts.get_mut(i))
            .and_then(|part| part.staves.get_mut(&key.0))
            .and_then(|staff| staff.voices.get_mut(&key.1));

        let position = match voice {
            Some(voice) => {
                voice.position_in_measure = moved_back(voice.position_in_measure, duration, element.line)?;
                voice.position_in_measure
            }
            None => self.measure_position,
        };

        if position < zero {
            self.diagnostics.warning(
                element.line,
                "backup_before_measure_start",
                format!(
                    "backup of {} whole notes in measure {} goes {} before the measure start",
                    duration, self.measure_number, -position
                ),
            );
        }
        Ok(())
    }

    /// `<forward>`: invisible rest in the forward's voice, which stays the
    /// current context until the element is left
    pub(super) fn enter_forward(&mut self, element: &Element) -> Result<()> {
        self.drain_tuplets(element.line)?;
        self.open_chord = None;

        let divisions: i64 = element.required_child_parse("duration")?;
        let duration = self.whole_notes(divisions, element.line)?;
        let key = self.read_voice_key(element, self.current_key())?;

        self.forward_saved = Some(self.current_key());
        self.current_staff = key.0;
        self.current_voice = key.1;

        self.catch_up(key, element.line)?;
        let measure_number = self.measure_number.clone();
        let voice = self.voice_mut(key, element.line)?;
        let mut skip = Note::skip(duration, key.0, key.1, &measure_number, element.line);
        skip.position_in_measure = voice.position_in_measure;
        voice.append(VoiceElement::Note(skip));

        self.advance(key, duration, element.line)
    }

    pub(super) fn leave_forward(&mut self) {
        if let Some((staff, voice)) = self.forward_saved.take() {
            self.current_staff = staff;
            self.current_voice = voice;
        }
    }

    // ------------------------------------------------------------------
    // Part and measure boundaries
    // ------------------------------------------------------------------

    pub(super) fn enter_part(&mut self, element: &Element) -> Result<()> {
        let id = element.attr("id").unwrap_or_default();
        let index = *self.part_index.get(id).ok_or_else(|| {
            IngestError::internal(
                element.line,
                format!("part '{}' is not declared in the part list", id),
            )
        })?;

        log::debug!("line {}: entering part '{}'", element.line, id);

        self.current_part = Some(index);
        self.current_staff = 1;
        self.current_voice = 1;
        self.forward_saved = None;
        self.barline_markers.clear();
        self.tuplet_stack.clear();
        self.open_chord = None;
        self.pending = Default::default();
        self.measure_number.clear();
        self.measure_position = Rational::from_integer(0);
        self.measure_extents.clear();
        self.unchecked_voices.clear();
        Ok(())
    }

    pub(super) fn leave_part(&mut self, element: &Element) -> Result<()> {
        self.drain_tuplets(element.line)?;
        self.open_chord = None;
        self.clear_pending(element.line);
        self.emit_bar_checks(None, element.line)?;
        self.finalize_open_repeats(element.line)?;

        let part = self.part_mut(element.line)?;
        for voice in part.voices_mut() {
            voice.flush_current_chunk();
        }

        self.current_part = None;
        Ok(())
    }

    pub(super) fn enter_measure(&mut self, element: &Element) -> Result<()> {
        let number = element.attr("number").unwrap_or_default().to_string();
        self.emit_bar_checks(Some(number.clone()), element.line)?;

        if self.settings.trace_notes {
            log::debug!("line {}: measure {}", element.line, number);
        }

        let part = self.part_mut(element.line)?;
        part.measure_number.clone_from(&number);
        for voice in part.voices_mut() {
            voice.position_in_measure = Rational::from_integer(0);
        }

        self.measure_number = number;
        self.measure_position = Rational::from_integer(0);
        self.measure_extents.clear();
        Ok(())
    }

    pub(super) fn leave_measure(&mut self, element: &Element) -> Result<()> {
        self.drain_tuplets(element.line)?;
        self.open_chord = None;
        self.clear_pending(element.line);

        let zero = Rational::from_integer(0);
        let longest = self.measure_extents.values().copied().max().unwrap_or(zero);
        let short: Vec<(VoiceKey, Rational)> = self
            .unchecked_voices
            .iter()
            .map(|key| (*key, self.measure_extents.get(key).copied().unwrap_or(zero)))
            .filter(|(_, extent)| *extent < longest)
            .collect();

        for ((staff, voice), extent) in short {
            self.diagnostics.warning(
                element.line,
                "incomplete_voice_measure",
                format!(
                    "measure {}: voice {} of staff {} lasts {} whole notes, the longest voice lasts {}",
                    self.measure_number, voice, staff, extent, longest
                ),
            );
        }
        Ok(())
    }

    /// Bar check for every voice that received notes in the previous measure
    fn emit_bar_checks(&mut self, next_measure_number: Option<String>, line: usize) -> Result<()> {
        let keys: Vec<VoiceKey> = std::mem::take(&mut self.unchecked_voices).into_iter().collect();
        for key in keys {
            let voice = self.voice_mut(key, line)?;
            voice.append(VoiceElement::BarCheck {
                next_measure_number: next_measure_number.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{IngestResources, IngestSettings};

    fn builder_in_part(resources: &IngestResources) -> ScoreBuilder<'_> {
        let mut builder = ScoreBuilder::new(IngestSettings::default(), resources);
        builder.declare_part(&Element::new("score-part").with_attr("id", "P1")).unwrap();
        builder.enter_part(&Element::new("part").with_attr("id", "P1")).unwrap();
        builder
    }

    #[test]
    fn test_voice_key_defaults() {
        let resources = IngestResources::new();
        let mut builder = builder_in_part(&resources);
        let direction = Element::new("direction");
        assert_eq!(builder.read_voice_key(&direction, (1, 3)).unwrap(), (1, 3));

        // Another staff without a voice number takes that staff's first voice
        builder.voice_mut((2, 5), 0).unwrap();
        let on_staff_two = Element::new("direction").with_child(Element::new("staff").with_text("2"));
        assert_eq!(builder.read_voice_key(&on_staff_two, (1, 3)).unwrap(), (2, 5));

        let on_staff_three = Element::new("direction").with_child(Element::new("staff").with_text("3"));
        assert_eq!(builder.read_voice_key(&on_staff_three, (1, 3)).unwrap(), (3, 1));
    }

    #[test]
    fn test_skip_fills_the_gap() {
        let resources = IngestResources::new();
        let mut builder = builder_in_part(&resources);
        builder.measure_position = Rational::new(3, 8);

        builder.catch_up((1, 2), 4).unwrap();
        let voice = builder.voice_mut((1, 2), 4).unwrap();
        assert_eq!(voice.position_in_measure, Rational::new(3, 8));
        match voice.current_chunk.elements.as_slice() {
            [VoiceElement::Note(skip)] => {
                assert!(skip.is_invisible_rest());
                assert_eq!(skip.sounding_whole_notes, Rational::new(3, 8));
            }
            other => panic!("expected one skip, got {:?}", other),
        }
        assert!(builder.unchecked_voices.contains(&(1, 2)));
    }
}
