//! `<note>` handling
//!
//! The whole `<note>` subtree is read first into a [`NoteEvent`]: staff and
//! voice numbers come late in the element, after the pitch and duration
//! they qualify. The event then goes through the chord, tuplet, attachment
//! and lyric stages before landing in its voice.

use super::builder::{ScoreBuilder, VoiceKey};
use super::lyrics::LyricInput;
use super::tuplets::TupletStart;
use crate::errors::Result;
use crate::score::{
    Alteration, Articulation, Attachments, DiatonicStep, DisplayDuration, Note, NoteContent, NoteKind,
    NoteType, Ornament, Rational, Slur, SlurKind, TieKind, TupletMember, VoiceElement,
};
use crate::tree::Element;

/// A note as read from the document, before assembly
#[derive(Debug, Clone)]
pub struct NoteEvent {
    pub note: Note,
    pub is_chord_member: bool,
    pub is_grace: bool,
    pub tuplet_starts: Vec<TupletStart>,
    pub tuplet_stops: usize,
    pub lyrics: Vec<LyricInput>,
}

impl NoteEvent {
    /// Time-modified or carrying tuplet markers
    pub fn belongs_to_tuplet(&self) -> bool {
        self.note.time_modification.is_some() || !self.tuplet_starts.is_empty() || self.tuplet_stops > 0
    }
}

impl<'a> ScoreBuilder<'a> {
    pub(super) fn handle_note(&mut self, element: &Element) -> Result<()> {
        let event = self.read_note(element)?;
        let key: VoiceKey = (event.note.staff_number, event.note.voice_number);
        self.current_staff = key.0;
        self.current_voice = key.1;

        if self.settings.trace_notes {
            log::debug!(
                "line {}: note {:?} in voice {}/{}, {} whole notes{}",
                element.line,
                event.note.content,
                key.0,
                key.1,
                event.note.sounding_whole_notes,
                if event.is_chord_member { ", chord member" } else { "" }
            );
        }

        if event.is_chord_member {
            return self.add_chord_member(event);
        }
        self.open_chord = None;

        if !self.tuplet_stack.is_empty()
            && (!event.belongs_to_tuplet() || self.top_tuplet_key() != Some(key))
        {
            self.drain_tuplets(element.line)?;
        }

        self.add_note(event, key)
    }

    fn add_note(&mut self, event: NoteEvent, key: VoiceKey) -> Result<()> {
        let NoteEvent {
            mut note,
            is_grace,
            tuplet_starts,
            tuplet_stops,
            lyrics,
            ..
        } = event;
        let line = note.line;

        self.catch_up(key, line)?;
        let position = self.voice_mut(key, line)?.position_in_measure;
        note.position_in_measure = position;
        note.measure_number.clone_from(&self.measure_number);

        for start in tuplet_starts {
            self.push_tuplet(start, key, position, line)?;
        }

        note.kind = if note.is_rest() {
            NoteKind::Rest
        } else if is_grace {
            NoteKind::Grace
        } else if !self.tuplet_stack.is_empty() {
            NoteKind::TupletMember
        } else {
            NoteKind::Standalone
        };

        if !is_grace {
            self.flush_pending_onto(&mut note);
            self.align_lyrics(key, &mut note, &lyrics)?;
        }

        let duration = note.sounding_whole_notes;
        match self.tuplet_stack.last_mut() {
            Some(top) => top.elements.push(TupletMember::Note(note)),
            None => self.voice_mut(key, line)?.append(VoiceElement::Note(note)),
        }

        if is_grace {
            self.unchecked_voices.insert(key);
        } else {
            self.advance(key, duration, line)?;
        }

        for _ in 0..tuplet_stops {
            self.pop_tuplet(line)?;
        }
        Ok(())
    }

    /// Read a `<note>` element into an event
    pub(super) fn read_note(&mut self, element: &Element) -> Result<NoteEvent> {
        let line = element.line;
        let key = self.read_voice_key(element, (1, 1))?;
        let is_grace = element.has_child("grace");
        let is_chord_member = element.has_child("chord");

        let content = self.read_note_content(element)?;

        let display = self.read_display_duration(element);

        let time_modification = match element.child("time-modification") {
            Some(tm) => {
                let actual: u32 = tm.required_child_parse("actual-notes")?;
                let normal: u32 = tm.required_child_parse("normal-notes")?;
                Some((actual, normal))
            }
            None => None,
        };

        let sounding_whole_notes = if is_grace {
            Rational::from_integer(0)
        } else {
            match element.child_parse::<i64>("duration")? {
                Some(divisions) => self.whole_notes(divisions, line)?,
                None => {
                    let fallback = display
                        .map(|d| {
                            let base = d.whole_notes();
                            match time_modification {
                                Some((actual, normal)) if actual > 0 => {
                                    base * Rational::new(i64::from(normal), i64::from(actual))
                                }
                                _ => base,
                            }
                        })
                        .unwrap_or_else(|| Rational::from_integer(0));
                    self.diagnostics.warning(
                        line,
                        "missing_duration",
                        format!("note without <duration>, using {} whole notes", fallback),
                    );
                    fallback
                }
            }
        };

        let mut note = Note {
            content,
            kind: NoteKind::Standalone,
            sounding_whole_notes,
            display,
            time_modification,
            tie: None,
            staff_number: key.0,
            voice_number: key.1,
            measure_number: String::new(),
            position_in_measure: Rational::from_integer(0),
            grace_slash: element
                .child("grace")
                .and_then(|g| g.attr("slash"))
                .map_or(false, |s| s == "yes"),
            cue: element.has_child("cue"),
            slurs: Vec::new(),
            articulations: Vec::new(),
            ornaments: Vec::new(),
            attachments: Attachments::default(),
            lyrics: Vec::new(),
            line,
        };

        let mut tie_types: Vec<&str> = element.children_named("tie").filter_map(|t| t.attr("type")).collect();
        let mut tuplet_starts = Vec::new();
        let mut tuplet_stops = 0;

        for notations in element.children_named("notations") {
            for child in &notations.children {
                match child.name.as_str() {
                    "tied" => {
                        if let Some(kind) = child.attr("type") {
                            tie_types.push(kind);
                        }
                    }
                    "slur" => {
                        if let Some(slur) = self.read_slur(child)? {
                            note.slurs.push(slur);
                        }
                    }
                    "tuplet" => match child.attr("type") {
                        Some("start") => tuplet_starts.push(read_tuplet_start(child, time_modification)?),
                        Some("stop") => tuplet_stops += 1,
                        other => self.diagnostics.error(
                            child.line,
                            "unknown_tuplet_type",
                            format!("unknown tuplet type '{}', ignoring it", other.unwrap_or("")),
                        ),
                    },
                    "articulations" => {
                        for articulation in &child.children {
                            match Articulation::parse(&articulation.name) {
                                Some(a) => note.articulations.push(a),
                                None => self.diagnostics.error(
                                    articulation.line,
                                    "unknown_articulation",
                                    format!("unknown articulation <{}>, ignoring it", articulation.name),
                                ),
                            }
                        }
                    }
                    "ornaments" => {
                        for ornament in &child.children {
                            if ornament.name == "tremolo" {
                                let marks = ornament.parse_text::<u8>()?.unwrap_or(3);
                                note.ornaments.push(Ornament::Tremolo(marks));
                            } else if let Some(o) = Ornament::parse(&ornament.name) {
                                note.ornaments.push(o);
                            } else {
                                log::debug!("line {}: ornament <{}> not kept", ornament.line, ornament.name);
                            }
                        }
                    }
                    "fermata" => note.articulations.push(Articulation::Fermata),
                    "arpeggiate" => note.articulations.push(Articulation::Arpeggiate),
                    _ => log::debug!("line {}: notation <{}> not kept", child.line, child.name),
                }
            }
        }

        note.tie = self.combine_ties(&tie_types, line);

        let lyrics = element
            .children_named("lyric")
            .map(LyricInput::from_element)
            .collect();

        Ok(NoteEvent {
            note,
            is_chord_member,
            is_grace,
            tuplet_starts,
            tuplet_stops,
            lyrics,
        })
    }

    fn read_note_content(&mut self, element: &Element) -> Result<NoteContent> {
        if let Some(rest) = element.child("rest") {
            return Ok(NoteContent::Rest {
                full_measure: rest.attr("measure") == Some("yes"),
                invisible: false,
            });
        }

        if let Some(unpitched) = element.child("unpitched") {
            return Ok(NoteContent::Unpitched {
                display_step: unpitched.child_text("display-step").map(str::to_string),
                display_octave: unpitched.child_parse::<i8>("display-octave")?,
            });
        }

        let Some(pitch) = element.child("pitch") else {
            return Err(crate::errors::ParseError::MissingRequiredElement {
                line: element.line,
                element: "pitch".to_string(),
            }
            .into());
        };

        let step_text = pitch.child_text("step").unwrap_or_default();
        let step = DiatonicStep::parse(step_text).unwrap_or_else(|| {
            self.diagnostics.error(
                pitch.line,
                "unknown_step",
                format!("unknown diatonic step '{}', using C", step_text),
            );
            DiatonicStep::C
        });

        let alter = pitch.child_parse::<f32>("alter")?.unwrap_or(0.0);
        let alteration = Alteration::from_semitones(alter).unwrap_or_else(|| {
            self.diagnostics.error(
                pitch.line,
                "unknown_alteration",
                format!("alteration {} is not a quarter-tone step, using natural", alter),
            );
            Alteration::Natural
        });

        let octave: i8 = pitch.required_child_parse("octave")?;
        Ok(NoteContent::Pitched(self.resources.pitch(step, alteration, octave)))
    }

    fn read_display_duration(&mut self, element: &Element) -> Option<DisplayDuration> {
        let type_element = element.child("type")?;
        let text = type_element.text().unwrap_or_default();
        let Some(note_type) = NoteType::parse(text) else {
            self.diagnostics.error(
                type_element.line,
                "unknown_note_type",
                format!("unknown note type '{}', ignoring it", text),
            );
            return None;
        };
        let dots = element.children_named("dot").count().min(u8::MAX as usize) as u8;
        Some(DisplayDuration { note_type, dots })
    }

    fn read_slur(&mut self, element: &Element) -> Result<Option<Slur>> {
        let kind = match element.attr("type") {
            Some("start") => SlurKind::Start,
            Some("continue") => SlurKind::Continue,
            Some("stop") => SlurKind::Stop,
            other => {
                self.diagnostics.error(
                    element.line,
                    "unknown_slur_type",
                    format!("unknown slur type '{}', ignoring it", other.unwrap_or("")),
                );
                return Ok(None);
            }
        };
        let number = element.attr_parse::<u32>("number")?.unwrap_or(1);
        Ok(Some(Slur { kind, number }))
    }

    /// Fold `<tie>` and `<tied>` types into one tie kind
    fn combine_ties(&mut self, types: &[&str], line: usize) -> Option<TieKind> {
        let mut start = false;
        let mut stop = false;
        let mut cont = false;
        for kind in types {
            match *kind {
                "start" => start = true,
                "stop" => stop = true,
                "continue" => cont = true,
                "let-ring" => start = true,
                other => self.diagnostics.error(
                    line,
                    "unknown_tie_type",
                    format!("unknown tie type '{}', ignoring it", other),
                ),
            }
        }
        match (start, stop, cont) {
            (true, true, _) => Some(TieKind::StopStart),
            (_, _, true) => Some(TieKind::Continue),
            (true, false, false) => Some(TieKind::Start),
            (false, true, false) => Some(TieKind::Stop),
            (false, false, false) => None,
        }
    }
}

/// Ratio from `<tuplet-actual>`/`<tuplet-normal>` when given, else from the
/// note's time modification
fn read_tuplet_start(element: &Element, time_modification: Option<(u32, u32)>) -> Result<TupletStart> {
    let number = element.attr_parse::<u32>("number")?.unwrap_or(1);
    let explicit = |name: &str| -> Result<Option<u32>> {
        match element.child(name) {
            Some(part) => Ok(part.child_parse::<u32>("tuplet-number")?),
            None => Ok(None),
        }
    };
    let (tm_actual, tm_normal) = time_modification.unwrap_or((1, 1));
    Ok(TupletStart {
        number,
        actual_notes: explicit("tuplet-actual")?.unwrap_or(tm_actual),
        normal_notes: explicit("tuplet-normal")?.unwrap_or(tm_normal),
    })
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

    fn pitched(step: &str, alter: Option<&str>, octave: &str) -> Element {
        let mut pitch = Element::new("pitch").with_child(Element::new("step").with_text(step));
        if let Some(alter) = alter {
            pitch = pitch.with_child(Element::new("alter").with_text(alter));
        }
        pitch = pitch.with_child(Element::new("octave").with_text(octave));
        Element::new("note")
            .with_child(pitch)
            .with_child(Element::new("duration").with_text("2"))
            .with_child(Element::new("type").with_text("eighth"))
            .with_line(7)
    }

    #[test]
    fn test_read_pitched_note() {
        let resources = IngestResources::new();
        let mut builder = builder_in_part(&resources);
        let element = pitched("F", Some("1"), "5")
            .with_child(Element::new("tie").with_attr("type", "stop"))
            .with_child(Element::new("tie").with_attr("type", "start"))
            .with_child(Element::new("voice").with_text("2"));

        let event = builder.read_note(&element).unwrap();
        let pitch = event.note.pitch().copied().unwrap();
        assert_eq!(pitch.quarter_tones, 12);
        assert_eq!(pitch.midi_semitone(), Some(78));
        // 2 divisions with the default of 1 per quarter
        assert_eq!(event.note.sounding_whole_notes, Rational::new(1, 2));
        assert_eq!(event.note.tie, Some(TieKind::StopStart));
        assert_eq!(event.note.voice_number, 2);
        assert!(!event.is_chord_member);
    }

    #[test]
    fn test_unknown_step_defaults_to_c() {
        let resources = IngestResources::new();
        let mut builder = builder_in_part(&resources);
        let event = builder.read_note(&pitched("H", None, "4")).unwrap();
        assert_eq!(event.note.pitch().map(|p| p.step), Some(DiatonicStep::C));
        assert_eq!(builder.diagnostics.of_kind("unknown_step").count(), 1);
    }

    #[test]
    fn test_voice_out_of_range_is_fatal() {
        let resources = IngestResources::new();
        let mut builder = builder_in_part(&resources);
        let element = pitched("C", None, "4").with_child(Element::new("voice").with_text("5"));
        let err = builder.read_note(&element).unwrap_err();
        assert!(matches!(err, crate::errors::IngestError::Assertion { line: 7, .. }));
    }

    #[test]
    fn test_tuplet_ratio_from_time_modification() {
        let tuplet = Element::new("tuplet").with_attr("type", "start");
        let start = read_tuplet_start(&tuplet, Some((5, 4))).unwrap();
        assert_eq!((start.number, start.actual_notes, start.normal_notes), (1, 5, 4));

        let explicit = tuplet
            .with_attr("number", "2")
            .with_child(Element::new("tuplet-actual").with_child(Element::new("tuplet-number").with_text("3")))
            .with_child(Element::new("tuplet-normal").with_child(Element::new("tuplet-number").with_text("2")));
        let start = read_tuplet_start(&explicit, Some((9, 4))).unwrap();
        assert_eq!((start.number, start.actual_notes, start.normal_notes), (2, 3, 2));
    }
}
