//! `<direction>` and measure-level `<sound>`
//!
//! Dynamics, wedges, words and pedals decorate the next note and are queued
//! as pending attachments. Tempo marks, rehearsal marks, segni and codas
//! stand in the voice on their own and are appended right away.

use super::builder::ScoreBuilder;
use crate::errors::Result;
use crate::score::{
    Attachments, Direction, DisplayDuration, Dynamics, NoteType, PedalKind, Placement, Tempo, VoiceElement, Wedge,
    WedgeKind, Words,
};
use crate::tree::Element;

impl<'a> ScoreBuilder<'a> {
    pub(super) fn handle_direction(&mut self, element: &Element) -> Result<()> {
        let key = self.read_voice_key(element, self.current_key())?;
        let placement = element.attr("placement").and_then(Placement::parse);

        let mut attachments = Attachments::default();
        let mut standing: Vec<Direction> = Vec::new();

        for direction_type in element.children_named("direction-type") {
            for child in &direction_type.children {
                match child.name.as_str() {
                    "dynamics" => {
                        for mark in &child.children {
                            let dynamics = match mark.name.as_str() {
                                "other-dynamics" => Dynamics::Other(mark.text().unwrap_or_default().to_string()),
                                name => Dynamics::parse(name).unwrap_or_else(|| Dynamics::Other(name.to_string())),
                            };
                            attachments.dynamics.push(dynamics);
                        }
                    }
                    "wedge" => {
                        if let Some(wedge) = self.read_wedge(child)? {
                            attachments.wedges.push(wedge);
                        }
                    }
                    "words" => {
                        if let Some(text) = child.text() {
                            attachments.words.push(Words {
                                text: text.to_string(),
                                placement,
                            });
                        }
                    }
                    "pedal" => {
                        let raw = child.attr("type").unwrap_or_default();
                        match PedalKind::parse(raw) {
                            Some(pedal) => attachments.pedals.push(pedal),
                            None => self.diagnostics.error(
                                child.line,
                                "unknown_pedal_type",
                                format!("unknown pedal type '{}', ignoring it", raw),
                            ),
                        }
                    }
                    "metronome" => standing.push(Direction::Tempo(self.read_metronome(child))),
                    "rehearsal" => {
                        standing.push(Direction::Rehearsal(child.text().unwrap_or_default().to_string()));
                    }
                    "segno" => standing.push(Direction::Segno),
                    "coda" => standing.push(Direction::Coda),
                    _ => self.diagnostics.skipped(child.line, &child.name, "direction type not ingested"),
                }
            }
        }

        // A <sound tempo> only stands for a tempo when no metronome was given
        let has_tempo = standing.iter().any(|d| matches!(d, Direction::Tempo(_)));
        if !has_tempo {
            if let Some(tempo) = element.child("sound").and_then(|s| s.attr("tempo")) {
                standing.push(Direction::Tempo(Tempo {
                    beat_unit: None,
                    per_minute: Some(tempo.to_string()),
                    words: None,
                }));
            }
        }

        if !attachments.is_empty() {
            self.queue_attachments(attachments);
        }

        if !standing.is_empty() {
            let voice = self.voice_mut(key, element.line)?;
            for direction in standing {
                voice.append(VoiceElement::Direction(direction));
            }
        }
        Ok(())
    }

    /// `<sound>` directly in a measure
    pub(super) fn handle_sound(&mut self, element: &Element) -> Result<()> {
        let Some(tempo) = element.attr("tempo") else {
            self.diagnostics.skipped(element.line, &element.name, "only tempo is ingested from <sound>");
            return Ok(());
        };

        let key = self.current_key();
        let voice = self.voice_mut(key, element.line)?;
        voice.append(VoiceElement::Direction(Direction::Tempo(Tempo {
            beat_unit: None,
            per_minute: Some(tempo.to_string()),
            words: None,
        })));
        Ok(())
    }

    fn read_wedge(&mut self, element: &Element) -> Result<Option<Wedge>> {
        let kind = match element.attr("type") {
            Some("crescendo") => WedgeKind::Crescendo,
            Some("diminuendo") => WedgeKind::Diminuendo,
            Some("stop") => WedgeKind::Stop,
            Some("continue") => WedgeKind::Continue,
            other => {
                self.diagnostics.error(
                    element.line,
                    "unknown_wedge_type",
                    format!("unknown wedge type '{}', ignoring it", other.unwrap_or("")),
                );
                return Ok(None);
            }
        };
        Ok(Some(Wedge {
            kind,
            number: element.attr_parse::<u32>("number")?.unwrap_or(1),
            niente: element.attr("niente") == Some("yes"),
        }))
    }

    fn read_metronome(&mut self, element: &Element) -> Tempo {
        let beat_unit = element.child("beat-unit").and_then(|unit| {
            let raw = unit.text().unwrap_or_default();
            match NoteType::parse(raw) {
                Some(note_type) => Some(DisplayDuration {
                    note_type,
                    dots: element.children_named("beat-unit-dot").count().min(u8::MAX as usize) as u8,
                }),
                None => {
                    self.diagnostics.error(
                        unit.line,
                        "unknown_beat_unit",
                        format!("unknown beat unit '{}', ignoring it", raw),
                    );
                    None
                }
            }
        });

        Tempo {
            beat_unit,
            per_minute: element.child_text("per-minute").map(str::to_string),
            words: None,
        }
    }
}
