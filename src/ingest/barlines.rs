//! Barlines, repeats and endings
//!
//! A `<barline>` is read and classified once, then applied to every voice
//! of the part so that all voices carry the same repeat structure.
//!
//! Voice side: the current chunk collects elements since the last repeat
//! boundary, and `pending_repeat` holds a repeat whose endings are still
//! coming. Part side: `barline_markers` remembers explicit repeat and ending
//! starts, so a repeat end can tell an explicit start from a missing one.
//!
//! | category          | voice transition                                        |
//! |-------------------|---------------------------------------------------------|
//! | RepeatStart       | close any open repeat, open a chunk, open a repeat     |
//! | EndingStart       | chunk becomes the common part, open the ending chunk   |
//! | HookedEndingEnd   | chunk becomes a hooked ending; last one finalizes      |
//! | HooklessEndingEnd | chunk becomes a hookless ending, repeat finalizes      |
//! | RepeatEnd         | chunk becomes the common part, repeat finalizes        |
//! | Standalone        | barline appended, no boundary                          |

use super::builder::ScoreBuilder;
use crate::errors::{IngestError, Result};
use crate::score::{
    Barline, BarlineCategory, BarlineLocation, BarlineStyle, EndingType, Repeat, RepeatDirection,
    RepeatEnding, RepeatEndingKind, RepeatWinged, Voice, VoiceElement, Voicechunk,
};
use crate::tree::Element;

/// "1, 2" or "1 2" or "1,2" into [1, 2]; anything unparseable is dropped
fn parse_ending_numbers(raw: &str) -> Vec<u32> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter_map(|n| n.trim().parse().ok())
        .collect()
}

/// Close the pending repeat into the voice
fn finalize_repeat(voice: &mut Voice, explicit_start: bool, measure_number: &str, trace: bool) {
    let Some(mut repeat) = voice.pending_repeat.take() else {
        return;
    };

    if !(explicit_start || repeat.explicit_start) {
        // The synthesized start belongs to the measure the repeated body begins in
        let start_measure = repeat
            .common_part
            .elements
            .iter()
            .find_map(VoiceElement::measure_number)
            .unwrap_or(measure_number)
            .to_string();
        repeat.common_part.elements.insert(
            0,
            VoiceElement::Barline(Barline::implicit_repeat_start(&start_measure)),
        );
    }

    if trace {
        log::debug!(
            "voice {}/{}: repeat closes with {} ending(s), {} start",
            voice.staff_number,
            voice.number,
            repeat.endings.len(),
            if explicit_start || repeat.explicit_start { "explicit" } else { "implicit" }
        );
    }

    voice.elements.push(VoiceElement::Repeat(repeat));
}

/// The repeat being built, created implicitly when the input never opened one
fn pending_repeat(voice: &mut Voice) -> &mut Repeat {
    voice.pending_repeat.get_or_insert_with(Repeat::default)
}

/// Close the current chunk into an ending of the pending repeat
fn close_ending(voice: &mut Voice, barline: &Barline, kind: RepeatEndingKind) {
    let chunk = std::mem::take(&mut voice.current_chunk);
    let numbers = match chunk.first_barline() {
        Some(start) if !start.ending_numbers.is_empty() => start.ending_numbers.clone(),
        _ => barline.ending_numbers.clone(),
    };
    pending_repeat(voice).endings.push(RepeatEnding { numbers, kind, chunk });
}

impl<'a> ScoreBuilder<'a> {
    pub(super) fn handle_barline(&mut self, element: &Element) -> Result<()> {
        self.drain_tuplets(element.line)?;
        self.open_chord = None;

        let barline = self.read_barline(element)?;

        if self.settings.trace_repeats {
            log::debug!(
                "line {}: barline {:?} at {:?} in measure {}",
                element.line,
                barline.category,
                barline.location,
                self.measure_number
            );
        }

        // Make sure the part has at least one voice to carry the structure
        let key = self.current_key();
        self.voice_mut(key, element.line)?;

        let explicit_start = match barline.category {
            BarlineCategory::RepeatStart | BarlineCategory::EndingStart => {
                self.barline_markers.push(barline.category);
                false
            }
            BarlineCategory::RepeatEnd => {
                // A backward repeat inside an ending closes that ending only
                if self.pop_marker(BarlineCategory::EndingStart) {
                    false
                } else {
                    self.pop_marker(BarlineCategory::RepeatStart)
                }
            }
            BarlineCategory::HookedEndingEnd | BarlineCategory::HooklessEndingEnd => {
                self.pop_marker(BarlineCategory::EndingStart);
                // The ending closes the repeat; its start was explicit if
                // a repeat start marker is still waiting
                let explicit = matches!(self.barline_markers.last(), Some(BarlineCategory::RepeatStart));
                let last = barline.category == BarlineCategory::HooklessEndingEnd
                    || barline.repeat != Some(RepeatDirection::Backward);
                if explicit && last {
                    self.barline_markers.pop();
                }
                explicit
            }
            BarlineCategory::Standalone => false,
        };

        let trace = self.settings.trace_repeats;
        let measure_number = self.measure_number.clone();
        let part = self.part_mut(element.line)?;
        for voice in part.voices_mut() {
            apply_barline(voice, barline.clone(), explicit_start, &measure_number, trace);
        }
        Ok(())
    }

    /// Pop the top marker when it is `expected`
    fn pop_marker(&mut self, expected: BarlineCategory) -> bool {
        if self.barline_markers.last() == Some(&expected) {
            self.barline_markers.pop();
            true
        } else {
            false
        }
    }

    fn read_barline(&mut self, element: &Element) -> Result<Barline> {
        let line = element.line;

        let location = match element.attr("location") {
            None => BarlineLocation::Right,
            Some(raw) => BarlineLocation::parse(raw).unwrap_or_else(|| {
                self.diagnostics.error(
                    line,
                    "unknown_barline_location",
                    format!("unknown barline location '{}', using right", raw),
                );
                BarlineLocation::Right
            }),
        };

        let style = match element.child_text("bar-style") {
            None => None,
            Some(raw) => Some(BarlineStyle::parse(raw).unwrap_or_else(|| {
                self.diagnostics.error(
                    line,
                    "unknown_bar_style",
                    format!("unknown bar style '{}', using regular", raw),
                );
                BarlineStyle::Regular
            })),
        };

        let ending_element = element.child("ending");
        let ending = match ending_element.and_then(|e| e.attr("type")) {
            None => None,
            Some(raw) => match EndingType::parse(raw) {
                Some(ending) => Some(ending),
                None => {
                    self.diagnostics.error(
                        line,
                        "unknown_ending_type",
                        format!("unknown ending type '{}', ignoring the ending", raw),
                    );
                    None
                }
            },
        };

        let repeat_element = element.child("repeat");
        let repeat = match repeat_element.and_then(|r| r.attr("direction")) {
            None => None,
            Some(raw) => match RepeatDirection::parse(raw) {
                Some(direction) => Some(direction),
                None => {
                    self.diagnostics.error(
                        line,
                        "unknown_repeat_direction",
                        format!("unknown repeat direction '{}', ignoring the repeat", raw),
                    );
                    None
                }
            },
        };

        let winged = match repeat_element.and_then(|r| r.attr("winged")) {
            None => None,
            Some(raw) => {
                let parsed = RepeatWinged::parse(raw);
                if parsed.is_none() {
                    self.diagnostics.error(
                        line,
                        "unknown_repeat_winged",
                        format!("unknown repeat winged '{}', using none", raw),
                    );
                }
                parsed.or(Some(RepeatWinged::None))
            }
        };

        let repeat_times = match repeat_element {
            Some(r) => r.attr_parse::<u32>("times")?,
            None => None,
        };

        let category = BarlineCategory::classify(location, repeat, ending, style.is_some()).ok_or_else(|| {
            IngestError::internal(
                line,
                format!(
                    "barline at {:?} with repeat {:?} and ending {:?} matches no known role",
                    location, repeat, ending
                ),
            )
        })?;

        Ok(Barline {
            location,
            style,
            ending,
            ending_numbers: ending_element
                .and_then(|e| e.attr("number"))
                .map(parse_ending_numbers)
                .unwrap_or_default(),
            ending_text: ending_element.and_then(Element::text).map(str::to_string),
            repeat,
            repeat_times,
            winged,
            segno: element.has_child("segno"),
            coda: element.has_child("coda"),
            fermata: element.has_child("fermata"),
            category,
            implicit: false,
            measure_number: self.measure_number.clone(),
            line,
        })
    }

    /// End of part: close repeats left open by the input
    pub(super) fn finalize_open_repeats(&mut self, line: usize) -> Result<()> {
        let explicit = self.barline_markers.contains(&BarlineCategory::RepeatStart);
        self.barline_markers.clear();

        let trace = self.settings.trace_repeats;
        let measure_number = self.measure_number.clone();
        let part = self.part_mut(line)?;
        let mut unterminated = 0;
        for voice in part.voices_mut() {
            if voice.pending_repeat.is_none() {
                continue;
            }
            unterminated += 1;
            // A repeat without endings takes the rest of the part; after
            // endings, the rest is ordinary content
            if let Some(repeat) = voice.pending_repeat.as_mut() {
                if repeat.endings.is_empty() {
                    let rest = std::mem::take(&mut voice.current_chunk);
                    repeat.common_part.elements.extend(rest.elements);
                }
            }
            finalize_repeat(voice, explicit, &measure_number, trace);
        }

        if unterminated > 0 {
            self.diagnostics.warning(
                line,
                "unterminated_repeat",
                format!("{} voice(s) end the part inside a repeat", unterminated),
            );
        }
        Ok(())
    }
}

fn apply_barline(voice: &mut Voice, barline: Barline, explicit_start: bool, measure_number: &str, trace: bool) {
    match barline.category {
        BarlineCategory::Standalone => {
            voice.append(VoiceElement::Barline(barline));
        }

        BarlineCategory::RepeatStart => {
            if voice.pending_repeat.is_some() {
                // A new repeat while the previous one still collects endings
                finalize_repeat(voice, explicit_start, measure_number, trace);
            }
            voice.flush_current_chunk();
            let times = barline.repeat_times;
            voice.current_chunk = Voicechunk::starting_with(VoiceElement::Barline(barline));
            voice.pending_repeat = Some(Repeat {
                explicit_start: true,
                times,
                ..Repeat::default()
            });
        }

        BarlineCategory::EndingStart => {
            let chunk = std::mem::take(&mut voice.current_chunk);
            let repeat = pending_repeat(voice);
            match repeat.endings.last_mut() {
                // Content between two endings belongs to the earlier one
                Some(previous) => previous.chunk.elements.extend(chunk.elements),
                None => repeat.common_part.elements.extend(chunk.elements),
            }
            voice.current_chunk = Voicechunk::starting_with(VoiceElement::Barline(barline));
        }

        BarlineCategory::HookedEndingEnd => {
            let last = barline.repeat != Some(RepeatDirection::Backward);
            let closing = barline.clone();
            voice.append(VoiceElement::Barline(barline));
            close_ending(voice, &closing, RepeatEndingKind::Hooked);
            if last {
                finalize_repeat(voice, explicit_start, measure_number, trace);
            }
        }

        BarlineCategory::HooklessEndingEnd => {
            let closing = barline.clone();
            voice.append(VoiceElement::Barline(barline));
            close_ending(voice, &closing, RepeatEndingKind::Hookless);
            finalize_repeat(voice, explicit_start, measure_number, trace);
        }

        BarlineCategory::RepeatEnd => {
            let in_ending = matches!(
                voice.current_chunk.first_barline(),
                Some(start) if start.category == BarlineCategory::EndingStart
            );
            let times = barline.repeat_times;
            if in_ending {
                let closing = barline.clone();
                voice.append(VoiceElement::Barline(barline));
                close_ending(voice, &closing, RepeatEndingKind::Hooked);
                return;
            }

            voice.append(VoiceElement::Barline(barline));
            let chunk = std::mem::take(&mut voice.current_chunk);
            let repeat = pending_repeat(voice);
            if repeat.times.is_none() {
                repeat.times = times;
            }
            match repeat.endings.last_mut() {
                Some(previous) => previous.chunk.elements.extend(chunk.elements),
                None => repeat.common_part.elements.extend(chunk.elements),
            }
            finalize_repeat(voice, explicit_start, measure_number, trace);
        }
    }
}
