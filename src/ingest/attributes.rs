//! `<attributes>`: divisions, key, time, staves and clefs
//!
//! The values become part defaults (so voices created later start with
//! them) and are appended to the voices that already exist.

use super::builder::ScoreBuilder;
use crate::errors::{IngestError, Result};
use crate::score::{Clef, ClefKind, Key, KeyMode, Staff, Time, TimeSymbol, VoiceElement};
use crate::tree::Element;

impl<'a> ScoreBuilder<'a> {
    pub(super) fn handle_attributes(&mut self, element: &Element) -> Result<()> {
        if let Some(divisions) = element.child("divisions") {
            self.set_divisions(divisions)?;
        }

        if let Some(key) = element.child("key") {
            let key = self.read_key(key)?;
            let part = self.part_mut(element.line)?;
            part.key = Some(key);
            for voice in part.voices_mut() {
                voice.append(VoiceElement::Key(key));
            }
        }

        if let Some(time) = element.child("time") {
            let time = self.read_time(time)?;
            let part = self.part_mut(element.line)?;
            part.time = Some(time.clone());
            for voice in part.voices_mut() {
                voice.append(VoiceElement::Time(time.clone()));
            }
        }

        if let Some(staves) = element.child("staves") {
            let count: i64 = staves.parse_text()?.unwrap_or(1);
            if count <= 0 {
                return Err(IngestError::assertion(
                    staves.line,
                    format!("staves count {} is not positive", count),
                ));
            }
            let count = u32::try_from(count).map_err(|_| {
                IngestError::assertion(staves.line, format!("staves count {} is out of range", count))
            })?;
            let part = self.part_mut(element.line)?;
            for number in 1..=count {
                part.staves.entry(number).or_insert_with(|| Staff::new(number));
            }
        }

        for clef in element.children_named("clef") {
            let clef = self.read_clef(clef)?;
            let part = self.part_mut(element.line)?;
            part.clefs.insert(clef.staff_number, clef);
            if let Some(staff) = part.staves.get_mut(&clef.staff_number) {
                for voice in staff.voices.values_mut() {
                    voice.append(VoiceElement::Clef(clef));
                }
            }
        }

        for child in &element.children {
            if matches!(child.name.as_str(), "transpose" | "measure-style" | "staff-details") {
                self.diagnostics.skipped(child.line, &child.name, "not part of the score structure");
            }
        }
        Ok(())
    }

    fn set_divisions(&mut self, element: &Element) -> Result<()> {
        let divisions: i64 = element.parse_text()?.ok_or_else(|| {
            IngestError::assertion(element.line, "empty <divisions>")
        })?;
        if divisions <= 0 {
            return Err(IngestError::assertion(
                element.line,
                format!("divisions {} is not positive", divisions),
            ));
        }
        let per_whole = divisions
            .checked_mul(4)
            .and_then(|d| u32::try_from(d).ok())
            .ok_or_else(|| IngestError::assertion(element.line, format!("divisions {} is out of range", divisions)))?;

        let part = self.part_mut(element.line)?;
        part.divisions_per_whole = per_whole;
        for voice in part.voices_mut() {
            voice.divisions_per_whole = per_whole;
        }
        log::debug!("line {}: {} divisions per whole note", element.line, per_whole);
        Ok(())
    }

    fn read_key(&mut self, element: &Element) -> Result<Key> {
        let fifths = element.child_parse::<i8>("fifths")?.unwrap_or(0);
        let mode = match element.child_text("mode") {
            None => KeyMode::Major,
            Some(raw) => KeyMode::parse(raw).unwrap_or_else(|| {
                self.diagnostics.error(
                    element.line,
                    "unknown_key_mode",
                    format!("unknown key mode '{}', using major", raw),
                );
                KeyMode::Major
            }),
        };
        Ok(Key { fifths, mode })
    }

    fn read_time(&mut self, element: &Element) -> Result<Time> {
        let symbol = match element.attr("symbol") {
            None => TimeSymbol::Normal,
            Some(raw) => TimeSymbol::parse(raw).unwrap_or_else(|| {
                self.diagnostics.error(
                    element.line,
                    "unknown_time_symbol",
                    format!("unknown time symbol '{}', using normal", raw),
                );
                TimeSymbol::Normal
            }),
        };

        if element.has_child("senza-misura") {
            return Ok(Time {
                beats: String::new(),
                beat_type: 0,
                symbol,
                senza_misura: true,
            });
        }

        Ok(Time {
            beats: element.child_text("beats").unwrap_or("4").to_string(),
            beat_type: element.child_parse::<u32>("beat-type")?.unwrap_or(4),
            symbol,
            senza_misura: false,
        })
    }

    fn read_clef(&mut self, element: &Element) -> Result<Clef> {
        let staff_number = match element.attr_parse::<i64>("number")? {
            None => 1,
            Some(n) if n <= 0 => {
                return Err(IngestError::assertion(
                    element.line,
                    format!("clef staff number {} is not positive", n),
                ))
            }
            Some(n) => u32::try_from(n).map_err(|_| {
                IngestError::assertion(element.line, format!("clef staff number {} is out of range", n))
            })?,
        };
        let line = element.child_parse::<u8>("line")?;
        let sign = element.child_text("sign").unwrap_or_default();
        let kind = ClefKind::from_sign(sign, line).unwrap_or_else(|| {
            self.diagnostics.error(
                element.line,
                "unknown_clef_sign",
                format!("unknown clef sign '{}', using treble", sign),
            );
            ClefKind::Treble
        });

        Ok(Clef {
            kind,
            octave_change: element.child_parse::<i8>("clef-octave-change")?.unwrap_or(0),
            staff_number,
        })
    }
}
