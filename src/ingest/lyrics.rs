//! Lyric syllable alignment
//!
//! Every sounding note gets one chunk per stanza its voice knows about. The
//! chunk kind comes from the note's own `<lyric>` when it has one, otherwise
//! from context: tied notes continue a syllable, rests skip, notes under a
//! slur extend a melisma. A melisma whose slur started on a word-final
//! syllable stays `SlurBeyondEnd` until that slur closes.
//!
//! Slur state is tracked per voice: the depth of open slurs and the chunk
//! kind of the note that opened the outermost one.

use super::builder::{ScoreBuilder, VoiceKey};
use crate::errors::Result;
use crate::score::{LyricChunk, LyricChunkKind, Note, SlurKind, Voice};
use crate::tree::Element;

/// A `<lyric>` element as found on a note
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricInput {
    pub stanza: String,
    pub syllabic: Option<String>,
    pub text: Option<String>,
    pub extend: bool,
    pub elision: bool,
    pub line: usize,
}

impl LyricInput {
    pub fn from_element(element: &Element) -> Self {
        let texts: Vec<&str> = element.children_named("text").filter_map(Element::text).collect();
        let elision = element.has_child("elision");
        let text = match texts.len() {
            0 => None,
            1 => Some(texts[0].to_string()),
            // Syllables joined by an elision share the note
            _ => Some(texts.join(" ")),
        };

        Self {
            stanza: element.attr("number").unwrap_or("1").to_string(),
            syllabic: element.child_text("syllabic").map(str::to_string),
            text,
            extend: element.has_child("extend"),
            elision,
            line: element.line,
        }
    }
}

/// Kind for a note that brings no syllable of its own for a stanza
fn context_kind(voice: &Voice, note: &Note) -> LyricChunkKind {
    if note.tie.is_some() {
        LyricChunkKind::Tied
    } else if note.is_rest() {
        LyricChunkKind::Skip
    } else if voice.slur_depth > 0 {
        match voice.first_chunk_kind_in_current_slur {
            Some(LyricChunkKind::End) => LyricChunkKind::SlurBeyondEnd,
            _ => LyricChunkKind::Slur,
        }
    } else {
        LyricChunkKind::None
    }
}

/// Apply a note's slur markers: stops first, then starts
fn update_slur_state(voice: &mut Voice, note: &Note, kind: LyricChunkKind) {
    for _ in note.slurs.iter().filter(|s| s.kind == SlurKind::Stop) {
        voice.slur_depth = voice.slur_depth.saturating_sub(1);
        if voice.slur_depth == 0 {
            voice.first_chunk_kind_in_current_slur = None;
        }
    }
    for _ in note.slurs.iter().filter(|s| s.kind == SlurKind::Start) {
        if voice.slur_depth == 0 {
            voice.first_chunk_kind_in_current_slur = Some(kind);
        }
        voice.slur_depth += 1;
    }
}

impl<'a> ScoreBuilder<'a> {
    /// Compute and attach the lyric chunks of a sounding note
    pub(super) fn align_lyrics(&mut self, key: VoiceKey, note: &mut Note, lyrics: &[LyricInput]) -> Result<()> {
        if self.settings.ignore_lyrics {
            return Ok(());
        }

        // Explicit syllables first, while the diagnostics are reachable
        let mut explicit: Vec<(&LyricInput, Option<LyricChunkKind>)> = Vec::new();
        for lyric in lyrics {
            if !self.settings.keeps_stanza(&lyric.stanza) {
                continue;
            }
            let kind = match lyric.syllabic.as_deref() {
                Some(syllabic) => Some(LyricChunkKind::from_syllabic(syllabic).unwrap_or_else(|| {
                    self.diagnostics.error(
                        lyric.line,
                        "unknown_syllabic",
                        format!("unknown syllabic '{}', using single", syllabic),
                    );
                    LyricChunkKind::Single
                })),
                None if lyric.text.is_some() => Some(LyricChunkKind::Single),
                None => None,
            };
            explicit.push((lyric, kind));
        }

        let trace = self.settings.trace_lyrics;
        let voice = self.voice_mut(key, note.line)?;
        for (lyric, _) in &explicit {
            voice.stanzas.insert(lyric.stanza.clone());
        }

        let fallback = context_kind(voice, note);
        let mut primary = None;

        for stanza in &voice.stanzas {
            let input = explicit.iter().find(|(lyric, _)| &lyric.stanza == stanza);
            let kind = input.and_then(|(_, kind)| *kind).unwrap_or(fallback);
            primary.get_or_insert(kind);

            if trace {
                log::debug!(
                    "line {}: stanza {} chunk {:?} {:?}",
                    note.line,
                    stanza,
                    kind,
                    input.and_then(|(lyric, _)| lyric.text.as_deref())
                );
            }

            note.lyrics.push(LyricChunk {
                stanza: stanza.clone(),
                kind,
                text: input.and_then(|(lyric, _)| lyric.text.clone()),
                whole_notes: note.sounding_whole_notes,
                extend: input.map_or(false, |(lyric, _)| lyric.extend),
                elision: input.map_or(false, |(lyric, _)| lyric.elision),
                line: input.map_or(note.line, |(lyric, _)| lyric.line),
            });
        }

        update_slur_state(voice, note, primary.unwrap_or(fallback));
        Ok(())
    }

    /// Chord members carry no lyrics but may open or close slurs
    pub(super) fn track_chord_member_slurs(&mut self, key: VoiceKey, note: &Note, line: usize) -> Result<()> {
        if self.settings.ignore_lyrics || note.slurs.is_empty() {
            return Ok(());
        }
        let voice = self.voice_mut(key, line)?;
        update_slur_state(voice, note, LyricChunkKind::None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::{Rational, Slur, TieKind};

    fn sounding(slurs: &[SlurKind]) -> Note {
        let mut note = Note::skip(Rational::new(1, 4), 1, 1, "1", 3);
        note.content = crate::score::NoteContent::Unpitched {
            display_step: None,
            display_octave: None,
        };
        note.slurs = slurs.iter().map(|&kind| Slur { kind, number: 1 }).collect();
        note
    }

    #[test]
    fn test_context_kinds() {
        let mut voice = Voice::new(1, 1, 4);
        let mut note = sounding(&[]);
        assert_eq!(context_kind(&voice, &note), LyricChunkKind::None);

        voice.slur_depth = 1;
        voice.first_chunk_kind_in_current_slur = Some(LyricChunkKind::Begin);
        assert_eq!(context_kind(&voice, &note), LyricChunkKind::Slur);

        voice.first_chunk_kind_in_current_slur = Some(LyricChunkKind::End);
        assert_eq!(context_kind(&voice, &note), LyricChunkKind::SlurBeyondEnd);

        // Ties take precedence over the slur
        note.tie = Some(TieKind::Stop);
        assert_eq!(context_kind(&voice, &note), LyricChunkKind::Tied);
    }

    #[test]
    fn test_slur_state_stops_before_starts() {
        let mut voice = Voice::new(1, 1, 4);
        update_slur_state(&mut voice, &sounding(&[SlurKind::Start]), LyricChunkKind::End);
        assert_eq!(voice.slur_depth, 1);
        assert_eq!(voice.first_chunk_kind_in_current_slur, Some(LyricChunkKind::End));

        // Slur chained on the same note: the old one ends, a new one begins
        update_slur_state(
            &mut voice,
            &sounding(&[SlurKind::Start, SlurKind::Stop]),
            LyricChunkKind::Begin,
        );
        assert_eq!(voice.slur_depth, 1);
        assert_eq!(voice.first_chunk_kind_in_current_slur, Some(LyricChunkKind::Begin));

        update_slur_state(&mut voice, &sounding(&[SlurKind::Stop]), LyricChunkKind::Slur);
        assert_eq!(voice.slur_depth, 0);
        assert_eq!(voice.first_chunk_kind_in_current_slur, None);
    }

    #[test]
    fn test_lyric_input_with_elision() {
        let element = Element::new("lyric")
            .with_attr("number", "2")
            .with_child(Element::new("syllabic").with_text("single"))
            .with_child(Element::new("text").with_text("che"))
            .with_child(Element::new("elision"))
            .with_child(Element::new("text").with_text("a"));
        let input = LyricInput::from_element(&element);
        assert_eq!(input.stanza, "2");
        assert_eq!(input.text.as_deref(), Some("che a"));
        assert!(input.elision);
        assert!(!input.extend);
    }
}
