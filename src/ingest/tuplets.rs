//! Tuplet stack
//!
//! One stack per traversal: nesting follows document order. A `start` pushes
//! a new tuplet and the note then joins the stack top, exactly as a
//! `continue` would; a `stop` pops after the note joined. A popped tuplet
//! goes into the new stack top, or into its voice when the stack is empty.

use super::builder::{ScoreBuilder, VoiceKey};
use crate::errors::{IngestError, Result};
use crate::score::{Rational, Tuplet, TupletMember, VoiceElement};

/// A `<tuplet type="start">` marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TupletStart {
    pub number: u32,
    pub actual_notes: u32,
    pub normal_notes: u32,
}

impl<'a> ScoreBuilder<'a> {
    pub(super) fn top_tuplet_key(&self) -> Option<VoiceKey> {
        self.tuplet_stack
            .last()
            .map(|tuplet| (tuplet.staff_number, tuplet.voice_number))
    }

    pub(super) fn push_tuplet(&mut self, start: TupletStart, key: VoiceKey, position: Rational, line: usize) -> Result<()> {
        let divisions_per_whole = self.part_mut(line)?.divisions_per_whole;

        if self.settings.trace_tuplets {
            log::debug!(
                "line {}: tuplet {} {}:{} opens at depth {}",
                line,
                start.number,
                start.actual_notes,
                start.normal_notes,
                self.tuplet_stack.len()
            );
        }

        self.tuplet_stack.push(Tuplet {
            number: start.number,
            actual_notes: start.actual_notes,
            normal_notes: start.normal_notes,
            divisions_per_whole,
            staff_number: key.0,
            voice_number: key.1,
            measure_number: self.measure_number.clone(),
            position_in_measure: position,
            elements: Vec::new(),
            line,
        });
        Ok(())
    }

    /// Pop the stack top and attach it where it belongs
    pub(super) fn pop_tuplet(&mut self, line: usize) -> Result<()> {
        let tuplet = self
            .tuplet_stack
            .pop()
            .ok_or_else(|| IngestError::internal(line, "tuplet stop with no open tuplet"))?;

        if tuplet.elements.is_empty() {
            // Nothing to keep: a start and a stop with no member in between
            self.diagnostics.warning(
                line,
                "empty_tuplet",
                format!("tuplet {} has no members, dropping it", tuplet.number),
            );
            return Ok(());
        }

        if self.settings.trace_tuplets {
            log::debug!(
                "line {}: tuplet {} closes with {} element(s), depth now {}",
                line,
                tuplet.number,
                tuplet.elements.len(),
                self.tuplet_stack.len()
            );
        }

        match self.tuplet_stack.last_mut() {
            Some(outer) => {
                outer.elements.push(TupletMember::Tuplet(tuplet));
            }
            None => {
                let key = (tuplet.staff_number, tuplet.voice_number);
                let voice = self.voice_mut(key, line)?;
                voice.append(VoiceElement::Tuplet(tuplet));
            }
        }
        Ok(())
    }

    /// Close every open tuplet before a boundary
    pub(super) fn drain_tuplets(&mut self, line: usize) -> Result<()> {
        if self.tuplet_stack.is_empty() {
            return Ok(());
        }

        self.diagnostics.warning(
            line,
            "unterminated_tuplet",
            format!("{} tuplet(s) still open, closing them", self.tuplet_stack.len()),
        );
        while !self.tuplet_stack.is_empty() {
            self.pop_tuplet(line)?;
        }
        Ok(())
    }
}
