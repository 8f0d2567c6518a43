//! Pending attachments
//!
//! Dynamics, wedges, words and pedal marks are written in `<direction>`
//! elements placed before the note they decorate. They wait here until the
//! next sounding note takes them. Grace notes and invisible rests never do;
//! real rests do unless `delay_rests_attachments` is set.

use super::builder::ScoreBuilder;
use crate::score::{Attachments, Note, NoteKind};

impl<'a> ScoreBuilder<'a> {
    pub(super) fn queue_attachments(&mut self, mut attachments: Attachments) {
        self.pending.append(&mut attachments);
    }

    pub(super) fn flush_pending_onto(&mut self, note: &mut Note) {
        if self.pending.is_empty() || note.kind == NoteKind::Grace || note.is_invisible_rest() {
            return;
        }

        if note.is_rest() {
            if self.settings.delay_rests_attachments {
                return;
            }
            self.diagnostics.warning(
                note.line,
                "attachments_on_rest",
                "dynamics, wedges or words attached to a rest",
            );
        }

        note.attachments.append(&mut self.pending);
    }

    /// Drop whatever no note took before a measure or part boundary
    pub(super) fn clear_pending(&mut self, line: usize) {
        if self.pending.is_empty() {
            return;
        }
        let dropped = std::mem::take(&mut self.pending);
        self.diagnostics.warning(
            line,
            "attachments_dropped",
            format!(
                "{} dynamic(s), {} wedge(s), {} word(s) and {} pedal mark(s) had no note to attach to in measure {}",
                dropped.dynamics.len(),
                dropped.wedges.len(),
                dropped.words.len(),
                dropped.pedals.len(),
                self.measure_number
            ),
        );
    }
}
