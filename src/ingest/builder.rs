//! Traversal state
//!
//! `ScoreBuilder` owns the growing Score IR pieces and every bit of transient
//! state the enter/leave handlers share: current part, staff and voice,
//! the open tuplet stack, the open chord, the pending attachments and the
//! part-level barline markers. The handlers live in the sibling modules, one
//! per concern, as `impl ScoreBuilder` blocks.

use super::part_list::GroupFrame;
use super::resources::IngestResources;
use super::settings::IngestSettings;
use super::IngestResult;
use crate::diagnostics::Diagnostics;
use crate::errors::{IngestError, Result};
use crate::score::{Attachments, BarlineCategory, Identification, Part, Rational, Score, Tuplet};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// (staff number, voice number)
pub type VoiceKey = (u32, u32);

pub struct ScoreBuilder<'a> {
    pub(super) settings: IngestSettings,
    pub(super) resources: &'a IngestResources,
    pub(super) diagnostics: Diagnostics,
    pub(super) identification: Identification,

    // Part list
    pub(super) parts: Vec<Part>,
    pub(super) part_index: HashMap<String, usize>,
    /// Open part groups, ascending bracket-ordering key; the last is innermost
    pub(super) open_groups: Vec<GroupFrame>,
    pub(super) root_groups: Vec<GroupFrame>,
    /// Declaration order of groups and parts
    pub(super) declaration_sequence: usize,

    // Part traversal
    pub(super) current_part: Option<usize>,
    pub(super) current_staff: u32,
    pub(super) current_voice: u32,
    /// Context to restore when the open `<forward>` is left
    pub(super) forward_saved: Option<VoiceKey>,
    pub(super) barline_markers: Vec<BarlineCategory>,

    // Measure traversal
    pub(super) measure_number: String,
    /// Document-order position, moved by notes, backup and forward
    pub(super) measure_position: Rational,
    /// Furthest position reached by each voice in this measure
    pub(super) measure_extents: BTreeMap<VoiceKey, Rational>,
    /// Voices owed a bar check when the next measure starts
    pub(super) unchecked_voices: BTreeSet<VoiceKey>,

    // Note assembly
    pub(super) tuplet_stack: Vec<Tuplet>,
    pub(super) open_chord: Option<VoiceKey>,
    pub(super) pending: Attachments,
}

impl<'a> ScoreBuilder<'a> {
    pub fn new(settings: IngestSettings, resources: &'a IngestResources) -> Self {
        Self {
            settings,
            resources,
            diagnostics: Diagnostics::new(),
            identification: Identification::default(),
            parts: Vec::new(),
            part_index: HashMap::new(),
            open_groups: Vec::new(),
            root_groups: Vec::new(),
            declaration_sequence: 0,
            current_part: None,
            current_staff: 1,
            current_voice: 1,
            forward_saved: None,
            barline_markers: Vec::new(),
            measure_number: String::new(),
            measure_position: Rational::from_integer(0),
            measure_extents: BTreeMap::new(),
            unchecked_voices: BTreeSet::new(),
            tuplet_stack: Vec::new(),
            open_chord: None,
            pending: Attachments::default(),
        }
    }

    /// The part whose `<part>` element is being traversed
    pub(super) fn part_mut(&mut self, line: usize) -> Result<&mut Part> {
        let index = self
            .current_part
            .ok_or_else(|| IngestError::internal(line, "musical content outside of any <part>"))?;
        self.parts
            .get_mut(index)
            .ok_or_else(|| IngestError::internal(line, "current part index out of range"))
    }

    pub(super) fn next_sequence(&mut self) -> usize {
        self.declaration_sequence += 1;
        self.declaration_sequence
    }

    /// Assemble the Score from the part list skeleton and the traversed parts
    pub fn finish(mut self) -> Result<IngestResult> {
        // Groups still open here were never inside a part-list
        if !self.open_groups.is_empty() {
            self.close_open_groups(0);
        }

        let mut parts: HashMap<String, Part> = self
            .parts
            .drain(..)
            .map(|part| (part.id.clone(), part))
            .collect();

        let mut part_groups = Vec::with_capacity(self.root_groups.len());
        for frame in std::mem::take(&mut self.root_groups) {
            part_groups.push(frame.into_part_group(&mut parts)?);
        }

        let score = Score {
            identification: self.identification,
            part_groups,
        };

        log::debug!(
            "ingestion finished: {} part(s), {} diagnostic(s)",
            score.part_count(),
            self.diagnostics.len()
        );

        Ok(IngestResult {
            score,
            diagnostics: self.diagnostics,
        })
    }
}
