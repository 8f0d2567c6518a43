//! Part list: part declarations and part-group nesting
//!
//! Open groups are kept sorted by ascending bracket-ordering key (the
//! `default-x` of the group symbol: brackets further left enclose the ones
//! to their right). A group without a key goes innermost. Parts are declared
//! into the innermost open group. A stopped group either becomes a root
//! group (nothing left open) or a child of the new innermost group.
//!
//! While the part list is read, groups only hold part ids; the `Part`
//! objects are filled in by the traversal and moved into the tree by
//! [`GroupFrame::into_part_group`] at the end.

use super::builder::ScoreBuilder;
use crate::errors::{IngestError, ParseError, Result};
use crate::score::{GroupSymbol, Part, PartGroup, PartGroupElement};
use crate::tree::Element;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub enum GroupMember {
    Part { id: String, sequence: usize },
    Group(GroupFrame),
}

impl GroupMember {
    fn sequence(&self) -> usize {
        match self {
            GroupMember::Part { sequence, .. } => *sequence,
            GroupMember::Group(frame) => frame.sequence,
        }
    }
}

/// A part group under construction
#[derive(Debug, Clone)]
pub struct GroupFrame {
    pub group: PartGroup,
    pub members: Vec<GroupMember>,
    pub sequence: usize,
}

impl GroupFrame {
    fn new(group: PartGroup, sequence: usize) -> Self {
        Self {
            group,
            members: Vec::new(),
            sequence,
        }
    }

    /// Insert keeping declaration order
    fn insert_member(&mut self, member: GroupMember) {
        let at = self
            .members
            .iter()
            .position(|m| m.sequence() > member.sequence())
            .unwrap_or(self.members.len());
        self.members.insert(at, member);
    }

    pub fn into_part_group(self, parts: &mut HashMap<String, Part>) -> Result<PartGroup> {
        let mut group = self.group;
        for member in self.members {
            match member {
                GroupMember::Part { id, .. } => {
                    let part = parts.remove(&id).ok_or_else(|| {
                        IngestError::internal(group.line, format!("part '{}' declared twice or lost", id))
                    })?;
                    group.elements.push(PartGroupElement::Part(part));
                }
                GroupMember::Group(frame) => {
                    group.elements.push(PartGroupElement::Group(frame.into_part_group(parts)?));
                }
            }
        }
        Ok(group)
    }
}

impl<'a> ScoreBuilder<'a> {
    /// `<part-group type="start|stop" number="n">`
    pub(super) fn handle_part_group(&mut self, element: &Element) -> Result<()> {
        let number = element.attr("number").unwrap_or("1").to_string();

        match element.attr("type") {
            Some("start") => self.start_part_group(element, number),
            Some("stop") => {
                self.stop_part_group(&number, element.line);
                Ok(())
            }
            other => {
                self.diagnostics.error(
                    element.line,
                    "unknown_part_group_type",
                    format!("unknown part-group type '{}', ignoring the element", other.unwrap_or("")),
                );
                Ok(())
            }
        }
    }

    fn start_part_group(&mut self, element: &Element, number: String) -> Result<()> {
        let symbol_element = element.child("group-symbol");
        let symbol = match symbol_element.and_then(Element::text) {
            None => GroupSymbol::None,
            Some(text) => GroupSymbol::parse(text).unwrap_or_else(|| {
                self.diagnostics.error(
                    element.line,
                    "unknown_group_symbol",
                    format!("unknown group symbol '{}', using none", text),
                );
                GroupSymbol::None
            }),
        };
        let ordering_key = match symbol_element {
            Some(symbol) => symbol.attr_parse::<f32>("default-x")?,
            None => None,
        };
        let barline = matches!(element.child_text("group-barline"), Some("yes") | Some("Mensurstrich"));

        let group = PartGroup {
            id: number,
            name: element.child_text("group-name").map(str::to_string),
            abbreviation: element.child_text("group-abbreviation").map(str::to_string),
            symbol,
            ordering_key,
            barline,
            implicit: false,
            elements: Vec::new(),
            line: element.line,
        };

        if self.settings.trace_part_groups {
            log::debug!(
                "line {}: part group '{}' starts, ordering key {:?}",
                element.line,
                group.id,
                group.ordering_key
            );
        }

        let sequence = self.next_sequence();
        let frame = GroupFrame::new(group, sequence);
        let at = match ordering_key {
            None => self.open_groups.len(),
            Some(key) => self
                .open_groups
                .iter()
                .position(|open| matches!(open.group.ordering_key, Some(k) if k > key))
                .unwrap_or(self.open_groups.len()),
        };
        self.open_groups.insert(at, frame);
        Ok(())
    }

    fn stop_part_group(&mut self, number: &str, line: usize) {
        let Some(index) = self
            .open_groups
            .iter()
            .rposition(|open| !open.group.implicit && open.group.id == number)
        else {
            self.diagnostics.warning(
                line,
                "part_group_not_open",
                format!("part-group {} stopped but never started", number),
            );
            return;
        };

        let frame = self.open_groups.remove(index);
        self.close_group(frame);
    }

    fn close_group(&mut self, frame: GroupFrame) {
        if self.settings.trace_part_groups {
            log::debug!(
                "part group '{}' closes with {} member(s)",
                frame.group.id,
                frame.members.len()
            );
        }

        match self.open_groups.last_mut() {
            Some(parent) => parent.insert_member(GroupMember::Group(frame)),
            None => self.root_groups.push(frame),
        }
    }

    /// Close every open group, innermost first
    pub(super) fn close_open_groups(&mut self, line: usize) {
        while let Some(frame) = self.open_groups.pop() {
            if !frame.group.implicit {
                self.diagnostics.warning(
                    line,
                    "part_group_not_closed",
                    format!("part-group {} was never stopped", frame.group.id),
                );
            }
            self.close_group(frame);
        }
    }

    /// `<score-part id="...">`
    pub(super) fn declare_part(&mut self, element: &Element) -> Result<()> {
        let id = element
            .attr("id")
            .ok_or_else(|| ParseError::MissingRequiredElement {
                line: element.line,
                element: "score-part@id".to_string(),
            })?
            .to_string();

        if self.part_index.contains_key(&id) {
            self.diagnostics.warning(
                element.line,
                "duplicate_part_declaration",
                format!("part '{}' declared more than once, keeping the first", id),
            );
            return Ok(());
        }

        // The implicit group stays open until the part list ends, so this
        // happens at most once per part list
        if self.open_groups.is_empty() {
            self.open_implicit_group(element.line);
        }

        let mut part = Part::new(id.clone(), element.line);
        part.name = element.child_text("part-name").map(str::to_string);
        part.abbreviation = element.child_text("part-abbreviation").map(str::to_string);
        part.instrument_name = element
            .child("score-instrument")
            .and_then(|instrument| instrument.child_text("instrument-name"))
            .map(str::to_string);

        let sequence = self.next_sequence();
        if let Some(innermost) = self.open_groups.last_mut() {
            innermost.insert_member(GroupMember::Part {
                id: id.clone(),
                sequence,
            });
        }

        if self.settings.trace_part_groups {
            log::debug!("line {}: part '{}' declared", element.line, id);
        }

        self.part_index.insert(id, self.parts.len());
        self.parts.push(part);
        Ok(())
    }

    fn open_implicit_group(&mut self, line: usize) {
        let group = PartGroup {
            id: "implicit".to_string(),
            name: None,
            abbreviation: None,
            symbol: GroupSymbol::None,
            ordering_key: None,
            barline: false,
            implicit: true,
            elements: Vec::new(),
            line,
        };
        let sequence = self.next_sequence();
        self.open_groups.push(GroupFrame::new(group, sequence));
    }

    pub(super) fn leave_part_list(&mut self, element: &Element) -> Result<()> {
        self.close_open_groups(element.line);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::IngestResources;
    use crate::ingest::IngestSettings;

    fn group_start(number: &str, default_x: Option<&str>) -> Element {
        let mut symbol = Element::new("group-symbol").with_text("bracket");
        if let Some(x) = default_x {
            symbol = symbol.with_attr("default-x", x);
        }
        Element::new("part-group")
            .with_attr("type", "start")
            .with_attr("number", number)
            .with_child(symbol)
    }

    fn group_stop(number: &str) -> Element {
        Element::new("part-group")
            .with_attr("type", "stop")
            .with_attr("number", number)
    }

    fn score_part(id: &str) -> Element {
        Element::new("score-part").with_attr("id", id)
    }

    fn member_ids(frame: &GroupFrame) -> Vec<String> {
        frame
            .members
            .iter()
            .map(|m| match m {
                GroupMember::Part { id, .. } => id.clone(),
                GroupMember::Group(g) => format!("group {}", g.group.id),
            })
            .collect()
    }

    #[test]
    fn test_nested_groups_by_ordering_key() {
        let resources = IngestResources::new();
        let mut builder = ScoreBuilder::new(IngestSettings::default(), &resources);

        builder.handle_part_group(&group_start("1", Some("-20"))).unwrap();
        builder.handle_part_group(&group_start("2", Some("-10"))).unwrap();
        builder.declare_part(&score_part("P1")).unwrap();
        builder.declare_part(&score_part("P2")).unwrap();
        builder.handle_part_group(&group_stop("2")).unwrap();
        builder.declare_part(&score_part("P3")).unwrap();
        builder.handle_part_group(&group_stop("1")).unwrap();

        assert!(builder.open_groups.is_empty());
        assert_eq!(builder.root_groups.len(), 1);
        let outer = &builder.root_groups[0];
        assert_eq!(outer.group.id, "1");
        assert_eq!(member_ids(outer), vec!["group 2", "P3"]);
        match &outer.members[0] {
            GroupMember::Group(inner) => assert_eq!(member_ids(inner), vec!["P1", "P2"]),
            _ => panic!("expected nested group"),
        }
    }

    #[test]
    fn test_smaller_key_goes_outside() {
        let resources = IngestResources::new();
        let mut builder = ScoreBuilder::new(IngestSettings::default(), &resources);

        // Declared inner first, but its bracket is to the right
        builder.handle_part_group(&group_start("1", Some("-5"))).unwrap();
        builder.handle_part_group(&group_start("2", Some("-15"))).unwrap();
        assert_eq!(builder.open_groups[0].group.id, "2");
        assert_eq!(builder.open_groups[1].group.id, "1");

        builder.declare_part(&score_part("P1")).unwrap();
        assert_eq!(member_ids(&builder.open_groups[1]), vec!["P1"]);
    }

    #[test]
    fn test_implicit_group_and_unknown_stop() {
        let resources = IngestResources::new();
        let mut builder = ScoreBuilder::new(IngestSettings::default(), &resources);

        builder.declare_part(&score_part("P1")).unwrap();
        assert!(builder.open_groups[0].group.implicit);
        builder.declare_part(&score_part("P2")).unwrap();
        assert_eq!(builder.open_groups.len(), 1);
        assert_eq!(member_ids(&builder.open_groups[0]), vec!["P1", "P2"]);
        builder.handle_part_group(&group_stop("7")).unwrap();
        assert_eq!(builder.diagnostics.of_kind("part_group_not_open").count(), 1);

        builder.leave_part_list(&Element::new("part-list")).unwrap();
        assert_eq!(builder.root_groups.len(), 1);
        assert!(builder.root_groups[0].group.implicit);
        // The implicit group closes silently
        assert_eq!(builder.diagnostics.warnings().count(), 1);
    }
}
