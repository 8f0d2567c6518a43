//! Enter/leave dispatch over the element tree
//!
//! The traversal is depth-first in document order. Each element name maps to
//! an [`ElementKind`]; the builder reacts on entering it (and decides whether
//! its children are visited) and again on leaving it.

use super::builder::ScoreBuilder;
use crate::errors::Result;
use crate::tree::Element;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    ScorePartwise,
    Work,
    MovementNumber,
    MovementTitle,
    Identification,
    PartList,
    PartGroup,
    ScorePart,
    Part,
    Measure,
    Attributes,
    Note,
    Backup,
    Forward,
    Barline,
    Direction,
    Sound,
    Harmony,
    FiguredBass,
    Print,
    Other,
}

impl ElementKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "score-partwise" => ElementKind::ScorePartwise,
            "work" => ElementKind::Work,
            "movement-number" => ElementKind::MovementNumber,
            "movement-title" => ElementKind::MovementTitle,
            "identification" => ElementKind::Identification,
            "part-list" => ElementKind::PartList,
            "part-group" => ElementKind::PartGroup,
            "score-part" => ElementKind::ScorePart,
            "part" => ElementKind::Part,
            "measure" => ElementKind::Measure,
            "attributes" => ElementKind::Attributes,
            "note" => ElementKind::Note,
            "backup" => ElementKind::Backup,
            "forward" => ElementKind::Forward,
            "barline" => ElementKind::Barline,
            "direction" => ElementKind::Direction,
            "sound" => ElementKind::Sound,
            "harmony" => ElementKind::Harmony,
            "figured-bass" => ElementKind::FiguredBass,
            "print" => ElementKind::Print,
            _ => ElementKind::Other,
        }
    }
}

/// Whether the traversal continues into an element's children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Descend {
    Children,
    Skip,
}

pub fn visit(builder: &mut ScoreBuilder<'_>, element: &Element) -> Result<()> {
    let kind = ElementKind::from_name(&element.name);

    if builder.enter(kind, element)? == Descend::Children {
        for child in &element.children {
            visit(builder, child)?;
        }
    }

    builder.leave(kind, element)
}

impl<'a> ScoreBuilder<'a> {
    fn enter(&mut self, kind: ElementKind, element: &Element) -> Result<Descend> {
        match kind {
            ElementKind::ScorePartwise | ElementKind::PartList => Ok(Descend::Children),
            ElementKind::Work | ElementKind::MovementNumber | ElementKind::MovementTitle | ElementKind::Identification => {
                self.read_identification(kind, element);
                Ok(Descend::Skip)
            }
            ElementKind::PartGroup => {
                self.handle_part_group(element)?;
                Ok(Descend::Skip)
            }
            ElementKind::ScorePart => {
                self.declare_part(element)?;
                Ok(Descend::Skip)
            }
            ElementKind::Part => {
                self.enter_part(element)?;
                Ok(Descend::Children)
            }
            ElementKind::Measure => {
                self.enter_measure(element)?;
                Ok(Descend::Children)
            }
            ElementKind::Attributes => {
                self.handle_attributes(element)?;
                Ok(Descend::Skip)
            }
            ElementKind::Note => {
                self.handle_note(element)?;
                Ok(Descend::Skip)
            }
            ElementKind::Backup => {
                self.handle_backup(element)?;
                Ok(Descend::Skip)
            }
            ElementKind::Forward => {
                self.enter_forward(element)?;
                Ok(Descend::Skip)
            }
            ElementKind::Barline => {
                self.handle_barline(element)?;
                Ok(Descend::Skip)
            }
            ElementKind::Direction => {
                self.handle_direction(element)?;
                Ok(Descend::Skip)
            }
            ElementKind::Sound => {
                self.handle_sound(element)?;
                Ok(Descend::Skip)
            }
            ElementKind::Harmony => {
                self.diagnostics.skipped(element.line, &element.name, "chord symbols are not ingested");
                Ok(Descend::Skip)
            }
            ElementKind::FiguredBass => {
                self.diagnostics.skipped(element.line, &element.name, "figured bass is not ingested");
                Ok(Descend::Skip)
            }
            ElementKind::Print => {
                self.diagnostics.skipped(element.line, &element.name, "layout hints are not ingested");
                Ok(Descend::Skip)
            }
            ElementKind::Other => {
                log::debug!("line {}: ignoring <{}>", element.line, element.name);
                Ok(Descend::Skip)
            }
        }
    }

    fn leave(&mut self, kind: ElementKind, element: &Element) -> Result<()> {
        match kind {
            ElementKind::PartList => self.leave_part_list(element),
            ElementKind::Part => self.leave_part(element),
            ElementKind::Measure => self.leave_measure(element),
            ElementKind::Forward => {
                self.leave_forward();
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_kinds() {
        assert_eq!(ElementKind::from_name("score-partwise"), ElementKind::ScorePartwise);
        assert_eq!(ElementKind::from_name("figured-bass"), ElementKind::FiguredBass);
        assert_eq!(ElementKind::from_name("part-group"), ElementKind::PartGroup);
        assert_eq!(ElementKind::from_name("defaults"), ElementKind::Other);
    }
}
