//! Score header: `<work>`, `<movement-*>` and `<identification>`

use super::builder::ScoreBuilder;
use super::dispatch::ElementKind;
use crate::score::Creator;
use crate::tree::Element;

fn owned(text: Option<&str>) -> Option<String> {
    text.map(str::to_string)
}

impl<'a> ScoreBuilder<'a> {
    pub(super) fn read_identification(&mut self, kind: ElementKind, element: &Element) {
        let id = &mut self.identification;
        match kind {
            ElementKind::Work => {
                id.work_number = owned(element.child_text("work-number"));
                id.work_title = owned(element.child_text("work-title"));
                id.opus = owned(element.child("opus").and_then(|o| o.attr("href")));
            }
            ElementKind::MovementNumber => id.movement_number = owned(element.text()),
            ElementKind::MovementTitle => id.movement_title = owned(element.text()),
            ElementKind::Identification => {
                for creator in element.children_named("creator") {
                    if let Some(name) = creator.text() {
                        id.creators.push(Creator {
                            kind: owned(creator.attr("type")),
                            name: name.to_string(),
                        });
                    }
                }
                id.rights
                    .extend(element.children_named("rights").filter_map(Element::text).map(str::to_string));
                if let Some(encoding) = element.child("encoding") {
                    id.software.extend(
                        encoding
                            .children_named("software")
                            .filter_map(Element::text)
                            .map(str::to_string),
                    );
                    id.encoding_date = owned(encoding.child_text("encoding-date"));
                }
                id.source = owned(element.child_text("source"));
            }
            _ => {}
        }
    }
}
