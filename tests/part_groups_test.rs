use xml2msr::score::{GroupSymbol, PartGroup, PartGroupElement};
use xml2msr::{ingest_musicxml, IngestResult};

fn with_part_list(part_list: &str, part_ids: &[&str]) -> String {
    let parts: String = part_ids
        .iter()
        .map(|id| format!(r#"<part id="{}"><measure number="1"/></part>"#, id))
        .collect();
    format!(
        "<score-partwise><part-list>{}</part-list>{}</score-partwise>",
        part_list, parts
    )
}

fn ingest(xml: &str) -> IngestResult {
    ingest_musicxml(xml, None).expect("ingestion should succeed")
}

fn part_ids(group: &PartGroup) -> Vec<&str> {
    group.parts().iter().map(|p| p.id.as_str()).collect()
}

fn subgroups(group: &PartGroup) -> Vec<&PartGroup> {
    group
        .elements
        .iter()
        .filter_map(|e| match e {
            PartGroupElement::Group(g) => Some(g),
            PartGroupElement::Part(_) => None,
        })
        .collect()
}

/// Parts outside any group land in one implicit group
#[test]
fn test_implicit_group() {
    let xml = with_part_list(
        r#"<score-part id="P1"><part-name>Flute</part-name></score-part>
           <score-part id="P2"><part-name>Oboe</part-name></score-part>"#,
        &["P1", "P2"],
    );

    let result = ingest(&xml);
    assert_eq!(result.score.part_groups.len(), 1);
    let group = &result.score.part_groups[0];
    assert!(group.implicit);
    assert_eq!(part_ids(group), vec!["P1", "P2"]);
    assert!(result.diagnostics.is_empty());
}

/// A wider bracket (smaller default-x) encloses a narrower one
#[test]
fn test_nested_groups_follow_bracket_order() {
    let xml = with_part_list(
        r#"<part-group type="start" number="1">
             <group-name>Strings</group-name>
             <group-symbol default-x="-15">bracket</group-symbol>
             <group-barline>yes</group-barline>
           </part-group>
           <part-group type="start" number="2">
             <group-symbol default-x="-8">brace</group-symbol>
           </part-group>
           <score-part id="V1"/>
           <score-part id="V2"/>
           <part-group type="stop" number="2"/>
           <score-part id="VA"/>
           <part-group type="stop" number="1"/>
           <score-part id="PF"/>"#,
        &["V1", "V2", "VA", "PF"],
    );

    let result = ingest(&xml);
    let roots = &result.score.part_groups;
    assert_eq!(roots.len(), 2);

    let strings = &roots[0];
    assert_eq!(strings.name.as_deref(), Some("Strings"));
    assert_eq!(strings.symbol, GroupSymbol::Bracket);
    assert!(strings.barline);
    assert_eq!(part_ids(strings), vec!["V1", "V2", "VA"]);

    let inner = subgroups(strings);
    assert_eq!(inner.len(), 1);
    assert_eq!(inner[0].symbol, GroupSymbol::Brace);
    assert_eq!(part_ids(inner[0]), vec!["V1", "V2"]);

    assert!(roots[1].implicit);
    assert_eq!(part_ids(&roots[1]), vec!["PF"]);
    assert_eq!(result.score.part_count(), 4);
}

/// Overlapping groups: the inner group is declared first in the file but
/// sits to the right of the outer bracket
#[test]
fn test_group_started_after_its_encloser() {
    let xml = with_part_list(
        r#"<part-group type="start" number="2">
             <group-symbol default-x="-6">brace</group-symbol>
           </part-group>
           <part-group type="start" number="1">
             <group-symbol default-x="-20">bracket</group-symbol>
           </part-group>
           <score-part id="A"/>
           <part-group type="stop" number="2"/>
           <score-part id="B"/>
           <part-group type="stop" number="1"/>"#,
        &["A", "B"],
    );

    let result = ingest(&xml);
    let roots = &result.score.part_groups;
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].symbol, GroupSymbol::Bracket);
    assert_eq!(part_ids(&roots[0]), vec!["A", "B"]);
    assert_eq!(part_ids(subgroups(&roots[0])[0]), vec!["A"]);
}

#[test]
fn test_group_diagnostics() {
    let xml = with_part_list(
        r#"<part-group type="stop" number="7"/>
           <part-group type="start" number="1"><group-symbol>zigzag</group-symbol></part-group>
           <score-part id="P1"/>
           <score-part id="P1"/>"#,
        &["P1"],
    );

    let result = ingest(&xml);
    assert_eq!(result.diagnostics.of_kind("part_group_not_open").count(), 1);
    assert_eq!(result.diagnostics.of_kind("unknown_group_symbol").count(), 1);
    assert_eq!(result.diagnostics.of_kind("duplicate_part_declaration").count(), 1);
    assert_eq!(result.diagnostics.of_kind("part_group_not_closed").count(), 1);
    assert_eq!(result.score.part_count(), 1);
}
