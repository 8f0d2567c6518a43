use xml2msr::score::{BarlineCategory, Repeat, RepeatEndingKind, Voice, VoiceElement};
use xml2msr::{ingest_musicxml, IngestResult};

fn two_parts(measures: &str) -> String {
    format!(
        r#"<score-partwise>
  <part-list><score-part id="P1"/></part-list>
  <part id="P1">
    <measure number="1">
      <attributes><divisions>1</divisions></attributes>
      <note><pitch><step>C</step><octave>4</octave></pitch><duration>4</duration><voice>1</voice></note>
      <backup><duration>4</duration></backup>
      <note><pitch><step>C</step><octave>3</octave></pitch><duration>4</duration><voice>2</voice></note>
    </measure>
{}
  </part>
</score-partwise>"#,
        measures
    )
}

fn whole(step: &str) -> String {
    format!(
        "<note><pitch><step>{}</step><octave>4</octave></pitch><duration>4</duration></note>",
        step
    )
}

fn ingest(xml: &str) -> IngestResult {
    ingest_musicxml(xml, None).expect("ingestion should succeed")
}

fn repeats(voice: &Voice) -> Vec<&Repeat> {
    voice.repeats().collect()
}

fn first_barline_category(elements: &[VoiceElement]) -> Option<BarlineCategory> {
    match elements.first() {
        Some(VoiceElement::Barline(barline)) => Some(barline.category),
        _ => None,
    }
}

/// |: m2 | 1. m3 :| 2. m4 | m5
#[test]
fn test_repeat_with_two_endings() {
    let xml = two_parts(&format!(
        r#"<measure number="2">
  <barline location="left"><bar-style>heavy-light</bar-style><repeat direction="forward"/></barline>
  {}
</measure>
<measure number="3">
  <barline location="left"><ending number="1" type="start"/></barline>
  {}
  <barline location="right"><bar-style>light-heavy</bar-style><ending number="1" type="stop"/><repeat direction="backward"/></barline>
</measure>
<measure number="4">
  <barline location="left"><ending number="2" type="start"/></barline>
  {}
  <barline location="right"><ending number="2" type="discontinue"/></barline>
</measure>
<measure number="5">{}</measure>"#,
        whole("D"),
        whole("E"),
        whole("F"),
        whole("G"),
    ));

    let result = ingest(&xml);
    let part = result.score.find_part("P1").unwrap();

    // Voice 2 only sounds in measure 1 but still carries the structure
    for voice in part.voices() {
        let found = repeats(voice);
        assert_eq!(found.len(), 1, "voice {}", voice.number);
        let repeat = found[0];
        assert!(repeat.explicit_start);
        assert_eq!(first_barline_category(&repeat.common_part.elements), Some(BarlineCategory::RepeatStart));
        assert_eq!(repeat.endings.len(), 2);
        assert_eq!(repeat.endings[0].numbers, vec![1]);
        assert_eq!(repeat.endings[0].kind, RepeatEndingKind::Hooked);
        assert_eq!(repeat.endings[1].numbers, vec![2]);
        assert_eq!(repeat.endings[1].kind, RepeatEndingKind::Hookless);
    }

    let voice = part.voice(1, 1).unwrap();
    let repeat = repeats(voice)[0];
    assert_eq!(repeat.common_part.elements.iter().filter(|e| matches!(e, VoiceElement::Note(_))).count(), 1);
    assert_eq!(voice.note_count(), 5);

    // Measure 5 follows the repeat as ordinary content
    let after: Vec<_> = voice
        .elements
        .iter()
        .skip_while(|e| !matches!(e, VoiceElement::Repeat(_)))
        .skip(1)
        .collect();
    assert!(after.iter().any(|e| matches!(e, VoiceElement::Note(_))));
    assert!(matches!(after.last(), Some(VoiceElement::BarCheck { next_measure_number: None })));

    assert!(result.diagnostics.of_kind("unterminated_repeat").next().is_none());
}

/// A backward repeat with no forward repeat before it repeats from the start
#[test]
fn test_missing_repeat_start_is_synthesized() {
    let xml = two_parts(&format!(
        r#"<measure number="2">
  {}
  <barline location="right"><bar-style>light-heavy</bar-style><repeat direction="backward" times="3"/></barline>
</measure>"#,
        whole("D"),
    ));

    let result = ingest(&xml);
    let voice = result.score.find_part("P1").unwrap().voice(1, 1).unwrap();
    let repeat = repeats(voice)[0];

    assert!(!repeat.explicit_start);
    assert_eq!(repeat.times, Some(3));
    match repeat.common_part.elements.first() {
        Some(VoiceElement::Barline(barline)) => {
            assert!(barline.implicit);
            assert_eq!(barline.category, BarlineCategory::RepeatStart);
            // Stamped with the measure the repeated body starts in
            assert_eq!(barline.measure_number, "1");
        }
        other => panic!("expected the synthesized repeat start, got {:?}", other),
    }
    // Both measures are repeated
    assert_eq!(voice.note_count(), 2);
    assert!(voice.elements.iter().all(|e| !matches!(e, VoiceElement::Note(_))));
}

/// |: m2 | m3 :| with no endings
#[test]
fn test_plain_repeat_has_no_endings() {
    let xml = two_parts(&format!(
        r#"<measure number="2">
  <barline location="left"><bar-style>heavy-light</bar-style><repeat direction="forward"/></barline>
  {}
</measure>
<measure number="3">
  {}
  <barline location="right"><bar-style>light-heavy</bar-style><repeat direction="backward"/></barline>
</measure>
<measure number="4">
  {}
</measure>"#,
        whole("D"),
        whole("E"),
        whole("F"),
    ));

    let result = ingest(&xml);
    let voice = result.score.find_part("P1").unwrap().voice(1, 1).unwrap();
    let found = repeats(voice);
    assert_eq!(found.len(), 1);

    let repeat = found[0];
    assert!(repeat.explicit_start);
    assert!(repeat.endings.is_empty());
    assert_eq!(first_barline_category(&repeat.common_part.elements), Some(BarlineCategory::RepeatStart));
    assert!(repeat
        .common_part
        .elements
        .iter()
        .all(|e| !matches!(e, VoiceElement::Barline(b) if b.implicit)));
    assert_eq!(
        repeat.common_part.elements.iter().filter(|e| matches!(e, VoiceElement::Note(_))).count(),
        2
    );
    assert!(result.diagnostics.of_kind("unterminated_repeat").next().is_none());
}

#[test]
fn test_unterminated_repeat_is_closed_at_part_end() {
    let xml = two_parts(&format!(
        r#"<measure number="2">
  <barline location="left"><repeat direction="forward"/></barline>
  {}
</measure>"#,
        whole("D"),
    ));

    let result = ingest(&xml);
    assert_eq!(result.diagnostics.of_kind("unterminated_repeat").count(), 1);

    let voice = result.score.find_part("P1").unwrap().voice(1, 1).unwrap();
    let repeat = repeats(voice)[0];
    assert!(repeat.explicit_start);
    assert!(repeat.endings.is_empty());
    assert_eq!(repeat.common_part.elements.iter().filter(|e| matches!(e, VoiceElement::Note(_))).count(), 1);
}

#[test]
fn test_standalone_barline_stays_in_place() {
    let xml = two_parts(&format!(
        r#"<measure number="2">
  {}
  <barline location="right"><bar-style>light-light</bar-style></barline>
</measure>"#,
        whole("D"),
    ));

    let result = ingest(&xml);
    let voice = result.score.find_part("P1").unwrap().voice(1, 1).unwrap();
    assert_eq!(repeats(voice).len(), 0);
    assert!(voice
        .elements
        .iter()
        .any(|e| matches!(e, VoiceElement::Barline(b) if b.category == BarlineCategory::Standalone)));
}

#[test]
fn test_unknown_bar_style_is_reported() {
    let xml = two_parts(
        r#"<measure number="2">
  <barline location="right"><bar-style>wavy</bar-style></barline>
</measure>"#,
    );

    let result = ingest(&xml);
    assert_eq!(result.diagnostics.of_kind("unknown_bar_style").count(), 1);
    assert!(result.diagnostics.has_errors());
}
