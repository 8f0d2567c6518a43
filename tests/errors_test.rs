use xml2msr::{ingest_musicxml, IngestError, ParseError};

fn single_part(measure: &str) -> String {
    format!(
        r#"<score-partwise>
<part-list><score-part id="P1"/></part-list>
<part id="P1">
<measure number="1">
{}
</measure>
</part>
</score-partwise>"#,
        measure
    )
}

fn fatal(xml: &str) -> IngestError {
    ingest_musicxml(xml, None).expect_err("ingestion should fail")
}

#[test]
fn test_timewise_is_unsupported() {
    let err = fatal(r#"<score-timewise version="3.1"><part-list/></score-timewise>"#);
    assert!(matches!(err, IngestError::ParseError(ParseError::UnsupportedFormat(_))));
}

#[test]
fn test_malformed_document() {
    let err = fatal("<score-partwise><part-list></score-partwise>");
    assert!(matches!(err, IngestError::ParseError(ParseError::InvalidXml(_))));
}

#[test]
fn test_non_positive_divisions() {
    let xml = single_part("<attributes>\n<divisions>-2</divisions>\n</attributes>");
    let err = fatal(&xml);
    assert!(matches!(err, IngestError::Assertion { .. }));
    // <divisions> sits on line 6
    assert_eq!(err.line(), Some(6));
}

#[test]
fn test_voice_number_out_of_range() {
    let xml = single_part(
        "<note><pitch><step>C</step><octave>4</octave></pitch><duration>1</duration><voice>5</voice></note>",
    );
    assert!(matches!(fatal(&xml), IngestError::Assertion { .. }));
}

#[test]
fn test_non_positive_staff() {
    let xml = single_part(
        "<note><pitch><step>C</step><octave>4</octave></pitch><duration>1</duration><staff>0</staff></note>",
    );
    assert!(matches!(fatal(&xml), IngestError::Assertion { .. }));
}

#[test]
fn test_staff_number_beyond_u32() {
    let xml = single_part(
        "<note><pitch><step>C</step><octave>4</octave></pitch><duration>1</duration><staff>4294967297</staff></note>",
    );
    let err = fatal(&xml);
    assert!(matches!(err, IngestError::Assertion { .. }));
    assert!(err.to_string().contains("out of range"));
}

#[test]
fn test_rest_as_chord_member() {
    let xml = single_part(
        "<note><pitch><step>C</step><octave>4</octave></pitch><duration>1</duration></note>\
         <note><chord/><rest/><duration>1</duration></note>",
    );
    let err = fatal(&xml);
    assert!(matches!(err, IngestError::Internal { .. }));
    assert!(err.to_string().contains("chord member"));
}

#[test]
fn test_chord_on_top_of_rest() {
    let xml = single_part(
        "<note><rest/><duration>1</duration></note>\
         <note><chord/><pitch><step>E</step><octave>4</octave></pitch><duration>1</duration></note>",
    );
    let err = fatal(&xml);
    assert!(matches!(err, IngestError::Internal { .. }));
    assert!(err.to_string().contains("a rest cannot be a chord member"));
}

#[test]
fn test_chord_on_top_of_forward() {
    let xml = single_part(
        "<attributes><divisions>1</divisions></attributes>\
         <forward><duration>1</duration></forward>\
         <note><chord/><pitch><step>E</step><octave>4</octave></pitch><duration>1</duration></note>",
    );
    let err = fatal(&xml);
    assert!(matches!(err, IngestError::Internal { .. }));
    assert!(err.to_string().contains("a rest cannot be a chord member"));
}

#[test]
fn test_chord_member_without_preceding_note() {
    let xml = single_part("<note><chord/><pitch><step>C</step><octave>4</octave></pitch><duration>1</duration></note>");
    assert!(matches!(fatal(&xml), IngestError::Internal { .. }));
}

#[test]
fn test_undeclared_part() {
    let xml = r#"<score-partwise>
<part-list><score-part id="P1"/></part-list>
<part id="P2"><measure number="1"/></part>
</score-partwise>"#;
    let err = fatal(xml);
    assert!(matches!(err, IngestError::Internal { line: 3, .. }));
}

#[test]
fn test_missing_octave() {
    let xml = single_part("<note><pitch><step>C</step></pitch><duration>1</duration></note>");
    assert!(matches!(
        fatal(&xml),
        IngestError::ParseError(ParseError::MissingRequiredElement { .. })
    ));
}

/// Unknown enumerated values are reported and replaced, never fatal
#[test]
fn test_unknown_values_are_not_fatal() {
    let xml = single_part(
        r#"<attributes><divisions>1</divisions><clef><sign>Q</sign></clef><key><fifths>1</fifths><mode>hypo</mode></key></attributes>
<note><pitch><step>C</step><octave>4</octave></pitch><duration>4</duration><type>huge</type>
<notations><articulations><wobble/></articulations></notations></note>"#,
    );
    let result = ingest_musicxml(&xml, None).unwrap();
    for kind in ["unknown_clef_sign", "unknown_key_mode", "unknown_note_type", "unknown_articulation"] {
        assert_eq!(result.diagnostics.of_kind(kind).count(), 1, "{}", kind);
    }
    assert_eq!(result.score.find_part("P1").unwrap().voice(1, 1).unwrap().note_count(), 1);
}

#[test]
fn test_position_overflow() {
    let huge = "<note><pitch><step>C</step><octave>4</octave></pitch><duration>9223372036854775807</duration></note>";
    let xml = single_part(&format!("<attributes><divisions>1</divisions></attributes>\n{}{}", huge, huge));
    let err = fatal(&xml);
    assert!(matches!(err, IngestError::Assertion { .. }));
    assert!(err.to_string().contains("overflows"));
}
