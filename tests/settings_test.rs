use std::io::Write;
use tempfile::NamedTempFile;
use xml2msr::score::Dynamics;
use xml2msr::{ingest_musicxml, IngestSettings};

const FORTE_BEFORE_REST: &str = r#"<score-partwise>
  <part-list><score-part id="P1"/></part-list>
  <part id="P1">
    <measure number="1">
      <attributes><divisions>1</divisions></attributes>
      <direction><direction-type><dynamics><f/></dynamics></direction-type></direction>
      <note><rest/><duration>2</duration></note>
      <note><pitch><step>G</step><octave>4</octave></pitch><duration>2</duration></note>
    </measure>
  </part>
</score-partwise>"#;

fn settings_file(content: &str, suffix: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// By default a rest takes the pending dynamics, with a warning
#[test]
fn test_rest_takes_attachments_by_default() {
    let result = ingest_musicxml(FORTE_BEFORE_REST, None).unwrap();
    let voice = result.score.find_part("P1").unwrap().voice(1, 1).unwrap();
    let notes: Vec<_> = voice.iter_notes().collect();

    assert_eq!(notes[0].attachments.dynamics, vec![Dynamics::F]);
    assert!(notes[1].attachments.is_empty());
    assert_eq!(result.diagnostics.of_kind("attachments_on_rest").count(), 1);
}

#[test]
fn test_yaml_settings_delay_attachments_past_rests() {
    let file = settings_file("delay_rests_attachments: true\ntrace_notes: true\n", ".yaml");
    let settings = IngestSettings::from_file(file.path()).unwrap();
    assert!(settings.trace_notes);

    let result = ingest_musicxml(FORTE_BEFORE_REST, Some(settings)).unwrap();
    let voice = result.score.find_part("P1").unwrap().voice(1, 1).unwrap();
    let notes: Vec<_> = voice.iter_notes().collect();

    assert!(notes[0].attachments.is_empty());
    assert_eq!(notes[1].attachments.dynamics, vec![Dynamics::F]);
    assert!(result.diagnostics.is_empty());
}

#[test]
fn test_json_settings_raise_voice_limit() {
    let xml = FORTE_BEFORE_REST.replace(
        "<duration>2</duration></note>\n    </measure>",
        "<duration>2</duration><voice>6</voice></note>\n    </measure>",
    );
    assert!(ingest_musicxml(&xml, None).is_err());

    let file = settings_file(r#"{"max_voice_number": 8}"#, ".json");
    let settings = IngestSettings::from_file(file.path()).unwrap();
    let result = ingest_musicxml(&xml, Some(settings)).unwrap();
    assert!(result.score.find_part("P1").unwrap().voice(1, 6).is_some());
}

#[test]
fn test_missing_settings_file() {
    let err = IngestSettings::from_file(std::path::Path::new("/nonexistent/xml2msr.yaml")).unwrap_err();
    assert!(err.to_string().starts_with("Failed to read settings file"));
}
