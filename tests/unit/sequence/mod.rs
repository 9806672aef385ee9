use super::*;

#[test]
fn builtin_sequence_validates() {
    let s = Sequence::house_that_remembers().unwrap();
    assert_eq!(s.total(), TimeMs(60_000));
    assert_eq!(s.cutoff_at(), TimeMs(54_000));
    assert_eq!(s.scenes().len(), 3);
    assert_eq!(s.subtitles().len(), 9);
    assert_eq!(s.narration().len(), 9);
    assert_eq!(s.voice().lang, "hi-IN");
}

#[test]
fn subtitle_boundaries() {
    let s = Sequence::house_that_remembers().unwrap();
    let subs = s.subtitles();
    assert_eq!(subs.select_subtitle(TimeMs(20_000)), Some("Something wakes."));
    assert_eq!(
        subs.select_subtitle(TimeMs(22_000)),
        Some("The hallway exhales dust. The oil lamp starves.")
    );
    assert_eq!(subs.select_subtitle(TimeMs(59_999)), Some("There is no last step."));
    assert_eq!(subs.select_subtitle(TimeMs(60_000)), None);
}

#[test]
fn narration_lines_start_with_subtitles() {
    let s = Sequence::house_that_remembers().unwrap();
    let starts: Vec<TimeMs> = s.subtitles().iter().map(|c| c.start).collect();
    let lines: Vec<TimeMs> = s.narration().lines().iter().map(|l| l.start).collect();
    assert_eq!(starts, lines);
}

#[test]
fn json_round_trip_validates() {
    let s = Sequence::house_that_remembers().unwrap();
    let json = s.to_json_pretty().unwrap();
    let back = Sequence::from_json_str(&json).unwrap();
    assert_eq!(back, s);
}

#[test]
fn minimal_json_uses_defaults() {
    let json = r#"{
        "total": 3000,
        "cutoff_lead": 1000,
        "scenes": [{"range": {"start": 0, "end": 3000}, "kind": "stairwell"}]
    }"#;
    let s = Sequence::from_json_str(json).unwrap();
    assert_eq!(s.cutoff_at(), TimeMs(2_000));
    assert_eq!(s.title(), "");
    assert!(s.subtitles().is_empty());
    assert_eq!(s.audio(), &AudioScore::default());
}

#[test]
fn rejects_bad_definitions() {
    let mut def = SequenceDef::house_that_remembers();
    def.subtitles.swap(0, 1);
    let err = Sequence::new(def).unwrap_err();
    assert!(err.to_string().contains("sorted"));

    let mut def = SequenceDef::house_that_remembers();
    def.subtitles[1].start = TimeMs(7_000);
    assert!(Sequence::new(def).unwrap_err().to_string().contains("overlaps"));

    let mut def = SequenceDef::house_that_remembers();
    def.cutoff_lead = TimeMs(60_000);
    assert!(Sequence::new(def).is_err());

    let mut def = SequenceDef::house_that_remembers();
    def.cutoff_lead = TimeMs(6_000);
    def.total = TimeMs(0);
    assert!(Sequence::new(def).is_err());

    let mut def = SequenceDef::house_that_remembers();
    def.narration[3].start = TimeMs(1);
    assert!(Sequence::new(def).is_err());

    assert!(matches!(
        Sequence::from_json_str("{"),
        Err(TenebraError::Serde(_))
    ));
}

#[test]
fn reads_from_file() {
    let dir = std::env::temp_dir().join(format!("tenebra_seq_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("seq.json");
    let s = Sequence::house_that_remembers().unwrap();
    std::fs::write(&path, s.to_json_pretty().unwrap()).unwrap();
    assert_eq!(Sequence::from_path(&path).unwrap(), s);
    assert!(Sequence::from_path(&dir.join("missing.json")).is_err());
    let _ = std::fs::remove_dir_all(&dir);
}
