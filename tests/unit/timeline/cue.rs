use super::*;

fn captions() -> SubtitleTrack {
    CueTable::new(vec![
        Cue::new(8_000, 16_000, "A window blinks.".to_owned()),
        Cue::new(16_000, 22_000, "Something wakes.".to_owned()),
        Cue::new(22_000, 30_000, "The hallway exhales dust.".to_owned()),
        Cue::new(40_000, 51_000, "Steps retreat.".to_owned()),
    ])
    .unwrap()
}

#[test]
fn select_returns_cue_containing_elapsed() {
    let t = captions();
    assert_eq!(t.select_subtitle(TimeMs(20_000)), Some("Something wakes."));
    assert_eq!(t.select_subtitle(TimeMs(16_000)), Some("Something wakes."));
    assert_eq!(t.select_subtitle(TimeMs(21_999)), Some("Something wakes."));
}

#[test]
fn boundary_belongs_to_the_next_cue() {
    let t = captions();
    assert_eq!(
        t.select_subtitle(TimeMs(22_000)),
        Some("The hallway exhales dust.")
    );
}

#[test]
fn gaps_and_out_of_range_times_select_nothing() {
    let t = captions();
    assert_eq!(t.select_subtitle(TimeMs(0)), None);
    assert_eq!(t.select_subtitle(TimeMs(7_999)), None);
    assert_eq!(t.select_subtitle(TimeMs(30_000)), None);
    assert_eq!(t.select_subtitle(TimeMs(35_000)), None);
    assert_eq!(t.select_subtitle(TimeMs(51_000)), None);
    assert_eq!(t.select_subtitle(TimeMs(u64::MAX)), None);
}

#[test]
fn at_most_one_cue_is_active_everywhere() {
    let t = captions();
    for ms in (0..60_000).step_by(250) {
        let active = t.iter().filter(|c| c.range().contains(TimeMs(ms))).count();
        assert!(active <= 1);
        assert_eq!(active == 1, t.select(TimeMs(ms)).is_some());
    }
}

#[test]
fn overlapping_cues_are_rejected() {
    let err = CueTable::new(vec![Cue::new(0, 10, "a"), Cue::new(9, 20, "b")]).unwrap_err();
    assert!(err.to_string().contains("overlaps"));
}

#[test]
fn unsorted_and_empty_cues_are_rejected() {
    assert!(CueTable::new(vec![Cue::new(10, 20, "a"), Cue::new(0, 5, "b")]).is_err());
    assert!(CueTable::new(vec![Cue::new(10, 10, "a")]).is_err());
}

#[test]
fn empty_table_selects_nothing() {
    let t: CueTable<&str> = CueTable::new(vec![]).unwrap();
    assert!(t.is_empty());
    assert!(t.select(TimeMs(0)).is_none());
    assert_eq!(t.end(), TimeMs::ZERO);
}

#[test]
fn narration_script_requires_sorted_starts() {
    let line = |ms: u64| NarrationLine {
        start: TimeMs(ms),
        text: format!("line {ms}"),
    };
    assert!(NarrationScript::new(vec![line(0), line(8_000), line(8_000)]).is_ok());
    let err = NarrationScript::new(vec![line(8_000), line(0)]).unwrap_err();
    assert!(err.to_string().contains("sorted"));
}
