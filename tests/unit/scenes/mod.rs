use super::*;

fn entries() -> Vec<SceneEntry> {
    vec![
        SceneEntry::new(0, 20_000, SceneKind::ForestHouse),
        SceneEntry::new(20_000, 40_000, SceneKind::HallwayDoll),
        SceneEntry::new(40_000, 60_000, SceneKind::Stairwell).blank_on_cutoff(),
    ]
}

#[test]
fn every_instant_selects_exactly_one_scene() {
    let table = SceneTable::new(entries(), TimeMs(54_000), TimeMs(60_000)).unwrap();
    for t in (0..60_000).step_by(7) {
        let (i, e) = table.select(TimeMs(t)).unwrap();
        assert!(e.range.contains(TimeMs(t)));
        assert_eq!(i, (t / 20_000) as usize);
    }
    assert_eq!(table.select(TimeMs(19_999)).unwrap().1.kind, SceneKind::ForestHouse);
    assert_eq!(table.select(TimeMs(20_000)).unwrap().1.kind, SceneKind::HallwayDoll);
    assert_eq!(table.select(TimeMs(59_999)).unwrap().1.kind, SceneKind::Stairwell);
    assert!(table.select(TimeMs(60_000)).is_none());
}

#[test]
fn rejects_gaps_and_overlaps() {
    let mut gap = entries();
    gap[1].range.start = TimeMs(21_000);
    let err = SceneTable::new(gap, TimeMs(54_000), TimeMs(60_000)).unwrap_err();
    assert!(err.to_string().contains("gap"));

    let mut overlap = entries();
    overlap[1].range.start = TimeMs(19_000);
    let err = SceneTable::new(overlap, TimeMs(54_000), TimeMs(60_000)).unwrap_err();
    assert!(err.to_string().contains("overlaps"));

    let mut late = entries();
    late[0].range.start = TimeMs(5);
    assert!(SceneTable::new(late, TimeMs(54_000), TimeMs(60_000)).is_err());
}

#[test]
fn tail_gap_is_allowed_only_after_cutoff_threshold() {
    let mut short = entries();
    short[2].range.end = TimeMs(55_000);
    assert!(SceneTable::new(short.clone(), TimeMs(54_000), TimeMs(60_000)).is_ok());
    short[2].range.end = TimeMs(50_000);
    assert!(SceneTable::new(short, TimeMs(54_000), TimeMs(60_000)).is_err());
    let mut long = entries();
    long[2].range.end = TimeMs(61_000);
    assert!(SceneTable::new(long, TimeMs(54_000), TimeMs(60_000)).is_err());
}

#[test]
fn window_flicker_is_confined_to_its_window() {
    assert!(!window_lit(TimeMs(7_800)));
    assert!(!window_lit(TimeMs(12_000)));
    let lit = (7_801..10_800).filter(|&t| window_lit(TimeMs(t))).count();
    assert!(lit > 500 && lit < 2_500, "lit {lit}");
}

#[test]
fn doll_zoom_and_tilt() {
    assert_eq!(zoom_at(TimeMs(0)), 1.0);
    assert!((zoom_at(TimeMs(8_000)) - 1.1).abs() < 1e-9);
    assert!((zoom_at(TimeMs(19_999)) - 1.15).abs() < 1e-9);
    assert_eq!(head_tilt(TimeMs(9_000)), 0.0);
    assert!(head_tilt(TimeMs(12_000)).abs() > 0.0);
    assert!(head_tilt(TimeMs(15_000)).abs() <= 0.08);
}

#[test]
fn figure_flashes_for_120ms() {
    let visible = (9_000..11_000).filter(|&t| figure_visible(TimeMs(t))).count();
    assert_eq!(visible, 119);
}

#[test]
fn kinds_round_trip_by_name() {
    for kind in [SceneKind::ForestHouse, SceneKind::HallwayDoll, SceneKind::Stairwell] {
        let json = serde_json::to_string(&kind).unwrap();
        assert_eq!(json, format!("\"{}\"", kind.name()));
        let back: SceneKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, kind);
    }
}
