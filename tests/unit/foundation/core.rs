use super::*;

#[test]
fn time_range_contains_boundaries() {
    let r = TimeRange::ms(16_000, 22_000).unwrap();
    assert!(!r.contains(TimeMs(15_999)));
    assert!(r.contains(TimeMs(16_000)));
    assert!(r.contains(TimeMs(21_999)));
    assert!(!r.contains(TimeMs(22_000)));
}

#[test]
fn time_range_rejects_inverted_bounds() {
    assert!(TimeRange::ms(10, 5).is_err());
    assert!(TimeRange::ms(5, 5).unwrap().is_empty());
}

#[test]
fn adjacent_ranges_do_not_overlap() {
    let a = TimeRange::ms(0, 20_000).unwrap();
    let b = TimeRange::ms(20_000, 40_000).unwrap();
    assert!(!a.overlaps(b));
    assert!(a.overlaps(TimeRange::ms(19_999, 20_001).unwrap()));
}

#[test]
fn time_ms_subtraction_saturates() {
    assert_eq!(TimeMs(5).saturating_sub(TimeMs(10)), TimeMs::ZERO);
    assert_eq!(TimeMs::from_secs(60), TimeMs(60_000));
}

#[test]
fn hex_colors_parse_with_and_without_alpha() {
    assert_eq!(Rgba8::from_hex("#060606").unwrap(), Rgba8::rgb(6, 6, 6));
    assert_eq!(
        Rgba8::from_hex("#dc1e1ee6").unwrap(),
        Rgba8 {
            r: 220,
            g: 30,
            b: 30,
            a: 230
        }
    );
    assert!(Rgba8::from_hex("060606").is_err());
    assert!(Rgba8::from_hex("#06").is_err());
}

#[test]
fn premultiply_scales_color_channels() {
    assert_eq!(Rgba8::rgba(255, 0, 0, 0.5).to_premul(), [128, 0, 0, 128]);
    assert_eq!(Rgba8::transparent().to_premul(), [0, 0, 0, 0]);
}
