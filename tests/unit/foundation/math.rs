use super::*;

#[test]
fn hash_unit_is_deterministic_and_in_range() {
    for i in 0..1000 {
        let v = hash_unit(7, i, 3);
        assert!((0.0..1.0).contains(&v));
        assert_eq!(v, hash_unit(7, i, 3));
    }
}

#[test]
fn hash_unit_depends_on_every_input() {
    let base = hash_unit(1, 2, 3);
    assert_ne!(base, hash_unit(2, 2, 3));
    assert_ne!(base, hash_unit(1, 3, 3));
    assert_ne!(base, hash_unit(1, 2, 4));
}

#[test]
fn hash_unit_spreads_sequential_inputs() {
    let mean = (0..4096).map(|i| hash_unit(0, i, 0)).sum::<f64>() / 4096.0;
    assert!((mean - 0.5).abs() < 0.05, "mean={mean}");
    let c = hash_centered(0, 1, 1);
    assert!((-0.5..0.5).contains(&c));
}
