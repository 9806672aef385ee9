use super::*;

#[test]
fn default_score_validates() {
    AudioScore::default().validate().unwrap();
}

#[test]
fn heartbeat_interval_steps_in_two_tiers() {
    let score = AudioScore::default();
    let hb = score.heartbeat.as_ref().unwrap();
    assert_eq!(hb.interval_at(TimeMs(0)), TimeMs(1_200));
    assert_eq!(hb.interval_at(TimeMs(45_000)), TimeMs(1_200));
    assert_eq!(hb.interval_at(TimeMs(45_001)), TimeMs(700));
    assert_eq!(hb.interval_at(TimeMs(53_000)), TimeMs(700));
    assert_eq!(hb.interval_at(TimeMs(53_001)), TimeMs(420));
    assert_eq!(hb.interval_at(TimeMs(59_999)), TimeMs(420));
}

#[test]
fn unsorted_envelope_is_rejected() {
    let mut score = AudioScore::default();
    score.heartbeat.as_mut().unwrap().envelope.swap(1, 2);
    let err = score.validate().unwrap_err();
    assert!(err.to_string().contains("strictly increasing"));
}

#[test]
fn unsorted_one_shots_are_rejected() {
    let mut score = AudioScore::default();
    score.one_shots.reverse();
    assert!(score.validate().is_err());
}

#[test]
fn partial_json_fills_defaults() {
    let score: AudioScore = serde_json::from_str(r#"{"master_gain": 0.5}"#).unwrap();
    assert_eq!(score.master_gain, 0.5);
    assert_eq!(score.drones.len(), 3);
    assert_eq!(score.one_shots.len(), 4);
}

#[test]
fn crack_is_the_only_ducking_effect() {
    let score = AudioScore::default();
    let ducking: Vec<_> = score
        .one_shots
        .iter()
        .filter(|s| s.duck.is_some())
        .map(|s| s.at)
        .collect();
    assert_eq!(ducking, vec![TimeMs(32_000)]);
}
