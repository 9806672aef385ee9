use super::*;

fn lane() -> Vec<GainEvent> {
    vec![
        GainEvent::set(TimeMs(100), 0.0001),
        GainEvent::exp(TimeMs(120), 0.35),
        GainEvent::exp(TimeMs(280), 0.001),
    ]
}

#[test]
fn automation_holds_base_before_first_event() {
    let ev = lane();
    assert_eq!(automation_value(0.5, &ev, 0.0), 0.5);
    assert_eq!(automation_value(0.5, &ev, 99.0), 0.5);
}

#[test]
fn exponential_ramp_hits_endpoints_and_is_monotone() {
    let ev = lane();
    assert!((automation_value(0.5, &ev, 100.0) - 0.0001).abs() < 1e-7);
    assert!((automation_value(0.5, &ev, 120.0) - 0.35).abs() < 1e-5);
    let mut prev = 0.0;
    for t in 100..=120 {
        let v = automation_value(0.5, &ev, f64::from(t));
        assert!(v >= prev);
        prev = v;
    }
    assert!((automation_value(0.5, &ev, 10_000.0) - 0.001).abs() < 1e-7);
}

#[test]
fn exponential_ramp_through_zero_steps_at_end() {
    let ev = vec![GainEvent::set(TimeMs(0), 0.0), GainEvent::exp(TimeMs(10), 1.0)];
    assert_eq!(automation_value(0.0, &ev, 5.0), 0.0);
    assert_eq!(automation_value(0.0, &ev, 10.0), 1.0);
}

#[test]
fn linear_ramp_interpolates() {
    let ev = vec![GainEvent {
        at: TimeMs(100),
        value: 1.0,
        kind: RampKind::Linear,
    }];
    assert!((automation_value(0.0, &ev, 50.0) - 0.5).abs() < 1e-6);
}

#[test]
fn detune_is_applied_in_cents() {
    let spec = OscillatorSpec {
        waveform: Waveform::Sine,
        frequency_hz: 440.0,
        detune_cents: 1200.0,
    };
    assert!((spec.effective_hz() - 880.0).abs() < 1e-9);
}

#[test]
fn null_host_reports_missing_capability() {
    let err = NullHost.open().err().unwrap();
    assert!(err.is_degradable());
}
