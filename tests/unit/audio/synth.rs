use super::*;

fn engine(capture: &PcmCapture) -> SynthEngine {
    SynthEngine::new(SynthOpts {
        sample_rate: 8_000,
        capture: Some(capture.clone()),
    })
    .unwrap()
}

#[test]
fn unstarted_source_renders_silence() {
    let cap = PcmCapture::new();
    let mut e = engine(&cap);
    let osc = e.oscillator(OscillatorSpec::sine(220.0)).unwrap();
    e.connect(osc, Destination::Output).unwrap();
    e.advance(TimeMs(100));
    assert_eq!(cap.len(), 800);
    assert_eq!(cap.peak_between(TimeMs(0), TimeMs(100), 8_000), 0.0);
}

#[test]
fn gain_scales_started_oscillator() {
    let cap = PcmCapture::new();
    let mut e = engine(&cap);
    let osc = e.oscillator(OscillatorSpec::sine(200.0)).unwrap();
    let g = e.gain(0.25).unwrap();
    e.connect(osc, Destination::Node(g)).unwrap();
    e.connect(g, Destination::Output).unwrap();
    e.start(osc, TimeMs(50)).unwrap();
    e.advance(TimeMs(200));
    assert_eq!(cap.peak_between(TimeMs(0), TimeMs(50), 8_000), 0.0);
    let peak = cap.peak_between(TimeMs(50), TimeMs(200), 8_000);
    assert!(peak > 0.2 && peak <= 0.25 + 1e-4, "peak {peak}");
}

#[test]
fn stop_silences_source() {
    let cap = PcmCapture::new();
    let mut e = engine(&cap);
    let osc = e.oscillator(OscillatorSpec::sine(200.0)).unwrap();
    e.connect(osc, Destination::Output).unwrap();
    e.start(osc, TimeMs(0)).unwrap();
    e.stop(osc, TimeMs(100)).unwrap();
    e.advance(TimeMs(300));
    assert!(cap.peak_between(TimeMs(0), TimeMs(100), 8_000) > 0.5);
    assert_eq!(cap.peak_between(TimeMs(100), TimeMs(300), 8_000), 0.0);
}

#[test]
fn noise_buffer_ends_on_its_own_and_tapers() {
    let cap = PcmCapture::new();
    let mut e = engine(&cap);
    let n = e
        .noise_buffer(NoiseBufferSpec {
            duration: TimeMs(100),
            seed: 7,
            taper: true,
        })
        .unwrap();
    e.connect(n, Destination::Output).unwrap();
    e.start(n, TimeMs(0)).unwrap();
    e.advance(TimeMs(200));
    let head = cap.peak_between(TimeMs(0), TimeMs(20), 8_000);
    let tail = cap.peak_between(TimeMs(90), TimeMs(100), 8_000);
    assert!(head > tail);
    assert_eq!(cap.peak_between(TimeMs(100), TimeMs(200), 8_000), 0.0);
}

#[test]
fn highpass_attenuates_low_tone() {
    let cap = PcmCapture::new();
    let mut e = engine(&cap);
    let osc = e.oscillator(OscillatorSpec::sine(40.0)).unwrap();
    let f = e.filter(FilterSpec::highpass(3_000.0)).unwrap();
    e.connect(osc, Destination::Node(f)).unwrap();
    e.connect(f, Destination::Output).unwrap();
    e.start(osc, TimeMs(0)).unwrap();
    e.advance(TimeMs(500));
    assert!(cap.peak_between(TimeMs(200), TimeMs(500), 8_000) < 0.05);
}

#[test]
fn gain_param_modulation_adds_to_level() {
    let cap = PcmCapture::new();
    let mut e = engine(&cap);
    let osc = e.oscillator(OscillatorSpec::sine(100.0)).unwrap();
    let master = e.gain(0.0).unwrap();
    let lfo_depth = e.gain(0.5).unwrap();
    let lfo = e
        .oscillator(OscillatorSpec {
            waveform: Waveform::Square,
            frequency_hz: 1.0,
            detune_cents: 0.0,
        })
        .unwrap();
    e.connect(osc, Destination::Node(master)).unwrap();
    e.connect(lfo, Destination::Node(lfo_depth)).unwrap();
    e.connect(lfo_depth, Destination::GainParam(master)).unwrap();
    e.connect(master, Destination::Output).unwrap();
    e.start(osc, TimeMs(0)).unwrap();
    e.start(lfo, TimeMs(0)).unwrap();
    e.advance(TimeMs(400));
    let peak = cap.peak_between(TimeMs(0), TimeMs(400), 8_000);
    assert!(peak > 0.4 && peak <= 0.5 + 1e-4, "peak {peak}");
}

#[test]
fn connect_rejects_cycles_and_unknown_nodes() {
    let cap = PcmCapture::new();
    let mut e = engine(&cap);
    let a = e.gain(1.0).unwrap();
    let b = e.gain(1.0).unwrap();
    e.connect(a, Destination::Node(b)).unwrap();
    let err = e.connect(b, Destination::Node(a)).unwrap_err();
    assert!(err.to_string().contains("cycle"));
    assert!(e.connect(a, Destination::Node(a)).is_err());
    assert!(e.connect(NodeId(99), Destination::Output).is_err());
}

#[test]
fn release_frees_nodes_and_is_idempotent() {
    let cap = PcmCapture::new();
    let mut e = engine(&cap);
    let osc = e.oscillator(OscillatorSpec::sine(100.0)).unwrap();
    let g = e.gain(1.0).unwrap();
    e.connect(osc, Destination::Node(g)).unwrap();
    e.connect(g, Destination::Output).unwrap();
    assert_eq!(e.live_nodes(), 2);
    e.release(osc);
    e.release(osc);
    assert_eq!(e.live_nodes(), 1);
    e.start(NodeId(1), TimeMs(0)).unwrap_err();
    e.advance(TimeMs(50));
    assert_eq!(cap.peak_between(TimeMs(0), TimeMs(50), 8_000), 0.0);
}

#[test]
fn closed_engine_reports_capability_errors() {
    let cap = PcmCapture::new();
    let mut e = engine(&cap);
    let g = e.gain(1.0).unwrap();
    e.close();
    e.close();
    assert!(e.is_closed());
    assert_eq!(e.live_nodes(), 0);
    let err = e.gain(1.0).unwrap_err();
    assert!(err.is_degradable());
    assert!(e.gain_value(g, TimeMs(0)).is_err());
    e.advance(TimeMs(1_000));
    assert!(cap.is_empty());
}

#[test]
fn advance_is_monotone() {
    let cap = PcmCapture::new();
    let mut e = engine(&cap);
    e.advance(TimeMs(100));
    e.advance(TimeMs(50));
    e.advance(TimeMs(100));
    assert_eq!(cap.len(), 800);
    assert_eq!(e.rendered_samples(), 800);
}

#[test]
fn host_opens_fresh_engines() {
    let mut host = SynthHost::default();
    let a = host.open().unwrap();
    assert_eq!(a.live_nodes(), 0);
    assert!(!a.is_closed());
}
