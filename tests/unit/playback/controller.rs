use super::*;
use crate::audio::recording::{GraphOp, OpLog, RecordingHost};
use crate::narration::voice::{SilentNarrator, Transcript, TranscriptNarrator, shared};
use crate::render::painter::RecordingPainter;
use crate::scenes::SceneKind;
use crate::timeline::clock::ManualClock;

struct Rig {
    clock: ManualClock,
    log: OpLog,
    transcript: Transcript,
    ctl: PlaybackController<ManualClock>,
    painter: RecordingPainter,
}

fn rig() -> Rig {
    let clock = ManualClock::new(TimeMs(5_000));
    let host = RecordingHost::new();
    let log = host.log();
    let narrator = TranscriptNarrator::new();
    let transcript = narrator.transcript();
    let opts = PlaybackOpts {
        viewport: Viewport::new(64, 36),
        ..PlaybackOpts::default()
    };
    let ctl = PlaybackController::new(
        clock.clone(),
        Sequence::house_that_remembers().unwrap(),
        Box::new(host),
        shared(narrator),
        opts,
    )
    .unwrap();
    Rig {
        clock,
        log,
        transcript,
        ctl,
        painter: RecordingPainter::new(64, 36),
    }
}

impl Rig {
    /// Advance in `step` increments until `until` ms after the session started, ticking and
    /// drawing a frame at each step.
    fn run_until(&mut self, until: u64, step: u64) -> Vec<FrameReport> {
        let mut out = Vec::new();
        let start = self.ctl.session().start_time();
        while self.clock.now().saturating_sub(start) < TimeMs(until) {
            self.clock.advance(TimeMs(step));
            self.ctl.tick();
            if let Some(r) = self.ctl.frame(&mut self.painter) {
                out.push(r);
            }
        }
        out
    }

    fn ended_events(&mut self) -> usize {
        self.ctl
            .drain_events()
            .iter()
            .filter(|e| matches!(e, SessionEvent::Ended { .. }))
            .count()
    }
}

#[test]
fn idle_controller_does_nothing() {
    let mut r = rig();
    assert!(r.ctl.tick().is_none());
    assert!(r.ctl.frame(&mut r.painter).is_none());
    assert!(r.ctl.elapsed().is_none());
    r.ctl.stop();
    assert!(r.ctl.drain_events().is_empty());
    assert!(r.log.is_empty());
}

#[test]
fn start_twice_is_a_noop() {
    let mut r = rig();
    r.ctl.start().unwrap();
    r.clock.advance(TimeMs(300));
    r.ctl.start().unwrap();
    assert_eq!(r.ctl.session().generation(), 1);
    assert_eq!(r.ctl.session().start_time(), TimeMs(5_000));
    assert_eq!(r.ctl.elapsed(), Some(TimeMs(300)));
    let opens = r.log.filter(|rec| matches!(rec.op, GraphOp::Open));
    assert_eq!(opens.len(), 1);
    let events = r.ctl.drain_events();
    assert_eq!(
        events,
        vec![SessionEvent::Started {
            generation: 1,
            at: TimeMs(5_000)
        }]
    );
}

#[test]
fn every_frame_before_the_end_selects_a_scene() {
    let mut r = rig();
    r.ctl.start().unwrap();
    let frames = r.run_until(60_000, 37);
    assert!(frames.len() > 1_000);
    for f in frames.iter().filter(|f| f.elapsed < TimeMs(60_000)) {
        assert!(f.scene_index.is_some(), "no scene at {}", f.elapsed);
    }
    let kinds: Vec<SceneKind> = frames.iter().filter_map(|f| f.scene).collect();
    assert!(kinds.contains(&SceneKind::ForestHouse));
    assert!(kinds.contains(&SceneKind::HallwayDoll));
    assert!(kinds.contains(&SceneKind::Stairwell));
}

#[test]
fn ended_fires_exactly_once() {
    let mut r = rig();
    r.ctl.start().unwrap();
    r.run_until(62_000, 16);
    assert!(r.ctl.session().is_ended());
    assert_eq!(r.ended_events(), 1);
    r.run_until(65_000, 16);
    assert_eq!(r.ended_events(), 0);
}

#[test]
fn end_poll_works_without_frames() {
    let mut r = rig();
    r.ctl.start().unwrap();
    let mut t = 0;
    while !r.ctl.session().is_ended() {
        r.clock.advance(TimeMs(50));
        t += 50;
        r.ctl.tick();
        assert!(t <= 60_300, "end not detected by {t}");
    }
    let ended: Vec<TimeMs> = r
        .ctl
        .drain_events()
        .into_iter()
        .filter_map(|e| match e {
            SessionEvent::Ended { elapsed } => Some(elapsed),
            _ => None,
        })
        .collect();
    assert_eq!(ended.len(), 1);
    assert!(ended[0] >= TimeMs(60_000) && ended[0] <= TimeMs(60_250));
}

#[test]
fn cutoff_is_sticky_and_blanks_the_stairwell() {
    let mut r = rig();
    r.ctl.start().unwrap();
    let frames = r.run_until(59_000, 20);
    let mut engaged = false;
    for f in &frames {
        if f.elapsed > TimeMs(54_000) {
            assert!(f.cutoff_active, "cutoff off at {}", f.elapsed);
            assert_eq!(f.scene, None);
            assert_eq!(f.drawn.scene_shapes, 0);
            assert_eq!(f.subtitle, None);
            engaged = true;
        } else {
            assert!(!f.cutoff_active);
            assert!(f.subtitle.is_some());
        }
    }
    assert!(engaged);
    let cutoffs = r
        .ctl
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, SessionEvent::CutoffEngaged { .. }))
        .count();
    assert_eq!(cutoffs, 1);
    assert_eq!(r.ctl.session().subtitle(), None);
}

#[test]
fn stop_mid_session_silences_everything() {
    let mut r = rig();
    r.ctl.start().unwrap();
    r.run_until(30_000, 25);
    r.ctl.stop();
    r.ctl.stop();
    let torn: Vec<usize> = r
        .ctl
        .drain_events()
        .into_iter()
        .filter_map(|e| match e {
            SessionEvent::TornDown { cancelled, .. } => Some(cancelled),
            _ => None,
        })
        .collect();
    // at least the heartbeat, three one-shots and four narration lines
    assert_eq!(torn.len(), 1);
    assert!(torn[0] >= 8, "only {} cancelled", torn[0]);

    let ops = r.log.len();
    let entries = r.transcript.len();
    let frames = r.run_until(70_000, 100);
    assert!(frames.is_empty());
    assert_eq!(r.log.len(), ops);
    assert_eq!(r.transcript.len(), entries);
    assert!(!r.ctl.session().holds_live_handles());
    assert!(!r.ctl.frame_loop().is_running());
}

#[test]
fn replay_mid_session_leaves_no_stale_events() {
    let mut r = rig();
    r.ctl.start().unwrap();
    r.run_until(33_000, 25);
    r.ctl.replay().unwrap();
    assert_eq!(r.ctl.session().generation(), 2);
    assert_eq!(r.ctl.elapsed(), Some(TimeMs::ZERO));
    let first_run_ops = r.log.filter(|rec| rec.session == 0).len();
    let spoken_before = r.transcript.spoken().len();

    r.run_until(10_000, 25);
    assert_eq!(r.log.filter(|rec| rec.session == 0).len(), first_run_ops);
    assert!(!r.log.filter(|rec| rec.session == 1).is_empty());
    // lines at 0 and 8000 of the second run only
    assert_eq!(r.transcript.spoken().len(), spoken_before + 2);
}

#[test]
fn replay_after_end_reproduces_the_run() {
    let mut r = rig();
    r.ctl.start().unwrap();
    let first: Vec<_> = r
        .run_until(61_000, 40)
        .into_iter()
        .map(|f| (f.elapsed, f.scene_index, f.subtitle, f.cutoff_active))
        .collect();
    assert!(r.ctl.session().is_ended());
    assert_eq!(r.ended_events(), 1);

    r.ctl.replay().unwrap();
    assert!(!r.ctl.session().is_ended());
    assert!(!r.ctl.session().cutoff_active());
    assert_eq!(r.ctl.session().subtitle(), None);
    assert_eq!(r.ctl.session().start_time(), r.clock.now());

    let second: Vec<_> = r
        .run_until(61_000, 40)
        .into_iter()
        .map(|f| (f.elapsed, f.scene_index, f.subtitle, f.cutoff_active))
        .collect();
    assert_eq!(first, second);
    assert_eq!(r.ended_events(), 1);
}

#[test]
fn handles_are_released_after_the_grace_period() {
    let mut r = rig();
    r.ctl.start().unwrap();
    r.run_until(60_000, 100);
    r.clock.advance(TimeMs(499));
    r.ctl.tick();
    assert!(r.ctl.session().holds_live_handles());
    r.clock.advance(TimeMs(1));
    r.ctl.tick();
    assert!(!r.ctl.session().holds_live_handles());
    assert_eq!(r.ctl.session().pending_events(), 0);
    let torn = r
        .ctl
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, SessionEvent::TornDown { elapsed, .. } if *elapsed == TimeMs(60_500)))
        .count();
    assert_eq!(torn, 1);
    // frames keep coming until the host stops or replays
    assert!(r.ctl.frame(&mut r.painter).is_some());
}

#[test]
fn narration_lines_are_spoken_in_order() {
    let mut r = rig();
    r.ctl.start().unwrap();
    r.run_until(61_000, 50);
    let expected: Vec<String> = r
        .ctl
        .sequence()
        .narration()
        .lines()
        .iter()
        .map(|l| l.text.clone())
        .collect();
    assert_eq!(r.transcript.spoken(), expected);
}

#[test]
fn heartbeat_nodes_stay_bounded() {
    let mut r = rig();
    r.ctl.start().unwrap();
    let mut peak = 0;
    let start = r.ctl.session().start_time();
    while r.clock.now().saturating_sub(start) < TimeMs(60_000) {
        r.clock.advance(TimeMs(10));
        r.ctl.tick();
        if let Some(audio) = r.ctl.session().audio() {
            peak = peak.max(audio.transient_nodes());
        }
    }
    assert!(peak > 0);
    assert!(peak <= 12, "peak transient nodes {peak}");
}

#[test]
fn missing_capabilities_degrade_quietly() {
    let clock = ManualClock::new(TimeMs::ZERO);
    let mut ctl = PlaybackController::new(
        clock.clone(),
        Sequence::house_that_remembers().unwrap(),
        Box::new(RecordingHost::unavailable()),
        shared(SilentNarrator),
        PlaybackOpts {
            viewport: Viewport::new(32, 18),
            ..PlaybackOpts::default()
        },
    )
    .unwrap();
    ctl.start().unwrap();
    let events = ctl.drain_events();
    assert!(events.iter().any(|e| matches!(e, SessionEvent::AudioUnavailable { .. })));
    assert!(events.iter().any(|e| matches!(e, SessionEvent::NarrationUnavailable { .. })));
    assert!(ctl.session().audio().is_none());
    assert!(ctl.session().narration().is_none());

    let mut painter = RecordingPainter::new(32, 18);
    clock.advance(TimeMs(1_000));
    assert_eq!(ctl.tick(), Some(TimeMs(1_000)));
    let frame = ctl.frame(&mut painter).unwrap();
    assert_eq!(frame.scene, Some(SceneKind::ForestHouse));
}

#[test]
fn halted_session_must_be_released_before_restart() {
    let mut r = rig();
    r.ctl.start().unwrap();
    r.run_until(1_000, 100);
    r.ctl.halt();
    assert!(r.ctl.frame(&mut r.painter).is_none());
    let err = r.ctl.start().unwrap_err();
    assert!(matches!(err, TenebraError::Lifecycle(_)));
    r.ctl.stop();
    r.ctl.start().unwrap();
    assert_eq!(r.ctl.session().generation(), 2);
}

#[test]
fn resize_follows_viewport_only_while_running() {
    let mut r = rig();
    assert_eq!(r.ctl.on_viewport_changed(Viewport::new(100, 50)), None);
    r.ctl.start().unwrap();
    assert_eq!(r.ctl.surface().width, 100);
    let s = r
        .ctl
        .on_viewport_changed(Viewport::new(100, 50).with_dpr(3.0))
        .unwrap();
    assert_eq!((s.width, s.height, s.dpr), (200, 100, 2.0));
    r.clock.advance(TimeMs(16));
    let frame = r.ctl.frame(&mut r.painter).unwrap();
    assert_eq!(frame.surface, s);
    r.ctl.stop();
    assert_eq!(r.ctl.on_viewport_changed(Viewport::new(10, 10)), None);
}

#[test]
fn opts_are_validated() {
    let bad = PlaybackOpts {
        poll_interval: TimeMs::ZERO,
        ..PlaybackOpts::default()
    };
    assert!(bad.validate().is_err());
    let bad = PlaybackOpts {
        dpr_cap: 0.5,
        ..PlaybackOpts::default()
    };
    assert!(bad.validate().is_err());
    assert!(PlaybackOpts::default().validate().is_ok());
}
