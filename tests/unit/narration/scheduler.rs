use super::*;
use crate::narration::voice::{SilentNarrator, SpeechNarrator, TranscriptNarrator, shared};
use std::cell::RefCell;
use std::rc::Rc;

fn script() -> NarrationScript {
    NarrationScript::new(
        [(0, "one"), (8_000, "two"), (16_000, "three")]
            .into_iter()
            .map(|(t, s)| NarrationLine {
                start: TimeMs(t),
                text: s.to_string(),
            })
            .collect(),
    )
    .unwrap()
}

#[test]
fn lines_fire_once_at_their_offsets() {
    let narrator = TranscriptNarrator::new();
    let transcript = narrator.transcript();
    let shared = shared(narrator);
    let mut s = NarrationScheduler::start(&shared, &script(), &VoiceSettings::default()).unwrap();
    // start clears the queue first
    assert_eq!(transcript.cancels(), 1);
    s.poll(TimeMs(0));
    s.poll(TimeMs(7_999));
    assert_eq!(transcript.spoken(), vec!["one"]);
    s.poll(TimeMs(20_000));
    s.poll(TimeMs(30_000));
    assert_eq!(transcript.spoken(), vec!["one", "two", "three"]);
    assert_eq!(s.spoken(), 3);
    assert_eq!(s.pending(), 0);
}

#[test]
fn utterances_carry_session_voice() {
    let narrator = TranscriptNarrator::new();
    let transcript = narrator.transcript();
    let voice = VoiceSettings {
        rate: 1.3,
        ..VoiceSettings::default()
    };
    let mut s = NarrationScheduler::start(&shared(narrator), &script(), &voice).unwrap();
    s.poll(TimeMs(9_000));
    for e in transcript.entries() {
        if let crate::narration::voice::TranscriptEntry::Spoke(u) = e {
            assert_eq!(u.voice, voice);
        }
    }
}

#[test]
fn teardown_cancels_pending_lines_and_speech() {
    let narrator = TranscriptNarrator::new();
    let transcript = narrator.transcript();
    let mut s = NarrationScheduler::start(&shared(narrator), &script(), &VoiceSettings::default())
        .unwrap();
    s.poll(TimeMs(100));
    assert_eq!(s.teardown(), 2);
    assert_eq!(s.teardown(), 0);
    assert_eq!(transcript.cancels(), 2);
    let before = transcript.len();
    s.poll(TimeMs(60_000));
    assert_eq!(transcript.len(), before);
}

#[test]
fn unavailable_speech_is_a_capability_error() {
    let err = NarrationScheduler::start(
        &shared(SilentNarrator),
        &script(),
        &VoiceSettings::default(),
    )
    .unwrap_err();
    assert!(err.is_degradable());
}

struct Flaky {
    calls: Rc<RefCell<usize>>,
}

impl SpeechNarrator for Flaky {
    fn is_available(&self) -> bool {
        true
    }

    fn speak(&mut self, _u: &Utterance) -> TenebraResult<()> {
        *self.calls.borrow_mut() += 1;
        if *self.calls.borrow() == 2 {
            return Err(TenebraError::synthesis("voice glitch"));
        }
        Ok(())
    }

    fn cancel(&mut self) {}
}

#[test]
fn failing_line_does_not_stop_later_lines() {
    let calls = Rc::new(RefCell::new(0));
    let narrator = shared(Flaky {
        calls: calls.clone(),
    });
    let mut s = NarrationScheduler::start(&narrator, &script(), &VoiceSettings::default()).unwrap();
    s.poll(TimeMs(60_000));
    assert_eq!(*calls.borrow(), 3);
    assert_eq!(s.spoken(), 2);
    assert_eq!(s.failures(), 1);
}

struct Pumped {
    pumps: Rc<RefCell<usize>>,
}

impl SpeechNarrator for Pumped {
    fn is_available(&self) -> bool {
        true
    }

    fn speak(&mut self, _u: &Utterance) -> TenebraResult<()> {
        Ok(())
    }

    fn pump(&mut self) {
        *self.pumps.borrow_mut() += 1;
    }

    fn cancel(&mut self) {}
}

#[test]
fn every_poll_pumps_queued_speech_until_teardown() {
    let pumps = Rc::new(RefCell::new(0));
    let narrator = shared(Pumped {
        pumps: pumps.clone(),
    });
    let mut s = NarrationScheduler::start(&narrator, &script(), &VoiceSettings::default()).unwrap();
    s.poll(TimeMs(0));
    s.poll(TimeMs(100));
    s.poll(TimeMs(200));
    assert_eq!(*pumps.borrow(), 3);
    s.teardown();
    s.poll(TimeMs(300));
    assert_eq!(*pumps.borrow(), 3);
}
