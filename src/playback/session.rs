use crate::audio::scheduler::AudioSession;
use crate::foundation::core::TimeMs;
use crate::narration::scheduler::NarrationSession;
use crate::render::frame::DrawnFrame;
use crate::render::surface::Surface;
use crate::scenes::SceneKind;
use crate::timeline::handle::SessionHandle;

/// Lifecycle state of the current run. Exactly one exists per controller.
#[derive(Debug, Default)]
pub struct PlaybackSession {
    generation: u32,
    started: bool,
    ended: bool,
    cutoff_active: bool,
    start: TimeMs,
    subtitle: Option<String>,
    next_end_poll: TimeMs,
    torn_down: bool,
    pub(crate) audio: Option<AudioSession>,
    pub(crate) narration: Option<NarrationSession>,
}

impl PlaybackSession {
    pub(crate) fn begin(generation: u32, start: TimeMs, poll_interval: TimeMs) -> Self {
        Self {
            generation,
            started: true,
            start,
            next_end_poll: poll_interval,
            ..Self::default()
        }
    }

    /// 1 for the first run, incremented by every start.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// True while the frame loop runs.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// True once elapsed time reached the sequence end.
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// True once the visual cutoff engaged.
    pub fn cutoff_active(&self) -> bool {
        self.cutoff_active
    }

    /// Clock reading at start.
    pub fn start_time(&self) -> TimeMs {
        self.start
    }

    /// Caption shown by the latest frame.
    pub fn subtitle(&self) -> Option<&str> {
        self.subtitle.as_deref()
    }

    /// Elapsed time for the clock reading `now`.
    pub fn elapsed(&self, now: TimeMs) -> TimeMs {
        now.saturating_sub(self.start)
    }

    /// Audio session, if audio started.
    pub fn audio(&self) -> Option<&AudioSession> {
        self.audio.as_ref()
    }

    /// Narration session, if speech started.
    pub fn narration(&self) -> Option<&NarrationSession> {
        self.narration.as_ref()
    }

    /// True while an audio or narration handle has not been torn down.
    pub fn holds_live_handles(&self) -> bool {
        self.audio.as_ref().is_some_and(|a| !a.is_torn_down())
            || self.narration.as_ref().is_some_and(|n| !n.is_torn_down())
    }

    /// Deferred audio and narration events still outstanding.
    pub fn pending_events(&self) -> usize {
        self.audio.as_ref().map_or(0, |a| a.pending())
            + self.narration.as_ref().map_or(0, |n| n.pending())
    }

    pub(crate) fn halt(&mut self) {
        self.started = false;
    }

    pub(crate) fn poll_handles(&mut self, elapsed: TimeMs) {
        if let Some(audio) = self.audio.as_mut() {
            audio.poll(elapsed);
        }
        if let Some(narration) = self.narration.as_mut() {
            narration.poll(elapsed);
        }
    }

    /// Tear down both handles. Returns `None` if this already happened.
    pub(crate) fn teardown_handles(&mut self) -> Option<usize> {
        if self.torn_down || self.generation == 0 {
            return None;
        }
        self.torn_down = true;
        let audio = self.audio.as_mut().map_or(0, |a| a.teardown());
        let narration = self.narration.as_mut().map_or(0, |n| n.teardown());
        Some(audio + narration)
    }

    pub(crate) fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Run the end poll if it is due. True if the session ended just now.
    pub(crate) fn poll_end(&mut self, elapsed: TimeMs, total: TimeMs, interval: TimeMs) -> bool {
        if self.ended || elapsed < self.next_end_poll {
            return false;
        }
        self.next_end_poll = elapsed.saturating_add(interval);
        self.mark_ended(elapsed, total)
    }

    pub(crate) fn mark_ended(&mut self, elapsed: TimeMs, total: TimeMs) -> bool {
        if self.ended || elapsed < total {
            return false;
        }
        self.ended = true;
        true
    }

    pub(crate) fn engage_cutoff(&mut self, elapsed: TimeMs, cutoff_at: TimeMs) -> bool {
        if self.cutoff_active || elapsed <= cutoff_at {
            return false;
        }
        self.cutoff_active = true;
        true
    }

    pub(crate) fn set_subtitle(&mut self, subtitle: Option<String>) {
        self.subtitle = subtitle;
    }
}

/// Observable lifecycle transitions, queued until drained.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A session started.
    Started {
        /// Session generation.
        generation: u32,
        /// Clock reading at start.
        at: TimeMs,
    },
    /// The visual cutoff engaged.
    CutoffEngaged {
        /// Elapsed time of the frame that engaged it.
        elapsed: TimeMs,
    },
    /// Elapsed time reached the sequence end.
    Ended {
        /// Elapsed time when it was noticed.
        elapsed: TimeMs,
    },
    /// Audio and narration handles were released.
    TornDown {
        /// Elapsed time of the teardown.
        elapsed: TimeMs,
        /// Deferred events that never fired.
        cancelled: usize,
    },
    /// The session runs without audio.
    AudioUnavailable {
        /// Why the audio graph could not be built.
        reason: String,
    },
    /// The session runs without narration.
    NarrationUnavailable {
        /// Why speech could not start.
        reason: String,
    },
}

/// What one frame showed.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct FrameReport {
    /// Session generation.
    pub generation: u32,
    /// Frame number within the session, starting at 0.
    pub frame: u64,
    /// Elapsed sample shared by every decision of the frame.
    pub elapsed: TimeMs,
    /// Surface the frame was drawn for.
    pub surface: Surface,
    /// Scene selected by time, drawn or not.
    pub scene_index: Option<usize>,
    /// Scene actually drawn.
    pub scene: Option<SceneKind>,
    /// Caption to show. Always `None` once the cutoff engaged.
    pub subtitle: Option<String>,
    /// Cutoff state after this frame.
    pub cutoff_active: bool,
    /// End state after this frame.
    pub ended: bool,
    /// Renderer output counters.
    pub drawn: DrawnFrame,
}
