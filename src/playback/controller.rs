use crate::audio::engine::AudioHost;
use crate::audio::scheduler::AudioScheduler;
use crate::foundation::core::TimeMs;
use crate::foundation::error::{TenebraError, TenebraResult};
use crate::narration::scheduler::NarrationScheduler;
use crate::narration::voice::SharedNarrator;
use crate::playback::session::{FrameReport, PlaybackSession, SessionEvent};
use crate::render::frame::SceneRenderer;
use crate::render::painter::Painter;
use crate::render::surface::{ResizeSubscription, Surface, Viewport};
use crate::sequence::Sequence;
use crate::timeline::clock::Clock;

/// Engine knobs that are not part of the sequence itself.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaybackOpts {
    /// How often the end-of-sequence check runs.
    pub poll_interval: TimeMs,
    /// Delay after the sequence end before audio and narration are released.
    pub teardown_grace: TimeMs,
    /// Upper bound on the device pixel ratio used for the surface.
    pub dpr_cap: f64,
    /// Seed for grain, noise buffers and scene jitter.
    pub seed: u64,
    /// Initial viewport.
    pub viewport: Viewport,
}

impl Default for PlaybackOpts {
    fn default() -> Self {
        Self {
            poll_interval: TimeMs(200),
            teardown_grace: TimeMs(500),
            dpr_cap: 2.0,
            seed: 0x7e4e_b7a0,
            viewport: Viewport::default(),
        }
    }
}

impl PlaybackOpts {
    /// Check knob ranges.
    pub fn validate(&self) -> TenebraResult<()> {
        if self.poll_interval == TimeMs::ZERO {
            return Err(TenebraError::validation("poll_interval must be > 0"));
        }
        if !self.dpr_cap.is_finite() || self.dpr_cap < 1.0 {
            return Err(TenebraError::validation("dpr_cap must be finite and >= 1"));
        }
        self.viewport.validate()
    }
}

/// Request handle of the per-frame loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameLoop {
    running: bool,
    frames: u64,
}

impl FrameLoop {
    fn request(&mut self) {
        self.running = true;
        self.frames = 0;
    }

    fn cancel(&mut self) {
        self.running = false;
    }

    fn next(&mut self) -> u64 {
        let n = self.frames;
        self.frames += 1;
        n
    }

    /// True while frames are being requested.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Frames produced since the loop was last requested.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

/// Drives one sequence from one clock.
///
/// Every decision of a [`tick`](Self::tick) or [`frame`](Self::frame) call is made against a
/// single clock sample taken at the top of the call: scene and subtitle selection, the cutoff,
/// the end check and the firing of deferred audio and narration events.
pub struct PlaybackController<C: Clock> {
    clock: C,
    sequence: Sequence,
    audio_host: Box<dyn AudioHost>,
    narrator: SharedNarrator,
    renderer: SceneRenderer,
    resize: ResizeSubscription,
    frame_loop: FrameLoop,
    opts: PlaybackOpts,
    session: PlaybackSession,
    generation: u32,
    events: Vec<SessionEvent>,
}

impl<C: Clock> std::fmt::Debug for PlaybackController<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackController")
            .field("title", &self.sequence.title())
            .field("session", &self.session)
            .field("frame_loop", &self.frame_loop)
            .field("surface", &self.resize.surface())
            .finish_non_exhaustive()
    }
}

impl<C: Clock> PlaybackController<C> {
    /// Idle controller. Nothing runs until [`start`](Self::start).
    pub fn new(
        clock: C,
        sequence: Sequence,
        audio_host: Box<dyn AudioHost>,
        narrator: SharedNarrator,
        opts: PlaybackOpts,
    ) -> TenebraResult<Self> {
        opts.validate()?;
        let renderer = SceneRenderer::new(
            sequence.scenes().clone(),
            sequence.look().clone(),
            opts.seed,
        );
        let resize = ResizeSubscription::new(opts.viewport, opts.dpr_cap);
        Ok(Self {
            clock,
            sequence,
            audio_host,
            narrator,
            renderer,
            resize,
            frame_loop: FrameLoop::default(),
            opts,
            session: PlaybackSession::default(),
            generation: 0,
            events: Vec::new(),
        })
    }

    /// Start a session. Does nothing if one is already running.
    ///
    /// Audio and narration degrade independently: if either cannot start, the session runs
    /// without it and an `*Unavailable` event is queued.
    #[tracing::instrument(skip(self))]
    pub fn start(&mut self) -> TenebraResult<()> {
        if self.session.is_started() {
            tracing::debug!("start ignored; session already running");
            return Ok(());
        }
        if self.session.holds_live_handles() {
            return Err(TenebraError::lifecycle(
                "previous session still holds audio or narration handles",
            ));
        }

        let now = self.clock.now();
        self.generation += 1;
        let mut session = PlaybackSession::begin(self.generation, now, self.opts.poll_interval);

        match AudioScheduler::start(self.audio_host.as_mut(), self.sequence.audio(), self.opts.seed)
        {
            Ok(audio) => session.audio = Some(audio),
            Err(e) => {
                tracing::warn!(error = %e, "audio unavailable; continuing without it");
                self.events.push(SessionEvent::AudioUnavailable {
                    reason: e.to_string(),
                });
            }
        }
        match NarrationScheduler::start(
            &self.narrator,
            self.sequence.narration(),
            self.sequence.voice(),
        ) {
            Ok(narration) => session.narration = Some(narration),
            Err(e) => {
                tracing::warn!(error = %e, "narration unavailable; continuing without it");
                self.events.push(SessionEvent::NarrationUnavailable {
                    reason: e.to_string(),
                });
            }
        }

        self.session = session;
        self.resize.subscribe();
        self.frame_loop.request();
        self.events.push(SessionEvent::Started {
            generation: self.generation,
            at: now,
        });
        tracing::info!(at = %now, "playback started");
        Ok(())
    }

    /// Pump deferred work against one clock sample. Returns that sample as elapsed time, or
    /// `None` when no session is running.
    pub fn tick(&mut self) -> Option<TimeMs> {
        if !self.session.is_started() {
            return None;
        }
        let elapsed = self.session.elapsed(self.clock.now());
        if !self.session.is_torn_down() {
            self.session.poll_handles(elapsed);
        }
        let total = self.sequence.total();
        if self.session.poll_end(elapsed, total, self.opts.poll_interval) {
            self.on_ended(elapsed);
        }
        if !self.session.is_torn_down() && elapsed >= total.saturating_add(self.opts.teardown_grace)
        {
            self.release_handles(elapsed);
        }
        Some(elapsed)
    }

    /// Draw one frame onto `painter`. Returns `None` when the frame loop is not running.
    ///
    /// `painter` should match [`surface`](Self::surface) in size.
    pub fn frame(&mut self, painter: &mut dyn Painter) -> Option<FrameReport> {
        if !self.session.is_started() || !self.frame_loop.is_running() {
            return None;
        }
        let elapsed = self.session.elapsed(self.clock.now());
        let frame = self.frame_loop.next();

        if self.session.engage_cutoff(elapsed, self.sequence.cutoff_at()) {
            tracing::info!(%elapsed, "visual cutoff engaged");
            self.events.push(SessionEvent::CutoffEngaged { elapsed });
        }
        let cutoff_active = self.session.cutoff_active();
        let surface = self.resize.surface();
        let drawn = self.renderer.draw(painter, elapsed, surface, cutoff_active);

        let subtitle = if cutoff_active {
            None
        } else {
            self.sequence
                .subtitles()
                .select_subtitle(elapsed)
                .map(str::to_string)
        };
        self.session.set_subtitle(subtitle.clone());

        if self.session.mark_ended(elapsed, self.sequence.total()) {
            self.on_ended(elapsed);
        }

        Some(FrameReport {
            generation: self.session.generation(),
            frame,
            elapsed,
            surface,
            scene_index: drawn.scene_index,
            scene: drawn.scene,
            subtitle,
            cutoff_active,
            ended: self.session.is_ended(),
            drawn,
        })
    }

    /// Halt the current session, release its handles and start again.
    #[tracing::instrument(skip(self))]
    pub fn replay(&mut self) -> TenebraResult<()> {
        self.halt();
        let elapsed = self.session.elapsed(self.clock.now());
        self.release_handles(elapsed);
        self.start()
    }

    /// End the session early. Safe to call at any time, any number of times.
    #[tracing::instrument(skip(self))]
    pub fn stop(&mut self) {
        self.halt();
        self.resize.unsubscribe();
        let elapsed = self.session.elapsed(self.clock.now());
        self.release_handles(elapsed);
    }

    /// Stop requesting frames without releasing audio or narration.
    ///
    /// A later [`start`](Self::start) fails until [`stop`](Self::stop) or
    /// [`replay`](Self::replay) releases the handles.
    pub fn halt(&mut self) {
        self.session.halt();
        self.frame_loop.cancel();
    }

    /// Forward a viewport change. Returns the new surface if the session re-synced it.
    pub fn on_viewport_changed(&mut self, viewport: Viewport) -> Option<Surface> {
        let surface = self.resize.viewport_changed(viewport);
        if let Some(s) = surface {
            tracing::debug!(width = s.width, height = s.height, dpr = s.dpr, "surface resized");
        }
        surface
    }

    /// Take every queued lifecycle event.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Elapsed time of the running session.
    pub fn elapsed(&self) -> Option<TimeMs> {
        self.session
            .is_started()
            .then(|| self.session.elapsed(self.clock.now()))
    }

    /// Current session state.
    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    /// The sequence being played.
    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    /// Current drawing surface.
    pub fn surface(&self) -> Surface {
        self.resize.surface()
    }

    /// Frame loop state.
    pub fn frame_loop(&self) -> FrameLoop {
        self.frame_loop
    }

    /// The clock.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Renderer, for swapping scene routines.
    pub fn renderer_mut(&mut self) -> &mut SceneRenderer {
        &mut self.renderer
    }

    /// Engine knobs.
    pub fn opts(&self) -> &PlaybackOpts {
        &self.opts
    }

    fn on_ended(&mut self, elapsed: TimeMs) {
        tracing::info!(%elapsed, "sequence ended");
        self.events.push(SessionEvent::Ended { elapsed });
    }

    fn release_handles(&mut self, elapsed: TimeMs) {
        if let Some(cancelled) = self.session.teardown_handles() {
            tracing::info!(%elapsed, cancelled, "session handles released");
            self.events.push(SessionEvent::TornDown { elapsed, cancelled });
        }
    }
}

impl<C: Clock> Drop for PlaybackController<C> {
    fn drop(&mut self) {
        self.session.teardown_handles();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/playback/controller.rs"]
mod tests;
