use crate::audio::engine::{
    AmbientSoundEngine, AudioHost, Destination, FilterSpec, GainEvent, NodeId, NoiseBufferSpec,
    OscillatorSpec,
};
use crate::audio::score::{AudioScore, DuckSpec, HeartbeatSpec, OneShotSpec};
use crate::foundation::core::TimeMs;
use crate::foundation::error::TenebraResult;
use crate::foundation::math::Fnv1a64;
use crate::timeline::handle::SessionHandle;
use crate::timeline::timers::{TimerId, TimerQueue};
use std::collections::BTreeSet;

/// One-shot nodes are released this long after their sound ends.
const ONE_SHOT_RELEASE_MARGIN: TimeMs = TimeMs(50);

/// Deferred audio work.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AudioCue {
    /// Play one heartbeat and schedule the next.
    Heartbeat,
    /// Free the transient nodes of an earlier beat or effect.
    Release(Vec<NodeId>),
    /// Fire `score.one_shots[i]`.
    OneShot(usize),
}

/// Counters for one audio session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct AudioStats {
    /// Continuous generators that started.
    pub generators: usize,
    /// Heartbeats played.
    pub beats: usize,
    /// One-shot effects played.
    pub one_shots: usize,
    /// Beats or effects that failed and were skipped.
    pub failures: usize,
    /// Highest number of transient nodes alive at once.
    pub peak_transient_nodes: usize,
}

/// Builds the ambient graph and schedules every timed sound for a session.
pub struct AudioScheduler;

impl AudioScheduler {
    /// Open an engine on `host`, start the continuous generators at session time zero and
    /// schedule the heartbeat and one-shot effects.
    ///
    /// Fails only when the host cannot open an engine or the master bus cannot be built. A failing
    /// drone or LFO is logged and skipped.
    #[tracing::instrument(skip(host, score))]
    pub fn start(
        host: &mut dyn AudioHost,
        score: &AudioScore,
        seed: u64,
    ) -> TenebraResult<AudioSession> {
        score.validate()?;
        let mut engine = host.open()?;
        let master = match build_master(engine.as_mut(), score.master_gain) {
            Ok(m) => m,
            Err(e) => {
                engine.close();
                return Err(e);
            }
        };

        let mut session = AudioSession {
            engine,
            score: score.clone(),
            seed,
            timers: TimerQueue::new(),
            master,
            generators: Vec::new(),
            fixed: vec![master],
            transient: BTreeSet::new(),
            heartbeat: None,
            last_elapsed: TimeMs::ZERO,
            torn_down: false,
            stats: AudioStats::default(),
        };

        for (i, drone) in score.drones.iter().enumerate() {
            let spec = OscillatorSpec {
                frequency_hz: drone.frequency_hz,
                detune_cents: drone.detune_cents,
                ..OscillatorSpec::sine(drone.frequency_hz)
            };
            if let Err(e) = session.add_generator(spec, drone.gain, Destination::Node(master)) {
                tracing::warn!(drone = i, error = %e, "drone unavailable");
            }
        }
        if let Some(breath) = &score.breath
            && let Err(e) = session.add_generator(
                OscillatorSpec::sine(breath.frequency_hz),
                breath.depth,
                Destination::GainParam(master),
            )
        {
            tracing::warn!(error = %e, "breathing modulation unavailable");
        }

        if let Some(hb) = &score.heartbeat {
            session.heartbeat = Some(session.timers.schedule_at(hb.first_at, AudioCue::Heartbeat));
        }
        for (i, shot) in score.one_shots.iter().enumerate() {
            session.timers.schedule_at(shot.at, AudioCue::OneShot(i));
        }

        tracing::info!(
            generators = session.stats.generators,
            pending = session.timers.len(),
            "audio session started"
        );
        Ok(session)
    }
}

fn build_master(engine: &mut dyn AmbientSoundEngine, level: f32) -> TenebraResult<NodeId> {
    let master = engine.gain(level)?;
    engine.connect(master, Destination::Output)?;
    Ok(master)
}

/// Live audio graph plus the deferred events of one session.
pub struct AudioSession {
    engine: Box<dyn AmbientSoundEngine>,
    score: AudioScore,
    seed: u64,
    timers: TimerQueue<AudioCue>,
    master: NodeId,
    generators: Vec<NodeId>,
    fixed: Vec<NodeId>,
    transient: BTreeSet<NodeId>,
    heartbeat: Option<TimerId>,
    last_elapsed: TimeMs,
    torn_down: bool,
    stats: AudioStats,
}

impl std::fmt::Debug for AudioSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioSession")
            .field("pending", &self.timers.len())
            .field("heartbeat", &self.heartbeat)
            .field("transient", &self.transient.len())
            .field("torn_down", &self.torn_down)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl AudioSession {
    /// Session counters.
    pub fn stats(&self) -> AudioStats {
        self.stats
    }

    /// Handle of the currently outstanding heartbeat, if any.
    pub fn heartbeat_timer(&self) -> Option<TimerId> {
        self.heartbeat
    }

    /// Transient (per-beat and per-effect) nodes currently alive.
    pub fn transient_nodes(&self) -> usize {
        self.transient.len()
    }

    /// Nodes the engine still holds.
    pub fn live_nodes(&self) -> usize {
        self.engine.live_nodes()
    }

    /// Due time of the next deferred event.
    pub fn next_due(&self) -> Option<TimeMs> {
        self.timers.next_due()
    }

    /// Pending events in firing order.
    pub fn scheduled(&self) -> Vec<(TimeMs, AudioCue)> {
        self.timers
            .iter()
            .map(|(_, due, cue)| (due, cue.clone()))
            .collect()
    }

    fn add_generator(
        &mut self,
        spec: OscillatorSpec,
        level: f32,
        to: Destination,
    ) -> TenebraResult<()> {
        let e = self.engine.as_mut();
        let osc = e.oscillator(spec)?;
        let gain = match e.gain(level) {
            Ok(g) => g,
            Err(err) => {
                e.release(osc);
                return Err(err);
            }
        };
        let wired = e
            .connect(osc, Destination::Node(gain))
            .and_then(|()| e.connect(gain, to))
            .and_then(|()| e.start(osc, TimeMs::ZERO));
        if let Err(err) = wired {
            e.release(osc);
            e.release(gain);
            return Err(err);
        }
        self.generators.push(osc);
        self.fixed.push(gain);
        self.stats.generators += 1;
        Ok(())
    }

    fn track_transient(&mut self, nodes: &[NodeId], release_at: TimeMs) {
        self.transient.extend(nodes.iter().copied());
        self.stats.peak_transient_nodes = self.stats.peak_transient_nodes.max(self.transient.len());
        self.timers
            .schedule_at(release_at, AudioCue::Release(nodes.to_vec()));
    }

    fn release_now(&mut self, nodes: &[NodeId]) {
        for &n in nodes {
            self.engine.release(n);
            self.transient.remove(&n);
        }
    }

    fn play_beat(&mut self, hb: &HeartbeatSpec, at: TimeMs) -> TenebraResult<()> {
        let mut created = Vec::with_capacity(2);
        let res = (|| -> TenebraResult<()> {
            let e = self.engine.as_mut();
            let osc = e.oscillator(OscillatorSpec::sine(hb.frequency_hz))?;
            created.push(osc);
            let gain = e.gain(0.0)?;
            created.push(gain);
            e.connect(osc, Destination::Node(gain))?;
            e.connect(gain, Destination::Node(self.master))?;
            let events: Vec<GainEvent> = hb
                .envelope
                .iter()
                .enumerate()
                .map(|(i, p)| {
                    let t = at.saturating_add(TimeMs(p.offset_ms));
                    if i == 0 {
                        GainEvent::set(t, p.level)
                    } else {
                        GainEvent::exp(t, p.level)
                    }
                })
                .collect();
            e.automate(gain, &events)?;
            e.start(osc, at)?;
            e.stop(osc, at.saturating_add(hb.release_after))?;
            Ok(())
        })();
        match res {
            Ok(()) => {
                self.track_transient(&created, at.saturating_add(hb.release_after));
                Ok(())
            }
            Err(e) => {
                self.release_now(&created);
                Err(e)
            }
        }
    }

    fn play_one_shot(&mut self, idx: usize, shot: &OneShotSpec, at: TimeMs) -> TenebraResult<()> {
        let mut h = Fnv1a64::new(self.seed);
        h.write_u64(idx as u64);
        h.write_u64(at.0);
        let noise_seed = h.finish();

        let mut created = Vec::with_capacity(3);
        let end = at.saturating_add(shot.noise.duration);
        let res = (|| -> TenebraResult<()> {
            let e = self.engine.as_mut();
            let src = e.noise_buffer(NoiseBufferSpec {
                duration: shot.noise.duration,
                seed: noise_seed,
                taper: shot.noise.taper,
            })?;
            created.push(src);
            let hp = e.filter(FilterSpec::highpass(shot.noise.highpass_hz))?;
            created.push(hp);
            let gain = e.gain(shot.noise.gain)?;
            created.push(gain);
            e.connect(src, Destination::Node(hp))?;
            e.connect(hp, Destination::Node(gain))?;
            e.connect(gain, Destination::Node(self.master))?;
            e.start(src, at)?;
            e.stop(src, end)?;
            Ok(())
        })();
        if let Err(e) = res {
            self.release_now(&created);
            return Err(e);
        }
        self.track_transient(&created, end.saturating_add(ONE_SHOT_RELEASE_MARGIN));

        // The sound is already playing; a failed duck only loses the envelope.
        if let Some(duck) = &shot.duck
            && let Err(e) = self.duck_master(duck, at)
        {
            tracing::warn!(name = %shot.name, error = %e, "master duck skipped");
        }
        Ok(())
    }

    fn duck_master(&mut self, duck: &DuckSpec, at: TimeMs) -> TenebraResult<()> {
        let e = self.engine.as_mut();
        let current = e.gain_value(self.master, at)?;
        e.cancel_automation(self.master, at)?;
        e.automate(
            self.master,
            &[
                GainEvent::set(at, current),
                GainEvent::exp(at.saturating_add(duck.attack), duck.level),
                GainEvent::exp(at.saturating_add(duck.recover), self.score.master_gain),
            ],
        )
    }

    fn fire(&mut self, cue: AudioCue, elapsed: TimeMs) {
        match cue {
            AudioCue::Heartbeat => {
                // Pacing is read from the firing sample, not the nominal due time.
                let Some(hb) = self.score.heartbeat.clone() else {
                    return;
                };
                match self.play_beat(&hb, elapsed) {
                    Ok(()) => {
                        self.stats.beats += 1;
                        tracing::debug!(at = %elapsed, "heartbeat");
                    }
                    Err(e) => {
                        self.stats.failures += 1;
                        tracing::warn!(at = %elapsed, error = %e, "heartbeat skipped");
                    }
                }
                let next = elapsed.saturating_add(hb.interval_at(elapsed));
                self.heartbeat = Some(self.timers.schedule_at(next, AudioCue::Heartbeat));
            }
            AudioCue::Release(nodes) => self.release_now(&nodes),
            AudioCue::OneShot(idx) => {
                let Some(shot) = self.score.one_shots.get(idx).cloned() else {
                    return;
                };
                match self.play_one_shot(idx, &shot, elapsed) {
                    Ok(()) => {
                        self.stats.one_shots += 1;
                        tracing::debug!(name = %shot.name, at = %elapsed, "one-shot");
                    }
                    Err(e) => {
                        self.stats.failures += 1;
                        tracing::warn!(name = %shot.name, error = %e, "one-shot skipped");
                    }
                }
            }
        }
    }
}

impl SessionHandle for AudioSession {
    fn poll(&mut self, elapsed: TimeMs) {
        if self.torn_down {
            return;
        }
        let elapsed = elapsed.max(self.last_elapsed);
        while let Some(fired) = self.timers.pop_due(elapsed) {
            if Some(fired.id) == self.heartbeat {
                self.heartbeat = None;
            }
            self.fire(fired.event, elapsed);
        }
        self.engine.advance(elapsed);
        self.last_elapsed = elapsed;
    }

    #[tracing::instrument(skip(self))]
    fn teardown(&mut self) -> usize {
        if self.torn_down {
            return 0;
        }
        self.torn_down = true;
        let cancelled = self.timers.cancel_all();
        self.heartbeat = None;
        let at = self.last_elapsed;
        for &g in &self.generators {
            if let Err(e) = self.engine.stop(g, at) {
                tracing::debug!(error = %e, "generator stop failed during teardown");
            }
        }
        let transient: Vec<NodeId> = self.transient.iter().copied().collect();
        self.release_now(&transient);
        for n in self.generators.drain(..).chain(self.fixed.drain(..)) {
            self.engine.release(n);
        }
        self.engine.close();
        tracing::info!(cancelled, "audio session torn down");
        cancelled
    }

    fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    fn pending(&self) -> usize {
        self.timers.len()
    }
}

impl Drop for AudioSession {
    fn drop(&mut self) {
        if !self.torn_down {
            self.teardown();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/scheduler.rs"]
mod tests;
