//! Audio-graph capability used by the scheduler.
//!
//! All times handed to an engine are session-relative: an engine is opened at session start, so its
//! zero coincides with the session's `t0`.

use crate::foundation::core::TimeMs;
use crate::foundation::error::TenebraResult;

/// Handle to a node inside one engine instance. Ids are never reused within an engine.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct NodeId(pub u32);

/// Periodic waveform of a tone generator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Waveform {
    /// Pure sine.
    #[default]
    Sine,
    /// Symmetric triangle.
    Triangle,
    /// Naive square.
    Square,
}

/// Tone generator parameters.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OscillatorSpec {
    /// Waveform shape.
    pub waveform: Waveform,
    /// Base frequency.
    pub frequency_hz: f64,
    /// Detune in cents applied on top of `frequency_hz`.
    pub detune_cents: f64,
}

impl OscillatorSpec {
    /// A sine at `frequency_hz` with no detune.
    pub fn sine(frequency_hz: f64) -> Self {
        Self {
            waveform: Waveform::Sine,
            frequency_hz,
            detune_cents: 0.0,
        }
    }

    /// Frequency after detune.
    pub fn effective_hz(&self) -> f64 {
        self.frequency_hz * 2f64.powf(self.detune_cents / 1200.0)
    }
}

/// Mono white-noise buffer, optionally fading linearly to silence over its length.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct NoiseBufferSpec {
    /// Buffer length.
    pub duration: TimeMs,
    /// Seed for the deterministic noise generator.
    pub seed: u64,
    /// Fade amplitude from 1 to 0 across the buffer.
    pub taper: bool,
}

/// Biquad filter response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    /// Attenuate below cutoff.
    Highpass,
    /// Attenuate above cutoff.
    Lowpass,
}

/// Filter parameters.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FilterSpec {
    /// Response type.
    pub kind: FilterKind,
    /// Cutoff frequency.
    pub cutoff_hz: f64,
    /// Resonance.
    pub q: f64,
}

impl FilterSpec {
    /// Butterworth-Q high-pass at `cutoff_hz`.
    pub fn highpass(cutoff_hz: f64) -> Self {
        Self {
            kind: FilterKind::Highpass,
            cutoff_hz,
            q: std::f64::consts::FRAC_1_SQRT_2,
        }
    }
}

/// Where a node's output goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    /// The engine's output sink.
    Output,
    /// Signal input of another node.
    Node(NodeId),
    /// Added to the gain parameter of a gain node (modulation).
    GainParam(NodeId),
}

/// Shape of a gain automation step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RampKind {
    /// Jump to the value at the event time.
    Set,
    /// Exponential approach from the previous event, reaching the value at the event time.
    Exponential,
    /// Linear approach from the previous event, reaching the value at the event time.
    Linear,
}

/// One gain automation event.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GainEvent {
    /// Session-relative time the value is reached.
    pub at: TimeMs,
    /// Target value.
    pub value: f32,
    /// Approach shape.
    pub kind: RampKind,
}

impl GainEvent {
    /// `Set` event.
    pub fn set(at: TimeMs, value: f32) -> Self {
        Self {
            at,
            value,
            kind: RampKind::Set,
        }
    }

    /// `Exponential` event.
    pub fn exp(at: TimeMs, value: f32) -> Self {
        Self {
            at,
            value,
            kind: RampKind::Exponential,
        }
    }
}

/// Evaluate an automation lane at `t_ms`, falling back to `base` before the first event.
///
/// `events` must be sorted by time. Ramps interpolate from the previous event (or `base` at time
/// zero) to the ramp event; exponential ramps between values of different sign or touching zero
/// jump at the ramp end.
pub fn automation_value(base: f32, events: &[GainEvent], t_ms: f64) -> f32 {
    let next = events.partition_point(|e| (e.at.0 as f64) <= t_ms);
    let (prev_t, prev_v) = match next.checked_sub(1) {
        Some(i) => (events[i].at.0 as f64, events[i].value),
        None => (0.0, base),
    };
    let Some(target) = events.get(next) else {
        return prev_v;
    };
    let end_t = target.at.0 as f64;
    let span = end_t - prev_t;
    if span <= 0.0 {
        return prev_v;
    }
    let frac = ((t_ms - prev_t) / span).clamp(0.0, 1.0);
    match target.kind {
        RampKind::Set => prev_v,
        RampKind::Linear => prev_v + (target.value - prev_v) * frac as f32,
        RampKind::Exponential => {
            if prev_v == 0.0 || target.value == 0.0 || (prev_v > 0.0) != (target.value > 0.0) {
                return prev_v;
            }
            let ratio = f64::from(target.value) / f64::from(prev_v);
            (f64::from(prev_v) * ratio.powf(frac)) as f32
        }
    }
}

/// Audio-graph capability for one session.
///
/// Node creation never starts sound: sources (oscillators, noise buffers) play only between
/// [`AmbientSoundEngine::start`] and [`AmbientSoundEngine::stop`] (noise buffers also end on their
/// own). After [`AmbientSoundEngine::close`] every call fails with a capability error.
pub trait AmbientSoundEngine {
    /// Create a tone generator.
    fn oscillator(&mut self, spec: OscillatorSpec) -> TenebraResult<NodeId>;
    /// Create a one-shot noise buffer source.
    fn noise_buffer(&mut self, spec: NoiseBufferSpec) -> TenebraResult<NodeId>;
    /// Create a filter.
    fn filter(&mut self, spec: FilterSpec) -> TenebraResult<NodeId>;
    /// Create a gain node with a fixed base level.
    fn gain(&mut self, level: f32) -> TenebraResult<NodeId>;
    /// Route `from` into `to`.
    fn connect(&mut self, from: NodeId, to: Destination) -> TenebraResult<()>;
    /// Append automation events (sorted by time) to a gain node.
    fn automate(&mut self, gain: NodeId, events: &[GainEvent]) -> TenebraResult<()>;
    /// Drop automation events at or after `from`.
    fn cancel_automation(&mut self, gain: NodeId, from: TimeMs) -> TenebraResult<()>;
    /// Value of the gain parameter at `at` (automation only, without modulation inputs).
    fn gain_value(&self, gain: NodeId, at: TimeMs) -> TenebraResult<f32>;
    /// Start a source at `at`.
    fn start(&mut self, source: NodeId, at: TimeMs) -> TenebraResult<()>;
    /// Stop a source at `at`.
    fn stop(&mut self, source: NodeId, at: TimeMs) -> TenebraResult<()>;
    /// Disconnect and free a node. Unknown or already released nodes are ignored.
    fn release(&mut self, node: NodeId);
    /// Render (or account for) output up to `now`.
    fn advance(&mut self, now: TimeMs);
    /// Number of nodes currently allocated.
    fn live_nodes(&self) -> usize;
    /// Release all nodes and the output. Idempotent.
    fn close(&mut self);
    /// True once [`AmbientSoundEngine::close`] ran.
    fn is_closed(&self) -> bool;
}

/// Opens one [`AmbientSoundEngine`] per session.
pub trait AudioHost {
    /// Open an engine, or fail with a capability error if the host has no audio output.
    fn open(&mut self) -> TenebraResult<Box<dyn AmbientSoundEngine>>;
}

/// Host without audio output. Every session runs silent.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullHost;

impl AudioHost for NullHost {
    fn open(&mut self) -> TenebraResult<Box<dyn AmbientSoundEngine>> {
        Err(crate::foundation::error::TenebraError::capability(
            "no audio output available",
        ))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/engine.rs"]
mod tests;
