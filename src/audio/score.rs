//! Numeric parameters of the session soundtrack.

use crate::foundation::core::TimeMs;
use crate::foundation::error::{TenebraError, TenebraResult};

/// One continuous drone voice.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DroneSpec {
    /// Base frequency.
    pub frequency_hz: f64,
    /// Detune in cents.
    #[serde(default)]
    pub detune_cents: f64,
    /// Level of this voice before the master gain.
    pub gain: f32,
}

/// Slow oscillator modulating the master gain.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BreathSpec {
    /// LFO rate.
    pub frequency_hz: f64,
    /// Modulation depth added to the master gain parameter.
    pub depth: f32,
}

/// One envelope breakpoint, relative to the beat start.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EnvelopePoint {
    /// Offset from the beat.
    pub offset_ms: u64,
    /// Level reached at the offset.
    pub level: f32,
}

/// Interval applied once elapsed time passes `after`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PaceTier {
    /// Threshold. The first tier is the default and its threshold is ignored.
    pub after: TimeMs,
    /// Delay until the next beat.
    pub interval: TimeMs,
}

/// The self-rescheduling heartbeat.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HeartbeatSpec {
    /// Tone frequency.
    pub frequency_hz: f64,
    /// First beat offset from session start.
    #[serde(default)]
    pub first_at: TimeMs,
    /// Gain envelope of one beat. The first point is a set, the rest exponential ramps.
    pub envelope: Vec<EnvelopePoint>,
    /// When the beat's nodes are stopped and released.
    pub release_after: TimeMs,
    /// Stepped pacing, sorted by `after`.
    pub tiers: Vec<PaceTier>,
}

impl HeartbeatSpec {
    /// Delay before the next beat when the current one fires at `elapsed`.
    ///
    /// Tiers beyond the first apply strictly after their threshold.
    pub fn interval_at(&self, elapsed: TimeMs) -> TimeMs {
        let mut interval = self.tiers.first().map_or(TimeMs(1_200), |t| t.interval);
        for tier in self.tiers.iter().skip(1) {
            if elapsed > tier.after {
                interval = tier.interval;
            }
        }
        interval
    }
}

/// Filtered noise hit.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NoiseHitSpec {
    /// Buffer length.
    pub duration: TimeMs,
    /// Fade the buffer out linearly.
    #[serde(default)]
    pub taper: bool,
    /// High-pass cutoff.
    pub highpass_hz: f64,
    /// Output level.
    pub gain: f32,
}

/// Momentary dip of the master gain.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DuckSpec {
    /// Level ducked to.
    pub level: f32,
    /// Time to reach `level`.
    pub attack: TimeMs,
    /// Time to return to the master level.
    pub recover: TimeMs,
}

/// A fixed-offset effect.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OneShotSpec {
    /// Name used in logs and schedule dumps.
    pub name: String,
    /// Session offset.
    pub at: TimeMs,
    /// Sound.
    pub noise: NoiseHitSpec,
    /// Optional master duck.
    #[serde(default)]
    pub duck: Option<DuckSpec>,
}

/// Everything the audio scheduler plays during a session.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AudioScore {
    /// Master gain level.
    pub master_gain: f32,
    /// Continuous voices.
    pub drones: Vec<DroneSpec>,
    /// Master modulation.
    pub breath: Option<BreathSpec>,
    /// Heartbeat; `None` disables it.
    pub heartbeat: Option<HeartbeatSpec>,
    /// Fixed-offset effects, sorted by `at`.
    pub one_shots: Vec<OneShotSpec>,
}

impl Default for AudioScore {
    fn default() -> Self {
        let scrape = |at: u64| OneShotSpec {
            name: "scrape".to_string(),
            at: TimeMs(at),
            noise: NoiseHitSpec {
                duration: TimeMs(1_200),
                taper: true,
                highpass_hz: 4_000.0,
                gain: 0.18,
            },
            duck: None,
        };
        Self {
            master_gain: 0.8,
            drones: vec![
                DroneSpec {
                    frequency_hz: 48.0,
                    detune_cents: -8.0,
                    gain: 0.035,
                },
                DroneSpec {
                    frequency_hz: 56.0,
                    detune_cents: 6.0,
                    gain: 0.03,
                },
                DroneSpec {
                    frequency_hz: 32.0,
                    detune_cents: 0.0,
                    gain: 0.02,
                },
            ],
            breath: Some(BreathSpec {
                frequency_hz: 0.08,
                depth: 0.04,
            }),
            heartbeat: Some(HeartbeatSpec {
                frequency_hz: 60.0,
                first_at: TimeMs::ZERO,
                envelope: vec![
                    EnvelopePoint {
                        offset_ms: 0,
                        level: 0.0001,
                    },
                    EnvelopePoint {
                        offset_ms: 20,
                        level: 0.35,
                    },
                    EnvelopePoint {
                        offset_ms: 110,
                        level: 0.02,
                    },
                    EnvelopePoint {
                        offset_ms: 135,
                        level: 0.25,
                    },
                    EnvelopePoint {
                        offset_ms: 240,
                        level: 0.001,
                    },
                ],
                release_after: TimeMs(400),
                tiers: vec![
                    PaceTier {
                        after: TimeMs::ZERO,
                        interval: TimeMs(1_200),
                    },
                    PaceTier {
                        after: TimeMs(45_000),
                        interval: TimeMs(700),
                    },
                    PaceTier {
                        after: TimeMs(53_000),
                        interval: TimeMs(420),
                    },
                ],
            }),
            one_shots: vec![
                scrape(25_000),
                scrape(31_000),
                OneShotSpec {
                    name: "crack".to_string(),
                    at: TimeMs(32_000),
                    noise: NoiseHitSpec {
                        duration: TimeMs(80),
                        taper: true,
                        highpass_hz: 3_000.0,
                        gain: 0.8,
                    },
                    duck: Some(DuckSpec {
                        level: 0.05,
                        attack: TimeMs(20),
                        recover: TimeMs(1_000),
                    }),
                },
                scrape(34_000),
            ],
        }
    }
}

impl AudioScore {
    /// Check levels, envelope order, tier order and effect order.
    pub fn validate(&self) -> TenebraResult<()> {
        if !(self.master_gain.is_finite() && self.master_gain >= 0.0) {
            return Err(TenebraError::validation("master_gain must be finite and >= 0"));
        }
        for (i, d) in self.drones.iter().enumerate() {
            if !(d.frequency_hz.is_finite() && d.frequency_hz > 0.0) {
                return Err(TenebraError::validation(format!(
                    "drones[{i}].frequency_hz must be > 0"
                )));
            }
            if !(d.gain.is_finite() && d.gain >= 0.0) {
                return Err(TenebraError::validation(format!("drones[{i}].gain must be >= 0")));
            }
        }
        if let Some(b) = &self.breath
            && !(b.frequency_hz.is_finite() && b.frequency_hz > 0.0)
        {
            return Err(TenebraError::validation("breath.frequency_hz must be > 0"));
        }
        if let Some(hb) = &self.heartbeat {
            if hb.envelope.is_empty() {
                return Err(TenebraError::validation("heartbeat.envelope must be non-empty"));
            }
            if hb.envelope.windows(2).any(|w| w[0].offset_ms >= w[1].offset_ms) {
                return Err(TenebraError::validation(
                    "heartbeat.envelope offsets must be strictly increasing",
                ));
            }
            // Exponential ramps cannot reach or leave zero.
            if hb.envelope.iter().any(|p| !(p.level > 0.0)) {
                return Err(TenebraError::validation("heartbeat.envelope levels must be > 0"));
            }
            let tail = hb.envelope.last().map_or(0, |p| p.offset_ms);
            if hb.release_after.0 < tail {
                return Err(TenebraError::validation(
                    "heartbeat.release_after must not cut the envelope short",
                ));
            }
            if hb.tiers.is_empty() {
                return Err(TenebraError::validation("heartbeat.tiers must be non-empty"));
            }
            if hb.tiers.iter().any(|t| t.interval == TimeMs::ZERO) {
                return Err(TenebraError::validation("heartbeat tier intervals must be > 0"));
            }
            if hb.tiers.windows(2).any(|w| w[0].after >= w[1].after) {
                return Err(TenebraError::validation("heartbeat.tiers must be sorted"));
            }
        }
        if self.one_shots.windows(2).any(|w| w[0].at > w[1].at) {
            return Err(TenebraError::validation("one_shots must be sorted by offset"));
        }
        for s in &self.one_shots {
            if s.noise.duration == TimeMs::ZERO {
                return Err(TenebraError::validation(format!(
                    "one-shot '{}' has zero duration",
                    s.name
                )));
            }
            if !(s.noise.highpass_hz.is_finite() && s.noise.highpass_hz > 0.0) {
                return Err(TenebraError::validation(format!(
                    "one-shot '{}' highpass must be > 0",
                    s.name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/score.rs"]
mod tests;
