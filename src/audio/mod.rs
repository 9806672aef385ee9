//! Ambient soundtrack: graph capability, backends and the session scheduler.
//!
//! [`scheduler::AudioScheduler`] opens one [`engine::AmbientSoundEngine`] per session through an
//! [`engine::AudioHost`], starts the drones and breathing modulation, and fires the heartbeat and
//! one-shot effects from a [`crate::timeline::timers::TimerQueue`] whenever the controller polls it.

/// Capability traits and graph parameter types.
pub mod engine;
/// PCM capture and raw writers.
pub mod mix;
/// Logging backend for tests and schedule dumps.
pub mod recording;
/// Session scheduler and teardown handle.
pub mod scheduler;
/// Soundtrack parameters.
pub mod score;
/// CPU synthesis backend.
pub mod synth;
