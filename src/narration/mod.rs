//! Spoken narration: the speech capability, its backends and the session scheduler.

/// espeak process backend.
pub mod command;
/// Deferred speech requests and their teardown handle.
pub mod scheduler;
/// Capability trait, voice settings and headless backends.
pub mod voice;
