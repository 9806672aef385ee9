//! Session lifecycle: start, per-frame sampling, end detection, cutoff and replay.

/// The controller and its knobs.
pub mod controller;
/// Session state, lifecycle events and frame reports.
pub mod session;
