//! Shared clock, cue tables and the deferred-event queue every scheduler builds on.

/// Monotonic clocks (system and manual).
pub mod clock;
/// Subtitle cue tables and narration scripts.
pub mod cue;
/// Teardown handle shared by scheduler sessions.
pub mod handle;
/// Cancellable deferred events.
pub mod timers;
