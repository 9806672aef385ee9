//! Tenebra plays a fixed-length procedural audiovisual sequence from one shared clock.
//!
//! A [`PlaybackController`] samples its [`Clock`] once per call and drives everything from that
//! sample:
//!
//! - the [`SceneRenderer`] picks one time-ranged scene and draws it with grain and vignette
//! - the subtitle track picks at most one caption
//! - the audio and narration sessions fire their deferred events
//!
//! Audio and speech sit behind capability traits ([`AudioHost`], [`SpeechNarrator`]) and degrade
//! independently when a backend is missing.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Ambient soundtrack scheduling and backends.
pub mod audio;
/// Spoken narration scheduling and backends.
pub mod narration;
/// Session lifecycle.
pub mod playback;
/// Painters, surfaces and the scene renderer.
pub mod render;
/// Built-in scene routines and the scene table.
pub mod scenes;
/// Sequence configuration.
pub mod sequence;
/// Clock, cue tables and deferred events.
pub mod timeline;

pub use crate::foundation::core::{Affine, BezPath, Point, Rect, Rgba8, TimeMs, TimeRange, Vec2};
pub use crate::foundation::error::{TenebraError, TenebraResult};

pub use crate::audio::engine::{AmbientSoundEngine, AudioHost, NullHost};
pub use crate::audio::mix::{MIX_SAMPLE_RATE, PcmCapture, write_mix_to_f32le_file};
pub use crate::audio::recording::{OpLog, RecordingHost};
pub use crate::audio::synth::{SynthHost, SynthOpts};
pub use crate::narration::command::CommandNarrator;
pub use crate::narration::voice::{
    SharedNarrator, SilentNarrator, SpeechNarrator, Transcript, TranscriptNarrator, VoiceSettings,
    shared,
};
pub use crate::playback::controller::{PlaybackController, PlaybackOpts};
pub use crate::playback::session::{FrameReport, PlaybackSession, SessionEvent};
pub use crate::render::cpu::{CpuPainter, FrameRGBA, write_png};
pub use crate::render::frame::{Look, SceneRenderer};
pub use crate::render::painter::{Painter, RecordingPainter};
pub use crate::render::surface::{Surface, Viewport};
pub use crate::scenes::{SceneDraw, SceneEntry, SceneKind, SceneTable};
pub use crate::sequence::{Sequence, SequenceDef};
pub use crate::timeline::clock::{Clock, ManualClock, SystemClock};
pub use crate::timeline::cue::{Cue, NarrationLine, SubtitleTrack};
