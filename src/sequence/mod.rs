//! Sequence configuration: what plays when.

mod builtin;

use std::path::Path;

use crate::audio::score::AudioScore;
use crate::foundation::core::TimeMs;
use crate::foundation::error::{TenebraError, TenebraResult};
use crate::narration::voice::VoiceSettings;
use crate::render::frame::Look;
use crate::scenes::{SceneEntry, SceneTable};
use crate::timeline::cue::{Cue, NarrationLine, NarrationScript, SubtitleTrack};

fn default_cutoff_lead() -> TimeMs {
    TimeMs(6_000)
}

/// Serialized form of a sequence.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SequenceDef {
    /// Display title.
    #[serde(default)]
    pub title: String,
    /// Total duration.
    pub total: TimeMs,
    /// How long before the end the visual cutoff engages.
    #[serde(default = "default_cutoff_lead")]
    pub cutoff_lead: TimeMs,
    /// Scene partition.
    pub scenes: Vec<SceneEntry>,
    /// Subtitle captions.
    #[serde(default)]
    pub subtitles: Vec<Cue<String>>,
    /// Narration lines.
    #[serde(default)]
    pub narration: Vec<NarrationLine>,
    /// Session-wide voice.
    #[serde(default)]
    pub voice: VoiceSettings,
    /// Soundtrack.
    #[serde(default)]
    pub audio: AudioScore,
    /// Base color and post effects.
    #[serde(default)]
    pub look: Look,
}

impl SequenceDef {
    /// The built-in sequence.
    pub fn house_that_remembers() -> Self {
        builtin::house_that_remembers()
    }
}

/// A validated sequence with its lookup tables built.
#[derive(Clone, Debug, PartialEq)]
pub struct Sequence {
    def: SequenceDef,
    scenes: SceneTable,
    subtitles: SubtitleTrack,
    narration: NarrationScript,
}

impl Sequence {
    /// Validate `def` and build its tables.
    pub fn new(def: SequenceDef) -> TenebraResult<Self> {
        if def.total == TimeMs::ZERO {
            return Err(TenebraError::validation("total duration must be > 0"));
        }
        if def.cutoff_lead >= def.total {
            return Err(TenebraError::validation(
                "cutoff_lead must be shorter than the total duration",
            ));
        }
        let cutoff_at = def.total.saturating_sub(def.cutoff_lead);
        let scenes = SceneTable::new(def.scenes.clone(), cutoff_at, def.total)?;
        let subtitles = SubtitleTrack::new(def.subtitles.clone())?;
        if subtitles.end() > def.total {
            return Err(TenebraError::validation(format!(
                "subtitles run to {}, past the sequence end {}",
                subtitles.end(),
                def.total
            )));
        }
        let narration = NarrationScript::new(def.narration.clone())?;
        if let Some(line) = narration.lines().iter().find(|l| l.start >= def.total) {
            return Err(TenebraError::validation(format!(
                "narration line at {} starts after the sequence ends",
                line.start
            )));
        }
        def.voice.validate()?;
        def.audio.validate()?;
        def.look.validate()?;
        Ok(Self {
            def,
            scenes,
            subtitles,
            narration,
        })
    }

    /// The built-in sequence, validated.
    pub fn house_that_remembers() -> TenebraResult<Self> {
        Self::new(SequenceDef::house_that_remembers())
    }

    /// Parse and validate JSON.
    pub fn from_json_str(json: &str) -> TenebraResult<Self> {
        let def: SequenceDef = serde_json::from_str(json)
            .map_err(|e| TenebraError::serde(format!("parse sequence JSON: {e}")))?;
        Self::new(def)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_path(path: &Path) -> TenebraResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            TenebraError::Other(anyhow::anyhow!(
                "read sequence '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_json_str(&json)
    }

    /// Pretty JSON of the definition.
    pub fn to_json_pretty(&self) -> TenebraResult<String> {
        serde_json::to_string_pretty(&self.def)
            .map_err(|e| TenebraError::serde(format!("serialize sequence: {e}")))
    }

    /// Serialized form.
    pub fn def(&self) -> &SequenceDef {
        &self.def
    }

    /// Title.
    pub fn title(&self) -> &str {
        &self.def.title
    }

    /// Total duration.
    pub fn total(&self) -> TimeMs {
        self.def.total
    }

    /// Elapsed time past which the cutoff engages.
    pub fn cutoff_at(&self) -> TimeMs {
        self.def.total.saturating_sub(self.def.cutoff_lead)
    }

    /// Scene table.
    pub fn scenes(&self) -> &SceneTable {
        &self.scenes
    }

    /// Subtitle track.
    pub fn subtitles(&self) -> &SubtitleTrack {
        &self.subtitles
    }

    /// Narration script.
    pub fn narration(&self) -> &NarrationScript {
        &self.narration
    }

    /// Voice settings.
    pub fn voice(&self) -> &VoiceSettings {
        &self.def.voice
    }

    /// Soundtrack.
    pub fn audio(&self) -> &AudioScore {
        &self.def.audio
    }

    /// Look.
    pub fn look(&self) -> &Look {
        &self.def.look
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sequence/mod.rs"]
mod tests;
