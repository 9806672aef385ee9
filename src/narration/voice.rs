use crate::foundation::core::TimeMs;
use crate::foundation::error::{TenebraError, TenebraResult};
use std::cell::RefCell;
use std::rc::Rc;

/// Voice parameters shared by every line of a sequence.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct VoiceSettings {
    /// BCP 47 language tag.
    pub lang: String,
    /// Speaking rate, 1.0 is normal.
    pub rate: f32,
    /// Pitch, 1.0 is normal.
    pub pitch: f32,
    /// Volume in `[0, 1]`.
    pub volume: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            lang: "hi-IN".to_string(),
            rate: 0.92,
            pitch: 0.8,
            volume: 1.0,
        }
    }
}

impl VoiceSettings {
    /// Check parameter ranges.
    pub fn validate(&self) -> TenebraResult<()> {
        if self.lang.trim().is_empty() {
            return Err(TenebraError::validation("voice.lang must be non-empty"));
        }
        if !(0.1..=10.0).contains(&self.rate) {
            return Err(TenebraError::validation("voice.rate must be in [0.1, 10]"));
        }
        if !(0.0..=2.0).contains(&self.pitch) {
            return Err(TenebraError::validation("voice.pitch must be in [0, 2]"));
        }
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(TenebraError::validation("voice.volume must be in [0, 1]"));
        }
        Ok(())
    }

    /// Primary language subtag (`"hi"` for `"hi-IN"`).
    pub fn primary_language(&self) -> &str {
        self.lang.split(['-', '_']).next().unwrap_or(&self.lang)
    }
}

/// One speech request.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Utterance {
    /// Session offset the line was scheduled for.
    pub at: TimeMs,
    /// Text to speak.
    pub text: String,
    /// Voice parameters.
    pub voice: VoiceSettings,
}

/// Text-to-speech capability.
///
/// `speak` queues or starts an utterance and returns immediately. `cancel` halts the current
/// utterance and drops anything queued.
pub trait SpeechNarrator {
    /// False when the host has no speech output.
    fn is_available(&self) -> bool;
    /// Start speaking.
    fn speak(&mut self, utterance: &Utterance) -> TenebraResult<()>;
    /// Advance queued speech. Called once per frame by the narration session.
    fn pump(&mut self) {}
    /// Stop speaking and clear the queue.
    fn cancel(&mut self);
}

/// Narrator shared between the controller and the narration session it starts.
pub type SharedNarrator = Rc<RefCell<dyn SpeechNarrator>>;

/// Wrap a narrator for sharing.
pub fn shared<N: SpeechNarrator + 'static>(narrator: N) -> SharedNarrator {
    Rc::new(RefCell::new(narrator))
}

/// Host without speech output.
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentNarrator;

impl SpeechNarrator for SilentNarrator {
    fn is_available(&self) -> bool {
        false
    }

    fn speak(&mut self, _utterance: &Utterance) -> TenebraResult<()> {
        Err(TenebraError::capability("speech synthesis unavailable"))
    }

    fn cancel(&mut self) {}
}

/// Something a [`TranscriptNarrator`] was asked to do.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TranscriptEntry {
    /// An utterance was started.
    Spoke(Utterance),
    /// The queue was cancelled.
    Cancelled,
}

/// Shared transcript handle. Clones see the same entries.
#[derive(Clone, Debug, Default)]
pub struct Transcript {
    entries: Rc<RefCell<Vec<TranscriptEntry>>>,
}

impl Transcript {
    /// Copy of all entries.
    pub fn entries(&self) -> Vec<TranscriptEntry> {
        self.entries.borrow().clone()
    }

    /// Texts of spoken utterances in order.
    pub fn spoken(&self) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .filter_map(|e| match e {
                TranscriptEntry::Spoke(u) => Some(u.text.clone()),
                TranscriptEntry::Cancelled => None,
            })
            .collect()
    }

    /// Number of cancel calls.
    pub fn cancels(&self) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|e| matches!(e, TranscriptEntry::Cancelled))
            .count()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// True if nothing happened yet.
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

/// Headless narrator that logs each line and records it in a [`Transcript`].
#[derive(Clone, Debug, Default)]
pub struct TranscriptNarrator {
    transcript: Transcript,
}

impl TranscriptNarrator {
    /// Create a narrator with an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the transcript.
    pub fn transcript(&self) -> Transcript {
        self.transcript.clone()
    }
}

impl SpeechNarrator for TranscriptNarrator {
    fn is_available(&self) -> bool {
        true
    }

    fn speak(&mut self, utterance: &Utterance) -> TenebraResult<()> {
        tracing::info!(at = %utterance.at, lang = %utterance.voice.lang, "narration: {}", utterance.text);
        self.transcript
            .entries
            .borrow_mut()
            .push(TranscriptEntry::Spoke(utterance.clone()));
        Ok(())
    }

    fn cancel(&mut self) {
        self.transcript
            .entries
            .borrow_mut()
            .push(TranscriptEntry::Cancelled);
    }
}
