use crate::foundation::core::TimeMs;
use crate::foundation::error::{TenebraError, TenebraResult};
use crate::narration::voice::{SharedNarrator, Utterance, VoiceSettings};
use crate::timeline::cue::{NarrationLine, NarrationScript};
use crate::timeline::handle::SessionHandle;
use crate::timeline::timers::TimerQueue;

/// Schedules narration lines as deferred speech requests.
pub struct NarrationScheduler;

impl NarrationScheduler {
    /// Cancel whatever the narrator still has queued, then schedule every line of `script`
    /// relative to session start.
    ///
    /// Fails with a capability error when the narrator reports no speech output.
    #[tracing::instrument(skip_all, fields(lines = script.len()))]
    pub fn start(
        narrator: &SharedNarrator,
        script: &NarrationScript,
        voice: &VoiceSettings,
    ) -> TenebraResult<NarrationSession> {
        if !narrator.borrow().is_available() {
            return Err(TenebraError::capability("speech synthesis unavailable"));
        }
        narrator.borrow_mut().cancel();

        let mut timers = TimerQueue::new();
        for (i, line) in script.lines().iter().enumerate() {
            timers.schedule_at(line.start, i);
        }
        tracing::info!(pending = timers.len(), "narration session started");
        Ok(NarrationSession {
            narrator: narrator.clone(),
            lines: script.lines().to_vec(),
            voice: voice.clone(),
            timers,
            spoken: 0,
            failures: 0,
            torn_down: false,
        })
    }
}

/// Outstanding narration lines of one session.
pub struct NarrationSession {
    narrator: SharedNarrator,
    lines: Vec<NarrationLine>,
    voice: VoiceSettings,
    timers: TimerQueue<usize>,
    spoken: usize,
    failures: usize,
    torn_down: bool,
}

impl std::fmt::Debug for NarrationSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NarrationSession")
            .field("pending", &self.timers.len())
            .field("spoken", &self.spoken)
            .field("failures", &self.failures)
            .field("torn_down", &self.torn_down)
            .finish_non_exhaustive()
    }
}

impl NarrationSession {
    /// Lines handed to the narrator so far.
    pub fn spoken(&self) -> usize {
        self.spoken
    }

    /// Lines whose speak request failed.
    pub fn failures(&self) -> usize {
        self.failures
    }

    /// Due time of the next line.
    pub fn next_due(&self) -> Option<TimeMs> {
        self.timers.next_due()
    }

    /// Pending lines in firing order.
    pub fn scheduled(&self) -> Vec<(TimeMs, &str)> {
        self.timers
            .iter()
            .filter_map(|(_, due, &i)| self.lines.get(i).map(|l| (due, l.text.as_str())))
            .collect()
    }
}

impl SessionHandle for NarrationSession {
    fn poll(&mut self, elapsed: TimeMs) {
        if self.torn_down {
            return;
        }
        while let Some(fired) = self.timers.pop_due(elapsed) {
            let Some(line) = self.lines.get(fired.event) else {
                continue;
            };
            let utterance = Utterance {
                at: fired.due,
                text: line.text.clone(),
                voice: self.voice.clone(),
            };
            match self.narrator.borrow_mut().speak(&utterance) {
                Ok(()) => {
                    self.spoken += 1;
                    tracing::debug!(at = %fired.due, line = fired.event, "narration line");
                }
                Err(e) => {
                    self.failures += 1;
                    tracing::warn!(line = fired.event, error = %e, "narration line skipped");
                }
            }
        }
        self.narrator.borrow_mut().pump();
    }

    #[tracing::instrument(skip(self))]
    fn teardown(&mut self) -> usize {
        if self.torn_down {
            return 0;
        }
        self.torn_down = true;
        let cancelled = self.timers.cancel_all();
        self.narrator.borrow_mut().cancel();
        tracing::info!(cancelled, "narration session torn down");
        cancelled
    }

    fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    fn pending(&self) -> usize {
        self.timers.len()
    }
}

impl Drop for NarrationSession {
    fn drop(&mut self) {
        if !self.torn_down {
            self.teardown();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/narration/scheduler.rs"]
mod tests;
