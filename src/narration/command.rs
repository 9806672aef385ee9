use crate::foundation::error::{TenebraError, TenebraResult};
use crate::narration::voice::{SpeechNarrator, Utterance};
use std::collections::VecDeque;
use std::process::{Child, Command, Stdio};

const CANDIDATES: [&str; 2] = ["espeak-ng", "espeak"];

/// Words per minute espeak uses at rate 1.0.
const BASE_WPM: f32 = 175.0;

fn program_runs(program: &str) -> bool {
    Command::new(program)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// First espeak flavour that runs on this host.
pub fn find_espeak() -> Option<&'static str> {
    CANDIDATES.into_iter().find(|p| program_runs(p))
}

/// Narrator that runs one `espeak-ng`/`espeak` process per utterance.
///
/// Utterances play one after another: a line spoken while another is still running waits in a
/// FIFO and starts from [`SpeechNarrator::pump`] once the running process exits.
#[derive(Debug)]
pub struct CommandNarrator {
    program: Option<String>,
    current: Option<Child>,
    queue: VecDeque<Vec<String>>,
}

impl CommandNarrator {
    /// Probe `PATH` for espeak. The narrator reports itself unavailable if none runs.
    pub fn detect() -> Self {
        Self::with_program(find_espeak().map(str::to_string))
    }

    /// Use an explicit program, or none.
    pub fn with_program(program: Option<String>) -> Self {
        Self {
            program,
            current: None,
            queue: VecDeque::new(),
        }
    }

    /// Program in use.
    pub fn program(&self) -> Option<&str> {
        self.program.as_deref()
    }

    /// 1 while a speech process is running, else 0.
    pub fn in_flight(&mut self) -> usize {
        self.reap();
        usize::from(self.current.is_some())
    }

    /// Utterances waiting for the running one to finish.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    fn reap(&mut self) {
        if let Some(child) = self.current.as_mut()
            && !matches!(child.try_wait(), Ok(None))
        {
            self.current = None;
        }
    }

    fn spawn(&mut self, program: &str, args: Vec<String>) -> TenebraResult<()> {
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| TenebraError::synthesis(format!("failed to spawn {program}: {e}")))?;
        self.current = Some(child);
        Ok(())
    }

    /// Command-line arguments for `utterance`.
    pub fn args_for(utterance: &Utterance) -> Vec<String> {
        let v = &utterance.voice;
        let wpm = (BASE_WPM * v.rate).round().clamp(80.0, 450.0) as u32;
        let pitch = (50.0 * v.pitch).round().clamp(0.0, 99.0) as u32;
        let amplitude = (100.0 * v.volume).round().clamp(0.0, 200.0) as u32;
        vec![
            "-v".to_string(),
            v.primary_language().to_string(),
            "-s".to_string(),
            wpm.to_string(),
            "-p".to_string(),
            pitch.to_string(),
            "-a".to_string(),
            amplitude.to_string(),
            "--".to_string(),
            utterance.text.clone(),
        ]
    }
}

impl SpeechNarrator for CommandNarrator {
    fn is_available(&self) -> bool {
        self.program.is_some()
    }

    fn speak(&mut self, utterance: &Utterance) -> TenebraResult<()> {
        let Some(program) = self.program.clone() else {
            return Err(TenebraError::capability("no espeak program found on PATH"));
        };
        self.reap();
        let args = Self::args_for(utterance);
        if self.current.is_some() || !self.queue.is_empty() {
            self.queue.push_back(args);
            return Ok(());
        }
        self.spawn(&program, args)
    }

    fn pump(&mut self) {
        self.reap();
        let Some(program) = self.program.clone() else {
            return;
        };
        while self.current.is_none() {
            let Some(args) = self.queue.pop_front() else {
                break;
            };
            if let Err(e) = self.spawn(&program, args) {
                tracing::warn!(error = %e, "queued utterance dropped");
            }
        }
    }

    fn cancel(&mut self) {
        self.queue.clear();
        if let Some(mut child) = self.current.take() {
            // The process may already have exited; either way it must be reaped.
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl Drop for CommandNarrator {
    fn drop(&mut self) {
        self.cancel();
    }
}
