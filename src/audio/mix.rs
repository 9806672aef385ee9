use crate::foundation::core::TimeMs;
use crate::foundation::error::{TenebraError, TenebraResult};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

/// Default synthesis sample rate.
pub const MIX_SAMPLE_RATE: u32 = 48_000;

/// Shared mono PCM buffer that engines append their rendered master bus to.
///
/// Clones share storage. Successive sessions append back to back.
#[derive(Clone, Debug, Default)]
pub struct PcmCapture {
    samples: Rc<RefCell<Vec<f32>>>,
}

impl PcmCapture {
    /// Create an empty capture.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn extend(&self, block: &[f32]) {
        self.samples.borrow_mut().extend_from_slice(block);
    }

    /// Number of captured mono samples.
    pub fn len(&self) -> usize {
        self.samples.borrow().len()
    }

    /// True if nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.samples.borrow().is_empty()
    }

    /// Copy of the captured samples.
    pub fn snapshot(&self) -> Vec<f32> {
        self.samples.borrow().clone()
    }

    /// Peak absolute amplitude over `[from, to)` at `sample_rate`.
    pub fn peak_between(&self, from: TimeMs, to: TimeMs, sample_rate: u32) -> f32 {
        let samples = self.samples.borrow();
        let a = (ms_to_sample(from, sample_rate) as usize).min(samples.len());
        let b = (ms_to_sample(to, sample_rate) as usize).min(samples.len());
        samples[a..b.max(a)]
            .iter()
            .fold(0.0f32, |acc, s| acc.max(s.abs()))
    }

    /// Write the capture as interleaved stereo `f32le`.
    pub fn write_stereo_f32le(&self, out_path: &Path) -> TenebraResult<()> {
        let stereo = mono_to_stereo(&self.samples.borrow());
        write_mix_to_f32le_file(&stereo, out_path)
    }
}

/// Convert a millisecond offset to the nearest sample index at `sample_rate`.
pub(crate) fn ms_to_sample(t: TimeMs, sample_rate: u32) -> u64 {
    let num = u128::from(t.0) * u128::from(sample_rate);
    ((num + 500) / 1000) as u64
}

/// Duplicate mono samples into interleaved stereo.
pub(crate) fn mono_to_stereo(mono: &[f32]) -> Vec<f32> {
    let mut out = Vec::with_capacity(mono.len() * 2);
    for &s in mono {
        out.push(s);
        out.push(s);
    }
    out
}

/// Write interleaved `f32` PCM samples to a raw little-endian `.f32le` file.
pub fn write_mix_to_f32le_file(samples_interleaved: &[f32], out_path: &Path) -> TenebraResult<()> {
    if let Some(parent) = out_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            TenebraError::Other(anyhow::anyhow!(
                "failed to create audio capture directory '{}': {e}",
                parent.display()
            ))
        })?;
    }

    let mut bytes = Vec::<u8>::with_capacity(samples_interleaved.len() * 4);
    for &sample in samples_interleaved {
        bytes.extend_from_slice(&sample.clamp(-1.0, 1.0).to_le_bytes());
    }
    std::fs::write(out_path, bytes).map_err(|e| {
        TenebraError::Other(anyhow::anyhow!(
            "failed to write audio capture '{}': {e}",
            out_path.display()
        ))
    })
}
