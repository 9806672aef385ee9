use crate::foundation::core::{TimeMs, TimeRange};
use crate::foundation::error::{TenebraError, TenebraResult};

/// A payload active over a half-open time range.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Cue<T> {
    /// Inclusive start offset from session start.
    pub start: TimeMs,
    /// Exclusive end offset from session start.
    pub end: TimeMs,
    /// Cue content.
    pub payload: T,
}

impl<T> Cue<T> {
    /// Build a cue from millisecond offsets.
    pub fn new(start: u64, end: u64, payload: T) -> Self {
        Self {
            start: TimeMs(start),
            end: TimeMs(end),
            payload,
        }
    }

    /// The cue's time range.
    pub fn range(&self) -> TimeRange {
        TimeRange {
            start: self.start,
            end: self.end,
        }
    }
}

/// Sorted, non-overlapping ranged cues. At most one cue is active at any time.
#[derive(Clone, Debug, PartialEq)]
pub struct CueTable<T> {
    cues: Vec<Cue<T>>,
}

impl<T> CueTable<T> {
    /// Validate and wrap `cues`.
    ///
    /// Every cue must have `end > start`, and cues must be sorted by `start` without overlap.
    /// Gaps are allowed; [`CueTable::select`] returns `None` inside a gap.
    pub fn new(cues: Vec<Cue<T>>) -> TenebraResult<Self> {
        for (i, cue) in cues.iter().enumerate() {
            if cue.end <= cue.start {
                return Err(TenebraError::validation(format!(
                    "cue {i} [{}, {}) must end after it starts",
                    cue.start, cue.end
                )));
            }
        }
        for (i, pair) in cues.windows(2).enumerate() {
            let (a, b) = (&pair[0], &pair[1]);
            if b.start < a.start {
                return Err(TenebraError::validation(format!(
                    "cue {} starts before cue {i}; cues must be sorted by start",
                    i + 1
                )));
            }
            if b.start < a.end {
                return Err(TenebraError::validation(format!(
                    "cue {} [{}, {}) overlaps cue {i} [{}, {})",
                    i + 1,
                    b.start,
                    b.end,
                    a.start,
                    a.end
                )));
            }
        }
        Ok(Self { cues })
    }

    /// The unique cue active at `t`, if any.
    pub fn select(&self, t: TimeMs) -> Option<&Cue<T>> {
        // Index of the first cue starting after `t`; the candidate is the one before it.
        let idx = self.cues.partition_point(|c| c.start <= t);
        let cue = self.cues.get(idx.checked_sub(1)?)?;
        cue.range().contains(t).then_some(cue)
    }

    /// Number of cues.
    pub fn len(&self) -> usize {
        self.cues.len()
    }

    /// True if the table has no cues.
    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// Iterate cues in time order.
    pub fn iter(&self) -> std::slice::Iter<'_, Cue<T>> {
        self.cues.iter()
    }

    /// End of the last cue, or zero for an empty table.
    pub fn end(&self) -> TimeMs {
        self.cues.last().map(|c| c.end).unwrap_or_default()
    }
}

/// Subtitle captions keyed by time range.
pub type SubtitleTrack = CueTable<String>;

impl SubtitleTrack {
    /// Caption text active at `elapsed`, if any.
    pub fn select_subtitle(&self, elapsed: TimeMs) -> Option<&str> {
        self.select(elapsed).map(|c| c.payload.as_str())
    }
}

/// One fire-once narration line.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct NarrationLine {
    /// Offset from session start at which the line is spoken.
    pub start: TimeMs,
    /// Text handed to the speech capability.
    pub text: String,
}

/// Narration lines sorted by start offset.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct NarrationScript {
    lines: Vec<NarrationLine>,
}

impl NarrationScript {
    /// Validate that `lines` are sorted ascending by start.
    pub fn new(lines: Vec<NarrationLine>) -> TenebraResult<Self> {
        if let Some(i) = lines.windows(2).position(|w| w[1].start < w[0].start) {
            return Err(TenebraError::validation(format!(
                "narration line {} starts before line {i}; lines must be sorted",
                i + 1
            )));
        }
        Ok(Self { lines })
    }

    /// Lines in time order.
    pub fn lines(&self) -> &[NarrationLine] {
        &self.lines
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// True if there are no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/cue.rs"]
mod tests;
