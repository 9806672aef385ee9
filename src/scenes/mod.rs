//! Time-ranged scene routines and the table that selects between them.

mod forest;
mod hallway;
mod stairwell;

pub use forest::{ForestHouse, window_lit};
pub use hallway::{HallwayDoll, head_tilt, zoom_at};
pub use stairwell::{Stairwell, figure_visible};

use crate::foundation::core::{TimeMs, TimeRange};
use crate::foundation::error::{TenebraError, TenebraResult};
use crate::render::frame::FrameCtx;
use crate::render::painter::Painter;

/// A scene draw routine: a function of time-within-scene and the surface.
pub trait SceneDraw {
    /// Draw the scene for `ctx.local`.
    fn draw(&self, painter: &mut dyn Painter, ctx: &FrameCtx);
}

/// Built-in scene routines, named in sequence config.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneKind {
    /// Fog, tree line and a house whose window flickers red.
    ForestHouse,
    /// Hallway with an oil lamp and a doll that slowly turns its head.
    HallwayDoll,
    /// Shaking stairwell with a figure flashing at the bottom.
    Stairwell,
}

impl SceneKind {
    /// Config name.
    pub fn name(self) -> &'static str {
        match self {
            Self::ForestHouse => "forest_house",
            Self::HallwayDoll => "hallway_doll",
            Self::Stairwell => "stairwell",
        }
    }

    /// The routine drawing this scene.
    pub fn routine(self) -> Box<dyn SceneDraw> {
        match self {
            Self::ForestHouse => Box::new(ForestHouse),
            Self::HallwayDoll => Box::new(HallwayDoll),
            Self::Stairwell => Box::new(Stairwell),
        }
    }
}

impl std::fmt::Display for SceneKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One scene slot of the timeline.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SceneEntry {
    /// Half-open range relative to session start.
    pub range: TimeRange,
    /// Routine to run.
    pub kind: SceneKind,
    /// Stop drawing this scene once the forced cutoff is active.
    #[serde(default)]
    pub blank_on_cutoff: bool,
}

impl SceneEntry {
    /// Entry over `[start, end)` milliseconds.
    pub fn new(start: u64, end: u64, kind: SceneKind) -> Self {
        Self {
            range: TimeRange {
                start: TimeMs(start),
                end: TimeMs(end),
            },
            kind,
            blank_on_cutoff: false,
        }
    }

    /// Same entry, blanked during cutoff.
    pub fn blank_on_cutoff(self) -> Self {
        Self {
            blank_on_cutoff: true,
            ..self
        }
    }
}

/// Scene entries partitioning the timeline.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneTable {
    entries: Vec<SceneEntry>,
}

impl SceneTable {
    /// Validate that `entries` tile `[0, end)` without gaps or overlap, where `end` is at least
    /// `covered_until` and at most `total`.
    ///
    /// Only the tail past `covered_until` (the cutoff threshold) may be left uncovered.
    pub fn new(entries: Vec<SceneEntry>, covered_until: TimeMs, total: TimeMs) -> TenebraResult<Self> {
        let Some(first) = entries.first() else {
            return Err(TenebraError::validation("scene table must not be empty"));
        };
        if first.range.start != TimeMs::ZERO {
            return Err(TenebraError::validation(format!(
                "first scene must start at 0, not {}",
                first.range.start
            )));
        }
        for (i, e) in entries.iter().enumerate() {
            if e.range.is_empty() || e.range.end < e.range.start {
                return Err(TenebraError::validation(format!("scene {i} has an empty range")));
            }
        }
        for (i, pair) in entries.windows(2).enumerate() {
            let (a, b) = (&pair[0], &pair[1]);
            if b.range.start < a.range.end {
                return Err(TenebraError::validation(format!(
                    "scene {} overlaps scene {i}",
                    i + 1
                )));
            }
            if b.range.start > a.range.end {
                return Err(TenebraError::validation(format!(
                    "gap between scene {i} and scene {} ({}..{})",
                    i + 1,
                    a.range.end,
                    b.range.start
                )));
            }
        }
        let end = entries.last().map_or(TimeMs::ZERO, |e| e.range.end);
        if end < covered_until {
            return Err(TenebraError::validation(format!(
                "scenes end at {end}, leaving a gap before {covered_until}"
            )));
        }
        if end > total {
            return Err(TenebraError::validation(format!(
                "scenes end at {end}, past the sequence end {total}"
            )));
        }
        Ok(Self { entries })
    }

    /// Index and entry of the scene covering `elapsed`.
    pub fn select(&self, elapsed: TimeMs) -> Option<(usize, &SceneEntry)> {
        let idx = self.entries.partition_point(|e| e.range.start <= elapsed);
        let i = idx.checked_sub(1)?;
        let entry = &self.entries[i];
        entry.range.contains(elapsed).then_some((i, entry))
    }

    /// Entries in time order.
    pub fn entries(&self) -> &[SceneEntry] {
        &self.entries
    }

    /// Number of scenes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false for a validated table.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scenes/mod.rs"]
mod tests;
