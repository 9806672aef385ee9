use crate::foundation::core::{Point, Rect, Rgba8, TimeMs};
use crate::foundation::error::{TenebraError, TenebraResult};
use crate::foundation::math::hash_unit;
use crate::render::painter::{GradientExtend, Painter, RadialGradient};
use crate::render::surface::Surface;
use crate::scenes::{SceneDraw, SceneEntry, SceneKind, SceneTable};

/// Everything a frame is drawn from. Built once per frame from a single clock sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameCtx {
    /// Session elapsed time.
    pub elapsed: TimeMs,
    /// Time within the current scene.
    pub local: TimeMs,
    /// Surface being drawn.
    pub surface: Surface,
    /// Forced cutoff state for this frame.
    pub cutoff_active: bool,
    /// Seed for per-frame variation.
    pub seed: u64,
}

impl FrameCtx {
    /// Surface width in device pixels.
    pub fn width(&self) -> f64 {
        f64::from(self.surface.width)
    }

    /// Surface height in device pixels.
    pub fn height(&self) -> f64 {
        f64::from(self.surface.height)
    }

    /// Effective pixel ratio.
    pub fn dpr(&self) -> f64 {
        self.surface.dpr
    }
}

/// Film grain overlay.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GrainSpec {
    /// Specks per device pixel, averaged.
    pub density: f64,
    /// Amplitude of the sinusoidal density flicker.
    pub flicker: f64,
    /// Flicker rate in radians per millisecond.
    pub flicker_rate: f64,
    /// Speck opacity.
    pub alpha: f64,
    /// Luminance range of a speck.
    pub luminance: (u8, u8),
}

impl GrainSpec {
    /// Number of specks on a `w` x `h` surface at elapsed `t`.
    pub fn count(&self, w: u32, h: u32, t: TimeMs) -> u64 {
        let area = f64::from(w) * f64::from(h);
        let n = area * (self.density + self.flicker * (t.as_f64() * self.flicker_rate).sin());
        n.max(0.0).floor() as u64
    }
}

/// Radial darkening toward the edges.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VignetteSpec {
    /// Transparent radius as a fraction of `min(w, h)`.
    pub inner: f64,
    /// Full-strength radius as a fraction of `max(w, h)`.
    pub outer: f64,
    /// Edge color.
    pub color: Rgba8,
}

/// Post effects and base color shared by all scenes.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Look {
    /// Clear color.
    pub base: Rgba8,
    /// Grain overlay.
    pub grain: GrainSpec,
    /// Vignette.
    pub vignette: VignetteSpec,
}

impl Default for Look {
    fn default() -> Self {
        Self {
            base: Rgba8::rgb(6, 6, 6),
            grain: GrainSpec {
                density: 0.00002,
                flicker: 0.00002,
                flicker_rate: 0.001,
                alpha: 0.06,
                luminance: (50, 100),
            },
            vignette: VignetteSpec {
                inner: 0.2,
                outer: 0.6,
                color: Rgba8::rgba(0, 0, 0, 0.75),
            },
        }
    }
}

impl Look {
    /// Check fractions and ranges.
    pub fn validate(&self) -> TenebraResult<()> {
        let g = &self.grain;
        if !(g.density.is_finite() && g.flicker.is_finite() && g.flicker_rate.is_finite()) {
            return Err(TenebraError::validation("grain parameters must be finite"));
        }
        if !(0.0..=1.0).contains(&g.alpha) {
            return Err(TenebraError::validation("grain.alpha must be in [0, 1]"));
        }
        if g.luminance.0 > g.luminance.1 {
            return Err(TenebraError::validation("grain.luminance must be (min, max)"));
        }
        let v = &self.vignette;
        if !(v.inner >= 0.0 && v.outer > 0.0) {
            return Err(TenebraError::validation("vignette radii must be positive"));
        }
        Ok(())
    }
}

/// What one frame drew.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct DrawnFrame {
    /// Index into the scene table of the scene covering this frame.
    pub scene_index: Option<usize>,
    /// Scene routine that actually drew (`None` if blanked or uncovered).
    pub scene: Option<SceneKind>,
    /// Shapes the scene routine drew.
    pub scene_shapes: u64,
    /// Grain specks drawn.
    pub grain: u64,
}

/// Per-frame drawing: base, grain, vignette, then exactly one scene.
pub struct SceneRenderer {
    table: SceneTable,
    routines: Vec<Box<dyn SceneDraw>>,
    look: Look,
    seed: u64,
}

impl std::fmt::Debug for SceneRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneRenderer")
            .field("table", &self.table)
            .field("look", &self.look)
            .field("seed", &self.seed)
            .finish_non_exhaustive()
    }
}

impl SceneRenderer {
    /// Renderer running the built-in routine of every entry.
    pub fn new(table: SceneTable, look: Look, seed: u64) -> Self {
        let routines = table.entries().iter().map(|e| e.kind.routine()).collect();
        Self {
            table,
            routines,
            look,
            seed,
        }
    }

    /// Replace the routine of scene `index`.
    pub fn set_routine(&mut self, index: usize, routine: Box<dyn SceneDraw>) -> TenebraResult<()> {
        let slot = self.routines.get_mut(index).ok_or_else(|| {
            TenebraError::validation(format!("no scene at index {index}"))
        })?;
        *slot = routine;
        Ok(())
    }

    /// Scene table.
    pub fn table(&self) -> &SceneTable {
        &self.table
    }

    /// Scene covering `elapsed`.
    pub fn select(&self, elapsed: TimeMs) -> Option<(usize, &SceneEntry)> {
        self.table.select(elapsed)
    }

    /// Draw one frame for `elapsed` onto `painter`.
    pub fn draw(
        &self,
        painter: &mut dyn Painter,
        elapsed: TimeMs,
        surface: Surface,
        cutoff_active: bool,
    ) -> DrawnFrame {
        let w = f64::from(surface.width);
        let h = f64::from(surface.height);
        painter.fill_rect(Rect::new(0.0, 0.0, w, h), self.look.base);
        let grain = self.draw_grain(painter, elapsed, surface);
        self.draw_vignette(painter, w, h);

        let mut out = DrawnFrame {
            scene_index: None,
            scene: None,
            scene_shapes: 0,
            grain,
        };
        let Some((index, entry)) = self.table.select(elapsed) else {
            return out;
        };
        out.scene_index = Some(index);
        if cutoff_active && entry.blank_on_cutoff {
            return out;
        }
        let ctx = FrameCtx {
            elapsed,
            local: entry.range.local(elapsed),
            surface,
            cutoff_active,
            seed: self.seed,
        };
        let before = painter.shapes_drawn();
        self.routines[index].draw(painter, &ctx);
        out.scene = Some(entry.kind);
        out.scene_shapes = painter.shapes_drawn().saturating_sub(before);
        out
    }

    fn draw_grain(&self, p: &mut dyn Painter, elapsed: TimeMs, surface: Surface) -> u64 {
        let g = &self.look.grain;
        let n = g.count(surface.width, surface.height, elapsed);
        let w = f64::from(surface.width);
        let h = f64::from(surface.height);
        let size = surface.dpr;
        let (lo, hi) = (f64::from(g.luminance.0), f64::from(g.luminance.1));
        for i in 0..n {
            let x = hash_unit(self.seed, elapsed.0, i * 3) * w;
            let y = hash_unit(self.seed, elapsed.0, i * 3 + 1) * h;
            let lum = (lo + hash_unit(self.seed, elapsed.0, i * 3 + 2) * (hi - lo)) as u8;
            p.fill_rect(
                Rect::new(x, y, x + size, y + size),
                Rgba8::rgba(lum, lum, lum, g.alpha),
            );
        }
        n
    }

    fn draw_vignette(&self, p: &mut dyn Painter, w: f64, h: f64) {
        let v = &self.look.vignette;
        let gradient = RadialGradient {
            center: Point::new(w / 2.0, h / 2.0),
            inner_radius: w.min(h) * v.inner,
            outer_radius: w.max(h) * v.outer,
            inner: v.color.with_alpha_scaled(0.0),
            outer: v.color,
            extend: GradientExtend::Pad,
        };
        p.fill_radial(&gradient, Rect::new(0.0, 0.0, w, h));
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/frame.rs"]
mod tests;
