use crate::foundation::core::{Affine, BezPath, Point, Rect, Rgba8, Vec2};
use kurbo::Shape as _;

/// Path flattening tolerance for circles and ellipses, in device pixels.
const SHAPE_TOLERANCE: f64 = 0.1;

/// What a radial gradient paints beyond its outer radius.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradientExtend {
    /// Keep the outer color.
    #[default]
    Pad,
    /// Paint nothing.
    Clip,
}

/// Two-stop radial gradient.
///
/// Inside `inner_radius` the inner color is used; between the radii the colors are interpolated.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RadialGradient {
    /// Center in user space.
    pub center: Point,
    /// Radius of the inner stop.
    pub inner_radius: f64,
    /// Radius of the outer stop.
    pub outer_radius: f64,
    /// Color at and inside `inner_radius`.
    pub inner: Rgba8,
    /// Color at `outer_radius`.
    pub outer: Rgba8,
    /// Behavior beyond `outer_radius`.
    pub extend: GradientExtend,
}

impl RadialGradient {
    /// Color at distance `d` from the center, or `None` if clipped.
    pub fn color_at(&self, d: f64) -> Option<Rgba8> {
        if d > self.outer_radius && self.extend == GradientExtend::Clip {
            return None;
        }
        let span = self.outer_radius - self.inner_radius;
        let t = if span <= f64::EPSILON {
            if d < self.outer_radius { 0.0 } else { 1.0 }
        } else {
            ((d - self.inner_radius) / span).clamp(0.0, 1.0)
        };
        Some(self.inner.lerp(self.outer, t))
    }

    /// Bounding box of the outer circle.
    pub fn outer_bounds(&self) -> Rect {
        Rect::from_center_size(
            self.center,
            (self.outer_radius * 2.0, self.outer_radius * 2.0),
        )
    }
}

/// Abstract 2D drawing surface handed to the renderer and scene routines.
///
/// Coordinates are device pixels, transformed by the current transform. Colors use straight
/// alpha. Strokes are drawn as filled polygons.
pub trait Painter {
    /// Surface size in device pixels.
    fn size(&self) -> (u32, u32);
    /// Fill an axis-aligned rectangle.
    fn fill_rect(&mut self, rect: Rect, color: Rgba8);
    /// Fill a closed path (non-zero winding).
    fn fill_path(&mut self, path: &BezPath, color: Rgba8);
    /// Paint `gradient` over `bounds`.
    fn fill_radial(&mut self, gradient: &RadialGradient, bounds: Rect);
    /// Push `transform` on top of the current transform.
    fn push_transform(&mut self, transform: Affine);
    /// Restore the transform saved by the matching push. Extra pops are ignored.
    fn pop_transform(&mut self);
    /// Number of shapes drawn since the painter was created or cleared.
    fn shapes_drawn(&self) -> u64;

    /// Fill a circle.
    fn fill_circle(&mut self, center: Point, radius: f64, color: Rgba8) {
        let path = kurbo::Circle::new(center, radius).to_path(SHAPE_TOLERANCE);
        self.fill_path(&path, color);
    }

    /// Fill an axis-aligned ellipse.
    fn fill_ellipse(&mut self, center: Point, radii: Vec2, color: Rgba8) {
        let path = kurbo::Ellipse::new(center, radii, 0.0).to_path(SHAPE_TOLERANCE);
        self.fill_path(&path, color);
    }

    /// Draw a line segment of `width` with butt caps.
    fn stroke_line(&mut self, from: Point, to: Point, width: f64, color: Rgba8) {
        if let Some(path) = line_polygon(from, to, width) {
            self.fill_path(&path, color);
        }
    }
}

/// Quad covering a segment of `width`. `None` for degenerate segments.
pub(crate) fn line_polygon(from: Point, to: Point, width: f64) -> Option<BezPath> {
    let d = to - from;
    let len = d.hypot();
    if len <= f64::EPSILON || width <= 0.0 {
        return None;
    }
    let n = Vec2::new(-d.y, d.x) * (width * 0.5 / len);
    let mut path = BezPath::new();
    path.move_to(from + n);
    path.line_to(to + n);
    path.line_to(to - n);
    path.line_to(from - n);
    path.close_path();
    Some(path)
}

/// Per-kind shape counters of a [`RecordingPainter`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct ShapeCounts {
    /// Rectangles.
    pub rects: u64,
    /// Paths (including circles, ellipses and strokes).
    pub paths: u64,
    /// Gradient fills.
    pub gradients: u64,
}

impl ShapeCounts {
    /// Sum of all counters.
    pub fn total(&self) -> u64 {
        self.rects + self.paths + self.gradients
    }
}

/// Painter that rasterizes nothing and counts what it is asked to draw.
#[derive(Clone, Debug)]
pub struct RecordingPainter {
    width: u32,
    height: u32,
    counts: ShapeCounts,
    colors: Vec<Rgba8>,
    stack: Vec<Affine>,
    transform: Affine,
}

impl RecordingPainter {
    /// Painter for a `width` x `height` surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            counts: ShapeCounts::default(),
            colors: Vec::new(),
            stack: Vec::new(),
            transform: Affine::IDENTITY,
        }
    }

    /// Counters so far.
    pub fn counts(&self) -> ShapeCounts {
        self.counts
    }

    /// Solid colors used so far, in draw order.
    pub fn colors(&self) -> &[Rgba8] {
        &self.colors
    }

    /// Current transform.
    pub fn transform(&self) -> Affine {
        self.transform
    }

    /// Transform stack depth.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Reset counters and resize.
    pub fn reset(&mut self, width: u32, height: u32) {
        *self = Self::new(width, height);
    }
}

impl Painter for RecordingPainter {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn fill_rect(&mut self, _rect: Rect, color: Rgba8) {
        self.counts.rects += 1;
        self.colors.push(color);
    }

    fn fill_path(&mut self, _path: &BezPath, color: Rgba8) {
        self.counts.paths += 1;
        self.colors.push(color);
    }

    fn fill_radial(&mut self, _gradient: &RadialGradient, _bounds: Rect) {
        self.counts.gradients += 1;
    }

    fn push_transform(&mut self, transform: Affine) {
        self.stack.push(self.transform);
        self.transform = self.transform * transform;
    }

    fn pop_transform(&mut self) {
        if let Some(t) = self.stack.pop() {
            self.transform = t;
        }
    }

    fn shapes_drawn(&self) -> u64 {
        self.counts.total()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/painter.rs"]
mod tests;
