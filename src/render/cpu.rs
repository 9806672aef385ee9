use std::collections::{HashMap, VecDeque};
use std::path::Path;

use crate::foundation::core::{Affine, BezPath, Point, Rect, Rgba8};
use crate::foundation::error::{TenebraError, TenebraResult};
use crate::render::painter::{GradientExtend, Painter, RadialGradient};

/// Largest generated gradient image side, in pixels. Larger fills are upscaled.
const MAX_GRADIENT_SIDE: f64 = 1024.0;
const GRADIENT_CACHE_CAPACITY: usize = 32;

/// One rendered frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGBA8 rows, top to bottom.
    pub data: Vec<u8>,
    /// True if `data` is premultiplied.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Pixel at `(x, y)`, or `None` out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.data.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Copy with straight alpha.
    pub fn to_straight(&self) -> FrameRGBA {
        if !self.premultiplied {
            return self.clone();
        }
        let mut data = self.data.clone();
        for px in data.chunks_exact_mut(4) {
            let a = px[3];
            if a == 0 || a == 255 {
                continue;
            }
            for c in &mut px[..3] {
                *c = ((u16::from(*c) * 255 + u16::from(a) / 2) / u16::from(a)).min(255) as u8;
            }
        }
        FrameRGBA {
            data,
            premultiplied: false,
            ..*self
        }
    }
}

/// Write `frame` as a PNG, creating the parent directory.
pub fn write_png(frame: &FrameRGBA, path: &Path) -> TenebraResult<()> {
    use anyhow::Context as _;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    let straight = frame.to_straight();
    image::save_buffer_with_format(
        path,
        &straight.data,
        straight.width,
        straight.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct GradientKey {
    width: u32,
    height: u32,
    // Center relative to the fill bounds and both radii, in 1/16 px.
    center: (i64, i64),
    radii: (i64, i64),
    scale: (i64, i64),
    inner: [u8; 4],
    outer: [u8; 4],
    clip: bool,
}

fn q16(v: f64) -> i64 {
    (v * 16.0).round() as i64
}

/// [`Painter`] that rasterizes with `vello_cpu` into a premultiplied RGBA8 frame.
///
/// Radial gradients are generated as images, cached by shape, and painted as image fills.
pub struct CpuPainter {
    width: u16,
    height: u16,
    ctx: vello_cpu::RenderContext,
    transform: Affine,
    stack: Vec<Affine>,
    shapes: u64,
    gradient_cache: HashMap<GradientKey, vello_cpu::Image>,
    gradient_lru: VecDeque<GradientKey>,
}

impl std::fmt::Debug for CpuPainter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuPainter")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("shapes", &self.shapes)
            .field("cached_gradients", &self.gradient_cache.len())
            .finish_non_exhaustive()
    }
}

fn surface_dims(width: u32, height: u32) -> TenebraResult<(u16, u16)> {
    if width == 0 || height == 0 {
        return Err(TenebraError::validation("surface dimensions must be non-zero"));
    }
    let w: u16 = width
        .try_into()
        .map_err(|_| TenebraError::validation("surface width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| TenebraError::validation("surface height exceeds u16"))?;
    Ok((w, h))
}

impl CpuPainter {
    /// Painter for a `width` x `height` surface.
    pub fn new(width: u32, height: u32) -> TenebraResult<Self> {
        let (w, h) = surface_dims(width, height)?;
        Ok(Self {
            width: w,
            height: h,
            ctx: vello_cpu::RenderContext::new(w, h),
            transform: Affine::IDENTITY,
            stack: Vec::new(),
            shapes: 0,
            gradient_cache: HashMap::new(),
            gradient_lru: VecDeque::new(),
        })
    }

    /// Change the surface size. Clears pending drawing.
    pub fn resize(&mut self, width: u32, height: u32) -> TenebraResult<()> {
        let (w, h) = surface_dims(width, height)?;
        if (w, h) != (self.width, self.height) {
            self.width = w;
            self.height = h;
            self.gradient_cache.clear();
            self.gradient_lru.clear();
        }
        self.begin_frame();
        Ok(())
    }

    /// Drop pending drawing and reset the transform stack and shape counter.
    pub fn begin_frame(&mut self) {
        self.ctx = vello_cpu::RenderContext::new(self.width, self.height);
        self.transform = Affine::IDENTITY;
        self.stack.clear();
        self.shapes = 0;
    }

    /// Rasterize everything drawn since [`CpuPainter::begin_frame`].
    pub fn finish(&mut self) -> FrameRGBA {
        let mut pixmap = vello_cpu::Pixmap::new(self.width, self.height);
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut pixmap);
        FrameRGBA {
            width: u32::from(self.width),
            height: u32::from(self.height),
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        }
    }

    fn prepare(&mut self, transform: Affine) {
        self.ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_transform(affine_to_cpu(transform));
    }

    fn gradient_image(&mut self, key: GradientKey, g: &RadialGradient, bounds: Rect) -> vello_cpu::Image {
        if let Some(paint) = self.gradient_cache.get(&key) {
            let paint = paint.clone();
            self.gradient_lru.retain(|k| *k != key);
            self.gradient_lru.push_back(key);
            return paint;
        }

        let (iw, ih) = (key.width, key.height);
        let sx = bounds.width() / f64::from(iw);
        let sy = bounds.height() / f64::from(ih);
        let mut may_have_opacities = false;
        let mut pixels = Vec::with_capacity(iw as usize * ih as usize);
        for j in 0..ih {
            let y = bounds.y0 + (f64::from(j) + 0.5) * sy;
            for i in 0..iw {
                let x = bounds.x0 + (f64::from(i) + 0.5) * sx;
                let d = Point::new(x, y).distance(g.center);
                let [r, gg, b, a] = g.color_at(d).map_or([0; 4], Rgba8::to_premul);
                may_have_opacities |= a != 255;
                pixels.push(vello_cpu::peniko::color::PremulRgba8 { r, g: gg, b, a });
            }
        }
        // Dimensions were clamped to MAX_GRADIENT_SIDE, so they fit u16.
        let pixmap = vello_cpu::Pixmap::from_parts_with_opacity(
            pixels,
            iw as u16,
            ih as u16,
            may_have_opacities,
        );
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(std::sync::Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };

        if self.gradient_lru.len() >= GRADIENT_CACHE_CAPACITY
            && let Some(old) = self.gradient_lru.pop_front()
        {
            self.gradient_cache.remove(&old);
        }
        self.gradient_cache.insert(key, paint.clone());
        self.gradient_lru.push_back(key);
        paint
    }

    /// Number of generated gradient images currently cached.
    pub fn cached_gradients(&self) -> usize {
        self.gradient_cache.len()
    }
}

impl Painter for CpuPainter {
    fn size(&self) -> (u32, u32) {
        (u32::from(self.width), u32::from(self.height))
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba8) {
        self.prepare(self.transform);
        self.ctx.set_paint(color_to_cpu(color));
        self.ctx.fill_rect(&rect_to_cpu(rect));
        self.shapes += 1;
    }

    fn fill_path(&mut self, path: &BezPath, color: Rgba8) {
        self.prepare(self.transform);
        self.ctx.set_paint(color_to_cpu(color));
        self.ctx.fill_path(&bezpath_to_cpu(path));
        self.shapes += 1;
    }

    fn fill_radial(&mut self, gradient: &RadialGradient, bounds: Rect) {
        let bounds = bounds.abs();
        if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            return;
        }
        let iw = bounds.width().ceil().clamp(1.0, MAX_GRADIENT_SIDE) as u32;
        let ih = bounds.height().ceil().clamp(1.0, MAX_GRADIENT_SIDE) as u32;
        let key = GradientKey {
            width: iw,
            height: ih,
            center: (
                q16(gradient.center.x - bounds.x0),
                q16(gradient.center.y - bounds.y0),
            ),
            radii: (q16(gradient.inner_radius), q16(gradient.outer_radius)),
            scale: (q16(bounds.width()), q16(bounds.height())),
            inner: gradient.inner.to_premul(),
            outer: gradient.outer.to_premul(),
            clip: gradient.extend == GradientExtend::Clip,
        };
        let paint = self.gradient_image(key, gradient, bounds);

        let xf = self.transform
            * Affine::translate((bounds.x0, bounds.y0))
            * Affine::scale_non_uniform(
                bounds.width() / f64::from(iw),
                bounds.height() / f64::from(ih),
            );
        self.prepare(xf);
        self.ctx.set_paint(paint);
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(iw),
            f64::from(ih),
        ));
        self.shapes += 1;
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
        self.shapes
    }
}

fn color_to_cpu(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
