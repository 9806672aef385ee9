use crate::foundation::core::{Affine, Point, Rect, Rgba8, TimeMs};
use crate::foundation::math::hash_centered;
use crate::render::frame::FrameCtx;
use crate::render::painter::Painter;
use crate::scenes::SceneDraw;

const STAIR_COUNT: u32 = 20;

/// True during the 120 ms the figure is visible, at scene time `t`.
pub fn figure_visible(t: TimeMs) -> bool {
    t.0 > 10_000 && t.0 < 10_120
}

/// Descending stairs under a shaking camera.
#[derive(Clone, Copy, Debug, Default)]
pub struct Stairwell;

impl SceneDraw for Stairwell {
    fn draw(&self, p: &mut dyn Painter, ctx: &FrameCtx) {
        let (w, h, dpr) = (ctx.width(), ctx.height(), ctx.dpr());
        let t = ctx.local.as_f64();

        let intensity = (t / 4_000.0).min(1.0) * 5.0;
        let jitter = |k: u64| hash_centered(ctx.seed, ctx.elapsed.0, k);
        let jx = jitter(0) * intensity * dpr * 6.0;
        let jy = jitter(1) * intensity * dpr * 6.0;
        let rot = jitter(2) * 0.02 * intensity;
        p.push_transform(
            Affine::translate((w / 2.0, h / 2.0))
                * Affine::rotate(rot)
                * Affine::translate((-w / 2.0 + jx, -h / 2.0 + jy)),
        );

        p.fill_rect(Rect::new(0.0, 0.0, w, h), Rgba8::rgb(8, 8, 8));
        let stair = Rgba8::rgb(15, 15, 15);
        for i in 0..STAIR_COUNT {
            let fi = f64::from(i);
            let y = h * 0.2 + fi * (h * 0.03 + ((t * 0.01 + fi) * 0.2).sin());
            p.stroke_line(
                Point::new(w * 0.2, y),
                Point::new(w * 0.8, y + 10.0),
                4.0 * dpr,
                stair,
            );
        }

        if figure_visible(ctx.local) {
            p.fill_rect(
                Rect::new(w * 0.45, h * 0.72, w * 0.55, h * 0.92),
                Rgba8::rgb(11, 11, 11),
            );
            let eyes = Rgba8::rgba(200, 30, 30, 0.95);
            p.fill_circle(Point::new(w * 0.48, h * 0.78), 4.0 * dpr, eyes);
            p.fill_circle(Point::new(w * 0.52, h * 0.78), 4.0 * dpr, eyes);
        }

        p.pop_transform();
    }
}
