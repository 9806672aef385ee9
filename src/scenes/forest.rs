use crate::foundation::core::{Point, Rect, Rgba8, TimeMs, Vec2};
use crate::foundation::math::hash_unit;
use crate::render::frame::FrameCtx;
use crate::render::painter::Painter;
use crate::scenes::SceneDraw;

const TREE_COUNT: u64 = 20;

/// True while the house window shows its red flicker at scene time `t`.
pub fn window_lit(t: TimeMs) -> bool {
    let ms = t.as_f64();
    ms > 7_800.0 && ms < 10_800.0 && (ms * 0.06).sin() > 0.2
}

/// Fog bank, tree line and a house silhouette.
#[derive(Clone, Copy, Debug, Default)]
pub struct ForestHouse;

impl SceneDraw for ForestHouse {
    fn draw(&self, p: &mut dyn Painter, ctx: &FrameCtx) {
        let (w, h, dpr) = (ctx.width(), ctx.height(), ctx.dpr());
        let t = ctx.local.as_f64();

        for i in 0..4 {
            let fi = f64::from(i);
            let y = h * 0.6 + (t * 0.0003 + fi * 1.3).sin() * 10.0 * dpr;
            p.fill_ellipse(
                Point::new(w * 0.5 + (t * 0.0002 + fi).sin() * 50.0, y + fi * 18.0),
                Vec2::new(w * 0.7, 80.0 + fi * 20.0),
                Rgba8::rgba(180, 180, 180, 0.03 + fi * 0.02),
            );
        }

        // Tree heights are resampled every frame, which reads as a restless tree line.
        for i in 0..TREE_COUNT {
            let fi = i as f64;
            let x = (fi / (TREE_COUNT - 1) as f64) * w + (fi * 12.3).sin() * 10.0;
            let height = h * (0.3 + hash_unit(ctx.seed, ctx.elapsed.0, i) * 0.2);
            p.fill_rect(
                Rect::new(x, h - height, x + 6.0 * dpr, h),
                Rgba8::rgb(3, 3, 3),
            );
        }

        let house_w = w * 0.22;
        let house_h = h * 0.22;
        let hx = w * 0.5 - house_w / 2.0;
        let hy = h * 0.6 - house_h;
        p.fill_rect(
            Rect::new(hx, hy, hx + house_w, hy + house_h),
            Rgba8::rgb(7, 7, 7),
        );

        let mut roof = kurbo::BezPath::new();
        roof.move_to((hx - 10.0, hy));
        roof.line_to((hx + house_w / 2.0, hy - house_h * 0.4));
        roof.line_to((hx + house_w + 10.0, hy));
        roof.close_path();
        p.fill_path(&roof, Rgba8::rgb(6, 6, 6));

        let wx = hx + house_w * 0.68;
        let wy = hy + house_h * 0.12;
        let window = Rect::new(wx, wy, wx + house_w * 0.16, wy + house_h * 0.22);
        let color = if window_lit(ctx.local) {
            Rgba8::rgba(220, 30, 30, 0.9)
        } else {
            Rgba8::rgba(20, 20, 20, 0.6)
        };
        p.fill_rect(window, color);
    }
}
