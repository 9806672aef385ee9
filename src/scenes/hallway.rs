use crate::foundation::core::{Affine, Point, Rect, Rgba8, TimeMs};
use crate::render::frame::FrameCtx;
use crate::render::painter::{GradientExtend, Painter, RadialGradient};
use crate::scenes::SceneDraw;

/// Doll zoom factor at scene time `t`: grows linearly, capped at 1.15.
pub fn zoom_at(t: TimeMs) -> f64 {
    1.0 + (t.as_f64() / 80_000.0).min(0.15)
}

/// Doll head rotation in radians at scene time `t`. Still for the first ten seconds.
pub fn head_tilt(t: TimeMs) -> f64 {
    let ms = t.as_f64();
    if ms > 10_000.0 {
        ((ms - 10_000.0) * 0.001).sin() * 0.08
    } else {
        0.0
    }
}

/// Hallway, oil lamp and the doll.
#[derive(Clone, Copy, Debug, Default)]
pub struct HallwayDoll;

impl SceneDraw for HallwayDoll {
    fn draw(&self, p: &mut dyn Painter, ctx: &FrameCtx) {
        let (w, h, dpr) = (ctx.width(), ctx.height(), ctx.dpr());
        let t = ctx.local.as_f64();

        p.fill_rect(Rect::new(0.0, 0.0, w, h), Rgba8::rgb(11, 11, 11));

        let wall = Rgba8::rgb(17, 17, 17);
        p.stroke_line(
            Point::new(w * 0.15, h),
            Point::new(w * 0.45, h * 0.35),
            3.0 * dpr,
            wall,
        );
        p.stroke_line(
            Point::new(w * 0.85, h),
            Point::new(w * 0.55, h * 0.35),
            3.0 * dpr,
            wall,
        );

        let table_y = h * 0.65;
        p.fill_rect(
            Rect::new(w * 0.4, table_y, w * 0.6, table_y + 12.0 * dpr),
            Rgba8::rgb(10, 10, 10),
        );

        let glow = 40.0 + (t * 0.01).sin() * 6.0;
        let lamp = RadialGradient {
            center: Point::new(w * 0.5, table_y - 10.0 * dpr),
            inner_radius: 2.0,
            outer_radius: glow * dpr,
            inner: Rgba8::rgba(255, 180, 90, 0.8),
            outer: Rgba8::rgba(30, 15, 0, 0.0),
            extend: GradientExtend::Clip,
        };
        p.fill_radial(&lamp, lamp.outer_bounds());

        let zoom = zoom_at(ctx.local);
        p.push_transform(
            Affine::translate((w / 2.0, h / 2.0))
                * Affine::scale(zoom)
                * Affine::translate((-w / 2.0, -h / 2.0)),
        );

        p.fill_rect(
            Rect::new(w * 0.49, h * 0.54, w * 0.49 + 20.0 * dpr, h * 0.54 + 38.0 * dpr),
            Rgba8::rgb(14, 14, 14),
        );

        p.push_transform(Affine::translate((w * 0.5, h * 0.5)) * Affine::rotate(head_tilt(ctx.local)));
        p.fill_circle(Point::ORIGIN, 16.0 * dpr, Rgba8::rgb(21, 21, 21));
        let eye = Rgba8::rgb(208, 208, 208);
        p.fill_circle(Point::new(-6.0 * dpr, -2.0 * dpr), 2.5 * dpr, eye);
        p.fill_circle(Point::new(6.0 * dpr, -2.0 * dpr), 2.5 * dpr, eye);
        p.pop_transform();

        p.pop_transform();

        // Frame tear right before the cut.
        if t > 19_000.0 {
            p.fill_rect(Rect::new(0.0, 0.0, w, 2.0 * dpr), Rgba8::rgba(120, 0, 0, 0.04));
        }
    }
}
