use super::*;

#[test]
fn pad_gradient_keeps_outer_color() {
    let g = RadialGradient {
        center: Point::ORIGIN,
        inner_radius: 10.0,
        outer_radius: 20.0,
        inner: Rgba8::transparent(),
        outer: Rgba8::rgba(0, 0, 0, 0.75),
        extend: GradientExtend::Pad,
    };
    assert_eq!(g.color_at(0.0), Some(Rgba8::transparent()));
    assert_eq!(g.color_at(500.0), Some(Rgba8::rgba(0, 0, 0, 0.75)));
    let mid = g.color_at(15.0).unwrap();
    assert!(mid.a > 80 && mid.a < 110, "alpha {}", mid.a);
}

#[test]
fn clip_gradient_paints_nothing_outside() {
    let g = RadialGradient {
        center: Point::ORIGIN,
        inner_radius: 2.0,
        outer_radius: 40.0,
        inner: Rgba8::rgba(255, 180, 90, 0.8),
        outer: Rgba8::rgba(30, 15, 0, 0.0),
        extend: GradientExtend::Clip,
    };
    assert!(g.color_at(40.0).is_some());
    assert!(g.color_at(40.5).is_none());
    assert_eq!(g.outer_bounds(), Rect::new(-40.0, -40.0, 40.0, 40.0));
}

#[test]
fn line_polygon_has_requested_width() {
    let p = line_polygon(Point::new(0.0, 0.0), Point::new(10.0, 0.0), 4.0).unwrap();
    let bb = kurbo::Shape::bounding_box(&p);
    assert_eq!(bb, Rect::new(0.0, -2.0, 10.0, 2.0));
    assert!(line_polygon(Point::ORIGIN, Point::ORIGIN, 4.0).is_none());
}

#[test]
fn recording_painter_counts_and_restores_transforms() {
    let mut p = RecordingPainter::new(64, 32);
    p.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Rgba8::rgb(1, 2, 3));
    p.push_transform(Affine::translate((5.0, 0.0)));
    p.push_transform(Affine::scale(2.0));
    p.fill_circle(Point::ORIGIN, 3.0, Rgba8::rgb(0, 0, 0));
    p.stroke_line(Point::ORIGIN, Point::new(1.0, 1.0), 1.0, Rgba8::rgb(0, 0, 0));
    p.pop_transform();
    p.pop_transform();
    p.pop_transform();
    assert_eq!(p.transform(), Affine::IDENTITY);
    assert_eq!(p.depth(), 0);
    assert_eq!(
        p.counts(),
        ShapeCounts {
            rects: 1,
            paths: 2,
            gradients: 0
        }
    );
    assert_eq!(p.shapes_drawn(), 3);
    assert_eq!(p.size(), (64, 32));
}
