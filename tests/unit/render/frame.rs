use super::*;
use crate::render::cpu::CpuPainter;
use crate::render::painter::RecordingPainter;
use crate::render::surface::Viewport;

fn renderer() -> SceneRenderer {
    let table = SceneTable::new(
        vec![
            SceneEntry::new(0, 20_000, SceneKind::ForestHouse),
            SceneEntry::new(20_000, 40_000, SceneKind::HallwayDoll),
            SceneEntry::new(40_000, 60_000, SceneKind::Stairwell).blank_on_cutoff(),
        ],
        TimeMs(54_000),
        TimeMs(60_000),
    )
    .unwrap();
    SceneRenderer::new(table, Look::default(), 7)
}

fn surface() -> Surface {
    Surface::fit(Viewport::new(320, 180), 2.0)
}

#[test]
fn draws_base_grain_vignette_then_scene() {
    let r = renderer();
    let mut p = RecordingPainter::new(320, 180);
    let out = r.draw(&mut p, TimeMs(5_000), surface(), false);
    assert_eq!(out.scene, Some(SceneKind::ForestHouse));
    assert_eq!(out.scene_index, Some(0));
    assert_eq!(p.colors()[0], Rgba8::rgb(6, 6, 6));
    assert_eq!(p.counts().gradients, 1);
    // 4 fog banks, 20 trees, house, roof, window
    assert_eq!(out.scene_shapes, 27);
    assert_eq!(p.shapes_drawn(), 1 + out.grain + 1 + out.scene_shapes);
}

#[test]
fn grain_count_follows_area_and_flicker() {
    let g = Look::default().grain;
    assert_eq!(g.count(1000, 1000, TimeMs(0)), 20);
    let peak = g.count(1000, 1000, TimeMs(1_571));
    assert!(peak >= 39, "peak {peak}");
}

#[test]
fn blank_on_cutoff_scene_draws_nothing() {
    let r = renderer();
    let mut p = RecordingPainter::new(320, 180);
    let live = r.draw(&mut p, TimeMs(50_000), surface(), false);
    assert_eq!(live.scene, Some(SceneKind::Stairwell));
    assert!(live.scene_shapes > 20);
    let cut = r.draw(&mut p, TimeMs(55_000), surface(), true);
    assert_eq!(cut.scene, None);
    assert_eq!(cut.scene_index, Some(2));
    assert_eq!(cut.scene_shapes, 0);
}

#[test]
fn other_scenes_ignore_cutoff() {
    let r = renderer();
    let mut p = RecordingPainter::new(320, 180);
    let out = r.draw(&mut p, TimeMs(30_000), surface(), true);
    assert_eq!(out.scene, Some(SceneKind::HallwayDoll));
    assert_eq!(p.depth(), 0);
}

#[test]
fn scene_local_time_is_relative_to_range_start() {
    struct Probe(std::rc::Rc<std::cell::Cell<u64>>);
    impl SceneDraw for Probe {
        fn draw(&self, _p: &mut dyn Painter, ctx: &FrameCtx) {
            self.0.set(ctx.local.0);
        }
    }
    let seen = std::rc::Rc::new(std::cell::Cell::new(0));
    let mut r = renderer();
    r.set_routine(1, Box::new(Probe(seen.clone()))).unwrap();
    assert!(r.set_routine(9, Box::new(Probe(seen.clone()))).is_err());
    let mut p = RecordingPainter::new(320, 180);
    r.draw(&mut p, TimeMs(29_500), surface(), false);
    assert_eq!(seen.get(), 9_500);
}

#[test]
fn cpu_frames_are_deterministic_per_elapsed_time() {
    let r = renderer();
    let s = surface();
    let mut p = CpuPainter::new(s.width, s.height).unwrap();
    let mut render = |t: u64| {
        p.begin_frame();
        r.draw(&mut p, TimeMs(t), s, false);
        p.finish()
    };
    let a = render(41_234);
    let b = render(9_000);
    let c = render(41_234);
    assert_eq!(a, c);
    assert_ne!(a, b);
    assert_eq!(a.pixel(0, 0).map(|px| px[3]), Some(255));
}
