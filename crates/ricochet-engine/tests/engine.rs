use ricochet_engine::AimEngine;
use ricochet_geom::{
    ChainId, Scene, ScreenBounds, Segment, Surface, SurfaceChain, SurfaceKind, Vec2,
};
use ricochet_vis::WindowConfig;

fn demo_scene() -> Scene {
    let floor = SurfaceChain::new(
        ChainId(0),
        vec![Surface::new(
            "floor",
            Segment::new(Vec2::new(0.0, 0.0), Vec2::new(200.0, 0.0)),
            SurfaceKind::Reflective,
        )],
    )
    .expect("chain");
    Scene::new(
        vec![floor],
        ScreenBounds::new(Vec2::new(-500.0, -500.0), Vec2::new(1000.0, 1000.0)),
    )
    .expect("scene")
}

#[test]
fn repeated_reads_return_the_cached_aggregate() {
    let mut engine = AimEngine::new(demo_scene());
    engine.set_avatar(Vec2::new(0.0, 100.0));
    engine.set_cursor(Vec2::new(200.0, 100.0));
    engine.set_plan(vec!["floor".into()]);

    let first_render = engine.results().render_segments.as_ptr();
    let first_vis = engine.results().visibility.as_ptr();
    // No intervening writes: the buffers are untouched.
    assert_eq!(engine.results().render_segments.as_ptr(), first_render);
    assert_eq!(engine.results().visibility.as_ptr(), first_vis);
}

#[test]
fn cursor_moves_do_not_recompute_visibility() {
    let mut engine = AimEngine::new(demo_scene());
    engine.set_avatar(Vec2::new(0.0, 100.0));
    engine.set_cursor(Vec2::new(200.0, 100.0));
    engine.set_plan(vec!["floor".into()]);

    let vis_before = engine.results().visibility.as_ptr();
    engine.set_cursor(Vec2::new(190.0, 100.0));
    let results = engine.results();
    assert_eq!(
        results.visibility.as_ptr(),
        vis_before,
        "visibility cache survives a cursor move that keeps the plan active"
    );
    let end = results.path.segments.last().expect("segments").end;
    assert!(
        end.distance(Vec2::new(190.0, 100.0)) < 1e-9,
        "the path did recompute: {end:?}"
    );
}

#[test]
fn cursor_moves_that_change_the_bypass_refresh_visibility() {
    let mut engine = AimEngine::new(demo_scene());
    engine.set_avatar(Vec2::new(0.0, 100.0));
    engine.set_cursor(Vec2::new(200.0, 100.0));
    engine.set_plan(vec!["floor".into()]);
    assert_eq!(engine.results().visibility.len(), 2);

    // Dragging the cursor under the floor flips it to wrong-side-last; the
    // active plan empties and the cascade collapses to stage 0.
    engine.set_cursor(Vec2::new(100.0, -50.0));
    let results = engine.results();
    assert!(!results.bypass.bypassed.is_empty());
    assert_eq!(results.visibility.len(), 1);
}

#[test]
fn avatar_moves_recompute_both_pipelines() {
    let mut engine = AimEngine::new(demo_scene());
    engine.set_avatar(Vec2::new(0.0, 100.0));
    engine.set_cursor(Vec2::new(200.0, 100.0));
    engine.set_plan(vec!["floor".into()]);
    assert_eq!(engine.results().visibility[0].origin, Vec2::new(0.0, 100.0));

    engine.set_avatar(Vec2::new(20.0, 100.0));
    let results = engine.results();
    assert_eq!(results.visibility[0].origin, Vec2::new(20.0, 100.0));
    assert_eq!(results.path.segments[0].start, Vec2::new(20.0, 100.0));
}

#[test]
fn window_config_only_touches_visibility() {
    let mut engine = AimEngine::new(demo_scene());
    engine.set_avatar(Vec2::new(100.0, 200.0));
    engine.set_cursor(Vec2::new(150.0, 200.0));

    let path_render = engine.results().render_segments.clone();
    engine.set_window_config(Some(WindowConfig::Single(Segment::new(
        Vec2::new(0.0, 300.0),
        Vec2::new(200.0, 300.0),
    ))));
    let results = engine.results();
    assert_eq!(results.render_segments, path_render);
    assert_eq!(results.visibility[0].windows.len(), 1);
}

#[test]
fn umbrella_holes_produce_one_sub_polygon_each() {
    let mut engine = AimEngine::new(demo_scene());
    engine.set_avatar(Vec2::new(100.0, 200.0));
    engine.set_cursor(Vec2::new(150.0, 200.0));
    engine.set_window_config(Some(WindowConfig::Multi(vec![
        Segment::new(Vec2::new(0.0, 300.0), Vec2::new(80.0, 300.0)),
        Segment::new(Vec2::new(120.0, 300.0), Vec2::new(200.0, 300.0)),
    ])));

    let results = engine.results();
    let stage0 = &results.visibility[0];
    assert_eq!(stage0.windows.len(), 2);
    assert!(stage0.windows.iter().all(|w| w.is_valid));
    assert_eq!(
        stage0.source_points.len(),
        stage0.windows[0].source_points.len() + stage0.windows[1].source_points.len(),
        "stage arrays are the concatenation of the window runs"
    );
}

#[test]
fn scene_swap_resets_the_shared_reflection_cache() {
    let mut engine = AimEngine::new(demo_scene());
    engine.set_avatar(Vec2::new(0.0, 100.0));
    engine.set_cursor(Vec2::new(200.0, 100.0));
    engine.set_plan(vec!["floor".into()]);
    assert!(engine.results().cursor_reachable);

    // Same id, different geometry: stale reflections would aim the shot at
    // the old mirror line.
    let moved = SurfaceChain::new(
        ChainId(0),
        vec![Surface::new(
            "floor",
            Segment::new(Vec2::new(0.0, 50.0), Vec2::new(200.0, 50.0)),
            SurfaceKind::Reflective,
        )],
    )
    .expect("chain");
    let scene = Scene::new(
        vec![moved],
        ScreenBounds::new(Vec2::new(-500.0, -500.0), Vec2::new(1000.0, 1000.0)),
    )
    .expect("scene");
    engine.set_scene(scene);

    let results = engine.results();
    let bounce = results.path.segments[0].end;
    assert!(
        bounce.distance(Vec2::new(100.0, 50.0)) < 1e-9,
        "the bounce follows the new geometry: {bounce:?}"
    );
    assert!(results.cursor_reachable);
}
