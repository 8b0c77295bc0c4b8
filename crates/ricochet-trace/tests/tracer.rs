use ricochet_geom::{
    ChainId, ReflectionCache, Scene, ScreenBounds, Segment, SourcePoint, Surface, SurfaceChain,
    SurfaceKind, Vec2,
};
use ricochet_trace::{
    build_planned_path, trace, PlanAlignment, Termination, TraceParams,
};

fn seg(ax: f64, ay: f64, bx: f64, by: f64) -> Segment {
    Segment::new(Vec2::new(ax, ay), Vec2::new(bx, by))
}

#[track_caller]
fn assert_close(actual: Vec2, expected: Vec2) {
    assert!(
        actual.distance(expected) < 1e-9,
        "expected {expected:?}, got {actual:?}"
    );
}

fn scene_of(surfaces: Vec<Surface>) -> Scene {
    let chains = surfaces
        .into_iter()
        .enumerate()
        .map(|(i, s)| SurfaceChain::new(ChainId(i as u32), vec![s]).expect("chain"))
        .collect();
    Scene::new(
        chains,
        ScreenBounds::new(Vec2::new(-3000.0, -3000.0), Vec2::new(3000.0, 3000.0)),
    )
    .expect("scene")
}

#[test]
fn direct_shot_with_no_plan() {
    let scene = scene_of(vec![]);
    let mut cache = ReflectionCache::new();
    let path = trace(
        Vec2::new(0.0, 0.0),
        Vec2::new(100.0, 0.0),
        &[],
        &scene,
        &TraceParams::default(),
        &mut cache,
    );

    assert_eq!(path.segments.len(), 1);
    assert_eq!(path.segments[0].start, Vec2::new(0.0, 0.0));
    assert_eq!(path.segments[0].end, Vec2::new(100.0, 0.0));
    assert_eq!(path.segments[0].termination, Termination::CursorReached);
    assert_eq!(path.cursor_segment_index, Some(0));
    assert_eq!(path.cursor_t, 1.0);
    assert!(path.is_fully_aligned);
    assert!(path.cursor_reachable);
    assert_eq!(path.first_diverged_index, None);
    assert_eq!(path.total_length, 100.0);
}

#[test]
fn single_horizontal_bounce_stays_aligned() {
    let floor = Surface::new("s", seg(0.0, 0.0, 200.0, 0.0), SurfaceKind::Reflective);
    let scene = scene_of(vec![floor.clone()]);
    let mut cache = ReflectionCache::new();

    let avatar = Vec2::new(0.0, 100.0);
    let cursor = Vec2::new(200.0, 100.0);

    let planned = build_planned_path(avatar, cursor, &[&floor], &mut cache);
    assert_eq!(
        planned.points,
        vec![avatar, Vec2::new(100.0, 0.0), cursor],
        "three-point planned path"
    );
    assert!(matches!(planned.waypoint_sources[0], SourcePoint::Origin { .. }));
    assert!(matches!(planned.waypoint_sources[1], SourcePoint::Hit { .. }));
    assert!(matches!(planned.waypoint_sources[2], SourcePoint::Origin { .. }));

    let path = trace(avatar, cursor, &[&floor], &scene, &TraceParams::default(), &mut cache);
    assert_eq!(path.segments.len(), 2);
    assert_close(path.segments[0].end, Vec2::new(100.0, 0.0));
    assert!(path.segments[0].hit_on_segment);
    assert_eq!(path.segments[0].plan_alignment, PlanAlignment::Aligned);
    assert_eq!(path.segments[1].termination, Termination::CursorReached);
    assert!(path.is_fully_aligned);
    assert!(path.cursor_reachable);
    assert_eq!(path.planned_consumed, 1);
    assert_eq!(path.waypoint_sources.len(), 3);
}

#[test]
fn wall_before_the_first_planned_surface_diverges() {
    // Mirror reflective-side down, wall across the launch ray.
    let mirror = Surface::new("r", seg(100.0, 50.0, 0.0, 50.0), SurfaceKind::Reflective);
    let wall = Surface::new("w", seg(25.0, 0.0, 25.0, 100.0), SurfaceKind::Wall);
    let scene = scene_of(vec![mirror.clone(), wall.clone()]);
    let mut cache = ReflectionCache::new();

    let path = trace(
        Vec2::new(0.0, 0.0),
        Vec2::new(100.0, 0.0),
        &[&mirror],
        &scene,
        &TraceParams::default(),
        &mut cache,
    );

    assert_eq!(path.segments.len(), 1);
    assert_close(path.segments[0].end, Vec2::new(25.0, 25.0));
    assert_eq!(path.segments[0].termination, Termination::WallHit("w".into()));
    assert_eq!(path.segments[0].plan_alignment, PlanAlignment::Diverged);
    assert_eq!(path.first_diverged_index, Some(0));
    assert!(!path.cursor_reachable);
    assert!(!path.is_fully_aligned);
    assert_eq!(path.planned_consumed, 0);
}

#[test]
fn off_segment_planned_hit_is_a_physics_divergence() {
    // Fed directly (no bypass): the plan reflects off the extension of a
    // surface the projectile flies straight through.
    let mirror = Surface::new("r", seg(600.0, 50.0, 500.0, 50.0), SurfaceKind::Reflective);
    let scene = scene_of(vec![mirror.clone()]);
    let mut cache = ReflectionCache::new();

    let path = trace(
        Vec2::new(0.0, 0.0),
        Vec2::new(200.0, 0.0),
        &[&mirror],
        &scene,
        &TraceParams::default(),
        &mut cache,
    );

    assert_eq!(path.physics_divergence_index, Some(0));
    let first = &path.segments[0];
    assert_close(first.end, Vec2::new(100.0, 50.0));
    assert!(!first.hit_on_segment);
    assert_eq!(first.plan_alignment, PlanAlignment::Aligned);
    assert_eq!(first.end_surface, Some("r".into()));

    // The physics view flies straight through the phantom hit.
    assert_eq!(path.actual_physics_segments.len(), 1);
    let phys = &path.actual_physics_segments[0];
    assert_eq!(phys.start, Vec2::new(0.0, 0.0));
    assert_eq!(phys.end_surface, None);
    assert_eq!(phys.termination, Termination::MaxDistance);
    assert!(!path.cursor_reachable);
}

#[test]
fn trapped_shot_runs_out_of_reflections() {
    // Two facing mirrors, cursor hidden behind one of them.
    let right = Surface::new("m1", seg(10.0, -100.0, 10.0, 100.0), SurfaceKind::Reflective);
    let left = Surface::new("m2", seg(-10.0, 100.0, -10.0, -100.0), SurfaceKind::Reflective);
    let scene = scene_of(vec![right.clone(), left.clone()]);
    let mut cache = ReflectionCache::new();

    let params = TraceParams::default();
    let path = trace(
        Vec2::new(0.0, 0.0),
        Vec2::new(20.0, 0.0),
        &[],
        &scene,
        &params,
        &mut cache,
    );

    assert_eq!(path.segments.len(), params.max_reflections);
    let last = path.segments.last().expect("segments");
    assert_eq!(last.termination, Termination::MaxReflections);
    assert!(!path.cursor_reachable);
    assert!(!path.is_fully_aligned);
    // The first bounce carries no plan, so it is unplanned, not diverged.
    assert_eq!(path.segments[0].plan_alignment, PlanAlignment::Unplanned);
}

#[test]
fn divergence_index_matches_the_segment_tags() {
    let mirror = Surface::new("r", seg(100.0, 50.0, 0.0, 50.0), SurfaceKind::Reflective);
    let wall = Surface::new("w", seg(25.0, 0.0, 25.0, 100.0), SurfaceKind::Wall);
    let scene = scene_of(vec![mirror.clone(), wall.clone()]);
    let mut cache = ReflectionCache::new();

    for (active, cursor) in [
        (vec![], Vec2::new(-50.0, 0.0)),
        (vec![&mirror], Vec2::new(100.0, 0.0)),
    ] {
        let path = trace(
            Vec2::new(-40.0, 0.0),
            cursor,
            &active,
            &scene,
            &TraceParams::default(),
            &mut cache,
        );
        let any_diverged = path
            .segments
            .iter()
            .any(|s| s.plan_alignment == PlanAlignment::Diverged);
        assert_eq!(path.first_diverged_index.is_some(), any_diverged);
        if path.is_fully_aligned {
            assert!(path.cursor_reachable, "aligned paths reach the cursor");
        }
    }
}

#[test]
fn coincident_avatar_and_cursor_is_a_zero_length_hit() {
    let scene = scene_of(vec![]);
    let mut cache = ReflectionCache::new();
    let p = Vec2::new(5.0, 5.0);
    let path = trace(p, p, &[], &scene, &TraceParams::default(), &mut cache);
    assert_eq!(path.cursor_segment_index, Some(0));
    assert_eq!(path.segments[0].start, path.segments[0].end);
    assert!(path.is_fully_aligned);
}
