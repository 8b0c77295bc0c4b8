#![cfg(feature = "serde")]

use ricochet_geom::{
    ChainId, Scene, ScreenBounds, Segment, Surface, SurfaceChain, SurfaceKind, Vec2,
};

fn demo_scene() -> Scene {
    let chain = SurfaceChain::new(
        ChainId(0),
        vec![
            Surface::new(
                "mirror",
                Segment::new(Vec2::new(0.0, 50.0), Vec2::new(100.0, 50.0)),
                SurfaceKind::Reflective,
            ),
            Surface::new(
                "cap",
                Segment::new(Vec2::new(100.0, 50.0), Vec2::new(100.0, 150.0)),
                SurfaceKind::Wall,
            ),
        ],
    )
    .expect("chain");
    Scene::new(
        vec![chain],
        ScreenBounds::new(Vec2::new(0.0, 0.0), Vec2::new(400.0, 300.0)),
    )
    .expect("scene")
}

#[test]
fn scene_roundtrips_via_serde() {
    let scene = demo_scene();
    let json = serde_json::to_string(&scene).expect("serialize scene");
    let restored: Scene = serde_json::from_str(&json).expect("deserialize scene");
    let restored = restored.reindex().expect("reindex");

    let before = scene.surface(&"mirror".into()).expect("surface");
    let after = restored.surface(&"mirror".into()).expect("surface");
    assert_eq!(before, after);
    assert_eq!(scene.bounds(), restored.bounds());
    assert_eq!(scene.chains().len(), restored.chains().len());

    // Derived queries agree.
    let origin = Vec2::new(50.0, 100.0);
    let dir = Vec2::new(0.0, -1.0);
    assert_eq!(
        scene.first_hit(origin, dir, None),
        restored.first_hit(origin, dir, None)
    );
}
