use ricochet_geom::{
    ChainId, Scene, ScreenBounds, Segment, SightRay, SourcePoint, Surface, SurfaceChain,
    SurfaceEnd, SurfaceKind, Vec2, SCREEN_CHAIN,
};

fn demo_scene() -> Scene {
    let chain = SurfaceChain::new(
        ChainId(0),
        vec![
            Surface::new(
                "a",
                Segment::new(Vec2::new(0.0, 50.0), Vec2::new(100.0, 50.0)),
                SurfaceKind::Reflective,
            ),
            Surface::new(
                "b",
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
fn identity_is_provenance_not_coordinates() {
    let scene = demo_scene();
    let endpoint = SourcePoint::Endpoint {
        surface: "a".into(),
        end: SurfaceEnd::Start,
    };
    let same_spot = SourcePoint::origin(Vec2::new(0.0, 50.0));
    assert_eq!(endpoint.position(&scene), same_spot.position(&scene));
    assert_ne!(endpoint, same_spot);

    let other_end = SourcePoint::Endpoint {
        surface: "a".into(),
        end: SurfaceEnd::End,
    };
    assert_ne!(endpoint, other_end);
    assert_eq!(
        endpoint,
        SourcePoint::Endpoint {
            surface: "a".into(),
            end: SurfaceEnd::Start
        }
    );
}

#[test]
fn hit_points_derive_coordinates_from_their_ray() {
    let ray = SightRay::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0));
    let hit = SourcePoint::Hit {
        ray,
        surface: "a".into(),
        t: 2.5,
        s: 0.25,
    };
    let scene = demo_scene();
    assert_eq!(hit.position(&scene), Vec2::new(25.0, 0.0));

    // Same surface and parameters, different cast: different identity.
    let other = SourcePoint::Hit {
        ray: SightRay::new(Vec2::new(0.0, 1.0), Vec2::new(10.0, 1.0)),
        surface: "a".into(),
        t: 2.5,
        s: 0.25,
    };
    assert_ne!(hit, other);
}

#[test]
fn junctions_expose_shared_endpoints() {
    let scene = demo_scene();
    let junction = SourcePoint::Junction {
        chain: ChainId(0),
        index: 0,
    };
    assert_eq!(junction.position(&scene), Vec2::new(100.0, 50.0));
    assert!(junction.lies_on(&"a".into(), &scene));
    assert!(junction.lies_on(&"b".into(), &scene));
    assert!(!junction.lies_on(&"screen:top".into(), &scene));
}

#[test]
fn screen_corners_are_junctions_of_the_screen_chain() {
    let scene = demo_scene();
    let screen = scene.chain(SCREEN_CHAIN).expect("screen chain");
    let corners: Vec<Vec2> = (0..screen.junction_count())
        .map(|i| screen.junction_position(i))
        .collect();
    assert!(corners.contains(&Vec2::new(0.0, 0.0)));
    assert!(corners.contains(&Vec2::new(400.0, 0.0)));
    assert!(corners.contains(&Vec2::new(400.0, 300.0)));
    assert!(corners.contains(&Vec2::new(0.0, 300.0)));
}

#[test]
#[should_panic(expected = "not present in scene")]
fn unknown_provenance_traps() {
    let scene = demo_scene();
    let stray = SourcePoint::Endpoint {
        surface: "nope".into(),
        end: SurfaceEnd::Start,
    };
    let _ = stray.position(&scene);
}
