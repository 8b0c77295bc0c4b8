use std::collections::BTreeSet;

use ricochet_geom::{
    line_line_intersection, parametric_t, point_side_of_line, PointKey, Scene, Segment, SightRay,
    SourcePoint, SurfaceId, Vec2,
};

use crate::order::{AngularOrder, SweepVertex};
use crate::Window;

/// Bound on how many chain endpoints a single cast may pass through.
const CONTINUATION_CAP: usize = 8;

struct Target {
    source: SourcePoint,
    pos: Vec2,
    /// Surfaces this target belongs to; they never block their own target.
    own: [Option<SurfaceId>; 2],
    /// Chain endpoints emit continuation rays; junctions do not.
    continues: bool,
}

struct Cone {
    right: Vec2,
    left: Vec2,
    right_is_start: bool,
    origin_side: f64,
    segment: Segment,
}

fn cone_through(origin: Vec2, window: &Window) -> Option<Cone> {
    let da = window.segment.start - origin;
    let db = window.segment.end - origin;
    let c = da.cross(db);
    let origin_side = point_side_of_line(origin, window.segment.start, window.segment.end);
    if c == 0.0 || origin_side == 0.0 {
        // Origin on the window line (or a degenerate window): no cone.
        return None;
    }
    let (right, left, right_is_start) = if c > 0.0 {
        (da, db, true)
    } else {
        (db, da, false)
    };
    Some(Cone {
        right,
        left,
        right_is_start,
        origin_side,
        segment: window.segment,
    })
}

impl Cone {
    fn admits(&self, pos: Vec2, origin: Vec2) -> bool {
        let v = pos - origin;
        if self.right.cross(v) < 0.0 || self.left.cross(v) > 0.0 {
            return false;
        }
        // Only what lies strictly past the window is lit.
        point_side_of_line(pos, self.segment.start, self.segment.end) * self.origin_side < 0.0
    }
}

fn collect_targets(scene: &Scene) -> Vec<Target> {
    let mut out = Vec::new();
    for chain in scene.chains() {
        if let Some(terminals) = chain.terminal_endpoints() {
            for (source, pos) in terminals {
                let own = [source.surface().cloned(), None];
                out.push(Target {
                    source,
                    pos,
                    own,
                    continues: true,
                });
            }
        }
        for index in 0..chain.junction_count() {
            let (a, b) = chain.junction_surfaces(index);
            out.push(Target {
                source: SourcePoint::Junction {
                    chain: chain.id(),
                    index,
                },
                pos: chain.junction_position(index),
                own: [Some(a.id().clone()), Some(b.id().clone())],
                continues: false,
            });
        }
    }
    out
}

fn excluded(own: &[Option<SurfaceId>; 2], carrier: Option<&SurfaceId>, id: &SurfaceId) -> bool {
    own.iter().flatten().any(|o| o == id) || carrier == Some(id)
}

/// Whether a hit exactly on a segment boundary grazes past instead of
/// stopping there.
///
/// A free chain end never blocks (the chain lies wholly on one side of the
/// ray), and a junction lets the ray through exactly when the origin lies on
/// opposite reflective sides of the two meeting members. Boundary detection
/// is exact: only a bit-exact `s` of 0 or 1 is a boundary, so the decision
/// never consults a tolerance.
fn passes_boundary_hit(scene: &Scene, origin: Vec2, surface: &SurfaceId, s: f64) -> bool {
    if s != 0.0 && s != 1.0 {
        return false;
    }
    let Some((chain, index)) = scene.surface_chain(surface) else {
        return false;
    };
    let last = chain.surfaces().len() - 1;
    let terminal = !chain.is_closed() && ((s == 0.0 && index == 0) || (s == 1.0 && index == last));
    if terminal {
        return true;
    }
    let junction = if s == 1.0 {
        index as u32
    } else if index == 0 {
        // Closed-chain seam.
        chain.junction_count() - 1
    } else {
        index as u32 - 1
    };
    let (a, b) = chain.junction_surfaces(junction);
    a.normal_side(origin) * b.normal_side(origin) < 0.0
}

/// Nearest hit strictly inside `(t_min, t_max)` along `origin + t * dir`.
///
/// With `solid_only`, hits that graze a boundary (see
/// [`passes_boundary_hit`]) are not considered: they cannot block a target.
#[allow(clippy::too_many_arguments)]
fn nearest_hit(
    scene: &Scene,
    origin: Vec2,
    dir: Vec2,
    t_min: f64,
    t_max: f64,
    own: &[Option<SurfaceId>; 2],
    carrier: Option<&SurfaceId>,
    solid_only: bool,
) -> Option<(f64, f64, SurfaceId)> {
    let mut best: Option<(f64, f64, SurfaceId)> = None;
    for surface in scene.surfaces() {
        if excluded(own, carrier, surface.id()) {
            continue;
        }
        let seg = surface.segment();
        let Some(h) = line_line_intersection(origin, dir, seg.start, seg.end) else {
            continue;
        };
        if h.t <= t_min || h.t >= t_max || !(0.0..=1.0).contains(&h.s) {
            continue;
        }
        if solid_only && passes_boundary_hit(scene, origin, surface.id(), h.s) {
            continue;
        }
        if best.as_ref().map_or(true, |(bt, _, _)| h.t < *bt) {
            best = Some((h.t, h.s, surface.id().clone()));
        }
    }
    best
}

/// Whether `pos` sits strictly inside some other surface's segment.
fn rests_on_other_interior(scene: &Scene, pos: Vec2, own: &[Option<SurfaceId>; 2]) -> bool {
    for surface in scene.surfaces() {
        if own.iter().flatten().any(|o| o == surface.id()) {
            continue;
        }
        let seg = surface.segment();
        if point_side_of_line(pos, seg.start, seg.end) == 0.0 {
            let s = parametric_t(pos, seg.start, seg.end);
            if s > 0.0 && s < 1.0 {
                return true;
            }
        }
    }
    false
}

fn cast_to_target(
    out: &mut Vec<SweepVertex>,
    scene: &Scene,
    origin: Vec2,
    target: &Target,
    carrier: Option<&SurfaceId>,
) {
    let dir = target.pos - origin;
    match nearest_hit(scene, origin, dir, 0.0, 1.0, &target.own, carrier, true) {
        Some((t, s, surface)) => {
            out.push(SweepVertex {
                pos: origin + dir * t,
                source: SourcePoint::Hit {
                    ray: SightRay::new(origin, target.pos),
                    surface,
                    t,
                    s,
                },
            });
        }
        None => {
            out.push(SweepVertex {
                source: target.source.clone(),
                pos: target.pos,
            });
            if target.continues && !rests_on_other_interior(scene, target.pos, &target.own) {
                continuation(out, scene, origin, target, carrier);
            }
        }
    }
}

/// Cast past an unblocked chain endpoint to the next obstacle, passing
/// through further exactly-grazed endpoints and junctions up to a small cap.
fn continuation(
    out: &mut Vec<SweepVertex>,
    scene: &Scene,
    origin: Vec2,
    target: &Target,
    carrier: Option<&SurfaceId>,
) {
    let dir = target.pos - origin;
    let mut own = target.own.clone();
    let mut t_min = 1.0;
    for _ in 0..CONTINUATION_CAP {
        let Some((t, s, surface)) =
            nearest_hit(scene, origin, dir, t_min, f64::INFINITY, &own, carrier, false)
        else {
            return;
        };
        out.push(SweepVertex {
            pos: origin + dir * t,
            source: SourcePoint::Hit {
                ray: SightRay::new(origin, target.pos),
                surface: surface.clone(),
                t,
                s,
            },
        });
        if !passes_boundary_hit(scene, origin, &surface, s) {
            return;
        }
        own = [Some(surface), None];
        t_min = t;
    }
}

fn dedup_exact(vertices: Vec<SweepVertex>) -> Vec<SweepVertex> {
    let mut seen: BTreeSet<PointKey> = BTreeSet::new();
    let mut out = Vec::with_capacity(vertices.len());
    for v in vertices {
        if seen.insert(v.pos.key()) {
            out.push(v);
        }
    }
    out
}

/// Visibility polygon of `origin`, full-cone or constrained to a window.
///
/// Vertices are returned in counter-clockwise order; for a windowed cone the
/// first and last vertices are the window endpoints (right edge first), so
/// the polygon closes along the window. An empty result means the cone is
/// degenerate or nothing is visible.
pub fn visibility_polygon(
    scene: &Scene,
    origin: Vec2,
    window: Option<&Window>,
) -> Vec<SweepVertex> {
    let cone = match window {
        Some(w) => match cone_through(origin, w) {
            Some(c) => Some(c),
            None => return Vec::new(),
        },
        None => None,
    };
    let carrier = window.and_then(|w| w.carrier.as_ref());
    let reference = cone.as_ref().map_or(Vec2::new(1.0, 0.0), |c| c.right);
    let order = AngularOrder::new(origin, reference, scene);

    let mut middle = Vec::new();
    for target in collect_targets(scene) {
        if target.pos == origin {
            continue;
        }
        if let Some(c) = &cone {
            if !c.admits(target.pos, origin) {
                continue;
            }
        }
        cast_to_target(&mut middle, scene, origin, &target, carrier);
    }
    middle.sort_by(|a, b| order.compare(a, b));

    let Some(window) = window else {
        return dedup_exact(middle);
    };
    let cone = cone.expect("windowed sweep always has a cone");

    // Window endpoints are in-cone by provenance and close the polygon: the
    // right-edge endpoint leads, the left-edge endpoint trails.
    let (right_src, right_pos, left_src, left_pos) = if cone.right_is_start {
        (
            window.start_source.clone(),
            window.segment.start,
            window.end_source.clone(),
            window.segment.end,
        )
    } else {
        (
            window.end_source.clone(),
            window.segment.end,
            window.start_source.clone(),
            window.segment.start,
        )
    };
    let window_own = |src: &SourcePoint| [src.surface().cloned(), None];
    let cast_endpoint = |src: SourcePoint, pos: Vec2| -> SweepVertex {
        let dir = pos - origin;
        match nearest_hit(scene, origin, dir, 0.0, 1.0, &window_own(&src), carrier, true) {
            Some((t, s, surface)) => SweepVertex {
                pos: origin + dir * t,
                source: SourcePoint::Hit {
                    ray: SightRay::new(origin, pos),
                    surface,
                    t,
                    s,
                },
            },
            None => SweepVertex { source: src, pos },
        }
    };

    let right = cast_endpoint(right_src, right_pos);
    let left = cast_endpoint(left_src, left_pos);

    // Window edges are shadow boundaries of their own: past an unblocked
    // window endpoint the lit region extends along the edge to the next
    // obstacle, which closes the cone even when no target falls inside it.
    let edge_continuation = |endpoint: &SweepVertex, pos: Vec2| -> Option<SweepVertex> {
        if endpoint.pos != pos {
            // The endpoint itself was blocked; the blocker bounds the edge.
            return None;
        }
        let own = window_own(&endpoint.source);
        if rests_on_other_interior(scene, pos, &own) {
            return None;
        }
        // A surface attached to the window endpoint and rising past the
        // window bounds this side of the cone itself; the boundary follows
        // the surface, not the edge ray.
        for surface in scene.surfaces() {
            if carrier == Some(surface.id()) {
                continue;
            }
            let seg = surface.segment();
            let other = if seg.start == pos {
                seg.end
            } else if seg.end == pos {
                seg.start
            } else {
                continue;
            };
            if point_side_of_line(other, cone.segment.start, cone.segment.end) * cone.origin_side
                < 0.0
            {
                return None;
            }
        }
        let dir = pos - origin;
        let (t, s, surface) =
            nearest_hit(scene, origin, dir, 1.0, f64::INFINITY, &own, carrier, false)?;
        Some(SweepVertex {
            pos: origin + dir * t,
            source: SourcePoint::Hit {
                ray: SightRay::new(origin, pos),
                surface,
                t,
                s,
            },
        })
    };
    let right_continuation = edge_continuation(&right, right_pos);
    let left_continuation = edge_continuation(&left, left_pos);

    let mut assembled = Vec::with_capacity(middle.len() + 4);
    assembled.push(right);
    assembled.extend(right_continuation);
    assembled.extend(middle);
    let mut assembled = dedup_exact(assembled);
    if let Some(v) = left_continuation {
        if !assembled.iter().any(|kept| kept.pos.key() == v.pos.key()) {
            assembled.push(v);
        }
    }
    assembled.retain(|v| v.pos.key() != left.pos.key());
    assembled.push(left);
    assembled
}
