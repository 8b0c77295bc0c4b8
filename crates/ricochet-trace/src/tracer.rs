use ricochet_geom::{
    line_line_intersection, LineHit, ReflectionCache, Scene, Surface, SurfaceHit, SurfaceId,
    SurfaceKind, Vec2,
};

use crate::images::build_backward;
use crate::path::{PathSegment, PhysicsSegment, PlanAlignment, Termination, TraceParams, UnifiedPath};
use crate::planned::build_planned_path;

/// Launch direction for the actual trace.
///
/// With an empty plan the projectile aims straight at the cursor; otherwise
/// it aims at the deepest cursor image. Degenerate geometry falls back to the
/// first surface's midpoint, then to the cursor, then to +x.
pub fn initial_direction(
    avatar: Vec2,
    cursor: Vec2,
    active: &[&Surface],
    cache: &mut ReflectionCache,
) -> Vec2 {
    let fallback = || {
        (cursor - avatar)
            .normalized()
            .unwrap_or(Vec2::new(1.0, 0.0))
    };
    if active.is_empty() {
        return fallback();
    }
    let backward = build_backward(cursor, active, cache);
    if let Some(dir) = (backward.at_depth(active.len()) - avatar).normalized() {
        return dir;
    }
    if let Some(dir) = (active[0].segment().midpoint() - avatar).normalized() {
        return dir;
    }
    fallback()
}

/// Physics-only specular trace: real on-segment hits reflect, walls stop,
/// bounds terminate. No plan, no cursor.
pub fn trace_physics(
    origin: Vec2,
    dir: Vec2,
    scene: &Scene,
    params: &TraceParams,
) -> Vec<PhysicsSegment> {
    let mut out = Vec::new();
    let Some(mut dir) = dir.normalized() else {
        return out;
    };
    let mut pos = origin;
    let mut travelled = 0.0;
    let mut last: Option<SurfaceId> = None;

    for _bounce in 0..params.max_reflections {
        let remaining = params.max_distance - travelled;
        if remaining <= 0.0 {
            break;
        }
        match scene.first_hit(pos, dir, last.as_ref()) {
            Some(hit) if hit.t <= remaining => {
                if hit.kind == SurfaceKind::Wall {
                    out.push(PhysicsSegment {
                        start: pos,
                        end: hit.point,
                        end_surface: Some(hit.surface.clone()),
                        hit_on_segment: true,
                        termination: Termination::WallHit(hit.surface),
                    });
                    return out;
                }
                out.push(PhysicsSegment {
                    start: pos,
                    end: hit.point,
                    end_surface: Some(hit.surface.clone()),
                    hit_on_segment: true,
                    termination: Termination::None,
                });
                let surface = scene
                    .surface(&hit.surface)
                    .unwrap_or_else(|| panic!("hit surface {} not present in scene", hit.surface));
                dir = surface.reflect_travel_direction(dir);
                travelled += hit.t;
                pos = hit.point;
                last = Some(hit.surface);
            }
            _ => {
                out.push(PhysicsSegment {
                    start: pos,
                    end: pos + dir * remaining,
                    end_surface: None,
                    hit_on_segment: false,
                    termination: Termination::MaxDistance,
                });
                return out;
            }
        }
    }
    if let Some(last_segment) = out.last_mut() {
        if last_segment.termination == Termination::None {
            last_segment.termination = Termination::MaxReflections;
        }
    }
    out
}

enum SegmentEnd {
    /// The expected planned surface's line ends the segment, possibly off the
    /// real segment.
    Expected {
        point: Vec2,
        t: f64,
        on_segment: bool,
    },
    Physical(SurfaceHit),
    Open,
}

/// Trace the actual trajectory along the planned launch direction, comparing
/// it to the plan in the same pass.
///
/// `active` is the bypass evaluator's output in plan order. The trace accepts
/// only on-segment physical hits, but when the expected planned surface's
/// (extended) line is crossed strictly before any physical hit, the crossing
/// ends the segment instead, with `hit_on_segment` flagging whether the plan
/// stayed physical.
pub fn trace(
    avatar: Vec2,
    cursor: Vec2,
    active: &[&Surface],
    scene: &Scene,
    params: &TraceParams,
    cache: &mut ReflectionCache,
) -> UnifiedPath {
    let planned = build_planned_path(avatar, cursor, active, cache);
    let dir0 = initial_direction(avatar, cursor, active, cache);

    let mut path = UnifiedPath {
        planned_surface_count: active.len(),
        waypoint_sources: planned.waypoint_sources,
        actual_physics_segments: trace_physics(avatar, dir0, scene, params),
        ..Default::default()
    };

    let mut pos = avatar;
    let mut dir = dir0;
    let mut travelled = 0.0;
    let mut last: Option<SurfaceId> = None;
    let mut next_expected = 0usize;
    let mut has_diverged = false;
    let mut unplanned_tail = false;

    for _bounce in 0..params.max_reflections {
        let remaining = params.max_distance - travelled;
        if remaining <= 0.0 {
            break;
        }

        let physical = scene.first_hit(pos, dir, last.as_ref());
        let planned_line = if !has_diverged && next_expected < active.len() {
            let seg = active[next_expected].segment();
            line_line_intersection(pos, dir, seg.start, seg.end).filter(|h| h.t > 0.0)
        } else {
            None
        };

        let expected_from = |h: LineHit| SegmentEnd::Expected {
            point: h.point,
            t: h.t,
            on_segment: (0.0..=1.0).contains(&h.s),
        };
        let end = match (planned_line, physical) {
            (Some(pl), Some(ph)) if pl.t < ph.t => expected_from(pl),
            (Some(pl), None) => expected_from(pl),
            (_, Some(ph)) => {
                if !has_diverged
                    && next_expected < active.len()
                    && ph.surface == *active[next_expected].id()
                {
                    SegmentEnd::Expected {
                        point: ph.point,
                        t: ph.t,
                        on_segment: true,
                    }
                } else {
                    SegmentEnd::Physical(ph)
                }
            }
            (None, None) => SegmentEnd::Open,
        };

        let end_t = match &end {
            SegmentEnd::Expected { t, .. } => *t,
            SegmentEnd::Physical(h) => h.t,
            SegmentEnd::Open => remaining,
        };

        // The cursor can only terminate the path once every planned surface
        // has been consumed and the trace is still on plan.
        if next_expected >= active.len() && !has_diverged {
            let t_c = (cursor - pos).dot(dir);
            if t_c >= 0.0 && t_c <= end_t.min(remaining) {
                let on_ray = pos + dir * t_c;
                if on_ray.distance(cursor) < params.cursor_snap_distance {
                    path.segments.push(PathSegment {
                        start: pos,
                        end: on_ray,
                        end_surface: None,
                        hit_on_segment: false,
                        plan_alignment: if unplanned_tail {
                            PlanAlignment::Unplanned
                        } else {
                            PlanAlignment::Aligned
                        },
                        termination: Termination::CursorReached,
                    });
                    path.cursor_segment_index = Some(path.segments.len() - 1);
                    path.cursor_t = 1.0;
                    break;
                }
            }
        }

        if end_t > remaining {
            path.segments.push(PathSegment {
                start: pos,
                end: pos + dir * remaining,
                end_surface: None,
                hit_on_segment: false,
                plan_alignment: PlanAlignment::Diverged,
                termination: Termination::MaxDistance,
            });
            break;
        }

        match end {
            SegmentEnd::Open => {
                path.segments.push(PathSegment {
                    start: pos,
                    end: pos + dir * remaining,
                    end_surface: None,
                    hit_on_segment: false,
                    plan_alignment: PlanAlignment::Diverged,
                    termination: Termination::MaxDistance,
                });
                break;
            }
            SegmentEnd::Expected { point, t, on_segment } => {
                // Only reachable while the trace is still on plan.
                let surface = active[next_expected];
                path.segments.push(PathSegment {
                    start: pos,
                    end: point,
                    end_surface: Some(surface.id().clone()),
                    hit_on_segment: on_segment,
                    plan_alignment: PlanAlignment::Aligned,
                    termination: Termination::None,
                });
                next_expected += 1;
                if !on_segment {
                    // The plan continued off the real surface: physics and
                    // plan part ways here.
                    path.physics_divergence_index = Some(path.segments.len() - 1);
                    has_diverged = true;
                }
                travelled += t;
                pos = point;
                dir = surface.reflect_travel_direction(dir);
                last = Some(surface.id().clone());
            }
            SegmentEnd::Physical(hit) => {
                if hit.kind == SurfaceKind::Wall {
                    path.segments.push(PathSegment {
                        start: pos,
                        end: hit.point,
                        end_surface: Some(hit.surface.clone()),
                        hit_on_segment: true,
                        plan_alignment: PlanAlignment::Diverged,
                        termination: Termination::WallHit(hit.surface),
                    });
                    break;
                }
                let alignment = if has_diverged {
                    PlanAlignment::Diverged
                } else if !active.is_empty() {
                    // A planned surface out of order, or a foreign reflector
                    // while a plan is pending: the plan is lost either way.
                    has_diverged = true;
                    PlanAlignment::Diverged
                } else {
                    unplanned_tail = true;
                    PlanAlignment::Unplanned
                };
                path.segments.push(PathSegment {
                    start: pos,
                    end: hit.point,
                    end_surface: Some(hit.surface.clone()),
                    hit_on_segment: true,
                    plan_alignment: alignment,
                    termination: Termination::None,
                });
                let surface = scene
                    .surface(&hit.surface)
                    .unwrap_or_else(|| panic!("hit surface {} not present in scene", hit.surface));
                travelled += hit.t;
                pos = hit.point;
                dir = surface.reflect_travel_direction(dir);
                last = Some(hit.surface);
            }
        }
    }

    if let Some(last_segment) = path.segments.last_mut() {
        if last_segment.termination == Termination::None {
            // Ran out of reflections before anything ended the trace.
            last_segment.termination = Termination::MaxReflections;
            last_segment.plan_alignment = PlanAlignment::Diverged;
        }
    }

    path.planned_consumed = next_expected;
    path.derive_classification();
    path
}
