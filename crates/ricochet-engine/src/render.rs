use ricochet_geom::{line_line_intersection, ReflectionCache, Scene, Surface, Vec2};
use ricochet_trace::{build_planned_path, trace_physics, Termination, TraceParams, UnifiedPath};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PathColor {
    Green,
    Red,
    Yellow,
}

impl PathColor {
    pub fn hex(self) -> u32 {
        match self {
            Self::Green => 0x00FF00,
            Self::Red => 0xFF0000,
            Self::Yellow => 0xFFFF00,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PathStyle {
    Solid,
    Dashed,
}

impl PathStyle {
    pub fn alpha(self) -> f32 {
        match self {
            Self::Solid => 1.0,
            Self::Dashed => 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RenderSegment {
    pub start: Vec2,
    pub end: Vec2,
    pub color: PathColor,
    pub style: PathStyle,
}

/// Drawing sink: the renderer-facing seam of the core.
pub trait RenderSink {
    fn push_segment(&mut self, segment: RenderSegment);
}

impl RenderSink for Vec<RenderSegment> {
    fn push_segment(&mut self, segment: RenderSegment) {
        self.push(segment);
    }
}

fn push(out: &mut impl RenderSink, start: Vec2, end: Vec2, color: PathColor, style: PathStyle) {
    if start != end {
        out.push_segment(RenderSegment {
            start,
            end,
            color,
            style,
        });
    }
}

/// Dashed continuation from `from` along `dir`: reflects off on-segment hits,
/// stops at walls, and is bounded by the projection distance.
fn project(
    out: &mut impl RenderSink,
    scene: &Scene,
    from: Vec2,
    dir: Vec2,
    params: &TraceParams,
    color: PathColor,
) {
    let bounded = TraceParams {
        max_distance: params.projection_distance,
        ..*params
    };
    for seg in trace_physics(from, dir, scene, &bounded) {
        push(out, seg.start, seg.end, color, PathStyle::Dashed);
    }
}

/// Ideal continuation from the divergence point through the remaining plan,
/// drawn solid red to the cursor and dashed red beyond it.
///
/// Remaining surfaces are filtered by a per-surface reflective-side check,
/// stepping the current point through single-hop image hits; the kept list
/// then feeds the full bidirectional builder.
fn replan_red(
    out: &mut impl RenderSink,
    divergence_point: Vec2,
    cursor: Vec2,
    remaining: &[&Surface],
    scene: &Scene,
    params: &TraceParams,
    cache: &mut ReflectionCache,
) {
    let mut kept: Vec<&Surface> = Vec::new();
    let mut current = divergence_point;
    for &surface in remaining {
        if surface.normal_side(current) > 0.0 {
            continue;
        }
        let image = cache.reflect(cursor, surface);
        let seg = surface.segment();
        if let Some(h) = line_line_intersection(current, image - current, seg.start, seg.end) {
            if h.t > 0.0 {
                current = h.point;
                kept.push(surface);
            }
        }
    }

    let planned = build_planned_path(divergence_point, cursor, &kept, cache);
    for w in planned.points.windows(2) {
        push(out, w[0], w[1], PathColor::Red, PathStyle::Solid);
    }
    let mut last_dir = None;
    for w in planned.points.windows(2).rev() {
        if let Some(dir) = (w[1] - w[0]).normalized() {
            last_dir = Some(dir);
            break;
        }
    }
    if let Some(dir) = last_dir {
        project(out, scene, cursor, dir, params, PathColor::Red);
    }
}

/// Derive the styled segment list for one frame.
///
/// Pure and deterministic: the same path, plan and scene always produce the
/// same segments in the same order.
pub fn derive_render_segments(
    path: &UnifiedPath,
    cursor: Vec2,
    active: &[&Surface],
    scene: &Scene,
    params: &TraceParams,
    cache: &mut ReflectionCache,
) -> Vec<RenderSegment> {
    let mut out = Vec::new();
    let Some(first) = path.segments.first() else {
        return out;
    };

    // No planned surfaces, but the projectile bounces anyway: the plan is the
    // direct line, so the ideal continuation is straight red from the first
    // reflection, with the real flight dashed yellow behind it.
    let unplanned_bounce = active.is_empty()
        && first.end_surface.is_some()
        && first.termination == Termination::None;
    if unplanned_bounce {
        push(&mut out, first.start, first.end, PathColor::Green, PathStyle::Solid);
        let bounce = first.end;
        push(&mut out, bounce, cursor, PathColor::Red, PathStyle::Solid);
        if let Some(dir) = (cursor - bounce).normalized() {
            project(&mut out, scene, cursor, dir, params, PathColor::Red);
        }
        for seg in &path.segments[1..] {
            push(&mut out, seg.start, seg.end, PathColor::Yellow, PathStyle::Dashed);
        }
        return out;
    }

    let divergence = path.physics_divergence_index.or(path.first_diverged_index);
    if let Some(div) = divergence {
        let remaining: Vec<&Surface> = active[path.planned_consumed.min(active.len())..].to_vec();
        if path.physics_divergence_index == Some(div) {
            // The flight is real up to the off-segment crossing, phantom
            // afterwards: green to the crossing, the physics continuation
            // dashed yellow.
            for seg in &path.segments[..=div] {
                push(&mut out, seg.start, seg.end, PathColor::Green, PathStyle::Solid);
            }
            let d_point = path.segments[div].end;
            let phys = &path.actual_physics_segments;
            if div < phys.len() {
                push(&mut out, d_point, phys[div].end, PathColor::Yellow, PathStyle::Dashed);
                for seg in &phys[div + 1..] {
                    push(&mut out, seg.start, seg.end, PathColor::Yellow, PathStyle::Dashed);
                }
            }
            replan_red(&mut out, d_point, cursor, &remaining, scene, params, cache);
        } else {
            for seg in &path.segments[..div] {
                push(&mut out, seg.start, seg.end, PathColor::Green, PathStyle::Solid);
            }
            for seg in &path.segments[div..] {
                push(&mut out, seg.start, seg.end, PathColor::Yellow, PathStyle::Dashed);
            }
            let d_point = path.segments[div].end;
            replan_red(&mut out, d_point, cursor, &remaining, scene, params, cache);
        }
        return out;
    }

    // On plan all the way.
    for seg in &path.segments {
        push(&mut out, seg.start, seg.end, PathColor::Green, PathStyle::Solid);
    }
    if path.cursor_segment_index.is_some() {
        let last = &path.segments[path.segments.len() - 1];
        if let Some(dir) = (last.end - last.start).normalized() {
            let color = if path.is_fully_aligned {
                PathColor::Yellow
            } else {
                PathColor::Red
            };
            project(&mut out, scene, last.end, dir, params, color);
        }
    }
    out
}
