use ricochet_geom::{ReflectionCache, Scene, Surface, SurfaceId, SurfaceKind, Vec2};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::images::{build_backward, hop_hits};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BypassReason {
    /// The cursor lies strictly on the non-reflective side of the last
    /// remaining planned surface.
    WrongSideLast,
    /// The avatar lies strictly on the non-reflective side of the first
    /// remaining planned surface.
    WrongSideFirst,
    /// The bidirectional-image hit falls behind the current ray origin.
    ChainBreak,
    /// The incident direction cannot reflect off the surface.
    NoReflectThrough,
    /// The forward trace strikes a later-planned surface first.
    OutOfOrder,
    /// No valid on-segment image-chain intersection remains.
    Unreachable,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BypassedSurface {
    pub surface: SurfaceId,
    /// Index into the plan as given.
    pub original_index: usize,
    pub reason: BypassReason,
}

/// Which planned surfaces stay active, and why the rest were suppressed.
///
/// Bypass never mutates the plan: `active_indices` preserves plan order, and
/// `bypassed` records removals in the order the rules fired.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BypassResult {
    pub active: Vec<SurfaceId>,
    pub active_indices: Vec<usize>,
    pub bypassed: Vec<BypassedSurface>,
}

/// Apply the six bypass rules, in order, until the remaining plan is stable.
///
/// Every removal re-evaluates the rest. This never fails: degenerate input
/// yields an empty active list, not an error.
pub fn evaluate_bypass(
    avatar: Vec2,
    cursor: Vec2,
    plan: &[&Surface],
    scene: &Scene,
    cache: &mut ReflectionCache,
) -> BypassResult {
    let mut remaining: Vec<usize> = (0..plan.len()).collect();
    let mut bypassed = Vec::new();

    // Each pass removes at most one surface, so the cascade is bounded by the
    // plan length.
    'cascade: for _pass in 0..=plan.len() {
        if remaining.is_empty() {
            break;
        }

        // Rule 1: wrong-side last.
        let last = remaining[remaining.len() - 1];
        if plan[last].normal_side(cursor) > 0.0 {
            remove(&mut remaining, &mut bypassed, plan, last, BypassReason::WrongSideLast);
            continue 'cascade;
        }

        // Rule 2: wrong-side first.
        let first = remaining[0];
        if plan[first].normal_side(avatar) > 0.0 {
            remove(&mut remaining, &mut bypassed, plan, first, BypassReason::WrongSideFirst);
            continue 'cascade;
        }

        let surfaces: Vec<&Surface> = remaining.iter().map(|&i| plan[i]).collect();
        let (_, _, hops) = hop_hits(avatar, cursor, &surfaces, cache);

        // Rules 3 and 4, walking the hops from the avatar.
        let mut current = avatar;
        for (k, hop) in hops.iter().enumerate() {
            let Some(hop) = hop else { continue };
            let idx = remaining[k];
            if (hop.point - current).dot(hop.ray.direction()) <= 0.0 {
                remove(&mut remaining, &mut bypassed, plan, idx, BypassReason::ChainBreak);
                continue 'cascade;
            }
            if !surfaces[k].can_reflect_from(current - hop.point) {
                remove(&mut remaining, &mut bypassed, plan, idx, BypassReason::NoReflectThrough);
                continue 'cascade;
            }
            current = hop.point;
        }

        // Rule 5: out-of-order strike in the forward trace.
        if let Some(k) = out_of_order_probe(avatar, cursor, &surfaces, scene, cache) {
            let idx = remaining[k];
            remove(&mut remaining, &mut bypassed, plan, idx, BypassReason::OutOfOrder);
            continue 'cascade;
        }

        // Rule 6: anything still lacking an on-segment image-chain hit.
        for (k, hop) in hops.iter().enumerate() {
            let reachable = hop.as_ref().is_some_and(|h| h.on_segment);
            if !reachable {
                let idx = remaining[k];
                remove(&mut remaining, &mut bypassed, plan, idx, BypassReason::Unreachable);
                continue 'cascade;
            }
        }

        break;
    }

    BypassResult {
        active: remaining.iter().map(|&i| plan[i].id().clone()).collect(),
        active_indices: remaining,
        bypassed,
    }
}

fn remove(
    remaining: &mut Vec<usize>,
    bypassed: &mut Vec<BypassedSurface>,
    plan: &[&Surface],
    original_index: usize,
    reason: BypassReason,
) {
    remaining.retain(|&i| i != original_index);
    bypassed.push(BypassedSurface {
        surface: plan[original_index].id().clone(),
        original_index,
        reason,
    });
}

/// Follow the launch direction through real reflections and report the
/// position (within `surfaces`) of the surface the trace expected when it
/// struck a later-planned one instead.
///
/// Walls and unplanned reflectors end the probe; those are divergence, which
/// the tracer reports, not plan-validity, which bypass reports.
fn out_of_order_probe(
    avatar: Vec2,
    cursor: Vec2,
    surfaces: &[&Surface],
    scene: &Scene,
    cache: &mut ReflectionCache,
) -> Option<usize> {
    let n = surfaces.len();
    if n < 2 {
        return None;
    }
    let backward = build_backward(cursor, surfaces, cache);
    let mut dir = (backward.at_depth(n) - avatar).normalized()?;
    let mut pos = avatar;
    let mut last: Option<SurfaceId> = None;
    let mut expected = 0usize;

    for _ in 0..n {
        let hit = scene.first_hit(pos, dir, last.as_ref())?;
        if hit.kind == SurfaceKind::Wall {
            return None;
        }
        let position = surfaces[expected..]
            .iter()
            .position(|s| *s.id() == hit.surface)
            .map(|p| p + expected)?;
        if position > expected {
            return Some(expected);
        }
        expected += 1;
        if expected >= n {
            return None;
        }
        let surface = scene
            .surface(&hit.surface)
            .unwrap_or_else(|| panic!("hit surface {} not present in scene", hit.surface));
        dir = surface.reflect_travel_direction(dir);
        pos = hit.point;
        last = Some(hit.surface);
    }
    None
}
