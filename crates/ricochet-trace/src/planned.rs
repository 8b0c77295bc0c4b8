use ricochet_geom::{ReflectionCache, SourcePoint, Surface, SurfaceId, Vec2};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::images::hop_hits;

/// One planned reflection point.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlannedHit {
    pub surface: SurfaceId,
    pub point: Vec2,
    pub s: f64,
    pub on_segment: bool,
}

/// The idealised polyline from avatar to cursor through the active surfaces.
///
/// Obstructions are ignored by construction; the actual-path tracer is what
/// checks them.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlannedPath {
    pub points: Vec<Vec2>,
    pub waypoint_sources: Vec<SourcePoint>,
    pub hits: Vec<PlannedHit>,
    pub total_length: f64,
    pub reached_cursor: bool,
}

/// Build the planned polyline with the method of images.
///
/// Each hop keeps its hit even when it lands off-segment (the plan reflects
/// off extended lines); a hop whose hit falls behind the current point, or
/// whose image lines are parallel, is skipped and contributes nothing.
pub fn build_planned_path(
    avatar: Vec2,
    cursor: Vec2,
    active: &[&Surface],
    cache: &mut ReflectionCache,
) -> PlannedPath {
    let mut points = vec![avatar];
    let mut sources = vec![SourcePoint::origin(avatar)];
    let mut hits = Vec::with_capacity(active.len());

    if !active.is_empty() {
        let (_, _, hops) = hop_hits(avatar, cursor, active, cache);
        let mut current = avatar;
        for (surface, hop) in active.iter().zip(hops) {
            let Some(hop) = hop else { continue };
            let ray_dir = hop.ray.direction();
            if (hop.point - current).dot(ray_dir) <= 0.0 {
                continue;
            }
            points.push(hop.point);
            sources.push(SourcePoint::Hit {
                ray: hop.ray,
                surface: surface.id().clone(),
                t: hop.t,
                s: hop.s,
            });
            hits.push(PlannedHit {
                surface: surface.id().clone(),
                point: hop.point,
                s: hop.s,
                on_segment: hop.on_segment,
            });
            current = hop.point;
        }
    }

    points.push(cursor);
    sources.push(SourcePoint::origin(cursor));

    let total_length = points.windows(2).map(|w| w[0].distance(w[1])).sum();
    PlannedPath {
        points,
        waypoint_sources: sources,
        hits,
        total_length,
        reached_cursor: true,
    }
}
