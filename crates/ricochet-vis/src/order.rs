use core::cmp::Ordering;
use std::collections::BTreeMap;

use ricochet_geom::{Scene, SourcePoint, SurfaceEnd, SurfaceId, Vec2};

/// A visibility vertex paired with its derived position.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepVertex {
    pub source: SourcePoint,
    pub pos: Vec2,
}

/// Epsilon-free angular order around an origin.
///
/// A reference direction splits the full turn into half-planes inside which
/// the cross product is a transitive comparator, so no `atan2` (and no
/// tolerance) is ever consulted. Exactly collinear vertices are resolved by
/// provenance: shadow-boundary pairing first, pre-computed surface
/// orientation, then distance, then the provenance key itself so the order
/// is total and byte-stable.
#[derive(Debug)]
pub struct AngularOrder {
    origin: Vec2,
    reference: Vec2,
    orientations: BTreeMap<SurfaceId, i8>,
}

impl AngularOrder {
    pub fn new(origin: Vec2, reference: Vec2, scene: &Scene) -> Self {
        let mut orientations = BTreeMap::new();
        for surface in scene.surfaces() {
            let a = surface.segment().start - origin;
            let b = surface.segment().end - origin;
            let c = a.cross(b);
            let sign = if c > 0.0 {
                1
            } else if c < 0.0 {
                -1
            } else {
                // Edge-on to the origin; distance decides later.
                0
            };
            orientations.insert(surface.id().clone(), sign);
        }
        Self {
            origin,
            reference,
            orientations,
        }
    }

    /// Sign of `cross(origin -> start, origin -> end)` for a surface;
    /// 0 when the surface is edge-on to the origin.
    pub fn orientation(&self, id: &SurfaceId) -> i8 {
        self.orientations.get(id).copied().unwrap_or(0)
    }

    /// Sweep class: counter-clockwise half, anti-ray, clockwise half, and
    /// finally the reference ray itself, which sorts last.
    fn class(&self, v: Vec2) -> u8 {
        let c = self.reference.cross(v);
        if c > 0.0 {
            0
        } else if c < 0.0 {
            2
        } else if self.reference.dot(v) < 0.0 {
            1
        } else {
            3
        }
    }

    pub fn compare(&self, a: &SweepVertex, b: &SweepVertex) -> Ordering {
        let va = a.pos - self.origin;
        let vb = b.pos - self.origin;
        let ca = self.class(va);
        let cb = self.class(vb);
        if ca != cb {
            return ca.cmp(&cb);
        }
        let cross = va.cross(vb);
        if cross > 0.0 {
            return Ordering::Less;
        }
        if cross < 0.0 {
            return Ordering::Greater;
        }
        self.collinear_tie(a, b, va, vb)
    }

    fn collinear_tie(&self, a: &SweepVertex, b: &SweepVertex, va: Vec2, vb: Vec2) -> Ordering {
        if let Some(ord) = self.shadow_pair(a, b) {
            return ord;
        }
        if let Some(ord) = self.shadow_pair(b, a) {
            return ord.reverse();
        }
        match va.length_squared().partial_cmp(&vb.length_squared()) {
            Some(Ordering::Equal) | None => a.source.key().cmp(&b.source.key()),
            Some(ord) => ord,
        }
    }

    /// Order an endpoint against its own continuation hit on the same cast.
    ///
    /// When the endpoint's surface body lies clockwise of the shared ray the
    /// sweep leaves the surface at the endpoint and jumps out to the
    /// continuation; otherwise it arrives from the continuation first.
    fn shadow_pair(&self, e: &SweepVertex, c: &SweepVertex) -> Option<Ordering> {
        let SourcePoint::Endpoint { surface, end } = &e.source else {
            return None;
        };
        let SourcePoint::Hit { ray, .. } = &c.source else {
            return None;
        };
        if ray.target.key() != e.pos.key() {
            return None;
        }
        let orientation = self.orientation(surface);
        if orientation == 0 {
            return None;
        }
        let endpoint_first = match end {
            SurfaceEnd::Start => orientation < 0,
            SurfaceEnd::End => orientation > 0,
        };
        Some(if endpoint_first {
            Ordering::Less
        } else {
            Ordering::Greater
        })
    }
}
