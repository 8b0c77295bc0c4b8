use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::math::{reflect_direction, Segment, Vec2};

/// Stable surface identifier.
///
/// Plans refer to surfaces by id, and every provenance-typed vertex carries
/// the id of the surface it lies on, so ids must stay stable for the lifetime
/// of a scene.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct SurfaceId(pub String);

impl SurfaceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SurfaceId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for SurfaceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SurfaceKind {
    /// Reflects projectiles arriving from the reflective side.
    Reflective,
    /// Stops projectiles; blocks vision like any other surface.
    Wall,
}

/// Oriented line-segment surface.
///
/// The stored normal is the right-hand perpendicular of `end - start`,
/// normalised. The reflective half-plane is the one **opposite** the normal:
/// a segment running along +x has normal `(0, -1)` and reflects projectiles
/// arriving from above.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Surface {
    id: SurfaceId,
    segment: Segment,
    kind: SurfaceKind,
    normal: Vec2,
}

impl Surface {
    /// A zero-length segment yields a zero normal; such a surface never
    /// reflects and never blocks.
    pub fn new(id: impl Into<SurfaceId>, segment: Segment, kind: SurfaceKind) -> Self {
        let normal = segment
            .direction()
            .perp()
            .normalized()
            .unwrap_or(Vec2::ZERO);
        Self {
            id: id.into(),
            segment,
            kind,
            normal,
        }
    }

    pub fn id(&self) -> &SurfaceId {
        &self.id
    }

    pub fn segment(&self) -> Segment {
        self.segment
    }

    pub fn kind(&self) -> SurfaceKind {
        self.kind
    }

    pub fn is_reflective(&self) -> bool {
        self.kind == SurfaceKind::Reflective
    }

    pub fn normal(&self) -> Vec2 {
        self.normal
    }

    /// Signed distance-like value: positive on the normal's side (the
    /// non-reflective half-plane), negative on the reflective side, zero on
    /// the line itself.
    pub fn normal_side(&self, p: Vec2) -> f64 {
        (p - self.segment.start).dot(self.normal)
    }

    /// A point exactly on the line counts as reflective-side.
    pub fn on_reflective_side(&self, p: Vec2) -> bool {
        self.normal_side(p) <= 0.0
    }

    /// Whether a ray coming from the direction `from_dir` (pointing from the
    /// surface back toward the ray's source) can reflect here.
    pub fn can_reflect_from(&self, from_dir: Vec2) -> bool {
        from_dir.dot(self.normal) < 0.0
    }

    /// Specular reflection of a travel direction about this surface's normal.
    pub fn reflect_travel_direction(&self, dir: Vec2) -> Vec2 {
        reflect_direction(dir, self.normal)
    }
}
