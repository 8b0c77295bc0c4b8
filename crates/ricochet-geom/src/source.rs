use core::hash::{Hash, Hasher};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::chain::ChainId;
use crate::math::{PointKey, Vec2};
use crate::scene::Scene;
use crate::surface::SurfaceId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SurfaceEnd {
    Start,
    End,
}

/// The cast that produced a hit point: a ray from `source` toward `target`,
/// with `target` at parameter 1.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SightRay {
    pub source: Vec2,
    pub target: Vec2,
}

impl SightRay {
    pub fn new(source: Vec2, target: Vec2) -> Self {
        Self { source, target }
    }

    pub fn direction(&self) -> Vec2 {
        self.target - self.source
    }

    pub fn at(&self, t: f64) -> Vec2 {
        self.source + self.direction() * t
    }
}

/// Vertex with provenance.
///
/// Equality, ordering and hashing compare provenance only — variant, ids,
/// indices, and the bit-exact parameters that define the point — never a
/// derived coordinate. [`SourcePoint::position`] is the single place
/// coordinates are computed from provenance.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SourcePoint {
    /// A primary position: avatar, cursor, window endpoint, reflected image.
    Origin { pos: Vec2 },
    /// A surface terminus.
    Endpoint { surface: SurfaceId, end: SurfaceEnd },
    /// Intersection of `ray` with `surface` at ray parameter `t` and segment
    /// parameter `s`.
    Hit {
        ray: SightRay,
        surface: SurfaceId,
        t: f64,
        s: f64,
    },
    /// Shared endpoint between consecutive chain members. Screen corners are
    /// junctions of the synthetic screen chain.
    Junction { chain: ChainId, index: u32 },
}

/// Provenance identity of a [`SourcePoint`], usable as a deterministic map
/// key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SourceKey {
    Origin(PointKey),
    Endpoint(SurfaceId, SurfaceEnd),
    Hit(PointKey, PointKey, SurfaceId, u64, u64),
    Junction(ChainId, u32),
}

impl SourcePoint {
    pub fn origin(pos: Vec2) -> Self {
        Self::Origin { pos }
    }

    pub fn key(&self) -> SourceKey {
        match self {
            Self::Origin { pos } => SourceKey::Origin(pos.key()),
            Self::Endpoint { surface, end } => SourceKey::Endpoint(surface.clone(), *end),
            Self::Hit { ray, surface, t, s } => SourceKey::Hit(
                ray.source.key(),
                ray.target.key(),
                surface.clone(),
                t.to_bits(),
                s.to_bits(),
            ),
            Self::Junction { chain, index } => SourceKey::Junction(*chain, *index),
        }
    }

    /// Derive coordinates from provenance.
    ///
    /// Panics when the provenance refers to a surface or chain that is not
    /// part of `scene`; that is a broken invariant, not user data.
    pub fn position(&self, scene: &Scene) -> Vec2 {
        match self {
            Self::Origin { pos } => *pos,
            Self::Endpoint { surface, end } => {
                let s = scene
                    .surface(surface)
                    .unwrap_or_else(|| panic!("surface {surface} not present in scene"));
                match end {
                    SurfaceEnd::Start => s.segment().start,
                    SurfaceEnd::End => s.segment().end,
                }
            }
            Self::Hit { ray, t, .. } => ray.at(*t),
            Self::Junction { chain, index } => {
                let c = scene
                    .chain(*chain)
                    .unwrap_or_else(|| panic!("chain {chain:?} not present in scene"));
                c.junction_position(*index)
            }
        }
    }

    /// The surface this vertex lies on, when provenance pins one.
    pub fn surface(&self) -> Option<&SurfaceId> {
        match self {
            Self::Endpoint { surface, .. } | Self::Hit { surface, .. } => Some(surface),
            _ => None,
        }
    }

    /// Whether this vertex lies on `surface_id`, consulting chain adjacency
    /// for junctions.
    pub fn lies_on(&self, surface_id: &SurfaceId, scene: &Scene) -> bool {
        match self {
            Self::Endpoint { surface, .. } | Self::Hit { surface, .. } => surface == surface_id,
            Self::Junction { chain, index } => scene
                .chain(*chain)
                .is_some_and(|c| c.junction_touches(*index, surface_id)),
            Self::Origin { .. } => false,
        }
    }
}

impl PartialEq for SourcePoint {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for SourcePoint {}

impl Hash for SourcePoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}
