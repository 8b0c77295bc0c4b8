use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use thiserror::Error;

use crate::chain::{ChainId, SurfaceChain, SCREEN_CHAIN};
use crate::math::{line_line_intersection, Segment, Vec2};
use crate::surface::{Surface, SurfaceId, SurfaceKind};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("chain {chain:?} has no surfaces")]
    EmptyChain { chain: ChainId },
    #[error("chain {chain:?} breaks after member {index}")]
    ChainDiscontinuity { chain: ChainId, index: usize },
    #[error("duplicate surface id {id}")]
    DuplicateSurfaceId { id: SurfaceId },
    #[error("duplicate chain id {id:?}")]
    DuplicateChainId { id: ChainId },
    #[error("chain id {id:?} is reserved for the screen boundary")]
    ReservedChainId { id: ChainId },
    #[error("screen bounds must have positive extent on both axes")]
    DegenerateScreenBounds,
}

/// Axis-aligned screen rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScreenBounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl ScreenBounds {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// First physical intersection of a ray with a scene surface.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceHit {
    pub surface: SurfaceId,
    pub kind: SurfaceKind,
    /// Distance along the (unit) cast direction.
    pub t: f64,
    /// Segment parameter of the hit on the surface.
    pub s: f64,
    pub point: Vec2,
}

/// Immutable set of surface chains plus the synthetic screen-boundary chain.
///
/// The screen boundary is stored as a closed chain of four wall surfaces with
/// the reserved [`SCREEN_CHAIN`] id, so its corners are ordinary junctions and
/// need no special-case geometry anywhere downstream.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Scene {
    chains: Vec<SurfaceChain>,
    bounds: ScreenBounds,
    #[cfg_attr(feature = "serde", serde(skip, default))]
    by_surface: BTreeMap<SurfaceId, (usize, usize)>,
    #[cfg_attr(feature = "serde", serde(skip, default))]
    by_chain: BTreeMap<ChainId, usize>,
}

impl Scene {
    pub fn new(chains: Vec<SurfaceChain>, bounds: ScreenBounds) -> Result<Self, SceneError> {
        if bounds.max.x <= bounds.min.x || bounds.max.y <= bounds.min.y {
            return Err(SceneError::DegenerateScreenBounds);
        }
        let mut all = chains;
        for chain in &all {
            if chain.id() == SCREEN_CHAIN {
                return Err(SceneError::ReservedChainId { id: chain.id() });
            }
        }
        all.push(Self::screen_chain(bounds)?);

        let mut by_surface = BTreeMap::new();
        let mut by_chain = BTreeMap::new();
        for (ci, chain) in all.iter().enumerate() {
            if by_chain.insert(chain.id(), ci).is_some() {
                return Err(SceneError::DuplicateChainId { id: chain.id() });
            }
            for (si, surface) in chain.surfaces().iter().enumerate() {
                if by_surface.insert(surface.id().clone(), (ci, si)).is_some() {
                    return Err(SceneError::DuplicateSurfaceId {
                        id: surface.id().clone(),
                    });
                }
            }
        }
        Ok(Self {
            chains: all,
            bounds,
            by_surface,
            by_chain,
        })
    }

    fn screen_chain(bounds: ScreenBounds) -> Result<SurfaceChain, SceneError> {
        let bl = bounds.min;
        let br = Vec2::new(bounds.max.x, bounds.min.y);
        let tr = bounds.max;
        let tl = Vec2::new(bounds.min.x, bounds.max.y);
        SurfaceChain::new(
            SCREEN_CHAIN,
            vec![
                Surface::new("screen:bottom", Segment::new(bl, br), SurfaceKind::Wall),
                Surface::new("screen:right", Segment::new(br, tr), SurfaceKind::Wall),
                Surface::new("screen:top", Segment::new(tr, tl), SurfaceKind::Wall),
                Surface::new("screen:left", Segment::new(tl, bl), SurfaceKind::Wall),
            ],
        )
    }

    pub fn bounds(&self) -> ScreenBounds {
        self.bounds
    }

    /// Every chain, screen boundary included.
    pub fn chains(&self) -> &[SurfaceChain] {
        &self.chains
    }

    pub fn chain(&self, id: ChainId) -> Option<&SurfaceChain> {
        self.by_chain.get(&id).map(|&i| &self.chains[i])
    }

    pub fn surface(&self, id: &SurfaceId) -> Option<&Surface> {
        self.by_surface
            .get(id)
            .map(|&(ci, si)| &self.chains[ci].surfaces()[si])
    }

    /// The chain owning `id` and the surface's index within it.
    pub fn surface_chain(&self, id: &SurfaceId) -> Option<(&SurfaceChain, usize)> {
        self.by_surface
            .get(id)
            .map(|&(ci, si)| (&self.chains[ci], si))
    }

    pub fn surfaces(&self) -> impl Iterator<Item = &Surface> {
        self.chains.iter().flat_map(|c| c.surfaces())
    }

    /// First on-segment hit of the ray `origin + t * dir` (`dir` unit length,
    /// `t` strictly positive), optionally excluding one surface.
    ///
    /// Ties on `t` resolve to the earlier surface in chain order, which keeps
    /// repeated casts byte-identical.
    pub fn first_hit(&self, origin: Vec2, dir: Vec2, exclude: Option<&SurfaceId>) -> Option<SurfaceHit> {
        let mut best: Option<SurfaceHit> = None;
        for surface in self.surfaces() {
            if exclude == Some(surface.id()) {
                continue;
            }
            let seg = surface.segment();
            let Some(h) = line_line_intersection(origin, dir, seg.start, seg.end) else {
                continue;
            };
            if h.t <= 0.0 || !(0.0..=1.0).contains(&h.s) {
                continue;
            }
            if best.as_ref().is_none_or(|b| h.t < b.t) {
                best = Some(SurfaceHit {
                    surface: surface.id().clone(),
                    kind: surface.kind(),
                    t: h.t,
                    s: h.s,
                    point: h.point,
                });
            }
        }
        best
    }

    /// Re-derive the lookup tables after deserialization.
    #[cfg(feature = "serde")]
    pub fn reindex(self) -> Result<Self, SceneError> {
        let mut chains = self.chains;
        // The screen chain was serialized along with the rest; drop it so the
        // constructor can rebuild it and re-validate ids.
        chains.retain(|c| c.id() != SCREEN_CHAIN);
        Self::new(chains, self.bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainId;

    fn scene_with_one_wall() -> Scene {
        let chain = SurfaceChain::new(
            ChainId(0),
            vec![Surface::new(
                "w",
                Segment::new(Vec2::new(25.0, 0.0), Vec2::new(25.0, 100.0)),
                SurfaceKind::Wall,
            )],
        )
        .expect("chain");
        Scene::new(
            vec![chain],
            ScreenBounds::new(Vec2::new(-100.0, -100.0), Vec2::new(400.0, 300.0)),
        )
        .expect("scene")
    }

    #[test]
    fn first_hit_finds_the_nearest_surface() {
        let scene = scene_with_one_wall();
        let hit = scene
            .first_hit(Vec2::new(0.0, 50.0), Vec2::new(1.0, 0.0), None)
            .expect("expected hit");
        assert_eq!(hit.surface.as_str(), "w");
        assert_eq!(hit.point, Vec2::new(25.0, 50.0));
        assert_eq!(hit.t, 25.0);
    }

    #[test]
    fn screen_chain_is_closed_with_four_junctions() {
        let scene = scene_with_one_wall();
        let screen = scene.chain(SCREEN_CHAIN).expect("screen chain");
        assert!(screen.is_closed());
        assert_eq!(screen.junction_count(), 4);
        assert!(screen.terminal_endpoints().is_none());
    }

    #[test]
    fn duplicate_surface_ids_are_rejected() {
        let mk = |id: &str| {
            SurfaceChain::new(
                ChainId(7),
                vec![Surface::new(
                    id,
                    Segment::new(Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0)),
                    SurfaceKind::Wall,
                )],
            )
            .expect("chain")
        };
        let a = mk("dup");
        let mut b = mk("dup");
        b = SurfaceChain::new(ChainId(8), b.surfaces().to_vec()).expect("chain");
        let err = Scene::new(
            vec![a, b],
            ScreenBounds::new(Vec2::ZERO, Vec2::new(10.0, 10.0)),
        )
        .expect_err("duplicate ids");
        assert!(matches!(err, SceneError::DuplicateSurfaceId { .. }));
    }
}
