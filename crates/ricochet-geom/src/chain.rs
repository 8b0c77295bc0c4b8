#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::math::Vec2;
use crate::scene::SceneError;
use crate::source::{SourcePoint, SurfaceEnd};
use crate::surface::Surface;

/// Stable chain identifier, assigned by the scene author.
///
/// Junction provenance refers to chains by id rather than by reference, so a
/// chain id must stay stable for the lifetime of a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChainId(pub u32);

/// Reserved id of the synthetic screen-boundary chain.
pub const SCREEN_CHAIN: ChainId = ChainId(u32::MAX);

/// Ordered sequence of surfaces whose consecutive endpoints coincide exactly.
///
/// A chain whose last endpoint coincides with its first is closed: it exposes
/// a junction at the seam and no terminal endpoints. The screen boundary is
/// exactly such a chain.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SurfaceChain {
    id: ChainId,
    surfaces: Vec<Surface>,
    closed: bool,
}

impl SurfaceChain {
    /// Endpoint coincidence is bit-exact; authoring tools must emit shared
    /// vertices verbatim, not recomputed.
    pub fn new(id: ChainId, surfaces: Vec<Surface>) -> Result<Self, SceneError> {
        if surfaces.is_empty() {
            return Err(SceneError::EmptyChain { chain: id });
        }
        for (index, pair) in surfaces.windows(2).enumerate() {
            if pair[0].segment().end != pair[1].segment().start {
                return Err(SceneError::ChainDiscontinuity { chain: id, index });
            }
        }
        let closed = surfaces.len() >= 2
            && surfaces[0].segment().start == surfaces[surfaces.len() - 1].segment().end;
        Ok(Self {
            id,
            surfaces,
            closed,
        })
    }

    pub fn id(&self) -> ChainId {
        self.id
    }

    pub fn surfaces(&self) -> &[Surface] {
        &self.surfaces
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn junction_count(&self) -> u32 {
        if self.closed {
            self.surfaces.len() as u32
        } else {
            self.surfaces.len() as u32 - 1
        }
    }

    /// Position of junction `index`; the junction after the last member of a
    /// closed chain is the seam shared with the first member.
    pub fn junction_position(&self, index: u32) -> Vec2 {
        assert!(
            index < self.junction_count(),
            "junction index {index} out of range for chain {:?}",
            self.id
        );
        self.surfaces[index as usize].segment().end
    }

    /// The two members meeting at junction `index`.
    pub fn junction_surfaces(&self, index: u32) -> (&Surface, &Surface) {
        assert!(
            index < self.junction_count(),
            "junction index {index} out of range for chain {:?}",
            self.id
        );
        let i = index as usize;
        (&self.surfaces[i], &self.surfaces[(i + 1) % self.surfaces.len()])
    }

    pub fn junctions(&self) -> impl Iterator<Item = (SourcePoint, Vec2)> + '_ {
        (0..self.junction_count()).map(move |index| {
            (
                SourcePoint::Junction {
                    chain: self.id,
                    index,
                },
                self.junction_position(index),
            )
        })
    }

    /// Terminal endpoints of an open chain; `None` when closed.
    pub fn terminal_endpoints(&self) -> Option<[(SourcePoint, Vec2); 2]> {
        if self.closed {
            return None;
        }
        let first = &self.surfaces[0];
        let last = &self.surfaces[self.surfaces.len() - 1];
        Some([
            (
                SourcePoint::Endpoint {
                    surface: first.id().clone(),
                    end: SurfaceEnd::Start,
                },
                first.segment().start,
            ),
            (
                SourcePoint::Endpoint {
                    surface: last.id().clone(),
                    end: SurfaceEnd::End,
                },
                last.segment().end,
            ),
        ])
    }

    /// Whether `surface_id` adjoins junction `index`.
    pub fn junction_touches(&self, index: u32, surface_id: &crate::surface::SurfaceId) -> bool {
        let (a, b) = self.junction_surfaces(index);
        a.id() == surface_id || b.id() == surface_id
    }
}
