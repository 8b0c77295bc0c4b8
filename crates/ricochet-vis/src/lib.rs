//! Visibility polygons from an origin through optional windows, with the
//! cascading image-space stages used to shade the hittable region.
//!
//! Decisions are epsilon-free: vertex identity is provenance, angular order
//! is cross-product comparison around a reference ray, and deduplication is
//! bit-exact. Coordinates are derived, never compared with tolerances.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod order;
pub mod stages;
pub mod sweep;

use ricochet_geom::{Segment, SourcePoint, SurfaceId, Vec2};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use order::{AngularOrder, SweepVertex};
pub use stages::{compute_stage, compute_stages, extract_windows};
pub use sweep::visibility_polygon;

/// How the avatar's view is constrained at stage 0.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum WindowConfig {
    /// One umbrella window.
    Single(Segment),
    /// Several umbrella holes, each producing its own sub-polygon.
    Multi(Vec<Segment>),
}

/// A segment light may pass through.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    pub segment: Segment,
    /// Surface the window lies on, if any; that surface never blocks rays
    /// cast through this window (the cone cannot cross it outside the
    /// window).
    pub carrier: Option<SurfaceId>,
    pub start_source: SourcePoint,
    pub end_source: SourcePoint,
}

impl Window {
    /// A free-standing window (stage-0 umbrella): endpoint provenance is the
    /// window geometry itself.
    pub fn free(segment: Segment) -> Self {
        Self {
            segment,
            carrier: None,
            start_source: SourcePoint::origin(segment.start),
            end_source: SourcePoint::origin(segment.end),
        }
    }
}

/// One window's share of a stage's visibility.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WindowVisibility {
    pub window: Segment,
    pub source_points: Vec<SourcePoint>,
    pub polygon: Vec<Vec2>,
    pub is_valid: bool,
}

/// Angularly ordered visibility of one origin, full-cone or through windows.
///
/// `source_points` and `polygon` are parallel arrays: `polygon[i]` is the
/// derived position of `source_points[i]`.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VisibilityStage {
    pub origin: Vec2,
    pub source_points: Vec<SourcePoint>,
    pub polygon: Vec<Vec2>,
    /// Per-window sub-polygons; empty for a full 360-degree cone.
    pub windows: Vec<WindowVisibility>,
    pub is_valid: bool,
}
