use ricochet_geom::{SourcePoint, SurfaceId, Vec2};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Trace bounds and calibration constants.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TraceParams {
    pub max_reflections: usize,
    /// Total path length budget in scene units.
    pub max_distance: f64,
    /// Perpendicular distance under which the cursor counts as lying on a ray
    /// segment. Tied to the renderer's pixel scale, hence configurable.
    pub cursor_snap_distance: f64,
    /// Length of the dashed continuation drawn past the cursor.
    pub projection_distance: f64,
}

impl Default for TraceParams {
    fn default() -> Self {
        Self {
            max_reflections: 10,
            max_distance: 2000.0,
            cursor_snap_distance: 1.0,
            projection_distance: 1000.0,
        }
    }
}

/// How a segment follows the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PlanAlignment {
    /// Following the plan (or the direct shot while nothing contradicts it).
    #[default]
    Aligned,
    /// Past the end of the plan, or reflecting with no plan at all.
    Unplanned,
    /// The actual trajectory can no longer realise the plan.
    Diverged,
}

/// Why a segment ended the trace, when it did.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Termination {
    /// The segment ends in a reflection; the trace continues.
    #[default]
    None,
    WallHit(SurfaceId),
    MaxDistance,
    MaxReflections,
    CursorReached,
}

/// One leg of the unified (plan-aware) trajectory.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PathSegment {
    pub start: Vec2,
    pub end: Vec2,
    /// Surface whose line ended this segment, physical or planned.
    pub end_surface: Option<SurfaceId>,
    /// False when the segment ends on a planned surface's extension rather
    /// than the segment itself.
    pub hit_on_segment: bool,
    pub plan_alignment: PlanAlignment,
    pub termination: Termination,
}

impl PathSegment {
    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }
}

/// One leg of the physics-only trajectory (real on-segment hits only).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PhysicsSegment {
    pub start: Vec2,
    pub end: Vec2,
    pub end_surface: Option<SurfaceId>,
    pub hit_on_segment: bool,
    pub termination: Termination,
}

/// The per-frame trajectory result: the plan-aware segment list, the
/// physics-only view of the same launch, and the derived divergence fields.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UnifiedPath {
    pub segments: Vec<PathSegment>,
    /// Index of the segment terminated by [`Termination::CursorReached`].
    pub cursor_segment_index: Option<usize>,
    /// Position of the cursor within its segment; 1.0 when the path ends at
    /// the cursor, which is the only way a cursor hit is recorded.
    pub cursor_t: f64,
    pub cursor_reachable: bool,
    pub first_diverged_index: Option<usize>,
    pub is_fully_aligned: bool,
    pub planned_surface_count: usize,
    /// Planned surfaces consumed before the trace ended or diverged; the
    /// remainder of the plan starts here.
    pub planned_consumed: usize,
    pub total_length: f64,
    pub actual_physics_segments: Vec<PhysicsSegment>,
    /// Index of the first segment that followed the plan onto a surface's
    /// extension (aligned, but off-segment).
    pub physics_divergence_index: Option<usize>,
    /// Provenance of the ideal waypoints (avatar, planned hits, cursor).
    pub waypoint_sources: Vec<SourcePoint>,
}

impl UnifiedPath {
    /// Recompute the derived classification fields from `segments` and the
    /// plan counters. Upholds: `first_diverged_index` is `None` iff no
    /// segment is diverged, and a fully aligned path exhausted its plan.
    pub fn derive_classification(&mut self) {
        self.first_diverged_index = self
            .segments
            .iter()
            .position(|s| s.plan_alignment == PlanAlignment::Diverged);
        self.is_fully_aligned = self.first_diverged_index.is_none()
            && self.planned_consumed >= self.planned_surface_count;
        self.cursor_reachable = match self.cursor_segment_index {
            None => false,
            Some(c) => {
                self.segments[c].plan_alignment != PlanAlignment::Diverged
                    && self.first_diverged_index.is_none_or(|d| c < d)
            }
        };
        self.total_length = self.segments.iter().map(PathSegment::length).sum();
    }
}
