//! Trajectory core: bidirectional image chains, plan bypass, and the
//! planned/actual path pair with its divergence classification.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod bypass;
pub mod images;
pub mod path;
pub mod planned;
pub mod tracer;

pub use bypass::{evaluate_bypass, BypassReason, BypassResult, BypassedSurface};
pub use images::{build_backward, build_forward, hop_hits, HopHit, ImageSequence, ReflectedImage};
pub use path::{
    PathSegment, PhysicsSegment, PlanAlignment, Termination, TraceParams, UnifiedPath,
};
pub use planned::{build_planned_path, PlannedHit, PlannedPath};
pub use tracer::{initial_direction, trace, trace_physics};
