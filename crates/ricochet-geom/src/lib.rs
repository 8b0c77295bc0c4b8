//! Geometry primitives, provenance-typed vertices, and the surface/chain scene model.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod cache;
pub mod chain;
pub mod math;
pub mod scene;
pub mod source;
pub mod surface;

pub use cache::ReflectionCache;
pub use chain::{ChainId, SurfaceChain, SCREEN_CHAIN};
pub use math::{
    line_line_intersection, parametric_t, point_side_of_line, polygon_contains,
    polygon_signed_area, ray_segment_intersection, reflect_direction, reflect_point_through_line,
    LineHit, PointKey, Segment, Vec2,
};
pub use scene::{Scene, SceneError, ScreenBounds, SurfaceHit};
pub use source::{SightRay, SourcePoint, SurfaceEnd};
pub use surface::{Surface, SurfaceId, SurfaceKind};
