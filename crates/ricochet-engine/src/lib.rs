//! Frame coordinator: input setters with dirty-flag caching, the aggregated
//! per-frame result, and the deterministic render-segment deriver.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod engine;
pub mod render;

pub use engine::{AimEngine, FrameResults};
pub use render::{derive_render_segments, PathColor, PathStyle, RenderSegment, RenderSink};
