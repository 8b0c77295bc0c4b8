//! Umbrella crate that re-exports the `ricochet-*` building blocks.
//!
//! This crate is intended as the single entrypoint for consumers: the
//! geometry and scene model, the trajectory core, the visibility engine, and
//! the frame coordinator.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

#[cfg(feature = "geom")]
#[cfg_attr(docsrs, doc(cfg(feature = "geom")))]
pub use ricochet_geom as geom;

#[cfg(feature = "trace")]
#[cfg_attr(docsrs, doc(cfg(feature = "trace")))]
pub use ricochet_trace as trace;

#[cfg(feature = "vis")]
#[cfg_attr(docsrs, doc(cfg(feature = "vis")))]
pub use ricochet_vis as vis;

#[cfg(feature = "engine")]
#[cfg_attr(docsrs, doc(cfg(feature = "engine")))]
pub use ricochet_engine as engine;
