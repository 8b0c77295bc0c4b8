use ricochet_geom::{
    line_line_intersection, ReflectionCache, SightRay, Surface, SurfaceId, Vec2,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One reflected copy of a point, with enough provenance to check
/// reversibility.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReflectedImage {
    pub position: Vec2,
    /// The point this image was produced from (the previous image, or the
    /// original at depth 1).
    pub source_position: Vec2,
    pub source_surface: SurfaceId,
    /// Number of reflections applied, starting at 1.
    pub depth: usize,
}

/// Iterated reflections of one point through an ordered surface list.
///
/// `images[i]` has depth `i + 1` and is the reflection of `images[i - 1]`
/// (or of `original` for `i == 0`) through `surfaces[i]`.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ImageSequence {
    pub original: Vec2,
    pub images: Vec<ReflectedImage>,
    pub surfaces: Vec<SurfaceId>,
}

impl ImageSequence {
    fn build(original: Vec2, surfaces: &[&Surface], cache: &mut ReflectionCache) -> Self {
        let mut images = Vec::with_capacity(surfaces.len());
        let mut current = original;
        for (i, surface) in surfaces.iter().enumerate() {
            let position = cache.reflect(current, surface);
            images.push(ReflectedImage {
                position,
                source_position: current,
                source_surface: surface.id().clone(),
                depth: i + 1,
            });
            current = position;
        }
        Self {
            original,
            images,
            surfaces: surfaces.iter().map(|s| s.id().clone()).collect(),
        }
    }

    pub fn depth(&self) -> usize {
        self.images.len()
    }

    /// Image after `d` reflections; `d == 0` is the original.
    ///
    /// A depth beyond the sequence is a broken invariant and traps.
    pub fn at_depth(&self, d: usize) -> Vec2 {
        assert!(
            d <= self.images.len(),
            "image depth {d} out of range (sequence has {} reflections)",
            self.images.len()
        );
        if d == 0 {
            self.original
        } else {
            self.images[d - 1].position
        }
    }
}

/// Avatar-side sequence: reflections applied in plan order.
pub fn build_forward(
    origin: Vec2,
    surfaces: &[&Surface],
    cache: &mut ReflectionCache,
) -> ImageSequence {
    ImageSequence::build(origin, surfaces, cache)
}

/// Cursor-side sequence: reflections applied in reverse plan order, so that
/// `at_depth(k)` is the cursor reflected through the last `k` surfaces.
pub fn build_backward(
    origin: Vec2,
    surfaces: &[&Surface],
    cache: &mut ReflectionCache,
) -> ImageSequence {
    let reversed: Vec<&Surface> = surfaces.iter().rev().copied().collect();
    ImageSequence::build(origin, &reversed, cache)
}

/// The ideal hit for one hop of the image construction.
#[derive(Debug, Clone, PartialEq)]
pub struct HopHit {
    pub point: Vec2,
    /// Parameter along the hop ray (source = avatar image, target = cursor
    /// image).
    pub t: f64,
    /// Segment parameter on the planned surface.
    pub s: f64,
    pub on_segment: bool,
    /// The image-space ray whose intersection with the surface line produced
    /// this hit.
    pub ray: SightRay,
}

/// Bidirectional-image intersections for every hop of a plan.
///
/// For hop `i` of an `n`-surface plan, the planned ray runs from the avatar
/// image at depth `i` to the cursor image at depth `n - i`; its intersection
/// with the line of `surfaces[i]` is the unique planned reflection point.
/// `None` marks a parallel or degenerate hop.
pub fn hop_hits(
    avatar: Vec2,
    cursor: Vec2,
    surfaces: &[&Surface],
    cache: &mut ReflectionCache,
) -> (ImageSequence, ImageSequence, Vec<Option<HopHit>>) {
    let forward = build_forward(avatar, surfaces, cache);
    let backward = build_backward(cursor, surfaces, cache);
    let n = surfaces.len();
    let mut hits = Vec::with_capacity(n);
    for (i, surface) in surfaces.iter().enumerate() {
        let source = forward.at_depth(i);
        let target = backward.at_depth(n - i);
        let dir = target - source;
        let seg = surface.segment();
        let hit = line_line_intersection(source, dir, seg.start, seg.end).map(|h| HopHit {
            point: h.point,
            t: h.t,
            s: h.s,
            on_segment: (0.0..=1.0).contains(&h.s),
            ray: SightRay::new(source, target),
        });
        hits.push(hit);
    }
    (forward, backward, hits)
}
