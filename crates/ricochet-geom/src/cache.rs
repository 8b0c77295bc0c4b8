use std::collections::BTreeMap;

use crate::math::{reflect_point_through_line, PointKey, Vec2};
use crate::surface::{Surface, SurfaceId};

/// Memoised point-through-line reflections, shared by the trajectory core and
/// the visibility engine within one frame.
///
/// Whenever a reflection is computed, the inverse entry is stored alongside
/// it, so `reflect(reflect(p, s), s)` returns `p` bit-exactly once the pair
/// is cached. The cache is replaced wholesale when the scene changes; keys
/// embed surface ids, so stale geometry can never be served.
#[derive(Debug, Default)]
pub struct ReflectionCache {
    map: BTreeMap<(PointKey, SurfaceId), Vec2>,
}

impl ReflectionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn reflect(&mut self, p: Vec2, surface: &Surface) -> Vec2 {
        let key = (p.key(), surface.id().clone());
        if let Some(&cached) = self.map.get(&key) {
            return cached;
        }
        let seg = surface.segment();
        let r = reflect_point_through_line(p, seg.start, seg.end);
        self.map.insert(key, r);
        // Companion entry: reflecting the image must return the original
        // bit-exactly, not a re-derived approximation.
        self.map.entry((r.key(), surface.id().clone())).or_insert(p);
        r
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Segment;
    use crate::surface::SurfaceKind;

    #[test]
    fn cached_double_reflection_is_bit_exact() {
        let surface = Surface::new(
            "m",
            Segment::new(Vec2::new(0.3, 0.1), Vec2::new(7.9, 4.2)),
            SurfaceKind::Reflective,
        );
        let mut cache = ReflectionCache::new();
        let p = Vec2::new(1.234567891, -9.87654321);
        let r = cache.reflect(p, &surface);
        let back = cache.reflect(r, &surface);
        assert_eq!(p.key(), back.key());
    }
}
