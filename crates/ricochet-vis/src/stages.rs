use ricochet_geom::{ReflectionCache, Scene, Segment, SourcePoint, Surface, Vec2};

use crate::sweep::visibility_polygon;
use crate::{VisibilityStage, Window, WindowConfig, WindowVisibility};

fn split(vertices: Vec<crate::order::SweepVertex>) -> (Vec<SourcePoint>, Vec<Vec2>) {
    let mut sources = Vec::with_capacity(vertices.len());
    let mut positions = Vec::with_capacity(vertices.len());
    for v in vertices {
        sources.push(v.source);
        positions.push(v.pos);
    }
    (sources, positions)
}

/// Visibility of one origin through zero or more windows.
///
/// With no windows the stage is a single full-cone polygon; otherwise each
/// window contributes its own sub-polygon and the stage-level arrays are the
/// concatenation, window by window.
pub fn compute_stage(scene: &Scene, origin: Vec2, windows: &[Window]) -> VisibilityStage {
    if windows.is_empty() {
        let (source_points, polygon) = split(visibility_polygon(scene, origin, None));
        let is_valid = polygon.len() >= 3;
        return VisibilityStage {
            origin,
            source_points,
            polygon,
            windows: Vec::new(),
            is_valid,
        };
    }
    let mut stage = VisibilityStage {
        origin,
        ..Default::default()
    };
    for window in windows {
        let (source_points, polygon) = split(visibility_polygon(scene, origin, Some(window)));
        let is_valid = polygon.len() >= 3;
        stage.source_points.extend(source_points.iter().cloned());
        stage.polygon.extend(polygon.iter().cloned());
        stage.windows.push(WindowVisibility {
            window: window.segment,
            source_points,
            polygon,
            is_valid,
        });
    }
    stage.is_valid = stage.windows.iter().any(|w| w.is_valid);
    stage
}

/// Visible sub-segments of `surface` in a computed stage, as windows for the
/// next stage.
///
/// This is a run-length pass over the CCW-ordered source points: consecutive
/// vertices whose provenance lies on `surface` form one visible sub-segment;
/// any interruption starts a new one.
pub fn extract_windows(stage: &VisibilityStage, surface: &Surface, scene: &Scene) -> Vec<Window> {
    let mut out = Vec::new();
    if stage.windows.is_empty() {
        extract_runs(&mut out, &stage.source_points, &stage.polygon, surface, scene);
    } else {
        for wv in &stage.windows {
            extract_runs(&mut out, &wv.source_points, &wv.polygon, surface, scene);
        }
    }
    out
}

fn extract_runs(
    out: &mut Vec<Window>,
    sources: &[SourcePoint],
    positions: &[Vec2],
    surface: &Surface,
    scene: &Scene,
) {
    let mut run_start: Option<usize> = None;
    for i in 0..=sources.len() {
        let on = i < sources.len() && sources[i].lies_on(surface.id(), scene);
        if on {
            run_start.get_or_insert(i);
            continue;
        }
        if let Some(start) = run_start.take() {
            let end = i - 1;
            if end > start && positions[start] != positions[end] {
                out.push(Window {
                    segment: Segment::new(positions[start], positions[end]),
                    carrier: Some(surface.id().clone()),
                    start_source: sources[start].clone(),
                    end_source: sources[end].clone(),
                });
            }
        }
    }
}

/// Cascading visibility: stage 0 from the avatar through the configured
/// umbrella windows, stage k from the previous origin reflected through the
/// k-th planned surface, constrained to that surface's visible sub-segments.
///
/// Cascading stops when a stage sees nothing of the next surface or the
/// current origin is strictly on its non-reflective side.
pub fn compute_stages(
    scene: &Scene,
    avatar: Vec2,
    planned: &[&Surface],
    config: Option<&WindowConfig>,
    cache: &mut ReflectionCache,
) -> Vec<VisibilityStage> {
    let stage0_windows: Vec<Window> = match config {
        None => Vec::new(),
        Some(WindowConfig::Single(segment)) => vec![Window::free(*segment)],
        Some(WindowConfig::Multi(segments)) => segments.iter().copied().map(Window::free).collect(),
    };
    let mut stages = vec![compute_stage(scene, avatar, &stage0_windows)];
    let mut origin = avatar;

    for surface in planned {
        let prev = stages.last().expect("at least stage 0 exists");
        if !prev.is_valid {
            break;
        }
        if surface.normal_side(origin) > 0.0 {
            break;
        }
        let windows = extract_windows(prev, surface, scene);
        if windows.is_empty() {
            break;
        }
        origin = cache.reflect(origin, surface);
        let stage = compute_stage(scene, origin, &windows);
        stages.push(stage);
    }
    stages
}
