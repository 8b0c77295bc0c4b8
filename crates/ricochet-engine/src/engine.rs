use tracing::debug;

use ricochet_geom::{ReflectionCache, Scene, Surface, SurfaceId, Vec2};
use ricochet_trace::{evaluate_bypass, trace, BypassResult, TraceParams, UnifiedPath};
use ricochet_vis::{compute_stages, VisibilityStage, WindowConfig};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::render::{derive_render_segments, RenderSegment};

/// Aggregated per-frame output.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrameResults {
    pub path: UnifiedPath,
    pub bypass: BypassResult,
    pub visibility: Vec<VisibilityStage>,
    pub render_segments: Vec<RenderSegment>,
    pub cursor_reachable: bool,
    pub is_fully_aligned: bool,
    /// Plan entries that name no surface in the scene; ignored, never fatal.
    pub unknown_plan_ids: Vec<SurfaceId>,
}

/// Single-threaded frame coordinator.
///
/// Setters record inputs and raise dirty flags; reads recompute only the
/// dirty sub-results. Repeated reads without intervening writes return the
/// same cached aggregate. The reflection cache is shared by the trajectory
/// and visibility computations and replaced atomically when the scene
/// changes.
#[derive(Debug)]
pub struct AimEngine {
    scene: Scene,
    avatar: Vec2,
    cursor: Vec2,
    plan: Vec<SurfaceId>,
    window_config: Option<WindowConfig>,
    params: TraceParams,
    cache: ReflectionCache,
    results: FrameResults,
    path_dirty: bool,
    visibility_dirty: bool,
    /// Active surfaces of the last path computation; visibility follows the
    /// active plan, so it goes dirty whenever this changes.
    last_active: Vec<SurfaceId>,
}

impl AimEngine {
    pub fn new(scene: Scene) -> Self {
        Self {
            scene,
            avatar: Vec2::ZERO,
            cursor: Vec2::ZERO,
            plan: Vec::new(),
            window_config: None,
            params: TraceParams::default(),
            cache: ReflectionCache::new(),
            results: FrameResults::default(),
            path_dirty: true,
            visibility_dirty: true,
            last_active: Vec::new(),
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn params(&self) -> TraceParams {
        self.params
    }

    pub fn set_avatar(&mut self, avatar: Vec2) {
        if self.avatar != avatar {
            self.avatar = avatar;
            self.path_dirty = true;
            self.visibility_dirty = true;
        }
    }

    pub fn set_cursor(&mut self, cursor: Vec2) {
        if self.cursor != cursor {
            self.cursor = cursor;
            // Visibility does not read the cursor; it only goes dirty if the
            // cursor moves the bypass outcome, detected after the path pass.
            self.path_dirty = true;
        }
    }

    pub fn set_plan(&mut self, plan: Vec<SurfaceId>) {
        if self.plan != plan {
            self.plan = plan;
            self.path_dirty = true;
            self.visibility_dirty = true;
        }
    }

    pub fn set_window_config(&mut self, config: Option<WindowConfig>) {
        if self.window_config != config {
            self.window_config = config;
            self.visibility_dirty = true;
        }
    }

    pub fn set_params(&mut self, params: TraceParams) {
        if self.params != params {
            self.params = params;
            self.path_dirty = true;
        }
    }

    /// Swap the scene; every cache, including the reflection cache, is
    /// replaced.
    pub fn set_scene(&mut self, scene: Scene) {
        self.scene = scene;
        self.cache = ReflectionCache::new();
        self.path_dirty = true;
        self.visibility_dirty = true;
    }

    /// The aggregated frame result, recomputing only what is dirty.
    ///
    /// Two calls without intervening setters return the identical cached
    /// object.
    pub fn results(&mut self) -> &FrameResults {
        self.recompute();
        &self.results
    }

    pub fn path(&mut self) -> &UnifiedPath {
        self.recompute();
        &self.results.path
    }

    pub fn bypass(&mut self) -> &BypassResult {
        self.recompute();
        &self.results.bypass
    }

    pub fn visibility(&mut self) -> &[VisibilityStage] {
        self.recompute();
        &self.results.visibility
    }

    fn recompute(&mut self) {
        if self.path_dirty {
            tracing::trace!(avatar = ?self.avatar, cursor = ?self.cursor, plan = self.plan.len(), "recomputing trajectory");
            let mut resolved: Vec<&Surface> = Vec::with_capacity(self.plan.len());
            let mut unknown = Vec::new();
            for id in &self.plan {
                match self.scene.surface(id) {
                    Some(surface) => resolved.push(surface),
                    None => unknown.push(id.clone()),
                }
            }

            let bypass = evaluate_bypass(self.avatar, self.cursor, &resolved, &self.scene, &mut self.cache);
            let active: Vec<&Surface> = bypass
                .active_indices
                .iter()
                .map(|&i| resolved[i])
                .collect();
            if !bypass.bypassed.is_empty() {
                debug!(bypassed = bypass.bypassed.len(), "plan surfaces bypassed");
            }

            let path = trace(self.avatar, self.cursor, &active, &self.scene, &self.params, &mut self.cache);
            let render_segments = derive_render_segments(
                &path,
                self.cursor,
                &active,
                &self.scene,
                &self.params,
                &mut self.cache,
            );

            let active_ids: Vec<SurfaceId> = bypass.active.clone();
            if active_ids != self.last_active {
                self.last_active = active_ids;
                self.visibility_dirty = true;
            }

            self.results.cursor_reachable = path.cursor_reachable;
            self.results.is_fully_aligned = path.is_fully_aligned;
            self.results.path = path;
            self.results.bypass = bypass;
            self.results.render_segments = render_segments;
            self.results.unknown_plan_ids = unknown;
            self.path_dirty = false;
        }

        if self.visibility_dirty {
            tracing::trace!(stages_for = self.last_active.len(), "recomputing visibility");
            let active: Vec<&Surface> = self
                .last_active
                .iter()
                .filter_map(|id| self.scene.surface(id))
                .collect();
            self.results.visibility = compute_stages(
                &self.scene,
                self.avatar,
                &active,
                self.window_config.as_ref(),
                &mut self.cache,
            );
            self.visibility_dirty = false;
        }
    }
}
