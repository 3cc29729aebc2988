use std::collections::{HashMap, HashSet};

use eframe::egui::{Color32, Pos2, Vec2};

use crate::network::{ContractTelemetry, TopologySnapshot};

use super::animation::AnimationSet;
use super::cache::{CacheStatus, LayoutCache};
use super::interaction::{self, HitTarget, HoverState};
use super::render::{RenderInput, paint_tree};
use super::surface::Scene;
use super::TreeStats;

#[derive(Clone, Debug, PartialEq)]
pub struct TreeViewConfig {
    /// Pointer distance, in pixels, within which a node counts as hit.
    pub hit_radius: f32,
    /// Height assumed by the first layout pass.
    pub min_layout_height: f32,
    /// Below this many nodes every node is labelled.
    pub label_threshold: usize,
}

impl Default for TreeViewConfig {
    fn default() -> Self {
        Self {
            hit_radius: 16.0,
            min_layout_height: 320.0,
            label_threshold: 40,
        }
    }
}

pub struct RenderRequest<'a> {
    pub contract_id: &'a str,
    pub telemetry: &'a ContractTelemetry,
    pub topology: &'a TopologySnapshot,
    pub surface_size: Vec2,
    pub selected: Option<&'a str>,
    pub hovered: Option<&'a str>,
    pub highlighted: &'a HashSet<String>,
    pub names: &'a HashMap<String, String>,
    pub self_id: Option<&'a str>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderOutcome {
    pub repainted: bool,
    pub cache: CacheStatus,
    /// The caller should schedule exactly one more render.
    pub request_tick: bool,
}

/// Everything that, when changed, invalidates the retained scene.
#[derive(Clone, Debug, PartialEq, Eq)]
struct PaintKey {
    fingerprint: String,
    size: (i32, i32),
    selected: Option<String>,
    hovered: Option<String>,
    highlighted: Vec<String>,
    self_id: Option<String>,
}

impl PaintKey {
    fn new(fingerprint: &str, size: Vec2, request: &RenderRequest<'_>) -> Self {
        let mut highlighted = request.highlighted.iter().cloned().collect::<Vec<_>>();
        highlighted.sort_unstable();
        Self {
            fingerprint: fingerprint.to_owned(),
            size: (size.x.round() as i32, size.y.round() as i32),
            selected: request.selected.map(str::to_owned),
            hovered: request.hovered.map(str::to_owned),
            highlighted,
            self_id: request.self_id.map(str::to_owned),
        }
    }
}

/// One independent subscription-tree visualization.
///
/// Owns the layout cache, active animations, the retained scene, and the hit
/// targets of the last paint. Nothing is shared between instances.
#[derive(Debug)]
pub struct SubscriptionTreeView {
    config: TreeViewConfig,
    cache: LayoutCache,
    animations: AnimationSet,
    scene: Scene,
    targets: Vec<HitTarget>,
    painted: Option<PaintKey>,
    painted_animations: bool,
    stats: TreeStats,
}

impl SubscriptionTreeView {
    pub fn create(config: TreeViewConfig) -> Self {
        Self {
            cache: LayoutCache::new(config.min_layout_height),
            config,
            animations: AnimationSet::default(),
            scene: Scene::default(),
            targets: Vec::new(),
            painted: None,
            painted_animations: false,
            stats: TreeStats::default(),
        }
    }

    /// Brings the retained scene up to date for `request` at time `now`.
    ///
    /// The scene is re-recorded only when the telemetry fingerprint, surface
    /// size, or interaction state changed, or while animations are running.
    pub fn render(&mut self, request: &RenderRequest<'_>, now: f64) -> RenderOutcome {
        self.animations.tick_arrived();

        let status = self.cache.resolve(
            request.contract_id,
            request.telemetry,
            request.topology,
            request.surface_size.x,
        );
        let Some(entry) = self.cache.entry() else {
            return RenderOutcome {
                repainted: false,
                cache: status,
                request_tick: false,
            };
        };

        let size = Vec2::new(
            request.surface_size.x.max(entry.layout.width),
            request.surface_size.y.max(entry.layout.height),
        );
        let key = PaintKey::new(&entry.fingerprint, size, request);
        let animating = self.animations.advance(now);
        let stale = self.painted.as_ref() != Some(&key);

        let mut repainted = false;
        if stale || animating || self.painted_animations {
            self.scene.clear();
            let input = RenderInput {
                forest: &entry.forest,
                segments: &entry.segments,
                layout: &entry.layout,
                topology: request.topology,
                telemetry: request.telemetry,
                highlighted: request.highlighted,
                names: request.names,
                selected: request.selected,
                hovered: request.hovered,
                self_id: request.self_id,
                surface_size: size,
                label_threshold: self.config.label_threshold,
            };
            let output = paint_tree(&mut self.scene, &input, &mut self.animations, now);

            self.targets = output.targets;
            self.painted_animations = output.animations_active;
            self.painted = Some(key);
            self.stats = TreeStats {
                node_count: entry.forest.node_count(),
                depth: entry.layout.max_depth,
                segments: entry.segments.len(),
                is_flat: entry.layout.is_flat,
                parent_conflicts: entry.forest.conflicts.len(),
            };
            repainted = true;
        }

        RenderOutcome {
            repainted,
            cache: status,
            request_tick: self.animations.schedule_tick(),
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn targets(&self) -> &[HitTarget] {
        &self.targets
    }

    pub fn stats(&self) -> TreeStats {
        self.stats
    }

    /// Height the tree needs, never less than the minimum layout height.
    pub fn content_height(&self) -> f32 {
        self.cache
            .entry()
            .map_or(self.config.min_layout_height, |entry| {
                entry.layout.height.max(self.config.min_layout_height)
            })
    }

    /// Width the tree needs; wider than the surface for very wide fan-outs.
    pub fn content_width(&self) -> f32 {
        self.cache.entry().map_or(0.0, |entry| entry.layout.width)
    }

    pub fn parent_of(&self, id: &str) -> Option<&str> {
        self.cache.entry().and_then(|entry| entry.forest.parent(id))
    }

    pub fn children_of(&self, id: &str) -> &[String] {
        self.cache
            .entry()
            .map(|entry| entry.forest.children_of(id))
            .unwrap_or(&[])
    }

    /// Ids from `id` up to its root, `id` included.
    pub fn path_to_root(&self, id: &str) -> Vec<String> {
        let Some(entry) = self.cache.entry() else {
            return Vec::new();
        };
        if !entry.forest.contains(id) {
            return Vec::new();
        }

        let mut path = vec![id.to_owned()];
        let mut cursor = id;
        while let Some(parent) = entry.forest.parent(cursor) {
            if path.iter().any(|seen| seen == parent) {
                break;
            }
            path.push(parent.to_owned());
            cursor = parent;
        }
        path
    }

    pub fn hit_test(&self, pointer: Pos2) -> Option<&HitTarget> {
        interaction::hit_test(&self.targets, pointer, self.config.hit_radius)
    }

    pub fn hover(&self, pointer: Option<Pos2>) -> HoverState {
        interaction::hover(&self.targets, pointer, self.config.hit_radius)
    }

    /// Resolves a click and forwards the resulting id to `on_select`.
    /// Returns whether the callback ran.
    pub fn click(&self, pointer: Pos2, selected: Option<&str>, on_select: impl FnOnce(&str)) -> bool {
        match interaction::click_target(&self.targets, pointer, self.config.hit_radius, selected) {
            Some(id) => {
                on_select(&id);
                true
            }
            None => false,
        }
    }

    pub fn add_animation(&mut self, from_id: &str, to_id: &str, color: Color32, start_time: f64) {
        self.animations.add(from_id, to_id, color, start_time);
    }

    pub fn advance(&mut self, now: f64) -> bool {
        self.animations.advance(now)
    }

    pub fn animations(&self) -> &AnimationSet {
        &self.animations
    }

    /// Drops animations, the pending tick, the cached layout, and the scene.
    pub fn reset(&mut self) {
        self.animations.clear();
        self.cache.clear();
        self.scene.clear();
        self.targets.clear();
        self.painted = None;
        self.painted_animations = false;
        self.stats = TreeStats::default();
        tracing::debug!("subscription tree view reset");
    }

    pub fn dispose(mut self) {
        self.reset();
    }
}
