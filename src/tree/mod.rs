//! Subscription-tree engine: builds a propagation forest from partial contract
//! telemetry, lays it out, and paints it onto a [`DrawingSurface`].

use std::collections::{HashMap, HashSet};

mod animation;
mod build;
mod cache;
mod interaction;
mod layout;
mod render;
mod segment;
mod surface;
mod view;

pub use animation::{ANIMATION_DURATION, AnimationEvent, AnimationSet};
pub use build::build_forest;
pub use cache::{CacheEntry, CacheStatus, Fingerprint, LayoutCache};
pub use interaction::{
    CursorKind, HitTarget, HoverState, click_target, hit_test, hover, place_tooltip,
};
pub use layout::layout_forest;
pub use render::{PaintOutput, RenderInput, paint_tree};
pub use segment::segment_forest;
pub use surface::{DrawCommand, DrawingSurface, Scene};
pub use view::{RenderOutcome, RenderRequest, SubscriptionTreeView, TreeViewConfig};

/// A parent claim rejected because the child already had a parent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParentConflict {
    pub child: String,
    pub kept_parent: String,
    pub rejected_parent: String,
}

/// Propagation forest. Every id has at most one parent; ids without one are roots.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Forest {
    pub roots: Vec<String>,
    pub children: HashMap<String, Vec<String>>,
    pub parent_of: HashMap<String, String>,
    pub all_nodes: Vec<String>,
    pub conflicts: Vec<ParentConflict>,
    node_set: HashSet<String>,
}

impl Forest {
    pub fn insert_node(&mut self, id: &str) -> bool {
        if self.node_set.contains(id) {
            return false;
        }
        self.node_set.insert(id.to_owned());
        self.all_nodes.push(id.to_owned());
        true
    }

    /// Inserts `parent -> child` unless `child` already has a parent.
    ///
    /// The first claim wins; later claims naming a different parent are kept
    /// in [`Forest::conflicts`] instead of being applied.
    pub fn link(&mut self, parent: &str, child: &str) -> bool {
        if parent == child {
            return false;
        }
        self.insert_node(parent);
        self.insert_node(child);

        if let Some(existing) = self.parent_of.get(child) {
            if existing != parent {
                tracing::debug!(
                    child,
                    kept = %existing,
                    rejected = parent,
                    "ignoring conflicting parent claim"
                );
                self.conflicts.push(ParentConflict {
                    child: child.to_owned(),
                    kept_parent: existing.clone(),
                    rejected_parent: parent.to_owned(),
                });
            }
            return false;
        }

        self.parent_of.insert(child.to_owned(), parent.to_owned());
        self.children
            .entry(parent.to_owned())
            .or_default()
            .push(child.to_owned());
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node_set.contains(id)
    }

    pub fn children_of(&self, id: &str) -> &[String] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn parent(&self, id: &str) -> Option<&str> {
        self.parent_of.get(id).map(String::as_str)
    }

    pub fn node_count(&self) -> usize {
        self.all_nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.parent_of.len()
    }

    pub fn has_edges(&self) -> bool {
        !self.parent_of.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.all_nodes.is_empty()
    }

    /// Parentless ids in first-seen order.
    fn parentless(&self) -> Vec<String> {
        self.all_nodes
            .iter()
            .filter(|id| !self.parent_of.contains_key(id.as_str()))
            .cloned()
            .collect()
    }
}

/// A connected component of the forest with its measured shape.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Segment {
    pub roots: Vec<String>,
    pub nodes: Vec<String>,
    pub depth: HashMap<String, usize>,
    pub subtree_width: HashMap<String, f32>,
    pub max_depth: usize,
}

impl Segment {
    pub fn contains(&self, id: &str) -> bool {
        self.depth.contains_key(id)
    }

    pub fn width_of(&self, id: &str) -> f32 {
        self.subtree_width.get(id).copied().unwrap_or(1.0)
    }

    pub fn total_width(&self) -> f32 {
        self.roots.iter().map(|root| self.width_of(root)).sum()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodePlacement {
    pub x: f32,
    pub y: f32,
    pub depth: usize,
    pub segment: usize,
    pub span_left: f32,
    pub span_width: f32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TreeLayout {
    pub placements: HashMap<String, NodePlacement>,
    pub max_depth: usize,
    pub is_flat: bool,
    pub width: f32,
    pub height: f32,
}

impl TreeLayout {
    pub fn get(&self, id: &str) -> Option<&NodePlacement> {
        self.placements.get(id)
    }

    pub fn max_y(&self) -> f32 {
        self.placements
            .values()
            .map(|placement| placement.y)
            .fold(0.0, f32::max)
    }
}

/// Summary numbers for caption text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TreeStats {
    pub node_count: usize,
    pub depth: usize,
    pub segments: usize,
    pub is_flat: bool,
    pub parent_conflicts: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_parent_claim_wins() {
        let mut forest = Forest::default();
        assert!(forest.link("a", "c"));
        assert!(!forest.link("b", "c"));
        assert!(!forest.link("a", "c"));

        assert_eq!(forest.parent("c"), Some("a"));
        assert_eq!(forest.children_of("b"), &[] as &[String]);
        assert_eq!(
            forest.conflicts,
            vec![ParentConflict {
                child: "c".to_owned(),
                kept_parent: "a".to_owned(),
                rejected_parent: "b".to_owned(),
            }]
        );
    }

    #[test]
    fn self_links_are_ignored() {
        let mut forest = Forest::default();
        assert!(!forest.link("a", "a"));
        assert!(forest.is_empty());
    }
}
