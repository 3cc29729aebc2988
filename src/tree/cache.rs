use std::fmt;

use crate::network::{ContractTelemetry, TopologySnapshot};

use super::layout::PADDING_BOTTOM;
use super::{Forest, Segment, TreeLayout, build_forest, layout_forest, segment_forest};

const WIDTH_TOLERANCE: f32 = 0.5;

/// Cheap composite key telling whether a contract's telemetry changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fingerprint {
    pub contract_id: String,
    pub peer_states: usize,
    pub broadcast_entries: usize,
    pub subscribers: usize,
    pub peers: usize,
}

impl Fingerprint {
    pub fn of(contract_id: &str, telemetry: &ContractTelemetry, topology: &TopologySnapshot) -> Self {
        Self {
            contract_id: contract_id.to_owned(),
            peer_states: telemetry.peer_state_count(),
            broadcast_entries: telemetry.broadcast_count(),
            subscribers: telemetry.subscriber_count(),
            peers: topology.peer_count(),
        }
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}:{}",
            self.contract_id, self.peer_states, self.broadcast_entries, self.subscribers, self.peers
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CacheEntry {
    pub fingerprint: String,
    pub forest: Forest,
    pub segments: Vec<Segment>,
    pub layout: TreeLayout,
    pub width: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    /// Same telemetry, new surface width: only the layout was recomputed.
    Relayout,
    Rebuilt,
}

#[derive(Debug)]
pub struct LayoutCache {
    entry: Option<CacheEntry>,
    min_height: f32,
}

impl LayoutCache {
    pub fn new(min_height: f32) -> Self {
        Self {
            entry: None,
            min_height: min_height.max(1.0),
        }
    }

    pub fn entry(&self) -> Option<&CacheEntry> {
        self.entry.as_ref()
    }

    pub fn clear(&mut self) {
        self.entry = None;
    }

    pub fn resolve(
        &mut self,
        contract_id: &str,
        telemetry: &ContractTelemetry,
        topology: &TopologySnapshot,
        width: f32,
    ) -> CacheStatus {
        let fingerprint = Fingerprint::of(contract_id, telemetry, topology).to_string();
        let min_height = self.min_height;

        if let Some(entry) = self.entry.as_mut()
            && entry.fingerprint == fingerprint
        {
            if (entry.width - width).abs() < WIDTH_TOLERANCE {
                return CacheStatus::Hit;
            }
            entry.layout = two_pass_layout(&entry.forest, &entry.segments, width, min_height);
            entry.width = width;
            return CacheStatus::Relayout;
        }

        let forest = build_forest(contract_id, telemetry, topology);
        let segments = segment_forest(&forest);
        let layout = two_pass_layout(&forest, &segments, width, min_height);
        tracing::debug!(
            %fingerprint,
            nodes = forest.node_count(),
            edges = forest.edge_count(),
            segments = segments.len(),
            flat = layout.is_flat,
            "rebuilt subscription tree"
        );

        self.entry = Some(CacheEntry {
            fingerprint,
            forest,
            segments,
            layout,
            width,
        });
        CacheStatus::Rebuilt
    }
}

/// Lays out against `min_height`, then once more against the height the
/// first pass actually needed if that turned out larger.
fn two_pass_layout(forest: &Forest, segments: &[Segment], width: f32, min_height: f32) -> TreeLayout {
    let first = layout_forest(forest, segments, width, min_height);
    let needed = first.max_y() + PADDING_BOTTOM;
    if needed > min_height {
        layout_forest(forest, segments, width, needed)
    } else {
        first
    }
}
