use std::collections::HashMap;

use super::segment::laid_out_children;
use super::{Forest, NodePlacement, Segment, TreeLayout};

pub(super) const PADDING_X: f32 = 30.0;
pub(super) const PADDING_TOP: f32 = 40.0;
pub(super) const PADDING_BOTTOM: f32 = 30.0;
const SEGMENT_GAP: f32 = 40.0;
const MIN_UNIT_WIDTH: f32 = 8.0;
const MAX_UNIT_WIDTH: f32 = 50.0;
const MIN_LAYER_HEIGHT: f32 = 20.0;
const MAX_LAYER_HEIGHT: f32 = 55.0;
const GRID_SPACING: f32 = 48.0;

/// Assigns surface coordinates to every node of `forest`.
///
/// Each node owns a horizontal span proportional to its subtree width and
/// sits at the span's midpoint; children split the parent's span in child
/// order. All segments share one vertical scale derived from the deepest of
/// them. A forest without any edge is laid out on a centered grid instead.
pub fn layout_forest(forest: &Forest, segments: &[Segment], width: f32, height: f32) -> TreeLayout {
    let width = width.max(1.0);
    let height = height.max(1.0);

    if forest.is_empty() {
        return TreeLayout {
            width,
            height,
            ..TreeLayout::default()
        };
    }

    if !forest.has_edges() {
        return grid_layout(forest, segments, width, height);
    }

    let max_depth = segments
        .iter()
        .map(|segment| segment.max_depth)
        .max()
        .unwrap_or(0);
    let gaps = SEGMENT_GAP * segments.len().saturating_sub(1) as f32;
    let total_units = segments
        .iter()
        .map(Segment::total_width)
        .sum::<f32>()
        .max(1.0);

    let available_width = (width - (PADDING_X * 2.0) - gaps).max(1.0);
    let unit_width = (available_width / total_units).clamp(MIN_UNIT_WIDTH, MAX_UNIT_WIDTH);
    let available_height = (height - PADDING_TOP - PADDING_BOTTOM).max(1.0);
    let layer_height =
        (available_height / (max_depth + 1) as f32).clamp(MIN_LAYER_HEIGHT, MAX_LAYER_HEIGHT);

    // Packed content may exceed `width` once the unit width hits its floor;
    // the layout then grows wider than the surface instead of going negative.
    let packed_width = (total_units * unit_width) + gaps;
    let mut cursor = ((width - packed_width) / 2.0).max(PADDING_X);

    let mut placements = HashMap::with_capacity(forest.node_count());
    for (segment_index, segment) in segments.iter().enumerate() {
        let mut stack = Vec::with_capacity(segment.len());
        for root in &segment.roots {
            let span = segment.width_of(root) * unit_width;
            stack.push((root.as_str(), cursor, span));
            cursor += span;
        }
        cursor += SEGMENT_GAP;

        while let Some((id, left, span)) = stack.pop() {
            let depth = segment.depth.get(id).copied().unwrap_or(0);
            placements.insert(
                id.to_owned(),
                NodePlacement {
                    x: left + (span / 2.0),
                    y: PADDING_TOP + (layer_height * depth as f32),
                    depth,
                    segment: segment_index,
                    span_left: left,
                    span_width: span,
                },
            );

            let children = laid_out_children(forest, segment, id).collect::<Vec<_>>();
            let child_units = children
                .iter()
                .map(|child| segment.width_of(child))
                .sum::<f32>();
            if child_units <= 0.0 {
                continue;
            }

            let mut child_left = left;
            for child in children {
                let child_span = span * (segment.width_of(child) / child_units);
                stack.push((child.as_str(), child_left, child_span));
                child_left += child_span;
            }
        }
    }

    let content_bottom = PADDING_TOP + (layer_height * max_depth as f32) + PADDING_BOTTOM;
    TreeLayout {
        placements,
        max_depth,
        is_flat: false,
        width: width.max(packed_width + (PADDING_X * 2.0)),
        height: height.max(content_bottom),
    }
}

fn grid_layout(forest: &Forest, segments: &[Segment], width: f32, height: f32) -> TreeLayout {
    let segment_of = segments
        .iter()
        .enumerate()
        .flat_map(|(index, segment)| segment.nodes.iter().map(move |id| (id.as_str(), index)))
        .collect::<HashMap<_, _>>();

    let count = forest.node_count();
    let available_width = (width - (PADDING_X * 2.0)).max(GRID_SPACING);
    let columns = ((available_width / GRID_SPACING) as usize).clamp(1, count.max(1));
    let rows = count.div_ceil(columns);
    let grid_width = (columns - 1) as f32 * GRID_SPACING;
    let left = (width - grid_width) / 2.0;

    let placements = forest
        .all_nodes
        .iter()
        .enumerate()
        .map(|(index, id)| {
            let column = index % columns;
            let row = index / columns;
            let x = left + (column as f32 * GRID_SPACING);
            (
                id.clone(),
                NodePlacement {
                    x,
                    y: PADDING_TOP + (row as f32 * GRID_SPACING),
                    depth: 0,
                    segment: segment_of.get(id.as_str()).copied().unwrap_or(0),
                    span_left: x - (GRID_SPACING / 2.0),
                    span_width: GRID_SPACING,
                },
            )
        })
        .collect();

    let content_bottom =
        PADDING_TOP + (rows.saturating_sub(1) as f32 * GRID_SPACING) + PADDING_BOTTOM;
    TreeLayout {
        placements,
        max_depth: 0,
        is_flat: true,
        width,
        height: height.max(content_bottom),
    }
}

#[cfg(test)]
mod tests {
    use super::super::segment_forest;
    use super::*;

    const EPSILON: f32 = 1e-3;

    fn forest(edges: &[(&str, &str)], roots: &[&str]) -> Forest {
        let mut forest = Forest::default();
        for (parent, child) in edges {
            forest.link(parent, child);
        }
        forest.roots = roots.iter().map(|id| (*id).to_owned()).collect();
        forest
    }

    fn assert_spans_partition(forest: &Forest, layout: &TreeLayout) {
        for (parent, children) in &forest.children {
            let parent_span = layout.get(parent).unwrap();
            let mut cursor = parent_span.span_left;
            for child in children {
                let span = layout.get(child).unwrap();
                assert!((span.span_left - cursor).abs() < EPSILON, "{child} span not adjacent");
                assert!(span.span_width > 0.0);
                assert!((span.x - (span.span_left + span.span_width / 2.0)).abs() < EPSILON);
                cursor += span.span_width;
            }
            let end = parent_span.span_left + parent_span.span_width;
            assert!((cursor - end).abs() < EPSILON, "children of {parent} do not fill its span");
        }
    }

    #[test]
    fn children_split_parent_span_in_order() {
        let forest = forest(
            &[("r", "a"), ("r", "b"), ("a", "a1"), ("a", "a2"), ("a", "a3"), ("b", "b1")],
            &["r"],
        );
        let segments = segment_forest(&forest);
        let layout = layout_forest(&forest, &segments, 800.0, 400.0);

        assert!(!layout.is_flat);
        assert_eq!(layout.max_depth, 2);
        assert_spans_partition(&forest, &layout);

        let a = layout.get("a").unwrap();
        let b = layout.get("b").unwrap();
        assert!(a.x < b.x);
        assert!((a.span_width - 3.0 * b.span_width).abs() < EPSILON);
        assert!(layout.get("a1").unwrap().y > a.y);
    }

    #[test]
    fn unit_width_is_clamped_and_group_centered() {
        let forest = forest(&[("A", "B"), ("A", "C")], &["A"]);
        let segments = segment_forest(&forest);
        let layout = layout_forest(&forest, &segments, 1000.0, 400.0);

        let root = layout.get("A").unwrap();
        assert!((root.span_width - 2.0 * MAX_UNIT_WIDTH).abs() < EPSILON);
        assert!((root.x - 500.0).abs() < EPSILON);
        assert!((root.y - PADDING_TOP).abs() < EPSILON);
    }

    #[test]
    fn wide_fan_out_grows_layout_instead_of_leaving_surface() {
        let edges = (0..200)
            .map(|index| ("root".to_owned(), format!("leaf{index}")))
            .collect::<Vec<_>>();
        let edges = edges
            .iter()
            .map(|(parent, child)| (parent.as_str(), child.as_str()))
            .collect::<Vec<_>>();
        let forest = forest(&edges, &["root"]);
        let segments = segment_forest(&forest);
        let layout = layout_forest(&forest, &segments, 800.0, 400.0);

        assert!(layout.width >= 200.0 * MIN_UNIT_WIDTH + 2.0 * PADDING_X);
        for (id, placement) in &layout.placements {
            assert!(
                placement.span_left >= 0.0 && placement.x <= layout.width,
                "{id} at x={} outside 0..{}",
                placement.x,
                layout.width
            );
        }
        assert_spans_partition(&forest, &layout);
    }

    #[test]
    fn layer_height_shared_across_segments() {
        let forest = forest(
            &[("deep", "d1"), ("d1", "d2"), ("d2", "d3"), ("shallow", "s1")],
            &["deep", "shallow"],
        );
        let segments = segment_forest(&forest);
        let layout = layout_forest(&forest, &segments, 600.0, 300.0);

        let d1 = layout.get("d1").unwrap();
        let s1 = layout.get("s1").unwrap();
        assert_eq!(d1.depth, s1.depth);
        assert!((d1.y - s1.y).abs() < EPSILON);
        assert_eq!(s1.segment, 1);
        assert!(layout.get("deep").unwrap().x < layout.get("shallow").unwrap().x);
    }

    #[test]
    fn tiny_surface_keeps_positive_geometry() {
        let forest = forest(&[("A", "B")], &["A"]);
        let segments = segment_forest(&forest);
        let layout = layout_forest(&forest, &segments, 0.0, -20.0);

        for placement in layout.placements.values() {
            assert!(placement.span_width > 0.0);
            assert!(placement.x.is_finite() && placement.y.is_finite());
        }
        assert!(layout.height > 0.0);
    }

    #[test]
    fn edgeless_forest_uses_grid() {
        let mut forest = Forest::default();
        for id in ["a", "b", "c", "d", "e"] {
            forest.insert_node(id);
        }
        forest.roots = forest.all_nodes.clone();
        let segments = segment_forest(&forest);
        let layout = layout_forest(&forest, &segments, 150.0, 300.0);

        assert!(layout.is_flat);
        assert_eq!(layout.placements.len(), 5);
        // 90px of usable width fits one 48px cell per row.
        let a = layout.get("a").unwrap();
        let b = layout.get("b").unwrap();
        assert!((a.x - 75.0).abs() < EPSILON);
        assert!((b.y - a.y - GRID_SPACING).abs() < EPSILON);
    }

    #[test]
    fn empty_forest_has_empty_layout() {
        let layout = layout_forest(&Forest::default(), &[], 300.0, 200.0);
        assert!(layout.placements.is_empty());
        assert!(!layout.is_flat);
    }
}
