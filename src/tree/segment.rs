use std::collections::{HashMap, HashSet, VecDeque};

use super::{Forest, Segment};

/// Splits the forest into connected components, largest first.
///
/// Components are discovered from the declared roots; ids that no root
/// reaches (only possible with cyclic source data) become singleton segments
/// placed after every root-reachable one.
pub fn segment_forest(forest: &Forest) -> Vec<Segment> {
    let mut visited = HashSet::with_capacity(forest.node_count());
    let mut components = Vec::new();

    for root in &forest.roots {
        if !visited.insert(root.as_str()) {
            continue;
        }

        let mut nodes = Vec::new();
        let mut queue = VecDeque::from([root.as_str()]);
        while let Some(current) = queue.pop_front() {
            nodes.push(current.to_owned());
            for child in forest.children_of(current) {
                if visited.insert(child.as_str()) {
                    queue.push_back(child.as_str());
                }
            }
        }
        components.push(nodes);
    }

    components.sort_by(|a, b| b.len().cmp(&a.len()));

    for id in &forest.all_nodes {
        if visited.insert(id.as_str()) {
            components.push(vec![id.clone()]);
        }
    }

    components
        .into_iter()
        .map(|nodes| measure_segment(forest, nodes))
        .collect()
}

fn measure_segment(forest: &Forest, nodes: Vec<String>) -> Segment {
    let members = nodes.iter().map(String::as_str).collect::<HashSet<_>>();

    let mut roots = Vec::new();
    let mut depth: HashMap<String, usize> = HashMap::with_capacity(nodes.len());
    let mut order = Vec::with_capacity(nodes.len());

    // Parentless-within-segment ids first; anything still unreached after
    // that (a cycle) is promoted to a root so every node gets a depth.
    let seeds = nodes
        .iter()
        .filter(|id| forest.parent(id).is_none_or(|parent| !members.contains(parent)))
        .chain(nodes.iter())
        .collect::<Vec<_>>();

    for seed in seeds {
        if depth.contains_key(seed) {
            continue;
        }
        roots.push(seed.clone());
        depth.insert(seed.clone(), 0);

        let mut queue = VecDeque::from([seed.as_str()]);
        while let Some(current) = queue.pop_front() {
            order.push(current);
            let next_depth = depth.get(current).copied().unwrap_or(0) + 1;
            for child in forest.children_of(current) {
                if members.contains(child.as_str()) && !depth.contains_key(child) {
                    depth.insert(child.clone(), next_depth);
                    queue.push_back(child.as_str());
                }
            }
        }
    }

    // Reverse BFS order visits every child before its parent.
    let mut subtree_width: HashMap<String, f32> = HashMap::with_capacity(nodes.len());
    for &id in order.iter().rev() {
        let own_depth = depth.get(id).copied().unwrap_or(0);
        let width = forest
            .children_of(id)
            .iter()
            .filter(|child| depth.get(child.as_str()).is_some_and(|&d| d > own_depth))
            .filter_map(|child| subtree_width.get(child.as_str()))
            .sum::<f32>();
        subtree_width.insert(id.to_owned(), if width > 0.0 { width } else { 1.0 });
    }

    let max_depth = depth.values().copied().max().unwrap_or(0);

    Segment {
        roots,
        nodes,
        depth,
        subtree_width,
        max_depth,
    }
}

/// Children of `id` that belong below it in `segment`.
pub(super) fn laid_out_children<'a>(
    forest: &'a Forest,
    segment: &'a Segment,
    id: &str,
) -> impl Iterator<Item = &'a String> {
    let own_depth = segment.depth.get(id).copied().unwrap_or(0);
    forest
        .children_of(id)
        .iter()
        .filter(move |child| segment.depth.get(child.as_str()).is_some_and(|&d| d > own_depth))
}
