use std::collections::{HashMap, HashSet};

use eframe::egui::ecolor::Hsva;
use eframe::egui::{Align2, Color32, Pos2, Rect, Stroke, Vec2, pos2, vec2};

use crate::network::{ContractTelemetry, PeerRecord, TopologySnapshot};
use crate::util::{short_id, stable_hue};

use super::animation::AnimationSet;
use super::interaction::HitTarget;
use super::surface::DrawingSurface;
use super::{Forest, Segment, TreeLayout};

const EDGE_STROKE: Stroke = Stroke {
    width: 1.2,
    color: Color32::from_rgba_premultiplied(38, 43, 51, 64),
};
const NODE_OUTLINE: Stroke = Stroke {
    width: 1.0,
    color: Color32::from_rgba_premultiplied(13, 13, 13, 190),
};
const SELECTED_COLOR: Color32 = Color32::from_rgb(245, 206, 93);
const HOVERED_COLOR: Color32 = Color32::from_rgb(255, 164, 101);
const HIGHLIGHT_COLOR: Color32 = Color32::from_rgb(247, 194, 111);
const SEEDING_MARKER: Color32 = Color32::from_rgb(246, 206, 104);
const ROOT_MARKER: Color32 = Color32::from_gray(190);
const LABEL_COLOR: Color32 = Color32::from_gray(222);
const SEGMENT_COLOR: Color32 = Color32::from_rgb(120, 132, 150);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum NodeRole {
    Plain,
    Gateway,
    SelfPeer,
    Subscriber,
}

impl NodeRole {
    fn color(self) -> Color32 {
        match self {
            Self::Plain => Color32::from_rgb(118, 130, 150),
            Self::Gateway => Color32::from_rgb(236, 172, 64),
            Self::SelfPeer => Color32::from_rgb(92, 200, 124),
            Self::Subscriber => Color32::from_rgb(84, 152, 238),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Plain => "peer",
            Self::Gateway => "gateway",
            Self::SelfPeer => "this peer",
            Self::Subscriber => "subscriber",
        }
    }
}

/// Node radius and label size for the number of nodes on screen.
fn size_tier(node_count: usize) -> (f32, f32) {
    if node_count <= 60 {
        (10.0, 11.0)
    } else if node_count <= 250 {
        (7.0, 10.0)
    } else {
        (4.5, 9.0)
    }
}

fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

fn with_alpha(color: Color32, alpha: f32) -> Color32 {
    Color32::from_rgba_unmultiplied(
        color.r(),
        color.g(),
        color.b(),
        (alpha.clamp(0.0, 1.0) * 255.0) as u8,
    )
}

/// Hue tint for an application-state hash; equal hashes share a color.
pub(super) fn state_hash_color(hash: &str) -> Color32 {
    Hsva::new(stable_hue(hash), 0.68, 0.92, 1.0).into()
}

pub struct RenderInput<'a> {
    pub forest: &'a Forest,
    pub segments: &'a [Segment],
    pub layout: &'a TreeLayout,
    pub topology: &'a TopologySnapshot,
    pub telemetry: &'a ContractTelemetry,
    pub highlighted: &'a HashSet<String>,
    pub names: &'a HashMap<String, String>,
    pub selected: Option<&'a str>,
    pub hovered: Option<&'a str>,
    pub self_id: Option<&'a str>,
    pub surface_size: Vec2,
    pub label_threshold: usize,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PaintOutput {
    pub targets: Vec<HitTarget>,
    pub animations_active: bool,
}

struct NodeVisual<'a> {
    id: &'a str,
    center: Pos2,
    role: NodeRole,
    peer: Option<&'a PeerRecord>,
    is_seeding: bool,
}

/// Paints the tree in fixed passes: edges, animations, nodes, labels, then
/// indicators around every segment but the largest.
pub fn paint_tree(
    surface: &mut impl DrawingSurface,
    input: &RenderInput<'_>,
    animations: &mut AnimationSet,
    now: f64,
) -> PaintOutput {
    let animations_active = animations.advance(now);

    if input.forest.is_empty() {
        surface.text(
            pos2(input.surface_size.x / 2.0, input.surface_size.y / 2.0),
            Align2::CENTER_CENTER,
            "No subscription data for this contract",
            14.0,
            LABEL_COLOR,
        );
        return PaintOutput {
            targets: Vec::new(),
            animations_active,
        };
    }

    let subscribers = input
        .telemetry
        .subscribers
        .iter()
        .flatten()
        .map(|id| input.topology.resolve(id))
        .collect::<HashSet<_>>();

    let nodes = input
        .forest
        .all_nodes
        .iter()
        .filter_map(|id| {
            let placement = input.layout.get(id)?;
            let peer = input.topology.peers.get(id);
            let role = if input.self_id == Some(id.as_str()) {
                NodeRole::SelfPeer
            } else if peer.is_some_and(|peer| peer.is_gateway) {
                NodeRole::Gateway
            } else if subscribers.contains(id) {
                NodeRole::Subscriber
            } else {
                NodeRole::Plain
            };
            Some(NodeVisual {
                id: id.as_str(),
                center: pos2(placement.x, placement.y),
                role,
                peer,
                is_seeding: input.telemetry.is_seeding_for(id, input.topology),
            })
        })
        .collect::<Vec<_>>();

    let (radius, label_size) = size_tier(nodes.len());

    paint_edges(surface, input);
    paint_animations(surface, input, animations, now);
    let targets = paint_nodes(surface, input, &nodes, radius);
    paint_labels(surface, input, &nodes, radius, label_size);
    // On the flat grid every node is its own segment.
    if !input.layout.is_flat {
        paint_segment_indicators(surface, input, radius);
    }

    PaintOutput {
        targets,
        animations_active,
    }
}

fn paint_edges(surface: &mut impl DrawingSurface, input: &RenderInput<'_>) {
    for parent in &input.forest.all_nodes {
        let Some(start) = input.layout.get(parent) else {
            continue;
        };
        let from = pos2(start.x, start.y);
        for child in input.forest.children_of(parent) {
            let Some(end) = input.layout.get(child) else {
                continue;
            };
            let to = pos2(end.x, end.y);
            let control = pos2(from.x, (from.y + to.y) / 2.0);
            surface.curve(from, control, to, EDGE_STROKE);
        }
    }
}

fn paint_animations(
    surface: &mut impl DrawingSurface,
    input: &RenderInput<'_>,
    animations: &AnimationSet,
    now: f64,
) {
    for event in animations.events() {
        let Some(progress) = event.progress(now) else {
            continue;
        };
        let (Some(from), Some(to)) = (input.layout.get(&event.from_id), input.layout.get(&event.to_id))
        else {
            continue;
        };

        let position = pos2(from.x, from.y).lerp(pos2(to.x, to.y), progress);
        let opacity = 1.0 - progress;
        surface.circle(
            position,
            9.0,
            with_alpha(event.color, opacity * 0.3),
            Stroke::NONE,
        );
        surface.circle(position, 4.0, with_alpha(event.color, opacity), Stroke::NONE);
    }
}

fn paint_nodes(
    surface: &mut impl DrawingSurface,
    input: &RenderInput<'_>,
    nodes: &[NodeVisual<'_>],
    radius: f32,
) -> Vec<HitTarget> {
    let draw_root_markers = input.forest.has_edges();
    let mut targets = Vec::with_capacity(nodes.len());

    for node in nodes {
        let is_selected = input.selected == Some(node.id);
        let is_hovered = input.hovered == Some(node.id);
        let is_highlighted = input.highlighted.contains(node.id);

        let fill = if is_selected {
            SELECTED_COLOR
        } else if is_hovered {
            HOVERED_COLOR
        } else if is_highlighted {
            blend_color(node.role.color(), HIGHLIGHT_COLOR, 0.72)
        } else {
            node.role.color()
        };
        let outline = if is_selected {
            Stroke::new(2.2, NODE_OUTLINE.color)
        } else {
            NODE_OUTLINE
        };
        surface.circle(node.center, radius, fill, outline);

        let state_hash = input.telemetry.state_hash_for(node.id, input.topology);
        if let Some(hash) = state_hash {
            let side = (radius * 0.7).max(4.0);
            let corner = node.center + vec2(radius * 0.7, -radius * 0.7);
            surface.rect(
                Rect::from_center_size(corner, vec2(side, side)),
                state_hash_color(hash),
            );
        }

        let is_root = input.forest.parent(node.id).is_none();
        if draw_root_markers && (node.is_seeding || is_root) {
            let top = node.center.y - radius - 3.0;
            surface.polygon(
                vec![
                    pos2(node.center.x - 5.0, top - 8.0),
                    pos2(node.center.x + 5.0, top - 8.0),
                    pos2(node.center.x, top),
                ],
                if node.is_seeding {
                    SEEDING_MARKER
                } else {
                    ROOT_MARKER
                },
            );
        }

        targets.push(HitTarget {
            id: node.id.to_owned(),
            center: node.center,
            radius,
            tooltip: compose_tooltip(input, node, state_hash, is_root),
        });
    }

    targets
}

fn compose_tooltip(
    input: &RenderInput<'_>,
    node: &NodeVisual<'_>,
    state_hash: Option<&str>,
    is_root: bool,
) -> String {
    let mut lines = Vec::with_capacity(6);

    match input.names.get(node.id) {
        Some(name) => lines.push(format!("{name} ({})", short_id(node.id))),
        None => lines.push(node.id.to_owned()),
    }

    let mut role = node.role.label().to_owned();
    if node.is_seeding {
        role.push_str(", seeding");
    } else if is_root && input.forest.has_edges() {
        role.push_str(", root");
    }
    lines.push(format!("role: {role}"));

    if let Some(raw) = node.peer.and_then(|peer| peer.peer_id.as_deref()) {
        lines.push(format!("peer: {}", short_id(raw)));
    }
    match node.peer {
        Some(peer) => lines.push(format!("location: {:.4}", peer.location)),
        None => lines.push("location: unknown".to_owned()),
    }
    if let Some(hash) = state_hash {
        lines.push(format!("state: {}", short_id(hash)));
    }
    lines.push(format!(
        "downstream: {}",
        input.forest.children_of(node.id).len()
    ));

    lines.join("\n")
}

fn paint_labels(
    surface: &mut impl DrawingSurface,
    input: &RenderInput<'_>,
    nodes: &[NodeVisual<'_>],
    radius: f32,
    label_size: f32,
) {
    let show_all = nodes.len() < input.label_threshold;

    for node in nodes {
        let name = input.names.get(node.id);
        let special = node.role == NodeRole::SelfPeer
            || node.role == NodeRole::Gateway
            || input.selected == Some(node.id)
            || name.is_some();
        if !show_all && !special {
            continue;
        }

        let text = name.map_or_else(|| short_id(node.id), String::as_str);
        surface.text(
            node.center + vec2(0.0, radius + 3.0),
            Align2::CENTER_TOP,
            text,
            label_size,
            LABEL_COLOR,
        );
    }
}

fn paint_segment_indicators(
    surface: &mut impl DrawingSurface,
    input: &RenderInput<'_>,
    radius: f32,
) {
    let stroke = Stroke::new(1.0, SEGMENT_COLOR);
    let padding = radius + 10.0;

    for segment in input.segments.iter().skip(1) {
        let Some(bounds) = segment
            .nodes
            .iter()
            .filter_map(|id| input.layout.get(id))
            .map(|placement| Rect::from_center_size(pos2(placement.x, placement.y), Vec2::ZERO))
            .reduce(|a, b| a.union(b))
        else {
            continue;
        };

        let bounds = bounds.expand(padding);
        let corners = [
            bounds.left_top(),
            bounds.right_top(),
            bounds.right_bottom(),
            bounds.left_bottom(),
        ];
        for index in 0..corners.len() {
            let next = corners[(index + 1) % corners.len()];
            surface.dashed_line(corners[index], next, stroke, 4.0, 3.0);
        }
        surface.text(
            bounds.left_top() - vec2(0.0, 3.0),
            Align2::LEFT_BOTTOM,
            "disconnected",
            10.0,
            SEGMENT_COLOR,
        );
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::super::surface::{DrawCommand, Scene};
    use super::super::{layout_forest, segment_forest};
    use super::*;

    struct Fixture {
        forest: Forest,
        segments: Vec<Segment>,
        layout: TreeLayout,
        topology: TopologySnapshot,
        telemetry: ContractTelemetry,
        highlighted: HashSet<String>,
        names: HashMap<String, String>,
    }

    impl Fixture {
        fn new(edges: &[(&str, &str)], roots: &[&str]) -> Self {
            let mut forest = Forest::default();
            for (parent, child) in edges {
                forest.link(parent, child);
            }
            forest.roots = roots.iter().map(|id| (*id).to_owned()).collect();
            let segments = segment_forest(&forest);
            let layout = layout_forest(&forest, &segments, 800.0, 400.0);

            let mut peers = BTreeMap::new();
            peers.insert(
                "gw".to_owned(),
                PeerRecord {
                    location: 0.5,
                    is_gateway: true,
                    ..PeerRecord::default()
                },
            );

            Self {
                forest,
                segments,
                layout,
                topology: TopologySnapshot::new(peers, HashSet::new()),
                telemetry: ContractTelemetry::default(),
                highlighted: HashSet::new(),
                names: HashMap::new(),
            }
        }

        fn input(&self) -> RenderInput<'_> {
            RenderInput {
                forest: &self.forest,
                segments: &self.segments,
                layout: &self.layout,
                topology: &self.topology,
                telemetry: &self.telemetry,
                highlighted: &self.highlighted,
                names: &self.names,
                selected: None,
                hovered: None,
                self_id: None,
                surface_size: vec2(800.0, 400.0),
                label_threshold: 40,
            }
        }
    }

    fn circles(scene: &Scene) -> Vec<(Pos2, Color32)> {
        scene
            .commands()
            .iter()
            .filter_map(|command| match command {
                DrawCommand::Circle { center, fill, .. } => Some((*center, *fill)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn passes_run_in_order_and_record_targets() {
        let fixture = Fixture::new(&[("gw", "b"), ("gw", "c")], &["gw"]);
        let mut scene = Scene::default();
        let mut animations = AnimationSet::default();

        let output = paint_tree(&mut scene, &fixture.input(), &mut animations, 0.0);

        let commands = scene.commands();
        let first_circle = commands
            .iter()
            .position(|command| matches!(command, DrawCommand::Circle { .. }))
            .unwrap();
        let last_curve = commands
            .iter()
            .rposition(|command| matches!(command, DrawCommand::Curve { .. }))
            .unwrap();
        assert!(last_curve < first_circle);
        assert_eq!(
            commands
                .iter()
                .filter(|command| matches!(command, DrawCommand::Curve { .. }))
                .count(),
            2
        );

        assert_eq!(output.targets.len(), 3);
        assert_eq!(output.targets[0].id, "gw");
        assert!(output.targets[0].tooltip.contains("role: gateway, root"));
        assert!(output.targets[0].tooltip.contains("location: 0.5000"));
        assert!(output.targets[0].tooltip.contains("downstream: 2"));
        assert!(!output.animations_active);
    }

    #[test]
    fn selection_overrides_role_color() {
        let fixture = Fixture::new(&[("gw", "b")], &["gw"]);
        let mut scene = Scene::default();
        let mut input = fixture.input();
        input.selected = Some("gw");
        input.hovered = Some("gw");

        paint_tree(&mut scene, &input, &mut AnimationSet::default(), 0.0);
        let gw = fixture.layout.get("gw").unwrap();
        let fill = circles(&scene)
            .into_iter()
            .find(|(center, _)| *center == pos2(gw.x, gw.y))
            .map(|(_, fill)| fill);
        assert_eq!(fill, Some(SELECTED_COLOR));
    }

    #[test]
    fn disconnected_segments_get_dashed_box() {
        let fixture = Fixture::new(&[("a", "a1"), ("a", "a2"), ("b", "b1")], &["a", "b"]);
        let mut scene = Scene::default();

        paint_tree(&mut scene, &fixture.input(), &mut AnimationSet::default(), 0.0);

        let dashes = scene
            .commands()
            .iter()
            .filter(|command| matches!(command, DrawCommand::DashedLine { .. }))
            .count();
        assert_eq!(dashes, 4);
        assert_eq!(scene.texts().filter(|text| *text == "disconnected").count(), 1);
    }

    #[test]
    fn root_markers_only_with_real_edges() {
        let mut fixture = Fixture::new(&[], &[]);
        for id in ["x", "y"] {
            fixture.forest.insert_node(id);
        }
        fixture.forest.roots = fixture.forest.all_nodes.clone();
        fixture.segments = segment_forest(&fixture.forest);
        fixture.layout = layout_forest(&fixture.forest, &fixture.segments, 800.0, 400.0);

        let mut scene = Scene::default();
        paint_tree(&mut scene, &fixture.input(), &mut AnimationSet::default(), 0.0);
        assert!(!scene
            .commands()
            .iter()
            .any(|command| matches!(command, DrawCommand::Polygon { .. })));
        assert!(!scene
            .commands()
            .iter()
            .any(|command| matches!(command, DrawCommand::DashedLine { .. })));
        assert_eq!(scene.texts().filter(|text| *text == "disconnected").count(), 0);

        let fixture = Fixture::new(&[("x", "y")], &["x"]);
        let mut scene = Scene::default();
        paint_tree(&mut scene, &fixture.input(), &mut AnimationSet::default(), 0.0);
        let markers = scene
            .commands()
            .iter()
            .filter(|command| matches!(command, DrawCommand::Polygon { .. }))
            .count();
        assert_eq!(markers, 1);
    }

    #[test]
    fn labels_limited_to_special_nodes_above_threshold() {
        let mut fixture = Fixture::new(&[("gw", "b"), ("gw", "c"), ("gw", "d")], &["gw"]);
        fixture.names.insert("c".to_owned(), "carol".to_owned());
        let mut input = fixture.input();
        input.label_threshold = 2;

        let mut scene = Scene::default();
        paint_tree(&mut scene, &input, &mut AnimationSet::default(), 0.0);
        let mut labels = scene.texts().collect::<Vec<_>>();
        labels.sort_unstable();
        assert_eq!(labels, vec!["carol", "gw"]);
    }

    #[test]
    fn animations_draw_between_endpoints_and_expire() {
        let fixture = Fixture::new(&[("gw", "b")], &["gw"]);
        let mut animations = AnimationSet::default();
        animations.add("gw", "b", Color32::RED, 0.0);

        let mut scene = Scene::default();
        let output = paint_tree(&mut scene, &fixture.input(), &mut animations, 400.0);
        assert!(output.animations_active);

        let from = fixture.layout.get("gw").unwrap();
        let to = fixture.layout.get("b").unwrap();
        let midpoint = pos2((from.x + to.x) / 2.0, (from.y + to.y) / 2.0);
        assert!(circles(&scene).iter().any(|(center, _)| center.distance(midpoint) < 0.01));

        let output = paint_tree(&mut Scene::default(), &fixture.input(), &mut animations, 900.0);
        assert!(!output.animations_active);
        assert!(animations.events().is_empty());
    }

    #[test]
    fn state_hash_tint_is_deterministic() {
        let mut fixture = Fixture::new(&[("gw", "b")], &["gw"]);
        let mut hashes = BTreeMap::new();
        hashes.insert("gw".to_owned(), "deadbeef00".to_owned());
        hashes.insert("b".to_owned(), "deadbeef00".to_owned());
        fixture.telemetry.state_hashes = Some(hashes);

        let mut scene = Scene::default();
        let output = paint_tree(&mut scene, &fixture.input(), &mut AnimationSet::default(), 0.0);
        let tints = scene
            .commands()
            .iter()
            .filter_map(|command| match command {
                DrawCommand::Rect { fill, .. } => Some(*fill),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(tints.len(), 2);
        assert_eq!(tints[0], tints[1]);
        assert_eq!(tints[0], state_hash_color("deadbeef00"));
        assert!(output.targets[1].tooltip.contains("state: deadbeef"));
    }

    #[test]
    fn state_hashes_keyed_by_raw_peer_id_still_tint() {
        let mut peers = BTreeMap::new();
        for (id, raw, location) in [("n1", "raw-1", 0.1), ("n2", "raw-2", 0.2)] {
            peers.insert(
                id.to_owned(),
                PeerRecord {
                    location,
                    peer_id: Some(raw.to_owned()),
                    ..PeerRecord::default()
                },
            );
        }
        let mut fixture = Fixture::new(&[("n1", "n2")], &["n1"]);
        fixture.topology = TopologySnapshot::new(peers, HashSet::new());
        fixture.telemetry = ContractTelemetry {
            peer_states: Some(vec![crate::network::PeerState {
                peer_id: "raw-1".to_owned(),
                upstream: None,
                downstream: vec!["raw-2".to_owned()],
                is_seeding: true,
            }]),
            state_hashes: Some(BTreeMap::from([
                ("raw-1".to_owned(), "aaaa0000".to_owned()),
                ("raw-2".to_owned(), "bbbb0000".to_owned()),
            ])),
            ..ContractTelemetry::default()
        };

        let mut scene = Scene::default();
        let output = paint_tree(&mut scene, &fixture.input(), &mut AnimationSet::default(), 0.0);
        let tints = scene
            .commands()
            .iter()
            .filter(|command| matches!(command, DrawCommand::Rect { .. }))
            .count();
        assert_eq!(tints, 2);

        let n1 = output.targets.iter().find(|target| target.id == "n1").unwrap();
        assert!(n1.tooltip.contains("seeding"));
        assert!(n1.tooltip.contains("state: aaaa0000"));
        let n2 = output.targets.iter().find(|target| target.id == "n2").unwrap();
        assert!(n2.tooltip.contains("state: bbbb0000"));
    }

    #[test]
    fn empty_forest_paints_placeholder() {
        let fixture = Fixture::new(&[], &[]);
        let mut scene = Scene::default();
        let output = paint_tree(&mut scene, &fixture.input(), &mut AnimationSet::default(), 0.0);
        assert!(output.targets.is_empty());
        assert_eq!(
            scene.texts().collect::<Vec<_>>(),
            vec!["No subscription data for this contract"]
        );
    }
}
