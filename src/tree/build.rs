use std::collections::{HashMap, HashSet, VecDeque};

use crate::network::{ContractTelemetry, TopologySnapshot, contract_location};
use crate::util::ring_distance;

use super::Forest;

/// Sorts after every real wraparound distance (which never exceeds 0.5).
const UNKNOWN_DISTANCE: f64 = 1.0;

/// Builds the propagation forest for one contract.
///
/// Sources are tried in order: explicit per-peer upstream/downstream states,
/// the broadcast fan-out map, and finally a spanning tree inferred over the
/// connection graph. The first source that yields an edge wins.
pub fn build_forest(
    contract_id: &str,
    telemetry: &ContractTelemetry,
    topology: &TopologySnapshot,
) -> Forest {
    let location = contract_location(contract_id, telemetry);
    let seeding = seeding_ids(telemetry, topology);

    let from_states = forest_from_peer_states(telemetry, topology);
    if from_states.has_edges() {
        tracing::debug!(contract_id, edges = from_states.edge_count(), "tree from peer states");
        return finish(from_states, &seeding, location, topology);
    }

    let from_broadcast = forest_from_broadcast(telemetry, topology);
    if from_broadcast.has_edges() {
        tracing::debug!(contract_id, edges = from_broadcast.edge_count(), "tree from broadcast map");
        return finish(from_broadcast, &seeding, location, topology);
    }

    let members = fallback_members(telemetry, topology);
    if members.is_empty() {
        return Forest::default();
    }

    let inferred = infer_spanning_forest(&members, location, topology);
    tracing::debug!(
        contract_id,
        nodes = inferred.node_count(),
        edges = inferred.edge_count(),
        "tree inferred from connections"
    );
    finish(inferred, &seeding, location, topology)
}

fn seeding_ids(telemetry: &ContractTelemetry, topology: &TopologySnapshot) -> HashSet<String> {
    telemetry
        .peer_states
        .iter()
        .flatten()
        .filter(|state| state.is_seeding)
        .map(|state| topology.resolve(&state.peer_id))
        .collect()
}

fn forest_from_peer_states(telemetry: &ContractTelemetry, topology: &TopologySnapshot) -> Forest {
    let mut forest = Forest::default();
    for state in telemetry.peer_states.iter().flatten() {
        let peer = topology.resolve(&state.peer_id);
        forest.insert_node(&peer);

        if let Some(upstream) = &state.upstream {
            forest.link(&topology.resolve(upstream), &peer);
        }
        for downstream in &state.downstream {
            forest.link(&peer, &topology.resolve(downstream));
        }
    }
    forest
}

fn forest_from_broadcast(telemetry: &ContractTelemetry, topology: &TopologySnapshot) -> Forest {
    let mut forest = Forest::default();
    for (sender, receivers) in telemetry.broadcast.iter().flatten() {
        let sender = topology.resolve(sender);
        forest.insert_node(&sender);
        for receiver in receivers {
            forest.link(&sender, &topology.resolve(receiver));
        }
    }
    forest
}

fn fallback_members(telemetry: &ContractTelemetry, topology: &TopologySnapshot) -> Vec<String> {
    let subscribers = telemetry.subscribers.iter().flatten().cloned();
    let state_peers = telemetry
        .peer_states
        .iter()
        .flatten()
        .map(|state| state.peer_id.clone());
    let senders = telemetry
        .broadcast
        .iter()
        .flat_map(|map| map.keys().cloned());
    let hashed = telemetry
        .state_hashes
        .iter()
        .flat_map(|map| map.keys().cloned());

    let mut seen = HashSet::new();
    subscribers
        .chain(state_peers)
        .chain(senders)
        .chain(hashed)
        .map(|id| topology.resolve(&id))
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

fn infer_spanning_forest(members: &[String], location: f64, topology: &TopologySnapshot) -> Forest {
    let order = members
        .iter()
        .enumerate()
        .map(|(index, id)| (id.as_str(), index))
        .collect::<HashMap<_, _>>();

    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); members.len()];
    for (a, b) in topology.connection_pairs() {
        if let (Some(&a), Some(&b)) = (order.get(a), order.get(b)) {
            adjacency[a].push(b);
            adjacency[b].push(a);
        }
    }
    for neighbors in &mut adjacency {
        neighbors.sort_unstable();
        neighbors.dedup();
    }

    let mut by_distance = (0..members.len()).collect::<Vec<_>>();
    by_distance.sort_by(|&a, &b| {
        distance_to(topology, &members[a], location)
            .total_cmp(&distance_to(topology, &members[b], location))
    });

    let mut forest = Forest::default();
    let mut visited = vec![false; members.len()];
    for start in by_distance {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        forest.insert_node(&members[start]);

        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            for &next in &adjacency[current] {
                if !visited[next] {
                    visited[next] = true;
                    forest.link(&members[current], &members[next]);
                    queue.push_back(next);
                }
            }
        }
    }

    forest
}

fn distance_to(topology: &TopologySnapshot, id: &str, location: f64) -> f64 {
    topology
        .location_of(id)
        .map_or(UNKNOWN_DISTANCE, |peer| ring_distance(peer, location))
}

fn finish(
    mut forest: Forest,
    seeding: &HashSet<String>,
    location: f64,
    topology: &TopologySnapshot,
) -> Forest {
    let mut roots = forest.parentless();
    // Stable sort keeps first-seen order as the final tie-break.
    roots.sort_by(|a, b| {
        seeding
            .contains(b)
            .cmp(&seeding.contains(a))
            .then_with(|| distance_to(topology, a, location).total_cmp(&distance_to(topology, b, location)))
    });
    forest.roots = roots;
    forest
}
