use std::collections::{BTreeMap, HashMap, HashSet};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::util::{connection_key, split_connection_key};

use super::snapshot::{
    ContractTelemetry, MessageEvent, MessageKind, NetworkSnapshot, PeerRecord, PeerState,
    TopologySnapshot,
};

#[derive(Clone, Debug, Default, Deserialize)]
struct RawSnapshot {
    #[serde(default)]
    self_id: Option<String>,
    #[serde(default, alias = "peers")]
    topology: BTreeMap<String, RawPeer>,
    #[serde(default)]
    connections: Vec<String>,
    #[serde(default)]
    names: HashMap<String, String>,
    #[serde(default)]
    contracts: BTreeMap<String, RawContract>,
    #[serde(default)]
    events: Vec<RawEvent>,
}

#[derive(Clone, Debug, Default, Deserialize)]
struct RawPeer {
    #[serde(default)]
    location: f64,
    #[serde(default)]
    ip_hash: Option<String>,
    #[serde(default)]
    peer_id: Option<String>,
    #[serde(default)]
    is_gateway: bool,
}

#[derive(Clone, Debug, Default, Deserialize)]
struct RawContract {
    #[serde(default)]
    location: Option<f64>,
    #[serde(default)]
    peer_states: Option<Vec<RawPeerState>>,
    #[serde(default, alias = "broadcast_tree")]
    broadcast: Option<BTreeMap<String, Vec<String>>>,
    #[serde(default)]
    subscribers: Option<Vec<String>>,
    #[serde(default, alias = "peer_state_hashes")]
    state_hashes: Option<BTreeMap<String, String>>,
}

#[derive(Clone, Debug, Default, Deserialize)]
struct RawPeerState {
    peer_id: String,
    #[serde(default)]
    upstream: Option<String>,
    #[serde(default)]
    downstream: Option<Vec<String>>,
    #[serde(default)]
    is_seeding: Option<bool>,
}

#[derive(Clone, Debug, Deserialize)]
struct RawEvent {
    from: String,
    to: String,
    #[serde(default)]
    kind: String,
    #[serde(default)]
    contract: Option<String>,
}

pub(super) fn parse_snapshot(raw: &str) -> Result<NetworkSnapshot> {
    let parsed: RawSnapshot =
        serde_json::from_str(raw).context("invalid network snapshot JSON")?;

    let peers = parsed
        .topology
        .into_iter()
        .map(|(id, peer)| {
            let location = if (0.0..1.0).contains(&peer.location) {
                peer.location
            } else {
                tracing::warn!(peer = %id, location = peer.location, "peer location out of range");
                peer.location.rem_euclid(1.0)
            };
            (
                id,
                PeerRecord {
                    location,
                    ip_hash: peer.ip_hash,
                    peer_id: peer.peer_id,
                    is_gateway: peer.is_gateway,
                },
            )
        })
        .collect::<BTreeMap<_, _>>();

    let connections = canonical_connections(&parsed.connections);

    let contracts = parsed
        .contracts
        .into_iter()
        .map(|(id, contract)| (id, convert_contract(contract)))
        .collect();

    let events = parsed
        .events
        .into_iter()
        .map(|event| MessageEvent {
            kind: MessageKind::parse(&event.kind),
            from: event.from,
            to: event.to,
            contract: event.contract,
        })
        .collect();

    Ok(NetworkSnapshot {
        self_id: parsed.self_id,
        topology: TopologySnapshot::new(peers, connections),
        names: parsed.names,
        contracts,
        events,
    })
}

fn canonical_connections(entries: &[String]) -> HashSet<String> {
    let mut connections = HashSet::with_capacity(entries.len());
    for entry in entries {
        match split_connection_key(entry) {
            Some((a, b)) => {
                connections.insert(connection_key(a, b));
            }
            None => tracing::warn!(entry = %entry, "skipping malformed connection key"),
        }
    }
    connections
}

fn convert_contract(contract: RawContract) -> ContractTelemetry {
    let peer_states = contract.peer_states.map(|states| {
        states
            .into_iter()
            .map(|state| PeerState {
                peer_id: state.peer_id,
                upstream: state.upstream.filter(|upstream| !upstream.is_empty()),
                downstream: state.downstream.unwrap_or_default(),
                is_seeding: state.is_seeding.unwrap_or(false),
            })
            .collect()
    });

    ContractTelemetry {
        location: contract.location,
        peer_states,
        broadcast: contract.broadcast,
        subscribers: contract.subscribers,
        state_hashes: contract.state_hashes,
    }
}
