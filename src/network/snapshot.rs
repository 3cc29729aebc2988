use std::collections::{BTreeMap, HashMap, HashSet};

use eframe::egui::Color32;

use crate::util::{connection_key, split_connection_key, stable_unit};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PeerRecord {
    pub location: f64,
    pub ip_hash: Option<String>,
    pub peer_id: Option<String>,
    pub is_gateway: bool,
}

#[derive(Clone, Debug, Default)]
pub struct TopologySnapshot {
    pub peers: BTreeMap<String, PeerRecord>,
    pub connections: HashSet<String>,
    raw_index: HashMap<String, String>,
}

impl TopologySnapshot {
    pub fn new(peers: BTreeMap<String, PeerRecord>, connections: HashSet<String>) -> Self {
        let raw_index = peers
            .iter()
            .filter_map(|(id, peer)| peer.peer_id.as_ref().map(|raw| (raw.clone(), id.clone())))
            .collect();

        Self {
            peers,
            connections,
            raw_index,
        }
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    pub fn location_of(&self, id: &str) -> Option<f64> {
        self.peers.get(id).map(|peer| peer.location)
    }

    /// Maps a raw peer id onto its topology id; unknown ids pass through.
    pub fn resolve(&self, raw: &str) -> String {
        if self.peers.contains_key(raw) {
            return raw.to_owned();
        }
        self.raw_index
            .get(raw)
            .cloned()
            .unwrap_or_else(|| raw.to_owned())
    }

    /// Raw peer id recorded for a topology node.
    pub fn raw_id(&self, id: &str) -> Option<&str> {
        self.peers.get(id).and_then(|peer| peer.peer_id.as_deref())
    }

    pub fn is_connected(&self, a: &str, b: &str) -> bool {
        self.connections.contains(&connection_key(a, b))
    }

    pub fn connection_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.connections
            .iter()
            .filter_map(|key| split_connection_key(key))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PeerState {
    pub peer_id: String,
    pub upstream: Option<String>,
    pub downstream: Vec<String>,
    pub is_seeding: bool,
}

#[derive(Clone, Debug, Default)]
pub struct ContractTelemetry {
    pub location: Option<f64>,
    pub peer_states: Option<Vec<PeerState>>,
    pub broadcast: Option<BTreeMap<String, Vec<String>>>,
    pub subscribers: Option<Vec<String>>,
    pub state_hashes: Option<BTreeMap<String, String>>,
}

impl ContractTelemetry {
    pub fn peer_state_count(&self) -> usize {
        self.peer_states.as_ref().map_or(0, Vec::len)
    }

    pub fn broadcast_count(&self) -> usize {
        self.broadcast.as_ref().map_or(0, BTreeMap::len)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.as_ref().map_or(0, Vec::len)
    }

    pub fn is_subscriber(&self, id: &str) -> bool {
        self.subscribers
            .as_ref()
            .is_some_and(|subscribers| subscribers.iter().any(|subscriber| subscriber == id))
    }

    pub fn state_hash(&self, id: &str) -> Option<&str> {
        self.state_hashes
            .as_ref()
            .and_then(|hashes| hashes.get(id))
            .map(String::as_str)
    }

    pub fn is_seeding(&self, id: &str) -> bool {
        self.peer_states
            .as_ref()
            .is_some_and(|states| states.iter().any(|state| state.is_seeding && state.peer_id == id))
    }

    /// State hash of a topology node, whether the telemetry keys it by
    /// topology id or by the node's raw peer id.
    pub fn state_hash_for<'a>(&'a self, id: &str, topology: &TopologySnapshot) -> Option<&'a str> {
        self.state_hash(id)
            .or_else(|| topology.raw_id(id).and_then(|raw| self.state_hash(raw)))
    }

    pub fn is_subscriber_for(&self, id: &str, topology: &TopologySnapshot) -> bool {
        self.is_subscriber(id) || topology.raw_id(id).is_some_and(|raw| self.is_subscriber(raw))
    }

    pub fn is_seeding_for(&self, id: &str, topology: &TopologySnapshot) -> bool {
        self.is_seeding(id) || topology.raw_id(id).is_some_and(|raw| self.is_seeding(raw))
    }
}

/// Ring location of a contract: the reported one, otherwise derived from its id.
pub fn contract_location(contract_id: &str, telemetry: &ContractTelemetry) -> f64 {
    telemetry
        .location
        .filter(|location| (0.0..1.0).contains(location))
        .unwrap_or_else(|| stable_unit(contract_id))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageKind {
    Put,
    Get,
    Update,
    Subscribe,
    Broadcast,
    Other,
}

impl MessageKind {
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "put" => Self::Put,
            "get" => Self::Get,
            "update" => Self::Update,
            "subscribe" | "subscribed" => Self::Subscribe,
            "broadcast" | "broadcast_emitted" | "broadcast_received" => Self::Broadcast,
            _ => Self::Other,
        }
    }

    pub fn color(self) -> Color32 {
        match self {
            Self::Put => Color32::from_rgb(96, 214, 140),
            Self::Get => Color32::from_rgb(103, 196, 255),
            Self::Update => Color32::from_rgb(246, 190, 92),
            Self::Subscribe => Color32::from_rgb(190, 140, 255),
            Self::Broadcast => Color32::from_rgb(241, 120, 110),
            Self::Other => Color32::from_gray(200),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageEvent {
    pub from: String,
    pub to: String,
    pub kind: MessageKind,
    pub contract: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct NetworkSnapshot {
    pub self_id: Option<String>,
    pub topology: TopologySnapshot,
    /// User-assigned display names keyed by topology id.
    pub names: HashMap<String, String>,
    pub contracts: BTreeMap<String, ContractTelemetry>,
    pub events: Vec<MessageEvent>,
}

impl NetworkSnapshot {
    pub fn contract_ids(&self) -> Vec<String> {
        let mut ids = self.contracts.keys().cloned().collect::<Vec<_>>();
        ids.sort_by(|a, b| {
            let a_size = self.contracts[a].subscriber_count();
            let b_size = self.contracts[b].subscriber_count();
            b_size.cmp(&a_size).then_with(|| a.cmp(b))
        });
        ids
    }

    pub fn events_for<'a>(&'a self, contract_id: &'a str) -> impl Iterator<Item = &'a MessageEvent> {
        self.events.iter().filter(move |event| {
            event
                .contract
                .as_deref()
                .is_none_or(|contract| contract == contract_id)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topology() -> TopologySnapshot {
        let mut peers = BTreeMap::new();
        peers.insert(
            "n1".to_owned(),
            PeerRecord {
                location: 0.25,
                peer_id: Some("raw-peer-1".to_owned()),
                ..PeerRecord::default()
            },
        );
        peers.insert("n2".to_owned(), PeerRecord::default());
        TopologySnapshot::new(peers, HashSet::from(["n1|n2".to_owned()]))
    }

    #[test]
    fn resolve_maps_raw_peer_ids_to_topology_ids() {
        let topology = topology();
        assert_eq!(topology.resolve("raw-peer-1"), "n1");
        assert_eq!(topology.resolve("n2"), "n2");
        assert_eq!(topology.resolve("stranger"), "stranger");
    }

    #[test]
    fn connections_are_undirected() {
        let topology = topology();
        assert!(topology.is_connected("n2", "n1"));
        assert!(!topology.is_connected("n1", "n3"));
    }

    #[test]
    fn contract_location_falls_back_to_hash() {
        let explicit = ContractTelemetry {
            location: Some(0.4),
            ..ContractTelemetry::default()
        };
        assert_eq!(contract_location("c", &explicit), 0.4);

        let derived = contract_location("c", &ContractTelemetry::default());
        assert!((0.0..1.0).contains(&derived));
        assert_eq!(derived, contract_location("c", &ContractTelemetry::default()));
    }

    #[test]
    fn telemetry_lookups_accept_raw_peer_keys() {
        let topology = topology();
        let telemetry = ContractTelemetry {
            peer_states: Some(vec![PeerState {
                peer_id: "raw-peer-1".to_owned(),
                is_seeding: true,
                ..PeerState::default()
            }]),
            subscribers: Some(vec!["raw-peer-1".to_owned(), "n2".to_owned()]),
            state_hashes: Some(BTreeMap::from([
                ("raw-peer-1".to_owned(), "aaaa".to_owned()),
                ("n2".to_owned(), "bbbb".to_owned()),
            ])),
            ..ContractTelemetry::default()
        };

        assert_eq!(telemetry.state_hash_for("n1", &topology), Some("aaaa"));
        assert_eq!(telemetry.state_hash_for("n2", &topology), Some("bbbb"));
        assert_eq!(telemetry.state_hash_for("n3", &topology), None);
        assert!(telemetry.is_subscriber_for("n1", &topology));
        assert!(telemetry.is_seeding_for("n1", &topology));
        assert!(!telemetry.is_seeding_for("n2", &topology));
    }

    #[test]
    fn message_kinds_parse_case_insensitively() {
        assert_eq!(MessageKind::parse("UPDATE"), MessageKind::Update);
        assert_eq!(MessageKind::parse("broadcast_emitted"), MessageKind::Broadcast);
        assert_eq!(MessageKind::parse("connect"), MessageKind::Other);
    }
}
