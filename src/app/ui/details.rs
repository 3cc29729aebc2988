use eframe::egui::{self, RichText, Ui};

use propagation_view::network::contract_location;
use propagation_view::util::{ring_distance, short_id};

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection Details");
        ui.add_space(6.0);

        let Some(contract_id) = self.selected_contract.clone() else {
            ui.label("Pick a contract from the top bar.");
            return;
        };
        let Some(telemetry) = self.snapshot.contracts.get(&contract_id) else {
            ui.label("Selected contract no longer exists in the snapshot.");
            return;
        };

        let location = contract_location(&contract_id, telemetry);
        ui.label(RichText::new(format!("Contract {}", short_id(&contract_id))).strong());
        ui.small(contract_id.as_str());
        ui.label(format!("Ring location: {location:.4}"));
        ui.label(format!("Subscribers: {}", telemetry.subscriber_count()));
        ui.label(format!("Peer states: {}", telemetry.peer_state_count()));
        ui.label(format!("Broadcast entries: {}", telemetry.broadcast_count()));
        ui.separator();

        let Some(node_id) = self.selected_node.clone() else {
            ui.label("Click a node in the tree to inspect it.");
            return;
        };

        let name = self.snapshot.names.get(&node_id);
        let title = name.map_or_else(|| short_id(&node_id).to_owned(), Clone::clone);
        ui.label(RichText::new(title).strong());
        ui.small(node_id.as_str());
        ui.add_space(6.0);

        let is_self = self.self_id.as_deref() == Some(node_id.as_str());
        let role = if is_self {
            "this peer"
        } else if telemetry.is_seeding_for(&node_id, &self.snapshot.topology) {
            "seeding"
        } else if telemetry.is_subscriber_for(&node_id, &self.snapshot.topology) {
            "subscriber"
        } else {
            "relay"
        };
        ui.label(format!("Role: {role}"));

        match self.snapshot.topology.peers.get(&node_id) {
            Some(peer) => {
                ui.label(format!(
                    "Location: {:.4} (distance to contract {:.4})",
                    peer.location,
                    ring_distance(peer.location, location)
                ));
                if peer.is_gateway {
                    ui.label("Gateway peer");
                }
                if let Some(raw) = &peer.peer_id {
                    ui.label(format!("Peer id: {}", short_id(raw)))
                        .on_hover_text(raw.as_str());
                }
                if let Some(ip_hash) = &peer.ip_hash {
                    ui.label(format!("IP hash: {ip_hash}"));
                }
            }
            None => {
                ui.label("Not present in the topology snapshot.");
            }
        }

        if let Some(hash) = telemetry.state_hash_for(&node_id, &self.snapshot.topology) {
            ui.label(format!("State hash: {}", short_id(hash)))
                .on_hover_text(hash);
        }

        ui.separator();
        let mut navigate = None;

        ui.label(RichText::new("Upstream").strong());
        match self.tree.parent_of(&node_id) {
            Some(parent) => {
                if ui.link(self.display_name(parent)).clicked() {
                    navigate = Some(parent.to_owned());
                }
            }
            None => {
                ui.label("Root of its segment");
            }
        }

        let children = self.tree.children_of(&node_id);
        ui.label(RichText::new(format!("Downstream ({})", children.len())).strong());
        egui::ScrollArea::vertical()
            .id_salt("downstream_list")
            .max_height(240.0)
            .show(ui, |ui| {
                for child in children {
                    if ui.link(self.display_name(child)).clicked() {
                        navigate = Some(child.clone());
                    }
                }
            });

        if let Some(id) = navigate {
            self.set_selected_node(Some(id));
        }
    }

    fn display_name(&self, id: &str) -> String {
        self.snapshot
            .names
            .get(id)
            .cloned()
            .unwrap_or_else(|| short_id(id).to_owned())
    }
}
