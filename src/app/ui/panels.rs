use std::collections::HashSet;
use std::path::Path;

use eframe::egui::{self, Align, Context, Layout, Ui};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use propagation_view::network::NetworkSnapshot;
use propagation_view::tree::{SubscriptionTreeView, TreeViewConfig};
use propagation_view::util::short_id;

use super::super::{ContractFilterCache, ViewModel};

const REPLAY_STAGGER_MS: f64 = 120.0;

impl ViewModel {
    pub(in crate::app) fn new(
        snapshot: NetworkSnapshot,
        self_peer: Option<String>,
        preferred_contract: Option<String>,
    ) -> Self {
        let contract_ids = snapshot.contract_ids();
        let self_id = self_peer
            .or_else(|| snapshot.self_id.clone())
            .map(|id| snapshot.topology.resolve(&id));

        let selected_contract = match preferred_contract {
            Some(id) if snapshot.contracts.contains_key(&id) => Some(id),
            Some(id) => {
                tracing::warn!(contract = %id, "requested contract not present in snapshot");
                contract_ids.first().cloned()
            }
            None => contract_ids.first().cloned(),
        };

        tracing::info!(
            contracts = contract_ids.len(),
            peers = snapshot.topology.peer_count(),
            selected = selected_contract.as_deref().unwrap_or("-"),
            "network snapshot ready"
        );

        Self {
            snapshot,
            self_id,
            contract_ids,
            contract_filter: String::new(),
            contract_filter_cache: None,
            selected_contract,
            selected_node: None,
            hovered_node: None,
            highlighted: HashSet::new(),
            tree: SubscriptionTreeView::create(TreeViewConfig::default()),
        }
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        snapshot_path: &Path,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("propagation-view");
                    ui.separator();
                    ui.label(format!("snapshot: {}", snapshot_path.display()));
                    ui.label(format!("peers: {}", self.snapshot.topology.peer_count()));
                    ui.label(format!("contracts: {}", self.contract_ids.len()));
                    let reload_button =
                        ui.add_enabled(!is_loading, egui::Button::new("Reload snapshot"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if let Some(caption) = self.stats_caption() {
                            ui.label(caption);
                        }
                    });
                });
                ui.horizontal(|ui| self.draw_contract_picker(ui, ctx));
            });

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            if is_loading {
                ui.vertical_centered(|ui| {
                    ui.add_space(120.0);
                    ui.heading("Reloading network snapshot...");
                    ui.add_space(8.0);
                    ui.spinner();
                });
            } else {
                self.draw_tree(ui);
            }
        });
    }

    fn draw_contract_picker(&mut self, ui: &mut Ui, ctx: &Context) {
        ui.label("Contract");
        ui.add(
            egui::TextEdit::singleline(&mut self.contract_filter)
                .hint_text("filter")
                .desired_width(160.0),
        );

        let matches = self.filtered_contracts();
        let selected_text = self
            .selected_contract
            .as_deref()
            .map_or_else(|| "none".to_owned(), |id| short_id(id).to_owned());

        let mut picked = None;
        egui::ComboBox::from_id_salt("contract_picker")
            .selected_text(selected_text)
            .width(200.0)
            .show_ui(ui, |ui| {
                if ui
                    .selectable_label(self.selected_contract.is_none(), "none")
                    .clicked()
                {
                    picked = Some(None);
                }
                for id in &matches {
                    let subscribers = self
                        .snapshot
                        .contracts
                        .get(id)
                        .map_or(0, |telemetry| telemetry.subscriber_count());
                    let label = format!("{} ({subscribers} subscribers)", short_id(id));
                    let is_selected = self.selected_contract.as_deref() == Some(id.as_str());
                    if ui.selectable_label(is_selected, label).on_hover_text(id).clicked() {
                        picked = Some(Some(id.clone()));
                    }
                }
            });
        if let Some(contract) = picked {
            self.set_selected_contract(contract);
        }

        let has_events = self
            .selected_contract
            .as_deref()
            .is_some_and(|id| self.snapshot.events_for(id).next().is_some());
        if ui
            .add_enabled(has_events, egui::Button::new("Replay events"))
            .clicked()
        {
            let now = ctx.input(|input| input.time) * 1000.0;
            self.replay_events(now);
            ctx.request_repaint();
        }
    }

    /// Contract ids matching the filter, best match first.
    fn filtered_contracts(&mut self) -> Vec<String> {
        let query = self.contract_filter.trim();
        if query.is_empty() {
            return self.contract_ids.clone();
        }
        if let Some(cache) = &self.contract_filter_cache
            && cache.query == query
        {
            return cache.matches.clone();
        }

        let matcher = SkimMatcherV2::default();
        let mut scored = self
            .contract_ids
            .iter()
            .filter_map(|id| {
                matcher
                    .fuzzy_match(&id.to_ascii_lowercase(), &query.to_ascii_lowercase())
                    .map(|score| (score, id.clone()))
            })
            .collect::<Vec<_>>();
        scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

        let matches = scored.into_iter().map(|(_, id)| id).collect::<Vec<_>>();
        self.contract_filter_cache = Some(ContractFilterCache {
            query: query.to_owned(),
            matches: matches.clone(),
        });
        matches
    }

    fn stats_caption(&self) -> Option<String> {
        self.selected_contract.as_ref()?;
        let stats = self.tree.stats();
        if stats.node_count == 0 {
            return None;
        }

        let mut caption = format!(
            "{} nodes, depth {}, {} segments",
            stats.node_count, stats.depth, stats.segments
        );
        if stats.is_flat {
            caption.push_str(", no tree edges");
        }
        if stats.parent_conflicts > 0 {
            caption.push_str(&format!(", {} parent conflicts", stats.parent_conflicts));
        }
        Some(caption)
    }

    pub(in crate::app) fn set_selected_contract(&mut self, contract: Option<String>) {
        if self.selected_contract == contract {
            return;
        }
        tracing::debug!(contract = contract.as_deref().unwrap_or("-"), "contract selected");
        self.selected_contract = contract;
        self.selected_node = None;
        self.hovered_node = None;
        self.highlighted.clear();
        self.tree.reset();
    }

    /// Selecting the current node again clears the selection.
    pub(in crate::app) fn toggle_node(&mut self, id: &str) {
        let next = if self.selected_node.as_deref() == Some(id) {
            None
        } else {
            Some(id.to_owned())
        };
        self.set_selected_node(next);
    }

    pub(in crate::app) fn set_selected_node(&mut self, selected: Option<String>) {
        self.highlighted = selected
            .as_deref()
            .map(|id| self.tree.path_to_root(id).into_iter().collect())
            .unwrap_or_default();
        self.selected_node = selected;
    }

    /// Queues one animation per recorded message of the selected contract.
    pub(in crate::app) fn replay_events(&mut self, now: f64) {
        let Some(contract_id) = self.selected_contract.as_deref() else {
            return;
        };

        let mut queued = 0usize;
        for event in self.snapshot.events_for(contract_id) {
            let from = self.snapshot.topology.resolve(&event.from);
            let to = self.snapshot.topology.resolve(&event.to);
            let start = now + (queued as f64 * REPLAY_STAGGER_MS);
            self.tree.add_animation(&from, &to, event.kind.color(), start);
            queued += 1;
        }
        tracing::debug!(contract = contract_id, queued, "replaying message events");
    }
}
