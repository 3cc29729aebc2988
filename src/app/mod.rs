use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context};

use propagation_view::network::{NetworkSnapshot, load_snapshot};
use propagation_view::tree::SubscriptionTreeView;

mod graph;
mod render_utils;
mod ui;

#[derive(Clone, Debug)]
pub struct LaunchOptions {
    pub snapshot_path: PathBuf,
    pub contract: Option<String>,
    pub self_peer: Option<String>,
}

pub struct PropagationApp {
    options: LaunchOptions,
    state: AppState,
    reload_rx: Option<Receiver<Result<NetworkSnapshot, String>>>,
}

enum AppState {
    Loading {
        rx: Receiver<Result<NetworkSnapshot, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    snapshot: NetworkSnapshot,
    self_id: Option<String>,
    contract_ids: Vec<String>,
    contract_filter: String,
    contract_filter_cache: Option<ContractFilterCache>,
    selected_contract: Option<String>,
    selected_node: Option<String>,
    hovered_node: Option<String>,
    highlighted: HashSet<String>,
    tree: SubscriptionTreeView,
}

struct ContractFilterCache {
    query: String,
    matches: Vec<String>,
}

impl PropagationApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, options: LaunchOptions) -> Self {
        let state = Self::start_load(&options);
        Self {
            options,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(options: &LaunchOptions) -> Receiver<Result<NetworkSnapshot, String>> {
        let (tx, rx) = mpsc::channel();
        let path = options.snapshot_path.clone();

        thread::spawn(move || {
            let result = load_snapshot(&path).map_err(|error| format!("{error:#}"));
            if let Err(error) = &result {
                tracing::error!(%error, "failed to load network snapshot");
            }
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(options: &LaunchOptions) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(options),
        }
    }

    fn ready(&self, snapshot: NetworkSnapshot, preferred_contract: Option<String>) -> AppState {
        AppState::Ready(Box::new(ViewModel::new(
            snapshot,
            self.options.self_peer.clone(),
            preferred_contract,
        )))
    }
}

impl eframe::App for PropagationApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(Ok(snapshot)) => {
                        transition = Some(self.ready(snapshot, self.options.contract.clone()));
                    }
                    Ok(Err(error)) => transition = Some(AppState::Error(error)),
                    Err(TryRecvError::Empty) => {}
                    Err(TryRecvError::Disconnected) => {
                        transition =
                            Some(AppState::Error("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading network snapshot...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load network snapshot");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(&self.options));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &self.options.snapshot_path, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(&self.options));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(Ok(snapshot)) => {
                            let keep = model.selected_contract.clone();
                            transition = Some(AppState::Ready(Box::new(ViewModel::new(
                                snapshot,
                                self.options.self_peer.clone(),
                                keep,
                            ))));
                        }
                        Ok(Err(error)) => transition = Some(AppState::Error(error)),
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint();
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition =
                                Some(AppState::Error("Background load worker disconnected".to_owned()));
                        }
                    }
                }
            }
        }

        if matches!(self.state, AppState::Loading { .. }) && transition.is_none() {
            ctx.request_repaint();
        }

        if let Some(next_state) = transition {
            if let AppState::Ready(model) = std::mem::replace(&mut self.state, next_state) {
                model.tree.dispose();
            }
            self.reload_rx = None;
        }
    }
}
