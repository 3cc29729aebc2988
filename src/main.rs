mod app;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Network snapshot JSON to visualize.
    #[arg(long, default_value = "network-snapshot.json")]
    snapshot: PathBuf,
    /// Contract to select on startup.
    #[arg(long)]
    contract: Option<String>,
    /// Topology id of the observing peer, overriding the snapshot's `self_id`.
    #[arg(long)]
    self_peer: Option<String>,
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    tracing::info!(snapshot = %args.snapshot.display(), "starting propagation view");

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1360.0, 860.0]),
        ..Default::default()
    };

    eframe::run_native(
        "propagation-view",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::PropagationApp::new(
                cc,
                app::LaunchOptions {
                    snapshot_path: args.snapshot.clone(),
                    contract: args.contract.clone(),
                    self_peer: args.self_peer.clone(),
                },
            )))
        }),
    )
}
