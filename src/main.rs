mod gui;

use std::path::PathBuf;

use clap::Parser;
use eframe::egui;
use log::{error, info, warn};

use gui::frontend::MindLoomApp;
use mind_loom::graph_utils::network::{GraphFile, PrecomputedNetwork};
use mind_loom::layout::{CircularParams, ForceParams, HierarchicalParams, LayoutAlgorithm, RadialParams};
use mind_loom::persistence::EngineSettings;
use mind_loom::Engine;

#[derive(Parser, Debug)]
#[command(name = "Mind-Loom", version, about = "Interactive thought/knowledge graph viewer")]
struct Args {
    /// Graph bundle (JSON with thoughts, knowledge and network)
    #[arg(long)]
    input: Option<PathBuf>,
    /// force | hierarchical | circular | radial
    #[arg(long)]
    layout: Option<String>,
    /// Number of demo thoughts when no input is given
    #[arg(long, default_value_t = 60)]
    sample: usize,
}

fn parse_layout(name: &str) -> Option<LayoutAlgorithm> {
    match name.to_ascii_lowercase().as_str() {
        "force" | "force_directed" | "force-directed" => Some(LayoutAlgorithm::ForceDirected(ForceParams::default())),
        "hierarchical" | "tree" => Some(LayoutAlgorithm::Hierarchical(HierarchicalParams::default())),
        "circular" | "circle" => Some(LayoutAlgorithm::Circular(CircularParams::default())),
        "radial" => Some(LayoutAlgorithm::Radial(RadialParams::default())),
        _ => None,
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut settings = EngineSettings::load().unwrap_or_else(|e| {
        warn!("using default settings: {:#}", e);
        EngineSettings::default()
    });
    if let Some(name) = &args.layout {
        match parse_layout(name) {
            Some(algo) => settings.default_layout = algo,
            None => warn!("unknown layout '{}', keeping {}", name, settings.default_layout.name()),
        }
    }

    let file = match &args.input {
        Some(path) => GraphFile::load(path).unwrap_or_else(|e| {
            error!("failed to read {}: {:#}", path.display(), e);
            GraphFile::default()
        }),
        None => GraphFile::sample(args.sample, 7),
    };

    let mut engine = Engine::new(settings, 1040.0, 680.0)?;
    let rt = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    let discovery = PrecomputedNetwork(file.network.clone());
    if let Err(e) = rt.block_on(engine.load_graph_data(&discovery, &file.thoughts, &file.knowledge)) {
        error!("{}", e);
    }
    match engine.load_snapshot() {
        Ok(Some(n)) => info!("restored {} saved node positions", n),
        Ok(None) => {}
        Err(e) => warn!("ignoring saved layout: {:#}", e),
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1300.0, 710.0])
            .with_min_inner_size([700.0, 420.0])
            .with_resizable(true),
        ..Default::default()
    };
    eframe::run_native("Mind-Loom", options, Box::new(move |_cc| Ok(Box::new(MindLoomApp::new(engine)) as Box<dyn eframe::App>)))
        .map_err(|e| anyhow::anyhow!("viewer failed: {}", e))
}
