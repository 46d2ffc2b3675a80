mod app;

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use eframe::egui::vec2;
use threat_graph::graph::{DisplayMode, SessionConfig};
use threat_graph::source::{BackendSource, GraphSource, InlineSource, StaticFileSource};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEMO_GRAPH: &str = include_str!("../assets/demo_graph.json");

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Static,
    Temporal,
}

impl From<ModeArg> for DisplayMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Static => Self::Static,
            ModeArg::Temporal => Self::Temporal,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Load the graph from a JSON file.
    #[arg(long, conflicts_with = "backend")]
    graph_file: Option<PathBuf>,

    /// Generate and fetch the graph from a backend, e.g. http://localhost:8000.
    #[arg(long)]
    backend: Option<String>,

    #[arg(long, value_enum, default_value = "static")]
    mode: ModeArg,

    /// Hide nodes whose active score is below this percentage.
    #[arg(long, default_value_t = 0.0)]
    threshold: f64,

    /// Directory that receives subgraph.json and graph.png.
    #[arg(long, default_value = ".")]
    export_dir: PathBuf,

    #[arg(long, default_value_t = 1200.0)]
    width: f32,

    #[arg(long, default_value_t = 700.0)]
    height: f32,
}

impl Args {
    fn source(&self) -> Result<Arc<dyn GraphSource>> {
        let source: Arc<dyn GraphSource> = match (&self.graph_file, &self.backend) {
            (Some(path), _) => Arc::new(StaticFileSource::new(path.clone())),
            (None, Some(url)) => Arc::new(BackendSource::new(url.as_str())),
            (None, None) => Arc::new(InlineSource::from_text("bundled demo graph", DEMO_GRAPH)?),
        };
        Ok(source)
    }

    fn session_config(&self) -> SessionConfig {
        SessionConfig {
            canvas: vec2(self.width.max(1.0), self.height.max(1.0)),
            mode: self.mode.into(),
            threshold: self.threshold,
            ..SessionConfig::default()
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("THREAT_GRAPH_LOG")
        .unwrap_or_else(|_| EnvFilter::new("threat_graph=info,warn"));

    let format = env::var("THREAT_GRAPH_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry.with(fmt::layer().json().with_ansi(false)).init();
        }
        _ => {
            registry.with(fmt::layer().compact()).init();
        }
    }
}

fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();
    let source = args.source()?;
    let config = args.session_config();
    let export_dir = args.export_dir.clone();
    info!(source = %source.describe(), mode = config.mode.label(), "starting threat graph viewer");

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([config.canvas.x + 720.0, config.canvas.y + 120.0]),
        ..Default::default()
    };

    eframe::run_native(
        "threat-graph",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::ThreatGraphApp::new(
                cc, source, config, export_dir,
            )))
        }),
    )
    .map_err(|err| anyhow::anyhow!("failed to run viewer: {err}"))
}
