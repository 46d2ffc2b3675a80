use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use chrono::{DateTime, Local};
use eframe::egui::{self, Context, Rect};
use serde_json::Value;
use threat_graph::graph::{DisplayMode, Session, SessionConfig};
use threat_graph::source::GraphSource;
use tracing::warn;

mod graph;
mod render_utils;
mod ui;

type LoadResult = Result<Value, String>;

pub struct ThreatGraphApp {
    source: Arc<dyn GraphSource>,
    config: SessionConfig,
    export_dir: PathBuf,
    state: AppState,
    reload_rx: Option<Receiver<LoadResult>>,
}

enum AppState {
    Loading { rx: Receiver<LoadResult> },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    session: Session,
    source_label: String,
    export_dir: PathBuf,
    mode: DisplayMode,
    threshold: f64,
    search: String,
    suggestions: Vec<String>,
    suggestions_query: String,
    suggestions_revision: u64,
    drag: Option<DragTarget>,
    canvas_rect: Option<Rect>,
    screenshot_pending: bool,
    status_log: VecDeque<StatusEntry>,
}

/// What the current primary-button drag is moving.
#[derive(Clone, Debug, PartialEq)]
enum DragTarget {
    Node(String),
    Canvas,
}

struct StatusEntry {
    at: DateTime<Local>,
    message: String,
}

impl ThreatGraphApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        source: Arc<dyn GraphSource>,
        config: SessionConfig,
        export_dir: PathBuf,
    ) -> Self {
        let state = Self::start_load(Arc::clone(&source));
        Self {
            source,
            config,
            export_dir,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(source: Arc<dyn GraphSource>) -> Receiver<LoadResult> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = source.load().map_err(|error| {
                warn!(error = %format!("{error:#}"), "graph load failed");
                format!("{error:#}")
            });
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(source: Arc<dyn GraphSource>) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(source),
        }
    }

    fn ready_state(&self, payload: Value) -> AppState {
        let mut session = Session::new(self.config);
        session.load(payload);
        AppState::Ready(Box::new(ViewModel::new(
            session,
            self.source.describe(),
            self.export_dir.clone(),
        )))
    }
}

impl eframe::App for ThreatGraphApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;
        let mut retry = false;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(Ok(payload)) => transition = Some(Ok(payload)),
                    Ok(Err(error)) => transition = Some(Err(error)),
                    Err(TryRecvError::Disconnected) => {
                        transition = Some(Err("Background load worker disconnected".to_owned()));
                    }
                    Err(TryRecvError::Empty) => ctx.request_repaint(),
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading threat graph...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load threat graph");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        retry = true;
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    model.log("Requesting a fresh graph...");
                    self.reload_rx = Some(Self::spawn_load(Arc::clone(&self.source)));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(Ok(payload)) => model.replace_payload(payload),
                        Ok(Err(error)) => model.log(format!("Reload failed: {error}")),
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint();
                        }
                        Err(TryRecvError::Disconnected) => {
                            model.log("Reload failed: background load worker disconnected");
                        }
                    }
                }
            }
        }

        if retry {
            self.state = Self::start_load(Arc::clone(&self.source));
        }

        if let Some(result) = transition {
            self.reload_rx = None;
            self.state = match result {
                Ok(payload) => self.ready_state(payload),
                Err(error) => AppState::Error(error),
            };
        }
    }
}
