use std::collections::VecDeque;
use std::path::PathBuf;

use chrono::Local;
use eframe::egui::{self, Align, Context, Layout};
use serde_json::Value;
use threat_graph::export::{write_json, write_png};
use threat_graph::graph::{GraphFilter, SearchOutcome, Session, suggestions};
use tracing::{info, warn};

use super::super::{StatusEntry, ViewModel};

const MAX_LOG_ENTRIES: usize = 200;
const MAX_SUGGESTIONS: usize = 8;

impl ViewModel {
    pub(in crate::app) fn new(session: Session, source_label: String, export_dir: PathBuf) -> Self {
        let mut model = Self {
            mode: session.mode(),
            threshold: session.threshold(),
            session,
            source_label,
            export_dir,
            search: String::new(),
            suggestions: Vec::new(),
            suggestions_query: String::new(),
            suggestions_revision: 0,
            drag: None,
            canvas_rect: None,
            screenshot_pending: false,
            status_log: VecDeque::new(),
        };
        model.log_graph_summary("Graph loaded");
        model
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        self.handle_screenshot(ctx);

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("Threat Graph");
                    ui.separator();
                    ui.label(format!("source: {}", self.source_label));
                    ui.label(format!("nodes: {}", self.session.graph().node_count()));
                    ui.label(format!("links: {}", self.session.graph().link_count()));
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if is_loading {
                            ui.spinner();
                        }
                        ui.label(format!("zoom: {:.2}x", self.session.view().scale));
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_controls(ui, reload_requested, is_loading));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| self.draw_graph(ui));
    }

    pub(in crate::app) fn log(&mut self, message: impl Into<String>) {
        self.status_log.push_front(StatusEntry {
            at: Local::now(),
            message: message.into(),
        });
        self.status_log.truncate(MAX_LOG_ENTRIES);
    }

    fn log_graph_summary(&mut self, prefix: &str) {
        let graph = self.session.graph();
        let message = format!(
            "{prefix}: {} nodes, {} links ({} mode, threshold {:.1})",
            graph.node_count(),
            graph.link_count(),
            self.session.mode().label(),
            self.session.threshold()
        );
        self.log(message);
    }

    /// Adopts a freshly fetched payload, keeping the current filter.
    pub(in crate::app) fn replace_payload(&mut self, payload: Value) {
        self.drag = None;
        self.session.load(payload);
        self.log_graph_summary("Graph reloaded");
    }

    pub(in crate::app) fn apply_filter(&mut self) {
        if !self
            .session
            .set_filter(GraphFilter::new(self.mode, self.threshold))
        {
            return;
        }
        self.drag = None;
        self.log_graph_summary("Redrawn");
    }

    pub(in crate::app) fn run_search(&mut self) {
        match self.session.search(&self.search) {
            SearchOutcome::EmptyQuery => {}
            SearchOutcome::NotFound { query } => self.log(format!("Node not found: {query}")),
            SearchOutcome::Found(hit) => self.log(format!(
                "Focused {} ({} nodes in component)",
                hit.id,
                hit.component.len()
            )),
        }
    }

    /// Fuzzy candidates for the search box, recomputed only when the query
    /// or the graph changed.
    pub(in crate::app) fn refresh_suggestions(&mut self) {
        let revision = self.session.revision();
        if self.suggestions_query == self.search && self.suggestions_revision == revision {
            return;
        }

        self.suggestions = suggestions(self.session.graph(), &self.search, MAX_SUGGESTIONS);
        self.suggestions_query = self.search.clone();
        self.suggestions_revision = revision;
    }

    pub(in crate::app) fn organize(&mut self) {
        self.drag = None;
        let report = self.session.organize();
        self.log(format!(
            "Organized {} components in {} columns",
            report.components, report.columns
        ));
    }

    pub(in crate::app) fn reset_view(&mut self) {
        self.session.reset_view();
        self.log("View reset");
    }

    pub(in crate::app) fn export_json(&mut self) {
        match write_json(&self.export_dir, &self.session.snapshot()) {
            Ok(path) => self.log(format!("Exported JSON to {}", path.display())),
            Err(error) => {
                warn!(error = %format!("{error:#}"), "JSON export failed");
                self.log(format!("JSON export failed: {error:#}"));
            }
        }
    }

    pub(in crate::app) fn request_png(&mut self, ctx: &Context) {
        if self.screenshot_pending {
            return;
        }
        self.screenshot_pending = true;
        ctx.send_viewport_cmd(egui::ViewportCommand::Screenshot(egui::UserData::default()));
        self.log("Capturing canvas...");
    }

    fn handle_screenshot(&mut self, ctx: &Context) {
        if !self.screenshot_pending {
            return;
        }

        let image = ctx.input(|input| {
            input.raw.events.iter().find_map(|event| match event {
                egui::Event::Screenshot { image, .. } => Some(image.clone()),
                _ => None,
            })
        });
        let Some(image) = image else {
            ctx.request_repaint();
            return;
        };
        self.screenshot_pending = false;

        let image = match self.canvas_rect {
            Some(rect) => image.region(&rect, Some(ctx.pixels_per_point())),
            None => (*image).clone(),
        };
        let [width, height] = image.size;
        match write_png(&self.export_dir, [width as u32, height as u32], image.as_raw()) {
            Ok(path) => {
                info!(path = %path.display(), "saved canvas screenshot");
                self.log(format!("Exported PNG to {}", path.display()));
            }
            Err(error) => self.log(format!("PNG export failed: {error:#}")),
        }
    }

    pub(in crate::app) fn status_lines(&self) -> impl Iterator<Item = String> + '_ {
        self.status_log
            .iter()
            .map(|entry| format!("[{}] {}", entry.at.format("%H:%M:%S"), entry.message))
    }
}
