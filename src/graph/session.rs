use eframe::egui::{Vec2, vec2};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::Value;
use tracing::{debug, info, instrument};

use super::highlight::{Highlight, NodeDetails};
use super::model::{DisplayMode, Graph};
use super::neighbors::NeighborIndex;
use super::normalize::{GraphFilter, normalize};
use super::organize::{OrganizeReport, OrganizerConfig, organize};
use super::physics::{ForceConfig, ForceLayout};
use super::placement::place_with_rng;
use super::search::SearchOutcome;
use super::view::ViewTransform;
use crate::export::GraphSnapshot;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionConfig {
    pub canvas: Vec2,
    pub mode: DisplayMode,
    pub threshold: f64,
    pub force: ForceConfig,
    pub organizer: OrganizerConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            canvas: vec2(1200.0, 700.0),
            mode: DisplayMode::Static,
            threshold: 0.0,
            force: ForceConfig::default(),
            organizer: OrganizerConfig::default(),
        }
    }
}

/// One loaded data set and everything derived from it.
///
/// Every data or filter change goes through [`Session::redraw`], which
/// rebuilds the graph, the neighbor index and the layout from the raw
/// payload and drops any selection. Interaction commands only touch the
/// derived state of the current graph.
pub struct Session {
    config: SessionConfig,
    payload: Value,
    graph: Graph,
    index: NeighborIndex,
    layout: ForceLayout,
    highlight: Highlight,
    view: ViewTransform,
    revision: u64,
    rng: StdRng,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    pub fn with_rng(config: SessionConfig, rng: StdRng) -> Self {
        Self {
            config,
            payload: Value::Null,
            graph: Graph::default(),
            index: NeighborIndex::default(),
            layout: ForceLayout::new(config.force),
            highlight: Highlight::default(),
            view: ViewTransform::IDENTITY,
            revision: 0,
            rng,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn mode(&self) -> DisplayMode {
        self.config.mode
    }

    pub fn threshold(&self) -> f64 {
        self.config.threshold
    }

    pub fn canvas(&self) -> Vec2 {
        self.config.canvas
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn neighbors(&self) -> &NeighborIndex {
        &self.index
    }

    pub fn layout(&self) -> &ForceLayout {
        &self.layout
    }

    pub fn highlight(&self) -> &Highlight {
        &self.highlight
    }

    pub fn selected(&self) -> Option<&str> {
        self.highlight.selected.as_deref()
    }

    pub fn view(&self) -> ViewTransform {
        self.view
    }

    pub fn view_mut(&mut self) -> &mut ViewTransform {
        &mut self.view
    }

    /// Bumped on every rebuild so callers can drop caches keyed on the graph.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn has_payload(&self) -> bool {
        !self.payload.is_null()
    }

    pub fn load(&mut self, payload: Value) {
        self.payload = payload;
        self.redraw();
    }

    pub fn set_mode(&mut self, mode: DisplayMode) {
        self.config.mode = mode;
        self.redraw();
    }

    pub fn set_threshold(&mut self, threshold: f64) {
        self.config.threshold = threshold;
        self.redraw();
    }

    pub fn filter(&self) -> GraphFilter {
        GraphFilter::new(self.config.mode, self.config.threshold)
    }

    /// Applies mode and threshold together with a single redraw. Returns false
    /// and leaves the graph alone when neither changed.
    pub fn set_filter(&mut self, filter: GraphFilter) -> bool {
        if filter == self.filter() {
            return false;
        }
        self.config.mode = filter.mode;
        self.config.threshold = filter.threshold;
        self.redraw();
        true
    }

    /// Later placements, organize and search use the new size; the current
    /// layout stays where it is.
    pub fn resize_canvas(&mut self, canvas: Vec2) {
        if canvas.x > 0.0 && canvas.y > 0.0 {
            self.config.canvas = canvas;
        }
    }

    #[instrument(skip_all, fields(mode = self.config.mode.label(), threshold = self.config.threshold))]
    pub fn redraw(&mut self) {
        self.graph = normalize(&self.payload, &self.filter());
        self.index = NeighborIndex::build(self.graph.links());
        self.highlight = Highlight::default();

        place_with_rng(self.graph.nodes_mut(), self.config.canvas, &mut self.rng);
        self.layout = ForceLayout::new(self.config.force);
        self.layout
            .settle(&mut self.graph, self.config.mode, self.config.canvas / 2.0);

        self.revision += 1;
        info!(
            nodes = self.graph.node_count(),
            links = self.graph.link_count(),
            revision = self.revision,
            "graph redrawn"
        );
    }

    pub fn tick(&mut self) -> bool {
        self.layout
            .tick(&mut self.graph, self.config.mode, self.config.canvas / 2.0)
    }

    /// `None` clears. Unknown ids leave the current state alone and return false.
    pub fn select_node(&mut self, id: Option<&str>) -> bool {
        let Some(id) = id else {
            self.clear_selection();
            return true;
        };
        if !self.graph.contains(id) {
            debug!(id, "ignoring selection of unknown node");
            return false;
        }

        self.highlight = Highlight::for_selection(&self.graph, &self.index, id);
        true
    }

    pub fn clear_selection(&mut self) {
        self.highlight = Highlight::default();
    }

    pub fn node_details(&self, id: &str) -> Option<NodeDetails> {
        NodeDetails::collect(&self.graph, &self.index, id)
    }

    pub fn selected_details(&self) -> Option<NodeDetails> {
        self.selected().and_then(|id| self.node_details(id))
    }

    pub fn begin_drag(&mut self, id: &str) -> bool {
        let Some(node) = self.graph.node_mut(id) else {
            return false;
        };
        node.pinned = Some(node.position);
        true
    }

    /// Moves the node right away, frozen or not.
    pub fn update_drag(&mut self, id: &str, position: Vec2) -> bool {
        let Some(node) = self.graph.node_mut(id) else {
            return false;
        };
        node.pinned = Some(position);
        node.position = position;
        node.velocity = Vec2::ZERO;
        true
    }

    pub fn end_drag(&mut self, id: &str) -> bool {
        let Some(node) = self.graph.node_mut(id) else {
            return false;
        };
        if let Some(pin) = node.pinned.take() {
            node.position = pin;
        }
        true
    }

    /// Radial per-component layout; leaves the layout frozen.
    pub fn organize(&mut self) -> OrganizeReport {
        let report = organize(
            &mut self.graph,
            &self.index,
            self.config.mode,
            self.config.canvas,
            &self.config.organizer,
        );
        self.layout.freeze();
        report
    }

    /// Exact search. A hit dims everything outside its component and moves
    /// the view onto it; the current selection is kept.
    pub fn search(&mut self, query: &str) -> SearchOutcome {
        let outcome = SearchOutcome::run(&self.graph, &self.index, query, self.config.canvas);
        if let SearchOutcome::Found(hit) = &outcome {
            self.highlight =
                Highlight::for_component(&self.graph, &hit.component, self.highlight.selected.clone());
            self.view = hit.focus;
            info!(id = %hit.id, component = hit.component.len(), "search focused node");
        }
        outcome
    }

    /// Identity view with nothing selected or dimmed.
    pub fn reset_view(&mut self) {
        self.highlight = Highlight::default();
        self.view = ViewTransform::IDENTITY;
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot::capture(&self.graph)
    }
}
