use std::collections::{HashMap, HashSet, VecDeque};
use std::f32::consts::TAU;

use eframe::egui::{Vec2, vec2};
use tracing::{info, instrument};

use super::model::{DisplayMode, Graph};
use super::neighbors::NeighborIndex;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrganizerConfig {
    /// Distance between consecutive BFS rings.
    pub ring_step: f32,
    pub min_cell_width: f32,
    pub cell_height: f32,
    pub vertical_offset: f32,
}

impl Default for OrganizerConfig {
    fn default() -> Self {
        Self {
            ring_step: 42.0,
            min_cell_width: 260.0,
            cell_height: 220.0,
            vertical_offset: 20.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrganizeReport {
    pub components: usize,
    pub columns: usize,
}

/// Undirected connected components, seeded in node order. Each component
/// lists its ids in BFS visit order.
pub fn connected_components(graph: &Graph, index: &NeighborIndex) -> Vec<Vec<String>> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(graph.node_count());
    let mut components = Vec::new();

    for node in graph.nodes() {
        if !seen.insert(node.id.as_str()) {
            continue;
        }

        let mut component = Vec::new();
        let mut queue = VecDeque::from([node.id.as_str()]);
        while let Some(current) = queue.pop_front() {
            component.push(current.to_owned());
            for next in index.undirected(current) {
                if graph.contains(next) && seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        components.push(component);
    }

    components
}

fn best_metric(graph: &Graph, component: &[String], mode: DisplayMode) -> f64 {
    component
        .iter()
        .filter_map(|id| graph.node(id))
        .map(|node| node.metric(mode))
        .fold(0.0, f64::max)
}

/// Places one component in rings around its highest-scoring node.
///
/// The root sits at `center`; a node `k` hops away sits on the ring of
/// radius `k * ring_step`, evenly spaced among its ring.
pub fn radial_layout(
    graph: &mut Graph,
    index: &NeighborIndex,
    component: &[String],
    mode: DisplayMode,
    center: Vec2,
    ring_step: f32,
) {
    let Some(first) = component.first() else {
        return;
    };

    let mut root = first.as_str();
    let mut root_score = graph.node(root).map_or(0.0, |node| node.metric(mode));
    for id in component {
        let score = graph.node(id).map_or(0.0, |node| node.metric(mode));
        if score > root_score {
            root = id.as_str();
            root_score = score;
        }
    }

    let members = component
        .iter()
        .map(String::as_str)
        .collect::<HashSet<_>>();
    let mut layer_of: HashMap<&str, usize> = HashMap::from([(root, 0)]);
    let mut queue = VecDeque::from([root]);
    while let Some(current) = queue.pop_front() {
        let depth = layer_of.get(current).copied().unwrap_or_default();
        for next in index.undirected(current) {
            if members.contains(next) && !layer_of.contains_key(next) {
                layer_of.insert(next, depth + 1);
                queue.push_back(next);
            }
        }
    }

    let mut layers: Vec<Vec<&str>> = Vec::new();
    for id in component {
        let layer = layer_of.get(id.as_str()).copied().unwrap_or_default();
        if layers.len() <= layer {
            layers.resize_with(layer + 1, Vec::new);
        }
        layers[layer].push(id.as_str());
    }

    for (layer, ids) in layers.iter().enumerate() {
        let radius = layer as f32 * ring_step;
        let slots = ids.len().max(1) as f32;
        for (slot, id) in ids.iter().enumerate() {
            let Some(node) = graph.node_mut(id) else {
                continue;
            };
            let offset = if layer == 0 {
                Vec2::ZERO
            } else {
                let angle = TAU * slot as f32 / slots;
                vec2(angle.cos(), angle.sin()) * radius
            };
            node.position = center + offset;
            node.velocity = Vec2::ZERO;
            node.pinned = None;
        }
    }
}

/// Tiles every component, strongest first, into a grid of cells on the canvas.
#[instrument(skip_all, fields(nodes = graph.node_count()))]
pub fn organize(
    graph: &mut Graph,
    index: &NeighborIndex,
    mode: DisplayMode,
    canvas: Vec2,
    config: &OrganizerConfig,
) -> OrganizeReport {
    let mut scored = connected_components(graph, index)
        .into_iter()
        .map(|component| {
            let score = best_metric(graph, &component, mode);
            (component, score)
        })
        .collect::<Vec<_>>();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));

    let columns = ((scored.len() as f64).sqrt().ceil() as usize).max(1);
    let cell_width = (canvas.x / columns as f32).max(config.min_cell_width);

    for (slot, (component, _score)) in scored.iter().enumerate() {
        let row = slot / columns;
        let col = slot % columns;
        let center = vec2(
            col as f32 * cell_width + cell_width / 2.0,
            row as f32 * config.cell_height + config.cell_height / 2.0 + config.vertical_offset,
        );
        radial_layout(graph, index, component, mode, center, config.ring_step);
    }

    info!(components = scored.len(), columns, "organized graph by component");
    OrganizeReport {
        components: scored.len(),
        columns,
    }
}
