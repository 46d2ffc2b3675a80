mod forces;
mod quadtree;

use eframe::egui::Vec2;
use tracing::{debug, instrument};

use super::model::{DisplayMode, Graph, Node};
use forces::{ChargeParams, CollisionParams, accumulate_charge, accumulate_collisions, separation_direction};
use quadtree::QuadNode;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ForceConfig {
    pub link_distance: f32,
    pub link_strength: f32,
    pub charge_strength: f32,
    pub theta: f32,
    pub collision_base_radius: f32,
    pub collision_strength: f32,
    pub velocity_decay: f32,
    pub alpha_decay: f32,
    pub alpha_min: f32,
    pub settle_ticks: usize,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            link_distance: 55.0,
            link_strength: 0.22,
            charge_strength: -95.0,
            theta: 0.9,
            collision_base_radius: 6.0,
            collision_strength: 0.9,
            velocity_decay: 0.4,
            alpha_decay: 0.1,
            alpha_min: 0.001,
            settle_ticks: 60,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutState {
    Active,
    Frozen,
}

/// Collision radius of a node under the active metric.
pub fn collision_radius(node: &Node, mode: DisplayMode, base: f32) -> f32 {
    base + (node.metric(mode).max(0.0) as f32).sqrt()
}

#[derive(Default)]
struct PhysicsScratch {
    positions: Vec<Vec2>,
    predicted: Vec<Vec2>,
    radii: Vec<f32>,
    deltas: Vec<Vec2>,
    degree: Vec<u32>,
    edges: Vec<(usize, usize)>,
}

/// Force simulation with a one-way Active -> Frozen transition per graph.
///
/// Each tick cools `alpha`, applies link, charge and collision forces to
/// velocities, recenters the layout on the canvas, then integrates. Pinned
/// nodes hold their pin. Cooling below `alpha_min` freezes the layout, and
/// once frozen, ticks change nothing.
pub struct ForceLayout {
    config: ForceConfig,
    state: LayoutState,
    alpha: f32,
    scratch: PhysicsScratch,
}

impl ForceLayout {
    pub fn new(config: ForceConfig) -> Self {
        Self {
            config,
            state: LayoutState::Active,
            alpha: 1.0,
            scratch: PhysicsScratch::default(),
        }
    }

    pub fn config(&self) -> &ForceConfig {
        &self.config
    }

    pub fn state(&self) -> LayoutState {
        self.state
    }

    pub fn is_frozen(&self) -> bool {
        self.state == LayoutState::Frozen
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Back to full energy for a freshly built graph.
    pub fn restart(&mut self) {
        self.state = LayoutState::Active;
        self.alpha = 1.0;
    }

    pub fn freeze(&mut self) {
        self.alpha = 0.0;
        self.state = LayoutState::Frozen;
    }

    /// Runs the configured number of ticks synchronously, then freezes.
    #[instrument(skip_all, fields(nodes = graph.node_count(), links = graph.link_count()))]
    pub fn settle(&mut self, graph: &mut Graph, mode: DisplayMode, center: Vec2) -> usize {
        let mut ticks = 0;
        while ticks < self.config.settle_ticks && !self.is_frozen() {
            self.tick(graph, mode, center);
            ticks += 1;
        }
        self.freeze();
        debug!(ticks, "layout settled and frozen");
        ticks
    }

    /// Advances one step. Returns whether any node is still moving; always
    /// false while frozen.
    pub fn tick(&mut self, graph: &mut Graph, mode: DisplayMode, center: Vec2) -> bool {
        if self.is_frozen() || graph.is_empty() {
            return false;
        }

        self.alpha += (0.0 - self.alpha) * self.config.alpha_decay;
        if self.alpha < self.config.alpha_min {
            self.freeze();
            debug!("alpha below minimum, layout frozen");
            return false;
        }
        let alpha = self.alpha;
        let node_count = graph.node_count();

        self.fill_scratch(graph, mode);
        self.apply_links(graph, alpha);
        self.apply_charge(graph, alpha);
        self.apply_collisions(graph);

        let centroid = graph
            .nodes()
            .iter()
            .fold(Vec2::ZERO, |sum, node| sum + node.position)
            / node_count as f32;
        let shift = center - centroid;

        let retain = 1.0 - self.config.velocity_decay;
        let mut moving = false;
        for node in graph.nodes_mut() {
            node.position += shift;
            if let Some(pin) = node.pinned {
                node.position = pin;
                node.velocity = Vec2::ZERO;
                continue;
            }

            node.velocity *= retain;
            if !(node.velocity.x.is_finite() && node.velocity.y.is_finite()) {
                node.velocity = Vec2::ZERO;
            }
            node.position += node.velocity;
            moving |= node.velocity.length_sq() > 1e-6;
        }

        moving
    }

    fn fill_scratch(&mut self, graph: &Graph, mode: DisplayMode) {
        let scratch = &mut self.scratch;
        let node_count = graph.node_count();

        scratch.positions.clear();
        scratch.radii.clear();
        for node in graph.nodes() {
            scratch.positions.push(node.position);
            scratch
                .radii
                .push(collision_radius(node, mode, self.config.collision_base_radius));
        }

        scratch.edges.clear();
        scratch.edges.extend_from_slice(graph.edges());
        scratch.degree.clear();
        scratch.degree.resize(node_count, 0);
        for &(source, target) in &scratch.edges {
            scratch.degree[source] += 1;
            scratch.degree[target] += 1;
        }
    }

    fn apply_links(&mut self, graph: &mut Graph, alpha: f32) {
        let degree = &self.scratch.degree;
        let strength = self.config.link_strength;
        let distance = self.config.link_distance;
        let nodes = graph.nodes_mut();

        for &(source, target) in &self.scratch.edges {
            if source == target {
                continue;
            }

            let from = &nodes[source];
            let to = &nodes[target];
            let mut delta = (to.position + to.velocity) - (from.position + from.velocity);
            if delta.length_sq() <= f32::EPSILON {
                delta = separation_direction(source, target) * 1e-3;
            }
            let length = delta.length();
            let shift = delta * ((length - distance) / length * alpha * strength);

            let source_degree = degree[source] as f32;
            let bias = source_degree / (source_degree + degree[target] as f32);
            nodes[target].velocity -= shift * bias;
            nodes[source].velocity += shift * (1.0 - bias);
        }
    }

    fn apply_charge(&mut self, graph: &mut Graph, alpha: f32) {
        let Some(tree) = QuadNode::build(&self.scratch.positions, &self.scratch.radii) else {
            return;
        };
        let params = ChargeParams {
            strength: self.config.charge_strength * alpha,
            theta: self.config.theta,
        };

        for (index, node) in graph.nodes_mut().iter_mut().enumerate() {
            accumulate_charge(&tree, index, &self.scratch.positions, params, &mut node.velocity);
        }
    }

    fn apply_collisions(&mut self, graph: &mut Graph) {
        let scratch = &mut self.scratch;
        scratch.predicted.clear();
        scratch
            .predicted
            .extend(graph.nodes().iter().map(|node| node.position + node.velocity));

        let Some(tree) = QuadNode::build(&scratch.predicted, &scratch.radii) else {
            return;
        };

        scratch.deltas.clear();
        scratch.deltas.resize(graph.node_count(), Vec2::ZERO);

        accumulate_collisions(
            &tree,
            &tree,
            true,
            &scratch.predicted,
            &scratch.radii,
            CollisionParams {
                strength: self.config.collision_strength,
            },
            &mut scratch.deltas,
        );

        for (node, delta) in graph.nodes_mut().iter_mut().zip(&scratch.deltas) {
            node.velocity += *delta;
        }
    }
}

impl Default for ForceLayout {
    fn default() -> Self {
        Self::new(ForceConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::*;
    use crate::graph::model::Link;

    fn chain(count: usize) -> Graph {
        let nodes = (0..count)
            .map(|index| {
                let mut node = Node::new(format!("n{index}"));
                node.position = vec2(100.0 + index as f32 * 7.0, 100.0 + (index % 3) as f32 * 5.0);
                node
            })
            .collect();
        let links = (1..count)
            .map(|index| Link::new(format!("n{}", index - 1), format!("n{index}")))
            .collect();
        Graph::new(nodes, links)
    }

    fn positions(graph: &Graph) -> Vec<Vec2> {
        graph.nodes().iter().map(|node| node.position).collect()
    }

    #[test]
    fn settle_freezes_after_configured_ticks() {
        let mut graph = chain(12);
        let mut layout = ForceLayout::default();

        let ticks = layout.settle(&mut graph, DisplayMode::Static, vec2(600.0, 350.0));

        assert_eq!(ticks, 60);
        assert!(layout.is_frozen());
        assert_eq!(layout.alpha(), 0.0);
        for node in graph.nodes() {
            assert!(node.position.x.is_finite() && node.position.y.is_finite());
        }
    }

    #[test]
    fn frozen_ticks_leave_positions_untouched() {
        let mut graph = chain(8);
        let mut layout = ForceLayout::default();
        layout.settle(&mut graph, DisplayMode::Static, vec2(400.0, 300.0));
        let before = positions(&graph);

        for _ in 0..25 {
            assert!(!layout.tick(&mut graph, DisplayMode::Static, vec2(400.0, 300.0)));
        }

        assert_eq!(positions(&graph), before);
    }

    #[test]
    fn restart_reactivates_layout() {
        let mut layout = ForceLayout::default();
        layout.freeze();
        layout.restart();
        assert_eq!(layout.state(), LayoutState::Active);
        assert_eq!(layout.alpha(), 1.0);
    }

    #[test]
    fn overlapping_nodes_are_pushed_apart() {
        let nodes = (0..4)
            .map(|index| {
                let mut node = Node::new(format!("n{index}"));
                node.position = vec2(300.0, 300.0);
                node
            })
            .collect();
        let mut graph = Graph::new(nodes, Vec::new());
        let mut layout = ForceLayout::default();

        layout.settle(&mut graph, DisplayMode::Static, vec2(300.0, 300.0));

        for (index, a) in graph.nodes().iter().enumerate() {
            for b in &graph.nodes()[index + 1..] {
                assert!((a.position - b.position).length() > 1.0);
            }
        }
    }

    #[test]
    fn centroid_is_pulled_to_canvas_center() {
        let mut graph = chain(6);
        let mut layout = ForceLayout::default();
        let center = vec2(600.0, 350.0);

        layout.tick(&mut graph, DisplayMode::Static, center);

        let centroid = graph
            .nodes()
            .iter()
            .fold(Vec2::ZERO, |sum, node| sum + node.position)
            / graph.node_count() as f32;
        // Integration after centering moves the centroid by the mean velocity only.
        assert!((centroid - center).length() < 25.0, "centroid {centroid:?}");
    }

    #[test]
    fn pinned_node_holds_its_position() {
        let mut graph = chain(5);
        let pin = vec2(42.0, 24.0);
        graph.nodes_mut()[2].pinned = Some(pin);
        let mut layout = ForceLayout::default();

        for _ in 0..10 {
            layout.tick(&mut graph, DisplayMode::Static, vec2(300.0, 300.0));
        }

        assert_eq!(graph.nodes()[2].position, pin);
        assert_eq!(graph.nodes()[2].velocity, Vec2::ZERO);
    }

    #[test]
    fn empty_and_single_node_graphs_are_trivial() {
        let mut layout = ForceLayout::default();
        let mut empty = Graph::default();
        assert_eq!(layout.settle(&mut empty, DisplayMode::Static, vec2(10.0, 10.0)), 60);

        let mut single = chain(1);
        let mut layout = ForceLayout::default();
        layout.settle(&mut single, DisplayMode::Static, vec2(50.0, 60.0));
        let position = single.nodes()[0].position;
        assert!((position - vec2(50.0, 60.0)).length() < 1e-3);
    }

    #[test]
    fn cooling_below_alpha_min_freezes_layout() {
        let mut graph = chain(6);
        let mut layout = ForceLayout::new(ForceConfig {
            alpha_min: 0.5,
            ..ForceConfig::default()
        });
        let center = vec2(300.0, 300.0);

        // 1.0 -> 0.9 -> 0.81 -> ... -> 0.478 on the seventh tick.
        let mut active_ticks = 0;
        for _ in 0..20 {
            if layout.is_frozen() {
                break;
            }
            layout.tick(&mut graph, DisplayMode::Static, center);
            if !layout.is_frozen() {
                active_ticks += 1;
            }
        }

        assert_eq!(active_ticks, 6);
        assert!(layout.is_frozen());
        assert_eq!(layout.alpha(), 0.0);

        let before = positions(&graph);
        assert!(!layout.tick(&mut graph, DisplayMode::Static, center));
        assert_eq!(positions(&graph), before);
    }

    #[test]
    fn settle_stops_early_once_alpha_min_is_reached() {
        let mut graph = chain(4);
        let mut layout = ForceLayout::new(ForceConfig {
            alpha_min: 0.5,
            ..ForceConfig::default()
        });

        let ticks = layout.settle(&mut graph, DisplayMode::Static, vec2(200.0, 200.0));

        assert_eq!(ticks, 7);
        assert!(layout.is_frozen());
    }

    #[test]
    fn link_forces_pull_stretched_pair_together() {
        let mut a = Node::new("a");
        a.position = vec2(0.0, 0.0);
        let mut b = Node::new("b");
        b.position = vec2(400.0, 0.0);
        let mut graph = Graph::new(vec![a, b], vec![Link::new("a", "b")]);
        let mut layout = ForceLayout::default();

        layout.tick(&mut graph, DisplayMode::Static, vec2(200.0, 0.0));

        let gap = (graph.nodes()[1].position - graph.nodes()[0].position).length();
        assert!(gap < 400.0, "gap {gap}");
    }

    #[test]
    fn collision_radius_grows_with_metric() {
        let mut node = Node::new("a");
        node.pr_percent = 16.0;
        node.pr_temporal_percent = 0.0;
        assert_eq!(collision_radius(&node, DisplayMode::Static, 6.0), 10.0);
        assert_eq!(collision_radius(&node, DisplayMode::Temporal, 6.0), 6.0);
    }
}
