use std::collections::HashMap;

use eframe::egui::Vec2;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Which of the two importance scores drives sizing, collision and ranking.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Static,
    Temporal,
}

impl DisplayMode {
    pub fn metric_key(self) -> &'static str {
        match self {
            Self::Static => "pr_percent",
            Self::Temporal => "pr_temporal_percent",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Temporal => "temporal",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Category {
    Domain,
    Ip,
    Cert,
    Hash,
    #[default]
    Other,
}

impl Category {
    /// Categories shown in the legend, in display order.
    pub const LEGEND: [Self; 4] = [Self::Domain, Self::Ip, Self::Cert, Self::Hash];

    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "domain" => Self::Domain,
            "ip" => Self::Ip,
            "cert" => Self::Cert,
            "hash" => Self::Hash,
            _ => Self::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Domain => "domain",
            Self::Ip => "ip",
            Self::Cert => "cert",
            Self::Hash => "hash",
            Self::Other => "other",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Node {
    pub id: String,
    pub label: Option<String>,
    pub category: Category,
    pub pr_percent: f64,
    pub pr_temporal_percent: f64,
    pub last_seen: Option<String>,
    pub position: Vec2,
    pub velocity: Vec2,
    /// Fixed position while the node is being dragged.
    pub pinned: Option<Vec2>,
    /// Fields of the payload object as received, kept for export.
    pub attributes: Map<String, Value>,
}

impl Node {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
            category: Category::Other,
            pr_percent: 0.0,
            pr_temporal_percent: 0.0,
            last_seen: None,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            pinned: None,
            attributes: Map::new(),
        }
    }

    pub fn display_name(&self) -> &str {
        self.label
            .as_deref()
            .filter(|label| !label.is_empty())
            .unwrap_or(&self.id)
    }

    pub fn metric(&self, mode: DisplayMode) -> f64 {
        match mode {
            DisplayMode::Static => self.pr_percent,
            DisplayMode::Temporal => self.pr_temporal_percent,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    pub source: String,
    pub target: String,
}

impl Link {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    pub fn touches(&self, id: &str) -> bool {
        self.source == id || self.target == id
    }
}

/// The canonical graph currently on display.
///
/// Links only ever reference ids present in `nodes`; `edges` holds the same
/// links resolved to node indices for the simulation. Both lists are fixed
/// once built; only node state can change afterwards.
#[derive(Clone, Debug, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    links: Vec<Link>,
    edges: Vec<(usize, usize)>,
    index_by_id: HashMap<String, usize>,
}

impl Graph {
    /// Builds a graph, dropping duplicate node ids and links with unknown endpoints.
    pub fn new(nodes: Vec<Node>, links: Vec<Link>) -> Self {
        let mut index_by_id = HashMap::with_capacity(nodes.len());
        let mut unique = Vec::with_capacity(nodes.len());
        for node in nodes {
            if index_by_id.contains_key(&node.id) {
                continue;
            }
            index_by_id.insert(node.id.clone(), unique.len());
            unique.push(node);
        }

        let mut kept_links = Vec::with_capacity(links.len());
        let mut edges = Vec::with_capacity(links.len());
        for link in links {
            if let (Some(&source), Some(&target)) =
                (index_by_id.get(&link.source), index_by_id.get(&link.target))
            {
                edges.push((source, target));
                kept_links.push(link);
            }
        }

        Self {
            nodes: unique,
            links: kept_links,
            edges,
            index_by_id,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Node state (positions, velocities, pins) is mutable; the node list is not.
    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_by_id.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index_of(id).and_then(|index| self.nodes.get(index))
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        let index = self.index_of(id)?;
        self.nodes.get_mut(index)
    }

    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    pub fn max_metric(&self, mode: DisplayMode) -> f64 {
        self.nodes
            .iter()
            .map(|node| node.metric(mode))
            .fold(0.0, f64::max)
    }
}
