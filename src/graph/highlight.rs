use std::collections::HashSet;

use super::model::{Category, Graph};
use super::neighbors::NeighborIndex;

/// Dimming state shared by nodes, links and labels.
///
/// Labels follow their node. Link dimming is keyed by link position in
/// [`Graph::links`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Highlight {
    pub selected: Option<String>,
    pub dimmed_nodes: HashSet<String>,
    pub dimmed_links: HashSet<usize>,
}

impl Highlight {
    pub fn is_active(&self) -> bool {
        self.selected.is_some() || !self.dimmed_nodes.is_empty() || !self.dimmed_links.is_empty()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.as_deref() == Some(id)
    }

    pub fn node_dimmed(&self, id: &str) -> bool {
        self.dimmed_nodes.contains(id)
    }

    pub fn label_dimmed(&self, id: &str) -> bool {
        self.node_dimmed(id)
    }

    pub fn link_dimmed(&self, link_index: usize) -> bool {
        self.dimmed_links.contains(&link_index)
    }

    /// Focal node plus its direct neighbors stay lit; links stay lit only
    /// when they touch the focal node.
    pub fn for_selection(graph: &Graph, index: &NeighborIndex, focal: &str) -> Self {
        let keep = keep_set(index, focal);
        Self {
            selected: Some(focal.to_owned()),
            dimmed_nodes: graph
                .nodes()
                .iter()
                .filter(|node| !keep.contains(node.id.as_str()))
                .map(|node| node.id.clone())
                .collect(),
            dimmed_links: graph
                .links()
                .iter()
                .enumerate()
                .filter(|(_, link)| !link.touches(focal))
                .map(|(position, _)| position)
                .collect(),
        }
    }

    /// Everything outside `component` is dimmed, including links leaving it.
    pub fn for_component(graph: &Graph, component: &HashSet<String>, selected: Option<String>) -> Self {
        Self {
            selected,
            dimmed_nodes: graph
                .nodes()
                .iter()
                .filter(|node| !component.contains(&node.id))
                .map(|node| node.id.clone())
                .collect(),
            dimmed_links: graph
                .links()
                .iter()
                .enumerate()
                .filter(|(_, link)| {
                    !(component.contains(&link.source) && component.contains(&link.target))
                })
                .map(|(position, _)| position)
                .collect(),
        }
    }
}

/// The focal id together with its in and out neighbors.
pub fn keep_set<'a>(index: &'a NeighborIndex, focal: &'a str) -> HashSet<&'a str> {
    let neighbors = index.get(focal);
    std::iter::once(focal)
        .chain(neighbors.outgoing.iter().map(String::as_str))
        .chain(neighbors.incoming.iter().map(String::as_str))
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NeighborDirection {
    Outgoing,
    Incoming,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NeighborEntry {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub direction: NeighborDirection,
}

/// Contents of the side panel for one node.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeDetails {
    pub id: String,
    pub title: String,
    pub label: Option<String>,
    pub category: Category,
    pub pr_percent: f64,
    pub pr_temporal_percent: f64,
    pub last_seen: Option<String>,
    pub neighbors: Vec<NeighborEntry>,
}

impl NodeDetails {
    pub fn collect(graph: &Graph, index: &NeighborIndex, id: &str) -> Option<Self> {
        let node = graph.node(id)?;
        let entry = index.get(id);

        let outgoing = entry
            .outgoing
            .iter()
            .map(|other| (other, NeighborDirection::Outgoing));
        let incoming = entry
            .incoming
            .iter()
            .map(|other| (other, NeighborDirection::Incoming));

        // Ids missing from the graph are skipped rather than reported.
        let neighbors = outgoing
            .chain(incoming)
            .filter_map(|(other, direction)| {
                graph.node(other).map(|neighbor| NeighborEntry {
                    id: neighbor.id.clone(),
                    name: neighbor.display_name().to_owned(),
                    category: neighbor.category,
                    direction,
                })
            })
            .collect();

        Some(Self {
            id: node.id.clone(),
            title: node.display_name().to_owned(),
            label: node.label.clone(),
            category: node.category,
            pr_percent: node.pr_percent,
            pr_temporal_percent: node.pr_temporal_percent,
            last_seen: node.last_seen.clone(),
            neighbors,
        })
    }
}
