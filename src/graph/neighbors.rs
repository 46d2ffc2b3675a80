use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use super::model::Link;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Neighbors {
    pub outgoing: BTreeSet<String>,
    pub incoming: BTreeSet<String>,
}

impl Neighbors {
    pub fn is_empty(&self) -> bool {
        self.outgoing.is_empty() && self.incoming.is_empty()
    }
}

/// Directed adjacency of the current graph, keyed by node id.
///
/// Rebuilt from scratch whenever the link set changes. Lookups of unknown
/// ids yield an empty entry.
#[derive(Clone, Debug, Default)]
pub struct NeighborIndex {
    entries: HashMap<String, Neighbors>,
    empty: Neighbors,
}

impl NeighborIndex {
    pub fn build(links: &[Link]) -> Self {
        let mut entries: HashMap<String, Neighbors> = HashMap::new();
        for link in links {
            entries
                .entry(link.source.clone())
                .or_default()
                .outgoing
                .insert(link.target.clone());
            entries
                .entry(link.target.clone())
                .or_default()
                .incoming
                .insert(link.source.clone());
        }

        Self {
            entries,
            empty: Neighbors::default(),
        }
    }

    pub fn get(&self, id: &str) -> &Neighbors {
        self.entries.get(id).unwrap_or(&self.empty)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Neighbors in either direction, deduplicated, outgoing first.
    pub fn undirected(&self, id: &str) -> Vec<&str> {
        let entry = self.get(id);
        let mut seen = HashSet::with_capacity(entry.outgoing.len() + entry.incoming.len());
        entry
            .outgoing
            .iter()
            .chain(entry.incoming.iter())
            .map(String::as_str)
            .filter(|next| seen.insert(*next))
            .collect()
    }

    /// Breadth-first reachability ignoring link direction. Always contains `start`.
    pub fn connected_component(&self, start: &str) -> HashSet<String> {
        let mut seen = HashSet::from([start.to_owned()]);
        let mut queue = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            for next in self.undirected(current) {
                if seen.insert(next.to_owned()) {
                    queue.push_back(next);
                }
            }
        }

        seen
    }
}
