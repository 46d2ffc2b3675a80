use std::collections::HashSet;

use eframe::egui::Vec2;
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use super::model::Graph;
use super::neighbors::NeighborIndex;
use super::view::ViewTransform;

/// Zoom applied when the view jumps to a search hit.
pub const FOCUS_SCALE: f32 = 1.6;

#[derive(Clone, Debug, PartialEq)]
pub struct SearchMatch {
    pub id: String,
    /// Every node reachable from the hit, ignoring link direction.
    pub component: HashSet<String>,
    pub focus: ViewTransform,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SearchOutcome {
    EmptyQuery,
    NotFound { query: String },
    Found(SearchMatch),
}

impl SearchOutcome {
    pub fn run(graph: &Graph, index: &NeighborIndex, query: &str, canvas: Vec2) -> Self {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Self::EmptyQuery;
        }

        let Some(id) = find_exact(graph, trimmed) else {
            return Self::NotFound {
                query: trimmed.to_owned(),
            };
        };

        let position = graph.node(id).map_or(Vec2::ZERO, |node| node.position);
        Self::Found(SearchMatch {
            id: id.to_owned(),
            component: index.connected_component(id),
            focus: ViewTransform::focus_on(position, canvas, FOCUS_SCALE),
        })
    }
}

/// First node whose id or label equals `query`, ignoring case and
/// surrounding whitespace.
pub fn find_exact<'a>(graph: &'a Graph, query: &str) -> Option<&'a str> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    graph
        .nodes()
        .iter()
        .find(|node| {
            node.id.to_lowercase() == needle
                || node
                    .label
                    .as_deref()
                    .is_some_and(|label| label.to_lowercase() == needle)
        })
        .map(|node| node.id.as_str())
}

fn fuzzy_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_lowercase(), &query.to_lowercase()))
}

/// Candidate display names for a partially typed query, best first.
pub fn suggestions(graph: &Graph, query: &str, limit: usize) -> Vec<String> {
    let query = query.trim();
    if query.is_empty() || limit == 0 {
        return Vec::new();
    }

    let matcher = SkimMatcherV2::default();
    let mut scored = graph
        .nodes()
        .iter()
        .filter_map(|node| {
            let by_id = fuzzy_score(&matcher, &node.id, query);
            let by_label = node
                .label
                .as_deref()
                .and_then(|label| fuzzy_score(&matcher, label, query));
            by_id
                .max(by_label)
                .map(|score| (score, node.display_name().to_owned()))
        })
        .collect::<Vec<_>>();

    scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    let mut seen = HashSet::new();
    scored
        .into_iter()
        .map(|(_, name)| name)
        .filter(|name| seen.insert(name.clone()))
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::*;
    use crate::graph::model::{Link, Node};

    fn fixture() -> (Graph, NeighborIndex) {
        let mut labelled = Node::new("n1");
        labelled.label = Some("Evil.Example".to_owned());
        labelled.position = vec2(200.0, 100.0);
        let mut abc = Node::new("n2");
        abc.label = Some("abc".to_owned());
        let graph = Graph::new(
            vec![labelled, abc, Node::new("a"), Node::new("lonely")],
            vec![Link::new("n1", "n2"), Link::new("a", "n2")],
        );
        let index = NeighborIndex::build(graph.links());
        (graph, index)
    }

    #[test]
    fn exact_match_ignores_case_but_not_length() {
        let (graph, _) = fixture();

        assert_eq!(find_exact(&graph, "A"), Some("a"));
        assert_eq!(find_exact(&graph, "  evil.example "), Some("n1"));
        assert_eq!(find_exact(&graph, "ab"), None);
        assert_eq!(find_exact(&graph, "   "), None);
    }

    #[test]
    fn found_outcome_carries_component_and_focus() {
        let (graph, index) = fixture();
        let canvas = vec2(1200.0, 700.0);

        let SearchOutcome::Found(hit) = SearchOutcome::run(&graph, &index, "EVIL.EXAMPLE", canvas) else {
            panic!("expected a match");
        };

        assert_eq!(hit.id, "n1");
        assert_eq!(
            hit.component,
            HashSet::from(["n1".to_owned(), "n2".to_owned(), "a".to_owned()])
        );
        assert_eq!(hit.focus.scale, FOCUS_SCALE);
        assert_eq!(hit.focus.translate, vec2(600.0 - 320.0, 350.0 - 160.0));
    }

    #[test]
    fn misses_and_blank_queries_are_reported() {
        let (graph, index) = fixture();
        let canvas = vec2(100.0, 100.0);

        assert_eq!(
            SearchOutcome::run(&graph, &index, " nothing ", canvas),
            SearchOutcome::NotFound {
                query: "nothing".to_owned()
            }
        );
        assert_eq!(SearchOutcome::run(&graph, &index, "", canvas), SearchOutcome::EmptyQuery);
    }

    #[test]
    fn isolated_hit_is_its_own_component() {
        let (graph, index) = fixture();

        let SearchOutcome::Found(hit) = SearchOutcome::run(&graph, &index, "lonely", vec2(10.0, 10.0)) else {
            panic!("expected a match");
        };

        assert_eq!(hit.component, HashSet::from(["lonely".to_owned()]));
    }

    #[test]
    fn suggestions_rank_fuzzy_hits() {
        let (graph, _) = fixture();

        let hits = suggestions(&graph, "evl", 5);

        assert_eq!(hits.first().map(String::as_str), Some("Evil.Example"));
        assert!(!hits.iter().any(|name| name == "lonely"));
        assert!(suggestions(&graph, "", 5).is_empty());
        assert!(suggestions(&graph, "a", 1).len() <= 1);
    }
}
