//! Integration tests for the layout and interaction engine.
//!
//! Covers: payload normalization, neighbor index, selection highlight,
//! exact search, grid placement, organizer rings, the frozen gate, and
//! threshold filtering.

use std::collections::HashSet;
use std::f32::consts::TAU;

use eframe::egui::vec2;
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::{Value, json};
use threat_graph::graph::{
    DisplayMode, FOCUS_SCALE, ForceLayout, Graph, GraphFilter, Highlight, NeighborIndex, Node,
    OrganizerConfig, SearchOutcome, Session, SessionConfig, connected_components, grid_shape,
    keep_set, normalize, place_with_rng, radial_layout,
};

fn session_with(payload: Value) -> Session {
    let mut session = Session::with_rng(SessionConfig::default(), StdRng::seed_from_u64(42));
    session.load(payload);
    session
}

fn abcd() -> Value {
    json!({
        "nodes": [{"id": "A"}, {"id": "B"}, {"id": "C"}, {"id": "D"}],
        "links": [
            {"source": "A", "target": "B"},
            {"source": "B", "target": "C"},
            {"source": "A", "target": "D"}
        ]
    })
}

fn positions(graph: &Graph) -> Vec<(f32, f32)> {
    graph
        .nodes()
        .iter()
        .map(|node| (node.position.x, node.position.y))
        .collect()
}

// ===========================================================================
// Normalization
// ===========================================================================

#[test]
fn missing_and_malformed_metrics_become_zero() {
    let graph = normalize(
        &json!({
            "nodes": [
                {"id": "none"},
                {"id": "text", "pr_percent": "high", "pr_temporal_percent": [1]},
                {"id": "numeric-string", "pr_percent": " 4.5 "}
            ]
        }),
        &GraphFilter::default(),
    );

    let metric = |id: &str, mode| graph.node(id).map(|node| node.metric(mode));
    assert_eq!(metric("none", DisplayMode::Static), Some(0.0));
    assert_eq!(metric("none", DisplayMode::Temporal), Some(0.0));
    assert_eq!(metric("text", DisplayMode::Static), Some(0.0));
    assert_eq!(metric("text", DisplayMode::Temporal), Some(0.0));
    assert_eq!(metric("numeric-string", DisplayMode::Static), Some(4.5));
}

#[test]
fn dangling_links_are_dropped() {
    let graph = normalize(
        &json!({
            "nodes": [{"id": "a"}, {"id": "b"}],
            "edges": [
                {"src": "a", "dst": "b"},
                {"src": "a", "dst": "ghost"},
                {"source": "ghost", "target": "b"}
            ]
        }),
        &GraphFilter::default(),
    );

    assert_eq!(graph.link_count(), 1);
    assert_eq!(graph.links()[0].source, "a");
    assert_eq!(graph.links()[0].target, "b");
}

#[test]
fn non_object_payloads_yield_empty_graphs() {
    for payload in [json!(null), json!([1, 2]), json!("graph"), json!({"nodes": 3})] {
        let graph = normalize(&payload, &GraphFilter::default());
        assert!(graph.is_empty());
        assert_eq!(graph.link_count(), 0);
    }
}

// ===========================================================================
// Neighbor index
// ===========================================================================

#[test]
fn every_link_contributes_exactly_its_two_entries() {
    let graph = normalize(&abcd(), &GraphFilter::default());
    let index = NeighborIndex::build(graph.links());

    for link in graph.links() {
        assert!(index.get(&link.source).outgoing.contains(&link.target));
        assert!(index.get(&link.target).incoming.contains(&link.source));
    }

    let total_out = graph
        .nodes()
        .iter()
        .map(|node| index.get(&node.id).outgoing.len())
        .sum::<usize>();
    let total_in = graph
        .nodes()
        .iter()
        .map(|node| index.get(&node.id).incoming.len())
        .sum::<usize>();
    assert_eq!(total_out, graph.link_count());
    assert_eq!(total_in, graph.link_count());
    assert!(index.get("missing").is_empty());
}

// ===========================================================================
// Selection and highlight
// ===========================================================================

#[test]
fn selecting_a_keeps_its_direct_neighbors() {
    let mut session = session_with(abcd());

    assert!(session.select_node(Some("A")));

    assert_eq!(
        keep_set(session.neighbors(), "A"),
        HashSet::from(["A", "B", "D"])
    );
    let highlight = session.highlight();
    assert!(highlight.is_selected("A"));
    assert!(highlight.node_dimmed("C"));
    assert!(!highlight.node_dimmed("B") && !highlight.node_dimmed("D"));
    assert!(!highlight.link_dimmed(0), "A-B stays lit");
    assert!(highlight.link_dimmed(1), "B-C is dimmed");
    assert!(!highlight.link_dimmed(2), "A-D stays lit");
}

#[test]
fn selection_is_idempotent() {
    let mut session = session_with(abcd());

    session.select_node(Some("A"));
    let once = session.highlight().clone();
    session.select_node(Some("A"));

    assert_eq!(session.highlight(), &once);
    assert_eq!(
        once,
        Highlight::for_selection(session.graph(), session.neighbors(), "A")
    );
}

#[test]
fn selecting_none_clears_everything() {
    let mut session = session_with(abcd());
    session.select_node(Some("C"));

    session.select_node(None);

    assert!(!session.highlight().is_active());
    assert!(session.selected().is_none());
}

// ===========================================================================
// Search
// ===========================================================================

#[test]
fn search_matches_whole_ids_and_labels_only() {
    let mut session = session_with(json!({
        "nodes": [
            {"id": "n1", "label": "abc"},
            {"id": "n2", "label": "A"},
            {"id": "n3"}
        ],
        "links": [{"source": "n1", "target": "n2"}]
    }));

    let SearchOutcome::Found(hit) = session.search("a") else {
        panic!("label 'A' should match");
    };
    assert_eq!(hit.id, "n2");
    assert_eq!(hit.component, HashSet::from(["n1".to_owned(), "n2".to_owned()]));
    assert!(session.highlight().node_dimmed("n3"));
    assert_eq!(session.view().scale, FOCUS_SCALE);

    let canvas = session.canvas();
    let position = session.graph().node("n2").map(|node| node.position).unwrap_or_default();
    let on_screen = session.view().world_to_screen(Default::default(), position);
    assert!((on_screen.to_vec2() - canvas / 2.0).length() < 1e-2);
}

#[test]
fn search_miss_reports_not_found_without_side_effects() {
    let mut session = session_with(json!({"nodes": [{"id": "n1", "label": "abc"}]}));
    let before = session.highlight().clone();

    let outcome = session.search("ab");

    assert_eq!(
        outcome,
        SearchOutcome::NotFound {
            query: "ab".to_owned()
        }
    );
    assert_eq!(session.highlight(), &before);
}

// ===========================================================================
// Placement, physics and organizer
// ===========================================================================

#[test]
fn nine_nodes_land_in_their_own_cells() {
    let canvas = vec2(1200.0, 700.0);
    let mut nodes = (0..9).map(|index| Node::new(format!("n{index}"))).collect::<Vec<_>>();
    let shape = grid_shape(nodes.len(), canvas);

    place_with_rng(&mut nodes, canvas, &mut StdRng::seed_from_u64(9));

    assert_eq!((shape.cols, shape.rows), (3, 3));
    for (index, node) in nodes.iter().enumerate() {
        let origin = shape.cell_origin(index);
        let offset = node.position - origin;
        assert!(offset.x >= 0.0 && offset.x < shape.cell.x, "node {index} x {offset:?}");
        assert!(offset.y >= 0.0 && offset.y < shape.cell.y, "node {index} y {offset:?}");
    }
}

#[test]
fn star_leaves_share_the_first_ring() {
    let mut payload_nodes = vec![json!({"id": "hub", "pr_percent": 50.0})];
    let mut payload_links = Vec::new();
    for leaf in 0..6 {
        payload_nodes.push(json!({"id": format!("leaf{leaf}"), "pr_percent": 1.0}));
        payload_links.push(json!({"source": "hub", "target": format!("leaf{leaf}")}));
    }
    let mut graph = normalize(
        &json!({"nodes": payload_nodes, "links": payload_links}),
        &GraphFilter::default(),
    );
    let index = NeighborIndex::build(graph.links());
    let component = connected_components(&graph, &index).remove(0);
    let center = vec2(300.0, 300.0);

    radial_layout(&mut graph, &index, &component, DisplayMode::Static, center, 42.0);

    assert_eq!(graph.node("hub").map(|node| node.position), Some(center));
    let mut angles = graph
        .nodes()
        .iter()
        .filter(|node| node.id != "hub")
        .map(|node| {
            let offset = node.position - center;
            assert!((offset.length() - 42.0).abs() < 1e-3);
            offset.y.atan2(offset.x).rem_euclid(TAU)
        })
        .collect::<Vec<_>>();
    angles.sort_by(f32::total_cmp);
    for pair in angles.windows(2) {
        assert!((pair[1] - pair[0] - TAU / 6.0).abs() < 1e-3);
    }
}

#[test]
fn frozen_layout_ignores_further_ticks() {
    let mut session = session_with(abcd());
    assert!(session.layout().is_frozen());
    let before = positions(session.graph());

    for _ in 0..50 {
        assert!(!session.tick());
    }

    assert_eq!(positions(session.graph()), before);
}

#[test]
fn standalone_layout_settles_then_freezes() {
    let mut graph = normalize(&abcd(), &GraphFilter::default());
    place_with_rng(graph.nodes_mut(), vec2(800.0, 600.0), &mut StdRng::seed_from_u64(1));
    let mut layout = ForceLayout::default();

    layout.settle(&mut graph, DisplayMode::Static, vec2(400.0, 300.0));
    let settled = positions(&graph);
    layout.tick(&mut graph, DisplayMode::Static, vec2(400.0, 300.0));

    assert!(layout.is_frozen());
    assert_eq!(positions(&graph), settled);
}

#[test]
fn organize_places_every_component_and_freezes() {
    let mut session = session_with(json!({
        "nodes": [
            {"id": "a", "pr_percent": 1.0},
            {"id": "b"},
            {"id": "c", "pr_percent": 9.0},
            {"id": "d"},
            {"id": "e"}
        ],
        "links": [{"source": "a", "target": "b"}, {"source": "c", "target": "d"}]
    }));

    let report = session.organize();

    assert_eq!(report.components, 3);
    assert_eq!(report.columns, 2);
    let config = OrganizerConfig::default();
    let first_cell_center = vec2(
        (session.canvas().x / 2.0).max(config.min_cell_width) / 2.0,
        config.cell_height / 2.0 + config.vertical_offset,
    );
    assert_eq!(
        session.graph().node("c").map(|node| node.position),
        Some(first_cell_center)
    );
    assert!(session.layout().is_frozen());
}

// ===========================================================================
// Property tests
// ===========================================================================

fn non_numeric_metric() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        "[a-z]{1,8}".prop_map(Value::from),
        Just(json!([])),
        Just(json!({"value": 1})),
        Just(json!("")),
    ]
}

fn any_metric() -> impl Strategy<Value = Value> {
    prop_oneof![
        non_numeric_metric(),
        any::<f64>().prop_map(|value| serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number)),
        any::<i64>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
        (-1000.0_f64..1000.0).prop_map(|value| Value::from(value.to_string())),
    ]
}

fn payload_strategy() -> impl Strategy<Value = Value> {
    (1usize..24).prop_flat_map(|count| {
        (
            prop::collection::vec(0.0_f64..100.0, count),
            prop::collection::vec((0..count + 3, 0..count + 3), 0..40),
        )
            .prop_map(|(metrics, pairs)| {
                let nodes = metrics
                    .iter()
                    .enumerate()
                    .map(|(index, metric)| json!({"id": format!("n{index}"), "pr_percent": metric}))
                    .collect::<Vec<_>>();
                let links = pairs
                    .iter()
                    .map(|(source, target)| {
                        json!({"source": format!("n{source}"), "target": format!("n{target}")})
                    })
                    .collect::<Vec<_>>();
                json!({"nodes": nodes, "links": links})
            })
    })
}

proptest! {
    #[test]
    fn prop_non_numeric_metrics_normalize_to_zero(value in non_numeric_metric()) {
        let graph = normalize(
            &json!({"nodes": [{"id": "x", "pr_percent": value.clone(), "pr_temporal_percent": value}]}),
            &GraphFilter::default(),
        );
        let node = graph.node("x");
        prop_assert_eq!(node.map(|node| node.pr_percent), Some(0.0));
        prop_assert_eq!(node.map(|node| node.pr_temporal_percent), Some(0.0));
    }

    #[test]
    fn prop_metrics_are_always_finite_and_non_negative(value in any_metric()) {
        let graph = normalize(
            &json!({"nodes": [{"id": "x", "pr_percent": value}]}),
            &GraphFilter::default(),
        );
        let metric = graph.node("x").map(|node| node.pr_percent).unwrap_or(-1.0);
        prop_assert!(metric.is_finite() && metric >= 0.0, "metric {}", metric);
    }

    #[test]
    fn prop_raising_threshold_never_adds_nodes(
        payload in payload_strategy(),
        low in 0.0_f64..100.0,
        raise in 0.0_f64..50.0,
    ) {
        let loose = normalize(&payload, &GraphFilter::new(DisplayMode::Static, low));
        let strict = normalize(&payload, &GraphFilter::new(DisplayMode::Static, low + raise));

        prop_assert!(strict.node_count() <= loose.node_count());
        prop_assert!(strict.link_count() <= loose.link_count());
        for graph in [&loose, &strict] {
            for link in graph.links() {
                prop_assert!(graph.contains(&link.source));
                prop_assert!(graph.contains(&link.target));
            }
        }
    }
}
