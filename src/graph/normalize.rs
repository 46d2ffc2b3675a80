use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::{debug, instrument};

use super::model::{Category, DisplayMode, Graph, Link, Node};

/// Display filter applied while normalizing a payload.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GraphFilter {
    pub mode: DisplayMode,
    pub threshold: f64,
}

impl GraphFilter {
    pub fn new(mode: DisplayMode, threshold: f64) -> Self {
        Self { mode, threshold }
    }

    fn effective_threshold(self) -> f64 {
        if self.threshold.is_finite() {
            self.threshold.max(0.0)
        } else {
            0.0
        }
    }

    fn keeps(self, node: &Node) -> bool {
        node.metric(self.mode) >= self.effective_threshold()
    }
}

/// Coerces a JSON value into a finite, non-negative metric. Anything else is 0.
pub fn coerce_metric(value: Option<&Value>) -> f64 {
    let number = match value {
        Some(Value::Number(number)) => number.as_f64().unwrap_or(0.0),
        Some(Value::String(text)) => {
            let text = text.trim();
            if text.is_empty() {
                0.0
            } else {
                text.parse::<f64>().unwrap_or(0.0)
            }
        }
        Some(Value::Bool(flag)) => f64::from(u8::from(*flag)),
        _ => 0.0,
    };

    if number.is_finite() && number > 0.0 {
        number
    } else {
        0.0
    }
}

fn identifier(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Object(object) => identifier(object.get("id")),
        _ => None,
    }
}

fn non_null<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    object.get(key).filter(|value| !value.is_null())
}

fn text_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    match non_null(object, key)? {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn node_from_object(object: &Map<String, Value>) -> Option<Node> {
    let id = identifier(object.get("id"))?;
    let category = text_field(object, "t")
        .or_else(|| text_field(object, "type"))
        .map(|kind| Category::parse(&kind))
        .unwrap_or_default();

    let mut node = Node::new(id);
    node.label = text_field(object, "label");
    node.category = category;
    node.pr_percent = coerce_metric(object.get("pr_percent"));
    node.pr_temporal_percent = coerce_metric(object.get("pr_temporal_percent"));
    node.last_seen = text_field(object, "last_seen");
    node.attributes = object.clone();
    Some(node)
}

fn link_from_object(object: &Map<String, Value>) -> Option<Link> {
    let source = identifier(non_null(object, "source").or_else(|| object.get("src")))?;
    let target = identifier(non_null(object, "target").or_else(|| object.get("dst")))?;
    Some(Link { source, target })
}

fn raw_links(payload: &Value) -> &[Value] {
    payload
        .get("links")
        .and_then(Value::as_array)
        .or_else(|| payload.get("edges").and_then(Value::as_array))
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Turns a raw payload into the canonical graph for the given filter.
///
/// Never fails: malformed nodes are skipped, metrics default to 0 and links
/// whose endpoints did not survive are dropped.
#[instrument(skip_all, fields(mode = filter.mode.label(), threshold = filter.threshold))]
pub fn normalize(payload: &Value, filter: &GraphFilter) -> Graph {
    let raw_nodes = payload
        .get("nodes")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut seen = HashSet::with_capacity(raw_nodes.len());
    let mut nodes = Vec::with_capacity(raw_nodes.len());
    for raw in raw_nodes {
        let Some(node) = raw.as_object().and_then(node_from_object) else {
            continue;
        };
        if !seen.insert(node.id.clone()) {
            continue;
        }
        if filter.keeps(&node) {
            nodes.push(node);
        }
    }

    let kept_ids = nodes
        .iter()
        .map(|node| node.id.as_str())
        .collect::<HashSet<_>>();

    let raw_links = raw_links(payload);
    let links = raw_links
        .iter()
        .filter_map(|raw| raw.as_object().and_then(link_from_object))
        .filter(|link| {
            kept_ids.contains(link.source.as_str()) && kept_ids.contains(link.target.as_str())
        })
        .collect::<Vec<_>>();

    debug!(
        raw_nodes = raw_nodes.len(),
        kept_nodes = nodes.len(),
        raw_links = raw_links.len(),
        kept_links = links.len(),
        "normalized graph payload"
    );

    Graph::new(nodes, links)
}
