use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use image::{ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::graph::{Graph, Link};

pub const JSON_FILE_NAME: &str = "subgraph.json";
pub const PNG_FILE_NAME: &str = "graph.png";

/// The graph as currently displayed, in the same shape the loader accepts.
///
/// Each node is its original payload object with the normalized metrics
/// and current `x`/`y` written over it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<Map<String, Value>>,
    pub links: Vec<Link>,
}

impl GraphSnapshot {
    pub fn capture(graph: &Graph) -> Self {
        let nodes = graph
            .nodes()
            .iter()
            .map(|node| {
                let mut object = node.attributes.clone();
                object.insert("id".to_owned(), Value::from(node.id.clone()));
                object.insert("pr_percent".to_owned(), Value::from(node.pr_percent));
                object.insert(
                    "pr_temporal_percent".to_owned(),
                    Value::from(node.pr_temporal_percent),
                );
                object.insert("x".to_owned(), Value::from(f64::from(node.position.x)));
                object.insert("y".to_owned(), Value::from(f64::from(node.position.y)));
                object
            })
            .collect();

        Self {
            nodes,
            links: graph.links().to_vec(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Writes `subgraph.json` into `dir`. Nothing is written for an empty graph.
pub fn write_json(dir: &Path, snapshot: &GraphSnapshot) -> Result<PathBuf> {
    if snapshot.is_empty() {
        bail!("no graph loaded, nothing to export");
    }

    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create export directory {}", dir.display()))?;
    let path = dir.join(JSON_FILE_NAME);
    let text = serde_json::to_string_pretty(snapshot).context("failed to serialize graph snapshot")?;
    fs::write(&path, text).with_context(|| format!("failed to write {}", path.display()))?;

    info!(path = %path.display(), nodes = snapshot.nodes.len(), "exported graph JSON");
    Ok(path)
}

/// Encodes an RGBA8 buffer of `size` pixels as `graph.png` in `dir`.
pub fn write_png(dir: &Path, size: [u32; 2], rgba: &[u8]) -> Result<PathBuf> {
    let [width, height] = size;
    let Some(image) = RgbaImage::from_raw(width, height, rgba.to_vec()) else {
        bail!(
            "pixel buffer of {} bytes does not match a {width}x{height} RGBA image",
            rgba.len()
        );
    };

    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create export directory {}", dir.display()))?;
    let path = dir.join(PNG_FILE_NAME);
    image
        .save_with_format(&path, ImageFormat::Png)
        .with_context(|| format!("failed to write {}", path.display()))?;

    info!(path = %path.display(), width, height, "exported graph PNG");
    Ok(path)
}
