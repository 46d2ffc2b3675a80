//! Where graph payloads come from. Every source yields the raw JSON value;
//! normalization happens later, the same way for all of them.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use serde_json::Value;
use tracing::{info, instrument, warn};

pub trait GraphSource: Send + Sync {
    /// Short human-readable origin, shown in the controls panel.
    fn describe(&self) -> String;

    fn load(&self) -> Result<Value>;
}

/// A JSON file on disk.
pub struct StaticFileSource {
    path: PathBuf,
}

impl StaticFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl GraphSource for StaticFileSource {
    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }

    #[instrument(skip_all, fields(path = %self.path.display()))]
    fn load(&self) -> Result<Value> {
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read graph file {}", self.path.display()))?;
        let payload = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse graph JSON from {}", self.path.display()))?;
        info!("loaded graph file");
        Ok(payload)
    }
}

/// A generator service: `POST /api/generate` rebuilds the graph, then
/// `GET /api/graph` returns it.
pub struct BackendSource {
    base_url: String,
}

impl BackendSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    pub fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }

    pub fn graph_url(&self) -> String {
        format!("{}/api/graph", self.base_url)
    }
}

impl GraphSource for BackendSource {
    fn describe(&self) -> String {
        format!("backend {}", self.base_url)
    }

    #[instrument(skip_all, fields(base = %self.base_url))]
    fn load(&self) -> Result<Value> {
        let generate = self.generate_url();
        info!(url = %generate, "requesting graph generation");
        ureq::post(&generate)
            .set("User-Agent", "threat-graph")
            .call()
            .map_err(|err| {
                warn!(%err, "graph generation failed");
                anyhow!("POST {generate} failed: {err}")
            })?;

        let graph = self.graph_url();
        info!(url = %graph, "fetching graph");
        let response = ureq::get(&graph)
            .set("Accept", "application/json")
            .set("Cache-Control", "no-store")
            .set("User-Agent", "threat-graph")
            .call()
            .map_err(|err| {
                warn!(%err, "graph fetch failed");
                anyhow!("GET {graph} failed: {err}")
            })?;

        response
            .into_json::<Value>()
            .with_context(|| format!("failed to decode graph JSON from {graph}"))
    }
}

/// A payload already in memory, such as the bundled demo graph.
pub struct InlineSource {
    name: String,
    payload: Value,
}

impl InlineSource {
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }

    /// Parses embedded JSON text.
    pub fn from_text(name: impl Into<String>, text: &str) -> Result<Self> {
        let name = name.into();
        let payload =
            serde_json::from_str(text).with_context(|| format!("failed to parse inline graph {name}"))?;
        Ok(Self { name, payload })
    }
}

impl GraphSource for InlineSource {
    fn describe(&self) -> String {
        self.name.clone()
    }

    fn load(&self) -> Result<Value> {
        Ok(self.payload.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serde_json::json;

    use super::*;

    #[test]
    fn file_source_reads_json() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{"nodes": [{{"id": "a"}}], "links": []}}"#).expect("write");

        let payload = StaticFileSource::new(file.path()).load().expect("load");

        assert_eq!(payload["nodes"][0]["id"], json!("a"));
    }

    #[test]
    fn file_source_reports_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = StaticFileSource::new(dir.path().join("missing.json"));

        let err = source.load().expect_err("missing file");

        assert!(err.to_string().contains("failed to read graph file"));
    }

    #[test]
    fn file_source_reports_malformed_json() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "{{not json").expect("write");

        assert!(StaticFileSource::new(file.path()).load().is_err());
    }

    #[test]
    fn backend_urls_ignore_trailing_slash() {
        let source = BackendSource::new("http://localhost:8000/");

        assert_eq!(source.generate_url(), "http://localhost:8000/api/generate");
        assert_eq!(source.graph_url(), "http://localhost:8000/api/graph");
        assert_eq!(source.describe(), "backend http://localhost:8000");
    }

    #[test]
    fn inline_source_returns_its_payload() {
        let source = InlineSource::from_text("demo", r#"{"nodes": []}"#).expect("parse");

        assert_eq!(source.load().expect("load"), json!({"nodes": []}));
        assert!(InlineSource::from_text("broken", "[").is_err());
    }
}
