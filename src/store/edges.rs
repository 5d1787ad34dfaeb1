//! EdgeStore: the JSON document of accepted edges

use super::{read_json, timestamp, write_json_atomic, StoreResult};
use crate::edge::EdgeRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Header of the edge file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeMetadata {
    /// Domain name -> graph file path
    pub source_graphs: BTreeMap<String, String>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    pub total_edges: usize,
    #[serde(
        default,
        deserialize_with = "timestamp::deserialize_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_updated: Option<DateTime<Utc>>,
}

impl EdgeMetadata {
    /// Metadata for a fresh file over two source graphs.
    pub fn new<I, K, V>(source_graphs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            source_graphs: source_graphs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            created_at: Utc::now(),
            total_edges: 0,
            last_updated: None,
        }
    }
}

/// The whole edge file: `{metadata, edges}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeDocument {
    pub metadata: EdgeMetadata,
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
}

/// Append-only store of accepted edges backed by one JSON file
#[derive(Debug, Clone)]
pub struct EdgeStore {
    path: PathBuf,
}

impl EdgeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Create the file with empty edges unless it already exists.
    ///
    /// An existing file is left untouched so a resumed run keeps its edges.
    pub fn initialize(&self, metadata: EdgeMetadata) -> StoreResult<()> {
        if self.exists() {
            debug!(path = %self.path.display(), "edge file exists, keeping it");
            return Ok(());
        }
        let doc = EdgeDocument {
            metadata: EdgeMetadata {
                total_edges: 0,
                ..metadata
            },
            edges: Vec::new(),
        };
        write_json_atomic(&self.path, &doc)
    }

    /// Read the whole document.
    pub fn load(&self) -> StoreResult<EdgeDocument> {
        read_json(&self.path)
    }

    /// Append one edge, re-deriving `total_edges` and stamping `last_updated`.
    pub fn append(&self, edge: &EdgeRecord) -> StoreResult<()> {
        let mut doc = self.load()?;
        doc.edges.push(edge.clone());
        doc.metadata.total_edges = doc.edges.len();
        doc.metadata.last_updated = Some(Utc::now());
        write_json_atomic(&self.path, &doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::EdgeProperties;
    use crate::store::StoreError;

    fn edge(source: &str, target: &str) -> EdgeRecord {
        EdgeRecord::new(
            source,
            target,
            "analogous_to",
            EdgeProperties {
                description: "d".into(),
                reasoning: "r".into(),
                confidence: 0.7,
            },
        )
    }

    fn metadata() -> EdgeMetadata {
        EdgeMetadata::new([("physics", "physics.json"), ("math", "math.json")])
    }

    #[test]
    fn initialize_writes_empty_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = EdgeStore::new(dir.path().join("out/edges.json"));
        store.initialize(metadata()).unwrap();

        let doc = store.load().unwrap();
        assert_eq!(doc.metadata.total_edges, 0);
        assert!(doc.edges.is_empty());
        assert_eq!(doc.metadata.source_graphs["physics"], "physics.json");
        assert!(doc.metadata.last_updated.is_none());
    }

    #[test]
    fn initialize_keeps_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = EdgeStore::new(dir.path().join("edges.json"));
        store.initialize(metadata()).unwrap();
        store.append(&edge("v1", "f1")).unwrap();

        store.initialize(metadata()).unwrap();
        assert_eq!(store.load().unwrap().edges.len(), 1);
    }

    #[test]
    fn append_rederives_total_and_stamps_update() {
        let dir = tempfile::tempdir().unwrap();
        let store = EdgeStore::new(dir.path().join("edges.json"));
        store.initialize(metadata()).unwrap();

        store.append(&edge("v1", "f1")).unwrap();
        store.append(&edge("v2", "f2")).unwrap();

        let doc = store.load().unwrap();
        assert_eq!(doc.metadata.total_edges, 2);
        assert_eq!(doc.metadata.total_edges, doc.edges.len());
        assert!(doc.metadata.last_updated.is_some());
        assert_eq!(doc.edges[1].source, "v2");
    }

    #[test]
    fn file_with_naive_timestamps_accepts_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edges.json");
        std::fs::write(
            &path,
            r#"{"metadata": {"source_graphs": {"physics": "physics.json"},
                "created_at": "2025-03-01T12:30:45.123456",
                "total_edges": 0,
                "last_updated": "2025-03-01T12:31:00"},
               "edges": []}"#,
        )
        .unwrap();
        let store = EdgeStore::new(&path);

        let doc = store.load().unwrap();
        assert_eq!(
            doc.metadata.created_at.to_rfc3339(),
            "2025-03-01T12:30:45.123456+00:00"
        );

        store.append(&edge("v1", "f1")).unwrap();
        let doc = store.load().unwrap();
        assert_eq!(doc.metadata.total_edges, 1);
        assert_eq!(doc.edges[0].source, "v1");

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let created = raw["metadata"]["created_at"].as_str().unwrap();
        assert!(created.ends_with('Z') || created.ends_with("+00:00"));
    }

    #[test]
    fn append_without_initialize_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = EdgeStore::new(dir.path().join("missing.json"));
        let err = store.append(&edge("v1", "f1")).unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
    }
}
