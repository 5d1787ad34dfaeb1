//! KnowledgeGraph: one read-only domain graph and its adjacency index

use super::node::{KnowledgeNode, NodeId, Properties};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading or querying a domain graph
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("node not found in {graph} graph: {id}")]
    NodeNotFound { graph: String, id: String },

    #[error("duplicate node id in {graph} graph: {id}")]
    DuplicateNode { graph: String, id: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for graph operations
pub type GraphResult<T> = Result<T, GraphError>;

/// An edge inside a single domain graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,
}

impl GraphEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            label: None,
            properties: None,
        }
    }
}

/// On-disk shape of a graph file: `{nodes: [...], edges: [...]}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphFile {
    #[serde(default)]
    pub nodes: Vec<KnowledgeNode>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

/// A read-only domain knowledge graph
///
/// Nodes keep file order. The adjacency index is derived once from the edge
/// list when the graph is built and is never mutated afterwards; reloading a
/// graph builds a fresh instance.
#[derive(Debug, Clone)]
pub struct KnowledgeGraph {
    name: String,
    nodes: Vec<KnowledgeNode>,
    index: HashMap<NodeId, usize>,
    edges: Vec<GraphEdge>,
    adjacency: HashMap<String, Vec<String>>,
}

impl KnowledgeGraph {
    /// Build a graph from nodes and edges
    ///
    /// Fails if two nodes share an id.
    pub fn new(
        name: impl Into<String>,
        nodes: Vec<KnowledgeNode>,
        edges: Vec<GraphEdge>,
    ) -> GraphResult<Self> {
        let name = name.into();
        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.id.clone(), i).is_some() {
                return Err(GraphError::DuplicateNode {
                    graph: name,
                    id: node.id.to_string(),
                });
            }
        }
        let adjacency = build_adjacency(&edges);
        Ok(Self {
            name,
            nodes,
            index,
            edges,
            adjacency,
        })
    }

    /// Parse a graph from its JSON text
    pub fn from_json_str(name: impl Into<String>, json: &str) -> GraphResult<Self> {
        let file: GraphFile = serde_json::from_str(json)?;
        Self::new(name, file.nodes, file.edges)
    }

    /// Load a graph file from disk
    pub fn load(name: impl Into<String>, path: impl AsRef<Path>) -> GraphResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(name, &text)
    }

    /// Domain name of this graph (e.g. "physics")
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get a node by id
    pub fn get(&self, id: &str) -> Option<&KnowledgeNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// Get a node by id, failing with `NodeNotFound`
    pub fn require(&self, id: &str) -> GraphResult<&KnowledgeNode> {
        self.get(id).ok_or_else(|| GraphError::NodeNotFound {
            graph: self.name.clone(),
            id: id.to_string(),
        })
    }

    /// Check if a node id exists
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// All nodes in file order
    pub fn nodes(&self) -> &[KnowledgeNode] {
        &self.nodes
    }

    /// All edges in file order
    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Direct neighbours of a node in the adjacency index
    pub fn adjacent(&self, id: &str) -> &[String] {
        self.adjacency.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Breadth-first neighbourhood up to `depth` hops
    ///
    /// Ids come back in discovery order, excluding the start node. A node
    /// reachable along several paths is listed once, at its first hop.
    pub fn neighbors_within(&self, id: &str, depth: usize) -> Vec<&str> {
        let mut related: Vec<&str> = Vec::new();
        if depth == 0 {
            return related;
        }

        let mut visited: HashSet<&str> = HashSet::new();
        visited.insert(id);
        let mut current_level: Vec<&str> = vec![id];

        for _ in 0..depth {
            let mut next_level: Vec<&str> = Vec::new();
            for current in &current_level {
                for neighbor in self.adjacent(current) {
                    if visited.insert(neighbor.as_str()) {
                        related.push(neighbor);
                        next_level.push(neighbor);
                    }
                }
            }
            if next_level.is_empty() {
                break;
            }
            current_level = next_level;
        }

        related
    }
}

/// Undirected adjacency list: each edge contributes to both endpoints
fn build_adjacency(edges: &[GraphEdge]) -> HashMap<String, Vec<String>> {
    let mut adj: HashMap<String, Vec<String>> = HashMap::new();
    for edge in edges {
        if !edge.source.is_empty() {
            let entry = adj.entry(edge.source.clone()).or_default();
            if !edge.target.is_empty() {
                entry.push(edge.target.clone());
            }
        }
        if !edge.target.is_empty() {
            let entry = adj.entry(edge.target.clone()).or_default();
            if !edge.source.is_empty() {
                entry.push(edge.source.clone());
            }
        }
    }
    adj
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> KnowledgeGraph {
        // a - b - c - d, plus a - c shortcut
        KnowledgeGraph::new(
            "test",
            ["a", "b", "c", "d"]
                .iter()
                .map(|id| KnowledgeNode::new(*id, id.to_uppercase()))
                .collect(),
            vec![
                GraphEdge::new("a", "b"),
                GraphEdge::new("b", "c"),
                GraphEdge::new("c", "d"),
                GraphEdge::new("a", "c"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn adjacency_is_undirected() {
        let graph = chain();
        assert_eq!(graph.adjacent("b"), &["a".to_string(), "c".to_string()]);
        assert_eq!(graph.adjacent("d"), &["c".to_string()]);
        assert!(graph.adjacent("missing").is_empty());
    }

    #[test]
    fn bfs_lists_each_node_once_at_first_hop() {
        let graph = chain();
        assert_eq!(graph.neighbors_within("a", 1), vec!["b", "c"]);
        assert_eq!(graph.neighbors_within("a", 2), vec!["b", "c", "d"]);
        assert_eq!(graph.neighbors_within("a", 10), vec!["b", "c", "d"]);
    }

    #[test]
    fn depth_zero_has_no_neighbors() {
        let graph = chain();
        assert!(graph.neighbors_within("a", 0).is_empty());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let result = KnowledgeGraph::new(
            "dup",
            vec![KnowledgeNode::new("x", "one"), KnowledgeNode::new("x", "two")],
            vec![],
        );
        assert!(matches!(result, Err(GraphError::DuplicateNode { .. })));
    }

    #[test]
    fn require_reports_graph_and_id() {
        let graph = chain();
        let err = graph.require("zz").unwrap_err();
        assert_eq!(err.to_string(), "node not found in test graph: zz");
    }

    #[test]
    fn edges_with_blank_endpoints_are_skipped() {
        let graph = KnowledgeGraph::new(
            "blank",
            vec![KnowledgeNode::new("a", "A")],
            vec![GraphEdge::new("a", ""), GraphEdge::new("", "a")],
        )
        .unwrap();
        assert!(graph.adjacent("a").is_empty());
        assert!(graph.adjacent("").is_empty());
    }
}
