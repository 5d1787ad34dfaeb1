//! Context: bounded natural-language description of a node's neighbourhood

use super::knowledge::{GraphResult, KnowledgeGraph};
use super::node::truncate_chars;
use std::fmt::Write as _;

/// Properties of a neighbour shown alongside its description
const NEIGHBOR_KEYS: [&str; 3] = ["category", "theme", "cultivated_abilities"];

/// Default cap on listed neighbours
pub const DEFAULT_NEIGHBOR_LIMIT: usize = 10;

/// Default description length shown for a neighbour
pub const DEFAULT_DESCRIPTION_CHARS: usize = 150;

/// Builds the in-domain context handed to a discussion participant
///
/// The output is a pure function of the graph, the node id and the depth.
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    /// Maximum neighbours listed; the BFS front is kept
    pub neighbor_limit: usize,
    /// Neighbour descriptions are cut to this many characters
    pub description_chars: usize,
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self {
            neighbor_limit: DEFAULT_NEIGHBOR_LIMIT,
            description_chars: DEFAULT_DESCRIPTION_CHARS,
        }
    }
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the neighbour cap
    pub fn neighbor_limit(mut self, limit: usize) -> Self {
        self.neighbor_limit = limit;
        self
    }

    /// Describe `node_id` and its neighbourhood up to `depth` hops
    ///
    /// Fails with `NodeNotFound` when the node is absent; callers must not
    /// start a discussion in that case.
    pub fn build(&self, graph: &KnowledgeGraph, node_id: &str, depth: usize) -> GraphResult<String> {
        let node = graph.require(node_id)?;
        let mut out = String::from("# Core node\n\n");

        let _ = writeln!(out, "**{}** {}\n", node.id.bracketed(), node.label);

        if !node.properties.is_empty() {
            out.push_str("**Properties**:\n");
            for (key, value) in &node.properties {
                let _ = writeln!(out, "- {}: {}", key, value.render());
            }
            out.push('\n');
        }

        let related = graph.neighbors_within(node_id, depth);
        if related.is_empty() {
            return Ok(out);
        }

        let _ = writeln!(out, "## Related nodes ({})\n", graph.name());
        // Truncation happens on the BFS order; ids with no node entry are
        // skipped after the cut.
        for related_id in related.into_iter().take(self.neighbor_limit) {
            let Some(related) = graph.get(related_id) else {
                continue;
            };
            let _ = writeln!(out, "- **{}** {}", related.id.bracketed(), related.label);

            if let Some(desc) = related.properties.get("description") {
                let _ = writeln!(
                    out,
                    "  description: {}",
                    truncate_chars(&desc.render(), self.description_chars)
                );
            }
            for key in NEIGHBOR_KEYS {
                if let Some(value) = related.properties.get(key) {
                    let _ = writeln!(out, "  {}: {}", key, value.render());
                }
            }
            out.push('\n');
        }

        Ok(out)
    }
}
