//! Domain knowledge graphs: nodes, adjacency and context

mod context;
mod knowledge;
mod node;

#[cfg(test)]
mod tests;

pub use context::{ContextBuilder, DEFAULT_DESCRIPTION_CHARS, DEFAULT_NEIGHBOR_LIMIT};
pub use knowledge::{GraphEdge, GraphError, GraphFile, GraphResult, KnowledgeGraph};
pub use node::{KnowledgeNode, NodeId, Properties, PropertyValue};

pub(crate) use node::truncate_chars;
