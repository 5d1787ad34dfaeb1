//! GraphBridge: cross-domain edges mined from two knowledge graphs
//!
//! Personas drawn from two domains (physics and mathematics by default)
//! discuss pairs of nodes, one node from each graph. A moderator extracts a
//! candidate edge from the exchange, an evaluator validates it, and accepted
//! edges are appended to a JSON edge file.
//!
//! # Core Concepts
//!
//! - **Graphs**: read-only domain graphs loaded from `{nodes, edges}` JSON files
//! - **Discussion steps**: one prompt through a [`TextGenerator`] plus reply parsing
//! - **Chatrooms**: the node-pair pipeline, resumable sweeps, and round tables
//!
//! # Example
//!
//! ```
//! use graphbridge::{KnowledgeGraph, KnowledgeNode};
//!
//! let graph = KnowledgeGraph::new("physics", vec![KnowledgeNode::new("v1", "velocity")], vec![])
//!     .unwrap();
//! assert!(graph.contains("v1"));
//! ```

pub mod cancel;
pub mod chatroom;
pub mod config;
pub mod discussion;
pub mod edge;
pub mod graph;
pub mod llm;
pub mod persona;
pub mod reply;
pub mod store;

pub use cancel::{CancellationToken, Interrupt};
pub use chatroom::{
    BatchSummary, CartesianRun, ChatroomError, ChatroomResult, FocusThemes, NodePairChatroom,
    PairOutcome, Personas, RoundTable, RoundTableReport, RunReport,
};
pub use config::{Config, ConfigError};
pub use edge::{EdgeProperties, EdgeRecord, KnowledgeEdge};
pub use graph::{ContextBuilder, GraphError, KnowledgeGraph, KnowledgeNode, NodeId, PropertyValue};
pub use llm::{GenerationError, LlmConfig, OpenAiGenerator, ScriptedGenerator, TextGenerator};
pub use persona::{DiscussionTurn, Persona, Transcript};
pub use store::{EdgeDocument, EdgeStore, Progress, ProgressStore, RunStatus, StoreError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
