//! Chatrooms: orchestration of discussion steps over two domain graphs
//!
//! - `NodePairChatroom`: one node pair at a time, with validation and persistence
//! - `CartesianRun`: resumable sweep over many pairs
//! - `RoundTable`: multi-round discussion over focus lists of both graphs
//! - `sampling`: ways of choosing which pairs to discuss

mod cartesian;
mod node_pair;
mod roundtable;
pub mod sampling;

pub use cartesian::{CartesianRun, RunReport, DEFAULT_CHECKPOINT_EVERY};
pub use node_pair::{BatchSummary, NodePairChatroom, PairOutcome, Personas};
pub use roundtable::{
    focus_nodes, FocusThemes, RoundTable, RoundTableReport, DEFAULT_FOCUS_CAP, DEFAULT_FOCUS_LIMIT,
    DEFAULT_SHARED_LIMIT,
};

use crate::graph::GraphError;
use crate::llm::GenerationError;
use crate::store::StoreError;
use thiserror::Error;

/// Errors that end the processing of one pair or one run
#[derive(Debug, Error)]
pub enum ChatroomError {
    #[error("node not found in {graph} graph: {id}")]
    NodeNotFound { graph: String, id: String },

    #[error("graph error: {0}")]
    Graph(GraphError),

    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl From<GraphError> for ChatroomError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::NodeNotFound { graph, id } => Self::NodeNotFound { graph, id },
            other => Self::Graph(other),
        }
    }
}

/// Result type for chatroom operations
pub type ChatroomResult<T> = Result<T, ChatroomError>;
