//! Common test utilities for GraphBridge integration tests
//!
//! Fixture graphs on disk and in memory, plus helpers that queue scripted
//! replies for whole pipeline runs.

#![allow(dead_code)]

pub mod fixtures;
pub mod replies;

pub use fixtures::{math_graph, physics_graph, write_graph_files, Fixture};
pub use replies::{
    edge_reply, long_turn, no_edge_reply, script_accepted_pair, script_no_edge_pair, verdict_reply,
};
