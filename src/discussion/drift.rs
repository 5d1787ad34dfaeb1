//! Topic drift: structural checks and the moderator's corrective remark

use super::prompts;
use crate::graph::{KnowledgeGraph, KnowledgeNode};
use crate::llm::{GenerationError, TextGenerator};
use crate::persona::Persona;
use regex_lite::Regex;
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// Default minimum reply length, in characters
pub const DEFAULT_MIN_RESPONSE_CHARS: usize = 100;

/// Bracketed references a round-table reply must carry, and how many must resolve
pub const MIN_NODE_REFERENCES: usize = 2;

/// Structural drift check for node-pair exchanges
#[derive(Debug, Clone)]
pub struct DriftDetector {
    pub min_response_chars: usize,
}

impl Default for DriftDetector {
    fn default() -> Self {
        Self {
            min_response_chars: DEFAULT_MIN_RESPONSE_CHARS,
        }
    }
}

impl DriftDetector {
    pub fn new(min_response_chars: usize) -> Self {
        Self { min_response_chars }
    }

    /// True when either reply omits its own node id or is too short.
    pub fn is_off_topic(
        &self,
        source_reply: &str,
        target_reply: &str,
        source_id: &str,
        target_id: &str,
    ) -> bool {
        !source_reply.contains(source_id)
            || !target_reply.contains(target_id)
            || source_reply.chars().count() < self.min_response_chars
            || target_reply.chars().count() < self.min_response_chars
    }
}

fn reference_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"\[([a-z_0-9]+)\]").ok())
        .as_ref()
}

/// Every `[node_id]` reference in a reply, repeats included.
pub fn node_references(reply: &str) -> Vec<&str> {
    let Some(pattern) = reference_pattern() else {
        return Vec::new();
    };
    pattern
        .captures_iter(reply)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect()
}

/// True when a reply cites too few nodes, or too few that exist in `graph`.
pub fn lacks_grounding(reply: &str, graph: &KnowledgeGraph) -> bool {
    let refs = node_references(reply);
    if refs.len() < MIN_NODE_REFERENCES {
        return true;
    }
    let valid = refs.iter().filter(|id| graph.contains(id)).count();
    valid < MIN_NODE_REFERENCES
}

/// The moderator persona, asked to steer a drifting discussion.
pub struct Moderator {
    generator: Arc<dyn TextGenerator>,
    persona: Persona,
}

impl Moderator {
    pub fn new(generator: Arc<dyn TextGenerator>, persona: Persona) -> Self {
        Self { generator, persona }
    }

    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    /// One corrective remark for a drifting node-pair exchange.
    pub async fn correct(
        &self,
        source_node: &KnowledgeNode,
        target_node: &KnowledgeNode,
        source_reply: &str,
        target_reply: &str,
    ) -> Result<String, GenerationError> {
        let prompt = prompts::correction(source_node, target_node, source_reply, target_reply);
        debug!(source = %source_node.id, target = %target_node.id, "requesting correction");
        self.generator
            .generate(&prompt, &self.persona.system_instruction)
            .await
    }

    /// Short guidance for a drifting round-table round.
    pub async fn moderate(
        &self,
        round: usize,
        source_reply: &str,
        target_reply: &str,
    ) -> Result<String, GenerationError> {
        let prompt = prompts::roundtable_moderation(round, source_reply, target_reply);
        self.generator
            .generate(&prompt, &self.persona.system_instruction)
            .await
    }
}
