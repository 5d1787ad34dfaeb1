//! PairDiscussion: the strictly ordered two-call exchange about a node pair

use super::prompts;
use crate::graph::KnowledgeNode;
use crate::llm::{GenerationError, TextGenerator};
use crate::persona::{DiscussionTurn, Persona, Transcript};
use std::sync::Arc;
use tracing::debug;

/// Both replies of one exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct PairExchange {
    pub source_reply: String,
    pub target_reply: String,
}

/// Runs the source persona, then the target persona, about one node pair.
pub struct PairDiscussion {
    generator: Arc<dyn TextGenerator>,
    source_persona: Persona,
    target_persona: Persona,
}

impl PairDiscussion {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        source_persona: Persona,
        target_persona: Persona,
    ) -> Self {
        Self {
            generator,
            source_persona,
            target_persona,
        }
    }

    pub fn source_persona(&self) -> &Persona {
        &self.source_persona
    }

    pub fn target_persona(&self) -> &Persona {
        &self.target_persona
    }

    /// Two generation calls in sequence; the second sees the first reply.
    ///
    /// A failed call ends the exchange. Turns are appended to `transcript`
    /// as they complete.
    pub async fn run(
        &self,
        source_node: &KnowledgeNode,
        target_node: &KnowledgeNode,
        source_context: &str,
        target_context: &str,
        mut transcript: Option<&mut Transcript>,
    ) -> Result<PairExchange, GenerationError> {
        let prompt = prompts::pair_turn(
            source_context,
            source_node,
            target_node,
            &self.source_persona.domain,
            None,
        );
        debug!(speaker = %self.source_persona.name, node = %source_node.id, "pair turn");
        let source_reply = self
            .generator
            .generate(&prompt, &self.source_persona.system_instruction)
            .await?;
        if let Some(t) = transcript.as_deref_mut() {
            t.push(DiscussionTurn::new(1, &self.source_persona, source_reply.clone()));
        }

        let prompt = prompts::pair_turn(
            target_context,
            target_node,
            source_node,
            &self.target_persona.domain,
            Some(&source_reply),
        );
        debug!(speaker = %self.target_persona.name, node = %target_node.id, "pair turn");
        let target_reply = self
            .generator
            .generate(&prompt, &self.target_persona.system_instruction)
            .await?;
        if let Some(t) = transcript.as_deref_mut() {
            t.push(DiscussionTurn::new(1, &self.target_persona, target_reply.clone()));
        }

        Ok(PairExchange {
            source_reply,
            target_reply,
        })
    }
}
