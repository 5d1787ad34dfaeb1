//! Personas and discussion transcripts
//!
//! A persona is plain data: whoever runs a discussion decides which persona
//! speaks and hands its system instruction to the generator.

use crate::store::{write_json_atomic, StoreResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::Path;

/// A discussion participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub name: String,
    pub domain: String,
    pub expertise: String,
    pub system_instruction: String,
}

impl Persona {
    /// Create a persona with the default instruction for its domain.
    pub fn new(
        name: impl Into<String>,
        domain: impl Into<String>,
        expertise: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let domain = domain.into();
        let expertise = expertise.into();
        let system_instruction = default_instruction(&name, &domain, &expertise);
        Self {
            name,
            domain,
            expertise,
            system_instruction,
        }
    }

    /// Replace the system instruction.
    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = instruction.into();
        self
    }

    /// Expert for the source graph (physics).
    pub fn physicist() -> Self {
        Self::new(
            "Physicist",
            "physics",
            "classical mechanics, quantum mechanics, thermodynamics, relativity, \
             statistical physics, particle physics and astrophysics",
        )
        .with_instruction(
            "You are a senior physicist taking part in an interdisciplinary discussion \
             whose goal is to find deep links between physics and another field. Reason \
             with physical principles, laws and conceptual frameworks: energy, entropy, \
             symmetry, conservation, space-time structure and causality. Look for \
             analogues or mappings of physical laws in the other field.",
        )
    }

    /// Expert for the target graph (mathematics).
    pub fn mathematician() -> Self {
        Self::new(
            "Mathematician",
            "mathematics",
            "algebra, geometry, topology, analysis, probability, logic, number theory, \
             combinatorics and applied mathematics",
        )
        .with_instruction(
            "You are a senior mathematician taking part in an interdisciplinary \
             discussion whose goal is to find deep links between mathematics and another \
             field. Use abstraction, logical reasoning and structural analysis: patterns, \
             structure, symmetry, mappings, transformations, invariants and recursion. \
             Look for where mathematical structure shows up in the other field.",
        )
    }

    /// Moderator who steers a discussion back to the concepts at hand.
    pub fn moderator() -> Self {
        Self::new(
            "Moderator",
            "interdisciplinary research",
            "keeping cross-domain discussions grounded in the concrete concepts under study",
        )
        .with_instruction(
            "You moderate an interdisciplinary discussion. Be brief. When participants \
             drift away from the concepts under discussion, steer them back to those \
             concepts by name.",
        )
    }

    /// Evaluator that judges and scores candidate edges.
    pub fn evaluator() -> Self {
        Self::new(
            "Evaluator",
            "knowledge graph quality",
            "judging whether a proposed cross-domain relation is plausible, clear and novel",
        )
        .with_instruction(
            "You are a rigorous reviewer of cross-domain knowledge graph edges. Judge \
             each proposed relation on its merits and answer only in the JSON format \
             you are asked for.",
        )
    }
}

fn default_instruction(name: &str, domain: &str, expertise: &str) -> String {
    format!(
        "You are {name}, an expert in {domain}. Your expertise covers: {expertise}. \
         You are taking part in an interdisciplinary academic discussion whose goal is \
         to find latent links between different fields. Drawing on your expertise, \
         look for cross-domain connections, analogies, metaphors or causal relations."
    )
}

/// One utterance in a discussion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscussionTurn {
    pub round: usize,
    pub speaker: String,
    pub domain: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl DiscussionTurn {
    pub fn new(round: usize, persona: &Persona, content: impl Into<String>) -> Self {
        Self {
            round,
            speaker: persona.name.clone(),
            domain: persona.domain.clone(),
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Default number of turns a transcript retains
pub const DEFAULT_TRANSCRIPT_CAP: usize = 200;

/// Caller-owned discussion record with a retention cap.
///
/// Once `cap` turns are held, each new turn evicts the oldest one.
#[derive(Debug, Clone)]
pub struct Transcript {
    turns: VecDeque<DiscussionTurn>,
    cap: usize,
}

impl Transcript {
    pub fn new() -> Self {
        Self::with_cap(DEFAULT_TRANSCRIPT_CAP)
    }

    /// A transcript holding at most `cap` turns (at least one).
    pub fn with_cap(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            turns: VecDeque::with_capacity(cap.min(64)),
            cap,
        }
    }

    pub fn push(&mut self, turn: DiscussionTurn) {
        if self.turns.len() == self.cap {
            self.turns.pop_front();
        }
        self.turns.push_back(turn);
    }

    pub fn turns(&self) -> impl Iterator<Item = &DiscussionTurn> {
        self.turns.iter()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Render as `[speaker (domain)]: content` blocks, oldest first.
    pub fn render(&self) -> String {
        self.turns
            .iter()
            .map(|t| format!("[{} ({})]: {}", t.speaker, t.domain, t.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Write `{topic, discussion_history, export_time}` to `path`.
    pub fn export(&self, topic: &str, path: impl AsRef<Path>) -> StoreResult<()> {
        let export = TranscriptExport {
            topic: topic.to_string(),
            discussion_history: self.turns.iter().cloned().collect(),
            export_time: Utc::now(),
        };
        write_json_atomic(path.as_ref(), &export)
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

/// On-disk shape of an exported transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptExport {
    pub topic: String,
    pub discussion_history: Vec<DiscussionTurn>,
    pub export_time: DateTime<Utc>,
}
