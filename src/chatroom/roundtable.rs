//! RoundTable: multi-round discussion over focus lists of both graphs

use super::node_pair::Personas;
use super::sampling::matches_themes;
use super::ChatroomResult;
use crate::discussion::{
    lacks_grounding, parse_edge_object, prompts, resolve_orientation, EdgeScorer, Moderator,
    ScoredEdge,
};
use crate::edge::{EdgeRecord, KnowledgeEdge};
use crate::graph::{truncate_chars, KnowledgeGraph, KnowledgeNode, DEFAULT_DESCRIPTION_CHARS};
use crate::llm::TextGenerator;
use crate::persona::{DiscussionTurn, Transcript};
use crate::reply;
use crate::store::{EdgeMetadata, EdgeStore};
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Focus size per graph when no themes are given
pub const DEFAULT_FOCUS_LIMIT: usize = 30;

/// Focus cap per graph when themes are given
pub const DEFAULT_FOCUS_CAP: usize = 50;

/// Nodes per graph listed in the shared context
pub const DEFAULT_SHARED_LIMIT: usize = 20;

/// Characters of each reply carried into the next round
const SUMMARY_CHARS: usize = 500;

/// Themes narrowing the focus list of each graph
#[derive(Debug, Clone, Default)]
pub struct FocusThemes {
    pub source: Vec<String>,
    pub target: Vec<String>,
}

/// Result of a round-table discussion
#[derive(Debug, Clone, Default)]
pub struct RoundTableReport {
    pub rounds: usize,
    /// Rounds in which the moderator stepped in
    pub moderated_rounds: Vec<usize>,
    /// Extracted edges that resolved against both graphs, in reply order
    pub edges: Vec<EdgeRecord>,
    /// Extracted entries that were unusable or did not resolve
    pub dropped: usize,
    /// Scores for `edges`, when scoring is enabled
    pub scored: Vec<ScoredEdge>,
}

/// Multi-round discussion between the source and target personas
pub struct RoundTable {
    topic: String,
    generator: Arc<dyn TextGenerator>,
    source_graph: Arc<KnowledgeGraph>,
    target_graph: Arc<KnowledgeGraph>,
    personas: Personas,
    moderator: Moderator,
    scorer: Option<EdgeScorer>,
    transcript: Transcript,
}

impl RoundTable {
    pub fn new(
        topic: impl Into<String>,
        generator: Arc<dyn TextGenerator>,
        source_graph: Arc<KnowledgeGraph>,
        target_graph: Arc<KnowledgeGraph>,
        personas: Personas,
    ) -> Self {
        Self {
            topic: topic.into(),
            moderator: Moderator::new(generator.clone(), personas.moderator.clone()),
            generator,
            source_graph,
            target_graph,
            personas,
            scorer: None,
            transcript: Transcript::new(),
        }
    }

    /// Score every extracted edge with the evaluator persona.
    pub fn with_scoring(mut self) -> Self {
        self.scorer = Some(EdgeScorer::new(
            self.generator.clone(),
            self.personas.evaluator.clone(),
        ));
        self
    }

    pub fn with_transcript_cap(mut self, cap: usize) -> Self {
        self.transcript = Transcript::with_cap(cap);
        self
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Run `rounds` rounds, then extract edges from the whole transcript.
    ///
    /// A failed generation call ends the discussion with an error; an
    /// unreadable extraction reply yields no edges.
    pub async fn discuss(
        &mut self,
        rounds: usize,
        focus: &FocusThemes,
    ) -> ChatroomResult<RoundTableReport> {
        let source_focus = focus_nodes(&self.source_graph, &focus.source);
        let target_focus = focus_nodes(&self.target_graph, &focus.target);
        info!(
            topic = %self.topic,
            source_nodes = source_focus.len(),
            target_nodes = target_focus.len(),
            rounds,
            "round table started"
        );

        let shared = self.shared_context(&source_focus, &target_focus);
        let source_domain = self.personas.source.domain.clone();
        let target_domain = self.personas.target.domain.clone();
        let source_task = prompts::roundtable_source_task(&source_domain, &target_domain);
        let target_task = prompts::roundtable_target_task(&source_domain, &target_domain);

        let mut report = RoundTableReport {
            rounds,
            ..RoundTableReport::default()
        };
        let mut context = shared.clone();

        for round in 1..=rounds {
            debug!(round, "round table round");

            let prompt = prompts::roundtable_turn(&context, &source_task);
            let source_reply = self
                .generator
                .generate(&prompt, &self.personas.source.system_instruction)
                .await?;
            self.transcript
                .push(DiscussionTurn::new(round, &self.personas.source, source_reply.clone()));

            let with_view = format!(
                "{context}\n\n# The {source_domain} expert's view\n\n{source_reply}"
            );
            let prompt = prompts::roundtable_turn(&with_view, &target_task);
            let target_reply = self
                .generator
                .generate(&prompt, &self.personas.target.system_instruction)
                .await?;
            self.transcript
                .push(DiscussionTurn::new(round, &self.personas.target, target_reply.clone()));

            let drifted = lacks_grounding(&source_reply, &self.source_graph)
                || lacks_grounding(&target_reply, &self.target_graph);
            let guidance = if drifted {
                let guidance = self
                    .moderator
                    .moderate(round, &source_reply, &target_reply)
                    .await?;
                warn!(round, "round drifted from graph nodes, moderated");
                self.transcript.push(DiscussionTurn::new(
                    round,
                    self.moderator.persona(),
                    guidance.clone(),
                ));
                report.moderated_rounds.push(round);
                Some(guidance)
            } else {
                None
            };

            context = format!(
                "{shared}\n{}",
                round_summary(
                    &source_domain,
                    &source_reply,
                    &target_domain,
                    &target_reply,
                    guidance.as_deref()
                )
            );
        }

        let (edges, dropped) = self.extract_edges().await?;
        report.edges = edges;
        report.dropped = dropped;

        if let Some(scorer) = &self.scorer {
            let candidates = report
                .edges
                .iter()
                .map(|r| {
                    KnowledgeEdge::from_record(
                        r,
                        self.source_graph.name(),
                        self.target_graph.name(),
                        self.generator.name(),
                    )
                })
                .collect();
            report.scored = scorer.score_all(candidates).await;
        }

        info!(
            edges = report.edges.len(),
            dropped = report.dropped,
            moderated = report.moderated_rounds.len(),
            "round table finished"
        );
        Ok(report)
    }

    /// One call over the transcript; each entry is orientation-checked.
    async fn extract_edges(&self) -> ChatroomResult<(Vec<EdgeRecord>, usize)> {
        let prompt = prompts::bulk_extraction(
            &self.transcript.render(),
            &self.personas.source.domain,
            &self.personas.target.domain,
        );
        let raw = self
            .generator
            .generate(&prompt, &self.personas.moderator.system_instruction)
            .await?;

        let Some(entries) = reply::parse_array(&raw) else {
            warn!("unreadable extraction reply, no edges");
            return Ok((Vec::new(), 0));
        };

        let mut edges = Vec::new();
        let mut dropped = 0;
        for entry in entries {
            let Some(record) = entry.as_object().and_then(parse_edge_object) else {
                warn!(%entry, "skipping unusable edge entry");
                dropped += 1;
                continue;
            };
            let orientation = resolve_orientation(&record, &self.source_graph, &self.target_graph);
            match orientation.apply(record.clone()) {
                Some(edge) => edges.push(edge),
                None => {
                    warn!(
                        source = %record.source,
                        target = %record.target,
                        "skipping edge with unresolved endpoints"
                    );
                    dropped += 1;
                }
            }
        }
        Ok((edges, dropped))
    }

    fn shared_context(&self, source: &[&KnowledgeNode], target: &[&KnowledgeNode]) -> String {
        let mut out = String::from("# Available knowledge nodes\n\n");
        for (graph, nodes) in [(&self.source_graph, source), (&self.target_graph, target)] {
            let _ = writeln!(out, "## {} nodes\n", graph.name());
            for node in nodes.iter().take(DEFAULT_SHARED_LIMIT) {
                let _ = writeln!(out, "- **{}** {}", node.id.bracketed(), node.label);
                let _ = writeln!(
                    out,
                    "  {}\n",
                    truncate_chars(node.description(), DEFAULT_DESCRIPTION_CHARS)
                );
            }
        }
        out
    }

    /// Append `edges` to `store`, creating the file over both graphs first.
    ///
    /// Returns the file's edge count afterwards.
    pub fn save_edges(
        &self,
        store: &EdgeStore,
        edges: &[EdgeRecord],
        source_path: &str,
        target_path: &str,
    ) -> ChatroomResult<usize> {
        store.initialize(EdgeMetadata::new([
            (self.source_graph.name(), source_path),
            (self.target_graph.name(), target_path),
        ]))?;
        for edge in edges {
            store.append(edge)?;
        }
        let total = store.load()?.metadata.total_edges;
        info!(
            path = %store.path().display(),
            saved = edges.len(),
            total,
            "round table edges saved"
        );
        Ok(total)
    }

    /// Write `{topic, discussion_history, export_time}` to `path`.
    pub fn export_transcript(&self, path: impl AsRef<Path>) -> ChatroomResult<()> {
        self.transcript.export(&self.topic, path)?;
        Ok(())
    }
}

/// Focus list of a graph: the first 30 nodes, or up to 50 matching a theme.
pub fn focus_nodes<'g>(graph: &'g KnowledgeGraph, themes: &[String]) -> Vec<&'g KnowledgeNode> {
    if themes.is_empty() {
        return graph.nodes().iter().take(DEFAULT_FOCUS_LIMIT).collect();
    }
    graph
        .nodes()
        .iter()
        .filter(|n| matches_themes(n, themes))
        .take(DEFAULT_FOCUS_CAP)
        .collect()
}

fn round_summary(
    source_domain: &str,
    source_reply: &str,
    target_domain: &str,
    target_reply: &str,
    guidance: Option<&str>,
) -> String {
    let mut out = format!(
        "# Summary of the previous round\n\n\
         {source_domain} view:\n{}\n\n\
         {target_domain} view:\n{}\n\n",
        truncate_chars(source_reply, SUMMARY_CHARS),
        truncate_chars(target_reply, SUMMARY_CHARS),
    );
    if let Some(guidance) = guidance {
        let _ = write!(out, "Moderator guidance: {guidance}\n\n");
    }
    out.push_str("Build on this and keep exploring the links between nodes.\n");
    out
}
