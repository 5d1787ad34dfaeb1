//! NodePairChatroom: discuss one source node and one target node at a time

use super::{ChatroomError, ChatroomResult};
use crate::discussion::{
    resolve_orientation, DriftDetector, EdgeExtractor, EdgeValidator, Moderator, Orientation,
    PairDiscussion,
};
use crate::edge::EdgeRecord;
use crate::graph::{ContextBuilder, KnowledgeGraph};
use crate::llm::TextGenerator;
use crate::persona::{Persona, Transcript};
use crate::store::{EdgeMetadata, EdgeStore};
use std::sync::Arc;
use tracing::{info, warn};

/// The four personas a chatroom needs
#[derive(Debug, Clone)]
pub struct Personas {
    pub source: Persona,
    pub target: Persona,
    pub moderator: Persona,
    pub evaluator: Persona,
}

impl Default for Personas {
    fn default() -> Self {
        Self {
            source: Persona::physicist(),
            target: Persona::mathematician(),
            moderator: Persona::moderator(),
            evaluator: Persona::evaluator(),
        }
    }
}

/// What became of one node pair
#[derive(Debug, Clone, PartialEq)]
pub enum PairOutcome {
    /// Validated and appended to the edge store
    Accepted(EdgeRecord),
    /// Turned down by the validator
    Rejected { edge: EdgeRecord, reason: String },
    /// The extractor found no usable edge
    NoEdge,
    /// The exchange drifted; the pair was abandoned after one correction
    OffTopic { correction: String },
    /// The candidate's endpoints did not resolve against the two graphs
    InvalidEdge(EdgeRecord),
}

impl PairOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    /// The accepted edge, if any.
    pub fn edge(&self) -> Option<&EdgeRecord> {
        match self {
            Self::Accepted(edge) => Some(edge),
            _ => None,
        }
    }
}

/// Tally of a batch of pairs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub processed: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub no_edge: usize,
    pub off_topic: usize,
    pub invalid: usize,
    pub failed: usize,
    /// Accepted edges in processing order
    pub edges: Vec<EdgeRecord>,
}

impl BatchSummary {
    pub fn record(&mut self, result: ChatroomResult<PairOutcome>) {
        self.processed += 1;
        match result {
            Ok(PairOutcome::Accepted(edge)) => {
                self.accepted += 1;
                self.edges.push(edge);
            }
            Ok(PairOutcome::Rejected { .. }) => self.rejected += 1,
            Ok(PairOutcome::NoEdge) => self.no_edge += 1,
            Ok(PairOutcome::OffTopic { .. }) => self.off_topic += 1,
            Ok(PairOutcome::InvalidEdge(_)) => self.invalid += 1,
            Err(_) => self.failed += 1,
        }
    }
}

/// Runs the full node-pair pipeline and persists accepted edges
pub struct NodePairChatroom {
    source_graph: Arc<KnowledgeGraph>,
    target_graph: Arc<KnowledgeGraph>,
    context: ContextBuilder,
    drift: DriftDetector,
    discussion: PairDiscussion,
    moderator: Moderator,
    extractor: EdgeExtractor,
    validator: EdgeValidator,
    store: EdgeStore,
}

impl NodePairChatroom {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        source_graph: Arc<KnowledgeGraph>,
        target_graph: Arc<KnowledgeGraph>,
        store: EdgeStore,
        personas: Personas,
    ) -> Self {
        let validator = EdgeValidator::new(
            generator.clone(),
            personas.evaluator,
            source_graph.name(),
            target_graph.name(),
        );
        Self {
            context: ContextBuilder::default(),
            drift: DriftDetector::default(),
            discussion: PairDiscussion::new(generator.clone(), personas.source, personas.target),
            moderator: Moderator::new(generator.clone(), personas.moderator.clone()),
            extractor: EdgeExtractor::new(generator, personas.moderator),
            validator,
            source_graph,
            target_graph,
            store,
        }
    }

    pub fn with_context_builder(mut self, context: ContextBuilder) -> Self {
        self.context = context;
        self
    }

    pub fn with_drift_detector(mut self, drift: DriftDetector) -> Self {
        self.drift = drift;
        self
    }

    pub fn source_graph(&self) -> &KnowledgeGraph {
        &self.source_graph
    }

    pub fn target_graph(&self) -> &KnowledgeGraph {
        &self.target_graph
    }

    pub fn store(&self) -> &EdgeStore {
        &self.store
    }

    /// Create the edge file unless it exists, recording the graph paths.
    pub fn initialize_store(&self, source_path: &str, target_path: &str) -> ChatroomResult<()> {
        let metadata = EdgeMetadata::new([
            (self.source_graph.name(), source_path),
            (self.target_graph.name(), target_path),
        ]);
        self.store.initialize(metadata)?;
        Ok(())
    }

    /// Discuss one pair end to end.
    ///
    /// Missing nodes and generation failures are errors; every other result
    /// is a `PairOutcome`. Only `Accepted` writes to the store.
    pub async fn discuss_pair(
        &self,
        source_id: &str,
        target_id: &str,
        depth: usize,
    ) -> ChatroomResult<PairOutcome> {
        self.run_pair(source_id, target_id, depth, None).await
    }

    /// Like [`discuss_pair`](Self::discuss_pair), appending both turns to `transcript`.
    pub async fn discuss_pair_recorded(
        &self,
        source_id: &str,
        target_id: &str,
        depth: usize,
        transcript: &mut Transcript,
    ) -> ChatroomResult<PairOutcome> {
        self.run_pair(source_id, target_id, depth, Some(transcript))
            .await
    }

    async fn run_pair(
        &self,
        source_id: &str,
        target_id: &str,
        depth: usize,
        transcript: Option<&mut Transcript>,
    ) -> ChatroomResult<PairOutcome> {
        let source_node = self.source_graph.require(source_id)?;
        let target_node = self.target_graph.require(target_id)?;

        let source_context = self.context.build(&self.source_graph, source_id, depth)?;
        let target_context = self.context.build(&self.target_graph, target_id, depth)?;

        info!(source = source_id, target = target_id, "discussing pair");
        let exchange = self
            .discussion
            .run(
                source_node,
                target_node,
                &source_context,
                &target_context,
                transcript,
            )
            .await?;

        if self.drift.is_off_topic(
            &exchange.source_reply,
            &exchange.target_reply,
            source_id,
            target_id,
        ) {
            let correction = self
                .moderator
                .correct(
                    source_node,
                    target_node,
                    &exchange.source_reply,
                    &exchange.target_reply,
                )
                .await?;
            warn!(source = source_id, target = target_id, %correction, "discussion drifted, pair abandoned");
            return Ok(PairOutcome::OffTopic { correction });
        }

        let Some(candidate) = self
            .extractor
            .extract(
                source_id,
                target_id,
                &exchange.source_reply,
                &exchange.target_reply,
            )
            .await?
        else {
            info!(source = source_id, target = target_id, "no edge extracted");
            return Ok(PairOutcome::NoEdge);
        };

        let orientation = resolve_orientation(&candidate, &self.source_graph, &self.target_graph);
        let edge = match orientation.apply(candidate.clone()) {
            Some(edge) => edge,
            None => {
                warn!(
                    source = %candidate.source,
                    target = %candidate.target,
                    "edge endpoints do not resolve, dropping"
                );
                return Ok(PairOutcome::InvalidEdge(candidate));
            }
        };
        if orientation == Orientation::Swapped {
            info!(source = %edge.source, target = %edge.target, "edge was reversed, swapped");
        }

        let verdict = self.validator.evaluate(&edge).await?;
        if !verdict.accept {
            info!(source = %edge.source, target = %edge.target, reason = %verdict.reason, "edge rejected");
            return Ok(PairOutcome::Rejected {
                edge,
                reason: verdict.reason,
            });
        }

        self.store.append(&edge)?;
        info!(
            source = %edge.source,
            target = %edge.target,
            label = %edge.label,
            reason = %verdict.reason,
            "edge accepted"
        );
        Ok(PairOutcome::Accepted(edge))
    }

    /// Discuss pairs in order; a failing pair is logged and counted.
    pub async fn batch_discuss(&self, pairs: &[(String, String)], depth: usize) -> BatchSummary {
        let mut summary = BatchSummary::default();
        let total = pairs.len();

        for (i, (source_id, target_id)) in pairs.iter().enumerate() {
            info!(pair = i + 1, total, "batch progress");
            let result = self.discuss_pair(source_id, target_id, depth).await;
            if let Err(e) = &result {
                log_failure(source_id, target_id, e);
            }
            summary.record(result);
        }

        info!(
            accepted = summary.accepted,
            processed = summary.processed,
            "batch finished"
        );
        summary
    }
}

pub(super) fn log_failure(source_id: &str, target_id: &str, err: &ChatroomError) {
    warn!(source = source_id, target = target_id, error = %err, "pair failed");
}
