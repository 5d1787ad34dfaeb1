//! Edge evaluation: the fail-closed validator and the neutral-fallback scorer
//!
//! The two policies differ on purpose. The validator gates writes in the
//! node-pair flow and rejects whatever it cannot read. The scorer annotates
//! round-table edges and falls back to neutral scores with a `review`
//! recommendation.

use super::prompts;
use crate::edge::{check_unit_range, EdgeRecord, KnowledgeEdge};
use crate::llm::{GenerationError, TextGenerator};
use crate::persona::Persona;
use crate::reply;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{debug, warn};

/// Reason recorded when a verdict cannot be read
pub const EVALUATION_FAILED: &str = "evaluation failed";

/// Accept-or-reject decision on one edge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub accept: bool,
    pub reason: String,
}

impl Verdict {
    fn failed() -> Self {
        Self {
            accept: false,
            reason: EVALUATION_FAILED.to_string(),
        }
    }
}

/// Gatekeeper for the node-pair flow
pub struct EdgeValidator {
    generator: Arc<dyn TextGenerator>,
    persona: Persona,
    source_domain: String,
    target_domain: String,
}

impl EdgeValidator {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        persona: Persona,
        source_domain: impl Into<String>,
        target_domain: impl Into<String>,
    ) -> Self {
        Self {
            generator,
            persona,
            source_domain: source_domain.into(),
            target_domain: target_domain.into(),
        }
    }

    /// One generation call; an unreadable reply rejects the edge.
    pub async fn evaluate(&self, record: &EdgeRecord) -> Result<Verdict, GenerationError> {
        let prompt = prompts::edge_validation(record, &self.source_domain, &self.target_domain);
        let raw = self
            .generator
            .generate(&prompt, &self.persona.system_instruction)
            .await?;
        debug!(reply = %raw, "validation reply");
        Ok(parse_verdict(&raw))
    }
}

/// Decode `{"valid": bool, "reason": string}`, failing closed.
pub fn parse_verdict(raw: &str) -> Verdict {
    let Some(obj) = reply::parse_object(raw) else {
        return Verdict::failed();
    };
    let Some(accept) = obj.get("valid").and_then(Value::as_bool) else {
        return Verdict::failed();
    };
    let reason = obj
        .get("reason")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Verdict { accept, reason }
}

/// Scorer's advice on an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recommendation {
    Accept,
    Review,
    Reject,
}

impl Recommendation {
    /// Unknown advice is treated as `Review`.
    pub fn parse(text: &str) -> Self {
        match text.trim().to_ascii_lowercase().as_str() {
            "accept" => Self::Accept,
            "reject" => Self::Reject,
            _ => Self::Review,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Review => "review",
            Self::Reject => "reject",
        }
    }
}

/// Scores assigned to one edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub semantic_similarity: f64,
    pub novelty_score: f64,
    pub inspiration_potential: f64,
    pub overall_score: f64,
    pub reasoning: String,
    pub recommendation: Recommendation,
}

/// Neutral score used when a reply cannot be read
pub const NEUTRAL_SCORE: f64 = 0.5;

impl Evaluation {
    /// 0.5 everywhere and a `review` recommendation.
    pub fn neutral(reasoning: impl Into<String>) -> Self {
        Self {
            semantic_similarity: NEUTRAL_SCORE,
            novelty_score: NEUTRAL_SCORE,
            inspiration_potential: NEUTRAL_SCORE,
            overall_score: NEUTRAL_SCORE,
            reasoning: reasoning.into(),
            recommendation: Recommendation::Review,
        }
    }

    /// True when the scores came from a fallback rather than the model.
    pub fn is_neutral(&self) -> bool {
        self.recommendation == Recommendation::Review
            && self.semantic_similarity == NEUTRAL_SCORE
            && self.novelty_score == NEUTRAL_SCORE
            && self.inspiration_potential == NEUTRAL_SCORE
            && self.overall_score == NEUTRAL_SCORE
    }
}

/// An edge paired with its evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredEdge {
    pub edge: KnowledgeEdge,
    pub evaluation: Evaluation,
}

/// Annotates edges with quality scores
pub struct EdgeScorer {
    generator: Arc<dyn TextGenerator>,
    persona: Persona,
}

impl EdgeScorer {
    pub fn new(generator: Arc<dyn TextGenerator>, persona: Persona) -> Self {
        Self { generator, persona }
    }

    /// Score one edge, filling its scores and validation status.
    ///
    /// Never fails: a generation error or an unreadable reply gives the
    /// neutral evaluation, leaves the scores untouched and marks the edge
    /// unvalidated. An edge is validated only on an `accept` recommendation
    /// with every score in range.
    pub async fn score(&self, edge: &mut KnowledgeEdge) -> Evaluation {
        let prompt = prompts::edge_scoring(edge);
        let evaluation = match self
            .generator
            .generate(&prompt, &self.persona.system_instruction)
            .await
        {
            Ok(raw) => match parse_evaluation(&raw) {
                Some(evaluation) => {
                    edge.semantic_similarity = Some(evaluation.semantic_similarity);
                    edge.novelty_score = Some(evaluation.novelty_score);
                    edge.rarity_score = Some(evaluation.novelty_score);
                    evaluation
                }
                None => {
                    warn!(edge = %edge, "unreadable scoring reply, using neutral scores");
                    Evaluation::neutral(format!("{}, defaults used", EVALUATION_FAILED))
                }
            },
            Err(e) => {
                warn!(edge = %edge, error = %e, "scoring call failed, using neutral scores");
                Evaluation::neutral(format!("{}: {}", EVALUATION_FAILED, e))
            }
        };

        match edge.validate() {
            Ok(()) => {
                edge.validated = evaluation.recommendation == Recommendation::Accept;
                edge.validation_notes = Some(evaluation.reasoning.clone());
            }
            Err(e) => {
                warn!(edge = %edge, error = %e, "edge scores out of range");
                edge.validated = false;
                edge.validation_notes = Some(e.to_string());
            }
        }
        evaluation
    }

    /// Score each edge in order.
    pub async fn score_all(&self, edges: Vec<KnowledgeEdge>) -> Vec<ScoredEdge> {
        let mut scored = Vec::with_capacity(edges.len());
        for mut edge in edges {
            let evaluation = self.score(&mut edge).await;
            scored.push(ScoredEdge { edge, evaluation });
        }
        scored
    }

    /// Score each edge and keep those whose overall score reaches `min_overall`.
    pub async fn filter(&self, edges: Vec<KnowledgeEdge>, min_overall: f64) -> Vec<KnowledgeEdge> {
        self.score_all(edges)
            .await
            .into_iter()
            .filter(|s| s.evaluation.overall_score >= min_overall)
            .map(|s| s.edge)
            .collect()
    }
}

/// Default threshold for [`EdgeScorer::filter`]
pub const DEFAULT_MIN_OVERALL: f64 = 0.6;

fn unit_score(
    obj: &Map<String, Value>,
    field: &'static str,
    default: f64,
) -> Option<f64> {
    let value = match obj.get(field) {
        None | Some(Value::Null) => default,
        Some(v) => v.as_f64()?,
    };
    check_unit_range(field, value).ok()?;
    Some(value)
}

/// Decode a scoring reply.
///
/// Missing sub-scores default to 0.5 and a missing overall score to the mean
/// of the three sub-scores. Any score outside [0, 1] makes the reply
/// unreadable.
pub fn parse_evaluation(raw: &str) -> Option<Evaluation> {
    let obj = reply::parse_object(raw)?;

    let semantic_similarity = unit_score(&obj, "semantic_similarity", NEUTRAL_SCORE)?;
    let novelty_score = unit_score(&obj, "novelty_score", NEUTRAL_SCORE)?;
    let inspiration_potential = unit_score(&obj, "inspiration_potential", NEUTRAL_SCORE)?;
    let mean = (semantic_similarity + novelty_score + inspiration_potential) / 3.0;
    let overall_score = unit_score(&obj, "overall_score", mean)?;

    let reasoning = obj
        .get("reasoning")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let recommendation = obj
        .get("recommendation")
        .and_then(Value::as_str)
        .map(Recommendation::parse)
        .unwrap_or(Recommendation::Review);

    Some(Evaluation {
        semantic_similarity,
        novelty_score,
        inspiration_potential,
        overall_score,
        reasoning,
        recommendation,
    })
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// Markdown report: recommendation counts, then one section per edge.
pub fn render_report(scored: &[ScoredEdge]) -> String {
    let total = scored.len();
    let count = |r: Recommendation| scored.iter().filter(|s| s.evaluation.recommendation == r).count();
    let accepted = count(Recommendation::Accept);
    let review = count(Recommendation::Review);
    let rejected = count(Recommendation::Reject);

    let mut out = String::from("# Cross-domain edge evaluation report\n\n## Summary\n\n");
    let _ = writeln!(out, "- Total edges: {}", total);
    let _ = writeln!(out, "- Accept: {} ({:.1}%)", accepted, percent(accepted, total));
    let _ = writeln!(out, "- Review: {} ({:.1}%)", review, percent(review, total));
    let _ = writeln!(out, "- Reject: {} ({:.1}%)\n", rejected, percent(rejected, total));

    out.push_str("## Details\n\n");
    for (i, ScoredEdge { edge, evaluation }) in scored.iter().enumerate() {
        let _ = writeln!(out, "### {}. {} → {}\n", i + 1, edge.source_domain, edge.target_domain);
        let _ = writeln!(
            out,
            "**Link**: {} --[{}]--> {}\n",
            edge.source_concept, edge.relation_type, edge.target_concept
        );
        out.push_str("**Scores**:\n");
        let _ = writeln!(out, "- Semantic soundness: {:.2}", evaluation.semantic_similarity);
        let _ = writeln!(out, "- Novelty: {:.2}", evaluation.novelty_score);
        let _ = writeln!(out, "- Inspiration potential: {:.2}", evaluation.inspiration_potential);
        let _ = writeln!(out, "- Overall: {:.2}\n", evaluation.overall_score);
        let _ = writeln!(out, "**Recommendation**: {}\n", evaluation.recommendation.as_str());
        let reasoning = if evaluation.reasoning.is_empty() {
            "none"
        } else {
            evaluation.reasoning.as_str()
        };
        let _ = writeln!(out, "**Reasoning**: {}\n", reasoning);
        out.push_str("---\n\n");
    }
    out
}
