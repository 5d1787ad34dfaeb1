//! Cross-domain edges: the persisted record and the scored model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors from edge validation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EdgeError {
    #[error("{field} out of range [0, 1]: {value}")]
    ScoreOutOfRange { field: &'static str, value: f64 },
}

/// Descriptive properties of a persisted edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeProperties {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub confidence: f64,
}

/// An edge as written to the edge file
///
/// `source` names a node in the source graph and `target` a node in the
/// target graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub source: String,
    pub target: String,
    pub label: String,
    pub properties: EdgeProperties,
}

impl EdgeRecord {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        label: impl Into<String>,
        properties: EdgeProperties,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            label: label.into(),
            properties,
        }
    }

    /// The same edge with its endpoints exchanged.
    pub fn swapped(self) -> Self {
        Self {
            source: self.target,
            target: self.source,
            ..self
        }
    }
}

/// A candidate cross-domain edge with its evaluation scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEdge {
    pub source_domain: String,
    pub source_concept: String,
    pub target_domain: String,
    pub target_concept: String,
    pub relation_type: String,
    pub relation_description: String,
    pub reasoning: String,
    pub confidence: f64,
    pub generated_by: String,
    pub generated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_similarity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub novelty_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rarity_score: Option<f64>,
    /// Set by the scorer: accepted by the evaluator with every score in range
    #[serde(default)]
    pub validated: bool,
    /// Evaluator reasoning, or why validation failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_notes: Option<String>,
}

impl KnowledgeEdge {
    /// Lift a persisted record into the scored model.
    pub fn from_record(
        record: &EdgeRecord,
        source_domain: impl Into<String>,
        target_domain: impl Into<String>,
        generated_by: impl Into<String>,
    ) -> Self {
        Self {
            source_domain: source_domain.into(),
            source_concept: record.source.clone(),
            target_domain: target_domain.into(),
            target_concept: record.target.clone(),
            relation_type: record.label.clone(),
            relation_description: record.properties.description.clone(),
            reasoning: record.properties.reasoning.clone(),
            confidence: record.properties.confidence,
            generated_by: generated_by.into(),
            generated_at: Utc::now(),
            semantic_similarity: None,
            novelty_score: None,
            rarity_score: None,
            validated: false,
            validation_notes: None,
        }
    }

    /// Back to the persisted wire shape.
    pub fn to_record(&self) -> EdgeRecord {
        EdgeRecord {
            source: self.source_concept.clone(),
            target: self.target_concept.clone(),
            label: self.relation_type.clone(),
            properties: EdgeProperties {
                description: self.relation_description.clone(),
                reasoning: self.reasoning.clone(),
                confidence: self.confidence,
            },
        }
    }

    fn scores(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        [
            ("confidence", Some(self.confidence)),
            ("semantic_similarity", self.semantic_similarity),
            ("novelty_score", self.novelty_score),
            ("rarity_score", self.rarity_score),
        ]
        .into_iter()
        .filter_map(|(name, score)| score.map(|s| (name, s)))
    }

    /// Mean of the scores that are present; confidence always counts.
    pub fn overall_score(&self) -> f64 {
        let (sum, count) = self
            .scores()
            .fold((0.0, 0usize), |(sum, count), (_, s)| (sum + s, count + 1));
        sum / count as f64
    }

    /// Check every present score lies in [0, 1].
    pub fn validate(&self) -> Result<(), EdgeError> {
        for (field, value) in self.scores() {
            check_unit_range(field, value)?;
        }
        Ok(())
    }
}

impl fmt::Display for KnowledgeEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}:{}] --[{}]--> [{}:{}] (score: {:.2})",
            self.source_domain,
            self.source_concept,
            self.relation_type,
            self.target_domain,
            self.target_concept,
            self.overall_score()
        )
    }
}

/// Reject a score outside [0, 1] (NaN included).
pub fn check_unit_range(field: &'static str, value: f64) -> Result<(), EdgeError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(EdgeError::ScoreOutOfRange { field, value })
    }
}
