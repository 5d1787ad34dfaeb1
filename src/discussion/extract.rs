//! EdgeExtractor and the orientation check

use super::prompts;
use crate::edge::{check_unit_range, EdgeProperties, EdgeRecord};
use crate::graph::KnowledgeGraph;
use crate::llm::{GenerationError, TextGenerator};
use crate::persona::Persona;
use crate::reply;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

/// Asks the moderator persona to turn an exchange into at most one edge
pub struct EdgeExtractor {
    generator: Arc<dyn TextGenerator>,
    persona: Persona,
}

impl EdgeExtractor {
    pub fn new(generator: Arc<dyn TextGenerator>, persona: Persona) -> Self {
        Self { generator, persona }
    }

    /// One generation call; an unusable reply is `Ok(None)`.
    pub async fn extract(
        &self,
        source_id: &str,
        target_id: &str,
        source_reply: &str,
        target_reply: &str,
    ) -> Result<Option<EdgeRecord>, GenerationError> {
        let prompt = prompts::edge_extraction(source_id, target_id, source_reply, target_reply);
        let raw = self
            .generator
            .generate(&prompt, &self.persona.system_instruction)
            .await?;
        debug!(reply = %raw, "extraction reply");
        Ok(parse_edge_reply(&raw))
    }
}

/// Decode an extraction reply into an edge.
///
/// `None` for anything that is not one JSON object describing a usable edge,
/// including `{"exists": false}`.
pub fn parse_edge_reply(raw: &str) -> Option<EdgeRecord> {
    parse_edge_object(&reply::parse_object(raw)?)
}

/// Decode one edge object.
///
/// `source`, `target` and `label` must be strings and `properties` an object.
/// Missing `description` or `reasoning` become empty strings and a missing
/// `confidence` becomes 0.0; a confidence outside [0, 1] makes the edge
/// unusable.
pub fn parse_edge_object(obj: &Map<String, Value>) -> Option<EdgeRecord> {
    if obj.get("exists") == Some(&Value::Bool(false)) {
        return None;
    }

    let source = obj.get("source")?.as_str()?;
    let target = obj.get("target")?.as_str()?;
    let label = obj.get("label")?.as_str()?;
    let props = obj.get("properties")?.as_object()?;

    let text = |key: &str| -> Option<String> {
        match props.get(key) {
            None | Some(Value::Null) => Some(String::new()),
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => None,
        }
    };
    let description = text("description")?;
    let reasoning = text("reasoning")?;

    let confidence = match props.get("confidence") {
        None | Some(Value::Null) => 0.0,
        Some(value) => value.as_f64()?,
    };
    check_unit_range("confidence", confidence).ok()?;

    Some(EdgeRecord::new(
        source,
        target,
        label,
        EdgeProperties {
            description,
            reasoning,
            confidence,
        },
    ))
}

/// How a candidate edge's endpoints resolve against the two graphs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// `source` is in the source graph and `target` in the target graph
    AsIs,
    /// Only the reversed reading resolves
    Swapped,
    /// Neither reading resolves, or both do
    Unresolved,
}

impl Orientation {
    /// Apply to a record: keep, swap, or drop it.
    pub fn apply(self, record: EdgeRecord) -> Option<EdgeRecord> {
        match self {
            Self::AsIs => Some(record),
            Self::Swapped => Some(record.swapped()),
            Self::Unresolved => None,
        }
    }
}

/// Resolve a record's endpoints; exactly one reading must fit.
pub fn resolve_orientation(
    record: &EdgeRecord,
    source_graph: &KnowledgeGraph,
    target_graph: &KnowledgeGraph,
) -> Orientation {
    let as_is = source_graph.contains(&record.source) && target_graph.contains(&record.target);
    let reversed = source_graph.contains(&record.target) && target_graph.contains(&record.source);
    match (as_is, reversed) {
        (true, false) => Orientation::AsIs,
        (false, true) => Orientation::Swapped,
        _ => Orientation::Unresolved,
    }
}
