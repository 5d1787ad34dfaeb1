//! Prompt text for every generation step
//!
//! Each builder is a pure function of its inputs. Steps whose replies are
//! parsed ask for the bare JSON payload and nothing else.

use crate::edge::{EdgeRecord, KnowledgeEdge};
use crate::graph::KnowledgeNode;
use std::fmt::Write as _;

const JSON_ONLY: &str =
    "Reply with the JSON only: no code fence, no commentary before or after it.";

/// One side of a node-pair exchange.
pub fn pair_turn(
    own_context: &str,
    own_node: &KnowledgeNode,
    other_node: &KnowledgeNode,
    perspective: &str,
    other_reply: Option<&str>,
) -> String {
    let mut prompt = format!(
        "# Your knowledge background\n\n{own_context}\n\n# The other side's node\n\n{}\n\n",
        other_node.brief()
    );

    if let Some(reply) = other_reply {
        let _ = write!(prompt, "# The other side's view\n\n{reply}\n\n");
    }

    let own = own_node.id.bracketed();
    let other = other_node.id.bracketed();
    let _ = write!(
        prompt,
        "# Task\n\n\
         From the perspective of {perspective}, analyse:\n\n\
         1. Is there an intrinsic link between your core node {own} and the other node {other}?\n\
         2. If there is, what kind of link is it (dependency, support, analogy, application, ...)?\n\
         3. Using the related knowledge of your own field, show concretely how the link appears.\n\n\
         Requirements:\n\
         - Ground every point in concrete knowledge, not generalities.\n\
         - Cite node ids explicitly in square brackets, e.g. {own}.\n\
         - If you see no clear link, explain why.\n"
    );
    prompt
}

/// Steering request sent when a node-pair exchange drifts.
pub fn correction(
    source_node: &KnowledgeNode,
    target_node: &KnowledgeNode,
    source_reply: &str,
    target_reply: &str,
) -> String {
    format!(
        "Node pair under discussion:\n\
         - source: {} {}\n\
         - target: {} {}\n\n\
         Source expert said:\n{source_reply}\n\n\
         Target expert said:\n{target_reply}\n\n\
         Problem: the discussion seems to have drifted away from these two specific nodes.\n\n\
         In one or two sentences, remind the experts to focus on how these two nodes relate.\n",
        source_node.id.bracketed(),
        source_node.label,
        target_node.id.bracketed(),
        target_node.label,
    )
}

/// Ask for one edge between a node pair, or `{"exists": false}`.
pub fn edge_extraction(
    source_id: &str,
    target_id: &str,
    source_reply: &str,
    target_reply: &str,
) -> String {
    format!(
        "Source expert's view on [{source_id}]:\n{source_reply}\n\n\
         Target expert's view on [{target_id}]:\n{target_reply}\n\n\
         Decide whether a cross-domain link exists between these two nodes.\n\n\
         If it does, answer with this JSON object:\n\
         {{\n  \"source\": \"{source_id}\",\n  \"target\": \"{target_id}\",\n  \
         \"label\": \"relation type, e.g. requires, models, analogous_to\",\n  \
         \"properties\": {{\n    \"description\": \"one or two sentence description of the link\",\n    \
         \"reasoning\": \"why the link holds\",\n    \
         \"confidence\": a number between 0.0 and 1.0\n  }}\n}}\n\n\
         If there is no clear link, answer with:\n{{\"exists\": false}}\n\n{JSON_ONLY}\n"
    )
}

/// Ask for an accept/reject verdict on one edge.
pub fn edge_validation(record: &EdgeRecord, source_domain: &str, target_domain: &str) -> String {
    format!(
        "Evaluate this cross-domain edge:\n\n\
         Source node ({source_domain}): {}\n\
         Target node ({target_domain}): {}\n\
         Relation: {}\n\
         Description: {}\n\
         Reasoning: {}\n\
         Confidence: {}\n\n\
         Decide whether the edge should be kept. Criteria:\n\n\
         1. The link is sound and meaningful.\n\
         2. The description is clear.\n\
         3. The confidence is high enough (0.6 or above is advisable).\n\
         4. It is a genuine cross-domain link.\n\n\
         Answer with this JSON object:\n\
         {{\n  \"valid\": true or false,\n  \"reason\": \"one sentence on why\"\n}}\n\n{JSON_ONLY}\n",
        record.source,
        record.target,
        record.label,
        record.properties.description,
        record.properties.reasoning,
        record.properties.confidence,
    )
}

/// Ask for quality scores on one edge.
pub fn edge_scoring(edge: &KnowledgeEdge) -> String {
    format!(
        "Score this cross-domain link:\n\n\
         Source domain: {}\n\
         Source concept: {}\n\
         Target domain: {}\n\
         Target concept: {}\n\
         Relation: {}\n\
         Description: {}\n\
         Reasoning: {}\n\
         Original confidence: {}\n\n\
         Score three dimensions between 0 and 1:\n\
         1. Semantic soundness: is the link logically and semantically coherent?\n\
         2. Novelty: is the link rarely discussed in existing literature?\n\
         3. Inspiration potential: could it suggest new research directions?\n\n\
         Answer with this JSON object:\n\
         {{\n  \"semantic_similarity\": 0.0-1.0,\n  \"novelty_score\": 0.0-1.0,\n  \
         \"inspiration_potential\": 0.0-1.0,\n  \"overall_score\": 0.0-1.0,\n  \
         \"reasoning\": \"short justification\",\n  \
         \"recommendation\": \"accept\", \"review\" or \"reject\"\n}}\n\n{JSON_ONLY}\n",
        edge.source_domain,
        edge.source_concept,
        edge.target_domain,
        edge.target_concept,
        edge.relation_type,
        edge.relation_description,
        edge.reasoning,
        edge.confidence,
    )
}

/// One persona's turn in a round-table discussion.
pub fn roundtable_turn(context: &str, instruction: &str) -> String {
    format!(
        "{context}\n\n\
         Task: {instruction}\n\n\
         Rules:\n\
         1. Cite concrete node ids in square brackets, e.g. [node_id].\n\
         2. Anchor every point on a specific node.\n\
         3. Stay with the knowledge actually present in the graphs.\n\n\
         Give your view based on the nodes above.\n"
    )
}

/// Task for the source persona in a round-table round.
pub fn roundtable_source_task(source_domain: &str, target_domain: &str) -> String {
    format!(
        "From the {source_domain} side, pick 3 to 5 {source_domain} nodes (cite their ids) \
         that you think may connect to {target_domain} concepts, and say which \
         {target_domain} concepts they may relate to."
    )
}

/// Task for the target persona, who has just read the source persona's reply.
pub fn roundtable_target_task(source_domain: &str, target_domain: &str) -> String {
    format!(
        "From the {target_domain} side, pick 3 to 5 {target_domain} nodes (cite their ids) \
         that you think may connect to {source_domain} concepts, and respond to the \
         {source_domain} expert's view."
    )
}

/// Steering request sent when a round-table round drifts.
pub fn roundtable_moderation(round: usize, source_reply: &str, target_reply: &str) -> String {
    format!(
        "Round: {round}\n\n\
         Source expert said:\n{source_reply}\n\n\
         Target expert said:\n{target_reply}\n\n\
         Problem: the discussion seems to have drifted away from concrete knowledge nodes, \
         or cites too few node ids.\n\n\
         Remind the experts to cite concrete node ids, to stay with the knowledge in the \
         graphs, and point out nodes that may have been overlooked.\n\n\
         Keep it to three sentences at most.\n"
    )
}

/// Ask for every cross-domain edge found in a whole transcript.
pub fn bulk_extraction(transcript: &str, source_domain: &str, target_domain: &str) -> String {
    format!(
        "Below is the record of a discussion between a {source_domain} expert and a \
         {target_domain} expert:\n\n{transcript}\n\n\
         Extract every explicit cross-domain link. For each edge give:\n\n\
         1. source: a node id that exists in the {source_domain} graph\n\
         2. target: a node id that exists in the {target_domain} graph\n\
         3. label: the relation type, e.g. mathematical_foundation_of, models, analogous_to\n\
         4. properties: description, reasoning, and confidence between 0 and 1\n\n\
         Answer with a JSON array:\n\
         [\n  {{\n    \"source\": \"source_node_id\",\n    \"target\": \"target_node_id\",\n    \
         \"label\": \"relation_type\",\n    \"properties\": {{\n      \"description\": \"...\",\n      \
         \"reasoning\": \"...\",\n      \"confidence\": 0.85\n    }}\n  }}\n]\n\n\
         source and target must be node ids actually cited in the discussion. \
         Answer with [] when there are none.\n\n{JSON_ONLY}\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn velocity() -> KnowledgeNode {
        KnowledgeNode::new("v1", "velocity").with_property("description", "rate of change")
    }

    fn function() -> KnowledgeNode {
        KnowledgeNode::new("f1", "function").with_property("description", "a mapping")
    }

    #[test]
    fn first_turn_omits_other_view() {
        let prompt = pair_turn("ctx", &velocity(), &function(), "physics", None);
        assert!(prompt.contains("[v1]"));
        assert!(prompt.contains("[f1] function"));
        assert!(prompt.contains("a mapping"));
        assert!(!prompt.contains("other side's view"));
    }

    #[test]
    fn second_turn_quotes_first_reply_verbatim() {
        let prompt = pair_turn("ctx", &function(), &velocity(), "math", Some("REPLY {A}"));
        assert!(prompt.contains("# The other side's view\n\nREPLY {A}"));
    }

    #[test]
    fn extraction_prompt_names_both_ids() {
        let prompt = edge_extraction("v1", "f1", "a", "b");
        assert!(prompt.contains("\"source\": \"v1\""));
        assert!(prompt.contains("\"target\": \"f1\""));
        assert!(prompt.contains("{\"exists\": false}"));
    }
}
