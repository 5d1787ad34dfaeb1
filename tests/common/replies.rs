//! Scripted reply builders for the node-pair pipeline
//!
//! A pair that reaches the validator consumes four calls in order: source
//! turn, target turn, extraction, validation.

use graphbridge::ScriptedGenerator;
use serde_json::json;

/// A discussion turn long enough to pass the drift check, citing `own_id`
/// and `other_id`.
pub fn long_turn(own_id: &str, other_id: &str) -> String {
    format!(
        "Looking at [{own_id}] from my side, the concept describes how one quantity \
         changes with another. That is closely tied to [{other_id}], since both rest on \
         the idea of a rate and a mapping between values."
    )
}

pub fn edge_reply(source: &str, target: &str, label: &str, confidence: f64) -> String {
    json!({
        "exists": true,
        "source": source,
        "target": target,
        "label": label,
        "properties": {
            "description": format!("{source} relates to {target}"),
            "reasoning": "both describe a rate of change",
            "confidence": confidence
        }
    })
    .to_string()
}

pub fn no_edge_reply() -> String {
    json!({"exists": false}).to_string()
}

pub fn verdict_reply(valid: bool, reason: &str) -> String {
    json!({"valid": valid, "reason": reason}).to_string()
}

/// Queue the four replies of a pair whose edge is accepted.
pub fn script_accepted_pair(generator: &ScriptedGenerator, source: &str, target: &str) {
    generator.push(Ok(long_turn(source, target)));
    generator.push(Ok(long_turn(target, source)));
    generator.push(Ok(edge_reply(source, target, "modelled_by", 0.8)));
    generator.push(Ok(verdict_reply(true, "meaningful link")));
}

/// Queue the three replies of a pair where no edge is found.
pub fn script_no_edge_pair(generator: &ScriptedGenerator, source: &str, target: &str) {
    generator.push(Ok(long_turn(source, target)));
    generator.push(Ok(long_turn(target, source)));
    generator.push(Ok(no_edge_reply()));
}
