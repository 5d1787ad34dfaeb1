//! Node representation in a domain knowledge graph

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;

/// Identifier of a node, unique within its graph
///
/// Serializes as a plain string (e.g. "v1", "kinematics_velocity")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create a NodeId from a string
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Bracket notation used when citing a node in discussion, e.g. `[v1]`
    pub fn bracketed(&self) -> String {
        format!("[{}]", self.0)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Typed property values
///
/// Graph files carry strings, lists of strings and scalars; nested values are
/// accepted and rendered as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<PropertyValue>),
    Object(BTreeMap<String, PropertyValue>),
}

impl PropertyValue {
    /// Borrow the value as a string slice, if it is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Render for a prompt: strings verbatim, lists joined with ", ",
    /// scalars stringified.
    pub fn render(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::String(s) => s.clone(),
            Self::Array(items) => items
                .iter()
                .map(PropertyValue::render)
                .collect::<Vec<_>>()
                .join(", "),
            Self::Object(_) => serde_json::to_string(self).unwrap_or_default(),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Vec<&str>> for PropertyValue {
    fn from(items: Vec<&str>) -> Self {
        Self::Array(items.into_iter().map(PropertyValue::from).collect())
    }
}

/// Properties collection (sorted by key so rendering is stable)
pub type Properties = BTreeMap<String, PropertyValue>;

/// A concept node loaded from a graph file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeNode {
    pub id: NodeId,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub properties: Properties,
}

impl KnowledgeNode {
    /// Create a node with an id and label
    pub fn new(id: impl Into<NodeId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            properties: Properties::new(),
        }
    }

    /// Add a property to the node
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// The `description` property, or an empty string
    pub fn description(&self) -> &str {
        self.text_property("description")
    }

    /// A string property, or an empty string when absent or not a string
    pub fn text_property(&self, key: &str) -> &str {
        self.properties
            .get(key)
            .and_then(PropertyValue::as_str)
            .unwrap_or_default()
    }

    /// Terse view shown to the other side of a discussion: id, label, description
    pub fn brief(&self) -> String {
        format!("**{}** {}\n{}", self.id.bracketed(), self.label, self.description())
    }
}

/// Truncate to `max_chars` characters, marking the cut with "..."
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_joins_lists_and_stringifies_scalars() {
        assert_eq!(PropertyValue::from("plain").render(), "plain");
        assert_eq!(PropertyValue::from(vec!["a", "b", "c"]).render(), "a, b, c");
        assert_eq!(PropertyValue::Int(3).render(), "3");
        assert_eq!(PropertyValue::Bool(true).render(), "true");
        assert_eq!(PropertyValue::Float(0.5).render(), "0.5");
    }

    #[test]
    fn brief_contains_id_label_and_description() {
        let node = KnowledgeNode::new("f1", "function")
            .with_property("description", "a mapping between sets");
        let brief = node.brief();
        assert!(brief.contains("[f1]"));
        assert!(brief.contains("function"));
        assert!(brief.contains("a mapping between sets"));
    }

    #[test]
    fn truncate_chars_respects_multibyte_text() {
        assert_eq!(truncate_chars("速度与加速度", 2), "速度...");
        assert_eq!(truncate_chars("short", 10), "short");
    }

    #[test]
    fn node_id_looks_up_by_str() {
        let mut map = std::collections::HashMap::new();
        map.insert(NodeId::from("v1"), 1);
        assert_eq!(map.get("v1"), Some(&1));
    }
}
