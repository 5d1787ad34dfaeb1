//! Pair selection: full cross product, random, keyword and theme samples
//!
//! Every strategy yields `(source_id, target_id)` pairs ordered by target
//! node first, then source node, in graph file order.

use crate::graph::{KnowledgeGraph, KnowledgeNode, PropertyValue};
use rand::seq::SliceRandom;
use rand::Rng;

pub type NodePair = (String, String);

fn product<'a, S, T>(sources: S, targets: T) -> Vec<NodePair>
where
    S: IntoIterator<Item = &'a KnowledgeNode> + Clone,
    T: IntoIterator<Item = &'a KnowledgeNode>,
{
    let mut pairs = Vec::new();
    for target in targets {
        for source in sources.clone() {
            pairs.push((source.id.to_string(), target.id.to_string()));
        }
    }
    pairs
}

/// Every source node paired with every target node.
pub fn cartesian(source: &KnowledgeGraph, target: &KnowledgeGraph) -> Vec<NodePair> {
    product(source.nodes(), target.nodes())
}

/// `n` distinct pairs drawn uniformly from the cross product.
///
/// Asking for more pairs than exist returns all of them, shuffled.
pub fn random_sample<R: Rng + ?Sized>(
    source: &KnowledgeGraph,
    target: &KnowledgeGraph,
    n: usize,
    rng: &mut R,
) -> Vec<NodePair> {
    let all = cartesian(source, target);
    all.choose_multiple(rng, n.min(all.len())).cloned().collect()
}

fn mentions(node: &KnowledgeNode, keyword: &str) -> bool {
    node.label.contains(keyword) || node.description().contains(keyword)
}

/// Pairs where some keyword appears in both nodes' label or description,
/// stopping at `max_pairs`.
pub fn keyword_sample(
    source: &KnowledgeGraph,
    target: &KnowledgeGraph,
    keywords: &[String],
    max_pairs: usize,
) -> Vec<NodePair> {
    let mut pairs = Vec::new();
    if max_pairs == 0 {
        return pairs;
    }
    for t in target.nodes() {
        for s in source.nodes() {
            if keywords.iter().any(|k| mentions(t, k) && mentions(s, k)) {
                pairs.push((s.id.to_string(), t.id.to_string()));
                if pairs.len() >= max_pairs {
                    return pairs;
                }
            }
        }
    }
    pairs
}

fn property_text(node: &KnowledgeNode, key: &str) -> String {
    node.properties
        .get(key)
        .map(PropertyValue::render)
        .unwrap_or_default()
}

/// True when some theme is a substring of the node's `theme` or `category`.
pub fn matches_themes(node: &KnowledgeNode, themes: &[String]) -> bool {
    let theme = property_text(node, "theme");
    let category = property_text(node, "category");
    themes
        .iter()
        .any(|t| theme.contains(t.as_str()) || category.contains(t.as_str()))
}

/// Cross product of the nodes matching each side's themes.
pub fn theme_sample(
    source: &KnowledgeGraph,
    target: &KnowledgeGraph,
    source_themes: &[String],
    target_themes: &[String],
) -> Vec<NodePair> {
    let sources: Vec<&KnowledgeNode> = source
        .nodes()
        .iter()
        .filter(|n| matches_themes(n, source_themes))
        .collect();
    let targets = target
        .nodes()
        .iter()
        .filter(|n| matches_themes(n, target_themes));
    product(sources.iter().copied(), targets)
}
