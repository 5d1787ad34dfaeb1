//! Discussion steps: each is one prompt, one generation call, and a parse
//!
//! ```text
//! context -> PairDiscussion -> DriftDetector -> EdgeExtractor
//!         -> resolve_orientation -> EdgeValidator -> EdgeStore
//! ```

mod drift;
mod evaluate;
mod extract;
mod pair;
pub mod prompts;

pub use drift::{
    lacks_grounding, node_references, DriftDetector, Moderator, DEFAULT_MIN_RESPONSE_CHARS,
    MIN_NODE_REFERENCES,
};
pub use evaluate::{
    parse_evaluation, parse_verdict, render_report, EdgeScorer, EdgeValidator, Evaluation,
    Recommendation, ScoredEdge, Verdict, DEFAULT_MIN_OVERALL, EVALUATION_FAILED, NEUTRAL_SCORE,
};
pub use extract::{
    parse_edge_object, parse_edge_reply, resolve_orientation, EdgeExtractor, Orientation,
};
pub use pair::{PairDiscussion, PairExchange};
