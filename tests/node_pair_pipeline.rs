//! End-to-end node-pair pipeline against scripted replies
//!
//! Each test drives `NodePairChatroom` over the fixture physics and math
//! graphs and checks both the outcome and what reached the edge file.

mod common;

use common::{
    edge_reply, long_turn, no_edge_reply, script_accepted_pair, script_no_edge_pair,
    verdict_reply, Fixture,
};
use graphbridge::{GenerationError, PairOutcome, ScriptedGenerator};

#[tokio::test]
async fn accepted_edge_is_persisted() {
    let generator = ScriptedGenerator::new();
    script_accepted_pair(&generator, "v1", "f1");
    let fx = Fixture::new(generator);

    let outcome = fx.chatroom.discuss_pair("v1", "f1", 1).await.unwrap();
    let edge = outcome.edge().cloned().unwrap();
    assert_eq!(edge.source, "v1");
    assert_eq!(edge.target, "f1");
    assert_eq!(edge.label, "modelled_by");

    let doc = fx.chatroom.store().load().unwrap();
    assert_eq!(doc.metadata.total_edges, 1);
    assert_eq!(doc.edges, vec![edge]);
    assert!(doc.metadata.last_updated.is_some());
    assert_eq!(doc.metadata.source_graphs.len(), 2);
    assert!(doc.metadata.source_graphs.contains_key("physics"));
    assert_eq!(fx.generator.call_count(), 4);
}

#[tokio::test]
async fn each_side_sees_its_own_context_and_the_other_reply() {
    let generator = ScriptedGenerator::new();
    script_accepted_pair(&generator, "v1", "f1");
    let fx = Fixture::new(generator);
    fx.chatroom.discuss_pair("v1", "f1", 1).await.unwrap();

    let calls = fx.generator.calls();
    // the physicist's context lists the velocity neighbourhood
    assert!(calls[0].prompt.contains("[v1]"));
    assert!(calls[0].prompt.contains("[v2]"));
    assert!(!calls[0].prompt.contains("[f2]"));
    // the mathematician sees its own neighbourhood plus the physicist's reply
    assert!(calls[1].prompt.contains("[f2]"));
    assert!(calls[1].prompt.contains(&long_turn("v1", "f1")));
    assert_ne!(calls[0].system_instruction, calls[1].system_instruction);
}

#[tokio::test]
async fn no_edge_leaves_file_untouched_and_batch_continues() {
    let generator = ScriptedGenerator::new();
    script_no_edge_pair(&generator, "v1", "f1");
    script_accepted_pair(&generator, "v2", "f2");
    let fx = Fixture::new(generator);

    let pairs = vec![
        ("v1".to_string(), "f1".to_string()),
        ("v2".to_string(), "f2".to_string()),
    ];
    let summary = fx.chatroom.batch_discuss(&pairs, 1).await;

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.no_edge, 1);
    assert_eq!(summary.accepted, 1);
    assert_eq!(summary.edges[0].source, "v2");

    let doc = fx.chatroom.store().load().unwrap();
    assert_eq!(doc.metadata.total_edges, 1);
    assert_eq!(doc.edges.len(), 1);
}

#[tokio::test]
async fn generation_failure_mid_batch_is_counted_and_skipped() {
    let generator = ScriptedGenerator::new();
    script_accepted_pair(&generator, "v1", "f1");
    generator.push(Err(GenerationError::RateLimited));
    script_accepted_pair(&generator, "v3", "f1");
    let fx = Fixture::new(generator);

    let pairs = vec![
        ("v1".to_string(), "f1".to_string()),
        ("v2".to_string(), "f2".to_string()),
        ("v3".to_string(), "f1".to_string()),
    ];
    let summary = fx.chatroom.batch_discuss(&pairs, 1).await;

    assert_eq!(summary.processed, 3);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.accepted, 2);
    assert_eq!(summary.edges[1].source, "v3");
    assert_eq!(fx.generator.call_count(), 9);
    assert_eq!(fx.generator.remaining(), 0);

    let doc = fx.chatroom.store().load().unwrap();
    assert_eq!(doc.metadata.total_edges, 2);
    assert_eq!(doc.edges[1].source, "v3");
}

#[tokio::test]
async fn reversed_edge_is_swapped_before_validation() {
    let generator = ScriptedGenerator::new()
        .with_response(long_turn("v1", "f1"))
        .with_response(long_turn("f1", "v1"))
        .with_response(edge_reply("f1", "v1", "describes", 0.7))
        .with_response(verdict_reply(true, "sound"));
    let fx = Fixture::new(generator);

    let outcome = fx.chatroom.discuss_pair("v1", "f1", 1).await.unwrap();
    let edge = outcome.edge().unwrap();
    assert_eq!((edge.source.as_str(), edge.target.as_str()), ("v1", "f1"));

    // the validator was shown the corrected direction
    let calls = fx.generator.calls();
    let validation = &calls[3].prompt;
    assert!(validation.contains("Source node (physics): v1"));
    assert!(validation.contains("Target node (math): f1"));
}

#[tokio::test]
async fn unresolved_endpoints_skip_validation() {
    let generator = ScriptedGenerator::new()
        .with_response(long_turn("v1", "f1"))
        .with_response(long_turn("f1", "v1"))
        .with_response(edge_reply("v1", "x9", "relates_to", 0.5));
    let fx = Fixture::new(generator);

    let outcome = fx.chatroom.discuss_pair("v1", "f1", 1).await.unwrap();
    assert!(matches!(outcome, PairOutcome::InvalidEdge(ref e) if e.target == "x9"));
    assert_eq!(fx.generator.call_count(), 3);
    assert!(fx.chatroom.store().load().unwrap().edges.is_empty());
}

#[tokio::test]
async fn unreadable_verdict_rejects() {
    let generator = ScriptedGenerator::new()
        .with_response(long_turn("v1", "f1"))
        .with_response(long_turn("f1", "v1"))
        .with_response(edge_reply("v1", "f1", "modelled_by", 0.9))
        .with_response("I think it is probably fine.");
    let fx = Fixture::new(generator);

    let outcome = fx.chatroom.discuss_pair("v1", "f1", 1).await.unwrap();
    match outcome {
        PairOutcome::Rejected { reason, .. } => {
            assert_eq!(reason, graphbridge::discussion::EVALUATION_FAILED)
        }
        other => panic!("expected rejection, got {:?}", other),
    }
    assert_eq!(fx.chatroom.store().load().unwrap().metadata.total_edges, 0);
}

#[tokio::test]
async fn validator_rejection_carries_reason() {
    let generator = ScriptedGenerator::new()
        .with_response(long_turn("v1", "f1"))
        .with_response(long_turn("f1", "v1"))
        .with_response(edge_reply("v1", "f1", "modelled_by", 0.9))
        .with_response(verdict_reply(false, "too vague"));
    let fx = Fixture::new(generator);

    let outcome = fx.chatroom.discuss_pair("v1", "f1", 1).await.unwrap();
    assert!(matches!(outcome, PairOutcome::Rejected { ref reason, .. } if reason == "too vague"));
}

#[tokio::test]
async fn fenced_extraction_reply_is_accepted() {
    let generator = ScriptedGenerator::new()
        .with_response(long_turn("v1", "f1"))
        .with_response(long_turn("f1", "v1"))
        .with_response(format!(
            "```json\n{}\n```",
            edge_reply("v1", "f1", "modelled_by", 0.6)
        ))
        .with_response(verdict_reply(true, "ok"));
    let fx = Fixture::new(generator);

    let outcome = fx.chatroom.discuss_pair("v1", "f1", 1).await.unwrap();
    assert!(outcome.is_accepted());
}

#[tokio::test]
async fn out_of_range_confidence_is_no_edge() {
    let generator = ScriptedGenerator::new()
        .with_response(long_turn("v1", "f1"))
        .with_response(long_turn("f1", "v1"))
        .with_response(edge_reply("v1", "f1", "modelled_by", 1.5));
    let fx = Fixture::new(generator);

    let outcome = fx.chatroom.discuss_pair("v1", "f1", 1).await.unwrap();
    assert_eq!(outcome, PairOutcome::NoEdge);
}

#[tokio::test]
async fn reply_missing_own_id_is_off_topic() {
    let generator = ScriptedGenerator::new()
        .with_response(long_turn("v2", "f1"))
        .with_response(long_turn("f1", "v2"))
        .with_response("Stay on [v1] and [f1].")
        .with_response(no_edge_reply());
    let fx = Fixture::new(generator);

    let outcome = fx.chatroom.discuss_pair("v1", "f1", 1).await.unwrap();
    assert!(matches!(outcome, PairOutcome::OffTopic { .. }));
    // extraction never ran
    assert_eq!(fx.generator.call_count(), 3);
    assert_eq!(fx.generator.remaining(), 1);
}

#[tokio::test]
async fn store_initialization_is_idempotent() {
    let generator = ScriptedGenerator::new();
    script_accepted_pair(&generator, "v1", "f1");
    let fx = Fixture::new(generator);
    fx.chatroom.discuss_pair("v1", "f1", 1).await.unwrap();

    fx.chatroom
        .initialize_store("other.json", "paths.json")
        .unwrap();
    let doc = fx.chatroom.store().load().unwrap();
    assert_eq!(doc.edges.len(), 1);
    assert!(!doc.metadata.source_graphs.values().any(|p| p == "other.json"));
}
