//! E2E Test: Tone Personalization
//!
//! Walks the full chat path: classification, adaptation, feedback
//! learning, storage degradation, and concurrent users.

use std::sync::Arc;
use std::thread;

use attune_core::storage::InMemoryStore;
use attune_core::tone::FeedbackSignal;
use attune_core::types::{now, ContextLabel, EmotionTag};
use attune_core::{
    ChatRequest, EngineConfig, FeedbackLearner, MemoryTier, Personalizer, ToneProfile,
    ToneVector,
};

fn engine() -> Personalizer {
    Personalizer::new(EngineConfig::default(), Arc::new(InMemoryStore::new()))
}

/// E2E test: scheduling language classifies as work
#[test]
fn e2e_work_message_classification() {
    let directive = engine()
        .handle_chat(&ChatRequest::new(
            "alice",
            "Can we schedule a meeting for the quarterly report?",
        ))
        .unwrap();
    assert_eq!(directive.context, ContextLabel::Work);
    assert_eq!(directive.emotion, EmotionTag::Neutral);
    assert!(!directive.hints.is_empty());
}

/// E2E test: repeated positive feedback toward a formal directive raises
/// formality strictly each step and stays clamped
#[test]
fn e2e_feedback_converges_monotonically() {
    let learner = FeedbackLearner::from_config(&EngineConfig::default());
    let mut profile = ToneProfile::neutral("alice", now());
    let emitted = ToneVector {
        formality: 0.9,
        ..ToneVector::NEUTRAL
    };
    let signal = FeedbackSignal {
        context: ContextLabel::Work,
        score: 1.0,
    };

    let mut previous = profile.resolve(ContextLabel::Work).formality;
    for _ in 0..3 {
        learner.apply(&mut profile, signal, emitted).unwrap();
        let current = profile.resolve(ContextLabel::Work).formality;
        assert!(current > previous);
        assert!(current <= 0.9);
        previous = current;
    }
}

/// E2E test: frustrated messages get higher empathy than the same user's
/// neutral messages
#[test]
fn e2e_frustration_changes_the_directive() {
    let engine = engine();
    let neutral = engine
        .handle_chat(&ChatRequest::new("alice", "please review the report"))
        .unwrap();
    let frustrated = engine
        .handle_chat(&ChatRequest::new(
            "alice",
            "I'm so frustrated, the report tool is useless again",
        ))
        .unwrap();

    assert_eq!(frustrated.emotion, EmotionTag::Frustrated);
    assert!(frustrated.tone.empathy > neutral.tone.empathy);
    assert!(frustrated.tone.humor < neutral.tone.humor);
}

/// E2E test: a storage outage mid-conversation degrades to session memory
/// without failing the chat, and recovery resumes persistence
#[test]
fn e2e_conversation_survives_storage_outage() {
    let store = Arc::new(InMemoryStore::new());
    let engine = Personalizer::new(EngineConfig::default(), store.clone());

    engine
        .handle_chat(&ChatRequest::new("alice", "client meeting at 9 am"))
        .unwrap();

    store.set_failing(true);
    let directive = engine
        .handle_chat(&ChatRequest::new("alice", "move the budget review too"))
        .unwrap();
    assert_eq!(directive.context, ContextLabel::Work);

    // Both exchanges are visible in the session buffer; the long-term
    // view is flagged as possibly incomplete.
    let snapshot = engine.get_memory("alice", MemoryTier::Both, None).unwrap();
    assert_eq!(snapshot.short_term.len(), 2);
    assert!(snapshot.long_term_unavailable);

    store.set_failing(false);
    engine
        .handle_chat(&ChatRequest::new("alice", "thanks, that works"))
        .unwrap();
    let snapshot = engine.get_memory("alice", MemoryTier::Both, None).unwrap();
    assert!(!snapshot.long_term_unavailable);
}

/// E2E test: positive feedback on a context biases later directives in
/// that context toward the well-received tone
#[test]
fn e2e_remembered_tone_biases_future_directives() {
    let engine = engine();

    // Establish a formal work profile so the emitted directive is formal.
    engine
        .create_or_update_profile(
            "alice",
            attune_core::PartialToneVector {
                formality: Some(0.9),
                ..Default::default()
            },
            &[],
            None,
        )
        .unwrap();
    engine
        .handle_chat(&ChatRequest::new("alice", "client meeting agenda"))
        .unwrap();
    engine
        .submit_feedback("alice", ContextLabel::Work, 1.0, None)
        .unwrap();

    // A different user with a neutral profile gets a less formal work
    // directive than alice, whose memory now pulls toward formal.
    let alice = engine
        .handle_chat(&ChatRequest::new("alice", "quarterly report status"))
        .unwrap();
    let bob = engine
        .handle_chat(&ChatRequest::new("bob", "quarterly report status"))
        .unwrap();
    assert!(alice.tone.formality > bob.tone.formality);
}

/// E2E test: concurrent chats for the same user never tear the buffer,
/// and distinct users proceed independently
#[test]
fn e2e_concurrent_users() {
    let engine = Arc::new(engine());

    let mut handles = Vec::new();
    for worker in 0..4 {
        let engine = Arc::clone(&engine);
        handles.push(thread::spawn(move || {
            for i in 0..25 {
                engine
                    .handle_chat(&ChatRequest::new(
                        "shared",
                        format!("meeting note {worker}-{i}"),
                    ))
                    .unwrap();
                engine
                    .handle_chat(&ChatRequest::new(
                        format!("solo-{worker}"),
                        format!("meeting note {i}"),
                    ))
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    // Shared user: buffer exactly at capacity, no interleaving corruption.
    let shared = engine.get_memory("shared", MemoryTier::Short, None).unwrap();
    assert_eq!(shared.short_term.len(), 10);

    // Each solo user saw exactly its own 25 messages.
    for worker in 0..4 {
        let solo = engine
            .get_memory(&format!("solo-{worker}"), MemoryTier::Short, None)
            .unwrap();
        assert_eq!(solo.short_term.len(), 10);
        let analytics = engine
            .get_memory_analytics(&format!("solo-{worker}"))
            .unwrap();
        assert_eq!(analytics.entry_count, 25);
    }
}
