//! Attune Core - per-user memory and tone adaptation for conversational systems
//!
//! Attune keeps conversational assistants consistent with each user over
//! time: it remembers what was discussed, learns how each user likes to be
//! spoken to, and emits a [`ToneDirective`] the response layer can render.
//! It generates no text itself and calls no models; every decision is
//! deterministic and local.
//!
//! # Architecture
//!
//! 1. **Memory** (`memory`): a bounded session buffer plus a byte-budgeted
//!    long-term store with exponential retention decay
//! 2. **Tone** (`tone`): lexical context/emotion classification, five-axis
//!    preference profiles, feedback learning, and directive adaptation
//! 3. **Storage** (`storage`): a swappable persistence seam with SQLite
//!    and in-memory providers
//! 4. **Engine** (`engine`): the [`Personalizer`] facade tying it together
//!    behind per-user locking
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use attune_core::{ChatRequest, EngineConfig, Personalizer};
//! use attune_core::storage::InMemoryStore;
//! use attune_core::types::ContextLabel;
//!
//! let engine = Personalizer::new(EngineConfig::default(), Arc::new(InMemoryStore::new()));
//!
//! // First message from an unknown user creates a neutral profile.
//! let directive = engine
//!     .handle_chat(&ChatRequest::new(
//!         "alice",
//!         "Can we schedule a meeting for the quarterly report?",
//!     ))
//!     .unwrap();
//! assert_eq!(directive.context, ContextLabel::Work);
//!
//! // Feedback nudges future directives for that context.
//! engine
//!     .submit_feedback("alice", ContextLabel::Work, 1.0, None)
//!     .unwrap();
//! assert_eq!(engine.get_profile("alice").unwrap().interaction_count, 1);
//! ```
//!
//! # Design Principles
//!
//! 1. **Determinism**: identical inputs always yield identical directives
//! 2. **Graceful degradation**: a dead storage backend never kills a
//!    conversation; the session buffer keeps working
//! 3. **Bounded state**: every per-user structure has a hard cap, enforced
//!    at write time rather than by background sweeps

#![deny(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod config;
pub mod engine;
pub mod error;
pub mod memory;
pub mod storage;
pub mod tone;
pub mod types;

pub use config::EngineConfig;
pub use engine::{ChatRequest, Personalizer};
pub use error::{AttuneError, Result, ResultExt};
pub use memory::{
    DecayCurve, EntryDraft, MemoryAnalytics, MemoryEntry, MemoryManager, MemorySnapshot,
    MemoryTier, SessionBuffer, UserMemory,
};
pub use tone::{
    ContextAnalyzer, ContextSignals, FeedbackLearner, PartialToneVector, ToneDirective,
    ToneEngine, ToneProfile, ToneVector,
};
pub use types::{ContextLabel, EmotionTag, Exchange, Timestamp};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
