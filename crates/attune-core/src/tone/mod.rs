//! Tone adaptation pipeline
//!
//! ```text
//!   message ──> ContextAnalyzer ──> ContextSignals
//!                                        │
//!   ToneProfile ──── resolve(context) ───┤
//!                                        ▼
//!   memory bias ───────────────────> ToneEngine ──> ToneDirective
//!                                        ▲
//!   feedback ────> FeedbackLearner ──────┘  (mutates the profile)
//! ```
//!
//! Everything here is deterministic and pure over its inputs; persistence
//! and locking live in [`crate::memory`] and [`crate::storage`].

pub mod context;
pub mod engine;
pub mod feedback;
pub mod profile;

pub use context::{ContextAnalyzer, ContextSignals};
pub use engine::{ToneDirective, ToneEngine};
pub use feedback::{FeedbackLearner, FeedbackSignal};
pub use profile::{FeedbackEvent, PartialToneVector, ToneProfile, ToneVector, AXIS_NAMES};
