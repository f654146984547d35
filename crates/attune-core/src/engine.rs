//! Engine facade
//!
//! [`Personalizer`] is the single entry point callers integrate against:
//! it wires the classifier, tone engine, feedback learner, and memory
//! manager together and owns the operation ordering rules (deadline
//! checks before mutation, feedback before adaptation, persistence after
//! mutation).

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::{AttuneError, Result};
use crate::memory::{EntryDraft, MemoryAnalytics, MemoryManager, MemorySnapshot, MemoryTier, UserSlot};
use crate::storage::Storage;
use crate::tone::{
    ContextAnalyzer, FeedbackLearner, FeedbackSignal, PartialToneVector, ToneDirective,
    ToneEngine, ToneProfile, ToneVector,
};
use crate::types::{now, ContextLabel, Exchange, Timestamp};

/// Longest message prefix kept in a long-term entry summary
const SUMMARY_MAX_CHARS: usize = 240;

/// One inbound chat message plus optional side signals
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Stable caller-chosen user identifier
    pub user_id: String,
    /// Raw message text
    pub message: String,
    /// Caller-supplied context, overriding the classifier when present
    pub context_hint: Option<ContextLabel>,
    /// Feedback on the previous exchange, in `[-1, 1]`
    pub feedback: Option<f64>,
    /// Fail with `Timeout` before mutating if already past this instant
    pub deadline: Option<Timestamp>,
}

impl ChatRequest {
    /// A plain message with no hint, feedback, or deadline
    pub fn new(user_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            message: message.into(),
            context_hint: None,
            feedback: None,
            deadline: None,
        }
    }
}

/// The personalization engine facade
pub struct Personalizer {
    config: EngineConfig,
    analyzer: ContextAnalyzer,
    engine: ToneEngine,
    learner: FeedbackLearner,
    manager: MemoryManager,
}

impl std::fmt::Debug for Personalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Personalizer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Personalizer {
    /// Build an engine over the given storage provider
    pub fn new(config: EngineConfig, storage: Arc<dyn Storage>) -> Self {
        Self {
            analyzer: ContextAnalyzer::new(),
            engine: ToneEngine::from_config(&config),
            learner: FeedbackLearner::from_config(&config),
            manager: MemoryManager::new(config.clone(), storage),
            config,
        }
    }

    /// Process one chat message end to end.
    ///
    /// Classifies the message (an explicit hint wins), folds in any
    /// feedback on the previous exchange, adapts a tone directive, then
    /// records the exchange in both memory tiers. A dead storage backend
    /// degrades to session-only memory instead of failing the chat.
    pub fn handle_chat(&self, request: &ChatRequest) -> Result<ToneDirective> {
        check_deadline(request.deadline)?;
        if let Some(score) = request.feedback {
            if !(-1.0..=1.0).contains(&score) || score.is_nan() {
                return Err(AttuneError::InvalidPreference {
                    axis: "score",
                    value: score,
                    min: -1.0,
                    max: 1.0,
                });
            }
        }

        let mut signals = self.analyzer.analyze(&request.message);
        if let Some(hint) = request.context_hint {
            signals.label = hint;
        }
        let timestamp = now();

        let directive = self.manager.with_user(&request.user_id, |slot| {
            // Feedback applies to the previous exchange before this one
            // influences anything.
            if let Some(score) = request.feedback {
                self.apply_feedback_to_latest(&request.user_id, slot, score)?;
            }

            let remembered = remembered_tone(slot, signals.label);
            let profile = slot.profile_mut(&request.user_id);
            let directive = self.engine.adapt(profile, &signals, remembered);

            let mut exchange =
                Exchange::new(timestamp, signals.label, request.message.clone(), signals.emotion);
            exchange.tone = Some(directive.tone);
            slot.buffer.append(exchange);

            let draft = EntryDraft {
                context: signals.label,
                payload: serde_json::json!({
                    "kind": "exchange",
                    "summary": truncate_chars(&request.message, SUMMARY_MAX_CHARS),
                    "emotion": directive.emotion,
                    "keywords": &signals.keywords,
                }),
            };
            // An oversized payload is dropped, never stored; the exchange
            // stays visible through the session buffer.
            match slot.memory.record(&request.user_id, draft, timestamp) {
                Ok(_) => {}
                Err(AttuneError::EntryTooLarge { size, budget }) => {
                    warn!(user_id = %request.user_id, size, budget, "dropped oversized entry");
                }
                Err(err) => return Err(err),
            }

            slot.last_directives.insert(signals.label, directive.tone);

            if let Err(err) = self.manager.persist(&request.user_id, slot) {
                // Session-scoped state remains authoritative; the chat
                // itself succeeds.
                if !matches!(err, AttuneError::StorageUnavailable(_)) {
                    return Err(err);
                }
            }
            Ok(directive)
        })?;

        debug!(
            user_id = %request.user_id,
            context = %directive.context,
            "handled chat message"
        );
        Ok(directive)
    }

    /// Attach the response layer's summary to the latest exchange
    pub fn record_response(&self, user_id: &str, summary: &str) -> Result<()> {
        self.manager.with_user(user_id, |slot| {
            let exchange = slot
                .buffer
                .latest_mut()
                .ok_or_else(|| AttuneError::NotFound(user_id.to_string()))?;
            exchange.response_summary = Some(summary.to_string());
            Ok(())
        })
    }

    /// Create a profile or overlay updates onto the existing one.
    ///
    /// Axis values outside `[0, 1]` are rejected before anything mutates.
    /// Unlike chat, a dead backend fails this call: an explicit preference
    /// write that cannot persist is an error the caller must see.
    pub fn create_or_update_profile(
        &self,
        user_id: &str,
        base: PartialToneVector,
        overrides: &[(ContextLabel, PartialToneVector)],
        deadline: Option<Timestamp>,
    ) -> Result<ToneProfile> {
        check_deadline(deadline)?;
        base.validate()?;
        for (_, partial) in overrides {
            partial.validate()?;
        }

        self.manager.with_user(user_id, |slot| {
            let profile = slot.profile_mut(user_id);
            profile.base_preferences = base.overlay(profile.base_preferences);
            for (context, partial) in overrides {
                let merged = match profile.context_overrides.get(context) {
                    Some(existing) => merge_partials(*existing, *partial),
                    None => *partial,
                };
                profile.context_overrides.insert(*context, merged);
            }
            profile.updated_at = now();
            let updated = profile.clone();

            self.manager.persist(user_id, slot)?;
            Ok(updated)
        })
    }

    /// Fetch a user's profile; unknown users are `NotFound`, never
    /// silently materialized
    pub fn get_profile(&self, user_id: &str) -> Result<ToneProfile> {
        self.manager.with_user(user_id, |slot| {
            slot.profile
                .clone()
                .ok_or_else(|| AttuneError::NotFound(user_id.to_string()))
        })
    }

    /// Delete a user's profile and all memory. `NotFound` when nothing
    /// existed to delete.
    pub fn delete_profile(&self, user_id: &str, deadline: Option<Timestamp>) -> Result<()> {
        check_deadline(deadline)?;
        if self.manager.delete_user(user_id)? {
            Ok(())
        } else {
            Err(AttuneError::NotFound(user_id.to_string()))
        }
    }

    /// Read memory for a user, optionally narrowed to one tier or context.
    ///
    /// A user with no profile, no memory, and no session state is
    /// `NotFound`. When storage is unreachable the distinction cannot be
    /// made, so a degraded snapshot with the unavailability flag comes
    /// back instead.
    pub fn get_memory(
        &self,
        user_id: &str,
        tier: MemoryTier,
        context: Option<ContextLabel>,
    ) -> Result<MemorySnapshot> {
        let known = self.manager.with_user(user_id, |slot| {
            Ok(slot.has_state() || slot.is_degraded())
        })?;
        if !known {
            return Err(AttuneError::NotFound(user_id.to_string()));
        }

        let mut snapshot = self
            .manager
            .snapshot(user_id, context, self.config.retrieve_limit)?;
        match tier {
            MemoryTier::Short => snapshot.long_term.clear(),
            MemoryTier::Long => snapshot.short_term.clear(),
            MemoryTier::Both => {}
        }
        Ok(snapshot)
    }

    /// Clear one or both memory tiers, leaving the profile intact
    pub fn clear_memory(
        &self,
        user_id: &str,
        tier: MemoryTier,
        deadline: Option<Timestamp>,
    ) -> Result<()> {
        check_deadline(deadline)?;
        self.manager.clear(user_id, tier)
    }

    /// Decayed-weight analytics over a user's long-term memory
    pub fn get_memory_analytics(&self, user_id: &str) -> Result<MemoryAnalytics> {
        self.manager.analytics(user_id)
    }

    /// Apply standalone feedback for a context, returning the updated
    /// profile.
    ///
    /// The adjustment target is the last directive emitted for that
    /// context; without one the update moves nothing but still counts.
    pub fn submit_feedback(
        &self,
        user_id: &str,
        context: ContextLabel,
        score: f64,
        deadline: Option<Timestamp>,
    ) -> Result<ToneProfile> {
        check_deadline(deadline)?;
        self.manager.with_user(user_id, |slot| {
            let emitted = slot
                .last_directives
                .get(&context)
                .copied()
                .unwrap_or_else(|| {
                    slot.profile
                        .as_ref()
                        .map(|p| p.resolve(context))
                        .unwrap_or(ToneVector::NEUTRAL)
                });
            let profile = slot.profile_mut(user_id);
            self.learner
                .apply(profile, FeedbackSignal { context, score }, emitted)?;
            let updated = profile.clone();

            if score > 0.0 {
                remember_tone(slot, user_id, context, emitted, score)?;
            }
            self.manager.persist(user_id, slot)?;
            Ok(updated)
        })
    }

    /// Restart decay for one long-term entry that proved relevant again.
    ///
    /// `NotFound` when the entry does not exist (or was already evicted),
    /// so callers holding stale ids learn about it.
    pub fn reinforce_memory(
        &self,
        user_id: &str,
        entry_id: uuid::Uuid,
        deadline: Option<Timestamp>,
    ) -> Result<()> {
        check_deadline(deadline)?;
        self.manager.with_user(user_id, |slot| {
            if !slot.memory.entries().iter().any(|e| e.id == entry_id) {
                return Err(AttuneError::NotFound(entry_id.to_string()));
            }
            slot.memory.reinforce(entry_id, now());
            self.manager.persist(user_id, slot)?;
            Ok(())
        })
    }

    /// Store an externally built memory payload directly.
    ///
    /// Summarization is a collaborator concern; this is the seam a payload
    /// builder feeds. Fails with `EntryTooLarge` when the payload alone
    /// exceeds the whole budget, storing nothing.
    pub fn remember(
        &self,
        user_id: &str,
        draft: EntryDraft,
        deadline: Option<Timestamp>,
    ) -> Result<()> {
        check_deadline(deadline)?;
        self.manager.with_user(user_id, |slot| {
            slot.memory.record(user_id, draft, now())?;
            self.manager.persist(user_id, slot)?;
            Ok(())
        })
    }

    fn apply_feedback_to_latest(&self, user_id: &str, slot: &mut UserSlot, score: f64) -> Result<()> {
        let Some(previous) = slot.buffer.latest_mut() else {
            warn!(user_id, "feedback with no prior exchange; ignoring");
            return Ok(());
        };
        previous.feedback_score = Some(score);
        let context = previous.context;
        let emitted = previous.tone.unwrap_or(ToneVector::NEUTRAL);

        let profile = slot.profile_mut(user_id);
        self.learner
            .apply(profile, FeedbackSignal { context, score }, emitted)?;

        if score > 0.0 {
            remember_tone(slot, user_id, context, emitted, score)?;
        }
        Ok(())
    }
}

/// Tone historically tied to the best positive feedback in this context.
///
/// Scans every surviving tone entry for the context rather than the
/// ranked retrieval window, so fresher exchange entries cannot crowd a
/// learned tone out of view. Eviction already bounds how many survive.
fn remembered_tone(slot: &UserSlot, context: ContextLabel) -> Option<ToneVector> {
    let mut best: Option<(f64, ToneVector)> = None;
    for entry in slot.memory.entries() {
        if entry.context != context || entry.payload["kind"] != "tone" {
            continue;
        }
        let score = entry.payload["score"].as_f64().unwrap_or(0.0);
        let Some(axes) = entry.payload["tone"].as_array() else {
            continue;
        };
        if axes.len() != 5 {
            continue;
        }
        let mut tone = [0.0f64; 5];
        for (axis, value) in tone.iter_mut().zip(axes) {
            *axis = value.as_f64().unwrap_or(0.5);
        }
        if best.map_or(true, |(s, _)| score > s) {
            best = Some((score, ToneVector::from_array(tone)));
        }
    }
    best.map(|(_, tone)| tone)
}

/// Persist a well-received tone as a long-term entry so the bias survives
/// session restarts
fn remember_tone(
    slot: &mut UserSlot,
    user_id: &str,
    context: ContextLabel,
    tone: ToneVector,
    score: f64,
) -> Result<()> {
    let draft = EntryDraft {
        context,
        payload: serde_json::json!({
            "kind": "tone",
            "tone": tone.as_array(),
            "score": score,
        }),
    };
    slot.memory.record(user_id, draft, now())?;
    Ok(())
}

fn merge_partials(base: PartialToneVector, update: PartialToneVector) -> PartialToneVector {
    let mut merged = base.as_array();
    for (slot, value) in merged.iter_mut().zip(update.as_array()) {
        if value.is_some() {
            *slot = value;
        }
    }
    PartialToneVector::from_array(merged)
}

fn check_deadline(deadline: Option<Timestamp>) -> Result<()> {
    match deadline {
        Some(deadline) if now() > deadline => Err(AttuneError::Timeout),
        _ => Ok(()),
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
