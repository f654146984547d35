//! Feedback learning
//!
//! Nudges stored preferences toward (or away from) the last tone the
//! engine actually emitted, proportionally to the signed feedback score.
//! Updates are small, clamped, and target the context override for the
//! context the feedback applies to, so learning in one context never
//! bleeds into another. Feedback on uncategorized exchanges adjusts the
//! base preferences instead.

use tracing::debug;

use crate::config::EngineConfig;
use crate::error::{AttuneError, Result};
use crate::tone::profile::{FeedbackEvent, PartialToneVector, ToneProfile, ToneVector};
use crate::types::{now, ContextLabel};

/// A signed satisfaction signal for a prior exchange
#[derive(Debug, Clone, Copy)]
pub struct FeedbackSignal {
    /// Context the rated exchange was classified into
    pub context: ContextLabel,
    /// Score in `[-1, 1]`; positive reinforces the emitted tone,
    /// negative pushes away from it
    pub score: f64,
}

/// Applies feedback signals to tone profiles
#[derive(Debug, Clone, Copy)]
pub struct FeedbackLearner {
    learning_rate: f64,
    history_cap: usize,
}

impl FeedbackLearner {
    /// Learner with the given per-update step size
    pub fn new(learning_rate: f64, history_cap: usize) -> Self {
        Self {
            learning_rate,
            history_cap: history_cap.max(1),
        }
    }

    /// Learner configured from engine settings
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.learning_rate, config.feedback_history_cap)
    }

    /// Fold one feedback signal into the profile.
    ///
    /// `emitted` is the directive tone the engine last produced for this
    /// context; each axis of the effective preference moves toward it by
    /// `rate * score * (emitted - current)`, then clamps to `[0, 1]`. A
    /// negative score therefore moves away from the emitted tone. Counters
    /// and the running mean update regardless of sign.
    pub fn apply(
        &self,
        profile: &mut ToneProfile,
        signal: FeedbackSignal,
        emitted: ToneVector,
    ) -> Result<()> {
        if !(-1.0..=1.0).contains(&signal.score) || signal.score.is_nan() {
            return Err(AttuneError::InvalidPreference {
                axis: "score",
                value: signal.score,
                min: -1.0,
                max: 1.0,
            });
        }

        let current = profile.resolve(signal.context);
        let mut adjusted = current.as_array();
        for (slot, target) in adjusted.iter_mut().zip(emitted.as_array()) {
            let step = self.learning_rate * signal.score * (target - *slot);
            *slot = (*slot + step).clamp(0.0, 1.0);
        }
        let adjusted = ToneVector::from_array(adjusted);

        // The nudge lands on the context override so learning in one
        // context never bleeds into another. Uncategorized feedback has no
        // override of its own and adjusts the base preferences instead.
        if signal.context == ContextLabel::Other {
            profile.base_preferences = adjusted;
        } else {
            profile
                .context_overrides
                .insert(signal.context, PartialToneVector::from_full(adjusted));
        }

        let timestamp = now();
        profile.interaction_count += 1;
        if signal.score > 0.0 {
            profile.successful_match_count += 1;
        }
        let n = profile.interaction_count as f64;
        profile.mean_feedback_score += (signal.score - profile.mean_feedback_score) / n;

        profile.feedback_history.push_back(FeedbackEvent {
            timestamp,
            context: signal.context,
            score: signal.score,
        });
        while profile.feedback_history.len() > self.history_cap {
            profile.feedback_history.pop_front();
        }
        profile.updated_at = timestamp;

        debug!(
            user_id = %profile.user_id,
            context = %signal.context,
            score = signal.score,
            "applied feedback signal"
        );
        Ok(())
    }
}
