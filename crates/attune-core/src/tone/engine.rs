//! Tone adaptation
//!
//! Combines resolved preferences, the detected emotional register, and a
//! memory-derived bias into a single directive for the response layer.
//! The memory bias is capped per axis so remembered history can tilt a
//! directive but never override an explicit preference outright.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::EngineConfig;
use crate::tone::context::ContextSignals;
use crate::tone::profile::{ToneProfile, ToneVector};
use crate::types::{ContextLabel, EmotionTag};

/// The engine's output for one exchange: what tone to strike and how
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToneDirective {
    /// Context the message was classified into
    pub context: ContextLabel,
    /// Detected emotional register of the message
    pub emotion: EmotionTag,
    /// Final adapted tone vector
    pub tone: ToneVector,
    /// Concrete phrasing guidance derived from the vector
    pub hints: Vec<String>,
}

/// Computes tone directives from preferences, emotion, and memory bias
#[derive(Debug, Clone, Copy)]
pub struct ToneEngine {
    bias_cap: f64,
}

impl ToneEngine {
    /// Engine with the given per-axis memory bias cap
    pub fn new(bias_cap: f64) -> Self {
        Self {
            bias_cap: bias_cap.abs(),
        }
    }

    /// Engine configured from engine settings
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.memory_bias_cap)
    }

    /// Produce a directive for one classified message.
    ///
    /// `remembered` is the tone historically associated with the best
    /// feedback in this context, if any; each axis pulls toward it by at
    /// most the bias cap. Emotion adjustments apply after the bias, and
    /// the result clamps to `[0, 1]` per axis.
    pub fn adapt(
        &self,
        profile: &ToneProfile,
        signals: &ContextSignals,
        remembered: Option<ToneVector>,
    ) -> ToneDirective {
        let base = profile.resolve(signals.label);

        let mut axes = base.as_array();
        if let Some(memory) = remembered {
            for (slot, target) in axes.iter_mut().zip(memory.as_array()) {
                let bias = (target - *slot).clamp(-self.bias_cap, self.bias_cap);
                *slot += bias;
            }
        }

        let tone = apply_emotion(ToneVector::from_array(axes), signals.emotion).clamped();

        trace!(
            user_id = %profile.user_id,
            context = %signals.label,
            emotion = ?signals.emotion,
            "adapted tone directive"
        );

        ToneDirective {
            context: signals.label,
            emotion: signals.emotion,
            hints: phrasing_hints(tone, signals.emotion),
            tone,
        }
    }
}

impl Default for ToneEngine {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

/// Fixed emotion adjustments, applied on top of preference and bias
fn apply_emotion(tone: ToneVector, emotion: EmotionTag) -> ToneVector {
    let mut t = tone;
    match emotion {
        EmotionTag::Frustrated => {
            t.empathy += 0.2;
            t.humor -= 0.2;
            t.enthusiasm -= 0.1;
        }
        EmotionTag::Anxious => {
            t.empathy += 0.2;
            t.verbosity += 0.1;
            t.humor -= 0.1;
        }
        EmotionTag::Negative => {
            t.empathy += 0.15;
            t.humor -= 0.15;
        }
        EmotionTag::Excited => {
            t.enthusiasm += 0.2;
        }
        EmotionTag::Positive => {
            t.enthusiasm += 0.1;
            t.humor += 0.1;
        }
        EmotionTag::Neutral => {}
    }
    t
}

fn phrasing_hints(tone: ToneVector, emotion: EmotionTag) -> Vec<String> {
    let mut hints = Vec::new();

    hints.push(
        if tone.formality >= 0.7 {
            "use formal address and complete sentences"
        } else if tone.formality <= 0.3 {
            "keep the register casual and conversational"
        } else {
            "use a relaxed professional register"
        }
        .to_string(),
    );

    if tone.enthusiasm >= 0.7 {
        hints.push("lead with energy; exclamations are welcome".to_string());
    } else if tone.enthusiasm <= 0.3 {
        hints.push("keep the delivery measured and even".to_string());
    }

    hints.push(
        if tone.verbosity >= 0.7 {
            "explain thoroughly with examples"
        } else if tone.verbosity <= 0.3 {
            "answer in as few sentences as possible"
        } else {
            "balance detail with brevity"
        }
        .to_string(),
    );

    if tone.empathy >= 0.7 {
        hints.push("acknowledge the user's situation before answering".to_string());
    }
    if tone.humor >= 0.7 {
        hints.push("light humor is appropriate".to_string());
    } else if tone.humor <= 0.2 {
        hints.push("avoid jokes entirely".to_string());
    }

    if matches!(emotion, EmotionTag::Frustrated | EmotionTag::Anxious) {
        hints.push("address the concern directly before anything else".to_string());
    }

    hints
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::now;
    use std::collections::BTreeSet;

    fn signals(label: ContextLabel, emotion: EmotionTag) -> ContextSignals {
        ContextSignals {
            label,
            emotion,
            keywords: BTreeSet::new(),
        }
    }

    #[test]
    fn test_directive_reflects_resolved_preferences() {
        let mut profile = ToneProfile::neutral("alice", now());
        profile.base_preferences.formality = 0.9;

        let directive = ToneEngine::default().adapt(
            &profile,
            &signals(ContextLabel::Work, EmotionTag::Neutral),
            None,
        );

        assert_eq!(directive.context, ContextLabel::Work);
        assert!((directive.tone.formality - 0.9).abs() < 1e-12);
        assert!(directive
            .hints
            .iter()
            .any(|h| h.contains("formal address")));
    }

    #[test]
    fn test_memory_bias_is_capped() {
        let profile = ToneProfile::neutral("alice", now());
        let remembered = ToneVector {
            formality: 1.0,
            enthusiasm: 0.0,
            ..ToneVector::NEUTRAL
        };

        let directive = ToneEngine::new(0.15).adapt(
            &profile,
            &signals(ContextLabel::Other, EmotionTag::Neutral),
            Some(remembered),
        );

        // Pull of 0.5 in either direction is capped at 0.15.
        assert!((directive.tone.formality - 0.65).abs() < 1e-12);
        assert!((directive.tone.enthusiasm - 0.35).abs() < 1e-12);
    }

    #[test]
    fn test_small_memory_delta_passes_through_uncapped() {
        let profile = ToneProfile::neutral("alice", now());
        let remembered = ToneVector {
            humor: 0.55,
            ..ToneVector::NEUTRAL
        };

        let directive = ToneEngine::new(0.15).adapt(
            &profile,
            &signals(ContextLabel::Other, EmotionTag::Neutral),
            Some(remembered),
        );
        assert!((directive.tone.humor - 0.55).abs() < 1e-12);
    }

    #[test]
    fn test_frustration_raises_empathy_and_kills_humor() {
        let profile = ToneProfile::neutral("alice", now());

        let directive = ToneEngine::default().adapt(
            &profile,
            &signals(ContextLabel::Work, EmotionTag::Frustrated),
            None,
        );

        assert!(directive.tone.empathy > 0.5);
        assert!(directive.tone.humor < 0.5);
        assert!(directive
            .hints
            .iter()
            .any(|h| h.contains("address the concern")));
    }

    #[test]
    fn test_output_always_in_range() {
        let mut profile = ToneProfile::neutral("alice", now());
        profile.base_preferences.empathy = 1.0;
        profile.base_preferences.humor = 0.0;

        // Emotion adjustment would push empathy past 1.0 and humor below 0.
        let directive = ToneEngine::default().adapt(
            &profile,
            &signals(ContextLabel::Personal, EmotionTag::Frustrated),
            None,
        );

        assert!(directive.tone.validate().is_ok());
        assert!((directive.tone.empathy - 1.0).abs() < 1e-12);
        assert!((directive.tone.humor - 0.0).abs() < 1e-12);
    }

    #[test]
    fn test_adapt_is_deterministic() {
        let profile = ToneProfile::neutral("alice", now());
        let sig = signals(ContextLabel::Academic, EmotionTag::Positive);
        let engine = ToneEngine::default();

        let a = engine.adapt(&profile, &sig, Some(ToneVector::NEUTRAL));
        let b = engine.adapt(&profile, &sig, Some(ToneVector::NEUTRAL));
        assert_eq!(a, b);
    }
}
