//! Tone profiles and preference resolution
//!
//! Preferences live on five continuous axes in `[0, 1]`. A profile carries a
//! base vector plus optional per-context overrides; resolution merges the
//! two into a complete effective vector, never a partial one.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::error::{AttuneError, Result};
use crate::types::{ContextLabel, Timestamp};

/// Names of the five tone axes, in field order
pub const AXIS_NAMES: [&str; 5] = ["formality", "enthusiasm", "verbosity", "empathy", "humor"];

/// A complete five-axis tone vector, every axis in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToneVector {
    /// Casual (0.0) to formal (1.0)
    pub formality: f64,
    /// Flat (0.0) to energetic (1.0)
    pub enthusiasm: f64,
    /// Terse (0.0) to detailed (1.0)
    pub verbosity: f64,
    /// Detached (0.0) to warm (1.0)
    pub empathy: f64,
    /// Dry (0.0) to playful (1.0)
    pub humor: f64,
}

impl ToneVector {
    /// The default-neutral vector: 0.5 on every axis
    pub const NEUTRAL: ToneVector = ToneVector {
        formality: 0.5,
        enthusiasm: 0.5,
        verbosity: 0.5,
        empathy: 0.5,
        humor: 0.5,
    };

    /// Axes as an array, in [`AXIS_NAMES`] order
    pub fn as_array(self) -> [f64; 5] {
        [
            self.formality,
            self.enthusiasm,
            self.verbosity,
            self.empathy,
            self.humor,
        ]
    }

    /// Build from an array in [`AXIS_NAMES`] order
    pub fn from_array(axes: [f64; 5]) -> Self {
        Self {
            formality: axes[0],
            enthusiasm: axes[1],
            verbosity: axes[2],
            empathy: axes[3],
            humor: axes[4],
        }
    }

    /// Clamp every axis into `[0, 1]`
    pub fn clamped(self) -> Self {
        Self::from_array(self.as_array().map(|v| v.clamp(0.0, 1.0)))
    }

    /// Reject any axis outside `[0, 1]`
    pub fn validate(&self) -> Result<()> {
        for (name, value) in AXIS_NAMES.into_iter().zip(self.as_array()) {
            if !(0.0..=1.0).contains(&value) || value.is_nan() {
                return Err(AttuneError::invalid_axis(name, value));
            }
        }
        Ok(())
    }

    /// Rough tone vector inferred from raw message text.
    ///
    /// A coarse heuristic over word choice and length; callers may surface
    /// it as a suggestion but it is never silently written to a profile.
    pub fn from_message_text(text: &str) -> Self {
        let lower = text.to_lowercase();
        let count = |words: &[&str]| words.iter().filter(|w| lower.contains(*w)).count();

        let formal = count(&[
            "therefore",
            "consequently",
            "furthermore",
            "moreover",
            "thus",
            "hence",
        ]);
        let informal = count(&["hey", "cool", "awesome", "gonna", "wanna", "gotta"]);
        let formality = match formal.cmp(&informal) {
            std::cmp::Ordering::Greater => 0.8,
            std::cmp::Ordering::Less => 0.2,
            std::cmp::Ordering::Equal => 0.5,
        };

        let eager = count(&[
            "amazing",
            "fantastic",
            "incredible",
            "wonderful",
            "excellent",
            "great",
        ]);
        let flat = count(&["okay", "fine", "alright", "sure"]);
        let enthusiasm = match eager.cmp(&flat) {
            std::cmp::Ordering::Greater => 0.8,
            std::cmp::Ordering::Less => 0.2,
            std::cmp::Ordering::Equal => 0.5,
        };

        let words = text.split_whitespace().count();
        let verbosity = if words < 10 {
            0.2
        } else if words > 50 {
            0.8
        } else {
            0.5
        };

        let empathic = count(&["feel", "understand", "sorry", "hope", "care", "concerned"]);
        let empathy = if empathic > 2 {
            0.8
        } else if empathic > 0 {
            0.5
        } else {
            0.2
        };

        let playful = count(&["haha", "lol", "funny", "joke", "hilarious"]);
        let humor = if playful > 2 {
            0.8
        } else if playful > 0 {
            0.5
        } else {
            0.2
        };

        Self {
            formality,
            enthusiasm,
            verbosity,
            empathy,
            humor,
        }
    }
}

impl Default for ToneVector {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// Per-axis optional values, used for context overrides and partial updates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialToneVector {
    /// Override for the formality axis
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formality: Option<f64>,
    /// Override for the enthusiasm axis
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enthusiasm: Option<f64>,
    /// Override for the verbosity axis
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbosity: Option<f64>,
    /// Override for the empathy axis
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empathy: Option<f64>,
    /// Override for the humor axis
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humor: Option<f64>,
}

impl PartialToneVector {
    /// Axes as an array, in [`AXIS_NAMES`] order
    pub fn as_array(self) -> [Option<f64>; 5] {
        [
            self.formality,
            self.enthusiasm,
            self.verbosity,
            self.empathy,
            self.humor,
        ]
    }

    /// Build from an array in [`AXIS_NAMES`] order
    pub fn from_array(axes: [Option<f64>; 5]) -> Self {
        Self {
            formality: axes[0],
            enthusiasm: axes[1],
            verbosity: axes[2],
            empathy: axes[3],
            humor: axes[4],
        }
    }

    /// A partial vector with every axis set
    pub fn from_full(vector: ToneVector) -> Self {
        Self::from_array(vector.as_array().map(Some))
    }

    /// True when no axis is set
    pub fn is_empty(&self) -> bool {
        self.as_array().iter().all(Option::is_none)
    }

    /// Reject any supplied axis outside `[0, 1]`
    pub fn validate(&self) -> Result<()> {
        for (name, value) in AXIS_NAMES.into_iter().zip(self.as_array()) {
            if let Some(v) = value {
                if !(0.0..=1.0).contains(&v) || v.is_nan() {
                    return Err(AttuneError::invalid_axis(name, v));
                }
            }
        }
        Ok(())
    }

    /// Overlay onto a base vector: supplied axes replace, missing axes keep
    /// the base value. Always yields a complete vector.
    pub fn overlay(&self, base: ToneVector) -> ToneVector {
        let mut merged = base.as_array();
        for (slot, value) in merged.iter_mut().zip(self.as_array()) {
            if let Some(v) = value {
                *slot = v;
            }
        }
        ToneVector::from_array(merged)
    }
}

/// One remembered feedback event, kept in a bounded summary on the profile
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeedbackEvent {
    /// When the feedback arrived
    pub timestamp: Timestamp,
    /// Context the feedback applied to
    pub context: ContextLabel,
    /// Signed score in `[-1, 1]`
    pub score: f64,
}

/// Per-user tone profile.
///
/// Created with neutral preferences on first profile write or first chat
/// from an unknown user. Mutated only by the feedback learner and by
/// explicit profile updates; never deleted implicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToneProfile {
    /// Owning user
    pub user_id: String,

    /// Global preferences applying to every context
    pub base_preferences: ToneVector,

    /// Per-context partial overrides
    #[serde(default)]
    pub context_overrides: HashMap<ContextLabel, PartialToneVector>,

    /// Total interactions that touched this profile
    pub interaction_count: u64,

    /// Interactions whose feedback was positive
    pub successful_match_count: u64,

    /// Running mean of all feedback scores received
    pub mean_feedback_score: f64,

    /// Bounded summary of recent feedback events, newest at the back
    #[serde(default)]
    pub feedback_history: VecDeque<FeedbackEvent>,

    /// When the profile was first created
    pub created_at: Timestamp,

    /// Last mutation time
    pub updated_at: Timestamp,
}

impl ToneProfile {
    /// The explicit default-construction rule: a neutral 0.5 vector on
    /// every axis, invoked exactly once on first reference to an unknown
    /// user, never re-applied.
    pub fn neutral(user_id: impl Into<String>, now: Timestamp) -> Self {
        Self {
            user_id: user_id.into(),
            base_preferences: ToneVector::NEUTRAL,
            context_overrides: HashMap::new(),
            interaction_count: 0,
            successful_match_count: 0,
            mean_feedback_score: 0.0,
            feedback_history: VecDeque::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Effective preferences for a context: the override axis wins where
    /// present, every other axis keeps the base value.
    pub fn resolve(&self, context: ContextLabel) -> ToneVector {
        match self.context_overrides.get(&context) {
            Some(partial) => partial.overlay(self.base_preferences),
            None => self.base_preferences,
        }
    }
}
