//! Core types shared across the engine
//!
//! This module defines the fundamental vocabulary of the system:
//! - Context labels
//! - Emotion tags
//! - Timestamps
//! - The per-turn `Exchange` record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::tone::ToneVector;

/// Timestamp type alias
pub type Timestamp = DateTime<Utc>;

/// Create a timestamp for the current moment
pub fn now() -> Timestamp {
    Utc::now()
}

/// Conversational context a message belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextLabel {
    /// Work and professional topics
    Work,
    /// Personal life, relationships, leisure
    Personal,
    /// Study and research topics
    Academic,
    /// Anything that does not clearly match the above
    Other,
}

impl ContextLabel {
    /// All labels, in classification priority order
    pub const ALL: [ContextLabel; 4] = [
        ContextLabel::Work,
        ContextLabel::Personal,
        ContextLabel::Academic,
        ContextLabel::Other,
    ];

    /// Stable lowercase name, matching the serde representation
    pub fn as_str(self) -> &'static str {
        match self {
            ContextLabel::Work => "work",
            ContextLabel::Personal => "personal",
            ContextLabel::Academic => "academic",
            ContextLabel::Other => "other",
        }
    }
}

impl fmt::Display for ContextLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse failure for [`ContextLabel::from_str`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLabel(pub String);

impl fmt::Display for UnknownLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown context label '{}'", self.0)
    }
}

impl std::error::Error for UnknownLabel {}

impl std::str::FromStr for ContextLabel {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "work" => Ok(ContextLabel::Work),
            "personal" => Ok(ContextLabel::Personal),
            "academic" => Ok(ContextLabel::Academic),
            "other" => Ok(ContextLabel::Other),
            other => Err(UnknownLabel(other.to_string())),
        }
    }
}

/// Dominant emotion detected in a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionTag {
    /// No clear emotional signal
    Neutral,
    /// Happy, pleased, appreciative
    Positive,
    /// Sad, disappointed, unhappy
    Negative,
    /// Angry, annoyed, irritated
    Frustrated,
    /// Thrilled, eager, energetic
    Excited,
    /// Worried, nervous, afraid
    Anxious,
}

impl EmotionTag {
    /// Stable lowercase name, matching the serde representation
    pub fn as_str(self) -> &'static str {
        match self {
            EmotionTag::Neutral => "neutral",
            EmotionTag::Positive => "positive",
            EmotionTag::Negative => "negative",
            EmotionTag::Frustrated => "frustrated",
            EmotionTag::Excited => "excited",
            EmotionTag::Anxious => "anxious",
        }
    }
}

impl fmt::Display for EmotionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One turn of conversation.
///
/// Owned by exactly one of the short-term buffer or the long-term store at a
/// time; an exchange may be copied from short-term into long-term but is
/// never shared-mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exchange {
    /// When the turn happened
    pub timestamp: Timestamp,

    /// Context the message was classified into
    pub context: ContextLabel,

    /// The raw user message
    pub user_message: String,

    /// Summary of the rendered response, attached once the external
    /// renderer has produced it
    pub response_summary: Option<String>,

    /// Dominant emotion detected in the user message
    pub emotion: EmotionTag,

    /// Tone vector of the directive emitted for this turn
    pub tone: Option<ToneVector>,

    /// Explicit feedback for this turn, when the user supplied any
    pub feedback_score: Option<f64>,
}

impl Exchange {
    /// Create a new exchange for an incoming message
    pub fn new(
        timestamp: Timestamp,
        context: ContextLabel,
        user_message: impl Into<String>,
        emotion: EmotionTag,
    ) -> Self {
        Self {
            timestamp,
            context,
            user_message: user_message.into(),
            response_summary: None,
            emotion,
            tone: None,
            feedback_score: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_round_trip() {
        for label in ContextLabel::ALL {
            let parsed: ContextLabel = label.as_str().parse().unwrap();
            assert_eq!(parsed, label);
        }
        assert!("boardroom".parse::<ContextLabel>().is_err());
    }

    #[test]
    fn test_serde_matches_as_str() {
        let json = serde_json::to_string(&ContextLabel::Academic).unwrap();
        assert_eq!(json, "\"academic\"");
        let json = serde_json::to_string(&EmotionTag::Frustrated).unwrap();
        assert_eq!(json, "\"frustrated\"");
    }

    #[test]
    fn test_exchange_starts_without_response() {
        let ex = Exchange::new(now(), ContextLabel::Work, "hi", EmotionTag::Neutral);
        assert!(ex.response_summary.is_none());
        assert!(ex.feedback_score.is_none());
        assert!(ex.tone.is_none());
    }
}
