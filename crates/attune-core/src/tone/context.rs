//! Deterministic context and emotion classification
//!
//! Pure lexical scoring over lowercased message text: keyword hits,
//! phrase patterns, and time-of-life patterns each add a fixed increment,
//! the per-label score is capped at 1.0, and the winner must clear a
//! minimum threshold or the message falls back to [`ContextLabel::Other`].
//! No model calls, no randomness; identical input always yields identical
//! output.

use std::collections::BTreeSet;

use lazy_static::lazy_static;
use regex::Regex;

use crate::types::{ContextLabel, EmotionTag};

/// Score added per matched keyword
const KEYWORD_WEIGHT: f64 = 0.1;
/// Score added per matched phrase pattern
const PHRASE_WEIGHT: f64 = 0.3;
/// Score added per matched time pattern
const TIME_WEIGHT: f64 = 0.2;
/// A winning label must score strictly above this
const MIN_CONFIDENCE: f64 = 0.1;

const WORK_KEYWORDS: &[&str] = &[
    "meeting", "project", "deadline", "client", "business", "work", "office", "report",
    "presentation", "team", "manager", "boss", "colleague", "schedule", "agenda", "strategy",
    "budget", "quarterly", "annual", "performance", "review", "promotion", "salary", "benefits",
    "conference", "workshop", "training", "deployment", "standup", "sprint", "stakeholder",
    "proposal", "invoice", "contract",
];

const PERSONAL_KEYWORDS: &[&str] = &[
    "family", "friend", "home", "weekend", "vacation", "party", "birthday", "dinner", "movie",
    "music", "hobby", "sport", "game", "pet", "dog", "cat", "love", "relationship", "wedding",
    "kids", "baby", "health", "fitness", "gym", "travel", "trip", "holiday", "anniversary",
    "relax", "fun", "celebration",
];

const ACADEMIC_KEYWORDS: &[&str] = &[
    "study", "research", "paper", "thesis", "dissertation", "assignment", "homework", "exam",
    "quiz", "grade", "professor", "lecture", "seminar", "course", "class", "university",
    "college", "student", "scholarly", "citation", "methodology", "hypothesis", "experiment",
    "laboratory", "semester", "journal", "publication", "peer review", "syllabus",
];

lazy_static! {
    static ref WORK_PHRASES: Vec<Regex> = compile(&[
        r"\b(team|department|company)\s+(meeting|call|discussion)",
        r"\b(project|task)\s+(deadline|timeline|schedule)",
        r"\b(quarterly|annual|monthly)\s+(report|review|planning)",
        r"\b(client|customer|stakeholder)\s+(meeting|presentation|feedback)",
        r"\b(performance|salary)\s+review",
        r"\b(budget|cost)\s+(analysis|planning|review)",
    ]);
    static ref PERSONAL_PHRASES: Vec<Regex> = compile(&[
        r"\b(family|friend)\s+(dinner|party|gathering|lunch)",
        r"\b(weekend|vacation|holiday)\s+(plan|trip|activity)",
        r"\b(birthday|anniversary)\s+(party|celebration|gift)",
        r"\b(health|fitness)\s+(goal|plan|routine)",
        r"\b(pet|dog|cat)\s+(care|training|walk)",
    ]);
    static ref ACADEMIC_PHRASES: Vec<Regex> = compile(&[
        r"\b(research|study)\s+(paper|thesis|dissertation|session)",
        r"\b(course|class|lecture)\s+(assignment|homework|exam|notes)",
        r"\b(literature|citation)\s+(review|search)",
        r"\b(data|statistical)\s+analysis",
        r"\b(lab|laboratory)\s+(work|procedure|protocol)",
    ]);
    static ref WORK_TIME: Vec<Regex> = compile(&[
        r"\b\d{1,2}\s*(am|pm)\s*(meeting|call|appointment)",
        r"\b(monday|tuesday|wednesday|thursday|friday)\s+(morning|afternoon|standup)",
        r"\b(deadline|due\s+date)\s+(today|tomorrow|this\s+week)",
        r"\b(office|work)\s+(hours|schedule)",
    ]);
    static ref PERSONAL_TIME: Vec<Regex> = compile(&[
        r"\b(weekend|saturday|sunday)\s+(plan|activity|event)",
        r"\b(vacation|holiday|break)\s+(plan|trip)",
        r"\b(family|friend)\s+(dinner|lunch|coffee)",
    ]);
    static ref ACADEMIC_TIME: Vec<Regex> = compile(&[
        r"\b(semester|quarter|term)\s+(exam|assignment|deadline)",
        r"\b(lecture|class|course)\s+(schedule|time|room)",
        r"\b(thesis|dissertation)\s+(defense|submission|deadline)",
    ]);
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).unwrap_or_else(|e| panic!("bad builtin pattern {p:?}: {e}")))
        .collect()
}

/// Emotion keyword sets, scanned in this order; on a scoring tie the
/// earlier tag wins, making classification order-independent of input.
const EMOTION_KEYWORDS: &[(EmotionTag, &[&str])] = &[
    (
        EmotionTag::Frustrated,
        &[
            "frustrated", "frustrating", "annoyed", "annoying", "angry", "furious", "irritated",
            "fed up", "sick of", "ridiculous", "useless",
        ],
    ),
    (
        EmotionTag::Anxious,
        &[
            "anxious", "worried", "nervous", "scared", "afraid", "stressed", "overwhelmed",
            "panicking", "dread",
        ],
    ),
    (
        EmotionTag::Excited,
        &[
            "excited", "thrilled", "can't wait", "cant wait", "amazing", "incredible",
            "fantastic", "stoked",
        ],
    ),
    (
        EmotionTag::Negative,
        &[
            "sad", "unhappy", "disappointed", "upset", "miserable", "terrible", "awful",
            "heartbroken", "lonely",
        ],
    ),
    (
        EmotionTag::Positive,
        &[
            "happy", "great", "wonderful", "glad", "pleased", "love", "enjoy", "excellent",
            "perfect", "thanks", "thank you",
        ],
    ),
];

/// What the classifier extracted from one message
#[derive(Debug, Clone, PartialEq)]
pub struct ContextSignals {
    /// Winning context label, [`ContextLabel::Other`] on low confidence or tie
    pub label: ContextLabel,
    /// Detected emotional register
    pub emotion: EmotionTag,
    /// Salient message words: lowercased, punctuation-trimmed, and longer
    /// than four characters
    pub keywords: BTreeSet<String>,
}

/// Stateless lexical classifier for message context and emotion
#[derive(Debug, Default, Clone, Copy)]
pub struct ContextAnalyzer;

impl ContextAnalyzer {
    /// Create an analyzer; all pattern tables are process-wide statics
    pub fn new() -> Self {
        Self
    }

    /// Classify a single message
    pub fn analyze(&self, message: &str) -> ContextSignals {
        let lower = message.to_lowercase();

        let work = score(&lower, WORK_KEYWORDS, &WORK_PHRASES, &WORK_TIME);
        let personal = score(&lower, PERSONAL_KEYWORDS, &PERSONAL_PHRASES, &PERSONAL_TIME);
        let academic = score(&lower, ACADEMIC_KEYWORDS, &ACADEMIC_PHRASES, &ACADEMIC_TIME);

        ContextSignals {
            label: pick_label(work, personal, academic),
            emotion: detect_emotion(&lower),
            keywords: extract_keywords(&lower),
        }
    }

    /// Raw per-label confidence scores, mainly for diagnostics
    pub fn confidence(&self, message: &str) -> [(ContextLabel, f64); 3] {
        let lower = message.to_lowercase();
        [
            (
                ContextLabel::Work,
                score(&lower, WORK_KEYWORDS, &WORK_PHRASES, &WORK_TIME),
            ),
            (
                ContextLabel::Personal,
                score(&lower, PERSONAL_KEYWORDS, &PERSONAL_PHRASES, &PERSONAL_TIME),
            ),
            (
                ContextLabel::Academic,
                score(&lower, ACADEMIC_KEYWORDS, &ACADEMIC_PHRASES, &ACADEMIC_TIME),
            ),
        ]
    }
}

fn score(lower: &str, keywords: &[&str], phrases: &[Regex], time: &[Regex]) -> f64 {
    let mut total = 0.0;
    total += keywords.iter().filter(|k| lower.contains(*k)).count() as f64 * KEYWORD_WEIGHT;
    total += phrases.iter().filter(|p| p.is_match(lower)).count() as f64 * PHRASE_WEIGHT;
    total += time.iter().filter(|p| p.is_match(lower)).count() as f64 * TIME_WEIGHT;
    total.min(1.0)
}

fn pick_label(work: f64, personal: f64, academic: f64) -> ContextLabel {
    let best = work.max(personal).max(academic);
    if best <= MIN_CONFIDENCE {
        return ContextLabel::Other;
    }
    // An exact tie between distinct labels is ambiguous.
    let winners = [work, personal, academic]
        .iter()
        .filter(|s| (**s - best).abs() < f64::EPSILON)
        .count();
    if winners > 1 {
        return ContextLabel::Other;
    }
    if (work - best).abs() < f64::EPSILON {
        ContextLabel::Work
    } else if (personal - best).abs() < f64::EPSILON {
        ContextLabel::Personal
    } else {
        ContextLabel::Academic
    }
}

fn extract_keywords(lower: &str) -> BTreeSet<String> {
    lower
        .split_whitespace()
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|word| word.chars().count() > 4)
        .map(str::to_string)
        .collect()
}

fn detect_emotion(lower: &str) -> EmotionTag {
    let mut best = EmotionTag::Neutral;
    let mut best_hits = 0usize;
    for (tag, words) in EMOTION_KEYWORDS {
        let hits = words.iter().filter(|w| lower.contains(*w)).count();
        if hits > best_hits {
            best_hits = hits;
            best = *tag;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_work_message_classifies_as_work() {
        let signals =
            ContextAnalyzer::new().analyze("Can we schedule a meeting for the quarterly report?");
        assert_eq!(signals.label, ContextLabel::Work);
        assert!(signals.keywords.contains("meeting"));
        assert!(signals.keywords.contains("quarterly"));
    }

    #[test]
    fn test_personal_and_academic_messages() {
        let analyzer = ContextAnalyzer::new();
        assert_eq!(
            analyzer.analyze("Planning a birthday dinner for my family this weekend").label,
            ContextLabel::Personal
        );
        assert_eq!(
            analyzer
                .analyze("My thesis defense is next week and I still have data analysis left")
                .label,
            ContextLabel::Academic
        );
    }

    #[test]
    fn test_unclassifiable_message_is_other() {
        let signals = ContextAnalyzer::new().analyze("hello there");
        assert_eq!(signals.label, ContextLabel::Other);
        // Extraction is label-independent; salient words still come back.
        assert!(signals.keywords.contains("hello"));
    }

    #[test]
    fn test_keywords_are_trimmed_lowercase_words_over_four_chars() {
        let signals = ContextAnalyzer::new().analyze("Loved the *quarterly* report!!");
        assert!(signals.keywords.contains("loved"));
        assert!(signals.keywords.contains("quarterly"));
        assert!(signals.keywords.contains("report"));
        // Short words and bare punctuation are dropped.
        assert!(!signals.keywords.contains("the"));
        assert!(!signals.keywords.contains("*quarterly*"));
    }

    #[test]
    fn test_single_weak_hit_does_not_clear_threshold() {
        // One keyword scores exactly 0.1, which must not win.
        let signals = ContextAnalyzer::new().analyze("the game");
        assert_eq!(signals.label, ContextLabel::Other);
    }

    #[test]
    fn test_exact_tie_falls_back_to_other() {
        // "report" (work) and "family" (personal), one keyword each.
        let signals = ContextAnalyzer::new().analyze("report report family family seen here");
        // Two keywords each side would still tie; this input has one unique
        // keyword per label (containment counts a keyword once).
        assert_eq!(signals.label, ContextLabel::Other);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let analyzer = ContextAnalyzer::new();
        let a = analyzer.analyze("project deadline tomorrow, client meeting at 9 am");
        let b = analyzer.analyze("project deadline tomorrow, client meeting at 9 am");
        assert_eq!(a, b);
        assert_eq!(a.label, ContextLabel::Work);
    }

    #[test]
    fn test_emotion_detection() {
        let analyzer = ContextAnalyzer::new();
        assert_eq!(
            analyzer.analyze("I'm so frustrated with this useless build").emotion,
            EmotionTag::Frustrated
        );
        assert_eq!(
            analyzer.analyze("I'm thrilled, can't wait for the trip!").emotion,
            EmotionTag::Excited
        );
        assert_eq!(
            analyzer.analyze("really worried about the exam").emotion,
            EmotionTag::Anxious
        );
        assert_eq!(analyzer.analyze("please pass the salt").emotion, EmotionTag::Neutral);
    }

    #[test]
    fn test_confidence_scores_capped() {
        let message = WORK_KEYWORDS.join(" ");
        let [(_, work), _, _] = ContextAnalyzer::new().confidence(&message);
        assert!(work <= 1.0);
    }
}
