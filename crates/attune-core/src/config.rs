//! Engine configuration

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{AttuneError, Result};

/// Default short-term buffer capacity (exchanges per user)
pub const DEFAULT_SHORT_TERM_CAPACITY: usize = 10;

/// Default long-term byte budget per user (50 KB)
pub const DEFAULT_LONG_TERM_BUDGET_BYTES: usize = 50 * 1024;

/// Default decay half-life in days
pub const DEFAULT_HALF_LIFE_DAYS: f64 = 30.0;

/// Default decay floor; retained-but-deprioritized entries never score zero
pub const DEFAULT_DECAY_FLOOR: f64 = 0.10;

/// Default feedback learning rate
pub const DEFAULT_LEARNING_RATE: f64 = 0.05;

/// Default cap on how far memory may shift an axis away from the profile
pub const DEFAULT_MEMORY_BIAS_CAP: f64 = 0.15;

/// Main engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Short-term buffer capacity, in exchanges
    pub short_term_capacity: usize,

    /// Long-term byte budget per user
    pub long_term_budget_bytes: usize,

    /// Decay half-life, in days
    pub half_life_days: f64,

    /// Decay floor in (0, 1)
    pub decay_floor: f64,

    /// Feedback learning rate
    pub learning_rate: f64,

    /// Bound on memory-driven tone bias, per axis
    pub memory_bias_cap: f64,

    /// How many long-term entries a chat turn retrieves
    pub retrieve_limit: usize,

    /// How many feedback events a profile summarizes
    pub feedback_history_cap: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            short_term_capacity: DEFAULT_SHORT_TERM_CAPACITY,
            long_term_budget_bytes: DEFAULT_LONG_TERM_BUDGET_BYTES,
            half_life_days: DEFAULT_HALF_LIFE_DAYS,
            decay_floor: DEFAULT_DECAY_FLOOR,
            learning_rate: DEFAULT_LEARNING_RATE,
            memory_bias_cap: DEFAULT_MEMORY_BIAS_CAP,
            retrieve_limit: 5,
            feedback_history_cap: 20,
        }
    }
}

impl EngineConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the short-term buffer capacity
    pub fn with_short_term_capacity(mut self, capacity: usize) -> Self {
        self.short_term_capacity = capacity;
        self
    }

    /// Set the long-term byte budget per user
    pub fn with_long_term_budget_bytes(mut self, budget: usize) -> Self {
        self.long_term_budget_bytes = budget;
        self
    }

    /// Set the decay half-life in days
    pub fn with_half_life_days(mut self, days: f64) -> Self {
        self.half_life_days = days;
        self
    }

    /// Set the feedback learning rate
    pub fn with_learning_rate(mut self, alpha: f64) -> Self {
        self.learning_rate = alpha;
        self
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| AttuneError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| AttuneError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.short_term_capacity, 10);
        assert_eq!(config.long_term_budget_bytes, 51_200);
        assert!((config.half_life_days - 30.0).abs() < f64::EPSILON);
        assert!((config.decay_floor - 0.10).abs() < f64::EPSILON);
    }

    #[test]
    fn test_config_builder() {
        let config = EngineConfig::new()
            .with_short_term_capacity(4)
            .with_long_term_budget_bytes(50_000)
            .with_learning_rate(0.1);

        assert_eq!(config.short_term_capacity, 4);
        assert_eq!(config.long_term_budget_bytes, 50_000);
        assert!((config.learning_rate - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn test_config_toml_round_trip() {
        let config = EngineConfig::default().with_half_life_days(7.0);
        let toml = toml::to_string(&config).unwrap();
        let parsed: EngineConfig = toml::from_str(&toml).unwrap();
        assert!((parsed.half_life_days - 7.0).abs() < f64::EPSILON);
        assert_eq!(parsed.long_term_budget_bytes, config.long_term_budget_bytes);
    }
}
