//! Retention decay math
//!
//! Pure exponential half-life decay with a floor. Deterministic given its
//! inputs, which keeps eviction ordering reproducible and testable.

use chrono::Duration;

use crate::config::EngineConfig;
use crate::types::Timestamp;

/// Exponential decay curve with a retention floor.
///
/// `weight = floor + (1 - floor) * 0.5 ^ (age / half_life)`
///
/// The floor guarantees old entries are never scored at exactly zero: they
/// stay evictable by the size budget, not by decay alone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayCurve {
    half_life: Duration,
    floor: f64,
}

impl DecayCurve {
    /// Create a curve from a half-life in days and a floor in `[0, 1)`
    pub fn new(half_life_days: f64, floor: f64) -> Self {
        Self {
            half_life: Duration::milliseconds((half_life_days * 86_400_000.0) as i64),
            floor: floor.clamp(0.0, 0.99),
        }
    }

    /// Curve configured by an [`EngineConfig`]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.half_life_days, config.decay_floor)
    }

    /// The retention floor
    pub fn floor(&self) -> f64 {
        self.floor
    }

    /// Current retention weight of an entry last reinforced at
    /// `last_reinforced_at`, evaluated at `now`.
    ///
    /// Clock skew is forgiven: non-positive ages score the full 1.0.
    pub fn weight(&self, last_reinforced_at: Timestamp, now: Timestamp) -> f64 {
        let age_ms = (now - last_reinforced_at).num_milliseconds();
        if age_ms <= 0 {
            return 1.0;
        }
        let half_life_ms = self.half_life.num_milliseconds().max(1) as f64;
        // Past ~56 half-lives the exponential underflows below the floor's
        // f64 epsilon and the sum would round to exactly the floor. Keep a
        // representable minimum so the weight stays strictly above it.
        let raw = 0.5_f64.powf(age_ms as f64 / half_life_ms).max(1e-12);
        self.floor + (1.0 - self.floor) * raw
    }
}

impl Default for DecayCurve {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}
