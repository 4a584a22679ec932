//! Experience curve
//!
//! Thresholds follow `round(base_xp * level^exponent)`. The float result is
//! rounded once (half away from zero) so every runtime comparison is an exact
//! integer comparison.

use serde::{Deserialize, Serialize};

use crate::consts::MAX_LEVEL_LIMIT;
use crate::error::ConfigError;

/// Largest threshold the curve may produce. Every integer below it is exact
/// in `f64`, so rounded thresholds stay distinct and strictly increasing.
const MAX_EXACT_THRESHOLD: f64 = 9_007_199_254_740_992.0; // 2^53

/// Curve tunables
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveConfig {
    /// XP scale factor (>= 1.0)
    pub base_xp: f64,
    /// Growth exponent, within [1.0, 2.5]
    pub exponent: f64,
    /// Highest reachable level
    pub max_level: u32,
}

impl Default for CurveConfig {
    fn default() -> Self {
        Self {
            base_xp: 100.0,
            exponent: 1.5,
            max_level: 30,
        }
    }
}

impl CurveConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.base_xp.is_finite() || self.base_xp < 1.0 {
            return Err(ConfigError::BaseXp(self.base_xp));
        }
        if !(1.0..=2.5).contains(&self.exponent) {
            return Err(ConfigError::Exponent(self.exponent));
        }
        if self.max_level < 1 || self.max_level > MAX_LEVEL_LIMIT {
            return Err(ConfigError::MaxLevel {
                got: self.max_level,
                limit: MAX_LEVEL_LIMIT,
            });
        }
        // Thresholds grow with level, so the top one bounds them all
        let top = self.base_xp * f64::from(self.max_level).powf(self.exponent);
        if !(top < MAX_EXACT_THRESHOLD) {
            return Err(ConfigError::ThresholdRange {
                max_level: self.max_level,
                threshold: top,
            });
        }
        Ok(())
    }
}

/// Validated experience curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Curve {
    config: CurveConfig,
}

impl Curve {
    pub fn new(config: CurveConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CurveConfig {
        &self.config
    }

    #[inline]
    pub fn max_level(&self) -> u32 {
        self.config.max_level
    }

    /// XP needed to advance from `level - 1` to `level`
    pub fn threshold_for_level(&self, level: u32) -> u64 {
        if level <= 1 {
            return 0;
        }
        let raw = self.config.base_xp * f64::from(level).powf(self.config.exponent);
        raw.round() as u64
    }

    /// XP needed to go from the current level to the next one (0 at max level)
    pub fn xp_to_next(&self, level: u32) -> u64 {
        if level >= self.config.max_level {
            0
        } else {
            self.threshold_for_level(level + 1)
        }
    }

    /// Total XP needed to climb from level 1 to `target_level` (inclusive)
    pub fn cumulative_threshold(&self, target_level: u32) -> u64 {
        (2..=target_level).fold(0u64, |acc, level| {
            acc.saturating_add(self.threshold_for_level(level))
        })
    }

    /// Level reached by spending `total_xp` greedily from level 1
    pub fn estimate_level_from_total_xp(&self, total_xp: u64) -> u32 {
        let mut level = 1;
        let mut remaining = total_xp;
        while level < self.config.max_level {
            let next = self.threshold_for_level(level + 1);
            if next > remaining {
                break;
            }
            remaining -= next;
            level += 1;
        }
        level
    }
}
