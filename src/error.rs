//! Error types
//!
//! Only configuration and persistence failures surface as hard errors.
//! Gameplay problems (bad XP amounts, exhausted pools) are logged and
//! recovered where they happen.

use thiserror::Error;

/// Invalid tunables. Components refuse to construct with these.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("base XP must be finite and at least 1.0, got {0}")]
    BaseXp(f64),
    #[error("curve exponent must be within [1.0, 2.5], got {0}")]
    Exponent(f64),
    #[error("max level must be within [1, {limit}], got {got}")]
    MaxLevel { got: u32, limit: u32 },
    #[error("pool initial size must be at least 1")]
    InitialSize,
    #[error("pool expand amount must be at least 1")]
    ExpandAmount,
    #[error("pool max size {max} is below its initial size {initial}")]
    MaxSize { max: u32, initial: u32 },
    #[error("prototype {0} is already registered")]
    DuplicatePrototype(u32),
    #[error("{field} must be finite and positive, got {value}")]
    NonPositive { field: &'static str, value: f32 },
    #[error("{field} must be finite and non-negative, got {value}")]
    Negative { field: &'static str, value: f32 },
    #[error("time slow scale must be within (0, 1], got {0}")]
    TimeSlowScale(f32),
    #[error("level {max_level} threshold {threshold} exceeds the exact integer range (2^53)")]
    ThresholdRange { max_level: u32, threshold: f64 },
    #[error("collect radius {collect_radius} exceeds magnet range {magnet_range}")]
    CollectRadius { collect_radius: f32, magnet_range: f32 },
    #[error("acceleration curve: {0}")]
    AccelerationCurve(&'static str),
}

/// Rejected gameplay input. State is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("XP amount must be greater than zero")]
    ZeroXp,
    #[error("already at max level")]
    AtMaxLevel,
    #[error("level {got} is outside 1..={max}")]
    LevelOutOfRange { got: u32, max: u32 },
    #[error("snapshot XP {xp} does not fit below the level {level} threshold")]
    InconsistentSnapshot { level: u32, xp: u64 },
}

/// Record store I/O failure.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("record store I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("record store format: {0}")]
    Format(#[from] serde_json::Error),
}
