//! Orb Surge - experience and leveling core for an arena survivor game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (XP curve, progression, object pools, pickups)
//! - `settings`: Data-driven tunables loaded from JSON
//! - `persistence`: Key/value record store
//! - `highscores`: Best-run tracking and in-run snapshots

pub mod error;
pub mod highscores;
pub mod persistence;
pub mod settings;
pub mod sim;

pub use error::{ConfigError, InputError, PersistenceError};
pub use highscores::BestRun;
pub use settings::GameConfig;

use glam::Vec3;

/// Game configuration constants
pub mod consts {
    use crate::sim::PrototypeKey;

    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Upper bound for configured max level (keeps thresholds inside u64)
    pub const MAX_LEVEL_LIMIT: u32 = 10_000;

    /// Pickup defaults
    pub const MAGNET_RANGE: f32 = 6.0;
    pub const MAGNET_SPEED: f32 = 8.0;
    pub const COLLECT_RADIUS: f32 = 0.35;
    /// Seconds before an uncollected pickup auto-collects (0 = never)
    pub const PICKUP_TTL: f32 = 30.0;
    /// Radius of the ring batch pickups scatter onto
    pub const BATCH_SCATTER_RADIUS: f32 = 0.75;

    /// Projectile defaults
    pub const PROJECTILE_SPEED: f32 = 18.0;
    pub const PROJECTILE_LIFETIME: f32 = 2.0;

    /// Player defaults
    pub const PLAYER_MAX_HEALTH: u32 = 100;
    pub const PLAYER_SPEED: f32 = 5.0;

    /// Prototype identities
    pub const XP_GEM: PrototypeKey = PrototypeKey(1);
    pub const XP_CRYSTAL: PrototypeKey = PrototypeKey(2);
    pub const BOLT: PrototypeKey = PrototypeKey(10);
}

/// Drop the vertical component (ground-plane movement)
#[inline]
pub fn flatten(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Distance between two points on the ground plane, ignoring height
#[inline]
pub fn ground_distance(a: Vec3, b: Vec3) -> f32 {
    flatten(b - a).length()
}
