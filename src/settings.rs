//! Game tunables
//!
//! Loaded from a JSON file; every section falls back to defaults when
//! omitted. A config must pass [`GameConfig::validate`] before a run starts.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{ConfigError, PersistenceError};
use crate::sim::{AttractionConfig, CurveConfig, LevelUpConfig, PoolConfig};

/// What to do with a pickup when its pool has no instance to spare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExhaustionPolicy {
    /// Skip the visual pickup but still award its XP
    #[default]
    CreditDirectly,
    /// Lose the reward along with the pickup
    Drop,
}

/// Player stats
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub max_health: u32,
    /// Ground speed (units/sec)
    pub speed: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_health: PLAYER_MAX_HEALTH,
            speed: PLAYER_SPEED,
        }
    }
}

/// Pooled projectile tunables
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileConfig {
    pub speed: f32,
    /// Seconds before a projectile returns to its pool
    pub lifetime: f32,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            speed: PROJECTILE_SPEED,
            lifetime: PROJECTILE_LIFETIME,
        }
    }
}

/// Complete run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Run seed for reproducible spawn scatter
    pub seed: u64,
    pub curve: CurveConfig,
    pub level_up: LevelUpConfig,
    pub attraction: AttractionConfig,
    pub pickup_pool: PoolConfig,
    pub projectile_pool: PoolConfig,
    pub projectile: ProjectileConfig,
    pub player: PlayerConfig,
    pub exhaustion_policy: ExhaustionPolicy,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 0x5eed,
            curve: CurveConfig::default(),
            level_up: LevelUpConfig::default(),
            attraction: AttractionConfig::default(),
            pickup_pool: PoolConfig {
                initial_size: 64,
                auto_expand: true,
                expand_amount: 32,
                max_size: Some(512),
            },
            projectile_pool: PoolConfig {
                initial_size: 32,
                auto_expand: true,
                expand_amount: 16,
                max_size: Some(256),
            },
            projectile: ProjectileConfig::default(),
            player: PlayerConfig::default(),
            exhaustion_policy: ExhaustionPolicy::default(),
        }
    }
}

impl GameConfig {
    /// Check every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.curve.validate()?;
        self.level_up.validate()?;
        self.attraction.validate()?;
        self.pickup_pool.validate()?;
        self.projectile_pool.validate()?;
        for (field, value) in [
            ("projectile.speed", self.projectile.speed),
            ("projectile.lifetime", self.projectile.lifetime),
            ("player.speed", self.player.speed),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::NonPositive { field, value });
            }
        }
        if self.player.max_health == 0 {
            return Err(ConfigError::NonPositive {
                field: "player.max_health",
                value: 0.0,
            });
        }
        Ok(())
    }

    /// Parse a config from JSON text
    pub fn from_json(json: &str) -> Result<Self, PersistenceError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from a file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, PersistenceError> {
        match std::fs::read_to_string(path) {
            Ok(json) => {
                let config = Self::from_json(&json)?;
                log::info!("Loaded config from {}", path.display());
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        log::info!("Config saved to {}", path.display());
        Ok(())
    }
}
