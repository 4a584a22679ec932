//! Run state and pooled entity types
//!
//! [`World`] is the explicit context for one run: it owns progression, the
//! pickup and projectile pools, the player and the run RNG. Nothing here is
//! global, so several worlds can run side by side.

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::attract::{Attractable, CollectorId, CollectorQuery};
use super::curve::Curve;
use super::pool::{Disposition, PoolHandle, PoolRegistry, Poolable};
use super::progression::{Progression, Vitals};
use crate::consts::*;
use crate::error::ConfigError;
use crate::flatten;
use crate::settings::GameConfig;

/// Spawn arguments for a pickup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickupInit {
    pub position: Vec3,
    pub value: u32,
    /// Simulation time of the spawn
    pub now: f64,
    pub ttl: f32,
}

/// Pooled XP pickup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pickup {
    pub attract: Attractable,
}

impl Pickup {
    pub fn position(&self) -> Vec3 {
        self.attract.position
    }

    pub fn value(&self) -> u32 {
        self.attract.state.value
    }
}

impl Poolable for Pickup {
    type Init = PickupInit;

    fn on_acquire(&mut self, init: PickupInit) -> Disposition {
        self.attract.reset(init.position, init.value, init.now, init.ttl);
        // Nothing to award, nothing to show
        if init.value == 0 {
            Disposition::Release
        } else {
            Disposition::Keep
        }
    }

    fn on_release(&mut self) {
        self.attract.state.value = 0;
    }
}

/// Spawn arguments for a projectile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileInit {
    pub origin: Vec3,
    pub direction: Vec3,
    pub speed: f32,
    pub lifetime: f32,
}

/// Pooled projectile flying in a straight line on the ground plane
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub origin: Vec3,
    pub position: Vec3,
    pub velocity: Vec3,
    /// Seconds alive
    pub age: f32,
    pub lifetime: f32,
}

impl Projectile {
    /// Move one step. Returns false once the lifetime ran out.
    pub fn advance(&mut self, dt: f32) -> bool {
        self.position += self.velocity * dt;
        self.age += dt;
        self.age < self.lifetime
    }
}

impl Poolable for Projectile {
    type Init = ProjectileInit;

    fn on_acquire(&mut self, init: ProjectileInit) -> Disposition {
        let direction = flatten(init.direction).normalize_or_zero();
        *self = Self {
            origin: init.origin,
            position: init.origin,
            velocity: direction * init.speed,
            age: 0.0,
            lifetime: init.lifetime,
        };
        if direction == Vec3::ZERO || !(init.lifetime > 0.0) {
            Disposition::Release
        } else {
            Disposition::Keep
        }
    }

    fn on_release(&mut self) {
        self.velocity = Vec3::ZERO;
    }
}

/// The player: the only collector, and the target of level-up heals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: CollectorId,
    pub position: Vec3,
    pub health: u32,
    pub max_health: u32,
    pub speed: f32,
}

impl Player {
    pub fn new(max_health: u32, speed: f32) -> Self {
        Self {
            id: CollectorId(0),
            position: Vec3::ZERO,
            health: max_health,
            max_health,
            speed,
        }
    }

    pub fn take_damage(&mut self, amount: u32) {
        self.health = self.health.saturating_sub(amount);
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }
}

impl Vitals for Player {
    fn current_health(&self) -> u32 {
        self.health
    }

    fn max_health(&self) -> u32 {
        self.max_health
    }

    fn heal(&mut self, amount: u32) {
        self.health = self.health.saturating_add(amount).min(self.max_health);
    }
}

impl CollectorQuery for Player {
    fn find_nearest_collector(&self, _position: Vec3) -> Option<(CollectorId, Vec3)> {
        if self.is_alive() {
            Some((self.id, self.position))
        } else {
            None
        }
    }
}

/// Pickup/projectile counters for the current run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub pickups_spawned: u64,
    pub pickups_collected: u64,
    pub pickups_expired: u64,
    /// Pickups lost to pool exhaustion under the `Drop` policy
    pub pickups_dropped: u64,
    /// XP credited without a pickup because the pool was exhausted
    pub xp_credited_directly: u64,
    pub projectiles_fired: u64,
}

/// Everything one run owns
#[derive(Debug)]
pub struct World {
    pub config: GameConfig,
    pub progression: Progression,
    pub pickups: PoolRegistry<Pickup>,
    pub projectiles: PoolRegistry<Projectile>,
    pub player: Player,
    /// Simulation seconds (scaled, stops while paused)
    pub time: f64,
    /// Unscaled seconds since the run started
    pub real_time: f64,
    /// Simulation ticks that actually advanced
    pub time_ticks: u64,
    pub stats: RunStats,
    pub(crate) rng: Pcg32,
    /// Reused handle buffer for per-tick iteration
    pub(crate) scratch: Vec<PoolHandle>,
}

impl World {
    /// Build a run from a validated config
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let curve = Curve::new(config.curve)?;
        let progression = Progression::new(curve, config.level_up)?;

        let mut pickups = PoolRegistry::new();
        for key in [XP_GEM, XP_CRYSTAL] {
            pickups.register(key, Pickup::default(), config.pickup_pool)?;
        }
        let mut projectiles = PoolRegistry::new();
        projectiles.register(BOLT, Projectile::default(), config.projectile_pool)?;

        log::info!(
            "World created (seed {}, max level {})",
            config.seed,
            config.curve.max_level
        );
        Ok(Self {
            rng: Pcg32::seed_from_u64(config.seed),
            player: Player::new(config.player.max_health, config.player.speed),
            progression,
            pickups,
            projectiles,
            time: 0.0,
            real_time: 0.0,
            time_ticks: 0,
            stats: RunStats::default(),
            scratch: Vec::with_capacity(config.pickup_pool.initial_size as usize),
            config,
        })
    }

    /// Credit XP to the player
    pub fn add_xp(&mut self, amount: u32) -> bool {
        self.progression.add_xp(amount, &mut self.player).is_ok()
    }

    /// The upgrade selector made its choice
    pub fn complete_level_up(&mut self) -> bool {
        self.progression.complete_level_up(&mut self.player)
    }

    pub fn is_paused(&self) -> bool {
        self.progression.time_scale() == 0.0
    }

    /// Start over with the same config (observers stay subscribed)
    pub fn restart(&mut self) {
        self.progression.reset();
        self.pickups.clear();
        self.projectiles.clear();
        self.player = Player::new(self.config.player.max_health, self.config.player.speed);
        self.time = 0.0;
        self.real_time = 0.0;
        self.time_ticks = 0;
        self.stats = RunStats::default();
        self.rng = Pcg32::seed_from_u64(self.config.seed);
        log::info!("Run restarted");
    }
}
