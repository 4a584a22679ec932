//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by prototype key, then slot)
//! - No rendering or platform dependencies

pub mod attract;
pub mod curve;
pub mod pause;
pub mod pool;
pub mod progression;
pub mod schedule;
pub mod spawner;
pub mod state;
pub mod tick;

pub use attract::{
    AccelerationCurve, AttractPhase, Attractable, AttractionConfig, AttractionState, CollectorId,
    CollectorQuery, PickupOutcome,
};
pub use curve::{Curve, CurveConfig};
pub use pause::PauseCoordinator;
pub use pool::{
    Disposition, ObjectPool, PoolConfig, PoolHandle, PoolRegistry, PoolStats, Poolable,
    PrototypeKey,
};
pub use progression::{
    LevelUpConfig, ObserverId, Progression, ProgressionEvent, ProgressionPhase, ProgressionState,
    Vitals,
};
pub use schedule::Scheduler;
pub use spawner::{spawn_pickup, spawn_pickup_batch, spawn_projectile, split_value};
pub use state::{Pickup, PickupInit, Player, Projectile, ProjectileInit, RunStats, World};
pub use tick::{TickInput, tick};
