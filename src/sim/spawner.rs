//! Spawn requests against the pools
//!
//! Exhausted pools never fail a reward silently: depending on
//! [`ExhaustionPolicy`] the XP is either credited straight to progression or
//! counted as dropped.

use glam::Vec3;
use rand::Rng;

use super::pool::{PoolHandle, PrototypeKey};
use super::state::{PickupInit, ProjectileInit, World};
use crate::consts::*;
use crate::settings::ExhaustionPolicy;

/// Split `total` into `count` shares as evenly as possible.
/// The first `total % count` shares get one extra.
pub fn split_value(total: u32, count: u32) -> impl Iterator<Item = u32> {
    let base = if count == 0 { 0 } else { total / count };
    let remainder = if count == 0 { 0 } else { total % count };
    (0..count).map(move |i| if i < remainder { base + 1 } else { base })
}

/// Spawn one pickup worth `value` XP
pub fn spawn_pickup(
    world: &mut World,
    key: PrototypeKey,
    position: Vec3,
    value: u32,
) -> Option<PoolHandle> {
    let init = PickupInit {
        position,
        value,
        now: world.time,
        ttl: world.config.attraction.ttl,
    };
    match world.pickups.acquire(key, init) {
        Some(handle) if world.pickups.is_active(handle) => {
            world.stats.pickups_spawned += 1;
            Some(handle)
        }
        // Recycled during init (worthless pickup)
        Some(_) => None,
        None => {
            handle_exhaustion(world, value);
            None
        }
    }
}

/// Spawn `count` pickups sharing `total_value`, scattered around `position`.
/// Zero-valued shares are skipped. Returns how many pickups were placed.
pub fn spawn_pickup_batch(
    world: &mut World,
    key: PrototypeKey,
    position: Vec3,
    total_value: u32,
    count: u32,
) -> usize {
    if count == 0 {
        log::warn!("Ignoring pickup batch with zero count ({} XP)", total_value);
        return 0;
    }
    let start_angle: f32 = world.rng.random_range(0.0..std::f32::consts::TAU);
    let step = std::f32::consts::TAU / count as f32;

    let mut spawned = 0;
    for (i, share) in split_value(total_value, count).enumerate() {
        if share == 0 {
            continue;
        }
        let offset = if count == 1 {
            Vec3::ZERO
        } else {
            let angle = start_angle + step * i as f32;
            let radius = BATCH_SCATTER_RADIUS * world.rng.random_range(0.5..=1.0f32);
            Vec3::new(angle.cos() * radius, 0.0, angle.sin() * radius)
        };
        if spawn_pickup(world, key, position + offset, share).is_some() {
            spawned += 1;
        }
    }
    spawned
}

/// Fire a projectile from `origin` along `direction` (flattened to the ground)
pub fn spawn_projectile(
    world: &mut World,
    key: PrototypeKey,
    origin: Vec3,
    direction: Vec3,
) -> Option<PoolHandle> {
    let init = ProjectileInit {
        origin,
        direction,
        speed: world.config.projectile.speed,
        lifetime: world.config.projectile.lifetime,
    };
    let handle = world.projectiles.acquire(key, init)?;
    if !world.projectiles.is_active(handle) {
        log::debug!("Projectile from {:?} had no direction, recycled", origin);
        return None;
    }
    world.stats.projectiles_fired += 1;
    Some(handle)
}

fn handle_exhaustion(world: &mut World, value: u32) {
    match world.config.exhaustion_policy {
        ExhaustionPolicy::CreditDirectly => {
            log::debug!("Pickup pool exhausted, crediting {} XP directly", value);
            world.stats.xp_credited_directly += u64::from(value);
            world.add_xp(value);
        }
        ExhaustionPolicy::Drop => {
            log::debug!("Pickup pool exhausted, dropping {} XP", value);
            world.stats.pickups_dropped += 1;
        }
    }
}
