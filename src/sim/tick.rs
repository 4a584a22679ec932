//! Fixed timestep simulation tick
//!
//! Order within a tick:
//! 1. one-shot inputs (restart, upgrade chosen)
//! 2. progression continuations on unscaled time
//! 3. if the composed time scale is non-zero: player movement, pickups,
//!    projectiles on scaled time

use glam::{Vec2, Vec3};

use super::attract::PickupOutcome;
use super::state::World;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Desired movement on the ground plane (x, z); normalized internally
    pub move_dir: Vec2,
    /// The upgrade selector made its choice
    pub upgrade_chosen: bool,
    /// Start a fresh run
    pub restart: bool,
}

/// Advance the world by one fixed timestep of `dt` real seconds
pub fn tick(world: &mut World, input: &TickInput, dt: f32) {
    // Bad frame times advance nothing
    let dt = if dt.is_finite() && dt > 0.0 {
        dt
    } else {
        log::warn!("Ignoring invalid tick dt {}", dt);
        0.0
    };
    if input.restart {
        world.restart();
        return;
    }
    if input.upgrade_chosen {
        world.complete_level_up();
    }

    world.real_time += f64::from(dt);
    world.progression.update(dt);

    // Don't simulate while paused
    let sim_dt = dt * world.progression.time_scale();
    if sim_dt <= 0.0 {
        return;
    }
    world.time += f64::from(sim_dt);
    world.time_ticks += 1;

    move_player(world, input.move_dir, sim_dt);
    update_pickups(world, sim_dt);
    update_projectiles(world, sim_dt);
}

fn move_player(world: &mut World, move_dir: Vec2, dt: f32) {
    let dir = move_dir.normalize_or_zero();
    let player = &mut world.player;
    player.position += Vec3::new(dir.x, 0.0, dir.y) * player.speed * dt;
}

fn update_pickups(world: &mut World, dt: f32) {
    let mut handles = std::mem::take(&mut world.scratch);
    world.pickups.collect_active(&mut handles);

    for &handle in &handles {
        let Some(pickup) = world.pickups.get_mut(handle) else {
            continue;
        };
        let outcome =
            pickup
                .attract
                .tick(world.time, dt, &world.config.attraction, &world.player);
        let Some(outcome) = outcome else {
            continue;
        };

        world.pickups.release(handle);
        match outcome {
            PickupOutcome::Collected { .. } => world.stats.pickups_collected += 1,
            PickupOutcome::Expired { .. } => world.stats.pickups_expired += 1,
        }
        world.add_xp(outcome.value());

        // A level-up may have paused the simulation; the rest waits
        if world.is_paused() {
            break;
        }
    }

    world.scratch = handles;
}

fn update_projectiles(world: &mut World, dt: f32) {
    let mut handles = std::mem::take(&mut world.scratch);
    world.projectiles.collect_active(&mut handles);

    for &handle in &handles {
        let alive = match world.projectiles.get_mut(handle) {
            Some(projectile) => projectile.advance(dt),
            None => continue,
        };
        if !alive {
            world.projectiles.release(handle);
        }
    }

    world.scratch = handles;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::settings::GameConfig;
    use crate::sim::spawner::{spawn_pickup, spawn_projectile};
    use crate::sim::{AccelerationCurve, ProgressionPhase};

    fn quiet_config() -> GameConfig {
        let mut config = GameConfig::default();
        config.attraction.acceleration = AccelerationCurve::flat(1.0);
        config.level_up.time_slow_duration = 0.0;
        config
    }

    fn run_ticks(world: &mut World, input: &TickInput, n: u32) {
        for _ in 0..n {
            tick(world, input, SIM_DT);
        }
    }

    #[test]
    fn test_pickup_drawn_in_and_credited() {
        let mut world = World::new(quiet_config()).unwrap();
        spawn_pickup(&mut world, XP_GEM, Vec3::new(3.0, 0.0, 0.0), 25).unwrap();

        run_ticks(&mut world, &TickInput::default(), 120);
        assert_eq!(world.pickups.active_count(), 0);
        assert_eq!(world.stats.pickups_collected, 1);
        assert_eq!(world.progression.total_xp_earned(), 25);
        assert!(world.pickups.check_invariants());
    }

    #[test]
    fn test_out_of_range_pickup_waits_then_expires() {
        let mut config = quiet_config();
        config.attraction.ttl = 1.0;
        let mut world = World::new(config).unwrap();
        let handle = spawn_pickup(&mut world, XP_GEM, Vec3::new(50.0, 0.0, 0.0), 9).unwrap();

        run_ticks(&mut world, &TickInput::default(), 30);
        assert!(world.pickups.is_active(handle));
        assert_eq!(world.pickups.get(handle).unwrap().position().x, 50.0);

        run_ticks(&mut world, &TickInput::default(), 40);
        assert!(!world.pickups.is_active(handle));
        assert_eq!(world.stats.pickups_expired, 1);
        assert_eq!(world.progression.total_xp_earned(), 9);
    }

    #[test]
    fn test_level_up_pauses_until_upgrade_chosen() {
        let mut config = quiet_config();
        config.level_up.pause_delay = 0.1;
        let mut world = World::new(config).unwrap();
        let idle = TickInput::default();

        world.add_xp(300);
        assert_eq!(world.progression.phase(), ProgressionPhase::LevelingUp);

        // Delay elapses on real time, then the sim stops
        run_ticks(&mut world, &idle, 10);
        assert_eq!(
            world.progression.phase(),
            ProgressionPhase::AwaitingSelection
        );
        let frozen_time = world.time;
        let frozen_ticks = world.time_ticks;
        let stray = spawn_pickup(&mut world, XP_GEM, Vec3::new(2.0, 0.0, 0.0), 1).unwrap();
        run_ticks(&mut world, &idle, 30);
        assert_eq!(world.time, frozen_time);
        assert_eq!(world.time_ticks, frozen_ticks);
        assert!(world.pickups.is_active(stray));

        let choose = TickInput {
            upgrade_chosen: true,
            ..Default::default()
        };
        tick(&mut world, &choose, SIM_DT);
        assert_eq!(world.progression.phase(), ProgressionPhase::Accruing);
        assert!(world.time > frozen_time);
    }

    #[test]
    fn test_player_moves_on_ground_plane() {
        let mut world = World::new(quiet_config()).unwrap();
        let input = TickInput {
            move_dir: Vec2::new(3.0, 4.0),
            ..Default::default()
        };
        run_ticks(&mut world, &input, 60);
        let p = world.player.position;
        assert_eq!(p.y, 0.0);
        let expected = world.player.speed;
        assert!((Vec2::new(p.x, p.z).length() - expected).abs() < 1e-3);
    }

    #[test]
    fn test_projectiles_return_to_pool() {
        let mut config = quiet_config();
        config.projectile.lifetime = 0.5;
        let mut world = World::new(config).unwrap();
        spawn_projectile(&mut world, BOLT, Vec3::ZERO, Vec3::Z).unwrap();
        run_ticks(&mut world, &TickInput::default(), 20);
        assert_eq!(world.projectiles.active_count(), 1);
        run_ticks(&mut world, &TickInput::default(), 20);
        assert_eq!(world.projectiles.active_count(), 0);
        assert!(world.projectiles.check_invariants());
    }

    #[test]
    fn test_restart_input() {
        let mut world = World::new(quiet_config()).unwrap();
        world.add_xp(100);
        run_ticks(&mut world, &TickInput::default(), 5);
        let restart = TickInput {
            restart: true,
            ..Default::default()
        };
        tick(&mut world, &restart, SIM_DT);
        assert_eq!(world.progression.total_xp_earned(), 0);
        assert_eq!(world.time_ticks, 0);
    }

    #[test]
    fn test_invalid_dt_advances_nothing() {
        let mut world = World::new(quiet_config()).unwrap();
        let input = TickInput {
            move_dir: Vec2::X,
            ..Default::default()
        };
        for dt in [f32::NAN, -SIM_DT, f32::INFINITY, 0.0] {
            tick(&mut world, &input, dt);
        }
        assert_eq!(world.real_time, 0.0);
        assert_eq!(world.time, 0.0);
        assert_eq!(world.time_ticks, 0);
        assert_eq!(world.player.position, Vec3::ZERO);

        tick(&mut world, &input, SIM_DT);
        assert!(world.real_time > 0.0);
        assert_eq!(world.time_ticks, 1);
    }

    #[test]
    fn test_determinism() {
        // Two worlds with the same seed should produce identical results
        let run = || {
            let mut world = World::new(quiet_config()).unwrap();
            crate::sim::spawner::spawn_pickup_batch(&mut world, XP_GEM, Vec3::X * 4.0, 100, 6);
            let input = TickInput {
                move_dir: Vec2::new(0.3, -1.0),
                ..Default::default()
            };
            run_ticks(&mut world, &input, 90);
            (world.player.position, world.progression.total_xp_earned(), world.stats)
        };
        assert_eq!(run(), run());
    }
}
