//! Orb Surge entry point
//!
//! Headless scripted run: the player circles the arena, enemies "die" in a
//! ring around them dropping XP, and an automatic selector picks upgrades.
//!
//! Usage: `orb-surge [config.json] [records.json] [seconds]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Orb Surge (headless) starting...");

    let mut args = std::env::args().skip(1);
    let config_path = args.next().unwrap_or_else(|| "orb_surge.json".to_string());
    let records_path = args.next().unwrap_or_else(|| "orb_surge_records.json".to_string());
    let seconds = args
        .next()
        .and_then(|s| s.parse::<f32>().ok())
        .unwrap_or(120.0);

    if let Err(e) = headless::run(
        std::path::Path::new(&config_path),
        std::path::Path::new(&records_path),
        seconds,
    ) {
        log::error!("Run failed: {}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // No browser front end; the library is driven by the host
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::cell::Cell;
    use std::path::Path;
    use std::rc::Rc;

    use glam::{Vec2, Vec3};

    use orb_surge::consts::*;
    use orb_surge::persistence::RecordStore;
    use orb_surge::sim::{
        ProgressionEvent, ProgressionPhase, TickInput, World, spawn_pickup_batch,
        spawn_projectile, tick,
    };
    use orb_surge::{BestRun, GameConfig};

    /// Frame length of the scripted host (30 fps, substepped to SIM_DT)
    const FRAME_DT: f32 = 1.0 / 30.0;
    /// Seconds between enemy waves
    const WAVE_INTERVAL: f64 = 1.5;
    /// Real seconds the automatic selector "thinks" before choosing
    const SELECT_DELAY: f32 = 0.75;
    const FIRE_INTERVAL: f64 = 0.4;

    pub fn run(
        config_path: &Path,
        records_path: &Path,
        seconds: f32,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let config = GameConfig::load(config_path)?;
        let mut records = RecordStore::open(records_path)?;
        let mut best = BestRun::load(&records);
        let mut world = World::new(config)?;

        if let Some(snapshot) = records.load_run_snapshot() {
            match world.progression.restore(snapshot) {
                Ok(()) => log::info!(
                    "Resumed run at level {} ({} XP)",
                    snapshot.current_level,
                    snapshot.total_xp_earned
                ),
                Err(e) => log::warn!("Ignoring saved run: {}", e),
            }
        }

        let level_ups = Rc::new(Cell::new(0u32));
        let counter = Rc::clone(&level_ups);
        world.progression.subscribe(move |event| match event {
            ProgressionEvent::LevelUp { level } => {
                counter.set(counter.get() + 1);
                log::info!("Level up! Now level {}", level);
            }
            ProgressionEvent::LevelUpEffects { level, healed } => {
                log::debug!("Level {} effects (healed {})", level, healed);
            }
            ProgressionEvent::SelectionRequested { level } => {
                log::info!("Choose an upgrade for level {}", level);
            }
            ProgressionEvent::MaxLevelReached => log::info!("Max level reached"),
            ProgressionEvent::XpChanged { .. } => {}
        });

        let mut next_wave = 0.0;
        let mut next_shot = 0.0;
        let mut waiting_for = 0.0f32;
        let mut wave: u32 = 0;
        let mut elapsed = 0.0f32;

        while elapsed < seconds {
            let mut input = TickInput::default();

            // Auto-selector, driven by real time
            if world.progression.phase() == ProgressionPhase::AwaitingSelection {
                waiting_for += FRAME_DT;
                if waiting_for >= SELECT_DELAY {
                    input.upgrade_chosen = true;
                    waiting_for = 0.0;
                }
            }

            // Circle around the origin
            let angle = world.time as f32 * 0.4;
            input.move_dir = Vec2::new(-angle.sin(), angle.cos());

            if !world.is_paused() {
                if world.time >= next_wave {
                    wave += 1;
                    spawn_wave(&mut world, wave);
                    next_wave = world.time + WAVE_INTERVAL;
                }
                if world.time >= next_shot {
                    let origin = world.player.position;
                    let dir = Vec3::new(input.move_dir.x, 0.0, input.move_dir.y);
                    spawn_projectile(&mut world, BOLT, origin, dir);
                    next_shot = world.time + FIRE_INTERVAL;
                }
            }

            // Substep the frame at the fixed timestep
            let steps = ((FRAME_DT / SIM_DT).round() as u32).clamp(1, MAX_SUBSTEPS);
            for _ in 0..steps {
                tick(&mut world, &input, SIM_DT);
                input.upgrade_chosen = false;
            }
            elapsed += FRAME_DT;
        }

        let state = world.progression.snapshot();
        if best.submit(&state) {
            best.store(&mut records);
        }
        match world.progression.phase() {
            ProgressionPhase::Accruing | ProgressionPhase::MaxLevel => {
                records.save_run_snapshot(&state)
            }
            // Mid level-up; resume would replay effects
            _ => records.clear_run_snapshot(),
        }
        records.save()?;

        let stats = world.stats;
        println!("Orb Surge run summary");
        println!("  sim time:        {:.1}s ({} ticks)", world.time, world.time_ticks);
        println!("  level:           {}", state.current_level);
        println!("  total XP:        {}", state.total_xp_earned);
        println!("  level-ups:       {}", level_ups.get());
        println!(
            "  pickups:         {} spawned, {} collected, {} expired, {} dropped",
            stats.pickups_spawned,
            stats.pickups_collected,
            stats.pickups_expired,
            stats.pickups_dropped
        );
        println!("  XP without pickup: {}", stats.xp_credited_directly);
        println!("  bolts fired:     {}", stats.projectiles_fired);
        println!("  best run:        {} XP (level {})", best.total_xp, best.level);
        for key in [XP_GEM, XP_CRYSTAL, BOLT] {
            let pool = if key == BOLT {
                world.projectiles.stats(key)
            } else {
                world.pickups.stats(key)
            };
            if let Some(pool) = pool {
                println!("  pool {:>2}: {:?}", key.0, pool);
            }
        }
        Ok(())
    }

    /// Drop XP from a ring of defeated enemies near the player
    fn spawn_wave(world: &mut World, wave: u32) {
        let enemies = 3 + wave.min(12);
        let center = world.player.position;
        for i in 0..enemies {
            let angle = i as f32 / enemies as f32 * std::f32::consts::TAU;
            let distance = 3.0 + (i % 3) as f32 * 2.5;
            let position = center + Vec3::new(angle.cos(), 0.0, angle.sin()) * distance;
            // Every fifth enemy is an elite dropping a crystal cluster
            if i % 5 == 4 {
                spawn_pickup_batch(world, XP_CRYSTAL, position, 10 + wave * 4, 4);
            } else {
                spawn_pickup_batch(world, XP_GEM, position, 3 + wave, 1);
            }
        }
    }
}
