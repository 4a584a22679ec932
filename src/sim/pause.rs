//! Simulation time scale
//!
//! Several sources want to slow or stop the simulation at once: the level-up
//! pause, short time dips played as level-up feedback, unrelated slow motion
//! and external pauses (menus). They compose here instead of overwriting a
//! single global value:
//!
//! `time_scale = 0` while the level-up pause or any hold is active,
//! otherwise `baseline * dip`.
//!
//! Only the progression state machine may toggle the level-up pause and
//! dips; those methods are crate-private.

#[derive(Debug, Clone, Copy, PartialEq)]
struct TimeDip {
    scale: f32,
    generation: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PauseCoordinator {
    baseline: f32,
    dip: Option<TimeDip>,
    dip_generation: u64,
    level_up_paused: bool,
    holds: u32,
}

impl Default for PauseCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl PauseCoordinator {
    pub fn new() -> Self {
        Self {
            baseline: 1.0,
            dip: None,
            dip_generation: 0,
            level_up_paused: false,
            holds: 0,
        }
    }

    /// Composed simulation time scale
    pub fn time_scale(&self) -> f32 {
        if self.is_paused() {
            0.0
        } else {
            self.running_scale()
        }
    }

    pub fn is_paused(&self) -> bool {
        self.level_up_paused || self.holds > 0
    }

    pub fn is_level_up_paused(&self) -> bool {
        self.level_up_paused
    }

    /// Baseline scale used by unrelated slow-motion effects
    pub fn baseline(&self) -> f32 {
        self.baseline
    }

    pub fn set_baseline(&mut self, scale: f32) {
        if !scale.is_finite() || scale < 0.0 {
            log::warn!("Ignoring invalid baseline time scale {}", scale);
            return;
        }
        self.baseline = scale;
    }

    /// External pause source (menus, focus loss). Each hold needs a matching release.
    pub fn hold(&mut self) {
        self.holds += 1;
    }

    pub fn release_hold(&mut self) {
        if self.holds == 0 {
            log::warn!("release_hold without a matching hold");
            return;
        }
        self.holds -= 1;
    }

    fn running_scale(&self) -> f32 {
        self.baseline * self.dip.map_or(1.0, |d| d.scale)
    }

    /// Stop the simulation for a level-up selection. Returns false if already paused.
    pub(crate) fn pause_for_level_up(&mut self) -> bool {
        if self.level_up_paused {
            return false;
        }
        self.level_up_paused = true;
        log::debug!("Level-up pause (scale {} -> 0)", self.running_scale());
        true
    }

    /// Lift the level-up pause. Returns false if it was not active.
    /// The scale comes back as whatever baseline and dip are in effect now,
    /// including baseline changes made during the pause.
    pub(crate) fn resume_from_level_up(&mut self) -> bool {
        if !self.level_up_paused {
            return false;
        }
        self.level_up_paused = false;
        log::debug!("Level-up resume (scale {})", self.time_scale());
        true
    }

    /// Start a temporary slowdown. The returned generation ends it.
    pub(crate) fn begin_dip(&mut self, scale: f32) -> u64 {
        self.dip_generation += 1;
        self.dip = Some(TimeDip {
            scale,
            generation: self.dip_generation,
        });
        self.dip_generation
    }

    /// End a dip unless a newer one replaced it
    pub(crate) fn end_dip(&mut self, generation: u64) {
        if self.dip.is_some_and(|d| d.generation == generation) {
            self.dip = None;
        }
    }

    /// Drop every progression-owned modifier (run reset)
    pub(crate) fn reset_progression_effects(&mut self) {
        self.level_up_paused = false;
        self.dip = None;
    }
}
