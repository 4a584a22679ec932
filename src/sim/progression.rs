//! Experience and leveling state machine
//!
//! Phases:
//! - `Accruing`: normal play, XP converts into levels immediately
//! - `LevelingUp`: a level-up effect sequence is waiting out its delay;
//!   XP still accrues but further level-ups are queued
//! - `AwaitingSelection`: simulation paused until `complete_level_up`
//! - `MaxLevel`: terminal, XP is rejected
//!
//! Each level gained gets its own effect sequence and its own pause, so a
//! reward worth three levels needs three `complete_level_up` calls.

use serde::{Deserialize, Serialize};

use super::curve::Curve;
use super::pause::PauseCoordinator;
use super::schedule::Scheduler;
use crate::error::{ConfigError, InputError};

/// Health surface the level-up heal talks to
pub trait Vitals {
    fn current_health(&self) -> u32;
    fn max_health(&self) -> u32;
    fn heal(&mut self, amount: u32);
}

/// Level-up feedback tunables
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelUpConfig {
    /// Pause for an upgrade selection after every level gained
    pub pause_on_level_up: bool,
    /// Real seconds between the level-up and the pause
    pub pause_delay: f32,
    /// Restore the player to full health on level-up
    pub heal_on_level_up: bool,
    /// Time scale during the level-up dip, within (0, 1]
    pub time_slow_scale: f32,
    /// Real seconds the dip lasts (0 = no dip)
    pub time_slow_duration: f32,
}

impl Default for LevelUpConfig {
    fn default() -> Self {
        Self {
            pause_on_level_up: true,
            pause_delay: 0.5,
            heal_on_level_up: true,
            time_slow_scale: 0.3,
            time_slow_duration: 0.4,
        }
    }
}

impl LevelUpConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.pause_delay.is_finite() || self.pause_delay < 0.0 {
            return Err(ConfigError::Negative {
                field: "pause_delay",
                value: self.pause_delay,
            });
        }
        if !(self.time_slow_scale > 0.0 && self.time_slow_scale <= 1.0) {
            return Err(ConfigError::TimeSlowScale(self.time_slow_scale));
        }
        if !self.time_slow_duration.is_finite() || self.time_slow_duration < 0.0 {
            return Err(ConfigError::Negative {
                field: "time_slow_duration",
                value: self.time_slow_duration,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgressionPhase {
    Accruing,
    LevelingUp,
    AwaitingSelection,
    MaxLevel,
}

/// Leveling state (also the in-run snapshot)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionState {
    pub current_xp: u64,
    pub current_level: u32,
    pub total_xp_earned: u64,
    pub level_up_pending: bool,
    pub at_max_level: bool,
}

impl ProgressionState {
    fn fresh(max_level: u32) -> Self {
        Self {
            current_xp: 0,
            current_level: 1,
            total_xp_earned: 0,
            level_up_pending: false,
            at_max_level: max_level == 1,
        }
    }
}

/// Notifications delivered to observers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressionEvent {
    XpChanged { current_xp: u64, needed_for_next: u64 },
    LevelUp { level: u32 },
    /// Instant feedback for one level (VFX/SFX hooks); `healed` is the HP restored
    LevelUpEffects { level: u32, healed: u32 },
    /// Simulation is paused and waiting for an upgrade choice
    SelectionRequested { level: u32 },
    MaxLevelReached,
}

pub type ObserverId = u64;

type Observer = Box<dyn FnMut(&ProgressionEvent)>;

#[derive(Default)]
struct Observers {
    next_id: ObserverId,
    entries: Vec<(ObserverId, Observer)>,
}

impl Observers {
    fn notify(&mut self, event: ProgressionEvent) {
        for (_, observer) in self.entries.iter_mut() {
            observer(&event);
        }
    }
}

impl std::fmt::Debug for Observers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("count", &self.entries.len())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ProgressionTask {
    PauseForSelection { level: u32 },
    EndTimeDip { generation: u64 },
}

#[derive(Debug)]
pub struct Progression {
    curve: Curve,
    effects: LevelUpConfig,
    state: ProgressionState,
    phase: ProgressionPhase,
    observers: Observers,
    tasks: Scheduler<ProgressionTask>,
    pause: PauseCoordinator,
    /// Unscaled seconds since construction; drives delays and dips
    clock: f64,
}

impl Progression {
    pub fn new(curve: Curve, effects: LevelUpConfig) -> Result<Self, ConfigError> {
        effects.validate()?;
        let state = ProgressionState::fresh(curve.max_level());
        Ok(Self {
            curve,
            effects,
            state,
            phase: Self::settled_phase(&state),
            observers: Observers::default(),
            tasks: Scheduler::new(),
            pause: PauseCoordinator::new(),
            clock: 0.0,
        })
    }

    pub fn curve(&self) -> &Curve {
        &self.curve
    }

    pub fn state(&self) -> &ProgressionState {
        &self.state
    }

    pub fn phase(&self) -> ProgressionPhase {
        self.phase
    }

    pub fn level(&self) -> u32 {
        self.state.current_level
    }

    pub fn current_xp(&self) -> u64 {
        self.state.current_xp
    }

    pub fn total_xp_earned(&self) -> u64 {
        self.state.total_xp_earned
    }

    pub fn level_up_pending(&self) -> bool {
        self.state.level_up_pending
    }

    pub fn is_max_level(&self) -> bool {
        self.state.at_max_level
    }

    /// XP the next level costs (0 at max level)
    pub fn needed_for_next(&self) -> u64 {
        self.curve.xp_to_next(self.state.current_level)
    }

    /// Composed simulation time scale
    pub fn time_scale(&self) -> f32 {
        self.pause.time_scale()
    }

    pub fn pause(&self) -> &PauseCoordinator {
        &self.pause
    }

    /// Other pause sources compose through holds and the baseline
    pub fn pause_mut(&mut self) -> &mut PauseCoordinator {
        &mut self.pause
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&ProgressionEvent) + 'static) -> ObserverId {
        let id = self.observers.next_id;
        self.observers.next_id += 1;
        self.observers.entries.push((id, Box::new(observer)));
        id
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.entries.len();
        self.observers.entries.retain(|(i, _)| *i != id);
        self.observers.entries.len() != before
    }

    pub fn clear_observers(&mut self) {
        self.observers.entries.clear();
    }

    /// Credit a reward
    pub fn add_xp(&mut self, amount: u32, vitals: &mut dyn Vitals) -> Result<(), InputError> {
        if amount == 0 {
            log::warn!("Rejected zero XP reward");
            return Err(InputError::ZeroXp);
        }
        if self.state.at_max_level {
            log::debug!("Rejected {} XP at max level", amount);
            return Err(InputError::AtMaxLevel);
        }

        let amount = u64::from(amount);
        self.state.current_xp = self.state.current_xp.saturating_add(amount);
        self.state.total_xp_earned = self.state.total_xp_earned.saturating_add(amount);
        self.notify_xp_changed();

        if self.phase == ProgressionPhase::Accruing {
            self.process_level_ups(vitals);
        }
        Ok(())
    }

    /// Called by the upgrade selector once a choice was made.
    /// Returns false (and changes nothing) when no selection was pending.
    pub fn complete_level_up(&mut self, vitals: &mut dyn Vitals) -> bool {
        if !self.state.level_up_pending {
            log::debug!("complete_level_up with no pending level-up");
            return false;
        }
        self.state.level_up_pending = false;
        self.pause.resume_from_level_up();
        self.phase = Self::settled_phase(&self.state);
        log::info!("Level {} selection complete", self.state.current_level);

        // Thresholds queued behind the pause (same reward or XP earned meanwhile)
        self.process_level_ups(vitals);
        true
    }

    /// Advance the unscaled clock and fire due continuations
    pub fn update(&mut self, real_dt: f32) {
        if real_dt.is_finite() && real_dt > 0.0 {
            self.clock += f64::from(real_dt);
        }
        while let Some(task) = self.tasks.pop_due(self.clock) {
            match task {
                ProgressionTask::PauseForSelection { level } => {
                    if self.phase == ProgressionPhase::LevelingUp {
                        self.enter_selection(level);
                    }
                }
                ProgressionTask::EndTimeDip { generation } => self.pause.end_dip(generation),
            }
        }
    }

    /// Debug/test: jump straight to a level with zero XP
    pub fn set_level(&mut self, level: u32) -> Result<(), InputError> {
        let max = self.curve.max_level();
        if level < 1 || level > max {
            log::warn!("Rejected set_level({}) outside 1..={}", level, max);
            return Err(InputError::LevelOutOfRange { got: level, max });
        }
        self.drop_pending_effects();
        self.state.current_level = level;
        self.state.current_xp = 0;
        self.state.level_up_pending = false;
        self.state.at_max_level = level == max;
        self.phase = Self::settled_phase(&self.state);
        self.notify_xp_changed();
        Ok(())
    }

    /// Back to level 1 (run restart)
    pub fn reset(&mut self) {
        self.drop_pending_effects();
        self.state = ProgressionState::fresh(self.curve.max_level());
        self.phase = Self::settled_phase(&self.state);
        self.notify_xp_changed();
    }

    /// Copy of the current state for persistence
    pub fn snapshot(&self) -> ProgressionState {
        self.state
    }

    /// Load a settled snapshot. Pending selections are not restored.
    pub fn restore(&mut self, snapshot: ProgressionState) -> Result<(), InputError> {
        let max = self.curve.max_level();
        let level = snapshot.current_level;
        if level < 1 || level > max {
            log::warn!("Rejected snapshot with level {}", level);
            return Err(InputError::LevelOutOfRange { got: level, max });
        }
        let at_max = level == max;
        let consistent = if at_max {
            snapshot.current_xp == 0
        } else {
            snapshot.current_xp < self.curve.threshold_for_level(level + 1)
        };
        if !consistent {
            log::warn!(
                "Rejected snapshot with {} XP at level {}",
                snapshot.current_xp,
                level
            );
            return Err(InputError::InconsistentSnapshot {
                level,
                xp: snapshot.current_xp,
            });
        }

        self.drop_pending_effects();
        self.state = ProgressionState {
            current_xp: snapshot.current_xp,
            current_level: level,
            total_xp_earned: snapshot.total_xp_earned.max(snapshot.current_xp),
            level_up_pending: false,
            at_max_level: at_max,
        };
        self.phase = Self::settled_phase(&self.state);
        self.notify_xp_changed();
        Ok(())
    }

    fn settled_phase(state: &ProgressionState) -> ProgressionPhase {
        if state.at_max_level {
            ProgressionPhase::MaxLevel
        } else {
            ProgressionPhase::Accruing
        }
    }

    fn process_level_ups(&mut self, vitals: &mut dyn Vitals) {
        let start_level = self.state.current_level;
        while self.phase == ProgressionPhase::Accruing && !self.state.at_max_level {
            let needed = self.curve.threshold_for_level(self.state.current_level + 1);
            if self.state.current_xp < needed {
                break;
            }
            self.state.current_xp -= needed;
            self.state.current_level += 1;
            let level = self.state.current_level;
            log::info!("Level up: {}", level);
            self.observers.notify(ProgressionEvent::LevelUp { level });

            self.run_level_up_effects(level, vitals);

            if level >= self.curve.max_level() {
                self.state.current_xp = 0;
                self.state.at_max_level = true;
                log::info!("Max level {} reached", level);
                self.observers.notify(ProgressionEvent::MaxLevelReached);
            }
        }
        if self.state.at_max_level && self.phase == ProgressionPhase::Accruing {
            self.phase = ProgressionPhase::MaxLevel;
        }
        if self.state.current_level != start_level {
            self.notify_xp_changed();
        }
    }

    fn run_level_up_effects(&mut self, level: u32, vitals: &mut dyn Vitals) {
        let mut healed = 0;
        if self.effects.heal_on_level_up {
            healed = vitals.max_health().saturating_sub(vitals.current_health());
            if healed > 0 {
                vitals.heal(healed);
            }
        }
        self.observers
            .notify(ProgressionEvent::LevelUpEffects { level, healed });

        if self.effects.time_slow_scale < 1.0 && self.effects.time_slow_duration > 0.0 {
            let generation = self.pause.begin_dip(self.effects.time_slow_scale);
            self.tasks.schedule(
                self.clock + f64::from(self.effects.time_slow_duration),
                ProgressionTask::EndTimeDip { generation },
            );
        }

        if self.effects.pause_on_level_up {
            self.phase = ProgressionPhase::LevelingUp;
            if self.effects.pause_delay > 0.0 {
                self.tasks.schedule(
                    self.clock + f64::from(self.effects.pause_delay),
                    ProgressionTask::PauseForSelection { level },
                );
            } else {
                self.enter_selection(level);
            }
        }
    }

    fn enter_selection(&mut self, level: u32) {
        self.state.level_up_pending = true;
        self.pause.pause_for_level_up();
        self.phase = ProgressionPhase::AwaitingSelection;
        log::info!("Awaiting upgrade selection for level {}", level);
        self.observers
            .notify(ProgressionEvent::SelectionRequested { level });
    }

    fn drop_pending_effects(&mut self) {
        self.tasks.clear();
        self.pause.reset_progression_effects();
    }

    fn notify_xp_changed(&mut self) {
        let event = ProgressionEvent::XpChanged {
            current_xp: self.state.current_xp,
            needed_for_next: self.needed_for_next(),
        };
        self.observers.notify(event);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::sim::curve::CurveConfig;
    use proptest::prelude::*;

    struct Health {
        current: u32,
        max: u32,
    }

    impl Vitals for Health {
        fn current_health(&self) -> u32 {
            self.current
        }
        fn max_health(&self) -> u32 {
            self.max
        }
        fn heal(&mut self, amount: u32) {
            self.current = (self.current + amount).min(self.max);
        }
    }

    fn full_health() -> Health {
        Health {
            current: 100,
            max: 100,
        }
    }

    fn no_pause() -> LevelUpConfig {
        LevelUpConfig {
            pause_on_level_up: false,
            pause_delay: 0.0,
            heal_on_level_up: false,
            time_slow_scale: 1.0,
            time_slow_duration: 0.0,
        }
    }

    fn with_pause(delay: f32) -> LevelUpConfig {
        LevelUpConfig {
            pause_on_level_up: true,
            pause_delay: delay,
            ..no_pause()
        }
    }

    fn progression(max_level: u32, effects: LevelUpConfig) -> Progression {
        let curve = Curve::new(CurveConfig {
            base_xp: 100.0,
            exponent: 1.5,
            max_level,
        })
        .unwrap();
        Progression::new(curve, effects).unwrap()
    }

    fn record(p: &mut Progression) -> Rc<RefCell<Vec<ProgressionEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        p.subscribe(move |e| sink.borrow_mut().push(*e));
        events
    }

    fn level_ups(events: &[ProgressionEvent]) -> Vec<u32> {
        events
            .iter()
            .filter_map(|e| match e {
                ProgressionEvent::LevelUp { level } => Some(*level),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_single_level_up_exact_threshold() {
        let mut p = progression(30, no_pause());
        let events = record(&mut p);
        p.add_xp(283, &mut full_health()).unwrap();

        assert_eq!(p.level(), 2);
        assert_eq!(p.current_xp(), 0);
        assert_eq!(p.total_xp_earned(), 283);
        assert_eq!(level_ups(&events.borrow()), vec![2]);
        assert_eq!(
            events.borrow()[0],
            ProgressionEvent::XpChanged {
                current_xp: 283,
                needed_for_next: 283
            }
        );
    }

    #[test]
    fn test_multi_level_up_without_pause() {
        let mut p = progression(30, no_pause());
        let events = record(&mut p);
        p.add_xp(1000, &mut full_health()).unwrap();

        // 1000 - 283 - 520 = 197 < 800
        assert_eq!(p.level(), 3);
        assert_eq!(p.current_xp(), 197);
        assert_eq!(level_ups(&events.borrow()), vec![2, 3]);
        assert_eq!(p.phase(), ProgressionPhase::Accruing);
    }

    #[test]
    fn test_multi_level_up_pauses_once_per_level() {
        let mut p = progression(30, with_pause(0.5));
        let events = record(&mut p);
        let mut health = full_health();

        p.add_xp(1000, &mut health).unwrap();
        assert_eq!(p.level(), 2);
        assert_eq!(p.current_xp(), 717);
        assert_eq!(p.phase(), ProgressionPhase::LevelingUp);
        assert!(!p.level_up_pending());
        assert_eq!(p.time_scale(), 1.0);

        p.update(0.25);
        assert_eq!(p.phase(), ProgressionPhase::LevelingUp);
        p.update(0.25);
        assert_eq!(p.phase(), ProgressionPhase::AwaitingSelection);
        assert!(p.level_up_pending());
        assert_eq!(p.time_scale(), 0.0);

        // XP accrues while paused but does not level
        p.add_xp(50, &mut health).unwrap();
        assert_eq!(p.current_xp(), 767);
        assert_eq!(p.level(), 2);

        assert!(p.complete_level_up(&mut health));
        assert_eq!(p.level(), 3);
        assert_eq!(p.current_xp(), 247);
        assert_eq!(p.phase(), ProgressionPhase::LevelingUp);
        assert_eq!(p.time_scale(), 1.0);

        p.update(0.5);
        assert!(p.level_up_pending());
        assert!(p.complete_level_up(&mut health));
        assert_eq!(p.phase(), ProgressionPhase::Accruing);
        assert_eq!(p.time_scale(), 1.0);

        let events = events.borrow();
        assert_eq!(level_ups(&events), vec![2, 3]);
        let selections = events
            .iter()
            .filter(|e| matches!(e, ProgressionEvent::SelectionRequested { .. }))
            .count();
        assert_eq!(selections, 2);
    }

    #[test]
    fn test_complete_without_pending_is_noop() {
        let mut p = progression(30, with_pause(0.0));
        let mut health = full_health();
        p.add_xp(100, &mut health).unwrap();
        let before = *p.state();
        assert!(!p.complete_level_up(&mut health));
        assert_eq!(*p.state(), before);
        assert_eq!(p.phase(), ProgressionPhase::Accruing);
    }

    #[test]
    fn test_zero_delay_pauses_immediately() {
        let mut p = progression(30, with_pause(0.0));
        p.add_xp(300, &mut full_health()).unwrap();
        assert_eq!(p.phase(), ProgressionPhase::AwaitingSelection);
        assert!(p.level_up_pending());
        assert_eq!(p.time_scale(), 0.0);
    }

    #[test]
    fn test_rejects_zero_xp() {
        let mut p = progression(30, no_pause());
        let events = record(&mut p);
        assert_eq!(p.add_xp(0, &mut full_health()), Err(InputError::ZeroXp));
        assert_eq!(p.total_xp_earned(), 0);
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_max_level_clamps_and_rejects() {
        let mut p = progression(4, no_pause());
        let events = record(&mut p);
        let mut health = full_health();
        p.add_xp(100_000, &mut health).unwrap();

        assert_eq!(p.level(), 4);
        assert_eq!(p.current_xp(), 0);
        assert!(p.is_max_level());
        assert_eq!(p.phase(), ProgressionPhase::MaxLevel);
        assert_eq!(p.needed_for_next(), 0);
        assert_eq!(
            events
                .borrow()
                .iter()
                .filter(|e| **e == ProgressionEvent::MaxLevelReached)
                .count(),
            1
        );

        assert_eq!(p.add_xp(10, &mut health), Err(InputError::AtMaxLevel));
        assert_eq!(p.total_xp_earned(), 100_000);
    }

    #[test]
    fn test_max_level_pause_then_terminal() {
        let mut p = progression(2, with_pause(0.0));
        let mut health = full_health();
        p.add_xp(500, &mut health).unwrap();
        assert!(p.is_max_level());
        assert_eq!(p.phase(), ProgressionPhase::AwaitingSelection);
        assert!(p.complete_level_up(&mut health));
        assert_eq!(p.phase(), ProgressionPhase::MaxLevel);
    }

    #[test]
    fn test_heal_and_time_dip() {
        let effects = LevelUpConfig {
            pause_on_level_up: false,
            pause_delay: 0.0,
            heal_on_level_up: true,
            time_slow_scale: 0.5,
            time_slow_duration: 1.0,
        };
        let mut p = progression(30, effects);
        p.pause_mut().set_baseline(0.8);
        let events = record(&mut p);
        let mut health = Health {
            current: 40,
            max: 100,
        };
        p.add_xp(283, &mut health).unwrap();

        assert_eq!(health.current, 100);
        assert!(events.borrow().contains(&ProgressionEvent::LevelUpEffects {
            level: 2,
            healed: 60
        }));
        assert!((p.time_scale() - 0.4).abs() < 1e-6);
        p.update(1.0);
        assert!((p.time_scale() - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_external_hold_survives_selection() {
        let mut p = progression(30, with_pause(0.0));
        let mut health = full_health();
        p.pause_mut().hold();
        p.add_xp(283, &mut health).unwrap();
        p.complete_level_up(&mut health);
        assert_eq!(p.time_scale(), 0.0);
        p.pause_mut().release_hold();
        assert_eq!(p.time_scale(), 1.0);
    }

    #[test]
    fn test_set_level_and_reset() {
        let mut p = progression(10, with_pause(0.0));
        let events = record(&mut p);
        assert_eq!(
            p.set_level(11),
            Err(InputError::LevelOutOfRange { got: 11, max: 10 })
        );
        assert_eq!(p.set_level(0), Err(InputError::LevelOutOfRange { got: 0, max: 10 }));

        p.set_level(5).unwrap();
        assert_eq!(p.level(), 5);
        assert_eq!(
            *events.borrow(),
            vec![ProgressionEvent::XpChanged {
                current_xp: 0,
                needed_for_next: p.curve().threshold_for_level(6)
            }]
        );

        p.set_level(10).unwrap();
        assert!(p.is_max_level());
        assert_eq!(p.phase(), ProgressionPhase::MaxLevel);

        p.reset();
        assert_eq!(p.level(), 1);
        assert_eq!(p.total_xp_earned(), 0);
        assert_eq!(p.phase(), ProgressionPhase::Accruing);
    }

    #[test]
    fn test_reset_clears_pending_pause() {
        let mut p = progression(30, with_pause(0.5));
        let mut health = full_health();
        p.add_xp(283, &mut health).unwrap();
        p.reset();
        p.update(1.0);
        assert!(!p.level_up_pending());
        assert_eq!(p.time_scale(), 1.0);
    }

    #[test]
    fn test_unsubscribe() {
        let mut p = progression(30, no_pause());
        let count = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&count);
        let id = p.subscribe(move |_| *sink.borrow_mut() += 1);
        p.add_xp(10, &mut full_health()).unwrap();
        assert!(p.unsubscribe(id));
        assert!(!p.unsubscribe(id));
        p.add_xp(10, &mut full_health()).unwrap();
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_snapshot_restore() {
        let mut p = progression(30, no_pause());
        p.add_xp(1000, &mut full_health()).unwrap();
        let snap = p.snapshot();

        let mut q = progression(30, no_pause());
        q.restore(snap).unwrap();
        assert_eq!(q.snapshot(), snap);

        let bogus = ProgressionState {
            current_xp: 5000,
            ..snap
        };
        assert_eq!(
            q.restore(bogus),
            Err(InputError::InconsistentSnapshot { level: 3, xp: 5000 })
        );
        assert_eq!(q.snapshot(), snap);
    }

    proptest! {
        #[test]
        fn prop_enough_xp_reaches_max_level(
            chunks in proptest::collection::vec(1u32..3000, 0..40),
            pause in any::<bool>(),
        ) {
            let effects = if pause { with_pause(0.0) } else { no_pause() };
            let mut p = progression(10, effects);
            let mut health = full_health();
            let needed = p.curve().cumulative_threshold(10) as u32;

            for amount in chunks.into_iter().chain(std::iter::once(needed)) {
                if p.is_max_level() {
                    break;
                }
                p.add_xp(amount, &mut health).unwrap();
                while p.complete_level_up(&mut health) {}
            }

            prop_assert_eq!(p.level(), 10);
            prop_assert!(p.is_max_level());
            prop_assert_eq!(p.current_xp(), 0);
            prop_assert_eq!(p.phase(), ProgressionPhase::MaxLevel);
        }

        #[test]
        fn prop_settled_xp_below_next_threshold(
            chunks in proptest::collection::vec(1u32..2000, 1..30),
        ) {
            let mut p = progression(30, with_pause(0.0));
            let mut health = full_health();
            for amount in chunks {
                if p.add_xp(amount, &mut health).is_err() {
                    break;
                }
                while p.complete_level_up(&mut health) {}
                if !p.is_max_level() {
                    prop_assert!(p.current_xp() < p.needed_for_next());
                }
            }
        }
    }
}
