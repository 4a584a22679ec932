//! Best-run tracking
//!
//! A single high-water mark across runs, persisted in the record store.

use crate::persistence::RecordStore;
use crate::sim::ProgressionState;

/// Record keys
pub const BEST_TOTAL_XP: &str = "best_total_xp";
pub const BEST_LEVEL: &str = "best_level";

/// Best run so far
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BestRun {
    /// Most XP earned in one run
    pub total_xp: u64,
    /// Level that run reached
    pub level: u32,
}

impl BestRun {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the high-water mark (empty store = no best yet)
    pub fn load(store: &RecordStore) -> Self {
        Self {
            total_xp: store.get(BEST_TOTAL_XP).unwrap_or(0),
            level: store
                .get(BEST_LEVEL)
                .and_then(|l| u32::try_from(l).ok())
                .unwrap_or(0),
        }
    }

    pub fn store(&self, store: &mut RecordStore) {
        store.set(BEST_TOTAL_XP, self.total_xp);
        store.set(BEST_LEVEL, u64::from(self.level));
    }

    /// Check if a run beats the current best
    pub fn qualifies(&self, total_xp: u64) -> bool {
        total_xp > self.total_xp
    }

    /// Submit a finished (or in-progress) run. Returns true on a new best.
    pub fn submit(&mut self, run: &ProgressionState) -> bool {
        if !self.qualifies(run.total_xp_earned) {
            return false;
        }
        log::info!(
            "New best run: {} XP (level {}), previous {} XP",
            run.total_xp_earned,
            run.current_level,
            self.total_xp
        );
        self.total_xp = run.total_xp_earned;
        self.level = run.current_level;
        true
    }

    /// Whether any run has been recorded
    pub fn is_empty(&self) -> bool {
        self.total_xp == 0
    }
}
