//! Key/value record persistence
//!
//! The core only ever persists integer counters: the best-run high-water
//! mark and an optional mid-run progression snapshot. They live in a flat
//! JSON object of `key -> u64`; no schema versioning.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::PersistenceError;
use crate::sim::ProgressionState;

/// Snapshot record keys
pub const RUN_CURRENT_XP: &str = "run.current_xp";
pub const RUN_CURRENT_LEVEL: &str = "run.current_level";
pub const RUN_TOTAL_XP: &str = "run.total_xp";

/// Flat integer record store, optionally backed by a file
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: BTreeMap<String, u64>,
    path: Option<PathBuf>,
}

impl RecordStore {
    /// Store that never touches disk
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open a file-backed store. A missing file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let path = path.into();
        let records = match std::fs::read_to_string(&path) {
            Ok(json) => {
                let records: BTreeMap<String, u64> = serde_json::from_str(&json)?;
                log::info!("Loaded {} records from {}", records.len(), path.display());
                records
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No records at {}, starting fresh", path.display());
                BTreeMap::new()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            records,
            path: Some(path),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self, key: &str) -> Option<u64> {
        self.records.get(key).copied()
    }

    pub fn set(&mut self, key: &str, value: u64) {
        self.records.insert(key.to_string(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<u64> {
        self.records.remove(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Write to the backing file (no-op for in-memory stores)
    pub fn save(&self) -> Result<(), PersistenceError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(&self.records)?;
        // Replace atomically via a sibling temp file
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        log::info!("Records saved ({} entries)", self.records.len());
        Ok(())
    }

    /// Store a settled progression snapshot for mid-run resume
    pub fn save_run_snapshot(&mut self, state: &ProgressionState) {
        self.set(RUN_CURRENT_XP, state.current_xp);
        self.set(RUN_CURRENT_LEVEL, u64::from(state.current_level));
        self.set(RUN_TOTAL_XP, state.total_xp_earned);
    }

    /// Snapshot written by [`save_run_snapshot`](Self::save_run_snapshot), if complete.
    /// Range checks happen in `Progression::restore`.
    pub fn load_run_snapshot(&self) -> Option<ProgressionState> {
        let current_xp = self.get(RUN_CURRENT_XP)?;
        let current_level = u32::try_from(self.get(RUN_CURRENT_LEVEL)?).ok()?;
        let total_xp_earned = self.get(RUN_TOTAL_XP)?;
        Some(ProgressionState {
            current_xp,
            current_level,
            total_xp_earned,
            level_up_pending: false,
            at_max_level: false,
        })
    }

    pub fn clear_run_snapshot(&mut self) {
        self.remove(RUN_CURRENT_XP);
        self.remove(RUN_CURRENT_LEVEL);
        self.remove(RUN_TOTAL_XP);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("orb_surge_{}_{}.json", name, std::process::id()))
    }

    #[test]
    fn test_file_round_trip() {
        let path = temp_path("records");
        let _ = std::fs::remove_file(&path);

        let mut store = RecordStore::open(&path).unwrap();
        assert!(store.is_empty());
        store.set("best_total_xp", 4200);
        store.save().unwrap();

        let reopened = RecordStore::open(&path).unwrap();
        assert_eq!(reopened.get("best_total_xp"), Some(4200));
        assert_eq!(reopened.len(), 1);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let path = temp_path("corrupt");
        std::fs::write(&path, "{ \"a\": -1 }").unwrap();
        assert!(matches!(
            RecordStore::open(&path),
            Err(PersistenceError::Format(_))
        ));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_run_snapshot_keys() {
        let mut store = RecordStore::in_memory();
        assert_eq!(store.load_run_snapshot(), None);

        let state = ProgressionState {
            current_xp: 197,
            current_level: 3,
            total_xp_earned: 1000,
            level_up_pending: false,
            at_max_level: false,
        };
        store.save_run_snapshot(&state);
        assert_eq!(store.get(RUN_CURRENT_LEVEL), Some(3));
        assert_eq!(store.load_run_snapshot(), Some(state));

        store.clear_run_snapshot();
        assert_eq!(store.load_run_snapshot(), None);
        assert!(store.save().is_ok());
    }
}
