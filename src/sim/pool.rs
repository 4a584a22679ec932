//! Reusable object pools
//!
//! Pickups and projectiles are spawned and destroyed constantly, so both are
//! served from pools of pre-built instances. Each pool is keyed by the
//! prototype it clones new instances from.
//!
//! Ownership rules:
//! - The pool owns every instance it ever created.
//! - `acquire` lends an instance out and hands back a [`PoolHandle`].
//! - `release` takes it back. Handles carry a generation, so releasing the
//!   same handle twice (or releasing a stale one) is a no-op.
//! - Every created slot is either in the available queue or the active list,
//!   never both and never neither.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Identity of the prototype a pool clones instances from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PrototypeKey(pub u32);

/// What a freshly initialized instance wants to happen next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Stay active with the requester
    Keep,
    /// Go straight back to the pool (e.g. nothing left to do)
    Release,
}

/// Lifecycle hooks for pooled instances
pub trait Poolable: Clone {
    /// Arguments used to reinitialize an instance on acquire
    type Init;

    /// Reset the instance for a new spawn. Runs after the pool has already
    /// marked the slot active.
    fn on_acquire(&mut self, init: Self::Init) -> Disposition;

    /// Deinitialize before the instance goes back to the available queue
    fn on_release(&mut self) {}
}

/// Pool sizing and growth policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Instances created eagerly at construction
    pub initial_size: u32,
    /// Grow when exhausted
    pub auto_expand: bool,
    /// Instances created per expansion
    pub expand_amount: u32,
    /// Hard ceiling on instances (None = unbounded)
    pub max_size: Option<u32>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            initial_size: 10,
            auto_expand: true,
            expand_amount: 50,
            max_size: None,
        }
    }
}

impl PoolConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_size < 1 {
            return Err(ConfigError::InitialSize);
        }
        if self.expand_amount < 1 {
            return Err(ConfigError::ExpandAmount);
        }
        if let Some(max) = self.max_size {
            if max < self.initial_size {
                return Err(ConfigError::MaxSize {
                    max,
                    initial: self.initial_size,
                });
            }
        }
        Ok(())
    }
}

/// Borrowed reference to an active pooled instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolHandle {
    pub key: PrototypeKey,
    index: u32,
    generation: u32,
}

impl PoolHandle {
    /// Slot index inside the owning pool
    pub fn index(&self) -> u32 {
        self.index
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    Available,
    Active,
}

#[derive(Debug)]
struct PoolSlot<T> {
    item: T,
    state: SlotState,
    generation: u32,
    /// Position in the active list while active
    active_pos: usize,
}

/// Counters for diagnostics and tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub available: usize,
    pub active: usize,
    pub total_created: usize,
    pub expansions: u32,
    pub exhaustions: u32,
}

/// Pool of instances cloned from one prototype
#[derive(Debug)]
pub struct ObjectPool<T: Poolable> {
    key: PrototypeKey,
    prototype: T,
    config: PoolConfig,
    slots: Vec<PoolSlot<T>>,
    available: VecDeque<u32>,
    active: Vec<u32>,
    expansions: u32,
    exhaustions: u32,
}

impl<T: Poolable> ObjectPool<T> {
    /// Build a pool and eagerly create `initial_size` instances
    pub fn new(key: PrototypeKey, prototype: T, config: PoolConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut pool = Self {
            key,
            prototype,
            config,
            slots: Vec::with_capacity(config.initial_size as usize),
            available: VecDeque::with_capacity(config.initial_size as usize),
            active: Vec::with_capacity(config.initial_size as usize),
            expansions: 0,
            exhaustions: 0,
        };
        pool.create_instances(config.initial_size);
        Ok(pool)
    }

    pub fn key(&self) -> PrototypeKey {
        self.key
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Lend out an instance, growing the pool if the policy allows
    pub fn acquire(&mut self, init: T::Init) -> Option<PoolHandle> {
        let index = match self.pop_available() {
            Some(index) => index,
            None => {
                if self.expand() == 0 {
                    self.exhaustions += 1;
                    log::warn!(
                        "Pool {:?} exhausted ({} active, no expansion headroom)",
                        self.key,
                        self.active.len()
                    );
                    return None;
                }
                // Single retry against the freshly expanded queue
                self.pop_available()?
            }
        };

        let active_pos = self.active.len();
        self.active.push(index);
        let slot = &mut self.slots[index as usize];
        slot.state = SlotState::Active;
        slot.active_pos = active_pos;
        let handle = PoolHandle {
            key: self.key,
            index,
            generation: slot.generation,
        };

        // Bookkeeping is complete, so the instance may ask to go straight back
        if slot.item.on_acquire(init) == Disposition::Release {
            log::debug!("Pool {:?} slot {} released during init", self.key, index);
            self.release(handle);
        }
        Some(handle)
    }

    /// Return an instance. Stale or repeated handles are ignored.
    pub fn release(&mut self, handle: PoolHandle) {
        if handle.key != self.key {
            invariant_violation(format_args!(
                "handle for {:?} released into pool {:?}",
                handle.key, self.key
            ));
            return;
        }
        let Some(slot) = self.slots.get_mut(handle.index as usize) else {
            invariant_violation(format_args!(
                "pool {:?} has no slot {}",
                self.key, handle.index
            ));
            return;
        };
        if slot.generation != handle.generation || slot.state != SlotState::Active {
            log::debug!("Pool {:?} ignored stale release of slot {}", self.key, handle.index);
            return;
        }

        slot.item.on_release();
        slot.state = SlotState::Available;
        slot.generation = slot.generation.wrapping_add(1);
        let pos = slot.active_pos;

        // Unlink from the active list, patching the slot that moves into `pos`
        if self.active.get(pos) != Some(&handle.index) {
            invariant_violation(format_args!(
                "pool {:?} slot {} missing from the active list",
                self.key, handle.index
            ));
            self.active.retain(|&i| i != handle.index);
            self.reindex_active();
        } else {
            self.active.swap_remove(pos);
            if let Some(&moved) = self.active.get(pos) {
                self.slots[moved as usize].active_pos = pos;
            }
        }
        self.available.push_back(handle.index);
    }

    /// Force every active instance back into the pool
    pub fn clear(&mut self) {
        while let Some(&index) = self.active.last() {
            let handle = PoolHandle {
                key: self.key,
                index,
                generation: self.slots[index as usize].generation,
            };
            self.release(handle);
        }
    }

    pub fn is_active(&self, handle: PoolHandle) -> bool {
        handle.key == self.key
            && self
                .slots
                .get(handle.index as usize)
                .is_some_and(|s| s.state == SlotState::Active && s.generation == handle.generation)
    }

    pub fn get(&self, handle: PoolHandle) -> Option<&T> {
        if self.is_active(handle) {
            self.slots.get(handle.index as usize).map(|s| &s.item)
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        if self.is_active(handle) {
            self.slots.get_mut(handle.index as usize).map(|s| &mut s.item)
        } else {
            None
        }
    }

    /// Handles of every active instance
    pub fn active_handles(&self) -> impl Iterator<Item = PoolHandle> + '_ {
        self.active.iter().map(move |&index| PoolHandle {
            key: self.key,
            index,
            generation: self.slots[index as usize].generation,
        })
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn available_count(&self) -> usize {
        self.available.len()
    }

    pub fn total_created(&self) -> usize {
        self.slots.len()
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            available: self.available.len(),
            active: self.active.len(),
            total_created: self.slots.len(),
            expansions: self.expansions,
            exhaustions: self.exhaustions,
        }
    }

    /// Verify that every slot sits in exactly one collection
    pub fn check_invariants(&self) -> bool {
        if self.available.len() + self.active.len() != self.slots.len() {
            return false;
        }
        let mut seen = vec![false; self.slots.len()];
        for &index in &self.available {
            let i = index as usize;
            if seen[i] || self.slots[i].state != SlotState::Available {
                return false;
            }
            seen[i] = true;
        }
        for (pos, &index) in self.active.iter().enumerate() {
            let i = index as usize;
            let slot = &self.slots[i];
            if seen[i] || slot.state != SlotState::Active || slot.active_pos != pos {
                return false;
            }
            seen[i] = true;
        }
        true
    }

    fn pop_available(&mut self) -> Option<u32> {
        while let Some(index) = self.available.pop_front() {
            if self.slots[index as usize].state == SlotState::Available {
                return Some(index);
            }
            invariant_violation(format_args!(
                "pool {:?} slot {} queued while active",
                self.key, index
            ));
        }
        None
    }

    /// Grow by one batch, clamped to `max_size`. Returns instances created.
    fn expand(&mut self) -> u32 {
        if !self.config.auto_expand {
            return 0;
        }
        let total = self.slots.len() as u32;
        let amount = match self.config.max_size {
            Some(max) => self.config.expand_amount.min(max.saturating_sub(total)),
            None => self.config.expand_amount,
        };
        if amount == 0 {
            return 0;
        }
        self.create_instances(amount);
        self.expansions += 1;
        log::info!(
            "Pool {:?} expanded by {} (total {})",
            self.key,
            amount,
            self.slots.len()
        );
        amount
    }

    fn create_instances(&mut self, count: u32) {
        self.slots.reserve(count as usize);
        for _ in 0..count {
            let index = self.slots.len() as u32;
            self.slots.push(PoolSlot {
                item: self.prototype.clone(),
                state: SlotState::Available,
                generation: 0,
                active_pos: 0,
            });
            self.available.push_back(index);
        }
    }

    fn reindex_active(&mut self) {
        for (pos, &index) in self.active.iter().enumerate() {
            self.slots[index as usize].active_pos = pos;
        }
    }
}

/// Programming error: loud in debug builds, logged and skipped in release
fn invariant_violation(msg: std::fmt::Arguments<'_>) {
    log::error!("Pool invariant violated: {}", msg);
    debug_assert!(false, "pool invariant violated: {msg}");
}

/// Pools of one instance type, keyed by prototype
#[derive(Debug)]
pub struct PoolRegistry<T: Poolable> {
    pools: BTreeMap<PrototypeKey, ObjectPool<T>>,
}

impl<T: Poolable> Default for PoolRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Poolable> PoolRegistry<T> {
    pub fn new() -> Self {
        Self {
            pools: BTreeMap::new(),
        }
    }

    /// Create the pool for a prototype
    pub fn register(
        &mut self,
        key: PrototypeKey,
        prototype: T,
        config: PoolConfig,
    ) -> Result<(), ConfigError> {
        if self.pools.contains_key(&key) {
            return Err(ConfigError::DuplicatePrototype(key.0));
        }
        let pool = ObjectPool::new(key, prototype, config)?;
        self.pools.insert(key, pool);
        Ok(())
    }

    pub fn pool(&self, key: PrototypeKey) -> Option<&ObjectPool<T>> {
        self.pools.get(&key)
    }

    pub fn acquire(&mut self, key: PrototypeKey, init: T::Init) -> Option<PoolHandle> {
        match self.pools.get_mut(&key) {
            Some(pool) => pool.acquire(init),
            None => {
                log::warn!("No pool registered for prototype {:?}", key);
                None
            }
        }
    }

    pub fn release(&mut self, handle: PoolHandle) {
        match self.pools.get_mut(&handle.key) {
            Some(pool) => pool.release(handle),
            None => invariant_violation(format_args!(
                "release for unregistered prototype {:?}",
                handle.key
            )),
        }
    }

    /// Release every active instance in every pool (run reset)
    pub fn clear(&mut self) {
        for pool in self.pools.values_mut() {
            pool.clear();
        }
    }

    pub fn get(&self, handle: PoolHandle) -> Option<&T> {
        self.pools.get(&handle.key)?.get(handle)
    }

    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        self.pools.get_mut(&handle.key)?.get_mut(handle)
    }

    pub fn is_active(&self, handle: PoolHandle) -> bool {
        self.pools
            .get(&handle.key)
            .is_some_and(|pool| pool.is_active(handle))
    }

    /// Fill `out` with every active handle, in prototype order.
    /// Reusing `out` keeps per-tick iteration allocation free.
    pub fn collect_active(&self, out: &mut Vec<PoolHandle>) {
        out.clear();
        for pool in self.pools.values() {
            out.extend(pool.active_handles());
        }
    }

    pub fn active_count(&self) -> usize {
        self.pools.values().map(|p| p.active_count()).sum()
    }

    pub fn stats(&self, key: PrototypeKey) -> Option<PoolStats> {
        self.pools.get(&key).map(|p| p.stats())
    }

    pub fn check_invariants(&self) -> bool {
        self.pools.values().all(|p| p.check_invariants())
    }
}
