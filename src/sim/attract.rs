//! Magnetic pickup movement
//!
//! A pickup idles where it dropped until a collector comes within magnet
//! range, then homes in on it, speeding up as it closes the gap. Movement
//! and range checks happen on the ground plane; height differences are
//! ignored.
//!
//! ```text
//! Idle ──in range──▶ Attracted ──touch──▶ Collected
//!   └───────────ttl elapsed────────────▶ Expired
//! ```
//!
//! Both terminal states hand out the reward exactly once.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;
use crate::{flatten, ground_distance};

/// Identity of an entity that can collect pickups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectorId(pub u32);

/// Collector lookup the movement rule depends on
pub trait CollectorQuery {
    fn find_nearest_collector(&self, position: Vec3) -> Option<(CollectorId, Vec3)>;
}

/// Easing from approach progress (0 = edge of range, 1 = touching) to a
/// speed multiplier. Piecewise linear between keyframes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccelerationCurve {
    /// `(progress, multiplier)` pairs sorted by progress
    pub keys: Vec<(f32, f32)>,
}

impl Default for AccelerationCurve {
    fn default() -> Self {
        Self {
            keys: vec![(0.0, 1.0), (0.6, 1.8), (1.0, 4.0)],
        }
    }
}

impl AccelerationCurve {
    /// Constant multiplier
    pub fn flat(multiplier: f32) -> Self {
        Self {
            keys: vec![(0.0, multiplier)],
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.keys.is_empty() {
            return Err(ConfigError::AccelerationCurve("needs at least one key"));
        }
        for &(progress, multiplier) in &self.keys {
            if !(0.0..=1.0).contains(&progress) {
                return Err(ConfigError::AccelerationCurve("progress outside [0, 1]"));
            }
            if !multiplier.is_finite() || multiplier <= 0.0 {
                return Err(ConfigError::AccelerationCurve("multiplier must be positive"));
            }
        }
        for pair in self.keys.windows(2) {
            if pair[1].0 <= pair[0].0 {
                return Err(ConfigError::AccelerationCurve("keys must be sorted by progress"));
            }
            if pair[1].1 < pair[0].1 {
                return Err(ConfigError::AccelerationCurve("multipliers must not decrease"));
            }
        }
        Ok(())
    }

    /// Multiplier at `progress` (clamped to the first/last key)
    pub fn evaluate(&self, progress: f32) -> f32 {
        let Some(&(first_p, first_m)) = self.keys.first() else {
            return 1.0;
        };
        if progress <= first_p {
            return first_m;
        }
        for pair in self.keys.windows(2) {
            let (p0, m0) = pair[0];
            let (p1, m1) = pair[1];
            if progress <= p1 {
                let t = (progress - p0) / (p1 - p0);
                return m0 + (m1 - m0) * t;
            }
        }
        self.keys.last().map_or(first_m, |&(_, m)| m)
    }
}

/// Magnet tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttractionConfig {
    pub magnet_range: f32,
    /// Base homing speed (units/sec) before acceleration
    pub magnet_speed: f32,
    pub acceleration: AccelerationCurve,
    /// Seconds until auto-collect (0 = infinite)
    pub ttl: f32,
    /// Distance at which a pickup counts as touching its collector
    pub collect_radius: f32,
}

impl Default for AttractionConfig {
    fn default() -> Self {
        Self {
            magnet_range: MAGNET_RANGE,
            magnet_speed: MAGNET_SPEED,
            acceleration: AccelerationCurve::default(),
            ttl: PICKUP_TTL,
            collect_radius: COLLECT_RADIUS,
        }
    }
}

impl AttractionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("magnet_range", self.magnet_range),
            ("magnet_speed", self.magnet_speed),
            ("collect_radius", self.collect_radius),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::NonPositive { field, value });
            }
        }
        if self.collect_radius > self.magnet_range {
            return Err(ConfigError::CollectRadius {
                collect_radius: self.collect_radius,
                magnet_range: self.magnet_range,
            });
        }
        if !self.ttl.is_finite() || self.ttl < 0.0 {
            return Err(ConfigError::Negative {
                field: "ttl",
                value: self.ttl,
            });
        }
        self.acceleration.validate()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AttractPhase {
    #[default]
    Idle,
    Attracted,
    Collected,
    Expired,
}

impl AttractPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, AttractPhase::Collected | AttractPhase::Expired)
    }
}

/// Per-pickup attraction bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttractionState {
    pub value: u32,
    /// Simulation time the pickup spawned at
    pub origin_time: f64,
    pub ttl: f32,
    pub attracted: bool,
    /// 0 at the edge of magnet range, 1 when touching
    pub progress: f32,
}

/// How a pickup left play. Both variants carry the reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickupOutcome {
    Collected { value: u32, collector: Option<CollectorId> },
    Expired { value: u32 },
}

impl PickupOutcome {
    pub fn value(&self) -> u32 {
        match *self {
            PickupOutcome::Collected { value, .. } | PickupOutcome::Expired { value } => value,
        }
    }
}

/// Movement rule for one pickup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attractable {
    pub position: Vec3,
    pub state: AttractionState,
    phase: AttractPhase,
    target: Option<CollectorId>,
    overlap: bool,
}

impl Default for Attractable {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            state: AttractionState {
                value: 0,
                origin_time: 0.0,
                ttl: 0.0,
                attracted: false,
                progress: 0.0,
            },
            phase: AttractPhase::Idle,
            target: None,
            overlap: false,
        }
    }
}

impl Attractable {
    /// Fresh idle state for a new spawn
    pub fn reset(&mut self, position: Vec3, value: u32, now: f64, ttl: f32) {
        *self = Self {
            position,
            state: AttractionState {
                value,
                origin_time: now,
                ttl,
                attracted: false,
                progress: 0.0,
            },
            ..Self::default()
        };
    }

    pub fn phase(&self) -> AttractPhase {
        self.phase
    }

    pub fn is_attracted(&self) -> bool {
        self.state.attracted
    }

    /// Collector the pickup last homed in on
    pub fn target(&self) -> Option<CollectorId> {
        self.target
    }

    /// External overlap signal (e.g. a trigger volume); collects on the next tick
    pub fn signal_overlap(&mut self) {
        if !self.phase.is_terminal() {
            self.overlap = true;
        }
    }

    /// Advance one step. Returns the outcome on the tick the pickup leaves play.
    pub fn tick(
        &mut self,
        now: f64,
        dt: f32,
        config: &AttractionConfig,
        collectors: &dyn CollectorQuery,
    ) -> Option<PickupOutcome> {
        if self.phase.is_terminal() {
            return None;
        }

        let nearest = collectors.find_nearest_collector(self.position);
        if self.overlap {
            return Some(self.collect(nearest.map(|(id, _)| id)));
        }

        if let Some((id, collector_pos)) = nearest {
            let distance = ground_distance(self.position, collector_pos);
            if self.phase == AttractPhase::Idle && distance <= config.magnet_range {
                self.phase = AttractPhase::Attracted;
                self.state.attracted = true;
            }

            if self.phase == AttractPhase::Attracted {
                self.target = Some(id);
                self.state.progress = 1.0 - (distance / config.magnet_range).clamp(0.0, 1.0);
                if distance <= config.collect_radius {
                    return Some(self.collect(Some(id)));
                }

                let speed = config.magnet_speed * config.acceleration.evaluate(self.state.progress);
                let step = speed * dt.max(0.0);
                if step >= distance {
                    self.position = Vec3::new(collector_pos.x, self.position.y, collector_pos.z);
                    return Some(self.collect(Some(id)));
                }
                let direction = flatten(collector_pos - self.position).normalize_or_zero();
                self.position += direction * step;
            }
        }

        if self.state.ttl > 0.0 && now - self.state.origin_time >= f64::from(self.state.ttl) {
            self.phase = AttractPhase::Expired;
            log::debug!("Pickup worth {} expired, auto-collecting", self.state.value);
            return Some(PickupOutcome::Expired {
                value: self.state.value,
            });
        }
        None
    }

    fn collect(&mut self, collector: Option<CollectorId>) -> PickupOutcome {
        self.phase = AttractPhase::Collected;
        self.state.progress = 1.0;
        self.overlap = false;
        PickupOutcome::Collected {
            value: self.state.value,
            collector,
        }
    }
}
