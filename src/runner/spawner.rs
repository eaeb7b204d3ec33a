//! Speed-scaled entity spawning.

use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};

use crate::config::{RunnerConfig, SpawnWeights};
use crate::error::ConfigError;
use crate::runner::entity::{EntityKind, Placement};

/// What the spawner decided to create this frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpawnPlan {
    pub lane: u8,
    pub kind: EntityKind,
}

#[derive(Clone, Debug)]
pub struct Spawner {
    timer_ms: f64,
    spawn_distance: f64,
    lane_count: u8,
    coin_value: u32,
    kinds: WeightedIndex<f64>,
}

impl Spawner {
    pub fn new(cfg: &RunnerConfig) -> Result<Self, ConfigError> {
        if !(cfg.spawn_distance.is_finite() && cfg.spawn_distance > 0.0) {
            return Err(ConfigError::NonPositiveSpawnInterval(cfg.spawn_distance));
        }
        if cfg.lane_count == 0 {
            return Err(ConfigError::NoLanes);
        }
        let SpawnWeights { coin, ground_hazard, air_hazard } = cfg.spawn_weights;
        let kinds = WeightedIndex::new([coin, ground_hazard, air_hazard]).map_err(|_| ConfigError::InvalidSpawnWeights)?;
        Ok(Self { timer_ms: 0.0, spawn_distance: cfg.spawn_distance, lane_count: cfg.lane_count, coin_value: cfg.coin_value, kinds })
    }

    /// Milliseconds between spawns at `speed`. `None` when stopped.
    pub fn interval_ms(&self, speed: f64) -> Option<f64> {
        (speed > 0.0 && speed.is_finite()).then(|| self.spawn_distance / speed)
    }

    pub fn timer_ms(&self) -> f64 {
        self.timer_ms
    }

    pub fn reset(&mut self) {
        self.timer_ms = 0.0;
    }

    /// Accumulate `dt_ms`; at most one spawn per call.
    pub fn tick<R: Rng + ?Sized>(&mut self, dt_ms: f64, speed: f64, rng: &mut R) -> Option<SpawnPlan> {
        let interval = self.interval_ms(speed)?;
        self.timer_ms += dt_ms.max(0.0);
        if self.timer_ms <= interval {
            return None;
        }
        self.timer_ms = 0.0;
        Some(self.roll(rng))
    }

    /// Pick a uniformly random lane and a weighted kind.
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> SpawnPlan {
        let lane = rng.gen_range(0..self.lane_count);
        let kind = match self.kinds.sample(rng) {
            0 => EntityKind::Collectible { value: self.coin_value },
            1 => EntityKind::Hazard(Placement::Ground),
            _ => EntityKind::Hazard(Placement::Air),
        };
        SpawnPlan { lane, kind }
    }
}
