//! Tunable constants for one runner session.
//!
//! Units: depth is in abstract "track units" (0 at the camera, `far_plane` at the
//! horizon), speed is track units per reference frame, heights are in screen
//! pixels above the ground line, and times are milliseconds.

use crate::error::ConfigError;

/// Relative odds for what the spawner creates. Weights need not sum to 1.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SpawnWeights {
    pub coin: f64,
    pub ground_hazard: f64,
    pub air_hazard: f64,
}

impl Default for SpawnWeights {
    fn default() -> Self {
        // 60% coins, the remaining 40% split evenly between boxes and lasers
        Self { coin: 0.6, ground_hazard: 0.2, air_hazard: 0.2 }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RunnerConfig {
    // --- Track / projection ---
    pub lane_count: u8,
    pub start_lane: u8,
    pub far_plane: f64,
    /// Screen-y of the horizon as a fraction of viewport height.
    pub horizon_ratio: f64,
    /// Fixed depth the player occupies on the track.
    pub player_depth: f64,
    /// Entities are dropped once they are this far behind the camera.
    pub despawn_depth: f64,

    // --- Collision ---
    pub hit_depth_tolerance: f64,
    pub hit_radius_px: f64,
    /// Height above which the player clears ground hazards.
    pub ground_clearance: f64,

    // --- Physics ---
    pub gravity: f64,
    pub jump_velocity: f64,
    pub max_height: f64,
    pub lane_ease: f64,
    pub max_step_ms: f64,
    pub reference_frame_ms: f64,

    // --- Speed ramp ---
    pub base_speed: f64,
    pub max_speed: f64,
    pub speed_increment: f64,
    pub milestone_points: u32,
    pub milestone_speed_bonus: f64,

    // --- Spawning / scoring ---
    /// Spawn interval is `spawn_distance / speed` milliseconds.
    pub spawn_distance: f64,
    pub spawn_weights: SpawnWeights,
    pub coin_value: u32,
    /// Optional countdown; the run ends with `TimeUp` when it reaches zero.
    pub time_limit_ms: Option<f64>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            lane_count: 3,
            start_lane: 1,
            far_plane: 1000.0,
            horizon_ratio: 0.3,
            player_depth: 80.0,
            despawn_depth: -100.0,
            hit_depth_tolerance: 20.0,
            hit_radius_px: 40.0,
            ground_clearance: 50.0,
            gravity: 0.6,
            jump_velocity: 14.0,
            max_height: 200.0,
            lane_ease: 0.15,
            max_step_ms: 50.0,
            reference_frame_ms: 1000.0 / 60.0,
            base_speed: 5.0,
            max_speed: 15.0,
            speed_increment: 0.005,
            milestone_points: 500,
            milestone_speed_bonus: 2.0,
            spawn_distance: 10_000.0,
            spawn_weights: SpawnWeights::default(),
            coin_value: 100,
            time_limit_ms: None,
        }
    }
}

/// Named presets selectable from JS.
pub const PRESETS: &[&str] = &["classic", "sprint"];

impl RunnerConfig {
    /// The endless run with default tuning.
    pub fn classic() -> Self {
        Self::default()
    }

    /// A one minute coin sprint: faster start, denser coins, timer ends the run.
    pub fn sprint() -> Self {
        Self {
            base_speed: 7.0,
            max_speed: 18.0,
            speed_increment: 0.01,
            spawn_distance: 8_000.0,
            spawn_weights: SpawnWeights { coin: 0.75, ground_hazard: 0.125, air_hazard: 0.125 },
            time_limit_ms: Some(60_000.0),
            ..Self::default()
        }
    }

    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "classic" => Some(Self::classic()),
            "sprint" => Some(Self::sprint()),
            _ => None,
        }
    }

    /// Parse a JSON config; omitted fields keep their defaults.
    #[cfg(feature = "serde_json")]
    pub fn from_json(json: &str) -> Result<Self, crate::error::StartError> {
        let cfg: RunnerConfig = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lane_count == 0 {
            return Err(ConfigError::NoLanes);
        }
        if self.start_lane >= self.lane_count {
            return Err(ConfigError::StartLaneOutOfRange { start: self.start_lane, lanes: self.lane_count });
        }
        if !(self.spawn_distance.is_finite() && self.spawn_distance > 0.0) {
            return Err(ConfigError::NonPositiveSpawnInterval(self.spawn_distance));
        }
        let w = &self.spawn_weights;
        let weights = [w.coin, w.ground_hazard, w.air_hazard];
        if weights.iter().any(|v| !v.is_finite() || *v < 0.0) || weights.iter().sum::<f64>() <= 0.0 {
            return Err(ConfigError::InvalidSpawnWeights);
        }
        positive("far_plane", self.far_plane)?;
        if !(self.player_depth >= 0.0 && self.player_depth < self.far_plane) {
            return Err(ConfigError::out_of_range("player_depth", "in [0, far_plane)", self.player_depth));
        }
        if !(self.despawn_depth < self.player_depth - self.hit_depth_tolerance) {
            return Err(ConfigError::out_of_range(
                "despawn_depth",
                "behind the collision band",
                self.despawn_depth,
            ));
        }
        if !(self.horizon_ratio >= 0.0 && self.horizon_ratio < 1.0) {
            return Err(ConfigError::out_of_range("horizon_ratio", "in [0, 1)", self.horizon_ratio));
        }
        positive("hit_depth_tolerance", self.hit_depth_tolerance)?;
        positive("hit_radius_px", self.hit_radius_px)?;
        positive("ground_clearance", self.ground_clearance)?;
        positive("gravity", self.gravity)?;
        positive("jump_velocity", self.jump_velocity)?;
        if !(self.max_height >= self.ground_clearance) {
            return Err(ConfigError::out_of_range("max_height", ">= ground_clearance", self.max_height));
        }
        if !(self.lane_ease > 0.0 && self.lane_ease <= 1.0) {
            return Err(ConfigError::out_of_range("lane_ease", "in (0, 1]", self.lane_ease));
        }
        positive("max_step_ms", self.max_step_ms)?;
        positive("reference_frame_ms", self.reference_frame_ms)?;
        positive("base_speed", self.base_speed)?;
        if !(self.max_speed >= self.base_speed) {
            return Err(ConfigError::out_of_range("max_speed", ">= base_speed", self.max_speed));
        }
        if !(self.speed_increment >= 0.0 && self.speed_increment.is_finite()) {
            return Err(ConfigError::out_of_range("speed_increment", ">= 0", self.speed_increment));
        }
        if !(self.milestone_speed_bonus >= 0.0 && self.milestone_speed_bonus.is_finite()) {
            return Err(ConfigError::out_of_range("milestone_speed_bonus", ">= 0", self.milestone_speed_bonus));
        }
        if let Some(limit) = self.time_limit_ms {
            positive("time_limit_ms", limit)?;
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::out_of_range(field, "positive and finite", value))
    }
}
