//! Player motion: jump arc under gravity and eased lane switching.

use crate::config::RunnerConfig;

/// The physics subset of `RunnerConfig`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhysicsParams {
    pub gravity: f64,
    pub jump_velocity: f64,
    pub max_height: f64,
    pub lane_ease: f64,
    pub max_step_ms: f64,
    pub reference_frame_ms: f64,
}

impl From<&RunnerConfig> for PhysicsParams {
    fn from(cfg: &RunnerConfig) -> Self {
        Self {
            gravity: cfg.gravity,
            jump_velocity: cfg.jump_velocity,
            max_height: cfg.max_height,
            lane_ease: cfg.lane_ease,
            max_step_ms: cfg.max_step_ms,
            reference_frame_ms: cfg.reference_frame_ms,
        }
    }
}

impl PhysicsParams {
    /// Clamp a raw frame delta and express it in reference frames.
    /// Negative deltas (clock skew, first frame) count as zero.
    pub fn frames(&self, dt_ms: f64) -> f64 {
        self.clamp_dt(dt_ms) / self.reference_frame_ms
    }

    pub fn clamp_dt(&self, dt_ms: f64) -> f64 {
        if dt_ms.is_finite() { dt_ms.clamp(0.0, self.max_step_ms) } else { 0.0 }
    }
}

/// Player state. Height is measured upward from the ground plane.
#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    pub target_lane: u8,
    pub lane_pos: f64,
    pub height: f64,
    pub vy: f64,
    pub crouching: bool,
}

impl Player {
    pub fn new(lane: u8) -> Self {
        Self { target_lane: lane, lane_pos: lane as f64, height: 0.0, vy: 0.0, crouching: false }
    }

    pub fn grounded(&self) -> bool {
        self.height <= 0.0 && self.vy == 0.0
    }

    pub fn move_left(&mut self) {
        self.target_lane = self.target_lane.saturating_sub(1);
    }

    pub fn move_right(&mut self, lane_count: u8) {
        if self.target_lane + 1 < lane_count {
            self.target_lane += 1;
        }
    }

    /// Start a jump. Ignored unless standing on the ground.
    pub fn jump(&mut self, params: &PhysicsParams) -> bool {
        if !self.grounded() {
            return false;
        }
        self.vy = params.jump_velocity;
        true
    }

    /// Advance by `frames` reference frames.
    pub fn step(&mut self, frames: f64, params: &PhysicsParams) {
        if frames <= 0.0 {
            return;
        }
        if !self.grounded() {
            // semi-implicit Euler: velocity first, then position
            self.vy -= params.gravity * frames;
            self.height += self.vy * frames;
            if self.height >= params.max_height {
                self.height = params.max_height;
                self.vy = self.vy.min(0.0);
            }
            if self.height <= 0.0 {
                self.height = 0.0;
                self.vy = 0.0;
            }
        }
        // exponential smoothing, frame-rate independent: exactly `lane_ease` for one frame
        let keep = (1.0 - params.lane_ease).powf(frames);
        let target = self.target_lane as f64;
        self.lane_pos = target + (self.lane_pos - target) * keep;
    }
}
