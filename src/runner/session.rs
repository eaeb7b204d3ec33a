//! One run of the game: all mutable state owned by the frame loop.
//!
//! Frame order inside `step`: staged intents → speed ramp → physics → spawn
//! check → advance entities → project + collide → score/state → effects.
//! Rendering reads the session afterwards and never mutates it.

use glam::DVec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::config::RunnerConfig;
use crate::error::ConfigError;
use crate::runner::collision::{Contact, HitTest};
use crate::runner::effects::{self, Effects};
use crate::runner::entity::{Entity, EntityKind, Placement};
use crate::runner::input::Intent;
use crate::runner::physics::{PhysicsParams, Player};
use crate::runner::projection::{Projection, Viewport};
use crate::runner::spawner::Spawner;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndCause {
    Crashed(Placement),
    TimeUp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameState {
    Playing,
    GameOver { cause: EndCause },
}

/// Notable things that happened during a `step`, for logging and HUD updates.
#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    Spawned { id: u64, lane: u8, kind: EntityKind },
    Collected { id: u64, value: u32, score: u32 },
    Crashed { id: u64, placement: Placement },
    TimeUp,
    Restarted,
}

pub struct RunnerSession {
    cfg: RunnerConfig,
    physics: PhysicsParams,
    hit: HitTest,
    projection: Projection,
    viewport: Viewport,
    player: Player,
    entities: Vec<Entity>,
    spawner: Spawner,
    effects: Effects,
    intents: Vec<Intent>,
    state: GameState,
    score: u32,
    speed: f64,
    elapsed_ms: f64,
    time_left_ms: Option<f64>,
    next_id: u64,
    rng: ChaCha8Rng,
}

impl RunnerSession {
    pub fn new(cfg: RunnerConfig, seed: u64) -> Result<Self, ConfigError> {
        cfg.validate()?;
        let spawner = Spawner::new(&cfg)?;
        let hit = HitTest {
            player_depth: cfg.player_depth,
            depth_tolerance: cfg.hit_depth_tolerance,
            radius_px: cfg.hit_radius_px,
            ground_clearance: cfg.ground_clearance,
        };
        Ok(Self {
            physics: PhysicsParams::from(&cfg),
            hit,
            projection: Projection::new(cfg.lane_count, cfg.far_plane, cfg.horizon_ratio),
            viewport: Viewport::default(),
            player: Player::new(cfg.start_lane),
            entities: Vec::new(),
            spawner,
            effects: Effects::default(),
            intents: Vec::new(),
            state: GameState::Playing,
            score: 0,
            speed: cfg.base_speed,
            elapsed_ms: 0.0,
            time_left_ms: cfg.time_limit_ms,
            next_id: 1,
            rng: ChaCha8Rng::seed_from_u64(seed),
            cfg,
        })
    }

    // --- Accessors ---------------------------------------------------------

    pub fn config(&self) -> &RunnerConfig {
        &self.cfg
    }
    pub fn state(&self) -> GameState {
        self.state
    }
    pub fn is_playing(&self) -> bool {
        self.state == GameState::Playing
    }
    pub fn score(&self) -> u32 {
        self.score
    }
    pub fn speed(&self) -> f64 {
        self.speed
    }
    pub fn player(&self) -> &Player {
        &self.player
    }
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }
    pub fn effects(&self) -> &Effects {
        &self.effects
    }
    pub fn projection(&self) -> &Projection {
        &self.projection
    }
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }
    pub fn time_left_ms(&self) -> Option<f64> {
        self.time_left_ms
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Speed cap, raised by `milestone_speed_bonus` for every `milestone_points` scored.
    pub fn dynamic_max_speed(&self) -> f64 {
        let milestones = self.score.checked_div(self.cfg.milestone_points).unwrap_or(0);
        self.cfg.max_speed + milestones as f64 * self.cfg.milestone_speed_bonus
    }

    /// Player body position on screen (the ground point lifted by jump height).
    pub fn player_screen_pos(&self) -> DVec2 {
        let ground = self.player_ground_pos();
        DVec2::new(ground.x, ground.y - self.player.height)
    }

    pub fn player_ground_pos(&self) -> DVec2 {
        self.projection.project(self.player.lane_pos, self.cfg.player_depth, &self.viewport)
    }

    pub fn entity_screen_pos(&self, entity: &Entity) -> DVec2 {
        self.projection.project(entity.lane as f64, entity.depth, &self.viewport)
    }

    // --- Input -------------------------------------------------------------

    /// Stage an intent; it is applied at the start of the next `step`.
    /// After game over only `Restart` is kept.
    pub fn push_intent(&mut self, intent: Intent) {
        if self.is_playing() || intent == Intent::Restart {
            self.intents.push(intent);
        }
    }

    pub fn staged_intents(&self) -> &[Intent] {
        &self.intents
    }

    fn apply(&mut self, intent: Intent) {
        match intent {
            Intent::MoveLeft => self.player.move_left(),
            Intent::MoveRight => self.player.move_right(self.cfg.lane_count),
            Intent::Jump => {
                self.player.jump(&self.physics);
            }
            Intent::DuckStart => self.player.crouching = true,
            Intent::DuckEnd => self.player.crouching = false,
            Intent::Restart => tracing::debug!("restart ignored while playing"),
        }
    }

    // --- Entities ----------------------------------------------------------

    /// Spawn at the far plane. Lanes past the edge are clamped onto the track.
    pub fn spawn(&mut self, lane: u8, kind: EntityKind) -> u64 {
        self.spawn_at(lane, self.cfg.far_plane, kind)
    }

    pub fn spawn_at(&mut self, lane: u8, depth: f64, kind: EntityKind) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        let lane = lane.min(self.cfg.lane_count - 1);
        self.entities.push(Entity::new(id, lane, depth, kind));
        id
    }

    // --- Frame -------------------------------------------------------------

    /// Advance the run by `dt_ms` of wall time (clamped to `max_step_ms`).
    pub fn step(&mut self, dt_ms: f64) -> Vec<GameEvent> {
        let mut events = Vec::new();
        let intents = std::mem::take(&mut self.intents);

        if !self.is_playing() {
            if intents.contains(&Intent::Restart) {
                self.restart();
                events.push(GameEvent::Restarted);
            }
            return events;
        }
        for intent in intents {
            self.apply(intent);
        }

        let dt = self.physics.clamp_dt(dt_ms);
        if dt <= 0.0 {
            return events;
        }
        let frames = dt / self.physics.reference_frame_ms;
        self.elapsed_ms += dt;

        // speed ramp (cap grows with score milestones)
        self.speed = (self.speed + self.cfg.speed_increment * frames).min(self.dynamic_max_speed());
        self.projection.set_speed(self.speed, self.cfg.base_speed, self.cfg.max_speed);

        self.player.step(frames, &self.physics);

        if let Some(plan) = self.spawner.tick(dt, self.speed, &mut self.rng) {
            let id = self.spawn(plan.lane, plan.kind);
            events.push(GameEvent::Spawned { id, lane: plan.lane, kind: plan.kind });
        }

        let distance = self.speed * frames;
        let mut crash: Option<(u64, Placement)> = None;
        for e in self.entities.iter_mut() {
            let prev = e.advance(distance);
            match self.hit.check(e, prev, &self.player, &self.projection, &self.viewport) {
                Some(Contact::Crash(placement)) => {
                    if crash.is_none() {
                        crash = Some((e.id, placement));
                    }
                }
                Some(Contact::Collect(value)) => {
                    e.consumed = true;
                    self.score = self.score.saturating_add(value);
                    let at = self.projection.project(e.lane as f64, e.depth, &self.viewport);
                    self.effects.coin_burst(at, value, effects::COIN_PARTICLE, &mut self.rng);
                    events.push(GameEvent::Collected { id: e.id, value, score: self.score });
                }
                Some(Contact::Clear) | None => {}
            }
        }
        let despawn = self.cfg.despawn_depth;
        self.entities.retain(|e| !e.passed(despawn));

        if let Some((id, placement)) = crash {
            tracing::info!(score = self.score, ?placement, "crashed");
            self.state = GameState::GameOver { cause: EndCause::Crashed(placement) };
            events.push(GameEvent::Crashed { id, placement });
        } else if let Some(left) = self.time_left_ms.as_mut() {
            *left -= dt;
            if *left <= 0.0 {
                *left = 0.0;
                tracing::info!(score = self.score, "time up");
                self.state = GameState::GameOver { cause: EndCause::TimeUp };
                events.push(GameEvent::TimeUp);
            }
        }

        self.effects.step(frames);
        events
    }

    /// Back to a fresh `Playing` run with the same config. Safe to call in any state.
    pub fn restart(&mut self) {
        self.player = Player::new(self.cfg.start_lane);
        self.entities.clear();
        self.effects.clear();
        self.intents.clear();
        self.spawner.reset();
        self.score = 0;
        self.speed = self.cfg.base_speed;
        self.projection.set_speed(self.speed, self.cfg.base_speed, self.cfg.max_speed);
        self.elapsed_ms = 0.0;
        self.time_left_ms = self.cfg.time_limit_ms;
        self.state = GameState::Playing;
        tracing::debug!("session restarted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Constant speed, no random spawns.
    fn scripted(speed: f64, start_lane: u8) -> RunnerSession {
        let cfg = RunnerConfig {
            base_speed: speed,
            max_speed: speed,
            speed_increment: 0.0,
            spawn_distance: 1e15,
            start_lane,
            ..RunnerConfig::default()
        };
        RunnerSession::new(cfg, 1).unwrap()
    }

    fn frame(s: &RunnerSession) -> f64 {
        s.config().reference_frame_ms
    }

    #[test]
    fn rejects_invalid_config() {
        let cfg = RunnerConfig { spawn_distance: -1.0, ..RunnerConfig::default() };
        assert!(RunnerSession::new(cfg, 0).is_err());
    }

    #[test]
    fn grounded_player_hits_box_in_own_lane() {
        let mut s = scripted(5.0, 1);
        s.spawn(1, EntityKind::Hazard(Placement::Ground));
        let n = (s.config().far_plane / 5.0) as usize;
        let dt = frame(&s);
        let mut crashed_at = None;
        for i in 0..n {
            let events = s.step(dt);
            if events.iter().any(|e| matches!(e, GameEvent::Crashed { .. })) {
                crashed_at = Some(i);
                break;
            }
        }
        assert!(crashed_at.is_some());
        assert_eq!(s.state(), GameState::GameOver { cause: EndCause::Crashed(Placement::Ground) });
    }

    #[test]
    fn coin_is_collected_exactly_once() {
        let mut s = scripted(5.0, 0);
        s.spawn(0, EntityKind::Collectible { value: 100 });
        let dt = frame(&s);
        let mut collected = 0;
        for _ in 0..400 {
            for ev in s.step(dt) {
                if let GameEvent::Collected { value, .. } = ev {
                    assert_eq!(value, 100);
                    collected += 1;
                }
            }
        }
        assert_eq!(collected, 1);
        assert_eq!(s.score(), 100);
        assert!(s.entities().is_empty(), "coin scrolled past the camera");
        assert!(s.is_playing());
    }

    #[test]
    fn duck_clears_laser_and_jump_clears_box() {
        let mut s = scripted(5.0, 1);
        let dt = frame(&s);
        s.spawn_at(1, 150.0, EntityKind::Hazard(Placement::Air));
        s.push_intent(Intent::DuckStart);
        for _ in 0..40 {
            s.step(dt);
        }
        assert!(s.is_playing());
        s.push_intent(Intent::DuckEnd);
        s.step(dt);
        assert!(!s.player().crouching);

        s.spawn_at(1, 160.0, EntityKind::Hazard(Placement::Ground));
        s.push_intent(Intent::Jump);
        for _ in 0..40 {
            s.step(dt);
        }
        assert!(s.is_playing(), "jump carried the player over the box");
    }

    #[test]
    fn moves_are_clamped_and_ignored_after_game_over() {
        let mut s = scripted(5.0, 0);
        let dt = frame(&s);
        s.push_intent(Intent::MoveLeft);
        s.step(dt);
        assert_eq!(s.player().target_lane, 0);

        s.spawn_at(0, 85.0, EntityKind::Hazard(Placement::Air));
        s.step(dt);
        assert!(!s.is_playing());
        s.push_intent(Intent::MoveRight);
        s.step(dt);
        assert_eq!(s.player().target_lane, 0);
    }

    #[test]
    fn restart_intent_resets_state() {
        let mut s = scripted(5.0, 1);
        let dt = frame(&s);
        s.spawn_at(0, 500.0, EntityKind::Collectible { value: 100 });
        s.spawn_at(1, 85.0, EntityKind::Hazard(Placement::Ground));
        s.push_intent(Intent::DuckStart);
        s.step(dt);
        assert!(!s.is_playing());

        s.push_intent(Intent::Restart);
        let events = s.step(dt);
        assert_eq!(events, vec![GameEvent::Restarted]);
        assert!(s.is_playing());
        assert_eq!(s.score(), 0);
        assert!(s.entities().is_empty());
        assert_eq!(s.player().target_lane, 1);
        assert_eq!(s.player().lane_pos, 1.0);
        assert!(!s.player().crouching);
        assert_eq!(s.speed(), 5.0);
    }

    #[test]
    fn game_over_only_stages_restart() {
        let mut s = scripted(5.0, 1);
        let dt = frame(&s);
        s.spawn_at(1, 85.0, EntityKind::Hazard(Placement::Ground));
        s.step(dt);
        assert!(!s.is_playing());
        for _ in 0..100 {
            s.push_intent(Intent::MoveLeft);
            s.push_intent(Intent::Jump);
            s.push_intent(Intent::DuckEnd);
        }
        assert!(s.staged_intents().is_empty());
        s.push_intent(Intent::Restart);
        assert_eq!(s.staged_intents(), &[Intent::Restart]);
    }

    #[test]
    fn coin_particles_use_effect_color() {
        let mut s = scripted(5.0, 0);
        s.spawn_at(0, 85.0, EntityKind::Collectible { value: 100 });
        let dt = frame(&s);
        s.step(dt);
        assert!(!s.effects().particles.is_empty());
        assert!(s.effects().particles.iter().all(|p| p.color == effects::COIN_PARTICLE));
    }

    #[test]
    fn restart_intent_ignored_while_playing() {
        let mut s = scripted(5.0, 1);
        let dt = frame(&s);
        s.spawn(2, EntityKind::Collectible { value: 100 });
        s.push_intent(Intent::Restart);
        s.step(dt);
        assert_eq!(s.entities().len(), 1);
    }

    #[test]
    fn timer_expiry_ends_run() {
        let cfg = RunnerConfig { time_limit_ms: Some(1000.0), spawn_distance: 1e15, ..RunnerConfig::default() };
        let mut s = RunnerSession::new(cfg, 3).unwrap();
        let mut steps = 0;
        while s.is_playing() && steps < 1000 {
            s.step(20.0);
            steps += 1;
        }
        assert_eq!(steps, 50);
        assert_eq!(s.state(), GameState::GameOver { cause: EndCause::TimeUp });
        assert_eq!(s.time_left_ms(), Some(0.0));
    }

    #[test]
    fn speed_ramps_up_to_cap() {
        let cfg = RunnerConfig { speed_increment: 0.5, spawn_distance: 1e15, ..RunnerConfig::default() };
        let mut s = RunnerSession::new(cfg, 3).unwrap();
        let dt = frame(&s);
        s.step(dt);
        assert!((s.speed() - 5.5).abs() < 1e-9);
        for _ in 0..100 {
            s.step(dt);
        }
        assert_eq!(s.speed(), 15.0);
        assert!(s.projection().convergence > 0.24);
    }

    #[test]
    fn milestones_raise_speed_cap() {
        let cfg = RunnerConfig { spawn_distance: 1e15, start_lane: 0, ..RunnerConfig::default() };
        let mut s = RunnerSession::new(cfg, 3).unwrap();
        assert_eq!(s.dynamic_max_speed(), 15.0);
        for depth in [100.0, 110.0, 120.0, 130.0, 140.0] {
            s.spawn_at(0, depth, EntityKind::Collectible { value: 100 });
        }
        for _ in 0..20 {
            s.step(50.0);
        }
        assert_eq!(s.score(), 500);
        assert_eq!(s.dynamic_max_speed(), 17.0);
    }

    #[test]
    fn random_spawns_arrive_from_far_plane() {
        let mut s = RunnerSession::new(RunnerConfig::default(), 99).unwrap();
        let mut spawned = 0;
        for _ in 0..200 {
            for ev in s.step(50.0) {
                if let GameEvent::Spawned { lane, .. } = ev {
                    assert!(lane < 3);
                    spawned += 1;
                }
            }
            if !s.is_playing() {
                break;
            }
        }
        assert!(spawned > 0);
        assert!(s.entities().iter().all(|e| e.depth <= s.config().far_plane));
    }

    #[test]
    fn zero_dt_changes_nothing() {
        let mut s = scripted(5.0, 1);
        s.spawn(1, EntityKind::Hazard(Placement::Air));
        s.step(0.0);
        s.step(-16.0);
        assert_eq!(s.entities()[0].depth, s.config().far_plane);
        assert_eq!(s.elapsed_ms(), 0.0);
    }
}
