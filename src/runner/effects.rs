//! Screen-space pickup effects: particle bursts and rising score text.
//! Purely cosmetic; nothing here feeds back into gameplay.

use glam::DVec2;
use rand::Rng;

/// Coin pickup particles; the renderer draws coins in the same gold.
pub const COIN_PARTICLE: &str = "#FFD700";

const BURST_COUNT: usize = 5;
const BURST_SPEED: f64 = 5.0; // px per frame, per axis
const PARTICLE_DECAY: f64 = 0.05;
const TEXT_RISE: f64 = 2.0;
const TEXT_DECAY: f64 = 0.02;
const TEXT_OFFSET_Y: f64 = 50.0;

#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub pos: DVec2,
    pub vel: DVec2,
    /// 1.0 at birth, removed at 0.
    pub life: f64,
    pub color: &'static str,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FloatingText {
    pub text: String,
    pub pos: DVec2,
    pub life: f64,
}

#[derive(Clone, Debug, Default)]
pub struct Effects {
    pub particles: Vec<Particle>,
    pub texts: Vec<FloatingText>,
}

impl Effects {
    /// Coin pickup at screen position `at`.
    pub fn coin_burst<R: Rng + ?Sized>(&mut self, at: DVec2, value: u32, color: &'static str, rng: &mut R) {
        for _ in 0..BURST_COUNT {
            let vel = DVec2::new(rng.gen_range(-BURST_SPEED..BURST_SPEED), rng.gen_range(-BURST_SPEED..BURST_SPEED));
            self.particles.push(Particle { pos: at, vel, life: 1.0, color });
        }
        self.texts.push(FloatingText { text: format!("+{value}"), pos: at - DVec2::new(0.0, TEXT_OFFSET_Y), life: 1.0 });
    }

    pub fn step(&mut self, frames: f64) {
        if frames <= 0.0 {
            return;
        }
        for p in &mut self.particles {
            p.pos += p.vel * frames;
            p.life -= PARTICLE_DECAY * frames;
        }
        self.particles.retain(|p| p.life > 0.0);
        for t in &mut self.texts {
            t.pos.y -= TEXT_RISE * frames;
            t.life -= TEXT_DECAY * frames;
        }
        self.texts.retain(|t| t.life > 0.0);
    }

    pub fn clear(&mut self) {
        self.particles.clear();
        self.texts.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty() && self.texts.is_empty()
    }
}
