//! Scene drawing against a minimal immediate-mode surface.
//!
//! `Surface` is the only thing the game needs from a graphics API; the canvas
//! 2d context implements it for the browser and tests use a recorder.

use std::f64::consts::TAU;

use web_sys::CanvasRenderingContext2d;

use crate::runner::entity::{EntityKind, Placement};
use crate::runner::projection::Viewport;
use crate::runner::session::RunnerSession;

/// Colors for the neon track theme.
pub mod colors {
    pub const BACKGROUND: &str = "#050510";
    pub const GRID: &str = "#00F0FF";
    pub const HORIZON_GLOW: &str = "rgba(0,240,255,0.27)";
    pub const PILLAR: &str = "rgba(0,40,80,0.8)";
    pub const PLAYER: &str = "#0052FF";
    pub const PLAYER_CORE: &str = "#fff";
    pub const BOX: &str = "#FF0420";
    pub const BOX_TOP: &str = "#ff5555";
    pub const LASER: &str = "#ff00ff";
    pub const LASER_POST: &str = "#fff";
    pub const COIN: &str = crate::runner::effects::COIN_PARTICLE;
    pub const COIN_RING: &str = "#fff";
    pub const SHADOW: &str = "rgba(0,0,0,0.5)";
    pub const TEXT: &str = "#fff";
}

pub trait Surface {
    fn clear(&mut self, vp: &Viewport, color: &str) {
        self.fill_rect(0.0, 0.0, vp.width, vp.height, color);
    }
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: &str);
    fn fill_ellipse(&mut self, x: f64, y: f64, rx: f64, ry: f64, color: &str);
    fn stroke_ellipse(&mut self, x: f64, y: f64, rx: f64, ry: f64, width: f64, color: &str);
    fn stroke_line(&mut self, from: (f64, f64), to: (f64, f64), width: f64, color: &str);
    fn fill_text(&mut self, text: &str, x: f64, y: f64, font: &str, color: &str);
    fn set_alpha(&mut self, alpha: f64);
    /// Soft glow around subsequent shapes; blur 0 turns it off.
    fn set_glow(&mut self, blur: f64, color: &str);
}

impl Surface for CanvasRenderingContext2d {
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: &str) {
        self.set_fill_style_str(color);
        CanvasRenderingContext2d::fill_rect(self, x, y, w, h);
    }

    fn fill_ellipse(&mut self, x: f64, y: f64, rx: f64, ry: f64, color: &str) {
        self.set_fill_style_str(color);
        self.begin_path();
        self.ellipse(x, y, rx.max(0.0), ry.max(0.0), 0.0, 0.0, TAU).ok();
        self.fill();
    }

    fn stroke_ellipse(&mut self, x: f64, y: f64, rx: f64, ry: f64, width: f64, color: &str) {
        self.set_stroke_style_str(color);
        self.set_line_width(width);
        self.begin_path();
        self.ellipse(x, y, rx.max(0.0), ry.max(0.0), 0.0, 0.0, TAU).ok();
        self.stroke();
    }

    fn stroke_line(&mut self, from: (f64, f64), to: (f64, f64), width: f64, color: &str) {
        self.set_stroke_style_str(color);
        self.set_line_width(width);
        self.begin_path();
        self.move_to(from.0, from.1);
        self.line_to(to.0, to.1);
        self.stroke();
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64, font: &str, color: &str) {
        self.set_font(font);
        self.set_fill_style_str(color);
        CanvasRenderingContext2d::fill_text(self, text, x, y).ok();
    }

    fn set_alpha(&mut self, alpha: f64) {
        self.set_global_alpha(alpha.clamp(0.0, 1.0));
    }

    fn set_glow(&mut self, blur: f64, color: &str) {
        self.set_shadow_blur(blur);
        self.set_shadow_color(color);
    }
}

/// Redraw everything. `now_ms` only drives cosmetic animation (scrolling, bobbing).
pub fn draw_scene<S: Surface + ?Sized>(s: &mut S, session: &RunnerSession, now_ms: f64) {
    let vp = *session.viewport();
    s.set_alpha(1.0);
    s.set_glow(0.0, colors::BACKGROUND);
    s.clear(&vp, colors::BACKGROUND);
    draw_track(s, session, now_ms);
    draw_entities(s, session, now_ms);
    draw_effects(s, session);
    draw_player(s, session);
}

fn draw_track<S: Surface + ?Sized>(s: &mut S, session: &RunnerSession, now_ms: f64) {
    let vp = *session.viewport();
    let proj = session.projection();
    let horizon = proj.horizon_y(&vp);
    let far = proj.far_plane;
    let lanes = proj.lane_count as f64;

    // Horizon glow band
    s.fill_rect(0.0, horizon - 50.0, vp.width, 150.0, colors::HORIZON_GLOW);

    // Side pillars scrolling toward the camera
    let pillar_offset = (now_ms * session.speed() * 0.2) % 200.0;
    let mut i = -200.0;
    while i < vp.height {
        let py = i + pillar_offset;
        if py > horizon {
            let depth_frac = (py - horizon) / (vp.height - horizon);
            let depth = proj.y_to_depth(py, &vp);
            let pw = 10.0 + 40.0 * depth_frac;
            s.set_alpha(depth_frac);
            let left = proj.line_x(-1.0, depth, &vp) - pw * 2.0;
            s.fill_rect(left, py, pw, 100.0 * depth_frac, colors::PILLAR);
            let right = proj.line_x(lanes + 1.0, depth, &vp) + pw;
            s.fill_rect(right, py, pw, 100.0 * depth_frac, colors::PILLAR);
        }
        i += 150.0;
    }
    s.set_alpha(1.0);

    // Lane divider lines
    s.set_alpha(0.6);
    s.set_glow(10.0, colors::GRID);
    for line in 0..=proj.lane_count {
        let line = line as f64;
        let bottom = (proj.line_x(line, 0.0, &vp), vp.height);
        let top = (proj.line_x(line, far, &vp), horizon);
        s.stroke_line(bottom, top, 2.0, colors::GRID);
    }
    s.set_glow(0.0, colors::GRID);

    // Floor lines rushing toward the camera
    s.set_alpha(0.5);
    let span = vp.height - horizon;
    if span > 0.0 {
        let offset = (now_ms * session.speed() * 0.5) % 100.0;
        let mut i = 0.0;
        while i < vp.height {
            let y = horizon + (i + offset) % span;
            s.stroke_line((0.0, y), (vp.width, y), 1.0, colors::GRID);
            i += 40.0;
        }
    }
    s.set_alpha(1.0);
}

fn draw_entities<S: Surface + ?Sized>(s: &mut S, session: &RunnerSession, now_ms: f64) {
    let proj = session.projection();
    // far to near so closer sprites overlap farther ones
    let mut order: Vec<_> = session.entities().iter().filter(|e| e.is_live()).collect();
    order.sort_by(|a, b| b.depth.total_cmp(&a.depth));
    for e in order {
        let pos = session.entity_screen_pos(e);
        let scale = proj.scale_at(e.depth);
        let size = 60.0 * scale;
        s.fill_ellipse(pos.x, pos.y + size / 2.0, size / 2.0, size / 4.0, colors::SHADOW);
        match e.kind {
            EntityKind::Hazard(Placement::Ground) => {
                s.fill_rect(pos.x - size / 2.0, pos.y - size, size, size, colors::BOX);
                s.fill_rect(pos.x - size / 2.0, pos.y - size - 10.0 * scale, size, 10.0 * scale, colors::BOX_TOP);
            }
            EntityKind::Hazard(Placement::Air) => {
                let laser_y = pos.y - 80.0 * scale;
                s.set_glow(20.0, colors::LASER);
                s.fill_rect(pos.x - size, laser_y, size * 2.0, 20.0 * scale, colors::LASER);
                s.set_glow(0.0, colors::LASER);
                s.fill_rect(pos.x - size, laser_y, 5.0 * scale, 100.0 * scale, colors::LASER_POST);
                s.fill_rect(pos.x + size - 5.0 * scale, laser_y, 5.0 * scale, 100.0 * scale, colors::LASER_POST);
            }
            EntityKind::Collectible { .. } => {
                let bob = (now_ms * 0.01).sin() * 10.0 * scale;
                let cy = pos.y - 30.0 * scale + bob;
                s.fill_ellipse(pos.x, cy, size / 2.0, size / 2.0, colors::COIN);
                s.set_glow(15.0, colors::COIN);
                s.stroke_ellipse(pos.x, cy, size / 2.0, size / 2.0, 1.0, colors::COIN_RING);
                s.set_glow(0.0, colors::COIN);
            }
        }
    }
}

fn draw_effects<S: Surface + ?Sized>(s: &mut S, session: &RunnerSession) {
    let fx = session.effects();
    for p in &fx.particles {
        s.set_alpha(p.life);
        s.fill_rect(p.pos.x, p.pos.y, 4.0, 4.0, p.color);
    }
    for t in &fx.texts {
        s.set_alpha(t.life);
        s.fill_text(&t.text, t.pos.x, t.pos.y, "bold 24px sans-serif", colors::TEXT);
    }
    s.set_alpha(1.0);
}

fn draw_player<S: Surface + ?Sized>(s: &mut S, session: &RunnerSession) {
    let player = session.player();
    let ground = session.player_ground_pos();
    let body = session.player_screen_pos();

    // squash while ducking, stretch while in the air
    let (sx, sy) = if player.crouching {
        (50.0, 25.0)
    } else if player.height > 0.0 {
        (40.0, 60.0)
    } else {
        (50.0, 50.0)
    };

    s.fill_ellipse(ground.x, ground.y + 25.0, 25.0, 10.0, colors::SHADOW);
    s.set_glow(20.0, colors::PLAYER);
    s.fill_ellipse(body.x, body.y, sx / 2.0, sy / 2.0, colors::PLAYER);
    s.fill_ellipse(body.x, body.y, sx * 0.3, sy * 0.3, colors::PLAYER_CORE);
    s.set_glow(0.0, colors::PLAYER);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunnerConfig;

    /// Records draw calls by shape and color.
    #[derive(Default)]
    struct Recorder {
        calls: Vec<(&'static str, String)>,
        alpha: f64,
    }

    impl Surface for Recorder {
        fn fill_rect(&mut self, _x: f64, _y: f64, _w: f64, _h: f64, color: &str) {
            self.calls.push(("rect", color.to_string()));
        }
        fn fill_ellipse(&mut self, _x: f64, _y: f64, _rx: f64, _ry: f64, color: &str) {
            self.calls.push(("ellipse", color.to_string()));
        }
        fn stroke_ellipse(&mut self, _x: f64, _y: f64, _rx: f64, _ry: f64, _w: f64, color: &str) {
            self.calls.push(("ring", color.to_string()));
        }
        fn stroke_line(&mut self, _from: (f64, f64), _to: (f64, f64), _w: f64, color: &str) {
            self.calls.push(("line", color.to_string()));
        }
        fn fill_text(&mut self, text: &str, _x: f64, _y: f64, _font: &str, _color: &str) {
            self.calls.push(("text", text.to_string()));
        }
        fn set_alpha(&mut self, alpha: f64) {
            self.alpha = alpha;
        }
        fn set_glow(&mut self, _blur: f64, _color: &str) {}
    }

    impl Recorder {
        fn count(&self, kind: &str, color: &str) -> usize {
            self.calls.iter().filter(|(k, c)| *k == kind && c == color).count()
        }
    }

    fn quiet_session(start_lane: u8) -> RunnerSession {
        let cfg = RunnerConfig { spawn_distance: 1e15, speed_increment: 0.0, start_lane, ..RunnerConfig::default() };
        RunnerSession::new(cfg, 5).unwrap()
    }

    #[test]
    fn empty_track_draws_background_lines_and_player() {
        let s = quiet_session(1);
        let mut r = Recorder::default();
        draw_scene(&mut r, &s, 0.0);
        assert_eq!(r.calls.first().map(|c| c.1.as_str()), Some(colors::BACKGROUND));
        // 4 divider lines for 3 lanes
        let dividers = r.calls.iter().filter(|(k, c)| *k == "line" && c == colors::GRID).count();
        assert!(dividers >= 4);
        assert_eq!(r.count("ellipse", colors::PLAYER), 1);
        assert_eq!(r.count("rect", colors::BOX), 0);
        assert_eq!(r.alpha, 1.0);
    }

    #[test]
    fn each_kind_has_its_sprite() {
        let mut s = quiet_session(1);
        s.spawn_at(0, 500.0, EntityKind::Hazard(Placement::Ground));
        s.spawn_at(1, 600.0, EntityKind::Hazard(Placement::Air));
        s.spawn_at(2, 700.0, EntityKind::Collectible { value: 100 });
        let mut r = Recorder::default();
        draw_scene(&mut r, &s, 0.0);
        assert_eq!(r.count("rect", colors::BOX), 1);
        assert_eq!(r.count("rect", colors::LASER), 1);
        assert_eq!(r.count("ellipse", colors::COIN), 1);
    }

    #[test]
    fn consumed_coin_is_not_drawn_but_effects_are() {
        let mut s = quiet_session(0);
        s.spawn_at(0, 85.0, EntityKind::Collectible { value: 100 });
        s.step(s.config().reference_frame_ms);
        assert_eq!(s.score(), 100);
        let mut r = Recorder::default();
        draw_scene(&mut r, &s, 0.0);
        assert_eq!(r.count("ellipse", colors::COIN), 0);
        assert_eq!(r.count("rect", colors::COIN), 5, "burst particles");
        assert!(r.calls.iter().any(|(k, t)| *k == "text" && t == "+100"));
    }
}
