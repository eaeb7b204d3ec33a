//! Depth-band + screen-distance hit testing and the pose rules.

use crate::runner::entity::{Entity, EntityKind, Placement};
use crate::runner::physics::Player;
use crate::runner::projection::{Projection, Viewport};

/// The parts of the player that decide which hazards it avoids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Pose {
    pub airborne: bool,
    pub crouching: bool,
}

impl Pose {
    pub fn of(player: &Player, ground_clearance: f64) -> Self {
        Self { airborne: player.height >= ground_clearance, crouching: player.crouching }
    }
}

/// Result of touching an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Contact {
    Crash(Placement),
    Collect(u32),
    /// Touched, but the pose avoids it (or the coin is already taken).
    Clear,
}

/// Pose rules:
/// - ground hazards are cleared while airborne
/// - air hazards are cleared while crouching
/// - coins are collected in any pose, once
pub fn resolve(kind: EntityKind, consumed: bool, pose: Pose) -> Contact {
    match kind {
        EntityKind::Hazard(Placement::Ground) if pose.airborne => Contact::Clear,
        EntityKind::Hazard(Placement::Air) if pose.crouching => Contact::Clear,
        EntityKind::Hazard(placement) => Contact::Crash(placement),
        EntityKind::Collectible { .. } if consumed => Contact::Clear,
        EntityKind::Collectible { value } => Contact::Collect(value),
    }
}

/// Swept band test: did the depth span covered this frame, `[depth, prev_depth]`,
/// overlap `center ± tolerance`? Catches fast entities that would skip the band.
pub fn in_depth_band(prev_depth: f64, depth: f64, center: f64, tolerance: f64) -> bool {
    let (near, far) = if prev_depth < depth { (prev_depth, depth) } else { (depth, prev_depth) };
    near < center + tolerance && far > center - tolerance
}

/// Collision parameters lifted from the config.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HitTest {
    pub player_depth: f64,
    pub depth_tolerance: f64,
    pub radius_px: f64,
    pub ground_clearance: f64,
}

impl HitTest {
    /// Horizontal screen distance between entity and player, if the entity is in the band.
    /// Both are measured at the player's depth: a fast entity may have stepped well
    /// past the band, where its lane has converged away from the player's.
    pub fn overlap(&self, entity: &Entity, prev_depth: f64, player: &Player, proj: &Projection, vp: &Viewport) -> Option<f64> {
        if !in_depth_band(prev_depth, entity.depth, self.player_depth, self.depth_tolerance) {
            return None;
        }
        let ex = proj.lane_center_x(entity.lane as f64, self.player_depth, vp);
        let px = proj.lane_center_x(player.lane_pos, self.player_depth, vp);
        let dx = (ex - px).abs();
        (dx < self.radius_px).then_some(dx)
    }

    /// Full test for one entity this frame. `None` means no contact at all.
    pub fn check(&self, entity: &Entity, prev_depth: f64, player: &Player, proj: &Projection, vp: &Viewport) -> Option<Contact> {
        self.overlap(entity, prev_depth, player, proj, vp)?;
        Some(resolve(entity.kind, entity.consumed, Pose::of(player, self.ground_clearance)))
    }
}
