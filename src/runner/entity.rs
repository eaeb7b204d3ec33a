//! Obstacles and collectibles that scroll down the track.

/// Where a hazard sits vertically, which decides the pose that avoids it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Placement {
    /// A box on the floor. Jump over it.
    Ground,
    /// A laser gate at head height. Duck under it.
    Air,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Hazard(Placement),
    Collectible { value: u32 },
}

impl EntityKind {
    pub fn is_hazard(&self) -> bool {
        matches!(self, EntityKind::Hazard(_))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    pub id: u64,
    pub lane: u8,
    pub depth: f64,
    pub kind: EntityKind,
    /// Set once a collectible is picked up; it keeps scrolling but is inert and invisible.
    pub consumed: bool,
}

impl Entity {
    pub fn new(id: u64, lane: u8, depth: f64, kind: EntityKind) -> Self {
        Self { id, lane, depth, kind, consumed: false }
    }

    /// Move toward the camera, returning the depth before the move.
    pub fn advance(&mut self, distance: f64) -> f64 {
        let prev = self.depth;
        self.depth -= distance;
        prev
    }

    pub fn passed(&self, despawn_depth: f64) -> bool {
        self.depth < despawn_depth
    }

    pub fn is_live(&self) -> bool {
        !self.consumed
    }
}
