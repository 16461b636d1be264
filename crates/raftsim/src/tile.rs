//! Raft tiles: the individual buoyant units aggregated into one hull.

use serde::{Deserialize, Serialize};

/// Index of a tile inside a raft's tile pool. Stable across removals
/// until the slot is reused.
pub type TileId = usize;

/// Tile type, reduced to its physics-relevant parameters. Mesh, material
/// and collision shape selection live in the rendering collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileKind {
    Foundation,
    Floor,
    Sail,
    Mast,
    Storage,
}

impl TileKind {
    /// Buoyancy multiplier. Foundations carry the raft; masts and sails
    /// barely displace water.
    pub fn buoyancy_factor(self) -> f32 {
        match self {
            TileKind::Foundation => 1.0,
            TileKind::Floor => 0.7,
            TileKind::Storage => 0.5,
            TileKind::Mast => 0.2,
            TileKind::Sail => 0.1,
        }
    }

    /// Fraction of the tile's base mass counted toward the aggregate.
    pub fn mass_contribution(self) -> f32 {
        match self {
            TileKind::Foundation => 1.0,
            TileKind::Floor => 0.8,
            TileKind::Storage => 1.2,
            TileKind::Mast => 0.6,
            TileKind::Sail => 0.3,
        }
    }

    /// Base mass (kg).
    pub fn base_mass(self) -> f32 {
        match self {
            TileKind::Foundation => 50.0,
            TileKind::Floor => 30.0,
            TileKind::Storage => 45.0,
            TileKind::Mast => 25.0,
            TileKind::Sail => 10.0,
        }
    }

    /// Structural health ceiling.
    pub fn max_health(self) -> f32 {
        match self {
            TileKind::Foundation => 100.0,
            TileKind::Floor => 60.0,
            TileKind::Storage => 70.0,
            TileKind::Mast => 50.0,
            TileKind::Sail => 30.0,
        }
    }
}

/// A single buoyant unit.
#[derive(Clone, Copy, Debug)]
pub struct Tile {
    pub kind: TileKind,
    /// Grid coordinate within the owning raft. Unique per raft while
    /// connected.
    pub grid_pos: (i32, i32),
    /// Structural health in [0, kind.max_health()].
    pub health: f32,
    /// True while part of a raft aggregate. Disconnected tiles are free
    /// debris and receive no buoyancy or spring forces from the raft.
    pub connected: bool,
}

impl Tile {
    pub fn new(kind: TileKind, grid_pos: (i32, i32)) -> Self {
        Self {
            kind,
            grid_pos,
            health: kind.max_health(),
            connected: true,
        }
    }

    /// Mass counted toward the raft aggregate.
    pub fn effective_mass(&self) -> f32 {
        self.kind.base_mass() * self.kind.mass_contribution()
    }

    /// Apply damage. Returns true if this call brought health to zero.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if self.health <= 0.0 {
            return false;
        }
        self.health = (self.health - amount.max(0.0)).max(0.0);
        self.health <= 0.0
    }

    /// Restore health, clamped to the kind's ceiling.
    pub fn repair(&mut self, amount: f32) {
        self.health = (self.health + amount.max(0.0)).min(self.kind.max_health());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damage_clamps_at_zero_and_reports_destruction_once() {
        let mut tile = Tile::new(TileKind::Sail, (0, 0));
        assert!(!tile.take_damage(10.0));
        assert!(tile.take_damage(100.0));
        assert_eq!(tile.health, 0.0);
        // Already dead: further damage is not a second destruction.
        assert!(!tile.take_damage(5.0));
    }

    #[test]
    fn repair_clamps_at_max() {
        let mut tile = Tile::new(TileKind::Floor, (1, 2));
        tile.take_damage(25.0);
        tile.repair(1000.0);
        assert_eq!(tile.health, TileKind::Floor.max_health());
    }

    #[test]
    fn foundation_outfloats_sail() {
        assert!(TileKind::Foundation.buoyancy_factor() > TileKind::Sail.buoyancy_factor());
    }
}
