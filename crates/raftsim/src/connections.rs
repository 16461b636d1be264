//! Inter-tile connection graph and soft spring corrections.
//!
//! Connections are derived, never persisted: the graph is rebuilt from the
//! current tile set on every add/remove/destroy, not every tick. Pair
//! enumeration is O(n^2), acceptable only because rafts are capped at 64
//! tiles; a spatial index would be needed beyond that.

use crate::tile::TileId;
use glam::Vec3;

/// Maximum Chebyshev grid distance that still forms a connection
/// (direct neighbors and one diagonal hop).
pub const MAX_CONNECTION_DISTANCE: i32 = 2;

/// Chebyshev distance between two grid coordinates.
pub fn grid_distance(a: (i32, i32), b: (i32, i32)) -> i32 {
    (a.0 - b.0).abs().max((a.1 - b.1).abs())
}

/// A spring-like link between two tiles of the same raft.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileConnection {
    pub a: TileId,
    pub b: TileId,
    pub grid_distance: i32,
    /// 1/(distance+1): direct neighbors 0.5, diagonal hops 1/3.
    pub strength: f32,
}

/// Correction force for one endpoint of a stretched connection.
#[derive(Clone, Copy, Debug)]
pub struct SpringCorrection {
    pub tile: TileId,
    pub force: Vec3,
}

/// Derived connection set for one raft.
#[derive(Clone, Debug, Default)]
pub struct TileConnectionGraph {
    connections: Vec<TileConnection>,
}

impl TileConnectionGraph {
    /// Rebuild from the current connected tile set. Each unordered pair
    /// appears at most once (a < b in pool order).
    pub fn rebuild(&mut self, tiles: &[(TileId, (i32, i32))]) {
        self.connections.clear();

        for (i, &(id_a, pos_a)) in tiles.iter().enumerate() {
            for &(id_b, pos_b) in &tiles[i + 1..] {
                let distance = grid_distance(pos_a, pos_b);
                if distance > MAX_CONNECTION_DISTANCE {
                    continue;
                }
                self.connections.push(TileConnection {
                    a: id_a,
                    b: id_b,
                    grid_distance: distance,
                    strength: 1.0 / (distance + 1) as f32,
                });
            }
        }
    }

    pub fn connections(&self) -> &[TileConnection] {
        &self.connections
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Compute equal/opposite spring corrections for every connection whose
    /// endpoints are both still connected.
    ///
    /// `world_position` returns the current world position of a tile, or
    /// None if the tile disconnected mid-tick (it may already be queued for
    /// removal and must not receive forces).
    ///
    /// This is a soft constraint: it nudges tiles that drifted from rigid
    /// formation back toward their ideal spacing without fighting the
    /// engine's own compound-shape behavior.
    pub fn spring_corrections<F>(
        &self,
        tile_size: f32,
        stiffness: f32,
        mut world_position: F,
    ) -> Vec<SpringCorrection>
    where
        F: FnMut(TileId) -> Option<Vec3>,
    {
        let mut out = Vec::with_capacity(self.connections.len() * 2);

        for conn in &self.connections {
            let (Some(pos_a), Some(pos_b)) = (world_position(conn.a), world_position(conn.b))
            else {
                continue;
            };

            let ideal = conn.grid_distance as f32 * tile_size;
            let delta = pos_b - pos_a;
            let current = delta.length();
            let displacement = current - ideal;

            // Coincident tiles have no meaningful direction; fall back to +X
            // rather than normalizing a zero vector into NaN.
            let direction = if current > 1e-6 { delta / current } else { Vec3::X };

            let force = direction * (displacement * stiffness * conn.strength);
            if !force.is_finite() {
                continue;
            }

            out.push(SpringCorrection { tile: conn.a, force });
            out.push(SpringCorrection { tile: conn.b, force: -force });
        }

        out
    }
}
