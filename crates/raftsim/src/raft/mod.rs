//! The raft aggregate: a compound rigid body built from destructible tiles.
//!
//! The raft owns its tiles in a dense pool (`Vec<Tile>` plus a free list);
//! the grid map holds pool indices, never pointers. Collaborators refer to
//! tiles by `TileId`. A tile belongs to at most one raft; the `connected`
//! flag plus the raft's exclusive ownership of the pool is the whole
//! consistency story - everything runs on the physics thread.
//!
//! Health model: per-tile health is the structural integrity of that tile
//! (zero means the tile breaks off as debris). Hull health is an independent
//! pool belonging to the base hull; it is not derived from tile healths, and
//! reaching zero destroys the whole raft.

mod buoyancy;
mod stability;

pub use buoyancy::WaveSampleCache;
pub use stability::{StabilityState, StabilizationController};

use crate::body::PhysicsBody;
use crate::connections::TileConnectionGraph;
use crate::events::{DamageCause, EventQueue, RaftEvent};
use crate::serde_utils;
use crate::tile::{Tile, TileId, TileKind};
use glam::{Quat, Vec3};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Every tunable of the aggregation layer in one place.
#[derive(Clone, Copy, Debug)]
pub struct RaftParams {
    /// Upward force per meter of submersion per unit buoyancy factor.
    pub buoyancy_force: f32,
    /// Freeboard offset added before the buoyancy line: how deep a tile
    /// sits before resisting (m).
    pub tile_draft: f32,
    /// Edge length of one grid cell (m).
    pub tile_size: f32,
    /// Spring stiffness for inter-tile corrections.
    pub spring_stiffness: f32,
    /// How strongly the horizontal wave normal tilts the raft.
    pub wave_tilt_strength: f32,
    /// Drag coefficient coupling the ambient current to the raft.
    pub current_drag: f32,
    /// Tilt magnitude (rad) beyond which the raft counts as unstable.
    pub max_tilt_deviation: f32,
    /// Corrective torque stiffness while tilted.
    pub stabilization_stiffness: f32,
    /// Per-second angular velocity decay.
    pub angular_damping: f32,
    /// Hard cap on tiles per raft. Connection rebuild is O(n^2) in this.
    pub max_tiles: usize,
    /// Mass of the bare hull with no tiles (kg).
    pub hull_mass: f32,
    /// Hull health pool ceiling.
    pub max_hull_health: f32,
    /// Torque-distribution blend for per-tile buoyancy in [0, 1]:
    /// 0 applies all buoyancy at the center of mass (no tilt),
    /// 1 keeps every force fully at its tile.
    pub force_distribution_weight: f32,
    /// Wave cache refresh rate (Hz), decoupled from the physics tick.
    pub wave_sample_hz: f32,
    /// Impulse magnitude given to tiles breaking off as debris.
    pub debris_impulse: f32,
}

impl Default for RaftParams {
    fn default() -> Self {
        Self {
            buoyancy_force: 2000.0,
            tile_draft: 0.5,
            tile_size: 2.0,
            spring_stiffness: 4.0,
            wave_tilt_strength: 0.8,
            current_drag: 0.6,
            max_tilt_deviation: 0.35,
            stabilization_stiffness: 6.0,
            angular_damping: 1.5,
            max_tiles: 64,
            hull_mass: 20.0,
            max_hull_health: 100.0,
            force_distribution_weight: 0.6,
            wave_sample_hz: 20.0,
            debris_impulse: 4.0,
        }
    }
}

/// Raft lifecycle state. Destruction is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RaftState {
    Active,
    Destroyed,
}

/// A tile that broke off the raft, handed to collaborators for free-body
/// spawning, loot and VFX.
#[derive(Clone, Copy, Debug)]
pub struct Debris {
    pub kind: TileKind,
    pub position: Vec3,
    pub velocity: Vec3,
}

/// Per-tile persisted fields.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TileSaveState {
    pub kind: TileKind,
    pub grid_pos: (i32, i32),
    pub health: f32,
}

/// Everything the persistence collaborator needs to restore a raft. The
/// on-disk encoding is its concern, not ours.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RaftSaveState {
    pub tiles: Vec<TileSaveState>,
    pub hull_health: f32,
    pub state: RaftState,
    #[serde(
        serialize_with = "serde_utils::serialize_vec3",
        deserialize_with = "serde_utils::deserialize_vec3"
    )]
    pub position: Vec3,
    #[serde(
        serialize_with = "serde_utils::serialize_quat",
        deserialize_with = "serde_utils::deserialize_quat"
    )]
    pub rotation: Quat,
    #[serde(
        serialize_with = "serde_utils::serialize_vec3",
        deserialize_with = "serde_utils::deserialize_vec3"
    )]
    pub linear_velocity: Vec3,
    #[serde(
        serialize_with = "serde_utils::serialize_vec3",
        deserialize_with = "serde_utils::deserialize_vec3"
    )]
    pub angular_velocity: Vec3,
}

/// The compound raft body: tile pool, derived aggregates, and lifecycle.
#[derive(Clone, Debug)]
pub struct RaftBody {
    pub params: RaftParams,
    tiles: Vec<Tile>,
    free: Vec<TileId>,
    grid: HashMap<(i32, i32), TileId>,
    graph: TileConnectionGraph,
    hull_health: f32,
    state: RaftState,
    total_mass: f32,
    /// Center of mass offset in hull-local space. Derived; used only for
    /// torque-arm calculations, never fed back into integration.
    center_of_mass: Vec3,
    /// Bumped on every add/remove so caches (wave samples) know to refresh.
    topology_serial: u64,
    pub events: EventQueue,
    debris: Vec<Debris>,
    rng: StdRng,
}

impl RaftBody {
    pub fn new(params: RaftParams) -> Self {
        Self {
            params,
            tiles: Vec::new(),
            free: Vec::new(),
            grid: HashMap::new(),
            graph: TileConnectionGraph::default(),
            hull_health: params.max_hull_health,
            state: RaftState::Active,
            total_mass: params.hull_mass,
            center_of_mass: Vec3::ZERO,
            topology_serial: 0,
            events: EventQueue::default(),
            debris: Vec::new(),
            rng: StdRng::seed_from_u64(0x5eaf_00d),
        }
    }

    // ---- accessors ----

    pub fn state(&self) -> RaftState {
        self.state
    }

    pub fn is_destroyed(&self) -> bool {
        self.state == RaftState::Destroyed
    }

    pub fn hull_health(&self) -> f32 {
        self.hull_health
    }

    pub fn total_mass(&self) -> f32 {
        self.total_mass
    }

    /// Center-of-mass offset in hull-local space.
    pub fn center_of_mass(&self) -> Vec3 {
        self.center_of_mass
    }

    pub fn tile_count(&self) -> usize {
        self.grid.len()
    }

    pub fn occupied(&self, grid_pos: (i32, i32)) -> bool {
        self.grid.contains_key(&grid_pos)
    }

    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(id).filter(|t| t.connected)
    }

    pub fn tile_at(&self, grid_pos: (i32, i32)) -> Option<TileId> {
        self.grid.get(&grid_pos).copied()
    }

    /// Connected tiles as (id, tile) pairs, in pool order.
    pub fn connected_tiles(&self) -> impl Iterator<Item = (TileId, &Tile)> {
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, t)| t.connected)
    }

    pub fn connection_graph(&self) -> &TileConnectionGraph {
        &self.graph
    }

    pub fn topology_serial(&self) -> u64 {
        self.topology_serial
    }

    /// Debris produced since the last call. Collaborators spawn free
    /// bodies, loot and splashes from these.
    pub fn take_debris(&mut self) -> Vec<Debris> {
        std::mem::take(&mut self.debris)
    }

    // ---- geometry ----

    /// Tile position in hull-local space.
    pub fn local_offset(&self, grid_pos: (i32, i32)) -> Vec3 {
        Vec3::new(
            grid_pos.0 as f32 * self.params.tile_size,
            0.0,
            grid_pos.1 as f32 * self.params.tile_size,
        )
    }

    /// Tile position in world space. Tiles follow the hull rigidly.
    pub fn tile_world_position(&self, body: &dyn PhysicsBody, id: TileId) -> Option<Vec3> {
        let tile = self.tile(id)?;
        Some(body.translation() + body.orientation() * self.local_offset(tile.grid_pos))
    }

    /// Derived center of mass in world space.
    pub fn center_of_mass_world(&self, body: &dyn PhysicsBody) -> Vec3 {
        body.translation() + body.orientation() * self.center_of_mass
    }

    // ---- tile lifecycle ----

    /// Place a tile. Returns the tile id, or None if the raft is destroyed,
    /// full, or the grid position is already occupied. Failure never
    /// mutates; the building collaborator re-validates and retries.
    pub fn add_tile(&mut self, kind: TileKind, grid_pos: (i32, i32)) -> Option<TileId> {
        if self.state == RaftState::Destroyed {
            return None;
        }
        if self.grid.len() >= self.params.max_tiles {
            log::debug!("add_tile rejected: raft full ({} tiles)", self.grid.len());
            return None;
        }
        if self.grid.contains_key(&grid_pos) {
            return None;
        }

        let tile = Tile::new(kind, grid_pos);
        let id = match self.free.pop() {
            Some(slot) => {
                self.tiles[slot] = tile;
                slot
            }
            None => {
                self.tiles.push(tile);
                self.tiles.len() - 1
            }
        };

        self.grid.insert(grid_pos, id);
        self.rebuild_aggregates();
        self.events.push(RaftEvent::TileAdded { id, grid_pos });
        Some(id)
    }

    /// Detach a tile without destroying it. No-op (false) if the id is not
    /// a connected tile of this raft.
    pub fn remove_tile(&mut self, id: TileId) -> bool {
        let Some(tile) = self.tiles.get_mut(id) else {
            return false;
        };
        if !tile.connected {
            return false;
        }

        tile.connected = false;
        let grid_pos = tile.grid_pos;
        let removed = self.grid.remove(&grid_pos);
        debug_assert_eq!(removed, Some(id), "grid map out of sync with tile pool");

        self.free.push(id);
        self.rebuild_aggregates();
        self.events.push(RaftEvent::TileRemoved { id, grid_pos });
        true
    }

    /// Destroy a tile: detach it and scatter it outward and upward as
    /// debris. Returns false if the tile was not connected.
    pub fn destroy_tile(&mut self, body: &dyn PhysicsBody, id: TileId, cause: DamageCause) -> bool {
        let Some(tile) = self.tile(id).copied() else {
            return false;
        };
        let world_pos = body.translation() + body.orientation() * self.local_offset(tile.grid_pos);

        if !self.remove_tile(id) {
            return false;
        }

        let velocity = self.scatter_velocity(body, world_pos);
        self.debris.push(Debris {
            kind: tile.kind,
            position: world_pos,
            velocity,
        });
        self.events.push(RaftEvent::TileDestroyed {
            id,
            grid_pos: tile.grid_pos,
            cause,
        });
        true
    }

    /// Damage entry point for sharks and other damage-source collaborators.
    /// Returns true if the tile was destroyed by this hit.
    pub fn damage_tile(
        &mut self,
        body: &dyn PhysicsBody,
        id: TileId,
        amount: f32,
        cause: DamageCause,
    ) -> bool {
        let Some(tile) = self.tiles.get_mut(id) else {
            return false;
        };
        if !tile.connected {
            return false;
        }
        if tile.take_damage(amount) {
            return self.destroy_tile(body, id, cause);
        }
        false
    }

    /// Repair a connected tile. Returns false if the id is not connected.
    pub fn repair_tile(&mut self, id: TileId, amount: f32) -> bool {
        match self.tiles.get_mut(id) {
            Some(tile) if tile.connected => {
                tile.repair(amount);
                true
            }
            _ => false,
        }
    }

    // ---- hull health ----

    /// Damage the hull pool. Reaching zero destroys the raft. No-op on a
    /// destroyed raft.
    pub fn damage(&mut self, body: &mut dyn PhysicsBody, amount: f32) {
        if self.state == RaftState::Destroyed {
            return;
        }
        self.hull_health = (self.hull_health - amount.max(0.0)).max(0.0);
        if self.hull_health <= 0.0 {
            self.destroy_raft(body);
        }
    }

    /// Heal the hull pool, clamped to the ceiling. No-op once destroyed.
    pub fn heal(&mut self, amount: f32) {
        if self.state == RaftState::Destroyed {
            return;
        }
        self.hull_health = (self.hull_health + amount.max(0.0)).min(self.params.max_hull_health);
    }

    /// Terminal destruction: every tile scatters explosively, the hull body
    /// freezes, and the raft stops simulating. Idempotent.
    pub fn destroy_raft(&mut self, body: &mut dyn PhysicsBody) {
        if self.state == RaftState::Destroyed {
            return;
        }

        let ids: Vec<TileId> = self.connected_tiles().map(|(id, _)| id).collect();
        for id in ids {
            let tile = self.tiles[id];
            let world_pos =
                body.translation() + body.orientation() * self.local_offset(tile.grid_pos);
            let velocity = self.scatter_velocity(body, world_pos);
            self.tiles[id].connected = false;
            self.debris.push(Debris {
                kind: tile.kind,
                position: world_pos,
                velocity,
            });
        }

        self.grid.clear();
        self.free.clear();
        self.graph = TileConnectionGraph::default();
        self.hull_health = 0.0;
        self.state = RaftState::Destroyed;
        self.topology_serial += 1;
        body.set_frozen(true);
        self.events.push(RaftEvent::RaftDestroyed);
        log::debug!("raft destroyed, {} tiles scattered", self.debris.len());
    }

    // ---- derived aggregates ----

    /// Recompute mass, center of mass, and the connection graph after any
    /// topology change. Not called per tick.
    fn rebuild_aggregates(&mut self) {
        let mut mass = self.params.hull_mass;
        let mut weighted = Vec3::ZERO;
        let mut entries = Vec::with_capacity(self.grid.len());

        for (id, tile) in self.tiles.iter().enumerate().filter(|(_, t)| t.connected) {
            let m = tile.effective_mass();
            mass += m;
            weighted += self.local_offset(tile.grid_pos) * m;
            entries.push((id, tile.grid_pos));
        }

        self.total_mass = mass;
        self.center_of_mass = if mass > 0.0 { weighted / mass } else { Vec3::ZERO };
        self.graph.rebuild(&entries);
        self.topology_serial += 1;

        debug_assert_eq!(
            self.grid.len(),
            self.tiles.iter().filter(|t| t.connected).count(),
            "grid map out of sync with tile pool"
        );
    }

    /// Outward-and-up velocity for a tile breaking off near `world_pos`,
    /// with a little seeded jitter so debris fans out.
    fn scatter_velocity(&mut self, body: &dyn PhysicsBody, world_pos: Vec3) -> Vec3 {
        let com = self.center_of_mass_world(body);
        let mut outward = world_pos - com;
        outward.y = 0.0;
        let outward = if outward.length_squared() > 1e-6 {
            outward.normalize()
        } else {
            // Tile at the exact center: pick a deterministic sideways kick.
            Vec3::X
        };

        let jitter = self.rng.gen_range(0.8..1.2);
        let lateral = Vec3::new(
            self.rng.gen_range(-0.3..0.3),
            0.0,
            self.rng.gen_range(-0.3..0.3),
        );
        (outward + Vec3::Y * 1.2 + lateral) * self.params.debris_impulse * jitter
    }

    // ---- persistence ----

    pub fn save_state(&self, body: &dyn PhysicsBody) -> RaftSaveState {
        RaftSaveState {
            tiles: self
                .connected_tiles()
                .map(|(_, t)| TileSaveState {
                    kind: t.kind,
                    grid_pos: t.grid_pos,
                    health: t.health,
                })
                .collect(),
            hull_health: self.hull_health,
            state: self.state,
            position: body.translation(),
            rotation: body.orientation(),
            linear_velocity: body.linear_velocity(),
            angular_velocity: body.angular_velocity(),
        }
    }

    /// Rebuild a raft from a save state. Tiles with duplicate grid
    /// positions or beyond the tile cap are dropped with a warning rather
    /// than corrupting the grid map.
    pub fn from_save_state(params: RaftParams, state: &RaftSaveState) -> Self {
        let mut raft = Self::new(params);
        for tile in &state.tiles {
            match raft.add_tile(tile.kind, tile.grid_pos) {
                Some(id) => {
                    let restored = &mut raft.tiles[id];
                    restored.health = tile.health.clamp(0.0, tile.kind.max_health());
                }
                None => {
                    log::warn!(
                        "save state tile at {:?} dropped (duplicate or over cap)",
                        tile.grid_pos
                    );
                }
            }
        }
        // Loading emitted TileAdded events; a restore is not new construction.
        raft.events.drain();
        raft.hull_health = state.hull_health.clamp(0.0, params.max_hull_health);
        raft.state = state.state;
        raft
    }
}
