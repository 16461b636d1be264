//! Per-tile buoyancy sampling and force aggregation.
//!
//! Every physics tick the aggregator turns cached wave samples into one net
//! force and one net torque. Wave sampling itself runs at a lower,
//! configurable rate than the physics tick; submersion always uses the
//! tile's current Y against the cached water height, so the raft still
//! reacts between cache refreshes.

use super::RaftBody;
use crate::body::{ForceAccumulator, PhysicsBody};
use crate::tile::TileId;
use crate::waves::{WaveField, WaveSample};
use glam::Vec3;
use std::collections::HashMap;

/// Rate-limited per-tile wave sample cache.
#[derive(Clone, Debug)]
pub struct WaveSampleCache {
    interval: f32,
    elapsed: f32,
    primed: bool,
    /// Raft topology serial this cache was refreshed against. A topology
    /// change invalidates immediately instead of waiting out the interval.
    serial: u64,
    samples: HashMap<TileId, WaveSample>,
    hull: WaveSample,
}

impl WaveSampleCache {
    pub fn new(sample_hz: f32) -> Self {
        Self {
            interval: 1.0 / sample_hz.max(0.001),
            elapsed: 0.0,
            primed: false,
            serial: 0,
            samples: HashMap::new(),
            hull: WaveSample::calm(),
        }
    }

    pub fn advance(&mut self, dt: f32) {
        self.elapsed += dt;
    }

    pub fn needs_refresh(&self, topology_serial: u64) -> bool {
        !self.primed || self.elapsed >= self.interval || self.serial != topology_serial
    }

    /// Resample the wave field at every connected tile and at the hull
    /// origin.
    pub fn refresh(
        &mut self,
        field: &WaveField,
        time: f64,
        raft: &RaftBody,
        body: &dyn PhysicsBody,
    ) {
        self.samples.clear();
        for (id, tile) in raft.connected_tiles() {
            let pos = body.translation() + body.orientation() * raft.local_offset(tile.grid_pos);
            self.samples.insert(id, field.sample(pos, time));
        }
        self.hull = field.sample(body.translation(), time);
        self.elapsed = 0.0;
        self.primed = true;
        self.serial = raft.topology_serial();
    }

    pub fn sample(&self, id: TileId) -> Option<&WaveSample> {
        self.samples.get(&id)
    }

    pub fn hull_sample(&self) -> &WaveSample {
        &self.hull
    }
}

impl RaftBody {
    /// Accumulate buoyancy, current drag, and wave-tilt torque for every
    /// connected tile. With zero tiles the hull itself floats on a sample
    /// taken at its own origin, so a just-spawned raft does not sink.
    pub fn accumulate_buoyancy(
        &self,
        body: &dyn PhysicsBody,
        cache: &WaveSampleCache,
        acc: &mut ForceAccumulator,
    ) {
        let p = self.params;

        if self.tile_count() == 0 {
            let s = cache.hull_sample();
            let submersion = s.height - body.translation().y + p.tile_draft;
            if submersion > 0.0 {
                acc.add_force_at(Vec3::Y * (submersion * p.buoyancy_force), Vec3::ZERO, 0.0);
                acc.add_force_at(s.current * p.current_drag, Vec3::ZERO, 0.0);
            }
            return;
        }

        let com = self.center_of_mass_world(body);

        for (id, tile) in self.connected_tiles() {
            let Some(s) = cache.sample(id) else {
                // Tile added after the last refresh; it will be sampled next
                // cache pass (the topology serial forces one immediately).
                continue;
            };

            let pos = body.translation() + body.orientation() * self.local_offset(tile.grid_pos);
            let arm = pos - com;

            // Submersion includes the draft offset. Tiles above their
            // buoyancy line contribute nothing: no suction.
            let submersion = s.height - pos.y + p.tile_draft;
            if submersion > 0.0 {
                let magnitude = submersion * p.buoyancy_force * tile.kind.buoyancy_factor();
                acc.add_force_at(Vec3::Y * magnitude, arm, p.force_distribution_weight);
                acc.add_force_at(s.current * p.current_drag, arm, p.force_distribution_weight);
            }

            // Wave slope tips the raft regardless of submersion depth.
            let slope = Vec3::new(s.normal.x, 0.0, s.normal.z);
            acc.add_torque(arm.cross(slope) * p.wave_tilt_strength);
        }
    }

    /// Accumulate spring corrections from the cached connection graph.
    /// Net force cancels pairwise; what remains is a torque nudging drifted
    /// tiles back toward rigid formation.
    pub fn accumulate_spring_corrections(
        &self,
        body: &dyn PhysicsBody,
        acc: &mut ForceAccumulator,
    ) {
        let p = self.params;
        let com = self.center_of_mass_world(body);

        let corrections = self
            .connection_graph()
            .spring_corrections(p.tile_size, p.spring_stiffness, |id| {
                self.tile_world_position(body, id)
            });

        for c in corrections {
            let Some(pos) = self.tile_world_position(body, c.tile) else {
                continue;
            };
            acc.add_force_at(c.force, pos - com, 1.0);
        }
    }
}
