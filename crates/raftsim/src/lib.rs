//! Raft buoyancy and multi-body aggregation simulation.
//!
//! Treats a dynamically growing set of independently destructible tiles as
//! one coherent floating rigid body: per-tile wave sampling, distributed
//! buoyancy, soft inter-tile spring corrections, and tilt stabilization,
//! all summed into a single force/torque application per physics tick.
//!
//! # Example
//!
//! ```
//! use raftsim::{RaftParams, RaftSimulation, TileKind};
//!
//! let mut sim = RaftSimulation::new(RaftParams::default());
//! sim.raft.add_tile(TileKind::Foundation, (0, 0));
//! sim.raft.add_tile(TileKind::Foundation, (1, 0));
//!
//! // Run one second of fixed-timestep physics.
//! for _ in 0..60 {
//!     sim.step(1.0 / 60.0);
//! }
//!
//! for event in sim.raft.events.drain() {
//!     println!("{event:?}");
//! }
//! ```

pub mod body;
pub mod connections;
pub mod constants;
pub mod events;
pub mod raft;
pub mod serde_utils;
pub mod tile;
pub mod waves;

pub use body::{ForceAccumulator, HullBody, PhysicsBody};
pub use connections::{grid_distance, TileConnection, TileConnectionGraph};
pub use events::{DamageCause, EventQueue, RaftEvent};
pub use raft::{
    Debris, RaftBody, RaftParams, RaftSaveState, RaftState, StabilityState,
    StabilizationController, TileSaveState, WaveSampleCache,
};
pub use tile::{Tile, TileId, TileKind};
pub use waves::{WaveComponent, WaveField, WaveSample};

/// The whole aggregate wired together: wave field, raft, hull body, and
/// stabilization, driven by a fixed-timestep `step`.
pub struct RaftSimulation {
    /// Wave field, injected at construction. None means the raft behaves
    /// as if in a vacuum (logged once, never a crash).
    pub waves: Option<WaveField>,
    pub raft: RaftBody,
    pub body: HullBody,
    pub stabilizer: StabilizationController,
    cache: WaveSampleCache,
    time: f64,
    warned_missing_waves: bool,
}

impl RaftSimulation {
    pub fn new(params: RaftParams) -> Self {
        Self::with_waves(params, Some(WaveField::default()))
    }

    pub fn with_waves(params: RaftParams, waves: Option<WaveField>) -> Self {
        Self {
            waves,
            raft: RaftBody::new(params),
            body: HullBody::new(params.hull_mass),
            stabilizer: StabilizationController::new(),
            cache: WaveSampleCache::new(params.wave_sample_hz),
            time: 0.0,
            warned_missing_waves: false,
        }
    }

    /// Global simulation clock (s).
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Weather collaborator entry point.
    pub fn set_storm_intensity(&mut self, intensity: f32) {
        if let Some(field) = &mut self.waves {
            field.set_storm_intensity(intensity);
        }
    }

    /// Run one fixed physics tick. Order within the tick:
    /// buoyancy accumulation, spring corrections, stabilization, then a
    /// single force/torque application and integration. A destroyed raft
    /// is frozen and skips everything.
    pub fn step(&mut self, dt: f32) {
        if self.raft.is_destroyed() {
            return;
        }

        self.time += dt as f64;

        // Topology changes mass; keep the body in sync before forces.
        if (self.body.mass - self.raft.total_mass()).abs() > 1e-6 {
            self.body.set_mass(self.raft.total_mass());
        }

        let mut acc = ForceAccumulator::default();

        match &self.waves {
            Some(field) => {
                self.cache.advance(dt);
                if self.cache.needs_refresh(self.raft.topology_serial()) {
                    self.cache.refresh(field, self.time, &self.raft, &self.body);
                }
                self.raft.accumulate_buoyancy(&self.body, &self.cache, &mut acc);
            }
            None => {
                if !self.warned_missing_waves {
                    log::warn!("no wave field registered; buoyancy disabled for this raft");
                    self.warned_missing_waves = true;
                }
            }
        }

        self.raft.accumulate_spring_corrections(&self.body, &mut acc);

        self.stabilizer.update(
            self.raft.params,
            &mut self.body,
            dt,
            &mut acc,
            &mut self.raft.events,
        );

        acc.apply_to(&mut self.body);
        self.body.integrate(dt);
    }

    /// Damage the hull pool; destroys and freezes the raft at zero.
    pub fn damage_raft(&mut self, amount: f32) {
        let Self { raft, body, .. } = self;
        raft.damage(body, amount);
    }

    /// Destroy the raft and freeze the hull. Terminal and idempotent.
    pub fn destroy_raft(&mut self) {
        let Self { raft, body, .. } = self;
        raft.destroy_raft(body);
    }

    // ---- persistence seam ----

    pub fn save_state(&self) -> RaftSaveState {
        self.raft.save_state(&self.body)
    }

    pub fn from_save_state(
        params: RaftParams,
        waves: Option<WaveField>,
        state: &RaftSaveState,
    ) -> Self {
        let raft = RaftBody::from_save_state(params, state);
        let mut body = HullBody::new(raft.total_mass());
        body.position = state.position;
        body.rotation = state.rotation;
        body.velocity = state.linear_velocity;
        body.angular_velocity = state.angular_velocity;
        if raft.is_destroyed() {
            body.set_frozen(true);
        }

        Self {
            waves,
            raft,
            body,
            stabilizer: StabilizationController::new(),
            cache: WaveSampleCache::new(params.wave_sample_hz),
            time: 0.0,
            warned_missing_waves: false,
        }
    }
}
