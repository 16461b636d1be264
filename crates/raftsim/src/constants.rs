//! Physical constants for the raft simulation.

/// Gravity acceleration (m/s^2) - negative Y direction.
pub const GRAVITY: f32 = -9.81;

/// Density of water (kg/m^3).
pub const WATER_DENSITY: f32 = 1000.0;

/// Sea level (world Y) around which the wave field oscillates.
pub const SEA_LEVEL: f32 = 0.0;

/// Finite-difference probe distance for wave normal estimation (m).
pub const WAVE_NORMAL_EPSILON: f32 = 0.1;

/// Velocity clamp for the reference hull integrator (m/s).
///
/// Without clamping, a bad force spike (e.g. a tile teleported by an
/// external collision response) can push the hull to escape velocity in
/// one tick and the aggregate never recovers.
pub const MAX_BODY_VELOCITY: f32 = 30.0;

/// Angular velocity clamp for the reference hull integrator (rad/s).
pub const MAX_BODY_ANGULAR_VELOCITY: f32 = 8.0;
