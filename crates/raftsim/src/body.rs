//! Rigid body seam between the raft aggregate and the host physics engine.
//!
//! The aggregation layer only needs a small surface: apply one net force and
//! one net torque per tick, read the transform and velocities, and damp
//! angular velocity. `PhysicsBody` captures that surface so the raft can sit
//! on top of any engine. `HullBody` is the in-crate reference integrator
//! used by the tests and headless simulations.

use crate::constants::{MAX_BODY_ANGULAR_VELOCITY, MAX_BODY_VELOCITY};
use glam::{Mat3, Quat, Vec3};

/// Engine-facing rigid body surface consumed by the aggregation layer.
pub trait PhysicsBody {
    fn translation(&self) -> Vec3;
    fn orientation(&self) -> Quat;
    fn linear_velocity(&self) -> Vec3;
    fn angular_velocity(&self) -> Vec3;
    fn set_angular_velocity(&mut self, angular_velocity: Vec3);

    /// Accumulate a force through the center of mass for this tick.
    fn apply_force(&mut self, force: Vec3);

    /// Accumulate a torque for this tick.
    fn apply_torque(&mut self, torque: Vec3);

    /// Freeze or unfreeze the body. Frozen bodies ignore forces and do not
    /// integrate (terminal destroyed-raft state).
    fn set_frozen(&mut self, frozen: bool);

    /// Transform as a flat float array (3x3 basis columns + origin), the
    /// layout the replication collaborator interpolates on remote peers.
    fn transform_floats(&self) -> [f32; 12] {
        let basis = Mat3::from_quat(self.orientation());
        let origin = self.translation();
        [
            basis.x_axis.x,
            basis.x_axis.y,
            basis.x_axis.z,
            basis.y_axis.x,
            basis.y_axis.y,
            basis.y_axis.z,
            basis.z_axis.x,
            basis.z_axis.y,
            basis.z_axis.z,
            origin.x,
            origin.y,
            origin.z,
        ]
    }
}

/// Reference rigid body: semi-implicit Euler with a scalar inverse inertia.
#[derive(Clone, Debug)]
pub struct HullBody {
    pub position: Vec3,
    pub velocity: Vec3,
    pub rotation: Quat,
    pub angular_velocity: Vec3,
    /// Total mass including tile contributions; kept in sync by the raft.
    pub mass: f32,
    /// Scalar inverse moment of inertia. A full tensor is overkill for a
    /// flat plank raft.
    pub inv_inertia: f32,
    pub gravity: Vec3,
    /// Per-second linear velocity decay from water drag.
    pub linear_damping: f32,
    frozen: bool,
    force_accum: Vec3,
    torque_accum: Vec3,
}

impl HullBody {
    pub fn new(mass: f32) -> Self {
        let mass = mass.max(0.001);
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            angular_velocity: Vec3::ZERO,
            mass,
            inv_inertia: 1.0 / mass,
            gravity: Vec3::new(0.0, crate::constants::GRAVITY, 0.0),
            linear_damping: 0.3,
            frozen: false,
            force_accum: Vec3::ZERO,
            torque_accum: Vec3::ZERO,
        }
    }

    /// Update mass (and the derived scalar inertia) after a topology change.
    pub fn set_mass(&mut self, mass: f32) {
        self.mass = mass.max(0.001);
        self.inv_inertia = 1.0 / self.mass;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Integrate one fixed timestep, consuming accumulated force and torque.
    pub fn integrate(&mut self, dt: f32) {
        if self.frozen {
            self.force_accum = Vec3::ZERO;
            self.torque_accum = Vec3::ZERO;
            return;
        }

        self.velocity += (self.force_accum / self.mass + self.gravity) * dt;
        self.velocity *= (1.0 - self.linear_damping * dt).max(0.0);
        self.velocity = self.velocity.clamp_length_max(MAX_BODY_VELOCITY);
        self.position += self.velocity * dt;

        self.angular_velocity += self.torque_accum * self.inv_inertia * dt;
        self.angular_velocity = self
            .angular_velocity
            .clamp_length_max(MAX_BODY_ANGULAR_VELOCITY);
        if self.angular_velocity.length_squared() > 1e-12 {
            let delta = Quat::from_scaled_axis(self.angular_velocity * dt);
            self.rotation = (delta * self.rotation).normalize();
        }

        self.force_accum = Vec3::ZERO;
        self.torque_accum = Vec3::ZERO;
    }
}

impl PhysicsBody for HullBody {
    fn translation(&self) -> Vec3 {
        self.position
    }

    fn orientation(&self) -> Quat {
        self.rotation
    }

    fn linear_velocity(&self) -> Vec3 {
        self.velocity
    }

    fn angular_velocity(&self) -> Vec3 {
        self.angular_velocity
    }

    fn set_angular_velocity(&mut self, angular_velocity: Vec3) {
        if !self.frozen {
            self.angular_velocity = angular_velocity;
        }
    }

    fn apply_force(&mut self, force: Vec3) {
        if !self.frozen && force.is_finite() {
            self.force_accum += force;
        }
    }

    fn apply_torque(&mut self, torque: Vec3) {
        if !self.frozen && torque.is_finite() {
            self.torque_accum += torque;
        }
    }

    fn set_frozen(&mut self, frozen: bool) {
        self.frozen = frozen;
        if frozen {
            self.velocity = Vec3::ZERO;
            self.angular_velocity = Vec3::ZERO;
            self.force_accum = Vec3::ZERO;
            self.torque_accum = Vec3::ZERO;
        }
    }
}

/// Per-tick force/torque accumulator. Everything feeding the raft body sums
/// in here first, then gets applied with exactly one `apply_force` and one
/// `apply_torque` call so results never depend on contribution order inside
/// the engine's solver.
#[derive(Clone, Copy, Debug, Default)]
pub struct ForceAccumulator {
    pub force: Vec3,
    pub torque: Vec3,
}

impl ForceAccumulator {
    /// Add a force acting at `arm` relative to the center of mass. The
    /// torque contribution is scaled by `torque_weight` in [0, 1]: 0 moves
    /// the force entirely to the center of mass, 1 keeps it fully at the
    /// tile.
    pub fn add_force_at(&mut self, force: Vec3, arm: Vec3, torque_weight: f32) {
        if !force.is_finite() || !arm.is_finite() {
            return;
        }
        self.force += force;
        self.torque += arm.cross(force) * torque_weight.clamp(0.0, 1.0);
    }

    pub fn add_torque(&mut self, torque: Vec3) {
        if torque.is_finite() {
            self.torque += torque;
        }
    }

    /// Flush into the body with single force/torque calls.
    pub fn apply_to(&self, body: &mut dyn PhysicsBody) {
        body.apply_force(self.force);
        body.apply_torque(self.torque);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_falls_under_gravity_without_forces() {
        let mut body = HullBody::new(10.0);
        for _ in 0..60 {
            body.integrate(1.0 / 60.0);
        }
        assert!(body.position.y < -2.0);
    }

    #[test]
    fn upward_force_balancing_gravity_hovers() {
        let mut body = HullBody::new(10.0);
        body.linear_damping = 0.0;
        for _ in 0..120 {
            body.apply_force(Vec3::new(0.0, 10.0 * 9.81, 0.0));
            body.integrate(1.0 / 60.0);
        }
        assert!(body.position.y.abs() < 1e-3);
    }

    #[test]
    fn frozen_body_ignores_everything() {
        let mut body = HullBody::new(10.0);
        body.set_frozen(true);
        body.apply_force(Vec3::new(0.0, 1e6, 0.0));
        body.apply_torque(Vec3::new(1e6, 0.0, 0.0));
        body.integrate(1.0 / 60.0);
        assert_eq!(body.position, Vec3::ZERO);
        assert_eq!(body.angular_velocity, Vec3::ZERO);
    }

    #[test]
    fn accumulator_rejects_nan_contributions() {
        let mut acc = ForceAccumulator::default();
        acc.add_force_at(Vec3::new(f32::NAN, 0.0, 0.0), Vec3::X, 1.0);
        acc.add_force_at(Vec3::Y, Vec3::X, 1.0);
        assert!(acc.force.is_finite());
        assert_eq!(acc.force, Vec3::Y);
    }

    #[test]
    fn torque_weight_zero_moves_force_to_center() {
        let mut acc = ForceAccumulator::default();
        acc.add_force_at(Vec3::Y, Vec3::X * 3.0, 0.0);
        assert_eq!(acc.torque, Vec3::ZERO);
        assert_eq!(acc.force, Vec3::Y);
    }

    #[test]
    fn transform_floats_layout() {
        let mut body = HullBody::new(1.0);
        body.position = Vec3::new(1.0, 2.0, 3.0);
        let t = body.transform_floats();
        // Identity basis columns then origin.
        assert_eq!(&t[0..3], &[1.0, 0.0, 0.0]);
        assert_eq!(&t[3..6], &[0.0, 1.0, 0.0]);
        assert_eq!(&t[6..9], &[0.0, 0.0, 1.0]);
        assert_eq!(&t[9..12], &[1.0, 2.0, 3.0]);
    }
}
