//! Tilt monitoring and numerical stabilization.
//!
//! Under discrete-time force summation, small per-tile buoyancy and spring
//! noise compounds into runaway spin unless something bleeds it off. The
//! controller damps angular velocity every tick and, past half the tilt
//! threshold, applies corrective torque. Crossing the full threshold flips
//! the Stable/Unstable state machine and notifies collaborators (capsize
//! warning UI).

use super::RaftParams;
use crate::body::{ForceAccumulator, PhysicsBody};
use crate::events::{EventQueue, RaftEvent};
use glam::{Mat3, Quat, Vec2, Vec3};

/// Scales the dt-proportional correction term to the nominal tick rate.
const CORRECTION_FACTOR: f32 = 40.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StabilityState {
    Stable,
    Unstable,
}

/// Monitors tilt and keeps the aggregate from oscillating apart.
#[derive(Clone, Debug)]
pub struct StabilizationController {
    state: StabilityState,
}

impl Default for StabilizationController {
    fn default() -> Self {
        Self::new()
    }
}

impl StabilizationController {
    pub fn new() -> Self {
        Self {
            state: StabilityState::Stable,
        }
    }

    pub fn state(&self) -> StabilityState {
        self.state
    }

    pub fn is_stable(&self) -> bool {
        self.state == StabilityState::Stable
    }

    /// Extract (pitch, roll) from the orientation basis. Pitch comes from
    /// the Z basis vector's Y component, roll from the X basis vector's Y
    /// component, both through atan2. Level raft reads (0, 0).
    pub fn tilt(orientation: Quat) -> Vec2 {
        let basis = Mat3::from_quat(orientation);
        let pitch = (-basis.z_axis.y).atan2(basis.z_axis.z);
        let roll = basis.x_axis.y.atan2(basis.x_axis.x);
        Vec2::new(pitch, roll)
    }

    /// Run one tick: update the state machine, add corrective torque to the
    /// accumulator, and damp the body's angular velocity.
    pub fn update(
        &mut self,
        params: RaftParams,
        body: &mut dyn PhysicsBody,
        dt: f32,
        acc: &mut ForceAccumulator,
        events: &mut EventQueue,
    ) {
        let tilt = Self::tilt(body.orientation());
        let magnitude = tilt.length();

        let next = if magnitude >= params.max_tilt_deviation {
            StabilityState::Unstable
        } else {
            StabilityState::Stable
        };
        if next != self.state {
            self.state = next;
            events.push(RaftEvent::StabilityChanged {
                stable: next == StabilityState::Stable,
            });
        }

        // Correction engages at half the threshold so the raft rights
        // itself before the capsize warning trips.
        if magnitude > 0.5 * params.max_tilt_deviation {
            let torque = Vec3::new(-tilt.x, 0.0, -tilt.y)
                * (params.stabilization_stiffness * dt * CORRECTION_FACTOR);
            acc.add_torque(torque);
        }

        // Angular damping runs unconditionally.
        let w = body.angular_velocity();
        let damped = w.lerp(Vec3::ZERO, (dt * params.angular_damping).clamp(0.0, 1.0));
        body.set_angular_velocity(damped);
    }
}
