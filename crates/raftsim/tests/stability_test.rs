//! Stabilization behavior: tilt convergence, capsize notifications, and
//! angular damping under discrete-time force summation.

use glam::{Quat, Vec3};
use raftsim::{
    RaftEvent, RaftParams, RaftSimulation, StabilityState, StabilizationController, TileKind,
};

const DT: f32 = 1.0 / 60.0;

/// Simulation with no waves and no gravity: the only dynamics left are the
/// stabilization controller's.
fn tilt_rig(initial_pitch: f32) -> RaftSimulation {
    let mut sim = RaftSimulation::with_waves(RaftParams::default(), None);
    sim.body.gravity = Vec3::ZERO;
    sim.body.rotation = Quat::from_rotation_x(initial_pitch);
    sim
}

#[test]
fn tilt_converges_under_correction() {
    let params = RaftParams::default();
    // Start inside the corrective regime but below the capsize threshold.
    let initial = 0.3;
    assert!(initial > 0.5 * params.max_tilt_deviation);
    assert!(initial < params.max_tilt_deviation);

    let mut sim = tilt_rig(initial);
    let half = 0.5 * params.max_tilt_deviation;

    let mut previous = StabilizationController::tilt(sim.body.rotation).length();
    let mut converged = false;

    for tick in 0..7200 {
        sim.step(DT);
        let tilt = StabilizationController::tilt(sim.body.rotation).length();

        if tilt < half {
            converged = true;
            break;
        }
        // Strictly decreasing tick-over-tick once the corrective torque has
        // had a tick to build angular velocity.
        if tick > 2 {
            assert!(
                tilt < previous + 1e-7,
                "tilt grew at tick {tick}: {tilt} vs {previous}"
            );
        }
        previous = tilt;
    }

    assert!(converged, "never left the corrective regime: {previous}");
}

#[test]
fn capsize_threshold_emits_unstable_then_stable() {
    let params = RaftParams::default();
    let mut sim = tilt_rig(params.max_tilt_deviation + 0.15);

    sim.step(DT);
    let events = sim.raft.events.drain();
    assert!(events.contains(&RaftEvent::StabilityChanged { stable: false }));
    assert_eq!(sim.stabilizer.state(), StabilityState::Unstable);

    // Let the controller right the raft; it must announce recovery.
    let mut recovered = false;
    for _ in 0..14400 {
        sim.step(DT);
        if sim
            .raft
            .events
            .drain()
            .contains(&RaftEvent::StabilityChanged { stable: true })
        {
            recovered = true;
            break;
        }
    }
    assert!(recovered);
    assert_eq!(sim.stabilizer.state(), StabilityState::Stable);
}

#[test]
fn spin_decays_even_when_level() {
    let mut sim = tilt_rig(0.0);
    sim.body.angular_velocity = Vec3::new(0.0, 2.0, 0.0);

    for _ in 0..600 {
        sim.step(DT);
    }
    assert!(
        sim.body.angular_velocity.length() < 0.05,
        "residual spin {:?}",
        sim.body.angular_velocity
    );
}

#[test]
fn wave_driven_raft_never_accumulates_runaway_spin() {
    let mut sim = RaftSimulation::new(RaftParams::default());
    sim.set_storm_intensity(1.0);
    for x in 0..3 {
        for z in 0..2 {
            sim.raft.add_tile(TileKind::Foundation, (x, z)).unwrap();
        }
    }

    let mut max_spin = 0.0f32;
    for _ in 0..3600 {
        sim.step(DT);
        max_spin = max_spin.max(sim.body.angular_velocity.length());
    }
    assert!(max_spin < 4.0, "spin reached {max_spin} rad/s");
    assert!(StabilizationController::tilt(sim.body.rotation).length() < 1.5);
}
