//! Multi-step driving of the point-set method, the way an integrator
//! sequences interpolation and position updates.

use rand::RngExt;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;
use silt_core::{Position, SlotIndex, StructureId};
use silt_coupling::{CouplingStrategy, KernelConfig};
use silt_methods::{PointSetMethod, StructurePoints, VelocityField};
use silt_test_utils::{two_level_config, NullExecutor};
use smallvec::smallvec;

/// Velocity that depends on time only: `u = (t, 0, 0)`.
fn ramp_field() -> VelocityField {
    Box::new(|_p: &Position, t: f64| [t, 0.0, 0.0])
}

fn method_with(field: VelocityField, positions: Vec<Position>) -> PointSetMethod {
    let mut method = PointSetMethod::new("tether", &KernelConfig::default(), field).unwrap();
    method
        .add_structure(StructurePoints::new(StructureId(0), 1, positions, 4.0))
        .unwrap();
    let config = two_level_config();
    let mut executor = NullExecutor;
    method
        .initialize_mesh_data(&config, SlotIndex(0), &mut executor, 0.0, true)
        .unwrap();
    method
}

fn x_of(method: &PointSetMethod) -> f64 {
    method.structure(StructureId(0)).unwrap().positions()[0][0]
}

#[test]
fn trapezoidal_averages_start_and_end_velocities() {
    let mut method = method_with(ramp_field(), vec![smallvec![1.0, 1.0, 1.0]]);
    let mut executor = NullExecutor;
    let (t0, t1) = (0.0, 1.0);

    method.preprocess_integrate_data(t0, t1, 1).unwrap();
    // Start-of-step velocity: u = 0.
    method
        .interpolate_velocity(SlotIndex(0), &[], &[], &mut executor, t0)
        .unwrap();
    // End-of-step velocity: u = 1.
    method
        .interpolate_velocity(SlotIndex(0), &[], &[], &mut executor, t1)
        .unwrap();
    method.trapezoidal_step(t0, t1).unwrap();
    method.postprocess_integrate_data(t0, t1, 1).unwrap();

    // dx = dt * (u0 + u1) / 2 = 0.5
    assert!((x_of(&method) - 1.5).abs() < 1e-12);
}

#[test]
fn midpoint_uses_the_latest_interpolation() {
    let mut method = method_with(ramp_field(), vec![smallvec![1.0, 1.0, 1.0]]);
    let mut executor = NullExecutor;
    let (t0, t1) = (0.0, 1.0);

    method.preprocess_integrate_data(t0, t1, 1).unwrap();
    method
        .interpolate_velocity(SlotIndex(0), &[], &[], &mut executor, t0)
        .unwrap();
    method
        .interpolate_velocity(SlotIndex(0), &[], &[], &mut executor, 0.5 * (t0 + t1))
        .unwrap();
    method.midpoint_step(t0, t1).unwrap();
    method.postprocess_integrate_data(t0, t1, 1).unwrap();

    // dx = dt * u(t_half) = 0.5
    assert!((x_of(&method) - 1.5).abs() < 1e-12);
}

#[test]
fn ab2_second_step_extrapolates_from_history() {
    let mut method = method_with(ramp_field(), vec![smallvec![1.0, 1.0, 1.0]]);
    method.set_use_multistep_time_stepping(1).unwrap();
    let mut executor = NullExecutor;
    let dt = 1.0;

    // First step: no history, self-starts as forward Euler with u = 0.
    method.preprocess_integrate_data(0.0, dt, 1).unwrap();
    method
        .interpolate_velocity(SlotIndex(0), &[], &[], &mut executor, 0.0)
        .unwrap();
    method.ab2_step(0.0, dt).unwrap();
    method.postprocess_integrate_data(0.0, dt, 1).unwrap();
    assert!((x_of(&method) - 1.0).abs() < 1e-12);

    // Second step: u_n = 1, u_{n-1} = 0, so dx = dt (1.5 - 0.0) = 1.5.
    method.preprocess_integrate_data(dt, 2.0 * dt, 1).unwrap();
    method
        .interpolate_velocity(SlotIndex(0), &[], &[], &mut executor, dt)
        .unwrap();
    method.ab2_step(dt, 2.0 * dt).unwrap();
    method.postprocess_integrate_data(dt, 2.0 * dt, 1).unwrap();
    assert!((x_of(&method) - 2.5).abs() < 1e-12);
}

#[test]
fn tether_total_balances_random_displacements() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let positions: Vec<Position> = (0..64)
        .map(|_| {
            smallvec![
                rng.random_range(0.0..4.0),
                rng.random_range(0.0..4.0),
                rng.random_range(0.0..4.0),
            ]
        })
        .collect();

    // A uniform drift displaces every point equally off its anchor.
    let drift = [0.3, -0.2, 0.1];
    let field: VelocityField = Box::new(move |_p: &Position, _t: f64| drift);
    let mut method = method_with(field, positions);
    let mut executor = NullExecutor;

    method.preprocess_integrate_data(0.0, 1.0, 1).unwrap();
    method
        .interpolate_velocity(SlotIndex(0), &[], &[], &mut executor, 0.0)
        .unwrap();
    method.forward_euler_step(0.0, 1.0).unwrap();
    method.compute_lagrangian_force(1.0).unwrap();
    method
        .spread_force(SlotIndex(1), None, &[], &mut executor, 1.0)
        .unwrap();

    // Each of the 64 points is pulled back by k * drift.
    let total = method.last_spread_total();
    let stiffness = 4.0;
    for d in 0..3 {
        let expected = -stiffness * drift[d] * 64.0;
        assert!(
            (total[d] - expected).abs() < 1e-9,
            "component {d}: {} vs {expected}",
            total[d]
        );
    }
}
