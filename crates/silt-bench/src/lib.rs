//! Benchmark profiles for the Silt coupling framework.
//!
//! Provides pre-built method instances and point clouds so benchmarks and
//! examples measure the same configurations:
//!
//! - [`reference_method`]: one structure of seeded random points on the
//!   finest level of a three-level mesh
//! - [`random_cloud`]: deterministic random point generation via seed

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use rand::RngExt;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;
use silt_core::{Position, SlotIndex, StructureId};
use silt_coupling::{CouplingStrategy, KernelConfig};
use silt_mesh::{MeshConfiguration, MeshError, ScheduleExecutor, TransferSchedule};
use silt_methods::{PointSetMethod, StructurePoints, VelocityField};
use smallvec::smallvec;

/// Executor that accepts every schedule without doing work, so benchmarks
/// measure strategy-side cost only.
#[derive(Debug, Default)]
pub struct InertExecutor;

impl ScheduleExecutor for InertExecutor {
    fn execute(&mut self, _schedule: &TransferSchedule) -> Result<(), MeshError> {
        Ok(())
    }
}

/// A three-level benchmark mesh, ratio 2, unit base cell width.
pub fn reference_mesh() -> MeshConfiguration {
    MeshConfiguration::uniform(3, 8, 1.0, 2).expect("valid benchmark mesh")
}

/// Deterministic random points in a `[0, extent)^3` box.
pub fn random_cloud(count: usize, extent: f64, seed: u64) -> Vec<Position> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            smallvec![
                rng.random_range(0.0..extent),
                rng.random_range(0.0..extent),
                rng.random_range(0.0..extent),
            ]
        })
        .collect()
}

/// A uniform drift velocity field.
pub fn drift_field(u: [f64; 3]) -> VelocityField {
    Box::new(move |_p: &Position, _t: f64| u)
}

/// Build the reference method: `points` seeded random points on the finest
/// level, variables and transfer algorithms registered, mesh data
/// initialized against [`reference_mesh`].
pub fn reference_method(points: usize, seed: u64) -> PointSetMethod {
    let mut method = PointSetMethod::new(
        "bench-tether",
        &KernelConfig::default(),
        drift_field([0.1, -0.05, 0.02]),
    )
    .expect("default kernels resolve");
    let config = reference_mesh();
    method
        .add_structure(StructurePoints::new(
            StructureId(0),
            config.finest_level(),
            random_cloud(points, 8.0, seed),
            5.0,
        ))
        .expect("unique structure id");
    method.register_eulerian_variables().expect("fresh registry");
    method
        .register_communication_algorithms()
        .expect("fresh registry");
    let mut executor = InertExecutor;
    method
        .initialize_mesh_data(&config, SlotIndex(2), &mut executor, 0.0, true)
        .expect("valid initialization");
    method
}
