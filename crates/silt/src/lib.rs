//! Silt: fluid-structure coupling for adaptively refined Cartesian meshes.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Silt sub-crates. For most users, adding `silt` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use silt::prelude::*;
//! use silt::types::Position;
//!
//! // One structure of two points on the finest level, advected by a
//! // uniform flow and tethered to its initial positions.
//! let mut method = PointSetMethod::new(
//!     "demo",
//!     &KernelConfig::default(),
//!     Box::new(|_p: &Position, _t: f64| [1.0, 0.0, 0.0]),
//! )
//! .unwrap();
//! method
//!     .add_structure(StructurePoints::new(
//!         StructureId(0),
//!         1,
//!         vec![
//!             Position::from_slice(&[1.0, 1.0, 1.0]),
//!             Position::from_slice(&[2.0, 1.0, 1.0]),
//!         ],
//!         10.0,
//!     ))
//!     .unwrap();
//!
//! // A two-level mesh, and an executor that stands in for the mesh side.
//! let config = MeshConfiguration::uniform(2, 4, 1.0, 2).unwrap();
//! struct Inert;
//! impl ScheduleExecutor for Inert {
//!     fn execute(&mut self, _s: &TransferSchedule) -> Result<(), MeshError> {
//!         Ok(())
//!     }
//! }
//! let mut executor = Inert;
//! method
//!     .initialize_mesh_data(&config, SlotIndex(0), &mut executor, 0.0, true)
//!     .unwrap();
//!
//! // One forward-Euler step of the coupling protocol.
//! method.preprocess_integrate_data(0.0, 0.5, 1).unwrap();
//! method
//!     .interpolate_velocity(SlotIndex(0), &[], &[], &mut executor, 0.0)
//!     .unwrap();
//! method.forward_euler_step(0.0, 0.5).unwrap();
//! method.postprocess_integrate_data(0.0, 0.5, 1).unwrap();
//!
//! let moved = method.structure(StructureId(0)).unwrap().positions();
//! assert!((moved[0][0] - 1.5).abs() < 1e-12);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the
//! prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `silt-core` | IDs, levels, positions, restart database |
//! | [`mesh`] | `silt-mesh` | Mesh configuration, transfer schedules, operators |
//! | [`coupling`] | `silt-coupling` | The strategy contract and its registries |
//! | [`methods`] | `silt-methods` | Concrete point-set coupling methods |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core identifiers and state types (`silt-core`).
///
/// Structure and slot IDs, the [`types::Level`] addressing enum, packed
/// point [`types::Position`]s, and the restart [`types::StateDatabase`].
pub use silt_core as types;

/// Mesh configuration and data transfer (`silt-mesh`).
///
/// [`mesh::MeshConfiguration`] describes the refined level stack;
/// [`mesh::TransferSchedule`]s move data between patches through a
/// [`mesh::ScheduleExecutor`].
pub use silt_mesh as mesh;

/// The coupling-strategy contract and its registries (`silt-coupling`).
///
/// The [`coupling::CouplingStrategy`] trait is the main extension point for
/// user-defined coupling methods.
pub use silt_coupling as coupling;

/// Concrete coupling methods (`silt-methods`).
///
/// Includes [`methods::PointSetMethod`], a tether-force immersed point-set
/// method, and the [`methods::DeltaKernel`] family.
pub use silt_methods as methods;

/// Common imports for typical Silt usage.
///
/// ```rust
/// use silt::prelude::*;
/// ```
///
/// This imports the most frequently used types: the strategy trait and its
/// services, mesh configuration, schedules, and the reference method.
pub mod prelude {
    // Identifiers and addressing
    pub use silt_core::{GhostWidth, Level, SlotIndex, StateDatabase, StructureId};

    // Mesh
    pub use silt_mesh::{
        MeshConfiguration, MeshError, ScheduleExecutor, TransferAlgorithm, TransferSchedule,
    };

    // Strategy contract
    pub use silt_coupling::{
        advance_structure_positions, CouplingError, CouplingStrategy, IntegratorHandle,
        KernelConfig, StateVariableSpec, StrategyServices, TimeSteppingScheme,
    };

    // Reference method
    pub use silt_methods::{DeltaKernel, PointSetMethod, StructurePoints};
}
