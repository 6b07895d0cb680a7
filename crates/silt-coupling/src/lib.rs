//! Pluggable fluid-structure coupling for adaptively refined Cartesian
//! meshes.
//!
//! The central abstraction is the [`CouplingStrategy`] trait: the contract
//! a time integrator drives to interpolate fluid velocity onto immersed
//! structures, advance those structures, and spread their forces back into
//! the fluid. Concrete strategies compose a [`StrategyServices`] bundle
//! holding the variable registry, the transfer-algorithm registry, and the
//! per-structure activation table.
//!
//! Nothing here touches patch data directly; all mesh-side data motion
//! goes through compiled transfer schedules applied via a
//! [`ScheduleExecutor`](silt_mesh::ScheduleExecutor).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod activation;
pub mod error;
pub mod kernels;
pub mod multistep;
pub mod services;
pub mod strategy;
pub mod transfers;
pub mod variables;

pub use activation::StructureActivationTable;
pub use error::CouplingError;
pub use kernels::{KernelConfig, KernelSelection, DEFAULT_KERNEL};
pub use multistep::{advance_structure_positions, MultistepState, TimeSteppingScheme};
pub use services::{IntegratorHandle, StrategyServices};
pub use strategy::{unsupported, CouplingStrategy};
pub use transfers::TransferAlgorithmRegistry;
pub use variables::{FieldInitializer, StateVariableSpec, VarContext, VariableRegistry, VariableSlots};
