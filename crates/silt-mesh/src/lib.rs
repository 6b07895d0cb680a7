//! Mesh-configuration and transfer-schedule interfaces for Silt.
//!
//! The adaptive mesh itself (patch partitioning, load balancing, data
//! distribution) lives outside this workspace. This crate defines what the
//! coupling layer consumes from it: an ordered set of refinement levels, the
//! descriptors for inter-level data transfer, and the compiled per-level
//! schedules that the strategy applies synchronously each step.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
mod hierarchy;
mod operator;
mod transfer;

pub use error::MeshError;
pub use hierarchy::{LevelSpec, MeshConfiguration};
pub use operator::{
    is_coarsen_op, is_refine_op, AverageCoarsenOp, BoundaryOp, CoarsenOp, CopyBoundaryOp,
    NO_COARSEN, NO_REFINE,
};
pub use transfer::{ScheduleExecutor, TransferAlgorithm, TransferKind, TransferSchedule};
