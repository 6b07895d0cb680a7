//! Concrete coupling methods built on the
//! [`CouplingStrategy`](silt_coupling::CouplingStrategy) contract.
//!
//! The crate currently provides one method: [`PointSetMethod`], a
//! tether-force immersed point-set method with delta-kernel interpolation
//! and spreading, multistep time stepping, structure activation, load
//! estimation, and restart support.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod kernel;
pub mod method;
pub mod points;

pub use kernel::{AxisStencil, DeltaKernel};
pub use method::{ForceSink, PointSetMethod, VelocityField, FORCE_VARIABLE, VELOCITY_VARIABLE};
pub use points::StructurePoints;
