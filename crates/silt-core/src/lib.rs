//! Core types for the Silt fluid-structure coupling framework.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! identifiers, the level sentinel type, the registry error vocabulary, and
//! the restart state database shared by the rest of the workspace.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

mod error;
mod id;
mod state;

pub use error::RegistryError;
pub use id::{GhostWidth, Level, Position, SlotIndex, StructureId};
pub use state::{StateDatabase, StateValue};
