//! Error type for coupling-strategy operations.

use silt_core::RegistryError;
use silt_mesh::MeshError;
use std::error::Error;
use std::fmt;

/// Errors surfaced by coupling-strategy operations.
///
/// Capability-not-supported conditions are deliberately *not* represented
/// here: per the contract they abort the process rather than propagate,
/// because a missing numerical capability cannot be patched around locally.
#[derive(Clone, Debug, PartialEq)]
pub enum CouplingError {
    /// An operation needed the owning integrator before one was registered.
    IntegratorNotRegistered {
        /// The strategy that was asked to act.
        strategy: String,
    },
    /// A registry lookup or registration failed.
    Registry(RegistryError),
    /// A mesh query or schedule operation failed.
    Mesh(MeshError),
    /// A concrete method's numerical routine failed.
    MethodFailed {
        /// The strategy that failed.
        strategy: String,
        /// Description of the failure.
        reason: String,
    },
}

impl fmt::Display for CouplingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IntegratorNotRegistered { strategy } => {
                write!(f, "strategy '{strategy}' has no registered integrator")
            }
            Self::Registry(e) => write!(f, "registry: {e}"),
            Self::Mesh(e) => write!(f, "mesh: {e}"),
            Self::MethodFailed { strategy, reason } => {
                write!(f, "strategy '{strategy}' failed: {reason}")
            }
        }
    }
}

impl Error for CouplingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Registry(e) => Some(e),
            Self::Mesh(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RegistryError> for CouplingError {
    fn from(e: RegistryError) -> Self {
        Self::Registry(e)
    }
}

impl From<MeshError> for CouplingError {
    fn from(e: MeshError) -> Self {
        Self::Mesh(e)
    }
}
