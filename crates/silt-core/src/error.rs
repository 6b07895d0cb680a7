//! Registry error vocabulary shared across the workspace.

use std::error::Error;
use std::fmt;

use crate::id::GhostWidth;

/// Errors from the variable and transfer-algorithm registries.
///
/// All of these are configuration errors: they are reported at the point
/// of registration or lookup, and the caller has no well-defined fallback
/// beyond terminating the run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// A variable name was queried before it was registered.
    UnregisteredVariable {
        /// The offending name.
        name: String,
    },
    /// A transfer-algorithm name was queried before it was registered.
    UnregisteredAlgorithm {
        /// Which of the three tables was queried.
        table: &'static str,
        /// The offending name.
        name: String,
    },
    /// The name is already present in the registry.
    DuplicateName {
        /// Which registry rejected the name.
        registry: &'static str,
        /// The duplicated name.
        name: String,
    },
    /// A state variable was registered with a refine or coarsen operator
    /// but with ghost widths that differ across its contexts.
    GhostWidthMismatch {
        /// The variable name.
        name: String,
        /// Ghost width requested for the scratch context.
        scratch: GhostWidth,
        /// Ghost width requested for the current/new contexts.
        state: GhostWidth,
    },
    /// A transfer descriptor names an operator the mesh does not provide.
    UnknownOperator {
        /// The operator name.
        operator: String,
    },
    /// The slot index space is exhausted.
    SlotExhaustion,
    /// The variable was queried for a context it was not registered with.
    MissingContext {
        /// The variable name.
        name: String,
        /// The context that is absent, as a display string.
        context: &'static str,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnregisteredVariable { name } => {
                write!(f, "variable '{name}' is not registered")
            }
            Self::UnregisteredAlgorithm { table, name } => {
                write!(f, "no '{name}' entry in the {table} table")
            }
            Self::DuplicateName { registry, name } => {
                write!(f, "name '{name}' already registered in the {registry} registry")
            }
            Self::GhostWidthMismatch {
                name,
                scratch,
                state,
            } => {
                write!(
                    f,
                    "variable '{name}' registered with transfer operators but \
                     mismatched ghost widths (scratch {scratch}, state {state})"
                )
            }
            Self::UnknownOperator { operator } => {
                write!(f, "unknown transfer operator '{operator}'")
            }
            Self::SlotExhaustion => write!(f, "data slot index space exhausted"),
            Self::MissingContext { name, context } => {
                write!(f, "variable '{name}' has no {context} context")
            }
        }
    }
}

impl Error for RegistryError {}
