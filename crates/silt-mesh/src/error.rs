//! Error types for mesh configuration and schedule compilation.

use std::error::Error;
use std::fmt;

/// Errors from mesh-configuration queries and schedule compilation.
#[derive(Clone, Debug, PartialEq)]
pub enum MeshError {
    /// A configuration with zero levels was supplied.
    EmptyConfiguration,
    /// A level number exceeds the finest level of the configuration.
    LevelOutOfRange {
        /// The requested level.
        level: u32,
        /// The finest level that exists.
        finest: u32,
    },
    /// A prolongation or coarsening schedule was requested for level 0,
    /// which has no coarser neighbor.
    NoCoarserLevel {
        /// The offending level (always 0 in practice).
        level: u32,
    },
    /// A level specification failed structural validation.
    InvalidLevelSpec {
        /// The level number.
        level: u32,
        /// Description of the violated invariant.
        reason: String,
    },
    /// A schedule executor reported a failed exchange.
    ExchangeFailed {
        /// Description of the failure.
        reason: String,
    },
}

impl fmt::Display for MeshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyConfiguration => write!(f, "mesh configuration has no levels"),
            Self::LevelOutOfRange { level, finest } => {
                write!(f, "level {level} out of range (finest is {finest})")
            }
            Self::NoCoarserLevel { level } => {
                write!(f, "level {level} has no coarser level")
            }
            Self::InvalidLevelSpec { level, reason } => {
                write!(f, "invalid level {level} specification: {reason}")
            }
            Self::ExchangeFailed { reason } => {
                write!(f, "schedule exchange failed: {reason}")
            }
        }
    }
}

impl Error for MeshError {}
