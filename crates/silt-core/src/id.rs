//! Strongly-typed identifiers, the level sentinel, and the [`Position`] alias.

use smallvec::SmallVec;
use std::fmt;

/// Identifies a Lagrangian structure owned by a coupling strategy.
///
/// Structure numbering is strategy-local: two strategies may both own a
/// structure 0 without conflict.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StructureId(pub u32);

impl fmt::Display for StructureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for StructureId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Index of an allocated data slot on the mesh.
///
/// Slots are allocated by the variable registry at strategy setup and stay
/// stable for the strategy instance's lifetime; the owning integrator
/// allocates and deallocates the backing storage across regrids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotIndex(pub u32);

impl fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for SlotIndex {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Ghost-cell halo width, in mesh cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GhostWidth(pub u32);

impl fmt::Display for GhostWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for GhostWidth {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// A mesh refinement level, either explicit or "the finest at call time".
///
/// Replaces the raw max-int sentinel convention: `Finest` is resolved
/// against the current mesh configuration at the point of use and is never
/// stored as a key. Defaults to `Finest`, matching the common case of a
/// structure assigned to the finest level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Level {
    /// An explicit level number, 0 being the coarsest.
    Number(u32),
    /// Whatever the finest level is at the moment of the call.
    #[default]
    Finest,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Finest => write!(f, "finest"),
        }
    }
}

impl From<u32> for Level {
    fn from(v: u32) -> Self {
        Self::Number(v)
    }
}

/// A Lagrangian point coordinate.
///
/// Uses `SmallVec<[f64; 3]>` to avoid heap allocation for the 2D and 3D
/// domains this framework targets; higher dimensions spill transparently.
pub type Position = SmallVec<[f64; 3]>;
