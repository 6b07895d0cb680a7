//! Transfer-algorithm descriptors and compiled per-level schedules.

use crate::error::MeshError;
use crate::hierarchy::MeshConfiguration;
use silt_core::{GhostWidth, SlotIndex};
use std::fmt;

/// The three kinds of inter-patch data transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransferKind {
    /// Same-level (and coarse-fine boundary) ghost-cell exchange.
    GhostFill,
    /// Coarse-to-fine transfer onto a newly created finer level.
    Prolongation,
    /// Fine-to-coarse reduction onto the parent level.
    Coarsening,
}

impl fmt::Display for TransferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GhostFill => write!(f, "ghost-fill"),
            Self::Prolongation => write!(f, "prolongation"),
            Self::Coarsening => write!(f, "coarsening"),
        }
    }
}

/// Abstract description of a transfer: which data slots move, the halo the
/// exchange must cover, and the named operator the mesh applies in flight.
///
/// A descriptor is mesh-independent; pairing it with a
/// [`MeshConfiguration`] compiles it into per-level [`TransferSchedule`]s.
#[derive(Clone, Debug, PartialEq)]
pub struct TransferAlgorithm {
    slots: Vec<SlotIndex>,
    ghost_width: GhostWidth,
    operator: String,
}

impl TransferAlgorithm {
    /// Describe a transfer of `slots` with the given halo and operator name.
    pub fn new(
        slots: impl Into<Vec<SlotIndex>>,
        ghost_width: GhostWidth,
        operator: impl Into<String>,
    ) -> Self {
        Self {
            slots: slots.into(),
            ghost_width,
            operator: operator.into(),
        }
    }

    /// Data slots this transfer moves.
    pub fn slots(&self) -> &[SlotIndex] {
        &self.slots
    }

    /// Halo width the exchange must cover.
    pub fn ghost_width(&self) -> GhostWidth {
        self.ghost_width
    }

    /// Name of the refine/coarsen operator applied in flight.
    pub fn operator(&self) -> &str {
        &self.operator
    }
}

/// A compiled, per-level exchange plan.
///
/// Schedules are derived data: they are rebuilt from the descriptor
/// whenever the mesh configuration changes and are never mutated in place.
/// Applying one is a blocking collective across the distributed mesh
/// partition — it returns only once all participants have exchanged their
/// boundary data, so callers must execute the same schedules in the same
/// order on every process.
#[derive(Clone, Debug, PartialEq)]
pub struct TransferSchedule {
    kind: TransferKind,
    level: u32,
    slots: Vec<SlotIndex>,
    ghost_width: GhostWidth,
    operator: String,
}

impl TransferSchedule {
    /// Compile a schedule for one level of `config`.
    ///
    /// Prolongation and coarsening schedules exist only between adjacent
    /// levels, so requesting one for level 0 fails with
    /// [`MeshError::NoCoarserLevel`].
    pub fn compile(
        kind: TransferKind,
        level: u32,
        config: &MeshConfiguration,
        algorithm: &TransferAlgorithm,
    ) -> Result<Self, MeshError> {
        // Validates the level exists.
        config.level(level)?;
        if level == 0 && kind != TransferKind::GhostFill {
            return Err(MeshError::NoCoarserLevel { level });
        }
        Ok(Self {
            kind,
            level,
            slots: algorithm.slots().to_vec(),
            ghost_width: algorithm.ghost_width(),
            operator: algorithm.operator().to_string(),
        })
    }

    /// The kind of transfer this schedule performs.
    pub fn kind(&self) -> TransferKind {
        self.kind
    }

    /// The level this schedule exchanges data on (the finer level, for
    /// prolongation and coarsening).
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Data slots moved by this schedule.
    pub fn slots(&self) -> &[SlotIndex] {
        &self.slots
    }

    /// Halo width covered by the exchange.
    pub fn ghost_width(&self) -> GhostWidth {
        self.ghost_width
    }

    /// Operator applied in flight.
    pub fn operator(&self) -> &str {
        &self.operator
    }

    /// Execute the exchange through the mesh-side executor.
    ///
    /// Synchronous: partial completion is never visible to the caller.
    pub fn apply(&self, executor: &mut dyn ScheduleExecutor) -> Result<(), MeshError> {
        executor.execute(self)
    }
}

/// Mesh-side execution of compiled schedules.
///
/// The real implementation performs the distributed boundary exchange; test
/// doubles record or count the calls.
pub trait ScheduleExecutor {
    /// Run one compiled schedule to completion.
    fn execute(&mut self, schedule: &TransferSchedule) -> Result<(), MeshError>;
}
