//! Per-structure activation state.
//!
//! Activation is orthogonal to existence: deactivating a structure does not
//! destroy its data, it only excludes the structure from force spreading
//! and velocity interpolation.

use indexmap::IndexMap;
use silt_core::{Level, StructureId};
use silt_mesh::{MeshConfiguration, MeshError};

/// Sparse map from `(structure, level)` to an activation flag.
///
/// Unseen keys are Active; entries are created lazily on the first
/// (de)activation call and persist for the strategy's lifetime. Both
/// transitions are idempotent.
///
/// The [`Level::Finest`] sentinel is resolved against the supplied mesh
/// configuration at call time — never stored — so the same sentinel can
/// address different levels across a regrid.
#[derive(Clone, Debug, Default)]
pub struct StructureActivationTable {
    entries: IndexMap<(StructureId, u32), bool>,
}

impl StructureActivationTable {
    /// Create an empty table (all structures active).
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a structure active on the resolved level.
    pub fn activate(
        &mut self,
        structure: StructureId,
        level: Level,
        config: &MeshConfiguration,
    ) -> Result<(), MeshError> {
        let level = config.resolve(level)?;
        self.entries.insert((structure, level), true);
        Ok(())
    }

    /// Mark a structure inactive on the resolved level.
    pub fn deactivate(
        &mut self,
        structure: StructureId,
        level: Level,
        config: &MeshConfiguration,
    ) -> Result<(), MeshError> {
        let level = config.resolve(level)?;
        self.entries.insert((structure, level), false);
        Ok(())
    }

    /// Whether a structure is active on the resolved level.
    pub fn is_activated(
        &self,
        structure: StructureId,
        level: Level,
        config: &MeshConfiguration,
    ) -> Result<bool, MeshError> {
        let level = config.resolve(level)?;
        Ok(self.entries.get(&(structure, level)).copied().unwrap_or(true))
    }

    /// Number of explicit entries (structures that have been toggled).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table holds no explicit entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
