//! The named transfer-algorithm registry.
//!
//! Three independent namespaces — ghost-fill, prolongation, coarsening —
//! each pairing an abstract [`TransferAlgorithm`] with an optional boundary
//! or coarsen operator and, once a mesh configuration exists, a per-level
//! list of compiled [`TransferSchedule`]s.

use indexmap::IndexMap;
use silt_core::RegistryError;
use silt_mesh::{
    BoundaryOp, CoarsenOp, MeshConfiguration, MeshError, TransferAlgorithm, TransferKind,
    TransferSchedule,
};
use std::fmt;

struct RefineEntry {
    algorithm: TransferAlgorithm,
    boundary_op: Option<Box<dyn BoundaryOp>>,
    schedules: Vec<Option<TransferSchedule>>,
}

struct CoarsenEntry {
    algorithm: TransferAlgorithm,
    coarsen_op: Option<Box<dyn CoarsenOp>>,
    schedules: Vec<Option<TransferSchedule>>,
}

/// Registry of named transfer algorithms and their compiled schedules.
///
/// Entries are created once via the `register_*` calls; the schedule lists
/// are derived data, destroyed and rebuilt by [`rebuild_schedules`] on every
/// hierarchy reconfiguration and never mutated in place.
///
/// Schedule lists are indexed by level. Ghost-fill lists hold `Some` at
/// every level `0..=finest`; prolongation and coarsening lists hold `None`
/// at level 0 (no coarser level exists) and `Some` at `1..=finest`. Callers
/// must treat `None` as "not applicable", not "not yet built".
///
/// [`rebuild_schedules`]: TransferAlgorithmRegistry::rebuild_schedules
#[derive(Default)]
pub struct TransferAlgorithmRegistry {
    ghost_fill: IndexMap<String, RefineEntry>,
    prolongation: IndexMap<String, RefineEntry>,
    coarsening: IndexMap<String, CoarsenEntry>,
}

impl TransferAlgorithmRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a ghost-fill algorithm under `name`.
    pub fn register_ghost_fill(
        &mut self,
        name: impl Into<String>,
        algorithm: TransferAlgorithm,
        boundary_op: Option<Box<dyn BoundaryOp>>,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if self.ghost_fill.contains_key(&name) {
            return Err(RegistryError::DuplicateName {
                registry: "ghost-fill",
                name,
            });
        }
        self.ghost_fill.insert(
            name,
            RefineEntry {
                algorithm,
                boundary_op,
                schedules: Vec::new(),
            },
        );
        Ok(())
    }

    /// Register a prolongation algorithm under `name`.
    pub fn register_prolongation(
        &mut self,
        name: impl Into<String>,
        algorithm: TransferAlgorithm,
        boundary_op: Option<Box<dyn BoundaryOp>>,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if self.prolongation.contains_key(&name) {
            return Err(RegistryError::DuplicateName {
                registry: "prolongation",
                name,
            });
        }
        self.prolongation.insert(
            name,
            RefineEntry {
                algorithm,
                boundary_op,
                schedules: Vec::new(),
            },
        );
        Ok(())
    }

    /// Register a coarsening algorithm under `name`.
    pub fn register_coarsening(
        &mut self,
        name: impl Into<String>,
        algorithm: TransferAlgorithm,
        coarsen_op: Option<Box<dyn CoarsenOp>>,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if self.coarsening.contains_key(&name) {
            return Err(RegistryError::DuplicateName {
                registry: "coarsening",
                name,
            });
        }
        self.coarsening.insert(
            name,
            CoarsenEntry {
                algorithm,
                coarsen_op,
                schedules: Vec::new(),
            },
        );
        Ok(())
    }

    fn refine_entry<'a>(
        table: &'a IndexMap<String, RefineEntry>,
        table_name: &'static str,
        name: &str,
    ) -> Result<&'a RefineEntry, RegistryError> {
        table
            .get(name)
            .ok_or_else(|| RegistryError::UnregisteredAlgorithm {
                table: table_name,
                name: name.to_string(),
            })
    }

    /// The ghost-fill algorithm descriptor registered under `name`.
    pub fn ghost_fill_algorithm(&self, name: &str) -> Result<&TransferAlgorithm, RegistryError> {
        Ok(&Self::refine_entry(&self.ghost_fill, "ghost-fill", name)?.algorithm)
    }

    /// The prolongation algorithm descriptor registered under `name`.
    pub fn prolongation_algorithm(&self, name: &str) -> Result<&TransferAlgorithm, RegistryError> {
        Ok(&Self::refine_entry(&self.prolongation, "prolongation", name)?.algorithm)
    }

    /// The coarsening algorithm descriptor registered under `name`.
    pub fn coarsening_algorithm(&self, name: &str) -> Result<&TransferAlgorithm, RegistryError> {
        Ok(&self
            .coarsening
            .get(name)
            .ok_or_else(|| RegistryError::UnregisteredAlgorithm {
                table: "coarsening",
                name: name.to_string(),
            })?
            .algorithm)
    }

    /// The boundary operator bound to a ghost-fill entry, if any.
    pub fn ghost_fill_boundary_op(&self, name: &str) -> Result<Option<&dyn BoundaryOp>, RegistryError> {
        Ok(Self::refine_entry(&self.ghost_fill, "ghost-fill", name)?
            .boundary_op
            .as_deref())
    }

    /// The boundary operator bound to a prolongation entry, if any.
    pub fn prolongation_boundary_op(
        &self,
        name: &str,
    ) -> Result<Option<&dyn BoundaryOp>, RegistryError> {
        Ok(Self::refine_entry(&self.prolongation, "prolongation", name)?
            .boundary_op
            .as_deref())
    }

    /// The coarsen operator bound to a coarsening entry, if any.
    pub fn coarsening_op(&self, name: &str) -> Result<Option<&dyn CoarsenOp>, RegistryError> {
        Ok(self
            .coarsening
            .get(name)
            .ok_or_else(|| RegistryError::UnregisteredAlgorithm {
                table: "coarsening",
                name: name.to_string(),
            })?
            .coarsen_op
            .as_deref())
    }

    /// Compiled ghost-fill schedules for `name`, indexed by level.
    ///
    /// `Some` at every level once [`rebuild_schedules`] has run; empty
    /// before any mesh configuration exists.
    ///
    /// [`rebuild_schedules`]: TransferAlgorithmRegistry::rebuild_schedules
    pub fn ghost_fill_schedules(
        &self,
        name: &str,
    ) -> Result<&[Option<TransferSchedule>], RegistryError> {
        Ok(&Self::refine_entry(&self.ghost_fill, "ghost-fill", name)?.schedules)
    }

    /// Compiled prolongation schedules for `name`, indexed by level.
    ///
    /// `None` at level 0 by construction.
    pub fn prolongation_schedules(
        &self,
        name: &str,
    ) -> Result<&[Option<TransferSchedule>], RegistryError> {
        Ok(&Self::refine_entry(&self.prolongation, "prolongation", name)?.schedules)
    }

    /// Compiled coarsening schedules for `name`, indexed by level.
    ///
    /// `None` at level 0 by construction.
    pub fn coarsening_schedules(
        &self,
        name: &str,
    ) -> Result<&[Option<TransferSchedule>], RegistryError> {
        Ok(&self
            .coarsening
            .get(name)
            .ok_or_else(|| RegistryError::UnregisteredAlgorithm {
                table: "coarsening",
                name: name.to_string(),
            })?
            .schedules)
    }

    /// Drop every compiled schedule list.
    ///
    /// Called when the mesh configuration is about to change; the lists
    /// stay empty until [`rebuild_schedules`] runs against the new
    /// configuration.
    ///
    /// [`rebuild_schedules`]: TransferAlgorithmRegistry::rebuild_schedules
    pub fn invalidate_schedules(&mut self) {
        for entry in self.ghost_fill.values_mut() {
            entry.schedules.clear();
        }
        for entry in self.prolongation.values_mut() {
            entry.schedules.clear();
        }
        for entry in self.coarsening.values_mut() {
            entry.schedules.clear();
        }
    }

    /// Recompile every entry's schedule list against `config`.
    ///
    /// Ghost-fill entries get a schedule at every level `0..=finest`;
    /// prolongation and coarsening entries get `None` at level 0 and a
    /// schedule at every level `1..=finest`.
    pub fn rebuild_schedules(&mut self, config: &MeshConfiguration) -> Result<(), MeshError> {
        let finest = config.finest_level();
        for entry in self.ghost_fill.values_mut() {
            let mut schedules = Vec::with_capacity(finest as usize + 1);
            for level in 0..=finest {
                schedules.push(Some(TransferSchedule::compile(
                    TransferKind::GhostFill,
                    level,
                    config,
                    &entry.algorithm,
                )?));
            }
            entry.schedules = schedules;
        }
        for entry in self.prolongation.values_mut() {
            entry.schedules =
                Self::compile_fine_levels(TransferKind::Prolongation, config, &entry.algorithm)?;
        }
        for entry in self.coarsening.values_mut() {
            entry.schedules =
                Self::compile_fine_levels(TransferKind::Coarsening, config, &entry.algorithm)?;
        }
        Ok(())
    }

    fn compile_fine_levels(
        kind: TransferKind,
        config: &MeshConfiguration,
        algorithm: &TransferAlgorithm,
    ) -> Result<Vec<Option<TransferSchedule>>, MeshError> {
        let finest = config.finest_level();
        let mut schedules = Vec::with_capacity(finest as usize + 1);
        // Level 0 has no coarser neighbor; its slot stays absent.
        schedules.push(None);
        for level in 1..=finest {
            schedules.push(Some(TransferSchedule::compile(
                kind, level, config, algorithm,
            )?));
        }
        Ok(schedules)
    }

    /// Number of entries across all three tables.
    pub fn len(&self) -> usize {
        self.ghost_fill.len() + self.prolongation.len() + self.coarsening.len()
    }

    /// Whether no algorithms are registered.
    pub fn is_empty(&self) -> bool {
        self.ghost_fill.is_empty() && self.prolongation.is_empty() && self.coarsening.is_empty()
    }
}

impl fmt::Debug for TransferAlgorithmRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferAlgorithmRegistry")
            .field("ghost_fill", &self.ghost_fill.len())
            .field("prolongation", &self.prolongation.len())
            .field("coarsening", &self.coarsening.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use silt_core::{GhostWidth, SlotIndex};
    use silt_mesh::CopyBoundaryOp;

    fn velocity_algorithm() -> TransferAlgorithm {
        TransferAlgorithm::new(vec![SlotIndex(0)], GhostWidth(4), "linear_refine")
    }

    fn registry_with_all_tables() -> TransferAlgorithmRegistry {
        let mut reg = TransferAlgorithmRegistry::new();
        reg.register_ghost_fill("velocity", velocity_algorithm(), Some(Box::new(CopyBoundaryOp)))
            .unwrap();
        reg.register_prolongation("velocity", velocity_algorithm(), None)
            .unwrap();
        reg.register_coarsening("velocity", velocity_algorithm(), None)
            .unwrap();
        reg
    }

    #[test]
    fn same_name_allowed_across_tables() {
        // The three namespaces are independent.
        let reg = registry_with_all_tables();
        assert_eq!(reg.len(), 3);
        assert!(reg.ghost_fill_algorithm("velocity").is_ok());
        assert!(reg.prolongation_algorithm("velocity").is_ok());
        assert!(reg.coarsening_algorithm("velocity").is_ok());
    }

    #[test]
    fn duplicate_within_table_rejected() {
        let mut reg = registry_with_all_tables();
        let result = reg.register_ghost_fill("velocity", velocity_algorithm(), None);
        assert_eq!(
            result,
            Err(RegistryError::DuplicateName {
                registry: "ghost-fill",
                name: "velocity".to_string(),
            })
        );
    }

    #[test]
    fn unregistered_name_is_an_error() {
        let reg = TransferAlgorithmRegistry::new();
        assert_eq!(
            reg.ghost_fill_schedules("nope"),
            Err(RegistryError::UnregisteredAlgorithm {
                table: "ghost-fill",
                name: "nope".to_string(),
            })
        );
        assert!(reg.coarsening_algorithm("nope").is_err());
    }

    #[test]
    fn schedules_empty_before_mesh_exists() {
        let reg = registry_with_all_tables();
        assert!(reg.ghost_fill_schedules("velocity").unwrap().is_empty());
        assert!(reg.prolongation_schedules("velocity").unwrap().is_empty());
    }

    #[test]
    fn rebuild_covers_all_levels() {
        let mut reg = registry_with_all_tables();
        let config = MeshConfiguration::uniform(3, 2, 1.0, 2).unwrap();
        reg.rebuild_schedules(&config).unwrap();

        let ghost = reg.ghost_fill_schedules("velocity").unwrap();
        assert_eq!(ghost.len(), 3);
        assert!(ghost.iter().all(Option::is_some));

        for schedules in [
            reg.prolongation_schedules("velocity").unwrap(),
            reg.coarsening_schedules("velocity").unwrap(),
        ] {
            assert_eq!(schedules.len(), 3);
            assert!(schedules[0].is_none(), "level 0 must stay absent");
            assert!(schedules[1].is_some());
            assert!(schedules[2].is_some());
        }
    }

    #[test]
    fn rebuild_replaces_previous_schedules() {
        let mut reg = registry_with_all_tables();
        let three = MeshConfiguration::uniform(3, 2, 1.0, 2).unwrap();
        let two = MeshConfiguration::uniform(2, 2, 1.0, 2).unwrap();
        reg.rebuild_schedules(&three).unwrap();
        reg.rebuild_schedules(&two).unwrap();
        assert_eq!(reg.ghost_fill_schedules("velocity").unwrap().len(), 2);
        assert_eq!(reg.coarsening_schedules("velocity").unwrap().len(), 2);
    }

    #[test]
    fn invalidate_clears_schedules() {
        let mut reg = registry_with_all_tables();
        let config = MeshConfiguration::uniform(2, 2, 1.0, 2).unwrap();
        reg.rebuild_schedules(&config).unwrap();
        reg.invalidate_schedules();
        assert!(reg.ghost_fill_schedules("velocity").unwrap().is_empty());
        assert!(reg.coarsening_schedules("velocity").unwrap().is_empty());
    }

    #[test]
    fn bound_operators_are_retrievable() {
        let reg = registry_with_all_tables();
        let op = reg.ghost_fill_boundary_op("velocity").unwrap();
        assert_eq!(op.expect("bound at registration").name(), "copy");
        assert!(reg.prolongation_boundary_op("velocity").unwrap().is_none());
        assert!(reg.coarsening_op("velocity").unwrap().is_none());
    }

    #[test]
    fn single_level_mesh_has_no_fine_level_schedules() {
        let mut reg = registry_with_all_tables();
        let config = MeshConfiguration::uniform(1, 2, 1.0, 2).unwrap();
        reg.rebuild_schedules(&config).unwrap();
        assert_eq!(reg.ghost_fill_schedules("velocity").unwrap().len(), 1);
        let coarsen = reg.coarsening_schedules("velocity").unwrap();
        assert_eq!(coarsen.len(), 1);
        assert!(coarsen[0].is_none());
    }
}
