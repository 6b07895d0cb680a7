//! The per-strategy variable registry.
//!
//! Maps each logical field to its data slots (current/new/scratch), ghost
//! width, transfer operator names, and optional initializer. Slot indices
//! are allocated here once during strategy setup and stay stable for the
//! strategy instance's lifetime; the owning integrator allocates the
//! backing storage per mesh configuration.

use indexmap::IndexMap;
use silt_core::{GhostWidth, RegistryError, SlotIndex};
use silt_mesh::{is_coarsen_op, is_refine_op, NO_COARSEN, NO_REFINE};
use std::fmt;

/// Time-role tag for a variable's data slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VarContext {
    /// Persistent across the current step.
    Current,
    /// Persistent into the next step.
    New,
    /// Transient working data; may be deallocated between steps.
    Scratch,
}

impl fmt::Display for VarContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Current => write!(f, "current"),
            Self::New => write!(f, "new"),
            Self::Scratch => write!(f, "scratch"),
        }
    }
}

/// The data slots allocated for one registered variable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VariableSlots {
    /// Slot for the current context, if allocated.
    pub current: Option<SlotIndex>,
    /// Slot for the new context, if allocated.
    pub new: Option<SlotIndex>,
    /// Slot for the scratch context, if allocated.
    pub scratch: Option<SlotIndex>,
}

impl VariableSlots {
    /// Slot for the given context.
    pub fn get(&self, context: VarContext) -> Option<SlotIndex> {
        match context {
            VarContext::Current => self.current,
            VarContext::New => self.new,
            VarContext::Scratch => self.scratch,
        }
    }
}

/// Initial-value generator invoked when a variable is first allocated on a
/// given mesh configuration.
pub trait FieldInitializer: Send {
    /// Fill `data`, the flattened cell values of one level, at `time`.
    fn initialize(&self, level: u32, cell_width: f64, data: &mut [f64], time: f64);
}

impl<F> FieldInitializer for F
where
    F: Fn(u32, f64, &mut [f64], f64) + Send,
{
    fn initialize(&self, level: u32, cell_width: f64, data: &mut [f64], time: f64) {
        self(level, cell_width, data, time)
    }
}

/// Registration request for a state variable maintained across regrids.
pub struct StateVariableSpec {
    /// Logical field name, unique within the registry.
    pub name: String,
    /// Ghost width for the scratch context.
    pub scratch_ghosts: GhostWidth,
    /// Ghost width for the current/new contexts.
    pub state_ghosts: GhostWidth,
    /// Coarsen operator name, or [`NO_COARSEN`].
    pub coarsen_op: String,
    /// Refine operator name, or [`NO_REFINE`].
    pub refine_op: String,
    /// Optional initial-value generator.
    pub initializer: Option<Box<dyn FieldInitializer>>,
    /// Whether the variable participates in restart save/load.
    pub persist: bool,
}

impl StateVariableSpec {
    /// Spec with no transfer operators, no initializer, persisted, and a
    /// uniform ghost width across contexts.
    pub fn new(name: impl Into<String>, ghosts: GhostWidth) -> Self {
        Self {
            name: name.into(),
            scratch_ghosts: ghosts,
            state_ghosts: ghosts,
            coarsen_op: NO_COARSEN.to_string(),
            refine_op: NO_REFINE.to_string(),
            initializer: None,
            persist: true,
        }
    }

    /// Set both transfer operator names.
    pub fn with_operators(
        mut self,
        coarsen_op: impl Into<String>,
        refine_op: impl Into<String>,
    ) -> Self {
        self.coarsen_op = coarsen_op.into();
        self.refine_op = refine_op.into();
        self
    }

    /// Attach an initial-value generator.
    pub fn with_initializer(mut self, init: Box<dyn FieldInitializer>) -> Self {
        self.initializer = Some(init);
        self
    }
}

struct VariableEntry {
    slots: VariableSlots,
    ghost_width: GhostWidth,
    coarsen_op: String,
    refine_op: String,
    initializer: Option<Box<dyn FieldInitializer>>,
    persist: bool,
}

/// Per-strategy table of registered variables and their data slots.
#[derive(Default)]
pub struct VariableRegistry {
    entries: IndexMap<String, VariableEntry>,
    next_slot: u32,
}

impl VariableRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_slot(&mut self) -> Result<SlotIndex, RegistryError> {
        let slot = SlotIndex(self.next_slot);
        self.next_slot = self
            .next_slot
            .checked_add(1)
            .ok_or(RegistryError::SlotExhaustion)?;
        Ok(slot)
    }

    /// Register a state variable with all three contexts allocated.
    ///
    /// When either operator is a real operator (not the `NO_*` sentinel)
    /// the data must be transferable across level changes, so all three
    /// contexts require matching ghost widths; a mismatch is rejected here
    /// rather than at schedule-application time.
    pub fn register_state_variable(
        &mut self,
        spec: StateVariableSpec,
    ) -> Result<VariableSlots, RegistryError> {
        if self.entries.contains_key(&spec.name) {
            return Err(RegistryError::DuplicateName {
                registry: "variable",
                name: spec.name,
            });
        }
        let has_operators =
            is_coarsen_op(&spec.coarsen_op) || is_refine_op(&spec.refine_op);
        if has_operators && spec.scratch_ghosts != spec.state_ghosts {
            return Err(RegistryError::GhostWidthMismatch {
                name: spec.name,
                scratch: spec.scratch_ghosts,
                state: spec.state_ghosts,
            });
        }
        let slots = VariableSlots {
            current: Some(self.allocate_slot()?),
            new: Some(self.allocate_slot()?),
            scratch: Some(self.allocate_slot()?),
        };
        self.entries.insert(
            spec.name,
            VariableEntry {
                slots,
                ghost_width: spec.scratch_ghosts,
                coarsen_op: spec.coarsen_op,
                refine_op: spec.refine_op,
                initializer: spec.initializer,
                persist: spec.persist,
            },
        );
        Ok(slots)
    }

    /// Register a transient working variable with only a scratch context.
    ///
    /// No cross-step persistence is guaranteed; the integrator may
    /// deallocate the slot's storage between steps.
    pub fn register_scratch_variable(
        &mut self,
        name: impl Into<String>,
        ghosts: GhostWidth,
        persist: bool,
    ) -> Result<SlotIndex, RegistryError> {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return Err(RegistryError::DuplicateName {
                registry: "variable",
                name,
            });
        }
        let slot = self.allocate_slot()?;
        self.entries.insert(
            name,
            VariableEntry {
                slots: VariableSlots {
                    current: None,
                    new: None,
                    scratch: Some(slot),
                },
                ghost_width: ghosts,
                coarsen_op: NO_COARSEN.to_string(),
                refine_op: NO_REFINE.to_string(),
                initializer: None,
                persist,
            },
        );
        Ok(slot)
    }

    /// All slots allocated for `name`.
    pub fn slots(&self, name: &str) -> Result<VariableSlots, RegistryError> {
        self.entries
            .get(name)
            .map(|e| e.slots)
            .ok_or_else(|| RegistryError::UnregisteredVariable {
                name: name.to_string(),
            })
    }

    /// The live slot for `name` in a specific context.
    pub fn slot(&self, name: &str, context: VarContext) -> Result<SlotIndex, RegistryError> {
        let slots = self.slots(name)?;
        slots.get(context).ok_or(RegistryError::MissingContext {
            name: name.to_string(),
            context: match context {
                VarContext::Current => "current",
                VarContext::New => "new",
                VarContext::Scratch => "scratch",
            },
        })
    }

    /// Ghost width registered for `name`.
    pub fn ghost_width(&self, name: &str) -> Result<GhostWidth, RegistryError> {
        self.entries
            .get(name)
            .map(|e| e.ghost_width)
            .ok_or_else(|| RegistryError::UnregisteredVariable {
                name: name.to_string(),
            })
    }

    /// Coarsen and refine operator names registered for `name`.
    pub fn operators(&self, name: &str) -> Result<(&str, &str), RegistryError> {
        self.entries
            .get(name)
            .map(|e| (e.coarsen_op.as_str(), e.refine_op.as_str()))
            .ok_or_else(|| RegistryError::UnregisteredVariable {
                name: name.to_string(),
            })
    }

    /// Initializer registered for `name`, if any.
    pub fn initializer(&self, name: &str) -> Result<Option<&dyn FieldInitializer>, RegistryError> {
        self.entries
            .get(name)
            .map(|e| e.initializer.as_deref())
            .ok_or_else(|| RegistryError::UnregisteredVariable {
                name: name.to_string(),
            })
    }

    /// Names of variables flagged for restart persistence, in
    /// registration order.
    pub fn persisted(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, e)| e.persist)
            .map(|(name, _)| name.as_str())
    }

    /// Registered variable names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of registered variables.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for VariableRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariableRegistry")
            .field("variables", &self.entries.len())
            .field("slots_allocated", &self.next_slot)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_registration_allocates_three_slots() {
        let mut reg = VariableRegistry::new();
        let slots = reg
            .register_state_variable(StateVariableSpec::new("velocity", GhostWidth(4)))
            .unwrap();
        assert_eq!(slots.current, Some(SlotIndex(0)));
        assert_eq!(slots.new, Some(SlotIndex(1)));
        assert_eq!(slots.scratch, Some(SlotIndex(2)));
        assert_eq!(reg.slot("velocity", VarContext::New).unwrap(), SlotIndex(1));
    }

    #[test]
    fn scratch_registration_allocates_one_slot() {
        let mut reg = VariableRegistry::new();
        let slot = reg
            .register_scratch_variable("work", GhostWidth(0), false)
            .unwrap();
        assert_eq!(slot, SlotIndex(0));
        assert_eq!(
            reg.slot("work", VarContext::Current),
            Err(RegistryError::MissingContext {
                name: "work".to_string(),
                context: "current",
            })
        );
        assert_eq!(reg.slot("work", VarContext::Scratch).unwrap(), slot);
    }

    #[test]
    fn duplicate_name_rejected() {
        let mut reg = VariableRegistry::new();
        reg.register_scratch_variable("u", GhostWidth(0), false)
            .unwrap();
        let result = reg.register_state_variable(StateVariableSpec::new("u", GhostWidth(1)));
        assert!(matches!(result, Err(RegistryError::DuplicateName { .. })));
    }

    #[test]
    fn ghost_mismatch_with_operators_rejected() {
        let mut reg = VariableRegistry::new();
        let mut spec = StateVariableSpec::new("velocity", GhostWidth(4))
            .with_operators("average", "linear_refine");
        spec.state_ghosts = GhostWidth(2);
        let result = reg.register_state_variable(spec);
        assert_eq!(
            result,
            Err(RegistryError::GhostWidthMismatch {
                name: "velocity".to_string(),
                scratch: GhostWidth(4),
                state: GhostWidth(2),
            })
        );
    }

    #[test]
    fn ghost_mismatch_without_operators_accepted() {
        // No cross-level consistency is required without operators.
        let mut reg = VariableRegistry::new();
        let mut spec = StateVariableSpec::new("marker", GhostWidth(3));
        spec.state_ghosts = GhostWidth(0);
        assert!(reg.register_state_variable(spec).is_ok());
    }

    #[test]
    fn unregistered_name_is_an_error() {
        let reg = VariableRegistry::new();
        assert_eq!(
            reg.slots("nope"),
            Err(RegistryError::UnregisteredVariable {
                name: "nope".to_string(),
            })
        );
    }

    #[test]
    fn persisted_filters_by_flag() {
        let mut reg = VariableRegistry::new();
        reg.register_state_variable(StateVariableSpec::new("velocity", GhostWidth(4)))
            .unwrap();
        reg.register_scratch_variable("work", GhostWidth(0), false)
            .unwrap();
        let persisted: Vec<&str> = reg.persisted().collect();
        assert_eq!(persisted, vec!["velocity"]);
    }

    #[test]
    fn initializer_closure_is_invocable() {
        let mut reg = VariableRegistry::new();
        let spec = StateVariableSpec::new("pressure", GhostWidth(1)).with_initializer(Box::new(
            |_level: u32, _width: f64, data: &mut [f64], time: f64| {
                data.fill(time);
            },
        ));
        reg.register_state_variable(spec).unwrap();

        let mut data = vec![0.0; 4];
        reg.initializer("pressure")
            .unwrap()
            .expect("initializer registered")
            .initialize(0, 1.0, &mut data, 2.5);
        assert_eq!(data, vec![2.5; 4]);
    }

    #[test]
    fn slot_indices_stable_across_further_registration() {
        let mut reg = VariableRegistry::new();
        let first = reg
            .register_state_variable(StateVariableSpec::new("a", GhostWidth(0)))
            .unwrap();
        reg.register_scratch_variable("b", GhostWidth(0), false)
            .unwrap();
        assert_eq!(reg.slots("a").unwrap(), first);
    }
}
