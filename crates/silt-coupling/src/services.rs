//! The owned service bundle every concrete strategy composes.
//!
//! Replaces inherited protected state: a strategy holds a
//! [`StrategyServices`] value and exposes it through the
//! `services()`/`services_mut()` trait accessors, so the registries and the
//! activation table have exactly one owner and a narrow surface.

use crate::activation::StructureActivationTable;
use crate::error::CouplingError;
use crate::kernels::{KernelConfig, KernelSelection};
use crate::multistep::MultistepState;
use crate::transfers::TransferAlgorithmRegistry;
use crate::variables::VariableRegistry;
use silt_core::SlotIndex;

/// Handle to the owning time integrator, supplied at registration time.
///
/// Replaces a raw back-pointer: the handle carries the integrator-owned
/// facts a strategy needs during interaction calls, and its absence is a
/// distinct configuration error rather than a null dereference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntegratorHandle {
    /// Integrator name for diagnostics.
    pub name: String,
    /// Slot holding the integrator's fluid velocity field.
    pub velocity_slot: SlotIndex,
    /// Slot holding the integrator's fluid body-force field.
    pub force_slot: SlotIndex,
}

/// Services owned by one strategy instance.
///
/// No external code mutates these directly; the integrator reaches them
/// only through the strategy's trait surface.
#[derive(Debug)]
pub struct StrategyServices {
    /// Variable-to-slot registry.
    pub variables: VariableRegistry,
    /// Named transfer-algorithm registry.
    pub transfers: TransferAlgorithmRegistry,
    /// Per-structure activation state.
    pub activation: StructureActivationTable,
    /// Multistep stepping bookkeeping.
    pub multistep: MultistepState,
    kernels: KernelSelection,
    integrator: Option<IntegratorHandle>,
    use_fixed_le_operators: bool,
}

impl StrategyServices {
    /// Create services with the given kernel configuration.
    pub fn new(kernels: &KernelConfig) -> Self {
        Self {
            variables: VariableRegistry::new(),
            transfers: TransferAlgorithmRegistry::new(),
            activation: StructureActivationTable::new(),
            multistep: MultistepState::default(),
            kernels: kernels.resolve(),
            integrator: None,
            use_fixed_le_operators: false,
        }
    }

    /// Resolved interpolation/spreading kernel names.
    pub fn kernels(&self) -> &KernelSelection {
        &self.kernels
    }

    /// Record the owning integrator. Later registrations replace earlier
    /// ones; the strategy is only ever driven by one integrator at a time.
    pub fn register_integrator(&mut self, handle: IntegratorHandle) {
        self.integrator = Some(handle);
    }

    /// The registered integrator handle.
    ///
    /// Fails with [`CouplingError::IntegratorNotRegistered`] before the
    /// first registration; `strategy_name` feeds the diagnostic.
    pub fn integrator(&self, strategy_name: &str) -> Result<&IntegratorHandle, CouplingError> {
        self.integrator
            .as_ref()
            .ok_or_else(|| CouplingError::IntegratorNotRegistered {
                strategy: strategy_name.to_string(),
            })
    }

    /// Toggle reuse of cached ("fixed") interpolation/spreading operators.
    pub fn set_use_fixed_le_operators(&mut self, flag: bool) {
        self.use_fixed_le_operators = flag;
    }

    /// Whether fixed interpolation/spreading operators are in use.
    pub fn use_fixed_le_operators(&self) -> bool {
        self.use_fixed_le_operators
    }
}

impl Default for StrategyServices {
    fn default() -> Self {
        Self::new(&KernelConfig::default())
    }
}
