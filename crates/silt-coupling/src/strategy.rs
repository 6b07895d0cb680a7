//! The [`CouplingStrategy`] contract.
//!
//! This trait is the seam between the outer time integrator and a concrete
//! fluid-structure coupling method. Its operations fall into three tiers:
//!
//! - **mandatory** — no default body; every method must supply them;
//! - **optional with a neutral default** — no-op or conservative value,
//!   overridden only where relevant;
//! - **optional with a fatal default** — calling one on a strategy that
//!   does not override it aborts the process. These mark capabilities that
//!   are meaningful only to a subset of methods; a silent no-op would hide
//!   a caller's logic error, so unsupported use is loud and unrecoverable.
//!
//! # Protocol ordering
//!
//! The integrator guarantees, and implementations may rely on:
//!
//! - [`preprocess_integrate_data`] runs before the first stepping or
//!   interaction call of a step, [`postprocess_integrate_data`] after the
//!   last;
//! - [`compute_lagrangian_force`] runs before the corresponding
//!   [`spread_force`] at the same time value;
//! - ghost cells of any Eulerian field passed into an interaction call are
//!   filled before the call.
//!
//! All calls are strictly sequential within one process; across processes
//! every participant must execute the same collective schedule
//! applications in the same order. That is a caller obligation.
//!
//! [`preprocess_integrate_data`]: CouplingStrategy::preprocess_integrate_data
//! [`postprocess_integrate_data`]: CouplingStrategy::postprocess_integrate_data
//! [`compute_lagrangian_force`]: CouplingStrategy::compute_lagrangian_force
//! [`spread_force`]: CouplingStrategy::spread_force

use crate::error::CouplingError;
use crate::services::StrategyServices;
use silt_core::{GhostWidth, Level, SlotIndex, StateDatabase, StructureId};
use silt_mesh::{BoundaryOp, MeshConfiguration, ScheduleExecutor, TransferSchedule};

/// Abort the process over an unsupported capability.
///
/// The diagnostic names the strategy and the operation so the composition
/// bug is attributable before the run terminates.
pub fn unsupported(strategy: &str, operation: &str) -> ! {
    panic!("coupling strategy '{strategy}' does not support {operation}");
}

/// The contract between the time integrator and one coupling method.
///
/// Implementations own their Lagrangian structure data and compose a
/// [`StrategyServices`] bundle for the variable registry, the transfer
/// registry, and the activation table.
pub trait CouplingStrategy: Send {
    // ── Identity and composed services ─────────────────────────────

    /// Strategy name for diagnostics.
    fn name(&self) -> &str;

    /// Shared service bundle, immutable view.
    fn services(&self) -> &StrategyServices;

    /// Shared service bundle, mutable view.
    fn services_mut(&mut self) -> &mut StrategyServices;

    // ── Mandatory operations ───────────────────────────────────────

    /// Ghost-cell halo required by this method's interpolation and
    /// spreading stencils. Pure query.
    fn minimum_ghost_width(&self) -> GhostWidth;

    /// Read the fluid velocity at `time` (ghost cells already filled) and
    /// update structure kinematic state. Must not mutate fluid-side data.
    fn interpolate_velocity(
        &mut self,
        u_slot: SlotIndex,
        synch_schedules: &[Option<TransferSchedule>],
        ghost_fill_schedules: &[Option<TransferSchedule>],
        executor: &mut dyn ScheduleExecutor,
        time: f64,
    ) -> Result<(), CouplingError>;

    /// Advance structure positions with forward Euler.
    fn forward_euler_step(&mut self, current_time: f64, new_time: f64)
        -> Result<(), CouplingError>;

    /// Advance structure positions with the explicit midpoint rule.
    fn midpoint_step(&mut self, current_time: f64, new_time: f64) -> Result<(), CouplingError>;

    /// Advance structure positions with the explicit trapezoidal rule.
    fn trapezoidal_step(&mut self, current_time: f64, new_time: f64) -> Result<(), CouplingError>;

    /// Evaluate the Lagrangian force model at `time`. Always called before
    /// the matching [`spread_force`](CouplingStrategy::spread_force).
    fn compute_lagrangian_force(&mut self, time: f64) -> Result<(), CouplingError>;

    /// Accumulate the Lagrangian force into the fluid force field at
    /// `time`. Mutates fluid-side data at `f_slot`.
    fn spread_force(
        &mut self,
        f_slot: SlotIndex,
        boundary_op: Option<&dyn BoundaryOp>,
        prolongation_schedules: &[Option<TransferSchedule>],
        executor: &mut dyn ScheduleExecutor,
        time: f64,
    ) -> Result<(), CouplingError>;

    // ── Optional: registration hooks (no-op defaults) ──────────────

    /// Register Eulerian variables with the strategy's own registry.
    fn register_eulerian_variables(&mut self) -> Result<(), CouplingError> {
        Ok(())
    }

    /// Register ghost-fill/prolongation/coarsening algorithms with the
    /// strategy's own transfer registry.
    fn register_communication_algorithms(&mut self) -> Result<(), CouplingError> {
        Ok(())
    }

    /// Raise each tag-buffer entry to at least the minimum ghost width.
    fn setup_tag_buffer(&self, tag_buffer: &mut [u32]) {
        let min = self.minimum_ghost_width().0;
        for entry in tag_buffer.iter_mut() {
            if *entry < min {
                *entry = min;
            }
        }
    }

    // ── Optional: structure activation (fatal defaults) ────────────

    /// Exclude a structure from force spreading and velocity
    /// interpolation. Its data is retained.
    ///
    /// Fatal default: only strategies that own discrete structures can
    /// meaningfully support this.
    fn inactivate_lagrangian_structure(
        &mut self,
        _structure: StructureId,
        _level: Level,
    ) -> Result<(), CouplingError> {
        unsupported(self.name(), "structure inactivation");
    }

    /// Re-include a previously inactivated structure.
    ///
    /// Fatal default, as for
    /// [`inactivate_lagrangian_structure`](CouplingStrategy::inactivate_lagrangian_structure).
    fn activate_lagrangian_structure(
        &mut self,
        _structure: StructureId,
        _level: Level,
    ) -> Result<(), CouplingError> {
        unsupported(self.name(), "structure activation");
    }

    /// Whether a structure currently participates in coupling.
    ///
    /// Fatal default, as for
    /// [`inactivate_lagrangian_structure`](CouplingStrategy::inactivate_lagrangian_structure).
    fn lagrangian_structure_is_activated(
        &self,
        _structure: StructureId,
        _level: Level,
    ) -> Result<bool, CouplingError> {
        unsupported(self.name(), "structure activation queries");
    }

    // ── Optional: regrid trigger ───────────────────────────────────

    /// Ratio of the maximum point displacement since the last regrid to
    /// the local cell width, over all structures owned by this strategy.
    ///
    /// The integrator compares this against its regrid threshold. The
    /// default of 0.0 means "unknown / always safe"; strategies owning
    /// moving structures must override with the real geometric value.
    fn max_point_displacement(&self) -> f64 {
        0.0
    }

    // ── Optional: step bracketing (no-op defaults) ─────────────────

    /// Prepare to advance data from `current_time` to `new_time`.
    fn preprocess_integrate_data(
        &mut self,
        _current_time: f64,
        _new_time: f64,
        _num_cycles: u32,
    ) -> Result<(), CouplingError> {
        Ok(())
    }

    /// Clean up after the last stepping/interaction call of the step.
    fn postprocess_integrate_data(
        &mut self,
        _current_time: f64,
        _new_time: f64,
        _num_cycles: u32,
    ) -> Result<(), CouplingError> {
        Ok(())
    }

    // ── Fixed LE operators ─────────────────────────────────────────

    /// Toggle reuse of cached ("fixed") interpolation/spreading operators
    /// from a previous configuration instead of recomputing each step.
    fn set_use_fixed_le_operators(&mut self, flag: bool) {
        self.services_mut().set_use_fixed_le_operators(flag);
    }

    /// Refresh the positions underlying the fixed operators.
    ///
    /// Fatal default: meaningful only for methods that cache operators.
    fn update_fixed_le_operators(&mut self) -> Result<(), CouplingError> {
        unsupported(self.name(), "fixed LE operator updates");
    }

    // ── Multistep stepping ─────────────────────────────────────────

    /// Announce that multistep time stepping will be used, with
    /// `n_previous_steps` of history available to the scheme.
    ///
    /// Fatal default: a strategy without multistep state cannot honor it.
    fn set_use_multistep_time_stepping(
        &mut self,
        _n_previous_steps: u32,
    ) -> Result<(), CouplingError> {
        unsupported(self.name(), "multistep time stepping");
    }

    /// Advance structure positions with explicit backward Euler.
    ///
    /// Fatal default: optional scheme.
    fn backward_euler_step(
        &mut self,
        _current_time: f64,
        _new_time: f64,
    ) -> Result<(), CouplingError> {
        unsupported(self.name(), "the backward Euler scheme");
    }

    /// Advance structure positions with second-order Adams-Bashforth.
    ///
    /// Fatal default: optional scheme. How a strategy handles an
    /// unpopulated history (the very first step) is its own policy.
    fn ab2_step(&mut self, _current_time: f64, _new_time: f64) -> Result<(), CouplingError> {
        unsupported(self.name(), "the Adams-Bashforth-2 scheme");
    }

    // ── Optional: fluid sources and sinks (no-op defaults) ─────────

    /// Whether this strategy has internal fluid sources or sinks.
    fn has_fluid_sources(&self) -> bool {
        false
    }

    /// Evaluate the Lagrangian source/sink density at `time`.
    fn compute_lagrangian_fluid_source(&mut self, _time: f64) -> Result<(), CouplingError> {
        Ok(())
    }

    /// Spread the source/sink density into the fluid at `q_slot`.
    fn spread_fluid_source(
        &mut self,
        _q_slot: SlotIndex,
        _boundary_op: Option<&dyn BoundaryOp>,
        _prolongation_schedules: &[Option<TransferSchedule>],
        _executor: &mut dyn ScheduleExecutor,
        _time: f64,
    ) -> Result<(), CouplingError> {
        Ok(())
    }

    /// Interpolate the fluid pressure at the source/sink positions.
    fn interpolate_pressure(
        &mut self,
        _p_slot: SlotIndex,
        _synch_schedules: &[Option<TransferSchedule>],
        _ghost_fill_schedules: &[Option<TransferSchedule>],
        _executor: &mut dyn ScheduleExecutor,
        _time: f64,
    ) -> Result<(), CouplingError> {
        Ok(())
    }

    // ── Optional: fluid-solve brackets and post-step hook ──────────

    /// Run just before the fluid equations are solved for one cycle.
    fn preprocess_solve_fluid_equations(
        &mut self,
        _current_time: f64,
        _new_time: f64,
        _cycle_num: u32,
    ) -> Result<(), CouplingError> {
        Ok(())
    }

    /// Run just after the fluid equations are solved for one cycle.
    fn postprocess_solve_fluid_equations(
        &mut self,
        _current_time: f64,
        _new_time: f64,
        _cycle_num: u32,
    ) -> Result<(), CouplingError> {
        Ok(())
    }

    /// User-defined post-processing after the step completes.
    fn postprocess_data(&mut self) -> Result<(), CouplingError> {
        Ok(())
    }

    // ── Optional: hierarchy lifecycle (no-op defaults) ─────────────

    /// Initialize Lagrangian data against the initial mesh configuration.
    ///
    /// Ghost cells for the velocity at `u_slot` are filled on entry in
    /// case initialization needs to interpolate Eulerian data.
    fn initialize_mesh_data(
        &mut self,
        _config: &MeshConfiguration,
        _u_slot: SlotIndex,
        _executor: &mut dyn ScheduleExecutor,
        _init_time: f64,
        _initial_time: bool,
    ) -> Result<(), CouplingError> {
        Ok(())
    }

    /// Add this strategy's estimated per-cell computational cost into the
    /// caller-supplied workload field for one level. Additive.
    fn add_workload_estimate(
        &self,
        _config: &MeshConfiguration,
        _level: u32,
        _workload: &mut [f64],
    ) {
    }

    /// Register the load balancer consuming this strategy's workload
    /// estimates, naming the slot it reads them from.
    ///
    /// Retained for drivers that wire the balancer to the strategy
    /// directly; the preferred path is the integrator-owned balancer fed
    /// through
    /// [`add_workload_estimate`](CouplingStrategy::add_workload_estimate).
    fn register_load_balancer(
        &mut self,
        _workload_slot: SlotIndex,
    ) -> Result<(), CouplingError> {
        Ok(())
    }

    /// Begin redistributing Lagrangian data before a regrid.
    fn begin_data_redistribution(
        &mut self,
        _config: &MeshConfiguration,
    ) -> Result<(), CouplingError> {
        Ok(())
    }

    /// Complete redistributing Lagrangian data after a regrid.
    fn end_data_redistribution(
        &mut self,
        _config: &MeshConfiguration,
    ) -> Result<(), CouplingError> {
        Ok(())
    }

    /// Initialize data on a level newly inserted into the hierarchy.
    fn initialize_level_data(
        &mut self,
        _config: &MeshConfiguration,
        _level: u32,
        _init_time: f64,
        _initial_time: bool,
    ) -> Result<(), CouplingError> {
        Ok(())
    }

    /// Reset cached hierarchy-dependent data after a reconfiguration.
    ///
    /// The default recompiles every registered transfer schedule against
    /// the new configuration, which is what nearly every method needs;
    /// overrides that cache more must also call this or rebuild
    /// themselves.
    fn reset_hierarchy_configuration(
        &mut self,
        config: &MeshConfiguration,
        _coarsest_level: u32,
        _finest_level: u32,
    ) -> Result<(), CouplingError> {
        self.services_mut().transfers.rebuild_schedules(config)?;
        Ok(())
    }

    /// Tag cells needing refinement on one level. `tags` holds one entry
    /// per cell of the level; nonzero means refine.
    fn apply_gradient_detector(
        &mut self,
        _config: &MeshConfiguration,
        _level: u32,
        _error_data_time: f64,
        _tags: &mut [u8],
        _initial_time: bool,
    ) -> Result<(), CouplingError> {
        Ok(())
    }

    // ── Optional: restart (no-op defaults) ─────────────────────────

    /// Write persisted state under the caller's key namespace.
    fn write_restart_data(&self, _db: &mut StateDatabase) {}

    /// Read persisted state written by
    /// [`write_restart_data`](CouplingStrategy::write_restart_data).
    fn read_restart_data(&mut self, _db: &StateDatabase) -> Result<(), CouplingError> {
        Ok(())
    }
}
