//! Test utilities and mock types for Silt development.
//!
//! Provides fixture mesh configurations, mock [`ScheduleExecutor`]
//! implementations, and a [`RecordingStrategy`] that logs every trait call
//! so tests can assert on protocol ordering.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use silt_core::{GhostWidth, Level, SlotIndex, StructureId};
use silt_coupling::{CouplingError, CouplingStrategy, StrategyServices};
use silt_mesh::{
    BoundaryOp, MeshConfiguration, MeshError, ScheduleExecutor, TransferKind, TransferSchedule,
};

/// A two-level mesh with refinement ratio 2 and unit base cell width.
pub fn two_level_config() -> MeshConfiguration {
    MeshConfiguration::uniform(2, 4, 1.0, 2).expect("valid fixture configuration")
}

/// A three-level mesh with refinement ratio 2 and unit base cell width.
pub fn three_level_config() -> MeshConfiguration {
    MeshConfiguration::uniform(3, 4, 1.0, 2).expect("valid fixture configuration")
}

/// Executor that accepts every schedule and does nothing.
#[derive(Debug, Default)]
pub struct NullExecutor;

impl ScheduleExecutor for NullExecutor {
    fn execute(&mut self, _schedule: &TransferSchedule) -> Result<(), MeshError> {
        Ok(())
    }
}

/// Executor that records `(kind, level)` for every executed schedule.
#[derive(Debug, Default)]
pub struct CountingExecutor {
    executed: Vec<(TransferKind, u32)>,
}

impl CountingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules executed so far, in order.
    pub fn executed(&self) -> &[(TransferKind, u32)] {
        &self.executed
    }

    pub fn count(&self) -> usize {
        self.executed.len()
    }
}

impl ScheduleExecutor for CountingExecutor {
    fn execute(&mut self, schedule: &TransferSchedule) -> Result<(), MeshError> {
        self.executed.push((schedule.kind(), schedule.level()));
        Ok(())
    }
}

/// Executor that fails every exchange.
#[derive(Debug, Default)]
pub struct FailingExecutor;

impl ScheduleExecutor for FailingExecutor {
    fn execute(&mut self, schedule: &TransferSchedule) -> Result<(), MeshError> {
        Err(MeshError::ExchangeFailed {
            reason: format!("mock failure on {} level {}", schedule.kind(), schedule.level()),
        })
    }
}

fn apply_all(
    schedules: &[Option<TransferSchedule>],
    executor: &mut dyn ScheduleExecutor,
) -> Result<(), MeshError> {
    for schedule in schedules.iter().flatten() {
        schedule.apply(executor)?;
    }
    Ok(())
}

/// Strategy double that records every trait call by name, in order.
///
/// Implements the optional capabilities (multistep schemes, structure
/// activation) so capability-dispatch tests can assert they were reached;
/// interaction calls push their compiled schedules through the supplied
/// executor so executor doubles observe realistic traffic.
pub struct RecordingStrategy {
    services: StrategyServices,
    config: MeshConfiguration,
    ghost_width: GhostWidth,
    calls: Vec<String>,
}

impl RecordingStrategy {
    pub fn new() -> Self {
        Self::with_config(two_level_config())
    }

    pub fn with_config(config: MeshConfiguration) -> Self {
        Self {
            services: StrategyServices::default(),
            config,
            ghost_width: GhostWidth(4),
            calls: Vec::new(),
        }
    }

    /// Calls recorded so far, in order.
    pub fn calls(&self) -> &[String] {
        &self.calls
    }

    /// Drain the recorded calls.
    pub fn take_calls(&mut self) -> Vec<String> {
        std::mem::take(&mut self.calls)
    }

    fn record(&mut self, call: &str) {
        self.calls.push(call.to_string());
    }
}

impl Default for RecordingStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl CouplingStrategy for RecordingStrategy {
    fn name(&self) -> &str {
        "recording"
    }

    fn services(&self) -> &StrategyServices {
        &self.services
    }

    fn services_mut(&mut self) -> &mut StrategyServices {
        &mut self.services
    }

    fn minimum_ghost_width(&self) -> GhostWidth {
        self.ghost_width
    }

    fn interpolate_velocity(
        &mut self,
        _u_slot: SlotIndex,
        synch_schedules: &[Option<TransferSchedule>],
        ghost_fill_schedules: &[Option<TransferSchedule>],
        executor: &mut dyn ScheduleExecutor,
        _time: f64,
    ) -> Result<(), CouplingError> {
        self.record("interpolate_velocity");
        apply_all(synch_schedules, executor)?;
        apply_all(ghost_fill_schedules, executor)?;
        Ok(())
    }

    fn forward_euler_step(
        &mut self,
        _current_time: f64,
        _new_time: f64,
    ) -> Result<(), CouplingError> {
        self.record("forward_euler_step");
        Ok(())
    }

    fn midpoint_step(&mut self, _current_time: f64, _new_time: f64) -> Result<(), CouplingError> {
        self.record("midpoint_step");
        Ok(())
    }

    fn trapezoidal_step(
        &mut self,
        _current_time: f64,
        _new_time: f64,
    ) -> Result<(), CouplingError> {
        self.record("trapezoidal_step");
        Ok(())
    }

    fn compute_lagrangian_force(&mut self, _time: f64) -> Result<(), CouplingError> {
        self.record("compute_lagrangian_force");
        Ok(())
    }

    fn spread_force(
        &mut self,
        _f_slot: SlotIndex,
        _boundary_op: Option<&dyn BoundaryOp>,
        prolongation_schedules: &[Option<TransferSchedule>],
        executor: &mut dyn ScheduleExecutor,
        _time: f64,
    ) -> Result<(), CouplingError> {
        self.record("spread_force");
        apply_all(prolongation_schedules, executor)?;
        Ok(())
    }

    fn preprocess_integrate_data(
        &mut self,
        _current_time: f64,
        _new_time: f64,
        _num_cycles: u32,
    ) -> Result<(), CouplingError> {
        self.record("preprocess_integrate_data");
        Ok(())
    }

    fn postprocess_integrate_data(
        &mut self,
        _current_time: f64,
        _new_time: f64,
        _num_cycles: u32,
    ) -> Result<(), CouplingError> {
        self.record("postprocess_integrate_data");
        Ok(())
    }

    fn backward_euler_step(
        &mut self,
        _current_time: f64,
        _new_time: f64,
    ) -> Result<(), CouplingError> {
        self.record("backward_euler_step");
        Ok(())
    }

    fn ab2_step(&mut self, _current_time: f64, _new_time: f64) -> Result<(), CouplingError> {
        self.record("ab2_step");
        Ok(())
    }

    fn set_use_multistep_time_stepping(
        &mut self,
        n_previous_steps: u32,
    ) -> Result<(), CouplingError> {
        self.record("set_use_multistep_time_stepping");
        self.services.multistep.history_depth = Some(n_previous_steps);
        Ok(())
    }

    fn inactivate_lagrangian_structure(
        &mut self,
        structure: StructureId,
        level: Level,
    ) -> Result<(), CouplingError> {
        self.record("inactivate_lagrangian_structure");
        self.services
            .activation
            .deactivate(structure, level, &self.config)?;
        Ok(())
    }

    fn activate_lagrangian_structure(
        &mut self,
        structure: StructureId,
        level: Level,
    ) -> Result<(), CouplingError> {
        self.record("activate_lagrangian_structure");
        self.services
            .activation
            .activate(structure, level, &self.config)?;
        Ok(())
    }

    fn lagrangian_structure_is_activated(
        &self,
        structure: StructureId,
        level: Level,
    ) -> Result<bool, CouplingError> {
        Ok(self
            .services
            .activation
            .is_activated(structure, level, &self.config)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_strategy_logs_in_call_order() {
        let mut strategy = RecordingStrategy::new();
        strategy.preprocess_integrate_data(0.0, 0.1, 1).unwrap();
        strategy.compute_lagrangian_force(0.0).unwrap();
        assert_eq!(
            strategy.take_calls(),
            vec!["preprocess_integrate_data", "compute_lagrangian_force"]
        );
        assert!(strategy.calls().is_empty());
    }

    #[test]
    fn counting_executor_observes_schedule_traffic() {
        use silt_core::GhostWidth;
        use silt_mesh::TransferAlgorithm;

        let config = two_level_config();
        let algorithm = TransferAlgorithm::new(vec![SlotIndex(0)], GhostWidth(4), "linear_refine");
        let schedule =
            TransferSchedule::compile(TransferKind::GhostFill, 1, &config, &algorithm).unwrap();

        let mut executor = CountingExecutor::new();
        schedule.apply(&mut executor).unwrap();
        assert_eq!(executor.executed(), &[(TransferKind::GhostFill, 1)]);
    }

    #[test]
    fn failing_executor_surfaces_exchange_errors() {
        use silt_core::GhostWidth;
        use silt_mesh::TransferAlgorithm;

        let config = two_level_config();
        let algorithm = TransferAlgorithm::new(vec![SlotIndex(0)], GhostWidth(2), "average");
        let schedule =
            TransferSchedule::compile(TransferKind::Coarsening, 1, &config, &algorithm).unwrap();

        let mut executor = FailingExecutor;
        let result = schedule.apply(&mut executor);
        assert!(matches!(result, Err(MeshError::ExchangeFailed { .. })));
    }
}
