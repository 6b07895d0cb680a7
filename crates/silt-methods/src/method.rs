//! A tether-force point-set coupling method.
//!
//! [`PointSetMethod`] couples immersed structures, each a cloud of
//! Lagrangian points tethered to fixed anchors, to an Eulerian velocity
//! field. Velocity interpolation and force spreading use tensor-product
//! delta kernels, so the method's ghost-width requirement follows directly
//! from the kernel supports.
//!
//! The Eulerian velocity is supplied as an evaluation callback: the mesh
//! side fills ghost data through the usual transfer schedules, then the
//! method samples the field at the kernel stencil's cell centers. Force
//! travels the other way through a deposit sink that receives one
//! kernel-weighted contribution per stencil cell.

use crate::kernel::DeltaKernel;
use crate::points::StructurePoints;
use indexmap::IndexMap;
use silt_core::{
    GhostWidth, Level, Position, RegistryError, SlotIndex, StateDatabase, StateValue, StructureId,
};
use silt_coupling::{
    CouplingError, CouplingStrategy, KernelConfig, StateVariableSpec, StrategyServices,
};
use silt_mesh::{
    AverageCoarsenOp, BoundaryOp, CopyBoundaryOp, MeshConfiguration, ScheduleExecutor,
    TransferAlgorithm, TransferSchedule,
};
use smallvec::smallvec;

/// Eulerian velocity evaluated at a position and time.
pub type VelocityField = Box<dyn Fn(&Position, f64) -> [f64; 3] + Send>;

/// Receives one kernel-weighted force contribution at a cell center.
pub type ForceSink = Box<dyn FnMut(&Position, [f64; 3]) + Send>;

/// Name under which the method registers its Eulerian velocity variable.
pub const VELOCITY_VARIABLE: &str = "velocity";
/// Name under which the method registers its Eulerian body-force variable.
pub const FORCE_VARIABLE: &str = "body_force";

/// Nominal per-point cost relative to one fluid cell, for load balancing.
const POINT_WORKLOAD: f64 = 1.0;

fn apply_all(
    schedules: &[Option<TransferSchedule>],
    executor: &mut dyn ScheduleExecutor,
) -> Result<(), CouplingError> {
    for schedule in schedules.iter().flatten() {
        schedule.apply(executor)?;
    }
    Ok(())
}

/// Tether-force immersed point-set method.
pub struct PointSetMethod {
    name: String,
    services: StrategyServices,
    interp_kernel: DeltaKernel,
    spread_kernel: DeltaKernel,
    structures: IndexMap<StructureId, StructurePoints>,
    config: Option<MeshConfiguration>,
    velocity_field: VelocityField,
    force_sink: Option<ForceSink>,
    velocity_slots: Option<SlotIndex>,
    force_slot: Option<SlotIndex>,
    fixed_positions: Option<IndexMap<StructureId, Vec<Position>>>,
    last_spread_total: [f64; 3],
    interpolated_this_step: bool,
}

impl PointSetMethod {
    /// Create a method with the given kernel configuration and velocity
    /// field. Fails if a configured kernel name is unknown.
    pub fn new(
        name: impl Into<String>,
        kernels: &KernelConfig,
        velocity_field: VelocityField,
    ) -> Result<Self, RegistryError> {
        let services = StrategyServices::new(kernels);
        let selection = services.kernels();
        let interp_kernel = DeltaKernel::from_name(&selection.interp)?;
        let spread_kernel = DeltaKernel::from_name(&selection.spread)?;
        Ok(Self {
            name: name.into(),
            services,
            interp_kernel,
            spread_kernel,
            structures: IndexMap::new(),
            config: None,
            velocity_field,
            force_sink: None,
            velocity_slots: None,
            force_slot: None,
            fixed_positions: None,
            last_spread_total: [0.0; 3],
            interpolated_this_step: false,
        })
    }

    /// Add an immersed structure. Identifiers must be unique.
    pub fn add_structure(&mut self, points: StructurePoints) -> Result<(), CouplingError> {
        if self.structures.contains_key(&points.id()) {
            return Err(RegistryError::DuplicateName {
                registry: "structure",
                name: points.id().to_string(),
            }
            .into());
        }
        self.structures.insert(points.id(), points);
        Ok(())
    }

    /// The structure registered under `id`, if any.
    pub fn structure(&self, id: StructureId) -> Option<&StructurePoints> {
        self.structures.get(&id)
    }

    /// Registered structures in registration order.
    pub fn structures(&self) -> impl Iterator<Item = &StructurePoints> {
        self.structures.values()
    }

    /// Componentwise total force pushed into the fluid by the most recent
    /// [`spread_force`](CouplingStrategy::spread_force) call.
    pub fn last_spread_total(&self) -> [f64; 3] {
        self.last_spread_total
    }

    /// Install the Eulerian deposit target for force spreading. Each
    /// spread hands the sink one kernel-weighted contribution per stencil
    /// cell of every active point.
    pub fn set_force_sink(&mut self, sink: ForceSink) {
        self.force_sink = Some(sink);
    }

    /// Interpolation kernel in use.
    pub fn interp_kernel(&self) -> DeltaKernel {
        self.interp_kernel
    }

    /// Spreading kernel in use.
    pub fn spread_kernel(&self) -> DeltaKernel {
        self.spread_kernel
    }

    fn mesh(&self) -> Result<&MeshConfiguration, CouplingError> {
        self.config.as_ref().ok_or_else(|| CouplingError::MethodFailed {
            strategy: self.name.clone(),
            reason: "no mesh configuration has been supplied".to_string(),
        })
    }

    /// Activation flags for every structure, in registration order.
    fn active_flags(&self) -> Result<Vec<bool>, CouplingError> {
        let config = self.mesh()?;
        self.structures
            .values()
            .map(|s| {
                Ok(self
                    .services
                    .activation
                    .is_activated(s.id(), Level::Number(s.level()), config)?)
            })
            .collect()
    }

    /// Kernel-weighted sample of the velocity field at one point.
    fn sample(&self, position: &Position, h: f64, time: f64) -> Position {
        let kernel = self.interp_kernel;
        let sx = kernel.stencil(position[0] / h);
        let sy = kernel.stencil(position[1] / h);
        let sz = kernel.stencil(position[2] / h);
        let mut out: Position = smallvec![0.0, 0.0, 0.0];
        for &(i, wx) in &sx {
            for &(j, wy) in &sy {
                for &(k, wz) in &sz {
                    let w = wx * wy * wz;
                    let center: Position = smallvec![
                        (i as f64 + 0.5) * h,
                        (j as f64 + 0.5) * h,
                        (k as f64 + 0.5) * h,
                    ];
                    let u = (self.velocity_field)(&center, time);
                    for d in 0..3 {
                        out[d] += w * u[d];
                    }
                }
            }
        }
        out
    }

    fn sample_all(&mut self, time: f64) -> Result<(), CouplingError> {
        let flags = self.active_flags()?;
        let config = self.mesh()?;
        let mut sampled: Vec<Option<Vec<Position>>> = Vec::with_capacity(self.structures.len());
        for (points, active) in self.structures.values().zip(flags.iter().copied()) {
            if !active {
                sampled.push(None);
                continue;
            }
            let h = config.cell_width(points.level())?;
            sampled.push(Some(
                points
                    .working_positions()
                    .iter()
                    .map(|p| self.sample(p, h, time))
                    .collect(),
            ));
        }
        let first = !self.interpolated_this_step;
        for (points, velocities) in self.structures.values_mut().zip(sampled) {
            if let Some(velocities) = velocities {
                points.velocity_latest = velocities;
                if first {
                    points.velocity_current = points.velocity_latest.clone();
                }
            }
        }
        self.interpolated_this_step = true;
        Ok(())
    }

    /// Advance every active structure with `advance(position, current
    /// velocity, latest velocity, previous velocity) -> new position`.
    fn advance_with<F>(&mut self, advance: F) -> Result<(), CouplingError>
    where
        F: Fn(&Position, &Position, &Position, Option<&Position>) -> Position,
    {
        let flags = self.active_flags()?;
        for (points, active) in self.structures.values_mut().zip(flags) {
            if !active {
                continue;
            }
            let advanced: Vec<Position> = points
                .positions()
                .iter()
                .enumerate()
                .map(|(i, x)| {
                    advance(
                        x,
                        &points.velocity_current[i],
                        &points.velocity_latest[i],
                        points.velocity_previous.as_ref().map(|v| &v[i]),
                    )
                })
                .collect();
            points.set_advanced(advanced);
        }
        Ok(())
    }
}

fn step(x: &Position, u: &Position, dt: f64) -> Position {
    smallvec![x[0] + dt * u[0], x[1] + dt * u[1], x[2] + dt * u[2]]
}

impl CouplingStrategy for PointSetMethod {
    fn name(&self) -> &str {
        &self.name
    }

    fn services(&self) -> &StrategyServices {
        &self.services
    }

    fn services_mut(&mut self) -> &mut StrategyServices {
        &mut self.services
    }

    fn minimum_ghost_width(&self) -> GhostWidth {
        GhostWidth(
            self.interp_kernel
                .ghost_width()
                .0
                .max(self.spread_kernel.ghost_width().0),
        )
    }

    fn register_eulerian_variables(&mut self) -> Result<(), CouplingError> {
        let ghosts = self.minimum_ghost_width();
        let slots = self.services.variables.register_state_variable(
            StateVariableSpec::new(VELOCITY_VARIABLE, ghosts)
                .with_operators("average", "linear_refine"),
        )?;
        self.velocity_slots = slots.scratch;
        self.force_slot = Some(
            self.services
                .variables
                .register_scratch_variable(FORCE_VARIABLE, ghosts, false)?,
        );
        Ok(())
    }

    fn register_communication_algorithms(&mut self) -> Result<(), CouplingError> {
        let ghosts = self.minimum_ghost_width();
        let u_scratch = self.velocity_slots.ok_or_else(|| CouplingError::MethodFailed {
            strategy: self.name.clone(),
            reason: "variables must be registered before communication algorithms".to_string(),
        })?;
        let f_slot = self.force_slot.ok_or_else(|| CouplingError::MethodFailed {
            strategy: self.name.clone(),
            reason: "variables must be registered before communication algorithms".to_string(),
        })?;
        self.services.transfers.register_ghost_fill(
            VELOCITY_VARIABLE,
            TransferAlgorithm::new(vec![u_scratch], ghosts, "linear_refine"),
            Some(Box::new(CopyBoundaryOp)),
        )?;
        self.services.transfers.register_prolongation(
            FORCE_VARIABLE,
            TransferAlgorithm::new(vec![f_slot], ghosts, "linear_refine"),
            None,
        )?;
        self.services.transfers.register_coarsening(
            VELOCITY_VARIABLE,
            TransferAlgorithm::new(vec![u_scratch], ghosts, "average"),
            Some(Box::new(AverageCoarsenOp)),
        )?;
        Ok(())
    }

    fn interpolate_velocity(
        &mut self,
        _u_slot: SlotIndex,
        synch_schedules: &[Option<TransferSchedule>],
        ghost_fill_schedules: &[Option<TransferSchedule>],
        executor: &mut dyn ScheduleExecutor,
        time: f64,
    ) -> Result<(), CouplingError> {
        apply_all(synch_schedules, executor)?;
        apply_all(ghost_fill_schedules, executor)?;
        self.sample_all(time)
    }

    fn forward_euler_step(
        &mut self,
        current_time: f64,
        new_time: f64,
    ) -> Result<(), CouplingError> {
        let dt = new_time - current_time;
        self.advance_with(|x, u_current, _latest, _previous| step(x, u_current, dt))
    }

    fn midpoint_step(&mut self, current_time: f64, new_time: f64) -> Result<(), CouplingError> {
        // The caller interpolates the midpoint velocity before this call.
        let dt = new_time - current_time;
        self.advance_with(|x, _current, u_latest, _previous| step(x, u_latest, dt))
    }

    fn trapezoidal_step(&mut self, current_time: f64, new_time: f64) -> Result<(), CouplingError> {
        let dt = new_time - current_time;
        self.advance_with(|x, u_current, u_latest, _previous| {
            let mean: Position = smallvec![
                0.5 * (u_current[0] + u_latest[0]),
                0.5 * (u_current[1] + u_latest[1]),
                0.5 * (u_current[2] + u_latest[2]),
            ];
            step(x, &mean, dt)
        })
    }

    fn backward_euler_step(
        &mut self,
        current_time: f64,
        new_time: f64,
    ) -> Result<(), CouplingError> {
        // The caller interpolates the end-of-step velocity before this call.
        let dt = new_time - current_time;
        self.advance_with(|x, _current, u_latest, _previous| step(x, u_latest, dt))
    }

    fn ab2_step(&mut self, current_time: f64, new_time: f64) -> Result<(), CouplingError> {
        let dt = new_time - current_time;
        self.advance_with(|x, u_current, _latest, previous| match previous {
            Some(u_previous) => {
                let extrapolated: Position = smallvec![
                    1.5 * u_current[0] - 0.5 * u_previous[0],
                    1.5 * u_current[1] - 0.5 * u_previous[1],
                    1.5 * u_current[2] - 0.5 * u_previous[2],
                ];
                step(x, &extrapolated, dt)
            }
            // Self-start: no history on the first step.
            None => step(x, u_current, dt),
        })
    }

    fn set_use_multistep_time_stepping(
        &mut self,
        n_previous_steps: u32,
    ) -> Result<(), CouplingError> {
        self.services.multistep.history_depth = Some(n_previous_steps);
        Ok(())
    }

    fn compute_lagrangian_force(&mut self, _time: f64) -> Result<(), CouplingError> {
        let flags = self.active_flags()?;
        for (points, active) in self.structures.values_mut().zip(flags) {
            if active {
                points.compute_tether_forces();
            } else {
                points.clear_forces();
            }
        }
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
        let flags = self.active_flags()?;
        let widths = {
            let config = self.mesh()?;
            let mut widths = Vec::with_capacity(self.structures.len());
            for points in self.structures.values() {
                widths.push(config.cell_width(points.level())?);
            }
            widths
        };
        let kernel = self.spread_kernel;
        let mut sink = self.force_sink.take();
        let mut total = [0.0; 3];
        for ((points, active), h) in self
            .structures
            .values()
            .zip(flags.iter().copied())
            .zip(widths)
        {
            if !active {
                continue;
            }
            for (x, force) in points.working_positions().iter().zip(points.forces()) {
                for d in 0..3 {
                    total[d] += force[d];
                }
                let Some(sink) = sink.as_mut() else {
                    continue;
                };
                let sx = kernel.stencil(x[0] / h);
                let sy = kernel.stencil(x[1] / h);
                let sz = kernel.stencil(x[2] / h);
                for &(i, wx) in &sx {
                    for &(j, wy) in &sy {
                        for &(k, wz) in &sz {
                            let w = wx * wy * wz;
                            let center: Position = smallvec![
                                (i as f64 + 0.5) * h,
                                (j as f64 + 0.5) * h,
                                (k as f64 + 0.5) * h,
                            ];
                            sink(&center, [w * force[0], w * force[1], w * force[2]]);
                        }
                    }
                }
            }
        }
        self.force_sink = sink;
        self.last_spread_total = total;
        apply_all(prolongation_schedules, executor)
    }

    fn inactivate_lagrangian_structure(
        &mut self,
        structure: StructureId,
        level: Level,
    ) -> Result<(), CouplingError> {
        let config = self.mesh()?.clone();
        self.services.activation.deactivate(structure, level, &config)?;
        Ok(())
    }

    fn activate_lagrangian_structure(
        &mut self,
        structure: StructureId,
        level: Level,
    ) -> Result<(), CouplingError> {
        let config = self.mesh()?.clone();
        self.services.activation.activate(structure, level, &config)?;
        Ok(())
    }

    fn lagrangian_structure_is_activated(
        &self,
        structure: StructureId,
        level: Level,
    ) -> Result<bool, CouplingError> {
        let config = self.mesh()?;
        Ok(self.services.activation.is_activated(structure, level, config)?)
    }

    fn max_point_displacement(&self) -> f64 {
        let Some(config) = self.config.as_ref() else {
            return 0.0;
        };
        self.structures
            .values()
            .filter_map(|points| {
                let h = config.cell_width(points.level()).ok()?;
                Some(points.max_displacement() / h)
            })
            .fold(0.0, f64::max)
    }

    fn preprocess_integrate_data(
        &mut self,
        current_time: f64,
        new_time: f64,
        _num_cycles: u32,
    ) -> Result<(), CouplingError> {
        if new_time <= current_time {
            return Err(CouplingError::MethodFailed {
                strategy: self.name.clone(),
                reason: format!("non-positive step from {current_time} to {new_time}"),
            });
        }
        self.interpolated_this_step = false;
        Ok(())
    }

    fn postprocess_integrate_data(
        &mut self,
        _current_time: f64,
        _new_time: f64,
        _num_cycles: u32,
    ) -> Result<(), CouplingError> {
        for points in self.structures.values_mut() {
            points.commit_step();
        }
        self.interpolated_this_step = false;
        Ok(())
    }

    fn update_fixed_le_operators(&mut self) -> Result<(), CouplingError> {
        if !self.services.use_fixed_le_operators() {
            return Err(CouplingError::MethodFailed {
                strategy: self.name.clone(),
                reason: "fixed LE operators are not enabled".to_string(),
            });
        }
        self.fixed_positions = Some(
            self.structures
                .values()
                .map(|s| (s.id(), s.positions().to_vec()))
                .collect(),
        );
        Ok(())
    }

    fn initialize_mesh_data(
        &mut self,
        config: &MeshConfiguration,
        _u_slot: SlotIndex,
        executor: &mut dyn ScheduleExecutor,
        init_time: f64,
        _initial_time: bool,
    ) -> Result<(), CouplingError> {
        self.config = Some(config.clone());
        self.services.transfers.rebuild_schedules(config)?;
        if self.services.transfers.ghost_fill_algorithm(VELOCITY_VARIABLE).is_ok() {
            let schedules = self
                .services
                .transfers
                .ghost_fill_schedules(VELOCITY_VARIABLE)?
                .to_vec();
            apply_all(&schedules, executor)?;
        }
        self.sample_all(init_time)?;
        self.interpolated_this_step = false;
        for points in self.structures.values_mut() {
            points.mark_regrid();
        }
        Ok(())
    }

    fn add_workload_estimate(
        &self,
        _config: &MeshConfiguration,
        level: u32,
        workload: &mut [f64],
    ) {
        if workload.is_empty() {
            return;
        }
        let points_on_level: usize = self
            .structures
            .values()
            .filter(|s| s.level() == level)
            .map(StructurePoints::len)
            .sum();
        // Even split; the integrator's balancer only needs totals per level.
        let per_cell = points_on_level as f64 * POINT_WORKLOAD / workload.len() as f64;
        for cell in workload.iter_mut() {
            *cell += per_cell;
        }
    }

    fn end_data_redistribution(
        &mut self,
        _config: &MeshConfiguration,
    ) -> Result<(), CouplingError> {
        for points in self.structures.values_mut() {
            points.mark_regrid();
        }
        Ok(())
    }

    fn reset_hierarchy_configuration(
        &mut self,
        config: &MeshConfiguration,
        _coarsest_level: u32,
        _finest_level: u32,
    ) -> Result<(), CouplingError> {
        self.config = Some(config.clone());
        self.services.transfers.rebuild_schedules(config)?;
        Ok(())
    }

    fn write_restart_data(&self, db: &mut StateDatabase) {
        for points in self.structures.values() {
            let prefix = format!("{}/structures/{}", self.name, points.id());
            let mut flat = Vec::with_capacity(points.len() * 3);
            for p in points.positions() {
                flat.extend_from_slice(&[p[0], p[1], p[2]]);
            }
            db.put(format!("{prefix}/positions"), StateValue::FloatVec(flat));
            db.put(
                format!("{prefix}/stiffness"),
                StateValue::Float(points.stiffness()),
            );
            db.put(
                format!("{prefix}/level"),
                StateValue::Int(i64::from(points.level())),
            );
        }
    }

    fn read_restart_data(&mut self, db: &StateDatabase) -> Result<(), CouplingError> {
        let name = self.name.clone();
        for points in self.structures.values_mut() {
            let prefix = format!("{}/structures/{}", name, points.id());
            let flat = db
                .get_float_vec(&format!("{prefix}/positions"))
                .ok_or_else(|| CouplingError::MethodFailed {
                    strategy: name.clone(),
                    reason: format!("restart data missing positions for structure {}", points.id()),
                })?;
            if flat.len() != points.len() * 3 {
                return Err(CouplingError::MethodFailed {
                    strategy: name.clone(),
                    reason: format!(
                        "restart positions for structure {} hold {} floats, expected {}",
                        points.id(),
                        flat.len(),
                        points.len() * 3
                    ),
                });
            }
            let positions: Vec<Position> = flat
                .chunks_exact(3)
                .map(|c| smallvec![c[0], c[1], c[2]])
                .collect();
            points.reset_positions(positions);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use silt_test_utils::{two_level_config, CountingExecutor, NullExecutor};
    use smallvec::smallvec;
    use std::sync::{Arc, Mutex};

    fn uniform_field(u: [f64; 3]) -> VelocityField {
        Box::new(move |_p: &Position, _t: f64| u)
    }

    fn method_with(field: VelocityField) -> PointSetMethod {
        let mut method =
            PointSetMethod::new("tether", &KernelConfig::default(), field).unwrap();
        method
            .add_structure(StructurePoints::new(
                StructureId(0),
                1,
                vec![smallvec![1.0, 1.0, 1.0], smallvec![2.0, 1.0, 1.0]],
                10.0,
            ))
            .unwrap();
        let config = two_level_config();
        let mut executor = NullExecutor;
        method
            .initialize_mesh_data(&config, SlotIndex(0), &mut executor, 0.0, true)
            .unwrap();
        method
    }

    #[test]
    fn ghost_width_follows_the_wider_kernel() {
        let method = method_with(uniform_field([0.0; 3]));
        // Default IB_4 on both sides.
        assert_eq!(method.minimum_ghost_width(), GhostWidth(3));
    }

    #[test]
    fn unknown_kernel_name_rejected() {
        let config = KernelConfig {
            interp_delta_fcn: Some("IB_9".to_string()),
            ..KernelConfig::default()
        };
        let result = PointSetMethod::new("tether", &config, uniform_field([0.0; 3]));
        assert!(matches!(
            result,
            Err(RegistryError::UnknownOperator { .. })
        ));
    }

    #[test]
    fn uniform_field_is_sampled_exactly() {
        // Partition of unity makes a constant field interpolate exactly.
        let mut method = method_with(uniform_field([2.0, -1.0, 0.5]));
        let mut executor = NullExecutor;
        method.preprocess_integrate_data(0.0, 0.1, 1).unwrap();
        method
            .interpolate_velocity(SlotIndex(0), &[], &[], &mut executor, 0.0)
            .unwrap();
        let points = method.structure(StructureId(0)).unwrap();
        for u in &points.velocity_latest {
            assert!((u[0] - 2.0).abs() < 1e-12);
            assert!((u[1] + 1.0).abs() < 1e-12);
            assert!((u[2] - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn forward_euler_moves_points_by_u_dt() {
        let mut method = method_with(uniform_field([1.0, 0.0, 0.0]));
        let mut executor = NullExecutor;
        method.preprocess_integrate_data(0.0, 0.5, 1).unwrap();
        method
            .interpolate_velocity(SlotIndex(0), &[], &[], &mut executor, 0.0)
            .unwrap();
        method.forward_euler_step(0.0, 0.5).unwrap();
        method.postprocess_integrate_data(0.0, 0.5, 1).unwrap();
        let points = method.structure(StructureId(0)).unwrap();
        assert!((points.positions()[0][0] - 1.5).abs() < 1e-12);
        assert!((points.positions()[1][0] - 2.5).abs() < 1e-12);
    }

    #[test]
    fn ab2_first_step_matches_forward_euler() {
        let mut euler = method_with(uniform_field([0.0, 2.0, 0.0]));
        let mut ab2 = method_with(uniform_field([0.0, 2.0, 0.0]));
        let mut executor = NullExecutor;
        for method in [&mut euler, &mut ab2] {
            method.preprocess_integrate_data(0.0, 0.25, 1).unwrap();
            method
                .interpolate_velocity(SlotIndex(0), &[], &[], &mut executor, 0.0)
                .unwrap();
        }
        euler.forward_euler_step(0.0, 0.25).unwrap();
        ab2.set_use_multistep_time_stepping(1).unwrap();
        ab2.ab2_step(0.0, 0.25).unwrap();
        let a = euler.structure(StructureId(0)).unwrap().working_positions();
        let b = ab2.structure(StructureId(0)).unwrap().working_positions();
        for (pa, pb) in a.iter().zip(b) {
            for d in 0..3 {
                assert!((pa[d] - pb[d]).abs() < 1e-14);
            }
        }
    }

    #[test]
    fn inactive_structure_neither_moves_nor_spreads() {
        let mut method = method_with(uniform_field([1.0, 0.0, 0.0]));
        method
            .add_structure(StructurePoints::new(
                StructureId(1),
                1,
                vec![smallvec![4.0, 4.0, 4.0]],
                5.0,
            ))
            .unwrap();
        method
            .inactivate_lagrangian_structure(StructureId(1), Level::Number(1))
            .unwrap();

        let mut executor = NullExecutor;
        method.preprocess_integrate_data(0.0, 0.5, 1).unwrap();
        method
            .interpolate_velocity(SlotIndex(0), &[], &[], &mut executor, 0.0)
            .unwrap();
        method.forward_euler_step(0.0, 0.5).unwrap();
        method.compute_lagrangian_force(0.5).unwrap();
        method
            .spread_force(SlotIndex(1), None, &[], &mut executor, 0.5)
            .unwrap();
        method.postprocess_integrate_data(0.0, 0.5, 1).unwrap();

        let inactive = method.structure(StructureId(1)).unwrap();
        assert_eq!(inactive.positions()[0][0], 4.0);

        // Active structure moved off its anchors, so the tether total is
        // nonzero; the inactive one contributes nothing.
        let total = method.last_spread_total();
        assert!(total[0] < 0.0);
        assert_eq!(total[1], 0.0);
    }

    #[test]
    fn spread_total_matches_tether_sum() {
        let mut method = method_with(uniform_field([1.0, 0.0, 0.0]));
        let mut executor = NullExecutor;
        method.preprocess_integrate_data(0.0, 0.5, 1).unwrap();
        method
            .interpolate_velocity(SlotIndex(0), &[], &[], &mut executor, 0.0)
            .unwrap();
        method.forward_euler_step(0.0, 0.5).unwrap();
        method.compute_lagrangian_force(0.5).unwrap();
        method
            .spread_force(SlotIndex(1), None, &[], &mut executor, 0.5)
            .unwrap();
        // Two points each displaced +0.5 in x with stiffness 10.
        assert!((method.last_spread_total()[0] + 10.0).abs() < 1e-9);
    }

    #[test]
    fn spreading_deposits_the_full_tether_force() {
        // Partition of unity makes the deposited stencil contributions sum
        // to the tether total exactly.
        let mut method = method_with(uniform_field([1.0, 0.0, 0.0]));
        let deposited = Arc::new(Mutex::new([0.0f64; 3]));
        let tally = Arc::clone(&deposited);
        method.set_force_sink(Box::new(move |_center, contribution| {
            let mut total = tally.lock().unwrap();
            for d in 0..3 {
                total[d] += contribution[d];
            }
        }));
        let mut executor = NullExecutor;
        method.preprocess_integrate_data(0.0, 0.5, 1).unwrap();
        method
            .interpolate_velocity(SlotIndex(0), &[], &[], &mut executor, 0.0)
            .unwrap();
        method.forward_euler_step(0.0, 0.5).unwrap();
        method.compute_lagrangian_force(0.5).unwrap();
        method
            .spread_force(SlotIndex(1), None, &[], &mut executor, 0.5)
            .unwrap();
        let total = *deposited.lock().unwrap();
        assert!((total[0] + 10.0).abs() < 1e-9);
        assert!(total[1].abs() < 1e-12);
        assert!(total[2].abs() < 1e-12);
    }

    #[test]
    fn displacement_is_in_cell_widths_of_the_home_level() {
        let mut method = method_with(uniform_field([1.0, 0.0, 0.0]));
        let mut executor = NullExecutor;
        method.preprocess_integrate_data(0.0, 1.0, 1).unwrap();
        method
            .interpolate_velocity(SlotIndex(0), &[], &[], &mut executor, 0.0)
            .unwrap();
        method.forward_euler_step(0.0, 1.0).unwrap();
        // Level 1 of the fixture has cell width 0.5; displacement 1.0.
        assert!((method.max_point_displacement() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn registration_wires_variables_to_transfers() {
        let mut method = method_with(uniform_field([0.0; 3]));
        method.register_eulerian_variables().unwrap();
        method.register_communication_algorithms().unwrap();

        let transfers = &method.services().transfers;
        assert!(transfers.ghost_fill_algorithm(VELOCITY_VARIABLE).is_ok());
        assert!(transfers.prolongation_algorithm(FORCE_VARIABLE).is_ok());
        assert!(transfers.coarsening_algorithm(VELOCITY_VARIABLE).is_ok());

        let config = two_level_config();
        method
            .reset_hierarchy_configuration(&config, 0, config.finest_level())
            .unwrap();
        let ghost = method
            .services()
            .transfers
            .ghost_fill_schedules(VELOCITY_VARIABLE)
            .unwrap();
        assert_eq!(ghost.len(), 2);
    }

    #[test]
    fn communication_registration_requires_variables_first() {
        let mut method = method_with(uniform_field([0.0; 3]));
        let result = method.register_communication_algorithms();
        assert!(matches!(result, Err(CouplingError::MethodFailed { .. })));
    }

    #[test]
    fn restart_round_trips_positions() {
        let mut method = method_with(uniform_field([1.0, 0.0, 0.0]));
        let mut executor = NullExecutor;
        method.preprocess_integrate_data(0.0, 0.5, 1).unwrap();
        method
            .interpolate_velocity(SlotIndex(0), &[], &[], &mut executor, 0.0)
            .unwrap();
        method.forward_euler_step(0.0, 0.5).unwrap();
        method.postprocess_integrate_data(0.0, 0.5, 1).unwrap();

        let mut db = StateDatabase::new();
        method.write_restart_data(&mut db);

        let mut restored = method_with(uniform_field([1.0, 0.0, 0.0]));
        restored.read_restart_data(&db).unwrap();
        let a = method.structure(StructureId(0)).unwrap().positions();
        let b = restored.structure(StructureId(0)).unwrap().positions();
        for (pa, pb) in a.iter().zip(b) {
            for d in 0..3 {
                assert_eq!(pa[d], pb[d]);
            }
        }
    }

    #[test]
    fn restart_rejects_size_mismatch() {
        let mut db = StateDatabase::new();
        db.put(
            "tether/structures/0/positions",
            StateValue::FloatVec(vec![1.0, 2.0, 3.0]),
        );
        let mut method = method_with(uniform_field([0.0; 3]));
        let result = method.read_restart_data(&db);
        assert!(matches!(result, Err(CouplingError::MethodFailed { .. })));
    }

    #[test]
    fn fixed_le_update_requires_enablement() {
        let mut method = method_with(uniform_field([0.0; 3]));
        assert!(method.update_fixed_le_operators().is_err());
        method.set_use_fixed_le_operators(true);
        assert!(method.update_fixed_le_operators().is_ok());
    }

    #[test]
    fn negative_step_rejected_up_front() {
        let mut method = method_with(uniform_field([0.0; 3]));
        let result = method.preprocess_integrate_data(1.0, 1.0, 1);
        assert!(matches!(result, Err(CouplingError::MethodFailed { .. })));
    }

    #[test]
    fn workload_estimate_is_additive() {
        let method = method_with(uniform_field([0.0; 3]));
        let config = two_level_config();
        let mut workload = vec![1.0; 4];
        method.add_workload_estimate(&config, 1, &mut workload);
        // Two points spread evenly over four cells.
        for cell in &workload {
            assert!((cell - 1.5).abs() < 1e-12);
        }
        // No structures on level 0.
        let mut coarse = vec![0.0; 4];
        method.add_workload_estimate(&config, 0, &mut coarse);
        assert!(coarse.iter().all(|&c| c == 0.0));
    }

    #[test]
    fn initialization_pushes_ghost_fills_when_registered() {
        let mut method = PointSetMethod::new(
            "tether",
            &KernelConfig::default(),
            uniform_field([0.0; 3]),
        )
        .unwrap();
        method.register_eulerian_variables().unwrap();
        method.register_communication_algorithms().unwrap();
        let config = two_level_config();
        let mut executor = CountingExecutor::new();
        method
            .initialize_mesh_data(&config, SlotIndex(2), &mut executor, 0.0, true)
            .unwrap();
        assert_eq!(executor.count(), 2);
    }
}
