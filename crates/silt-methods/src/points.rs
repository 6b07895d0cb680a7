//! Per-structure Lagrangian point data.

use silt_core::{Position, StructureId};
use smallvec::smallvec;

/// One immersed structure: a set of Lagrangian points tethered to fixed
/// anchor positions, living on a home mesh level.
///
/// Positions are three-dimensional. The struct carries both the committed
/// positions (start of the current step) and, while a step is in flight,
/// the provisional advanced positions; [`commit_step`] promotes the latter.
///
/// [`commit_step`]: StructurePoints::commit_step
#[derive(Clone, Debug)]
pub struct StructurePoints {
    id: StructureId,
    level: u32,
    stiffness: f64,
    positions: Vec<Position>,
    advanced: Option<Vec<Position>>,
    anchors: Vec<Position>,
    forces: Vec<Position>,
    /// Velocity sampled at the start of the step.
    pub(crate) velocity_current: Vec<Position>,
    /// Velocity from the most recent interpolation in this step.
    pub(crate) velocity_latest: Vec<Position>,
    /// Committed velocity of the previous step, for multistep schemes.
    pub(crate) velocity_previous: Option<Vec<Position>>,
    regrid_positions: Vec<Position>,
}

fn zeroes(count: usize) -> Vec<Position> {
    vec![smallvec![0.0, 0.0, 0.0]; count]
}

impl StructurePoints {
    /// Create a structure anchored at its initial positions.
    pub fn new(id: StructureId, level: u32, positions: Vec<Position>, stiffness: f64) -> Self {
        let count = positions.len();
        Self {
            id,
            level,
            stiffness,
            anchors: positions.clone(),
            regrid_positions: positions.clone(),
            positions,
            advanced: None,
            forces: zeroes(count),
            velocity_current: zeroes(count),
            velocity_latest: zeroes(count),
            velocity_previous: None,
        }
    }

    /// Structure identifier.
    pub fn id(&self) -> StructureId {
        self.id
    }

    /// Home mesh level.
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Tether stiffness.
    pub fn stiffness(&self) -> f64 {
        self.stiffness
    }

    /// Number of Lagrangian points.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the structure has no points.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Committed point positions.
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Provisional advanced positions if a step is in flight, otherwise
    /// the committed ones.
    pub fn working_positions(&self) -> &[Position] {
        self.advanced.as_deref().unwrap_or(&self.positions)
    }

    /// Current per-point tether forces.
    pub fn forces(&self) -> &[Position] {
        &self.forces
    }

    /// Replace the committed positions, e.g. on restart load. Forces and
    /// velocities are zeroed; the regrid snapshot is refreshed.
    pub fn reset_positions(&mut self, positions: Vec<Position>) {
        let count = positions.len();
        self.regrid_positions = positions.clone();
        self.positions = positions;
        self.advanced = None;
        self.forces = zeroes(count);
        self.velocity_current = zeroes(count);
        self.velocity_latest = zeroes(count);
        self.velocity_previous = None;
    }

    /// Store provisional advanced positions for the in-flight step.
    pub(crate) fn set_advanced(&mut self, advanced: Vec<Position>) {
        self.advanced = Some(advanced);
    }

    /// Promote the advanced positions and roll the velocity history.
    pub(crate) fn commit_step(&mut self) {
        if let Some(advanced) = self.advanced.take() {
            self.positions = advanced;
        }
        self.velocity_previous = Some(self.velocity_current.clone());
    }

    /// Evaluate the tether force `f = k (anchor - x)` at the working
    /// positions.
    pub(crate) fn compute_tether_forces(&mut self) {
        let k = self.stiffness;
        let positions = self.advanced.as_deref().unwrap_or(&self.positions);
        for ((force, anchor), position) in
            self.forces.iter_mut().zip(&self.anchors).zip(positions)
        {
            for d in 0..3 {
                force[d] = k * (anchor[d] - position[d]);
            }
        }
    }

    /// Zero the per-point forces.
    pub(crate) fn clear_forces(&mut self) {
        for force in &mut self.forces {
            force.fill(0.0);
        }
    }

    /// Largest Euclidean displacement of any point since the last regrid
    /// snapshot.
    pub fn max_displacement(&self) -> f64 {
        self.working_positions()
            .iter()
            .zip(&self.regrid_positions)
            .map(|(now, then)| {
                (0..3)
                    .map(|d| (now[d] - then[d]).powi(2))
                    .sum::<f64>()
                    .sqrt()
            })
            .fold(0.0, f64::max)
    }

    /// Refresh the regrid snapshot to the committed positions.
    pub(crate) fn mark_regrid(&mut self) {
        self.regrid_positions = self.positions.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(n: usize) -> Vec<Position> {
        (0..n).map(|i| smallvec![i as f64, 0.0, 0.0]).collect()
    }

    #[test]
    fn anchors_start_at_initial_positions() {
        let mut s = StructurePoints::new(StructureId(0), 1, line(3), 2.0);
        s.compute_tether_forces();
        assert!(s.forces().iter().all(|f| f.iter().all(|&c| c == 0.0)));
    }

    #[test]
    fn tether_force_pulls_back_toward_anchor() {
        let mut s = StructurePoints::new(StructureId(0), 1, line(2), 2.0);
        s.set_advanced(vec![smallvec![0.5, 0.0, 0.0], smallvec![1.0, -1.0, 0.0]]);
        s.compute_tether_forces();
        assert_eq!(s.forces()[0][0], -1.0);
        assert_eq!(s.forces()[1][1], 2.0);
    }

    #[test]
    fn commit_promotes_advanced_positions() {
        let mut s = StructurePoints::new(StructureId(0), 0, line(1), 1.0);
        s.set_advanced(vec![smallvec![3.0, 0.0, 0.0]]);
        assert_eq!(s.positions()[0][0], 0.0);
        assert_eq!(s.working_positions()[0][0], 3.0);
        s.commit_step();
        assert_eq!(s.positions()[0][0], 3.0);
        assert!(s.velocity_previous.is_some());
    }

    #[test]
    fn displacement_measured_from_regrid_snapshot() {
        let mut s = StructurePoints::new(StructureId(0), 0, line(2), 1.0);
        assert_eq!(s.max_displacement(), 0.0);
        s.set_advanced(vec![smallvec![0.0, 3.0, 4.0], smallvec![1.0, 0.0, 0.0]]);
        assert_eq!(s.max_displacement(), 5.0);
        s.commit_step();
        s.mark_regrid();
        assert_eq!(s.max_displacement(), 0.0);
    }
}
