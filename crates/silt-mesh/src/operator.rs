//! Boundary and coarsening operator seams, with the no-op name sentinels.

/// Operator name meaning "this variable is never coarsened".
pub const NO_COARSEN: &str = "NO_COARSEN";

/// Operator name meaning "this variable is never refined".
pub const NO_REFINE: &str = "NO_REFINE";

/// Whether `name` names a real refine operator (anything but [`NO_REFINE`]).
pub fn is_refine_op(name: &str) -> bool {
    name != NO_REFINE
}

/// Whether `name` names a real coarsen operator (anything but [`NO_COARSEN`]).
pub fn is_coarsen_op(name: &str) -> bool {
    name != NO_COARSEN
}

/// Physical-boundary treatment applied after a ghost-fill or prolongation
/// schedule runs.
///
/// Ownership note: a boundary operator bound into a transfer-registry entry
/// is held exclusively by that entry.
pub trait BoundaryOp: Send {
    /// Operator name for diagnostics.
    fn name(&self) -> &str;

    /// Fill the ghost region adjacent to a physical boundary from the
    /// interior data at the given time.
    fn fill_ghosts(&self, interior: &[f64], ghosts: &mut [f64], time: f64);
}

/// Reduction applied when transferring data from a fine level to its
/// coarser parent.
pub trait CoarsenOp: Send {
    /// Operator name for diagnostics.
    fn name(&self) -> &str;

    /// Reduce `ratio` consecutive fine values into each coarse value.
    ///
    /// `coarse.len() * ratio` must not exceed `fine.len()`; trailing fine
    /// values beyond the last full window are ignored.
    fn coarsen(&self, fine: &[f64], ratio: u32, coarse: &mut [f64]);
}

/// Copies the nearest interior value into each ghost cell.
///
/// A reasonable default for velocity-like quantities at outflow boundaries.
#[derive(Clone, Copy, Debug, Default)]
pub struct CopyBoundaryOp;

impl BoundaryOp for CopyBoundaryOp {
    fn name(&self) -> &str {
        "copy"
    }

    fn fill_ghosts(&self, interior: &[f64], ghosts: &mut [f64], _time: f64) {
        let edge = interior.last().copied().unwrap_or(0.0);
        ghosts.fill(edge);
    }
}

/// Window-averaging coarsener: each coarse cell is the mean of its `ratio`
/// covering fine cells.
#[derive(Clone, Copy, Debug, Default)]
pub struct AverageCoarsenOp;

impl CoarsenOp for AverageCoarsenOp {
    fn name(&self) -> &str {
        "average"
    }

    fn coarsen(&self, fine: &[f64], ratio: u32, coarse: &mut [f64]) {
        let ratio = ratio.max(1) as usize;
        for (i, out) in coarse.iter_mut().enumerate() {
            let window = &fine[i * ratio..(i * ratio + ratio).min(fine.len())];
            if window.is_empty() {
                *out = 0.0;
            } else {
                *out = window.iter().sum::<f64>() / window.len() as f64;
            }
        }
    }
}
