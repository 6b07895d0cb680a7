//! Regularized delta kernels for velocity interpolation and force
//! spreading.
//!
//! Each kernel is a compactly supported approximation to the Dirac delta,
//! evaluated per axis and combined as a tensor product. All of them satisfy
//! the discrete partition of unity: the weights over any unit-spaced sample
//! set sum to one, which is what makes interpolation consistent and
//! spreading conservative.

use silt_core::{GhostWidth, RegistryError};
use smallvec::SmallVec;

/// Per-axis stencil: `(cell index, weight)` pairs with nonzero weight.
pub type AxisStencil = SmallVec<[(i64, f64); 6]>;

/// The supported delta kernels, selected by name at strategy construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeltaKernel {
    /// Two-point hat function.
    PiecewiseLinear,
    /// Three-point kernel of Roma, Peskin and Berger.
    ThreePoint,
    /// Classic four-point kernel of Peskin.
    FourPoint,
}

impl DeltaKernel {
    /// Resolve a kernel by its registered name.
    pub fn from_name(name: &str) -> Result<Self, RegistryError> {
        match name {
            "PIECEWISE_LINEAR" => Ok(Self::PiecewiseLinear),
            "IB_3" => Ok(Self::ThreePoint),
            "IB_4" => Ok(Self::FourPoint),
            other => Err(RegistryError::UnknownOperator {
                operator: other.to_string(),
            }),
        }
    }

    /// Number of cells the kernel touches per axis.
    pub fn support(&self) -> u32 {
        match self {
            Self::PiecewiseLinear => 2,
            Self::ThreePoint => 3,
            Self::FourPoint => 4,
        }
    }

    /// Ghost-cell halo a patch needs so the full stencil of any point in
    /// its interior is resolvable.
    pub fn ghost_width(&self) -> GhostWidth {
        GhostWidth(self.support() / 2 + 1)
    }

    /// Kernel value at signed offset `r`, in cell widths.
    pub fn weight(&self, r: f64) -> f64 {
        let a = r.abs();
        match self {
            Self::PiecewiseLinear => {
                if a < 1.0 {
                    1.0 - a
                } else {
                    0.0
                }
            }
            Self::ThreePoint => {
                if a < 0.5 {
                    (1.0 + (1.0 - 3.0 * a * a).max(0.0).sqrt()) / 3.0
                } else if a < 1.5 {
                    let t = 1.0 - a;
                    (5.0 - 3.0 * a - (1.0 - 3.0 * t * t).max(0.0).sqrt()) / 6.0
                } else {
                    0.0
                }
            }
            Self::FourPoint => {
                if a < 1.0 {
                    (3.0 - 2.0 * a + (1.0 + 4.0 * a - 4.0 * a * a).max(0.0).sqrt()) / 8.0
                } else if a < 2.0 {
                    (5.0 - 2.0 * a - (-7.0 + 12.0 * a - 4.0 * a * a).max(0.0).sqrt()) / 8.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Stencil for a point at grid coordinate `x_over_h` (position divided
    /// by cell width), against cell centers at `i + 0.5`.
    pub fn stencil(&self, x_over_h: f64) -> AxisStencil {
        let support = self.support() as i64;
        // Lowest cell whose center can carry weight: even supports window
        // around the containing cell, odd supports around the nearest
        // cell center.
        let first = if support % 2 == 0 {
            (x_over_h - 0.5).floor() as i64 - support / 2 + 1
        } else {
            (x_over_h - 0.5).round() as i64 - (support - 1) / 2
        };
        let mut out = AxisStencil::new();
        for i in first..first + support {
            let center = i as f64 + 0.5;
            let w = self.weight(x_over_h - center);
            if w != 0.0 {
                out.push((i, w));
            }
        }
        out
    }
}
