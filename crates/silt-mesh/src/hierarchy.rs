//! The [`MeshConfiguration`] snapshot of the adaptive mesh hierarchy.

use crate::error::MeshError;
use silt_core::Level;

/// Description of one refinement level.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelSpec {
    /// Number of grid patches on this level.
    pub patch_count: u32,
    /// Refinement ratio relative to the next coarser level.
    ///
    /// Ignored on level 0, which has no coarser neighbor; by convention
    /// level 0 carries a ratio of 1.
    pub refinement_ratio: u32,
    /// Uniform cell width on this level, in domain units.
    pub cell_width: f64,
}

/// An immutable snapshot of the mesh hierarchy: the ordered set of
/// refinement levels, coarsest first.
///
/// The partitioning of each level into patches and the distribution of
/// patches across processes is owned by the external mesh collaborator; the
/// coupling layer only needs level counts, cell widths, and the ability to
/// resolve the [`Level::Finest`] sentinel.
///
/// A new configuration is produced on every regrid; the coupling layer
/// treats it as a value and rebuilds its compiled schedules from it.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshConfiguration {
    levels: Vec<LevelSpec>,
}

impl MeshConfiguration {
    /// Build a configuration from an ordered level list, coarsest first.
    ///
    /// Rejects empty configurations, levels with zero patches, non-finite
    /// or non-positive cell widths, and refinement ratios of zero on any
    /// level above 0.
    pub fn new(levels: Vec<LevelSpec>) -> Result<Self, MeshError> {
        if levels.is_empty() {
            return Err(MeshError::EmptyConfiguration);
        }
        for (n, spec) in levels.iter().enumerate() {
            let n = n as u32;
            if spec.patch_count == 0 {
                return Err(MeshError::InvalidLevelSpec {
                    level: n,
                    reason: "patch count is zero".to_string(),
                });
            }
            if !spec.cell_width.is_finite() || spec.cell_width <= 0.0 {
                return Err(MeshError::InvalidLevelSpec {
                    level: n,
                    reason: format!("cell width must be finite and positive, got {}", spec.cell_width),
                });
            }
            if n > 0 && spec.refinement_ratio == 0 {
                return Err(MeshError::InvalidLevelSpec {
                    level: n,
                    reason: "refinement ratio is zero".to_string(),
                });
            }
        }
        Ok(Self { levels })
    }

    /// Build a uniform configuration: `num_levels` levels, each refined by
    /// `ratio` over its parent, starting from `base_cell_width` on level 0.
    pub fn uniform(
        num_levels: u32,
        patch_count: u32,
        base_cell_width: f64,
        ratio: u32,
    ) -> Result<Self, MeshError> {
        let mut levels = Vec::with_capacity(num_levels as usize);
        let mut width = base_cell_width;
        for n in 0..num_levels {
            levels.push(LevelSpec {
                patch_count,
                refinement_ratio: if n == 0 { 1 } else { ratio },
                cell_width: width,
            });
            width /= f64::from(ratio.max(1));
        }
        Self::new(levels)
    }

    /// Number of levels in the configuration.
    pub fn num_levels(&self) -> u32 {
        self.levels.len() as u32
    }

    /// The finest level number.
    pub fn finest_level(&self) -> u32 {
        self.num_levels() - 1
    }

    /// Look up a level's specification.
    pub fn level(&self, n: u32) -> Result<&LevelSpec, MeshError> {
        self.levels
            .get(n as usize)
            .ok_or(MeshError::LevelOutOfRange {
                level: n,
                finest: self.finest_level(),
            })
    }

    /// Cell width on level `n`.
    pub fn cell_width(&self, n: u32) -> Result<f64, MeshError> {
        Ok(self.level(n)?.cell_width)
    }

    /// Resolve a [`Level`] to an explicit level number.
    ///
    /// `Level::Finest` resolves to the finest level of *this*
    /// configuration; callers holding a sentinel must re-resolve after
    /// every regrid rather than caching the result.
    pub fn resolve(&self, level: Level) -> Result<u32, MeshError> {
        match level {
            Level::Finest => Ok(self.finest_level()),
            Level::Number(n) => {
                if n <= self.finest_level() {
                    Ok(n)
                } else {
                    Err(MeshError::LevelOutOfRange {
                        level: n,
                        finest: self.finest_level(),
                    })
                }
            }
        }
    }
}
