//! Interpolation/spreading kernel selection.
//!
//! Every strategy reads the same three configuration entries:
//! `interp_delta_fcn`, `spread_delta_fcn`, and the `ib_delta_fcn` alias that
//! overrides both. The kernels themselves are named, not defined, here.

/// The default delta-function kernel, a four-point immersed-boundary kernel.
pub const DEFAULT_KERNEL: &str = "IB_4";

/// Raw kernel configuration as read from the input deck.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KernelConfig {
    /// Interpolation kernel name. `None` means the default.
    pub interp_delta_fcn: Option<String>,
    /// Spreading kernel name. `None` means the default.
    pub spread_delta_fcn: Option<String>,
    /// Alias overriding both of the above when present.
    pub ib_delta_fcn: Option<String>,
}

impl KernelConfig {
    /// Resolve the configuration into a concrete kernel pair.
    ///
    /// The `ib_delta_fcn` alias wins over the individual entries; absent
    /// entries fall back to [`DEFAULT_KERNEL`].
    pub fn resolve(&self) -> KernelSelection {
        if let Some(alias) = &self.ib_delta_fcn {
            return KernelSelection {
                interp: alias.clone(),
                spread: alias.clone(),
            };
        }
        KernelSelection {
            interp: self
                .interp_delta_fcn
                .clone()
                .unwrap_or_else(|| DEFAULT_KERNEL.to_string()),
            spread: self
                .spread_delta_fcn
                .clone()
                .unwrap_or_else(|| DEFAULT_KERNEL.to_string()),
        }
    }
}

/// Resolved kernel names used by a strategy instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KernelSelection {
    /// Kernel used for velocity interpolation.
    pub interp: String,
    /// Kernel used for force spreading.
    pub spread: String,
}

impl Default for KernelSelection {
    fn default() -> Self {
        KernelConfig::default().resolve()
    }
}
