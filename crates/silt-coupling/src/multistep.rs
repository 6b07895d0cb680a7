//! Time-stepping scheme selection and the multistep dispatch seam.

use crate::error::CouplingError;
use crate::strategy::CouplingStrategy;
use std::fmt;

/// The explicit structure-advancement schemes the integrator can request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TimeSteppingScheme {
    /// First-order forward Euler. Always available.
    #[default]
    ForwardEuler,
    /// Explicit backward Euler. Optional capability.
    BackwardEuler,
    /// Explicit midpoint rule. Always available.
    Midpoint,
    /// Explicit trapezoidal rule. Always available.
    Trapezoidal,
    /// Second-order Adams-Bashforth. Optional capability; needs one
    /// previous step of history.
    AdamsBashforth2,
}

impl fmt::Display for TimeSteppingScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ForwardEuler => write!(f, "forward-euler"),
            Self::BackwardEuler => write!(f, "backward-euler"),
            Self::Midpoint => write!(f, "midpoint"),
            Self::Trapezoidal => write!(f, "trapezoidal"),
            Self::AdamsBashforth2 => write!(f, "adams-bashforth-2"),
        }
    }
}

/// Multistep bookkeeping carried in the strategy services.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MultistepState {
    /// Number of previous step values the scheme may use. `None` until
    /// the integrator enables multistep stepping.
    pub history_depth: Option<u32>,
    /// The scheme most recently dispatched through
    /// [`advance_structure_positions`].
    pub scheme: TimeSteppingScheme,
}

/// Dispatch one structure-advancement call to the scheme's trait method.
///
/// The selected scheme is recorded in the strategy's
/// [`MultistepState`] so the strategy can consult it between calls.
///
/// The dispatcher is policy-free: it never inspects history depth. A scheme
/// whose history has not been populated yet (e.g. Adams-Bashforth on the
/// very first step) is the strategy's problem — it must self-start with a
/// lower-order scheme or abort.
pub fn advance_structure_positions(
    strategy: &mut dyn CouplingStrategy,
    scheme: TimeSteppingScheme,
    current_time: f64,
    new_time: f64,
) -> Result<(), CouplingError> {
    strategy.services_mut().multistep.scheme = scheme;
    match scheme {
        TimeSteppingScheme::ForwardEuler => strategy.forward_euler_step(current_time, new_time),
        TimeSteppingScheme::BackwardEuler => strategy.backward_euler_step(current_time, new_time),
        TimeSteppingScheme::Midpoint => strategy.midpoint_step(current_time, new_time),
        TimeSteppingScheme::Trapezoidal => strategy.trapezoidal_step(current_time, new_time),
        TimeSteppingScheme::AdamsBashforth2 => strategy.ab2_step(current_time, new_time),
    }
}
