//! Tuning options for the equilibrium iteration.

use crate::error::{SolverError, SolverResult};
use serde::{Deserialize, Serialize};

/// Solver tuning.
///
/// Every field has a default, so a YAML block may set any subset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Under-relaxation factor in (0, 1]; 1 disables damping.
    pub movement_fraction: f64,
    /// Every this many iterations the next one is averaged with its predecessor.
    pub nudge_iterations: usize,
    /// Iteration count beyond which a still-rising D(O) triggers the grid search.
    pub grid_fallback_threshold: usize,
    /// Iteration count beyond which the solve gives up.
    pub max_iterations: usize,
    /// Initial upper bound on D(O); replaced once the oscillation guard fires.
    pub o_cap: f64,
    /// Upper bound on D(Si).
    pub si_cap: f64,
    /// Largest relative change in any D still counted as converged.
    pub convergence_tolerance: f64,
    /// Core number fraction assumed before the first iteration.
    pub initial_core_fraction: f64,
    /// Evaluate grid-search trials on the rayon pool.
    pub parallel_grid: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            movement_fraction: 1.0,
            nudge_iterations: 1000,
            grid_fallback_threshold: 1001,
            max_iterations: 1000,
            o_cap: 0.3,
            si_cap: 1.0,
            convergence_tolerance: 0.01,
            initial_core_fraction: 0.15,
            parallel_grid: true,
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> SolverResult<()> {
        if !(self.movement_fraction > 0.0 && self.movement_fraction <= 1.0) {
            return Err(SolverError::InvalidConfig {
                what: "movement_fraction must be in (0, 1]",
            });
        }
        if self.nudge_iterations == 0 {
            return Err(SolverError::InvalidConfig {
                what: "nudge_iterations must be positive",
            });
        }
        if !(self.o_cap.is_finite() && self.o_cap > 0.0) {
            return Err(SolverError::InvalidConfig {
                what: "o_cap must be positive and finite",
            });
        }
        if !(self.si_cap.is_finite() && self.si_cap > 0.0) {
            return Err(SolverError::InvalidConfig {
                what: "si_cap must be positive and finite",
            });
        }
        if !(self.convergence_tolerance.is_finite() && self.convergence_tolerance >= 0.0) {
            return Err(SolverError::InvalidConfig {
                what: "convergence_tolerance must be non-negative and finite",
            });
        }
        if !(self.initial_core_fraction > 0.0 && self.initial_core_fraction < 1.0) {
            return Err(SolverError::InvalidConfig {
                what: "initial_core_fraction must be in (0, 1)",
            });
        }
        Ok(())
    }
}
