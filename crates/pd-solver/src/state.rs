//! Mutable state of one solve.

use pd_chem::CompositionMap;
use pd_partition::PartitionCoefficients;

/// Lifecycle of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverPhase {
    Initializing,
    Iterating,
    Converged,
    GridFallback,
    Failed,
}

/// Per-solve iteration state.
///
/// Created by [`crate::EquilibriumSolver::solve`], updated once per iteration
/// and dropped when the solve returns.
#[derive(Debug, Clone)]
pub struct SolverState {
    pub phase: SolverPhase,
    pub iteration: usize,
    pub core_number_fraction: f64,
    /// Latest composition; `None` before the first mass balance.
    pub composition: Option<CompositionMap>,
    /// Coefficients fed to the last mass balance.
    pub coefficients: Option<PartitionCoefficients>,
    /// Whether D(O) rose on the last completed iteration.
    pub o_increasing: bool,
    pub o_cap: f64,
    pub o_cap_frozen_at: Option<usize>,
    /// Average the next iteration with its predecessor.
    pub damp_next: bool,
    pub damped_iterations: usize,
    /// Iterations that rebuilt the mantle instead of carrying it forward.
    pub mantle_recomputations: usize,
    pub converged: bool,
    pub history: Vec<PartitionCoefficients>,
}

impl SolverState {
    pub fn new(core_number_fraction: f64, o_cap: f64) -> Self {
        Self {
            phase: SolverPhase::Initializing,
            iteration: 0,
            core_number_fraction,
            composition: None,
            coefficients: None,
            o_increasing: false,
            o_cap,
            o_cap_frozen_at: None,
            damp_next: false,
            damped_iterations: 0,
            mantle_recomputations: 0,
            converged: false,
            history: Vec::new(),
        }
    }

    pub fn o_cap_frozen(&self) -> bool {
        self.o_cap_frozen_at.is_some()
    }
}
