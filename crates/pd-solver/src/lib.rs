//! Core/mantle equilibrium solver.
//!
//! Finds the self-consistent set of metal-silicate partition coefficients
//! for a bulk composition at given pressure and oxygen fugacity:
//! - [`AbundanceAccountant`] splits the bulk between core and mantle,
//! - [`EquilibriumSolver`] iterates model and mass balance to a fixed point,
//! - [`GridFallbackSearcher`] answers when the iteration keeps oscillating.
//!
//! # Example
//!
//! ```no_run
//! use pd_chem::{CompositionMap, Element};
//! use pd_core::units::gpa;
//! use pd_partition::ElementPartitionModel;
//! use pd_solver::{EquilibriumSolver, SolveRequest, SolverConfig};
//!
//! let bulk = CompositionMap::from_bulk([
//!     (Element::O, 0.49),
//!     (Element::Mg, 0.165),
//!     (Element::Si, 0.15),
//!     (Element::Fe, 0.148),
//! ])?;
//! let model = ElementPartitionModel::builtin()?;
//! let solver = EquilibriumSolver::new(&model, SolverConfig::default())?;
//! let output = solver.solve(&SolveRequest::new(&bulk, gpa(54.0), -2.0))?;
//! assert!(output.is_success());
//! # Ok::<(), pd_core::PdError>(())
//! ```

pub mod accountant;
pub mod config;
pub mod equilibrium;
pub mod error;
pub mod grid;
pub mod state;

pub use accountant::{AbundanceAccountant, AccountantOutput};
pub use config::SolverConfig;
pub use equilibrium::{
    EquilibriumSolver, SolveDiagnostics, SolveOutcome, SolveOutput, SolveRequest,
};
pub use error::{SolverError, SolverResult};
pub use grid::{GRID_SIZE, GridFallbackSearcher, GridResult, IMPORTANT_ELEMENTS, MULTIPLIERS};
pub use state::{SolverPhase, SolverState};
