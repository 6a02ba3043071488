//! Error types for solver setup.

use pd_chem::ChemError;
use pd_core::PdError;
use thiserror::Error;

/// Errors raised before the iteration starts.
///
/// Non-convergence is not an error; it is reported through
/// [`crate::SolveOutcome`].
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Invalid solver configuration: {what}")]
    InvalidConfig { what: &'static str },

    #[error("Invalid solve input: {what}")]
    InvalidInput { what: String },

    #[error("Composition error: {0}")]
    Chem(#[from] ChemError),
}

pub type SolverResult<T> = Result<T, SolverError>;

impl From<SolverError> for PdError {
    fn from(e: SolverError) -> Self {
        match e {
            SolverError::InvalidConfig { what } => PdError::InvalidArg { what },
            SolverError::InvalidInput { what: _ } => PdError::InvalidArg {
                what: "solve input",
            },
            SolverError::Chem(err) => err.into(),
        }
    }
}
