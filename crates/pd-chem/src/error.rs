//! Composition errors.

use pd_core::PdError;
use thiserror::Error;

/// Result type for composition operations.
pub type ChemResult<T> = Result<T, ChemError>;

/// Errors raised while building or querying compositions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChemError {
    /// Non-physical values (negative or non-finite abundances).
    #[error("Non-physical value for {what}")]
    NonPhysical { what: &'static str },

    /// Invalid argument.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Element symbol not recognised.
    #[error("Unknown element: {symbol}")]
    UnknownElement { symbol: String },
}

impl From<ChemError> for PdError {
    fn from(err: ChemError) -> Self {
        match err {
            ChemError::NonPhysical { what } => PdError::Invariant { what },
            ChemError::InvalidArg { what } => PdError::InvalidArg { what },
            ChemError::UnknownElement { .. } => PdError::InvalidArg {
                what: "unknown element",
            },
        }
    }
}
