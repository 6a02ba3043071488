//! Partition model errors.

use pd_core::PdError;
use thiserror::Error;

/// Result type for partition table and model setup.
pub type PartitionResult<T> = Result<T, PartitionError>;

/// Errors raised while loading or validating partition tables.
///
/// Evaluating the model never fails; these only surface at construction.
#[derive(Error, Debug)]
pub enum PartitionError {
    #[error("Invalid partition table: {what}")]
    InvalidTable { what: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl From<PartitionError> for PdError {
    fn from(e: PartitionError) -> Self {
        match e {
            PartitionError::InvalidTable { .. } => PdError::InvalidArg {
                what: "partition table",
            },
            PartitionError::Io(_) => PdError::InvalidArg {
                what: "partition table file",
            },
            PartitionError::Yaml(_) => PdError::InvalidArg {
                what: "partition table syntax",
            },
        }
    }
}
