//! pd-partition: metal-silicate element partitioning.
//!
//! Given pressure, temperature, oxygen fugacity, melt structure and the current
//! metal composition, [`ElementPartitionModel`] computes a partition
//! coefficient for every element it has a fit for:
//!
//! 1. temperature from the peridotite liquidus unless fixed,
//! 2. the metal phase as an ordered alloy vector (pure iron when unknown),
//! 3. interaction parameters scaled from their reference temperature,
//! 4. activity coefficients from the multicomponent regular-solution model,
//! 5. `log10 D = a + b/T + c*P/T + v*fO2 + nbot*NBO/T - log10 gamma`.
//!
//! Tables are loaded and validated once; evaluation never fails.

pub mod activity;
pub mod alloy;
pub mod coefficients;
pub mod error;
pub mod interaction;
pub mod liquidus;
pub mod model;
pub mod tables;

pub use alloy::AlloyFractions;
pub use coefficients::PartitionCoefficients;
pub use error::{PartitionError, PartitionResult};
pub use interaction::InteractionMatrix;
pub use liquidus::liquidus_temperature;
pub use model::{ElementPartitionModel, PartitionConditions};
pub use tables::{AlternativeInteractions, ElementFit, InteractionEntry, PartitionTables};
