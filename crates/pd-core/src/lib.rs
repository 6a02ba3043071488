//! pd-core: shared foundation for the differentiation workspace.
//!
//! Contains:
//! - units (uom SI types + GPa/K constructors)
//! - numeric (Real + tolerances + float helpers)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod units;

pub use error::{PdError, PdResult};
pub use numeric::*;
pub use units::*;
