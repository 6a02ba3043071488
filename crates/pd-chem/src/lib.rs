//! pd-chem: chemical bookkeeping for planetary differentiation.
//!
//! Provides:
//! - Element definitions (the species the partitioning model knows about)
//! - Body layers (bulk, core, mantle, crust)
//! - `CompositionMap`: per-element, per-layer number fractions
//!
//! # Example
//!
//! ```
//! use pd_chem::{CompositionMap, Element, Layer};
//!
//! let bulk = CompositionMap::from_bulk([
//!     (Element::O, 2.0),
//!     (Element::Fe, 1.0),
//!     (Element::Mg, 1.0),
//! ])
//! .unwrap();
//!
//! assert_eq!(bulk.get(Element::O, Layer::Bulk), 0.5);
//! assert!(bulk.is_present(Element::Fe, Layer::Bulk));
//! assert!(!bulk.is_present(Element::S, Layer::Bulk));
//! ```

pub mod composition;
pub mod element;
pub mod error;
pub mod layer;

pub use composition::CompositionMap;
pub use element::Element;
pub use error::{ChemError, ChemResult};
pub use layer::Layer;
