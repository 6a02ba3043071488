//! Per-layer elemental composition.

use crate::element::Element;
use crate::error::{ChemError, ChemResult};
use crate::layer::Layer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number fractions keyed by element, then by layer.
///
/// Every populated layer is expected to sum to 1. Constructors and
/// [`CompositionMap::normalise_layer`] establish that; raw [`CompositionMap::set`]
/// calls do not, so writers renormalise once a layer is complete.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompositionMap {
    entries: BTreeMap<Element, BTreeMap<Layer, f64>>,
}

impl CompositionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a bulk composition from (possibly unnormalised) number abundances.
    ///
    /// Validates that all abundances are finite, non-negative, and have a
    /// positive sum, then normalises the bulk layer to sum=1. Zero entries are
    /// dropped; repeated elements accumulate.
    pub fn from_bulk<I>(abundances: I) -> ChemResult<Self>
    where
        I: IntoIterator<Item = (Element, f64)>,
    {
        let mut map = Self::new();
        let mut any = false;
        for (element, abundance) in abundances {
            any = true;
            if !abundance.is_finite() {
                return Err(ChemError::NonPhysical {
                    what: "non-finite abundance",
                });
            }
            if abundance < 0.0 {
                return Err(ChemError::NonPhysical {
                    what: "negative abundance",
                });
            }
            if abundance > 0.0 {
                let current = map.get(element, Layer::Bulk);
                map.set(element, Layer::Bulk, current + abundance);
            }
        }

        if !any {
            return Err(ChemError::InvalidArg {
                what: "empty composition",
            });
        }
        if !map.normalise_layer(Layer::Bulk) {
            return Err(ChemError::NonPhysical {
                what: "abundances sum to zero",
            });
        }
        Ok(map)
    }

    /// Number fraction of `element` in `layer` (0.0 if absent).
    pub fn get(&self, element: Element, layer: Layer) -> f64 {
        self.entries
            .get(&element)
            .and_then(|layers| layers.get(&layer))
            .copied()
            .unwrap_or(0.0)
    }

    /// Set one entry without renormalising.
    pub fn set(&mut self, element: Element, layer: Layer, value: f64) {
        self.entries
            .entry(element)
            .or_default()
            .insert(layer, value);
    }

    /// Whether `element` has a nonzero fraction in `layer`.
    pub fn is_present(&self, element: Element, layer: Layer) -> bool {
        self.get(element, layer) != 0.0
    }

    /// Whether any element has an entry for `layer`.
    pub fn has_layer(&self, layer: Layer) -> bool {
        self.entries.values().any(|layers| layers.contains_key(&layer))
    }

    /// All elements with an entry in any layer, in element order.
    pub fn elements(&self) -> impl Iterator<Item = Element> + '_ {
        self.entries.keys().copied()
    }

    /// Iterate `(element, fraction)` over the entries of one layer.
    pub fn layer(&self, layer: Layer) -> impl Iterator<Item = (Element, f64)> + '_ {
        self.entries
            .iter()
            .filter_map(move |(element, layers)| layers.get(&layer).map(|v| (*element, *v)))
    }

    /// Sum of all entries of one layer.
    pub fn layer_total(&self, layer: Layer) -> f64 {
        self.layer(layer).map(|(_, v)| v).sum()
    }

    /// Scale a layer so its entries sum to 1.
    ///
    /// Returns `false` (and leaves the layer untouched) when the layer total
    /// is zero or non-finite.
    pub fn normalise_layer(&mut self, layer: Layer) -> bool {
        let total = self.layer_total(layer);
        if total <= 0.0 || !total.is_finite() {
            return false;
        }
        for layers in self.entries.values_mut() {
            if let Some(value) = layers.get_mut(&layer) {
                *value /= total;
            }
        }
        true
    }

    /// Remove every entry of one layer.
    pub fn clear_layer(&mut self, layer: Layer) {
        for layers in self.entries.values_mut() {
            layers.remove(&layer);
        }
        self.entries.retain(|_, layers| !layers.is_empty());
    }

    /// Replace one layer with the corresponding entries of `other`.
    pub fn copy_layer_from(&mut self, other: &CompositionMap, layer: Layer) {
        self.clear_layer(layer);
        for (element, value) in other.layer(layer) {
            self.set(element, layer, value);
        }
    }

    /// Number-weighted mean atomic mass [g/mol] of a layer.
    ///
    /// Returns 0.0 for an empty layer.
    pub fn mean_atomic_mass(&self, layer: Layer) -> f64 {
        let total = self.layer_total(layer);
        if total <= 0.0 {
            return 0.0;
        }
        self.layer(layer)
            .map(|(element, x)| x * element.atomic_mass())
            .sum::<f64>()
            / total
    }

    /// Convert one layer from number fractions to mass fractions.
    pub fn mass_fractions(&self, layer: Layer) -> BTreeMap<Element, f64> {
        let weighted: BTreeMap<Element, f64> = self
            .layer(layer)
            .map(|(element, x)| (element, x * element.atomic_mass()))
            .collect();
        let total: f64 = weighted.values().sum();
        if total <= 0.0 {
            return BTreeMap::new();
        }
        weighted
            .into_iter()
            .map(|(element, m)| (element, m / total))
            .collect()
    }
}
