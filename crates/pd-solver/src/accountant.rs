//! Mass balance between metal and silicate.

use crate::error::{SolverError, SolverResult};
use pd_chem::{CompositionMap, Element, Layer};
use pd_partition::PartitionCoefficients;

/// Result of one mass-balance pass.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountantOutput {
    /// Bulk layer plus the renormalised core (and mantle, when computed).
    pub composition: CompositionMap,
    /// Pre-normalisation metal total; the next core number fraction.
    pub core_number_fraction: f64,
    pub mantle_computed: bool,
}

/// Splits a bulk composition between core and mantle for given coefficients.
///
/// For every bulk element with abundance `X` and coefficient `D`, with
/// `f` the core number fraction and `m = 1 - f`:
///
/// - `metal = X * D f / (m + D f)`
/// - `mantle = X * m / (m + D f)`
///
/// Oxygen's coefficient is already a metal abundance per unit core, so
/// `metal(O) = min(D f, X)` and `mantle(O) = (X - metal(O)) / m`.
#[derive(Debug, Clone)]
pub struct AbundanceAccountant {
    bulk: Vec<(Element, f64)>,
}

impl AbundanceAccountant {
    pub fn new(bulk: &CompositionMap) -> SolverResult<Self> {
        let bulk: Vec<(Element, f64)> = bulk
            .layer(Layer::Bulk)
            .filter(|(_, x)| *x > 0.0)
            .collect();
        if bulk.is_empty() {
            return Err(SolverError::InvalidInput {
                what: "bulk composition is empty".to_string(),
            });
        }
        if bulk.iter().any(|(_, x)| !x.is_finite()) {
            return Err(SolverError::InvalidInput {
                what: "bulk composition has non-finite entries".to_string(),
            });
        }
        Ok(Self { bulk })
    }

    /// Bulk elements with nonzero abundance.
    pub fn elements(&self) -> impl Iterator<Item = Element> + '_ {
        self.bulk.iter().map(|(e, _)| *e)
    }

    pub fn calculate(
        &self,
        coefficients: &PartitionCoefficients,
        core_number_fraction: f64,
        compute_mantle: bool,
    ) -> AccountantOutput {
        let cnf = core_number_fraction;
        let mnf = 1.0 - cnf;

        let mut composition = CompositionMap::new();
        let mut metal_total = 0.0;
        let mut mantle_total = 0.0;

        for &(element, x) in &self.bulk {
            composition.set(element, Layer::Bulk, x);

            let d = coefficients.value(element);
            let (metal, mantle) = if element == Element::O {
                let metal = (d * cnf).min(x);
                let mantle = if mnf > 0.0 {
                    ((x - metal) / mnf).max(0.0)
                } else {
                    0.0
                };
                (metal, mantle)
            } else {
                let denom = mnf + d * cnf;
                if denom > 0.0 {
                    (x * d * cnf / denom, x * mnf / denom)
                } else {
                    (0.0, x)
                }
            };

            metal_total += metal;
            composition.set(element, Layer::Core, metal);
            if compute_mantle {
                mantle_total += mantle;
                composition.set(element, Layer::Mantle, mantle);
            }
        }

        if !composition.normalise_layer(Layer::Core) {
            composition.clear_layer(Layer::Core);
            metal_total = 0.0;
        }
        if compute_mantle && (mantle_total <= 0.0 || !composition.normalise_layer(Layer::Mantle)) {
            composition.clear_layer(Layer::Mantle);
        }

        AccountantOutput {
            composition,
            core_number_fraction: metal_total,
            mantle_computed: compute_mantle,
        }
    }
}
