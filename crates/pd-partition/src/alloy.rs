//! Metal-phase composition as an ordered alloy vector.

use nalgebra::DVector;
use pd_chem::{CompositionMap, Element, Layer};

/// Largest solute fraction handed to the activity model.
pub const MAX_SOLUTE_FRACTION: f64 = 1.0 - 1.0e-9;

/// Number fractions over the fixed alloy ordering (index 0 is Fe).
#[derive(Debug, Clone, PartialEq)]
pub struct AlloyFractions {
    fractions: DVector<f64>,
}

impl AlloyFractions {
    /// Pure iron: the trial alloy used before any composition is known.
    pub fn pure_iron(order: &[Element]) -> Self {
        let mut fractions = DVector::zeros(order.len());
        if !order.is_empty() {
            fractions[0] = 1.0;
        }
        Self { fractions }
    }

    /// Project the core layer of `composition` onto `order` and renormalise.
    ///
    /// Falls back to pure iron when no composition is given or the core holds
    /// none of the alloy elements.
    pub fn from_composition(order: &[Element], composition: Option<&CompositionMap>) -> Self {
        let Some(composition) = composition else {
            return Self::pure_iron(order);
        };

        let raw = DVector::from_iterator(
            order.len(),
            order.iter().map(|e| composition.get(*e, Layer::Core).max(0.0)),
        );
        let total = raw.sum();
        if total <= 0.0 || !total.is_finite() {
            return Self::pure_iron(order);
        }

        let mut fractions = raw / total;
        for x in fractions.iter_mut().skip(1) {
            *x = x.min(MAX_SOLUTE_FRACTION);
        }
        Self { fractions }
    }

    pub fn as_vector(&self) -> &DVector<f64> {
        &self.fractions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDER: [Element; 4] = [Element::Fe, Element::Si, Element::O, Element::Ni];

    #[test]
    fn missing_composition_is_pure_iron() {
        let alloy = AlloyFractions::from_composition(&ORDER, None);
        assert_eq!(alloy.as_vector().as_slice(), &[1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn empty_core_is_pure_iron() {
        let comp = CompositionMap::from_bulk([(Element::Fe, 1.0)]).unwrap();
        let alloy = AlloyFractions::from_composition(&ORDER, Some(&comp));
        assert_eq!(alloy.as_vector()[0], 1.0);
    }

    #[test]
    fn non_alloy_elements_are_ignored() {
        let mut comp = CompositionMap::from_bulk([(Element::Fe, 1.0)]).unwrap();
        comp.set(Element::Fe, Layer::Core, 0.6);
        comp.set(Element::Si, Layer::Core, 0.1);
        comp.set(Element::Ni, Layer::Core, 0.1);
        comp.set(Element::Mg, Layer::Core, 0.2);

        let alloy = AlloyFractions::from_composition(&ORDER, Some(&comp));
        assert!((alloy.as_vector()[0] - 0.75).abs() < 1e-12);
        assert!((alloy.as_vector()[1] - 0.125).abs() < 1e-12);
        assert_eq!(alloy.as_vector()[2], 0.0);
        assert!((alloy.as_vector().sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn solute_fraction_stays_below_one() {
        let mut comp = CompositionMap::new();
        comp.set(Element::Si, Layer::Core, 1.0);
        let alloy = AlloyFractions::from_composition(&ORDER, Some(&comp));
        assert!(alloy.as_vector()[1] < 1.0);
    }
}
