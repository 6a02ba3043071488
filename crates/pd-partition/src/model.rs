//! Element partitioning between liquid metal and silicate.

use crate::activity::ln_activity_coefficients;
use crate::alloy::AlloyFractions;
use crate::coefficients::PartitionCoefficients;
use crate::error::PartitionResult;
use crate::interaction::InteractionMatrix;
use crate::liquidus::liquidus_temperature;
use crate::tables::{ElementFit, PartitionTables};
use nalgebra::DVector;
use pd_chem::{CompositionMap, Element};
use pd_core::units::{Pressure, Temperature, to_gpa, to_kelvin};
use std::f64::consts::LN_10;
use tracing::trace;

/// Thermodynamic conditions of one metal-silicate equilibration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartitionConditions {
    pub pressure: Pressure,
    /// Oxygen fugacity, log10 units relative to the iron-wustite buffer.
    pub fo2: f64,
    /// Fixed temperature; the liquidus at `pressure` when `None`.
    pub temperature: Option<Temperature>,
    /// Silicate NBO/T; the table default when `None`.
    pub nbot: Option<f64>,
}

impl PartitionConditions {
    pub fn new(pressure: Pressure, fo2: f64) -> Self {
        Self {
            pressure,
            fo2,
            temperature: None,
            nbot: None,
        }
    }

    pub fn with_temperature(mut self, temperature: Temperature) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_nbot(mut self, nbot: f64) -> Self {
        self.nbot = Some(nbot);
        self
    }
}

#[derive(Debug, Clone)]
struct PreparedFit {
    element: Element,
    fit: ElementFit,
    alloy_index: Option<usize>,
}

/// Regular-solution partitioning model over static tables.
///
/// Construction validates and indexes the tables once; evaluation is
/// infallible and allocation-light so the solver can call it in tight loops.
#[derive(Debug, Clone)]
pub struct ElementPartitionModel {
    tables: PartitionTables,
    ln_gamma0: DVector<f64>,
    interactions: InteractionMatrix,
    fits: Vec<PreparedFit>,
    use_alternative_interactions: bool,
}

impl ElementPartitionModel {
    pub fn new(tables: PartitionTables) -> PartitionResult<Self> {
        tables.validate()?;

        let ln_gamma0 = DVector::from_iterator(
            tables.alloy_order.len(),
            tables
                .alloy_order
                .iter()
                .map(|e| tables.infinite_dilution.get(e).copied().unwrap_or(0.0)),
        );
        let interactions = InteractionMatrix::from_tables(&tables);
        let fits = tables
            .fits
            .iter()
            .map(|(element, fit)| PreparedFit {
                element: *element,
                fit: *fit,
                alloy_index: if fit.activity {
                    tables.alloy_index(*element)
                } else {
                    None
                },
            })
            .collect();

        Ok(Self {
            tables,
            ln_gamma0,
            interactions,
            fits,
            use_alternative_interactions: false,
        })
    }

    /// Model over the embedded default tables.
    pub fn builtin() -> PartitionResult<Self> {
        Self::new(PartitionTables::builtin()?)
    }

    /// Use the alternative interaction fits where the tables provide them.
    pub fn with_alternative_interactions(mut self, enabled: bool) -> Self {
        self.use_alternative_interactions = enabled;
        self
    }

    pub fn uses_alternative_interactions(&self) -> bool {
        self.use_alternative_interactions
    }

    pub fn tables(&self) -> &PartitionTables {
        &self.tables
    }

    pub fn alloy_order(&self) -> &[Element] {
        &self.tables.alloy_order
    }

    /// Elements that receive a coefficient.
    pub fn supported_elements(&self) -> impl Iterator<Item = Element> + '_ {
        self.fits.iter().map(|f| f.element)
    }

    /// Liquidus temperature [K] at `pressure`.
    pub fn liquidus(&self, pressure: Pressure) -> f64 {
        liquidus_temperature(&self.tables.liquidus, to_gpa(pressure))
    }

    /// Working temperature [K]: the fixed one, else the liquidus.
    pub fn temperature(&self, conditions: &PartitionConditions) -> f64 {
        match conditions.temperature {
            Some(t) => to_kelvin(t),
            None => {
                let t = self.liquidus(conditions.pressure);
                trace!(
                    pressure_gpa = to_gpa(conditions.pressure),
                    temperature_k = t,
                    "temperature from liquidus"
                );
                t
            }
        }
    }

    /// Activity coefficients (not logarithms) over the alloy ordering.
    pub fn activity_coefficients(
        &self,
        conditions: &PartitionConditions,
        composition: Option<&CompositionMap>,
    ) -> Vec<(Element, f64)> {
        let temperature = self.temperature(conditions);
        let ln_gamma = self.ln_gamma(temperature, composition);
        self.tables
            .alloy_order
            .iter()
            .zip(ln_gamma.iter())
            .map(|(e, lg)| (*e, lg.exp()))
            .collect()
    }

    /// Partition coefficient of every supported element.
    ///
    /// `composition` supplies the current metal phase (its core layer); the
    /// pure-iron trial alloy is used when it is `None`.
    pub fn compute_coefficients(
        &self,
        conditions: &PartitionConditions,
        composition: Option<&CompositionMap>,
    ) -> PartitionCoefficients {
        let temperature = self.temperature(conditions);
        let pressure = to_gpa(conditions.pressure);
        let nbot = conditions.nbot.unwrap_or(self.tables.default_nbot);
        let ln_gamma = self.ln_gamma(temperature, composition);

        self.fits
            .iter()
            .map(|prepared| {
                let mut log_d =
                    prepared
                        .fit
                        .log10_base(temperature, pressure, conditions.fo2, nbot);
                if let Some(index) = prepared.alloy_index {
                    log_d -= ln_gamma[index] / LN_10;
                }
                (prepared.element, 10f64.powf(log_d))
            })
            .collect()
    }

    fn ln_gamma(&self, temperature: f64, composition: Option<&CompositionMap>) -> DVector<f64> {
        let alloy = AlloyFractions::from_composition(&self.tables.alloy_order, composition);
        let eps = self
            .interactions
            .at_temperature(temperature, self.use_alternative_interactions);
        let ln_gamma0 = &self.ln_gamma0 * (self.tables.reference_temperature / temperature);
        ln_activity_coefficients(alloy.as_vector(), &eps, &ln_gamma0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pd_chem::Layer;
    use pd_core::units::{gpa, kelvin};

    fn model() -> ElementPartitionModel {
        ElementPartitionModel::builtin().unwrap()
    }

    #[test]
    fn lithophiles_are_omitted() {
        let ds = model().compute_coefficients(&PartitionConditions::new(gpa(54.0), -2.0), None);
        assert!(ds.contains(Element::Fe));
        assert!(ds.contains(Element::O));
        assert!(!ds.contains(Element::Mg));
        assert!(!ds.contains(Element::Ca));
        assert_eq!(ds.len(), model().supported_elements().count());
    }

    #[test]
    fn iron_in_pure_iron_follows_its_fit() {
        let m = model();
        let t = 1873.0;
        let cond = PartitionConditions::new(gpa(10.0), -2.0).with_temperature(kelvin(t));
        let ds = m.compute_coefficients(&cond, None);

        // Pure iron: gamma_Fe = 1, so only the fit remains
        let fit = m.tables().fits[&Element::Fe];
        let expected = 10f64.powf(fit.log10_base(t, 10.0, -2.0, 2.6));
        assert!((ds.value(Element::Fe) - expected).abs() < 1e-9 * expected);
    }

    #[test]
    fn solute_in_pure_iron_uses_infinite_dilution() {
        let m = model();
        let t = 2500.0;
        let cond = PartitionConditions::new(gpa(20.0), -1.5).with_temperature(kelvin(t));
        let ds = m.compute_coefficients(&cond, None);

        let fit = m.tables().fits[&Element::Si];
        let ln_gamma0 = m.tables().infinite_dilution[&Element::Si] * 1873.0 / t;
        let expected = 10f64.powf(fit.log10_base(t, 20.0, -1.5, 2.6) - ln_gamma0 / LN_10);
        assert!((ds.value(Element::Si) - expected).abs() < 1e-9 * expected);
    }

    #[test]
    fn temperature_defaults_to_liquidus() {
        let m = model();
        let cond = PartitionConditions::new(gpa(54.0), -2.0);
        assert_eq!(m.temperature(&cond), m.liquidus(gpa(54.0)));

        let fixed = cond.with_temperature(kelvin(3000.0));
        assert!((m.temperature(&fixed) - 3000.0).abs() < 1e-9);
        assert_ne!(
            m.compute_coefficients(&cond, None),
            m.compute_coefficients(&fixed, None)
        );
    }

    #[test]
    fn reducing_conditions_favour_silicon_in_metal() {
        let m = model();
        let reduced = m.compute_coefficients(&PartitionConditions::new(gpa(54.0), -3.0), None);
        let oxidised = m.compute_coefficients(&PartitionConditions::new(gpa(54.0), -1.0), None);
        assert!(reduced.value(Element::Si) > oxidised.value(Element::Si));
        assert!(reduced.value(Element::Fe) > oxidised.value(Element::Fe));
        // Oxygen goes the other way
        assert!(reduced.value(Element::O) < oxidised.value(Element::O));
    }

    #[test]
    fn nbot_only_moves_elements_with_a_melt_term() {
        let m = model();
        let base = PartitionConditions::new(gpa(30.0), -2.0);
        let low = m.compute_coefficients(&base.with_nbot(0.5), None);
        let high = m.compute_coefficients(&base.with_nbot(3.0), None);
        assert!(high.value(Element::Cr) < low.value(Element::Cr));
        assert_eq!(high.value(Element::Ni), low.value(Element::Ni));
    }

    #[test]
    fn alloy_composition_feeds_back_into_coefficients() {
        let m = model();
        let cond = PartitionConditions::new(gpa(54.0), -2.0);
        let mut comp = CompositionMap::from_bulk([(Element::Fe, 1.0)]).unwrap();
        comp.set(Element::Fe, Layer::Core, 0.80);
        comp.set(Element::Si, Layer::Core, 0.08);
        comp.set(Element::O, Layer::Core, 0.12);

        let pure = m.compute_coefficients(&cond, None);
        let alloyed = m.compute_coefficients(&cond, Some(&comp));
        assert_ne!(pure.value(Element::Ni), alloyed.value(Element::Ni));
        assert_ne!(pure.value(Element::Si), alloyed.value(Element::Si));
    }

    #[test]
    fn alternative_interactions_change_light_elements() {
        let cond = PartitionConditions::new(gpa(54.0), -2.0);
        let mut comp = CompositionMap::from_bulk([(Element::Fe, 1.0)]).unwrap();
        comp.set(Element::Fe, Layer::Core, 0.85);
        comp.set(Element::O, Layer::Core, 0.15);

        let reference = model().compute_coefficients(&cond, Some(&comp));
        let alt_model = model().with_alternative_interactions(true);
        assert!(alt_model.uses_alternative_interactions());
        let alternative = alt_model.compute_coefficients(&cond, Some(&comp));
        assert_ne!(reference.value(Element::O), alternative.value(Element::O));
    }

    #[test]
    fn activity_of_pure_iron_is_unity() {
        let m = model();
        let gammas = m.activity_coefficients(&PartitionConditions::new(gpa(10.0), -2.0), None);
        assert_eq!(gammas[0], (Element::Fe, 1.0));
        assert_eq!(gammas.len(), m.alloy_order().len());
    }

    #[test]
    fn coefficients_are_finite_for_extreme_alloys() {
        let m = model();
        let cond = PartitionConditions::new(gpa(100.0), 0.0);
        let mut comp = CompositionMap::new();
        comp.set(Element::S, Layer::Core, 1.0);
        let ds = m.compute_coefficients(&cond, Some(&comp));
        assert!(ds.iter().all(|(_, d)| d.is_finite() && d >= 0.0));
    }

    #[test]
    fn earth_like_iron_is_strongly_siderophile() {
        let ds = model().compute_coefficients(&PartitionConditions::new(gpa(54.0), -2.0), None);
        assert!(ds.value(Element::Fe) > 10.0);
        assert!(ds.value(Element::Ni) > ds.value(Element::Fe));
        assert!(ds.value(Element::Si) < 1.0);
    }
}
