//! Static partitioning tables.
//!
//! Loaded once at startup (either the embedded defaults or a user file) and
//! never mutated afterwards.

use crate::error::{PartitionError, PartitionResult};
use pd_chem::Element;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

const BUILTIN_TABLES: &str = include_str!("../data/partitioning.yaml");

/// Per-element linear free-energy fit.
///
/// `log10 D = a + b/T + c*P/T + v*fO2 + nbot*NBO/T`, minus `log10 gamma` when
/// `activity` is set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElementFit {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub v: f64,
    #[serde(default)]
    pub nbot: f64,
    #[serde(default = "default_activity")]
    pub activity: bool,
}

fn default_activity() -> bool {
    true
}

impl ElementFit {
    /// Evaluate log10 D before the activity correction.
    pub fn log10_base(&self, temperature_k: f64, pressure_gpa: f64, fo2: f64, nbot: f64) -> f64 {
        self.a
            + self.b / temperature_k
            + self.c * pressure_gpa / temperature_k
            + self.v * fo2
            + self.nbot * nbot
    }
}

/// Symmetric pairwise interaction parameter between two alloy solutes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InteractionEntry {
    pub pair: [Element; 2],
    pub epsilon: f64,
}

/// Alternative interaction fits, each taken at its own reference temperature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternativeInteractions {
    pub reference_temperature: f64,
    pub entries: Vec<InteractionEntry>,
}

/// Complete set of static inputs for the partition model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionTables {
    /// Temperature [K] at which `interactions` and `infinite_dilution` apply.
    pub reference_temperature: f64,
    /// NBO/T used when the caller does not fix one.
    pub default_nbot: f64,
    /// Peridotite liquidus polynomial in pressure [GPa], lowest order first.
    pub liquidus: Vec<f64>,
    /// Alloy-forming elements; the first entry is the solvent (Fe).
    pub alloy_order: Vec<Element>,
    /// ln gamma0 of each solute at infinite dilution.
    #[serde(default)]
    pub infinite_dilution: BTreeMap<Element, f64>,
    #[serde(default)]
    pub interactions: Vec<InteractionEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative_interactions: Option<AlternativeInteractions>,
    pub fits: BTreeMap<Element, ElementFit>,
}

impl PartitionTables {
    /// Embedded default tables.
    pub fn builtin() -> PartitionResult<Self> {
        Self::from_yaml_str(BUILTIN_TABLES)
    }

    pub fn from_yaml_str(content: &str) -> PartitionResult<Self> {
        let tables: PartitionTables = serde_yaml::from_str(content)?;
        tables.validate()?;
        Ok(tables)
    }

    pub fn load_yaml(path: &Path) -> PartitionResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn to_yaml(&self) -> PartitionResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Position of `element` in the alloy ordering.
    pub fn alloy_index(&self, element: Element) -> Option<usize> {
        self.alloy_order.iter().position(|e| *e == element)
    }

    pub fn validate(&self) -> PartitionResult<()> {
        if !(self.reference_temperature.is_finite() && self.reference_temperature > 0.0) {
            return Err(invalid("reference_temperature must be positive"));
        }
        if !self.default_nbot.is_finite() || self.default_nbot < 0.0 {
            return Err(invalid("default_nbot must be non-negative"));
        }
        if self.liquidus.is_empty() || self.liquidus.iter().any(|c| !c.is_finite()) {
            return Err(invalid("liquidus needs finite coefficients"));
        }

        match self.alloy_order.first() {
            Some(Element::Fe) => {}
            _ => return Err(invalid("alloy_order must start with Fe")),
        }
        let mut seen = BTreeSet::new();
        for element in &self.alloy_order {
            if !seen.insert(*element) {
                return Err(invalid(format!("{element} appears twice in alloy_order")));
            }
        }

        for (element, ln_gamma0) in &self.infinite_dilution {
            if *element == Element::Fe || !seen.contains(element) {
                return Err(invalid(format!(
                    "infinite_dilution entry for {element} is not an alloy solute"
                )));
            }
            if !ln_gamma0.is_finite() {
                return Err(invalid(format!("infinite_dilution for {element} is not finite")));
            }
        }

        self.validate_entries(&self.interactions, &seen, "interactions")?;
        if let Some(alt) = &self.alternative_interactions {
            if !(alt.reference_temperature.is_finite() && alt.reference_temperature > 0.0) {
                return Err(invalid(
                    "alternative_interactions reference_temperature must be positive",
                ));
            }
            self.validate_entries(&alt.entries, &seen, "alternative_interactions")?;
        }

        for required in [Element::Fe, Element::O] {
            if !self.fits.contains_key(&required) {
                return Err(invalid(format!("missing fit for {required}")));
            }
        }
        for (element, fit) in &self.fits {
            let values = [fit.a, fit.b, fit.c, fit.v, fit.nbot];
            if values.iter().any(|v| !v.is_finite()) {
                return Err(invalid(format!("fit for {element} is not finite")));
            }
            if fit.activity && !seen.contains(element) {
                return Err(invalid(format!(
                    "fit for {element} requests an activity correction but {element} is not an alloy element"
                )));
            }
        }

        Ok(())
    }

    fn validate_entries(
        &self,
        entries: &[InteractionEntry],
        alloy: &BTreeSet<Element>,
        section: &str,
    ) -> PartitionResult<()> {
        for entry in entries {
            for element in entry.pair {
                if element == Element::Fe || !alloy.contains(&element) {
                    return Err(invalid(format!(
                        "{section}: {element} is not an alloy solute"
                    )));
                }
            }
            if !entry.epsilon.is_finite() {
                return Err(invalid(format!(
                    "{section}: epsilon for {}-{} is not finite",
                    entry.pair[0], entry.pair[1]
                )));
            }
        }
        Ok(())
    }
}

fn invalid(what: impl Into<String>) -> PartitionError {
    PartitionError::InvalidTable { what: what.into() }
}
