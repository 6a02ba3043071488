//! Partition coefficient sets.

use pd_chem::Element;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metal/silicate partition coefficient per element.
///
/// Oxygen is the exception: its entry is the oxygen number fraction of the
/// metal phase rather than a ratio. Elements outside the partitioning set are
/// simply absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartitionCoefficients {
    values: BTreeMap<Element, f64>,
}

impl PartitionCoefficients {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, element: Element) -> Option<f64> {
        self.values.get(&element).copied()
    }

    /// Coefficient of `element`, 0.0 when not partitioned.
    pub fn value(&self, element: Element) -> f64 {
        self.get(element).unwrap_or(0.0)
    }

    pub fn set(&mut self, element: Element, value: f64) {
        self.values.insert(element, value);
    }

    pub fn contains(&self, element: Element) -> bool {
        self.values.contains_key(&element)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Element, f64)> + '_ {
        self.values.iter().map(|(e, d)| (*e, *d))
    }

    /// Clamp `element` to at most `cap`; absent entries stay absent.
    pub fn cap(&mut self, element: Element, cap: f64) {
        if let Some(value) = self.values.get_mut(&element) {
            *value = value.min(cap);
        }
    }

    /// Move from `previous` towards `self` by `fraction`.
    ///
    /// `D <- D_prev + fraction * (D - D_prev)` for every entry of `self`;
    /// entries with no previous value are kept as they are.
    pub fn relaxed_from(&self, previous: &PartitionCoefficients, fraction: f64) -> Self {
        self.iter()
            .map(|(element, d)| match previous.get(element) {
                Some(prev) => (element, prev + fraction * (d - prev)),
                None => (element, d),
            })
            .collect()
    }

    /// Overwrite entries with those of `other`.
    pub fn splice(&mut self, other: &PartitionCoefficients) {
        for (element, d) in other.iter() {
            self.set(element, d);
        }
    }
}

impl FromIterator<(Element, f64)> for PartitionCoefficients {
    fn from_iter<T: IntoIterator<Item = (Element, f64)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
