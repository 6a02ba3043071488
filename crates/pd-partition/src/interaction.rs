//! Pairwise interaction-parameter (epsilon) matrix.

use crate::tables::{InteractionEntry, PartitionTables};
use nalgebra::DMatrix;

/// Epsilon values over the alloy ordering at their reference temperatures.
///
/// Regular-solution parameters scale as `T_ref / T`. Row/column 0 (the
/// solvent) is always zero.
#[derive(Debug, Clone)]
pub struct InteractionMatrix {
    reference_temperature: f64,
    reference: DMatrix<f64>,
    alternative: Option<AlternativeMatrix>,
}

#[derive(Debug, Clone)]
struct AlternativeMatrix {
    reference_temperature: f64,
    values: DMatrix<f64>,
    present: DMatrix<bool>,
}

impl InteractionMatrix {
    pub fn from_tables(tables: &PartitionTables) -> Self {
        let n = tables.alloy_order.len();
        let mut reference = DMatrix::zeros(n, n);
        for (i, j, epsilon) in indexed(tables, &tables.interactions) {
            reference[(i, j)] = epsilon;
            reference[(j, i)] = epsilon;
        }

        let alternative = tables.alternative_interactions.as_ref().map(|alt| {
            let mut values = DMatrix::zeros(n, n);
            let mut present = DMatrix::from_element(n, n, false);
            for (i, j, epsilon) in indexed(tables, &alt.entries) {
                values[(i, j)] = epsilon;
                values[(j, i)] = epsilon;
                present[(i, j)] = true;
                present[(j, i)] = true;
            }
            AlternativeMatrix {
                reference_temperature: alt.reference_temperature,
                values,
                present,
            }
        });

        Self {
            reference_temperature: tables.reference_temperature,
            reference,
            alternative,
        }
    }

    /// Epsilon matrix scaled to `temperature_k`.
    ///
    /// With `use_alternative`, entries present in the alternative table replace
    /// the reference ones (each scaled from its own reference temperature).
    pub fn at_temperature(&self, temperature_k: f64, use_alternative: bool) -> DMatrix<f64> {
        let mut eps = &self.reference * (self.reference_temperature / temperature_k);
        if use_alternative {
            if let Some(alt) = &self.alternative {
                let scale = alt.reference_temperature / temperature_k;
                for ((value, alt_value), present) in eps
                    .iter_mut()
                    .zip(alt.values.iter())
                    .zip(alt.present.iter())
                {
                    if *present {
                        *value = alt_value * scale;
                    }
                }
            }
        }
        eps
    }
}

fn indexed<'a>(
    tables: &'a PartitionTables,
    entries: &'a [InteractionEntry],
) -> impl Iterator<Item = (usize, usize, f64)> + 'a {
    entries.iter().filter_map(move |entry| {
        let i = tables.alloy_index(entry.pair[0])?;
        let j = tables.alloy_index(entry.pair[1])?;
        Some((i, j, entry.epsilon))
    })
}
