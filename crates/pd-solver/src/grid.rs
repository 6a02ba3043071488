//! Brute-force local search used when the iteration oscillates.

use crate::accountant::AbundanceAccountant;
use pd_chem::{CompositionMap, Element};
use pd_partition::{ElementPartitionModel, PartitionCoefficients, PartitionConditions};
use rayon::prelude::*;
use std::cmp::Ordering;
use tracing::debug;

/// Elements whose coefficients are perturbed.
pub const IMPORTANT_ELEMENTS: [Element; 6] = [
    Element::Fe,
    Element::Si,
    Element::Ni,
    Element::O,
    Element::Cr,
    Element::C,
];

/// Multipliers tried for each important element.
pub const MULTIPLIERS: [f64; 5] = [0.9, 0.95, 1.0, 1.05, 1.1];

/// Number of trials: every multiplier for every important element.
pub const GRID_SIZE: usize = 15_625;

/// Best trial found by [`GridFallbackSearcher::search`].
#[derive(Debug, Clone)]
pub struct GridResult {
    pub composition: CompositionMap,
    pub core_number_fraction: f64,
    pub coefficients: PartitionCoefficients,
    /// Sum of squared relative deviations over the important elements.
    pub score: f64,
    /// Enumeration index of the winning trial.
    pub index: usize,
}

/// Exhaustive search over scaled coefficients for the most self-consistent set.
///
/// Each trial feeds its coefficients through the mass balance, asks the model
/// what it would predict for the resulting metal, and scores the mismatch.
/// Trials are independent, so they may run in parallel; ties go to the lowest
/// enumeration index either way.
pub struct GridFallbackSearcher<'a> {
    model: &'a ElementPartitionModel,
    accountant: &'a AbundanceAccountant,
    si_cap: f64,
    o_cap: f64,
    parallel: bool,
}

impl<'a> GridFallbackSearcher<'a> {
    pub fn new(model: &'a ElementPartitionModel, accountant: &'a AbundanceAccountant) -> Self {
        Self {
            model,
            accountant,
            si_cap: f64::INFINITY,
            o_cap: f64::INFINITY,
            parallel: false,
        }
    }

    /// Caps applied to every trial, as in the main iteration.
    pub fn with_caps(mut self, si_cap: f64, o_cap: f64) -> Self {
        self.si_cap = si_cap;
        self.o_cap = o_cap;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Coefficients of trial `index`.
    ///
    /// The index is read in base 5 with the first important element as the
    /// most significant digit.
    pub fn trial(&self, base: &PartitionCoefficients, index: usize) -> PartitionCoefficients {
        let mut trial = base.clone();
        let mut rest = index;
        let mut digits = [0usize; IMPORTANT_ELEMENTS.len()];
        for digit in digits.iter_mut().rev() {
            *digit = rest % MULTIPLIERS.len();
            rest /= MULTIPLIERS.len();
        }
        for (element, digit) in IMPORTANT_ELEMENTS.iter().zip(digits) {
            if let Some(d) = base.get(*element) {
                trial.set(*element, d * MULTIPLIERS[digit]);
            }
        }
        trial.cap(Element::Si, self.si_cap);
        trial.cap(Element::O, self.o_cap);
        trial
    }

    /// Self-consistency score of `trial`; lower is better.
    pub fn score(
        &self,
        trial: &PartitionCoefficients,
        core_number_fraction: f64,
        conditions: &PartitionConditions,
    ) -> f64 {
        let balance = self
            .accountant
            .calculate(trial, core_number_fraction, false);
        let predicted = self
            .model
            .compute_coefficients(conditions, Some(&balance.composition));

        let score: f64 = IMPORTANT_ELEMENTS
            .iter()
            .filter_map(|e| {
                let t = trial.get(*e)?;
                let r = predicted.get(*e)?;
                (r != 0.0).then(|| ((t - r) / r).powi(2))
            })
            .sum();
        if score.is_nan() { f64::INFINITY } else { score }
    }

    pub fn search(
        &self,
        coefficients: &PartitionCoefficients,
        core_number_fraction: f64,
        conditions: &PartitionConditions,
    ) -> GridResult {
        let evaluate = |index: usize| {
            let trial = self.trial(coefficients, index);
            (self.score(&trial, core_number_fraction, conditions), index)
        };
        let worst = (f64::INFINITY, usize::MAX);

        let (score, index) = if self.parallel {
            (0..GRID_SIZE)
                .into_par_iter()
                .map(evaluate)
                .reduce(|| worst, better)
        } else {
            (0..GRID_SIZE).map(evaluate).fold(worst, better)
        };

        let best = self.trial(coefficients, index);
        let balance = self.accountant.calculate(&best, core_number_fraction, true);
        debug!(index, score, "grid search finished");

        GridResult {
            composition: balance.composition,
            core_number_fraction: balance.core_number_fraction,
            coefficients: best,
            score,
            index,
        }
    }
}

fn better(a: (f64, usize), b: (f64, usize)) -> (f64, usize) {
    match a.0.total_cmp(&b.0) {
        Ordering::Less => a,
        Ordering::Greater => b,
        Ordering::Equal => {
            if a.1 <= b.1 {
                a
            } else {
                b
            }
        }
    }
}
