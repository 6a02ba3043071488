//! Fixed-point iteration between the partition model and the mass balance.

use crate::accountant::{AbundanceAccountant, AccountantOutput};
use crate::config::SolverConfig;
use crate::error::{SolverError, SolverResult};
use crate::grid::GridFallbackSearcher;
use crate::state::{SolverPhase, SolverState};
use pd_chem::{CompositionMap, Element, Layer};
use pd_core::numeric::relative_change;
use pd_core::units::{Pressure, Temperature, to_gpa, to_kelvin};
use pd_partition::{ElementPartitionModel, PartitionCoefficients, PartitionConditions};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Everything one solve needs besides the model and tuning.
#[derive(Debug, Clone)]
pub struct SolveRequest<'a> {
    /// Normalised bulk layer.
    pub bulk: &'a CompositionMap,
    pub conditions: PartitionConditions,
    /// Overrides [`SolverConfig::initial_core_fraction`].
    pub initial_core_fraction: Option<f64>,
    /// Replace the model's first guess for these elements.
    pub seed_coefficients: Option<PartitionCoefficients>,
    /// Record the coefficients used on every iteration.
    pub keep_history: bool,
}

impl<'a> SolveRequest<'a> {
    pub fn new(bulk: &'a CompositionMap, pressure: Pressure, fo2: f64) -> Self {
        Self {
            bulk,
            conditions: PartitionConditions::new(pressure, fo2),
            initial_core_fraction: None,
            seed_coefficients: None,
            keep_history: false,
        }
    }

    pub fn with_temperature(mut self, temperature: Temperature) -> Self {
        self.conditions = self.conditions.with_temperature(temperature);
        self
    }

    pub fn with_nbot(mut self, nbot: f64) -> Self {
        self.conditions = self.conditions.with_nbot(nbot);
        self
    }

    pub fn with_initial_core_fraction(mut self, fraction: f64) -> Self {
        self.initial_core_fraction = Some(fraction);
        self
    }

    pub fn with_seed(mut self, seed: PartitionCoefficients) -> Self {
        self.seed_coefficients = Some(seed);
        self
    }

    pub fn with_history(mut self, keep: bool) -> Self {
        self.keep_history = keep;
        self
    }
}

/// How a solve ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveOutcome {
    Converged,
    /// The iteration kept oscillating; the answer comes from the grid search.
    GridFallback,
    /// No answer; every output is `None`.
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SolveDiagnostics {
    pub iterations: usize,
    /// Oxygen cap in force at the end of the run.
    pub o_cap: f64,
    /// Iteration on which the oscillation guard froze the oxygen cap.
    pub o_cap_frozen_at: Option<usize>,
    pub damped_iterations: usize,
    /// Iterations whose mantle was rebuilt; the rest carried it forward.
    pub mantle_recomputations: usize,
    /// Best grid score, when the grid search ran.
    pub grid_score: Option<f64>,
}

/// Result of [`EquilibriumSolver::solve`].
#[derive(Debug, Clone, Serialize)]
pub struct SolveOutput {
    pub outcome: SolveOutcome,
    pub composition: Option<CompositionMap>,
    pub core_number_fraction: Option<f64>,
    pub coefficients: Option<PartitionCoefficients>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<PartitionCoefficients>,
    pub diagnostics: SolveDiagnostics,
    pub message: String,
}

impl SolveOutput {
    /// Converged directly or through the grid search.
    pub fn is_success(&self) -> bool {
        self.outcome != SolveOutcome::Failed
    }

    /// Core mass fraction from the number fraction and layer mean atomic masses.
    pub fn core_mass_fraction(&self) -> Option<f64> {
        let cnf = self.core_number_fraction?;
        let composition = self.composition.as_ref()?;
        let core = cnf * composition.mean_atomic_mass(Layer::Core);
        let mantle = (1.0 - cnf) * composition.mean_atomic_mass(Layer::Mantle);
        let total = core + mantle;
        (total > 0.0).then(|| core / total)
    }
}

/// Drives the partition model and mass balance to a self-consistent state.
///
/// Each iteration:
/// 1. evaluates the model on the current metal (pure iron at first),
/// 2. under-relaxes towards the previous coefficients when configured,
/// 3. splices seed coefficients on the first iteration,
/// 4. freezes an oxygen cap when D(O) rises twice in a row,
/// 5. schedules a 50/50 averaged iteration every `nudge_iterations`,
/// 6. caps D(Si) and D(O),
/// 7. rebalances core and mantle,
/// 8. tests every bulk element's relative change against the tolerance.
///
/// A run that is still raising D(O) past `grid_fallback_threshold` is handed
/// to [`GridFallbackSearcher`]; one that passes `max_iterations` otherwise
/// fails with empty outputs.
pub struct EquilibriumSolver<'m> {
    model: &'m ElementPartitionModel,
    config: SolverConfig,
}

impl<'m> EquilibriumSolver<'m> {
    pub fn new(model: &'m ElementPartitionModel, config: SolverConfig) -> SolverResult<Self> {
        config.validate()?;
        Ok(Self { model, config })
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn solve(&self, request: &SolveRequest<'_>) -> SolverResult<SolveOutput> {
        let accountant = AbundanceAccountant::new(request.bulk)?;
        let conditions = request.conditions;
        validate_request(request)?;

        let initial = request
            .initial_core_fraction
            .unwrap_or(self.config.initial_core_fraction);
        let mut state = SolverState::new(initial, self.config.o_cap);
        state.phase = SolverPhase::Iterating;
        let bulk_elements: Vec<Element> = accountant.elements().collect();

        loop {
            if state.iteration > self.config.grid_fallback_threshold && state.o_increasing {
                return Ok(self.grid_fallback(&accountant, &conditions, state));
            }
            if state.iteration > self.config.max_iterations
                && (!state.o_increasing || state.iteration > self.config.grid_fallback_threshold)
            {
                return Ok(self.fail(state));
            }

            let raw = self
                .model
                .compute_coefficients(&conditions, state.composition.as_ref());

            let mut ds = match &state.coefficients {
                Some(previous) if self.config.movement_fraction < 1.0 => {
                    raw.relaxed_from(previous, self.config.movement_fraction)
                }
                _ => raw,
            };
            if state.iteration == 0 {
                if let Some(seed) = &request.seed_coefficients {
                    ds.splice(seed);
                }
            }

            let damped = std::mem::take(&mut state.damp_next);
            if damped {
                if let Some(previous) = &state.coefficients {
                    ds = ds.relaxed_from(previous, 0.5);
                }
                state.damped_iterations += 1;
            }

            let o_increased = state
                .coefficients
                .as_ref()
                .is_some_and(|previous| ds.value(Element::O) > previous.value(Element::O));
            if o_increased && state.o_increasing && !state.o_cap_frozen() {
                if let Some(previous) = &state.coefficients {
                    let prev_o = previous.value(Element::O);
                    state.o_cap = prev_o * prev_o / ds.value(Element::O);
                    state.o_cap_frozen_at = Some(state.iteration);
                    warn!(
                        iteration = state.iteration,
                        o_cap = state.o_cap,
                        "D(O) rising on consecutive iterations; freezing cap"
                    );
                }
            }

            if state.iteration > 0 && state.iteration % self.config.nudge_iterations == 0 {
                state.damp_next = true;
            }

            ds.cap(Element::Si, self.config.si_cap);
            ds.cap(Element::O, state.o_cap);

            let compute_mantle = state.iteration == 0
                || state.composition.as_ref().is_some_and(|c| {
                    c.is_present(Element::S, Layer::Core) || c.is_present(Element::S, Layer::Mantle)
                });
            let AccountantOutput {
                mut composition,
                core_number_fraction,
                ..
            } = accountant.calculate(&ds, state.core_number_fraction, compute_mantle);
            if compute_mantle {
                state.mantle_recomputations += 1;
            } else if let Some(previous) = &state.composition {
                composition.copy_layer_from(previous, Layer::Mantle);
            }

            let converged = !damped
                && state.coefficients.as_ref().is_some_and(|previous| {
                    bulk_elements
                        .iter()
                        .filter_map(|e| ds.get(*e).map(|d| (d, previous.value(*e))))
                        .all(|(d, prev)| {
                            (d == 0.0 && prev == 0.0)
                                || relative_change(prev, d) < self.config.convergence_tolerance
                        })
                });

            debug!(
                iteration = state.iteration,
                core_number_fraction,
                d_fe = ds.value(Element::Fe),
                d_si = ds.value(Element::Si),
                d_o = ds.value(Element::O),
                damped,
                "equilibrium iteration"
            );

            if request.keep_history {
                state.history.push(ds.clone());
            }
            state.iteration += 1;
            state.o_increasing = o_increased;
            state.core_number_fraction = core_number_fraction;
            state.composition = Some(composition);
            state.coefficients = Some(ds);
            state.converged = converged;

            if state.converged {
                return Ok(self.converge(&accountant, state));
            }
        }
    }

    fn converge(&self, accountant: &AbundanceAccountant, mut state: SolverState) -> SolveOutput {
        state.phase = SolverPhase::Converged;
        let coefficients = state.coefficients.take().unwrap_or_default();
        let balance = accountant.calculate(&coefficients, state.core_number_fraction, true);
        info!(
            phase = ?state.phase,
            iterations = state.iteration,
            core_number_fraction = balance.core_number_fraction,
            "equilibrium converged"
        );
        let message = format!("converged after {} iterations", state.iteration);
        finish(
            SolveOutcome::Converged,
            Some(balance.composition),
            Some(balance.core_number_fraction),
            Some(coefficients),
            state,
            None,
            message,
        )
    }

    fn grid_fallback(
        &self,
        accountant: &AbundanceAccountant,
        conditions: &PartitionConditions,
        mut state: SolverState,
    ) -> SolveOutput {
        state.phase = SolverPhase::GridFallback;
        warn!(
            phase = ?state.phase,
            iterations = state.iteration,
            pressure_gpa = to_gpa(conditions.pressure),
            fo2 = conditions.fo2,
            "D(O) still oscillating; falling back to grid search"
        );
        let coefficients = state.coefficients.take().unwrap_or_default();
        let result = GridFallbackSearcher::new(self.model, accountant)
            .with_caps(self.config.si_cap, state.o_cap)
            .with_parallel(self.config.parallel_grid)
            .search(&coefficients, state.core_number_fraction, conditions);
        let message = format!(
            "no convergence after {} iterations; grid search score {:.3e}",
            state.iteration, result.score
        );
        finish(
            SolveOutcome::GridFallback,
            Some(result.composition),
            Some(result.core_number_fraction),
            Some(result.coefficients),
            state,
            Some(result.score),
            message,
        )
    }

    fn fail(&self, mut state: SolverState) -> SolveOutput {
        state.phase = SolverPhase::Failed;
        warn!(
            phase = ?state.phase,
            iterations = state.iteration,
            "equilibrium solve failed"
        );
        let message = format!(
            "no convergence within {} iterations",
            self.config.max_iterations
        );
        finish(SolveOutcome::Failed, None, None, None, state, None, message)
    }
}

fn finish(
    outcome: SolveOutcome,
    composition: Option<CompositionMap>,
    core_number_fraction: Option<f64>,
    coefficients: Option<PartitionCoefficients>,
    state: SolverState,
    grid_score: Option<f64>,
    message: String,
) -> SolveOutput {
    SolveOutput {
        outcome,
        composition,
        core_number_fraction,
        coefficients,
        diagnostics: SolveDiagnostics {
            iterations: state.iteration,
            o_cap: state.o_cap,
            o_cap_frozen_at: state.o_cap_frozen_at,
            damped_iterations: state.damped_iterations,
            mantle_recomputations: state.mantle_recomputations,
            grid_score,
        },
        history: state.history,
        message,
    }
}

fn validate_request(request: &SolveRequest<'_>) -> SolverResult<()> {
    let conditions = &request.conditions;
    if !to_gpa(conditions.pressure).is_finite() || !conditions.fo2.is_finite() {
        return Err(SolverError::InvalidInput {
            what: "pressure and fO2 must be finite".to_string(),
        });
    }
    if let Some(temperature) = conditions.temperature {
        let kelvin = to_kelvin(temperature);
        if !(kelvin.is_finite() && kelvin > 0.0) {
            return Err(SolverError::InvalidInput {
                what: format!("fixed temperature {kelvin} K must be positive and finite"),
            });
        }
    }
    if let Some(nbot) = conditions.nbot {
        if !nbot.is_finite() {
            return Err(SolverError::InvalidInput {
                what: format!("nbot {nbot} must be finite"),
            });
        }
    }
    if let Some(fraction) = request.initial_core_fraction {
        if !(fraction > 0.0 && fraction < 1.0) {
            return Err(SolverError::InvalidInput {
                what: format!("initial core fraction {fraction} outside (0, 1)"),
            });
        }
    }
    if let Some(seed) = &request.seed_coefficients {
        if let Some((element, d)) = seed.iter().find(|(_, d)| !d.is_finite() || *d < 0.0) {
            return Err(SolverError::InvalidInput {
                what: format!("seed coefficient for {element} is {d}"),
            });
        }
    }
    Ok(())
}
