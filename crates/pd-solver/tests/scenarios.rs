//! End-to-end equilibrium scenarios over an Earth-like bulk composition.

use pd_chem::{CompositionMap, Element, Layer};
use pd_core::units::{gpa, kelvin};
use pd_core::{Tolerances, nearly_equal};
use pd_partition::{ElementPartitionModel, PartitionCoefficients, PartitionConditions};
use pd_solver::{
    AbundanceAccountant, EquilibriumSolver, GridFallbackSearcher, SolveOutcome, SolveOutput,
    SolveRequest, SolverConfig,
};

fn earth_like() -> CompositionMap {
    CompositionMap::from_bulk([
        (Element::O, 0.49),
        (Element::Mg, 0.165),
        (Element::Si, 0.15),
        (Element::Fe, 0.148),
        (Element::Ca, 0.01),
        (Element::Al, 0.016),
        (Element::Ni, 0.008),
        (Element::S, 0.004),
        (Element::Cr, 0.002),
        (Element::Na, 0.002),
        (Element::C, 0.001),
        (Element::Mn, 0.001),
        (Element::Co, 0.0004),
        (Element::P, 0.0006),
        (Element::Ti, 0.0005),
        (Element::V, 0.0001),
        (Element::Cu, 0.00005),
    ])
    .unwrap()
}

fn solve_with(config: SolverConfig, request: SolveRequest<'_>) -> SolveOutput {
    let model = ElementPartitionModel::builtin().unwrap();
    let solver = EquilibriumSolver::new(&model, config).unwrap();
    solver.solve(&request).unwrap()
}

fn assert_layers_normalised(output: &SolveOutput) {
    let composition = output.composition.as_ref().unwrap();
    for layer in [Layer::Bulk, Layer::Core, Layer::Mantle] {
        let total = composition.layer_total(layer);
        let tol = Tolerances {
            abs: 1e-9,
            rel: 1e-9,
        };
        assert!(nearly_equal(total, 1.0, tol), "{layer} sums to {total}");
    }
}

#[test]
fn earth_like_body_converges() {
    let bulk = earth_like();
    let out = solve_with(
        SolverConfig::default(),
        SolveRequest::new(&bulk, gpa(54.0), -2.0),
    );

    assert_eq!(out.outcome, SolveOutcome::Converged);
    assert!(out.is_success());
    let cnf = out.core_number_fraction.unwrap();
    assert!(cnf > 0.1 && cnf < 0.25, "core number fraction {cnf}");
    let ds = out.coefficients.as_ref().unwrap();
    assert!(ds.value(Element::Fe) > 10.0);
    assert!(ds.value(Element::Si) <= 1.0);
    assert!(ds.value(Element::O) <= 0.3);
    assert_layers_normalised(&out);

    // Iron dominates the metal, magnesium stays behind
    let composition = out.composition.as_ref().unwrap();
    assert!(composition.get(Element::Fe, Layer::Core) > 0.5);
    assert_eq!(composition.get(Element::Mg, Layer::Core), 0.0);

    let cmf = out.core_mass_fraction().unwrap();
    assert!(cmf > cnf);
}

#[test]
fn near_vacuum_body_barely_differentiates() {
    let bulk = earth_like();
    let low = solve_with(
        SolverConfig::default(),
        SolveRequest::new(&bulk, gpa(0.0001), -2.0),
    );
    assert_eq!(low.outcome, SolveOutcome::Converged);
    let low_cnf = low.core_number_fraction.unwrap();
    assert!(low_cnf < 0.015, "core number fraction {low_cnf}");

    // Less than 1% of the iron segregates
    let composition = low.composition.as_ref().unwrap();
    let iron_in_core = composition.get(Element::Fe, Layer::Core) * low_cnf;
    assert!(iron_in_core < 0.01 * composition.get(Element::Fe, Layer::Bulk));

    let high = solve_with(
        SolverConfig::default(),
        SolveRequest::new(&bulk, gpa(54.0), -2.0),
    );
    assert!(low_cnf < high.core_number_fraction.unwrap() / 10.0);
}

#[test]
fn oscillating_oxygen_falls_back_to_grid() {
    let bulk = earth_like();
    let config = SolverConfig {
        convergence_tolerance: 0.0,
        ..Default::default()
    };
    let out = solve_with(
        config.clone(),
        SolveRequest::new(&bulk, gpa(54.0), -2.0)
            .with_temperature(kelvin(6000.0))
            .with_history(true),
    );

    assert_eq!(out.outcome, SolveOutcome::GridFallback);
    assert!(out.is_success());
    assert_layers_normalised(&out);
    assert!(out.diagnostics.grid_score.is_some());
    assert!(out.diagnostics.iterations > config.grid_fallback_threshold);

    let frozen_at = out.diagnostics.o_cap_frozen_at.unwrap();
    let cap = out.diagnostics.o_cap;
    assert!(cap < config.o_cap);
    for ds in &out.history {
        assert!(ds.value(Element::Si) <= config.si_cap);
    }
    for ds in &out.history[frozen_at..] {
        assert!(ds.value(Element::O) <= cap);
    }
    let ds = out.coefficients.as_ref().unwrap();
    assert!(ds.value(Element::O) <= cap);
    assert!(ds.value(Element::Si) <= config.si_cap);
}

#[test]
fn exhausted_iterations_fail_with_empty_outputs() {
    let bulk = earth_like();
    let config = SolverConfig {
        convergence_tolerance: 0.0,
        max_iterations: 1,
        ..Default::default()
    };
    let seed: PartitionCoefficients = [(Element::O, 0.29)].into_iter().collect();
    let out = solve_with(
        config,
        SolveRequest::new(&bulk, gpa(54.0), -2.0)
            .with_seed(seed)
            .with_history(true),
    );

    assert_eq!(out.outcome, SolveOutcome::Failed);
    assert!(!out.is_success());
    assert!(out.composition.is_none());
    assert!(out.core_number_fraction.is_none());
    assert!(out.coefficients.is_none());
    assert_eq!(out.history.len(), 2);
    assert_eq!(out.history[0].value(Element::O), 0.29);
    assert!(out.history[1].value(Element::O) < 0.29);
    assert!(!out.message.is_empty());
}

#[test]
fn identical_inputs_give_identical_outputs() {
    let bulk = earth_like();
    let run = || {
        solve_with(
            SolverConfig::default(),
            SolveRequest::new(&bulk, gpa(40.0), -2.2).with_history(true),
        )
    };
    let a = run();
    let b = run();
    assert_eq!(a.outcome, b.outcome);
    assert_eq!(a.core_number_fraction, b.core_number_fraction);
    assert_eq!(a.coefficients, b.coefficients);
    assert_eq!(a.composition, b.composition);
    assert_eq!(a.history, b.history);
    assert_eq!(a.diagnostics, b.diagnostics);
}

#[test]
fn caps_hold_on_every_iteration() {
    let bulk = earth_like();
    let config = SolverConfig {
        o_cap: 0.12,
        si_cap: 0.05,
        ..Default::default()
    };
    let out = solve_with(
        config,
        SolveRequest::new(&bulk, gpa(54.0), -2.5).with_history(true),
    );
    assert!(!out.history.is_empty());
    for ds in &out.history {
        assert!(ds.value(Element::Si) <= 0.05);
        assert!(ds.value(Element::O) <= out.diagnostics.o_cap.max(0.12));
    }
}

#[test]
fn seed_overrides_first_guess_only() {
    let bulk = earth_like();
    let seed: PartitionCoefficients = [(Element::Ni, 30.0)].into_iter().collect();
    let out = solve_with(
        SolverConfig::default(),
        SolveRequest::new(&bulk, gpa(54.0), -2.0)
            .with_seed(seed)
            .with_history(true),
    );
    assert_eq!(out.outcome, SolveOutcome::Converged);
    assert_eq!(out.history[0].value(Element::Ni), 30.0);
    assert_ne!(out.history[1].value(Element::Ni), 30.0);
    let cnf = out.core_number_fraction.unwrap();
    assert!(cnf > 0.1 && cnf < 0.25);
}

#[test]
fn history_is_opt_in() {
    let bulk = earth_like();
    let without = solve_with(
        SolverConfig::default(),
        SolveRequest::new(&bulk, gpa(54.0), -2.0),
    );
    assert!(without.history.is_empty());

    let with = solve_with(
        SolverConfig::default(),
        SolveRequest::new(&bulk, gpa(54.0), -2.0).with_history(true),
    );
    assert_eq!(with.history.len(), with.diagnostics.iterations);
    assert_eq!(with.history.last(), with.coefficients.as_ref());
}

#[test]
fn damping_still_reaches_the_fixed_point() {
    let bulk = earth_like();
    let config = SolverConfig {
        movement_fraction: 0.5,
        ..Default::default()
    };
    let out = solve_with(config, SolveRequest::new(&bulk, gpa(54.0), -2.0));
    assert_eq!(out.outcome, SolveOutcome::Converged);
    let cnf = out.core_number_fraction.unwrap();
    assert!(cnf > 0.1 && cnf < 0.25);
}

#[test]
fn nudged_iterations_are_counted() {
    let bulk = earth_like();
    let config = SolverConfig {
        nudge_iterations: 2,
        ..Default::default()
    };
    let out = solve_with(config, SolveRequest::new(&bulk, gpa(54.0), -2.0));
    assert_eq!(out.outcome, SolveOutcome::Converged);
    assert!(out.diagnostics.damped_iterations > 0);
    let cnf = out.core_number_fraction.unwrap();
    assert!(cnf > 0.1 && cnf < 0.25);
}

#[test]
fn damped_iterations_never_declare_convergence() {
    let bulk = earth_like();
    let config = SolverConfig {
        nudge_iterations: 1,
        max_iterations: 50,
        grid_fallback_threshold: 51,
        ..Default::default()
    };
    let out = solve_with(config, SolveRequest::new(&bulk, gpa(54.0), -2.0));
    assert_ne!(out.outcome, SolveOutcome::Converged);
    let diagnostics = &out.diagnostics;
    assert!(diagnostics.iterations > 50);
    assert!(diagnostics.damped_iterations + 2 >= diagnostics.iterations);
}

#[test]
fn sulfur_free_mantle_is_carried_forward() {
    let bulk = CompositionMap::from_bulk([
        (Element::O, 0.49),
        (Element::Mg, 0.165),
        (Element::Si, 0.15),
        (Element::Fe, 0.148),
        (Element::Ca, 0.01),
        (Element::Al, 0.016),
        (Element::Ni, 0.008),
        (Element::Cr, 0.002),
        (Element::Na, 0.002),
        (Element::C, 0.001),
        (Element::Mn, 0.001),
        (Element::Co, 0.0004),
        (Element::P, 0.0006),
        (Element::Ti, 0.0005),
        (Element::V, 0.0001),
        (Element::Cu, 0.00005),
    ])
    .unwrap();
    let out = solve_with(
        SolverConfig::default(),
        SolveRequest::new(&bulk, gpa(54.0), -2.0),
    );
    assert_eq!(out.outcome, SolveOutcome::Converged);
    assert!(out.diagnostics.iterations > 1);
    // Only the first iteration builds a mantle
    assert_eq!(out.diagnostics.mantle_recomputations, 1);
    assert_layers_normalised(&out);
    let cnf = out.core_number_fraction.unwrap();
    assert!(cnf > 0.1 && cnf < 0.25, "core number fraction {cnf}");
    let composition = out.composition.as_ref().unwrap();
    assert_eq!(composition.get(Element::S, Layer::Core), 0.0);
}

#[test]
fn sulfur_bearing_mantle_is_rebuilt_every_iteration() {
    let bulk = earth_like();
    let out = solve_with(
        SolverConfig::default(),
        SolveRequest::new(&bulk, gpa(54.0), -2.0),
    );
    assert_eq!(out.outcome, SolveOutcome::Converged);
    assert_eq!(
        out.diagnostics.mantle_recomputations,
        out.diagnostics.iterations
    );
}

#[test]
fn initial_guess_does_not_change_the_answer_much() {
    let bulk = earth_like();
    let fractions: Vec<f64> = [0.02, 0.4]
        .into_iter()
        .map(|guess| {
            let out = solve_with(
                SolverConfig::default(),
                SolveRequest::new(&bulk, gpa(54.0), -2.0).with_initial_core_fraction(guess),
            );
            assert_eq!(out.outcome, SolveOutcome::Converged);
            out.core_number_fraction.unwrap()
        })
        .collect();
    for cnf in &fractions {
        assert!(*cnf > 0.1 && *cnf < 0.25);
    }
    assert!((fractions[0] - fractions[1]).abs() < 0.02);
}

#[test]
fn reducing_conditions_grow_the_core() {
    let bulk = earth_like();
    let cnf = |fo2: f64| {
        solve_with(
            SolverConfig::default(),
            SolveRequest::new(&bulk, gpa(54.0), fo2),
        )
        .core_number_fraction
        .unwrap()
    };
    let reduced = cnf(-3.0);
    let reference = cnf(-2.0);
    let oxidised = cnf(-1.0);
    assert!(reduced > reference);
    assert!(reference > oxidised);
}

#[test]
fn output_serialises_to_json() {
    let bulk = earth_like();
    let out = solve_with(
        SolverConfig::default(),
        SolveRequest::new(&bulk, gpa(54.0), -2.0),
    );
    let json = serde_json::to_value(&out).unwrap();
    assert_eq!(json["outcome"], "converged");
    assert!(json["coefficients"]["Fe"].as_f64().unwrap() > 10.0);
    assert!(json.get("history").is_none());
}

#[test]
fn grid_search_is_independent_of_threading() {
    let bulk = earth_like();
    let model = ElementPartitionModel::builtin().unwrap();
    let accountant = AbundanceAccountant::new(&bulk).unwrap();
    let conditions = PartitionConditions::new(gpa(54.0), -2.0);
    let start = model.compute_coefficients(&conditions, None);

    let run = |parallel: bool| {
        GridFallbackSearcher::new(&model, &accountant)
            .with_caps(1.0, 0.3)
            .with_parallel(parallel)
            .search(&start, 0.15, &conditions)
    };
    let sequential = run(false);
    let parallel = run(true);
    assert_eq!(sequential.index, parallel.index);
    assert_eq!(sequential.coefficients, parallel.coefficients);
    assert_eq!(sequential.core_number_fraction, parallel.core_number_fraction);
    assert_eq!(sequential.composition, parallel.composition);
}
