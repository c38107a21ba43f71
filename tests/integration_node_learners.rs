//! Integration tests for the node-local CPT and logit learners.
//!
//! Purpose
//! -------
//! - Validate the end-to-end learner pipeline: from validated node data,
//!   through sufficient statistics and parameter estimation, to the message
//!   length an outer structure search compares across parent sets.
//! - Exercise both model families on the same small datasets so that their
//!   contracts (normalization, degenerate arity, capacity failures) are
//!   checked side by side.
//!
//! Coverage
//! --------
//! - `cpt::CptLearner` with adaptive-code and ML leaves:
//!   - Single-cell fit and cost, capacity failure, normalization, sampling.
//! - `leaf::NestedCptLearner` under a table indexed by a parent prefix.
//! - `logit::LogitLearner`:
//!   - Separable data, determinism, arity cap, fit diagnostics.
//! - `cpt::CptStats` and `logit::LogitStats`:
//!   - Additivity over disjoint row subsets.
//! - `learner::factory::build_learner`:
//!   - Boxed learners scoring competing parent sets.
//!
//! Exclusions
//! ----------
//! - Closed-form checks of individual cost terms, the Cholesky solver, and
//!   derivative sums; those are covered by unit tests.
//! - Python bindings.
use approx::assert_relative_eq;
use camml_node::{
    cpt::{CptLearner, CptOptions},
    data::{Column, Domain, NodeData},
    leaf::{AdaptiveCodeLearner, MlMultinomialLearner, NestedCptLearner},
    learner::{
        LearnerError, LeafConfig, LearnerConfig, LocalModel, ModelLearner, NodeCoster,
        ScheduleKind, build_learner,
    },
    logit::{LogitLearner, LogitOptions},
};
use ndarray::{Array1, Array2, array};
use rand::{SeedableRng, rngs::StdRng};

/// Purpose
/// -------
/// Deterministic two-parent dataset where the child mostly copies parent A
/// and parent B is pure noise.
///
/// Parameters
/// ----------
/// - `n`: number of rows; should be a multiple of 12 for balanced cells.
///
/// Returns
/// -------
/// `(data with parents [A, B], data with parent A only, data with parent B
/// only)`, all over a ternary child.
fn copy_parent_dataset(n: usize) -> (NodeData, NodeData, NodeData) {
    let d3 = Domain::with_arity(3).unwrap();
    let d2 = Domain::with_arity(2).unwrap();
    let a: Vec<i32> = (0..n).map(|r| (r % 3) as i32).collect();
    let b: Vec<i32> = (0..n).map(|r| ((r / 3) % 2) as i32).collect();
    let child: Vec<i32> =
        a.iter().enumerate().map(|(r, &v)| if r % 11 == 0 { (v + 2) % 3 } else { v }).collect();
    let both: Vec<i32> = a.iter().zip(&b).flat_map(|(&x, &y)| [x, y]).collect();

    let joint = NodeData::new(
        Array1::from(child.clone()),
        Array2::from_shape_vec((n, 2), both).unwrap(),
        d3,
        vec![d3, d2],
    )
    .unwrap();
    let only_a = NodeData::new(
        Array1::from(child.clone()),
        Array2::from_shape_vec((n, 1), a).unwrap(),
        d3,
        vec![d3],
    )
    .unwrap();
    let only_b = NodeData::new(
        Array1::from(child),
        Array2::from_shape_vec((n, 1), b).unwrap(),
        d3,
        vec![d2],
    )
    .unwrap();
    (joint, only_a, only_b)
}

#[test]
// Purpose
// -------
// End-to-end CPT fit of a parentless binary child.
//
// Given
// -----
// - Child arity 2, no parents, rows [0, 0, 0, 1], MML adaptive leaf.
//
// Expect
// ------
// - A single cell with probabilities (3.5/5, 1.5/5).
// - Cost `ln 20 + 0.17649`, finite and positive, identical on the fused
//   path.
fn cpt_parentless_binary_child() {
    // Arrange
    let data = NodeData::without_parents(array![0, 0, 0, 1], Domain::with_arity(2).unwrap()).unwrap();
    let learner = CptLearner::default();

    // Act
    let fit = learner.parameterize(&data).unwrap();
    let cost = learner.cost(&fit.model, &fit.stats, &fit.params).unwrap();
    let fused = learner.parameterize_and_cost(&data).unwrap();

    // Assert
    assert_eq!(fit.params.cells.len(), 1);
    let p = &fit.params.cells[0].params;
    assert_relative_eq!(p[0], 0.7, epsilon = 1e-12);
    assert_relative_eq!(p[1], 0.3, epsilon = 1e-12);
    assert!(cost.is_finite() && cost > 0.0);
    assert_relative_eq!(cost, 20f64.ln() + 0.17649, epsilon = 1e-12);
    assert_eq!(cost, fused);
}

#[test]
// Purpose
// -------
// End-to-end logit fit on perfectly separable data.
//
// Given
// -----
// - Binary child equal to its binary parent on every one of 24 rows.
//
// Expect
// ------
// - Every parameter finite and within the ±15 cap.
// - The fitted model predicts the parent value and assigns it probability
//   above 0.9.
// - The cost is finite.
fn logit_separable_data_stays_bounded() {
    // Arrange
    let d2 = Domain::with_arity(2).unwrap();
    let parent: Vec<i32> = (0..24).map(|r| (r % 2) as i32).collect();
    let data = NodeData::new(
        Array1::from(parent.clone()),
        Array2::from_shape_vec((24, 1), parent).unwrap(),
        d2,
        vec![d2],
    )
    .unwrap();
    let learner = LogitLearner::default();

    // Act
    let fit = learner.parameterize(&data).unwrap();
    let cost = learner.cost(&fit.model, &fit.stats, &fit.params).unwrap();

    // Assert
    let cap = learner.options().param_cap;
    let all = fit.params.c.iter().chain(fit.params.d.iter().flat_map(|t| t.iter()));
    for &v in all {
        assert!(v.is_finite() && v.abs() <= cap + 1e-9, "parameter {v} escaped the cap");
    }
    for x in 0..2 {
        assert_eq!(fit.model.predict(&[x], &fit.params).unwrap(), x);
        assert!(fit.model.log_probability(x, &[x], &fit.params).unwrap().exp() > 0.9);
    }
    assert!(cost.is_finite());
}

#[test]
// Purpose
// -------
// Ensure the CPT capacity check fires before any data pass and is flagged
// as infeasible.
//
// Given
// -----
// - Three parents of arity 50 (125 000 combinations) and a binary child.
//
// Expect
// ------
// - `ExcessiveCombinations { combinations: 125_000, child_arity: 2,
//   max_cells: 64_000 }` from both the fused and split paths.
fn cpt_capacity_error_precedes_statistics() {
    // Arrange
    let d50 = Domain::with_arity(50).unwrap();
    let data = NodeData::new(
        array![0, 1],
        array![[0, 1, 2], [49, 48, 47]],
        Domain::with_arity(2).unwrap(),
        vec![d50, d50, d50],
    )
    .unwrap();
    let learner = CptLearner::default();

    // Act
    let fused = learner.parameterize_and_cost(&data).unwrap_err();
    let stats = learner.sufficient_statistics(&data).unwrap_err();

    // Assert
    assert!(fused.is_infeasible());
    assert_eq!(fused, stats);
    match fused {
        LearnerError::ExcessiveCombinations { combinations, child_arity, max_cells } => {
            assert_eq!(combinations, 125_000);
            assert_eq!(child_arity, 2);
            assert_eq!(max_cells, 64_000);
        }
        other => panic!("Expected ExcessiveCombinations, got {other:?}"),
    }
}

#[test]
// Purpose
// -------
// Verify that both fitted model families are normalized over the child for
// every parent tuple.
//
// Given
// -----
// - The two-parent dataset (ternary child, parents of arity 3 and 2).
//
// Expect
// ------
// - `Σ_k exp(log_probability(k, tuple)) = 1` within 1e-12 for all six
//   tuples, for CPT and logit.
fn fitted_models_are_normalized() {
    // Arrange
    let (data, _, _) = copy_parent_dataset(36);
    let cpt = CptLearner::default().parameterize(&data).unwrap();
    let logit = LogitLearner::default().parameterize(&data).unwrap();

    // Act / Assert
    for a in 0..3 {
        for b in 0..2 {
            let tuple = [a, b];
            let cpt_total: f64 = (0..3)
                .map(|k| cpt.model.log_probability(k, &tuple, &cpt.params).unwrap().exp())
                .sum();
            let logit_total: f64 = (0..3)
                .map(|k| logit.model.log_probability(k, &tuple, &logit.params).unwrap().exp())
                .sum();
            assert_relative_eq!(cpt_total, 1.0, epsilon = 1e-12);
            assert_relative_eq!(logit_total, 1.0, epsilon = 1e-12);
        }
    }
}

#[test]
// Purpose
// -------
// Verify additivity of both statistics over a disjoint split of rows, and
// that costing merged statistics matches costing the whole dataset.
//
// Given
// -----
// - The two-parent dataset split into even and odd rows.
//
// Expect
// ------
// - `merge(stats(even), stats(odd)) == stats(all)` for CPT and logit.
// - Identical logit costs from merged and whole statistics.
fn statistics_are_additive_over_row_splits() {
    // Arrange
    let (data, _, _) = copy_parent_dataset(36);
    let even: Vec<usize> = (0..36).step_by(2).collect();
    let odd: Vec<usize> = (1..36).step_by(2).collect();
    let (lhs, rhs) = (data.select_rows(&even), data.select_rows(&odd));
    let cpt = CptLearner::default();
    let logit = LogitLearner::default();

    // Act
    let cpt_merged =
        cpt.sufficient_statistics(&lhs).unwrap().merge(&cpt.sufficient_statistics(&rhs).unwrap()).unwrap();
    let logit_merged = logit
        .sufficient_statistics(&lhs)
        .unwrap()
        .merge(&logit.sufficient_statistics(&rhs).unwrap())
        .unwrap();
    let logit_whole = logit.sufficient_statistics(&data).unwrap();

    // Assert
    assert_eq!(cpt_merged, cpt.sufficient_statistics(&data).unwrap());
    assert_eq!(logit_merged, logit_whole);
    let (model, params) = logit.parameterize_statistics(&logit_merged).unwrap();
    let merged_cost = logit.cost(&model, &logit_merged, &params).unwrap();
    assert_eq!(merged_cost, logit.parameterize_and_cost(&data).unwrap());
}

#[test]
// Purpose
// -------
// Verify the logit path is deterministic and reports its fit diagnostics.
//
// Given
// -----
// - The two-parent dataset, fitted twice with default options.
//
// Expect
// ------
// - Bitwise-identical parameters and costs.
// - The aggressive schedule converges without fallback.
fn logit_fit_is_deterministic() {
    // Arrange
    let (data, _, _) = copy_parent_dataset(36);
    let learner = LogitLearner::default();

    // Act
    let first = learner.parameterize(&data).unwrap();
    let second = learner.parameterize(&data).unwrap();
    let report = learner.fit(&first.stats).unwrap();

    // Assert
    assert_eq!(first.params, second.params);
    assert_eq!(
        learner.cost(&first.model, &first.stats, &first.params).unwrap().to_bits(),
        learner.cost(&second.model, &second.stats, &second.params).unwrap().to_bits()
    );
    assert_eq!(report.schedule, ScheduleKind::Aggressive);
    assert!(!report.used_fallback);
    assert!(report.iterations > 0 && report.nll.is_finite());
}

#[test]
// Purpose
// -------
// Verify the single-state shortcut for both families, with parents present.
//
// Given
// -----
// - Child domain [7, 7] with two parents, 10 rows.
//
// Expect
// ------
// - Cost exactly 0 for CPT (ML leaf) and logit.
fn single_state_child_costs_zero() {
    // Arrange
    let parents = Array2::from_shape_fn((10, 2), |(r, c)| ((r + c) % 3) as i32);
    let d3 = Domain::with_arity(3).unwrap();
    let data =
        NodeData::new(Array1::from_elem(10, 7), parents, Domain::new(7, 7).unwrap(), vec![d3, d3])
            .unwrap();
    let cpt = CptLearner::new(MlMultinomialLearner::new(), CptOptions::default());

    // Act
    let cpt_cost = cpt.parameterize_and_cost(&data).unwrap();
    let logit_cost = LogitLearner::default().parameterize_and_cost(&data).unwrap();

    // Assert
    assert_eq!(cpt_cost, 0.0);
    assert_eq!(logit_cost, 0.0);
}

#[test]
// Purpose
// -------
// Score competing parent sets through boxed learners built from
// configuration.
//
// Given
// -----
// - CPT (MML adaptive) and logit configurations.
// - Parent sets {A} (child copies A up to noise) and {B} (unrelated).
//
// Expect
// ------
// - Both learners prefer {A}.
// - A logit parent of arity 21 fails with an infeasible `ArityTooHigh`.
fn boxed_learners_rank_parent_sets() {
    // Arrange
    let (_, only_a, only_b) = copy_parent_dataset(48);
    let learners: Vec<Box<dyn NodeCoster>> = [
        LearnerConfig::Cpt { options: CptOptions::default(), leaf: LeafConfig::mml_adaptive() },
        LearnerConfig::Logit(LogitOptions::default()),
    ]
    .iter()
    .map(|config| build_learner(config).unwrap())
    .collect();
    let wide = NodeData::new(
        array![0, 1, 0],
        array![[0], [20], [5]],
        Domain::with_arity(2).unwrap(),
        vec![Domain::with_arity(21).unwrap()],
    )
    .unwrap();

    // Act
    let scores: Vec<(f64, f64)> = learners
        .iter()
        .map(|l| (l.node_cost(&only_a).unwrap(), l.node_cost(&only_b).unwrap()))
        .collect();
    let err = learners[1].node_cost(&wide).unwrap_err();

    // Assert
    for (learner, (a, b)) in learners.iter().zip(&scores) {
        assert!(a < b, "{} scored {{A}} = {a} >= {{B}} = {b}", learner.name());
    }
    assert!(err.is_infeasible());
    match err {
        LearnerError::ArityTooHigh { column, arity, max_arity } => {
            assert_eq!(column, Column::Parent(0));
            assert_eq!(arity, 21);
            assert_eq!(max_arity, 20);
        }
        other => panic!("Expected ArityTooHigh, got {other:?}"),
    }
}

#[test]
// Purpose
// -------
// Tie the ML leaf cost to the model log-likelihood and check row sampling.
//
// Given
// -----
// - The two-parent dataset under an ML-leaf CPT; a seeded RNG.
//
// Expect
// ------
// - `cost = −log_likelihood(data)`.
// - `generate_rows` yields one in-domain value per row and is reproducible
//   for a fixed seed.
fn ml_cpt_cost_is_negative_log_likelihood() {
    // Arrange
    let (data, _, _) = copy_parent_dataset(36);
    let learner = CptLearner::new(MlMultinomialLearner::new(), CptOptions::default());
    let fit = learner.parameterize(&data).unwrap();

    // Act
    let cost = learner.cost(&fit.model, &fit.stats, &fit.params).unwrap();
    let ll = fit.model.log_likelihood(&data, &fit.params).unwrap();
    let draws1 =
        fit.model.generate_rows(&mut StdRng::seed_from_u64(9), data.parents(), &fit.params).unwrap();
    let draws2 =
        fit.model.generate_rows(&mut StdRng::seed_from_u64(9), data.parents(), &fit.params).unwrap();

    // Assert
    assert_relative_eq!(cost, -ll, epsilon = 1e-9);
    assert_eq!(draws1.len(), data.rows());
    assert!(draws1.iter().all(|v| (0..3).contains(v)));
    assert_eq!(draws1, draws2);
}

#[test]
// Purpose
// -------
// Verify that the leaf choice changes the CPT cost but not the statistics it
// is computed from.
//
// Given
// -----
// - The two-parent dataset (6 cells, ternary child) under the plain and the
//   MML-corrected adaptive leaves.
//
// Expect
// ------
// - Equal statistics.
// - Costs differ by exactly `6 · (3 − 1) · 0.17649`, empty cells included.
fn leaf_choice_changes_cost_only() {
    // Arrange
    let (data, _, _) = copy_parent_dataset(36);
    let plain = CptLearner::new(AdaptiveCodeLearner::adaptive(), CptOptions::default());
    let mml = CptLearner::new(AdaptiveCodeLearner::mml_adaptive(), CptOptions::default());

    // Act
    let plain_stats = plain.sufficient_statistics(&data).unwrap();
    let mml_stats = mml.sufficient_statistics(&data).unwrap();
    let plain_cost = plain.parameterize_and_cost(&data).unwrap();
    let mml_cost = mml.parameterize_and_cost(&data).unwrap();

    // Assert
    assert_eq!(plain_stats, mml_stats);
    assert_relative_eq!(mml_cost - plain_cost, 6.0 * 2.0 * 0.17649, epsilon = 1e-9);
}

#[test]
// Purpose
// -------
// Verify that a two-level table (parent A outside, parent B in a nested
// leaf) scores and evaluates like the flat table over both parents.
//
// Given
// -----
// - The two-parent dataset with ML leaves, flat and nested.
//
// Expect
// ------
// - Equal costs; the nested fit's log-likelihood is minus its cost.
fn nested_leaf_matches_flat_two_parent_table() {
    // Arrange
    let (data, _, _) = copy_parent_dataset(36);
    let flat = CptLearner::new(MlMultinomialLearner::new(), CptOptions::default());
    let nested = CptLearner::new(
        NestedCptLearner::new(CptLearner::new(MlMultinomialLearner::new(), CptOptions::default())),
        CptOptions::default().with_indexed_parents(1),
    );

    // Act
    let flat_cost = flat.parameterize_and_cost(&data).unwrap();
    let nested_cost = nested.parameterize_and_cost(&data).unwrap();
    let fit = nested.parameterize(&data).unwrap();
    let ll = fit.model.log_likelihood(&data, &fit.params).unwrap();

    // Assert
    assert_relative_eq!(nested_cost, flat_cost, epsilon = 1e-9);
    assert_relative_eq!(ll, -nested_cost, epsilon = 1e-9);
}
