//! Logit learner — sufficient statistics, Newton fit, and MML cost.
//!
//! Purpose
//! -------
//! Implement the learner contract for the multinomial logistic regression
//! model: build co-occurrence statistics, fit MAP parameters with the
//! Newton-Raphson estimator, and cost them with the MML formula.
//!
//! Key behaviors
//! -------------
//! - A child with a single state fits empty (all-zero) parameters and costs
//!   exactly 0; `parameterize_and_cost` returns 0 without reading the data.
//! - Arity and cell caps are enforced when statistics are built.
//! - [`LogitLearner::fit`] exposes the full [`LogitFit`] record and
//!   [`LogitLearner::cost_breakdown`] the cost components.
use crate::{
    data::node_data::NodeData,
    learner::{
        errors::{LearnerError, LearnerResult},
        traits::ModelLearner,
    },
    logit::{
        cost::{MmlBreakdown, mml_cost},
        estimator::{LogitFit, estimate},
        model::{LogitModel, LogitParams},
        options::LogitOptions,
        stats::LogitStats,
    },
};
use tracing::debug;

/// LogitLearner — logit parameterization and costing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LogitLearner {
    options: LogitOptions,
}

impl LogitLearner {
    pub fn new(options: LogitOptions) -> Self {
        LogitLearner { options }
    }

    pub fn options(&self) -> &LogitOptions {
        &self.options
    }

    /// Fit parameters and report how the estimator got there.
    ///
    /// Errors
    /// ------
    /// - `LearnerError::SingularFisher` / `LearnerError::ConvergenceFailure`
    ///   from the estimator.
    pub fn fit(&self, stats: &LogitStats) -> LearnerResult<LogitFit> {
        if stats.child_domain().arity() <= 1 {
            return Ok(LogitFit {
                params: LogitParams::zeros(stats.child_domain().arity(), &stats.parent_arities()),
                iterations: 0,
                schedule: self.options.aggressive.kind,
                nll: 0.0,
                used_fallback: false,
                aggressive_iters: 0,
            });
        }
        estimate(stats, &self.options)
    }

    /// Components of the message length of `params`.
    pub fn cost_breakdown(
        &self, model: &LogitModel, stats: &LogitStats, params: &LogitParams,
    ) -> LearnerResult<MmlBreakdown> {
        if model.indexer() != stats.indexer() {
            return Err(LearnerError::ParamShapeMismatch {
                what: "logit parent combinations",
                expected: model.indexer().combinations(),
                found: stats.indexer().combinations(),
            });
        }
        model.check_params(params)?;
        if stats.child_domain().arity() <= 1 {
            return Ok(MmlBreakdown::default());
        }
        mml_cost(stats, params, &self.options)
    }
}

impl ModelLearner for LogitLearner {
    type Model = LogitModel;
    type Stats = LogitStats;
    type Params = LogitParams;

    fn name(&self) -> &'static str {
        "Logit"
    }

    fn sufficient_statistics(&self, data: &NodeData) -> LearnerResult<LogitStats> {
        LogitStats::from_data(data, &self.options)
    }

    fn parameterize_statistics(&self, stats: &LogitStats) -> LearnerResult<(LogitModel, LogitParams)> {
        let fit = self.fit(stats)?;
        let model = LogitModel::new(stats.indexer().clone(), stats.child_domain());
        Ok((model, fit.params))
    }

    fn cost(&self, model: &LogitModel, stats: &LogitStats, params: &LogitParams) -> LearnerResult<f64> {
        Ok(self.cost_breakdown(model, stats, params)?.total())
    }

    fn parameterize_and_cost(&self, data: &NodeData) -> LearnerResult<f64> {
        if data.child_domain().arity() <= 1 {
            return Ok(0.0);
        }
        let stats = self.sufficient_statistics(data)?;
        let fit = self.fit(&stats)?;
        let cost = mml_cost(&stats, &fit.params, &self.options)?;
        debug!(
            parents = data.num_parents(),
            iterations = fit.iterations,
            fallback = fit.used_fallback,
            prior = cost.prior,
            fisher = cost.fisher,
            likelihood = cost.likelihood,
            lattice = cost.lattice,
            "logit cost"
        );
        Ok(cost.total())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{data::domain::Domain, learner::traits::LocalModel};
    use approx::assert_relative_eq;
    use ndarray::{Array1, Array2};

    #[test]
    // Purpose
    // -------
    // Verify that a single-state child costs nothing.
    //
    // Given
    // -----
    // - Child domain [4, 4] with one binary parent, 5 rows.
    //
    // Expect
    // ------
    // - `parameterize_and_cost = 0`, `cost = 0`, `log_probability = 0`.
    fn logit_unary_child_costs_zero() {
        // Arrange
        let d2 = Domain::with_arity(2).unwrap();
        let data = NodeData::new(
            Array1::from_elem(5, 4),
            Array2::from_shape_vec((5, 1), vec![0, 1, 0, 1, 1]).unwrap(),
            Domain::new(4, 4).unwrap(),
            vec![d2],
        )
        .unwrap();
        let learner = LogitLearner::default();

        // Act
        let fused = learner.parameterize_and_cost(&data).unwrap();
        let fit = learner.parameterize(&data).unwrap();
        let split = learner.cost(&fit.model, &fit.stats, &fit.params).unwrap();

        // Assert
        assert_eq!(fused, 0.0);
        assert_eq!(split, 0.0);
        assert_eq!(fit.model.log_probability(4, &[1], &fit.params).unwrap(), 0.0);
        assert_eq!(fit.model.num_params(&fit.params), 0);
    }

    #[test]
    // Purpose
    // -------
    // Verify that the fused and split paths agree and that the fitted model
    // normalizes.
    //
    // Given
    // -----
    // - Ternary child with one ternary parent, 30 rows with a noisy
    //   identity relation.
    //
    // Expect
    // ------
    // - `parameterize_and_cost == cost(parameterize)`; distributions sum
    //   to 1; `num_params = 2 · 3 = 6`.
    fn logit_fused_and_split_costs_agree() {
        // Arrange
        let d3 = Domain::with_arity(3).unwrap();
        let parent: Vec<i32> = (0..30).map(|r| (r % 3) as i32).collect();
        let child: Vec<i32> =
            parent.iter().enumerate().map(|(r, &v)| if r % 7 == 0 { (v + 1) % 3 } else { v }).collect();
        let data = NodeData::new(
            Array1::from(child),
            Array2::from_shape_vec((30, 1), parent).unwrap(),
            d3,
            vec![d3],
        )
        .unwrap();
        let learner = LogitLearner::default();

        // Act
        let fused = learner.parameterize_and_cost(&data).unwrap();
        let fit = learner.parameterize(&data).unwrap();
        let split = learner.cost(&fit.model, &fit.stats, &fit.params).unwrap();

        // Assert
        assert_relative_eq!(fused, split, epsilon = 1e-12);
        for x in 0..3 {
            let total: f64 =
                (0..3).map(|k| fit.model.log_probability(k, &[x], &fit.params).unwrap().exp()).sum();
            assert_relative_eq!(total, 1.0, epsilon = 1e-12);
            assert_eq!(fit.model.predict(&[x], &fit.params).unwrap(), x);
        }
        assert_eq!(fit.model.num_params(&fit.params), 6);
        assert!(fused > 0.0);
    }

    #[test]
    // Purpose
    // -------
    // Ensure parameters of another shape are rejected by `cost`.
    //
    // Given
    // -----
    // - A fit with one ternary parent and parameters for a binary parent.
    //
    // Expect
    // ------
    // - `ParamShapeMismatch` for the offset table.
    fn logit_cost_rejects_foreign_params() {
        // Arrange
        let d3 = Domain::with_arity(3).unwrap();
        let data = NodeData::new(
            Array1::from(vec![0, 1, 2, 1]),
            Array2::from_shape_vec((4, 1), vec![0, 1, 2, 2]).unwrap(),
            d3,
            vec![d3],
        )
        .unwrap();
        let learner = LogitLearner::default();
        let fit = learner.parameterize(&data).unwrap();
        let foreign = LogitParams::zeros(3, &[2]);

        // Act
        let err = learner.cost(&fit.model, &fit.stats, &foreign).unwrap_err();

        // Assert
        match err {
            LearnerError::ParamShapeMismatch { expected, found, .. } => {
                assert_eq!(expected, 9);
                assert_eq!(found, 6);
            }
            other => panic!("Expected ParamShapeMismatch, got {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // Ensure the arity cap is enforced before the fit.
    //
    // Given
    // -----
    // - A 21-state child.
    //
    // Expect
    // ------
    // - `ArityTooHigh` from `parameterize_and_cost`.
    fn logit_rejects_high_arity_child() {
        // Arrange
        let data = NodeData::without_parents(
            Array1::from(vec![0, 20]),
            Domain::with_arity(21).unwrap(),
        )
        .unwrap();

        // Act
        let err = LogitLearner::default().parameterize_and_cost(&data).unwrap_err();

        // Assert
        assert!(matches!(err, LearnerError::ArityTooHigh { arity: 21, .. }));
    }
}
