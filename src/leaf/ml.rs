//! Maximum-likelihood multinomial learner.
//!
//! Parameters are the empirical frequencies `n_i / N` and the cost is the
//! negative log-likelihood `−Σ_{n_i > 0} n_i ln p_i`; no parameter-precision
//! term is charged. An empty cell gets the uniform distribution and cost 0.
use crate::{
    data::domain::Domain,
    leaf::{multinomial::MultinomialModel, traits::{CellData, LeafLearner}},
    learner::errors::{LearnerError, LearnerResult},
};
use ndarray::{Array1, ArrayView1};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MlMultinomialLearner;

impl MlMultinomialLearner {
    pub fn new() -> Self {
        MlMultinomialLearner
    }
}

/// Negative log-likelihood of a tally, skipping empty states.
pub(crate) fn tally_nll(counts: ArrayView1<u64>, probs: ArrayView1<f64>) -> f64 {
    counts
        .iter()
        .zip(probs.iter())
        .filter(|&(&n, _)| n != 0)
        .map(|(&n, &p)| -(n as f64) * p.ln())
        .sum()
}

impl LeafLearner for MlMultinomialLearner {
    type Model = MultinomialModel;
    type Stats = Array1<u64>;
    type Params = Array1<f64>;

    fn name(&self) -> &'static str {
        "MlMultinomial"
    }

    fn leaf_statistics(&self, cell: &CellData<'_>) -> LearnerResult<Array1<u64>> {
        Ok(cell.counts().to_owned())
    }

    fn parameterize(
        &self, domain: Domain, stats: &Array1<u64>,
    ) -> LearnerResult<(MultinomialModel, Array1<f64>)> {
        let total = stats.sum();
        let params = if total == 0 {
            Array1::from_elem(stats.len(), 1.0 / stats.len() as f64)
        } else {
            stats.mapv(|n| n as f64 / total as f64)
        };
        Ok((MultinomialModel::new(domain), params))
    }

    fn cost(
        &self, _model: &MultinomialModel, stats: &Array1<u64>, params: &Array1<f64>,
    ) -> LearnerResult<f64> {
        if params.len() != stats.len() {
            return Err(LearnerError::ParamShapeMismatch {
                what: "multinomial probabilities",
                expected: stats.len(),
                found: params.len(),
            });
        }
        Ok(tally_nll(stats.view(), params.view()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // Verify ML frequencies and the likelihood cost.
    //
    // Given
    // -----
    // - Ternary tally (2, 0, 2).
    //
    // Expect
    // ------
    // - params (0.5, 0, 0.5); cost `4 ln 2` (the empty state contributes 0).
    fn ml_fit_and_cost_match_frequencies() {
        // Arrange
        let learner = MlMultinomialLearner::new();
        let domain = Domain::with_arity(3).unwrap();
        let stats = array![2u64, 0, 2];

        // Act
        let (model, params) = learner.parameterize(domain, &stats).unwrap();
        let cost = learner.cost(&model, &stats, &params).unwrap();

        // Assert
        assert_eq!(params, array![0.5, 0.0, 0.5]);
        assert_relative_eq!(cost, 4.0 * 2f64.ln(), epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Verify the empty-cell fallback.
    //
    // Given
    // -----
    // - Binary tally (0, 0).
    //
    // Expect
    // ------
    // - Uniform params and zero cost.
    fn ml_empty_cell_is_uniform_and_free() {
        // Arrange
        let learner = MlMultinomialLearner::new();
        let stats = array![0u64, 0];

        // Act
        let cost = learner.parameterize_and_cost(Domain::with_arity(2).unwrap(), &stats).unwrap();
        let (_, params) = learner.parameterize(Domain::with_arity(2).unwrap(), &stats).unwrap();

        // Assert
        assert_eq!(params, array![0.5, 0.5]);
        assert_eq!(cost, 0.0);
    }
}
