//! Multinomial leaf model shared by the multinomial cell learners.
//!
//! Purpose
//! -------
//! Evaluate and sample a categorical distribution over a discrete child
//! domain. The adaptive-code, maximum-likelihood, and MML87 learners all
//! produce a [`MultinomialModel`] and differ only in how they estimate the
//! probabilities and cost the cell.
//!
//! Key behaviors
//! -------------
//! - `log_probability` returns `ln p[state]`.
//! - `predict` returns the first most probable value.
//! - `generate` samples with `rand::distributions::WeightedIndex`.
//! - [`validate_probabilities`] checks an explicit probability vector.
//!
//! Invariants & assumptions
//! ------------------------
//! - Parameters are a probability vector of length `domain.arity()` that sums
//!   to 1; learners in this crate always produce such vectors.
use crate::{
    data::{domain::Domain, errors::Column},
    leaf::traits::LeafModel,
    learner::errors::{LearnerError, LearnerResult},
};
use ndarray::{Array1, ArrayView1};
use rand::{Rng, distributions::Distribution, distributions::WeightedIndex};

/// Tolerance on `|Σ p - 1|` for explicit probability vectors.
pub const PROBABILITY_SUM_TOL: f64 = 1e-9;

/// MultinomialModel — categorical distribution over `domain`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultinomialModel {
    domain: Domain,
}

impl MultinomialModel {
    pub fn new(domain: Domain) -> Self {
        MultinomialModel { domain }
    }

    fn check_len(&self, params: &Array1<f64>) -> LearnerResult<()> {
        if params.len() != self.domain.arity() {
            return Err(LearnerError::ParamShapeMismatch {
                what: "multinomial probabilities",
                expected: self.domain.arity(),
                found: params.len(),
            });
        }
        Ok(())
    }
}

impl LeafModel for MultinomialModel {
    type Params = Array1<f64>;

    fn domain(&self) -> Domain {
        self.domain
    }

    fn log_probability(
        &self, value: i32, _context: &[i32], params: &Array1<f64>,
    ) -> LearnerResult<f64> {
        self.check_len(params)?;
        let state = self.domain.state(value, Column::Child, None)?;
        Ok(params[state].ln())
    }

    fn predict(&self, _context: &[i32], params: &Array1<f64>) -> LearnerResult<i32> {
        self.check_len(params)?;
        Ok(self.domain.state_value(argmax(params.view())))
    }

    fn generate<R: Rng + ?Sized>(
        &self, rng: &mut R, n: usize, _context: &[i32], params: &Array1<f64>,
    ) -> LearnerResult<Vec<i32>> {
        self.check_len(params)?;
        let states = draw_states(rng, params.view(), n)?;
        Ok(states.into_iter().map(|s| self.domain.state_value(s)).collect())
    }

    fn num_params(&self, _params: &Array1<f64>) -> usize {
        self.domain.arity() - 1
    }
}

/// Index of the first maximal entry.
pub(crate) fn argmax(values: ArrayView1<f64>) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Draw `n` states from unnormalized non-negative `weights`.
///
/// Errors
/// ------
/// - `LearnerError::InvalidDistribution` when the weights are empty, contain
///   a negative or non-finite entry, or sum to zero.
pub(crate) fn draw_states<R: Rng + ?Sized>(
    rng: &mut R, weights: ArrayView1<f64>, n: usize,
) -> LearnerResult<Vec<usize>> {
    let dist = WeightedIndex::new(weights.iter().copied()).map_err(|_| {
        LearnerError::InvalidDistribution {
            reason: "weights must be finite, non-negative, and not all zero",
        }
    })?;
    Ok((0..n).map(|_| dist.sample(rng)).collect())
}

/// Validate an explicit probability vector for a cell.
///
/// Errors
/// ------
/// - `LearnerError::ParamShapeMismatch` when `probs.len() != arity`.
/// - `LearnerError::InvalidProbabilities` when an entry is negative or
///   non-finite, or the entries do not sum to 1 within
///   [`PROBABILITY_SUM_TOL`].
pub fn validate_probabilities(probs: ArrayView1<f64>, arity: usize, cell: usize) -> LearnerResult<()> {
    if probs.len() != arity {
        return Err(LearnerError::ParamShapeMismatch {
            what: "cell probabilities",
            expected: arity,
            found: probs.len(),
        });
    }
    if probs.iter().any(|&p| !p.is_finite() || p < 0.0) {
        return Err(LearnerError::InvalidProbabilities {
            cell,
            reason: "entries must be finite and non-negative",
        });
    }
    if (probs.sum() - 1.0).abs() > PROBABILITY_SUM_TOL {
        return Err(LearnerError::InvalidProbabilities { cell, reason: "entries must sum to 1" });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    // Purpose
    // -------
    // Verify log-probability, mode, and sampling support on a shifted domain.
    //
    // Given
    // -----
    // - Domain [1, 3] with probabilities (0.2, 0.5, 0.3).
    //
    // Expect
    // ------
    // - `log_probability(2) = ln 0.5`, `predict = 2`, draws lie in [1, 3].
    fn multinomial_model_evaluates_on_shifted_domain() {
        // Arrange
        let model = MultinomialModel::new(Domain::new(1, 3).unwrap());
        let params = array![0.2, 0.5, 0.3];
        let mut rng = StdRng::seed_from_u64(7);

        // Act
        let lp = model.log_probability(2, &[], &params).unwrap();
        let mode = model.predict(&[], &params).unwrap();
        let draws = model.generate(&mut rng, 200, &[], &params).unwrap();

        // Assert
        assert!((lp - 0.5f64.ln()).abs() < 1e-15);
        assert_eq!(mode, 2);
        assert_eq!(draws.len(), 200);
        assert!(draws.iter().all(|&v| (1..=3).contains(&v)));
        assert_eq!(model.num_params(&params), 2);
    }

    #[test]
    // Purpose
    // -------
    // Ensure a zero-probability state is never drawn.
    //
    // Given
    // -----
    // - Domain [0, 2] with probabilities (0.5, 0.0, 0.5).
    //
    // Expect
    // ------
    // - No draw equals 1.
    fn multinomial_generate_skips_zero_probability_state() {
        // Arrange
        let model = MultinomialModel::new(Domain::with_arity(3).unwrap());
        let mut rng = StdRng::seed_from_u64(11);

        // Act
        let draws = model.generate(&mut rng, 500, &[], &array![0.5, 0.0, 0.5]).unwrap();

        // Assert
        assert!(draws.iter().all(|&v| v != 1));
    }

    #[test]
    // Purpose
    // -------
    // Ensure explicit probability vectors are validated.
    //
    // Given
    // -----
    // - A vector not summing to 1, one with a negative entry, one too short.
    //
    // Expect
    // ------
    // - `InvalidProbabilities`, `InvalidProbabilities`, `ParamShapeMismatch`.
    fn validate_probabilities_rejects_bad_vectors() {
        // Act
        let sum = validate_probabilities(array![0.5, 0.6].view(), 2, 4).unwrap_err();
        let neg = validate_probabilities(array![1.5, -0.5].view(), 2, 4).unwrap_err();
        let len = validate_probabilities(array![1.0].view(), 2, 4).unwrap_err();

        // Assert
        assert!(matches!(sum, LearnerError::InvalidProbabilities { cell: 4, .. }));
        assert!(matches!(neg, LearnerError::InvalidProbabilities { cell: 4, .. }));
        assert!(matches!(len, LearnerError::ParamShapeMismatch { expected: 2, found: 1, .. }));
    }
}
