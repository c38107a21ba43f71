//! Adaptive-code multinomial learner.
//!
//! Purpose
//! -------
//! Cost a CPT cell by the length of an adaptive (sequential Bayesian) code for
//! its child tally, optionally with the MML lattice correction, and report
//! smoothed point estimates as parameters.
//!
//! Key behaviors
//! -------------
//! - Parameters: `p_i = (n_i + bias) / (N + m·bias)`.
//! - Cost ignores the parameters:
//!   `−Σ ln n_i! + ln (N+m−1)! − ln (m−1)!`, plus `(m−1)·0.17649` when
//!   `use_mml` is set.
//! - Four preset configurations are exposed as constructors.
//!
//! Conventions
//! -----------
//! - `m` is the child arity and `N` the number of rows in the cell.
//! - Log factorials use `statrs::function::factorial::ln_factorial`.
use crate::{
    data::domain::Domain,
    leaf::{multinomial::MultinomialModel, traits::{CellData, LeafLearner}},
    learner::errors::{LearnerError, LearnerResult},
};
use ndarray::{Array1, ArrayView1};
use statrs::function::factorial::ln_factorial;

/// Per-free-parameter MML correction, `½ ln(πe/6)`.
pub const MML_CORRECTION: f64 = 0.17649;

/// AdaptiveCodeLearner — adaptive-code cost with `(n + bias)` smoothing.
///
/// Fields
/// ------
/// - `bias`: pseudo-count added to every child state (> 0, finite).
/// - `use_mml`: add the `(m−1)·0.17649` lattice correction to the cost.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdaptiveCodeLearner {
    bias: f64,
    use_mml: bool,
}

impl AdaptiveCodeLearner {
    /// Errors
    /// ------
    /// - `LearnerError::InvalidOption` when `bias` is not finite and > 0.
    pub fn new(bias: f64, use_mml: bool) -> LearnerResult<Self> {
        if !bias.is_finite() || bias <= 0.0 {
            return Err(LearnerError::InvalidOption {
                name: "bias",
                value: bias,
                reason: "bias must be finite and > 0",
            });
        }
        Ok(AdaptiveCodeLearner { bias, use_mml })
    }

    /// `(n + 0.5)` smoothing, plain adaptive cost.
    pub fn adaptive() -> Self {
        AdaptiveCodeLearner { bias: 0.5, use_mml: false }
    }

    /// `(n + 0.5)` smoothing with the MML correction.
    pub fn mml_adaptive() -> Self {
        AdaptiveCodeLearner { bias: 0.5, use_mml: true }
    }

    /// `(n + 1)` smoothing, plain adaptive cost.
    pub fn adaptive2() -> Self {
        AdaptiveCodeLearner { bias: 1.0, use_mml: false }
    }

    /// `(n + 1)` smoothing with the MML correction.
    pub fn mml_adaptive2() -> Self {
        AdaptiveCodeLearner { bias: 1.0, use_mml: true }
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    pub fn use_mml(&self) -> bool {
        self.use_mml
    }

    /// Adaptive-code length of a tally.
    pub fn code_length(&self, counts: ArrayView1<u64>) -> f64 {
        let m = counts.len() as u64;
        let total: u64 = counts.sum();
        let mut cost = -counts.iter().map(|&n| ln_factorial(n)).sum::<f64>();
        cost += ln_factorial(total + m - 1);
        cost -= ln_factorial(m - 1);
        if self.use_mml {
            cost += (m - 1) as f64 * MML_CORRECTION;
        }
        cost
    }
}

impl Default for AdaptiveCodeLearner {
    fn default() -> Self {
        AdaptiveCodeLearner::mml_adaptive()
    }
}

/// Smoothed estimate `(n_i + bias) / (N + m·bias)`.
pub(crate) fn smoothed_probabilities(counts: ArrayView1<u64>, bias: f64) -> Array1<f64> {
    let total = counts.sum() as f64 + counts.len() as f64 * bias;
    counts.mapv(|n| (n as f64 + bias) / total)
}

impl LeafLearner for AdaptiveCodeLearner {
    type Model = MultinomialModel;
    type Stats = Array1<u64>;
    type Params = Array1<f64>;

    fn name(&self) -> &'static str {
        "AdaptiveCode"
    }

    fn leaf_statistics(&self, cell: &CellData<'_>) -> LearnerResult<Array1<u64>> {
        Ok(cell.counts().to_owned())
    }

    fn parameterize(
        &self, domain: Domain, stats: &Array1<u64>,
    ) -> LearnerResult<(MultinomialModel, Array1<f64>)> {
        Ok((MultinomialModel::new(domain), smoothed_probabilities(stats.view(), self.bias)))
    }

    fn cost(
        &self, _model: &MultinomialModel, stats: &Array1<u64>, _params: &Array1<f64>,
    ) -> LearnerResult<f64> {
        Ok(self.code_length(stats.view()))
    }

    fn parameterize_and_cost(&self, _domain: Domain, stats: &Array1<u64>) -> LearnerResult<f64> {
        Ok(self.code_length(stats.view()))
    }
}
