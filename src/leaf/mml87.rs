//! MML87 multinomial learner (Wallace–Freeman approximation).
//!
//! Purpose
//! -------
//! Estimate a cell's child distribution with the MML87 point estimate and
//! cost it with the two-part Wallace–Freeman message length.
//!
//! Key behaviors
//! -------------
//! - Parameters: `p_i = (n_i + ½) / (N + m/2)`.
//! - Cost for `N > 0`:
//!   `½ ln(1 + F / (12^{m−1} h²)) + ½ m ln 2 − Σ n_i ln p_i`, with
//!   `h = (m−1)!` and `F = N^{m−1} / Π p_i`.
//! - Cost 0 for an empty cell.
//!
//! Conventions
//! -----------
//! - `F / (12^{m−1} h²)` is evaluated in log space so large arities and
//!   counts do not overflow.
use crate::{
    data::domain::Domain,
    leaf::{
        adaptive::smoothed_probabilities, ml::tally_nll, multinomial::MultinomialModel,
        traits::{CellData, LeafLearner},
    },
    learner::errors::{LearnerError, LearnerResult},
};
use ndarray::{Array1, ArrayView1};
use statrs::function::factorial::ln_factorial;

/// Pseudo-count of the MML87 estimate.
pub const MML87_BIAS: f64 = 0.5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Mml87MultinomialLearner;

impl Mml87MultinomialLearner {
    pub fn new() -> Self {
        Mml87MultinomialLearner
    }

    /// Wallace–Freeman message length of `counts` under `probs`.
    pub fn message_length(counts: ArrayView1<u64>, probs: ArrayView1<f64>) -> f64 {
        let total = counts.sum();
        if total == 0 {
            return 0.0;
        }
        let m = counts.len();
        let free = (m - 1) as f64;
        let ln_fisher = free * (total as f64).ln() - probs.iter().map(|p| p.ln()).sum::<f64>();
        let ln_lattice = free * 12f64.ln() + 2.0 * ln_factorial((m - 1) as u64);
        0.5 * ln_1p_exp(ln_fisher - ln_lattice)
            + 0.5 * m as f64 * std::f64::consts::LN_2
            + tally_nll(counts, probs)
    }
}

/// `ln(1 + e^x)` without overflow.
fn ln_1p_exp(x: f64) -> f64 {
    if x > 35.0 { x + (-x).exp().ln_1p() } else { x.exp().ln_1p() }
}

impl LeafLearner for Mml87MultinomialLearner {
    type Model = MultinomialModel;
    type Stats = Array1<u64>;
    type Params = Array1<f64>;

    fn name(&self) -> &'static str {
        "Mml87Multinomial"
    }

    fn leaf_statistics(&self, cell: &CellData<'_>) -> LearnerResult<Array1<u64>> {
        Ok(cell.counts().to_owned())
    }

    fn parameterize(
        &self, domain: Domain, stats: &Array1<u64>,
    ) -> LearnerResult<(MultinomialModel, Array1<f64>)> {
        Ok((MultinomialModel::new(domain), smoothed_probabilities(stats.view(), MML87_BIAS)))
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
        Ok(Self::message_length(stats.view(), params.view()))
    }
}
