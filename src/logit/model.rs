//! Logit model — log-linear conditional distribution over parent states.
//!
//! Purpose
//! -------
//! Evaluate P(child | parents) from intercepts `c[k]` and per-parent-state
//! offsets `d[k][i][x]`:
//! `score[k] = c[k] + Σ_i d[k][i][x_i]`, `ln P(k) = score[k] − logSumExp(score)`.
//!
//! Key behaviors
//! -------------
//! - Log-sum-exp is shifted by the maximum score, so extreme (clamped)
//!   parameters never overflow.
//! - `predict` returns the mode; `generate` samples from the conditional
//!   distribution.
//! - The model performs no estimation.
//!
//! Invariants & assumptions
//! ------------------------
//! - `c.len() == child arity`; `d[i]` has shape `[child arity, arity of
//!   parent i]`.
//! - Fitted parameters satisfy the sum-to-zero constraints over child values
//!   and over each parent's values; explicit parameters need not.
use crate::{
    data::{
        domain::Domain,
        errors::Column,
        indexer::ParentIndexer,
    },
    leaf::multinomial::{argmax, draw_states},
    learner::{
        errors::{LearnerError, LearnerResult},
        traits::LocalModel,
    },
};
use ndarray::{Array1, Array2};
use rand::Rng;

/// LogitParams — intercepts and per-parent offsets.
///
/// Fields
/// ------
/// - `c`: intercept per child state.
/// - `d`: one `[child arity, parent arity]` offset table per parent.
#[derive(Debug, Clone, PartialEq)]
pub struct LogitParams {
    pub c: Array1<f64>,
    pub d: Vec<Array2<f64>>,
}

impl LogitParams {
    /// All-zero parameters for the given arities.
    pub fn zeros(child_arity: usize, parent_arities: &[usize]) -> Self {
        LogitParams {
            c: Array1::zeros(child_arity),
            d: parent_arities.iter().map(|&r| Array2::zeros((child_arity, r))).collect(),
        }
    }

    /// `(arity − 1) · (1 + Σ (parent arity − 1))`.
    pub fn num_params(&self) -> usize {
        let child_arity = self.c.len();
        if child_arity == 0 {
            return 0;
        }
        let per_state: usize = 1 + self.d.iter().map(|t| t.ncols().saturating_sub(1)).sum::<usize>();
        (child_arity - 1) * per_state
    }

    /// Sum of squares over every parameter, dependent ones included.
    pub fn sum_of_squares(&self) -> f64 {
        self.c.iter().map(|v| v * v).sum::<f64>()
            + self.d.iter().flat_map(|t| t.iter()).map(|v| v * v).sum::<f64>()
    }

    /// Scores `c[k] + Σ_i d[i][k, x_i]` for 0-based parent states.
    pub(crate) fn scores(&self, states: &[usize]) -> Array1<f64> {
        let mut scores = self.c.clone();
        for (table, &x) in self.d.iter().zip(states) {
            scores += &table.column(x);
        }
        scores
    }
}

/// Conditional log-probabilities from scores, via shifted log-sum-exp.
pub(crate) fn log_softmax(scores: &Array1<f64>) -> Array1<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let lse = max + scores.iter().map(|s| (s - max).exp()).sum::<f64>().ln();
    scores.mapv(|s| s - lse)
}

/// LogitModel — evaluation of a fitted multinomial logistic regression.
#[derive(Debug, Clone, PartialEq)]
pub struct LogitModel {
    indexer: ParentIndexer,
    child_domain: Domain,
}

impl LogitModel {
    pub fn new(indexer: ParentIndexer, child_domain: Domain) -> Self {
        LogitModel { indexer, child_domain }
    }

    pub fn indexer(&self) -> &ParentIndexer {
        &self.indexer
    }

    /// Arity of each parent, in parent order.
    pub fn parent_arities(&self) -> Vec<usize> {
        self.indexer.domains().iter().map(Domain::arity).collect()
    }

    pub(crate) fn check_params(&self, params: &LogitParams) -> LearnerResult<()> {
        let arity = self.child_domain.arity();
        if params.c.len() != arity {
            return Err(LearnerError::ParamShapeMismatch {
                what: "logit intercepts",
                expected: arity,
                found: params.c.len(),
            });
        }
        if params.d.len() != self.indexer.num_parents() {
            return Err(LearnerError::ParamShapeMismatch {
                what: "logit offset tables",
                expected: self.indexer.num_parents(),
                found: params.d.len(),
            });
        }
        for (table, domain) in params.d.iter().zip(self.indexer.domains()) {
            if table.dim() != (arity, domain.arity()) {
                return Err(LearnerError::ParamShapeMismatch {
                    what: "logit offset table",
                    expected: arity * domain.arity(),
                    found: table.len(),
                });
            }
        }
        Ok(())
    }

    fn parent_states(&self, parents: &[i32]) -> LearnerResult<Vec<usize>> {
        let domains = self.indexer.domains();
        if parents.len() != domains.len() {
            return Err(LearnerError::TupleLengthMismatch {
                expected: domains.len(),
                found: parents.len(),
            });
        }
        parents
            .iter()
            .zip(domains)
            .enumerate()
            .map(|(i, (&v, domain))| Ok(domain.state(v, Column::Parent(i), None)?))
            .collect()
    }

    /// `ln P(k | parents)` for every child state.
    pub fn log_distribution(&self, parents: &[i32], params: &LogitParams) -> LearnerResult<Array1<f64>> {
        self.check_params(params)?;
        let states = self.parent_states(parents)?;
        Ok(log_softmax(&params.scores(&states)))
    }
}

impl LocalModel for LogitModel {
    type Params = LogitParams;

    fn child_domain(&self) -> Domain {
        self.child_domain
    }

    fn log_probability(&self, child: i32, parents: &[i32], params: &LogitParams) -> LearnerResult<f64> {
        let state = self.child_domain.state(child, Column::Child, None)?;
        Ok(self.log_distribution(parents, params)?[state])
    }

    fn predict(&self, parents: &[i32], params: &LogitParams) -> LearnerResult<i32> {
        let log_p = self.log_distribution(parents, params)?;
        Ok(self.child_domain.state_value(argmax(log_p.view())))
    }

    fn generate<R: Rng + ?Sized>(
        &self, rng: &mut R, n: usize, parents: &[i32], params: &LogitParams,
    ) -> LearnerResult<Vec<i32>> {
        let probs = self.log_distribution(parents, params)?.mapv(f64::exp);
        let states = draw_states(rng, probs.view(), n)?;
        Ok(states.into_iter().map(|s| self.child_domain.state_value(s)).collect())
    }

    fn num_params(&self, params: &LogitParams) -> usize {
        params.num_params()
    }
}
