//! MML message length of a fitted logit model.
//!
//! Purpose
//! -------
//! Cost fitted parameters as a two-part message: a Gaussian parameter prior,
//! the Fisher-information quantization term, the negative log-likelihood of
//! the data, and the lattice constant.
//!
//! With `P` free parameters, child arity `m`, parent arities `a_i` (`q`
//! parents), prior sd σ, and `Σθ²` over every parameter:
//!
//! - prior: `P (½ ln 2π + ln σ) + ½ (−ln m · (1 + Σ a_i − q)
//!   − (m − 1) Σ ln a_i + Σθ² / σ²)`;
//! - fisher: `½ ln det F`, with the prior curvature included in `F`;
//! - likelihood: NLL at the fitted parameters;
//! - lattice: `−P · ½ ln 2π + ½ (ln P + ln π)`.
//!
//! A fit with no free parameters costs exactly 0.
use crate::{
    learner::errors::LearnerResult,
    logit::{
        cholesky::CholeskyFactor,
        estimator::FitContext,
        model::LogitParams,
        options::LogitOptions,
        stats::LogitStats,
        sums::accumulate,
    },
};
use std::f64::consts::PI;

/// MmlBreakdown — components of the logit message length, in nits.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MmlBreakdown {
    pub prior: f64,
    pub fisher: f64,
    pub likelihood: f64,
    pub lattice: f64,
}

impl MmlBreakdown {
    pub fn total(&self) -> f64 {
        self.prior + self.fisher + self.likelihood + self.lattice
    }
}

/// Message length of `params` against `stats`.
///
/// Errors
/// ------
/// - `LearnerError::SingularFisher` (iteration 0) when the Fisher matrix at
///   `params` is not positive definite.
pub fn mml_cost(
    stats: &LogitStats, params: &LogitParams, options: &LogitOptions,
) -> LearnerResult<MmlBreakdown> {
    let ctx = FitContext::new(stats, options);
    let nfree = ctx.layout.nfree();
    if nfree == 0 {
        return Ok(MmlBreakdown::default());
    }

    let tau = options.prior_precision();
    let sums = accumulate(&ctx.present, &ctx.layout, params, tau, true);
    let factor =
        CholeskyFactor::factor(sums.fisher.view()).map_err(|e| ctx.cholesky_failure(e, 0))?;

    let p = nfree as f64;
    let child_arity = stats.child_domain().arity() as f64;
    let parent_arities = stats.parent_arities();
    let arity_sum: f64 = parent_arities.iter().map(|&a| a as f64).sum();
    let log_arity_sum: f64 = parent_arities.iter().map(|&a| (a as f64).ln()).sum();
    let half_ln_2pi = 0.5 * (2.0 * PI).ln();

    let prior = p * (half_ln_2pi + options.prior_sd.ln())
        + 0.5
            * (-child_arity.ln() * (1.0 + arity_sum - parent_arities.len() as f64)
                - (child_arity - 1.0) * log_arity_sum
                + params.sum_of_squares() * tau);
    let fisher = 0.5 * factor.log_det();
    let lattice = -p * half_ln_2pi + 0.5 * (p.ln() + PI.ln());

    Ok(MmlBreakdown { prior, fisher, likelihood: sums.nll, lattice })
}
