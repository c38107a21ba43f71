//! Normal leaf learner — Gaussian cells with an MML87 cost.
//!
//! Purpose
//! -------
//! Model a CPT cell's child values as draws from a Normal distribution
//! measured to a fixed precision, and cost the cell with the Wallace–Freeman
//! message length under uniform priors on the mean and log-sd ranges.
//!
//! Key behaviors
//! -------------
//! - Statistics are `(n, Σx, Σx²)`, built from the cell tally with each
//!   child state mapped back to its raw value.
//! - Estimates: `μ = Σx/n`, `σ² = ssd/(n−1)` floored at `ε²` (ε² when
//!   `n ≤ 1`), where `ssd = Σx² − (Σx)²/n` is floored at ε².
//! - Cost for `n > 1`: `½ ln(1 + f·lc²/h²) − ll + 1`, with `f = 2n²/σ⁴`,
//!   `h = 1/(σ·μRange·σRange)`, `lc² = (5/(36√3))²`, and
//!   `ll = −n ln σ − ssd/(2σ²) − (n/2) ln 2π + n ln ε`.
//! - Cost for `n ≤ 1`: `ln μRange − ln ε`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Child values are integer codes treated as reals. `log_probability` is a
//!   log density; `predict` and `generate` round to the nearest value and
//!   clamp into the child domain.
//! - An empty cell is centred on the domain midpoint with `σ = ε`.
use crate::{
    data::domain::Domain,
    leaf::traits::{CellData, LeafLearner, LeafModel},
    learner::errors::{LearnerError, LearnerResult},
};
use rand::{Rng, distributions::Distribution};
use statrs::distribution::{Continuous, Normal};
use std::f64::consts::PI;

/// Squared lattice constant term `(5/(36√3))²`.
fn lattice_constant_sq() -> f64 {
    (5.0 / (36.0 * 3f64.sqrt())).powi(2)
}

/// NormalOptions — measurement precision and prior ranges.
///
/// Fields
/// ------
/// - `precision`: measurement accuracy ε (> 0). Default `0.001`.
/// - `mu_range`: width of the uniform prior on the mean (> 0). Default `100`.
/// - `sigma_range`: width of the prior on log σ (> 0). Default `100`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalOptions {
    pub precision: f64,
    pub mu_range: f64,
    pub sigma_range: f64,
}

impl NormalOptions {
    /// Errors
    /// ------
    /// - `LearnerError::InvalidOption` for any non-finite or non-positive field.
    pub fn new(precision: f64, mu_range: f64, sigma_range: f64) -> LearnerResult<Self> {
        for (name, value) in
            [("precision", precision), ("mu_range", mu_range), ("sigma_range", sigma_range)]
        {
            if !value.is_finite() || value <= 0.0 {
                return Err(LearnerError::InvalidOption {
                    name,
                    value,
                    reason: "must be finite and > 0",
                });
            }
        }
        Ok(NormalOptions { precision, mu_range, sigma_range })
    }
}

impl Default for NormalOptions {
    fn default() -> Self {
        NormalOptions { precision: 0.001, mu_range: 100.0, sigma_range: 100.0 }
    }
}

/// Sufficient statistics `(n, Σx, Σx²)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalStats {
    pub n: f64,
    pub sum: f64,
    pub sum_sq: f64,
}

/// Fitted mean and standard deviation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalParams {
    pub mean: f64,
    pub sd: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalModel {
    domain: Domain,
}

impl NormalModel {
    pub fn new(domain: Domain) -> Self {
        NormalModel { domain }
    }

    fn distribution(params: &NormalParams) -> LearnerResult<Normal> {
        Normal::new(params.mean, params.sd).map_err(|_| LearnerError::InvalidDistribution {
            reason: "normal parameters must be finite with sd > 0",
        })
    }

    fn snap(&self, x: f64) -> i32 {
        let lo = f64::from(self.domain.lwb());
        let hi = f64::from(self.domain.upb());
        x.round().clamp(lo, hi) as i32
    }
}

impl LeafModel for NormalModel {
    type Params = NormalParams;

    fn domain(&self) -> Domain {
        self.domain
    }

    fn log_probability(
        &self, value: i32, _context: &[i32], params: &NormalParams,
    ) -> LearnerResult<f64> {
        Ok(Self::distribution(params)?.ln_pdf(f64::from(value)))
    }

    fn predict(&self, _context: &[i32], params: &NormalParams) -> LearnerResult<i32> {
        Ok(self.snap(params.mean))
    }

    fn generate<R: Rng + ?Sized>(
        &self, rng: &mut R, n: usize, _context: &[i32], params: &NormalParams,
    ) -> LearnerResult<Vec<i32>> {
        let dist = Self::distribution(params)?;
        Ok((0..n).map(|_| self.snap(dist.sample(rng))).collect())
    }

    fn num_params(&self, _params: &NormalParams) -> usize {
        2
    }
}

/// NormalLearner — MML87 Normal cell learner.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NormalLearner {
    options: NormalOptions,
}

impl NormalLearner {
    pub fn new(options: NormalOptions) -> Self {
        NormalLearner { options }
    }

    pub fn options(&self) -> NormalOptions {
        self.options
    }

    /// Sum of squared deviations, floored at ε².
    fn ssd(&self, stats: &NormalStats) -> f64 {
        let prec_sq = self.options.precision * self.options.precision;
        if stats.n <= 0.0 {
            return prec_sq;
        }
        let ssd = stats.sum_sq - stats.sum * stats.sum / stats.n;
        if ssd <= 0.0 { prec_sq } else { ssd }
    }

    /// Message length of `stats` in nits.
    pub fn message_length(&self, stats: &NormalStats) -> f64 {
        let NormalOptions { precision, mu_range, sigma_range } = self.options;
        let n = stats.n;
        if n <= 1.0 {
            return mu_range.ln() - precision.ln();
        }
        let ssd = self.ssd(stats);
        let var = (ssd / (n - 1.0)).max(precision * precision);
        let sd = var.sqrt();
        let f = 2.0 * n * n / (var * var);
        let h = 1.0 / (sd * mu_range * sigma_range);
        let ll = -n * sd.ln() - ssd / (2.0 * sd * sd) - 0.5 * n * (2.0 * PI).ln()
            + n * precision.ln();
        0.5 * (1.0 + f * lattice_constant_sq() / (h * h)).ln() - ll + 1.0
    }
}

impl LeafLearner for NormalLearner {
    type Model = NormalModel;
    type Stats = NormalStats;
    type Params = NormalParams;

    fn name(&self) -> &'static str {
        "Normal"
    }

    fn leaf_statistics(&self, cell: &CellData<'_>) -> LearnerResult<NormalStats> {
        let domain = cell.domain();
        let mut stats = NormalStats { n: 0.0, sum: 0.0, sum_sq: 0.0 };
        for (state, &count) in cell.counts().iter().enumerate() {
            let x = f64::from(domain.state_value(state));
            let c = count as f64;
            stats.n += c;
            stats.sum += c * x;
            stats.sum_sq += c * x * x;
        }
        Ok(stats)
    }

    fn parameterize(
        &self, domain: Domain, stats: &NormalStats,
    ) -> LearnerResult<(NormalModel, NormalParams)> {
        let prec_sq = self.options.precision * self.options.precision;
        let params = if stats.n <= 0.0 {
            let mid = 0.5 * (f64::from(domain.lwb()) + f64::from(domain.upb()));
            NormalParams { mean: mid, sd: self.options.precision }
        } else {
            let var =
                if stats.n > 1.0 { (self.ssd(stats) / (stats.n - 1.0)).max(prec_sq) } else { prec_sq };
            NormalParams { mean: stats.sum / stats.n, sd: var.sqrt() }
        };
        Ok((NormalModel::new(domain), params))
    }

    fn cost(
        &self, _model: &NormalModel, stats: &NormalStats, _params: &NormalParams,
    ) -> LearnerResult<f64> {
        Ok(self.message_length(stats))
    }
}
