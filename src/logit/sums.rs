//! Likelihood and derivative sums of the logit fit.
//!
//! Purpose
//! -------
//! For the current parameters, visit every parent-state combination present
//! in the data and accumulate
//!
//! - the negative log-likelihood `−Σ_ps Σ_l N(ps, l) ln P(l | ps)`;
//! - first-derivative sums `Sy[k] = Σ_ps n t_k` and
//!   `S[k][i][v] = Σ_{ps : v_i = v} n t_k`, with `t_k = P_k − P_ry`;
//! - the expected Fisher information `F = Σ_ps C(ps) ⊗ z zᵀ` over free
//!   parameters, with `C_kk = n (P_k + P_ry − t_k²)` and
//!   `C_kl = n (P_ry − t_k t_l)`, plus the Gaussian prior curvature
//!   `2/σ²` on intercepts and `4/σ²` on offsets.
//!
//! [`gradient`] then combines these sums with the pairwise counts into the
//! gradient of the penalized log-likelihood
//! `−(NLL + Σ θ² / (2σ²))` with respect to the free parameters, dependent
//! entries included in `Σ θ²`.
//!
//! Conventions
//! -----------
//! - `n` is the number of rows in the combination; `ry` the reference child
//!   state.
use crate::logit::{
    layout::ParamLayout,
    model::{LogitParams, log_softmax},
    stats::LogitStats,
};
use ndarray::{Array1, Array2};

/// One parent-state combination observed in the data.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PresentState {
    pub(crate) states: Vec<usize>,
    pub(crate) counts: Vec<f64>,
    pub(crate) total: f64,
    pub(crate) features: Array1<f64>,
}

/// Observed combinations in ascending index order, with their feature
/// vectors.
pub(crate) fn present_states(stats: &LogitStats, layout: &ParamLayout) -> Vec<PresentState> {
    stats
        .present_combinations()
        .into_iter()
        .filter_map(|ps| {
            let states = stats.indexer().decode_states(ps).ok()?;
            let counts: Vec<f64> = stats.combination_counts(ps).iter().map(|&c| c as f64).collect();
            let total = counts.iter().sum();
            let features = layout.feature_vector(&states);
            Some(PresentState { states, counts, total, features })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DerivativeSums {
    pub(crate) nll: f64,
    pub(crate) sy: Array1<f64>,
    /// `[ry, Σ parent arity]`; parent `i` starts at the sum of earlier
    /// parent arities.
    pub(crate) s: Array2<f64>,
    pub(crate) fisher: Array2<f64>,
}

/// Accumulate NLL, first-derivative sums, and the Fisher matrix.
///
/// Parameters
/// ----------
/// - `present`: observed combinations.
/// - `layout`: free-parameter layout.
/// - `params`: current parameters.
/// - `prior_precision`: `1/σ²`.
/// - `full`: build the full Fisher matrix; otherwise only its diagonal.
pub(crate) fn accumulate(
    present: &[PresentState], layout: &ParamLayout, params: &LogitParams, prior_precision: f64,
    full: bool,
) -> DerivativeSums {
    let ry = layout.ry();
    let m = layout.features();
    let nfree = layout.nfree();
    let parent_offsets: Vec<usize> = layout
        .parent_arities()
        .iter()
        .scan(0, |acc, &r| {
            let start = *acc;
            *acc += r;
            Some(start)
        })
        .collect();
    let width: usize = layout.parent_arities().iter().sum();

    let mut nll = 0.0;
    let mut sy = Array1::<f64>::zeros(ry);
    let mut s = Array2::<f64>::zeros((ry, width));
    let mut fisher = Array2::<f64>::zeros((nfree, nfree));
    let mut weights = Array2::<f64>::zeros((ry, ry));

    for cell in present {
        let log_p = log_softmax(&params.scores(&cell.states));
        for (l, &count) in cell.counts.iter().enumerate() {
            if count > 0.0 {
                nll -= count * log_p[l];
            }
        }
        if nfree == 0 {
            continue;
        }

        let p = log_p.mapv(f64::exp);
        let p_ry = p[ry];
        let n = cell.total;
        let t: Vec<f64> = (0..ry).map(|k| p[k] - p_ry).collect();
        for k in 0..ry {
            sy[k] += n * t[k];
            for (i, &v) in cell.states.iter().enumerate() {
                s[[k, parent_offsets[i] + v]] += n * t[k];
            }
            for l in 0..ry {
                weights[[k, l]] = if k == l {
                    n * (p[k] + p_ry - t[k] * t[k])
                } else {
                    n * (p_ry - t[k] * t[l])
                };
            }
        }

        let z = &cell.features;
        if full {
            for k in 0..ry {
                for a in 0..m {
                    if z[a] == 0.0 {
                        continue;
                    }
                    let row = layout.param_index(k, a);
                    for l in 0..ry {
                        let w = weights[[k, l]] * z[a];
                        for b in 0..m {
                            if z[b] != 0.0 {
                                fisher[[row, layout.param_index(l, b)]] += w * z[b];
                            }
                        }
                    }
                }
            }
        } else {
            for k in 0..ry {
                for a in 0..m {
                    let index = layout.param_index(k, a);
                    fisher[[index, index]] += weights[[k, k]] * z[a] * z[a];
                }
            }
        }
    }

    for k in 0..ry {
        for a in 0..m {
            let index = layout.param_index(k, a);
            let curvature = if a == 0 { 2.0 } else { 4.0 };
            fisher[[index, index]] += curvature * prior_precision;
        }
    }

    DerivativeSums { nll, sy, s, fisher }
}

/// Gradient of the penalized log-likelihood over free parameters.
pub(crate) fn gradient(
    stats: &LogitStats, layout: &ParamLayout, sums: &DerivativeSums, params: &LogitParams,
    prior_precision: f64,
) -> Array1<f64> {
    let ry = layout.ry();
    let mut g = Array1::<f64>::zeros(layout.nfree());
    let n_ry = stats.child_count(ry) as f64;
    for k in 0..ry {
        let n_k = stats.child_count(k) as f64;
        g[k] = n_k - n_ry - sums.sy[k] - (params.c[k] - params.c[ry]) * prior_precision;

        let mut start = 0;
        for (i, &arity) in layout.parent_arities().iter().enumerate() {
            let r = arity - 1;
            let d = &params.d[i];
            let nk = |x: usize| stats.child_parent_count(k, i, x) as f64;
            let nry = |x: usize| stats.child_parent_count(ry, i, x) as f64;
            for x in 0..r {
                g[layout.d_index(k, i, x)] = nk(x) - nry(x) - sums.s[[k, start + x]] - nk(r)
                    + nry(r)
                    + sums.s[[k, start + r]]
                    - (d[[k, x]] + d[[ry, r]] - d[[ry, x]] - d[[k, r]]) * prior_precision;
            }
            start += arity;
        }
    }
    g
}
