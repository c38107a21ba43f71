//! Free-parameter layout of the logit estimator.
//!
//! The last child state and the last state of every parent are reference
//! levels: their parameters are determined by the sum-to-zero constraints.
//! With `ry = child arity − 1` and `r_i = arity of parent i − 1`, the free
//! vector holds
//!
//! - `c[k]` at index `k` for `k < ry`;
//! - `d[k][i][x]` at index `ry + k·Σr + off_i + x` for `k < ry`, `x < r_i`,
//!   where `off_i = Σ_{j<i} r_j`.
//!
//! The dependent entries are
//! `c[ry] = −Σ_k c[k]`, `d[k][i][r_i] = −Σ_x d[k][i][x]`,
//! `d[ry][i][x] = −Σ_k d[k][i][x]`, `d[ry][i][r_i] = −Σ_k d[k][i][r_i]`.
//!
//! Each free-parameter group `k` pairs with the feature vector
//! `z = [1, e_0, e_1, …]` of a parent state, where `e_i[x] = [v_i = x] −
//! [v_i = r_i]`.
use crate::logit::model::LogitParams;
use ndarray::{Array1, ArrayView1};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ParamLayout {
    child_arity: usize,
    parent_arities: Vec<usize>,
    free_offsets: Vec<usize>,
    features: usize,
}

impl ParamLayout {
    pub(crate) fn new(child_arity: usize, parent_arities: &[usize]) -> Self {
        let mut free_offsets = Vec::with_capacity(parent_arities.len());
        let mut total = 0;
        for &arity in parent_arities {
            free_offsets.push(total);
            total += arity.saturating_sub(1);
        }
        ParamLayout {
            child_arity,
            parent_arities: parent_arities.to_vec(),
            free_offsets,
            features: 1 + total,
        }
    }

    /// Reference child state, `child arity − 1`.
    pub(crate) fn ry(&self) -> usize {
        self.child_arity.saturating_sub(1)
    }

    pub(crate) fn child_arity(&self) -> usize {
        self.child_arity
    }

    pub(crate) fn parent_arities(&self) -> &[usize] {
        &self.parent_arities
    }

    /// Length of the feature vector `z`.
    pub(crate) fn features(&self) -> usize {
        self.features
    }

    pub(crate) fn nfree(&self) -> usize {
        self.ry() * self.features
    }

    /// Free index of feature `a` in child group `k`.
    pub(crate) fn param_index(&self, k: usize, a: usize) -> usize {
        if a == 0 { k } else { self.ry() + k * (self.features - 1) + (a - 1) }
    }

    /// Free index of `d[k][i][x]`.
    pub(crate) fn d_index(&self, k: usize, i: usize, x: usize) -> usize {
        self.param_index(k, 1 + self.free_offsets[i] + x)
    }

    /// Dense feature vector `z` of one parent state.
    pub(crate) fn feature_vector(&self, states: &[usize]) -> Array1<f64> {
        let mut z = Array1::zeros(self.features);
        z[0] = 1.0;
        for (i, (&v, &arity)) in states.iter().zip(&self.parent_arities).enumerate() {
            let r = arity.saturating_sub(1);
            let base = 1 + self.free_offsets[i];
            if v < r {
                z[base + v] = 1.0;
            } else {
                for x in 0..r {
                    z[base + x] = -1.0;
                }
            }
        }
        z
    }

    /// Free entries of `params`, in layout order.
    #[cfg(test)]
    pub(crate) fn free_vector(&self, params: &LogitParams) -> Array1<f64> {
        let mut free = Array1::zeros(self.nfree());
        for k in 0..self.ry() {
            free[k] = params.c[k];
            for (i, &arity) in self.parent_arities.iter().enumerate() {
                for x in 0..arity.saturating_sub(1) {
                    free[self.d_index(k, i, x)] = params.d[i][[k, x]];
                }
            }
        }
        free
    }

    /// Parameters from a free vector, with every dependent entry recomputed.
    pub(crate) fn params_from_free(&self, free: ArrayView1<f64>) -> LogitParams {
        let ry = self.ry();
        let mut params = LogitParams::zeros(self.child_arity, &self.parent_arities);
        if self.child_arity == 0 {
            return params;
        }
        for k in 0..ry {
            params.c[k] = free[k];
            params.c[ry] -= free[k];
            for (i, &arity) in self.parent_arities.iter().enumerate() {
                let r = arity.saturating_sub(1);
                let table = &mut params.d[i];
                for x in 0..r {
                    let value = free[self.d_index(k, i, x)];
                    table[[k, x]] = value;
                    table[[k, r]] -= value;
                    table[[ry, x]] -= value;
                }
                table[[ry, r]] -= table[[k, r]];
            }
        }
        params
    }
}
