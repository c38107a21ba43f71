//! Cholesky factor of the logit Fisher matrix.
//!
//! Purpose
//! -------
//! Factor a symmetric positive-definite matrix as `F = Uᵀ U`, solve
//! `F h = g` by forward and back substitution, and report `ln det F`.
//!
//! Key behaviors
//! -------------
//! - Only the diagonal and the lower triangle of the input are read.
//! - The factor keeps the reciprocal of each diagonal entry of `U`; the
//!   log-determinant is `−2 Σ ln(1 / u_ii)`.
//! - A pivot that is not strictly positive (NaN included) stops the
//!   factorization and is reported with its index.
//! - Shape errors (a non-square input, a right-hand side of the wrong
//!   length) are returned as [`CholeskyError`] values.
//!
//! Conventions
//! -----------
//! - Matrices are dense `ndarray` arrays; the factor is small (free
//!   parameters of one node).
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

/// Failure of a Cholesky factorization or solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CholeskyError {
    /// Input matrix is `rows x cols` with `rows != cols`.
    NotSquare { rows: usize, cols: usize },

    /// Pivot `index` is not strictly positive (or is NaN).
    NotPositiveDefinite { index: usize, pivot: f64 },

    /// Right-hand side length differs from the factor dimension.
    LengthMismatch { expected: usize, found: usize },
}

impl std::fmt::Display for CholeskyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CholeskyError::NotSquare { rows, cols } => {
                write!(f, "Cholesky input must be square; got {rows}x{cols}.")
            }
            CholeskyError::NotPositiveDefinite { index, pivot } => {
                write!(f, "Non-positive Cholesky pivot {pivot} at index {index}.")
            }
            CholeskyError::LengthMismatch { expected, found } => {
                write!(f, "Right-hand side has length {found}; the factor has dimension {expected}.")
            }
        }
    }
}

impl std::error::Error for CholeskyError {}

/// CholeskyFactor — upper factor `U` with reciprocal diagonal.
#[derive(Debug, Clone, PartialEq)]
pub struct CholeskyFactor {
    upper: Array2<f64>,
    inv_diag: Array1<f64>,
}

impl CholeskyFactor {
    /// Factor a symmetric matrix.
    ///
    /// Parameters
    /// ----------
    /// - `matrix`: square `n x n` matrix; entries above the diagonal are
    ///   ignored.
    ///
    /// Returns
    /// -------
    /// `Result<CholeskyFactor, CholeskyError>`
    ///
    /// Errors
    /// ------
    /// - `CholeskyError::NotSquare` when `matrix` is not square.
    /// - `CholeskyError::NotPositiveDefinite` at the first pivot `s <= 0` or
    ///   NaN.
    pub fn factor(matrix: ArrayView2<f64>) -> Result<Self, CholeskyError> {
        if matrix.nrows() != matrix.ncols() {
            return Err(CholeskyError::NotSquare { rows: matrix.nrows(), cols: matrix.ncols() });
        }
        let n = matrix.nrows();
        let mut upper = Array2::<f64>::zeros((n, n));
        let mut inv_diag = Array1::<f64>::zeros(n);

        for i in 0..n {
            let mut s = matrix[[i, i]];
            for k in 0..i {
                s -= upper[[k, i]] * upper[[k, i]];
            }
            if !(s > 0.0) {
                return Err(CholeskyError::NotPositiveDefinite { index: i, pivot: s });
            }
            let root = s.sqrt();
            inv_diag[i] = 1.0 / root;
            upper[[i, i]] = root;
            for j in (i + 1)..n {
                let mut s = matrix[[j, i]];
                for k in 0..i {
                    s -= upper[[k, i]] * upper[[k, j]];
                }
                upper[[i, j]] = s * inv_diag[i];
            }
        }

        Ok(CholeskyFactor { upper, inv_diag })
    }

    pub fn dim(&self) -> usize {
        self.inv_diag.len()
    }

    /// Upper-triangular factor `U` with `F = Uᵀ U`.
    pub fn upper(&self) -> &Array2<f64> {
        &self.upper
    }

    /// Solve `F x = b`.
    ///
    /// Errors
    /// ------
    /// - `CholeskyError::LengthMismatch` when `b.len() != self.dim()`.
    pub fn solve(&self, b: ArrayView1<f64>) -> Result<Array1<f64>, CholeskyError> {
        let n = self.dim();
        if b.len() != n {
            return Err(CholeskyError::LengthMismatch { expected: n, found: b.len() });
        }
        let mut x = Array1::<f64>::zeros(n);
        for j in 0..n {
            let mut s = b[j];
            for k in 0..j {
                s -= self.upper[[k, j]] * x[k];
            }
            x[j] = s * self.inv_diag[j];
        }
        for j in (0..n).rev() {
            let mut s = x[j];
            for k in (j + 1)..n {
                s -= self.upper[[j, k]] * x[k];
            }
            x[j] = s * self.inv_diag[j];
        }
        Ok(x)
    }

    /// `ln det F`.
    pub fn log_det(&self) -> f64 {
        -2.0 * self.inv_diag.iter().map(|d| d.ln()).sum::<f64>()
    }
}
