//! Errors for node-local learners (data/schema problems, capacity limits,
//! option validation, and logit fitting failures).
//!
//! [`LearnerError`] is the single error surface returned by every learner
//! operation. Data-layer failures are mapped in from
//! [`DataError`](crate::data::errors::DataError), so callers never match on
//! two enums.
//!
//! ## Conventions
//! - Errors are local to one parent-set evaluation; no variant implies any
//!   shared state is corrupt.
//! - [`LearnerError::is_infeasible`] separates "this parent set cannot be
//!   scored" from schema mismatches and programming errors.
use crate::data::errors::{Column, DataError};

/// Result alias for learner operations.
pub type LearnerResult<T> = Result<T, LearnerError>;

/// Which Newton-Raphson step schedule produced a fit or a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleKind {
    Aggressive,
    Conservative,
}

impl std::fmt::Display for ScheduleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduleKind::Aggressive => write!(f, "aggressive"),
            ScheduleKind::Conservative => write!(f, "conservative"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LearnerError {
    // ---- Schema / data ----
    /// Domain bounds must satisfy `lwb <= upb`.
    InvalidDomain { lwb: i32, upb: i32 },

    /// Child and parent columns disagree on row count.
    RowCountMismatch { child_rows: usize, parent_rows: usize },

    /// Parent count disagrees with the declared parent domains.
    ParentCountMismatch { expected: usize, found: usize },

    /// Parent tuple has the wrong number of components.
    TupleLengthMismatch { expected: usize, found: usize },

    /// A value lies outside its declared domain.
    ValueOutOfRange { column: Column, row: Option<usize>, value: i32, lwb: i32, upb: i32 },

    /// A combination index is not below the number of combinations.
    IndexOutOfRange { index: usize, combinations: usize },

    // ---- Capacity ----
    /// Parent combinations times child arity exceed the cell cap.
    ExcessiveCombinations { combinations: u64, child_arity: u64, max_cells: u64 },

    /// A variable's arity exceeds the logit arity cap.
    ArityTooHigh { column: Column, arity: usize, max_arity: usize },

    // ---- Options ----
    /// A numeric option is out of its admissible range.
    InvalidOption { name: &'static str, value: f64, reason: &'static str },

    // ---- Parameters ----
    /// Parameters do not match the shape the model expects.
    ParamShapeMismatch { what: &'static str, expected: usize, found: usize },

    /// Probability table entries must be finite, non-negative, and sum to 1.
    InvalidProbabilities { cell: usize, reason: &'static str },

    // ---- Logit fitting ----
    /// Cholesky factorization met a non-positive pivot.
    SingularFisher {
        pivot_index: usize,
        pivot: f64,
        iteration: usize,
        child_arity: usize,
        parent_arities: Vec<usize>,
    },

    /// Neither step schedule converged within its iteration cap.
    ConvergenceFailure {
        aggressive_iters: usize,
        conservative_iters: usize,
        last_delta: f64,
        child_arity: usize,
        parent_arities: Vec<usize>,
    },

    // ---- Generation ----
    /// A distribution could not be built for sampling.
    InvalidDistribution { reason: &'static str },
}

impl LearnerError {
    /// Whether the error means "this parent set cannot be scored" rather than
    /// a schema or caller mistake.
    ///
    /// Returns
    /// -------
    /// `true` for `ExcessiveCombinations`, `ArityTooHigh`, `SingularFisher`,
    /// and `ConvergenceFailure`.
    pub fn is_infeasible(&self) -> bool {
        matches!(
            self,
            LearnerError::ExcessiveCombinations { .. }
                | LearnerError::ArityTooHigh { .. }
                | LearnerError::SingularFisher { .. }
                | LearnerError::ConvergenceFailure { .. }
        )
    }
}

impl std::error::Error for LearnerError {}

impl std::fmt::Display for LearnerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Schema / data ----
            LearnerError::InvalidDomain { lwb, upb } => {
                write!(f, "Domain bounds must satisfy lwb <= upb; got [{lwb}, {upb}].")
            }
            LearnerError::RowCountMismatch { child_rows, parent_rows } => {
                write!(
                    f,
                    "Child column has {child_rows} rows but parent matrix has {parent_rows} rows."
                )
            }
            LearnerError::ParentCountMismatch { expected, found } => {
                write!(f, "Parent count mismatch: expected {expected}, got {found}.")
            }
            LearnerError::TupleLengthMismatch { expected, found } => {
                write!(f, "Parent tuple length mismatch: expected {expected}, got {found}.")
            }
            LearnerError::ValueOutOfRange { column, row, value, lwb, upb } => match row {
                Some(row) => write!(
                    f,
                    "Value {value} of {column} at row {row} lies outside [{lwb}, {upb}]."
                ),
                None => write!(f, "Value {value} of {column} lies outside [{lwb}, {upb}]."),
            },
            LearnerError::IndexOutOfRange { index, combinations } => {
                write!(
                    f,
                    "Combination index {index} out of range for {combinations} combinations."
                )
            }
            // ---- Capacity ----
            LearnerError::ExcessiveCombinations { combinations, child_arity, max_cells } => {
                write!(
                    f,
                    "{combinations} parent combinations x child arity {child_arity} exceeds the \
                     cell cap of {max_cells}."
                )
            }
            LearnerError::ArityTooHigh { column, arity, max_arity } => {
                write!(f, "Arity {arity} of {column} exceeds the logit arity cap of {max_arity}.")
            }
            // ---- Options ----
            LearnerError::InvalidOption { name, value, reason } => {
                write!(f, "Invalid option {name} = {value}: {reason}")
            }
            // ---- Parameters ----
            LearnerError::ParamShapeMismatch { what, expected, found } => {
                write!(f, "Parameter shape mismatch for {what}: expected {expected}, got {found}.")
            }
            LearnerError::InvalidProbabilities { cell, reason } => {
                write!(f, "Invalid probabilities for cell {cell}: {reason}")
            }
            // ---- Logit fitting ----
            LearnerError::SingularFisher {
                pivot_index,
                pivot,
                iteration,
                child_arity,
                parent_arities,
            } => {
                write!(
                    f,
                    "Fisher matrix not positive definite: pivot {pivot_index} = {pivot} at \
                     iteration {iteration} (child arity {child_arity}, parent arities \
                     {parent_arities:?})."
                )
            }
            LearnerError::ConvergenceFailure {
                aggressive_iters,
                conservative_iters,
                last_delta,
                child_arity,
                parent_arities,
            } => {
                write!(
                    f,
                    "Total convergence failure after {aggressive_iters} aggressive and \
                     {conservative_iters} conservative iterations (last NLL change \
                     {last_delta}; child arity {child_arity}, parent arities {parent_arities:?})."
                )
            }
            // ---- Generation ----
            LearnerError::InvalidDistribution { reason } => {
                write!(f, "Cannot sample from distribution: {reason}")
            }
        }
    }
}

impl From<DataError> for LearnerError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::InvalidDomain { lwb, upb } => LearnerError::InvalidDomain { lwb, upb },
            DataError::RowCountMismatch { child_rows, parent_rows } => {
                LearnerError::RowCountMismatch { child_rows, parent_rows }
            }
            DataError::ParentCountMismatch { expected, found } => {
                LearnerError::ParentCountMismatch { expected, found }
            }
            DataError::TupleLengthMismatch { expected, found } => {
                LearnerError::TupleLengthMismatch { expected, found }
            }
            DataError::ValueOutOfRange { column, row, value, lwb, upb } => {
                LearnerError::ValueOutOfRange { column, row, value, lwb, upb }
            }
            DataError::IndexOutOfRange { index, combinations } => {
                LearnerError::IndexOutOfRange { index, combinations }
            }
            DataError::ExcessiveCombinations { combinations, child_arity, max_cells } => {
                LearnerError::ExcessiveCombinations { combinations, child_arity, max_cells }
            }
        }
    }
}

#[cfg(feature = "python-bindings")]
impl std::convert::From<LearnerError> for pyo3::PyErr {
    fn from(err: LearnerError) -> pyo3::PyErr {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}
