//! Errors for node data, discrete domains, and parent-state indexing.
//!
//! This module defines [`DataError`], the error type raised while validating
//! the inputs a learner is handed: domain bounds, aligned column lengths,
//! per-row values, and the parent-state cell budget. It implements
//! `Display`/`Error` and converts into the learner-level error surface via
//! `From` in `learner::errors`.
//!
//! ## Conventions
//! - **Rows and parents are 0-based.**
//! - A value outside its declared `[lwb, upb]` range is a schema mismatch and
//!   is always reported, never clamped.
//! - Cell counts are carried as `u64` so oversized parent sets are reported
//!   with their true size instead of a wrapped one.

/// Result alias for data-validation and indexing paths.
pub type DataResult<T> = Result<T, DataError>;

/// Which column of a node's data a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    /// The child variable.
    Child,
    /// The parent at the given position in the parent list.
    Parent(usize),
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Column::Child => write!(f, "child"),
            Column::Parent(i) => write!(f, "parent {i}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataError {
    // ---- Domains ----
    /// Domain bounds must satisfy `lwb <= upb`.
    InvalidDomain { lwb: i32, upb: i32 },

    // ---- Shapes ----
    /// Child and parent columns must have the same number of rows.
    RowCountMismatch { child_rows: usize, parent_rows: usize },

    /// Parent matrix width must equal the number of declared parent domains.
    ParentCountMismatch { expected: usize, found: usize },

    /// A parent-state tuple has the wrong number of components.
    TupleLengthMismatch { expected: usize, found: usize },

    // ---- Values ----
    /// A value lies outside its declared domain.
    ValueOutOfRange { column: Column, row: Option<usize>, value: i32, lwb: i32, upb: i32 },

    /// A combination index is not below the number of combinations.
    IndexOutOfRange { index: usize, combinations: usize },

    // ---- Capacity ----
    /// Parent combinations times child arity exceed the configured cell cap.
    ExcessiveCombinations { combinations: u64, child_arity: u64, max_cells: u64 },
}

impl std::error::Error for DataError {}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Domains ----
            DataError::InvalidDomain { lwb, upb } => {
                write!(f, "Domain bounds must satisfy lwb <= upb; got [{lwb}, {upb}].")
            }
            // ---- Shapes ----
            DataError::RowCountMismatch { child_rows, parent_rows } => {
                write!(
                    f,
                    "Child column has {child_rows} rows but parent matrix has {parent_rows} rows."
                )
            }
            DataError::ParentCountMismatch { expected, found } => {
                write!(f, "Parent count mismatch: expected {expected} columns, got {found}.")
            }
            DataError::TupleLengthMismatch { expected, found } => {
                write!(f, "Parent tuple length mismatch: expected {expected}, got {found}.")
            }
            // ---- Values ----
            DataError::ValueOutOfRange { column, row, value, lwb, upb } => match row {
                Some(row) => write!(
                    f,
                    "Value {value} of {column} at row {row} lies outside [{lwb}, {upb}]."
                ),
                None => write!(f, "Value {value} of {column} lies outside [{lwb}, {upb}]."),
            },
            DataError::IndexOutOfRange { index, combinations } => {
                write!(
                    f,
                    "Combination index {index} out of range for {combinations} combinations."
                )
            }
            // ---- Capacity ----
            DataError::ExcessiveCombinations { combinations, child_arity, max_cells } => {
                write!(
                    f,
                    "{combinations} parent combinations x child arity {child_arity} exceeds the \
                     cell cap of {max_cells}."
                )
            }
        }
    }
}

#[cfg(feature = "python-bindings")]
impl std::convert::From<DataError> for pyo3::PyErr {
    fn from(err: DataError) -> pyo3::PyErr {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}
