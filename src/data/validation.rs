//! Validation helpers for node data.
//!
//! This module centralizes the consistency checks run once when a
//! [`NodeData`](crate::data::node_data::NodeData) is built:
//!
//! - **Shape checks**: [`validate_shapes`] ensures the child column and the
//!   parent matrix agree on row count and the matrix width matches the
//!   declared parent domains.
//! - **Value checks**: [`validate_column`] ensures every value of a column
//!   lies in its declared domain.
//!
//! Downstream code (statistics aggregation, learners) relies on these checks
//! and converts values to states without re-validating.
use crate::data::{
    domain::Domain,
    errors::{Column, DataError, DataResult},
};
use ndarray::{ArrayView1, ArrayView2};

/// Validate row counts and parent width.
///
/// # Errors
/// - [`DataError::RowCountMismatch`] if `child.len() != parents.nrows()`.
/// - [`DataError::ParentCountMismatch`] if `parents.ncols()` differs from the
///   number of declared parent domains.
pub fn validate_shapes(
    child: ArrayView1<i32>, parents: ArrayView2<i32>, parent_domains: &[Domain],
) -> DataResult<()> {
    if child.len() != parents.nrows() {
        return Err(DataError::RowCountMismatch {
            child_rows: child.len(),
            parent_rows: parents.nrows(),
        });
    }
    if parents.ncols() != parent_domains.len() {
        return Err(DataError::ParentCountMismatch {
            expected: parent_domains.len(),
            found: parents.ncols(),
        });
    }
    Ok(())
}

/// Validate that every value of `values` lies in `domain`.
///
/// # Errors
/// Returns [`DataError::ValueOutOfRange`] for the first offending row.
pub fn validate_column(values: ArrayView1<i32>, domain: Domain, column: Column) -> DataResult<()> {
    for (row, &value) in values.iter().enumerate() {
        domain.state(value, column, Some(row))?;
    }
    Ok(())
}
