//! CPT options — cell-cap configuration for CPT learners.
//!
//! Purpose
//! -------
//! Hold the validated resource bound a CPT learner enforces before any
//! statistics pass, the maximum number of table cells
//! (`indexed combinations × child arity`), and the split between parents
//! that index the table and parents handed to the cells as context.
//!
//! Conventions
//! -----------
//! - `max_cells = None` disables the cap; the product must still be
//!   addressable on the host.
//! - The default cap is [`DEFAULT_MAX_CELLS`].
//! - `indexed_parents = None` indexes every parent; `Some(k)` indexes the
//!   first `k` parent columns (capped at the parent count) and leaves the
//!   rest to the cell learner.
use crate::learner::errors::{LearnerError, LearnerResult};

/// Default cap on `combinations × child arity`.
pub const DEFAULT_MAX_CELLS: u64 = 64_000;

/// CptOptions — configuration of a CPT learner.
///
/// Fields
/// ------
/// - `max_cells`: `Option<u64>`
///   Cap on table cells; `None` means unbounded.
/// - `indexed_parents`: `Option<usize>`
///   Number of leading parents that index the table; `None` means all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CptOptions {
    pub max_cells: Option<u64>,
    pub indexed_parents: Option<usize>,
}

impl CptOptions {
    /// Construct validated options.
    ///
    /// Errors
    /// ------
    /// - `LearnerError::InvalidOption` when `max_cells == Some(0)`.
    pub fn new(max_cells: Option<u64>) -> LearnerResult<Self> {
        if max_cells == Some(0) {
            return Err(LearnerError::InvalidOption {
                name: "max_cells",
                value: 0.0,
                reason: "cell cap must be at least 1",
            });
        }
        Ok(CptOptions { max_cells, indexed_parents: None })
    }

    /// Options with no cell cap.
    pub fn unbounded() -> Self {
        CptOptions { max_cells: None, indexed_parents: None }
    }

    /// Index the table by the first `count` parents only.
    pub fn with_indexed_parents(mut self, count: usize) -> Self {
        self.indexed_parents = Some(count);
        self
    }

    /// Number of parents indexing the table for data with `num_parents`
    /// parent columns.
    pub fn indexed_count(&self, num_parents: usize) -> usize {
        self.indexed_parents.map_or(num_parents, |k| k.min(num_parents))
    }
}

impl Default for CptOptions {
    fn default() -> Self {
        CptOptions { max_cells: Some(DEFAULT_MAX_CELLS), indexed_parents: None }
    }
}
