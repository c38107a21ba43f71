//! Parent-state indexer — mixed-radix encoding of parent-value tuples.
//!
//! Purpose
//! -------
//! Convert a tuple of bounded parent values into a single combination index
//! and back, so that per-combination tables (CPT cells, logit state tallies)
//! can be stored in flat buffers.
//!
//! Key behaviors
//! -------------
//! - Precompute positional weights once: `multiplier[0] = 1`,
//!   `multiplier[i] = multiplier[i-1] * arity[i-1]`. The first parent is the
//!   least significant digit.
//! - Count combinations in `u64` with checked arithmetic and refuse to build
//!   an indexer whose `combinations * child_arity` exceeds the cell cap.
//! - `encode` rejects any component outside its declared domain;
//!   `decode` rejects indices `>= combinations`.
//!
//! Invariants & assumptions
//! ------------------------
//! - `encode` and `decode` are mutual inverses over the declared bounds.
//! - An empty parent list has exactly one combination (index 0).
//!
//! Conventions
//! -----------
//! - Tuples carry raw values; `states` variants carry 0-based states.
//!
//! Testing notes
//! -------------
//! - Unit tests check the bijection over a full small grid, the capacity
//!   error, and rejection of out-of-range components and indices.
use crate::data::{
    domain::Domain,
    errors::{Column, DataError, DataResult},
};

/// ParentIndexer — bijection between parent tuples and combination indices.
///
/// Fields
/// ------
/// - `domains`: declared domain of each parent, in parent order.
/// - `multipliers`: positional weight of each parent.
/// - `combinations`: product of all parent arities.
#[derive(Debug, Clone, PartialEq)]
pub struct ParentIndexer {
    domains: Vec<Domain>,
    multipliers: Vec<usize>,
    combinations: usize,
}

impl ParentIndexer {
    /// Build an indexer for `parents`, enforcing the cell cap.
    ///
    /// Parameters
    /// ----------
    /// - `parents`: `&[Domain]`
    ///   Declared domain of each parent.
    /// - `child_arity`: `usize`
    ///   Arity of the child; used only for the cell-cap check.
    /// - `max_cells`: `Option<u64>`
    ///   Upper bound on `combinations * child_arity`. `None` disables the cap,
    ///   though the product must still be addressable.
    ///
    /// Errors
    /// ------
    /// - `DataError::ExcessiveCombinations` when the cap is exceeded or the
    ///   product overflows.
    pub fn new(parents: &[Domain], child_arity: usize, max_cells: Option<u64>) -> DataResult<Self> {
        let cap = max_cells.unwrap_or(usize::MAX as u64);
        let child_arity = child_arity as u64;

        let mut combinations: u64 = 1;
        for domain in parents {
            combinations = match combinations.checked_mul(domain.arity() as u64) {
                Some(c) => c,
                None => {
                    return Err(DataError::ExcessiveCombinations {
                        combinations: u64::MAX,
                        child_arity,
                        max_cells: cap,
                    });
                }
            };
        }

        let cells = combinations.checked_mul(child_arity);
        if cells.map_or(true, |cells| cells > cap) {
            return Err(DataError::ExcessiveCombinations { combinations, child_arity, max_cells: cap });
        }

        let mut multipliers = Vec::with_capacity(parents.len());
        let mut weight = 1usize;
        for domain in parents {
            multipliers.push(weight);
            weight *= domain.arity();
        }

        Ok(ParentIndexer { domains: parents.to_vec(), multipliers, combinations: weight })
    }

    pub fn num_parents(&self) -> usize {
        self.domains.len()
    }

    pub fn combinations(&self) -> usize {
        self.combinations
    }

    pub fn domains(&self) -> &[Domain] {
        &self.domains
    }

    pub fn multipliers(&self) -> &[usize] {
        &self.multipliers
    }

    /// Combination index of a raw parent tuple.
    ///
    /// Errors
    /// ------
    /// - `DataError::TupleLengthMismatch` when `tuple.len()` differs from the
    ///   parent count.
    /// - `DataError::ValueOutOfRange` for the first component outside its
    ///   domain.
    pub fn encode(&self, tuple: &[i32]) -> DataResult<usize> {
        self.encode_row(tuple.iter().copied(), tuple.len(), None)
    }

    /// Same as [`encode`](Self::encode) but tags errors with a data row.
    pub(crate) fn encode_row<I: IntoIterator<Item = i32>>(
        &self, values: I, len: usize, row: Option<usize>,
    ) -> DataResult<usize> {
        if len != self.domains.len() {
            return Err(DataError::TupleLengthMismatch { expected: self.domains.len(), found: len });
        }
        let mut index = 0usize;
        for (i, value) in values.into_iter().enumerate() {
            let state = self.domains[i].state(value, Column::Parent(i), row)?;
            index += state * self.multipliers[i];
        }
        Ok(index)
    }

    /// Raw parent tuple for a combination index.
    ///
    /// Errors
    /// ------
    /// - `DataError::IndexOutOfRange` when `index >= combinations`.
    pub fn decode(&self, index: usize) -> DataResult<Vec<i32>> {
        let states = self.decode_states(index)?;
        Ok(states.iter().zip(&self.domains).map(|(&s, d)| d.state_value(s)).collect())
    }

    /// 0-based parent states for a combination index.
    ///
    /// Errors
    /// ------
    /// - `DataError::IndexOutOfRange` when `index >= combinations`.
    pub fn decode_states(&self, index: usize) -> DataResult<Vec<usize>> {
        if index >= self.combinations {
            return Err(DataError::IndexOutOfRange { index, combinations: self.combinations });
        }
        let mut states = vec![0usize; self.domains.len()];
        let mut rest = index;
        for i in (0..self.domains.len()).rev() {
            states[i] = rest / self.multipliers[i];
            rest %= self.multipliers[i];
        }
        Ok(states)
    }
}
