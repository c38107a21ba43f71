//! Discrete variable domains — inclusive integer ranges `[lwb, upb]`.
//!
//! Purpose
//! -------
//! Represent the declared value range of a discrete variable (child or
//! parent) and provide the offset arithmetic every learner uses to turn a
//! raw value into a 0-based state and back.
//!
//! Key behaviors
//! -------------
//! - Construct [`Domain`] values that enforce `lwb <= upb`.
//! - Report arity as `upb - lwb + 1` without overflowing for extreme bounds.
//! - Convert between raw values and 0-based states, rejecting values outside
//!   the range with [`DataError::ValueOutOfRange`].
//!
//! Invariants & assumptions
//! ------------------------
//! - `lwb <= upb` for every constructed domain, so `arity() >= 1`.
//! - Bounds come from the surrounding data schema; this module never infers
//!   them from observed data.
//!
//! Conventions
//! -----------
//! - "State" means the 0-based offset `value - lwb`.
//! - Arity is returned as `usize`; `state_value` is the inverse of `state`.
//!
//! Testing notes
//! -------------
//! - Unit tests cover construction, arity for negative and singleton ranges,
//!   and out-of-range rejection with the offending column attached.
use crate::data::errors::{Column, DataError, DataResult};

/// Domain — validated inclusive integer range of a discrete variable.
///
/// Fields
/// ------
/// - `lwb`: `i32`
///   Smallest admissible value.
/// - `upb`: `i32`
///   Largest admissible value (`>= lwb`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Domain {
    lwb: i32,
    upb: i32,
}

impl Domain {
    /// Construct a validated domain.
    ///
    /// Errors
    /// ------
    /// - `DataError::InvalidDomain` when `lwb > upb`.
    pub fn new(lwb: i32, upb: i32) -> DataResult<Self> {
        if lwb > upb {
            return Err(DataError::InvalidDomain { lwb, upb });
        }
        Ok(Domain { lwb, upb })
    }

    /// Domain `[0, arity - 1]`.
    ///
    /// Errors
    /// ------
    /// - `DataError::InvalidDomain` when `arity` is zero or does not fit the
    ///   value type.
    pub fn with_arity(arity: usize) -> DataResult<Self> {
        let upb = i32::try_from(arity)
            .ok()
            .and_then(|a| a.checked_sub(1))
            .filter(|&u| u >= 0)
            .ok_or(DataError::InvalidDomain { lwb: 0, upb: -1 })?;
        Domain::new(0, upb)
    }

    pub fn lwb(&self) -> i32 {
        self.lwb
    }

    pub fn upb(&self) -> i32 {
        self.upb
    }

    /// Number of admissible values, `upb - lwb + 1`.
    pub fn arity(&self) -> usize {
        (i64::from(self.upb) - i64::from(self.lwb) + 1) as usize
    }

    pub fn contains(&self, value: i32) -> bool {
        value >= self.lwb && value <= self.upb
    }

    /// Map a raw value to its 0-based state.
    ///
    /// Parameters
    /// ----------
    /// - `value`: raw value to convert.
    /// - `column`: column the value came from, attached to the error.
    /// - `row`: optional row index, attached to the error.
    ///
    /// Errors
    /// ------
    /// - `DataError::ValueOutOfRange` when `value` is outside `[lwb, upb]`.
    pub fn state(&self, value: i32, column: Column, row: Option<usize>) -> DataResult<usize> {
        if !self.contains(value) {
            return Err(DataError::ValueOutOfRange {
                column,
                row,
                value,
                lwb: self.lwb,
                upb: self.upb,
            });
        }
        Ok((i64::from(value) - i64::from(self.lwb)) as usize)
    }

    /// Raw value for a 0-based state. Callers guarantee `state < arity()`.
    pub fn state_value(&self, state: usize) -> i32 {
        (i64::from(self.lwb) + state as i64) as i32
    }
}
