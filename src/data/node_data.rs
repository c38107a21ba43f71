//! Node data — aligned child column and parent matrix with declared bounds.
//!
//! Purpose
//! -------
//! Bundle the inputs of one learner call: the child variable's values, the
//! parent values (one column per parent), and the domain of each variable as
//! declared by the data schema. Construction validates everything once so
//! statistics passes can convert values to states without error paths.
//!
//! Key behaviors
//! -------------
//! - [`NodeData::new`] checks shapes and that every value lies in its domain.
//! - Zero rows are accepted; aggregators return all-zero tallies for them.
//! - [`NodeData::select_rows`] builds a subset with the same domains, used to
//!   split a dataset into disjoint parts.
//! - [`NodeData::trailing_parents`] keeps the child and the parent columns
//!   after a split point; a CPT hands those columns to its cells.
//!
//! Invariants & assumptions
//! ------------------------
//! - `child.len() == parents.nrows()` and
//!   `parents.ncols() == parent_domains.len()`.
//! - Every stored value lies inside its domain.
//! - The struct is immutable after construction.
//!
//! Conventions
//! -----------
//! - Parent matrix is row-major: row `n` holds the parent tuple of case `n`.
//!
//! Downstream usage
//! ----------------
//! - Learners take `&NodeData` for `parameterize`,
//!   `sufficient_statistics`, and `parameterize_and_cost`.
use crate::data::{
    domain::Domain,
    errors::{Column, DataError, DataResult},
    validation::{validate_column, validate_shapes},
};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, concatenate, s};

/// NodeData — validated observations of one child and its parents.
///
/// Fields
/// ------
/// - `child`: `Array1<i32>` — child value per row.
/// - `parents`: `Array2<i32>` — `rows x num_parents` parent values.
/// - `child_domain`: declared child domain.
/// - `parent_domains`: declared domain per parent column.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    child: Array1<i32>,
    parents: Array2<i32>,
    child_domain: Domain,
    parent_domains: Vec<Domain>,
}

impl NodeData {
    /// Construct validated node data.
    ///
    /// Parameters
    /// ----------
    /// - `child`: child values, one per row.
    /// - `parents`: parent matrix, one row per case and one column per parent.
    /// - `child_domain`: declared child domain.
    /// - `parent_domains`: declared parent domains, in column order.
    ///
    /// Errors
    /// ------
    /// - `DataError::RowCountMismatch` / `DataError::ParentCountMismatch` for
    ///   inconsistent shapes.
    /// - `DataError::ValueOutOfRange` for the first value outside its domain.
    pub fn new(
        child: Array1<i32>, parents: Array2<i32>, child_domain: Domain,
        parent_domains: Vec<Domain>,
    ) -> DataResult<Self> {
        validate_shapes(child.view(), parents.view(), &parent_domains)?;
        validate_column(child.view(), child_domain, Column::Child)?;
        for (i, domain) in parent_domains.iter().enumerate() {
            validate_column(parents.column(i), *domain, Column::Parent(i))?;
        }
        Ok(NodeData { child, parents, child_domain, parent_domains })
    }

    /// Node data for a child with no parents.
    pub fn without_parents(child: Array1<i32>, child_domain: Domain) -> DataResult<Self> {
        let rows = child.len();
        NodeData::new(child, Array2::zeros((rows, 0)), child_domain, Vec::new())
    }

    pub fn rows(&self) -> usize {
        self.child.len()
    }

    pub fn num_parents(&self) -> usize {
        self.parent_domains.len()
    }

    pub fn child(&self) -> ArrayView1<'_, i32> {
        self.child.view()
    }

    pub fn parents(&self) -> ArrayView2<'_, i32> {
        self.parents.view()
    }

    pub fn child_domain(&self) -> Domain {
        self.child_domain
    }

    pub fn parent_domains(&self) -> &[Domain] {
        &self.parent_domains
    }

    /// Child state (`value - lwb`) of row `row`.
    pub(crate) fn child_state(&self, row: usize) -> usize {
        (i64::from(self.child[row]) - i64::from(self.child_domain.lwb())) as usize
    }

    /// State of parent `parent` at row `row`.
    pub(crate) fn parent_state(&self, row: usize, parent: usize) -> usize {
        let lwb = self.parent_domains[parent].lwb();
        (i64::from(self.parents[[row, parent]]) - i64::from(lwb)) as usize
    }

    /// Subset of rows, keeping the domains.
    ///
    /// Panics
    /// ------
    /// - Panics if any entry of `rows` is out of bounds.
    pub fn select_rows(&self, rows: &[usize]) -> NodeData {
        NodeData {
            child: self.child.select(Axis(0), rows),
            parents: self.parents.select(Axis(0), rows),
            child_domain: self.child_domain,
            parent_domains: self.parent_domains.clone(),
        }
    }

    /// Child plus the parent columns from `from` on.
    ///
    /// `from` is capped at the parent count, so `trailing_parents(num_parents)`
    /// is the parentless view of the child.
    pub fn trailing_parents(&self, from: usize) -> NodeData {
        let from = from.min(self.num_parents());
        NodeData {
            child: self.child.clone(),
            parents: self.parents.slice(s![.., from..]).to_owned(),
            child_domain: self.child_domain,
            parent_domains: self.parent_domains[from..].to_vec(),
        }
    }

    /// Rows of `self` followed by the rows of `other`.
    ///
    /// Errors
    /// ------
    /// - `DataError::ParentCountMismatch` when the parent widths differ.
    ///
    /// Notes
    /// -----
    /// - Callers check that both sides share their domains; the result keeps
    ///   the domains of `self`.
    pub(crate) fn append(&self, other: &NodeData) -> DataResult<NodeData> {
        let width_err = || DataError::ParentCountMismatch {
            expected: self.num_parents(),
            found: other.num_parents(),
        };
        if other.num_parents() != self.num_parents() {
            return Err(width_err());
        }
        let child = concatenate(Axis(0), &[self.child.view(), other.child.view()])
            .map_err(|_| width_err())?;
        let parents = concatenate(Axis(0), &[self.parents.view(), other.parents.view()])
            .map_err(|_| width_err())?;
        Ok(NodeData {
            child,
            parents,
            child_domain: self.child_domain,
            parent_domains: self.parent_domains.clone(),
        })
    }
}
