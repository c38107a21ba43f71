//! Leaf contract — pluggable learners for the cells of a CPT.
//!
//! Purpose
//! -------
//! Describe the capability a CPT cell learner must provide so that the CPT
//! learner can stay generic over the cell model family: build per-cell
//! statistics from the cell's data, estimate cell parameters, and cost them.
//!
//! Key behaviors
//! -------------
//! - [`CellData`] is what a leaf sees of one cell: the child tally and, on
//!   demand, the cell's rows with the parent columns the enclosing table does
//!   not index (the cell's context).
//! - [`LeafModel`] evaluates one child distribution given the context values.
//! - [`LeafLearner`] parameterizes and costs one cell from its statistics.
//!
//! Invariants & assumptions
//! ------------------------
//! - Counting leaves read only [`CellData::counts`] and ignore the context.
//! - Leaf learners hold immutable configuration and are `Sync`; models and
//!   parameters are `Send + Sync`, which lets the CPT learner evaluate cells
//!   in parallel.
use crate::{
    data::{domain::Domain, node_data::NodeData},
    learner::errors::LearnerResult,
};
use ndarray::{Array1, ArrayView1};
use rand::Rng;
use std::borrow::Cow;

/// CellData — the rows of one CPT cell.
///
/// Fields
/// ------
/// - `domain`: declared child domain.
/// - `counts`: `counts[s]` is the number of rows in the cell with child
///   state `s`; `counts.len() == domain.arity()`.
/// - `rows`: the cell's rows over its context columns, when the table keeps
///   any.
#[derive(Debug, Clone, Copy)]
pub struct CellData<'a> {
    domain: Domain,
    counts: ArrayView1<'a, u64>,
    rows: Option<&'a NodeData>,
}

impl<'a> CellData<'a> {
    pub fn new(domain: Domain, counts: ArrayView1<'a, u64>, rows: Option<&'a NodeData>) -> Self {
        CellData { domain, counts, rows }
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn counts(&self) -> ArrayView1<'a, u64> {
        self.counts
    }

    /// The cell's rows over its context columns.
    ///
    /// Without context columns the rows are rebuilt from the tally as a
    /// parentless dataset ordered by child state.
    ///
    /// Errors
    /// ------
    /// - Data-layer errors from rebuilding the rows, mapped into
    ///   `LearnerError`.
    pub fn rows(&self) -> LearnerResult<Cow<'a, NodeData>> {
        if let Some(rows) = self.rows {
            return Ok(Cow::Borrowed(rows));
        }
        let mut child = Vec::with_capacity(self.counts.sum() as usize);
        for (state, &n) in self.counts.iter().enumerate() {
            let value = self.domain.state_value(state);
            child.extend(std::iter::repeat(value).take(n as usize));
        }
        Ok(Cow::Owned(NodeData::without_parents(Array1::from(child), self.domain)?))
    }
}

/// LeafModel — a distribution over the child domain.
///
/// `context` holds the raw values of the cell's context columns; leaves
/// without context ignore it.
pub trait LeafModel: Send + Sync + Clone + std::fmt::Debug + PartialEq {
    type Params: Send + Sync + Clone + std::fmt::Debug + PartialEq;

    fn domain(&self) -> Domain;

    /// `ln P(value | context)`; a log density for continuous leaves.
    fn log_probability(&self, value: i32, context: &[i32], params: &Self::Params)
    -> LearnerResult<f64>;

    /// Mode of the distribution.
    fn predict(&self, context: &[i32], params: &Self::Params) -> LearnerResult<i32>;

    /// Draw `n` values.
    fn generate<R: Rng + ?Sized>(
        &self, rng: &mut R, n: usize, context: &[i32], params: &Self::Params,
    ) -> LearnerResult<Vec<i32>>;

    /// Number of free parameters.
    fn num_params(&self, params: &Self::Params) -> usize;
}

/// LeafLearner — parameterize and cost a single CPT cell.
pub trait LeafLearner: Sync {
    type Model: LeafModel<Params = Self::Params>;
    type Stats: Send + Sync + Clone + std::fmt::Debug + PartialEq;
    type Params: Send + Sync + Clone + std::fmt::Debug + PartialEq;

    fn name(&self) -> &'static str;

    /// Cell statistics from the cell's data.
    ///
    /// Errors
    /// ------
    /// - Learners that summarize the cell's rows propagate their data and
    ///   capacity errors.
    fn leaf_statistics(&self, cell: &CellData<'_>) -> LearnerResult<Self::Stats>;

    /// Estimate the cell model and parameters.
    fn parameterize(&self, domain: Domain, stats: &Self::Stats)
    -> LearnerResult<(Self::Model, Self::Params)>;

    /// Message length of the cell in nits.
    fn cost(&self, model: &Self::Model, stats: &Self::Stats, params: &Self::Params)
    -> LearnerResult<f64>;

    /// Fused parameterize-then-cost.
    fn parameterize_and_cost(&self, domain: Domain, stats: &Self::Stats) -> LearnerResult<f64> {
        let (model, params) = self.parameterize(domain, stats)?;
        self.cost(&model, stats, &params)
    }
}
