//! Nested-CPT leaf — a cell modelled by a table over its context parents.
//!
//! Purpose
//! -------
//! Let an outer CPT hand each of its cells to an inner CPT that indexes the
//! parent columns the outer table leaves as context. A CPT indexed by `k`
//! leading parents with a nested leaf is a two-level table: the outer level
//! splits the rows, the inner level fits its own leaf learner per context
//! combination.
//!
//! Key behaviors
//! -------------
//! - Cell statistics are the inner learner's [`CptStats`] over the cell's
//!   rows. Without context columns the inner table has a single cell built
//!   from the tally.
//! - The cell cost is the inner CPT cost; the fused path never builds inner
//!   parameters.
//! - [`NestedCptModel`] evaluates the inner table with the context values as
//!   its parent tuple.
//!
//! Invariants & assumptions
//! ------------------------
//! - The inner learner's cell cap applies to each cell separately.
//! - Nesting composes: the inner leaf may itself be a nested learner.
use crate::{
    cpt::{CptLearner, CptModel, CptParams, CptStats},
    data::domain::Domain,
    leaf::traits::{CellData, LeafLearner, LeafModel},
    learner::{
        errors::LearnerResult,
        traits::{LocalModel, ModelLearner},
    },
};
use rand::Rng;

/// NestedCptModel — inner table evaluated on the context values.
#[derive(Debug, Clone, PartialEq)]
pub struct NestedCptModel<M> {
    table: CptModel<M>,
}

impl<M: LeafModel> NestedCptModel<M> {
    pub fn table(&self) -> &CptModel<M> {
        &self.table
    }
}

impl<M: LeafModel> LeafModel for NestedCptModel<M> {
    type Params = CptParams<M>;

    fn domain(&self) -> Domain {
        self.table.child_domain()
    }

    fn log_probability(
        &self, value: i32, context: &[i32], params: &CptParams<M>,
    ) -> LearnerResult<f64> {
        self.table.log_probability(value, context, params)
    }

    fn predict(&self, context: &[i32], params: &CptParams<M>) -> LearnerResult<i32> {
        self.table.predict(context, params)
    }

    fn generate<R: Rng + ?Sized>(
        &self, rng: &mut R, n: usize, context: &[i32], params: &CptParams<M>,
    ) -> LearnerResult<Vec<i32>> {
        self.table.generate(rng, n, context, params)
    }

    fn num_params(&self, params: &CptParams<M>) -> usize {
        params.num_params()
    }
}

/// NestedCptLearner — CPT cell learner wrapping an inner [`CptLearner`].
#[derive(Debug, Clone, PartialEq)]
pub struct NestedCptLearner<L> {
    inner: CptLearner<L>,
}

impl<L: LeafLearner> NestedCptLearner<L> {
    pub fn new(inner: CptLearner<L>) -> Self {
        NestedCptLearner { inner }
    }

    pub fn inner(&self) -> &CptLearner<L> {
        &self.inner
    }
}

impl<L: LeafLearner> LeafLearner for NestedCptLearner<L> {
    type Model = NestedCptModel<L::Model>;
    type Stats = CptStats;
    type Params = CptParams<L::Model>;

    fn name(&self) -> &'static str {
        "NestedCpt"
    }

    fn leaf_statistics(&self, cell: &CellData<'_>) -> LearnerResult<CptStats> {
        let rows = cell.rows()?;
        self.inner.sufficient_statistics(&rows)
    }

    fn parameterize(
        &self, _domain: Domain, stats: &CptStats,
    ) -> LearnerResult<(NestedCptModel<L::Model>, CptParams<L::Model>)> {
        let (table, params) = self.inner.parameterize_statistics(stats)?;
        Ok((NestedCptModel { table }, params))
    }

    fn cost(
        &self, model: &NestedCptModel<L::Model>, stats: &CptStats, params: &CptParams<L::Model>,
    ) -> LearnerResult<f64> {
        self.inner.cost(&model.table, stats, params)
    }

    fn parameterize_and_cost(&self, _domain: Domain, stats: &CptStats) -> LearnerResult<f64> {
        self.inner.cost_statistics(stats)
    }
}
