//! CPT learner — per-combination parameterization and costing.
//!
//! Purpose
//! -------
//! Fit a CPT by handing the data of every parent-state combination to a
//! pluggable leaf learner, and cost it as the sum of the leaf costs.
//!
//! Key behaviors
//! -------------
//! - The cell cap is checked while building statistics, before any row is
//!   read.
//! - Cells are independent: no state is shared between combinations. With
//!   the `parallel` feature the cells are evaluated on the rayon pool and
//!   collected in combination order, so results match the sequential path.
//! - `parameterize_and_cost` uses the leaf's fused cost and never
//!   materializes cell parameters.
//! - With `CptOptions::indexed_parents` set, only the leading parents index
//!   the table and the cell learner receives the rest as context; a
//!   [`NestedCptLearner`](crate::leaf::NestedCptLearner) leaf turns that
//!   context into a table of its own.
//!
//! Invariants & assumptions
//! ------------------------
//! - The child domain and parent domains come from `NodeData`, never from the
//!   observed values.
//! - Empty cells are parameterized and costed like any other cell.
use crate::{
    cpt::{
        model::{CptCell, CptModel, CptParams},
        options::CptOptions,
        stats::CptStats,
    },
    data::node_data::NodeData,
    leaf::{adaptive::AdaptiveCodeLearner, traits::LeafLearner},
    learner::{
        errors::{LearnerError, LearnerResult},
        traits::ModelLearner,
    },
};
use tracing::debug;

/// CptLearner — CPT learner generic over its cell learner.
///
/// Fields
/// ------
/// - `leaf`: cell learner applied to every combination.
/// - `options`: cell-cap configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct CptLearner<L> {
    leaf: L,
    options: CptOptions,
}

impl<L: LeafLearner> CptLearner<L> {
    pub fn new(leaf: L, options: CptOptions) -> Self {
        CptLearner { leaf, options }
    }

    pub fn leaf(&self) -> &L {
        &self.leaf
    }

    pub fn options(&self) -> CptOptions {
        self.options
    }

    fn cell_stats(&self, stats: &CptStats, index: usize) -> LearnerResult<L::Stats> {
        self.leaf.leaf_statistics(&stats.cell(index))
    }

    /// Fused cost of every cell of `stats`.
    ///
    /// Returns
    /// -------
    /// `LearnerResult<f64>` with the sum of the leaf learner's fused cell
    /// costs, without building cell parameters.
    pub fn cost_statistics(&self, stats: &CptStats) -> LearnerResult<f64> {
        let domain = stats.child_domain();
        let costs = map_cells(stats.indexer().combinations(), |index| {
            self.leaf.parameterize_and_cost(domain, &self.cell_stats(stats, index)?)
        })?;
        Ok(costs.iter().sum())
    }
}

impl Default for CptLearner<AdaptiveCodeLearner> {
    fn default() -> Self {
        CptLearner::new(AdaptiveCodeLearner::default(), CptOptions::default())
    }
}

/// Evaluate `f` for every cell index, in index order.
#[cfg(not(feature = "parallel"))]
fn map_cells<T, F>(cells: usize, f: F) -> LearnerResult<Vec<T>>
where
    T: Send,
    F: Fn(usize) -> LearnerResult<T> + Sync + Send,
{
    (0..cells).map(f).collect()
}

/// Evaluate `f` for every cell index on the rayon pool, in index order.
#[cfg(feature = "parallel")]
fn map_cells<T, F>(cells: usize, f: F) -> LearnerResult<Vec<T>>
where
    T: Send,
    F: Fn(usize) -> LearnerResult<T> + Sync + Send,
{
    use rayon::prelude::*;
    (0..cells).into_par_iter().map(f).collect()
}

impl<L: LeafLearner> ModelLearner for CptLearner<L> {
    type Model = CptModel<L::Model>;
    type Stats = CptStats;
    type Params = CptParams<L::Model>;

    fn name(&self) -> &'static str {
        "Cpt"
    }

    fn sufficient_statistics(&self, data: &NodeData) -> LearnerResult<CptStats> {
        let indexed = self.options.indexed_count(data.num_parents());
        CptStats::from_data_split(data, indexed, self.options.max_cells)
    }

    fn parameterize_statistics(
        &self, stats: &CptStats,
    ) -> LearnerResult<(CptModel<L::Model>, CptParams<L::Model>)> {
        let domain = stats.child_domain();
        let cells = map_cells(stats.indexer().combinations(), |index| {
            let (model, params) = self.leaf.parameterize(domain, &self.cell_stats(stats, index)?)?;
            Ok(CptCell { model, params })
        })?;
        debug!(leaf = self.leaf.name(), cells = cells.len(), "parameterized CPT");
        let model =
            CptModel::with_context(stats.indexer().clone(), domain, stats.context_domains().to_vec());
        Ok((model, CptParams { cells }))
    }

    fn cost(
        &self, model: &CptModel<L::Model>, stats: &CptStats, params: &CptParams<L::Model>,
    ) -> LearnerResult<f64> {
        let combinations = model.indexer().combinations();
        if params.cells.len() != combinations
            || stats.indexer().combinations() != combinations
            || stats.context_domains() != model.context_domains()
        {
            return Err(LearnerError::ParamShapeMismatch {
                what: "CPT cells",
                expected: combinations,
                found: params.cells.len(),
            });
        }
        let costs = map_cells(combinations, |index| {
            let cell = &params.cells[index];
            self.leaf.cost(&cell.model, &self.cell_stats(stats, index)?, &cell.params)
        })?;
        Ok(costs.iter().sum())
    }

    fn parameterize_and_cost(&self, data: &NodeData) -> LearnerResult<f64> {
        let stats = self.sufficient_statistics(data)?;
        let total = self.cost_statistics(&stats)?;
        debug!(
            leaf = self.leaf.name(),
            parents = data.num_parents(),
            cells = stats.indexer().combinations(),
            cost = total,
            "CPT cost"
        );
        Ok(total)
    }
}
