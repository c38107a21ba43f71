//! Learner contract — the capability every node-local model family provides.
//!
//! Purpose
//! -------
//! Define the narrow interface the outer structure search uses to score a
//! child variable against a candidate parent set: build sufficient
//! statistics, estimate parameters, and cost a `(model, statistics,
//! parameters)` triple in nits.
//!
//! Key behaviors
//! -------------
//! - [`LocalModel`] evaluates a fitted conditional distribution:
//!   log-probability, mode, and sampling, all given explicit parameters.
//! - [`ModelLearner`] exposes the four learner operations
//!   (`parameterize`, `cost`, `parameterize_and_cost`,
//!   `sufficient_statistics`) plus `parameterize_statistics` so that one
//!   statistics value can be refit and recosted without revisiting rows.
//! - [`NodeCoster`] is an object-safe view of any learner that only needs the
//!   fused cost, used by the configuration-driven factory.
//!
//! Invariants & assumptions
//! ------------------------
//! - All operations are pure functions of their inputs; a learner holds only
//!   immutable configuration, so one instance can serve concurrent calls.
//! - Costs are non-negative message lengths in nits for discrete children.
//!
//! Conventions
//! -----------
//! - Child and parent values are raw values inside their declared domains,
//!   not 0-based states.
use crate::{
    data::{domain::Domain, node_data::NodeData},
    learner::errors::LearnerResult,
};
use rand::Rng;

/// Learned — the `(model, statistics, parameters)` triple of one fit.
#[derive(Debug, Clone, PartialEq)]
pub struct Learned<M, S, P> {
    pub model: M,
    pub stats: S,
    pub params: P,
}

/// LocalModel — evaluation of P(child | parents) given fitted parameters.
pub trait LocalModel {
    type Params;

    /// Declared domain of the child.
    fn child_domain(&self) -> Domain;

    /// `ln P(child | parents)` under `params`.
    ///
    /// Errors
    /// ------
    /// - `LearnerError::ValueOutOfRange` / `TupleLengthMismatch` when `child`
    ///   or `parents` do not match the declared domains.
    /// - `LearnerError::ParamShapeMismatch` when `params` belongs to a model
    ///   of a different shape.
    fn log_probability(&self, child: i32, parents: &[i32], params: &Self::Params)
    -> LearnerResult<f64>;

    /// Most probable child value for `parents`.
    fn predict(&self, parents: &[i32], params: &Self::Params) -> LearnerResult<i32>;

    /// Draw `n` child values for `parents`.
    fn generate<R: Rng + ?Sized>(
        &self, rng: &mut R, n: usize, parents: &[i32], params: &Self::Params,
    ) -> LearnerResult<Vec<i32>>;

    /// Number of free parameters in `params`.
    fn num_params(&self, params: &Self::Params) -> usize;

    /// Total log-probability of every row of `data` under `params`.
    fn log_likelihood(&self, data: &NodeData, params: &Self::Params) -> LearnerResult<f64> {
        let parents = data.parents();
        let child = data.child();
        let mut total = 0.0;
        for (row, tuple) in parents.rows().into_iter().enumerate() {
            let tuple = tuple.to_vec();
            total += self.log_probability(child[row], &tuple, params)?;
        }
        Ok(total)
    }
}

/// ModelLearner — the four-operation learner contract.
pub trait ModelLearner {
    type Model: LocalModel<Params = Self::Params>;
    type Stats;
    type Params;

    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Summarize `data` into a reusable statistics value.
    fn sufficient_statistics(&self, data: &NodeData) -> LearnerResult<Self::Stats>;

    /// Estimate parameters from previously computed statistics.
    fn parameterize_statistics(&self, stats: &Self::Stats)
    -> LearnerResult<(Self::Model, Self::Params)>;

    /// Message length of `(model, stats, params)` in nits.
    fn cost(&self, model: &Self::Model, stats: &Self::Stats, params: &Self::Params)
    -> LearnerResult<f64>;

    /// Build statistics and estimate parameters.
    fn parameterize(
        &self, data: &NodeData,
    ) -> LearnerResult<Learned<Self::Model, Self::Stats, Self::Params>> {
        let stats = self.sufficient_statistics(data)?;
        let (model, params) = self.parameterize_statistics(&stats)?;
        Ok(Learned { model, stats, params })
    }

    /// Fused parameterize-then-cost.
    fn parameterize_and_cost(&self, data: &NodeData) -> LearnerResult<f64> {
        let learned = self.parameterize(data)?;
        self.cost(&learned.model, &learned.stats, &learned.params)
    }
}

/// NodeCoster — object-safe, cost-only view of a learner.
pub trait NodeCoster: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fused cost of `data` in nits.
    fn node_cost(&self, data: &NodeData) -> LearnerResult<f64>;
}

impl<T> NodeCoster for T
where
    T: ModelLearner + Send + Sync,
{
    fn name(&self) -> &'static str {
        ModelLearner::name(self)
    }

    fn node_cost(&self, data: &NodeData) -> LearnerResult<f64> {
        self.parameterize_and_cost(data)
    }
}
