//! CPT model — exact per-combination table delegating to cell models.
//!
//! Purpose
//! -------
//! Evaluate P(child | parents) by decoding the indexed part of the parent
//! tuple into a combination index and delegating to that cell's leaf model
//! and parameters, with the remaining parent values as the cell's context.
//!
//! Key behaviors
//! -------------
//! - `log_probability`, `predict`, and `generate` look up one cell.
//! - [`CptModel::generate_rows`] draws one child per parent row. Without
//!   context columns each cell's values are drawn in one batch and scattered
//!   back to row order.
//! - [`CptModel::explicit_params`] builds multinomial cell parameters from an
//!   explicit probability table.
//!
//! Invariants & assumptions
//! ------------------------
//! - `CptParams` for a model holds exactly `combinations` cells, in
//!   combination-index order.
//! - Parent tuples are `indexed parents ++ context parents`.
//! - The model carries no parameters; the same model value can be paired
//!   with any conforming `CptParams`.
use crate::{
    data::{domain::Domain, indexer::ParentIndexer},
    leaf::{
        multinomial::{MultinomialModel, validate_probabilities},
        traits::LeafModel,
    },
    learner::{
        errors::{LearnerError, LearnerResult},
        traits::LocalModel,
    },
};
use ndarray::ArrayView2;
use rand::Rng;
use std::marker::PhantomData;

/// One table cell: a leaf model and its parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CptCell<M: LeafModel> {
    pub model: M,
    pub params: M::Params,
}

/// CptParams — one cell per parent-state combination.
#[derive(Debug, Clone, PartialEq)]
pub struct CptParams<M: LeafModel> {
    pub cells: Vec<CptCell<M>>,
}

impl<M: LeafModel> CptParams<M> {
    /// Total free parameters over all cells.
    pub fn num_params(&self) -> usize {
        self.cells.iter().map(|c| c.model.num_params(&c.params)).sum()
    }
}

/// CptModel — parent indexer, child domain, and context columns.
#[derive(Debug, Clone, PartialEq)]
pub struct CptModel<M> {
    indexer: ParentIndexer,
    child_domain: Domain,
    context: Vec<Domain>,
    _leaf: PhantomData<fn() -> M>,
}

impl<M: LeafModel> CptModel<M> {
    /// Table indexed by every parent.
    pub fn new(indexer: ParentIndexer, child_domain: Domain) -> Self {
        Self::with_context(indexer, child_domain, Vec::new())
    }

    /// Table whose cells also see the `context` parent columns.
    pub fn with_context(indexer: ParentIndexer, child_domain: Domain, context: Vec<Domain>) -> Self {
        CptModel { indexer, child_domain, context, _leaf: PhantomData }
    }

    pub fn indexer(&self) -> &ParentIndexer {
        &self.indexer
    }

    pub fn context_domains(&self) -> &[Domain] {
        &self.context
    }

    /// Split a full parent tuple into its indexed and context parts.
    fn split<'t>(&self, parents: &'t [i32]) -> LearnerResult<(&'t [i32], &'t [i32])> {
        let expected = self.indexer.num_parents() + self.context.len();
        if parents.len() != expected {
            return Err(LearnerError::TupleLengthMismatch { expected, found: parents.len() });
        }
        Ok(parents.split_at(self.indexer.num_parents()))
    }

    fn cell<'p, 't>(
        &self, parents: &'t [i32], params: &'p CptParams<M>,
    ) -> LearnerResult<(&'p CptCell<M>, &'t [i32])> {
        self.check_cells(params)?;
        let (indexed, context) = self.split(parents)?;
        let index = self.indexer.encode(indexed)?;
        Ok((&params.cells[index], context))
    }

    fn check_cells(&self, params: &CptParams<M>) -> LearnerResult<()> {
        if params.cells.len() != self.indexer.combinations() {
            return Err(LearnerError::ParamShapeMismatch {
                what: "CPT cells",
                expected: self.indexer.combinations(),
                found: params.cells.len(),
            });
        }
        Ok(())
    }

    /// Draw one child value per row of `parents`.
    ///
    /// Parameters
    /// ----------
    /// - `rng`: random source.
    /// - `parents`: `rows x num_parents` matrix of raw parent values,
    ///   indexed columns first.
    /// - `params`: cell parameters.
    ///
    /// Returns
    /// -------
    /// `LearnerResult<Vec<i32>>` with one child value per row, in row order.
    ///
    /// Errors
    /// ------
    /// - Data errors for rows outside the declared parent domains.
    /// - Leaf sampling errors.
    pub fn generate_rows<R: Rng + ?Sized>(
        &self, rng: &mut R, parents: ArrayView2<i32>, params: &CptParams<M>,
    ) -> LearnerResult<Vec<i32>> {
        self.check_cells(params)?;
        let expected = self.indexer.num_parents() + self.context.len();
        if parents.ncols() != expected {
            return Err(LearnerError::TupleLengthMismatch { expected, found: parents.ncols() });
        }
        let indexed = self.indexer.num_parents();

        let mut out = vec![self.child_domain.lwb(); parents.nrows()];
        if !self.context.is_empty() {
            for (row, tuple) in parents.rows().into_iter().enumerate() {
                let index =
                    self.indexer.encode_row(tuple.iter().take(indexed).copied(), indexed, Some(row))?;
                let context: Vec<i32> = tuple.iter().skip(indexed).copied().collect();
                let cell = &params.cells[index];
                if let Some(&value) = cell.model.generate(rng, 1, &context, &cell.params)?.first() {
                    out[row] = value;
                }
            }
            return Ok(out);
        }

        let mut rows_per_cell: Vec<Vec<usize>> = vec![Vec::new(); self.indexer.combinations()];
        for (row, tuple) in parents.rows().into_iter().enumerate() {
            let index = self.indexer.encode_row(tuple.iter().copied(), tuple.len(), Some(row))?;
            rows_per_cell[index].push(row);
        }
        for (cell, rows) in params.cells.iter().zip(&rows_per_cell) {
            if rows.is_empty() {
                continue;
            }
            let draws = cell.model.generate(rng, rows.len(), &[], &cell.params)?;
            for (&row, value) in rows.iter().zip(draws) {
                out[row] = value;
            }
        }
        Ok(out)
    }
}

impl CptModel<MultinomialModel> {
    /// Multinomial cell parameters from an explicit table.
    ///
    /// Parameters
    /// ----------
    /// - `table`: `combinations x child_arity`; row `i` is the child
    ///   distribution of combination `i`.
    ///
    /// Errors
    /// ------
    /// - `LearnerError::ParamShapeMismatch` for a wrong number of rows or
    ///   columns.
    /// - `LearnerError::InvalidProbabilities` for rows that are not
    ///   distributions.
    pub fn explicit_params(
        &self, table: ArrayView2<f64>,
    ) -> LearnerResult<CptParams<MultinomialModel>> {
        if table.nrows() != self.indexer.combinations() {
            return Err(LearnerError::ParamShapeMismatch {
                what: "CPT table rows",
                expected: self.indexer.combinations(),
                found: table.nrows(),
            });
        }
        let arity = self.child_domain.arity();
        let mut cells = Vec::with_capacity(table.nrows());
        for (i, row) in table.rows().into_iter().enumerate() {
            validate_probabilities(row, arity, i)?;
            cells.push(CptCell { model: MultinomialModel::new(self.child_domain), params: row.to_owned() });
        }
        Ok(CptParams { cells })
    }
}

impl<M: LeafModel> LocalModel for CptModel<M> {
    type Params = CptParams<M>;

    fn child_domain(&self) -> Domain {
        self.child_domain
    }

    fn log_probability(
        &self, child: i32, parents: &[i32], params: &CptParams<M>,
    ) -> LearnerResult<f64> {
        let (cell, context) = self.cell(parents, params)?;
        cell.model.log_probability(child, context, &cell.params)
    }

    fn predict(&self, parents: &[i32], params: &CptParams<M>) -> LearnerResult<i32> {
        let (cell, context) = self.cell(parents, params)?;
        cell.model.predict(context, &cell.params)
    }

    fn generate<R: Rng + ?Sized>(
        &self, rng: &mut R, n: usize, parents: &[i32], params: &CptParams<M>,
    ) -> LearnerResult<Vec<i32>> {
        let (cell, context) = self.cell(parents, params)?;
        cell.model.generate(rng, n, context, &cell.params)
    }

    fn num_params(&self, params: &CptParams<M>) -> usize {
        params.num_params()
    }
}
