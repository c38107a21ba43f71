//! Logit sufficient statistics — co-occurrence counts and state tallies.
//!
//! Purpose
//! -------
//! Summarize a node's data for the logit estimator in two additive pieces:
//!
//! - `joint[a][b]`: symmetric co-occurrence counts over a flat value space
//!   that concatenates every parent's states and then the child's states.
//!   Variable `v` occupies flat indices `offsets[v] .. offsets[v + 1]`.
//! - `tally[k][ps]`: child count per parent-state combination, which the
//!   estimator walks to accumulate likelihood and derivative sums over the
//!   combinations present in the data.
//!
//! Key behaviors
//! -------------
//! - Arity and cell caps are checked before any row is read.
//! - Only the upper triangle `i <= j` of variable pairs is counted per row;
//!   the lower triangle is mirrored afterwards.
//! - Zero-row data yields all-zero counts.
//!
//! Invariants & assumptions
//! ------------------------
//! - `joint` is symmetric and its diagonal block of variable `v` is diagonal
//!   with the marginal counts of `v`.
//! - `tally.sum() == rows`; merging two statistics over the same domains
//!   equals the statistics of the concatenated rows.
use crate::{
    data::{domain::Domain, errors::Column, indexer::ParentIndexer, node_data::NodeData},
    learner::errors::{LearnerError, LearnerResult},
    logit::options::LogitOptions,
};
use ndarray::{Array2, ArrayView1};

/// LogitStats — pairwise co-occurrence counts plus per-combination tally.
#[derive(Debug, Clone, PartialEq)]
pub struct LogitStats {
    indexer: ParentIndexer,
    child_domain: Domain,
    offsets: Vec<usize>,
    joint: Array2<u64>,
    tally: Array2<u64>,
}

/// Reject any variable whose arity exceeds `max_arity`.
pub(crate) fn check_arities(
    child: Domain, parents: &[Domain], max_arity: usize,
) -> LearnerResult<()> {
    if child.arity() > max_arity {
        return Err(LearnerError::ArityTooHigh {
            column: Column::Child,
            arity: child.arity(),
            max_arity,
        });
    }
    for (i, domain) in parents.iter().enumerate() {
        if domain.arity() > max_arity {
            return Err(LearnerError::ArityTooHigh {
                column: Column::Parent(i),
                arity: domain.arity(),
                max_arity,
            });
        }
    }
    Ok(())
}

impl LogitStats {
    /// Count co-occurrences and per-combination child states.
    ///
    /// Parameters
    /// ----------
    /// - `data`: validated node data.
    /// - `options`: supplies `max_arity` and `max_cells`.
    ///
    /// Errors
    /// ------
    /// - `LearnerError::ArityTooHigh` when the child or a parent exceeds the
    ///   arity cap.
    /// - `LearnerError::ExcessiveCombinations` when `child arity ×
    ///   combinations` exceeds the cell cap.
    pub fn from_data(data: &NodeData, options: &LogitOptions) -> LearnerResult<Self> {
        let child_domain = data.child_domain();
        check_arities(child_domain, data.parent_domains(), options.max_arity)?;
        let indexer =
            ParentIndexer::new(data.parent_domains(), child_domain.arity(), Some(options.max_cells))?;

        let mut offsets = Vec::with_capacity(data.num_parents() + 2);
        offsets.push(0);
        for domain in data.parent_domains().iter().chain(std::iter::once(&child_domain)) {
            let last = offsets[offsets.len() - 1];
            offsets.push(last + domain.arity());
        }
        let width = offsets[offsets.len() - 1];
        let vars = data.num_parents() + 1;

        let mut joint = Array2::<u64>::zeros((width, width));
        let mut tally = Array2::<u64>::zeros((child_domain.arity(), indexer.combinations()));
        let mut flat = vec![0usize; vars];
        let parents = data.parents();
        for (row, tuple) in parents.rows().into_iter().enumerate() {
            for (i, slot) in flat.iter_mut().enumerate().take(data.num_parents()) {
                *slot = offsets[i] + data.parent_state(row, i);
            }
            let child_state = data.child_state(row);
            flat[vars - 1] = offsets[vars - 1] + child_state;
            for i in 0..vars {
                for j in i..vars {
                    joint[[flat[i], flat[j]]] += 1;
                }
            }
            let index = indexer.encode_row(tuple.iter().copied(), tuple.len(), Some(row))?;
            tally[[child_state, index]] += 1;
        }
        for a in 0..width {
            for b in 0..a {
                joint[[a, b]] = joint[[b, a]];
            }
        }

        Ok(LogitStats { indexer, child_domain, offsets, joint, tally })
    }

    pub fn indexer(&self) -> &ParentIndexer {
        &self.indexer
    }

    pub fn child_domain(&self) -> Domain {
        self.child_domain
    }

    pub fn parent_arities(&self) -> Vec<usize> {
        self.indexer.domains().iter().map(Domain::arity).collect()
    }

    /// Start of each variable's block in the flat value space; the child is
    /// the last variable and `offsets.last()` is the total width.
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    pub fn joint(&self) -> &Array2<u64> {
        &self.joint
    }

    pub fn tally(&self) -> &Array2<u64> {
        &self.tally
    }

    pub fn rows(&self) -> u64 {
        self.tally.sum()
    }

    fn child_offset(&self) -> usize {
        self.offsets[self.indexer.num_parents()]
    }

    /// Rows with child state `k`.
    pub fn child_count(&self, k: usize) -> u64 {
        let flat = self.child_offset() + k;
        self.joint[[flat, flat]]
    }

    /// Rows with child state `k` and parent `i` in state `x`.
    pub fn child_parent_count(&self, k: usize, i: usize, x: usize) -> u64 {
        self.joint[[self.child_offset() + k, self.offsets[i] + x]]
    }

    /// Child tally of one combination.
    pub fn combination_counts(&self, index: usize) -> ArrayView1<'_, u64> {
        self.tally.column(index)
    }

    /// Indices of combinations observed at least once, ascending.
    pub fn present_combinations(&self) -> Vec<usize> {
        (0..self.indexer.combinations())
            .filter(|&ps| self.tally.column(ps).sum() > 0)
            .collect()
    }

    /// Sum of two statistics over identical domains.
    ///
    /// Errors
    /// ------
    /// - `LearnerError::ParamShapeMismatch` when the domains differ.
    pub fn merge(&self, other: &LogitStats) -> LearnerResult<LogitStats> {
        if self.indexer != other.indexer || self.child_domain != other.child_domain {
            return Err(LearnerError::ParamShapeMismatch {
                what: "logit statistics",
                expected: self.joint.len(),
                found: other.joint.len(),
            });
        }
        Ok(LogitStats {
            indexer: self.indexer.clone(),
            child_domain: self.child_domain,
            offsets: self.offsets.clone(),
            joint: &self.joint + &other.joint,
            tally: &self.tally + &other.tally,
        })
    }
}
