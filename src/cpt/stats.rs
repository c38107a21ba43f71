//! CPT sufficient statistics — per-combination child tallies.
//!
//! Purpose
//! -------
//! Summarize a node's data as a 2-D tally `count[childState][combination]`,
//! one column per combination of the indexed parents, which is all a
//! counting leaf needs to fit and cost every cell. When the table indexes
//! only a leading subset of the parents, the rows of each cell are kept over
//! the remaining (context) columns for leaves that model them.
//!
//! Key behaviors
//! -------------
//! - [`CptStats::from_data`] builds the parent indexer first, so an oversized
//!   parent set fails with a capacity error before any row is touched.
//! - Zero-row data yields an all-zero tally.
//! - [`CptStats::merge`] adds two tallies over the same domains; tallies of
//!   disjoint row subsets merge to the tally of their union. Context rows are
//!   appended cell by cell.
//!
//! Invariants & assumptions
//! ------------------------
//! - `tally.shape() == [child_arity, combinations]`.
//! - `tally.sum() == rows` of the data that produced it.
//! - With context, cell `i` holds exactly `tally.column(i).sum()` rows.
use crate::{
    data::{domain::Domain, indexer::ParentIndexer, node_data::NodeData},
    leaf::traits::CellData,
    learner::errors::{LearnerError, LearnerResult},
};
use ndarray::{Array2, ArrayView1};

/// CptStats — child tally per parent-state combination.
#[derive(Debug, Clone, PartialEq)]
pub struct CptStats {
    indexer: ParentIndexer,
    child_domain: Domain,
    tally: Array2<u64>,
    context_domains: Vec<Domain>,
    context: Option<Vec<NodeData>>,
}

impl CptStats {
    /// Tally `data` by child state and combination of all its parents.
    ///
    /// Parameters
    /// ----------
    /// - `data`: validated node data.
    /// - `max_cells`: cap on `combinations × child arity`.
    ///
    /// Errors
    /// ------
    /// - `LearnerError::ExcessiveCombinations` when the cap is exceeded.
    pub fn from_data(data: &NodeData, max_cells: Option<u64>) -> LearnerResult<Self> {
        Self::from_data_split(data, data.num_parents(), max_cells)
    }

    /// Tally `data` by the first `indexed` parents, keeping the remaining
    /// parent columns as per-cell context rows.
    ///
    /// Parameters
    /// ----------
    /// - `data`: validated node data.
    /// - `indexed`: number of leading parents indexing the table; capped at
    ///   `data.num_parents()`.
    /// - `max_cells`: cap on `combinations × child arity` of the indexed
    ///   parents.
    ///
    /// Errors
    /// ------
    /// - `LearnerError::ExcessiveCombinations` when the cap is exceeded.
    pub fn from_data_split(
        data: &NodeData, indexed: usize, max_cells: Option<u64>,
    ) -> LearnerResult<Self> {
        let indexed = indexed.min(data.num_parents());
        let child_domain = data.child_domain();
        let indexer =
            ParentIndexer::new(&data.parent_domains()[..indexed], child_domain.arity(), max_cells)?;
        let mut tally = Array2::<u64>::zeros((child_domain.arity(), indexer.combinations()));
        let keep_context = indexed < data.num_parents();
        let mut members: Vec<Vec<usize>> =
            if keep_context { vec![Vec::new(); indexer.combinations()] } else { Vec::new() };

        let parents = data.parents();
        for (row, tuple) in parents.rows().into_iter().enumerate() {
            let index = indexer.encode_row(tuple.iter().take(indexed).copied(), indexed, Some(row))?;
            tally[[data.child_state(row), index]] += 1;
            if keep_context {
                members[index].push(row);
            }
        }

        let context_domains = data.parent_domains()[indexed..].to_vec();
        let context = keep_context.then(|| {
            let tail = data.trailing_parents(indexed);
            members.iter().map(|rows| tail.select_rows(rows)).collect()
        });
        Ok(CptStats { indexer, child_domain, tally, context_domains, context })
    }

    pub fn indexer(&self) -> &ParentIndexer {
        &self.indexer
    }

    pub fn child_domain(&self) -> Domain {
        self.child_domain
    }

    /// Domains of the parent columns left to the cells.
    pub fn context_domains(&self) -> &[Domain] {
        &self.context_domains
    }

    /// Full tally, `child_arity x combinations`.
    pub fn tally(&self) -> &Array2<u64> {
        &self.tally
    }

    /// Child tally of one combination.
    pub fn cell_counts(&self, index: usize) -> ArrayView1<'_, u64> {
        self.tally.column(index)
    }

    /// Rows of one combination over the context columns, if any are kept.
    pub fn cell_rows(&self, index: usize) -> Option<&NodeData> {
        self.context.as_ref().map(|cells| &cells[index])
    }

    /// Everything a leaf learner sees of one combination.
    pub fn cell(&self, index: usize) -> CellData<'_> {
        CellData::new(self.child_domain, self.cell_counts(index), self.cell_rows(index))
    }

    /// Total number of rows summarized.
    pub fn rows(&self) -> u64 {
        self.tally.sum()
    }

    /// Sum of two tallies over identical domains.
    ///
    /// Errors
    /// ------
    /// - `LearnerError::ParamShapeMismatch` when the tallies were built for
    ///   different domains or different context columns.
    pub fn merge(&self, other: &CptStats) -> LearnerResult<CptStats> {
        if self.indexer != other.indexer
            || self.child_domain != other.child_domain
            || self.context_domains != other.context_domains
        {
            return Err(LearnerError::ParamShapeMismatch {
                what: "CPT tally",
                expected: self.tally.len(),
                found: other.tally.len(),
            });
        }
        let context = match (&self.context, &other.context) {
            (Some(a), Some(b)) => {
                let cells = a.iter().zip(b).map(|(x, y)| x.append(y)).collect::<Result<Vec<_>, _>>()?;
                Some(cells)
            }
            _ => None,
        };
        Ok(CptStats {
            indexer: self.indexer.clone(),
            child_domain: self.child_domain,
            tally: &self.tally + &other.tally,
            context_domains: self.context_domains.clone(),
            context,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn two_parent_data() -> NodeData {
        let d2 = Domain::with_arity(2).unwrap();
        let d3 = Domain::with_arity(3).unwrap();
        NodeData::new(
            array![0, 1, 1, 0, 1, 1],
            array![[0, 0], [1, 0], [1, 2], [0, 2], [1, 2], [0, 1]],
            d2,
            vec![d2, d3],
        )
        .unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Verify tally placement by child state and combination index.
    //
    // Given
    // -----
    // - Binary child, parents of arity 2 and 3 (6 combinations), 6 rows.
    //
    // Expect
    // ------
    // - Combination 5 = (1, 2) holds two rows with child 1; total 6.
    fn cpt_stats_tally_by_combination() {
        // Act
        let stats = CptStats::from_data(&two_parent_data(), None).unwrap();

        // Assert
        assert_eq!(stats.tally().shape(), &[2, 6]);
        assert_eq!(stats.cell_counts(5).to_vec(), vec![0, 2]);
        assert_eq!(stats.cell_counts(0).to_vec(), vec![1, 0]);
        assert_eq!(stats.cell_counts(3).to_vec(), vec![0, 0]);
        assert_eq!(stats.rows(), 6);
    }

    #[test]
    // Purpose
    // -------
    // Verify additivity over a disjoint split of the rows.
    //
    // Given
    // -----
    // - The 6-row dataset split into rows {0, 2, 4} and {1, 3, 5}.
    //
    // Expect
    // ------
    // - `merge` of the halves equals the whole.
    fn cpt_stats_merge_of_disjoint_split_equals_whole() {
        // Arrange
        let data = two_parent_data();
        let whole = CptStats::from_data(&data, None).unwrap();

        // Act
        let a = CptStats::from_data(&data.select_rows(&[0, 2, 4]), None).unwrap();
        let b = CptStats::from_data(&data.select_rows(&[1, 3, 5]), None).unwrap();

        // Assert
        assert_eq!(a.merge(&b).unwrap(), whole);
    }

    #[test]
    // Purpose
    // -------
    // Verify that an empty dataset produces an all-zero tally and that the
    // cell cap is checked before counting.
    //
    // Given
    // -----
    // - Zero rows with the two-parent schema; cap 11 (< 12 cells).
    //
    // Expect
    // ------
    // - Zero tally without a cap; `ExcessiveCombinations` with cap 11.
    fn cpt_stats_empty_data_and_capacity() {
        // Arrange
        let empty = two_parent_data().select_rows(&[]);

        // Act
        let stats = CptStats::from_data(&empty, None).unwrap();
        let err = CptStats::from_data(&empty, Some(11)).unwrap_err();

        // Assert
        assert_eq!(stats.rows(), 0);
        assert!(stats.tally().iter().all(|&c| c == 0));
        assert!(matches!(err, LearnerError::ExcessiveCombinations { combinations: 6, .. }));
    }

    #[test]
    // Purpose
    // -------
    // Verify that a split table keeps each cell's rows over the context
    // columns and that merging appends them.
    //
    // Given
    // -----
    // - The 6-row dataset indexed by its first parent only.
    //
    // Expect
    // ------
    // - Two combinations; cell 1 holds rows {1, 2, 4} with context values
    //   (0, 2, 2); the merged halves keep the same tally and three rows in
    //   cell 1.
    fn cpt_stats_split_keeps_context_rows() {
        // Arrange
        let data = two_parent_data();

        // Act
        let stats = CptStats::from_data_split(&data, 1, None).unwrap();
        let a = CptStats::from_data_split(&data.select_rows(&[0, 1, 2]), 1, None).unwrap();
        let b = CptStats::from_data_split(&data.select_rows(&[3, 4, 5]), 1, None).unwrap();
        let merged = a.merge(&b).unwrap();

        // Assert
        assert_eq!(stats.indexer().combinations(), 2);
        assert_eq!(stats.context_domains(), &[Domain::with_arity(3).unwrap()]);
        let cell = stats.cell_rows(1).unwrap();
        assert_eq!(cell.child().to_vec(), vec![1, 1, 1]);
        assert_eq!(cell.parents().column(0).to_vec(), vec![0, 2, 2]);
        assert_eq!(merged.tally(), stats.tally());
        assert_eq!(merged.cell_rows(1).unwrap().rows(), 3);
        assert!(CptStats::from_data(&data, None).unwrap().cell_rows(0).is_none());
    }
}
