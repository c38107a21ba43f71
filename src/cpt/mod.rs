//! cpt — exact conditional probability tables over discrete parents.
//!
//! Purpose
//! -------
//! Represent P(child | parents) as one independent leaf distribution per
//! parent-state combination, learned and costed by a pluggable
//! [`LeafLearner`](crate::leaf::LeafLearner).
//!
//! Key behaviors
//! -------------
//! - [`CptStats`] tallies the child per combination and is additive.
//! - [`CptLearner`] parameterizes cells independently; the CPT cost is the sum
//!   of cell costs.
//! - [`CptModel`] evaluates, predicts, and samples through the matching cell.
//! - [`CptOptions`] caps `combinations × child arity` (default 64 000) and
//!   can index the table by a leading subset of the parents, leaving the
//!   rest to the cells.
//!
//! Downstream usage
//! ----------------
//! - `learner::factory::build_learner` wraps a configured `CptLearner` as a
//!   `NodeCoster`.

pub mod learner;
pub mod model;
pub mod options;
pub mod stats;

// ---- Re-exports (primary public surface) ---
pub use self::learner::CptLearner;
pub use self::model::{CptCell, CptModel, CptParams};
pub use self::options::{CptOptions, DEFAULT_MAX_CELLS};
pub use self::stats::CptStats;

pub mod prelude {
    pub use super::{CptLearner, CptModel, CptOptions, CptParams, CptStats};
}
