//! logit — multinomial logistic regression of a child on discrete parents.
//!
//! Purpose
//! -------
//! Model P(child | parents) with one intercept per child state and one
//! additive offset per (child state, parent, parent state), fitted to its MAP
//! estimate by Newton-Raphson and costed with an MML two-part message.
//!
//! Key behaviors
//! -------------
//! - [`LogitStats`] holds child and pairwise co-occurrence counts plus the
//!   per-combination child tally; it is additive.
//! - [`estimate`] runs an aggressive step schedule and falls back to a
//!   conservative one when the first diverges.
//! - [`mml_cost`] returns the prior, Fisher, likelihood, and lattice terms.
//! - [`CholeskyFactor`] is the dense solver behind both.
//!
//! Invariants & assumptions
//! ------------------------
//! - The last child state and the last state of each parent are references:
//!   their parameters are determined by the sum-to-zero constraints.
//! - Child and parent arities are capped by [`LogitOptions::max_arity`].
//!
//! Downstream usage
//! ----------------
//! - `learner::factory::build_learner` wraps a configured `LogitLearner` as a
//!   `NodeCoster`.

pub mod cholesky;
pub mod cost;
pub mod estimator;
pub(crate) mod layout;
pub mod learner;
pub mod model;
pub mod options;
pub mod stats;
pub(crate) mod sums;

// ---- Re-exports (primary public surface) ---
pub use self::cholesky::{CholeskyError, CholeskyFactor};
pub use self::cost::{MmlBreakdown, mml_cost};
pub use self::estimator::{LogitFit, estimate};
pub use self::learner::LogitLearner;
pub use self::model::{LogitModel, LogitParams};
pub use self::options::{
    DEFAULT_LOGIT_MAX_CELLS, DEFAULT_MAX_ARITY, DEFAULT_PARAM_CAP, DEFAULT_PRIOR_SD, LogitOptions,
    StepSchedule,
};
pub use self::stats::LogitStats;

pub mod prelude {
    pub use super::{LogitFit, LogitLearner, LogitModel, LogitOptions, LogitParams, LogitStats};
}
