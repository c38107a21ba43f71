//! learner — the node-local learner contract, its errors, and the factory.
//!
//! Purpose
//! -------
//! Collect the pieces every model family shares: the four-operation
//! [`ModelLearner`] trait, the [`LocalModel`] evaluation trait, the
//! object-safe [`NodeCoster`] view, the [`LearnerError`] taxonomy, and
//! [`build_learner`].
//!
//! Downstream usage
//! ----------------
//! - `cpt::CptLearner` and `logit::LogitLearner` implement `ModelLearner`.
//! - An outer structure search holds a `Box<dyn NodeCoster>` and calls
//!   `node_cost` per candidate parent set, treating
//!   `LearnerError::is_infeasible` failures as rejected parent sets.

pub mod errors;
pub mod factory;
pub mod traits;

// ---- Re-exports (primary public surface) ---
pub use self::errors::{LearnerError, LearnerResult, ScheduleKind};
pub use self::factory::{LeafConfig, LearnerConfig, build_learner};
pub use self::traits::{Learned, LocalModel, ModelLearner, NodeCoster};

pub mod prelude {
    pub use super::{
        LearnerConfig, LearnerError, LearnerResult, LocalModel, ModelLearner, NodeCoster,
        build_learner,
    };
}
