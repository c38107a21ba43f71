//! leaf — pluggable cell learners for CPT cells.
//!
//! Purpose
//! -------
//! Provide the per-cell model families a CPT delegates to. Each learner turns
//! one cell's data into a fitted model and a message length, without knowing
//! anything about the parents that index the enclosing table.
//!
//! Key behaviors
//! -------------
//! - [`AdaptiveCodeLearner`]: adaptive-code cost, `(n + bias)` estimates.
//! - [`MlMultinomialLearner`]: maximum-likelihood frequencies, NLL cost.
//! - [`Mml87MultinomialLearner`]: Wallace–Freeman multinomial.
//! - [`NormalLearner`]: Gaussian cells with an MML87 cost.
//! - [`NestedCptLearner`]: an inner CPT over the cell's context parents.
//!
//! Downstream usage
//! ----------------
//! - `cpt::CptLearner<L: LeafLearner>` is generic over these learners.

pub mod adaptive;
pub mod ml;
pub mod mml87;
pub mod multinomial;
pub mod nested;
pub mod normal;
pub mod traits;

// ---- Re-exports (primary public surface) ---
pub use self::adaptive::AdaptiveCodeLearner;
pub use self::ml::MlMultinomialLearner;
pub use self::mml87::Mml87MultinomialLearner;
pub use self::multinomial::MultinomialModel;
pub use self::nested::{NestedCptLearner, NestedCptModel};
pub use self::normal::{NormalLearner, NormalModel, NormalOptions, NormalParams, NormalStats};
pub use self::traits::{CellData, LeafLearner, LeafModel};

pub mod prelude {
    pub use super::{
        AdaptiveCodeLearner, LeafLearner, LeafModel, MlMultinomialLearner,
        Mml87MultinomialLearner, MultinomialModel, NestedCptLearner, NormalLearner, NormalOptions,
    };
}
