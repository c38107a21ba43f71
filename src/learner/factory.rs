//! Configuration-driven learner construction.
//!
//! Purpose
//! -------
//! Turn an explicit [`LearnerConfig`] value into a boxed [`NodeCoster`], so
//! callers choose the model family, the CPT leaf learner, and numeric options
//! at the call site instead of reaching for preconfigured global instances.
//!
//! Key behaviors
//! -------------
//! - [`LeafConfig`] names the CPT cell learner and carries its options; the
//!   adaptive-code variant is validated when the learner is built.
//! - [`LearnerConfig::default`] is a CPT over the MML adaptive-code leaf with
//!   default options.
//! - [`build_learner`] is the only place configuration becomes behavior.
//!
//! Invariants & assumptions
//! ------------------------
//! - Built learners are immutable and `Send + Sync`; one box can be shared
//!   across threads that score different parent sets.
use crate::{
    cpt::{CptLearner, CptOptions},
    leaf::{
        AdaptiveCodeLearner, MlMultinomialLearner, Mml87MultinomialLearner, NormalLearner,
        NormalOptions,
    },
    learner::{errors::LearnerResult, traits::NodeCoster},
    logit::{LogitLearner, LogitOptions},
};
use tracing::debug;

/// LeafConfig — choice of CPT cell learner.
///
/// Variants
/// --------
/// - `Adaptive { bias, use_mml }`: adaptive-code multinomial; `bias` is the
///   per-state pseudo-count.
/// - `MaximumLikelihood`: frequency estimates with an NLL cost.
/// - `Mml87`: Wallace–Freeman multinomial.
/// - `Normal(NormalOptions)`: Gaussian cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LeafConfig {
    Adaptive { bias: f64, use_mml: bool },
    MaximumLikelihood,
    Mml87,
    Normal(NormalOptions),
}

impl LeafConfig {
    pub fn adaptive() -> Self {
        LeafConfig::Adaptive { bias: 0.5, use_mml: false }
    }

    pub fn mml_adaptive() -> Self {
        LeafConfig::Adaptive { bias: 0.5, use_mml: true }
    }

    pub fn adaptive2() -> Self {
        LeafConfig::Adaptive { bias: 1.0, use_mml: false }
    }

    pub fn mml_adaptive2() -> Self {
        LeafConfig::Adaptive { bias: 1.0, use_mml: true }
    }
}

impl Default for LeafConfig {
    fn default() -> Self {
        LeafConfig::mml_adaptive()
    }
}

/// LearnerConfig — model family plus its options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LearnerConfig {
    Cpt { options: CptOptions, leaf: LeafConfig },
    Logit(LogitOptions),
}

impl Default for LearnerConfig {
    fn default() -> Self {
        LearnerConfig::Cpt { options: CptOptions::default(), leaf: LeafConfig::default() }
    }
}

/// Build a learner from its configuration.
///
/// Parameters
/// ----------
/// - `config`: model family, leaf choice, and options.
///
/// Returns
/// -------
/// `LearnerResult<Box<dyn NodeCoster>>`
///
/// Errors
/// ------
/// - `LearnerError::InvalidOption` when the adaptive-code bias is not finite
///   and > 0.
pub fn build_learner(config: &LearnerConfig) -> LearnerResult<Box<dyn NodeCoster>> {
    let learner: Box<dyn NodeCoster> = match *config {
        LearnerConfig::Cpt { options, leaf } => match leaf {
            LeafConfig::Adaptive { bias, use_mml } => {
                Box::new(CptLearner::new(AdaptiveCodeLearner::new(bias, use_mml)?, options))
            }
            LeafConfig::MaximumLikelihood => {
                Box::new(CptLearner::new(MlMultinomialLearner::new(), options))
            }
            LeafConfig::Mml87 => Box::new(CptLearner::new(Mml87MultinomialLearner::new(), options)),
            LeafConfig::Normal(normal) => {
                Box::new(CptLearner::new(NormalLearner::new(normal), options))
            }
        },
        LearnerConfig::Logit(options) => Box::new(LogitLearner::new(options)),
    };
    debug!(learner = learner.name(), "built node learner");
    Ok(learner)
}
