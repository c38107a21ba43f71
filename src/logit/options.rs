//! Logit options — prior, clamps, resource caps, and Newton step schedules.
//!
//! Purpose
//! -------
//! Collect every tunable constant of the logit estimator in one validated
//! value so that fits are reproducible from configuration alone.
//!
//! Key behaviors
//! -------------
//! - [`StepSchedule::aggressive`]: initial step scale 0.5, at most 500
//!   iterations; the scale jumps to 1 on iteration 3, halves after a worse
//!   iteration, and grows by 1.0905077 (doubling about every 6 iterations)
//!   otherwise.
//! - [`StepSchedule::conservative`]: initial scale 0.2, at most 150
//!   iterations; the scale only ever halves.
//! - [`LogitOptions::default`]: prior sd 3, clamp ±15, arity cap 20, cell cap
//!   65 000, no diagonal warm-up.
//!
//! Invariants & assumptions
//! ------------------------
//! - `prior_sd`, `param_cap`, and schedule scales are finite and > 0.
//! - `max_iters >= 1` for both schedules.
use crate::learner::errors::{LearnerError, LearnerResult, ScheduleKind};

pub const DEFAULT_PRIOR_SD: f64 = 3.0;
pub const DEFAULT_PARAM_CAP: f64 = 15.0;
pub const DEFAULT_MAX_ARITY: usize = 20;
pub const DEFAULT_LOGIT_MAX_CELLS: u64 = 65_000;

/// Per-iteration growth factor of the aggressive scale.
pub const SCALE_GROWTH: f64 = 1.0905077;

/// StepSchedule — damping schedule of one Newton-Raphson pass.
///
/// Fields
/// ------
/// - `initial_scale`: step multiplier at iteration 1.
/// - `max_iters`: iteration cap of the pass.
/// - `kind`: adaptation rule applied from iteration 3 on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepSchedule {
    pub initial_scale: f64,
    pub max_iters: usize,
    pub kind: ScheduleKind,
}

impl StepSchedule {
    pub fn aggressive() -> Self {
        StepSchedule { initial_scale: 0.5, max_iters: 500, kind: ScheduleKind::Aggressive }
    }

    pub fn conservative() -> Self {
        StepSchedule { initial_scale: 0.2, max_iters: 150, kind: ScheduleKind::Conservative }
    }

    /// Errors
    /// ------
    /// - `LearnerError::InvalidOption` for a non-positive scale or a zero
    ///   iteration cap.
    pub fn new(initial_scale: f64, max_iters: usize, kind: ScheduleKind) -> LearnerResult<Self> {
        if !initial_scale.is_finite() || initial_scale <= 0.0 {
            return Err(LearnerError::InvalidOption {
                name: "initial_scale",
                value: initial_scale,
                reason: "step scale must be finite and > 0",
            });
        }
        if max_iters == 0 {
            return Err(LearnerError::InvalidOption {
                name: "max_iters",
                value: 0.0,
                reason: "iteration cap must be at least 1",
            });
        }
        Ok(StepSchedule { initial_scale, max_iters, kind })
    }

    /// Scale for the next iteration.
    ///
    /// Parameters
    /// ----------
    /// - `iteration`: 1-based iteration that just computed `delta`.
    /// - `scale`: current scale.
    /// - `delta`: change in NLL over the last iteration.
    /// - `old_delta`: previous change in NLL; the aggressive rule flips its
    ///   sign on iteration 3.
    pub(crate) fn adapt(&self, iteration: usize, scale: f64, delta: f64, old_delta: &mut f64) -> f64 {
        if iteration <= 2 {
            return scale;
        }
        match self.kind {
            ScheduleKind::Aggressive => {
                if iteration == 3 {
                    *old_delta = -*old_delta;
                    1.0
                } else if delta > 0.0 {
                    scale * 0.5
                } else if scale < 0.999 {
                    scale * SCALE_GROWTH
                } else {
                    scale
                }
            }
            ScheduleKind::Conservative => {
                if delta > 0.0 {
                    scale * 0.5
                } else {
                    scale
                }
            }
        }
    }
}

/// LogitOptions — full configuration of the logit learner.
///
/// Fields
/// ------
/// - `prior_sd`: standard deviation σ of the Gaussian prior on every
///   parameter.
/// - `param_cap`: symmetric clamp applied to free parameters after each step.
/// - `max_arity`: largest admissible child or parent arity.
/// - `max_cells`: cap on `child arity × parent combinations`.
/// - `aggressive`, `conservative`: first and fallback step schedules.
/// - `diagonal_warmup_iters`: iterations that use only the Fisher diagonal;
///   0 uses the full matrix throughout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogitOptions {
    pub prior_sd: f64,
    pub param_cap: f64,
    pub max_arity: usize,
    pub max_cells: u64,
    pub aggressive: StepSchedule,
    pub conservative: StepSchedule,
    pub diagonal_warmup_iters: usize,
}

impl LogitOptions {
    /// Construct validated options with the default schedules.
    ///
    /// Errors
    /// ------
    /// - `LearnerError::InvalidOption` when `prior_sd` or `param_cap` is not
    ///   finite and > 0, or when `max_arity` or `max_cells` is 0.
    pub fn new(
        prior_sd: f64, param_cap: f64, max_arity: usize, max_cells: u64,
    ) -> LearnerResult<Self> {
        if !prior_sd.is_finite() || prior_sd <= 0.0 {
            return Err(LearnerError::InvalidOption {
                name: "prior_sd",
                value: prior_sd,
                reason: "prior standard deviation must be finite and > 0",
            });
        }
        if !param_cap.is_finite() || param_cap <= 0.0 {
            return Err(LearnerError::InvalidOption {
                name: "param_cap",
                value: param_cap,
                reason: "parameter clamp must be finite and > 0",
            });
        }
        if max_arity == 0 {
            return Err(LearnerError::InvalidOption {
                name: "max_arity",
                value: 0.0,
                reason: "arity cap must be at least 1",
            });
        }
        if max_cells == 0 {
            return Err(LearnerError::InvalidOption {
                name: "max_cells",
                value: 0.0,
                reason: "cell cap must be at least 1",
            });
        }
        Ok(LogitOptions {
            prior_sd,
            param_cap,
            max_arity,
            max_cells,
            aggressive: StepSchedule::aggressive(),
            conservative: StepSchedule::conservative(),
            diagonal_warmup_iters: 0,
        })
    }

    pub fn with_schedules(mut self, aggressive: StepSchedule, conservative: StepSchedule) -> Self {
        self.aggressive = aggressive;
        self.conservative = conservative;
        self
    }

    pub fn with_diagonal_warmup(mut self, iters: usize) -> Self {
        self.diagonal_warmup_iters = iters;
        self
    }

    /// `1 / σ²`.
    pub fn prior_precision(&self) -> f64 {
        1.0 / (self.prior_sd * self.prior_sd)
    }
}

impl Default for LogitOptions {
    fn default() -> Self {
        LogitOptions {
            prior_sd: DEFAULT_PRIOR_SD,
            param_cap: DEFAULT_PARAM_CAP,
            max_arity: DEFAULT_MAX_ARITY,
            max_cells: DEFAULT_LOGIT_MAX_CELLS,
            aggressive: StepSchedule::aggressive(),
            conservative: StepSchedule::conservative(),
            diagonal_warmup_iters: 0,
        }
    }
}
