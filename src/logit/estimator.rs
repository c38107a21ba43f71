//! Newton-Raphson estimator of the logit parameters.
//!
//! Purpose
//! -------
//! Find the MAP estimate of the logit parameters under an independent
//! Gaussian prior `N(0, σ²)` on every parameter, starting from zero and
//! iterating damped Newton steps `h = F⁻¹ g` until the NLL settles.
//!
//! Key behaviors
//! -------------
//! - Each iteration recomputes the NLL, derivative sums, and Fisher matrix at
//!   the current parameters, adapts the step scale with the active
//!   [`StepSchedule`], factors `F`, solves for `h`, applies the scaled step,
//!   clamps each free parameter to `±param_cap`, and recomputes the
//!   dependent entries.
//! - Convergence: `old_delta < 1e-5`, `−0.01 < delta < 1e-5`, where `delta`
//!   is the change in NLL over the iteration.
//! - A NaN NLL ends the pass as non-converged before `F` is factored, so
//!   the conservative retry still runs.
//! - If the aggressive pass does not converge, one conservative pass restarts
//!   from zero; if that fails too the fit is a convergence failure.
//! - A non-positive Cholesky pivot fails the fit immediately; it is not
//!   retried.
//!
//! Invariants & assumptions
//! ------------------------
//! - All state lives in a per-call context; one estimator can serve
//!   concurrent fits.
//! - Statistics already passed the arity and cell caps.
use crate::{
    learner::errors::{LearnerError, LearnerResult, ScheduleKind},
    logit::{
        cholesky::{CholeskyError, CholeskyFactor},
        layout::ParamLayout,
        model::LogitParams,
        options::{LogitOptions, StepSchedule},
        stats::LogitStats,
        sums::{PresentState, accumulate, gradient, present_states},
    },
};
use ndarray::Array1;
use tracing::{debug, instrument, trace, warn};

pub const CONVERGENCE_TOL: f64 = 1e-5;
pub const WORSENING_TOL: f64 = 0.01;

/// LogitFit — fitted parameters plus a record of how they were found.
///
/// Fields
/// ------
/// - `params`: MAP parameters.
/// - `iterations`: iterations of the pass that converged.
/// - `schedule`: schedule of the converged pass.
/// - `nll`: NLL evaluated at the start of the final iteration.
/// - `used_fallback`: whether the conservative retry was needed.
/// - `aggressive_iters`: iterations spent in the aggressive pass.
#[derive(Debug, Clone, PartialEq)]
pub struct LogitFit {
    pub params: LogitParams,
    pub iterations: usize,
    pub schedule: ScheduleKind,
    pub nll: f64,
    pub used_fallback: bool,
    pub aggressive_iters: usize,
}

/// Per-call estimation state shared by both passes.
pub(crate) struct FitContext<'a> {
    pub(crate) stats: &'a LogitStats,
    pub(crate) layout: ParamLayout,
    pub(crate) present: Vec<PresentState>,
    pub(crate) options: &'a LogitOptions,
}

impl<'a> FitContext<'a> {
    pub(crate) fn new(stats: &'a LogitStats, options: &'a LogitOptions) -> Self {
        let layout = ParamLayout::new(stats.child_domain().arity(), &stats.parent_arities());
        let present = present_states(stats, &layout);
        FitContext { stats, layout, present, options }
    }

    /// Learner error for a failed factorization or solve at `iteration`.
    pub(crate) fn cholesky_failure(&self, err: CholeskyError, iteration: usize) -> LearnerError {
        match err {
            CholeskyError::NotPositiveDefinite { index, pivot } => LearnerError::SingularFisher {
                pivot_index: index,
                pivot,
                iteration,
                child_arity: self.layout.child_arity(),
                parent_arities: self.layout.parent_arities().to_vec(),
            },
            CholeskyError::NotSquare { rows, cols } => LearnerError::ParamShapeMismatch {
                what: "Fisher matrix columns",
                expected: rows,
                found: cols,
            },
            CholeskyError::LengthMismatch { expected, found } => LearnerError::ParamShapeMismatch {
                what: "Newton gradient",
                expected,
                found,
            },
        }
    }
}

/// One Newton iteration as seen by the step schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
struct IterationRecord {
    nll: f64,
    delta: f64,
    scale: f64,
    halved: bool,
}

enum PassOutcome {
    Converged { params: LogitParams, iterations: usize, nll: f64 },
    Stalled { iterations: usize, last_delta: f64 },
}

fn run_pass(
    ctx: &FitContext<'_>, schedule: &StepSchedule, mut history: Option<&mut Vec<IterationRecord>>,
) -> LearnerResult<PassOutcome> {
    let layout = &ctx.layout;
    let tau = ctx.options.prior_precision();
    let cap = ctx.options.param_cap;

    let mut free = Array1::<f64>::zeros(layout.nfree());
    let mut params = layout.params_from_free(free.view());
    let mut scale = schedule.initial_scale;
    let mut delta = -1.0;
    let mut old_delta;
    let mut nll = 0.0;
    let mut iterations = 0;

    while iterations < schedule.max_iters {
        iterations += 1;
        let nll_old = nll;
        let full = iterations > ctx.options.diagonal_warmup_iters;
        let sums = accumulate(&ctx.present, layout, &params, tau, full);
        nll = sums.nll;
        old_delta = delta;
        delta = nll - nll_old;
        let adapted = schedule.adapt(iterations, scale, delta, &mut old_delta);
        let record = IterationRecord { nll, delta, scale: adapted, halved: adapted < scale };
        trace!(
            iteration = iterations,
            nll = record.nll,
            delta = record.delta,
            scale = record.scale,
            halved = record.halved,
            schedule = %schedule.kind,
            "newton step"
        );
        if let Some(records) = history.as_mut() {
            records.push(record);
        }
        scale = adapted;
        if nll.is_nan() {
            break;
        }

        let g = gradient(ctx.stats, layout, &sums, &params, tau);
        let h = CholeskyFactor::factor(sums.fisher.view())
            .and_then(|factor| factor.solve(g.view()))
            .map_err(|e| ctx.cholesky_failure(e, iterations))?;

        let step = if scale >= 1.0 { 1.0 } else { scale };
        for (theta, dh) in free.iter_mut().zip(h.iter()) {
            *theta = (*theta + step * dh).clamp(-cap, cap);
        }
        params = layout.params_from_free(free.view());

        if old_delta < CONVERGENCE_TOL && delta > -WORSENING_TOL && delta < CONVERGENCE_TOL {
            return Ok(PassOutcome::Converged { params, iterations, nll });
        }
    }

    Ok(PassOutcome::Stalled { iterations, last_delta: delta })
}

/// Fit logit parameters by Newton-Raphson.
///
/// Parameters
/// ----------
/// - `stats`: logit sufficient statistics.
/// - `options`: prior, clamp, and step schedules.
///
/// Returns
/// -------
/// `LearnerResult<LogitFit>`
///
/// Errors
/// ------
/// - `LearnerError::SingularFisher` when a Cholesky pivot is not positive.
/// - `LearnerError::ConvergenceFailure` when neither schedule converges.
#[instrument(
    level = "debug",
    skip_all,
    fields(child_arity = stats.child_domain().arity(), parents = stats.indexer().num_parents())
)]
pub fn estimate(stats: &LogitStats, options: &LogitOptions) -> LearnerResult<LogitFit> {
    let ctx = FitContext::new(stats, options);

    let aggressive_iters = match run_pass(&ctx, &options.aggressive, None)? {
        PassOutcome::Converged { params, iterations, nll } => {
            debug!(iterations, nll, "logit converged");
            return Ok(LogitFit {
                params,
                iterations,
                schedule: options.aggressive.kind,
                nll,
                used_fallback: false,
                aggressive_iters: iterations,
            });
        }
        PassOutcome::Stalled { iterations, last_delta } => {
            warn!(iterations, last_delta, "aggressive schedule stalled; retrying conservatively");
            iterations
        }
    };

    match run_pass(&ctx, &options.conservative, None)? {
        PassOutcome::Converged { params, iterations, nll } => {
            debug!(iterations, nll, "logit converged on fallback schedule");
            Ok(LogitFit {
                params,
                iterations,
                schedule: options.conservative.kind,
                nll,
                used_fallback: true,
                aggressive_iters,
            })
        }
        PassOutcome::Stalled { iterations, last_delta } => Err(LearnerError::ConvergenceFailure {
            aggressive_iters,
            conservative_iters: iterations,
            last_delta,
            child_arity: ctx.layout.child_arity(),
            parent_arities: ctx.layout.parent_arities().to_vec(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{domain::Domain, node_data::NodeData};
    use approx::assert_relative_eq;
    use ndarray::{Array1, Array2, array};

    fn separable() -> LogitStats {
        let d2 = Domain::with_arity(2).unwrap();
        let parent = Array2::from_shape_fn((40, 1), |(r, _)| (r % 2) as i32);
        let child = parent.column(0).to_owned();
        let data = NodeData::new(child, parent, d2, vec![d2]).unwrap();
        LogitStats::from_data(&data, &LogitOptions::default()).unwrap()
    }

    fn noisy() -> LogitStats {
        let data = NodeData::new(
            array![0, 1, 2, 2, 1, 0, 0, 2, 1, 1, 0, 2],
            array![
                [0, 0], [0, 1], [1, 2], [1, 1], [0, 2], [1, 0],
                [0, 0], [1, 2], [1, 1], [0, 1], [1, 1], [0, 0]
            ],
            Domain::with_arity(3).unwrap(),
            vec![Domain::with_arity(2).unwrap(), Domain::with_arity(3).unwrap()],
        )
        .unwrap();
        LogitStats::from_data(&data, &LogitOptions::default()).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Verify that the aggressive schedule converges on ordinary data and
    // lands at a stationary point of the penalized likelihood.
    //
    // Given
    // -----
    // - Ternary child, parents of arity 2 and 3, 12 rows.
    //
    // Expect
    // ------
    // - Converged without fallback; gradient ≈ 0 at the fit; NLL below the
    //   NLL of the zero start (12 ln 3).
    fn estimate_converges_to_stationary_point() {
        // Arrange
        let stats = noisy();
        let options = LogitOptions::default();

        // Act
        let fit = estimate(&stats, &options).unwrap();

        // Assert
        assert!(!fit.used_fallback);
        assert_eq!(fit.schedule, ScheduleKind::Aggressive);
        let ctx = FitContext::new(&stats, &options);
        let sums = accumulate(&ctx.present, &ctx.layout, &fit.params, options.prior_precision(), true);
        let g = gradient(&stats, &ctx.layout, &sums, &fit.params, options.prior_precision());
        assert!(g.iter().all(|v| v.abs() < 1e-2), "gradient not near zero: {g:?}");
        assert!(sums.nll < 12.0 * 3f64.ln());
        assert_relative_eq!(fit.params.c.sum(), 0.0, epsilon = 1e-9);
    }

    #[test]
    // Purpose
    // -------
    // Verify clamping on perfectly separable data.
    //
    // Given
    // -----
    // - Binary child equal to its binary parent on 40 rows.
    //
    // Expect
    // ------
    // - A finite fit with every parameter within ±15 and
    //   `d[0][0][0] > 0` (child 0 favoured when the parent is 0).
    fn estimate_separable_data_stays_bounded() {
        // Arrange
        let stats = separable();

        // Act
        let fit = estimate(&stats, &LogitOptions::default()).unwrap();

        // Assert
        assert!(fit.params.c.iter().chain(fit.params.d[0].iter()).all(|v| v.abs() <= 15.0 + 1e-9));
        assert!(fit.params.d[0][[0, 0]] > 0.0);
        assert!(fit.nll.is_finite());
    }

    #[test]
    // Purpose
    // -------
    // Verify the fallback and failure paths.
    //
    // Given
    // -----
    // - One-iteration schedules, which cannot satisfy the two-iteration
    //   convergence test on data with signal.
    //
    // Expect
    // ------
    // - `ConvergenceFailure` with 1 + 1 iterations, classified as infeasible.
    fn estimate_reports_total_convergence_failure() {
        // Arrange
        let stats = noisy();
        let options = LogitOptions::default().with_schedules(
            StepSchedule::new(0.5, 1, ScheduleKind::Aggressive).unwrap(),
            StepSchedule::new(0.2, 1, ScheduleKind::Conservative).unwrap(),
        );

        // Act
        let err = estimate(&stats, &options).unwrap_err();

        // Assert
        match err {
            LearnerError::ConvergenceFailure { aggressive_iters, conservative_iters, .. } => {
                assert_eq!((aggressive_iters, conservative_iters), (1, 1));
                assert!(err.is_infeasible());
            }
            other => panic!("Expected ConvergenceFailure, got {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify that two fits of the same statistics are bitwise identical and
    // that diagonal warm-up still reaches the same optimum.
    //
    // Given
    // -----
    // - The 12-row dataset; default options and a 3-iteration warm-up.
    //
    // Expect
    // ------
    // - Identical `LogitFit` records for repeated default fits.
    // - Warm-up parameters within 1e-2 of the default fit.
    fn estimate_is_deterministic() {
        // Arrange
        let stats = noisy();
        let options = LogitOptions::default();

        // Act
        let a = estimate(&stats, &options).unwrap();
        let b = estimate(&stats, &options).unwrap();
        let warm = estimate(&stats, &options.with_diagonal_warmup(3)).unwrap();

        // Assert
        assert_eq!(a, b);
        for (x, y) in a.params.c.iter().zip(warm.params.c.iter()) {
            assert_relative_eq!(*x, *y, epsilon = 1e-2);
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify that a NaN likelihood ends each pass without escalating to a
    // Cholesky failure, so the conservative retry runs.
    //
    // Given
    // -----
    // - Five binary rows and `prior_sd = 1e-200`, whose prior precision
    //   overflows and makes the NLL NaN after the first step.
    //
    // Expect
    // ------
    // - `ConvergenceFailure` after two iterations of each pass with a NaN
    //   last delta; never `SingularFisher`.
    fn estimate_nan_likelihood_falls_through_to_conservative_pass() {
        // Arrange
        let d2 = Domain::with_arity(2).unwrap();
        let data = NodeData::without_parents(array![0, 1, 1, 0, 1], d2).unwrap();
        let options = LogitOptions::new(1e-200, 15.0, 20, 65_000).unwrap();
        let stats = LogitStats::from_data(&data, &options).unwrap();

        // Act
        let err = estimate(&stats, &options).unwrap_err();

        // Assert
        match err {
            LearnerError::ConvergenceFailure {
                aggressive_iters, conservative_iters, last_delta, ..
            } => {
                assert_eq!((aggressive_iters, conservative_iters), (2, 2));
                assert!(last_delta.is_nan());
            }
            other => panic!("Expected ConvergenceFailure, got {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify a successful conservative fallback.
    //
    // Given
    // -----
    // - The 12-row dataset; a 3-iteration aggressive schedule, which cannot
    //   pass the convergence test, and the default conservative schedule.
    //
    // Expect
    // ------
    // - A converged fit with `used_fallback`, the conservative schedule,
    //   3 aggressive iterations, and the same optimum as the default fit.
    fn estimate_recovers_on_conservative_schedule() {
        // Arrange
        let stats = noisy();
        let options = LogitOptions::default().with_schedules(
            StepSchedule::new(0.5, 3, ScheduleKind::Aggressive).unwrap(),
            StepSchedule::conservative(),
        );

        // Act
        let fit = estimate(&stats, &options).unwrap();
        let reference = estimate(&stats, &LogitOptions::default()).unwrap();

        // Assert
        assert!(fit.used_fallback);
        assert_eq!(fit.schedule, ScheduleKind::Conservative);
        assert_eq!(fit.aggressive_iters, 3);
        for (x, y) in fit.params.c.iter().zip(reference.params.c.iter()) {
            assert_relative_eq!(*x, *y, epsilon = 5e-2);
        }
    }

    #[test]
    // Purpose
    // -------
    // Ensure a Fisher matrix with a zero pivot fails the fit with
    // `SingularFisher` on the first iteration.
    //
    // Given
    // -----
    // - A binary child with zero rows and an infinite prior sd, so the
    //   Fisher matrix is identically zero.
    //
    // Expect
    // ------
    // - `SingularFisher { pivot_index: 0, pivot: 0, iteration: 1 }`,
    //   classified as infeasible.
    fn estimate_reports_singular_fisher() {
        // Arrange
        let d2 = Domain::with_arity(2).unwrap();
        let data = NodeData::without_parents(Array1::zeros(0), d2).unwrap();
        let options = LogitOptions { prior_sd: f64::INFINITY, ..LogitOptions::default() };
        let stats = LogitStats::from_data(&data, &options).unwrap();

        // Act
        let err = estimate(&stats, &options).unwrap_err();

        // Assert
        match err {
            LearnerError::SingularFisher { pivot_index, pivot, iteration, child_arity, .. } => {
                assert_eq!((pivot_index, iteration, child_arity), (0, 1, 2));
                assert_eq!(pivot, 0.0);
                assert!(err.is_infeasible());
            }
            other => panic!("Expected SingularFisher, got {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify that the penalized NLL does not rise on iterations where the
    // schedule kept its step scale.
    //
    // Given
    // -----
    // - The 12-row dataset, each default schedule run as a single pass.
    //
    // Expect
    // ------
    // - Both passes converge.
    // - From the second iteration on, an iteration whose scale was not
    //   halved raises the NLL by at most 1e-5; the final NLL is below the
    //   NLL at the zero start.
    fn newton_pass_nll_is_monotone_between_damping_events() {
        // Arrange
        let stats = noisy();
        let options = LogitOptions::default();
        let ctx = FitContext::new(&stats, &options);

        for schedule in [options.aggressive, options.conservative] {
            // Act
            let mut history = Vec::new();
            let outcome = run_pass(&ctx, &schedule, Some(&mut history)).unwrap();

            // Assert
            assert!(matches!(outcome, PassOutcome::Converged { .. }), "{} stalled", schedule.kind);
            for pair in history.windows(2) {
                let (prev, cur) = (pair[0], pair[1]);
                if !cur.halved {
                    assert!(
                        cur.nll - prev.nll <= CONVERGENCE_TOL,
                        "NLL rose from {} to {} at undamped scale {}",
                        prev.nll,
                        cur.nll,
                        cur.scale
                    );
                }
            }
            let first = history.first().map(|r| r.nll).unwrap();
            let last = history.last().map(|r| r.nll).unwrap();
            assert!(last < first);
        }
    }
}
