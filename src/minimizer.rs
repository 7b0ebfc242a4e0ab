//! Derivative-free bounded minimization via COBYLA
//!
//! COBYLA (Constrained Optimization BY Linear Approximations) builds linear
//! approximations of the objective inside a shrinking trust region and needs
//! no derivatives, which suits the ring intensity objective: the profile
//! smoothing and the interpolation make analytic gradients impractical.
//! Bounds are handled as linear constraints. The algorithm is described in
//! M.J.D. Powell's 1994 paper "A direct search optimization method that
//! models the objective and constraint functions by linear interpolation".

use cobyla::{Func, RhoBeg, StopTols, minimize};
use itertools::izip;
use ordered_float::NotNan;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Bounds further than this from the start point (in step units) are treated
/// as unbounded; COBYLA wants finite constraint values.
const BOUND_CLAMP: f64 = 1e6;

/// Options of the bounded derivative-free minimizer.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
pub struct MinimizerOptions {
    /// Maximum number of objective evaluations.
    pub niterations: u32,
    /// Relative tolerance on the objective value for convergence.
    pub ftol_rel: NotNan<f64>,
    /// Error scale of the objective; 0.5 is the convention for a −2·ln L
    /// function. Sets the absolute function tolerance.
    pub errordef: NotNan<f64>,
}

impl MinimizerOptions {
    /// Create a new [MinimizerOptions].
    ///
    /// # Arguments
    /// - `niterations`: maximum number of objective evaluations
    /// - `ftol_rel`: relative tolerance on the objective value
    /// - `errordef`: error scale of the objective, 0.5 for −2·ln L
    pub fn new(niterations: u32, ftol_rel: f64, errordef: f64) -> Self {
        assert!(niterations > 0, "niterations must be positive");
        assert!(ftol_rel >= 0.0, "ftol_rel must be non-negative");
        assert!(ftol_rel.is_finite(), "ftol_rel must be finite");
        assert!(errordef > 0.0, "errordef must be positive");
        assert!(errordef.is_finite(), "errordef must be finite");
        Self {
            niterations,
            ftol_rel: NotNan::new(ftol_rel).expect("ftol_rel must be finite and not NaN"),
            errordef: NotNan::new(errordef).expect("errordef must be finite and not NaN"),
        }
    }

    #[inline]
    pub fn default_niterations() -> u32 {
        2000
    }

    #[inline]
    pub fn default_ftol_rel() -> f64 {
        1e-6
    }

    #[inline]
    pub fn default_errordef() -> f64 {
        0.5
    }
}

impl Default for MinimizerOptions {
    fn default() -> Self {
        Self::new(
            Self::default_niterations(),
            Self::default_ftol_rel(),
            Self::default_errordef(),
        )
    }
}

/// Result of one bounded minimization.
#[derive(Clone, Debug, PartialEq)]
pub struct MinimizerResult {
    /// Best parameter values found, in the caller's coordinates.
    pub x: Vec<f64>,
    /// Objective value at `x`.
    pub fmin: f64,
    /// Whether a stopping tolerance was met within the evaluation budget.
    pub converged: bool,
}

/// Minimize `objective` subject to per-parameter bounds.
///
/// The search runs in step-scaled coordinates `y = (x - initial) / step`, so
/// every parameter starts with a unit trust radius regardless of its physical
/// scale; `steps` plays the role of the per-parameter initial step size.
/// `initial`, `steps`, `lower` and `upper` must all have the same length and
/// every step must be positive.
pub fn minimize_bounded<F>(
    objective: F,
    initial: &[f64],
    steps: &[f64],
    lower: &[f64],
    upper: &[f64],
    options: &MinimizerOptions,
) -> MinimizerResult
where
    F: Fn(&[f64]) -> f64,
{
    debug_assert_eq!(initial.len(), steps.len());
    debug_assert_eq!(initial.len(), lower.len());
    debug_assert_eq!(initial.len(), upper.len());

    let unscale = |y: &[f64]| -> Vec<f64> {
        izip!(y, initial, steps)
            .map(|(&yi, &x0, &step)| x0 + yi * step)
            .collect()
    };

    let scaled_objective = |y: &[f64], _user_data: &mut ()| -> f64 { objective(&unscale(y)) };

    let bounds: Vec<(f64, f64)> = izip!(lower, upper, initial, steps)
        .map(|(&lb, &ub, &x0, &step)| {
            let lo = ((lb - x0) / step).max(-BOUND_CLAMP);
            let hi = ((ub - x0) / step).min(BOUND_CLAMP);
            (lo, hi)
        })
        .collect();

    let y0 = vec![0.0; initial.len()];

    // bounds already express every constraint
    let constraints: Vec<&dyn Func<()>> = vec![];

    let stop_tol = StopTols {
        ftol_rel: options.ftol_rel.into_inner(),
        ftol_abs: 2e-3 * options.errordef.into_inner(),
        ..StopTols::default()
    };

    let result = minimize(
        scaled_objective,
        &y0,
        &bounds,
        &constraints,
        (),
        options.niterations as usize,
        RhoBeg::All(1.0),
        Some(stop_tol),
    );

    match result {
        Ok((status, y, fmin)) => {
            let converged = matches!(
                status,
                cobyla::SuccessStatus::Success
                    | cobyla::SuccessStatus::FtolReached
                    | cobyla::SuccessStatus::XtolReached
            );
            MinimizerResult {
                x: unscale(&y),
                fmin,
                converged,
            }
        }
        Err((_status, y, fmin)) => MinimizerResult {
            x: unscale(&y),
            fmin,
            converged: false,
        },
    }
}
