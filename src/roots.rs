// SPDX: CC0-1.0

//! Newton-Raphson root search.

use crate::{evaluator::Evaluator, stdlib::X, Number};
use tracing::{debug, trace};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RootOptions {
    pub max_iterations: u32,
    /// An iterate only counts as a root if `|f(x)|` is below this.
    pub tolerance: Number,
    /// Relative step size below which the iteration has settled.
    pub step_tolerance: Number,
    /// The tangent counts as flat when `|f'(x)| <= derivative_epsilon * |f(x)|`,
    /// that is when the Newton step would exceed `1 / derivative_epsilon`.
    pub derivative_epsilon: Number,
    /// Iterates beyond this magnitude count as divergence once the Newton
    /// steps stop shrinking. A root farther out is still found as long as
    /// the steps toward it contract.
    pub divergence_limit: Number,
    /// Decimal places reported roots are rounded to.
    pub decimals: i32,
}

impl Default for RootOptions {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-4,
            step_tolerance: 1e-10,
            derivative_epsilon: 1e-12,
            divergence_limit: 1e10,
            decimals: 3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RootOutcome {
    Converged { x: Number, iterations: u32 },
    /// The tangent at `x` is (nearly) horizontal.
    FlatDerivative { x: Number, iteration: u32 },
    /// Iterates ran off toward infinity.
    Diverged { iteration: u32 },
    /// The function or its derivative is undefined at an iterate.
    Undefined { iteration: u32 },
    /// The iteration did not settle on a root within the iteration budget.
    NotConverged { x: Number },
}

impl RootOutcome {
    /// The root rounded to `decimals` places, if one was found.
    pub fn root(&self, decimals: i32) -> Option<Number> {
        match *self {
            Self::Converged { x, .. } => Some(round(x, decimals)),
            _ => None,
        }
    }
}

fn round(x: Number, decimals: i32) -> Number {
    let factor = Number::powi(10.0, decimals);
    // adding zero turns -0 into 0
    (x * factor).round() / factor + 0.0
}

/// Runs Newton's method on `f` with derivative `f_prime` starting from
/// `seed`.
///
/// An iterate is accepted once the Newton step has shrunk below
/// `step_tolerance` (relative to `|x|`) and `|f(x)| < tolerance` there. When
/// the iteration budget runs out, the last iterate is accepted if
/// `|f(x)| < tolerance` and the steps were still shrinking, which covers the
/// slow approach to a multiple root. A tiny residual alone is not enough: on
/// `1/x` the residual vanishes while the iterates run away.
pub fn newton<E: Evaluator>(
    evaluator: &E,
    f: &E::Expr,
    f_prime: &E::Expr,
    seed: Number,
    opts: &RootOptions,
) -> Result<RootOutcome, E::Error> {
    if !seed.is_finite() {
        return Ok(RootOutcome::Undefined { iteration: 0 });
    }

    let mut x = seed;
    let mut last_step = Number::INFINITY;
    let mut prev_step = Number::INFINITY;
    for iteration in 0..opts.max_iterations {
        let fx = evaluator.evaluate(f, x)?;
        if fx == 0.0 {
            return Ok(RootOutcome::Converged {
                x,
                iterations: iteration,
            });
        }
        let dfx = evaluator.evaluate(f_prime, x)?;
        trace!(iteration, x, fx, dfx, "newton step");

        if !(fx.is_finite() && dfx.is_finite()) {
            return Ok(RootOutcome::Undefined { iteration });
        }
        if dfx.abs() <= opts.derivative_epsilon * fx.abs() {
            return Ok(RootOutcome::FlatDerivative { x, iteration });
        }

        let step = fx / dfx;
        x -= step;
        if !x.is_finite() || (x.abs() > opts.divergence_limit && step.abs() >= last_step) {
            return Ok(RootOutcome::Diverged { iteration });
        }

        if step.abs() <= opts.step_tolerance * (1.0 + x.abs()) {
            let fx = evaluator.evaluate(f, x)?;
            return Ok(if fx.abs() < opts.tolerance {
                RootOutcome::Converged {
                    x,
                    iterations: iteration + 1,
                }
            } else {
                RootOutcome::NotConverged { x }
            });
        }
        prev_step = last_step;
        last_step = step.abs();
    }

    let fx = evaluator.evaluate(f, x)?;
    if fx.abs() < opts.tolerance && last_step < prev_step {
        return Ok(RootOutcome::Converged {
            x,
            iterations: opts.max_iterations,
        });
    }
    Ok(RootOutcome::NotConverged { x })
}

/// Finds a root of the expression `src` near `seed`, rounded to
/// `opts.decimals` places. Every failure, including malformed input,
/// yields NaN.
pub fn find_root<E: Evaluator>(evaluator: &E, src: &str, seed: Number, opts: &RootOptions) -> Number {
    let outcome = evaluator.simplify(src).and_then(|f| {
        let f_prime = evaluator.derivative(&f, X)?;
        newton(evaluator, &f, &f_prime, seed, opts)
    });
    match outcome {
        Ok(outcome) => {
            debug!(?outcome, seed, "root search finished");
            outcome.root(opts.decimals).unwrap_or(Number::NAN)
        }
        Err(err) => {
            debug!(%err, "root search failed");
            Number::NAN
        }
    }
}
