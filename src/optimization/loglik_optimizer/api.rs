//! Single entry point for maximizing a log-likelihood.
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        OptimOutcome, Theta,
        adapter::ArgMinAdapter,
        builders::{build_optimizer_hager_zhang, build_optimizer_more_thuente},
        run::run_lbfgs,
        traits::{LineSearcher, LogLikelihood, MLEOptions},
    },
};

/// Maximize `ℓ(θ)` with L-BFGS starting from `theta0`.
///
/// Parameters
/// ----------
/// - `f`: model implementing [`LogLikelihood`].
/// - `theta0`: starting point in the unconstrained space; consumed.
/// - `data`: payload passed to every `value`/`grad` call.
/// - `opts`: tolerances, line search, memory, verbosity.
///
/// Returns
/// -------
/// An [`OptimOutcome`] whose `value` is `ℓ(θ̂)`. The outcome is returned
/// even when `converged == false`; deciding whether that is fatal is the
/// caller's job.
///
/// Errors
/// ------
/// - Anything raised by `f.check(theta0, data)`.
/// - Solver configuration errors (invalid tolerances).
/// - Model or line-search errors raised during the run.
pub fn maximize<F: LogLikelihood>(
    f: &F, theta0: Theta, data: &F::Data, opts: &MLEOptions,
) -> OptResult<OptimOutcome> {
    f.check(&theta0, data)?;
    let problem = ArgMinAdapter::new(f, data);
    match opts.line_searcher {
        LineSearcher::MoreThuente => {
            run_lbfgs(theta0, opts, problem, build_optimizer_more_thuente(opts)?)
        }
        LineSearcher::HagerZhang => {
            run_lbfgs(theta0, opts, problem, build_optimizer_hager_zhang(opts)?)
        }
    }
}
