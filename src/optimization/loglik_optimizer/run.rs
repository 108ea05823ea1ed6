//! Executor wrapper that runs an L-BFGS solver and returns an [`OptimOutcome`].
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        Grad, LogLikelihood, MLEOptions, OptimOutcome, Theta, adapter::ArgMinAdapter,
    },
};
use argmin::core::{CostFunction, Executor, Gradient, State};
use argmin_math::ArgminL2Norm;

/// Run `solver` on `problem` from `theta0`.
///
/// Wiring
/// ------
/// - `theta0` is placed on the executor state; `opts.tols.max_iter` (when
///   set) becomes the executor's iteration cap.
/// - The starting log-likelihood and gradient norm are logged at `debug`.
/// - With the `obs_slog` feature and `opts.verbose`, an Argmin terminal
///   observer reports every iteration.
///
/// Argmin evaluates its stopping rules once before the first iteration, so
/// a start that already satisfies the gradient tolerance returns with zero
/// iterations.
///
/// Errors
/// ------
/// - Solver, line-search, or model errors raised during the run.
/// - Outcome validation errors (missing or non-finite θ̂, non-finite ℓ).
pub fn run_lbfgs<'a, F, S>(
    theta0: Theta, opts: &MLEOptions, problem: ArgMinAdapter<'a, F>, solver: S,
) -> OptResult<OptimOutcome>
where
    F: LogLikelihood,
    S: argmin::core::Solver<
            ArgMinAdapter<'a, F>,
            argmin::core::IterState<Theta, Grad, (), (), (), f64>,
        > + Send
        + 'static,
{
    log_initial_state(&theta0, &problem);

    let mut optimizer = Executor::new(problem, solver);
    optimizer = optimizer.configure(|state| state.param(theta0));
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        optimizer = optimizer.add_observer(observer, argmin::core::observers::ObserverMode::Always);
    }
    if let Some(max_iter) = opts.tols.max_iter {
        optimizer = optimizer.configure(|state| state.max_iters(max_iter as u64));
    }

    let mut state = optimizer.run()?.state().clone();
    let iterations = state.get_iter();
    let fn_evals = state.get_func_counts().clone();
    let termination = state.get_termination_status().clone();
    let grad = state.take_gradient();
    let outcome = OptimOutcome::new(
        state.take_best_param(),
        -state.get_best_cost(),
        termination,
        iterations,
        fn_evals,
        grad,
    )?;
    log::debug!(
        "lbfgs finished: status = {}, iterations = {}, loglik = {:.6}",
        outcome.status,
        outcome.iterations,
        outcome.value
    );
    Ok(outcome)
}

fn log_initial_state<F: LogLikelihood>(theta0: &Theta, problem: &ArgMinAdapter<'_, F>) {
    if !log::log_enabled!(log::Level::Debug) {
        return;
    }
    let ll0 = problem.cost(theta0).map(|c| -c).ok();
    let g0 = problem.gradient(theta0).ok().map(|g| g.l2_norm());
    log::debug!("lbfgs start: dim = {}, loglik = {:?}, |grad| = {:?}", theta0.len(), ll0, g0);
}
