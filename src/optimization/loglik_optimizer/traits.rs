//! Public surface of the log-likelihood optimizer.
//!
//! - [`LogLikelihood`]: the seam every estimator in the crate implements
//!   (the generalized Heckman model, the probit used for starting values).
//! - [`MLEOptions`] and [`Tolerances`]: stopping rules and solver choice.
//! - [`LineSearcher`]: line search used inside L-BFGS.
//! - [`OptimOutcome`]: normalized solver result, including whether the
//!   termination reason actually counts as convergence.
//!
//! Convention: callers *maximize* `ℓ(θ)`; the adapter minimizes
//! `c(θ) = -ℓ(θ)`. Analytic gradients are gradients of `ℓ`.
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{
        FnEvalMap, Grad, Theta,
        validation::{validate_theta_hat, validate_value, verify_tol_cost, verify_tol_grad},
    },
};
use argmin::core::{TerminationReason, TerminationStatus};
use argmin_math::ArgminL2Norm;
use std::str::FromStr;

/// Log-likelihood interface consumed by [`maximize`](super::maximize).
///
/// Required:
/// - `value(θ, data)`: evaluate `ℓ(θ)`. Return an `OptError` for invalid
///   inputs instead of a non-finite number where the failure is known.
/// - `check(θ, data)`: reject obviously invalid `θ`/`data` pairs before the
///   solver starts (length, finiteness).
///
/// Optional:
/// - `grad(θ, data)`: analytic `∇ℓ(θ)`. The default reports
///   [`OptError::GradientNotImplemented`], which makes the adapter fall back
///   to finite differences of the cost.
pub trait LogLikelihood {
    type Data;

    fn value(&self, theta: &Theta, data: &Self::Data) -> OptResult<f64>;
    fn check(&self, theta: &Theta, data: &Self::Data) -> OptResult<()>;

    fn grad(&self, _theta: &Theta, _data: &Self::Data) -> OptResult<Grad> {
        Err(OptError::GradientNotImplemented)
    }
}

/// Line search used inside L-BFGS. Parses case-insensitively from
/// `"MoreThuente"` / `"HagerZhang"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSearcher {
    MoreThuente,
    HagerZhang,
}

impl FromStr for LineSearcher {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morethuente" => Ok(LineSearcher::MoreThuente),
            "hagerzhang" => Ok(LineSearcher::HagerZhang),
            _ => Err(OptError::InvalidLineSearch {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'MoreThuente' or 'HagerZhang'.",
            }),
        }
    }
}

/// Optimizer configuration.
///
/// Fields
/// ------
/// - `tols`: stopping rules, see [`Tolerances`].
/// - `line_searcher`: line search used by L-BFGS.
/// - `verbose`: attach a terminal observer (only with the `obs_slog` feature).
/// - `lbfgs_mem`: L-BFGS history length; `None` means
///   [`DEFAULT_LBFGS_MEM`](super::DEFAULT_LBFGS_MEM).
///
/// Default
/// -------
/// `tol_grad = 1e-6`, `tol_cost = None` (Argmin's machine-epsilon rule),
/// `max_iter = 500`, More–Thuente, not verbose, default memory. The
/// gradient tolerance is meant for objectives on the *average*
/// log-likelihood scale, which is how the selection models report `ℓ` to
/// the solver.
#[derive(Debug, Clone, PartialEq)]
pub struct MLEOptions {
    pub tols: Tolerances,
    pub line_searcher: LineSearcher,
    pub verbose: bool,
    pub lbfgs_mem: Option<usize>,
}

impl MLEOptions {
    /// Build options; rejects `lbfgs_mem == Some(0)`.
    pub fn new(
        tols: Tolerances, line_searcher: LineSearcher, lbfgs_mem: Option<usize>,
    ) -> OptResult<Self> {
        if let Some(mem) = lbfgs_mem {
            if mem == 0 {
                return Err(OptError::InvalidLBFGSMem {
                    mem,
                    reason: "L-BFGS memory must be greater than zero.",
                });
            }
        }
        Ok(Self { tols, line_searcher, verbose: false, lbfgs_mem })
    }

    /// Same options with the progress observer switched on or off.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

impl Default for MLEOptions {
    fn default() -> Self {
        Self {
            tols: Tolerances { tol_grad: Some(1e-6), tol_cost: None, max_iter: Some(500) },
            line_searcher: LineSearcher::MoreThuente,
            verbose: false,
            lbfgs_mem: None,
        }
    }
}

/// Stopping rules for the solver.
///
/// At least one of the three must be present; present tolerances must be
/// finite and strictly positive, and `max_iter` must be positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub tol_grad: Option<f64>,
    pub tol_cost: Option<f64>,
    pub max_iter: Option<usize>,
}

impl Tolerances {
    /// Construct validated tolerances.
    ///
    /// Errors
    /// ------
    /// - [`OptError::NoTolerancesProvided`] if all three are `None`.
    /// - [`OptError::InvalidTolGrad`] / [`OptError::InvalidTolCost`] for
    ///   non-finite or non-positive tolerances.
    /// - [`OptError::InvalidMaxIter`] if `max_iter == Some(0)`.
    pub fn new(
        tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    ) -> OptResult<Self> {
        if tol_grad.is_none() && tol_cost.is_none() && max_iter.is_none() {
            return Err(OptError::NoTolerancesProvided);
        }
        verify_tol_grad(tol_grad)?;
        verify_tol_cost(tol_cost)?;
        if max_iter == Some(0) {
            return Err(OptError::InvalidMaxIter {
                max_iter: 0,
                reason: "Maximum iterations must be greater than zero.",
            });
        }
        Ok(Self { tol_grad, tol_cost, max_iter })
    }
}

/// Normalized result of one solver run.
///
/// - `theta_hat`: best parameter vector found (finite).
/// - `value`: `ℓ(θ̂)` on the scale the objective reports (not the cost).
/// - `converged`: `true` only when the solver stopped because its own
///   convergence test fired (or a target cost was reached). Hitting the
///   iteration cap, a timeout, an interrupt, or a solver exit is **not**
///   convergence.
/// - `status`: human-readable termination status.
/// - `iterations`, `fn_evals`: Argmin counters.
/// - `grad_norm`: L2 norm of the last cost gradient, when available.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimOutcome {
    pub theta_hat: Theta,
    pub value: f64,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
    pub grad_norm: Option<f64>,
}

impl OptimOutcome {
    /// Build a validated outcome from raw solver state.
    ///
    /// Errors
    /// ------
    /// - [`OptError::MissingThetaHat`] / [`OptError::InvalidThetaHat`] when the
    ///   solver produced no finite best parameter.
    /// - [`OptError::NonFiniteCost`] when `value` is not finite.
    pub fn new(
        theta_hat_opt: Option<Theta>, value: f64, termination: TerminationStatus,
        iterations: u64, fn_evals: FnEvalMap, grad: Option<Grad>,
    ) -> OptResult<Self> {
        let theta_hat = validate_theta_hat(theta_hat_opt)?;
        validate_value(value)?;
        let (converged, status) = match termination {
            TerminationStatus::NotTerminated => (false, "Not terminated".to_string()),
            TerminationStatus::Terminated(reason) => {
                let converged = matches!(
                    reason,
                    TerminationReason::SolverConverged | TerminationReason::TargetCostReached
                );
                (converged, format!("{reason:?}"))
            }
        };
        Ok(Self {
            theta_hat,
            value,
            converged,
            status,
            iterations: iterations as usize,
            fn_evals,
            grad_norm: grad.map(|g| g.l2_norm()),
        })
    }
}
