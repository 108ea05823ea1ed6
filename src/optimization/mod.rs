//! optimization: MLE stack, parameter transforms, and unified error surface.
//!
//! Purpose
//! -------
//! Provide the optimization layer that the selection models are fitted
//! with: an Argmin-backed log-likelihood maximizer, the numerically stable
//! transforms that keep the dispersion positive and the correlation inside
//! (−1, 1), and a single error/result surface. Model code implements a
//! log-likelihood and its gradient, chooses tolerances, and receives fitted
//! parameters and diagnostics without touching backend solver details.
//!
//! Key behaviors
//! -------------
//! - Expose a high-level API for **maximizing log-likelihoods** `ℓ(θ)`
//!   (`loglik_optimizer`), including solver selection, stopping criteria,
//!   and finite-difference Hessians for observed information.
//! - Supply the bounded links (`numerical_stability`) used by the Heckman
//!   kernel: `σ = exp(η)` with an exponent clamp and
//!   `ρ = (1 − margin)·tanh(η)`, plus their inverses, Jacobians, normal
//!   CDF helpers that survive far tails, and a delta-method helper.
//! - Normalize configuration issues, numerical failures, and backend solver
//!   errors into one enum (`errors::OptError`) with the alias
//!   `OptResult<T>`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Optimizers operate in an unconstrained parameter space `θ` and assume
//!   finite inputs once validation has passed; invalid states are reported
//!   as `OptError`, not panics.
//! - Model log-likelihoods treat domain violations (wrong θ length,
//!   non-finite contributions) as recoverable errors surfaced through this
//!   layer.
//!
//! Conventions
//! -----------
//! - Solvers maximize `ℓ(θ)` by minimizing the cost `c(θ) = -ℓ(θ)`;
//!   user-facing outcomes are always expressed in terms of `ℓ`.
//! - Parameters, gradients, and Hessians use the `ndarray` aliases
//!   `Theta`, `Grad`, and `Hessian`.
//! - This layer logs only at `debug` (start and finish of each solver
//!   run); the opt-in `obs_slog` feature attaches an Argmin terminal
//!   observer when `MLEOptions::verbose` is set.
//!
//! Downstream usage
//! ----------------
//! - `selection::models::GenHeckman` and `selection::core::probit::Probit`
//!   implement `LogLikelihood` and call `maximize`.
//! - `inference::hessian` calls `finite_diff::compute_hessian` on the
//!   analytic gradient to form the observed information.
//!
//! Testing notes
//! -------------
//! - Unit tests in the submodules cover solver wiring, tolerance handling,
//!   finite-difference fallbacks, transform round-trips, and the far-tail
//!   behavior of the normal helpers.

pub mod errors;
pub mod loglik_optimizer;
pub mod numerical_stability;

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::loglik_optimizer::prelude::*;
    pub use super::numerical_stability::prelude::*;
}
