//! loglik_optimizer: Argmin-backed maximization of log-likelihoods.
//!
//! Purpose
//! -------
//! Give the selection models one way to fit: implement [`LogLikelihood`]
//! (value, input check, analytic gradient) and call [`maximize`] with an
//! [`MLEOptions`]. The same layer differentiates analytic gradients into
//! observed-information Hessians ([`finite_diff::compute_hessian`]).
//!
//! Key behaviors
//! -------------
//! - [`adapter::ArgMinAdapter`] turns `ℓ(θ)` into the cost `-ℓ(θ)` and
//!   supplies a finite-difference gradient when none is implemented.
//! - [`builders`] construct L-BFGS with More–Thuente or Hager–Zhang line
//!   search; [`run::run_lbfgs`] executes it.
//! - [`OptimOutcome::converged`] is true only for a genuine convergence
//!   termination; an exhausted iteration budget is reported, not hidden.
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs have been validated by [`LogLikelihood::check`] before the first
//!   solver step.
//! - All vectors are the [`Theta`]/[`Grad`] aliases; all matrices the
//!   [`types::Hessian`] alias.
//!
//! Conventions
//! -----------
//! - Gradients returned by models are `∇ℓ`, never `∇c`.
//! - Errors are [`OptError`](crate::optimization::errors::OptError); Argmin
//!   errors never cross this module's boundary unconverted.
//!
//! Testing notes
//! -------------
//! - `api` tests solve a closed-form Gaussian likelihood with both line
//!   searches and check immediate termination at the optimum.
//! - `finite_diff` tests compare against a closed-form Hessian.

pub mod adapter;
pub mod api;
pub mod builders;
pub mod finite_diff;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

pub use self::api::maximize;
pub use self::finite_diff::compute_hessian;
pub use self::traits::{LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Tolerances};
pub use self::types::{Cost, DEFAULT_LBFGS_MEM, FnEvalMap, Grad, Hessian, Theta};

pub mod prelude {
    pub use super::api::maximize;
    pub use super::traits::{LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Tolerances};
    pub use super::types::{Grad, Hessian, Theta};
}
