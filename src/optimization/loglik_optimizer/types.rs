//! loglik_optimizer::types: numeric aliases and L-BFGS solver wiring.
//!
//! Every optimizer-facing vector in the crate is one of these aliases, so
//! the selection models, the probit start, and the observed-information code
//! agree on shapes without naming `ndarray` or Argmin generics directly.
//!
//! - `Theta` / `Grad`: free-parameter vector and its gradient. For a
//!   selection model this is the concatenation of the selection, outcome,
//!   dispersion, and correlation blocks with any fixed entries removed.
//! - `Hessian`: dense `k × k` second-derivative matrix over `Theta`.
//! - `Cost`: scalar objective; the solver sees `-ℓ(θ)`.
//! - `FnEvalMap`: Argmin's evaluation counters (`cost_count`,
//!   `gradient_count`, …).
use argmin::solver::{
    linesearch::{HagerZhangLineSearch, MoreThuenteLineSearch},
    quasinewton::LBFGS,
};
use ndarray::{Array1, Array2};
use std::collections::HashMap;

/// Free-parameter vector `θ` handed to the solver.
pub type Theta = Array1<f64>;

/// Gradient `∇ℓ(θ)` (or `∇c(θ)` inside the adapter); same length as [`Theta`].
pub type Grad = Array1<f64>;

/// Dense Hessian over [`Theta`].
pub type Hessian = Array2<f64>;

/// Scalar objective value.
pub type Cost = f64;

/// Function-evaluation counters keyed by Argmin's counter names.
pub type FnEvalMap = HashMap<String, u64>;

/// History length used by L-BFGS when `MLEOptions::lbfgs_mem` is unset.
pub const DEFAULT_LBFGS_MEM: usize = 7;

pub type HagerZhangLS = HagerZhangLineSearch<Theta, Grad, Cost>;

pub type MoreThuenteLS = MoreThuenteLineSearch<Theta, Grad, Cost>;

pub type LbfgsHagerZhang = LBFGS<HagerZhangLS, Theta, Grad, Cost>;

pub type LbfgsMoreThuente = LBFGS<MoreThuenteLS, Theta, Grad, Cost>;
