//! loglik_optimizer::finite_diff: Hessians from analytic gradients.
//!
//! Purpose
//! -------
//! Form the observed-information Hessian by differencing a fallible
//! analytic gradient. Selection models know `∇ℓ(θ)` in closed form but not
//! `∇²ℓ(θ)`; one pass of central differences over the gradient is far more
//! accurate than second differences of `ℓ` itself.
//!
//! Key behaviors
//! -------------
//! - Central differences first; forward differences when a central
//!   evaluation failed or produced a non-finite cell.
//! - Gradient errors raised inside the stencil are captured and re-raised
//!   after the pass (the stencil closure itself cannot return `Result`).
//! - The result is symmetrized by averaging `(i, j)` and `(j, i)`.
//!
//! Invariants & assumptions
//! ------------------------
//! - `grad(θ)` returns a vector of length `θ.len()`.
//! - The returned matrix is finite, square, and exactly symmetric.
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{
        Grad, Theta,
        types::Hessian,
        validation::{validate_grad, validate_hessian},
    },
};
use finitediff::FiniteDiff;
use std::cell::RefCell;

/// Finite-difference Hessian of `ℓ` from its gradient `grad` at `theta`.
///
/// Parameters
/// ----------
/// - `grad`: fallible analytic gradient `θ ↦ ∇ℓ(θ)`.
/// - `theta`: evaluation point.
///
/// Returns
/// -------
/// Symmetric `k × k` matrix `∇²ℓ(θ)` with `k = theta.len()`.
///
/// Errors
/// ------
/// - The first error raised by `grad` during the forward pass, when the
///   central pass already failed.
/// - `GradientDimMismatch` when `grad` returns the wrong length.
/// - `InvalidHessian` when both passes produce non-finite cells.
pub fn compute_hessian<G>(grad: &G, theta: &Theta) -> OptResult<Hessian>
where
    G: Fn(&Theta) -> OptResult<Grad>,
{
    let dim = theta.len();
    let parked: RefCell<Option<OptError>> = RefCell::new(None);
    let stencil = |t: &Theta| -> Grad {
        match grad(t).and_then(|g| validate_grad(&g, dim).map(|_| g)) {
            Ok(g) => g,
            Err(e) => {
                let mut slot = parked.borrow_mut();
                if slot.is_none() {
                    *slot = Some(e);
                }
                Grad::from_elem(dim, f64::NAN)
            }
        }
    };

    let mut hess = theta.central_hessian(&stencil);
    if parked.borrow().is_some() || validate_hessian(&hess, dim).is_err() {
        parked.replace(None);
        hess = theta.forward_hessian(&stencil);
        if let Some(err) = parked.take() {
            return Err(err);
        }
        validate_hessian(&hess, dim)?;
    }
    symmetrize(&mut hess);
    Ok(hess)
}

fn symmetrize(hess: &mut Hessian) {
    let k = hess.nrows();
    for i in 0..k {
        for j in 0..i {
            let avg = 0.5 * (hess[[i, j]] + hess[[j, i]]);
            hess[[i, j]] = avg;
            hess[[j, i]] = avg;
        }
    }
}
