//! Finite/shape checks shared by the optimizer surface.
//!
//! Every check returns the first offending index so error messages point at
//! the parameter (or Hessian cell) that went wrong.
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{Grad, Theta, types::Hessian},
};

/// First non-finite entry of an iterator of values, with its position.
pub(crate) fn first_non_finite<'a, I>(values: I) -> Option<(usize, f64)>
where
    I: IntoIterator<Item = &'a f64>,
{
    values.into_iter().copied().enumerate().find(|(_, v)| !v.is_finite())
}

fn positive_finite_reason(tol: f64) -> Option<&'static str> {
    if !tol.is_finite() {
        Some("Tolerance must be finite.")
    } else if tol <= 0.0 {
        Some("Tolerance must be positive.")
    } else {
        None
    }
}

/// `None` or a finite, strictly positive gradient-norm tolerance.
pub fn verify_tol_grad(tol: Option<f64>) -> OptResult<()> {
    match tol.and_then(|t| positive_finite_reason(t).map(|r| (t, r))) {
        Some((tol, reason)) => Err(OptError::InvalidTolGrad { tol, reason }),
        None => Ok(()),
    }
}

/// `None` or a finite, strictly positive cost-change tolerance.
pub fn verify_tol_cost(tol: Option<f64>) -> OptResult<()> {
    match tol.and_then(|t| positive_finite_reason(t).map(|r| (t, r))) {
        Some((tol, reason)) => Err(OptError::InvalidTolCost { tol, reason }),
        None => Ok(()),
    }
}

/// Gradient has length `dim` and only finite entries.
pub fn validate_grad(grad: &Grad, dim: usize) -> OptResult<()> {
    if grad.len() != dim {
        return Err(OptError::GradientDimMismatch { expected: dim, found: grad.len() });
    }
    match first_non_finite(grad.iter()) {
        Some((index, value)) => Err(OptError::InvalidGradient {
            index,
            value,
            reason: "Gradient elements must be finite.",
        }),
        None => Ok(()),
    }
}

/// Unwrap the solver's best parameter, requiring it to be finite.
pub fn validate_theta_hat(theta_hat: Option<Theta>) -> OptResult<Theta> {
    let theta = theta_hat.ok_or(OptError::MissingThetaHat)?;
    if let Some((index, value)) = first_non_finite(theta.iter()) {
        return Err(OptError::InvalidThetaHat {
            index,
            value,
            reason: "Parameter estimates must be finite.",
        });
    }
    Ok(theta)
}

pub fn validate_value(value: f64) -> OptResult<()> {
    if value.is_finite() { Ok(()) } else { Err(OptError::NonFiniteCost { value }) }
}

/// Hessian is `dim × dim` with finite entries.
pub fn validate_hessian(hessian: &Hessian, dim: usize) -> OptResult<()> {
    if hessian.dim() != (dim, dim) {
        return Err(OptError::HessianDimMismatch { expected: dim, found: hessian.dim() });
    }
    match hessian.indexed_iter().find(|(_, v)| !v.is_finite()) {
        Some(((row, col), &value)) => Err(OptError::InvalidHessian { row, col, value }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // Tolerance checks accept `None` and positive values only.
    //
    // Given
    // -----
    // - `None`, `1e-8`, `0`, `NaN`.
    //
    // Expect
    // ------
    // - Ok, Ok, InvalidTolGrad, InvalidTolCost.
    fn tolerance_checks() {
        assert!(verify_tol_grad(None).is_ok());
        assert!(verify_tol_cost(Some(1e-8)).is_ok());
        assert!(matches!(verify_tol_grad(Some(0.0)), Err(OptError::InvalidTolGrad { .. })));
        assert!(matches!(verify_tol_cost(Some(f64::NAN)), Err(OptError::InvalidTolCost { .. })));
    }

    #[test]
    // Purpose
    // -------
    // Gradient validation reports length mismatches and the first bad index.
    //
    // Given
    // -----
    // - A length-2 gradient checked against dim 3, then `[1, ∞, NaN]`.
    //
    // Expect
    // ------
    // - `GradientDimMismatch`, then `InvalidGradient` at index 1.
    fn gradient_checks_report_first_bad_entry() {
        assert_eq!(
            validate_grad(&array![1.0, 2.0], 3),
            Err(OptError::GradientDimMismatch { expected: 3, found: 2 })
        );
        match validate_grad(&array![1.0, f64::INFINITY, f64::NAN], 3) {
            Err(OptError::InvalidGradient { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected InvalidGradient, got {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // Hessian validation checks shape then finiteness.
    //
    // Given
    // -----
    // - A 2×2 matrix checked against dim 3; a 2×2 with NaN at (1, 0).
    //
    // Expect
    // ------
    // - `HessianDimMismatch`; `InvalidHessian { row: 1, col: 0 }`.
    fn hessian_checks() {
        let h = array![[1.0, 0.0], [0.0, 1.0]];
        assert!(matches!(validate_hessian(&h, 3), Err(OptError::HessianDimMismatch { .. })));
        let bad = array![[1.0, 0.0], [f64::NAN, 1.0]];
        assert!(matches!(
            validate_hessian(&bad, 2),
            Err(OptError::InvalidHessian { row: 1, col: 0, .. })
        ));
    }
}
