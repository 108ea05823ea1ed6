//! inference::hessian: observed information and model-based covariance.
//!
//! Purpose
//! -------
//! Turn an analytic log-likelihood gradient into the model-based covariance
//! of the free parameters: difference the gradient into a Hessian, negate
//! and rescale it into the observed information, verify positive
//! definiteness, invert, and embed the result in the full parameter space.
//!
//! Key behaviors
//! -------------
//! - [`observed_information`] calls
//!   [`compute_hessian`](crate::optimization::loglik_optimizer::compute_hessian)
//!   on the gradient and returns `−scale · ∇²ℓ`.
//! - [`invert_information`] factorizes with `nalgebra` Cholesky. When the
//!   factorization fails the smallest eigenvalue of the symmetric
//!   eigendecomposition is reported instead of a pseudoinverse.
//! - [`embed_covariance`] scatters a free-parameter covariance into a
//!   `k × k` matrix whose fixed rows and columns are zero.
//!
//! Invariants & assumptions
//! ------------------------
//! - Gradients passed in are on the *average* log-likelihood scale; `scale`
//!   is the total weight, so the returned information is on the
//!   summed-likelihood scale.
//! - Inputs to `invert_information` are symmetric (the finite-difference
//!   Hessian is symmetrized upstream).
//!
//! Conventions
//! -----------
//! - `ndarray` at the boundary, `nalgebra` only for factorizations
//!   (`to_dmatrix` / `from_dmatrix` convert).
//!
//! Testing notes
//! -------------
//! - Closed-form Gaussian information, an indefinite matrix, and embedding
//!   with fixed parameters.
use crate::{
    inference::errors::{InferenceError, InferenceResult},
    optimization::{
        errors::OptResult,
        loglik_optimizer::{Grad, Theta, compute_hessian},
    },
};
use nalgebra::DMatrix;
use ndarray::{Array1, Array2, ArrayView2};

/// `−scale · ∇²ℓ(θ)` from the analytic gradient `grad`.
///
/// Errors
/// ------
/// - `InferenceError::Hessian` when differencing the gradient fails.
pub fn observed_information<G>(grad: &G, theta: &Theta, scale: f64) -> InferenceResult<Array2<f64>>
where
    G: Fn(&Theta) -> OptResult<Grad>,
{
    let hess = compute_hessian(grad, theta)?;
    Ok(hess.mapv(|h| -scale * h))
}

/// Invert a symmetric positive-definite information matrix.
///
/// Parameters
/// ----------
/// - `info`: `m × m` observed information (symmetric).
///
/// Returns
/// -------
/// `info⁻¹`, symmetrized.
///
/// Errors
/// ------
/// - `NonFiniteInformation` for a NaN/±inf cell.
/// - `NotPositiveDefinite { min_eigenvalue }` when Cholesky fails.
pub fn invert_information(info: ArrayView2<'_, f64>) -> InferenceResult<Array2<f64>> {
    if let Some(((row, col), &value)) = info.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(InferenceError::NonFiniteInformation { row, col, value });
    }
    let dm = to_dmatrix(info);
    match dm.clone().cholesky() {
        Some(chol) => {
            let mut cov = from_dmatrix(&chol.inverse());
            let m = cov.nrows();
            for i in 0..m {
                for j in 0..i {
                    let avg = 0.5 * (cov[[i, j]] + cov[[j, i]]);
                    cov[[i, j]] = avg;
                    cov[[j, i]] = avg;
                }
            }
            Ok(cov)
        }
        None => {
            let min_eigenvalue =
                dm.symmetric_eigenvalues().iter().copied().fold(f64::INFINITY, f64::min);
            Err(InferenceError::NotPositiveDefinite { min_eigenvalue })
        }
    }
}

/// Scatter a free-parameter covariance into the full `k × k` space.
///
/// `free[i]` is the full-vector index of free parameter `i`; rows and
/// columns of fixed parameters are zero.
pub fn embed_covariance(free_cov: ArrayView2<'_, f64>, free: &[usize], k: usize) -> Array2<f64> {
    let mut full = Array2::<f64>::zeros((k, k));
    for (a, &i) in free.iter().enumerate() {
        for (b, &j) in free.iter().enumerate() {
            full[[i, j]] = free_cov[[a, b]];
        }
    }
    full
}

/// Square roots of the covariance diagonal; tiny negative round-off maps to 0.
pub fn standard_errors(cov: ArrayView2<'_, f64>) -> Array1<f64> {
    cov.diag().mapv(|v| v.max(0.0).sqrt())
}

pub(crate) fn to_dmatrix(a: ArrayView2<'_, f64>) -> DMatrix<f64> {
    DMatrix::from_fn(a.nrows(), a.ncols(), |i, j| a[[i, j]])
}

pub(crate) fn from_dmatrix(m: &DMatrix<f64>) -> Array2<f64> {
    Array2::from_shape_fn((m.nrows(), m.ncols()), |(i, j)| m[(i, j)])
}
