//! Bounded links and tail-safe normal helpers.
//!
//! The selection models never hand σ or ρ to the optimizer directly. They
//! optimize linear predictors and map them through:
//!
//! - dispersion: `σ = exp(clamp(η, ±LOG_SCALE_BOUND))`, so σ is finite and
//!   strictly positive for every finite η;
//! - correlation: `ρ = (1 − RHO_MARGIN)·tanh(η)`, so |ρ| < 1 even where
//!   `tanh` rounds to ±1.
//!
//! The normal helpers work in log space. `log Φ(x)` switches to an
//! asymptotic series below [`LOG_CDF_ASYMPTOTIC_CUTOFF`] where the
//! complementary error function underflows.
use ndarray::{Array2, ArrayView2};
use statrs::function::erf::erfc;
use std::f64::consts::FRAC_1_SQRT_2;

/// Clamp applied to log-scale linear predictors before exponentiating.
pub const LOG_SCALE_BOUND: f64 = 300.0;

/// Shrinkage keeping the correlation strictly inside (−1, 1).
pub const RHO_MARGIN: f64 = 1e-7;

/// Floor on `1 − ρ²` inside the selected-row contribution.
pub const RHO_DENOM_FLOOR: f64 = 1e-12;

/// Below this argument `log Φ` uses the asymptotic expansion.
pub const LOG_CDF_ASYMPTOTIC_CUTOFF: f64 = -30.0;

/// Relative threshold for treating singular/eigen values as zero.
pub const EIGEN_EPS: f64 = 1e-10;

const HALF_LN_2PI: f64 = 0.918_938_533_204_672_7;

/// `ln σ`. Caller guarantees `σ > 0`.
pub fn dispersion_to_unconstrained(sigma: f64) -> f64 {
    sigma.ln()
}

/// `exp(clamp(η, ±LOG_SCALE_BOUND))`.
pub fn dispersion_from_unconstrained(eta: f64) -> f64 {
    eta.clamp(-LOG_SCALE_BOUND, LOG_SCALE_BOUND).exp()
}

/// `dσ/dη`: σ inside the clamp, 0 where the clamp is active.
pub fn dispersion_jacobian(eta: f64) -> f64 {
    if eta.abs() > LOG_SCALE_BOUND { 0.0 } else { eta.exp() }
}

/// `atanh(ρ / (1 − RHO_MARGIN))`. Caller guarantees `|ρ| < 1 − RHO_MARGIN`.
pub fn correlation_to_unconstrained(rho: f64) -> f64 {
    (rho / (1.0 - RHO_MARGIN)).atanh()
}

/// `(1 − RHO_MARGIN)·tanh(η)`.
pub fn correlation_from_unconstrained(eta: f64) -> f64 {
    (1.0 - RHO_MARGIN) * eta.tanh()
}

/// `dρ/dη = (1 − RHO_MARGIN)(1 − tanh²η)`.
pub fn correlation_jacobian(eta: f64) -> f64 {
    let t = eta.tanh();
    (1.0 - RHO_MARGIN) * (1.0 - t * t)
}

/// `log φ(x)` for the standard normal density.
pub fn log_norm_pdf(x: f64) -> f64 {
    -0.5 * x * x - HALF_LN_2PI
}

/// `log Φ(x)`, finite for every finite `x`.
///
/// Notes
/// -----
/// - `x < LOG_CDF_ASYMPTOTIC_CUTOFF`: Mills-ratio expansion
///   `log φ(x) − ln(−x) + ln(1 − x⁻² + 3x⁻⁴ − 15x⁻⁶)`.
/// - `x > 0`: `ln_1p(−Φ(−x))` so values near zero keep full precision.
/// - otherwise `ln(½ erfc(−x/√2))`.
pub fn log_norm_cdf(x: f64) -> f64 {
    if x < LOG_CDF_ASYMPTOTIC_CUTOFF {
        let inv2 = 1.0 / (x * x);
        let series = 1.0 - inv2 + 3.0 * inv2 * inv2 - 15.0 * inv2 * inv2 * inv2;
        log_norm_pdf(x) - (-x).ln() + series.ln()
    } else if x > 0.0 {
        (-0.5 * erfc(x * FRAC_1_SQRT_2)).ln_1p()
    } else {
        (0.5 * erfc(-x * FRAC_1_SQRT_2)).ln()
    }
}

/// Inverse Mills ratio `φ(x)/Φ(x)`, computed as `exp(log φ − log Φ)`.
///
/// Behaves like `−x` for very negative `x` and decays to 0 for large `x`.
pub fn inv_mills(x: f64) -> f64 {
    (log_norm_pdf(x) - log_norm_cdf(x)).exp()
}

/// Delta-method covariance `J Σ Jᵀ`.
///
/// Parameters
/// ----------
/// - `cov`: `k × k` covariance of the underlying coefficients.
/// - `jac`: `m × k` Jacobian of the derived quantities.
///
/// Returns
/// -------
/// `m × m` covariance of the derived quantities.
///
/// Panics
/// ------
/// - If `jac.ncols() != cov.nrows()` (ndarray shape mismatch).
pub fn delta_method(cov: ArrayView2<'_, f64>, jac: ArrayView2<'_, f64>) -> Array2<f64> {
    jac.dot(&cov).dot(&jac.t())
}
