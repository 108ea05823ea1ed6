//! numerical_stability: bounded parameter links and normal-tail helpers.
//!
//! Purpose
//! -------
//! Keep every quantity the selection likelihood needs inside its valid
//! domain without constrained optimization: the dispersion is
//! `exp(clamped η)`, the correlation is a shrunk `tanh(η)`, and the normal
//! CDF is evaluated in log space with a far-tail expansion.
//!
//! Key behaviors
//! -------------
//! - Forward/inverse links and their derivatives for σ and ρ.
//! - `log_norm_cdf`, `log_norm_pdf`, `inv_mills`.
//! - `delta_method` for covariances of derived quantities.
//! - Shared constants (`LOG_SCALE_BOUND`, `RHO_MARGIN`, `RHO_DENOM_FLOOR`,
//!   `LOG_CDF_ASYMPTOTIC_CUTOFF`, `EIGEN_EPS`).
//!
//! Conventions
//! -----------
//! - Pure scalar/ndarray functions; no logging, no allocation in the scalar
//!   helpers, no validation (callers check finiteness upstream).
//!
//! Downstream usage
//! ----------------
//! - `selection::core::kernel` evaluates every row through these links.
//! - `selection::core::two_step` uses `inv_mills` for the bias correction.
//! - `selection::models::fitted` uses `delta_method` for σ/ρ standard errors.

pub mod transformations;

pub use self::transformations::{
    EIGEN_EPS, LOG_CDF_ASYMPTOTIC_CUTOFF, LOG_SCALE_BOUND, RHO_DENOM_FLOOR, RHO_MARGIN,
    correlation_from_unconstrained, correlation_jacobian, correlation_to_unconstrained,
    delta_method, dispersion_from_unconstrained, dispersion_jacobian, dispersion_to_unconstrained,
    inv_mills, log_norm_cdf, log_norm_pdf,
};

pub mod prelude {
    pub use super::transformations::{
        correlation_from_unconstrained, correlation_to_unconstrained, delta_method,
        dispersion_from_unconstrained, dispersion_to_unconstrained, inv_mills, log_norm_cdf,
    };
}
