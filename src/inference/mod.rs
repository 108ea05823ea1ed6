//! inference: model-based, robust, and cluster-robust covariances.
//!
//! Purpose
//! -------
//! Quantify uncertainty around a fitted selection model. The model-based
//! covariance is the inverse observed information; the robust variants
//! wrap it in a score sandwich, optionally summing scores within clusters.
//!
//! Key behaviors
//! -------------
//! - [`hessian`]: observed information from an analytic gradient, Cholesky
//!   inversion with eigenvalue diagnostics, embedding around fixed
//!   parameters, standard errors.
//! - [`sandwich`]: `c · B M B` with heteroskedasticity-robust
//!   (`c = n/(n−k)`) and cluster-robust (`c = G/(G−1)·(n−1)/(n−k)`) factors.
//! - [`cluster`]: [`ClusterAssignment`], row-aligned keys with the names of
//!   the clustering variables, including composite keys built from table
//!   columns.
//!
//! Invariants & assumptions
//! ------------------------
//! - Scores are per-observation scores of the *summed* weighted
//!   log-likelihood, shape `n × p`, in the same parameter space as the bread.
//! - `k` in small-sample factors counts free parameters only.
//!
//! Conventions
//! -----------
//! - Errors are [`InferenceError`]; nothing here panics on bad numerics.
//! - Pure functions: no logging, no shared state.
//!
//! Testing notes
//! -------------
//! - Singleton clusters reproduce the heteroskedasticity-robust matrix.
//! - Hand-computed meat and correction factors; indefinite information.

pub mod cluster;
pub mod errors;
pub mod hessian;
pub mod sandwich;

pub use self::cluster::ClusterAssignment;
pub use self::errors::{InferenceError, InferenceResult};
pub use self::hessian::{
    embed_covariance, invert_information, observed_information, standard_errors,
};
pub use self::sandwich::{cluster_robust_covariance, robust_covariance};
