//! gen_heckman: generalized Heckman sample-selection models.
//!
//! Purpose
//! -------
//! Estimate selection models in which the outcome dispersion and the
//! selection/outcome error correlation are themselves linear in covariates,
//! by full-information maximum likelihood, with two-step starting values and
//! model-based, heteroskedasticity-robust, or cluster-robust covariances.
//!
//! Key behaviors
//! -------------
//! - [`selection`]: design building, the joint likelihood, the fitter, and
//!   fitted-model summaries. [`selection::estimate`] runs the whole
//!   pipeline from a [`selection::Table`] and a [`selection::HeckmanSpec`].
//! - [`optimization`]: Argmin-backed L-BFGS maximization behind the
//!   `LogLikelihood` trait, bounded parameter links, and normal-tail
//!   helpers.
//! - [`inference`]: observed information, sandwich covariances, and
//!   cluster assignments.
//!
//! Conventions
//! -----------
//! - Everything is single-threaded and synchronous; fitted models are
//!   immutable values.
//! - Errors are hand-written enums per layer (`OptError`, `InferenceError`,
//!   `SelectionError`) with `From` conversions between them.
//! - Logging goes through the `log` facade; install any logger to see it.
//!   The `obs_slog` feature adds an Argmin terminal observer for
//!   `MLEOptions::verbose` runs.
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each module; `tests/` holds end-to-end fits on
//!   simulated data.

pub mod inference;
pub mod optimization;
pub mod selection;
