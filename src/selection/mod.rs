//! selection: generalized Heckman sample-selection models.
//!
//! Purpose
//! -------
//! Estimate a selection equation (probit), an outcome equation (linear), a
//! dispersion equation (`log σ` linear), and a correlation equation
//! (`atanh`-type link on ρ) jointly by maximum likelihood, with two-step
//! starting values and model-based, robust, or cluster-robust inference.
//!
//! Key behaviors
//! -------------
//! - [`core`]: typed design builder, validated sample, parameter layout,
//!   joint log-likelihood, probit and two-step starts.
//! - [`models`]: [`GenHeckman`] (the `LogLikelihood` implementation and
//!   fitter), [`FittedHeckman`] (immutable results), and [`estimate`] (the
//!   full pipeline from a [`Table`]).
//! - [`errors`]: [`SelectionError`] and the `SelectionResult` alias.
//!
//! Invariants & assumptions
//! ------------------------
//! - Unselected rows never contribute outcome-side information; their
//!   outcome value and outcome/dispersion covariates may be missing.
//! - σ > 0 and ρ ∈ (−1, 1) hold by construction of the links, for any
//!   finite coefficient vector.
//!
//! Conventions
//! -----------
//! - Parameter order is `[β_S | β_O | γ_σ | δ_ρ]` everywhere.
//! - Fit-level events (starting values computed, fit converged, degraded
//!   standard errors) are logged through the `log` facade.

pub mod core;
pub mod errors;
pub mod models;

pub use self::core::{
    Block, EquationSpec, HeckmanOptions, HeckmanSpec, ModelFrame, SelectionData, Table,
};
pub use self::errors::{SelectionError, SelectionResult};
pub use self::models::{
    CoefRow, FittedHeckman, GenHeckman, HeckmanRequest, NuisanceEstimate, StdErrorKind, estimate,
};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use gen_heckman::selection::prelude::*;
//
// to import the estimation surface in a single line.

pub mod prelude {
    pub use super::{
        Block, EquationSpec, FittedHeckman, GenHeckman, HeckmanOptions, HeckmanRequest,
        HeckmanSpec, ModelFrame, SelectionData, SelectionError, SelectionResult, StdErrorKind,
        Table, estimate,
    };
}
