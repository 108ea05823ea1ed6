//! core: data, layout, likelihood, and starting values for selection models.
//!
//! Purpose
//! -------
//! Collect the building blocks the generalized Heckman fitter is assembled
//! from: the typed design builder and case filtering ([`design`]), the
//! validated estimation sample ([`data`]), the parameter layout and
//! free/fixed split ([`layout`]), the joint log-likelihood ([`kernel`]),
//! and the two-step starting values ([`probit`], [`two_step`]).
//!
//! Key behaviors
//! -------------
//! - [`ModelFrame::build`] turns a [`Table`] and a [`HeckmanSpec`] into a
//!   [`SelectionData`] plus the retained row indices.
//! - [`kernel`] evaluates `ℓ(θ)`, `∇ℓ(θ)`, and per-row scores on the summed
//!   weighted scale.
//! - [`two_step_start`] produces a full start vector from a probit and two
//!   weighted least-squares regressions.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every function here takes a [`SelectionData`] that passed validation;
//!   per-call checks are limited to parameter length and finiteness.
//! - Parameter order is always `[β_S | β_O | γ_σ | δ_ρ]`.
//!
//! Conventions
//! -----------
//! - No logging beyond `debug` diagnostics from the starting-value stages.
//! - Errors are [`SelectionError`](crate::selection::errors::SelectionError).

pub mod data;
pub mod design;
pub mod kernel;
pub mod layout;
pub mod linalg;
pub mod options;
pub mod probit;
pub mod two_step;

pub use self::data::{BlockDesigns, SelectionData};
pub use self::design::{DesignMatrix, EquationSpec, HeckmanSpec, INTERCEPT, ModelFrame, Table};
pub use self::layout::{Block, FreeParams, ParamLayout};
pub use self::options::HeckmanOptions;
pub use self::probit::{Probit, fit_probit};
pub use self::two_step::two_step_start;
