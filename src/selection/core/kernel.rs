//! Joint log-likelihood of the generalized Heckman model.
//!
//! Purpose
//! -------
//! Evaluate, for one full parameter vector, the per-row log-likelihood
//! contributions, their sum, the analytic gradient, and the per-row score
//! matrix. Every estimator in `selection` goes through this module.
//!
//! Key behaviors
//! -------------
//! - Unselected row: `ℓ_i = w_i · log Φ(−η_S)`.
//! - Selected row: `ℓ_i = w_i · [−log σ + log φ(z) + log Φ(r)]` with
//!   `z = (y − η_O)/σ`, `s = √(1 − ρ²)`, `r = (η_S + ρz)/s`,
//!   `σ = exp(η_σ)`, `ρ = (1 − ε)·tanh(η_ρ)`.
//! - Derivatives are taken with respect to the four linear predictors and
//!   chained through the design rows.
//!
//! Invariants & assumptions
//! ------------------------
//! - `data` has passed [`SelectionData::new`]; `theta` matches its layout
//!   and is finite (checked here).
//! - Unselected rows read only the selection design and the weight.
//! - Rows with zero weight contribute nothing and are skipped.
//! - `1 − ρ²` is floored at `RHO_DENOM_FLOOR`; `log Φ` stays finite in the
//!   far left tail. A non-finite contribution is still reported as an error
//!   rather than propagated.
//!
//! Conventions
//! -----------
//! - All values are on the *summed* weighted scale; the models divide by
//!   `SelectionData::weight_sum` before handing them to the optimizer.
//! - Scores are rows of `∂ℓ_i/∂θ` and sum over rows to the gradient.
use crate::{
    optimization::numerical_stability::{
        RHO_DENOM_FLOOR, correlation_from_unconstrained, correlation_jacobian,
        dispersion_from_unconstrained, dispersion_jacobian, inv_mills, log_norm_cdf, log_norm_pdf,
    },
    selection::{
        core::{
            data::SelectionData,
            layout::{Block, ParamLayout},
        },
        errors::{SelectionError, SelectionResult},
    },
};
use ndarray::{Array1, Array2, ArrayViewMut1, s};

/// Partial derivatives of one contribution w.r.t. the linear predictors.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RowDerivs {
    pub selection: f64,
    pub outcome: f64,
    pub dispersion: f64,
    pub correlation: f64,
}

impl RowDerivs {
    pub fn get(&self, block: Block) -> f64 {
        match block {
            Block::Selection => self.selection,
            Block::Outcome => self.outcome,
            Block::Dispersion => self.dispersion,
            Block::Correlation => self.correlation,
        }
    }
}

/// Contribution and derivatives of an unselected row.
pub fn unselected_contribution(w: f64, eta_s: f64) -> (f64, RowDerivs) {
    let ll = w * log_norm_cdf(-eta_s);
    let d = RowDerivs { selection: -w * inv_mills(-eta_s), ..RowDerivs::default() };
    (ll, d)
}

/// Contribution and derivatives of a selected row.
///
/// Parameters
/// ----------
/// - `w`: weight; `y`: outcome.
/// - `eta_s`, `eta_o`, `eta_d`, `eta_r`: selection, outcome, dispersion
///   (log σ before clamping), and correlation (before the tanh link)
///   predictors.
pub fn selected_contribution(
    w: f64, y: f64, eta_s: f64, eta_o: f64, eta_d: f64, eta_r: f64,
) -> (f64, RowDerivs) {
    let sigma = dispersion_from_unconstrained(eta_d);
    let log_sigma = sigma.ln();
    let rho = correlation_from_unconstrained(eta_r);
    let z = (y - eta_o) / sigma;
    let s2 = (1.0 - rho * rho).max(RHO_DENOM_FLOOR);
    let s = s2.sqrt();
    let r = (eta_s + rho * z) / s;

    let ll = w * (-log_sigma + log_norm_pdf(z) + log_norm_cdf(r));

    let m = inv_mills(r);
    let d_sigma = w * (z * z - 1.0 - m * rho * z / s) / sigma;
    let d_rho = w * m * (z + rho * eta_s) / (s2 * s);
    let d = RowDerivs {
        selection: w * m / s,
        outcome: (w / sigma) * (z - m * rho / s),
        dispersion: d_sigma * dispersion_jacobian(eta_d),
        correlation: d_rho * correlation_jacobian(eta_r),
    };
    (ll, d)
}

/// Visit every positively weighted row with its contribution and derivatives.
///
/// Returns the summed log-likelihood.
///
/// Errors
/// ------
/// - `ParamLengthMismatch`, `NonFiniteParameter` from the layout check.
/// - `NonFiniteContribution { row }` for the first bad row.
fn walk_rows<F>(theta: &Array1<f64>, data: &SelectionData, mut visit: F) -> SelectionResult<f64>
where
    F: FnMut(usize, f64, &RowDerivs),
{
    let layout = data.layout();
    layout.check(theta)?;
    let beta_s = layout.view(theta, Block::Selection);
    let beta_o = layout.view(theta, Block::Outcome);
    let gamma = layout.view(theta, Block::Dispersion);
    let delta = layout.view(theta, Block::Correlation);

    let d = data.designs();
    let (xs, xo) = (d.selection.values(), d.outcome.values());
    let (xd, xr) = (d.dispersion.values(), d.correlation.values());
    let (y, w) = (data.outcome(), data.weights());

    let mut total = 0.0;
    for i in 0..data.n_obs() {
        if w[i] == 0.0 {
            continue;
        }
        let eta_s = xs.row(i).dot(&beta_s);
        let (ll, derivs) = if data.is_selected(i) {
            selected_contribution(
                w[i],
                y[i],
                eta_s,
                xo.row(i).dot(&beta_o),
                xd.row(i).dot(&gamma),
                xr.row(i).dot(&delta),
            )
        } else {
            unselected_contribution(w[i], eta_s)
        };
        if !ll.is_finite() {
            return Err(SelectionError::NonFiniteContribution { row: i, value: ll });
        }
        visit(i, ll, &derivs);
        total += ll;
    }
    Ok(total)
}

/// Summed log-likelihood `ℓ(θ)`.
pub fn loglik(theta: &Array1<f64>, data: &SelectionData) -> SelectionResult<f64> {
    walk_rows(theta, data, |_, _, _| {})
}

/// Per-row contributions `ℓ_i(θ)`; zero-weight rows are 0.
pub fn contributions(theta: &Array1<f64>, data: &SelectionData) -> SelectionResult<Array1<f64>> {
    let mut out = Array1::<f64>::zeros(data.n_obs());
    walk_rows(theta, data, |i, ll, _| out[i] = ll)?;
    Ok(out)
}

/// `ℓ(θ)` and `∇ℓ(θ)` in one pass.
pub fn loglik_and_grad(
    theta: &Array1<f64>, data: &SelectionData,
) -> SelectionResult<(f64, Array1<f64>)> {
    let layout = data.layout();
    let mut grad = Array1::<f64>::zeros(layout.len());
    let total = walk_rows(theta, data, |i, _, d| accumulate(grad.view_mut(), &layout, data, i, d))?;
    Ok((total, grad))
}

/// Score matrix `n × k`: row `i` is `∂ℓ_i/∂θ`.
pub fn scores(theta: &Array1<f64>, data: &SelectionData) -> SelectionResult<Array2<f64>> {
    let layout = data.layout();
    let mut out = Array2::<f64>::zeros((data.n_obs(), layout.len()));
    walk_rows(theta, data, |i, _, d| accumulate(out.row_mut(i), &layout, data, i, d))?;
    Ok(out)
}

/// Chain predictor derivatives of row `i` through its design rows into `target`.
fn accumulate(
    mut target: ArrayViewMut1<'_, f64>, layout: &ParamLayout, data: &SelectionData, i: usize,
    d: &RowDerivs,
) {
    let blocks: &[Block] = if data.is_selected(i) { &Block::ALL } else { &[Block::Selection] };
    for &block in blocks {
        let r = layout.range(block);
        let x = data.design(block).values();
        target.slice_mut(s![r.start..r.end]).scaled_add(d.get(block), &x.row(i));
    }
}
