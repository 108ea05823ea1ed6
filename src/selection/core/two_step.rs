//! Two-step starting values for the generalized Heckman fit.
//!
//! Purpose
//! -------
//! Produce a full parameter vector close enough to the maximum-likelihood
//! estimate that L-BFGS converges reliably from it.
//!
//! Key behaviors
//! -------------
//! 1. Probit of the indicator on the selection design ([`fit_probit`]).
//! 2. On selected rows, the inverse Mills ratio `λ_i = φ(η_i)/Φ(η_i)` and
//!    `δ_i = λ_i(λ_i + η_i)`.
//! 3. Weighted least squares of `y` on `[X_O, λ]` gives `β_O`, `β_λ`, and
//!    residuals `e_i`.
//! 4. The variance proxy `e_i² + β_λ² δ_i` (floored) is regressed in logs
//!    on `X_σ`; half the coefficients give `γ`. If `X_σ` has a constant
//!    column, its coefficient is shifted so the weighted mean implied
//!    variance equals the weighted mean proxy.
//! 5. The correlation block starts at zero.
//!
//! Errors
//! ------
//! Every failure is `SelectionError::StartingValues` naming the stage.
use crate::{
    optimization::{loglik_optimizer::MLEOptions, numerical_stability::inv_mills},
    selection::{
        core::{
            data::SelectionData, layout::Block, linalg::weighted_least_squares, probit::fit_probit,
        },
        errors::{SelectionError, SelectionResult},
    },
};
use ndarray::{Array1, ArrayView1, ArrayView2, Axis, concatenate, s};

/// Lower bound on the per-row variance proxy before taking logs.
const VARIANCE_PROXY_FLOOR: f64 = 1e-10;

/// Two-step estimate of the full parameter vector `[β_S | β_O | γ | δ]`.
///
/// Errors
/// ------
/// - `StartingValues { stage: "probit" }` when the probit fails.
/// - `StartingValues { stage: "outcome regression" }` /
///   `StartingValues { stage: "dispersion regression" }` for singular
///   least-squares systems or non-finite results.
pub fn two_step_start(data: &SelectionData, opts: &MLEOptions) -> SelectionResult<Array1<f64>> {
    let beta_s = fit_probit(data, opts)?;

    let rows = data.selected_rows();
    let xs = data.design(Block::Selection).values().select(Axis(0), rows);
    let xo = data.design(Block::Outcome).values().select(Axis(0), rows);
    let xd = data.design(Block::Dispersion).values().select(Axis(0), rows);
    let y = data.outcome().select(Axis(0), rows);
    let w = data.weights().select(Axis(0), rows);

    let eta = xs.dot(&beta_s);
    let lambda = eta.mapv(inv_mills);
    let delta = &lambda * &(&lambda + &eta);

    let lambda_col = lambda.view().insert_axis(Axis(1));
    let x_aug = concatenate(Axis(1), &[xo.view(), lambda_col]).map_err(|e| {
        SelectionError::StartingValues { stage: "outcome regression", reason: e.to_string() }
    })?;
    let outcome_fit = weighted_least_squares(x_aug.view(), y.view(), w.view())
        .ok_or_else(|| singular("outcome regression"))?;
    let ko = xo.ncols();
    let beta_o = outcome_fit.coef.slice(s![..ko]).to_owned();
    let beta_lambda = outcome_fit.coef[ko];

    let proxy = (&outcome_fit.residuals.mapv(|e| e * e) + &(&delta * beta_lambda.powi(2)))
        .mapv(|v| if v.is_finite() { v.max(VARIANCE_PROXY_FLOOR) } else { VARIANCE_PROXY_FLOOR });
    let log_proxy = proxy.mapv(f64::ln);
    let disp_fit = weighted_least_squares(xd.view(), log_proxy.view(), w.view())
        .ok_or_else(|| singular("dispersion regression"))?;
    let mut gamma = disp_fit.coef / 2.0;
    recenter_constant(&mut gamma, xd.view(), proxy.view(), w.view());

    let corr = Array1::<f64>::zeros(data.design(Block::Correlation).ncols());
    let start = concatenate(Axis(0), &[beta_s.view(), beta_o.view(), gamma.view(), corr.view()])
        .map_err(|e| SelectionError::StartingValues {
            stage: "assembly",
            reason: e.to_string(),
        })?;
    if let Some(&bad) = start.iter().find(|v| !v.is_finite()) {
        return Err(SelectionError::StartingValues {
            stage: "assembly",
            reason: format!("non-finite start value {bad}"),
        });
    }
    log::debug!(
        "two-step start: beta_lambda = {beta_lambda:.4}, {} selected rows",
        data.n_selected()
    );
    Ok(start)
}

fn singular(stage: &'static str) -> SelectionError {
    SelectionError::StartingValues { stage, reason: "singular least-squares system".to_string() }
}

/// Shift the coefficient of a constant column so that the weighted mean of
/// `exp(2 X γ)` equals the weighted mean of `proxy`.
fn recenter_constant(
    gamma: &mut Array1<f64>, x: ArrayView2<'_, f64>, proxy: ArrayView1<'_, f64>,
    w: ArrayView1<'_, f64>,
) {
    let Some((j, c0)) = constant_column(x) else {
        return;
    };
    let implied = x.dot(&*gamma).mapv(|e| (2.0 * e).exp());
    let wsum = w.sum();
    if wsum <= 0.0 {
        return;
    }
    let mean_proxy = w.dot(&proxy) / wsum;
    let mean_implied = w.dot(&implied) / wsum;
    let shift = 0.5 * (mean_proxy / mean_implied).ln();
    if shift.is_finite() {
        gamma[j] += shift / c0;
    }
}

/// First column whose entries are all equal and non-zero.
fn constant_column(x: ArrayView2<'_, f64>) -> Option<(usize, f64)> {
    x.axis_iter(Axis(1)).enumerate().find_map(|(j, col)| {
        let c0 = *col.iter().next()?;
        (c0 != 0.0 && col.iter().all(|&v| v == c0)).then_some((j, c0))
    })
}
