//! Generalized Heckman model: optimizer wiring and maximum-likelihood fit.
//!
//! [`GenHeckman`] implements [`LogLikelihood`] over the *free* parameters
//! (fixed entries are held at their start values) and on the *average*
//! log-likelihood scale `ℓ(θ)/W`, `W = Σ w_i`, so the default gradient
//! tolerance means the same thing at any sample size. [`GenHeckman::fit`]
//! rescales back to the summed likelihood for the reported log-likelihood
//! and the observed information.
use crate::{
    inference::hessian::{embed_covariance, invert_information, observed_information},
    optimization::{
        errors::{OptError, OptResult},
        loglik_optimizer::{Grad, LogLikelihood, Theta, maximize},
    },
    selection::{
        core::{
            data::SelectionData,
            kernel,
            layout::{Block, FreeParams, ParamLayout, check_finite},
            options::HeckmanOptions,
        },
        errors::{SelectionError, SelectionResult},
        models::fitted::FittedHeckman,
    },
};
use ndarray::Array1;

/// Generalized Heckman selection model bound to one parameter layout.
///
/// Fields
/// ------
/// - `layout`: block widths of the full vector `[β_S | β_O | γ_σ | δ_ρ]`.
/// - `free`: start vector (supplying fixed values) and free indices.
/// - `options`: optimizer settings and fixed mask.
#[derive(Debug, Clone, PartialEq)]
pub struct GenHeckman {
    layout: ParamLayout,
    free: FreeParams,
    options: HeckmanOptions,
}

impl GenHeckman {
    /// Bind a start vector and options to the layout of `data`.
    ///
    /// Errors
    /// ------
    /// - `StartLengthMismatch` when `start` does not match the layout.
    /// - `NonFiniteParameter` for a NaN/±inf start entry.
    /// - `InvalidFixedIndex`, `NoFreeParameters` from the fixed mask.
    pub fn new(
        data: &SelectionData, start: Array1<f64>, options: HeckmanOptions,
    ) -> SelectionResult<Self> {
        let layout = data.layout();
        if start.len() != layout.len() {
            return Err(SelectionError::StartLengthMismatch {
                expected: layout.len(),
                found: start.len(),
            });
        }
        check_finite(&start)?;
        let free = FreeParams::new(start, &options.fixed)?;
        Ok(Self { layout, free, options })
    }

    pub fn layout(&self) -> ParamLayout {
        self.layout
    }

    pub fn free(&self) -> &FreeParams {
        &self.free
    }

    pub fn options(&self) -> &HeckmanOptions {
        &self.options
    }

    /// Fit by maximum likelihood from the bound start vector.
    ///
    /// Steps
    /// -----
    /// 1. Require a finite log-likelihood at the start.
    /// 2. Maximize the average log-likelihood over the free parameters.
    /// 3. Require a converged termination; an exhausted iteration budget is
    ///    a failure.
    /// 4. Form the observed information `−W · ∇²(ℓ/W)` from the analytic
    ///    gradient, invert it, and embed it in the full `k × k` space.
    ///
    /// Errors
    /// ------
    /// - `NonFiniteStart` when some contribution at the start is not finite.
    /// - `OptimizationFailed` for solver errors or non-convergence.
    /// - `Covariance` (with `θ̂` and `ℓ(θ̂)`) when the information matrix is
    ///   not finite or not positive definite.
    pub fn fit(&self, data: &SelectionData) -> SelectionResult<FittedHeckman> {
        let start = self.free.template();
        match kernel::loglik(start, data) {
            Ok(_) => {}
            Err(SelectionError::NonFiniteContribution { value, .. }) => {
                return Err(SelectionError::NonFiniteStart { value });
            }
            Err(err) => return Err(err),
        }

        let theta0 = self.free.restrict(start);
        let outcome = maximize(self, theta0, data, &self.options.mle).map_err(|err| {
            SelectionError::OptimizationFailed { status: err.to_string(), iterations: 0 }
        })?;
        if !outcome.converged {
            return Err(SelectionError::OptimizationFailed {
                status: outcome.status.clone(),
                iterations: outcome.iterations,
            });
        }

        let theta_hat = self.free.expand(&outcome.theta_hat);
        let loglik = kernel::loglik(&theta_hat, data)?;

        let weight_sum = data.weight_sum();
        let grad = |t: &Theta| self.grad(t, data);
        let covariance = observed_information(&grad, &outcome.theta_hat, weight_sum)
            .and_then(|info| invert_information(info.view()))
            .map(|free_cov| {
                embed_covariance(free_cov.view(), self.free.indices(), self.layout.len())
            })
            .map_err(|source| SelectionError::Covariance {
                source,
                theta_hat: theta_hat.clone(),
                loglik,
            })?;

        log::info!(
            "generalized Heckman fit converged: loglik = {loglik:.6}, {} iterations, {} free parameters",
            outcome.iterations,
            self.free.n_free()
        );
        let fitted = fitted_outcome(&theta_hat, data, &self.layout);
        Ok(FittedHeckman::new(
            theta_hat,
            self.layout,
            data.param_names(),
            covariance,
            loglik,
            fitted,
            outcome,
            self.free.indices().to_vec(),
            data.n_obs(),
        ))
    }
}

/// `X_O β_O` for every row; NaN where the outcome design row is missing.
fn fitted_outcome(theta: &Array1<f64>, data: &SelectionData, layout: &ParamLayout) -> Array1<f64> {
    let beta_o = layout.view(theta, Block::Outcome);
    data.design(Block::Outcome).values().dot(&beta_o)
}

impl LogLikelihood for GenHeckman {
    type Data = SelectionData;

    /// Average log-likelihood at the free parameters `theta`.
    fn value(&self, theta: &Theta, data: &SelectionData) -> OptResult<f64> {
        let full = self.free.expand(theta);
        Ok(kernel::loglik(&full, data)? / data.weight_sum())
    }

    fn check(&self, theta: &Theta, _data: &SelectionData) -> OptResult<()> {
        if theta.len() != self.free.n_free() {
            return Err(OptError::ThetaLengthMismatch {
                expected: self.free.n_free(),
                actual: theta.len(),
            });
        }
        check_finite(theta)?;
        Ok(())
    }

    /// Gradient of the average log-likelihood w.r.t. the free parameters.
    fn grad(&self, theta: &Theta, data: &SelectionData) -> OptResult<Grad> {
        let full = self.free.expand(theta);
        let (_, grad) = kernel::loglik_and_grad(&full, data)?;
        Ok(self.free.restrict(&grad) / data.weight_sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        inference::errors::InferenceError,
        optimization::loglik_optimizer::{LineSearcher, MLEOptions, Tolerances},
        selection::core::{data::BlockDesigns, design::DesignMatrix},
    };
    use ndarray::{Array2, array};
    use rand::{SeedableRng, rngs::StdRng};
    use rand_distr::{Distribution, StandardNormal};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // - Hard failures of `fit`: non-finite start, exhausted iteration budget,
    //   singular information at a converged point.
    // - Layout is [β_S (2) | β_O (2) | γ_σ (1) | δ_ρ (1)].
    // -------------------------------------------------------------------------

    fn simulated(n: usize, seed: u64) -> SelectionData {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut xs = Array2::<f64>::ones((n, 2));
        let mut xo = Array2::<f64>::ones((n, 2));
        let mut ind = Array1::<f64>::zeros(n);
        let mut y = Array1::from_elem(n, f64::NAN);
        for i in 0..n {
            let x: f64 = StandardNormal.sample(&mut rng);
            let u: f64 = StandardNormal.sample(&mut rng);
            let e: f64 = StandardNormal.sample(&mut rng);
            xs[[i, 1]] = x;
            xo[[i, 1]] = x;
            if 0.2 + 0.9 * x + u > 0.0 {
                ind[i] = 1.0;
                y[i] = 1.0 + 0.5 * x + 0.4 * u + e;
            }
        }
        let ones = Array2::<f64>::ones((n, 1));
        let designs = BlockDesigns {
            selection: DesignMatrix::unnamed(xs),
            outcome: DesignMatrix::unnamed(xo),
            dispersion: DesignMatrix::unnamed(ones.clone()),
            correlation: DesignMatrix::unnamed(ones),
        };
        SelectionData::new(ind, y, None, designs).expect("valid data")
    }

    #[test]
    // Purpose
    // -------
    // Hitting the iteration cap is a failure, not a best-effort fit.
    //
    // Given
    // -----
    // - Zero start, `max_iter = 1`, gradient tolerance 1e-12.
    //
    // Expect
    // ------
    // - `OptimizationFailed { status: "MaxItersReached", iterations: 1 }`.
    fn iteration_cap_is_optimization_failure() {
        let data = simulated(400, 5);
        let tols = Tolerances::new(Some(1e-12), None, Some(1)).expect("tolerances");
        let mle = MLEOptions::new(tols, LineSearcher::MoreThuente, None).expect("options");
        let model = GenHeckman::new(&data, Array1::zeros(6), HeckmanOptions::new(mle)).expect("model");

        let err = model.fit(&data).expect_err("capped run");

        match err {
            SelectionError::OptimizationFailed { status, iterations } => {
                assert_eq!(status, "MaxItersReached");
                assert_eq!(iterations, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // A start where some contribution is not finite is rejected before the
    // solver runs.
    //
    // Given
    // -----
    // - Outcome intercept 1e200 and dispersion predictor −400 (σ at its
    //   lower clamp), so the standardized residual overflows.
    //
    // Expect
    // ------
    // - `NonFiniteStart`.
    fn non_finite_start_is_rejected() {
        let data = simulated(200, 6);
        let start = array![0.0, 0.0, 1e200, 0.0, -400.0, 0.0];
        let model = GenHeckman::new(&data, start, HeckmanOptions::default()).expect("model");

        let err = model.fit(&data).expect_err("non-finite start");

        assert!(matches!(err, SelectionError::NonFiniteStart { .. }), "{err}");
    }

    #[test]
    // Purpose
    // -------
    // A singular information matrix surfaces as a covariance failure that
    // still carries the point estimate and log-likelihood.
    //
    // Given
    // -----
    // - Everything fixed except the dispersion intercept, started at 400
    //   where the σ clamp is active: the free gradient is exactly zero, so
    //   the solver converges at once and the information is zero.
    //
    // Expect
    // ------
    // - `Covariance { source: NotPositiveDefinite, theta_hat, loglik }` with
    //   `theta_hat` equal to the start and `loglik` finite.
    fn singular_information_keeps_point_estimate() {
        let data = simulated(200, 7);
        let start = array![0.1, 0.5, 1.0, 0.3, 400.0, 0.0];
        let options = HeckmanOptions::default().with_fixed([0, 1, 2, 3, 5]);
        let model = GenHeckman::new(&data, start.clone(), options).expect("model");

        let err = model.fit(&data).expect_err("singular information");

        match err {
            SelectionError::Covariance { source, theta_hat, loglik } => {
                assert!(matches!(source, InferenceError::NotPositiveDefinite { .. }), "{source}");
                assert_eq!(theta_hat, start);
                assert!(loglik.is_finite());
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
