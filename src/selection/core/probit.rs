//! Weighted probit of the selection indicator, used as the first stage of
//! the two-step start.
//!
//! The objective is the average weighted probit log-likelihood
//! `(1/W) Σ w_i [s_i log Φ(η_i) + (1 − s_i) log Φ(−η_i)]`, `η_i = x_i β`,
//! with the analytic gradient `(1/W) Σ w_i g_i x_i`, where `g_i = λ(η_i)`
//! for selected rows and `−λ(−η_i)` otherwise (`λ` the inverse Mills ratio).
use crate::{
    optimization::{
        errors::{OptError, OptResult},
        loglik_optimizer::{Grad, LogLikelihood, MLEOptions, Theta, maximize},
        numerical_stability::{inv_mills, log_norm_cdf},
    },
    selection::{
        core::{data::SelectionData, layout::Block},
        errors::{SelectionError, SelectionResult},
    },
};
use ndarray::Array1;

/// Probit model over the selection block of a [`SelectionData`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Probit;

impl Probit {
    fn walk<F>(theta: &Theta, data: &SelectionData, mut visit: F) -> f64
    where
        F: FnMut(usize, f64),
    {
        let x = data.design(Block::Selection).values();
        let eta = x.dot(theta);
        let w = data.weights();
        let mut total = 0.0;
        for i in 0..data.n_obs() {
            if w[i] == 0.0 {
                continue;
            }
            let (ll, g) = if data.is_selected(i) {
                (log_norm_cdf(eta[i]), inv_mills(eta[i]))
            } else {
                (log_norm_cdf(-eta[i]), -inv_mills(-eta[i]))
            };
            total += w[i] * ll;
            visit(i, w[i] * g);
        }
        total / data.weight_sum()
    }
}

impl LogLikelihood for Probit {
    type Data = SelectionData;

    fn value(&self, theta: &Theta, data: &SelectionData) -> OptResult<f64> {
        let v = Self::walk(theta, data, |_, _| {});
        if !v.is_finite() {
            return Err(OptError::NonFiniteCost { value: v });
        }
        Ok(v)
    }

    fn check(&self, theta: &Theta, data: &SelectionData) -> OptResult<()> {
        let expected = data.design(Block::Selection).ncols();
        if theta.len() != expected {
            return Err(OptError::ThetaLengthMismatch { expected, actual: theta.len() });
        }
        if let Some((index, &value)) = theta.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(OptError::InvalidThetaInput { index, value });
        }
        Ok(())
    }

    fn grad(&self, theta: &Theta, data: &SelectionData) -> OptResult<Grad> {
        let x = data.design(Block::Selection).values();
        let mut grad = Array1::<f64>::zeros(theta.len());
        Self::walk(theta, data, |i, g| grad.scaled_add(g, &x.row(i)));
        grad /= data.weight_sum();
        Ok(grad)
    }
}

/// Fit the probit from zero coefficients.
///
/// Errors
/// ------
/// - `StartingValues { stage: "probit" }` when the optimizer fails or stops
///   without converging.
pub fn fit_probit(data: &SelectionData, opts: &MLEOptions) -> SelectionResult<Array1<f64>> {
    let theta0 = Array1::zeros(data.design(Block::Selection).ncols());
    let out = maximize(&Probit, theta0, data, opts).map_err(|e| SelectionError::StartingValues {
        stage: "probit",
        reason: e.to_string(),
    })?;
    if !out.converged {
        return Err(SelectionError::StartingValues {
            stage: "probit",
            reason: format!("not converged after {} iterations ({})", out.iterations, out.status),
        });
    }
    log::debug!("probit start converged in {} iterations", out.iterations);
    Ok(out.theta_hat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        optimization::loglik_optimizer::{LineSearcher, Tolerances},
        selection::core::{data::BlockDesigns, design::DesignMatrix},
    };
    use ndarray::Array2;
    use rand::{SeedableRng, rngs::StdRng};
    use rand_distr::{Distribution, StandardNormal};

    fn simulated(n: usize, beta: (f64, f64), seed: u64) -> SelectionData {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut xs = Array2::<f64>::ones((n, 2));
        let mut ind = Array1::<f64>::zeros(n);
        for i in 0..n {
            let x: f64 = StandardNormal.sample(&mut rng);
            let e: f64 = StandardNormal.sample(&mut rng);
            xs[[i, 1]] = x;
            ind[i] = if beta.0 + beta.1 * x + e > 0.0 { 1.0 } else { 0.0 };
        }
        let ones = Array2::<f64>::ones((n, 1));
        let designs = BlockDesigns {
            selection: DesignMatrix::unnamed(xs),
            outcome: DesignMatrix::unnamed(ones.clone()),
            dispersion: DesignMatrix::unnamed(ones.clone()),
            correlation: DesignMatrix::unnamed(ones),
        };
        SelectionData::new(ind, Array1::zeros(n), None, designs).expect("valid data")
    }

    #[test]
    // Purpose
    // -------
    // The probit recovers the coefficients it was simulated from.
    //
    // Given
    // -----
    // - n = 4000, P(s = 1 | x) = Φ(0.3 + 0.8 x), x ~ N(0, 1).
    //
    // Expect
    // ------
    // - Both estimates within 0.1 of the truth.
    fn probit_recovers_known_coefficients() {
        let data = simulated(4000, (0.3, 0.8), 11);

        let beta = fit_probit(&data, &MLEOptions::default()).expect("probit");

        assert!((beta[0] - 0.3).abs() < 0.1, "intercept {}", beta[0]);
        assert!((beta[1] - 0.8).abs() < 0.1, "slope {}", beta[1]);
    }

    #[test]
    // Purpose
    // -------
    // The analytic gradient matches central differences of the value.
    //
    // Given
    // -----
    // - Small simulated sample, β = (0.1, −0.2).
    //
    // Expect
    // ------
    // - Agreement to 1e-7.
    fn probit_gradient_matches_finite_differences() {
        let data = simulated(200, (0.0, 1.0), 3);
        let theta = ndarray::array![0.1, -0.2];
        let g = Probit.grad(&theta, &data).expect("grad");
        let h = 1e-6;
        for j in 0..2 {
            let mut up = theta.clone();
            let mut dn = theta.clone();
            up[j] += h;
            dn[j] -= h;
            let fd = (Probit.value(&up, &data).expect("up") - Probit.value(&dn, &data).expect("dn"))
                / (2.0 * h);
            assert!((g[j] - fd).abs() < 1e-7, "coordinate {j}: {} vs {fd}", g[j]);
        }
    }

    #[test]
    // Purpose
    // -------
    // A probit that stops on the iteration cap fails the starting-value
    // stage instead of handing back unconverged coefficients.
    //
    // Given
    // -----
    // - Simulated sample, `max_iter = 1`, gradient tolerance 1e-12.
    //
    // Expect
    // ------
    // - `StartingValues { stage: "probit" }` naming `MaxItersReached`.
    fn probit_iteration_cap_fails_starting_values() {
        let data = simulated(500, (0.3, 0.8), 12);
        let tols = Tolerances::new(Some(1e-12), None, Some(1)).expect("tolerances");
        let opts = MLEOptions::new(tols, LineSearcher::MoreThuente, None).expect("options");

        let err = fit_probit(&data, &opts).expect_err("capped probit");

        match err {
            SelectionError::StartingValues { stage, reason } => {
                assert_eq!(stage, "probit");
                assert!(reason.contains("MaxItersReached"), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
