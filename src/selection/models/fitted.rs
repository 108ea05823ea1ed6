//! Fitted generalized Heckman model and its inference summaries.
//!
//! Purpose
//! -------
//! Own everything a completed fit reports: the full parameter vector, its
//! covariance, the log-likelihood, fitted outcome values, optimizer
//! diagnostics, and which kind of standard errors the covariance carries.
//!
//! Key behaviors
//! -------------
//! - Named coefficient blocks ([`FittedHeckman::coefficients`]) and a
//!   coefficient table with z statistics and two-sided normal p-values
//!   ([`FittedHeckman::coef_table`]).
//! - Natural-scale nuisance parameters: σ and ρ per selected row, or at a
//!   covariate profile with delta-method standard errors.
//! - Robust and cluster-robust covariances return a *new* fit; the
//!   model-based covariance is kept as the bread for later re-clustering.
//!
//! Invariants & assumptions
//! ------------------------
//! - `covariance` is `k × k` with zero rows and columns at fixed indices.
//! - Methods taking `&SelectionData` expect the sample the model was fitted
//!   on; a layout mismatch is reported as `ParamLengthMismatch`.
use crate::{
    inference::{
        cluster::ClusterAssignment,
        errors::InferenceError,
        hessian::standard_errors,
        sandwich::{cluster_robust_covariance, robust_covariance},
    },
    optimization::{
        loglik_optimizer::OptimOutcome,
        numerical_stability::{
            correlation_from_unconstrained, correlation_jacobian, delta_method,
            dispersion_from_unconstrained, dispersion_jacobian,
        },
    },
    selection::{
        core::{
            data::SelectionData,
            design::HeckmanSpec,
            kernel,
            layout::{Block, ParamLayout},
        },
        errors::{SelectionError, SelectionResult},
    },
};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, s};
use statrs::function::erf::erfc;
use std::{f64::consts::SQRT_2, hash::Hash};

/// Kind of standard errors carried by a fit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StdErrorKind {
    /// Inverse observed information.
    ModelBased,
    /// Heteroskedasticity-robust sandwich.
    Robust,
    /// Cluster-robust sandwich over the named variables.
    Clustered { names: Vec<String> },
}

/// One row of [`FittedHeckman::coef_table`].
///
/// Fixed parameters have `std_error == 0` and NaN `z_value`/`p_value`.
#[derive(Debug, Clone, PartialEq)]
pub struct CoefRow {
    pub block: Block,
    pub name: String,
    pub estimate: f64,
    pub std_error: f64,
    pub z_value: f64,
    pub p_value: f64,
}

/// σ and ρ at a covariate profile with delta-method standard errors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NuisanceEstimate {
    pub sigma: f64,
    pub sigma_se: f64,
    pub rho: f64,
    pub rho_se: f64,
}

/// Result of a converged generalized Heckman fit.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedHeckman {
    params: Array1<f64>,
    layout: ParamLayout,
    names: Vec<(Block, String)>,
    covariance: Array2<f64>,
    model_covariance: Array2<f64>,
    loglik: f64,
    fitted_values: Array1<f64>,
    outcome: OptimOutcome,
    se_kind: StdErrorKind,
    free: Vec<usize>,
    n_obs: usize,
    spec: Option<HeckmanSpec>,
}

impl FittedHeckman {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        params: Array1<f64>, layout: ParamLayout, names: Vec<(Block, String)>,
        covariance: Array2<f64>, loglik: f64, fitted_values: Array1<f64>, outcome: OptimOutcome,
        free: Vec<usize>, n_obs: usize,
    ) -> Self {
        Self {
            params,
            layout,
            names,
            model_covariance: covariance.clone(),
            covariance,
            loglik,
            fitted_values,
            outcome,
            se_kind: StdErrorKind::ModelBased,
            free,
            n_obs,
            spec: None,
        }
    }

    /// Attach the specification the fit was built from.
    pub fn with_spec(mut self, spec: HeckmanSpec) -> Self {
        self.spec = Some(spec);
        self
    }

    /// Full parameter vector `[β_S | β_O | γ_σ | δ_ρ]`.
    pub fn params(&self) -> ArrayView1<'_, f64> {
        self.params.view()
    }

    pub fn coefficients(&self, block: Block) -> ArrayView1<'_, f64> {
        self.layout.view(&self.params, block)
    }

    /// Column names of one block, in coefficient order.
    pub fn coef_names(&self, block: Block) -> Vec<&str> {
        self.names.iter().filter(|(b, _)| *b == block).map(|(_, n)| n.as_str()).collect()
    }

    pub fn layout(&self) -> ParamLayout {
        self.layout
    }

    /// Current covariance (model-based, robust, or clustered per `se_kind`).
    pub fn covariance(&self) -> ArrayView2<'_, f64> {
        self.covariance.view()
    }

    /// Inverse observed information, regardless of `se_kind`.
    pub fn model_covariance(&self) -> ArrayView2<'_, f64> {
        self.model_covariance.view()
    }

    pub fn std_errors(&self) -> Array1<f64> {
        standard_errors(self.covariance.view())
    }

    /// Summed weighted log-likelihood at the estimate.
    pub fn loglik(&self) -> f64 {
        self.loglik
    }

    /// `X_O β̂_O` for every estimation row.
    pub fn fitted_values(&self) -> ArrayView1<'_, f64> {
        self.fitted_values.view()
    }

    /// Optimizer diagnostics (status, iterations, counters, gradient norm).
    pub fn outcome(&self) -> &OptimOutcome {
        &self.outcome
    }

    pub fn se_kind(&self) -> &StdErrorKind {
        &self.se_kind
    }

    /// Full-vector indices of the estimated (non-fixed) parameters.
    pub fn free_indices(&self) -> &[usize] {
        &self.free
    }

    pub fn n_free(&self) -> usize {
        self.free.len()
    }

    pub fn n_obs(&self) -> usize {
        self.n_obs
    }

    pub fn spec(&self) -> Option<&HeckmanSpec> {
        self.spec.as_ref()
    }

    /// Estimate, standard error, z statistic, and two-sided p-value per
    /// parameter, in layout order.
    pub fn coef_table(&self) -> Vec<CoefRow> {
        let se = self.std_errors();
        self.names
            .iter()
            .zip(self.params.iter().zip(se.iter()))
            .map(|((block, name), (&estimate, &std_error))| {
                let (z_value, p_value) = if std_error > 0.0 {
                    let z = estimate / std_error;
                    (z, erfc(z.abs() / SQRT_2))
                } else {
                    (f64::NAN, f64::NAN)
                };
                CoefRow { block: *block, name: name.clone(), estimate, std_error, z_value, p_value }
            })
            .collect()
    }

    /// σ and ρ at one covariate profile, with delta-method standard errors
    /// from the current covariance.
    ///
    /// Errors
    /// ------
    /// - `ProfileLengthMismatch` when a profile does not match its block.
    pub fn nuisance_at(
        &self, x_sigma: ArrayView1<'_, f64>, x_rho: ArrayView1<'_, f64>,
    ) -> SelectionResult<NuisanceEstimate> {
        self.check_profile(Block::Dispersion, x_sigma)?;
        self.check_profile(Block::Correlation, x_rho)?;
        let eta_d = x_sigma.dot(&self.coefficients(Block::Dispersion));
        let eta_r = x_rho.dot(&self.coefficients(Block::Correlation));

        let mut jac = Array2::<f64>::zeros((2, self.layout.len()));
        let rd = self.layout.range(Block::Dispersion);
        let rr = self.layout.range(Block::Correlation);
        jac.slice_mut(s![0, rd.start..rd.end])
            .assign(&x_sigma.mapv(|x| x * dispersion_jacobian(eta_d)));
        jac.slice_mut(s![1, rr.start..rr.end])
            .assign(&x_rho.mapv(|x| x * correlation_jacobian(eta_r)));
        let se = standard_errors(delta_method(self.covariance.view(), jac.view()).view());

        Ok(NuisanceEstimate {
            sigma: dispersion_from_unconstrained(eta_d),
            sigma_se: se[0],
            rho: correlation_from_unconstrained(eta_r),
            rho_se: se[1],
        })
    }

    /// σ_i for every selected row of `data`, in row order.
    pub fn sigma(&self, data: &SelectionData) -> SelectionResult<Array1<f64>> {
        self.per_selected_row(data, Block::Dispersion, dispersion_from_unconstrained)
    }

    /// ρ_i for every selected row of `data`, in row order.
    pub fn rho(&self, data: &SelectionData) -> SelectionResult<Array1<f64>> {
        self.per_selected_row(data, Block::Correlation, correlation_from_unconstrained)
    }

    /// Same fit with heteroskedasticity-robust standard errors.
    ///
    /// Errors
    /// ------
    /// - Kernel errors when `data` does not match the fit.
    /// - `Inference(DegreesOfFreedomExhausted)` when `n ≤ k`.
    pub fn with_robust_errors(&self, data: &SelectionData) -> SelectionResult<Self> {
        let scores = kernel::scores(&self.params, data)?;
        let covariance =
            robust_covariance(self.model_covariance.view(), scores.view(), self.n_free())?;
        Ok(self.replace_covariance(covariance, StdErrorKind::Robust))
    }

    /// Same fit with cluster-robust standard errors.
    ///
    /// Scores are evaluated at the estimate, summed within clusters, and
    /// sandwiched around the model-based covariance. `self` is unchanged on
    /// error.
    ///
    /// Errors
    /// ------
    /// - `Inference(ClusterLengthMismatch)` when `clusters` is not aligned with
    ///   the estimation rows.
    /// - `Inference(TooFewClusters)`, `Inference(DegreesOfFreedomExhausted)`.
    pub fn with_clustered_errors<K: Hash + Eq + Clone>(
        &self, data: &SelectionData, clusters: &ClusterAssignment<K>,
    ) -> SelectionResult<Self> {
        if clusters.len() != data.n_obs() {
            return Err(InferenceError::ClusterLengthMismatch {
                expected: data.n_obs(),
                found: clusters.len(),
            }
            .into());
        }
        let (groups, n_groups) = clusters.group_indices();
        let scores = kernel::scores(&self.params, data)?;
        let covariance = cluster_robust_covariance(
            self.model_covariance.view(),
            scores.view(),
            &groups,
            n_groups,
            self.n_free(),
        )?;
        let names = clusters.names().to_vec();
        Ok(self.replace_covariance(covariance, StdErrorKind::Clustered { names }))
    }

    fn replace_covariance(&self, covariance: Array2<f64>, se_kind: StdErrorKind) -> Self {
        Self { covariance, se_kind, ..self.clone() }
    }

    fn check_profile(&self, block: Block, x: ArrayView1<'_, f64>) -> SelectionResult<()> {
        let expected = self.layout.width(block);
        if x.len() != expected {
            return Err(SelectionError::ProfileLengthMismatch { block, expected, found: x.len() });
        }
        Ok(())
    }

    fn per_selected_row<F>(
        &self, data: &SelectionData, block: Block, link: F,
    ) -> SelectionResult<Array1<f64>>
    where
        F: Fn(f64) -> f64,
    {
        if data.layout() != self.layout {
            return Err(SelectionError::ParamLengthMismatch {
                expected: self.layout.len(),
                actual: data.layout().len(),
            });
        }
        let x = data.design(block).values().select(Axis(0), data.selected_rows());
        Ok(x.dot(&self.coefficients(block)).mapv(link))
    }
}
