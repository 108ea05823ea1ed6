//! Integration tests for generalized Heckman estimation and inference.
//!
//! Purpose
//! -------
//! - Validate the end-to-end pipeline: table and typed specification,
//!   model frame, two-step start, joint MLE, covariance, and robust or
//!   cluster-robust standard errors.
//! - Use simulated data with heteroskedastic outcomes and a non-zero
//!   selection/outcome correlation, so every equation is identified.
//!
//! Coverage
//! --------
//! - `selection::models::estimate` with and without clustering, including
//!   the degraded-standard-error path.
//! - `selection::models::GenHeckman` refits, fixed parameters, and weights.
//! - `selection::models::FittedHeckman` robust vs singleton-cluster
//!   covariances.
//!
//! Exclusions
//! ----------
//! - Input validation and numerical helpers; those are covered by unit
//!   tests next to each module.
use approx::assert_abs_diff_eq;
use gen_heckman::{
    inference::ClusterAssignment,
    optimization::loglik_optimizer::MLEOptions,
    selection::{
        Block, EquationSpec, GenHeckman, HeckmanOptions, HeckmanRequest, HeckmanSpec, ModelFrame,
        SelectionError, StdErrorKind, Table,
        core::{kernel, linalg::weighted_least_squares, two_step::two_step_start},
        estimate,
    },
};
use ndarray::{Array1, Axis};
use rand::{SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, StandardNormal};

/// Simulated selection sample.
///
/// - `s* = 0.3 + 0.8 x1 − 0.9 x2 + u`, `s = 1{s* > 0}`;
/// - `y = 1 + 0.5 x1 + σ_i e` on selected rows (NaN otherwise), with
///   `log σ_i = γ0 + γ1 x1` and `corr(u, e) = ρ`;
/// - `w` cycles through 0.5, 1, 2; `firm = i mod 40`.
fn simulate(n: usize, gamma: (f64, f64), rho: f64, seed: u64) -> Table {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut cols: [Vec<f64>; 6] = Default::default();
    for i in 0..n {
        let x1: f64 = StandardNormal.sample(&mut rng);
        let x2: f64 = StandardNormal.sample(&mut rng);
        let u: f64 = StandardNormal.sample(&mut rng);
        let v: f64 = StandardNormal.sample(&mut rng);
        let e = rho * u + (1.0 - rho * rho).sqrt() * v;
        let selected = 0.3 + 0.8 * x1 - 0.9 * x2 + u > 0.0;
        let sigma = (gamma.0 + gamma.1 * x1).exp();
        cols[0].push(if selected { 1.0 } else { 0.0 });
        cols[1].push(if selected { 1.0 + 0.5 * x1 + sigma * e } else { f64::NAN });
        cols[2].push(x1);
        cols[3].push(x2);
        cols[4].push([0.5, 1.0, 2.0][i % 3]);
        cols[5].push((i % 40) as f64);
    }
    let [s, y, x1, x2, w, firm] = cols;
    Table::new()
        .with_column("s", Array1::from(s))
        .and_then(|t| t.with_column("y", Array1::from(y)))
        .and_then(|t| t.with_column("x1", Array1::from(x1)))
        .and_then(|t| t.with_column("x2", Array1::from(x2)))
        .and_then(|t| t.with_column("w", Array1::from(w)))
        .and_then(|t| t.with_column("firm", Array1::from(firm)))
        .expect("simulated table")
}

fn full_spec() -> HeckmanSpec {
    HeckmanSpec::new("s", "y", EquationSpec::new(["x1", "x2"]), EquationSpec::new(["x1"]))
        .with_dispersion(EquationSpec::new(["x1"]))
}

#[test]
// Purpose
// -------
// A full four-equation fit converges with named blocks, a square
// covariance, and estimates near the generating values; refitting from the
// estimate stops at once.
//
// Given
// -----
// - n = 2500, log σ = −0.2 + 0.3 x1, ρ = 0.4; sel ~ x1 + x2, y ~ x1,
//   dispersion ~ x1, correlation ~ 1.
//
// Expect
// ------
// - Converged, block widths (3, 2, 2, 1), 8 × 8 covariance, finite ℓ.
// - Outcome slope within 0.1 of 0.5; dispersion slope within 0.1 of 0.3.
// - The refit takes at most one iteration.
fn end_to_end_fit_and_refit() {
    let table = simulate(2500, (-0.2, 0.3), 0.4, 42);
    let spec = full_spec();

    let fit = estimate(&HeckmanRequest::new(&table, spec.clone())).expect("fit");

    assert!(fit.outcome().converged, "status {}", fit.outcome().status);
    assert_eq!(fit.coefficients(Block::Selection).len(), 3);
    assert_eq!(fit.coefficients(Block::Outcome).len(), 2);
    assert_eq!(fit.coefficients(Block::Dispersion).len(), 2);
    assert_eq!(fit.coefficients(Block::Correlation).len(), 1);
    assert_eq!(fit.coef_names(Block::Selection), vec!["(Intercept)", "x1", "x2"]);
    assert_eq!(fit.covariance().dim(), (8, 8));
    assert!(fit.loglik().is_finite());
    assert!(fit.std_errors().iter().all(|se| se.is_finite() && *se > 0.0));
    assert_eq!(fit.se_kind(), &StdErrorKind::ModelBased);
    assert_eq!(fit.spec(), Some(&spec));
    assert_eq!(fit.fitted_values().len(), 2500);

    assert!((fit.coefficients(Block::Outcome)[1] - 0.5).abs() < 0.1);
    assert!((fit.coefficients(Block::Dispersion)[1] - 0.3).abs() < 0.1);
    let nuisance = fit
        .nuisance_at(ndarray::array![1.0, 0.0].view(), ndarray::array![1.0].view())
        .expect("nuisance");
    assert!(nuisance.rho > 0.0 && nuisance.rho < 1.0);
    assert!(nuisance.sigma_se > 0.0 && nuisance.rho_se > 0.0);

    let frame = ModelFrame::build(&table, &spec).expect("frame");
    let refit = GenHeckman::new(frame.data(), fit.params().to_owned(), HeckmanOptions::default())
        .and_then(|m| m.fit(frame.data()))
        .expect("refit");
    assert!(refit.outcome().iterations <= 1, "refit took {}", refit.outcome().iterations);
    assert_abs_diff_eq!(refit.loglik(), fit.loglik(), epsilon = 1e-6);
}

#[test]
// Purpose
// -------
// Maximum likelihood never ends below its two-step start.
//
// Given
// -----
// - The full specification on a fresh sample.
//
// Expect
// ------
// - ℓ(θ̂) ≥ ℓ(θ_start).
fn mle_improves_on_two_step_start() {
    let table = simulate(1500, (0.1, -0.2), -0.5, 7);
    let frame = ModelFrame::build(&table, &full_spec()).expect("frame");
    let start = two_step_start(frame.data(), &MLEOptions::default()).expect("start");
    let ll_start = kernel::loglik(&start, frame.data()).expect("start loglik");

    let fit = GenHeckman::new(frame.data(), start, HeckmanOptions::default())
        .and_then(|m| m.fit(frame.data()))
        .expect("fit");

    assert!(fit.loglik() >= ll_start - 1e-9, "{} < {ll_start}", fit.loglik());
}

#[test]
// Purpose
// -------
// With ρ fixed at 0 and constant dispersion the outcome equation separates
// and its MLE is weighted least squares on the selected rows.
//
// Given
// -----
// - Weighted sample, intercept-only dispersion, correlation index fixed at
//   its zero start.
//
// Expect
// ------
// - Outcome block equals WLS to 1e-4; the fixed entry stays 0 with zero
//   variance; `k` counts free parameters only.
fn fixed_zero_correlation_reduces_outcome_to_wls() {
    let table = simulate(1500, (0.2, 0.0), 0.6, 3);
    let spec = HeckmanSpec::new("s", "y", EquationSpec::new(["x1", "x2"]), EquationSpec::new(["x1"]))
        .with_weights("w");
    let frame = ModelFrame::build(&table, &spec).expect("frame");
    let data = frame.data();
    let k = data.layout().len();
    let rho_index = data.layout().range(Block::Correlation).start;

    let start = two_step_start(data, &MLEOptions::default()).expect("start");
    assert_eq!(start[rho_index], 0.0);
    let options = HeckmanOptions::default().with_fixed([rho_index]);
    let fit = GenHeckman::new(data, start, options).and_then(|m| m.fit(data)).expect("fit");

    let rows = data.selected_rows();
    let x = data.design(Block::Outcome).values().select(Axis(0), rows);
    let y = data.outcome().select(Axis(0), rows);
    let w = data.weights().select(Axis(0), rows);
    let wls = weighted_least_squares(x.view(), y.view(), w.view()).expect("wls");

    for (a, b) in fit.coefficients(Block::Outcome).iter().zip(wls.coef.iter()) {
        assert_abs_diff_eq!(a, b, epsilon = 1e-4);
    }
    assert_eq!(fit.coefficients(Block::Correlation)[0], 0.0);
    assert_eq!(fit.covariance()[[rho_index, rho_index]], 0.0);
    assert_eq!(fit.n_free(), k - 1);
}

#[test]
// Purpose
// -------
// Singleton clusters reproduce the heteroskedasticity-robust covariance.
//
// Given
// -----
// - A fitted model; one cluster per estimation row.
//
// Expect
// ------
// - Equal covariances to round-off; the clustered fit records the names.
fn singleton_clusters_match_robust_covariance() {
    let table = simulate(1200, (0.0, 0.2), 0.3, 9);
    let frame = ModelFrame::build(&table, &full_spec()).expect("frame");
    let data = frame.data();
    let fit = estimate(&HeckmanRequest::new(&table, full_spec())).expect("fit");

    let robust = fit.with_robust_errors(data).expect("robust");
    let singletons =
        ClusterAssignment::new(vec!["row".to_string()], (0..data.n_obs()).collect::<Vec<_>>())
            .expect("clusters");
    let clustered = fit.with_clustered_errors(data, &singletons).expect("clustered");

    for (a, b) in robust.covariance().iter().zip(clustered.covariance().iter()) {
        assert_abs_diff_eq!(a, b, epsilon = 1e-10 * (1.0 + a.abs()));
    }
    assert_eq!(robust.se_kind(), &StdErrorKind::Robust);
    assert_eq!(clustered.se_kind(), &StdErrorKind::Clustered { names: vec!["row".into()] });
    assert_eq!(fit.se_kind(), &StdErrorKind::ModelBased);
}

#[test]
// Purpose
// -------
// Unit weights are a no-op; scaling every weight scales ℓ but not θ̂.
//
// Given
// -----
// - The same sample fitted without weights, with w = 1, and with w = 3.
//
// Expect
// ------
// - Unweighted and unit-weighted fits are identical.
// - ℓ triples under w = 3; coefficients agree to 1e-5.
fn weights_scale_loglik_not_coefficients() {
    let base = simulate(1200, (0.0, 0.2), 0.3, 17);
    let n = base.n_rows();
    let table = base
        .with_column("one", Array1::ones(n))
        .and_then(|t| t.with_column("three", Array1::from_elem(n, 3.0)))
        .expect("table");

    let plain = estimate(&HeckmanRequest::new(&table, full_spec())).expect("plain");
    let unit =
        estimate(&HeckmanRequest::new(&table, full_spec().with_weights("one"))).expect("unit");
    let tripled =
        estimate(&HeckmanRequest::new(&table, full_spec().with_weights("three"))).expect("x3");

    assert_eq!(plain.params(), unit.params());
    assert_eq!(plain.loglik(), unit.loglik());
    assert_abs_diff_eq!(tripled.loglik(), 3.0 * plain.loglik(), epsilon = 1e-6 * plain.loglik().abs());
    for (a, b) in plain.params().iter().zip(tripled.params().iter()) {
        assert_abs_diff_eq!(a, b, epsilon = 1e-5);
    }
}

#[test]
// Purpose
// -------
// Clustering through the request, and the degraded-SE policy on failure.
//
// Given
// -----
// - Clustering on "firm"; then on an absent column with and without
//   `allow_degraded_se`.
//
// Expect
// ------
// - Clustered fit with a covariance that differs from the model-based one.
// - Degraded request returns the model-based fit; strict request errors.
fn clustering_through_request_and_degraded_policy() {
    let table = simulate(1500, (0.0, 0.2), 0.3, 23);

    let clustered =
        estimate(&HeckmanRequest::new(&table, full_spec()).with_cluster(["firm"])).expect("fit");
    assert_eq!(clustered.se_kind(), &StdErrorKind::Clustered { names: vec!["firm".into()] });
    assert_ne!(clustered.covariance(), clustered.model_covariance());

    let degraded = estimate(
        &HeckmanRequest::new(&table, full_spec()).with_cluster(["plant"]).allow_degraded_se(true),
    )
    .expect("degraded");
    assert_eq!(degraded.se_kind(), &StdErrorKind::ModelBased);

    let strict = estimate(&HeckmanRequest::new(&table, full_spec()).with_cluster(["plant"]));
    assert!(matches!(strict, Err(SelectionError::Inference(_))));
}
