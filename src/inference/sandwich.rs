//! inference::sandwich: heteroskedasticity- and cluster-robust covariances.
//!
//! Both estimators share one shape: `V = c · B M B`, with `B` the
//! model-based covariance (the "bread"), `M` the outer-product "meat" of
//! per-observation or per-cluster score sums, and `c` a small-sample factor.
//!
//! - heteroskedasticity-robust: every row is its own group,
//!   `c = n / (n − k)`;
//! - cluster-robust: rows are summed within clusters,
//!   `c = G/(G − 1) · (n − 1)/(n − k)`.
//!
//! With one row per cluster the two factors coincide, so the estimators
//! agree up to round-off. `k` counts free parameters only; fixed parameters
//! have zero rows/columns in `B` and drop out of the product.
use crate::inference::errors::{InferenceError, InferenceResult};
use ndarray::{Array2, ArrayView2};

/// Heteroskedasticity-robust sandwich `n/(n−k) · B (Σ_i s_i s_iᵀ) B`.
///
/// Parameters
/// ----------
/// - `bread`: `p × p` model-based covariance.
/// - `scores`: `n × p` per-observation scores of the summed log-likelihood.
/// - `n_free`: number of free parameters `k`.
///
/// Errors
/// ------
/// - `ScoreShapeMismatch` when `scores.ncols() != p`.
/// - `DegreesOfFreedomExhausted` when `n ≤ k`.
pub fn robust_covariance(
    bread: ArrayView2<'_, f64>, scores: ArrayView2<'_, f64>, n_free: usize,
) -> InferenceResult<Array2<f64>> {
    check_shapes(bread, scores)?;
    let n = scores.nrows();
    let c = small_sample_factor(n, n_free, None)?;
    let meat = scores.t().dot(&scores);
    Ok(sandwich(bread, &meat, c))
}

/// Cluster-robust sandwich with per-cluster score sums.
///
/// Parameters
/// ----------
/// - `bread`, `scores`, `n_free`: as for [`robust_covariance`].
/// - `groups`: dense cluster index per row, `groups[i] < n_groups`.
/// - `n_groups`: number of distinct clusters `G`.
///
/// Errors
/// ------
/// - `ClusterLengthMismatch` when `groups.len() != n`.
/// - `TooFewClusters` when `G < 2`.
/// - `ScoreShapeMismatch`, `DegreesOfFreedomExhausted` as above.
///
/// Panics
/// ------
/// - If some `groups[i] >= n_groups`.
pub fn cluster_robust_covariance(
    bread: ArrayView2<'_, f64>, scores: ArrayView2<'_, f64>, groups: &[usize],
    n_groups: usize, n_free: usize,
) -> InferenceResult<Array2<f64>> {
    check_shapes(bread, scores)?;
    let n = scores.nrows();
    if groups.len() != n {
        return Err(InferenceError::ClusterLengthMismatch { expected: n, found: groups.len() });
    }
    if n_groups < 2 {
        return Err(InferenceError::TooFewClusters { found: n_groups });
    }
    let c = small_sample_factor(n, n_free, Some(n_groups))?;

    let p = scores.ncols();
    let mut sums = Array2::<f64>::zeros((n_groups, p));
    for (row, &g) in scores.outer_iter().zip(groups) {
        let mut acc = sums.row_mut(g);
        acc += &row;
    }
    let meat = sums.t().dot(&sums);
    Ok(sandwich(bread, &meat, c))
}

fn check_shapes(bread: ArrayView2<'_, f64>, scores: ArrayView2<'_, f64>) -> InferenceResult<()> {
    let p = bread.nrows();
    if bread.ncols() != p || scores.ncols() != p {
        return Err(InferenceError::ScoreShapeMismatch {
            scores: scores.dim(),
            bread: bread.dim(),
        });
    }
    Ok(())
}

fn small_sample_factor(n: usize, k: usize, groups: Option<usize>) -> InferenceResult<f64> {
    if n <= k {
        return Err(InferenceError::DegreesOfFreedomExhausted { n_obs: n, n_params: k });
    }
    let (n, k) = (n as f64, k as f64);
    Ok(match groups {
        None => n / (n - k),
        Some(g) => {
            let g = g as f64;
            (g / (g - 1.0)) * ((n - 1.0) / (n - k))
        }
    })
}

fn sandwich(bread: ArrayView2<'_, f64>, meat: &Array2<f64>, c: f64) -> Array2<f64> {
    let mut v = bread.dot(meat).dot(&bread);
    v.mapv_inplace(|x| c * x);
    let p = v.nrows();
    for i in 0..p {
        for j in 0..i {
            let avg = 0.5 * (v[[i, j]] + v[[j, i]]);
            v[[i, j]] = avg;
            v[[j, i]] = avg;
        }
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // - Hand-computed meat and correction factors.
    // - Singleton clusters reproduce the heteroskedasticity-robust result.
    // - Input validation (too few clusters, exhausted degrees of freedom).
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // One row per cluster gives the same matrix as the robust estimator.
    //
    // Given
    // -----
    // - A 2×2 bread and 5×2 scores; groups 0..5.
    //
    // Expect
    // ------
    // - Every cell equal to 1e-12 relative.
    fn singleton_clusters_match_robust() {
        // Arrange
        let bread = array![[0.5, 0.1], [0.1, 0.3]];
        let scores = array![[1.0, -0.2], [-0.4, 0.9], [0.3, 0.3], [-0.7, -0.5], [0.2, 0.1]];
        let groups: Vec<usize> = (0..5).collect();

        // Act
        let hc = robust_covariance(bread.view(), scores.view(), 2).expect("robust");
        let cl = cluster_robust_covariance(bread.view(), scores.view(), &groups, 5, 2)
            .expect("cluster");

        // Assert
        for (a, b) in hc.iter().zip(cl.iter()) {
            assert_relative_eq!(*a, *b, max_relative = 1e-12);
        }
    }

    #[test]
    // Purpose
    // -------
    // Scores are summed within clusters before the outer product.
    //
    // Given
    // -----
    // - Scalar parameter, bread = 1, scores (1, 2, −1, 3) in clusters
    //   {0, 0, 1, 1}; n = 4, k = 1, G = 2.
    //
    // Expect
    // ------
    // - meat = 3² + 2² = 13; c = 2 · 3/3 = 2; V = 26.
    fn cluster_sums_and_factor_hand_case() {
        let bread = array![[1.0]];
        let scores = array![[1.0], [2.0], [-1.0], [3.0]];
        let v = cluster_robust_covariance(bread.view(), scores.view(), &[0, 0, 1, 1], 2, 1)
            .expect("cluster");
        assert_relative_eq!(v[[0, 0]], 26.0, max_relative = 1e-14);
    }

    #[test]
    // Purpose
    // -------
    // Degenerate inputs are errors, not NaNs.
    //
    // Given
    // -----
    // - One cluster; then n = k.
    //
    // Expect
    // ------
    // - `TooFewClusters`, then `DegreesOfFreedomExhausted`.
    fn degenerate_inputs_are_rejected() {
        let bread = array![[1.0]];
        let scores = array![[1.0], [2.0]];
        assert_eq!(
            cluster_robust_covariance(bread.view(), scores.view(), &[0, 0], 1, 1),
            Err(InferenceError::TooFewClusters { found: 1 })
        );
        assert_eq!(
            robust_covariance(bread.view(), scores.view(), 2),
            Err(InferenceError::DegreesOfFreedomExhausted { n_obs: 2, n_params: 2 })
        );
    }
}
