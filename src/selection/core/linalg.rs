//! Small dense linear-algebra helpers for the two-step start: numerical
//! rank and weighted least squares, both through `nalgebra`'s SVD.
use crate::{
    inference::hessian::to_dmatrix, optimization::numerical_stability::EIGEN_EPS,
};
use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, ArrayView1, ArrayView2};

/// Weighted least-squares fit.
#[derive(Debug, Clone, PartialEq)]
pub struct WlsFit {
    /// Coefficients, one per column of `x`.
    pub coef: Array1<f64>,
    /// Unweighted residuals `y − Xβ`.
    pub residuals: Array1<f64>,
}

/// Numerical column rank: singular values above `EIGEN_EPS · σ_max`.
pub fn column_rank(x: ArrayView2<'_, f64>) -> usize {
    if x.is_empty() {
        return 0;
    }
    singular_rank(&to_dmatrix(x).singular_values())
}

fn singular_rank(sv: &DVector<f64>) -> usize {
    let smax = sv.iter().copied().fold(0.0, f64::max);
    if smax <= 0.0 {
        return 0;
    }
    sv.iter().filter(|&&s| s > EIGEN_EPS * smax).count()
}

/// Minimize `Σ w_i (y_i − x_iβ)²`.
///
/// Returns `None` when `√W X` is rank deficient, including when there are
/// fewer positively weighted rows than columns.
pub fn weighted_least_squares(
    x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>, w: ArrayView1<'_, f64>,
) -> Option<WlsFit> {
    let (n, k) = x.dim();
    if k == 0 || n < k {
        return None;
    }
    let sw: Vec<f64> = w.iter().map(|&wi| wi.max(0.0).sqrt()).collect();
    let xw = DMatrix::from_fn(n, k, |i, j| sw[i] * x[[i, j]]);
    let yw = DVector::from_fn(n, |i, _| sw[i] * y[i]);

    let svd = xw.svd(true, true);
    if singular_rank(&svd.singular_values) < k {
        return None;
    }
    let beta = svd.solve(&yw, 0.0).ok()?;
    let coef: Array1<f64> = beta.iter().copied().collect();
    let residuals = &y - &x.dot(&coef);
    Some(WlsFit { coef, residuals })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // An exact linear relation is recovered with zero residuals.
    //
    // Given
    // -----
    // - y = 1 + 2x on x = 0..4, unequal positive weights.
    //
    // Expect
    // ------
    // - β = (1, 2), residuals ≈ 0.
    fn wls_recovers_exact_line() {
        let x = array![[1.0, 0.0], [1.0, 1.0], [1.0, 2.0], [1.0, 3.0]];
        let y = array![1.0, 3.0, 5.0, 7.0];
        let w = array![1.0, 2.0, 0.5, 3.0];

        let fit = weighted_least_squares(x.view(), y.view(), w.view()).expect("full rank");

        assert_abs_diff_eq!(fit.coef[0], 1.0, epsilon = 1e-10);
        assert_abs_diff_eq!(fit.coef[1], 2.0, epsilon = 1e-10);
        assert!(fit.residuals.iter().all(|r| r.abs() < 1e-10));
    }

    #[test]
    // Purpose
    // -------
    // Weights change the solution the way a weighted mean does.
    //
    // Given
    // -----
    // - Intercept-only design, y = (0, 10), w = (3, 1).
    //
    // Expect
    // ------
    // - β = 2.5.
    fn wls_intercept_is_weighted_mean() {
        let x = array![[1.0], [1.0]];
        let fit = weighted_least_squares(x.view(), array![0.0, 10.0].view(), array![3.0, 1.0].view())
            .expect("full rank");
        assert_abs_diff_eq!(fit.coef[0], 2.5, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Collinear columns are detected.
    //
    // Given
    // -----
    // - Second column = 2 × first.
    //
    // Expect
    // ------
    // - rank 1 and no WLS solution.
    fn collinear_design_is_rank_deficient() {
        let x = array![[1.0, 2.0], [2.0, 4.0], [3.0, 6.0]];
        assert_eq!(column_rank(x.view()), 1);
        assert!(
            weighted_least_squares(x.view(), array![1.0, 2.0, 3.0].view(), array![1.0, 1.0, 1.0].view())
                .is_none()
        );
    }
}
