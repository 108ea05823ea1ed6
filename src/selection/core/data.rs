//! Validated observation set for sample-selection models.
//!
//! Purpose
//! -------
//! Hold one estimation sample: selection indicator, outcome, weights, and
//! the four design matrices, checked once at construction so the kernel,
//! the starting-value estimator, and the fitter can rely on clean inputs.
//!
//! Key behaviors
//! -------------
//! - [`SelectionData::new`] enforces row alignment, a binary indicator,
//!   finite non-negative weights with positive total, finite covariates on
//!   the rows that use them, and full column rank of every block.
//! - Absent weights mean unit weights.
//! - [`SelectionData::layout`] derives the [`ParamLayout`] from the design
//!   widths.
//!
//! Invariants & assumptions
//! ------------------------
//! - Selection and correlation covariates are finite on every row.
//! - Outcome value, outcome covariates, and dispersion covariates are finite
//!   on every selected row; on unselected rows they are never read and may
//!   hold NaN.
//! - At least one row is selected and at least one is not.
//! - The selection design has full column rank over all rows; the outcome,
//!   dispersion, and correlation designs over the selected rows, the only
//!   rows whose predictors they feed.
//!
//! Conventions
//! -----------
//! - Row indices in errors refer to this sample, not to an upstream table.
use crate::selection::{
    core::{
        design::DesignMatrix,
        layout::{Block, ParamLayout},
        linalg::column_rank,
    },
    errors::{SelectionError, SelectionResult},
};
use ndarray::{Array1, Array2, ArrayView1, Axis};

/// The four design matrices of a generalized Heckman model.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockDesigns {
    pub selection: DesignMatrix,
    pub outcome: DesignMatrix,
    pub dispersion: DesignMatrix,
    pub correlation: DesignMatrix,
}

impl BlockDesigns {
    pub fn get(&self, block: Block) -> &DesignMatrix {
        match block {
            Block::Selection => &self.selection,
            Block::Outcome => &self.outcome,
            Block::Dispersion => &self.dispersion,
            Block::Correlation => &self.correlation,
        }
    }
}

/// Validated estimation sample.
///
/// Fields
/// ------
/// - `selected`: indicator per row as booleans.
/// - `outcome`: response; meaningful only on selected rows.
/// - `weights`: non-negative finite weights.
/// - `designs`: selection, outcome, dispersion, correlation matrices.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionData {
    selected: Vec<bool>,
    outcome: Array1<f64>,
    weights: Array1<f64>,
    designs: BlockDesigns,
    weight_sum: f64,
    selected_rows: Vec<usize>,
}

impl SelectionData {
    /// Validate and assemble an estimation sample.
    ///
    /// Parameters
    /// ----------
    /// - `indicator`: 0/1 per row.
    /// - `outcome`: response per row (NaN allowed where the indicator is 0).
    /// - `weights`: optional weights; `None` means 1 for every row.
    /// - `designs`: the four design matrices, one row per observation.
    ///
    /// Errors
    /// ------
    /// - `RowCountMismatch`, `NonBinaryIndicator`, `InvalidWeight`,
    ///   `ZeroTotalWeight`, `EmptyBlock`, `NonFiniteCovariate`,
    ///   `NonFiniteOutcome`, `NoSelectedRows`, `NoUnselectedRows`,
    ///   `RankDeficient`.
    pub fn new(
        indicator: Array1<f64>, outcome: Array1<f64>, weights: Option<Array1<f64>>,
        designs: BlockDesigns,
    ) -> SelectionResult<Self> {
        let n = indicator.len();
        check_rows("outcome", n, outcome.len())?;
        let weights = weights.unwrap_or_else(|| Array1::ones(n));
        check_rows("weights", n, weights.len())?;
        for block in Block::ALL {
            let design = designs.get(block);
            check_rows(block.name(), n, design.nrows())?;
            if design.ncols() == 0 {
                return Err(SelectionError::EmptyBlock { block });
            }
        }

        let mut selected = Vec::with_capacity(n);
        for (row, &s) in indicator.iter().enumerate() {
            match s {
                v if v == 1.0 => selected.push(true),
                v if v == 0.0 => selected.push(false),
                value => return Err(SelectionError::NonBinaryIndicator { row, value }),
            }
        }
        if let Some((row, &value)) =
            weights.iter().enumerate().find(|(_, w)| !w.is_finite() || **w < 0.0)
        {
            return Err(SelectionError::InvalidWeight { row, value });
        }
        let weight_sum = weights.sum();
        if weight_sum <= 0.0 {
            return Err(SelectionError::ZeroTotalWeight);
        }

        let selected_rows: Vec<usize> = (0..n).filter(|&i| selected[i]).collect();
        if selected_rows.is_empty() {
            return Err(SelectionError::NoSelectedRows);
        }
        if selected_rows.len() == n {
            return Err(SelectionError::NoUnselectedRows);
        }

        check_finite_rows(&designs.selection, Block::Selection, 0..n)?;
        check_finite_rows(&designs.correlation, Block::Correlation, 0..n)?;
        check_finite_rows(&designs.outcome, Block::Outcome, selected_rows.iter().copied())?;
        check_finite_rows(&designs.dispersion, Block::Dispersion, selected_rows.iter().copied())?;
        if let Some(&row) = selected_rows.iter().find(|&&i| !outcome[i].is_finite()) {
            return Err(SelectionError::NonFiniteOutcome { row, value: outcome[row] });
        }

        check_rank(designs.selection.values().to_owned(), Block::Selection)?;
        for block in [Block::Outcome, Block::Dispersion, Block::Correlation] {
            let sub = designs.get(block).values().select(Axis(0), &selected_rows);
            check_rank(sub, block)?;
        }

        Ok(Self { selected, outcome, weights, designs, weight_sum, selected_rows })
    }

    pub fn n_obs(&self) -> usize {
        self.selected.len()
    }

    pub fn n_selected(&self) -> usize {
        self.selected_rows.len()
    }

    pub fn is_selected(&self, row: usize) -> bool {
        self.selected[row]
    }

    /// Indices of selected rows, ascending.
    pub fn selected_rows(&self) -> &[usize] {
        &self.selected_rows
    }

    pub fn outcome(&self) -> ArrayView1<'_, f64> {
        self.outcome.view()
    }

    pub fn weights(&self) -> ArrayView1<'_, f64> {
        self.weights.view()
    }

    /// `Σ w_i`; the summed log-likelihood is this times the average.
    pub fn weight_sum(&self) -> f64 {
        self.weight_sum
    }

    pub fn designs(&self) -> &BlockDesigns {
        &self.designs
    }

    pub fn design(&self, block: Block) -> &DesignMatrix {
        self.designs.get(block)
    }

    pub fn layout(&self) -> ParamLayout {
        ParamLayout::new(
            self.designs.selection.ncols(),
            self.designs.outcome.ncols(),
            self.designs.dispersion.ncols(),
            self.designs.correlation.ncols(),
        )
    }

    /// `(block, column name)` for every entry of the full parameter vector.
    pub fn param_names(&self) -> Vec<(Block, String)> {
        Block::ALL
            .into_iter()
            .flat_map(|b| self.designs.get(b).names().iter().map(move |n| (b, n.clone())))
            .collect()
    }
}

fn check_rows(what: &'static str, expected: usize, found: usize) -> SelectionResult<()> {
    if expected != found {
        return Err(SelectionError::RowCountMismatch { what, expected, found });
    }
    Ok(())
}

fn check_finite_rows<I>(design: &DesignMatrix, block: Block, rows: I) -> SelectionResult<()>
where
    I: IntoIterator<Item = usize>,
{
    let x = design.values();
    for row in rows {
        if let Some((col, &value)) = x.row(row).iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(SelectionError::NonFiniteCovariate { block, row, col, value });
        }
    }
    Ok(())
}

fn check_rank(x: Array2<f64>, block: Block) -> SelectionResult<()> {
    let cols = x.ncols();
    let rank = column_rank(x.view());
    if rank < cols {
        return Err(SelectionError::RankDeficient { block, rank, cols });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn designs(n: usize, outcome: Array2<f64>) -> BlockDesigns {
        let ones = Array2::ones((n, 1));
        let x = Array2::from_shape_fn((n, 2), |(i, j)| if j == 0 { 1.0 } else { i as f64 });
        BlockDesigns {
            selection: DesignMatrix::unnamed(x),
            outcome: DesignMatrix::unnamed(outcome),
            dispersion: DesignMatrix::unnamed(ones.clone()),
            correlation: DesignMatrix::unnamed(ones),
        }
    }

    fn outcome_design(nan_row: Option<usize>) -> Array2<f64> {
        let mut x = array![[1.0, 0.5], [1.0, -0.5], [1.0, 2.0], [1.0, 1.0], [1.0, 0.0]];
        if let Some(r) = nan_row {
            x[[r, 1]] = f64::NAN;
        }
        x
    }

    #[test]
    // Purpose
    // -------
    // NaN outcome pieces on unselected rows are accepted and never inspected.
    //
    // Given
    // -----
    // - Rows 1 and 3 unselected with NaN outcome and NaN outcome covariate.
    //
    // Expect
    // ------
    // - Construction succeeds; unit weights; layout (2, 2, 1, 1).
    fn accepts_missing_outcome_on_unselected_rows() {
        let y = array![1.0, f64::NAN, 0.5, f64::NAN, -1.0];
        let data = SelectionData::new(
            array![1.0, 0.0, 1.0, 0.0, 1.0],
            y,
            None,
            designs(5, outcome_design(Some(3))),
        )
        .expect("valid data");

        assert_eq!(data.n_selected(), 3);
        assert_eq!(data.weight_sum(), 5.0);
        assert_eq!(data.layout(), ParamLayout::new(2, 2, 1, 1));
        assert_eq!(data.selected_rows(), &[0, 2, 4]);
        assert_eq!(data.param_names()[2], (Block::Outcome, "x1".to_string()));
    }

    #[test]
    // Purpose
    // -------
    // Each input-validation rule fires with its own error.
    //
    // Given
    // -----
    // - Variations of a valid five-row sample.
    //
    // Expect
    // ------
    // - The matching `SelectionError` variant per case.
    fn rejects_invalid_inputs() {
        let ind = array![1.0, 0.0, 1.0, 0.0, 1.0];
        let y = array![1.0, 0.0, 0.5, 0.0, -1.0];
        let d = || designs(5, outcome_design(None));

        assert!(matches!(
            SelectionData::new(array![1.0, 0.0, 0.5, 0.0, 1.0], y.clone(), None, d()),
            Err(SelectionError::NonBinaryIndicator { row: 2, .. })
        ));
        assert!(matches!(
            SelectionData::new(ind.clone(), y.clone(), Some(array![1.0, -1.0, 1.0, 1.0, 1.0]), d()),
            Err(SelectionError::InvalidWeight { row: 1, .. })
        ));
        assert!(matches!(
            SelectionData::new(ind.clone(), y.clone(), Some(Array1::zeros(5)), d()),
            Err(SelectionError::ZeroTotalWeight)
        ));
        assert!(matches!(
            SelectionData::new(ind.clone(), array![1.0, 0.0], None, d()),
            Err(SelectionError::RowCountMismatch { what: "outcome", .. })
        ));
        assert!(matches!(
            SelectionData::new(ind.clone(), y.clone(), None, designs(5, outcome_design(Some(2)))),
            Err(SelectionError::NonFiniteCovariate { block: Block::Outcome, row: 2, .. })
        ));
        assert!(matches!(
            SelectionData::new(Array1::ones(5), y.clone(), None, d()),
            Err(SelectionError::NoUnselectedRows)
        ));
        assert!(matches!(
            SelectionData::new(Array1::zeros(5), y, None, d()),
            Err(SelectionError::NoSelectedRows)
        ));
    }

    #[test]
    // Purpose
    // -------
    // Rank is judged on the rows a block is used on.
    //
    // Given
    // -----
    // - Outcome covariate constant (=2) on the selected rows only.
    //
    // Expect
    // ------
    // - `RankDeficient { block: Outcome, rank: 1, cols: 2 }`.
    fn outcome_rank_uses_selected_rows() {
        let x = array![[1.0, 2.0], [1.0, 7.0], [1.0, 2.0], [1.0, -3.0], [1.0, 2.0]];
        let err = SelectionData::new(
            array![1.0, 0.0, 1.0, 0.0, 1.0],
            array![1.0, 0.0, 0.5, 0.0, -1.0],
            None,
            designs(5, x),
        )
        .expect_err("rank deficient");
        assert_eq!(err, SelectionError::RankDeficient { block: Block::Outcome, rank: 1, cols: 2 });
    }

    #[test]
    // Purpose
    // -------
    // The correlation design is rank-checked on the selected rows, where its
    // predictor is read, not over the whole sample.
    //
    // Given
    // -----
    // - Correlation covariate constant (=2) on the selected rows and varying
    //   on the unselected rows, so it has full rank over all rows.
    //
    // Expect
    // ------
    // - `RankDeficient { block: Correlation, rank: 1, cols: 2 }`.
    fn correlation_rank_uses_selected_rows() {
        let mut d = designs(5, outcome_design(None));
        let corr = array![[1.0, 2.0], [1.0, 7.0], [1.0, 2.0], [1.0, -3.0], [1.0, 2.0]];
        d.correlation = DesignMatrix::unnamed(corr);
        let err = SelectionData::new(
            array![1.0, 0.0, 1.0, 0.0, 1.0],
            array![1.0, 0.0, 0.5, 0.0, -1.0],
            None,
            d,
        )
        .expect_err("rank deficient");
        assert_eq!(
            err,
            SelectionError::RankDeficient { block: Block::Correlation, rank: 1, cols: 2 }
        );
    }
}
