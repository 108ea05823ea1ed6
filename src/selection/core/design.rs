//! Typed design-matrix builder and case filtering.
//!
//! Purpose
//! -------
//! Turn a table of named numeric columns plus a typed model specification
//! into the four design matrices and the validated observation set a
//! selection model is estimated on. There is no formula language: each
//! equation is a list of column names and an intercept flag.
//!
//! Key behaviors
//! -------------
//! - [`Table`] stores equal-length `f64` columns; NaN marks a missing value.
//! - [`EquationSpec`] / [`HeckmanSpec`] describe the four equations, the
//!   response, the selection indicator, and optional weights. Dispersion
//!   and correlation default to intercept-only.
//! - [`ModelFrame::build`] applies the case-filtering rules, records which
//!   table rows were kept, and constructs [`SelectionData`].
//!
//! Invariants & assumptions
//! ------------------------
//! - A row is dropped when its indicator, selection covariates, or
//!   correlation covariates are missing.
//! - A *selected* row is also dropped when its outcome value, outcome
//!   covariates, or dispersion covariates are missing. Unselected rows keep
//!   whatever those columns hold, NaN included.
//! - A present indicator that is neither 0 nor 1 is an error, not a drop.
//!   So is a missing weight on a row whose indicator is present.
//!
//! Conventions
//! -----------
//! - The intercept column is named `(Intercept)` and placed first.
//! - [`ModelFrame::rows`] holds original table row indices, ascending; they
//!   align cluster variables and other per-row side data with the frame.
use crate::selection::{
    core::data::{BlockDesigns, SelectionData},
    errors::{SelectionError, SelectionResult},
};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

/// Name of the generated constant column.
pub const INTERCEPT: &str = "(Intercept)";

/// Named `f64` columns of equal length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Array1<f64>>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column.
    ///
    /// Errors
    /// ------
    /// - `DuplicateColumn` when `name` already exists.
    /// - `ColumnLengthMismatch` when the length differs from existing columns.
    pub fn with_column(mut self, name: impl Into<String>, values: Array1<f64>) -> SelectionResult<Self> {
        let name = name.into();
        if self.names.contains(&name) {
            return Err(SelectionError::DuplicateColumn { name });
        }
        if let Some(first) = self.columns.first() {
            if first.len() != values.len() {
                return Err(SelectionError::ColumnLengthMismatch {
                    name,
                    expected: first.len(),
                    found: values.len(),
                });
            }
        }
        self.names.push(name);
        self.columns.push(values);
        Ok(self)
    }

    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        self.names.iter().position(|n| n == name).map(|i| self.columns[i].view())
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.len())
    }

    fn require(&self, name: &str) -> SelectionResult<ArrayView1<'_, f64>> {
        self.column(name).ok_or_else(|| SelectionError::UnknownColumn { name: name.to_string() })
    }
}

/// Covariates of one equation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquationSpec {
    pub covariates: Vec<String>,
    pub intercept: bool,
}

impl EquationSpec {
    /// Covariates with an intercept.
    pub fn new<I, S>(covariates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { covariates: covariates.into_iter().map(Into::into).collect(), intercept: true }
    }

    pub fn intercept_only() -> Self {
        Self { covariates: Vec::new(), intercept: true }
    }

    pub fn without_intercept(mut self) -> Self {
        self.intercept = false;
        self
    }

    /// Design column names, intercept first.
    pub fn column_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.covariates.len() + 1);
        if self.intercept {
            names.push(INTERCEPT.to_string());
        }
        names.extend(self.covariates.iter().cloned());
        names
    }
}

/// Full specification of a generalized Heckman model.
///
/// Fields
/// ------
/// - `selection_indicator`: 0/1 column; 1 means the outcome is observed.
/// - `outcome_response`: response column, read only on selected rows.
/// - `weights`: optional non-negative weight column; `None` means unit
///   weights.
/// - `selection`, `outcome`, `dispersion`, `correlation`: equation specs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeckmanSpec {
    pub selection_indicator: String,
    pub outcome_response: String,
    pub weights: Option<String>,
    pub selection: EquationSpec,
    pub outcome: EquationSpec,
    pub dispersion: EquationSpec,
    pub correlation: EquationSpec,
}

impl HeckmanSpec {
    /// Classic Heckman specification: constant dispersion and correlation.
    pub fn new(
        selection_indicator: impl Into<String>, outcome_response: impl Into<String>,
        selection: EquationSpec, outcome: EquationSpec,
    ) -> Self {
        Self {
            selection_indicator: selection_indicator.into(),
            outcome_response: outcome_response.into(),
            weights: None,
            selection,
            outcome,
            dispersion: EquationSpec::intercept_only(),
            correlation: EquationSpec::intercept_only(),
        }
    }

    pub fn with_weights(mut self, column: impl Into<String>) -> Self {
        self.weights = Some(column.into());
        self
    }

    pub fn with_dispersion(mut self, dispersion: EquationSpec) -> Self {
        self.dispersion = dispersion;
        self
    }

    pub fn with_correlation(mut self, correlation: EquationSpec) -> Self {
        self.correlation = correlation;
        self
    }
}

/// Design matrix with column names.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignMatrix {
    names: Vec<String>,
    values: Array2<f64>,
}

impl DesignMatrix {
    /// Errors
    /// ------
    /// - `NameCountMismatch` when `names.len() != values.ncols()`.
    pub fn new(names: Vec<String>, values: Array2<f64>) -> SelectionResult<Self> {
        if names.len() != values.ncols() {
            return Err(SelectionError::NameCountMismatch {
                names: names.len(),
                cols: values.ncols(),
            });
        }
        Ok(Self { names, values })
    }

    /// Columns named `x1`, `x2`, ….
    pub fn unnamed(values: Array2<f64>) -> Self {
        let names = (1..=values.ncols()).map(|j| format!("x{j}")).collect();
        Self { names, values }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }
}

/// Estimation frame: kept table rows, validated data, and the call record.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelFrame {
    rows: Vec<usize>,
    data: SelectionData,
    spec: HeckmanSpec,
}

struct EquationColumns<'t> {
    names: Vec<String>,
    intercept: bool,
    columns: Vec<ArrayView1<'t, f64>>,
}

impl<'t> EquationColumns<'t> {
    fn resolve(table: &'t Table, eq: &EquationSpec) -> SelectionResult<Self> {
        let columns =
            eq.covariates.iter().map(|c| table.require(c)).collect::<SelectionResult<Vec<_>>>()?;
        Ok(Self { names: eq.column_names(), intercept: eq.intercept, columns })
    }

    fn missing_at(&self, row: usize) -> bool {
        self.columns.iter().any(|c| c[row].is_nan())
    }

    fn design(self, rows: &[usize]) -> SelectionResult<DesignMatrix> {
        let offset = usize::from(self.intercept);
        let width = offset + self.columns.len();
        let values = Array2::from_shape_fn((rows.len(), width), |(i, j)| {
            if j < offset { 1.0 } else { self.columns[j - offset][rows[i]] }
        });
        DesignMatrix::new(self.names, values)
    }
}

impl ModelFrame {
    /// Resolve columns, filter incomplete cases, and build [`SelectionData`].
    ///
    /// Errors
    /// ------
    /// - `UnknownColumn` for any name not in `table`.
    /// - `NonBinaryIndicator { row }` (original table row) for a present
    ///   indicator other than 0/1.
    /// - `InvalidWeight { row }` (original table row) for a NaN weight where
    ///   the indicator is present.
    /// - `NoCompleteRows` when filtering removes every row.
    /// - Any [`SelectionData::new`] validation error on the kept rows.
    pub fn build(table: &Table, spec: &HeckmanSpec) -> SelectionResult<Self> {
        let indicator = table.require(&spec.selection_indicator)?;
        let response = table.require(&spec.outcome_response)?;
        let weights = spec.weights.as_deref().map(|w| table.require(w)).transpose()?;
        let sel = EquationColumns::resolve(table, &spec.selection)?;
        let out = EquationColumns::resolve(table, &spec.outcome)?;
        let disp = EquationColumns::resolve(table, &spec.dispersion)?;
        let corr = EquationColumns::resolve(table, &spec.correlation)?;

        let mut rows = Vec::with_capacity(table.n_rows());
        for r in 0..table.n_rows() {
            let s = indicator[r];
            if s.is_nan() {
                continue;
            }
            if s != 0.0 && s != 1.0 {
                return Err(SelectionError::NonBinaryIndicator { row: r, value: s });
            }
            if let Some(w) = weights.filter(|w| w[r].is_nan()) {
                return Err(SelectionError::InvalidWeight { row: r, value: w[r] });
            }
            if sel.missing_at(r) || corr.missing_at(r) {
                continue;
            }
            if s == 1.0 && (response[r].is_nan() || out.missing_at(r) || disp.missing_at(r)) {
                continue;
            }
            rows.push(r);
        }
        if rows.is_empty() {
            return Err(SelectionError::NoCompleteRows);
        }
        let dropped = table.n_rows() - rows.len();
        if dropped > 0 {
            log::info!("model frame: dropped {dropped} incomplete rows, kept {}", rows.len());
        }

        let pick = |col: ArrayView1<'_, f64>| -> Array1<f64> { rows.iter().map(|&r| col[r]).collect() };
        let designs = BlockDesigns {
            selection: sel.design(&rows)?,
            outcome: out.design(&rows)?,
            dispersion: disp.design(&rows)?,
            correlation: corr.design(&rows)?,
        };
        let data = SelectionData::new(pick(indicator), pick(response), weights.map(pick), designs)?;
        Ok(Self { rows, data, spec: spec.clone() })
    }

    /// Original table rows kept, ascending.
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    pub fn data(&self) -> &SelectionData {
        &self.data
    }

    pub fn spec(&self) -> &HeckmanSpec {
        &self.spec
    }

    pub fn into_data(self) -> SelectionData {
        self.data
    }
}
