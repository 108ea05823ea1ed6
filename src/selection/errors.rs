//! Errors for sample-selection models (input validation, starting values,
//! optimization, covariance, and clustering failures).
//!
//! ## Conventions
//! - **Row indices are 0-based** and refer to the container that raised the
//!   error: `Table`/`ModelFrame` errors use original table rows,
//!   `SelectionData` errors use estimation-sample rows.
//! - Optimizer failures that leave no usable estimate are
//!   [`SelectionError::OptimizationFailed`]; a usable estimate whose
//!   covariance cannot be formed is [`SelectionError::Covariance`] and keeps
//!   the point estimate and log-likelihood.
use crate::{
    inference::errors::InferenceError, optimization::errors::OptError,
    selection::core::layout::Block,
};
use ndarray::Array1;

/// Result alias for selection-model operations.
pub type SelectionResult<T> = Result<T, SelectionError>;

#[derive(Debug, Clone, PartialEq)]
pub enum SelectionError {
    // ---- Table / design ----
    /// A column name is not present in the table.
    UnknownColumn { name: String },

    /// A column was added twice.
    DuplicateColumn { name: String },

    /// A column's length disagrees with the table.
    ColumnLengthMismatch { name: String, expected: usize, found: usize },

    /// Column names and matrix width disagree.
    NameCountMismatch { names: usize, cols: usize },

    /// No row survived case filtering.
    NoCompleteRows,

    // ---- Observation set ----
    /// An input array does not have one entry per row.
    RowCountMismatch { what: &'static str, expected: usize, found: usize },

    /// Selection indicator is not 0 or 1.
    NonBinaryIndicator { row: usize, value: f64 },

    /// Weight is negative or non-finite.
    InvalidWeight { row: usize, value: f64 },

    /// Every weight is zero.
    ZeroTotalWeight,

    /// A covariate required on this row is NaN/±inf.
    NonFiniteCovariate { block: Block, row: usize, col: usize, value: f64 },

    /// Outcome value is NaN/±inf on a selected row.
    NonFiniteOutcome { row: usize, value: f64 },

    /// A design block has no columns.
    EmptyBlock { block: Block },

    /// A design block does not have full column rank on the rows it is used on.
    RankDeficient { block: Block, rank: usize, cols: usize },

    /// No row has the outcome observed.
    NoSelectedRows,

    /// Every row has the outcome observed.
    NoUnselectedRows,

    // ---- Parameters ----
    /// Parameter vector does not match the layout.
    ParamLengthMismatch { expected: usize, actual: usize },

    /// Parameter entry is NaN/±inf.
    NonFiniteParameter { index: usize, value: f64 },

    /// Supplied start vector does not match the layout.
    StartLengthMismatch { expected: usize, found: usize },

    /// Fixed-parameter index outside the layout.
    InvalidFixedIndex { index: usize, len: usize },

    /// Every parameter is fixed; nothing to optimize.
    NoFreeParameters,

    /// A log-likelihood contribution left the finite range.
    NonFiniteContribution { row: usize, value: f64 },

    /// Covariate profile length does not match the block width.
    ProfileLengthMismatch { block: Block, expected: usize, found: usize },

    // ---- Starting values ----
    /// Two-step estimator failed at the named stage.
    StartingValues { stage: &'static str, reason: String },

    // ---- Optimization ----
    /// Log-likelihood at the start vector is not finite.
    NonFiniteStart { value: f64 },

    /// Solver failed or stopped without converging.
    OptimizationFailed { status: String, iterations: usize },

    /// Optimizer configuration error.
    Optimizer(OptError),

    // ---- Covariance ----
    /// Point estimate found but the covariance could not be formed.
    Covariance { source: InferenceError, theta_hat: Array1<f64>, loglik: f64 },

    // ---- Robust / clustered ----
    /// Robust or cluster-robust covariance failed.
    Inference(InferenceError),
}

impl std::error::Error for SelectionError {}

impl std::fmt::Display for SelectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Table / design ----
            SelectionError::UnknownColumn { name } => {
                write!(f, "Column '{name}' not found in table")
            }
            SelectionError::DuplicateColumn { name } => {
                write!(f, "Column '{name}' already present in table")
            }
            SelectionError::ColumnLengthMismatch { name, expected, found } => {
                write!(f, "Column '{name}' has {found} rows, table has {expected}")
            }
            SelectionError::NameCountMismatch { names, cols } => {
                write!(f, "Design has {cols} columns but {names} names")
            }
            SelectionError::NoCompleteRows => {
                write!(f, "No complete rows remain after case filtering")
            }

            // ---- Observation set ----
            SelectionError::RowCountMismatch { what, expected, found } => {
                write!(f, "{what} has {found} rows, expected {expected}")
            }
            SelectionError::NonBinaryIndicator { row, value } => {
                write!(f, "Selection indicator at row {row} is {value}, must be 0 or 1")
            }
            SelectionError::InvalidWeight { row, value } => {
                write!(f, "Weight at row {row} is {value}, must be finite and non-negative")
            }
            SelectionError::ZeroTotalWeight => write!(f, "All weights are zero"),
            SelectionError::NonFiniteCovariate { block, row, col, value } => {
                write!(f, "{block} covariate {col} at row {row} is {value}, must be finite")
            }
            SelectionError::NonFiniteOutcome { row, value } => {
                write!(f, "Outcome at selected row {row} is {value}, must be finite")
            }
            SelectionError::EmptyBlock { block } => {
                write!(f, "{block} design has no columns")
            }
            SelectionError::RankDeficient { block, rank, cols } => {
                write!(f, "{block} design is rank deficient (rank {rank} < {cols} columns)")
            }
            SelectionError::NoSelectedRows => write!(f, "No selected observations"),
            SelectionError::NoUnselectedRows => write!(f, "No unselected observations"),

            // ---- Parameters ----
            SelectionError::ParamLengthMismatch { expected, actual } => {
                write!(f, "Parameter vector has length {actual}, expected {expected}")
            }
            SelectionError::NonFiniteParameter { index, value } => {
                write!(f, "Parameter {index} is {value}, must be finite")
            }
            SelectionError::StartLengthMismatch { expected, found } => {
                write!(f, "Start vector has length {found}, expected {expected}")
            }
            SelectionError::InvalidFixedIndex { index, len } => {
                write!(f, "Fixed parameter index {index} out of range for {len} parameters")
            }
            SelectionError::NoFreeParameters => write!(f, "All parameters are fixed"),
            SelectionError::NonFiniteContribution { row, value } => {
                write!(f, "Log-likelihood contribution at row {row} is {value}")
            }
            SelectionError::ProfileLengthMismatch { block, expected, found } => {
                write!(f, "{block} covariate profile has length {found}, expected {expected}")
            }

            // ---- Starting values ----
            SelectionError::StartingValues { stage, reason } => {
                write!(f, "Starting values failed at {stage}: {reason}")
            }

            // ---- Optimization ----
            SelectionError::NonFiniteStart { value } => {
                write!(f, "Log-likelihood at the start vector is {value}")
            }
            SelectionError::OptimizationFailed { status, iterations } => {
                write!(f, "Optimization failed after {iterations} iterations: {status}")
            }
            SelectionError::Optimizer(err) => write!(f, "Optimizer error: {err}"),

            // ---- Covariance ----
            SelectionError::Covariance { source, loglik, .. } => {
                write!(f, "Covariance failed at log-likelihood {loglik}: {source}")
            }

            // ---- Robust / clustered ----
            SelectionError::Inference(err) => write!(f, "{err}"),
        }
    }
}

impl From<OptError> for SelectionError {
    fn from(err: OptError) -> Self {
        SelectionError::Optimizer(err)
    }
}

impl From<InferenceError> for SelectionError {
    fn from(err: InferenceError) -> Self {
        SelectionError::Inference(err)
    }
}
