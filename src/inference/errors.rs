//! Errors for post-estimation inference (information inversion, sandwich and
//! cluster-robust covariances).
//!
//! An alias `InferenceResult<T>` standardizes the return type across the
//! inference layer. Failures here never invalidate a fitted point estimate;
//! the model layer decides whether to surface them or degrade gracefully.
use crate::optimization::errors::OptError;

#[derive(Debug, Clone, PartialEq)]
pub enum InferenceError {
    // ---- Observed information ----
    /// Finite-difference Hessian of the analytic gradient failed.
    Hessian(OptError),

    /// Information matrix has a NaN/±inf cell.
    NonFiniteInformation { row: usize, col: usize, value: f64 },

    /// Cholesky failed; the smallest eigenvalue is reported.
    NotPositiveDefinite { min_eigenvalue: f64 },

    // ---- Sandwich ----
    /// Score matrix and bread disagree in shape.
    ScoreShapeMismatch { scores: (usize, usize), bread: (usize, usize) },

    /// `n ≤ k`: the small-sample factor `n − k` is not positive.
    DegreesOfFreedomExhausted { n_obs: usize, n_params: usize },

    // ---- Clustering ----
    /// Cluster keys are not aligned with the estimation rows.
    ClusterLengthMismatch { expected: usize, found: usize },

    /// A cluster assignment must name at least one variable.
    EmptyClusterNames,

    /// The `G/(G − 1)` factor needs at least two clusters.
    TooFewClusters { found: usize },

    /// A clustering column is absent from the source table.
    UnknownClusterColumn { name: String },

    /// A clustering column is missing (NaN) on an estimation row.
    MissingClusterValue { column: String, row: usize },
}

pub type InferenceResult<T> = Result<T, InferenceError>;

impl std::error::Error for InferenceError {}

impl std::fmt::Display for InferenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Observed information ----
            InferenceError::Hessian(err) => {
                write!(f, "Inference Error: observed information failed: {err}")
            }
            InferenceError::NonFiniteInformation { row, col, value } => {
                write!(f, "Inference Error: information matrix entry ({row}, {col}) is {value}")
            }
            InferenceError::NotPositiveDefinite { min_eigenvalue } => write!(
                f,
                "Inference Error: information matrix is not positive definite \
                 (minimum eigenvalue {min_eigenvalue:e})"
            ),

            // ---- Sandwich ----
            InferenceError::ScoreShapeMismatch { scores, bread } => write!(
                f,
                "Inference Error: score matrix {scores:?} does not match covariance {bread:?}"
            ),
            InferenceError::DegreesOfFreedomExhausted { n_obs, n_params } => write!(
                f,
                "Inference Error: {n_obs} observations leave no degrees of freedom for \
                 {n_params} free parameters"
            ),

            // ---- Clustering ----
            InferenceError::ClusterLengthMismatch { expected, found } => write!(
                f,
                "Inference Error: cluster assignment has {found} rows, estimation sample has \
                 {expected}"
            ),
            InferenceError::EmptyClusterNames => {
                write!(f, "Inference Error: cluster assignment names no variables")
            }
            InferenceError::TooFewClusters { found } => {
                write!(f, "Inference Error: need at least 2 clusters, found {found}")
            }
            InferenceError::UnknownClusterColumn { name } => {
                write!(f, "Inference Error: cluster column '{name}' not found")
            }
            InferenceError::MissingClusterValue { column, row } => {
                write!(f, "Inference Error: cluster column '{column}' is missing at row {row}")
            }
        }
    }
}

impl From<OptError> for InferenceError {
    fn from(err: OptError) -> Self {
        InferenceError::Hessian(err)
    }
}
