//! Estimation options for generalized Heckman fits.
use crate::optimization::loglik_optimizer::MLEOptions;

/// Optimizer settings plus the fixed-parameter mask.
///
/// Fields
/// ------
/// - `mle`: tolerances, line search, L-BFGS memory, verbosity.
/// - `fixed`: full-vector indices held at their start values. Fixed
///   parameters get zero variance and do not count toward `k` in
///   small-sample corrections.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HeckmanOptions {
    pub mle: MLEOptions,
    pub fixed: Vec<usize>,
}

impl HeckmanOptions {
    pub fn new(mle: MLEOptions) -> Self {
        Self { mle, fixed: Vec::new() }
    }

    /// Hold the listed full-vector indices fixed.
    pub fn with_fixed<I: IntoIterator<Item = usize>>(mut self, fixed: I) -> Self {
        self.fixed = fixed.into_iter().collect();
        self
    }
}
