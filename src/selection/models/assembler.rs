//! One-call estimation from a table and a typed specification.
//!
//! [`estimate`] runs the whole pipeline: build the model frame, compute
//! two-step starting values unless a start is supplied, fit by maximum
//! likelihood, record the specification on the fit, and optionally switch
//! to cluster-robust standard errors.
use crate::{
    inference::cluster::ClusterAssignment,
    selection::{
        core::{
            design::{HeckmanSpec, ModelFrame, Table},
            options::HeckmanOptions,
            two_step::two_step_start,
        },
        errors::SelectionResult,
        models::{fitted::FittedHeckman, heckman::GenHeckman},
    },
};
use ndarray::Array1;

/// Everything [`estimate`] needs.
///
/// Fields
/// ------
/// - `table`, `spec`: data and model specification.
/// - `start`: full start vector; `None` runs the two-step estimator.
/// - `options`: optimizer settings and fixed mask.
/// - `cluster`: clustering column names; empty means model-based errors.
/// - `allow_degraded_se`: on a clustering failure, return the model-based
///   fit (with a warning) instead of the error.
#[derive(Debug, Clone)]
pub struct HeckmanRequest<'t> {
    pub table: &'t Table,
    pub spec: HeckmanSpec,
    pub start: Option<Array1<f64>>,
    pub options: HeckmanOptions,
    pub cluster: Vec<String>,
    pub allow_degraded_se: bool,
}

impl<'t> HeckmanRequest<'t> {
    pub fn new(table: &'t Table, spec: HeckmanSpec) -> Self {
        Self {
            table,
            spec,
            start: None,
            options: HeckmanOptions::default(),
            cluster: Vec::new(),
            allow_degraded_se: false,
        }
    }

    pub fn with_start(mut self, start: Array1<f64>) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_options(mut self, options: HeckmanOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_cluster<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cluster = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn allow_degraded_se(mut self, allow: bool) -> Self {
        self.allow_degraded_se = allow;
        self
    }
}

/// Build, start, fit, and optionally cluster.
///
/// Errors
/// ------
/// - Design and input errors from [`ModelFrame::build`].
/// - `StartingValues` from the two-step estimator.
/// - Fitter errors from [`GenHeckman::fit`].
/// - Clustering errors, unless `allow_degraded_se` is set.
pub fn estimate(request: &HeckmanRequest<'_>) -> SelectionResult<FittedHeckman> {
    let frame = ModelFrame::build(request.table, &request.spec)?;
    let data = frame.data();

    let start = match &request.start {
        Some(start) => start.clone(),
        None => {
            let start = two_step_start(data, &request.options.mle)?;
            log::info!("two-step starting values computed for {} parameters", start.len());
            start
        }
    };
    let model = GenHeckman::new(data, start, request.options.clone())?;
    let fit = model.fit(data)?.with_spec(request.spec.clone());

    if request.cluster.is_empty() {
        return Ok(fit);
    }
    let clustered = ClusterAssignment::from_table(request.table, &request.cluster, frame.rows())
        .map_err(Into::into)
        .and_then(|clusters| fit.with_clustered_errors(data, &clusters));
    match clustered {
        Ok(clustered) => Ok(clustered),
        Err(err) if request.allow_degraded_se => {
            log::warn!("cluster-robust covariance failed, keeping model-based errors: {err}");
            Ok(fit)
        }
        Err(err) => Err(err),
    }
}
