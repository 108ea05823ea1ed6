//! loglik_optimizer::builders: L-BFGS construction.
//!
//! Purpose
//! -------
//! Build the two L-BFGS variants the crate uses and wire the configured
//! stopping tolerances into them. Initial parameters and the iteration cap
//! are runtime concerns handled by [`run_lbfgs`](super::run::run_lbfgs).
//!
//! Conventions
//! -----------
//! - Memory comes from `MLEOptions::lbfgs_mem`, falling back to
//!   [`DEFAULT_LBFGS_MEM`].
//! - A `None` tolerance leaves Argmin's default in place (for the cost
//!   change that default is machine epsilon).
//! - Argmin configuration errors are converted to `OptError`.
use argmin::solver::quasinewton::LBFGS;

use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        traits::MLEOptions,
        types::{
            Cost, DEFAULT_LBFGS_MEM, Grad, HagerZhangLS, LbfgsHagerZhang, LbfgsMoreThuente,
            MoreThuenteLS, Theta,
        },
    },
};

/// L-BFGS with Hager–Zhang line search and the configured tolerances.
///
/// Errors
/// ------
/// - `OptError` when Argmin rejects a tolerance.
pub fn build_optimizer_hager_zhang(opts: &MLEOptions) -> OptResult<LbfgsHagerZhang> {
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    configure_lbfgs(LbfgsHagerZhang::new(HagerZhangLS::new(), mem), opts)
}

/// L-BFGS with More–Thuente line search and the configured tolerances.
///
/// Errors
/// ------
/// - `OptError` when Argmin rejects a tolerance.
pub fn build_optimizer_more_thuente(opts: &MLEOptions) -> OptResult<LbfgsMoreThuente> {
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    configure_lbfgs(LbfgsMoreThuente::new(MoreThuenteLS::new(), mem), opts)
}

/// Apply `tol_grad` / `tol_cost` when present; generic over the line search.
pub fn configure_lbfgs<L>(
    mut solver: LBFGS<L, Theta, Grad, Cost>, opts: &MLEOptions,
) -> OptResult<LBFGS<L, Theta, Grad, Cost>> {
    if let Some(g) = opts.tols.tol_grad {
        solver = solver.with_tolerance_grad(g)?;
    }
    if let Some(c) = opts.tols.tol_cost {
        solver = solver.with_tolerance_cost(c)?;
    }
    Ok(solver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::loglik_optimizer::traits::{LineSearcher, Tolerances};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // Construction only. Full solves are exercised in `api` and by the
    // selection-model tests.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Both builders accept default and explicit memory with both tolerances.
    //
    // Given
    // -----
    // - `tol_grad = 1e-6`, `tol_cost = 1e-10`, memory `None` and `Some(11)`.
    //
    // Expect
    // ------
    // - Every combination builds.
    fn builders_accept_default_and_explicit_memory() {
        let tols = Tolerances::new(Some(1e-6), Some(1e-10), Some(50)).expect("tolerances");
        for mem in [None, Some(11)] {
            let hz = MLEOptions::new(tols, LineSearcher::HagerZhang, mem).expect("options");
            let mt = MLEOptions::new(tols, LineSearcher::MoreThuente, mem).expect("options");
            assert!(build_optimizer_hager_zhang(&hz).is_ok());
            assert!(build_optimizer_more_thuente(&mt).is_ok());
        }
    }

    #[test]
    // Purpose
    // -------
    // The default options (gradient tolerance only) build a solver.
    //
    // Given
    // -----
    // - `MLEOptions::default()`.
    //
    // Expect
    // ------
    // - `Ok(_)`.
    fn builders_accept_default_options() {
        assert!(build_optimizer_more_thuente(&MLEOptions::default()).is_ok());
    }
}
