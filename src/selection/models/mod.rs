//! models: generalized Heckman fitter, fitted results, and the one-call
//! estimation pipeline.

pub mod assembler;
pub mod fitted;
pub mod heckman;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::assembler::{HeckmanRequest, estimate};
pub use self::fitted::{CoefRow, FittedHeckman, NuisanceEstimate, StdErrorKind};
pub use self::heckman::GenHeckman;

pub mod prelude {
    pub use super::{FittedHeckman, GenHeckman, HeckmanRequest, StdErrorKind, estimate};
}
