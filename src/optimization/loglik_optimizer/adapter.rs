//! Bridge from a [`LogLikelihood`] to Argmin's `CostFunction` / `Gradient`.
//!
//! Argmin minimizes, so the adapter reports `c(θ) = -ℓ(θ)` and `-∇ℓ(θ)`.
//! Models without an analytic gradient get a finite-difference gradient of
//! the cost itself (no sign flip in that branch): central differences first,
//! forward differences when a central evaluation errored or produced a
//! non-finite component.
use std::cell::RefCell;

use crate::optimization::{
    errors::OptError,
    loglik_optimizer::{
        traits::LogLikelihood,
        types::{Cost, Grad, Theta},
        validation::validate_grad,
    },
};
use argmin::core::{CostFunction, Error, Gradient};
use finitediff::FiniteDiff;

/// Borrowing wrapper handed to the Argmin executor.
#[derive(Debug, Clone)]
pub struct ArgMinAdapter<'a, F: LogLikelihood> {
    pub f: &'a F,
    pub data: &'a F::Data,
}

impl<'a, F: LogLikelihood> ArgMinAdapter<'a, F> {
    pub fn new(f: &'a F, data: &'a F::Data) -> Self {
        Self { f, data }
    }

    /// Finite-difference gradient of the cost with error capture.
    ///
    /// The closure given to `finitediff` must return `f64`, so the first
    /// model error is parked in a `RefCell` and the closure yields `NaN`.
    /// A parked error or an invalid central gradient triggers one forward
    /// pass; an error during that pass is returned as-is.
    fn fd_cost_gradient(&self, theta: &Theta) -> Result<Grad, Error> {
        let parked: RefCell<Option<Error>> = RefCell::new(None);
        let cost_fn = |t: &Theta| -> f64 {
            match self.cost(t) {
                Ok(c) => c,
                Err(e) => {
                    let mut slot = parked.borrow_mut();
                    if slot.is_none() {
                        *slot = Some(e);
                    }
                    f64::NAN
                }
            }
        };

        let central = theta.central_diff(&cost_fn);
        if parked.borrow().is_none() && validate_grad(&central, theta.len()).is_ok() {
            return Ok(central);
        }

        parked.replace(None);
        let forward = theta.forward_diff(&cost_fn);
        if let Some(err) = parked.take() {
            return Err(err);
        }
        validate_grad(&forward, theta.len())?;
        Ok(forward)
    }
}

impl<'a, F: LogLikelihood> CostFunction for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Output = Cost;

    /// `-ℓ(θ)`; a non-finite `ℓ` becomes [`OptError::NonFiniteCost`].
    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        let value = self.f.value(theta, self.data)?;
        if !value.is_finite() {
            return Err(OptError::NonFiniteCost { value }.into());
        }
        Ok(-value)
    }
}

impl<'a, F: LogLikelihood> Gradient for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Gradient = Grad;

    /// `-∇ℓ(θ)` from the model, or a finite-difference cost gradient when
    /// the model reports [`OptError::GradientNotImplemented`]. Any other model
    /// error is propagated.
    fn gradient(&self, theta: &Self::Param) -> Result<Self::Gradient, Error> {
        match self.f.grad(theta, self.data) {
            Ok(g) => {
                validate_grad(&g, theta.len())?;
                Ok(-g)
            }
            Err(OptError::GradientNotImplemented) => self.fd_cost_gradient(theta),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::errors::OptResult;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    // ℓ(θ) = -Σ (θ_i - c_i)², optional analytic gradient.
    struct Bowl {
        analytic: bool,
    }

    impl LogLikelihood for Bowl {
        type Data = Theta;

        fn value(&self, theta: &Theta, data: &Theta) -> OptResult<f64> {
            Ok(-(theta - data).mapv(|d| d * d).sum())
        }

        fn check(&self, _theta: &Theta, _data: &Theta) -> OptResult<()> {
            Ok(())
        }

        fn grad(&self, theta: &Theta, data: &Theta) -> OptResult<Grad> {
            if self.analytic {
                Ok((theta - data).mapv(|d| -2.0 * d))
            } else {
                Err(OptError::GradientNotImplemented)
            }
        }
    }

    // Errors whenever θ_0 > 1, so central differences at θ_0 = 1 fail.
    struct Cliff;

    impl LogLikelihood for Cliff {
        type Data = ();

        fn value(&self, theta: &Theta, _data: &()) -> OptResult<f64> {
            if theta[0] > 1.0 {
                return Err(OptError::ModelEvaluation { text: "outside support".into() });
            }
            Ok(theta[0])
        }

        fn check(&self, _theta: &Theta, _data: &()) -> OptResult<()> {
            Ok(())
        }
    }

    #[test]
    // Purpose
    // -------
    // The cost and analytic gradient are the negated log-likelihood pieces.
    //
    // Given
    // -----
    // - `Bowl` centered at (1, -2) evaluated at (0, 0).
    //
    // Expect
    // ------
    // - cost = 5 and cost gradient = (-2, 4).
    fn adapter_negates_value_and_analytic_gradient() {
        // Arrange
        let model = Bowl { analytic: true };
        let center = array![1.0, -2.0];
        let adapter = ArgMinAdapter::new(&model, &center);
        let theta = array![0.0, 0.0];

        // Act
        let cost = adapter.cost(&theta).expect("cost");
        let grad = adapter.gradient(&theta).expect("gradient");

        // Assert
        assert_abs_diff_eq!(cost, 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(grad[0], -2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(grad[1], 4.0, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Without an analytic gradient the adapter differentiates the cost.
    //
    // Given
    // -----
    // - `Bowl { analytic: false }` at the same point.
    //
    // Expect
    // ------
    // - Finite-difference gradient close to (-2, 4).
    fn adapter_falls_back_to_finite_differences() {
        let model = Bowl { analytic: false };
        let center = array![1.0, -2.0];
        let adapter = ArgMinAdapter::new(&model, &center);

        let grad = adapter.gradient(&array![0.0, 0.0]).expect("fd gradient");

        assert_abs_diff_eq!(grad[0], -2.0, epsilon = 1e-5);
        assert_abs_diff_eq!(grad[1], 4.0, epsilon = 1e-5);
    }

    #[test]
    // Purpose
    // -------
    // A model error hit by the central stencil forces a forward pass, and an
    // error hit by the forward pass is propagated.
    //
    // Given
    // -----
    // - `Cliff` at θ = (0.5) (both stencils safe) and θ = (1.0) (both
    //   stencils step past the support boundary).
    //
    // Expect
    // ------
    // - Gradient ≈ -1 at 0.5; an error at 1.0.
    fn adapter_fd_recovers_or_propagates_model_errors() {
        let model = Cliff;
        let adapter = ArgMinAdapter::new(&model, &());

        let inside = adapter.gradient(&array![0.5]).expect("inside support");
        assert_abs_diff_eq!(inside[0], -1.0, epsilon = 1e-6);

        assert!(adapter.gradient(&array![1.0]).is_err());
    }
}
