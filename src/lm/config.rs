//! Configuration options for the Levenberg-Marquardt algorithm.
//!
//! This module defines the convergence criteria and damping schedule used by
//! both the beam-width fit and the local minimizer of the telescope search.

use serde::{Deserialize, Serialize};

use crate::error::{CouplingError, Result};

/// Configuration options for the Levenberg-Marquardt algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LmConfig {
    /// Maximum number of accepted iterations. Default: 200
    pub max_iterations: usize,

    /// Tolerance for relative change in the cost. Default: 1e-10
    pub ftol: f64,

    /// Tolerance for relative change in parameter values. Default: 1e-10
    pub xtol: f64,

    /// Tolerance for gradient norm. Default: 0.0 (only an exactly flat gradient)
    pub gtol: f64,

    /// Initial value for the damping parameter. Default: 1e-3
    pub initial_lambda: f64,

    /// Factor by which to increase lambda. Default: 10.0
    pub lambda_up_factor: f64,

    /// Factor by which to decrease lambda. Default: 0.1
    pub lambda_down_factor: f64,

    /// Minimum value for lambda. Default: 1e-12
    pub min_lambda: f64,

    /// Maximum value for lambda. Default: 1e10
    pub max_lambda: f64,

    /// Whether to calculate and return the Jacobian at the solution. Default: false
    pub calc_jacobian: bool,
}

impl Default for LmConfig {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            ftol: 1e-10,
            xtol: 1e-10,
            gtol: 0.0,
            initial_lambda: 1e-3,
            lambda_up_factor: 10.0,
            lambda_down_factor: 0.1,
            min_lambda: 1e-12,
            max_lambda: 1e10,
            calc_jacobian: false,
        }
    }
}

impl LmConfig {
    /// Check that the damping schedule can terminate.
    ///
    /// λ must start positive and grow on every rejected step, otherwise the
    /// retry loop never reaches `max_lambda`.
    ///
    /// # Errors
    ///
    /// * `CouplingError::InvalidInput` for a schedule that cannot terminate or
    ///   negative tolerances
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(CouplingError::InvalidInput(msg));

        if !self.initial_lambda.is_finite() || self.initial_lambda <= 0.0 {
            return invalid(format!(
                "initial lambda must be positive, got {}",
                self.initial_lambda
            ));
        }
        if !self.lambda_up_factor.is_finite() || self.lambda_up_factor <= 1.0 {
            return invalid(format!(
                "lambda up factor must exceed 1, got {}",
                self.lambda_up_factor
            ));
        }
        if !(self.lambda_down_factor > 0.0 && self.lambda_down_factor <= 1.0) {
            return invalid(format!(
                "lambda down factor must lie in (0, 1], got {}",
                self.lambda_down_factor
            ));
        }
        if !self.min_lambda.is_finite() || self.min_lambda <= 0.0 || self.max_lambda <= self.min_lambda {
            return invalid(format!(
                "lambda range [{}, {}] is empty",
                self.min_lambda, self.max_lambda
            ));
        }
        if [self.ftol, self.xtol, self.gtol].iter().any(|t| t.is_nan() || *t < 0.0) {
            return invalid("tolerances must be non-negative".to_string());
        }
        Ok(())
    }
}
