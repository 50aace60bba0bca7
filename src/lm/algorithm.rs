//! Implementation of the Levenberg-Marquardt algorithm.
//!
//! This module contains the damped Gauss-Newton iteration used for the
//! beam-width fit and for every local minimization of the telescope search.

use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2};
use std::fmt;
use tracing::trace;

use crate::error::{CouplingError, Result};
use crate::problem::Problem;
use crate::utils::matrix_convert::{
    nalgebra_vec_to_ndarray, ndarray_to_nalgebra, ndarray_vec_to_nalgebra,
};

use super::config::LmConfig;

/// Result of the Levenberg-Marquardt optimization.
#[derive(Debug, Clone)]
pub struct LmResult {
    /// Optimized parameter values
    pub params: Array1<f64>,

    /// Residuals at the solution
    pub residuals: Array1<f64>,

    /// Sum of squared residuals
    pub cost: f64,

    /// Number of accepted iterations
    pub iterations: usize,

    /// Number of function evaluations
    pub func_evals: usize,

    /// Whether the optimization converged
    pub success: bool,

    /// A message describing the result
    pub message: String,

    /// The Jacobian matrix at the solution (if requested)
    pub jacobian: Option<Array2<f64>>,
}

impl fmt::Display for LmResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Optimization Result:")?;
        writeln!(f, "  Success: {}", self.success)?;
        writeln!(f, "  Message: {}", self.message)?;
        writeln!(f, "  Cost: {:.6e}", self.cost)?;
        writeln!(f, "  Iterations: {}", self.iterations)?;
        writeln!(f, "  Function evaluations: {}", self.func_evals)?;
        writeln!(f, "  Parameters: {:?}", self.params)?;
        Ok(())
    }
}

/// Status of the iteration.
enum IterationStatus {
    /// Continue iteration
    Continue,

    /// Converged successfully
    Converged(String),
}

/// The Levenberg-Marquardt optimizer.
#[derive(Debug, Clone, Default)]
pub struct LevenbergMarquardt {
    /// Configuration options
    config: LmConfig,
}

impl LevenbergMarquardt {
    /// Create a new Levenberg-Marquardt optimizer with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new Levenberg-Marquardt optimizer with the given configuration.
    pub fn with_config(config: LmConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    pub fn config(&self) -> &LmConfig {
        &self.config
    }

    /// Set the maximum number of iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Set the tolerance for relative change in the cost.
    pub fn with_ftol(mut self, ftol: f64) -> Self {
        self.config.ftol = ftol;
        self
    }

    /// Set the tolerance for relative change in parameter values.
    pub fn with_xtol(mut self, xtol: f64) -> Self {
        self.config.xtol = xtol;
        self
    }

    /// Set the tolerance for gradient norm.
    pub fn with_gtol(mut self, gtol: f64) -> Self {
        self.config.gtol = gtol;
        self
    }

    /// Set the initial value for the damping parameter.
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.config.initial_lambda = lambda;
        self
    }

    /// Set whether to calculate and return the Jacobian at the solution.
    pub fn with_calc_jacobian(mut self, calc_jacobian: bool) -> Self {
        self.config.calc_jacobian = calc_jacobian;
        self
    }

    /// Minimize the sum of squared residuals for the given problem.
    ///
    /// Each iteration solves `(JᵀJ + λ·diag(JᵀJ)) δ = −Jᵀr`. A step is kept
    /// only if it lowers the cost; otherwise λ grows and the step is retried.
    /// Residual evaluations that fail with a trial-local error (a beam hitting
    /// a matrix pole, for instance) count as rejected steps.
    ///
    /// Termination:
    /// - gradient norm at or below `gtol`, or an exactly zero cost: converged
    /// - relative step or relative cost decrease below `xtol` / `ftol`: converged
    /// - λ exceeding `max_lambda`: converged, no descent step is left
    /// - `max_iterations` accepted steps: not converged (`success == false`)
    ///
    /// # Arguments
    ///
    /// * `problem` - The problem to solve
    /// * `initial_params` - Initial guess for the parameter values
    pub fn minimize<P: Problem>(&self, problem: &P, initial_params: Array1<f64>) -> Result<LmResult> {
        self.config.validate()?;

        let n_params = problem.parameter_count();
        if initial_params.len() != n_params {
            return Err(CouplingError::DimensionMismatch(format!(
                "Expected {} parameters, got {}",
                n_params,
                initial_params.len()
            )));
        }

        let mut params = initial_params;
        let mut lambda = self.config.initial_lambda;

        let mut residuals = problem.eval(&params)?;
        let mut func_evals = 1;
        if residuals.iter().any(|r| !r.is_finite()) {
            return Err(CouplingError::ConvergenceFailure(
                "Non-finite residuals at the initial point".to_string(),
            ));
        }
        let mut cost = sum_of_squares(&residuals);
        let mut iterations = 0;

        let (success, message) = loop {
            if iterations >= self.config.max_iterations {
                break (
                    false,
                    format!("Maximum iterations ({}) reached", self.config.max_iterations),
                );
            }

            let jacobian = problem.jacobian(&params)?;
            if !problem.has_custom_jacobian() {
                func_evals += 2 * n_params;
            }
            let j = ndarray_to_nalgebra(&jacobian);
            let r = ndarray_vec_to_nalgebra(&residuals);

            // Gradient of the half cost: g = Jᵀ r
            let g = j.transpose() * &r;
            let gradient_norm = g.norm();
            if !gradient_norm.is_finite() {
                return Err(CouplingError::ConvergenceFailure(
                    "Non-finite gradient".to_string(),
                ));
            }
            if cost == 0.0 || gradient_norm <= self.config.gtol {
                break (
                    true,
                    format!(
                        "Gradient convergence: ||g|| = {:.2e} <= {:.2e}",
                        gradient_norm, self.config.gtol
                    ),
                );
            }

            let jtj = j.transpose() * &j;

            // Retry with increasing damping until a step lowers the cost.
            let status = loop {
                let step = match self.calculate_step(&jtj, &g, lambda) {
                    Some(step) => step,
                    None => {
                        lambda *= self.config.lambda_up_factor;
                        if lambda > self.config.max_lambda {
                            break IterationStatus::Converged(
                                "Damped system is singular, and lambda reached maximum".to_string(),
                            );
                        }
                        continue;
                    }
                };

                let step = nalgebra_vec_to_ndarray(&step);
                let new_params = &params + &step;

                func_evals += 1;
                let new_residuals = match problem.eval(&new_params) {
                    Ok(res) if res.iter().all(|r| r.is_finite()) => Some(res),
                    Ok(_) => None,
                    Err(e) if e.is_trial_local() => None,
                    Err(e) => return Err(e),
                };
                let new_cost = new_residuals.as_ref().map(sum_of_squares);

                match (new_residuals, new_cost) {
                    (Some(new_residuals), Some(new_cost)) if new_cost < cost => {
                        let step_norm = step.iter().map(|x| x * x).sum::<f64>().sqrt();
                        let param_norm = params.iter().map(|x| x * x).sum::<f64>().sqrt();
                        let cost_change = (cost - new_cost) / cost;

                        params = new_params;
                        residuals = new_residuals;
                        cost = new_cost;
                        lambda = (lambda * self.config.lambda_down_factor)
                            .max(self.config.min_lambda);
                        iterations += 1;

                        if step_norm <= self.config.xtol * (self.config.xtol + param_norm) {
                            break IterationStatus::Converged(format!(
                                "Parameter convergence: |dx|/|x| = {:.2e}",
                                step_norm / param_norm.max(f64::MIN_POSITIVE)
                            ));
                        }
                        if cost_change <= self.config.ftol {
                            break IterationStatus::Converged(format!(
                                "Cost convergence: |df|/|f| = {:.2e} <= {:.2e}",
                                cost_change, self.config.ftol
                            ));
                        }
                        break IterationStatus::Continue;
                    }
                    _ => {
                        lambda *= self.config.lambda_up_factor;
                        if lambda > self.config.max_lambda {
                            break IterationStatus::Converged(
                                "Cost cannot be reduced further, and lambda reached maximum"
                                    .to_string(),
                            );
                        }
                    }
                }
            };

            match status {
                IterationStatus::Continue => (),
                IterationStatus::Converged(message) => break (true, message),
            }
        };

        trace!(iterations, func_evals, cost, success, %message, "levenberg-marquardt finished");

        Ok(LmResult {
            jacobian: if self.config.calc_jacobian {
                Some(problem.jacobian(&params)?)
            } else {
                None
            },
            params,
            residuals,
            cost,
            iterations,
            func_evals,
            success,
            message,
        })
    }

    /// Calculate the Levenberg-Marquardt step.
    ///
    /// Solves `(JᵀJ + λ·D) δ = −g` where `D` is the diagonal of `JᵀJ`
    /// (floored so that flat directions are still damped). Cholesky is tried
    /// first; LU is the fallback.
    ///
    /// # Returns
    ///
    /// * The step, or `None` if the damped system is singular
    fn calculate_step(&self, jtj: &DMatrix<f64>, g: &DVector<f64>, lambda: f64) -> Option<DVector<f64>> {
        let n = jtj.nrows();
        let max_diag = (0..n).map(|i| jtj[(i, i)]).fold(0.0_f64, f64::max);
        let floor = (max_diag * 1e-12).max(f64::MIN_POSITIVE);

        let mut a = jtj.clone();
        for i in 0..n {
            a[(i, i)] += lambda * jtj[(i, i)].max(floor);
        }

        let rhs = -g.clone();
        let step = match a.clone().cholesky() {
            Some(chol) => chol.solve(&rhs),
            None => a.lu().solve(&rhs)?,
        };

        if step.iter().all(|x| x.is_finite()) {
            Some(step)
        } else {
            None
        }
    }
}

fn sum_of_squares(residuals: &Array1<f64>) -> f64 {
    residuals.iter().map(|r| r.powi(2)).sum()
}
