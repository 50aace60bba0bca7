//! Finite difference methods for numerical differentiation.
//!
//! The mismatch objective has no analytic derivatives, so the solver falls
//! back to these approximations for it.

use crate::error::{CouplingError, Result};
use crate::problem::Problem;
use ndarray::{Array1, Array2};

/// Relative step for central differences, roughly the cube root of machine
/// epsilon.
const DEFAULT_EPSILON: f64 = 6e-6;

/// Jacobian of the residuals by central differences.
///
/// Column `j` is `(r(x + h_j e_j) - r(x - h_j e_j)) / 2h_j` with
/// `h_j = epsilon * max(|x_j|, 1)`. The placement distances are O(0.1 m) while
/// the bounded search variables are O(1), so the step scales with the larger
/// of the two.
pub fn jacobian(
    problem: &dyn Problem,
    params: &Array1<f64>,
    epsilon: Option<f64>,
) -> Result<Array2<f64>> {
    let eps = epsilon.unwrap_or(DEFAULT_EPSILON);
    let m = problem.residual_count();
    let mut jac = Array2::zeros((m, params.len()));

    let mut shifted = params.clone();
    for (j, &x) in params.iter().enumerate() {
        let h = eps * x.abs().max(1.0);

        shifted[j] = x + h;
        let forward = checked_eval(problem, &shifted, m)?;
        shifted[j] = x - h;
        let backward = checked_eval(problem, &shifted, m)?;
        shifted[j] = x;

        jac.column_mut(j)
            .assign(&((&forward - &backward) / (2.0 * h)));
    }

    Ok(jac)
}

fn checked_eval(problem: &dyn Problem, params: &Array1<f64>, expected: usize) -> Result<Array1<f64>> {
    let residuals = problem.eval(params)?;
    if residuals.len() != expected {
        return Err(CouplingError::DimensionMismatch(format!(
            "problem reports {} residuals but produced {}",
            expected,
            residuals.len()
        )));
    }
    Ok(residuals)
}
