//! # Covariance Matrix Calculations
//!
//! This module provides functions for calculating covariance matrices from
//! Jacobian matrices in nonlinear least-squares optimization.

use ndarray::{Array1, Array2};

use crate::error::{CouplingError, Result};
use crate::utils::matrix_convert::{nalgebra_to_ndarray, ndarray_to_nalgebra};

/// Calculate covariance matrix from Jacobian matrix.
///
/// For nonlinear least-squares problems, the covariance matrix is estimated as:
///   covar = redchi * inv(J^T * J)
/// where:
///   - J is the Jacobian matrix
///   - redchi is the reduced chi-square (chi^2 / dof)
///
/// With zero degrees of freedom the reduced chi-square is undefined and every
/// entry is `+inf`, the usual curve-fit convention.
///
/// # Errors
///
/// * `CouplingError::SingularMatrix` if `J^T * J` cannot be inverted
pub fn calculate_covariance(jacobian: &Array2<f64>, residual_sum_of_squares: f64) -> Result<Array2<f64>> {
    let (n_residuals, n_params) = jacobian.dim();
    let j = ndarray_to_nalgebra(jacobian);
    let jtj = j.transpose() * &j;

    let inverse = jtj.try_inverse().ok_or(CouplingError::SingularMatrix)?;
    if inverse.iter().any(|v| !v.is_finite()) {
        return Err(CouplingError::SingularMatrix);
    }

    if n_residuals <= n_params {
        return Ok(Array2::from_elem((n_params, n_params), f64::INFINITY));
    }

    let redchi = residual_sum_of_squares / (n_residuals - n_params) as f64;
    Ok(nalgebra_to_ndarray(&inverse) * redchi)
}

/// Extract standard errors from the covariance matrix.
///
/// Standard errors are the square roots of the diagonal elements
/// of the covariance matrix.
pub fn standard_errors_from_covariance(covar: &Array2<f64>) -> Array1<f64> {
    covar
        .diag()
        .iter()
        .map(|&v| if v > 0.0 { v.sqrt() } else { 0.0 })
        .collect()
}
