//! # Uncertainty Calculation
//!
//! Parameter uncertainties for fitted beam parameters: covariance estimated
//! from the Jacobian at the solution, and the standard errors derived from it.

mod covariance;

pub use covariance::{calculate_covariance, standard_errors_from_covariance};
