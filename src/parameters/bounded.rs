//! Adapter that lets the unconstrained solver work inside a box.

use ndarray::Array1;

use super::bounds::{Bounds, BoundsTransform};
use crate::error::{CouplingError, Result};
use crate::problem::Problem;

/// Wraps a [`Problem`] whose parameters are box-constrained.
///
/// The solver sees unbounded internal parameters; every evaluation maps them
/// through [`BoundsTransform::to_external`] before calling the inner problem,
/// so the inner problem is only ever evaluated inside its bounds.
pub struct BoundedProblem<'a, P: Problem> {
    inner: &'a P,
    transforms: Vec<BoundsTransform>,
}

impl<'a, P: Problem> BoundedProblem<'a, P> {
    /// Create a bounded view of `inner` with one [`Bounds`] per parameter.
    pub fn new(inner: &'a P, bounds: &[Bounds]) -> Result<Self> {
        if bounds.len() != inner.parameter_count() {
            return Err(CouplingError::DimensionMismatch(format!(
                "Expected {} bounds, got {}",
                inner.parameter_count(),
                bounds.len()
            )));
        }
        Ok(Self {
            inner,
            transforms: bounds.iter().copied().map(BoundsTransform::new).collect(),
        })
    }

    /// Map external (bounded) values to internal solver values.
    pub fn to_internal(&self, external: &Array1<f64>) -> Result<Array1<f64>> {
        external
            .iter()
            .zip(self.transforms.iter())
            .map(|(value, transform)| transform.to_internal(*value).map_err(CouplingError::from))
            .collect()
    }

    /// Map internal solver values to external (bounded) values.
    pub fn to_external(&self, internal: &Array1<f64>) -> Array1<f64> {
        internal
            .iter()
            .zip(self.transforms.iter())
            .map(|(value, transform)| transform.to_external(*value))
            .collect()
    }
}

impl<'a, P: Problem> Problem for BoundedProblem<'a, P> {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        if params.len() != self.transforms.len() {
            return Err(CouplingError::DimensionMismatch(format!(
                "Expected {} parameters, got {}",
                self.transforms.len(),
                params.len()
            )));
        }
        self.inner.eval(&self.to_external(params))
    }

    fn parameter_count(&self) -> usize {
        self.transforms.len()
    }

    fn residual_count(&self) -> usize {
        self.inner.residual_count()
    }
}
