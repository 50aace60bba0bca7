//! Box bounds for optimization variables.
//!
//! The Levenberg-Marquardt solver is unconstrained, so bounded variables are
//! optimized through the Minuit-style sine transform: the solver moves an
//! unbounded internal value θ and the problem sees
//! `min + (sin θ + 1)·(max − min)/2`, which can never leave `[min, max]`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when working with parameter bounds
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BoundsError {
    #[error("Invalid bounds: min ({min}) must be finite and less than max ({max})")]
    InvalidBounds { min: f64, max: f64 },

    #[error("Parameter value {value} is outside bounds: [{min}, {max}]")]
    ValueOutsideBounds { value: f64, min: f64, max: f64 },

    #[error("Infinite parameter value is not allowed")]
    InfiniteValue,
}

/// A closed interval `[min, max]` constraining one variable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Minimum allowed value
    pub min: f64,

    /// Maximum allowed value
    pub max: f64,
}

impl Bounds {
    /// Create bounds `[min, max]`.
    ///
    /// Both ends must be finite and `min < max`.
    ///
    /// # Examples
    ///
    /// ```
    /// use fibercouple_rs::parameters::bounds::Bounds;
    ///
    /// let bounds = Bounds::new(0.6, 0.85).unwrap();
    /// assert!(bounds.contains(0.7));
    /// assert!(Bounds::new(0.85, 0.6).is_err());
    /// ```
    pub fn new(min: f64, max: f64) -> Result<Self, BoundsError> {
        if !min.is_finite() || !max.is_finite() || min >= max {
            return Err(BoundsError::InvalidBounds { min, max });
        }
        Ok(Self { min, max })
    }

    /// Check if a value is within the bounds (inclusive).
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Clamp a value to be within the bounds.
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    /// Width of the interval.
    pub fn width(&self) -> f64 {
        self.max - self.min
    }
}

/// Minuit-style transform between an unbounded internal value and a
/// bounded external value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundsTransform {
    bounds: Bounds,
}

impl BoundsTransform {
    /// Create a new bounds transform
    pub fn new(bounds: Bounds) -> Self {
        Self { bounds }
    }

    /// The bounds this transform maps onto.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Transform an internal parameter value to an external value
    pub fn to_external(&self, internal_value: f64) -> f64 {
        let value = self.bounds.min + (internal_value.sin() + 1.0) * self.bounds.width() / 2.0;
        // sin can overshoot by an ulp at the ends
        self.bounds.clamp(value)
    }

    /// Transform an external parameter value to an internal value
    ///
    /// # Returns
    ///
    /// The internal value in `[−π/2, π/2]`, or an error if the external value
    /// is not finite or lies outside the bounds
    pub fn to_internal(&self, external_value: f64) -> Result<f64, BoundsError> {
        if !external_value.is_finite() {
            return Err(BoundsError::InfiniteValue);
        }
        if !self.bounds.contains(external_value) {
            return Err(BoundsError::ValueOutsideBounds {
                value: external_value,
                min: self.bounds.min,
                max: self.bounds.max,
            });
        }

        let scaled = 2.0 * (external_value - self.bounds.min) / self.bounds.width() - 1.0;
        Ok(scaled.clamp(-1.0, 1.0).asin())
    }
}
