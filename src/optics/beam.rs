//! The complex beam parameter of a Gaussian beam.

use num_complex::Complex64;
use std::f64::consts::PI;
use std::fmt;

use crate::error::{CouplingError, Result};

/// Complex beam parameter `q` of a Gaussian beam at one axial plane.
///
/// `1/q = 1/R − i·λ/(π·w²)`, so `Re q` is the signed distance past the waist
/// and `Im q` is the Rayleigh range. `Im q` is always strictly positive; a
/// value that would violate this cannot be constructed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComplexBeamParameter {
    q: Complex64,
}

impl ComplexBeamParameter {
    /// Create a beam parameter from its real and imaginary parts.
    ///
    /// # Errors
    ///
    /// * `CouplingError::NonPhysicalBeam` if either part is not finite or the
    ///   imaginary part is not strictly positive
    pub fn new(re: f64, im: f64) -> Result<Self> {
        Self::from_complex(Complex64::new(re, im))
    }

    /// Create a beam parameter from a complex value.
    pub fn from_complex(q: Complex64) -> Result<Self> {
        if !q.re.is_finite() || !q.im.is_finite() {
            return Err(CouplingError::NonPhysicalBeam(format!(
                "beam parameter {} is not finite",
                q
            )));
        }
        if q.im <= 0.0 {
            return Err(CouplingError::NonPhysicalBeam(format!(
                "beam parameter {} has non-positive imaginary part",
                q
            )));
        }
        Ok(Self { q })
    }

    /// Beam parameter at `distance` past a waist with Rayleigh range `rayleigh_range`.
    ///
    /// A negative distance places the plane before the waist.
    pub fn from_waist(distance: f64, rayleigh_range: f64) -> Result<Self> {
        Self::new(distance, rayleigh_range)
    }

    /// Beam parameter at `distance` past a waist of radius `waist_radius`.
    pub fn from_waist_radius(distance: f64, waist_radius: f64, wavelength: f64) -> Result<Self> {
        if !wavelength.is_finite() || wavelength <= 0.0 {
            return Err(CouplingError::InvalidInput(format!(
                "wavelength must be positive, got {}",
                wavelength
            )));
        }
        Self::new(distance, PI * waist_radius * waist_radius / wavelength)
    }

    /// The underlying complex value.
    pub fn value(&self) -> Complex64 {
        self.q
    }

    /// Real part: signed distance from the waist to this plane.
    pub fn re(&self) -> f64 {
        self.q.re
    }

    /// Imaginary part.
    pub fn im(&self) -> f64 {
        self.q.im
    }

    /// Rayleigh range of the beam.
    pub fn rayleigh_range(&self) -> f64 {
        self.q.im
    }

    /// Distance from this plane forward to the waist (`−Re q`).
    pub fn waist_position(&self) -> f64 {
        -self.q.re
    }

    /// Wavefront radius of curvature; infinite at the waist.
    pub fn radius_of_curvature(&self) -> f64 {
        let inv = self.q.inv().re;
        if inv == 0.0 {
            f64::INFINITY
        } else {
            1.0 / inv
        }
    }

    /// Beam radius at this plane for the given wavelength.
    pub fn beam_size(&self, wavelength: f64) -> Result<f64> {
        super::abcd::beam_size(self.q, wavelength)
    }

    /// Waist radius of the beam for the given wavelength.
    pub fn waist_radius(&self, wavelength: f64) -> Result<f64> {
        super::abcd::beam_size(Complex64::new(0.0, self.q.im), wavelength)
    }

    /// The counter-propagating beam with the same width profile (`−q̄`).
    ///
    /// Reversing the direction of travel flips the sign of the wavefront
    /// curvature and leaves the Rayleigh range unchanged.
    pub fn time_reversed(&self) -> Self {
        Self {
            q: Complex64::new(-self.q.re, self.q.im),
        }
    }
}

impl fmt::Display for ComplexBeamParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}{:+.4}i", self.q.re, self.q.im)
    }
}
