//! ABCD transfer matrices and the bilinear propagation of beam parameters.
//!
//! Matrices compose right to left: light that crosses `E1`, then `E2`, then
//! `E3` sees the system `M3 · M2 · M1`. [`compose`] takes elements in the
//! order light meets them and does the reversal itself; prefer it (or
//! [`OpticalPath`](super::path::OpticalPath)) over multiplying by hand.

use nalgebra::Matrix2;
use num_complex::Complex64;
use std::f64::consts::PI;
use std::ops::Mul;

use super::beam::ComplexBeamParameter;
use crate::error::{CouplingError, Result};

/// A 2×2 real ray-transfer matrix `[[A, B], [C, D]]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferMatrix(Matrix2<f64>);

impl TransferMatrix {
    /// Create a matrix from its four entries.
    pub fn new(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self(Matrix2::new(a, b, c, d))
    }

    /// The identity (an element of zero length).
    pub fn identity() -> Self {
        Self(Matrix2::identity())
    }

    pub fn a(&self) -> f64 {
        self.0[(0, 0)]
    }

    pub fn b(&self) -> f64 {
        self.0[(0, 1)]
    }

    pub fn c(&self) -> f64 {
        self.0[(1, 0)]
    }

    pub fn d(&self) -> f64 {
        self.0[(1, 1)]
    }

    /// Determinant; 1 for any lossless system in a single medium.
    pub fn determinant(&self) -> f64 {
        self.0.determinant()
    }

    /// The system of `self` followed by `next` along the beam.
    pub fn then(&self, next: &TransferMatrix) -> TransferMatrix {
        TransferMatrix(next.0 * self.0)
    }

    /// The underlying nalgebra matrix.
    pub fn as_matrix(&self) -> &Matrix2<f64> {
        &self.0
    }
}

impl Mul for TransferMatrix {
    type Output = TransferMatrix;

    /// Plain matrix product: `self` is applied *after* `rhs`.
    fn mul(self, rhs: TransferMatrix) -> TransferMatrix {
        TransferMatrix(self.0 * rhs.0)
    }
}

/// Free-space section of the given length: `[[1, L], [0, 1]]`.
pub fn free_space(length: f64) -> TransferMatrix {
    TransferMatrix::new(1.0, length, 0.0, 1.0)
}

/// Thin lens of the given focal length: `[[1, 0], [−1/f, 1]]`.
///
/// # Errors
///
/// * `CouplingError::InvalidLens` if the focal length is zero or not finite
pub fn thin_lens(focal_length: f64) -> Result<TransferMatrix> {
    if focal_length == 0.0 || !focal_length.is_finite() {
        return Err(CouplingError::InvalidLens(focal_length));
    }
    Ok(TransferMatrix::new(1.0, 0.0, -1.0 / focal_length, 1.0))
}

/// Compose matrices given in the order light traverses them.
///
/// Returns `Mn · … · M2 · M1`; an empty sequence yields the identity.
pub fn compose<'a, I>(matrices: I) -> TransferMatrix
where
    I: IntoIterator<Item = &'a TransferMatrix>,
{
    matrices
        .into_iter()
        .fold(TransferMatrix::identity(), |system, element| system.then(element))
}

/// Propagate a beam parameter through a system: `q' = (A q + B) / (C q + D)`.
///
/// # Errors
///
/// * `CouplingError::DegenerateGeometry` if `q` sits on the pole of the
///   transform or the result is not finite
/// * `CouplingError::NonPhysicalBeam` if the result has `Im q' ≤ 0`, which
///   only happens for matrices with a non-positive determinant
pub fn propagate(q: ComplexBeamParameter, system: &TransferMatrix) -> Result<ComplexBeamParameter> {
    let q_in = q.value();
    let numerator = q_in * system.a() + system.b();
    let denominator = q_in * system.c() + system.d();

    if denominator.norm_sqr() == 0.0 {
        return Err(CouplingError::DegenerateGeometry(format!(
            "beam parameter {} is a pole of the system matrix",
            q
        )));
    }

    let q_out = numerator / denominator;
    if !q_out.re.is_finite() || !q_out.im.is_finite() {
        return Err(CouplingError::DegenerateGeometry(format!(
            "propagating {} produced a non-finite beam parameter",
            q
        )));
    }

    ComplexBeamParameter::from_complex(q_out)
}

/// Beam radius for a complex beam parameter: `sqrt(−λ / (π · Im(1/q)))`.
///
/// Takes a raw complex value so that sign-convention mistakes upstream are
/// reported rather than hidden.
///
/// # Errors
///
/// * `CouplingError::NonPhysicalBeam` if the quantity under the square root
///   is not positive and finite
pub fn beam_size(q: Complex64, wavelength: f64) -> Result<f64> {
    let radicand = -wavelength / (PI * q.inv().im);
    if !radicand.is_finite() || radicand <= 0.0 {
        return Err(CouplingError::NonPhysicalBeam(format!(
            "beam size undefined for q = {} at wavelength {:e}",
            q, wavelength
        )));
    }
    Ok(radicand.sqrt())
}
