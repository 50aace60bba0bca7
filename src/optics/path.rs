//! Optical paths built in the order light traverses them.

use serde::{Deserialize, Serialize};

use super::abcd::{compose, free_space, propagate, thin_lens, TransferMatrix};
use super::beam::ComplexBeamParameter;
use crate::error::{CouplingError, Result};

/// One element of an optical path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Element {
    /// Free-space section of the given length.
    FreeSpace(f64),
    /// Thin lens of the given focal length.
    ThinLens(f64),
}

impl Element {
    /// Transfer matrix of this element.
    pub fn matrix(&self) -> Result<TransferMatrix> {
        match *self {
            Element::FreeSpace(length) => Ok(free_space(length)),
            Element::ThinLens(focal_length) => thin_lens(focal_length),
        }
    }
}

/// An ordered sequence of elements, first-encountered first.
///
/// ```
/// use fibercouple_rs::optics::{ComplexBeamParameter, OpticalPath};
///
/// let path = OpticalPath::new().gap(0.1).lens(0.05).unwrap().gap(0.05);
/// let q = ComplexBeamParameter::from_waist(0.0, 0.5).unwrap();
/// let out = path.propagate(q).unwrap();
/// assert!(out.im() > 0.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpticalPath {
    elements: Vec<Element>,
}

impl OpticalPath {
    /// Create an empty path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a free-space section.
    pub fn gap(mut self, length: f64) -> Self {
        self.elements.push(Element::FreeSpace(length));
        self
    }

    /// Append a thin lens.
    ///
    /// # Errors
    ///
    /// * `CouplingError::InvalidLens` if the focal length is zero or not finite
    pub fn lens(mut self, focal_length: f64) -> Result<Self> {
        if focal_length == 0.0 || !focal_length.is_finite() {
            return Err(CouplingError::InvalidLens(focal_length));
        }
        self.elements.push(Element::ThinLens(focal_length));
        Ok(self)
    }

    /// Append an element without validation; invalid lenses are reported
    /// when the path is evaluated.
    pub fn push(&mut self, element: Element) {
        self.elements.push(element);
    }

    /// The two-lens telescope `[gap d1][lens f1][gap d2][lens f2]`.
    pub fn telescope(d1: f64, f1: f64, d2: f64, f2: f64) -> Result<Self> {
        Self::new().gap(d1).lens(f1)?.gap(d2).lens(f2)
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Sum of all free-space lengths.
    pub fn total_length(&self) -> f64 {
        self.elements
            .iter()
            .map(|e| match e {
                Element::FreeSpace(length) => *length,
                Element::ThinLens(_) => 0.0,
            })
            .sum()
    }

    /// The composed system matrix `Mn · … · M1`.
    pub fn system_matrix(&self) -> Result<TransferMatrix> {
        let matrices = self
            .elements
            .iter()
            .map(Element::matrix)
            .collect::<Result<Vec<_>>>()?;
        Ok(compose(&matrices))
    }

    /// Propagate a beam parameter from the start to the end of the path.
    pub fn propagate(&self, q: ComplexBeamParameter) -> Result<ComplexBeamParameter> {
        propagate(q, &self.system_matrix()?)
    }
}

/// Beam widths sampled along one free-space segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentProfile {
    /// Axial position of the segment start, measured from the path start.
    pub start: f64,
    /// Absolute axial sample positions.
    pub positions: Vec<f64>,
    /// Beam radius at each sample position.
    pub widths: Vec<f64>,
}

/// Sample the beam radius along every free-space segment of a path.
///
/// Each segment gets `samples_per_gap` evenly spaced points including both
/// ends. Lenses change the beam parameter between segments but occupy no
/// length.
///
/// # Errors
///
/// * `CouplingError::InvalidInput` if fewer than two samples are requested
/// * any propagation error raised along the way
pub fn trace_profile(
    q_in: ComplexBeamParameter,
    path: &OpticalPath,
    samples_per_gap: usize,
    wavelength: f64,
) -> Result<Vec<SegmentProfile>> {
    if samples_per_gap < 2 {
        return Err(CouplingError::InvalidInput(format!(
            "at least two samples per gap required, got {}",
            samples_per_gap
        )));
    }

    let mut q = q_in;
    let mut position = 0.0;
    let mut segments = Vec::new();

    for element in path.elements() {
        match *element {
            Element::FreeSpace(length) => {
                let step = length / (samples_per_gap - 1) as f64;
                let mut positions = Vec::with_capacity(samples_per_gap);
                let mut widths = Vec::with_capacity(samples_per_gap);
                for i in 0..samples_per_gap {
                    let s = step * i as f64;
                    let sampled = propagate(q, &free_space(s))?;
                    positions.push(position + s);
                    widths.push(sampled.beam_size(wavelength)?);
                }
                segments.push(SegmentProfile {
                    start: position,
                    positions,
                    widths,
                });
                q = propagate(q, &free_space(length))?;
                position += length;
            }
            Element::ThinLens(focal_length) => {
                q = propagate(q, &thin_lens(focal_length)?)?;
            }
        }
    }

    Ok(segments)
}
