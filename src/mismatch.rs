//! Mode-mismatch objective for a two-lens telescope between two fibers.
//!
//! The source beam is carried through `[gap d1][lens f1][gap d2][lens f2]`
//! and then across the final gap to the target fiber. Along that final gap
//! the delivered beam is compared with the beam the target fiber would need,
//! obtained by running the target's own beam backward from the fiber.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::{CouplingError, Result};
use crate::optics::{
    free_space, propagate, trace_profile, ComplexBeamParameter, OpticalPath, SegmentProfile,
};
use crate::problem::Problem;

/// Default number of sample points along the final gap.
pub const DEFAULT_SAMPLES: usize = 100;

/// A lens pair and its placement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidateConfig {
    /// Focal length of the first lens
    pub f1: f64,
    /// Focal length of the second lens
    pub f2: f64,
    /// Distance from the source fiber to the first lens
    pub d1: f64,
    /// Distance between the lenses
    pub d2: f64,
}

impl CandidateConfig {
    pub fn new(f1: f64, f2: f64, d1: f64, d2: f64) -> Self {
        Self { f1, f2, d1, d2 }
    }

    /// The telescope up to and including the second lens.
    pub fn path(&self) -> Result<OpticalPath> {
        OpticalPath::telescope(self.d1, self.f1, self.d2, self.f2)
    }

    /// Distance from the second lens to a target fiber `separation` away
    /// from the source. Negative when the lenses do not fit.
    pub fn final_gap(&self, separation: f64) -> f64 {
        separation - self.d1 - self.d2
    }
}

/// Beam profiles for one candidate, for plotting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouplingProfile {
    /// Delivered beam on every free-space segment from source to target
    pub segments: Vec<SegmentProfile>,
    /// Beam required by the target fiber along the final gap
    pub ideal: SegmentProfile,
    /// Mean squared width error along the final gap
    pub mse: f64,
    /// Power overlap with the target fiber mode
    pub coupling_efficiency: f64,
}

/// Mean squared error between delivered and ideal beam widths.
#[derive(Debug, Clone)]
pub struct MismatchObjective {
    source: ComplexBeamParameter,
    target: ComplexBeamParameter,
    separation: f64,
    wavelength: f64,
    samples: usize,
}

impl MismatchObjective {
    /// Create an objective for fibers `separation` apart.
    ///
    /// `source` is the beam leaving the source fiber at its own plane and
    /// `target` the beam leaving the target fiber at its plane, each as
    /// obtained from a beam-width fit.
    ///
    /// # Errors
    ///
    /// * `CouplingError::InvalidInput` if the separation or wavelength is not
    ///   positive and finite
    pub fn new(
        source: ComplexBeamParameter,
        target: ComplexBeamParameter,
        separation: f64,
        wavelength: f64,
    ) -> Result<Self> {
        if !separation.is_finite() || separation <= 0.0 {
            return Err(CouplingError::InvalidInput(format!(
                "fiber separation must be positive, got {}",
                separation
            )));
        }
        if !wavelength.is_finite() || wavelength <= 0.0 {
            return Err(CouplingError::InvalidInput(format!(
                "wavelength must be positive, got {}",
                wavelength
            )));
        }

        Ok(Self {
            source,
            target,
            separation,
            wavelength,
            samples: DEFAULT_SAMPLES,
        })
    }

    /// Set the number of sample points along the final gap.
    pub fn with_samples(mut self, samples: usize) -> Result<Self> {
        if samples < 2 {
            return Err(CouplingError::InvalidInput(format!(
                "at least two samples required, got {}",
                samples
            )));
        }
        self.samples = samples;
        Ok(self)
    }

    pub fn source(&self) -> ComplexBeamParameter {
        self.source
    }

    pub fn target(&self) -> ComplexBeamParameter {
        self.target
    }

    pub fn separation(&self) -> f64 {
        self.separation
    }

    pub fn wavelength(&self) -> f64 {
        self.wavelength
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Beam parameter right after the second lens.
    fn after_telescope(&self, config: &CandidateConfig) -> Result<ComplexBeamParameter> {
        config.path()?.propagate(self.source)
    }

    /// Sample offsets `s_i` from the second lens along a final gap of length `gap`.
    fn offsets(&self, gap: f64) -> Array1<f64> {
        Array1::linspace(0.0, gap, self.samples)
    }

    /// Width the target fiber needs at `remaining` before its plane.
    ///
    /// The target beam is reversed and run backward from the fiber.
    pub fn ideal_width(&self, remaining: f64) -> Result<f64> {
        propagate(self.target.time_reversed(), &free_space(-remaining))?.beam_size(self.wavelength)
    }

    /// Residuals `(ideal_i - actual_i) / sqrt(N)` along the final gap.
    ///
    /// Their sum of squares is the mean squared error.
    pub fn residuals(&self, config: &CandidateConfig) -> Result<Array1<f64>> {
        let q2 = self.after_telescope(config)?;
        let gap = config.final_gap(self.separation);
        let scale = (self.samples as f64).sqrt();

        self.offsets(gap)
            .iter()
            .map(|&s| {
                let actual = propagate(q2, &free_space(s))?.beam_size(self.wavelength)?;
                let ideal = self.ideal_width(gap - s)?;
                Ok((ideal - actual) / scale)
            })
            .collect::<Result<Vec<f64>>>()
            .map(Array1::from_vec)
    }

    /// Mean squared width error along the final gap. Zero for a perfect match.
    ///
    /// # Errors
    ///
    /// * `CouplingError::InvalidLens` for a zero focal length
    /// * `CouplingError::DegenerateGeometry` / `CouplingError::NonPhysicalBeam`
    ///   if propagation breaks down for this candidate
    pub fn evaluate(&self, config: &CandidateConfig) -> Result<f64> {
        Ok(self.residuals(config)?.iter().map(|r| r * r).sum())
    }

    /// Power coupling efficiency into the target fiber mode.
    ///
    /// `η = 4·Im(q1)·Im(q2) / |q1 − q̄2|²` with `q1` the delivered beam and `q2`
    /// the reversed target beam, both at the target fiber plane.
    pub fn coupling_efficiency(&self, config: &CandidateConfig) -> Result<f64> {
        let gap = config.final_gap(self.separation);
        let delivered = propagate(self.after_telescope(config)?, &free_space(gap))?.value();
        let wanted = self.target.time_reversed().value();

        let overlap = (delivered - wanted.conj()).norm_sqr();
        if overlap == 0.0 {
            return Err(CouplingError::DegenerateGeometry(
                "mode overlap is undefined".to_string(),
            ));
        }
        Ok(4.0 * delivered.im * wanted.im / overlap)
    }

    /// Delivered and ideal beam profiles for a candidate.
    pub fn profiles(&self, config: &CandidateConfig) -> Result<CouplingProfile> {
        let gap = config.final_gap(self.separation);
        let path = config.path()?.gap(gap);
        let segments = trace_profile(self.source, &path, self.samples, self.wavelength)?;

        let start = config.d1 + config.d2;
        let offsets = self.offsets(gap);
        let widths = offsets
            .iter()
            .map(|&s| self.ideal_width(gap - s))
            .collect::<Result<Vec<f64>>>()?;
        let ideal = SegmentProfile {
            start,
            positions: offsets.iter().map(|s| start + s).collect(),
            widths,
        };

        Ok(CouplingProfile {
            segments,
            ideal,
            mse: self.evaluate(config)?,
            coupling_efficiency: self.coupling_efficiency(config)?,
        })
    }

    /// The objective over `(d1, d2)` for a fixed lens pair.
    pub fn placement_problem(&self, f1: f64, f2: f64) -> PlacementProblem<'_> {
        PlacementProblem {
            objective: self,
            f1,
            f2,
        }
    }
}

/// [`MismatchObjective`] as a least-squares problem over `[d1, d2]`.
pub struct PlacementProblem<'a> {
    objective: &'a MismatchObjective,
    f1: f64,
    f2: f64,
}

impl PlacementProblem<'_> {
    /// The candidate for parameters `[d1, d2]`.
    pub fn candidate(&self, params: &Array1<f64>) -> CandidateConfig {
        CandidateConfig::new(self.f1, self.f2, params[0], params[1])
    }
}

impl Problem for PlacementProblem<'_> {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        self.objective.residuals(&self.candidate(params))
    }

    fn parameter_count(&self) -> usize {
        2
    }

    fn residual_count(&self) -> usize {
        self.objective.samples
    }
}
