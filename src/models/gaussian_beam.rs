//! Gaussian beam-width model for fitting width-vs-distance measurements.
//!
//! The width of a Gaussian beam along its axis follows
//!
//! w(z) = d0 * sqrt(1 + ((z - z0) / zr)^2)
//!
//! Where:
//! - d0: the minimum (waist) width
//! - z0: the axial position of the waist
//! - zr: the Rayleigh range
//!
//! Fitting this law to measurements taken at known distances from a fiber
//! collimator yields the complex beam parameter `q = -z0 + i*zr` at the
//! collimator plane.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CouplingError, Result};
use crate::lm::{LevenbergMarquardt, LmConfig};
use crate::optics::ComplexBeamParameter;
use crate::problem::Problem;
use crate::uncertainty::{calculate_covariance, standard_errors_from_covariance};

/// Evaluate the beam-width law at `z`.
pub fn beam_width_law(z: f64, min_width: f64, waist_position: f64, rayleigh_range: f64) -> f64 {
    let u = (z - waist_position) / rayleigh_range;
    min_width * (1.0 + u * u).sqrt()
}

/// Least-squares problem for the beam-width law over `[d0, z0, zr]`.
///
/// Residuals are `model - measured`.
pub struct BeamWidthProblem {
    distance: Array1<f64>,
    width: Array1<f64>,
}

impl BeamWidthProblem {
    /// Create a problem from paired distance and width samples.
    ///
    /// # Errors
    ///
    /// * `CouplingError::DimensionMismatch` if the arrays differ in length
    /// * `CouplingError::InvalidInput` if there are fewer than three samples,
    ///   a value is not finite, or a width is not positive
    pub fn new(distance: Array1<f64>, width: Array1<f64>) -> Result<Self> {
        if distance.len() != width.len() {
            return Err(CouplingError::DimensionMismatch(format!(
                "{} distances but {} widths",
                distance.len(),
                width.len()
            )));
        }
        if distance.len() < 3 {
            return Err(CouplingError::InvalidInput(format!(
                "at least 3 samples are needed to fit 3 parameters, got {}",
                distance.len()
            )));
        }
        if distance.iter().chain(width.iter()).any(|v| !v.is_finite()) {
            return Err(CouplingError::InvalidInput(
                "width samples must be finite".to_string(),
            ));
        }
        if width.iter().any(|&w| w <= 0.0) {
            return Err(CouplingError::InvalidInput(
                "beam widths must be positive".to_string(),
            ));
        }

        Ok(Self { distance, width })
    }

    pub fn distance(&self) -> &Array1<f64> {
        &self.distance
    }

    pub fn width(&self) -> &Array1<f64> {
        &self.width
    }

    /// Starting point for the fit.
    ///
    /// Squared widths are a parabola in `z`, `w^2 = a + b*z + c*z^2`, so a
    /// linear fit of that parabola gives the three parameters in closed form.
    /// When the parabola does not open upward (noisy or one-sided data), the
    /// guess falls back to the narrowest sample and the span of the data.
    pub fn initial_guess(&self) -> Array1<f64> {
        if let Some(guess) = self.parabola_guess() {
            return guess;
        }

        let (idx_min, &w_min) = self
            .width
            .iter()
            .enumerate()
            .fold((0, &f64::INFINITY), |best, cur| if cur.1 < best.1 { cur } else { best });
        let z_min = self.distance.iter().cloned().fold(f64::INFINITY, f64::min);
        let z_max = self.distance.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let span = if z_max > z_min { z_max - z_min } else { 1.0 };

        Array1::from_vec(vec![w_min, self.distance[idx_min], span])
    }

    fn parabola_guess(&self) -> Option<Array1<f64>> {
        let n = self.distance.len();
        let design = nalgebra::DMatrix::from_fn(n, 3, |i, j| self.distance[i].powi(j as i32));
        let squared = nalgebra::DVector::from_iterator(n, self.width.iter().map(|w| w * w));

        let normal = design.transpose() * &design;
        let rhs = design.transpose() * squared;
        let coeffs = normal.lu().solve(&rhs)?;
        let (a, b, c) = (coeffs[0], coeffs[1], coeffs[2]);

        if c.is_nan() || c <= 0.0 {
            return None;
        }
        let waist_position = -b / (2.0 * c);
        let min_width_sq = a - b * b / (4.0 * c);
        if !min_width_sq.is_finite() || min_width_sq <= 0.0 {
            return None;
        }
        let min_width = min_width_sq.sqrt();
        let rayleigh_range = min_width / c.sqrt();

        Some(Array1::from_vec(vec![min_width, waist_position, rayleigh_range]))
    }
}

impl Problem for BeamWidthProblem {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        let (d0, z0, zr) = (params[0], params[1], params[2]);
        Ok(self
            .distance
            .iter()
            .zip(self.width.iter())
            .map(|(&z, &w)| beam_width_law(z, d0, z0, zr) - w)
            .collect())
    }

    fn parameter_count(&self) -> usize {
        3
    }

    fn residual_count(&self) -> usize {
        self.distance.len()
    }

    fn jacobian(&self, params: &Array1<f64>) -> Result<Array2<f64>> {
        let (d0, z0, zr) = (params[0], params[1], params[2]);
        let mut jac = Array2::zeros((self.distance.len(), 3));

        for (i, &z) in self.distance.iter().enumerate() {
            let u = (z - z0) / zr;
            let root = (1.0 + u * u).sqrt();
            // dw/du = d0 * u / root
            let dw_du = d0 * u / root;
            jac[[i, 0]] = root;
            jac[[i, 1]] = -dw_du / zr;
            jac[[i, 2]] = -dw_du * u / zr;
        }

        Ok(jac)
    }

    fn has_custom_jacobian(&self) -> bool {
        true
    }
}

/// Configuration for the beam-width fit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    /// Solver settings
    pub lm: LmConfig,

    /// Starting point `[d0, z0, zr]`; derived from the data when absent
    pub initial_guess: Option<[f64; 3]>,
}

impl FitConfig {
    /// Set the solver configuration.
    pub fn with_lm(mut self, lm: LmConfig) -> Self {
        self.lm = lm;
        self
    }

    /// Set an explicit starting point `[d0, z0, zr]`.
    pub fn with_initial_guess(mut self, guess: [f64; 3]) -> Self {
        self.initial_guess = Some(guess);
        self
    }
}

/// Result of a beam-width fit.
#[derive(Debug, Clone)]
pub struct FitResult {
    /// Minimum beam width `d0`
    pub min_width: f64,

    /// Axial position of the waist `z0`
    pub waist_position: f64,

    /// Rayleigh range `zr`
    pub rayleigh_range: f64,

    /// Covariance of `[d0, z0, zr]`; all entries are `+inf` when the fit has
    /// no degrees of freedom
    pub covariance: Array2<f64>,

    /// Standard errors of `[d0, z0, zr]`
    pub standard_errors: Array1<f64>,

    /// Sum of squared residuals at the solution
    pub residual_sum_of_squares: f64,

    /// Accepted solver iterations
    pub iterations: usize,

    /// Complex beam parameter at `z = 0`
    pub q: ComplexBeamParameter,
}

impl FitResult {
    /// The fitted width at distance `z`.
    pub fn width_at(&self, z: f64) -> f64 {
        beam_width_law(z, self.min_width, self.waist_position, self.rayleigh_range)
    }

    /// The fitted curve at `n` evenly spaced points on `[0, z_max]`.
    pub fn sample(&self, z_max: f64, n: usize) -> (Array1<f64>, Array1<f64>) {
        let z = Array1::linspace(0.0, z_max, n);
        let w = z.mapv(|z| self.width_at(z));
        (z, w)
    }

    /// The complex beam parameter at the measurement origin.
    pub fn beam_parameter(&self) -> ComplexBeamParameter {
        self.q
    }
}

/// Fit the beam-width law to measured samples.
///
/// # Arguments
///
/// * `distance` - Distances from the reference plane
/// * `width` - Measured beam radii at those distances
/// * `config` - Solver settings and optional starting point
///
/// # Errors
///
/// * `CouplingError::InvalidInput` / `CouplingError::DimensionMismatch` for
///   malformed samples
/// * `CouplingError::FitDivergence` if the solver does not converge, the
///   solution is not finite, or the covariance cannot be computed
pub fn fit_beam_width(
    distance: &Array1<f64>,
    width: &Array1<f64>,
    config: &FitConfig,
) -> Result<FitResult> {
    let problem = BeamWidthProblem::new(distance.clone(), width.clone())?;
    let initial = match config.initial_guess {
        Some(guess) => Array1::from_vec(guess.to_vec()),
        None => problem.initial_guess(),
    };
    debug!(?initial, samples = distance.len(), "fitting beam width");

    let solver = LevenbergMarquardt::with_config(config.lm.clone());
    let result = solver
        .minimize(&problem, initial)
        .map_err(|e| match e {
            CouplingError::ConvergenceFailure(msg) => CouplingError::FitDivergence(msg),
            other => other,
        })?;

    if !result.success {
        return Err(CouplingError::FitDivergence(result.message));
    }
    if result.params.iter().any(|p| !p.is_finite()) {
        return Err(CouplingError::FitDivergence(
            "solution is not finite".to_string(),
        ));
    }

    // The width law is even in d0 and zr
    let min_width = result.params[0].abs();
    let waist_position = result.params[1];
    let rayleigh_range = result.params[2].abs();

    let jacobian = problem.jacobian(&result.params)?;
    let covariance = calculate_covariance(&jacobian, result.cost).map_err(|e| match e {
        CouplingError::SingularMatrix => CouplingError::FitDivergence(
            "covariance undefined: parameters are not identifiable from the data".to_string(),
        ),
        other => other,
    })?;
    let standard_errors = standard_errors_from_covariance(&covariance);

    let q = ComplexBeamParameter::from_waist(-waist_position, rayleigh_range)
        .map_err(|e| CouplingError::FitDivergence(e.to_string()))?;

    debug!(
        min_width,
        waist_position,
        rayleigh_range,
        cost = result.cost,
        iterations = result.iterations,
        "beam width fit converged"
    );

    Ok(FitResult {
        min_width,
        waist_position,
        rayleigh_range,
        covariance,
        standard_errors,
        residual_sum_of_squares: result.cost,
        iterations: result.iterations,
        q,
    })
}

/// Width-vs-distance measurements for one fiber endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct WidthSamples {
    pub distance: Array1<f64>,
    pub width: Array1<f64>,
}

impl WidthSamples {
    pub fn new(distance: Array1<f64>, width: Array1<f64>) -> Self {
        Self { distance, width }
    }

    /// Fit the beam-width law to these samples.
    pub fn fit(&self, config: &FitConfig) -> Result<FitResult> {
        fit_beam_width(&self.distance, &self.width, config)
    }
}

/// Fit both fiber endpoints independently.
///
/// Returns the source fit followed by the target fit.
pub fn fit_endpoints(
    source: &WidthSamples,
    target: &WidthSamples,
    config: &FitConfig,
) -> Result<(FitResult, FitResult)> {
    Ok((source.fit(config)?, target.fit(config)?))
}
