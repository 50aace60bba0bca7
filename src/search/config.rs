//! Configuration for the telescope search.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{CouplingError, Result};
use crate::lm::LmConfig;
use crate::parameters::Bounds;

/// Geometry, sampling and solver settings for one search run.
///
/// Distances are in meters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Wavelength of the light. Default: 650e-9
    pub wavelength: f64,

    /// Distance between the two fibers (d3). Default: 2.0
    pub separation: f64,

    /// Minimum distance from the source fiber to the first lens (dmin). Default: 0.05
    pub min_source_clearance: f64,

    /// Minimum distance between the two lenses. Default: 0.01
    pub min_lens_gap: f64,

    /// Space kept free in front of the target fiber. Default: 0.05
    pub margin_clearance: f64,

    /// Random restarts per lens pair. Default: 100
    pub restarts: usize,

    /// Sample points along the final gap. Default: 100
    pub samples: usize,

    /// Relative tolerance of the local minimizer. Default: 1e-10
    pub tolerance: f64,

    /// Iteration budget of each local minimization. Default: 200
    pub max_iterations: usize,

    /// Base seed; trial `i` draws its starting point from `seed + i`. Default: 0
    pub seed: u64,

    /// Run trials on the rayon thread pool. Default: false
    pub parallel: bool,

    /// Also try every lens pair with the lenses swapped. Default: false
    pub both_orderings: bool,

    /// Stop starting new trials after this many seconds. Default: none
    pub time_budget_secs: Option<f64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            wavelength: 650e-9,
            separation: 2.0,
            min_source_clearance: 0.05,
            min_lens_gap: 0.01,
            margin_clearance: 0.05,
            restarts: 100,
            samples: 100,
            tolerance: 1e-10,
            max_iterations: 200,
            seed: 0,
            parallel: false,
            both_orderings: false,
            time_budget_secs: None,
        }
    }
}

impl SearchConfig {
    /// Create a configuration for fibers `separation` apart with default settings.
    pub fn new(separation: f64) -> Self {
        Self {
            separation,
            ..Self::default()
        }
    }

    pub fn with_wavelength(mut self, wavelength: f64) -> Self {
        self.wavelength = wavelength;
        self
    }

    pub fn with_min_source_clearance(mut self, clearance: f64) -> Self {
        self.min_source_clearance = clearance;
        self
    }

    pub fn with_min_lens_gap(mut self, gap: f64) -> Self {
        self.min_lens_gap = gap;
        self
    }

    pub fn with_margin_clearance(mut self, margin: f64) -> Self {
        self.margin_clearance = margin;
        self
    }

    pub fn with_restarts(mut self, restarts: usize) -> Self {
        self.restarts = restarts;
        self
    }

    pub fn with_samples(mut self, samples: usize) -> Self {
        self.samples = samples;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the base seed for the trial starting points.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_both_orderings(mut self, both_orderings: bool) -> Self {
        self.both_orderings = both_orderings;
        self
    }

    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget_secs = Some(budget.as_secs_f64());
        self
    }

    /// The time budget, if one is set.
    pub fn time_budget(&self) -> Option<Duration> {
        self.time_budget_secs
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }

    /// Check the geometry and the lens catalog before any trial runs.
    ///
    /// # Errors
    ///
    /// * `CouplingError::InvalidSearchBounds` for contradictory geometry, a
    ///   bad sampling, solver or time budget setting, or fewer than two
    ///   distinct lenses
    /// * `CouplingError::InvalidLens` for a zero, negative or non-finite focal length
    pub fn validate(&self, catalog: &[f64]) -> Result<()> {
        let bad = |msg: String| Err(CouplingError::InvalidSearchBounds(msg));

        if !self.wavelength.is_finite() || self.wavelength <= 0.0 {
            return bad(format!("wavelength must be positive, got {}", self.wavelength));
        }
        if !self.separation.is_finite() || self.separation <= 0.0 {
            return bad(format!("separation must be positive, got {}", self.separation));
        }
        if !self.min_source_clearance.is_finite() || self.min_source_clearance < 0.0 {
            return bad(format!(
                "source clearance must be non-negative, got {}",
                self.min_source_clearance
            ));
        }
        if self.min_source_clearance >= self.separation {
            return bad(format!(
                "source clearance {} leaves no room before the target fiber at {}",
                self.min_source_clearance, self.separation
            ));
        }
        if !self.min_lens_gap.is_finite() || self.min_lens_gap <= 0.0 {
            return bad(format!("lens gap must be positive, got {}", self.min_lens_gap));
        }
        if self.min_lens_gap >= self.separation / 2.0 {
            return bad(format!(
                "lens gap {} is not below half the separation {}",
                self.min_lens_gap, self.separation
            ));
        }
        if !self.margin_clearance.is_finite() || self.margin_clearance <= 0.0 {
            return bad(format!(
                "margin clearance must be positive, got {}",
                self.margin_clearance
            ));
        }
        if self.restarts == 0 {
            return bad("at least one restart per lens pair is required".to_string());
        }
        if self.samples < 2 {
            return bad(format!("at least two samples required, got {}", self.samples));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return bad(format!("tolerance must be non-negative, got {}", self.tolerance));
        }
        if let Some(secs) = self.time_budget_secs {
            if Duration::try_from_secs_f64(secs).is_err() {
                return bad(format!("time budget must be a non-negative duration, got {} s", secs));
            }
        }

        if let Some(&f) = catalog.iter().find(|f| !f.is_finite() || **f <= 0.0) {
            return Err(CouplingError::InvalidLens(f));
        }
        for (i, a) in catalog.iter().enumerate() {
            if catalog[..i].contains(a) {
                return bad(format!("focal length {} appears twice in the catalog", a));
            }
        }
        if catalog.len() < 2 {
            return bad(format!(
                "a lens pair needs at least two catalog entries, got {}",
                catalog.len()
            ));
        }

        Ok(())
    }

    /// Local minimizer settings derived from the tolerance and iteration budget.
    pub fn lm_config(&self) -> LmConfig {
        LmConfig {
            max_iterations: self.max_iterations,
            ftol: self.tolerance,
            xtol: self.tolerance,
            gtol: 0.0,
            ..LmConfig::default()
        }
    }

    /// Box for the first lens position, `[dmin, d3]`.
    pub fn d1_bounds(&self) -> Result<Bounds> {
        Bounds::new(self.min_source_clearance, self.separation).map_err(|e| {
            CouplingError::InvalidSearchBounds(format!("first lens position: {}", e))
        })
    }

    /// Box for the lens spacing, `[minLensGap, d3 / 2]`.
    pub fn d2_bounds(&self) -> Result<Bounds> {
        Bounds::new(self.min_lens_gap, self.separation / 2.0)
            .map_err(|e| CouplingError::InvalidSearchBounds(format!("lens spacing: {}", e)))
    }

    /// Longest telescope `d1 + d2` that still counts as feasible.
    pub fn max_telescope_length(&self) -> f64 {
        self.separation - self.margin_clearance
    }

    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Serialize the configuration as pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
