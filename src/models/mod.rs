//! Models fitted to measured beam data.
//!
//! The Gaussian beam-width law is fitted once per fiber endpoint to obtain
//! the complex beam parameter that the telescope search starts from.

mod gaussian_beam;

pub use gaussian_beam::{
    beam_width_law, fit_beam_width, fit_endpoints, BeamWidthProblem, FitConfig, FitResult,
    WidthSamples,
};
