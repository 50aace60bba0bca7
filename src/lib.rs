//! # fibercouple-rs
//!
//! `fibercouple-rs` designs two-lens telescopes that couple a Gaussian beam
//! from one single-mode fiber into another.
//!
//! The library provides:
//! - ABCD propagation of complex beam parameters through gaps and thin lenses
//! - A Levenberg-Marquardt fit of measured beam widths to the Gaussian
//!   beam-width law, with parameter covariance
//! - A mode-mismatch objective comparing the delivered beam with the beam the
//!   target fiber needs
//! - A seeded, optionally parallel multi-start search over a lens catalog
//!
//! ## Basic Usage
//!
//! ```no_run
//! use fibercouple_rs::models::{fit_endpoints, FitConfig, WidthSamples};
//! use fibercouple_rs::search::{SearchConfig, TelescopeSearch};
//! use ndarray::array;
//!
//! let distance = array![0.005, 0.32, 0.67, 1.225, 1.76];
//! let source = WidthSamples::new(
//!     distance.clone(),
//!     array![1730.45, 1456.0, 1389.4, 1580.9, 1856.0] * 1e-6,
//! );
//! let target = WidthSamples::new(
//!     distance,
//!     array![1729.4, 1477.3, 1450.95, 1702.05, 1851.45] * 1e-6,
//! );
//!
//! let (fit_a, fit_b) = fit_endpoints(&source, &target, &FitConfig::default()).unwrap();
//! let config = SearchConfig::new(0.85).with_min_source_clearance(0.6);
//! let search = TelescopeSearch::from_fits(&fit_a, &fit_b, vec![0.035, 0.04, 0.05], config).unwrap();
//!
//! let best = search.run().unwrap();
//! println!("{}", best);
//! ```

// Public modules
pub mod error;
pub mod lm;
pub mod mismatch;
pub mod models;
pub mod optics;
pub mod parameters;
pub mod problem;
pub mod search;

mod uncertainty;
mod utils;

// Re-exports for convenience
pub use error::{CouplingError, Result};
pub use lm::{LevenbergMarquardt, LmConfig, LmResult};
pub use mismatch::{CandidateConfig, CouplingProfile, MismatchObjective};
pub use models::{fit_beam_width, FitConfig, FitResult};
pub use optics::{ComplexBeamParameter, OpticalPath, TransferMatrix};
pub use problem::Problem;
pub use search::{SearchConfig, SearchResult, TelescopeSearch};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
