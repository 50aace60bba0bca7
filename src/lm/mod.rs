//! Levenberg-Marquardt algorithm implementation.
//!
//! This module provides the nonlinear least-squares solver shared by the
//! beam-width fit and the telescope search.

pub mod algorithm;
pub mod config;

// Re-export key types
pub use algorithm::{LevenbergMarquardt, LmResult};
pub use config::LmConfig;
