//! Utility functions and helpers for the fibercouple-rs library.

pub mod finite_difference;
pub mod matrix_convert;
