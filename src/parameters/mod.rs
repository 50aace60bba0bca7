//! # Parameter Bounds
//!
//! Box constraints for optimization variables. The telescope search keeps the
//! lens placements inside their mechanical limits by optimizing through
//! [`BoundedProblem`], which applies a [`BoundsTransform`] per variable.

pub mod bounded;
pub mod bounds;

pub use bounded::BoundedProblem;
pub use bounds::{Bounds, BoundsError, BoundsTransform};
