//! # Gaussian Beam Optics
//!
//! Complex beam parameters, ABCD transfer matrices and optical paths.
//!
//! A beam is carried between planes as a [`ComplexBeamParameter`]; elements
//! act on it through the bilinear transform `q' = (A q + B) / (C q + D)`.
//! [`OpticalPath`] lists elements in the order light meets them and takes
//! care of the right-to-left matrix product.

pub mod abcd;
pub mod beam;
pub mod path;

pub use abcd::{beam_size, compose, free_space, propagate, thin_lens, TransferMatrix};
pub use beam::ComplexBeamParameter;
pub use path::{trace_profile, Element, OpticalPath, SegmentProfile};
