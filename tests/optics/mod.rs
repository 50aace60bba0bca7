//! Tests for ABCD propagation and optical paths.

mod abcd_properties;
mod paths;
