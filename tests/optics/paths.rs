//! Optical path builder and beam profile tracing.

use approx::assert_relative_eq;
use fibercouple_rs::optics::{
    free_space, propagate, thin_lens, trace_profile, ComplexBeamParameter, Element, OpticalPath,
};

use crate::test_helpers::WAVELENGTH;

#[test]
fn test_path_matches_stepwise_propagation() {
    let q = ComplexBeamParameter::new(-0.45, 0.9).unwrap();
    let path = OpticalPath::telescope(0.65, 0.04, 0.1, 0.05)
        .unwrap()
        .gap(0.1);

    let mut stepwise = q;
    for m in [
        free_space(0.65),
        thin_lens(0.04).unwrap(),
        free_space(0.1),
        thin_lens(0.05).unwrap(),
        free_space(0.1),
    ] {
        stepwise = propagate(stepwise, &m).unwrap();
    }

    let out = path.propagate(q).unwrap();
    assert_relative_eq!(out.re(), stepwise.re(), epsilon = 1e-12, max_relative = 1e-9);
    assert_relative_eq!(out.im(), stepwise.im(), epsilon = 1e-12, max_relative = 1e-9);
    assert_relative_eq!(path.total_length(), 0.85, epsilon = 1e-12);
}

#[test]
fn test_path_serializes() {
    let path = OpticalPath::telescope(0.65, 0.04, 0.1, 0.05).unwrap();
    let json = serde_json::to_string(&path).unwrap();
    let back: OpticalPath = serde_json::from_str(&json).unwrap();

    assert_eq!(back, path);
    assert_eq!(back.elements()[1], Element::ThinLens(0.04));
}

#[test]
fn test_profile_through_telescope() {
    let q = ComplexBeamParameter::new(-0.45, 0.9).unwrap();
    let path = OpticalPath::telescope(0.65, 0.04, 0.1, 0.05)
        .unwrap()
        .gap(0.1);
    let segments = trace_profile(q, &path, 50, WAVELENGTH).unwrap();

    assert_eq!(segments.len(), 3);
    for segment in &segments {
        assert_eq!(segment.positions.len(), 50);
        assert!(segment.widths.iter().all(|w| w.is_finite() && *w > 0.0));
        assert!(segment
            .positions
            .windows(2)
            .all(|pair| pair[1] > pair[0]));
    }

    let end = path.propagate(q).unwrap().beam_size(WAVELENGTH).unwrap();
    assert_relative_eq!(*segments[2].widths.last().unwrap(), end, max_relative = 1e-9);
}
