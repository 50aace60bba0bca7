//! Algebraic properties of the transfer matrices.

use approx::assert_relative_eq;
use fibercouple_rs::optics::{
    beam_size, compose, free_space, propagate, thin_lens, ComplexBeamParameter, TransferMatrix,
};
use fibercouple_rs::CouplingError;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::test_helpers::WAVELENGTH;

#[test]
fn test_elements_are_unimodular() {
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    for _ in 0..200 {
        let length: f64 = rng.gen_range(0.0..5.0);
        let focal: f64 = rng.gen_range(0.01..1.0) * if rng.gen::<bool>() { 1.0 } else { -1.0 };

        assert_relative_eq!(free_space(length).determinant(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(thin_lens(focal).unwrap().determinant(), 1.0, epsilon = 1e-12);
    }
}

#[test]
fn test_composition_is_unimodular() {
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    for _ in 0..50 {
        let elements: Vec<TransferMatrix> = (0..6)
            .map(|i| {
                if i % 2 == 0 {
                    free_space(rng.gen_range(0.0..1.0))
                } else {
                    thin_lens(rng.gen_range(0.1..1.0)).unwrap()
                }
            })
            .collect();

        assert_relative_eq!(compose(&elements).determinant(), 1.0, epsilon = 1e-6);
    }
}

#[test]
fn test_identity_propagation() {
    let q = ComplexBeamParameter::new(-0.3, 0.75).unwrap();

    assert_eq!(propagate(q, &free_space(0.0)).unwrap(), q);
    assert_eq!(propagate(q, &TransferMatrix::identity()).unwrap(), q);

    // A lens followed by its inverse power is the identity
    let back_to_back = compose([&thin_lens(0.05).unwrap(), &thin_lens(-0.05).unwrap()]);
    let out = propagate(q, &back_to_back).unwrap();
    assert_relative_eq!(out.re(), q.re(), epsilon = 1e-12);
    assert_relative_eq!(out.im(), q.im(), epsilon = 1e-12);
}

#[test]
fn test_free_space_additivity() {
    let q = ComplexBeamParameter::new(-0.45, 0.9).unwrap();
    for a in [0.0, 0.1, 0.37, 1.0, 2.5] {
        for b in [0.0, 0.05, 0.6, 1.9] {
            let stepwise = propagate(propagate(q, &free_space(a)).unwrap(), &free_space(b)).unwrap();
            let direct = propagate(q, &free_space(a + b)).unwrap();
            assert_relative_eq!(stepwise.re(), direct.re(), epsilon = 1e-12);
            assert_relative_eq!(stepwise.im(), direct.im(), epsilon = 1e-12);
        }
    }
}

#[test]
fn test_composition_order_matters() {
    let q = ComplexBeamParameter::new(-0.45, 0.9).unwrap();
    let gap = free_space(0.3);
    let lens = thin_lens(0.04).unwrap();

    let gap_then_lens = propagate(q, &compose([&gap, &lens])).unwrap();
    let stepwise = propagate(propagate(q, &gap).unwrap(), &lens).unwrap();
    assert_relative_eq!(gap_then_lens.re(), stepwise.re(), epsilon = 1e-12);
    assert_relative_eq!(gap_then_lens.im(), stepwise.im(), epsilon = 1e-12);

    let lens_then_gap = propagate(q, &compose([&lens, &gap])).unwrap();
    assert!((lens_then_gap.re() - gap_then_lens.re()).abs() > 1e-3);
}

#[test]
fn test_beam_size_grows_away_from_waist() {
    let waist = ComplexBeamParameter::from_waist(0.0, 0.9).unwrap();
    let w0 = waist.beam_size(WAVELENGTH).unwrap();
    let zr = waist.rayleigh_range();

    let at_zr = propagate(waist, &free_space(zr)).unwrap();
    assert_relative_eq!(
        at_zr.beam_size(WAVELENGTH).unwrap(),
        w0 * 2.0_f64.sqrt(),
        max_relative = 1e-12
    );
}

#[test]
fn test_wrong_sign_convention_is_reported() {
    let q = ComplexBeamParameter::new(0.2, 0.9).unwrap();
    assert!(matches!(
        beam_size(q.value().conj(), WAVELENGTH),
        Err(CouplingError::NonPhysicalBeam(_))
    ));
    assert!(matches!(thin_lens(0.0), Err(CouplingError::InvalidLens(_))));
}
