//! Fits of the Gaussian beam-width law to synthetic and measured data.

use approx::assert_relative_eq;
use fibercouple_rs::lm::LmConfig;
use fibercouple_rs::models::{fit_beam_width, fit_endpoints, FitConfig};
use fibercouple_rs::optics::{free_space, propagate};
use fibercouple_rs::CouplingError;
use ndarray::{array, Array1};
use std::f64::consts::PI;

use crate::test_helpers::{
    array_approx_eq, measured_source, measured_target, noisy_widths, synthetic_widths, WAVELENGTH,
};

#[test]
fn test_round_trip_through_beam_size() {
    // Waist width consistent with the Rayleigh range at this wavelength
    let rayleigh_range = 0.9;
    let min_width = (WAVELENGTH * rayleigh_range / PI).sqrt();
    let distance = Array1::linspace(0.0, 2.0, 9);
    let width = synthetic_widths(&distance, min_width, 0.7, rayleigh_range);

    let fit = fit_beam_width(&distance, &width, &FitConfig::default()).unwrap();

    let rebuilt: Array1<f64> = distance.mapv(|z| {
        propagate(fit.q, &free_space(z))
            .unwrap()
            .beam_size(WAVELENGTH)
            .unwrap()
    });
    assert!(array_approx_eq(&rebuilt, &width, 1e-9));
}

#[test]
fn test_diverging_beam_scenario() {
    let distance = array![0.0, 0.5, 1.0];
    let width = array![1000e-6, 1200e-6, 1800e-6];

    let fit = fit_beam_width(&distance, &width, &FitConfig::default()).unwrap();

    assert!(fit.min_width.is_finite() && fit.min_width > 0.0);
    assert!(fit.waist_position.is_finite());
    assert!(fit.rayleigh_range.is_finite() && fit.rayleigh_range > 0.0);
    // Three samples, three parameters: the law passes through every point
    for (z, w) in distance.iter().zip(width.iter()) {
        assert_relative_eq!(fit.width_at(*z), *w, max_relative = 1e-6);
    }
    assert_relative_eq!(fit.waist_position, 0.48 / 5.44, max_relative = 1e-6);
}

#[test]
fn test_noisy_data() {
    let distance = Array1::linspace(0.0, 2.0, 15);
    let width = noisy_widths(&distance, 1.4e-3, 0.8, 1.2, 5e-6, 42);

    let fit = fit_beam_width(&distance, &width, &FitConfig::default()).unwrap();

    assert_relative_eq!(fit.min_width, 1.4e-3, max_relative = 0.02);
    assert!((fit.waist_position - 0.8).abs() < 0.1);
    assert_relative_eq!(fit.rayleigh_range, 1.2, max_relative = 0.15);

    assert!(fit
        .standard_errors
        .iter()
        .all(|e| e.is_finite() && *e > 0.0));
    for i in 0..3 {
        for j in 0..3 {
            assert_relative_eq!(
                fit.covariance[[i, j]],
                fit.covariance[[j, i]],
                max_relative = 1e-9
            );
        }
    }
}

#[test]
fn test_measured_endpoints() {
    let source = measured_source();
    let target = measured_target();
    let (fit_a, fit_b) = fit_endpoints(&source, &target, &FitConfig::default()).unwrap();

    for (fit, samples) in [(&fit_a, &source), (&fit_b, &target)] {
        let narrowest = samples.width.iter().cloned().fold(f64::INFINITY, f64::min);
        assert!(fit.min_width > 0.0 && fit.min_width <= narrowest * 1.05);
        assert!(fit.waist_position > 0.0 && fit.waist_position < 1.76);
        assert!(fit.q.im() > 0.0);
        assert_relative_eq!(fit.q.re(), -fit.waist_position);
        assert!(fit.covariance.iter().all(|v| v.is_finite()));
        assert!(fit.residual_sum_of_squares < 1e-7);
    }
}

#[test]
fn test_invalid_samples() {
    let err = fit_beam_width(&array![0.0, 1.0, 2.0], &array![1e-3, 1e-3], &FitConfig::default());
    assert!(matches!(err, Err(CouplingError::DimensionMismatch(_))));

    let err = fit_beam_width(&array![0.0, 1.0], &array![1e-3, 1e-3], &FitConfig::default());
    assert!(matches!(err, Err(CouplingError::InvalidInput(_))));
}

#[test]
fn test_exhausted_budget_is_divergence() {
    let source = measured_source();
    let config = FitConfig::default()
        .with_lm(LmConfig {
            max_iterations: 1,
            ..LmConfig::default()
        })
        .with_initial_guess([5e-3, -3.0, 0.05]);

    assert!(matches!(
        source.fit(&config),
        Err(CouplingError::FitDivergence(_))
    ));
}

#[test]
fn test_stalled_damping_schedule_is_rejected() {
    let config = FitConfig::default()
        .with_lm(LmConfig {
            initial_lambda: 0.0,
            ..LmConfig::default()
        })
        .with_initial_guess([5e-3, -3.0, 0.05]);

    assert!(matches!(
        measured_source().fit(&config),
        Err(CouplingError::InvalidInput(_))
    ));
}
