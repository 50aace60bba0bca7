//! Mode-mismatch objective properties.

use approx::assert_relative_eq;
use fibercouple_rs::mismatch::{CandidateConfig, MismatchObjective};
use fibercouple_rs::models::FitConfig;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::test_helpers::{matched_target, measured_source, measured_target, source_beam, CATALOG, WAVELENGTH};

const SEPARATION: f64 = 0.85;

fn design() -> CandidateConfig {
    CandidateConfig::new(0.04, 0.05, 0.65, 0.1)
}

#[test]
fn test_ideal_configuration_has_zero_mismatch() {
    let source = source_beam();
    let target = matched_target(source, &design(), SEPARATION);
    let objective = MismatchObjective::new(source, target, SEPARATION, WAVELENGTH).unwrap();

    assert!(objective.evaluate(&design()).unwrap() < 1e-24);
    assert_relative_eq!(
        objective.coupling_efficiency(&design()).unwrap(),
        1.0,
        epsilon = 1e-9
    );
}

#[test]
fn test_mismatch_is_non_negative() {
    let source = measured_source().fit(&FitConfig::default()).unwrap();
    let target = measured_target().fit(&FitConfig::default()).unwrap();
    let objective = MismatchObjective::new(source.q, target.q, SEPARATION, WAVELENGTH)
        .unwrap()
        .with_samples(25)
        .unwrap();

    let mut rng = ChaCha8Rng::seed_from_u64(9);
    for _ in 0..200 {
        let f1 = CATALOG[rng.gen_range(0..CATALOG.len())];
        let f2 = CATALOG[rng.gen_range(0..CATALOG.len())];
        let config = CandidateConfig::new(f1, f2, rng.gen_range(0.0..0.85), rng.gen_range(0.01..0.425));

        let mse = objective.evaluate(&config).unwrap();
        assert!(mse >= 0.0 && mse.is_finite());

        let eta = objective.coupling_efficiency(&config).unwrap();
        assert!(eta > 0.0 && eta <= 1.0 + 1e-12);
    }
}

#[test]
fn test_mismatch_grows_away_from_design() {
    let source = source_beam();
    let target = matched_target(source, &design(), SEPARATION);
    let objective = MismatchObjective::new(source, target, SEPARATION, WAVELENGTH).unwrap();

    let near = objective
        .evaluate(&CandidateConfig { d1: 0.651, ..design() })
        .unwrap();
    let far = objective
        .evaluate(&CandidateConfig { d1: 0.66, ..design() })
        .unwrap();
    assert!(near > 0.0);
    assert!(far > near);
}

#[test]
fn test_profiles_for_plotting() {
    let source = source_beam();
    let target = matched_target(source, &design(), SEPARATION);
    let objective = MismatchObjective::new(source, target, SEPARATION, WAVELENGTH)
        .unwrap()
        .with_samples(40)
        .unwrap();

    let profile = objective.profiles(&design()).unwrap();

    assert_eq!(profile.segments.len(), 3);
    assert_relative_eq!(profile.segments[1].start, 0.65, epsilon = 1e-12);
    assert_relative_eq!(profile.ideal.start, 0.75, epsilon = 1e-12);
    assert_eq!(profile.ideal.widths.len(), 40);
    assert!(profile.mse < 1e-24);
    assert_relative_eq!(profile.coupling_efficiency, 1.0, epsilon = 1e-9);

    let json = serde_json::to_string(&profile).unwrap();
    assert!(json.contains("\"segments\""));
}
