//! End-to-end telescope searches.

use fibercouple_rs::mismatch::CandidateConfig;
use fibercouple_rs::models::{fit_endpoints, FitConfig};
use fibercouple_rs::search::{SearchConfig, SearchResult, TelescopeSearch};
use fibercouple_rs::{CouplingError, Result};

use crate::test_helpers::{matched_target, measured_source, measured_target, source_beam, CATALOG};

const SEPARATION: f64 = 0.85;

fn base_config() -> SearchConfig {
    SearchConfig::new(SEPARATION).with_min_source_clearance(0.6)
}

/// Search whose target is perfectly matched by f1 = 0.04, f2 = 0.05,
/// d1 = 0.65, d2 = 0.1 (among other placements).
fn matched_search(config: SearchConfig) -> TelescopeSearch {
    let source = source_beam();
    let target = matched_target(source, &CandidateConfig::new(0.04, 0.05, 0.65, 0.1), SEPARATION);
    TelescopeSearch::new(source, target, CATALOG.to_vec(), config).unwrap()
}

/// The parts of a result that do not depend on timing.
fn outcome(result: &Result<SearchResult>) -> Option<(CandidateConfig, f64, usize)> {
    match result {
        Ok(r) => Some((r.config, r.mse, r.trial_index)),
        Err(CouplingError::NoFeasibleConfiguration { .. }) => None,
        Err(e) => panic!("unexpected search error: {}", e),
    }
}

#[test]
fn test_measured_fibers_scenario() {
    let (fit_a, fit_b) =
        fit_endpoints(&measured_source(), &measured_target(), &FitConfig::default()).unwrap();
    let config = base_config().with_restarts(34).with_samples(50);
    let search = TelescopeSearch::from_fits(&fit_a, &fit_b, CATALOG.to_vec(), config).unwrap();
    assert!(search.trials().len() >= 100);

    match search.run() {
        Ok(result) => {
            assert!(result.mse >= 0.0);
            assert!(result.config.d1 + result.config.d2 <= SEPARATION - 0.05 + 1e-12);
            assert!(result.config.d1 >= 0.6);
            assert!(result.config.d2 >= 0.01);
            assert!(result.stats.counts.feasible >= 1);
            assert_eq!(result.stats.counts.run, 102);
        }
        Err(CouplingError::NoFeasibleConfiguration { trials }) => assert_eq!(trials, 102),
        Err(e) => panic!("unexpected search error: {}", e),
    }
}

#[test]
fn test_source_clearance_past_target_fails_fast() {
    let source = source_beam();
    let config = base_config().with_min_source_clearance(0.9);
    let err = TelescopeSearch::new(source, source, CATALOG.to_vec(), config);
    assert!(matches!(err, Err(CouplingError::InvalidSearchBounds(_))));
}

#[test]
fn test_zero_focal_length_in_catalog() {
    let source = source_beam();
    let err = TelescopeSearch::new(source, source, vec![0.04, 0.0], base_config());
    assert!(matches!(err, Err(CouplingError::InvalidLens(_))));
}

#[test]
fn test_finds_matched_telescope() {
    let search = matched_search(base_config().with_restarts(30).with_samples(50).with_seed(11));
    let result = search.run().unwrap();

    // Every lens pair has an exact solution somewhere; only feasible ones count
    assert!(result.mse < 1e-18);
    assert!(result.config.d1 + result.config.d2 <= SEPARATION - 0.05);
    assert!(result.config.d1 >= 0.6);
    assert!(result.config.d2 >= 0.01);
    assert!(result.stats.counts.feasible >= 1);

    let efficiency = search
        .objective()
        .coupling_efficiency(&result.config)
        .unwrap();
    assert!(efficiency > 0.999);
}

#[test]
fn test_same_seed_same_result() {
    let config = base_config().with_restarts(8).with_samples(30).with_seed(5);
    let first = matched_search(config.clone()).run();
    let second = matched_search(config).run();

    assert_eq!(outcome(&first), outcome(&second));
}

#[test]
fn test_parallel_matches_sequential() {
    let config = base_config().with_restarts(8).with_samples(30).with_seed(5);
    let sequential = matched_search(config.clone()).run();
    let parallel = matched_search(config.with_parallel(true)).run();

    assert_eq!(outcome(&sequential), outcome(&parallel));
    if let (Ok(a), Ok(b)) = (&sequential, &parallel) {
        assert_eq!(a.stats.counts, b.stats.counts);
    }
}

#[test]
fn test_both_orderings_doubles_the_plan() {
    let one_way = matched_search(base_config().with_restarts(2));
    let both = matched_search(base_config().with_restarts(2).with_both_orderings(true));

    assert_eq!(one_way.trials().len(), 6);
    assert_eq!(both.trials().len(), 12);
    let swapped = &both.trials()[6];
    assert_eq!((swapped.f1, swapped.f2), (0.04, 0.035));
}

#[test]
fn test_failed_trials_do_not_abort_the_search() {
    let config = base_config()
        .with_restarts(5)
        .with_samples(30)
        .with_max_iterations(1)
        .with_tolerance(0.0);

    for parallel in [false, true] {
        let search = matched_search(config.clone().with_parallel(parallel));
        match search.run() {
            Err(CouplingError::NoFeasibleConfiguration { trials }) => assert_eq!(trials, 15),
            other => panic!("expected no feasible configuration, got {:?}", other),
        }
    }
}
