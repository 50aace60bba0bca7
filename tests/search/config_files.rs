//! Loading search configurations from JSON files.

use fibercouple_rs::search::SearchConfig;
use fibercouple_rs::CouplingError;
use std::fs;
use std::path::PathBuf;

fn scratch_file(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("fibercouple-{}-{}.json", std::process::id(), name))
}

#[test]
fn test_load_from_file() {
    let path = scratch_file("search");
    fs::write(
        &path,
        r#"{
            "separation": 0.85,
            "min_source_clearance": 0.6,
            "restarts": 34,
            "parallel": true,
            "time_budget_secs": 30.0
        }"#,
    )
    .unwrap();

    let config = SearchConfig::from_json_file(&path).unwrap();
    fs::remove_file(&path).unwrap();

    assert_eq!(config.separation, 0.85);
    assert_eq!(config.min_source_clearance, 0.6);
    assert_eq!(config.restarts, 34);
    assert!(config.parallel);
    assert_eq!(config.time_budget().unwrap().as_secs(), 30);
    assert_eq!(config.margin_clearance, 0.05);
    assert!(config.validate(&[0.035, 0.04, 0.05]).is_ok());
}

#[test]
fn test_round_trip_through_file() {
    let path = scratch_file("round-trip");
    let config = SearchConfig::new(1.2).with_seed(99).with_both_orderings(true);
    fs::write(&path, config.to_json_string().unwrap()).unwrap();

    let loaded = SearchConfig::from_json_file(&path).unwrap();
    fs::remove_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_missing_file() {
    let result = SearchConfig::from_json_file(scratch_file("does-not-exist"));
    assert!(matches!(result, Err(CouplingError::IoError(_))));
}
