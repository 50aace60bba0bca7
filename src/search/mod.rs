//! # Telescope Search
//!
//! Randomized multi-start search over a lens catalog. Each (lens pair,
//! restart) combination is an independent trial with its own seeded starting
//! point; the best feasible result is collected in a [`BestTracker`].

pub mod config;
pub mod telescope;
pub mod tracker;
pub mod trial;

pub use config::SearchConfig;
pub use telescope::{SearchResult, SearchStats, TelescopeSearch};
pub use tracker::{BestTracker, TrialCounts};
pub use trial::{lens_pairs, run_trial, trial_plan, ScoredConfig, TrialOutcome, PlannedTrial};
