//! Trial descriptors and the local minimization each trial runs.

use ndarray::Array1;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

use super::config::SearchConfig;
use crate::error::Result;
use crate::lm::LevenbergMarquardt;
use crate::mismatch::{CandidateConfig, MismatchObjective};
use crate::parameters::{BoundedProblem, Bounds};

/// One (lens pair, restart) combination of the search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannedTrial {
    /// Position in the trial plan; lower wins ties
    pub index: usize,
    /// Position of the lens pair in the pair list
    pub pair: usize,
    /// Restart number within the pair
    pub restart: usize,
    /// First lens the beam meets
    pub f1: f64,
    /// Second lens the beam meets
    pub f2: f64,
    /// Seed of this trial's starting point
    pub seed: u64,
}

/// Lens pairs `(catalog[i], catalog[j])` for `i < j`, optionally followed by
/// each pair swapped.
pub fn lens_pairs(catalog: &[f64], both_orderings: bool) -> Vec<(f64, f64)> {
    let mut pairs = Vec::new();
    for i in 0..catalog.len() {
        for j in (i + 1)..catalog.len() {
            pairs.push((catalog[i], catalog[j]));
        }
    }
    if both_orderings {
        let swapped: Vec<_> = pairs.iter().map(|&(a, b)| (b, a)).collect();
        pairs.extend(swapped);
    }
    pairs
}

/// Every trial of a search, in plan order.
pub fn trial_plan(catalog: &[f64], config: &SearchConfig) -> Vec<PlannedTrial> {
    lens_pairs(catalog, config.both_orderings)
        .into_iter()
        .enumerate()
        .flat_map(|(pair, (f1, f2))| {
            (0..config.restarts).map(move |restart| (pair, restart, f1, f2))
        })
        .enumerate()
        .map(|(index, (pair, restart, f1, f2))| PlannedTrial {
            index,
            pair,
            restart,
            f1,
            f2,
            seed: config.seed.wrapping_add(index as u64),
        })
        .collect()
}

/// Draw a point uniformly inside the given box.
pub fn random_point(bounds: &[Bounds], rng: &mut impl Rng) -> Array1<f64> {
    bounds.iter().map(|b| rng.gen_range(b.min..b.max)).collect()
}

/// A candidate together with its mismatch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredConfig {
    /// Trial that produced the candidate
    pub index: usize,
    pub config: CandidateConfig,
    pub mse: f64,
}

/// What a single trial ended with.
#[derive(Debug, Clone, PartialEq)]
pub enum TrialOutcome {
    /// Converged inside the clearance limits
    Feasible(ScoredConfig),
    /// Converged, but the lenses leave too little room before the target
    Rejected(ScoredConfig),
    /// Did not produce a usable minimum
    Failed { index: usize, reason: String },
}

impl TrialOutcome {
    pub fn index(&self) -> usize {
        match self {
            TrialOutcome::Feasible(scored) | TrialOutcome::Rejected(scored) => scored.index,
            TrialOutcome::Failed { index, .. } => *index,
        }
    }

    pub fn is_feasible(&self) -> bool {
        matches!(self, TrialOutcome::Feasible(_))
    }
}

/// Run one trial: a bounded local minimization from a seeded random start.
///
/// Trial-local failures become [`TrialOutcome::Failed`]; only structural
/// errors are returned as `Err`.
pub fn run_trial(
    objective: &MismatchObjective,
    planned: &PlannedTrial,
    config: &SearchConfig,
) -> Result<TrialOutcome> {
    let bounds = [config.d1_bounds()?, config.d2_bounds()?];
    let placement = objective.placement_problem(planned.f1, planned.f2);
    let bounded = BoundedProblem::new(&placement, &bounds)?;

    let mut rng = StdRng::seed_from_u64(planned.seed);
    let start = random_point(&bounds, &mut rng);
    let initial = bounded.to_internal(&start)?;

    let solver = LevenbergMarquardt::with_config(config.lm_config());
    let result = match solver.minimize(&bounded, initial) {
        Ok(result) => result,
        Err(e) if e.is_trial_local() => {
            return Ok(failed(planned, e.to_string()));
        }
        Err(e) => return Err(e),
    };

    if !result.success {
        return Ok(failed(planned, result.message));
    }
    if !result.cost.is_finite() {
        return Ok(failed(planned, "non-finite mismatch".to_string()));
    }

    let placement_params = bounded.to_external(&result.params);
    let scored = ScoredConfig {
        index: planned.index,
        config: placement.candidate(&placement_params),
        mse: result.cost,
    };

    let length = scored.config.d1 + scored.config.d2;
    let outcome = if length <= config.max_telescope_length() {
        TrialOutcome::Feasible(scored)
    } else {
        TrialOutcome::Rejected(scored)
    };
    trace!(
        index = planned.index,
        d1 = scored.config.d1,
        d2 = scored.config.d2,
        mse = scored.mse,
        feasible = outcome.is_feasible(),
        "trial finished"
    );
    Ok(outcome)
}

fn failed(planned: &PlannedTrial, reason: String) -> TrialOutcome {
    trace!(index = planned.index, f1 = planned.f1, f2 = planned.f2, %reason, "trial failed");
    TrialOutcome::Failed {
        index: planned.index,
        reason,
    }
}
