//! Multi-start search over lens pairs and placements.

use rayon::prelude::*;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::config::SearchConfig;
use super::tracker::{BestTracker, TrialCounts};
use super::trial::{run_trial, trial_plan, PlannedTrial};
use crate::error::{CouplingError, Result};
use crate::mismatch::{CandidateConfig, CouplingProfile, MismatchObjective};
use crate::models::FitResult;
use crate::optics::ComplexBeamParameter;

/// Bookkeeping for one search run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchStats {
    /// Trials in the plan
    pub planned: usize,
    /// Outcome counters
    pub counts: TrialCounts,
    /// Whether the time budget stopped the search before the plan was done
    pub stopped_early: bool,
    /// Wall-clock time of the run
    pub elapsed: Duration,
}

/// Best feasible telescope found by a search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// Lens pair and placement
    pub config: CandidateConfig,
    /// Mean squared width error of `config`
    pub mse: f64,
    /// Trial that found `config`
    pub trial_index: usize,
    pub stats: SearchStats,
}

impl fmt::Display for SearchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Telescope Search Result:")?;
        writeln!(f, "  f1: {:.4} m", self.config.f1)?;
        writeln!(f, "  f2: {:.4} m", self.config.f2)?;
        writeln!(f, "  d1: {:.6} m", self.config.d1)?;
        writeln!(f, "  d2: {:.6} m", self.config.d2)?;
        writeln!(f, "  MSE: {:.6e}", self.mse)?;
        writeln!(f, "  Found by trial: {}", self.trial_index)?;
        writeln!(
            f,
            "  Trials: {} of {} run ({} feasible, {} rejected, {} failed)",
            self.stats.counts.run,
            self.stats.planned,
            self.stats.counts.feasible,
            self.stats.counts.rejected,
            self.stats.counts.failed
        )?;
        if self.stats.stopped_early {
            writeln!(f, "  Stopped early by the time budget")?;
        }
        writeln!(f, "  Elapsed: {:.3} s", self.stats.elapsed.as_secs_f64())?;
        Ok(())
    }
}

/// Searches a lens catalog for the telescope that best couples two fibers.
///
/// Every lens pair is tried from `restarts` random placements; each trial
/// runs a bounded Levenberg-Marquardt minimization of the
/// [`MismatchObjective`] over `(d1, d2)`. Trials are independent and may run
/// on the rayon pool; results match a sequential run exactly.
///
/// ```no_run
/// use fibercouple_rs::optics::ComplexBeamParameter;
/// use fibercouple_rs::search::{SearchConfig, TelescopeSearch};
///
/// let source = ComplexBeamParameter::new(-0.45, 0.9).unwrap();
/// let target = ComplexBeamParameter::new(-0.5, 0.8).unwrap();
/// let config = SearchConfig::new(0.85).with_min_source_clearance(0.6);
///
/// let search = TelescopeSearch::new(source, target, vec![0.035, 0.04, 0.05], config).unwrap();
/// match search.run() {
///     Ok(result) => println!("{}", result),
///     Err(e) => eprintln!("{}", e),
/// }
/// ```
#[derive(Debug, Clone)]
pub struct TelescopeSearch {
    objective: MismatchObjective,
    catalog: Vec<f64>,
    config: SearchConfig,
}

impl TelescopeSearch {
    /// Create a search between beams `source` and `target`.
    ///
    /// # Errors
    ///
    /// * `CouplingError::InvalidSearchBounds` / `CouplingError::InvalidLens`
    ///   if the configuration or catalog fail [`SearchConfig::validate`]
    pub fn new(
        source: ComplexBeamParameter,
        target: ComplexBeamParameter,
        catalog: Vec<f64>,
        config: SearchConfig,
    ) -> Result<Self> {
        config.validate(&catalog)?;
        let objective = MismatchObjective::new(source, target, config.separation, config.wavelength)?
            .with_samples(config.samples)?;

        Ok(Self {
            objective,
            catalog,
            config,
        })
    }

    /// Create a search from the beam-width fits of both fibers.
    pub fn from_fits(
        source: &FitResult,
        target: &FitResult,
        catalog: Vec<f64>,
        config: SearchConfig,
    ) -> Result<Self> {
        Self::new(source.beam_parameter(), target.beam_parameter(), catalog, config)
    }

    pub fn objective(&self) -> &MismatchObjective {
        &self.objective
    }

    pub fn catalog(&self) -> &[f64] {
        &self.catalog
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// The trials this search runs, in plan order.
    pub fn trials(&self) -> Vec<PlannedTrial> {
        trial_plan(&self.catalog, &self.config)
    }

    /// Beam profiles of a candidate, for plotting.
    pub fn profiles(&self, candidate: &CandidateConfig) -> Result<CouplingProfile> {
        self.objective.profiles(candidate)
    }

    /// Run every trial and return the best feasible configuration.
    ///
    /// # Errors
    ///
    /// * `CouplingError::NoFeasibleConfiguration` if no trial converged inside
    ///   the clearance limits
    /// * structural errors raised by a trial; trial-local failures only mark
    ///   that trial as failed
    pub fn run(&self) -> Result<SearchResult> {
        let start = Instant::now();
        let trials = self.trials();
        let budget = self.config.time_budget();
        let out_of_time = || budget.is_some_and(|budget| start.elapsed() >= budget);

        info!(
            lenses = self.catalog.len(),
            trials = trials.len(),
            parallel = self.config.parallel,
            seed = self.config.seed,
            "starting telescope search"
        );

        let tracker = BestTracker::new();
        let run_one = |planned: &PlannedTrial| -> Result<()> {
            if out_of_time() {
                tracker.skip();
                return Ok(());
            }
            if planned.restart == 0 {
                debug!(pair = planned.pair, f1 = planned.f1, f2 = planned.f2, "searching lens pair");
            }
            let outcome = run_trial(&self.objective, planned, &self.config)?;
            if tracker.offer(&outcome) {
                debug!(index = planned.index, "new best configuration");
            }
            Ok(())
        };

        if self.config.parallel {
            trials.par_iter().try_for_each(run_one)?;
        } else {
            trials.iter().try_for_each(run_one)?;
        }

        let (best, counts) = tracker.into_parts();
        let stats = SearchStats {
            planned: trials.len(),
            counts,
            stopped_early: counts.skipped > 0,
            elapsed: start.elapsed(),
        };

        let best = match best {
            Some(best) => best,
            None => {
                info!(
                    trials = counts.run,
                    rejected = counts.rejected,
                    failed = counts.failed,
                    "no feasible configuration"
                );
                return Err(CouplingError::NoFeasibleConfiguration { trials: counts.run });
            }
        };

        info!(
            f1 = best.config.f1,
            f2 = best.config.f2,
            d1 = best.config.d1,
            d2 = best.config.d2,
            mse = best.mse,
            feasible = counts.feasible,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "telescope search finished"
        );

        Ok(SearchResult {
            config: best.config,
            mse: best.mse,
            trial_index: best.index,
            stats,
        })
    }
}
