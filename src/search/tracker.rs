//! Shared best-result accumulator.

use std::sync::{Mutex, MutexGuard, PoisonError};

use super::trial::{ScoredConfig, TrialOutcome};

/// Counters over the trials offered to a [`BestTracker`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrialCounts {
    /// Trials that ran to an outcome
    pub run: usize,
    /// Converged inside the clearance limits
    pub feasible: usize,
    /// Converged but too long for the separation
    pub rejected: usize,
    /// Local minimization failed
    pub failed: usize,
    /// Never started because the time budget ran out
    pub skipped: usize,
}

#[derive(Debug, Default)]
struct TrackerState {
    best: Option<ScoredConfig>,
    counts: TrialCounts,
}

/// Keeps the best feasible candidate seen so far.
///
/// A candidate replaces the current best only if its mismatch is strictly
/// lower, or equal with a lower trial index. The outcome therefore does not
/// depend on the order in which concurrent trials report.
#[derive(Debug, Default)]
pub struct BestTracker {
    state: Mutex<TrackerState>,
}

impl BestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        // A panicking trial cannot leave the state half-updated
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a trial outcome. Returns true if it became the new best.
    pub fn offer(&self, outcome: &TrialOutcome) -> bool {
        let mut state = self.lock();
        state.counts.run += 1;

        match outcome {
            TrialOutcome::Feasible(candidate) => {
                state.counts.feasible += 1;
                let better = match &state.best {
                    None => true,
                    Some(best) => {
                        candidate.mse < best.mse
                            || (candidate.mse == best.mse && candidate.index < best.index)
                    }
                };
                if better {
                    state.best = Some(*candidate);
                }
                better
            }
            TrialOutcome::Rejected(_) => {
                state.counts.rejected += 1;
                false
            }
            TrialOutcome::Failed { .. } => {
                state.counts.failed += 1;
                false
            }
        }
    }

    /// Record a trial that was never started.
    pub fn skip(&self) {
        self.lock().counts.skipped += 1;
    }

    /// The current best candidate.
    pub fn best(&self) -> Option<ScoredConfig> {
        self.lock().best
    }

    pub fn counts(&self) -> TrialCounts {
        self.lock().counts
    }

    /// Consume the tracker, returning the best candidate and the counters.
    pub fn into_parts(self) -> (Option<ScoredConfig>, TrialCounts) {
        let state = self.state.into_inner().unwrap_or_else(PoisonError::into_inner);
        (state.best, state.counts)
    }
}
