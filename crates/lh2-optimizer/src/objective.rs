//! Objective function wrapper with fault containment.

use tracing::{info, warn};

use crate::evaluate::CostEvaluator;
use crate::params::CandidateVector;

/// Cost substituted when an evaluation fails or produces a non-finite
/// value. Large enough to lose against any plausible hydrogen cost, finite
/// so the search keeps ranking candidates instead of aborting.
pub const PENALTY_COST: f64 = 1e6;

/// Number of initial evaluations surfaced in the log.
const DIAGNOSTIC_EVALS: usize = 5;

/// The minimizer-facing objective: batches of candidate vectors in,
/// aligned finite costs out.
pub trait Objective {
    fn evaluate_batch(&mut self, candidates: &[CandidateVector]) -> Vec<f64>;

    /// Number of evaluations performed so far.
    fn evaluations(&self) -> usize;
}

/// Wraps a [`CostEvaluator`] so every failure becomes [`PENALTY_COST`].
///
/// The evaluation counter and diagnostic window are instance state, so
/// independent searches never observe each other. Nothing else is retained
/// per call.
pub struct PenalizedObjective<'a> {
    evaluator: CostEvaluator<'a>,
    evaluations: usize,
}

impl<'a> PenalizedObjective<'a> {
    pub fn new(evaluator: CostEvaluator<'a>) -> Self {
        Self {
            evaluator,
            evaluations: 0,
        }
    }
}

impl Objective for PenalizedObjective<'_> {
    fn evaluate_batch(&mut self, candidates: &[CandidateVector]) -> Vec<f64> {
        let results = self.evaluator.evaluate_batch(candidates);
        results
            .into_iter()
            .zip(candidates)
            .map(|(result, candidate)| {
                self.evaluations += 1;
                let surfaced = self.evaluations <= DIAGNOSTIC_EVALS;
                let cost = match result {
                    Ok(cost) if cost.is_finite() => cost,
                    Ok(cost) => {
                        if surfaced {
                            warn!(
                                evaluation = self.evaluations,
                                cost, "non-finite cost, substituting penalty"
                            );
                        }
                        PENALTY_COST
                    }
                    Err(error) => {
                        if surfaced {
                            warn!(
                                evaluation = self.evaluations,
                                %error,
                                "evaluation failed, substituting penalty"
                            );
                        }
                        PENALTY_COST
                    }
                };
                if surfaced {
                    info!(
                        evaluation = self.evaluations,
                        candidate = ?candidate,
                        cost,
                        "objective evaluation"
                    );
                }
                cost
            })
            .collect()
    }

    fn evaluations(&self) -> usize {
        self.evaluations
    }
}
