//! Differential evolution over a bounded parameter box.
//!
//! A population-based, derivative-free global search (rand/1/bin with
//! generation-wise batched updating), suited to the noisy, non-convex cost
//! surfaces a discounted-cash-flow model produces. The RNG is seeded so a
//! run is reproducible given identical inputs.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use lh2_types::{Lh2Result, SearchError};

use crate::objective::Objective;
use crate::params::CandidateVector;

/// Differential-evolution control settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeOptions {
    /// Generation cap.
    pub max_iterations: usize,
    /// Convergence threshold on the relative population cost spread.
    pub tolerance: f64,
    /// RNG seed.
    pub seed: u64,
    /// Population members per dimension; total is `max(multiplier * n, 25)`.
    pub population_multiplier: usize,
    /// Differential weight F.
    pub mutation: f64,
    /// Crossover probability CR.
    pub recombination: f64,
}

impl Default for DeOptions {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            tolerance: 1e-6,
            seed: 42,
            population_multiplier: 15,
            mutation: 0.8,
            recombination: 0.9,
        }
    }
}

/// Outcome of one search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Best candidate found.
    pub x: CandidateVector,
    /// Objective value at `x`.
    pub cost: f64,
    /// Generations executed.
    pub generations: usize,
    /// Objective evaluations consumed.
    pub evaluations: usize,
    /// Whether the population spread fell below tolerance before the
    /// generation cap.
    pub converged: bool,
}

/// Minimize `objective` over `bounds`.
///
/// `x0`, when given, is clamped into the box and joins the initial
/// population, so the search never returns anything worse than it.
/// Exhausting the generation cap is reported via `converged`, not raised;
/// only empty or invalid bounds are errors.
pub fn differential_evolution(
    objective: &mut dyn Objective,
    bounds: &[(f64, f64)],
    x0: Option<&[f64]>,
    options: &DeOptions,
) -> Lh2Result<SearchResult> {
    let n = bounds.len();
    if n == 0 {
        return Err(SearchError::NoParameters.into());
    }
    for (index, &(lower, upper)) in bounds.iter().enumerate() {
        if !(lower.is_finite() && upper.is_finite()) || lower >= upper {
            return Err(SearchError::InvalidBounds {
                index,
                lower,
                upper,
            }
            .into());
        }
    }

    let pop_size = (options.population_multiplier * n).max(25);
    let mut rng = StdRng::seed_from_u64(options.seed);

    let mut population: Vec<CandidateVector> = (0..pop_size)
        .map(|_| {
            bounds
                .iter()
                .map(|&(lower, upper)| rng.random_range(lower..=upper))
                .collect()
        })
        .collect();
    if let Some(x0) = x0 {
        if x0.len() == n {
            population[0] = x0
                .iter()
                .zip(bounds)
                .map(|(&v, &(lower, upper))| v.clamp(lower, upper))
                .collect();
        }
    }

    info!(
        dimensions = n,
        population = pop_size,
        seed = options.seed,
        "starting differential evolution"
    );

    let mut costs = objective.evaluate_batch(&population);
    let mut generations = 0;
    let mut converged = spread_converged(&costs, options.tolerance);

    while !converged && generations < options.max_iterations {
        generations += 1;

        // Build the whole generation of trial vectors up front, then
        // evaluate them as one batch.
        let trials: Vec<CandidateVector> = (0..pop_size)
            .map(|i| {
                let [a, b, c] = distinct_indices(&mut rng, pop_size, i);
                let j_rand = rng.random_range(0..n);
                (0..n)
                    .map(|j| {
                        if j == j_rand || rng.random_range(0.0..1.0) < options.recombination {
                            let mutant = population[a][j]
                                + options.mutation * (population[b][j] - population[c][j]);
                            mutant.clamp(bounds[j].0, bounds[j].1)
                        } else {
                            population[i][j]
                        }
                    })
                    .collect()
            })
            .collect();

        let trial_costs = objective.evaluate_batch(&trials);
        for (i, (trial, trial_cost)) in trials.into_iter().zip(trial_costs).enumerate() {
            if trial_cost <= costs[i] {
                population[i] = trial;
                costs[i] = trial_cost;
            }
        }

        converged = spread_converged(&costs, options.tolerance);
        debug!(
            generation = generations,
            best_cost = costs[best_index(&costs)],
            "generation complete"
        );
    }

    let best = best_index(&costs);
    if converged {
        info!(generations, best_cost = costs[best], "search converged");
    } else {
        info!(
            generations,
            best_cost = costs[best],
            "generation budget exhausted without convergence"
        );
    }

    Ok(SearchResult {
        x: population[best].clone(),
        cost: costs[best],
        generations,
        evaluations: objective.evaluations(),
        converged,
    })
}

/// Three distinct population indices, none equal to `exclude`.
fn distinct_indices(rng: &mut impl Rng, pop_size: usize, exclude: usize) -> [usize; 3] {
    let mut picks = [0usize; 3];
    let mut count = 0;
    while count < 3 {
        let candidate = rng.random_range(0..pop_size);
        if candidate != exclude && !picks[..count].contains(&candidate) {
            picks[count] = candidate;
            count += 1;
        }
    }
    picks
}

/// Converged when the population cost spread is small relative to its
/// mean: `std(costs) <= tol * |mean(costs)|`.
fn spread_converged(costs: &[f64], tolerance: f64) -> bool {
    let mean = costs.iter().sum::<f64>() / costs.len() as f64;
    let variance = costs.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / costs.len() as f64;
    variance.sqrt() <= tolerance * mean.abs()
}

fn best_index(costs: &[f64]) -> usize {
    costs
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(index, _)| index)
        .unwrap_or(0)
}
