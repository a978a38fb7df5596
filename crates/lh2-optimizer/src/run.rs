//! Run orchestration: bind, price the baseline, search, assemble the
//! outcome.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use lh2_types::{DcfModel, Lh2Result};

use crate::evaluate::CostEvaluator;
use crate::objective::PenalizedObjective;
use crate::params::{OptimizerSettings, ParameterSet, SearchMethod};
use crate::search::{differential_evolution, DeOptions};

/// Unique optimization run identifier.
pub type RunId = Uuid;

/// Final state of one optimization run.
///
/// `parameter_names`, `baseline_values`, and `optimal_values` share the
/// declaration order of the parameter set. Costs are `None` only when the
/// run never searched (no parameters declared); a non-converged search
/// still carries its best-found values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationOutcome {
    pub id: RunId,
    /// True iff the search ran and converged within its budget.
    pub success: bool,
    pub message: Option<String>,
    /// Baseline LCOH2 in $/kg.
    pub baseline_cost: Option<f64>,
    /// Best LCOH2 found in $/kg.
    pub optimal_cost: Option<f64>,
    pub parameter_names: Vec<String>,
    pub baseline_values: Vec<f64>,
    pub optimal_values: Vec<f64>,
    pub evaluations: usize,
    pub generations: usize,
    pub converged: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl OptimizationOutcome {
    fn failed(id: RunId, message: &str) -> Self {
        Self {
            id,
            success: false,
            message: Some(message.to_string()),
            baseline_cost: None,
            optimal_cost: None,
            parameter_names: Vec::new(),
            baseline_values: Vec::new(),
            optimal_values: Vec::new(),
            evaluations: 0,
            generations: 0,
            converged: false,
            started_at: None,
            finished_at: None,
        }
    }
}

/// One LCOH2 minimization run over a techno-economic input.
#[derive(Debug, Clone)]
pub struct OptimizationRun {
    id: RunId,
    config: Value,
    params: ParameterSet,
    settings: OptimizerSettings,
}

impl OptimizationRun {
    /// Bind parameters and settings against `config`, failing fast on any
    /// configuration error.
    pub fn new(config: Value) -> Lh2Result<Self> {
        let params = ParameterSet::from_config(&config)?;
        let settings = OptimizerSettings::from_config(&config)?;
        Ok(Self::with_parameters(config, params, settings))
    }

    /// Assemble a run from pre-built parts, for programmatic callers.
    pub fn with_parameters(
        config: Value,
        params: ParameterSet,
        settings: OptimizerSettings,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            params,
            settings,
        }
    }

    pub fn id(&self) -> RunId {
        self.id
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    pub fn settings(&self) -> &OptimizerSettings {
        &self.settings
    }

    /// Execute the run against `model`.
    ///
    /// A parameterless run short-circuits to a failure outcome without a
    /// single model call; a search that exhausts its generation budget is
    /// reported through the outcome, not raised. Baseline evaluation
    /// failures and configuration faults are hard errors.
    pub fn execute(&self, model: &dyn DcfModel) -> Lh2Result<OptimizationOutcome> {
        if self.params.is_empty() {
            info!(run = %self.id, "no parameters specified, skipping search");
            return Ok(OptimizationOutcome::failed(self.id, "no parameters specified"));
        }

        let started_at = Utc::now();
        let baseline_values = self.params.baseline_values(&self.config)?;
        let baseline_cost = model.run(&self.config)?.h2_cost;
        info!(run = %self.id, model = model.name(), baseline_cost, "baseline evaluated");

        let options = DeOptions {
            max_iterations: self.settings.max_iterations,
            tolerance: self.settings.tolerance,
            seed: self.settings.seed,
            ..DeOptions::default()
        };

        let evaluator = CostEvaluator::new(&self.config, &self.params, model);
        let mut objective = PenalizedObjective::new(evaluator);
        let result = match self.settings.method {
            SearchMethod::DifferentialEvolution => differential_evolution(
                &mut objective,
                &self.params.bounds(),
                Some(&baseline_values),
                &options,
            )?,
        };

        let message = if result.converged {
            None
        } else {
            Some("maximum number of generations reached without convergence".to_string())
        };
        info!(
            run = %self.id,
            optimal_cost = result.cost,
            evaluations = result.evaluations,
            converged = result.converged,
            "search finished"
        );

        Ok(OptimizationOutcome {
            id: self.id,
            success: result.converged,
            message,
            baseline_cost: Some(baseline_cost),
            optimal_cost: Some(result.cost),
            parameter_names: self.params.names(),
            baseline_values,
            optimal_values: result.x,
            evaluations: result.evaluations,
            generations: result.generations,
            converged: result.converged,
            started_at: Some(started_at),
            finished_at: Some(Utc::now()),
        })
    }
}
